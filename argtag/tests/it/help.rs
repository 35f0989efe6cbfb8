use argtag::{Command, Config, Parser};
use expect_test::{Expect, expect};

fn check_help<R: Command>(config: Config, command: &[&str], expect: Expect) {
    let parser = Parser::<R>::new(config).unwrap();
    let mut out = Vec::new();

    parser.write_help_for(&mut out, command).unwrap();
    expect.assert_eq(&String::from_utf8(out).unwrap());
}

fn check_usage<R: Command>(config: Config, expect: Expect) {
    let parser = Parser::<R>::new(config).unwrap();
    let mut out = Vec::new();

    parser.write_usage(&mut out).unwrap();
    expect.assert_eq(&String::from_utf8(out).unwrap());
}

/// Copy files around
#[derive(Command, Debug, Default)]
struct Cp {
    /// Overwrite existing files
    #[arg(tag = "-f")]
    force: bool,

    /// Number of worker threads
    #[arg(tag = "-j,--jobs,env:COPY_JOBS", default = "4")]
    jobs: u32,

    #[arg(tag = "required")]
    dest: String,

    /// Files to copy
    #[arg(tag = "positional,required")]
    files: Vec<String>,
}

#[test]
fn options_and_positionals() {
    check_help::<Cp>(
        Config::new().program("copy"),
        &[],
        expect![[r#"
            Copy files around
            Usage: copy [--force] [--jobs JOBS] --dest DEST FILES [FILES ...]

            Positional arguments:
              FILES                 Files to copy

            Options:
              --force, -f           Overwrite existing files
              --jobs JOBS, -j JOBS  Number of worker threads [default: 4, env: COPY_JOBS]
              --dest DEST
              --help, -h            display this help and exit
        "#]],
    );
}

#[test]
fn description_override() {
    check_help::<Cp>(
        Config::new().program("cp").description("Copy things"),
        &[],
        expect![[r#"
            Copy things
            Usage: cp [--force] [--jobs JOBS] --dest DEST FILES [FILES ...]

            Positional arguments:
              FILES                 Files to copy

            Options:
              --force, -f           Overwrite existing files
              --jobs JOBS, -j JOBS  Number of worker threads [default: 4, env: COPY_JOBS]
              --dest DEST
              --help, -h            display this help and exit
        "#]],
    );
}

/// Start the server
#[derive(Command, Debug, Default)]
struct Server {
    /// Port to listen on
    #[arg(tag = "-p", default = "8080")]
    port: i32,

    /// Host to bind
    #[arg(tag = "-h", default = "localhost")]
    host: String,
}

/// Run database migrations before starting
#[derive(Command, Debug, Default)]
struct Migrate {}

/// Manage the app
#[derive(Command, Debug, Default)]
struct App {
    /// Talk more
    #[arg(tag = "-v")]
    verbose: bool,

    /// When to use colors, one of auto, always or never. Anything else is an
    /// error, reported before any work is done.
    #[arg(tag = "optional", placeholder = "WHEN", default = "always")]
    color: String,

    #[arg(tag = "subcommand")]
    server: Option<Server>,

    #[arg(tag = "subcommand:migrate-database")]
    migrate: Option<Migrate>,
}

fn app_config() -> Config {
    Config::new()
        .program("app")
        .version("app 1.2.3")
        .epilogue("Report bugs to the issue tracker.")
}

#[test]
fn root_with_subcommands() {
    check_help::<App>(
        app_config(),
        &[],
        expect![[r#"
            Manage the app
            app 1.2.3
            Usage: app [--verbose] [--color[=WHEN]] <command> [<args>]

            Options:
              --verbose, -v         Talk more
              --color[=WHEN]        When to use colors, one of auto, always or never.
                                    Anything else is an error, reported before any work is
                                    done. [default: always]
              --help, -h            display this help and exit
              --version             display version and exit

            Commands:
              server                Start the server
              migrate-database      Run database migrations before starting

            Report bugs to the issue tracker.
        "#]],
    );
}

fn server_help() -> Expect {
    expect![[r#"
        Start the server
        Usage: app [--verbose] [--color[=WHEN]] server [--port PORT] [--host HOST]

        Options:
          --port PORT, -p PORT  Port to listen on [default: 8080]
          --host HOST, -h HOST  Host to bind [default: localhost]
          --help                display this help and exit
          --version             display version and exit

        Global options:
          --verbose, -v         Talk more
          --color[=WHEN]        When to use colors, one of auto, always or never.
                                Anything else is an error, reported before any work is
                                done. [default: always]

        Report bugs to the issue tracker.
    "#]]
}

#[test]
fn subcommand_with_globals() {
    check_help::<App>(app_config(), &["server"], server_help());

    // Subcommands are looked up the same way they're parsed
    check_help::<App>(app_config(), &["SERVER"], server_help());
}

#[test]
fn unknown_subcommand_help() {
    let parser = Parser::<App>::new(app_config()).unwrap();
    let error = parser.write_help_for(&mut Vec::<u8>::new(), &["deploy"]).unwrap_err();
    assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
}

#[derive(Command, Debug, Default)]
struct Deploy {
    #[arg(tag = "required")]
    environment: String,

    region: String,
    replicas: u16,
    dry_run: bool,
    timeout: u64,

    #[arg(tag = "positional")]
    services: Vec<String>,
}

#[test]
fn long_usage_wraps() {
    check_usage::<Deploy>(
        Config::new().program("deploy"),
        expect![[r#"
            Usage: deploy --environment ENVIRONMENT [--region REGION] [--replicas REPLICAS]
                   [--dry-run] [--timeout TIMEOUT] [SERVICES [SERVICES ...]]
        "#]],
    );
}
