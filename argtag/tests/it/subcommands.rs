use argtag::{Command, Error};
use expect_test::expect;

use crate::{check, config, parse};

#[derive(Command, Debug, Default, PartialEq)]
struct Server {
    #[arg(tag = "-p", default = "8080")]
    port: i32,

    #[arg(tag = "-h", default = "localhost")]
    host: String,

    reload: bool,
}

#[derive(Command, Debug, Default, PartialEq)]
struct App {
    #[arg(tag = "-v,--verbose")]
    verbose: bool,

    #[arg(tag = "subcommand")]
    server: Option<Server>,
}

#[test]
fn seed() {
    check::<App>(
        config(),
        "-v server --port 9000",
        expect![[r#"
            App {
                verbose: true,
                server: Some(
                    Server {
                        port: 9000,
                        host: "localhost",
                        reload: false,
                    },
                ),
            }
        "#]],
    );

    check::<App>(
        config(),
        "SERVER --port 9000",
        expect![[r#"
            App {
                verbose: false,
                server: Some(
                    Server {
                        port: 9000,
                        host: "localhost",
                        reload: false,
                    },
                ),
            }
        "#]],
    );
}

#[test]
fn case_insensitive() {
    let expected: App = parse("server -p 1").unwrap();

    for name in ["Server", "SERVER", "sErVeR"] {
        let args: App = parse(&format!("{name} -p 1")).unwrap();
        assert_eq!(args, expected);
    }
}

#[test]
fn inherited_options() {
    let before: App = parse("-v server --reload").unwrap();
    let after: App = parse("server --reload -v").unwrap();
    let between: App = parse("server -v --reload").unwrap();

    assert_eq!(before, after);
    assert_eq!(before, between);
    assert!(before.verbose);
    assert!(before.server.unwrap().reload);
}

#[test]
fn shadowed_help() {
    // -h belongs to the server, so only --help asks for help there
    let args: App = parse("server -h 0.0.0.0").unwrap();
    assert_eq!(args.server.unwrap().host, "0.0.0.0");

    match parse::<App>("server --help") {
        Err(Error::HelpRequested { command }) => assert_eq!(command, ["server"]),
        other => panic!("expected a help request, got {other:?}"),
    }

    match parse::<App>("-h server") {
        Err(Error::HelpRequested { command }) => assert!(command.is_empty()),
        other => panic!("expected a help request, got {other:?}"),
    }
}

#[test]
fn inactive_subcommands_stay_empty() {
    let args: App = parse("-v").unwrap();
    assert_eq!(args.server, None);
}

#[test]
fn errors() {
    check::<App>(
        config(),
        "deploy",
        expect![[r#"unknown subcommand: invalid subcommand: deploy"#]],
    );

    // Options of a subcommand aren't known before the subcommand
    check::<App>(
        config(),
        "--reload server",
        expect![[r#"unknown option: --reload"#]],
    );

    // -p takes a value in the server, but isn't known yet, so 1 isn't
    // mistaken for a subcommand name
    check::<App>(
        config(),
        "-p 1 server",
        expect![[r#"unknown option: -p"#]],
    );

    check::<App>(
        config(),
        "server extra",
        expect![[r#"too many positionals: unexpected argument "extra""#]],
    );

    check::<App>(
        config(),
        "server --port",
        expect![[r#"missing value: --port requires a value"#]],
    );
}

/// Add a remote
#[derive(Command, Debug, Default, PartialEq)]
struct Add {
    #[arg(tag = "-f")]
    fetch: bool,

    #[arg(tag = "positional,required")]
    name: String,

    #[arg(tag = "positional,required")]
    url: String,
}

#[derive(Command, Debug, Default, PartialEq)]
struct Remove {
    #[arg(tag = "positional,required")]
    name: String,
}

#[derive(Command, Debug, Default, PartialEq)]
struct Remote {
    #[arg(tag = "subcommand")]
    add: Option<Add>,

    #[arg(tag = "subcommand:rm")]
    remove: Option<Box<Remove>>,
}

#[derive(Command, Debug, Default, PartialEq)]
struct Git {
    #[arg(tag = "-C", placeholder = "PATH")]
    directory: Option<String>,

    #[arg(tag = "subcommand")]
    remote: Option<Remote>,
}

#[test]
fn nested() {
    let args: Git = parse("-C repo remote add -f origin https://example.com").unwrap();
    assert_eq!(args.directory.as_deref(), Some("repo"));

    let remote = args.remote.unwrap();
    assert_eq!(remote.remove, None);
    assert_eq!(
        remote.add,
        Some(Add {
            fetch: true,
            name: "origin".to_owned(),
            url: "https://example.com".to_owned(),
        })
    );

    let args: Git = parse("remote RM -C repo upstream").unwrap();
    assert_eq!(args.directory.as_deref(), Some("repo"));
    assert_eq!(
        args.remote.unwrap().remove,
        Some(Box::new(Remove {
            name: "upstream".to_owned()
        }))
    );

    match parse::<Git>("remote add --help") {
        Err(Error::HelpRequested { command }) => assert_eq!(command, ["remote", "add"]),
        other => panic!("expected a help request, got {other:?}"),
    }

    check::<Git>(
        config(),
        "remote",
        expect![[r#"
            Git {
                directory: None,
                remote: Some(
                    Remote {
                        add: None,
                        remove: None,
                    },
                ),
            }
        "#]],
    );

    check::<Git>(
        config(),
        "remote add origin",
        expect![[r#"missing required: url is required"#]],
    );

    check::<Git>(
        config(),
        "remote -- add",
        expect![[r#"too many positionals: unexpected argument "add""#]],
    );
}
