use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context as _;
use argtag::{Command, Config, Parser, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Value)]
enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

/// A duration written as a number of seconds, milliseconds or minutes, like
/// `30s` or `250ms`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Timeout(Duration);

#[derive(Debug, thiserror::Error)]
enum TimeoutError {
    #[error("missing unit (expected ms, s or m)")]
    MissingUnit,

    #[error("{0:?} isn't a number")]
    NotANumber(String),
}

impl FromStr for Timeout {
    type Err = TimeoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, scale) = if let Some(number) = s.strip_suffix("ms") {
            (number, 1)
        } else if let Some(number) = s.strip_suffix('s') {
            (number, 1_000)
        } else if let Some(number) = s.strip_suffix('m') {
            (number, 60_000)
        } else {
            return Err(TimeoutError::MissingUnit);
        };

        let number: u64 = number
            .parse()
            .map_err(|_| TimeoutError::NotANumber(number.to_owned()))?;

        Ok(Timeout(Duration::from_millis(number.saturating_mul(scale))))
    }
}

impl argtag::ParsedValue for Timeout {}

/// Serve files from a directory
#[derive(Debug, Default, Command)]
struct Serve {
    /// Port to listen on
    #[arg(tag = "-p,--port,env:DEMO_PORT", default = "8080", min = "1")]
    port: u16,

    /// Address to bind
    #[arg(tag = "--host", default = "127.0.0.1")]
    host: String,

    /// Serve over TLS
    #[arg(group = "transport")]
    tls: bool,

    /// Serve plain HTTP
    #[arg(group = "transport")]
    plain: bool,

    /// Directory to serve
    #[arg(tag = "positional", placeholder = "DIR")]
    root: Option<PathBuf>,
}

/// Download some URLs
#[derive(Debug, Default, Command)]
struct Fetch {
    /// How many times to retry a failed download
    #[arg(tag = "-r", default = "3", max = "10")]
    retries: u8,

    /// Give up on a download after this long
    #[arg(tag = "-t,env", placeholder = "DURATION")]
    timeout: Option<Timeout>,

    /// URLs to download
    #[arg(tag = "positional,required", placeholder = "URL", minlen = "1")]
    urls: Vec<String>,
}

/// A small demonstration of argtag
#[derive(Debug, Default, Command)]
struct Args {
    /// Show debug logs
    #[arg(tag = "-v")]
    verbose: bool,

    /// Colorize output
    #[arg(tag = "optional", placeholder = "WHEN", default = "always")]
    color: Color,

    /// Read settings from this file
    #[arg(tag = "-c,--config,env:DEMO_CONFIG", placeholder = "FILE")]
    config: Option<PathBuf>,

    #[arg(tag = "subcommand")]
    serve: Option<Serve>,

    #[arg(tag = "subcommand", help = "download some URLs")]
    fetch: Option<Box<Fetch>>,
}

fn run(args: Args) -> anyhow::Result<()> {
    debug!(?args, "parsed arguments");

    if let Some(ref config) = args.config {
        let metadata = std::fs::metadata(config)
            .with_context(|| format!("can't read config file {}", config.display()))?;

        info!(size = metadata.len(), "loaded config");
    }

    match (args.serve, args.fetch) {
        (Some(serve), _) => {
            let transport = match (serve.tls, serve.plain) {
                (true, _) => "https",
                _ => "http",
            };

            let root = serve.root.unwrap_or_else(|| PathBuf::from("."));

            info!(
                root = %root.display(),
                "would serve on {transport}://{}:{}",
                serve.host,
                serve.port,
            );
        }
        (None, Some(fetch)) => {
            for url in &fetch.urls {
                info!(
                    url = %url,
                    retries = fetch.retries,
                    timeout = ?fetch.timeout.map(|Timeout(timeout)| timeout),
                    "would fetch",
                );
            }
        }
        (None, None) => println!("nothing to do (color: {:?})", args.color),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::new()
        .version(concat!("argtag-demo ", env!("CARGO_PKG_VERSION")))
        .epilogue("Set RUST_LOG to control logging.");

    let parser = Parser::<Args>::new(config)?;
    let mut args = Args::default();
    parser.must_parse(&mut args, std::env::args_os().skip(1));

    let filter = match args.verbose {
        true => EnvFilter::new("debug"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    run(args)
}
