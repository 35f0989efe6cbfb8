mod env;
mod errors;
mod help;
mod smoke;
mod subcommands;

use std::{
    collections::HashMap,
    ffi::OsString,
    fmt,
    sync::{Arc, Mutex},
};

use argtag::{Command, Config, Error, Parser};
use expect_test::Expect;

/// A config with a fixed program name and an empty environment
fn config() -> Config {
    Config::new().program("prog").env(|_| None)
}

/// A config whose environment is exactly `vars`
fn with_env(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|&(name, value)| (name.to_owned(), value.to_owned()))
        .collect();

    config().env(move |name| vars.get(name).cloned())
}

fn split(args: &str) -> Vec<OsString> {
    args.split_ascii_whitespace().map(OsString::from).collect()
}

fn parse_with<R: Command>(config: Config, args: &str) -> Result<R, Error> {
    let parser = Parser::<R>::new(config)?;
    let mut record = R::default();
    parser.parse(&mut record, split(args))?;
    Ok(record)
}

fn parse<R: Command>(args: &str) -> Result<R, Error> {
    parse_with(config(), args)
}

/// Parse `args`, and compare either the debug form of the record or the
/// error message with `expect`
fn check<R: Command + fmt::Debug>(config: Config, args: &str, expect: Expect) {
    match parse_with::<R>(config, args) {
        Ok(record) => expect.assert_debug_eq(&record),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

/// An exit hook that records its codes instead of exiting
fn exit_codes() -> (Config, Arc<Mutex<Vec<i32>>>) {
    let codes = Arc::new(Mutex::new(Vec::new()));
    let hook = Arc::clone(&codes);

    let config = config().exit(move |code| hook.lock().unwrap().push(code));
    (config, codes)
}
