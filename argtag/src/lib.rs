/*!
A declarative, tag-driven command line arguments parser.

Describe your arguments as a struct, annotate each field with a short tag
string, and `argtag` fills the struct in from command line options,
positional arguments, environment variables and defaults, in that order of
precedence.

```
use argtag::Command;

#[derive(Command, Debug, Default)]
struct Args {
    /// Talk more
    #[arg(tag = "-v")]
    verbose: bool,

    /// Where to write the output
    #[arg(tag = "-o,--output,env:OUTPUT_PATH", default = "out.txt")]
    output: String,

    #[arg(tag = "-c,required")]
    count: i32,
}

let mut args = Args::default();
argtag::parse_args(&mut args, ["-v", "-c", "42"]).unwrap();

assert!(args.verbose);
assert_eq!(args.count, 42);
```

# Tags

The `tag` is a comma separated list of:

- `-x`: a short name
- `--name`: a long name. Options get the kebab-case field name by default;
  a bare `--` removes it.
- `positional`: a positional argument instead of an option
- `required`: must be given on the command line or in the environment
- `optional`: the option only takes an attached argument (`--color=always`)
- `env` or `env:NAME`: fall back to an environment variable, by default the
  SHOUTY_SNAKE field name
- `subcommand` or `subcommand:name`: an `Option<Record>` field that is a
  subcommand, by default named after the field

Other attributes are separate keys of `#[arg(...)]`: `help` (defaults to the
doc comment), `default`, `placeholder`, `min`, `max`, `minlen`, `maxlen` and
`group`, which makes a set of options mutually exclusive.

Values are any type implementing [`Value`]: the primitive numbers, `bool`,
`String` and `PathBuf`, anything that opts in with [`ParsedValue`], and
enums or newtypes with `#[derive(Value)]`. `Vec<T>` fields take several
values and `Option<T>` fields distinguish "absent" from the zero value.
*/

extern crate self as argtag;

pub mod coerce;
mod config;
mod dispatch;
pub mod error;
mod help;
pub mod metadata;
mod parser;
pub mod record;
mod resolve;
mod table;
pub mod value;

use std::ffi::OsString;

pub use argtag_derive::{Command, Value};

pub use crate::{
    config::Config,
    error::{Error, ErrorKind},
    parser::Parser,
    record::{Command, Record},
    value::{ParsedValue, Value},
};

/// The set of tags that identify a particular option (`-short`, `--long`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tags<'a> {
    /// This option uses only a long tag
    Long { long: &'a str },

    /// This option uses only a short tag
    Short { short: char },

    /// This option uses both a long and short tag
    LongShort { long: &'a str, short: char },
}

impl<'a> Tags<'a> {
    /// Get the long tag, if any
    #[inline]
    #[must_use]
    pub const fn long(&self) -> Option<&'a str> {
        match self {
            Tags::Long { long } | Tags::LongShort { long, .. } => Some(long),
            Tags::Short { .. } => None,
        }
    }

    /// Get the short tag, if any
    #[inline]
    #[must_use]
    pub const fn short(&self) -> Option<char> {
        match self {
            Tags::Short { short } | Tags::LongShort { short, .. } => Some(*short),
            Tags::Long { .. } => None,
        }
    }
}

/// Parse the process arguments into `record`, using the default
/// [`Config`]
pub fn parse<R: Command>(record: &mut R) -> Result<(), Error> {
    let mut args = std::env::args_os();
    let parser = Parser::new(process_config(args.next()))?;

    parser.parse(record, args)
}

/// Parse `args` (without the program name) into `record`, using the default
/// [`Config`]
pub fn parse_args<R, I>(record: &mut R, args: I) -> Result<(), Error>
where
    R: Command,
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    Parser::new(Config::default())?.parse(record, args)
}

/// Parse the process arguments into `record`. On any error, or if help or
/// the version was requested, print a message and exit the process. See
/// [`Parser::must_parse`] for details.
pub fn must_parse<R: Command>(record: &mut R) {
    let mut args = std::env::args_os();
    let config = process_config(args.next());

    match Parser::new(config.clone()) {
        Ok(parser) => parser.must_parse(record, args),
        Err(error) => {
            let program = config.program.as_deref().unwrap_or("argtag");
            eprintln!("{program}: {error}");
            config.exit_with(1);
        }
    }
}

fn process_config(argv0: Option<OsString>) -> Config {
    match parser::program_name(argv0) {
        Some(program) => Config::default().program(program),
        None => Config::default(),
    }
}
