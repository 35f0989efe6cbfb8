use std::{
    ffi::OsString,
    fmt::{self, Display},
    io::{self, Write as _},
    marker::PhantomData,
    path::Path,
    sync::Arc,
};

use tracing::debug;

use crate::{
    Config,
    dispatch::ParseState,
    error::Error,
    help::{CommandPath, print_help, print_usage},
    metadata::{CommandSpec, command_spec},
    record::Command,
};

/**
A reusable parser for the record type `R`.

Creating a parser extracts and validates the metadata of `R` (and all of its
subcommands), so annotation mistakes are reported by [`Parser::new`] before
any arguments are seen.

```
use argtag::{Command, Config, Parser};

#[derive(Command, Debug, Default)]
struct Args {
    /// Talk more
    #[arg(tag = "-v")]
    verbose: bool,

    #[arg(tag = "positional")]
    files: Vec<String>,
}

let parser = Parser::<Args>::new(Config::new().program("demo")).unwrap();
let mut args = Args::default();

parser.parse(&mut args, ["-v", "a.txt", "b.txt"]).unwrap();

assert!(args.verbose);
assert_eq!(args.files, ["a.txt", "b.txt"]);
```
*/
pub struct Parser<R> {
    spec: Arc<CommandSpec>,
    config: Config,
    program: String,
    record: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("command", &self.spec.type_name)
            .field("program", &self.program)
            .field("config", &self.config)
            .finish()
    }
}

impl<R> Clone for Parser<R> {
    fn clone(&self) -> Self {
        Self {
            spec: Arc::clone(&self.spec),
            config: self.config.clone(),
            program: self.program.clone(),
            record: PhantomData,
        }
    }
}

/// The file name of `argv[0]`, if there is one
pub(crate) fn program_name(arg: Option<OsString>) -> Option<String> {
    let arg = arg?;

    Path::new(&arg)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

impl<R: Command> Parser<R> {
    pub fn new(config: Config) -> Result<Self, Error> {
        let spec = command_spec::<R>()?;

        let program = match config.program {
            Some(ref program) => program.clone(),
            None => program_name(std::env::args_os().next())
                .unwrap_or_else(|| spec.type_name.to_lowercase()),
        };

        debug!(command = spec.type_name, program = %program, "created parser");

        Ok(Self {
            spec,
            config,
            program,
            record: PhantomData,
        })
    }

    /// The program name used in help and error messages
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The root of the command tree
    #[inline]
    #[must_use]
    pub fn command(&self) -> &CommandSpec {
        &self.spec
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /**
    Parse `args` (which should not include the program name) into `record`.

    Fields are only written when there's something to write, so `record`
    should usually start out as its [`Default`]. On error, `record` may have
    been partially written.
    */
    pub fn parse<I>(&self, record: &mut R, args: I) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        self.parse_with_path(record, args).map_err(|(error, _)| error)
    }

    /// Like [`parse`][Self::parse], but errors also carry the names of the
    /// subcommands that were active when parsing stopped.
    fn parse_with_path<I>(&self, record: &mut R, args: I) -> Result<(), (Error, Vec<String>)>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut state = ParseState::new(&self.spec, &self.config);

        state
            .dispatch(record, &args)
            .and_then(|()| state.resolve(record, &self.config))
            .map_err(|error| (error, state.command_names()))
    }

    /**
    Parse `args` into `record`, handling every error by printing something
    and calling the exit hook:

    - `--help` prints help to stdout, then exits with 1
    - `--version` prints the version to stdout, then exits with 0
    - anything else prints the usage and the error to stderr, then exits
      with 1

    If the exit hook returns, so does this method.
    */
    pub fn must_parse<I>(&self, record: &mut R, args: I)
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let (error, path) = match self.parse_with_path(record, args) {
            Ok(()) => return,
            Err(failure) => failure,
        };

        // There's nothing useful to do if stdout or stderr are gone
        let code = match error {
            Error::HelpRequested { ref command } => {
                let _ = self.write_help_for(&mut io::stdout().lock(), command);
                1
            }
            Error::VersionRequested => {
                let version = self.config.version.as_deref().unwrap_or_default();
                let _ = writeln!(io::stdout().lock(), "{version}");
                0
            }
            ref error => {
                let _ = self.write_error(&mut io::stderr().lock(), error, &path);
                1
            }
        };

        self.config.exit_with(code);
    }

    /// Write the usage of the command at `path`, then the error
    fn write_error(
        &self,
        out: &mut impl io::Write,
        error: &Error,
        path: &[String],
    ) -> io::Result<()> {
        // Fall back to the root if the path isn't a real command
        match self.write_usage_for(out, path) {
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => self.write_usage(out)?,
            result => result?,
        }

        writeln!(out, "{}: {error}", self.program)
    }

    /// Write the help message for the root command
    pub fn write_help(&self, out: &mut impl io::Write) -> io::Result<()> {
        self.write_help_for(out, &[] as &[&str])
    }

    /// Write the help message for the subcommand reached by following
    /// `command` from the root
    pub fn write_help_for(
        &self,
        out: &mut impl io::Write,
        command: &[impl AsRef<str>],
    ) -> io::Result<()> {
        let path = self.path(command)?;
        print_help(out, &self.program, &self.config, &path)
    }

    /// Write the usage line for the root command
    pub fn write_usage(&self, out: &mut impl io::Write) -> io::Result<()> {
        self.write_usage_for(out, &[] as &[&str])
    }

    pub fn write_usage_for(
        &self,
        out: &mut impl io::Write,
        command: &[impl AsRef<str>],
    ) -> io::Result<()> {
        let path = self.path(command)?;
        print_usage(out, &self.program, &path)
    }

    fn path(&self, command: &[impl AsRef<str>]) -> io::Result<CommandPath<'_>> {
        CommandPath::find(&self.spec, command).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no such subcommand")
        })
    }

    /// Print the usage and `message` to stderr, then exit with 1
    pub fn fail(&self, message: impl Display) {
        let _ = self.fail_to(&mut io::stderr().lock(), message);
    }

    /// Print the usage and `message` to `out`, then exit with 1
    pub fn fail_to(&self, out: &mut impl io::Write, message: impl Display) -> io::Result<()> {
        let written = self
            .write_usage(out)
            .and_then(|()| writeln!(out, "{}: {message}", self.program));

        self.config.exit_with(1);
        written
    }
}
