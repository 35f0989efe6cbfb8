//! Parser configuration

use std::{fmt, sync::Arc};

type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;
type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/**
Settings for a [`Parser`][crate::Parser]. Every setting has a sensible
default, so most programs only set a few:

```
let config = argtag::Config::new()
    .program("deploy")
    .version("deploy 1.0.0")
    .description("Ship it");
```
*/
#[derive(Clone, Default)]
pub struct Config {
    pub(crate) program: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) epilogue: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) ignore_env: bool,
    pub(crate) ignore_default: bool,
    exit: Option<ExitHook>,
    env: Option<EnvLookup>,
}

impl Config {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The program name shown in help and error messages. Defaults to the
    /// file name of `argv[0]`.
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Text shown above the usage line. Defaults to the doc comment of the
    /// root record.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Text shown at the end of the help message
    #[must_use]
    pub fn epilogue(mut self, epilogue: impl Into<String>) -> Self {
        self.epilogue = Some(epilogue.into());
        self
    }

    /// The version string. Setting it enables the `--version` flag.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Don't fall back to environment variables
    #[must_use]
    pub fn ignore_env(mut self, ignore: bool) -> Self {
        self.ignore_env = ignore;
        self
    }

    /// Don't apply field defaults
    #[must_use]
    pub fn ignore_default(mut self, ignore: bool) -> Self {
        self.ignore_default = ignore;
        self
    }

    /// Replace the function used to end the process after
    /// [`Parser::fail`][crate::Parser::fail] or
    /// [`Parser::must_parse`][crate::Parser::must_parse]. If the hook
    /// returns, so do they.
    #[must_use]
    pub fn exit(mut self, exit: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.exit = Some(Arc::new(exit));
        self
    }

    /// Replace the function used to read environment variables. Defaults to
    /// reading the process environment.
    #[must_use]
    pub fn env(mut self, lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.env = Some(Arc::new(lookup));
        self
    }

    pub(crate) fn lookup_env(&self, name: &str) -> Option<String> {
        match self.env {
            Some(ref lookup) => lookup(name),
            None => std::env::var(name).ok(),
        }
    }

    pub(crate) fn exit_with(&self, code: i32) {
        match self.exit {
            Some(ref exit) => exit(code),
            None => std::process::exit(code),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("program", &self.program)
            .field("description", &self.description)
            .field("epilogue", &self.epilogue)
            .field("version", &self.version)
            .field("ignore_env", &self.ignore_env)
            .field("ignore_default", &self.ignore_default)
            .field("exit", &self.exit.as_ref().map(|_| "<hook>"))
            .field("env", &self.env.as_ref().map(|_| "<lookup>"))
            .finish()
    }
}
