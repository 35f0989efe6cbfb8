/*!
The error type returned by parsing.

Every error renders as `<kind>: <detail>`; [`Parser::fail`][crate::Parser::fail]
and [`must_parse`][crate::must_parse] add a `<program>: ` prefix. The kind
prefixes are stable, so that tools can match on them.
 */

use std::fmt::Display;

use lazy_format::lazy_format;

use crate::{coerce::CoerceError, metadata::MetadataError};

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The record type is badly annotated
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("unknown option: {option}")]
    UnknownOption { option: String },

    #[error("missing value: {option} requires a value")]
    MissingValue { option: String },

    #[error("invalid value: {option}: {value:?}: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        #[source]
        reason: CoerceError,
    },

    #[error("missing required: {option} is required{}", env_hint(.env))]
    MissingRequired {
        option: String,
        env: Option<String>,
    },

    #[error("unknown subcommand: invalid subcommand: {token}")]
    UnknownSubcommand { token: String },

    /// Never returned; duplicate subcommand names are rejected when the
    /// metadata is extracted.
    #[error("ambiguous subcommand: {token}")]
    AmbiguousSubcommand { token: String },

    #[error("too many positionals: unexpected argument {value:?}")]
    TooManyPositionals { value: String },

    #[error("conflict: {first} and {second} can't be used together")]
    Conflict { first: String, second: String },

    /// `--help` or `-h` was given. `command` is the path of subcommand
    /// names that was active when it was seen.
    #[error("help requested")]
    HelpRequested { command: Vec<String> },

    #[error("version requested")]
    VersionRequested,
}

fn env_hint(env: &Option<String>) -> impl Display + '_ {
    lazy_format!(match (env) {
        Some(env) => " (or environment variable {env})",
        None => "",
    })
}

/// The kind of an [`Error`], without any of its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    Metadata,
    UnknownOption,
    MissingValue,
    InvalidValue,
    MissingRequired,
    UnknownSubcommand,
    AmbiguousSubcommand,
    TooManyPositionals,
    Conflict,
    HelpRequested,
    VersionRequested,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Metadata(_) => ErrorKind::Metadata,
            Error::UnknownOption { .. } => ErrorKind::UnknownOption,
            Error::MissingValue { .. } => ErrorKind::MissingValue,
            Error::InvalidValue { .. } => ErrorKind::InvalidValue,
            Error::MissingRequired { .. } => ErrorKind::MissingRequired,
            Error::UnknownSubcommand { .. } => ErrorKind::UnknownSubcommand,
            Error::AmbiguousSubcommand { .. } => ErrorKind::AmbiguousSubcommand,
            Error::TooManyPositionals { .. } => ErrorKind::TooManyPositionals,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::HelpRequested { .. } => ErrorKind::HelpRequested,
            Error::VersionRequested => ErrorKind::VersionRequested,
        }
    }

    /// True for the errors that are really requests for output, rather than
    /// problems with the command line
    #[inline]
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self, Error::HelpRequested { .. } | Error::VersionRequested)
    }
}
