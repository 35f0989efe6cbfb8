/*!
The dispatcher: the state machine that walks the command line.

Parsing happens in two passes over the same arguments:

1. The first pass finds the active command path. It tokenizes with the
   table of the path found so far, skipping anything it doesn't know, and
   descends whenever a positional names a subcommand of the current command.
   If a positional names no subcommand and an unknown option came before
   it, the unknown option is the error, since the positional may well be
   that option's argument.
   It stops at the first positional of a command without subcommands, or at
   `--`. Subcommand records are allocated as they're entered.
2. The second pass tokenizes again, this time for real. Each option is
   routed to the record of the command that declares it, which may be an
   ancestor of the active command. Every other positional is queued and
   assigned to the positionals of the active command once the arguments are
   exhausted.

Afterwards the [`resolve`][crate::resolve] stage applies environment
variables and defaults, and checks required fields and exclusivity groups.
 */

use std::ffi::OsString;

use argtag_parser::{Arg, Discipline, Event, TokenError, Tokens};
use tracing::trace;

use crate::{
    Config,
    coerce::{CoerceError, coerce},
    error::Error,
    metadata::{CommandSpec, FieldSpec, MetadataError, SubcommandSpec},
    record::{Record, Shape, Store},
    table::{Builtins, PathTable, Target},
    value::ScalarKind,
};

/// Where a field's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Unset,
    Cli,
    Env,
    Default,
}

impl Origin {
    /// True if the user explicitly provided the value
    #[inline]
    pub fn is_explicit(self) -> bool {
        matches!(self, Origin::Cli | Origin::Env)
    }
}

/// One command on the active path
#[derive(Debug)]
pub(crate) struct Frame<'s> {
    pub spec: &'s CommandSpec,

    /// The subcommand that led here; `None` for the root
    pub via: Option<&'s SubcommandSpec>,

    /// Indexed by the field index in the record
    pub origins: Vec<Origin>,
}

impl<'s> Frame<'s> {
    fn new(spec: &'s CommandSpec, via: Option<&'s SubcommandSpec>) -> Self {
        Self {
            spec,
            via,
            origins: vec![Origin::Unset; spec.field_count],
        }
    }
}

/// Transient state for a single parse
#[derive(Debug)]
pub(crate) struct ParseState<'s> {
    pub frames: Vec<Frame<'s>>,
    builtins: Builtins,
}

/// Navigate from the root record to the record of the command at `depth`.
pub(crate) fn record_at<'r>(
    mut record: &'r mut dyn Record,
    frames: &[Frame<'_>],
    depth: usize,
) -> Result<&'r mut dyn Record, Error> {
    for (parent, frame) in frames.iter().zip(&frames[1..]).take(depth) {
        let Some(via) = frame.via else { continue };

        // Subcommand fields are declared by the derive, so this can only
        // fail for a hand-written record that disagrees with its own
        // declaration.
        record = record.subcommand(via.index).ok_or_else(|| {
            Error::Metadata(MetadataError {
                record: parent.spec.type_name,
                field: None,
                message: format!("field {} isn't a subcommand", via.index),
            })
        })?;
    }

    Ok(record)
}

/// Coerce `text` according to `field`, check its bounds and store it.
pub(crate) fn assign(
    record: &mut dyn Record,
    field: &FieldSpec,
    text: &str,
    store: Store,
) -> Result<(), CoerceError> {
    let value = coerce(text, field.kind)?;
    field.bounds.check(&value)?;

    record
        .store(field.index, value, store)
        .map_err(CoerceError::Custom)
}

pub(crate) fn invalid(field: &FieldSpec, text: &str, reason: CoerceError) -> Error {
    Error::InvalidValue {
        option: field.display_name(),
        value: text.to_owned(),
        reason,
    }
}

fn lossy(arg: Arg<'_>) -> String {
    String::from_utf8_lossy(arg.bytes()).into_owned()
}

impl<'s> ParseState<'s> {
    pub fn new(root: &'s CommandSpec, config: &Config) -> Self {
        Self {
            frames: vec![Frame::new(root, None)],
            builtins: Builtins {
                version: config.version.is_some(),
            },
        }
    }

    /// The option table for the first `depth + 1` commands on the path.
    /// The table borrows the specs, not the state.
    fn table(&self, depth: usize) -> PathTable<'s> {
        PathTable::new(
            self.frames.iter().take(depth + 1).map(|frame| frame.spec),
            self.builtins,
        )
    }

    /// The names of the subcommands on the active path
    pub fn command_names(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter_map(|frame| frame.via)
            .map(|via| via.name.clone())
            .collect()
    }

    fn leaf(&self) -> &Frame<'s> {
        // There's always at least the root frame
        &self.frames[self.frames.len() - 1]
    }

    /// Run both passes over `args`
    pub fn dispatch(&mut self, root: &mut dyn Record, args: &[OsString]) -> Result<(), Error> {
        self.find_path(root, args)?;
        self.consume(root, args)
    }

    /// Pass one: find the active command path
    fn find_path(&mut self, root: &mut dyn Record, args: &[OsString]) -> Result<(), Error> {
        let mut tokens = Tokens::new(args.iter().map(|arg| arg.as_encoded_bytes()));

        // The first option nothing on the path knows. Its argument, if it
        // has one, can't be told apart from a subcommand name, so a failed
        // lookup blames the option instead.
        let mut unknown = None;

        loop {
            let table = self.table(self.frames.len() - 1);

            let argument = match tokens.next_event(&table) {
                None | Some(Ok(Event::Trailing(_))) => return Ok(()),
                Some(Err(TokenError::Unknown(name))) => {
                    unknown.get_or_insert_with(|| name.to_string());
                    continue;
                }
                Some(Err(TokenError::MissingArgument(_))) => continue,
                Some(Ok(Event::Option { name, .. })) => match table.resolve(name) {
                    Some(Target::Help) => {
                        return Err(Error::HelpRequested {
                            command: self.command_names(),
                        });
                    }
                    Some(Target::Version) => return Err(Error::VersionRequested),
                    _ => continue,
                },
                Some(Ok(Event::Positional(argument))) => argument,
            };

            let spec = self.leaf().spec;

            if spec.subcommands.is_empty() {
                return Ok(());
            }

            let subcommand = argument
                .to_str()
                .and_then(|token| spec.find_subcommand(token))
                .ok_or_else(|| match unknown.take() {
                    Some(option) => Error::UnknownOption { option },
                    None => Error::UnknownSubcommand {
                        token: lossy(argument),
                    },
                })?;

            trace!(subcommand = %subcommand.name, "entering subcommand");

            let depth = self.frames.len() - 1;
            let parent = record_at(root, &self.frames, depth)?;
            if parent.subcommand(subcommand.index).is_none() {
                return Err(Error::Metadata(MetadataError {
                    record: spec.type_name,
                    field: None,
                    message: format!("field {} isn't a subcommand", subcommand.index),
                }));
            }

            self.frames
                .push(Frame::new(&subcommand.command, Some(subcommand)));
        }
    }

    /// Pass two: assign options and positionals
    fn consume(&mut self, root: &mut dyn Record, args: &[OsString]) -> Result<(), Error> {
        let mut tokens = Tokens::new(args.iter().map(|arg| arg.as_encoded_bytes()));
        let mut queue = Vec::new();

        // How many subcommand tokens have been passed so far. Options of a
        // subcommand aren't known before its name appears.
        let mut reached = 0;
        let last = self.frames.len() - 1;

        loop {
            let table = self.table(reached);

            match tokens.next_event(&table) {
                None => break,
                Some(Err(TokenError::Unknown(name))) => {
                    return Err(Error::UnknownOption {
                        option: name.to_string(),
                    });
                }
                Some(Err(TokenError::MissingArgument(name))) => {
                    return Err(Error::MissingValue {
                        option: name.to_string(),
                    });
                }
                Some(Ok(Event::Option { name, argument })) => match table.resolve(name) {
                    None => {
                        return Err(Error::UnknownOption {
                            option: name.to_string(),
                        });
                    }
                    Some(Target::Help) => {
                        return Err(Error::HelpRequested {
                            command: self.command_names(),
                        });
                    }
                    Some(Target::Version) => return Err(Error::VersionRequested),
                    Some(Target::Field { depth, option }) => {
                        self.apply_option(root, depth, option, argument)?
                    }
                },
                Some(Ok(Event::Positional(_))) if reached < last => reached += 1,
                Some(Ok(Event::Positional(argument) | Event::Trailing(argument))) => {
                    queue.push(argument)
                }
            }
        }

        self.assign_positionals(root, queue)
    }

    fn apply_option(
        &mut self,
        root: &mut dyn Record,
        depth: usize,
        option: usize,
        argument: Option<Arg<'_>>,
    ) -> Result<(), Error> {
        let spec = self.frames[depth].spec;
        let field = &spec.options[option];

        let text = match argument {
            Some(argument) => Some(argument.to_str().ok_or_else(|| {
                invalid(field, &lossy(argument), CoerceError::InvalidUtf8)
            })?),
            None if field.kind == ScalarKind::Bool => Some("true"),
            None if field.discipline == Discipline::Optional => field.default,
            None => {
                return Err(Error::MissingValue {
                    option: field.display_name(),
                });
            }
        };

        trace!(option = %field.display_name(), depth, value = ?text, "option");

        if let Some(text) = text {
            let record = record_at(root, &self.frames, depth)?;
            assign(record, field, text, Store::Replace).map_err(|err| invalid(field, text, err))?;
        }

        self.frames[depth].origins[field.index] = Origin::Cli;
        Ok(())
    }

    fn assign_positionals(&mut self, root: &mut dyn Record, queue: Vec<Arg<'_>>) -> Result<(), Error> {
        let depth = self.frames.len() - 1;
        let spec = self.frames[depth].spec;
        let record = record_at(root, &self.frames, depth)?;
        let mut values = queue.into_iter();

        for field in &spec.positionals {
            let mut store = Store::Replace;

            for argument in values.by_ref() {
                let text = argument
                    .to_str()
                    .ok_or_else(|| invalid(field, &lossy(argument), CoerceError::InvalidUtf8))?;

                trace!(positional = field.name, value = text, "positional");

                assign(record, field, text, store).map_err(|err| invalid(field, text, err))?;
                self.frames[depth].origins[field.index] = Origin::Cli;

                match field.shape {
                    Shape::Slice => store = Store::Append,
                    Shape::Single | Shape::Optional => break,
                }
            }
        }

        match values.next() {
            None => Ok(()),
            Some(extra) => Err(Error::TooManyPositionals {
                value: lossy(extra),
            }),
        }
    }
}
