/*!
Option tables: the translation of a [`CommandSpec`] into the lookup tables the
tokenizer needs, and the layering of those tables along a command path.
*/

use std::collections::HashMap;

use argtag_parser::{Discipline, OptionName, OptionTable};

use crate::metadata::{CommandSpec, FieldSpec};

/// A single entry in an option table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    /// Index into the owning command's `options`
    pub option: usize,
    pub discipline: Discipline,
}

/// The short and long option tables of a single command
#[derive(Debug, Default)]
pub(crate) struct OptionMap {
    short: HashMap<u8, Entry>,
    long: HashMap<Vec<u8>, Entry>,
}

impl OptionMap {
    pub fn new(options: &[FieldSpec]) -> Self {
        let mut map = Self::default();

        for (option, spec) in options.iter().enumerate() {
            let entry = Entry {
                option,
                discipline: spec.discipline,
            };

            if let Some(short) = spec.short {
                // Short names are validated as ASCII during extraction
                map.short.insert(short as u8, entry);
            }

            if let Some(ref long) = spec.long {
                map.long.insert(long.as_bytes().to_vec(), entry);
            }
        }

        map
    }

    #[inline]
    pub fn short(&self, option: u8) -> Option<Entry> {
        self.short.get(&option).copied()
    }

    #[inline]
    pub fn long(&self, option: &[u8]) -> Option<Entry> {
        self.long.get(option).copied()
    }
}

/// What an option on the command line refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// An option of the command at `depth` along the path
    Field { depth: usize, option: usize },
    Help,
    Version,
}

/// The built-in options, which are only used when nothing on the path
/// declares the same name
#[derive(Debug, Clone, Copy)]
pub(crate) struct Builtins {
    pub version: bool,
}

impl Builtins {
    fn short(&self, option: u8) -> Option<Target> {
        match option {
            b'h' => Some(Target::Help),
            _ => None,
        }
    }

    fn long(&self, option: &[u8]) -> Option<Target> {
        match option {
            b"help" => Some(Target::Help),
            b"version" if self.version => Some(Target::Version),
            _ => None,
        }
    }
}

/// The merged option table of every command on a path, root first. Option
/// names are unique along a path, so the layers never shadow each other;
/// only the built-ins can be shadowed.
#[derive(Debug, Clone)]
pub(crate) struct PathTable<'s> {
    layers: Vec<&'s CommandSpec>,
    builtins: Builtins,
}

impl<'s> PathTable<'s> {
    pub fn new(layers: impl IntoIterator<Item = &'s CommandSpec>, builtins: Builtins) -> Self {
        Self {
            layers: layers.into_iter().collect(),
            builtins,
        }
    }

    fn find(&self, lookup: impl Fn(&OptionMap) -> Option<Entry>) -> Option<(usize, Entry)> {
        self.layers
            .iter()
            .enumerate()
            .find_map(|(depth, spec)| lookup(&spec.table).map(|entry| (depth, entry)))
    }

    pub fn resolve_short(&self, option: u8) -> Option<(Target, Discipline)> {
        match self.find(|map| map.short(option)) {
            Some((depth, entry)) => Some((
                Target::Field {
                    depth,
                    option: entry.option,
                },
                entry.discipline,
            )),
            None => self
                .builtins
                .short(option)
                .map(|target| (target, Discipline::None)),
        }
    }

    pub fn resolve_long(&self, option: &[u8]) -> Option<(Target, Discipline)> {
        match self.find(|map| map.long(option)) {
            Some((depth, entry)) => Some((
                Target::Field {
                    depth,
                    option: entry.option,
                },
                entry.discipline,
            )),
            None => self
                .builtins
                .long(option)
                .map(|target| (target, Discipline::None)),
        }
    }

    pub fn resolve(&self, name: OptionName<'_>) -> Option<Target> {
        match name {
            OptionName::Short(option) => self.resolve_short(option),
            OptionName::Long(option) => self.resolve_long(option.bytes()),
        }
        .map(|(target, _)| target)
    }
}

impl OptionTable for PathTable<'_> {
    #[inline]
    fn short(&self, option: u8) -> Option<Discipline> {
        self.resolve_short(option)
            .map(|(_, discipline)| discipline)
    }

    #[inline]
    fn long(&self, option: &[u8]) -> Option<Discipline> {
        self.resolve_long(option)
            .map(|(_, discipline)| discipline)
    }
}
