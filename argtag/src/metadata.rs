/*!
Metadata extraction: turning the raw [`CommandDecl`] of a record into a
validated [`CommandSpec`] tree.

All of the annotation parsing and cross-field validation happens here, once
per root record type. The resulting trees are cached process-wide, keyed by
the [`TypeId`] of the root record, and shared read-only between parsers.
*/

use std::{
    any::TypeId,
    cmp::Ordering,
    collections::{HashMap, HashSet},
    fmt::Display,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use argtag_parser::Discipline;
use heck::{ToKebabCase as _, ToShoutySnakeCase as _};
use lazy_format::lazy_format;
use tracing::{debug, trace};

use crate::{
    Tags,
    coerce::{Bound, Bounds, coerce},
    record::{Command, CommandDecl, FieldDecl, FieldKind, Shape},
    table::OptionMap,
    value::ScalarKind,
};

/// A problem with the way a record type is annotated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", location(.record, .field))]
pub struct MetadataError {
    /// The name of the record type
    pub record: &'static str,

    /// The field with the bad annotation, if the problem is with a field
    pub field: Option<&'static str>,

    pub message: String,
}

fn location<'a>(record: &'a str, field: &'a Option<&'static str>) -> impl Display + 'a {
    lazy_format!(match (field) {
        Some(field) => "{record}.{field}",
        None => "{record}",
    })
}

/// A fully validated field: an option or a positional
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The index of the field in its record
    pub index: usize,
    pub name: &'static str,
    pub shape: Shape,
    pub kind: ScalarKind,

    pub positional: bool,
    pub short: Option<char>,
    pub long: Option<String>,
    pub discipline: Discipline,

    pub required: bool,
    pub default: Option<&'static str>,
    pub env: Option<String>,
    pub help: &'static str,
    pub placeholder: String,
    pub bounds: Bounds,
    pub group: Option<&'static str>,
}

impl FieldSpec {
    /// The short and long tags of this field, or `None` for a positional
    #[must_use]
    pub fn tags(&self) -> Option<Tags<'_>> {
        match (self.long.as_deref(), self.short) {
            (Some(long), Some(short)) => Some(Tags::LongShort { long, short }),
            (Some(long), None) => Some(Tags::Long { long }),
            (None, Some(short)) => Some(Tags::Short { short }),
            (None, None) => None,
        }
    }

    /// The name used for this field in error messages: `--long`, then
    /// `-short`, then the field name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.tags() {
            Some(Tags::Long { long } | Tags::LongShort { long, .. }) => format!("--{long}"),
            Some(Tags::Short { short }) => format!("-{short}"),
            None => self.name.to_owned(),
        }
    }
}

/// A subcommand, as registered on its parent command
#[derive(Debug)]
pub struct SubcommandSpec {
    /// The index of the subcommand field in the parent record
    pub index: usize,

    /// The name, as declared
    pub name: String,

    /// The lowercased name, used for case-insensitive matching
    pub key: String,

    pub help: &'static str,
    pub command: CommandSpec,
}

/// A node in the command tree
#[derive(Debug)]
pub struct CommandSpec {
    pub type_name: &'static str,
    pub about: &'static str,

    /// Options, in declaration order
    pub options: Vec<FieldSpec>,

    /// Positionals, in declaration order
    pub positionals: Vec<FieldSpec>,

    /// Subcommands, in declaration order
    pub subcommands: Vec<SubcommandSpec>,

    pub(crate) table: OptionMap,
    pub(crate) field_count: usize,
}

impl CommandSpec {
    /// Find a subcommand by name. An exact match wins; otherwise names are
    /// compared case-insensitively.
    #[must_use]
    pub fn find_subcommand(&self, token: &str) -> Option<&SubcommandSpec> {
        self.subcommands
            .iter()
            .find(|subcommand| subcommand.name == token)
            .or_else(|| {
                let key = token.to_lowercase();
                self.subcommands
                    .iter()
                    .find(|subcommand| subcommand.key == key)
            })
    }

    /// All options and positionals
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.options.iter().chain(&self.positionals)
    }
}

/// The parsed form of a field's comma separated annotation
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Annotation<'a> {
    pub short: Option<char>,
    pub long: Option<&'a str>,

    /// A bare `--`, suppressing the default long name
    pub no_long: bool,

    pub positional: bool,
    pub required: bool,
    pub optional: bool,
    pub env: Option<Option<&'a str>>,
    pub subcommand: Option<Option<&'a str>>,
}

impl<'a> Annotation<'a> {
    pub fn parse(tag: &'a str) -> Result<Self, String> {
        let mut annotation = Self::default();

        for token in tag.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            match token {
                "--" => annotation.no_long = true,
                "positional" => annotation.positional = true,
                "required" => annotation.required = true,
                "optional" => annotation.optional = true,
                "env" => set_once(&mut annotation.env, None, token)?,
                "subcommand" => set_once(&mut annotation.subcommand, None, token)?,
                "separate" => return Err("`separate` is reserved and isn't supported".to_owned()),
                _ => {
                    if let Some(long) = token.strip_prefix("--") {
                        let long = check_long(long)?;
                        set_once(&mut annotation.long, long, token)?;
                    } else if let Some(short) = token.strip_prefix('-') {
                        let short = check_short(short)?;
                        set_once(&mut annotation.short, short, token)?;
                    } else if let Some(name) = token.strip_prefix("env:") {
                        let name = check_name(name, "environment variable")?;
                        set_once(&mut annotation.env, Some(name), token)?;
                    } else if let Some(name) = token.strip_prefix("subcommand:") {
                        let name = check_name(name, "subcommand")?;
                        set_once(&mut annotation.subcommand, Some(name), token)?;
                    } else {
                        return Err(format!("unknown annotation {token:?}"));
                    }
                }
            }
        }

        Ok(annotation)
    }

    fn has_tags(&self) -> bool {
        self.short.is_some() || self.long.is_some() || self.no_long
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, token: &str) -> Result<(), String> {
    match slot {
        Some(_) => Err(format!("{token:?} conflicts with an earlier annotation")),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}

fn check_long(long: &str) -> Result<&str, String> {
    if long.is_empty() {
        Err("long names can't be empty".to_owned())
    } else if long.starts_with('-') {
        Err(format!("long name --{long} has too many dashes"))
    } else if long.contains('=') {
        Err(format!("long name --{long} must not include '='"))
    } else if long.contains(char::is_whitespace) {
        Err(format!("long name {long:?} must not include whitespace"))
    } else {
        Ok(long)
    }
}

fn check_short(short: &str) -> Result<char, String> {
    let mut chars = short.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_graphic() && c != '-' => Ok(c),
        (Some(c), None) if !c.is_ascii() => Err(format!("short name -{c} must be an ASCII character")),
        _ => Err(format!(
            "short name -{short} must be exactly one character"
        )),
    }
}

fn check_name<'a>(name: &'a str, what: &str) -> Result<&'a str, String> {
    if name.is_empty() {
        Err(format!("{what} name can't be empty"))
    } else if name.starts_with('-') {
        Err(format!("{what} name {name:?} can't start with '-'"))
    } else {
        Ok(name)
    }
}

/// Short and long names that are in use along a command path
#[derive(Debug, Default, Clone)]
struct Names {
    short: HashSet<char>,
    long: HashSet<String>,
}

impl Names {
    fn extend(&mut self, other: &Names) {
        self.short.extend(other.short.iter().copied());
        self.long.extend(other.long.iter().cloned());
    }
}

fn field_error(record: &'static str, field: &FieldDecl) -> impl Fn(String) -> MetadataError {
    let name = field.name;
    move |message| MetadataError {
        record,
        field: Some(name),
        message,
    }
}

fn scalar_field(
    index: usize,
    field: &FieldDecl,
    shape: Shape,
    kind: ScalarKind,
    annotation: Annotation<'_>,
) -> Result<FieldSpec, String> {
    if annotation.subcommand.is_some() {
        return Err(format!(
            "only Option<record> fields can be subcommands, but this is a {kind} field"
        ));
    }

    let positional = annotation.positional;

    if positional && annotation.has_tags() {
        return Err("positional fields can't have a short or long name".to_owned());
    }

    let long = match (positional, annotation.long, annotation.no_long) {
        (true, _, _) | (false, None, true) => None,
        (false, Some(long), _) => Some(long.to_owned()),
        (false, None, false) => Some(field.name.to_kebab_case()),
    };

    if !positional && long.is_none() && annotation.short.is_none() {
        return Err("`--` removes the long name, so a short name is required".to_owned());
    }

    if shape == Shape::Slice && field.default.is_some() {
        return Err("slice fields can't have a default".to_owned());
    }

    if annotation.required && field.default.is_some() {
        return Err("required fields can't have a default".to_owned());
    }

    let takes_value = kind != ScalarKind::Bool || shape == Shape::Slice;

    let discipline = match annotation.optional {
        true if positional || shape == Shape::Slice || !takes_value => {
            return Err(
                "`optional` only applies to single-valued options that take an argument"
                    .to_owned(),
            );
        }
        true => Discipline::Optional,
        false if takes_value => Discipline::Required,
        false => Discipline::None,
    };

    let bounds = field_bounds(field, kind)?;

    if let Some(default) = field.default
        && !matches!(kind, ScalarKind::User { .. })
    {
        coerce(default, kind)
            .and_then(|value| bounds.check(&value))
            .map_err(|err| format!("default {default:?} is invalid: {err}"))?;
    }

    let placeholder = match field.placeholder {
        Some(placeholder) if placeholder.contains(char::is_whitespace) => {
            return Err(format!("placeholder {placeholder:?} must not include whitespace"));
        }
        Some(placeholder) => placeholder.to_owned(),
        None => field.name.to_shouty_snake_case(),
    };

    Ok(FieldSpec {
        index,
        name: field.name,
        shape,
        kind,
        positional,
        short: annotation.short,
        long,
        discipline,
        required: annotation.required,
        default: field.default,
        env: annotation.env.map(|name| match name {
            Some(name) => name.to_owned(),
            None => field.name.to_shouty_snake_case(),
        }),
        help: field.help,
        placeholder,
        bounds,
        group: field.group,
    })
}

fn field_bounds(field: &FieldDecl, kind: ScalarKind) -> Result<Bounds, String> {
    let bound = |text: Option<&str>, what: &str| -> Result<Option<Bound>, String> {
        text.map(|text| match kind.is_numeric() {
            false => Err(format!("`{what}` only applies to numeric fields, not {kind}")),
            true => Bound::parse(text, kind)
                .ok_or_else(|| format!("`{what}` value {text:?} isn't a valid {kind}")),
        })
        .transpose()
    };

    let length = |text: Option<&str>, what: &str| -> Result<Option<usize>, String> {
        text.map(|text| match kind.is_text() {
            false => Err(format!("`{what}` only applies to string fields, not {kind}")),
            true => text
                .trim()
                .parse()
                .map_err(|_| format!("`{what}` value {text:?} isn't a valid length")),
        })
        .transpose()
    };

    let bounds = Bounds {
        min: bound(field.min, "min")?,
        max: bound(field.max, "max")?,
        minlen: length(field.minlen, "minlen")?,
        maxlen: length(field.maxlen, "maxlen")?,
    };

    if let (Some(min), Some(max)) = (bounds.min, bounds.max)
        && min.partial_cmp(&max) == Some(Ordering::Greater)
    {
        return Err(format!("min {min} is greater than max {max}"));
    }

    if let (Some(minlen), Some(maxlen)) = (bounds.minlen, bounds.maxlen)
        && minlen > maxlen
    {
        return Err(format!("minlen {minlen} is greater than maxlen {maxlen}"));
    }

    Ok(bounds)
}

fn subcommand_name(field: &FieldDecl, annotation: &Annotation<'_>) -> Result<String, String> {
    let name = match annotation.subcommand {
        None => return Err("record fields need a `subcommand` annotation".to_owned()),
        Some(Some(name)) => name.to_owned(),
        Some(None) => field.name.to_lowercase(),
    };

    if annotation.has_tags()
        || annotation.env.is_some()
        || annotation.required
        || annotation.positional
        || annotation.optional
    {
        return Err("subcommand fields only take `subcommand` or `subcommand:name`".to_owned());
    }

    if field.default.is_some() {
        return Err("subcommand fields can't have a default".to_owned());
    }

    // Field names can't be empty, but an explicit name could still be bad
    check_name(&name, "subcommand").map(str::to_owned)
}

struct Extractor {
    /// Record types currently being extracted, for cycle detection
    stack: Vec<TypeId>,
}

impl Extractor {
    fn command(&mut self, decl: CommandDecl, inherited: &Names) -> Result<CommandSpec, MetadataError> {
        if self.stack.contains(&decl.type_id) {
            return Err(MetadataError {
                record: decl.type_name,
                field: None,
                message: "record contains itself as a subcommand".to_owned(),
            });
        }

        self.stack.push(decl.type_id);
        let spec = self.build(decl, inherited);
        self.stack.pop();

        spec
    }

    fn build(&mut self, decl: CommandDecl, inherited: &Names) -> Result<CommandSpec, MetadataError> {
        let record = decl.type_name;

        let mut names = Names::default();
        let mut options = Vec::new();
        let mut positionals: Vec<FieldSpec> = Vec::new();
        let mut pending = Vec::new();

        for (index, field) in decl.fields.iter().enumerate() {
            let error = field_error(record, field);
            let annotation = Annotation::parse(field.tag).map_err(&error)?;

            match field.kind {
                FieldKind::Subcommand { declare } => {
                    let name = subcommand_name(field, &annotation).map_err(&error)?;
                    pending.push((index, field, name, declare));
                }
                FieldKind::Scalar { shape, kind } => {
                    let spec = scalar_field(index, field, shape, kind, annotation).map_err(&error)?;

                    if spec.positional {
                        if let Some(last) = positionals.last()
                            && last.shape == Shape::Slice
                        {
                            return Err(error(format!(
                                "positional `{}` is a slice, so it must be the last positional",
                                last.name
                            )));
                        }

                        positionals.push(spec);
                        continue;
                    }

                    if let Some(short) = spec.short {
                        if inherited.short.contains(&short) {
                            return Err(error(format!(
                                "-{short} is already declared by an enclosing command"
                            )));
                        }
                        if !names.short.insert(short) {
                            return Err(error(format!("-{short} is declared more than once")));
                        }
                    }

                    if let Some(ref long) = spec.long {
                        if inherited.long.contains(long) {
                            return Err(error(format!(
                                "--{long} is already declared by an enclosing command"
                            )));
                        }
                        if !names.long.insert(long.clone()) {
                            return Err(error(format!("--{long} is declared more than once")));
                        }
                    }

                    options.push(spec);
                }
            }
        }

        if !positionals.is_empty() && !pending.is_empty() {
            return Err(MetadataError {
                record,
                field: None,
                message: "a command can't have both positionals and subcommands".to_owned(),
            });
        }

        names.extend(inherited);

        let mut subcommands: Vec<SubcommandSpec> = Vec::with_capacity(pending.len());

        for (index, field, name, declare) in pending {
            let key = name.to_lowercase();

            if subcommands.iter().any(|subcommand| subcommand.key == key) {
                return Err(field_error(record, field)(format!(
                    "subcommand name {name:?} is already in use (names are case-insensitive)"
                )));
            }

            trace!(record, subcommand = name, "extracting subcommand");

            let command = self.command(declare(), &names)?;

            subcommands.push(SubcommandSpec {
                index,
                name,
                key,
                help: field.help,
                command,
            });
        }

        Ok(CommandSpec {
            type_name: record,
            about: decl.about,
            table: OptionMap::new(&options),
            options,
            positionals,
            subcommands,
            field_count: decl.fields.len(),
        })
    }
}

/// Extract and validate the command tree rooted at `decl`
pub fn extract(decl: CommandDecl) -> Result<CommandSpec, MetadataError> {
    Extractor { stack: Vec::new() }.command(decl, &Names::default())
}

type Cache = RwLock<HashMap<TypeId, Arc<CommandSpec>>>;

static CACHE: OnceLock<Cache> = OnceLock::new();

/// Get the command tree for `C`, extracting it on first use. Failed
/// extractions aren't cached.
pub fn command_spec<C: Command>() -> Result<Arc<CommandSpec>, MetadataError> {
    let cache = CACHE.get_or_init(Cache::default);
    let key = TypeId::of::<C>();

    if let Some(spec) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(spec));
    }

    let spec = Arc::new(extract(C::declare())?);
    debug!(record = spec.type_name, "extracted command metadata");

    let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(cache.entry(key).or_insert(spec)))
}
