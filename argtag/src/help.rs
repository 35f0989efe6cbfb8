/*!
Usage and help text. Everything here is a pure function of the command tree
and the [`Config`].

```text
DESCRIPTION
Usage: program [--verbose] server [--port PORT]

Options:
  --port PORT, -p PORT   port to listen on [default: 8080]
  --help, -h             display this help and exit

Global options:
  --verbose, -v          talk more
```
*/

use std::{
    fmt::Display,
    io::{self, Write as _},
};

use argtag_parser::Discipline;
use indent_write::io::IndentWriter;
use joinery::JoinableIterator as _;
use lazy_format::lazy_format;

use crate::{
    Config, Tags,
    metadata::{CommandSpec, FieldSpec, SubcommandSpec},
    record::Shape,
};

/// Items are described starting at this column, relative to the section
/// indent.
const COLUMN: usize = 22;

/// Total width of the help text
const WIDTH: usize = 80;

/// The indent used by sections
const INDENT: &str = "  ";

/// A command path, from the root to some subcommand
#[derive(Debug, Clone)]
pub(crate) struct CommandPath<'a> {
    root: &'a CommandSpec,
    subcommands: Vec<&'a SubcommandSpec>,
}

impl<'a> CommandPath<'a> {
    /// Follow a list of subcommand names from the root. Names are matched
    /// the same way they are during parsing.
    pub fn find(root: &'a CommandSpec, names: &[impl AsRef<str>]) -> Option<Self> {
        let mut subcommands = Vec::with_capacity(names.len());
        let mut spec = root;

        for name in names {
            let subcommand = spec.find_subcommand(name.as_ref())?;
            subcommands.push(subcommand);
            spec = &subcommand.command;
        }

        Some(Self { root, subcommands })
    }

    fn leaf(&self) -> &'a CommandSpec {
        match self.subcommands.last() {
            Some(subcommand) => &subcommand.command,
            None => self.root,
        }
    }

    /// Every command on the path, along with the subcommand that led to it
    fn commands(&self) -> impl Iterator<Item = (&'a CommandSpec, Option<&'a SubcommandSpec>)> + '_ {
        [(self.root, None)].into_iter().chain(
            self.subcommands
                .iter()
                .map(|&subcommand| (&subcommand.command, Some(subcommand))),
        )
    }

    fn declares(&self, predicate: impl Fn(&FieldSpec) -> bool) -> bool {
        self.commands()
            .any(|(spec, _)| spec.options.iter().any(&predicate))
    }
}

fn option_tag(field: &FieldSpec, tag: impl Display) -> impl Display {
    let placeholder = field.placeholder.as_str();

    lazy_format!(match (field.discipline) {
        Discipline::None => "{tag}",
        Discipline::Required => "{tag} {placeholder}",
        Discipline::Optional => "{tag}[={placeholder}]",
    })
}

/// The synopsis of an option on the usage line: the long tag if there is
/// one, bracketed unless it's required.
fn option_synopsis(field: &FieldSpec) -> impl Display + '_ {
    let tag = lazy_format!(match (field.tags()) {
        Some(Tags::Long { long } | Tags::LongShort { long, .. }) => "--{long}",
        Some(Tags::Short { short }) => "-{short}",
        None => ("{}", field.placeholder),
    });

    let tag = option_tag(field, tag);

    lazy_format!(match (field.required) {
        true => "{tag}",
        false => "[{tag}]",
    })
}

fn positional_synopsis(field: &FieldSpec) -> impl Display + '_ {
    let placeholder = field.placeholder.as_str();

    lazy_format!(match ((field.shape, field.required)) {
        (Shape::Slice, true) => "{placeholder} [{placeholder} ...]",
        (Shape::Slice, false) => "[{placeholder} [{placeholder} ...]]",
        (_, true) => "{placeholder}",
        (_, false) => "[{placeholder}]",
    })
}

/// Write the usage line, wrapping it if it gets too long.
pub(crate) fn print_usage(
    out: &mut (impl io::Write + ?Sized),
    program: &str,
    path: &CommandPath<'_>,
) -> io::Result<()> {
    let mut items = Vec::new();

    for (spec, via) in path.commands() {
        if let Some(via) = via {
            items.push(via.name.clone());
        }

        items.extend(spec.options.iter().map(|field| option_synopsis(field).to_string()));
    }

    let leaf = path.leaf();

    if !leaf.subcommands.is_empty() {
        items.push("<command> [<args>]".to_owned());
    }

    items.extend(
        leaf.positionals
            .iter()
            .map(|field| positional_synopsis(field).to_string()),
    );

    let prefix = "Usage: ";
    write!(out, "{prefix}{program}")?;

    let mut width = prefix.len() + program.len();

    for item in &items {
        if width + 1 + item.len() > WIDTH {
            write!(out, "\n{:width$}", "", width = prefix.len())?;
            width = prefix.len();
        } else {
            write!(out, " ")?;
            width += 1;
        }

        write!(out, "{item}")?;
        width += item.len();
    }

    writeln!(out)
}

/// The `[default: D, env: E]` suffix of an item's description
fn notes(field: &FieldSpec) -> impl Display + '_ {
    let default = field.default.map(|default| lazy_format!("default: {default}"));
    let env = field.env.as_deref().map(|env| lazy_format!("env: {env}"));

    let default = default.iter().map(|note| note as &dyn Display);
    let env = env.iter().map(|note| note as &dyn Display);
    let notes = default.chain(env).join_with(", ").to_string();

    lazy_format!(match (notes.is_empty()) {
        true => "",
        false => "[{notes}]",
    })
}

/// Help text, then notes
fn field_description(field: &FieldSpec) -> String {
    let notes = notes(field).to_string();

    match (field.help.is_empty(), notes.is_empty()) {
        (_, true) => field.help.to_owned(),
        (true, false) => notes,
        (false, false) => format!("{} {notes}", field.help),
    }
}

fn option_item(field: &FieldSpec) -> impl Display + '_ {
    lazy_format!(match (field.tags()) {
        Some(Tags::LongShort { long, short }) => (
            "{}, {}",
            option_tag(field, lazy_format!("--{long}")),
            option_tag(field, lazy_format!("-{short}")),
        ),
        Some(Tags::Long { long }) => ("{}", option_tag(field, lazy_format!("--{long}"))),
        Some(Tags::Short { short }) => ("{}", option_tag(field, lazy_format!("-{short}"))),
        None => ("{}", field.placeholder),
    })
}

/// Write a section by writing a newline, then the `header`, then an
/// indented `body`.
fn section<O: io::Write + ?Sized, T>(
    out: &mut O,
    header: &str,
    body: impl FnOnce(IndentWriter<&mut O>) -> io::Result<T>,
) -> io::Result<T> {
    writeln!(out, "\n{header}:")?;
    body(IndentWriter::new(INDENT, out))
}

/// Write an optional section, only if the iterator is not empty.
/// Otherwise identical to `section`.
fn maybe_section<O: io::Write + ?Sized, I: IntoIterator>(
    out: &mut O,
    header: &str,
    items: I,
    body: impl Fn(&mut IndentWriter<&mut O>, I::Item) -> io::Result<()>,
) -> io::Result<()> {
    let mut items = items.into_iter();

    match items.next() {
        None => Ok(()),
        Some(first) => section(out, header, |mut out| {
            body(&mut out, first)?;
            items.try_for_each(|item| body(&mut out, item))
        }),
    }
}

/// Describe an item by printing the item, followed by the description in a
/// column. If the item is too wide for the column, the description starts
/// on the next line instead.
fn describe(
    out: &mut (impl io::Write + ?Sized),
    item: impl Display,
    description: &str,
) -> io::Result<()> {
    /// Helper type that counts the bytes that flow through it. We use this
    /// to decide where the description goes.
    struct IoByteCounter<'a, T: io::Write + ?Sized> {
        inner: &'a mut T,
        count: &'a mut usize,
    }

    impl<T: io::Write + ?Sized> io::Write for IoByteCounter<'_, T> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = self.inner.write(buf)?;
            *self.count += n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    let mut count = 0;

    write!(
        IoByteCounter {
            inner: &mut *out,
            count: &mut count,
        },
        "{item}"
    )?;

    if description.is_empty() {
        return writeln!(out);
    }

    match COLUMN.checked_sub(count) {
        Some(space) if space >= 2 => write!(out, "{:space$}", "")?,
        _ => write!(out, "\n{:COLUMN$}", "")?,
    }

    let lines = textwrap::wrap(description, WIDTH - INDENT.len() - COLUMN);
    let mut lines = lines.iter();

    if let Some(first) = lines.next() {
        write!(out, "{first}")?;
    }

    lines.try_for_each(|line| write!(out, "\n{:COLUMN$}{line}", ""))?;
    writeln!(out)
}

/// The description shown at the top of the help for a command path
fn command_description<'a>(config: &'a Config, path: &CommandPath<'a>) -> &'a str {
    match path.subcommands.last() {
        Some(subcommand) if !subcommand.help.is_empty() => subcommand.help,
        Some(subcommand) => subcommand.command.about,
        None => match config.description {
            Some(ref description) => description,
            None => path.root.about,
        },
    }
}

/// The one-line summary of a subcommand in the `Commands` section
fn subcommand_summary(subcommand: &SubcommandSpec) -> &str {
    let text = match subcommand.help.is_empty() {
        false => subcommand.help,
        true => subcommand.command.about,
    };

    text.lines().next().unwrap_or_default()
}

pub(crate) fn print_help(
    out: &mut (impl io::Write + ?Sized),
    program: &str,
    config: &Config,
    path: &CommandPath<'_>,
) -> io::Result<()> {
    let description = command_description(config, path);

    if !description.is_empty() {
        writeln!(out, "{}", textwrap::fill(description, WIDTH))?;
    }

    let version_flag = config.version.is_some()
        && !path.declares(|field| field.long.as_deref() == Some("version"));

    if let Some(ref version) = config.version
        && path.subcommands.is_empty()
    {
        writeln!(out, "{version}")?;
    }

    print_usage(out, program, path)?;

    let leaf = path.leaf();

    maybe_section(out, "Positional arguments", &leaf.positionals, |out, field| {
        describe(out, &field.placeholder, &field_description(field))
    })?;

    let help_long = !path.declares(|field| field.long.as_deref() == Some("help"));
    let help_short = !path.declares(|field| field.short == Some('h'));

    let help_tags = match (help_long, help_short) {
        (true, true) => Some("--help, -h"),
        (true, false) => Some("--help"),
        (false, true) => Some("-h"),
        (false, false) => None,
    };

    let builtins = help_tags
        .map(|tags| (tags, "display this help and exit"))
        .into_iter()
        .chain(version_flag.then_some(("--version", "display version and exit")));

    let options = leaf
        .options
        .iter()
        .map(|field| (option_item(field).to_string(), field_description(field)))
        .chain(builtins.map(|(item, description)| (item.to_owned(), description.to_owned())));

    maybe_section(out, "Options", options, |out, (item, description)| {
        describe(out, item, &description)
    })?;

    let globals = path
        .commands()
        .take(path.subcommands.len())
        .flat_map(|(spec, _)| &spec.options);

    maybe_section(out, "Global options", globals, |out, field| {
        describe(out, option_item(field), &field_description(field))
    })?;

    maybe_section(out, "Commands", &leaf.subcommands, |out, subcommand| {
        describe(out, &subcommand.name, subcommand_summary(subcommand))
    })?;

    if let Some(ref epilogue) = config.epilogue {
        writeln!(out, "\n{}", textwrap::fill(epilogue, WIDTH))?;
    }

    Ok(())
}
