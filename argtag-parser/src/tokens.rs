use core::fmt::{self, Display};

use crate::{Arg, ArgAccess, ArgumentsParser, Visitor};

/// Whether an option takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// A flag, like `--verbose`. It never consumes the next command line
    /// argument, though `--verbose=false` still passes its argument along.
    None,

    /// An option that always takes an argument, either attached
    /// (`--out=file`, `-ofile`) or as the next command line argument.
    Required,

    /// An option that takes an argument only when it's attached.
    Optional,
}

/**
The set of options known to a [`Tokens`] stream. Implementations are
consulted once per option, so a caller can swap in a different table between
events (for instance after a subcommand has been identified).
*/
pub trait OptionTable {
    fn short(&self, option: u8) -> Option<Discipline>;
    fn long(&self, option: &[u8]) -> Option<Discipline>;
}

impl<T: OptionTable + ?Sized> OptionTable for &T {
    #[inline]
    fn short(&self, option: u8) -> Option<Discipline> {
        T::short(self, option)
    }

    #[inline]
    fn long(&self, option: &[u8]) -> Option<Discipline> {
        T::long(self, option)
    }
}

/// The name of an option, exactly as it appeared on the command line (minus
/// the dashes)
#[derive(Debug, Clone, Copy)]
pub enum OptionName<'arg> {
    Short(u8),
    Long(Arg<'arg>),
}

impl Display for OptionName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OptionName::Short(option) => match option.is_ascii_graphic() {
                true => write!(f, "-{}", option as char),
                false => write!(f, "-{option:#x}"),
            },
            OptionName::Long(option) => match option.to_str() {
                Some(option) => write!(f, "--{option}"),
                None => write!(f, "--{option:?}"),
            },
        }
    }
}

/// A single successfully tokenized item from the command line.
#[derive(Debug, Clone, Copy)]
pub enum Event<'arg> {
    /// A known option, along with its argument, if it got one.
    Option {
        name: OptionName<'arg>,
        argument: Option<Arg<'arg>>,
    },

    /// A positional argument.
    Positional(Arg<'arg>),

    /// A positional argument that appeared after a raw `--`.
    Trailing(Arg<'arg>),
}

/// Something went wrong tokenizing a single option. The stream is still
/// usable afterwards.
#[derive(Debug, Clone, Copy)]
pub enum TokenError<'arg> {
    /// The option isn't in the table.
    Unknown(OptionName<'arg>),

    /// The option requires an argument and there wasn't one.
    MissingArgument(OptionName<'arg>),
}

impl<'arg> TokenError<'arg> {
    #[inline]
    #[must_use]
    pub fn name(&self) -> OptionName<'arg> {
        match *self {
            TokenError::Unknown(name) | TokenError::MissingArgument(name) => name,
        }
    }
}

/**
Table-driven tokenizer. Wraps an [`ArgumentsParser`] and uses an
[`OptionTable`] to decide which options get arguments, emitting one [`Event`]
per option or positional.
*/
#[derive(Debug, Clone)]
pub struct Tokens<'arg, I> {
    parser: ArgumentsParser<'arg, I>,
}

impl<'arg, I> Tokens<'arg, I>
where
    I: Iterator<Item = &'arg [u8]>,
{
    /// Create a new token stream. The arguments should exclude the program
    /// name.
    #[inline]
    #[must_use]
    pub fn new(args: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            parser: ArgumentsParser::new(args),
        }
    }

    /// Get the next event, using `table` to classify it. Returns `None` once
    /// the arguments are exhausted.
    pub fn next_event<T>(&mut self, table: &T) -> Option<Result<Event<'arg>, TokenError<'arg>>>
    where
        T: OptionTable + ?Sized,
    {
        self.parser.next_arg(TableVisitor { table })
    }
}

struct TableVisitor<'a, T: ?Sized> {
    table: &'a T,
}

/// Shared logic for `--long` and `-s`: get an argument according to the
/// option's discipline.
fn option_event<'arg>(
    name: OptionName<'arg>,
    discipline: Option<Discipline>,
    argument: impl ArgAccess<'arg>,
) -> Result<Event<'arg>, TokenError<'arg>> {
    let argument = match discipline.ok_or(TokenError::Unknown(name))? {
        Discipline::None => None,
        Discipline::Required => Some(
            argument
                .take()
                .ok_or(TokenError::MissingArgument(name))?,
        ),
        Discipline::Optional => argument.take_attached(),
    };

    Ok(Event::Option { name, argument })
}

impl<'arg, T> Visitor<'arg> for TableVisitor<'_, T>
where
    T: OptionTable + ?Sized,
{
    type Value = Result<Event<'arg>, TokenError<'arg>>;

    fn visit_positional(self, argument: Arg<'arg>) -> Self::Value {
        Ok(Event::Positional(argument))
    }

    fn visit_trailing(self, argument: Arg<'arg>) -> Self::Value {
        Ok(Event::Trailing(argument))
    }

    fn visit_long_option(self, option: Arg<'arg>, argument: Arg<'arg>) -> Self::Value {
        let name = OptionName::Long(option);

        match self.table.long(option.bytes()) {
            None => Err(TokenError::Unknown(name)),
            Some(_) => Ok(Event::Option {
                name,
                argument: Some(argument),
            }),
        }
    }

    fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) -> Self::Value {
        option_event(
            OptionName::Long(option),
            self.table.long(option.bytes()),
            arg,
        )
    }

    fn visit_short(self, option: u8, arg: impl ArgAccess<'arg>) -> Self::Value {
        option_event(OptionName::Short(option), self.table.short(option), arg)
    }
}
