#![no_std]

/*!
The command line tokenizer underneath `argtag`. It knows about the POSIX and
GNU conventions (`-abc` clusters, `-ovalue`, `--name=value`, `--`) and nothing
about types.

[`ArgumentsParser`] splits raw arguments into options and positionals but
can't tell on its own whether `--out file` is one option or two arguments;
its [`Visitor`] makes that call per option through [`ArgAccess`]. [`Tokens`]
is the visitor most callers want: it answers from an [`OptionTable`] and
yields [`Event`]s.

Everything here borrows the arguments for `'arg`; nothing is copied.
*/

#[cfg(test)]
extern crate std;

mod tokens;

use ::core::fmt::{self, Debug};
use ::core::str;

pub use tokens::{Discipline, Event, OptionName, OptionTable, TokenError, Tokens};

/// One raw piece of the command line: an option name, an option's argument,
/// or a positional. The OS hands these out as bytes, so that's what this is.
#[derive(Clone, Copy)]
pub struct Arg<'arg>(&'arg [u8]);

impl<'arg> Arg<'arg> {
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'arg [u8]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &'arg [u8] {
        self.0
    }

    /// The argument as a string, if it's valid UTF-8
    #[inline]
    #[must_use]
    pub fn to_str(&self) -> Option<&'arg str> {
        str::from_utf8(self.0).ok()
    }
}

impl PartialEq<str> for Arg<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// Prints like a `&str` when possible and like a byte string otherwise
impl Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Some(text) => Debug::fmt(text, f),
            None => write!(f, "b\"{}\"", self.0.escape_ascii()),
        }
    }
}

/// Receives whatever [`ArgumentsParser::next_arg`] finds.
pub trait Visitor<'arg> {
    type Value;

    fn visit_positional(self, argument: Arg<'arg>) -> Self::Value;

    /// A positional after a raw `--`. Defaults to [`visit_positional`][Self::visit_positional].
    fn visit_trailing(self, argument: Arg<'arg>) -> Self::Value
    where
        Self: Sized,
    {
        self.visit_positional(argument)
    }

    /// `--option=argument`, which always carries its argument
    fn visit_long_option(self, option: Arg<'arg>, argument: Arg<'arg>) -> Self::Value;

    /// `--option` on its own
    fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) -> Self::Value;

    /// `-o`, possibly as part of a cluster like `-vo`
    fn visit_short(self, option: u8, arg: impl ArgAccess<'arg>) -> Self::Value;
}

/**
Lets a [`Visitor`] ask for an option's argument, but only if the option
takes one.

`-ab foo` might be `-a`, `-b`, `foo`; or `-a`, `-b foo`; or `-a b`, `foo`.
Only the visitor knows which of `a` and `b` take arguments, so the parser
hands it one of these and works out where the argument comes from once the
visitor asks. Flags should drop it untouched.
*/
pub trait ArgAccess<'arg>: Sized {
    /// Take the rest of the short cluster if there is any, otherwise the
    /// next command line argument. Returns [`None`] at the end of the
    /// arguments or when the next argument is `--`, which ends option
    /// parsing instead of being consumed.
    fn take(self) -> Option<Arg<'arg>>;

    /// Take the rest of the short cluster, never a separate argument.
    fn take_attached(self) -> Option<Arg<'arg>>;
}

#[derive(Debug, Clone, Copy)]
enum Mode<'arg> {
    /// Reading options and positionals
    Options,

    /// A `--` was seen; everything else is positional
    Trailing,

    /// In the middle of a short cluster. Never empty.
    Cluster(&'arg [u8]),
}

/**
Splits command line arguments into options and positionals, one call to
[`next_arg`][Self::next_arg] at a time. The arguments should exclude the
program name.
*/
#[derive(Debug, Clone)]
pub struct ArgumentsParser<'arg, I> {
    mode: Mode<'arg>,
    args: I,
}

impl<'arg, I> ArgumentsParser<'arg, I>
where
    I: Iterator<Item = &'arg [u8]>,
{
    #[inline]
    #[must_use]
    pub fn new(args: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            mode: Mode::Options,
            args: args.into_iter(),
        }
    }

    /// Visit the option at the front of a short cluster; `rest` is whatever
    /// follows it.
    fn short<V>(&mut self, option: u8, rest: &'arg [u8], visitor: V) -> V::Value
    where
        V: Visitor<'arg>,
    {
        match rest.is_empty() {
            true => {
                self.mode = Mode::Options;
                visitor.visit_short(option, NextArg { parser: self })
            }
            false => {
                // If the visitor doesn't take the rest, the cluster goes on
                self.mode = Mode::Cluster(rest);
                visitor.visit_short(
                    option,
                    Attached {
                        rest,
                        mode: &mut self.mode,
                    },
                )
            }
        }
    }

    /// Hand the next thing on the command line to `visitor`. Returns
    /// [`None`] once the arguments run out.
    pub fn next_arg<V>(&mut self, visitor: V) -> Option<V::Value>
    where
        V: Visitor<'arg>,
    {
        match self.mode {
            Mode::Cluster(cluster) => {
                if let Some((&option, rest)) = cluster.split_first() {
                    return Some(self.short(option, rest, visitor));
                }

                self.mode = Mode::Options;
            }
            Mode::Trailing => {
                return self
                    .args
                    .next()
                    .map(|argument| visitor.visit_trailing(Arg(argument)));
            }
            Mode::Options => {}
        }

        Some(match self.args.next()? {
            b"--" => {
                self.mode = Mode::Trailing;
                return self.next_arg(visitor);
            }
            [b'-', b'-', long @ ..] => match memchr::memchr(b'=', long) {
                Some(eq) => visitor.visit_long_option(Arg(&long[..eq]), Arg(&long[eq + 1..])),
                None => visitor.visit_long(Arg(long), NextArg { parser: self }),
            },
            [b'-', option, rest @ ..] => self.short(*option, rest, visitor),
            positional => visitor.visit_positional(Arg(positional)),
        })
    }
}

/// Takes the next command line argument
struct NextArg<'a, 'arg, I> {
    parser: &'a mut ArgumentsParser<'arg, I>,
}

impl<'arg, I> ArgAccess<'arg> for NextArg<'_, 'arg, I>
where
    I: Iterator<Item = &'arg [u8]>,
{
    fn take(self) -> Option<Arg<'arg>> {
        match self.parser.args.next()? {
            b"--" => {
                self.parser.mode = Mode::Trailing;
                None
            }
            argument => Some(Arg(argument)),
        }
    }

    #[inline]
    fn take_attached(self) -> Option<Arg<'arg>> {
        None
    }
}

/// Takes the rest of a short cluster, so `-ovalue` means `-o value`
struct Attached<'a, 'arg> {
    rest: &'arg [u8],
    mode: &'a mut Mode<'arg>,
}

impl<'arg> ArgAccess<'arg> for Attached<'_, 'arg> {
    fn take(self) -> Option<Arg<'arg>> {
        *self.mode = Mode::Options;
        Some(Arg(self.rest))
    }

    #[inline]
    fn take_attached(self) -> Option<Arg<'arg>> {
        self.take()
    }
}
