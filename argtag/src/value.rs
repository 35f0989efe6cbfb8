/*!
Implementations of [`Value`] for various primitive and standard library
types, along with the [`ParsedValue`] shortcut for types with a [`FromStr`]
implementation.

A [`Value`] is the element type of a field: a `u16` field, an
`Option<u16>` field and a `Vec<u16>` field all use `u16`'s implementation.
Text from the command line is first turned into a [`Coerced`] by the
[`coerce`][crate::coerce] module according to the value's [`ScalarKind`],
then narrowed into the concrete type by [`Value::from_coerced`].
 */

use std::{
    any::type_name,
    fmt::{self, Display},
    path::PathBuf,
    str::FromStr,
};

use joinery::JoinableIterator as _;

/// The semantic category of a scalar value. This decides how text is
/// coerced and which bounds are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Str,

    /// A user type with its own textual parsing
    User { name: &'static str },
}

impl ScalarKind {
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarKind::Int { .. } | ScalarKind::Uint { .. } | ScalarKind::Float { .. }
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, ScalarKind::Str)
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ScalarKind::Bool => f.write_str("bool"),
            ScalarKind::Int { bits } => write!(f, "i{bits}"),
            ScalarKind::Uint { bits } => write!(f, "u{bits}"),
            ScalarKind::Float { bits } => write!(f, "f{bits}"),
            ScalarKind::Str => f.write_str("string"),
            ScalarKind::User { name } => f.write_str(name),
        }
    }
}

/// A value that has been coerced from text, but not yet narrowed into its
/// final type. User types receive their text untouched, as a `Str`.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl Coerced {
    fn variant_name(&self) -> &'static str {
        match self {
            Coerced::Bool(_) => "a bool",
            Coerced::Int(_) => "a signed integer",
            Coerced::Uint(_) => "an unsigned integer",
            Coerced::Float(_) => "a float",
            Coerced::Str(_) => "a string",
        }
    }
}

/// The error message for a [`Coerced`] that doesn't match the kind a type
/// declared. This only happens with an inconsistent [`Value`] implementation.
fn mismatch<T>(value: &Coerced) -> String {
    format!(
        "{} can't be built from {}",
        type_name::<T>(),
        value.variant_name()
    )
}

/// Unwrap the text of a [`Coerced::Str`]. Used by `#[derive(Value)]` enums,
/// which always coerce as user types.
pub fn into_text(value: Coerced) -> Result<String, String> {
    match value {
        Coerced::Str(text) => Ok(text),
        other => Err(format!("expected text, got {}", other.variant_name())),
    }
}

/// The error message for text that isn't one of a fixed set of names
#[must_use]
pub fn should_be(text: &str, names: &[&str]) -> String {
    match names {
        [] => format!("{text:?} isn't a valid value"),
        [name] => format!("{text:?} should be {name}"),
        names => format!("{text:?} should be one of {}", names.iter().join_with(", ")),
    }
}

/**
A type that can be the element of a parsed field.

Most user types should implement [`ParsedValue`] instead, or use
`#[derive(Value)]` for enums and newtypes.
*/
pub trait Value: Sized {
    /// How text is coerced before it reaches [`from_coerced`][Value::from_coerced]
    fn kind() -> ScalarKind;

    /// Narrow a coerced value into this type. The coerced value is
    /// guaranteed to match [`kind`][Value::kind].
    fn from_coerced(value: Coerced) -> Result<Self, String>;

    /// True if this is the zero value of the type. Environment variables and
    /// defaults only ever replace zero values.
    fn is_zero(&self) -> bool;
}

impl Value for bool {
    #[inline]
    fn kind() -> ScalarKind {
        ScalarKind::Bool
    }

    fn from_coerced(value: Coerced) -> Result<Self, String> {
        match value {
            Coerced::Bool(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    #[inline]
    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! integers {
    ($($variant:ident: $($type:ident)*;)*) => {
        $($(
            impl Value for $type {
                #[inline]
                fn kind() -> ScalarKind {
                    ScalarKind::$variant { bits: $type::BITS }
                }

                fn from_coerced(value: Coerced) -> Result<Self, String> {
                    match value {
                        Coerced::$variant(value) => {
                            $type::try_from(value).map_err(|err| err.to_string())
                        }
                        other => Err(mismatch::<Self>(&other)),
                    }
                }

                #[inline]
                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*)*
    };
}

integers! {
    Int: i8 i16 i32 i64 isize;
    Uint: u8 u16 u32 u64 usize;
}

macro_rules! floats {
    ($($type:ident: $bits:literal),*) => {
        $(
            impl Value for $type {
                #[inline]
                fn kind() -> ScalarKind {
                    ScalarKind::Float { bits: $bits }
                }

                fn from_coerced(value: Coerced) -> Result<Self, String> {
                    match value {
                        // Range was already checked during coercion
                        Coerced::Float(value) => Ok(value as $type),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }

                #[inline]
                fn is_zero(&self) -> bool {
                    *self == 0.0
                }
            }
        )*
    };
}

floats! { f32: 32, f64: 64 }

impl Value for String {
    #[inline]
    fn kind() -> ScalarKind {
        ScalarKind::Str
    }

    fn from_coerced(value: Coerced) -> Result<Self, String> {
        match value {
            Coerced::Str(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Value for PathBuf {
    #[inline]
    fn kind() -> ScalarKind {
        ScalarKind::Str
    }

    fn from_coerced(value: Coerced) -> Result<Self, String> {
        match value {
            Coerced::Str(value) => Ok(PathBuf::from(value)),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

/**
For types with a [`FromStr`] implementation, [`ParsedValue`] automatically
gives them a [`Value`] implementation so that they can be used as command
line arguments. The [`Default`] value is treated as the zero value.

```
use std::str::FromStr;

#[derive(Debug, Default, PartialEq)]
struct Level(u8);

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "low" => Ok(Level(1)),
            "high" => Ok(Level(2)),
            _ => Err(format!("unknown level {s:?}")),
        }
    }
}

impl argtag::ParsedValue for Level {}
```
*/
pub trait ParsedValue: FromStr + Default + PartialEq {}

impl<T> Value for T
where
    T: ParsedValue,
    T::Err: Display,
{
    fn kind() -> ScalarKind {
        let name = type_name::<T>();

        ScalarKind::User {
            name: name.rsplit("::").next().unwrap_or(name),
        }
    }

    fn from_coerced(value: Coerced) -> Result<Self, String> {
        match value {
            Coerced::Str(text) => text.parse().map_err(|err: T::Err| err.to_string()),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == T::default()
    }
}
