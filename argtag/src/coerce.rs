/*!
Text to value conversion, and numeric / length bounds.

[`coerce`] is value-blind with respect to the field it's used for: it knows
only the [`ScalarKind`]. Bounds are checked separately, with
[`Bounds::check`], because they're a property of the field rather than of
the type.
 */

use std::{
    fmt::{self, Display},
    num::IntErrorKind,
};

use crate::value::{Coerced, ScalarKind};

/// Everything that can go wrong turning text into a value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CoerceError {
    #[error("expected a boolean (true/false, yes/no, on/off, 1/0)")]
    NotABool,

    #[error("expected an integer")]
    NotAnInteger,

    #[error("expected a number")]
    NotAFloat,

    #[error("negative values aren't allowed")]
    Negative,

    #[error("out of range for {kind}")]
    Overflow { kind: ScalarKind },

    #[error("must be at least {min}")]
    BelowMin { min: Bound },

    #[error("must be at most {max}")]
    AboveMax { max: Bound },

    #[error("must be at least {minlen} characters long")]
    TooShort { minlen: usize },

    #[error("must be at most {maxlen} characters long")]
    TooLong { maxlen: usize },

    #[error("argument wasn't valid UTF-8")]
    InvalidUtf8,

    /// The type's own parser rejected the text
    #[error("{0}")]
    Custom(String),
}

/// Parse a boolean the lenient way: `1 t true yes on` and
/// `0 f false no off`, case insensitive.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    const TRUE: &[&str] = &["1", "t", "true", "yes", "on"];
    const FALSE: &[&str] = &["0", "f", "false", "no", "off"];

    if TRUE.iter().any(|word| word.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE.iter().any(|word| word.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

fn signed_range(bits: u32) -> (i64, i64) {
    match bits {
        64.. => (i64::MIN, i64::MAX),
        bits => (-(1 << (bits - 1)), (1 << (bits - 1)) - 1),
    }
}

fn unsigned_max(bits: u32) -> u64 {
    match bits {
        64.. => u64::MAX,
        bits => (1 << bits) - 1,
    }
}

/// Convert `text` into a [`Coerced`] value according to `kind`. Integers are
/// base 10 and checked against the width of the kind. User types get the
/// text as-is, to be parsed by their own [`Value`][crate::Value]
/// implementation.
pub fn coerce(text: &str, kind: ScalarKind) -> Result<Coerced, CoerceError> {
    match kind {
        ScalarKind::Bool => parse_bool(text)
            .map(Coerced::Bool)
            .ok_or(CoerceError::NotABool),
        ScalarKind::Int { bits } => {
            let value: i64 = text.parse().map_err(|err: std::num::ParseIntError| {
                match err.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        CoerceError::Overflow { kind }
                    }
                    _ => CoerceError::NotAnInteger,
                }
            })?;

            let (min, max) = signed_range(bits);
            match (min..=max).contains(&value) {
                true => Ok(Coerced::Int(value)),
                false => Err(CoerceError::Overflow { kind }),
            }
        }
        ScalarKind::Uint { bits } => {
            if text.starts_with('-') {
                return Err(match text[1..].bytes().all(|b| b.is_ascii_digit()) && text.len() > 1 {
                    true => CoerceError::Negative,
                    false => CoerceError::NotAnInteger,
                });
            }

            let value: u64 = text.parse().map_err(|err: std::num::ParseIntError| {
                match err.kind() {
                    IntErrorKind::PosOverflow => CoerceError::Overflow { kind },
                    _ => CoerceError::NotAnInteger,
                }
            })?;

            match value <= unsigned_max(bits) {
                true => Ok(Coerced::Uint(value)),
                false => Err(CoerceError::Overflow { kind }),
            }
        }
        ScalarKind::Float { bits } => {
            let value: f64 = text.trim().parse().map_err(|_| CoerceError::NotAFloat)?;

            // Finite values that don't fit in an f32 become infinite
            if bits <= 32 && value.is_finite() && (value as f32).is_infinite() {
                return Err(CoerceError::Overflow { kind });
            }

            Ok(Coerced::Float(value))
        }
        ScalarKind::Str | ScalarKind::User { .. } => Ok(Coerced::Str(text.to_owned())),
    }
}

/// A numeric bound, already parsed according to the kind of its field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Bound {
    /// Parse the text of a `min` or `max` attribute for a field of the given
    /// kind. Returns `None` if the text isn't a valid value of that kind.
    #[must_use]
    pub fn parse(text: &str, kind: ScalarKind) -> Option<Self> {
        match coerce(text, kind).ok()? {
            Coerced::Int(value) => Some(Bound::Int(value)),
            Coerced::Uint(value) => Some(Bound::Uint(value)),
            Coerced::Float(value) if !value.is_nan() => Some(Bound::Float(value)),
            _ => None,
        }
    }

    /// Compare a coerced value with this bound. Returns `None` when they
    /// can't be compared (mismatched kinds, or NaN).
    fn compare(&self, value: &Coerced) -> Option<std::cmp::Ordering> {
        match (value, *self) {
            (&Coerced::Int(value), Bound::Int(bound)) => Some(value.cmp(&bound)),
            (&Coerced::Uint(value), Bound::Uint(bound)) => Some(value.cmp(&bound)),
            (&Coerced::Float(value), Bound::Float(bound)) => value.partial_cmp(&bound),
            _ => None,
        }
    }
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (*self, *other) {
            (Bound::Int(lhs), Bound::Int(rhs)) => lhs.partial_cmp(&rhs),
            (Bound::Uint(lhs), Bound::Uint(rhs)) => lhs.partial_cmp(&rhs),
            (Bound::Float(lhs), Bound::Float(rhs)) => lhs.partial_cmp(&rhs),
            _ => None,
        }
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Bound::Int(value) => Display::fmt(&value, f),
            Bound::Uint(value) => Display::fmt(&value, f),
            Bound::Float(value) => Display::fmt(&value, f),
        }
    }
}

/// The `min`, `max`, `minlen` and `maxlen` constraints of a field
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub minlen: Option<usize>,
    pub maxlen: Option<usize>,
}

impl Bounds {
    /// Check a coerced value against these bounds. Lengths are measured in
    /// bytes (UTF-8 code units). A NaN fails any numeric bound.
    pub fn check(&self, value: &Coerced) -> Result<(), CoerceError> {
        use std::cmp::Ordering::*;

        if let Some(min) = self.min
            && !matches!(min.compare(value), Some(Greater | Equal))
        {
            return Err(CoerceError::BelowMin { min });
        }

        if let Some(max) = self.max
            && !matches!(max.compare(value), Some(Less | Equal))
        {
            return Err(CoerceError::AboveMax { max });
        }

        if let Coerced::Str(text) = value {
            if let Some(minlen) = self.minlen
                && text.len() < minlen
            {
                return Err(CoerceError::TooShort { minlen });
            }

            if let Some(maxlen) = self.maxlen
                && text.len() > maxlen
            {
                return Err(CoerceError::TooLong { maxlen });
            }
        }

        Ok(())
    }
}
