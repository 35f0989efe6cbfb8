/*!
The record model: how a user-defined struct describes itself to the parser.

Rust has no runtime reflection, so `#[derive(Command)]` generates two things
for each record struct:

- a [`Record`] implementation, which lets the parser write into a field,
  check whether a field is still zero, and descend into a subcommand field,
  all by field index;
- a [`Command`] implementation, whose [`declare`][Command::declare] returns
  the raw, unvalidated field declarations. These are turned into a
  [`CommandSpec`][crate::metadata::CommandSpec] by the
  [`metadata`][crate::metadata] module.

The free functions in this module are the building blocks the derive uses in
the generated `Record` methods. They're public so that the generated code can
reach them, and so that records can be written by hand if necessary.
*/

use std::any::TypeId;

use crate::value::{Coerced, ScalarKind, Value};

/// The container shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A plain value, like `u16`
    Single,

    /// An `Option<T>`; the zero value is `None`
    Optional,

    /// A `Vec<T>`; the zero value is empty
    Slice,
}

/// How a coerced value is written into a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    /// Overwrite the field. For slices, the field becomes a single element
    /// slice.
    Replace,

    /// Add to the field. Only meaningful for slices; other shapes are
    /// overwritten.
    Append,
}

/// What kind of thing a declared field is
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A field holding one or more scalar values
    Scalar { shape: Shape, kind: ScalarKind },

    /// A lazily allocated subcommand record
    Subcommand { declare: fn() -> CommandDecl },
}

/// The raw declaration of a single field, exactly as written on the struct.
/// Nothing here has been validated yet.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// The name of the field in the struct
    pub name: &'static str,

    /// The comma separated annotation, like `"-v,--verbose,env"`
    pub tag: &'static str,

    pub help: &'static str,
    pub default: Option<&'static str>,
    pub placeholder: Option<&'static str>,
    pub min: Option<&'static str>,
    pub max: Option<&'static str>,
    pub minlen: Option<&'static str>,
    pub maxlen: Option<&'static str>,
    pub group: Option<&'static str>,

    pub kind: FieldKind,
}

/// The raw declaration of a record type. The position of each field in
/// `fields` is the index used with the [`Record`] methods.
#[derive(Debug, Clone)]
pub struct CommandDecl {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub about: &'static str,
    pub fields: Vec<FieldDecl>,
}

/**
Field-level access to a record. All methods take a field index, which is the
position of the field in the record's [`CommandDecl`].

This trait is object safe; the parser works with `&mut dyn Record` so that it
can walk a tree of subcommand records of different types.
*/
pub trait Record {
    /// Write a coerced value into a scalar field. The error is a
    /// human-readable message, usually from the value's own parser.
    fn store(&mut self, field: usize, value: Coerced, store: Store) -> Result<(), String>;

    /// True if the field currently holds its zero value. Subcommand fields
    /// are zero when they haven't been activated.
    fn is_zero(&self, field: usize) -> bool;

    /// Get the record behind a subcommand field, allocating it with its
    /// [`Default`] if it's currently empty. Returns `None` if the field isn't
    /// a subcommand.
    fn subcommand(&mut self, field: usize) -> Option<&mut dyn Record>;
}

/// A record type that can be the root of a parse, or a subcommand.
pub trait Command: Record + Default + 'static {
    fn declare() -> CommandDecl;
}

#[inline]
pub fn store_single<T: Value>(slot: &mut T, value: Coerced, _store: Store) -> Result<(), String> {
    *slot = T::from_coerced(value)?;
    Ok(())
}

#[inline]
pub fn store_optional<T: Value>(
    slot: &mut Option<T>,
    value: Coerced,
    _store: Store,
) -> Result<(), String> {
    *slot = Some(T::from_coerced(value)?);
    Ok(())
}

pub fn store_slice<T: Value>(slot: &mut Vec<T>, value: Coerced, store: Store) -> Result<(), String> {
    let value = T::from_coerced(value)?;

    if store == Store::Replace {
        slot.clear();
    }

    slot.push(value);
    Ok(())
}

#[inline]
#[must_use]
pub fn single_is_zero<T: Value>(slot: &T) -> bool {
    slot.is_zero()
}

#[inline]
#[must_use]
pub fn optional_is_zero<T>(slot: &Option<T>) -> bool {
    slot.is_none()
}

#[inline]
#[must_use]
pub fn slice_is_zero<T>(slot: &[T]) -> bool {
    slot.is_empty()
}

/// Activate an `Option<C>` subcommand field
#[inline]
pub fn activate<C: Command>(slot: &mut Option<C>) -> &mut dyn Record {
    slot.get_or_insert_with(C::default)
}

/// Activate an `Option<Box<C>>` subcommand field
#[inline]
pub fn activate_boxed<C: Command>(slot: &mut Option<Box<C>>) -> &mut dyn Record {
    &mut **slot.get_or_insert_with(Box::default)
}

/// The error for a [`Record::store`] call with an index that isn't a scalar
/// field of the record
#[must_use]
pub fn no_such_field(record: &str, field: usize) -> String {
    format!("{record} has no value field with index {field}")
}
