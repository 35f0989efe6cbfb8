/*!
Derive macros for `argtag`. Don't use this crate directly; the macros are
re-exported by `argtag` itself.
*/

mod command;
mod common;
mod value;

use proc_macro::TokenStream;

/// Derive `argtag::Record` and `argtag::Command` for a struct with named
/// fields. Each field is configured with `#[arg(...)]`; see the `argtag`
/// crate docs for the tag syntax.
#[proc_macro_derive(Command, attributes(arg))]
pub fn derive_command(item: TokenStream) -> TokenStream {
    match command::derive_command_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `argtag::Value` for an enum of unit variants (matched by their
/// kebab-case names, ignoring case, with at most one single-field fallback
/// variant), or for a newtype struct.
#[proc_macro_derive(Value)]
pub fn derive_value(item: TokenStream) -> TokenStream {
    match value::derive_value_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
