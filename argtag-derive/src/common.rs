use darling::{FromAttributes as _, util::SpannedValue};
use itertools::Itertools as _;
use lazy_format::lazy_format;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use syn::{
    Attribute, Expr, Field, GenericArgument, Generics, Ident, PathArguments, Type,
    spanned::Spanned as _,
};

/// An identifier, along with its string form with any `r#` prefix removed
pub struct IdentString<'a> {
    raw: &'a Ident,
    string: String,
}

impl<'a> IdentString<'a> {
    pub fn new(ident: &'a Ident) -> Self {
        let string = ident.to_string();

        Self {
            string: match string.strip_prefix("r#") {
                Some(unraw) => unraw.to_owned(),
                None => string,
            },
            raw: ident,
        }
    }

    pub fn as_str(&self) -> &str {
        self.string.as_str()
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }
}

impl ToTokens for IdentString<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        self.raw.to_tokens(tokens);
    }
}

#[derive(darling::FromAttributes, Debug, Default)]
#[darling(attributes(arg))]
pub struct RawFieldAttr {
    pub tag: Option<SpannedValue<String>>,
    pub help: Option<String>,
    pub default: Option<String>,
    pub placeholder: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub minlen: Option<String>,
    pub maxlen: Option<String>,
    pub group: Option<String>,
}

#[derive(darling::FromAttributes, Debug, Default)]
#[darling(attributes(arg))]
pub struct RawCommandAttr {
    pub about: Option<String>,
}

/// Get the lines of the `#[doc]` attributes, with the leading space of each
/// line removed.
pub fn compute_docs(attrs: &[Attribute]) -> syn::Result<Vec<String>> {
    attrs
        .iter()
        .filter_map(|attr| match attr.meta {
            syn::Meta::NameValue(ref meta) => Some(meta),
            _ => None,
        })
        .filter(|meta| meta.path.is_ident("doc"))
        .map(|meta| match meta.value {
            Expr::Lit(ref lit) => match lit.lit {
                syn::Lit::Str(ref lit) => Ok(lit.value()),
                _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
            },
            Expr::Macro(ref expr) => Err(syn::Error::new(
                expr.span(),
                "macro #[doc] attributes aren't supported",
            )),
            _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
        })
        .map_ok(|doc| doc.trim().to_owned())
        .collect()
}

/// Join doc lines into paragraphs. Lines within a paragraph are joined with
/// spaces; paragraphs are separated by a blank line.
pub fn paragraphs(lines: &[String]) -> String {
    lines
        .split(|line| line.is_empty())
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| paragraph.join(" "))
        .join("\n\n")
}

/// Join doc lines into a single line, for field help
pub fn one_line(lines: &[String]) -> String {
    lines
        .iter()
        .filter(|line| !line.is_empty())
        .join(" ")
}

/// Records and values are `'static` and can't be generic
pub fn reject_generics(generics: &Generics, derive: &str) -> syn::Result<()> {
    match generics.params.first() {
        None => Ok(()),
        Some(param) => Err(syn::Error::new(
            param.span(),
            lazy_format!("generic types aren't supported by `derive({derive})`"),
        )),
    }
}

/// If `ty` is `Wrapper<T>` (by the last path segment), get `T`
pub fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else { return None };

    if path.qself.is_some() {
        return None;
    }

    let segment = path.path.segments.last()?;

    if segment.ident != wrapper {
        return None;
    }

    let PathArguments::AngleBracketed(ref arguments) = segment.arguments else {
        return None;
    };

    match arguments.args.iter().exactly_one() {
        Ok(GenericArgument::Type(inner)) => Some(inner),
        _ => None,
    }
}

/// True if a tag string includes `subcommand` or `subcommand:name`
pub fn is_subcommand_tag(tag: &str) -> bool {
    tag.split(',')
        .map(str::trim)
        .any(|token| token == "subcommand" || token.starts_with("subcommand:"))
}

/// How a field is stored
pub enum FieldShape<'a> {
    Single(&'a Type),
    Optional(&'a Type),
    Slice(&'a Type),
    Subcommand { record: &'a Type, boxed: bool },
}

pub struct FieldInfo<'a> {
    pub ident: IdentString<'a>,
    pub attr: RawFieldAttr,
    pub tag: String,
    pub help: String,
    pub shape: FieldShape<'a>,
}

impl<'a> FieldInfo<'a> {
    /// Analyze a field. Returns `None` for fields skipped with `tag = "-"`.
    pub fn from_field(field: &'a Field) -> syn::Result<Option<Self>> {
        let mut attr = RawFieldAttr::from_attributes(&field.attrs)?;
        let docs = compute_docs(&field.attrs)?;

        let ident = field.ident.as_ref().map(IdentString::new).ok_or_else(|| {
            syn::Error::new(field.span(), "can't derive `Command` on tuple structs")
        })?;

        let (tag, tag_span) = match attr.tag.take() {
            Some(tag) => (tag.as_str().to_owned(), tag.span()),
            None => (String::new(), ident.span()),
        };

        if tag.trim() == "-" {
            return Ok(None);
        }

        let ty = &field.ty;

        let shape = if is_subcommand_tag(&tag) {
            let record = generic_argument(ty, "Option").ok_or_else(|| {
                syn::Error::new(
                    tag_span,
                    "subcommand fields must be `Option<T>` or `Option<Box<T>>`",
                )
            })?;

            match generic_argument(record, "Box") {
                Some(record) => FieldShape::Subcommand {
                    record,
                    boxed: true,
                },
                None => FieldShape::Subcommand {
                    record,
                    boxed: false,
                },
            }
        } else if let Some(inner) = generic_argument(ty, "Vec") {
            FieldShape::Slice(inner)
        } else if let Some(inner) = generic_argument(ty, "Option") {
            FieldShape::Optional(inner)
        } else {
            FieldShape::Single(ty)
        };

        let help = match attr.help.take() {
            Some(help) => help,
            None => one_line(&docs),
        };

        Ok(Some(Self {
            ident,
            attr,
            tag,
            help,
            shape,
        }))
    }
}

/// Render an optional string as an `Option<&'static str>` expression
pub fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    }
}
