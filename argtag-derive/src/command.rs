use darling::FromAttributes as _;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DataStruct, DeriveInput, Fields, Ident, spanned::Spanned as _};

use crate::common::{
    FieldInfo, FieldShape, RawCommandAttr, compute_docs, option_str, paragraphs, reject_generics,
};

/// The generated pieces for one field: its arms in each `Record` method,
/// and its declaration
struct FieldCode {
    store: Option<TokenStream2>,
    is_zero: TokenStream2,
    subcommand: Option<TokenStream2>,
    declaration: TokenStream2,
}

fn field_code(index: usize, field: &FieldInfo<'_>) -> FieldCode {
    let index = Literal::usize_unsuffixed(index);
    let ident = &field.ident;

    let (store, is_zero, subcommand, kind) = match field.shape {
        FieldShape::Single(ty) => (
            Some(quote! { ::argtag::record::store_single(&mut self.#ident, value, store) }),
            quote! { ::argtag::record::single_is_zero(&self.#ident) },
            None,
            quote! {
                ::argtag::record::FieldKind::Scalar {
                    shape: ::argtag::record::Shape::Single,
                    kind: <#ty as ::argtag::value::Value>::kind(),
                }
            },
        ),
        FieldShape::Optional(ty) => (
            Some(quote! { ::argtag::record::store_optional(&mut self.#ident, value, store) }),
            quote! { ::argtag::record::optional_is_zero(&self.#ident) },
            None,
            quote! {
                ::argtag::record::FieldKind::Scalar {
                    shape: ::argtag::record::Shape::Optional,
                    kind: <#ty as ::argtag::value::Value>::kind(),
                }
            },
        ),
        FieldShape::Slice(ty) => (
            Some(quote! { ::argtag::record::store_slice(&mut self.#ident, value, store) }),
            quote! { ::argtag::record::slice_is_zero(&self.#ident) },
            None,
            quote! {
                ::argtag::record::FieldKind::Scalar {
                    shape: ::argtag::record::Shape::Slice,
                    kind: <#ty as ::argtag::value::Value>::kind(),
                }
            },
        ),
        FieldShape::Subcommand { record, boxed } => (
            None,
            quote! { ::core::option::Option::is_none(&self.#ident) },
            Some(match boxed {
                true => quote! {
                    ::argtag::record::activate_boxed::<#record>(&mut self.#ident)
                },
                false => quote! {
                    ::argtag::record::activate::<#record>(&mut self.#ident)
                },
            }),
            quote! {
                ::argtag::record::FieldKind::Subcommand {
                    declare: <#record as ::argtag::record::Command>::declare,
                }
            },
        ),
    };

    let name = field.ident.as_str();
    let tag = field.tag.as_str();
    let help = field.help.as_str();
    let attr = &field.attr;

    let default = option_str(attr.default.as_deref());
    let placeholder = option_str(attr.placeholder.as_deref());
    let min = option_str(attr.min.as_deref());
    let max = option_str(attr.max.as_deref());
    let minlen = option_str(attr.minlen.as_deref());
    let maxlen = option_str(attr.maxlen.as_deref());
    let group = option_str(attr.group.as_deref());

    FieldCode {
        store: store.map(|body| quote! { #index => #body, }),
        is_zero: quote! { #index => #is_zero, },
        subcommand: subcommand
            .map(|body| quote! { #index => ::core::option::Option::Some(#body), }),
        declaration: quote! {
            ::argtag::record::FieldDecl {
                name: #name,
                tag: #tag,
                help: #help,
                default: #default,
                placeholder: #placeholder,
                min: #min,
                max: #max,
                minlen: #minlen,
                maxlen: #maxlen,
                group: #group,
                kind: #kind,
            }
        },
    }
}

fn derive_command_struct(
    ident: &Ident,
    data: &DataStruct,
    attrs: &[Attribute],
) -> syn::Result<TokenStream2> {
    let fields = match data.fields {
        Fields::Named(ref fields) => &fields.named,
        Fields::Unnamed(ref fields) => {
            return Err(syn::Error::new(
                fields.span(),
                "can't derive `Command` on tuple structs",
            ));
        }
        Fields::Unit => {
            return Err(syn::Error::new(
                ident.span(),
                "can't derive `Command` on unit structs; use a struct with no fields",
            ));
        }
    };

    let attr = RawCommandAttr::from_attributes(attrs)?;
    let about = match attr.about {
        Some(about) => about,
        None => paragraphs(&compute_docs(attrs)?),
    };

    let infos = fields
        .iter()
        .filter_map(|field| FieldInfo::from_field(field).transpose())
        .collect::<syn::Result<Vec<_>>>()?;

    let code: Vec<FieldCode> = infos
        .iter()
        .enumerate()
        .map(|(index, field)| field_code(index, field))
        .collect();

    let store_arms = code.iter().filter_map(|field| field.store.as_ref());
    let is_zero_arms = code.iter().map(|field| &field.is_zero);
    let subcommand_arms = code.iter().filter_map(|field| field.subcommand.as_ref());
    let declarations = code.iter().map(|field| &field.declaration);

    let type_name = ident.to_string();

    Ok(quote! {
        impl ::argtag::record::Record for #ident {
            #[allow(unused_variables)]
            fn store(
                &mut self,
                field: usize,
                value: ::argtag::value::Coerced,
                store: ::argtag::record::Store,
            ) -> ::core::result::Result<(), ::std::string::String> {
                match field {
                    #(#store_arms)*
                    _ => ::core::result::Result::Err(
                        ::argtag::record::no_such_field(#type_name, field)
                    ),
                }
            }

            #[allow(unused_variables)]
            fn is_zero(&self, field: usize) -> bool {
                match field {
                    #(#is_zero_arms)*
                    _ => true,
                }
            }

            #[allow(unused_variables)]
            fn subcommand(
                &mut self,
                field: usize,
            ) -> ::core::option::Option<&mut dyn ::argtag::record::Record> {
                match field {
                    #(#subcommand_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::argtag::record::Command for #ident {
            fn declare() -> ::argtag::record::CommandDecl {
                ::argtag::record::CommandDecl {
                    type_id: ::core::any::TypeId::of::<Self>(),
                    type_name: #type_name,
                    about: #about,
                    fields: ::std::vec![ #(#declarations,)* ],
                }
            }
        }
    })
}

pub fn derive_command_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;
    reject_generics(&input.generics, "Command")?;

    match input.data {
        Data::Struct(ref data) => derive_command_struct(&input.ident, data, &input.attrs),
        Data::Enum(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Command` on an enum; use `Option` fields tagged \
            `subcommand` for alternatives",
        )),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Command` on a union",
        )),
    }
}
