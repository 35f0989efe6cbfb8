use heck::ToKebabCase as _;
use itertools::Itertools as _;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens as _, quote};
use syn::{
    Data, DeriveInput, Fields, FieldsNamed, FieldsUnnamed, Ident, Index, Token, Type, Variant,
    punctuated::Punctuated, spanned::Spanned as _,
};

use crate::common::reject_generics;

/// A variant holding a single value, used when the text doesn't match any
/// of the unit variants
struct Fallback<'a> {
    variant: &'a Ident,
    field: Option<&'a Ident>,
    ty: &'a Type,
}

struct AnalyzedEnum<'a> {
    variants: Vec<(String, &'a Ident)>,
    fallback: Option<Fallback<'a>>,
}

impl<'a> AnalyzedEnum<'a> {
    fn from_variants(variants: impl IntoIterator<Item = &'a Variant>) -> syn::Result<Self> {
        let mut fallback = None;
        let mut collected = Vec::new();

        for variant in variants {
            match variant.fields {
                Fields::Unit => {
                    collected.push((variant.ident.to_string().to_kebab_case(), &variant.ident));
                }
                Fields::Unnamed(FieldsUnnamed {
                    unnamed: ref fields,
                    ..
                })
                | Fields::Named(FieldsNamed {
                    named: ref fields, ..
                }) => match fields.iter().exactly_one() {
                    Ok(field) => match fallback {
                        Some(_) => {
                            return Err(syn::Error::new(
                                variant.span(),
                                "more than one fallback variant",
                            ));
                        }
                        None => {
                            fallback = Some(Fallback {
                                variant: &variant.ident,
                                field: field.ident.as_ref(),
                                ty: &field.ty,
                            })
                        }
                    },
                    Err(_) => {
                        return Err(syn::Error::new(
                            variant.span(),
                            "variant with more than one field",
                        ));
                    }
                },
            }
        }

        if let Some((name, _)) = collected.iter().duplicates_by(|(name, _)| name).next() {
            return Err(syn::Error::new(
                Span::call_site(),
                format!("more than one variant is named {name:?}"),
            ));
        }

        Ok(AnalyzedEnum {
            variants: collected,
            fallback,
        })
    }
}

fn derive_value_enum(
    ident: &Ident,
    variants: &Punctuated<Variant, Token![,]>,
) -> syn::Result<TokenStream2> {
    let analyzed = AnalyzedEnum::from_variants(variants)?;

    let unit_arms = analyzed.variants.iter().map(|(name, variant)| {
        quote! {
            #name => ::core::result::Result::Ok(Self::#variant),
        }
    });

    let names = analyzed.variants.iter().map(|(name, _)| name.as_str());

    let fallback_arm = match analyzed.fallback {
        Some(ref fallback) => {
            let variant = fallback.variant;
            let ty = fallback.ty;

            let body = match fallback.field {
                Some(field) => quote! { { #field: value } },
                None => quote! { ( value ) },
            };

            quote! {
                _ => {
                    let value = ::argtag::coerce::coerce(
                        &text,
                        <#ty as ::argtag::value::Value>::kind(),
                    )
                    .map_err(|err| ::std::string::ToString::to_string(&err))?;

                    let value = <#ty as ::argtag::value::Value>::from_coerced(value)?;
                    ::core::result::Result::Ok(Self::#variant #body)
                }
            }
        }
        None => quote! {
            _ => ::core::result::Result::Err(
                ::argtag::value::should_be(&text, &[ #(#names,)* ])
            ),
        },
    };

    // The first unit variant is the zero value
    let is_zero = match analyzed.variants.first() {
        Some((_, variant)) => quote! { ::core::matches!(self, Self::#variant) },
        None => quote! { false },
    };

    let type_name = ident.to_string();

    Ok(quote! {
        impl ::argtag::value::Value for #ident {
            fn kind() -> ::argtag::value::ScalarKind {
                ::argtag::value::ScalarKind::User { name: #type_name }
            }

            fn from_coerced(
                value: ::argtag::value::Coerced,
            ) -> ::core::result::Result<Self, ::std::string::String> {
                let text = ::argtag::value::into_text(value)?;

                match text.to_ascii_lowercase().as_str() {
                    #(#unit_arms)*
                    #fallback_arm
                }
            }

            fn is_zero(&self) -> bool {
                #is_zero
            }
        }
    })
}

fn derive_value_newtype(ident: &Ident, field: Option<&Ident>, ty: &Type) -> TokenStream2 {
    let (struct_body, access) = match field {
        Some(field) => (quote! { { #field: value } }, field.into_token_stream()),
        None => (quote! { ( value ) }, Index::from(0).into_token_stream()),
    };

    quote! {
        impl ::argtag::value::Value for #ident {
            #[inline]
            fn kind() -> ::argtag::value::ScalarKind {
                <#ty as ::argtag::value::Value>::kind()
            }

            fn from_coerced(
                value: ::argtag::value::Coerced,
            ) -> ::core::result::Result<Self, ::std::string::String> {
                let value = <#ty as ::argtag::value::Value>::from_coerced(value)?;
                ::core::result::Result::Ok(Self #struct_body)
            }

            #[inline]
            fn is_zero(&self) -> bool {
                <#ty as ::argtag::value::Value>::is_zero(&self.#access)
            }
        }
    }
}

pub fn derive_value_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;
    reject_generics(&input.generics, "Value")?;

    match input.data {
        Data::Struct(ref data) => {
            let field = data.fields.iter().exactly_one().map_err(|_| {
                syn::Error::new(
                    input.span(),
                    "can only derive `Value` on structs with exactly one field",
                )
            })?;

            Ok(derive_value_newtype(
                &input.ident,
                field.ident.as_ref(),
                &field.ty,
            ))
        }
        Data::Enum(ref data) => derive_value_enum(&input.ident, &data.variants),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Value` on a union",
        )),
    }
}
