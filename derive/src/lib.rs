//! `#[derive(Record)]` for collectfig.
//!
//! Generates the field walk for a struct with named fields:
//!
//! ```ignore
//! #[derive(Record)]
//! struct Config {
//!     /// Port to listen on.
//!     #[config(tag = "env=LISTEN_PORT,flag=p")]
//!     port: u16,
//!     #[config(nested)]
//!     db: Db,
//!     #[config(skip)]
//!     runtime_only: Handle,
//! }
//! ```
//!
//! - `nested` walks the field as a sub-record instead of assigning it.
//! - `tag = "..."` declares naming overrides (checked when the record is
//!   first walked).
//! - `skip` leaves the field out entirely.
//!
//! The first line of a field's doc comment becomes its flag help text.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(Record, attributes(config))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    nested: bool,
    skip: bool,
    tag: Option<LitStr>,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut calls = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        // Named fields always have an ident.
        let Some(member) = &field.ident else {
            continue;
        };
        let name = member.unraw().to_string();
        let tag = attrs
            .tag
            .unwrap_or_else(|| LitStr::new("", proc_macro2::Span::call_site()));
        let doc = match doc_line(&field.attrs) {
            Some(line) => quote!(::core::option::Option::Some(#line)),
            None => quote!(::core::option::Option::None),
        };

        calls.push(if attrs.nested {
            quote!(__discovery.nested(#name, #tag, #doc, &mut self.#member);)
        } else {
            quote!(__discovery.value(#name, #tag, #doc, &mut self.#member);)
        });
    }

    Ok(quote! {
        impl #impl_generics ::collectfig::Record for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn fields<'__collectfig>(
                &'__collectfig mut self,
                __discovery: &mut ::collectfig::Discovery<'__collectfig>,
            ) {
                #(#calls)*
            }
        }
    })
}

fn field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nested") {
                out.nested = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else if meta.path.is_ident("tag") {
                out.tag = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown config attribute (expected nested, skip or tag)"))
            }
        })?;
    }
    Ok(out)
}

/// First non-empty line of the field's doc comment, trimmed.
fn doc_line(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.trim().to_string())
        .find(|line| !line.is_empty())
}
