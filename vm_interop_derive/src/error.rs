//! `#[derive(Error)]` expansion.
//!
//! ```ignore
//! use vm_interop_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum LoadError {
//!     #[error("script {0} not found")]
//!     Missing(String),
//!
//!     #[error("limit exceeded: {actual} > {limit}")]
//!     Limit { limit: usize, actual: usize },
//!
//!     #[error("malformed input: {0}")]
//!     Format(#[from] FormatError),
//! }
//! ```
//!
//! Placeholders are `{0}`, `{1}` for tuple fields and `{name}` for named fields, with
//! any format spec after a colon (`{0:?}`). Fields the message does not mention are
//! not bound, so a message may describe only part of a variant.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, Member, Type, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A field as seen by the generated code.
struct FieldInfo<'a> {
    member: Member,
    binding: Ident,
    /// Name used for the field inside message placeholders.
    placeholder: String,
    ty: &'a Type,
    is_from: bool,
    is_source: bool,
}

impl FieldInfo<'_> {
    /// Field pattern binding the field to `binding`, in shorthand for named fields.
    fn pattern(&self) -> TokenStream2 {
        let binding = &self.binding;
        match &self.member {
            Member::Named(ident) if *ident == *binding => quote! { #ident },
            member => quote! { #member: #binding },
        }
    }
}

fn collect_fields(fields: &Fields) -> Vec<FieldInfo<'_>> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let (member, binding, placeholder) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.clone(), ident.to_string()),
                None => (Member::from(i), format_ident!("field{}", i), i.to_string()),
            };
            let is_from = has_attr(&field.attrs, "from");
            FieldInfo {
                member,
                binding,
                placeholder,
                ty: &field.ty,
                is_from,
                is_source: is_from || has_attr(&field.attrs, "source"),
            }
        })
        .collect()
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (display_body, source_body, from_impls) = match &input.data {
        Data::Enum(data) => {
            let mut display_arms = Vec::new();
            let mut source_arms = Vec::new();
            let mut from_impls = Vec::new();

            for variant in &data.variants {
                let ident = &variant.ident;
                let fields = collect_fields(&variant.fields);
                let message = message_of(&variant.attrs, variant)?;
                let (format, used) = rewrite_message(&message, &fields);

                let patterns = used_fields(&fields, &used).map(FieldInfo::pattern);
                let bindings: Vec<_> = used_fields(&fields, &used).map(|f| &f.binding).collect();
                display_arms.push(quote! {
                    Self::#ident { #(#patterns,)* .. } => {
                        ::std::write!(f, #format #(, #bindings = #bindings)*)
                    }
                });

                if let Some(source) = fields.iter().find(|f| f.is_source) {
                    let member = &source.member;
                    source_arms.push(quote! {
                        Self::#ident { #member: source, .. } => {
                            ::std::option::Option::Some(source as &(dyn ::std::error::Error + 'static))
                        }
                    });
                }

                if let Some(from) = fields.iter().find(|f| f.is_from) {
                    if fields.len() != 1 {
                        return Err(syn::Error::new_spanned(
                            variant,
                            "#[from] requires the variant to have exactly one field",
                        ));
                    }
                    let member = &from.member;
                    let ty = from.ty;
                    from_impls.push(quote! {
                        impl #impl_generics ::std::convert::From<#ty> for #name #ty_generics #where_clause {
                            fn from(source: #ty) -> Self {
                                Self::#ident { #member: source }
                            }
                        }
                    });
                }
            }

            let display_body = if display_arms.is_empty() {
                quote! { match *self {} }
            } else {
                quote! { match self { #(#display_arms)* } }
            };
            let source_body = quote! {
                match self {
                    #(#source_arms)*
                    #[allow(unreachable_patterns)]
                    _ => ::std::option::Option::None,
                }
            };
            (display_body, source_body, from_impls)
        }
        Data::Struct(data) => {
            let fields = collect_fields(&data.fields);
            let message = message_of(&input.attrs, &input.ident)?;
            let (format, used) = rewrite_message(&message, &fields);
            let patterns = used_fields(&fields, &used).map(FieldInfo::pattern);
            let bindings: Vec<_> = used_fields(&fields, &used).map(|f| &f.binding).collect();

            let display_body = quote! {
                let Self { #(#patterns,)* .. } = self;
                ::std::write!(f, #format #(, #bindings = #bindings)*)
            };
            let source_body = match fields.iter().find(|f| f.is_source) {
                Some(source) => {
                    let member = &source.member;
                    quote! {
                        ::std::option::Option::Some(&self.#member as &(dyn ::std::error::Error + 'static))
                    }
                }
                None => quote! { ::std::option::Option::None },
            };
            (display_body, source_body, Vec::new())
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                #source_body
            }
        }

        #(#from_impls)*
    })
}

fn used_fields<'f, 'a>(
    fields: &'f [FieldInfo<'a>],
    used: &'f [bool],
) -> impl Iterator<Item = &'f FieldInfo<'a>> {
    fields.iter().zip(used).filter(|(_, used)| **used).map(|(f, _)| f)
}

/// Reads the string literal of the `#[error("...")]` attribute.
fn message_of<T: ToTokens>(attrs: &[Attribute], target: &T) -> syn::Result<String> {
    let attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                target,
                "missing #[error(\"...\")] attribute; every error variant needs a display message",
            )
        })?;
    let lit: LitStr = attr.parse_args().map_err(|_| {
        syn::Error::new_spanned(
            &attr.meta,
            "expected a string literal, e.g. #[error(\"invalid tag: {0}\")]",
        )
    })?;
    Ok(lit.value())
}

/// Rewrites placeholders to the local binding names and reports which fields are used.
fn rewrite_message(message: &str, fields: &[FieldInfo<'_>]) -> (String, Vec<bool>) {
    let mut used = vec![false; fields.len()];
    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(escaped) = after.strip_prefix('{') {
            out.push_str("{{");
            rest = escaped;
            continue;
        }
        let end = after.find(['}', ':']).unwrap_or(after.len());
        let name = &after[..end];
        out.push('{');
        match fields.iter().position(|f| f.placeholder == name) {
            Some(idx) => {
                used[idx] = true;
                out.push_str(&fields[idx].binding.to_string());
            }
            None => out.push_str(name),
        }
        rest = &after[end..];
    }
    out.push_str(rest);
    (out, used)
}
