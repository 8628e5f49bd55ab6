// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{DeriveInput, Fields, FieldsNamed, parse_macro_input, parse_quote};

fn is_source_name(field: &syn::Field) -> bool {
    matches!(field.ident.as_ref(), Some(name) if name == "source" || name == "error")
}

pub fn trace_error(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as DeriveInput);
    let syn::Data::Enum(enum_data) = &mut input.data else {
        return syn::Error::new_spanned(&input.ident, "#[trace_error] expects an enum")
            .to_compile_error()
            .into();
    };
    for variant in enum_data.variants.iter_mut() {
        if matches!(variant.fields, Fields::Unit) {
            variant.fields = Fields::Named(parse_quote!({}));
        }
        let Fields::Named(named) = &mut variant.fields else {
            return syn::Error::new_spanned(&variant.ident, "tuple variants are not supported")
                .to_compile_error()
                .into();
        };
        let location = syn::Field::parse_named
            .parse2(quote! {#[snafu(implicit)] _location: ::snafu::Location});
        match location {
            Ok(field) => named.named.push(field),
            Err(e) => return e.to_compile_error().into(),
        }
        if let Some(source) = named.named.iter_mut().find(|f| is_source_name(f)) {
            source.attrs.push(parse_quote! {#[snafu(source)]});
        }
    }
    quote! { #input }.into()
}

fn field_names(fields: &FieldsNamed) -> (bool, bool) {
    let has = |name: &str| {
        fields
            .named
            .iter()
            .any(|f| f.ident.as_ref().is_some_and(|i| i == name))
    };
    (has("source"), has("error"))
}

pub fn derive_debug_trace(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let syn::Data::Enum(enum_data) = &input.data else {
        return syn::Error::new_spanned(name, "DebugTrace expects an enum")
            .to_compile_error()
            .into();
    };
    let mut arms = vec![];
    for variant in &enum_data.variants {
        let Fields::Named(named) = &variant.fields else {
            return syn::Error::new_spanned(&variant.ident, "use #[trace_error] first")
                .to_compile_error()
                .into();
        };
        let cfg_attrs = variant
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect::<Vec<_>>();
        let variant_name = &variant.ident;
        let arm = match field_names(named) {
            (true, _) => quote! {
                #(#cfg_attrs)*
                #name::#variant_name { _location, source, .. } => {
                    let depth = source.debug_trace(f)?;
                    writeln!(f, "{depth}: {self}, at {_location}")?;
                    Ok(depth + 1)
                }
            },
            (false, true) => quote! {
                #(#cfg_attrs)*
                #name::#variant_name { _location, error, .. } => {
                    writeln!(f, "0: {error}")?;
                    writeln!(f, "1: {self}, at {_location}")?;
                    Ok(2)
                }
            },
            (false, false) => quote! {
                #(#cfg_attrs)*
                #name::#variant_name { _location, .. } => {
                    writeln!(f, "0: {self}, at {_location}")?;
                    Ok(1)
                }
            },
        };
        arms.push(arm);
    }

    quote! {
        impl DebugTrace for #name {
            #[inline(never)]
            fn debug_trace(
                &self,
                f: &mut ::std::fmt::Formatter<'_>,
            ) -> ::std::result::Result<u32, ::std::fmt::Error> {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::std::fmt::Debug for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                writeln!(f, "{self}")?;
                DebugTrace::debug_trace(self, f)?;
                Ok(())
            }
        }
    }
    .into()
}
