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
use syn::{DeriveInput, Ident, parse_macro_input};

enum Kind {
    Fixed(Ident),
    Source,
}

fn variant_kind(variant: &syn::Variant) -> syn::Result<Kind> {
    let Some(attr) = variant.attrs.iter().find(|a| a.path().is_ident("kind")) else {
        return Err(syn::Error::new_spanned(
            &variant.ident,
            "missing #[kind(...)] on error variant",
        ));
    };
    let ident: Ident = attr.parse_args()?;
    if ident == "source" {
        Ok(Kind::Source)
    } else {
        Ok(Kind::Fixed(ident))
    }
}

pub fn derive_error_kind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let syn::Data::Enum(enum_data) = &input.data else {
        return syn::Error::new_spanned(name, "ErrorKind expects an enum")
            .to_compile_error()
            .into();
    };
    let mut arms = vec![];
    for variant in &enum_data.variants {
        let kind = match variant_kind(variant) {
            Ok(kind) => kind,
            Err(e) => return e.to_compile_error().into(),
        };
        let cfg_attrs = variant
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect::<Vec<_>>();
        let variant_name = &variant.ident;
        let arm = match kind {
            Kind::Fixed(kind) => quote! {
                #(#cfg_attrs)*
                #name::#variant_name { .. } => crate::errors::ErrorKind::#kind,
            },
            Kind::Source => quote! {
                #(#cfg_attrs)*
                #name::#variant_name { source, .. } => source.kind(),
            },
        };
        arms.push(arm);
    }
    quote! {
        impl #name {
            pub fn kind(&self) -> crate::errors::ErrorKind {
                match self {
                    #(#arms)*
                }
            }
        }
    }
    .into()
}
