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

mod errors;
mod kind;
mod layout;

use proc_macro::TokenStream;

/// Adds an implicit `snafu::Location` to every variant of an error enum and
/// marks `source`/`error` fields for snafu.
#[proc_macro_attribute]
pub fn trace_error(attr: TokenStream, item: TokenStream) -> TokenStream {
    errors::trace_error(attr, item)
}

/// Implements `DebugTrace` and a `Debug` that prints the location chain.
#[proc_macro_derive(DebugTrace)]
pub fn derive_debug_trace(input: TokenStream) -> TokenStream {
    errors::derive_debug_trace(input)
}

/// Implements `kind()` from per-variant `#[kind(...)]` attributes.
#[proc_macro_derive(ErrorKind, attributes(kind))]
pub fn derive_error_kind(input: TokenStream) -> TokenStream {
    kind::derive_error_kind(input)
}

/// Generates `OFFSET_*`/`SIZE_*` constants and a `FIELDS` table for a
/// `#[repr(C)]` wire structure.
#[proc_macro_derive(Layout)]
pub fn derive_layout(input: TokenStream) -> TokenStream {
    layout::derive_layout(input)
}
