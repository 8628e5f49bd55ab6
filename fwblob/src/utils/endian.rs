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

#[cfg(test)]
#[path = "endian_test.rs"]
mod tests;

macro_rules! le_type {
    ($ne_type:ident, $le_type:ident) => {
        /// Little-endian integer stored as raw bytes, alignment 1.
        #[repr(transparent)]
        #[derive(
            ::zerocopy::KnownLayout,
            ::zerocopy::Immutable,
            ::zerocopy::IntoBytes,
            ::zerocopy::FromBytes,
            ::zerocopy::Unaligned,
            Copy,
            Clone,
            Default,
            PartialEq,
            Eq,
        )]
        pub struct $le_type {
            v: [u8; ::core::mem::size_of::<$ne_type>()],
        }

        impl $le_type {
            pub const fn new(value: $ne_type) -> Self {
                Self {
                    v: value.to_le_bytes(),
                }
            }

            pub const fn to_ne(self) -> $ne_type {
                $ne_type::from_le_bytes(self.v)
            }
        }

        impl From<$ne_type> for $le_type {
            fn from(value: $ne_type) -> Self {
                Self::new(value)
            }
        }

        impl From<$le_type> for $ne_type {
            fn from(value: $le_type) -> Self {
                value.to_ne()
            }
        }

        impl ::core::fmt::Display for $le_type {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.to_ne(), f)
            }
        }

        impl ::core::fmt::Debug for $le_type {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(stringify!($le_type))?;
                ::core::fmt::Write::write_char(f, '(')?;
                ::core::fmt::Debug::fmt(&self.to_ne(), f)?;
                ::core::fmt::Write::write_char(f, ')')
            }
        }

        impl ::core::fmt::LowerHex for $le_type {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::LowerHex::fmt(&self.to_ne(), f)
            }
        }
    };
}

le_type!(u16, Lu16);
le_type!(u32, Lu32);
le_type!(u64, Lu64);
