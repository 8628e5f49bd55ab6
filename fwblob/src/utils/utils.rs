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

pub mod bounds;
pub mod endian;
pub mod guid;

/// Declares a transparent newtype over an integer with named constants.
///
/// Values outside the named set are still representable, so a wire field can
/// be read first and rejected afterwards.
#[macro_export]
macro_rules! consts {
    (
        $(#[$attr:meta])*
        $vs:vis struct $EnumName:ident($TyName:ty) {
            $( $(#[$vattr:meta])* $VARIANT:ident = $value:expr;)*
        }
    ) => {
        #[repr(transparent)]
        #[derive(PartialEq, Eq, Copy, Clone)]
        $(#[$attr])*
        $vs struct $EnumName($TyName);

        impl $EnumName {
            $($(#[$vattr])* pub const $VARIANT: $EnumName = $EnumName($value);)*

            #[allow(dead_code)]
            pub const fn raw(self) -> $TyName {
                self.0
            }

            #[allow(dead_code)]
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $($EnumName::$VARIANT => Some(stringify!($VARIANT)),)*
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Debug for $EnumName {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(stringify!($EnumName))?;
                match self.name() {
                    Some(name) => {
                        f.write_str("::")?;
                        f.write_str(name)
                    }
                    None => {
                        ::core::fmt::Write::write_char(f, '(')?;
                        ::core::fmt::Debug::fmt(&self.0, f)?;
                        ::core::fmt::Write::write_char(f, ')')
                    }
                }
            }
        }

        impl From<$EnumName> for $TyName {
            fn from(value: $EnumName) -> Self {
                value.0
            }
        }

        impl From<$TyName> for $EnumName {
            fn from(value: $TyName) -> Self {
                $EnumName(value)
            }
        }
    };
}

/// Decodes UTF-16LE bytes, rejecting odd lengths and unpaired surrogates.
pub fn utf16le_to_string(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let mut units = Vec::with_capacity(bytes.len() / 2 + 1);
    for pair in bytes.chunks_exact(2) {
        units.push(u16::from_le_bytes([pair[0], pair[1]]));
    }
    String::from_utf16(&units).ok()
}

/// Encodes `s` as UTF-16LE without a terminator.
pub fn string_to_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[cfg(test)]
mod test {
    use super::{string_to_utf16le, utf16le_to_string};

    consts! {
        pub struct Color(u16) {
            RED = 1;
            BLUE = 4;
        }
    }

    #[test]
    fn test_consts() {
        assert_eq!(Color::RED.raw(), 1);
        assert_eq!(Color::from(4), Color::BLUE);
        assert_eq!(format!("{:?}", Color::BLUE), "Color::BLUE");
        assert_eq!(format!("{:?}", Color::from(9)), "Color(9)");
        assert_eq!(Color::from(9).name(), None);
    }

    #[test]
    fn test_utf16le() {
        let bytes = string_to_utf16le("UEFI");
        assert_eq!(bytes, b"U\0E\0F\0I\0");
        assert_eq!(utf16le_to_string(&bytes).as_deref(), Some("UEFI"));
        assert_eq!(utf16le_to_string(b"U\0E"), None);
        assert_eq!(utf16le_to_string(&[0x00, 0xd8]), None);
        assert_eq!(utf16le_to_string(&[]).as_deref(), Some(""));
    }
}
