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
#[path = "lookup_test.rs"]
mod tests;

use crate::policy::rule::locate_string;
use crate::policy::{NAME_SEPARATOR, POLICY_ROOT_KEY, PolicyRule, Result, RuleRef, error};

/// Splits `Subkey\ValueName` at the first separator.
///
/// A name without a separator, or with nothing on either side of it, can
/// never match a rule.
pub fn split_name(name: &str) -> Option<(&str, &str)> {
    let (subkey, value_name) = name.split_once(NAME_SEPARATOR)?;
    if subkey.is_empty() || value_name.is_empty() {
        return None;
    }
    Some((subkey, value_name))
}

/// Compares UTF-16LE code units with `s`, exact length and case.
fn utf16le_eq(bytes: &[u8], s: &str) -> bool {
    let mut units = s.encode_utf16();
    for pair in bytes.chunks_exact(2) {
        if units.next() != Some(u16::from_le_bytes([pair[0], pair[1]])) {
            return false;
        }
    }
    units.next().is_none()
}

fn string_matches(
    table: &[u8],
    offset: u32,
    index: usize,
    what: &'static str,
    expected: &str,
) -> Result<bool> {
    let range = locate_string(table, offset as usize, index, what)?;
    Ok(utf16le_eq(&table[range], expected))
}

/// Returns the first rule whose subkey and value name equal the two halves
/// of `name`.
pub fn find_rule<'a>(rules: &'a [PolicyRule], value_table: &[u8], name: &str) -> Result<RuleRef<'a>> {
    let Some((subkey, value_name)) = split_name(name) else {
        log::debug!("{name:?} is not a Subkey\\ValueName pair");
        return error::NotFound { name }.fail();
    };
    for (index, rule) in rules.iter().enumerate() {
        if rule.root_key.to_ne() != POLICY_ROOT_KEY {
            continue;
        }
        let offset = rule.offset_to_subkey_name.to_ne();
        if !string_matches(value_table, offset, index, "subkey name", subkey)? {
            continue;
        }
        let offset = rule.offset_to_value_name.to_ne();
        if string_matches(value_table, offset, index, "value name", value_name)? {
            log::trace!("{name:?} found at rule {index}");
            return Ok(RuleRef { index, rule });
        }
    }
    error::NotFound { name }.fail()
}
