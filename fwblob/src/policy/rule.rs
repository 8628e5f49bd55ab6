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
#[path = "rule_test.rs"]
mod tests;

use std::mem::size_of;
use std::ops::Range;

use snafu::ResultExt;

use crate::policy::{
    POLICY_ROOT_KEY, PolicyRule, PolicyStringHdr, PolicyValueHdr, Result, ValueType, error,
};
use crate::utils::bounds::Cursor;

const STRING_HDR_SIZE: usize = size_of::<PolicyStringHdr>();
const VALUE_HDR_SIZE: usize = size_of::<PolicyValueHdr>();

/// Total size of a value table entry, including the terminator budget of
/// string values. `None` for unknown types.
pub fn entry_size(value_type: ValueType, string_length: u16) -> Option<usize> {
    match value_type {
        ValueType::QWORD => Some(VALUE_HDR_SIZE + size_of::<u64>()),
        ValueType::STRING => Some(
            VALUE_HDR_SIZE + STRING_HDR_SIZE + string_length as usize + size_of::<u16>(),
        ),
        _ => None,
    }
}

/// Range of the code units of the string at `offset`.
///
/// The header is proven in bounds before its length is trusted.
pub(crate) fn locate_string(
    table: &[u8],
    offset: usize,
    index: usize,
    what: &'static str,
) -> Result<Range<usize>> {
    let cursor = Cursor::new(table);
    let (hdr, start) = cursor
        .read_next::<PolicyStringHdr>(offset)
        .context(error::Bounds { index, what })?;
    let len = hdr.string_length.to_ne();
    if len % 2 != 0 {
        return error::StringLength { index, len }.fail();
    }
    cursor
        .range(start, len as usize)
        .context(error::Bounds { index, what })
}

/// A value table entry whose full size has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValueEntry {
    pub value_type: ValueType,
    /// Code units of a string, or the 8 bytes of a qword.
    pub payload: Range<usize>,
}

pub(crate) fn locate_value(table: &[u8], offset: usize, index: usize) -> Result<ValueEntry> {
    let what = "value";
    let cursor = Cursor::new(table);
    let (hdr, body) = cursor
        .read_next::<PolicyValueHdr>(offset)
        .context(error::Bounds { index, what })?;
    let value_type = ValueType::from(hdr.value_type.to_ne());
    let string_length = if value_type == ValueType::STRING {
        let (s, _) = cursor
            .read_next::<PolicyStringHdr>(body)
            .context(error::Bounds { index, what })?;
        s.string_length.to_ne()
    } else {
        0
    };
    let Some(size) = entry_size(value_type, string_length) else {
        return error::UnknownValueType { index, value_type }.fail();
    };
    cursor
        .range(offset, size)
        .context(error::Bounds { index, what })?;
    let payload = if value_type == ValueType::STRING {
        if string_length % 2 != 0 {
            return error::StringLength {
                index,
                len: string_length,
            }
            .fail();
        }
        cursor
            .range(body + STRING_HDR_SIZE, string_length as usize)
            .context(error::Bounds { index, what })?
    } else {
        cursor
            .range(body, size_of::<u64>())
            .context(error::Bounds { index, what })?
    };
    Ok(ValueEntry {
        value_type,
        payload,
    })
}

pub(crate) fn check_root_key(rule: &PolicyRule, index: usize) -> Result<()> {
    let root_key = rule.root_key.to_ne();
    if root_key != POLICY_ROOT_KEY {
        return error::RootKey {
            index,
            got: root_key,
        }
        .fail();
    }
    Ok(())
}

/// Checks every offset of every rule against `value_table`.
///
/// Allocation-free; safe to run any number of times on hostile input.
pub fn validate_rules(rules: &[PolicyRule], value_table: &[u8]) -> Result<()> {
    for (index, rule) in rules.iter().enumerate() {
        check_root_key(rule, index)?;
        let subkey = rule.offset_to_subkey_name.to_ne() as usize;
        locate_string(value_table, subkey, index, "subkey name")?;
        let value_name = rule.offset_to_value_name.to_ne() as usize;
        locate_string(value_table, value_name, index, "value name")?;
        let value = rule.offset_to_value.to_ne() as usize;
        locate_value(value_table, value, index)?;
        log::trace!("rule {index}: offsets {subkey:#x}, {value_name:#x}, {value:#x} ok");
    }
    Ok(())
}
