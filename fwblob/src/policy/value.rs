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
#[path = "value_test.rs"]
mod tests;

use std::fmt;
use std::ops::Range;

use snafu::ResultExt;

use crate::policy::rule::{ValueEntry, check_root_key, locate_string, locate_value};
use crate::policy::{Result, RuleRef, ValueType, error};
use crate::utils::bounds::Cursor;
use crate::utils::utf16le_to_string;

/// A decoded value table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Qword(u64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::STRING,
            Value::Qword(_) => ValueType::QWORD,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Qword(n) => write!(f, "{n:#018x}"),
        }
    }
}

fn decode_utf16(table: &[u8], range: Range<usize>, index: usize) -> Result<String> {
    match utf16le_to_string(&table[range]) {
        Some(s) => Ok(s),
        None => error::InvalidString { index }.fail(),
    }
}

pub(crate) fn decode_subkey(table: &[u8], rule: RuleRef) -> Result<String> {
    let offset = rule.rule.offset_to_subkey_name.to_ne() as usize;
    let range = locate_string(table, offset, rule.index, "subkey name")?;
    decode_utf16(table, range, rule.index)
}

pub(crate) fn decode_value_name(table: &[u8], rule: RuleRef) -> Result<String> {
    let offset = rule.rule.offset_to_value_name.to_ne() as usize;
    let range = locate_string(table, offset, rule.index, "value name")?;
    decode_utf16(table, range, rule.index)
}

fn locate_rule_value(table: &[u8], rule: RuleRef) -> Result<ValueEntry> {
    check_root_key(rule.rule, rule.index)?;
    let offset = rule.rule.offset_to_value.to_ne() as usize;
    locate_value(table, offset, rule.index)
}

fn read_qword(table: &[u8], entry: &ValueEntry, index: usize) -> Result<u64> {
    Cursor::new(table)
        .read_u64(entry.payload.start)
        .context(error::Bounds {
            index,
            what: "value",
        })
}

fn expect_type(rule: RuleRef, expected: ValueType, got: ValueType) -> Result<()> {
    if expected != got {
        return error::TypeMismatch {
            index: rule.index,
            expected,
            got,
        }
        .fail();
    }
    Ok(())
}

/// Decodes the value of `rule`, re-checking its bounds.
pub fn decode_value(table: &[u8], rule: RuleRef) -> Result<Value> {
    let entry = locate_rule_value(table, rule)?;
    match entry.value_type {
        ValueType::STRING => {
            let s = decode_utf16(table, entry.payload, rule.index)?;
            Ok(Value::String(s))
        }
        ValueType::QWORD => Ok(Value::Qword(read_qword(table, &entry, rule.index)?)),
        value_type => error::UnknownValueType {
            index: rule.index,
            value_type,
        }
        .fail(),
    }
}

/// Decodes a string value. A qword value is an error, not a coercion.
pub fn decode_string(table: &[u8], rule: RuleRef) -> Result<String> {
    let entry = locate_rule_value(table, rule)?;
    expect_type(rule, ValueType::STRING, entry.value_type)?;
    decode_utf16(table, entry.payload, rule.index)
}

/// Decodes a qword value. A string value is an error, not a coercion.
pub fn decode_u64(table: &[u8], rule: RuleRef) -> Result<u64> {
    let entry = locate_rule_value(table, rule)?;
    expect_type(rule, ValueType::QWORD, entry.value_type)?;
    read_qword(table, &entry, rule.index)
}
