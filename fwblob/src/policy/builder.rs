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

use std::mem::size_of;

use zerocopy::IntoBytes;

use crate::policy::target::{PolicyField, PolicyTarget};
use crate::policy::{
    POLICY_FORMAT_VERSION, POLICY_PUBLISHER, POLICY_ROOT_KEY, POLICY_SIZE_MAX, POLICY_VERSION,
    PolicyHdr, PolicyRule, Result, Value, error, split_name,
};
use crate::utils::endian::{Lu16, Lu32};
use crate::utils::string_to_utf16le;

/// Encodes policy content in the layout accepted by
/// [`check_content`](crate::policy::check_content).
///
/// The output is unsigned; wrapping it in an envelope is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    rules: Vec<(String, String, Value)>,
}

fn push_string(table: &mut Vec<u8>, s: &str) -> Result<u32> {
    let offset = table_offset(table)?;
    let units = string_to_utf16le(s);
    let Ok(len) = u16::try_from(units.len()) else {
        return error::StringTooLong { len: units.len() }.fail();
    };
    table.extend(Lu16::new(len).as_bytes());
    table.extend(units);
    Ok(offset)
}

fn push_value(table: &mut Vec<u8>, value: &Value) -> Result<u32> {
    let offset = table_offset(table)?;
    table.extend(Lu16::new(value.value_type().raw()).as_bytes());
    match value {
        Value::String(s) => {
            push_string(table, s)?;
            table.extend([0u8; size_of::<u16>()]);
        }
        Value::Qword(n) => table.extend(n.to_le_bytes()),
    }
    Ok(offset)
}

fn table_offset(table: &[u8]) -> Result<u32> {
    match u32::try_from(table.len()) {
        Ok(offset) => Ok(offset),
        Err(_) => error::TooLarge {
            rules: 0usize,
            size: table.len(),
        }
        .fail(),
    }
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder holding every [`PolicyField`] of `target`.
    pub fn from_target(target: &PolicyTarget) -> Result<Self> {
        let mut builder = PolicyBuilder::new();
        for field in PolicyField::ALL {
            let value = match field.target_field() {
                Some(target_field) => Value::String(target.string(target_field).to_owned()),
                None if field == PolicyField::Nonce => Value::Qword(target.nonce),
                None => Value::Qword(target.policy),
            };
            debug_assert_eq!(value.value_type(), field.value_type());
            builder.add(field.name(), value)?;
        }
        Ok(builder)
    }

    /// Appends a rule. Rules keep insertion order.
    pub fn add(&mut self, name: &str, value: Value) -> Result<&mut Self> {
        let Some((subkey, value_name)) = split_name(name) else {
            return error::InvalidName { name }.fail();
        };
        self.rules
            .push((subkey.to_owned(), value_name.to_owned(), value));
        Ok(self)
    }

    pub fn add_string(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.add(name, Value::String(value.to_owned()))
    }

    pub fn add_u64(&mut self, name: &str, value: u64) -> Result<&mut Self> {
        self.add(name, Value::Qword(value))
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let rules_count = self.rules.len();
        let Ok(count) = u16::try_from(rules_count) else {
            return error::TooLarge {
                rules: rules_count,
                size: 0usize,
            }
            .fail();
        };
        let mut table = vec![];
        let mut rules = Vec::with_capacity(rules_count);
        for (subkey, value_name, value) in &self.rules {
            let offset_to_subkey_name = push_string(&mut table, subkey)?;
            let offset_to_value_name = push_string(&mut table, value_name)?;
            let offset_to_value = push_value(&mut table, value)?;
            rules.push(PolicyRule {
                root_key: Lu32::new(POLICY_ROOT_KEY),
                offset_to_subkey_name: Lu32::new(offset_to_subkey_name),
                offset_to_value_name: Lu32::new(offset_to_value_name),
                offset_to_value: Lu32::new(offset_to_value),
            });
        }
        let hdr = PolicyHdr {
            format_version: Lu16::new(POLICY_FORMAT_VERSION),
            policy_version: Lu32::new(POLICY_VERSION),
            publisher: POLICY_PUBLISHER,
            reserved1_count: Lu16::new(0),
            option_flags: Lu32::new(0),
            reserved2_count: Lu16::new(0),
            rules_count: Lu16::new(count),
        };
        let mut blob = hdr.as_bytes().to_vec();
        blob.extend(rules.as_slice().as_bytes());
        blob.extend(table);
        if blob.len() > POLICY_SIZE_MAX {
            return error::TooLarge {
                rules: rules_count,
                size: blob.len(),
            }
            .fail();
        }
        Ok(blob)
    }
}
