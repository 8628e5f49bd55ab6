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
#[path = "header_test.rs"]
mod tests;

use std::mem::size_of;
use std::ops::Range;

use snafu::ResultExt;
use zerocopy::FromBytes;

use crate::policy::{
    POLICY_FORMAT_VERSION, POLICY_PUBLISHER, POLICY_SIZE_MAX, POLICY_SIZE_MIN,
    POLICY_VERSION, PolicyHdr, PolicyRule, PolicyView, Result, error,
};
use crate::utils::bounds::Cursor;

/// Returns the byte range of the rule table.
fn check_header(hdr: &PolicyHdr, size: usize) -> Result<Range<usize>> {
    let format_version = hdr.format_version.to_ne();
    if format_version != POLICY_FORMAT_VERSION {
        return error::FormatVersion {
            got: format_version,
        }
        .fail();
    }
    let policy_version = hdr.policy_version.to_ne();
    if policy_version != POLICY_VERSION {
        return error::PolicyVersion {
            got: policy_version,
        }
        .fail();
    }
    if hdr.publisher != POLICY_PUBLISHER {
        return error::Publisher { got: hdr.publisher }.fail();
    }
    let reserved = [
        ("reserved1_count", u32::from(hdr.reserved1_count.to_ne())),
        ("option_flags", hdr.option_flags.to_ne()),
        ("reserved2_count", u32::from(hdr.reserved2_count.to_ne())),
    ];
    for (field, value) in reserved {
        if value != 0 {
            return error::Reserved { field, value }.fail();
        }
    }
    let count = hdr.rules_count.to_ne();
    let end = (count as usize)
        .checked_mul(size_of::<PolicyRule>())
        .and_then(|len| len.checked_add(size_of::<PolicyHdr>()));
    match end {
        Some(end) if end <= size => Ok(size_of::<PolicyHdr>()..end),
        _ => error::RuleTable { count, size }.fail(),
    }
}

/// Checks the fixed header and locates the rule array and value table.
pub fn parse_header(bytes: &[u8]) -> Result<PolicyView<'_>> {
    if bytes.is_empty() {
        return error::EmptyBuffer.fail();
    }
    let size = bytes.len();
    if !(POLICY_SIZE_MIN..=POLICY_SIZE_MAX).contains(&size) {
        log::warn!("policy rejected: size {size:#x}");
        return error::BufferSize { size }.fail();
    }
    let cursor = Cursor::new(bytes);
    let header = cursor
        .read::<PolicyHdr>(0)
        .context(error::Bounds {
            index: 0usize,
            what: "header",
        })?;
    let rule_table = match check_header(&header, size) {
        Ok(range) => range,
        Err(e) => {
            log::warn!("policy rejected: {e}");
            return Err(e);
        }
    };

    let rules_bytes = cursor
        .slice(rule_table.start, rule_table.len())
        .context(error::Bounds {
            index: 0usize,
            what: "rule table",
        })?;
    let Ok(rules) = <[PolicyRule]>::ref_from_bytes(rules_bytes) else {
        return error::RuleTable {
            count: header.rules_count.to_ne(),
            size,
        }
        .fail();
    };
    let value_table_offset = rule_table.end;
    let value_table = cursor
        .tail(value_table_offset)
        .context(error::Bounds {
            index: 0usize,
            what: "value table",
        })?
        .bytes();
    Ok(PolicyView {
        header,
        rules,
        value_table_offset,
        value_table,
    })
}
