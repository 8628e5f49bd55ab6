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

//! Signed provisioning policy blobs.
//!
//! Layout of the signature-stripped content, little-endian and packed:
//!
//! ```text
//! 0   PolicyHdr            32 bytes
//! 32  PolicyRule[count]    16 bytes each
//! ..  value table          offsets in the rules are relative to its start
//! ```
//!
//! Nothing is cached between calls. Each query re-validates the whole rule
//! table before reading the requested value.

pub mod builder;
pub mod header;
pub mod lookup;
pub mod rule;
pub mod target;
pub mod value;

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;

use std::mem::size_of;

use macros::Layout;
use snafu::Snafu;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::consts;
use crate::envelope::SignatureEnvelope;
use crate::errors::{BoxTrace, DebugTrace, ErrorKind, trace_error};
use crate::identity::TargetField;
use crate::utils::bounds;
use crate::utils::endian::{Lu16, Lu32};
use crate::utils::guid::Guid;

pub use self::header::parse_header;
pub use self::lookup::{find_rule, split_name};
pub use self::rule::{entry_size, validate_rules};
pub use self::value::{Value, decode_string, decode_u64, decode_value};

pub const POLICY_FORMAT_VERSION: u16 = 2;
pub const POLICY_VERSION: u32 = 1;
/// The only publisher whose policies are accepted.
pub const POLICY_PUBLISHER: Guid = Guid::from_fields(
    0x5AE6F808,
    0x8384,
    0x4EB9,
    [0xA2, 0x3A, 0x0C, 0xCC, 0x10, 0x93, 0xE3, 0xDD],
);
/// The only recognized `root_key` of a rule.
pub const POLICY_ROOT_KEY: u32 = 0xEF10_0000;
pub const POLICY_SIZE_MIN: usize = size_of::<PolicyHdr>();
pub const POLICY_SIZE_MAX: usize = 0x8000;
pub const NAME_SEPARATOR: char = '\\';

#[repr(C)]
#[derive(Debug, Clone, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct PolicyHdr {
    pub format_version: Lu16,
    pub policy_version: Lu32,
    pub publisher: Guid,
    pub reserved1_count: Lu16,
    pub option_flags: Lu32,
    pub reserved2_count: Lu16,
    pub rules_count: Lu16,
}

#[repr(C)]
#[derive(Debug, Clone, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct PolicyRule {
    pub root_key: Lu32,
    pub offset_to_subkey_name: Lu32,
    pub offset_to_value_name: Lu32,
    pub offset_to_value: Lu32,
}

/// Followed by `string_length` bytes of UTF-16LE, no terminator.
#[repr(C)]
#[derive(Debug, Clone, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct PolicyStringHdr {
    pub string_length: Lu16,
}

/// Followed by a [`PolicyStringHdr`] for strings or a `u64` for qwords.
#[repr(C)]
#[derive(Debug, Clone, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct PolicyValueHdr {
    pub value_type: Lu16,
}

consts! {
    #[derive(Default, Hash)]
    pub struct ValueType(u16) {
        STRING = 0;
        QWORD = 5;
    }
}

#[trace_error]
#[derive(Snafu, DebugTrace, ErrorKind)]
#[snafu(module, visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    #[kind(InvalidParameter)]
    #[snafu(display("Policy buffer is empty"))]
    EmptyBuffer,
    #[kind(InvalidParameter)]
    #[snafu(display("Argument {name} is empty"))]
    EmptyArgument { name: &'static str },
    #[kind(BadBufferSize)]
    #[snafu(display(
        "Policy size {size:#x} is outside [{POLICY_SIZE_MIN:#x}, {POLICY_SIZE_MAX:#x}]"
    ))]
    BufferSize { size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Expected format version {POLICY_FORMAT_VERSION}, got {got}"))]
    FormatVersion { got: u16 },
    #[kind(CompromisedData)]
    #[snafu(display("Expected policy version {POLICY_VERSION}, got {got}"))]
    PolicyVersion { got: u32 },
    #[kind(CompromisedData)]
    #[snafu(display("Untrusted publisher {got}"))]
    Publisher { got: Guid },
    #[kind(CompromisedData)]
    #[snafu(display("Reserved field {field} is {value:#x}"))]
    Reserved { field: &'static str, value: u32 },
    #[kind(CompromisedData)]
    #[snafu(display("{count} rules do not fit in {size:#x} bytes"))]
    RuleTable { count: u16, size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Rule {index}: unknown root key {got:#x}"))]
    RootKey { index: usize, got: u32 },
    #[kind(source)]
    #[snafu(display("Rule {index}: {what} is out of bounds"))]
    Bounds {
        index: usize,
        what: &'static str,
        source: bounds::Error,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Rule {index}: string length {len} is not a whole number of code units"))]
    StringLength { index: usize, len: u16 },
    #[kind(CompromisedData)]
    #[snafu(display("Rule {index}: string is not valid UTF-16"))]
    InvalidString { index: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Rule {index}: unknown value type {value_type:?}"))]
    UnknownValueType { index: usize, value_type: ValueType },
    #[kind(CompromisedData)]
    #[snafu(display("Rule {index}: expected {expected:?}, found {got:?}"))]
    TypeMismatch {
        index: usize,
        expected: ValueType,
        got: ValueType,
    },
    #[kind(NotFound)]
    #[snafu(display("No rule named {name:?}"))]
    NotFound { name: String },
    #[kind(SecurityViolation)]
    #[snafu(display("Failed to verify policy signature"))]
    Verify {
        source: Box<dyn DebugTrace + Send + Sync + 'static>,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Failed to get policy content"))]
    Content {
        source: Box<dyn DebugTrace + Send + Sync + 'static>,
    },
    #[kind(NotCorrectTarget)]
    #[snafu(display("Policy {field} {expected:?} does not match device value {got:?}"))]
    TargetMismatch {
        field: &'static str,
        expected: String,
        got: String,
    },
    #[kind(NotCorrectTarget)]
    #[snafu(display("Policy nonce {expected:#x} does not match device nonce {got:#x}"))]
    NonceMismatch { expected: u64, got: u64 },
    #[kind(Delayed)]
    #[snafu(display("Device {} is not available yet", field.as_str()))]
    IdentityUnavailable { field: TargetField },
    #[kind(InvalidParameter)]
    #[snafu(display("Invalid rule name {name:?}"))]
    InvalidName { name: String },
    #[kind(InvalidParameter)]
    #[snafu(display("String of {len} bytes is too long"))]
    StringTooLong { len: usize },
    #[kind(BadBufferSize)]
    #[snafu(display("Policy of {rules} rules and {size:#x} bytes is too large"))]
    TooLarge { rules: usize, size: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A rule located by [`find_rule`], with its position for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct RuleRef<'a> {
    pub index: usize,
    pub rule: &'a PolicyRule,
}

/// A decoded rule, as produced by [`PolicyView::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    pub subkey: String,
    pub value_name: String,
    pub value: Value,
}

/// Borrowed pieces of a policy whose header has been checked.
///
/// A view only lives for the duration of one query; it is never stored.
#[derive(Debug, Clone)]
pub struct PolicyView<'a> {
    pub header: PolicyHdr,
    pub rules: &'a [PolicyRule],
    pub value_table_offset: usize,
    pub value_table: &'a [u8],
}

impl<'a> PolicyView<'a> {
    pub fn find(&self, name: &str) -> Result<RuleRef<'a>> {
        find_rule(self.rules, self.value_table, name)
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        let rule = self.find(name)?;
        decode_string(self.value_table, rule)
    }

    pub fn get_u64(&self, name: &str) -> Result<u64> {
        let rule = self.find(name)?;
        decode_u64(self.value_table, rule)
    }

    pub fn get_value(&self, name: &str) -> Result<Value> {
        let rule = self.find(name)?;
        decode_value(self.value_table, rule)
    }

    /// Decodes every rule in table order.
    pub fn entries(&self) -> impl Iterator<Item = Result<PolicyEntry>> + '_ {
        self.rules.iter().enumerate().map(|(index, rule)| {
            let rule = RuleRef { index, rule };
            Ok(PolicyEntry {
                subkey: value::decode_subkey(self.value_table, rule)?,
                value_name: value::decode_value_name(self.value_table, rule)?,
                value: decode_value(self.value_table, rule)?,
            })
        })
    }
}

/// Checks the header and every rule of signature-stripped content.
pub fn check_content(content: &[u8]) -> Result<PolicyView<'_>> {
    let view = parse_header(content)?;
    if let Err(e) = validate_rules(view.rules, view.value_table) {
        log::warn!("policy rejected: {e}");
        return Err(e);
    }
    log::debug!(
        "policy accepted: {} rules, value table {:#x} bytes",
        view.rules.len(),
        view.value_table.len()
    );
    Ok(view)
}

fn attached_content<'a, E>(envelope: &E, signed: &'a [u8]) -> Result<&'a [u8]>
where
    E: SignatureEnvelope + ?Sized,
{
    if signed.is_empty() {
        return error::EmptyBuffer.fail();
    }
    envelope.attached_content(signed).box_trace(error::Content)
}

/// Verifies the envelope of `signed` and the structure of its content.
pub fn validate_blob<E>(envelope: &E, signed: &[u8], trust_anchor: &[u8], eku: &str) -> Result<()>
where
    E: SignatureEnvelope + ?Sized,
{
    if signed.is_empty() {
        return error::EmptyBuffer.fail();
    }
    if trust_anchor.is_empty() {
        return error::EmptyArgument {
            name: "trust_anchor",
        }
        .fail();
    }
    if eku.is_empty() {
        return error::EmptyArgument { name: "eku" }.fail();
    }
    let content = envelope
        .verify_and_extract(signed, trust_anchor, eku)
        .box_trace(error::Verify)?;
    check_content(content)?;
    Ok(())
}

/// Returns the string value of `name` (`Subkey\ValueName`).
///
/// `signed` must already have passed [`validate_blob`]; the structure is
/// checked again regardless.
pub fn extract_string<E>(envelope: &E, signed: &[u8], name: &str) -> Result<String>
where
    E: SignatureEnvelope + ?Sized,
{
    let content = attached_content(envelope, signed)?;
    check_content(content)?.get_string(name)
}

/// Returns the qword value of `name` (`Subkey\ValueName`).
pub fn extract_u64<E>(envelope: &E, signed: &[u8], name: &str) -> Result<u64>
where
    E: SignatureEnvelope + ?Sized,
{
    let content = attached_content(envelope, signed)?;
    check_content(content)?.get_u64(name)
}

pub fn extract_value<E>(envelope: &E, signed: &[u8], name: &str) -> Result<Value>
where
    E: SignatureEnvelope + ?Sized,
{
    let content = attached_content(envelope, signed)?;
    check_content(content)?.get_value(name)
}
