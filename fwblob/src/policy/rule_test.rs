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

use assert_matches::assert_matches;
use rstest::rstest;

use crate::errors::ErrorKind;
use crate::policy::builder::PolicyBuilder;
use crate::policy::rule::{ValueEntry, entry_size, locate_value, validate_rules};
use crate::policy::{Error, POLICY_ROOT_KEY, PolicyRule, ValueType, check_content};
use crate::utils::bounds;
use crate::utils::endian::Lu32;

fn rule(subkey: u32, value_name: u32, value: u32) -> PolicyRule {
    PolicyRule {
        root_key: Lu32::new(POLICY_ROOT_KEY),
        offset_to_subkey_name: Lu32::new(subkey),
        offset_to_value_name: Lu32::new(value_name),
        offset_to_value: Lu32::new(value),
    }
}

/// "A" at 0, "B" at 4, a qword at 8.
const TABLE: [u8; 18] = [
    2, 0, b'A', 0, //
    2, 0, b'B', 0, //
    5, 0, 1, 2, 3, 4, 5, 6, 7, 8,
];

#[rstest]
#[case(ValueType::QWORD, 0, Some(10))]
#[case(ValueType::QWORD, 100, Some(10))]
#[case(ValueType::STRING, 0, Some(6))]
#[case(ValueType::STRING, 44, Some(50))]
#[case(ValueType::STRING, 0xffff, Some(0xffff + 6))]
#[case(ValueType::from(1), 0, None)]
#[case(ValueType::from(0xffff), 8, None)]
fn test_entry_size(
    #[case] value_type: ValueType,
    #[case] string_length: u16,
    #[case] expected: Option<usize>,
) {
    assert_eq!(entry_size(value_type, string_length), expected);
}

#[test]
fn test_locate_value() {
    assert_eq!(
        locate_value(&TABLE, 8, 0).unwrap(),
        ValueEntry {
            value_type: ValueType::QWORD,
            payload: 10..18,
        }
    );
    assert_matches!(
        locate_value(&TABLE, 9, 0),
        Err(Error::UnknownValueType { .. })
    );
}

#[test]
fn test_validate_rules() {
    assert_matches!(validate_rules(&[rule(0, 4, 8)], &TABLE), Ok(()));
    assert_matches!(validate_rules(&[rule(4, 4, 8), rule(0, 0, 8)], &TABLE), Ok(()));
    assert_matches!(validate_rules(&[], &[]), Ok(()));
}

#[rstest]
#[case(rule(0, 4, 9))]
#[case(rule(0, 4, 17))]
#[case(rule(18, 4, 8))]
#[case(rule(0, 16, 8))]
#[case(rule(0, u32::MAX, 8))]
fn test_validate_rules_bad_offset(#[case] bad: PolicyRule) {
    let rules = [rule(0, 4, 8), bad];
    let err = validate_rules(&rules, &TABLE).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
    match err {
        Error::Bounds { index, .. }
        | Error::UnknownValueType { index, .. }
        | Error::StringLength { index, .. } => assert_eq!(index, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_root_key() {
    let mut bad = rule(0, 4, 8);
    bad.root_key = Lu32::new(0x8000_0002);
    assert_matches!(
        validate_rules(&[rule(0, 4, 8), bad], &TABLE),
        Err(Error::RootKey {
            index: 1,
            got: 0x8000_0002,
            ..
        })
    );
}

#[test]
fn test_odd_string_length() {
    let mut table = TABLE;
    table[0] = 3;
    assert_matches!(
        validate_rules(&[rule(0, 4, 8)], &table),
        Err(Error::StringLength { index: 0, len: 3, .. })
    );
}

#[test]
fn test_unknown_value_type() {
    let mut table = TABLE;
    table[8] = 1;
    let err = validate_rules(&[rule(0, 4, 8)], &table).unwrap_err();
    assert_matches!(
        err,
        Error::UnknownValueType {
            index: 0,
            value_type,
            ..
        } if value_type == ValueType::from(1)
    );
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
}

#[test]
fn test_string_header_past_end() {
    // String value tag in the last two bytes, no room for its length.
    let table = [2, 0, b'A', 0, 0, 0, 0];
    assert_matches!(
        validate_rules(&[rule(0, 0, 5)], &table),
        Err(Error::Bounds {
            source: bounds::Error::OutOfBounds { .. },
            ..
        })
    );
}

#[test]
fn test_qword_ends_at_table_end() {
    let mut builder = PolicyBuilder::new();
    builder.add_u64("UEFI\\Policy", 7).unwrap();
    let mut blob = builder.build().unwrap();
    let view = check_content(&blob).unwrap();
    assert_eq!(view.value_table.len(), 34);
    assert_eq!(view.rules[0].offset_to_value.to_ne(), 24);

    blob.pop();
    let err = check_content(&blob).unwrap_err();
    assert_matches!(
        err,
        Error::Bounds {
            index: 0,
            what: "value",
            source: bounds::Error::OutOfBounds {
                offset: 24,
                size: 10,
                len: 33,
                ..
            },
            ..
        }
    );
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
}

#[test]
fn test_string_terminator_is_budgeted() {
    let mut builder = PolicyBuilder::new();
    builder.add_string("Target\\Product", "Laptop Foo").unwrap();
    let mut blob = builder.build().unwrap();
    let view = check_content(&blob).unwrap();
    assert_eq!(view.value_table.len(), 56);
    assert_eq!(view.get_string("Target\\Product").unwrap(), "Laptop Foo");

    blob.pop();
    assert_matches!(
        check_content(&blob),
        Err(Error::Bounds {
            index: 0,
            source: bounds::Error::OutOfBounds { size: 26, .. },
            ..
        })
    );
}
