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
use crate::utils::bounds::{Cursor, Error, check};
use crate::utils::endian::Lu32;

#[rstest]
#[case(16, 0, 16, Some(0..16))]
#[case(16, 16, 0, Some(16..16))]
#[case(16, 15, 1, Some(15..16))]
#[case(16, 15, 2, None)]
#[case(16, 17, 0, None)]
#[case(0, 0, 0, Some(0..0))]
fn test_check(
    #[case] len: usize,
    #[case] offset: usize,
    #[case] size: usize,
    #[case] expected: Option<std::ops::Range<usize>>,
) {
    assert_eq!(check(len, offset, size).ok(), expected);
}

#[test]
fn test_check_overflow() {
    assert_matches!(
        check(16, usize::MAX, 2),
        Err(Error::Overflow {
            offset: usize::MAX,
            size: 2,
            ..
        })
    );
    assert_matches!(
        check(usize::MAX, 1, usize::MAX),
        Err(Error::Overflow { .. })
    );
    let err = check(4, 2, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
    assert_matches!(
        err,
        Error::OutOfBounds {
            offset: 2,
            size: 4,
            len: 4,
            ..
        }
    );
}

#[test]
fn test_cursor() {
    let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
    let cursor = Cursor::new(&buf);
    assert_eq!(cursor.len(), 9);
    assert_eq!(cursor.read_u16(0).unwrap(), 0x0201);
    assert_eq!(cursor.read_u32(5).unwrap(), 0x0908_0706);
    assert_eq!(cursor.read_u64(1).unwrap(), 0x0908_0706_0504_0302);
    assert_eq!(cursor.read::<Lu32>(1).unwrap().to_ne(), 0x0504_0302);
    assert_matches!(cursor.read_u64(2), Err(Error::OutOfBounds { .. }));
    assert_eq!(cursor.slice(7, 2).unwrap(), &[0x08, 0x09]);

    let tail = cursor.tail(6).unwrap();
    assert_eq!(tail.bytes(), &[0x07, 0x08, 0x09]);
    assert!(cursor.tail(9).unwrap().is_empty());
    assert_matches!(cursor.tail(10), Err(Error::OutOfBounds { .. }));
}

#[test]
fn test_read_next() {
    let buf = [0x34, 0x12, 0x78, 0x56];
    let cursor = Cursor::new(&buf);
    let (first, next) = cursor.read_next::<[u8; 2]>(0).unwrap();
    assert_eq!((first, next), ([0x34, 0x12], 2));
    let (second, end) = cursor.read_next::<[u8; 2]>(next).unwrap();
    assert_eq!((second, end), ([0x78, 0x56], 4));
    assert_matches!(cursor.read_next::<[u8; 2]>(end), Err(Error::OutOfBounds { .. }));
}
