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

use assert_matches::assert_matches;
use rstest::rstest;
use zerocopy::IntoBytes;

use crate::capsule::{
    CapsuleHdr, Error, FMP_CAPSULE_GUID, FmpCapsuleHdr, FmpImageHdr, image_header_size,
    validate_fmp_capsule,
};
use crate::errors::ErrorKind;
use crate::utils::endian::{Lu16, Lu32, Lu64};
use crate::utils::guid::Guid;

const IMAGE_TYPE: Guid = Guid::from_fields(0x12345678, 0x9abc, 0xdef0, [1, 2, 3, 4, 5, 6, 7, 8]);

struct Payload<'a> {
    version: u32,
    image: &'a [u8],
    vendor_code: &'a [u8],
}

fn payload_item(payload: &Payload) -> Vec<u8> {
    let header = FmpImageHdr {
        version: Lu32::new(payload.version),
        update_image_type_id: IMAGE_TYPE,
        update_image_index: 1,
        update_image_size: Lu32::new(payload.image.len() as u32),
        update_vendor_code_size: Lu32::new(payload.vendor_code.len() as u32),
        update_hardware_instance: Lu64::new(7),
        image_capsule_support: Lu64::new(1),
        ..Default::default()
    };
    let header_size = image_header_size(payload.version).unwrap_or(size_of::<FmpImageHdr>());
    let mut item = header.as_bytes()[..header_size].to_vec();
    item.extend(payload.image);
    item.extend(payload.vendor_code);
    item
}

fn body(drivers: &[&[u8]], payloads: &[Payload]) -> Vec<u8> {
    let fmp = FmpCapsuleHdr {
        version: Lu32::new(1),
        embedded_driver_count: Lu16::new(drivers.len() as u16),
        payload_item_count: Lu16::new(payloads.len() as u16),
    };
    let items = drivers
        .iter()
        .map(|d| d.to_vec())
        .chain(payloads.iter().map(payload_item))
        .collect::<Vec<_>>();
    let mut offset = size_of::<FmpCapsuleHdr>() + items.len() * size_of::<u64>();
    let mut body = fmp.as_bytes().to_vec();
    for item in &items {
        body.extend((offset as u64).to_le_bytes());
        offset += item.len();
    }
    for item in items {
        body.extend(item);
    }
    body
}

fn wrap(body: &[u8]) -> Vec<u8> {
    let header_size = size_of::<CapsuleHdr>();
    let header = CapsuleHdr {
        capsule_guid: FMP_CAPSULE_GUID,
        header_size: Lu32::new(header_size as u32),
        flags: Lu32::new(0x0005_0000),
        capsule_image_size: Lu32::new((header_size + body.len()) as u32),
    };
    let mut capsule = header.as_bytes().to_vec();
    capsule.extend(body);
    capsule
}

fn sample() -> Vec<u8> {
    let payloads = [
        Payload {
            version: 1,
            image: b"image one",
            vendor_code: b"",
        },
        Payload {
            version: 3,
            image: b"image two",
            vendor_code: b"vendor",
        },
    ];
    wrap(&body(&[b"driver"], &payloads))
}

fn put_u32(buf: &mut [u8], offset: usize, val: u32) {
    buf[offset..offset + 4].copy_from_slice(&val.to_le_bytes());
}

/// Offset of item offset `index` in a capsule built by [`wrap`].
fn item_offset_at(index: usize) -> usize {
    size_of::<CapsuleHdr>() + size_of::<FmpCapsuleHdr>() + index * size_of::<u64>()
}

#[test]
fn test_layout() {
    assert_eq!(size_of::<CapsuleHdr>(), 28);
    assert_eq!(size_of::<FmpCapsuleHdr>(), 8);
    assert_eq!(size_of::<FmpImageHdr>(), 48);
    assert_eq!(image_header_size(1), Some(32));
    assert_eq!(image_header_size(2), Some(40));
    assert_eq!(image_header_size(3), Some(48));
    assert_eq!(image_header_size(0), None);
    assert_eq!(image_header_size(4), Some(48));
}

#[test]
fn test_validate() {
    let capsule = sample();
    let parsed = validate_fmp_capsule(&capsule).unwrap();
    assert_eq!(parsed.item_count(), 3);
    assert_eq!(parsed.drivers, [b"driver".as_slice()]);
    assert_eq!(parsed.payloads[0].image, b"image one");
    assert!(parsed.payloads[0].vendor_code.is_empty());
    assert_eq!(parsed.payloads[0].header.update_hardware_instance.to_ne(), 0);
    assert_eq!(parsed.payloads[1].image, b"image two");
    assert_eq!(parsed.payloads[1].vendor_code, b"vendor");
    assert_eq!(parsed.payloads[1].header.update_hardware_instance.to_ne(), 7);
    assert_eq!(parsed.payloads[1].header.update_image_type_id, IMAGE_TYPE);
}

#[test]
fn test_no_items() {
    let capsule = wrap(&body(&[], &[]));
    assert_eq!(capsule.len(), 28 + 8);
    assert_eq!(validate_fmp_capsule(&capsule).unwrap().item_count(), 0);

    let mut trailing = body(&[], &[]);
    trailing.push(0);
    assert_matches!(
        validate_fmp_capsule(&wrap(&trailing)),
        Err(Error::TrailingData {
            size: 9,
            expected: 8,
            ..
        })
    );
}

#[rstest]
#[case(0, ErrorKind::InvalidParameter)]
#[case(27, ErrorKind::BadBufferSize)]
fn test_too_small(#[case] size: usize, #[case] kind: ErrorKind) {
    let mut capsule = sample();
    capsule.truncate(size);
    assert_eq!(validate_fmp_capsule(&capsule).unwrap_err().kind(), kind);
}

#[test]
fn test_capsule_guid() {
    let mut capsule = sample();
    capsule[0] ^= 1;
    assert_matches!(
        validate_fmp_capsule(&capsule),
        Err(Error::CapsuleGuid { .. })
    );
}

#[rstest]
#[case::header_too_small(27, 0)]
#[case::header_past_image(0x1000, 0)]
#[case::image_size_too_large(28, 1)]
#[case::image_size_too_small(28, -1)]
fn test_capsule_size(#[case] header_size: u32, #[case] image_delta: i32) {
    let mut capsule = sample();
    let image_size = (capsule.len() as i32 + image_delta) as u32;
    put_u32(&mut capsule, CapsuleHdr::OFFSET_HEADER_SIZE, header_size);
    put_u32(&mut capsule, CapsuleHdr::OFFSET_CAPSULE_IMAGE_SIZE, image_size);
    let err = validate_fmp_capsule(&capsule).unwrap_err();
    assert_matches!(err, Error::CapsuleSize { .. });
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
}

#[test]
fn test_larger_capsule_header() {
    let body = body(&[b"driver"], &[]);
    let mut capsule = wrap(&body);
    let tail = capsule.split_off(28);
    capsule.extend([0xaa; 4]);
    capsule.extend(tail);
    put_u32(&mut capsule, CapsuleHdr::OFFSET_HEADER_SIZE, 32);
    put_u32(
        &mut capsule,
        CapsuleHdr::OFFSET_CAPSULE_IMAGE_SIZE,
        (32 + body.len()) as u32,
    );
    let parsed = validate_fmp_capsule(&capsule).unwrap();
    assert_eq!(parsed.drivers, [b"driver".as_slice()]);
}

#[test]
fn test_fmp_version() {
    let mut capsule = sample();
    put_u32(&mut capsule, 28, 2);
    let err = validate_fmp_capsule(&capsule).unwrap_err();
    assert_matches!(err, Error::FmpVersion { got: 2, .. });
    assert_eq!(err.kind(), ErrorKind::IncompatibleVersion);
}

#[test]
fn test_item_count() {
    let mut capsule = sample();
    let at = 28 + FmpCapsuleHdr::OFFSET_PAYLOAD_ITEM_COUNT;
    capsule[at..at + 2].copy_from_slice(&0xffffu16.to_le_bytes());
    assert_matches!(
        validate_fmp_capsule(&capsule),
        Err(Error::ItemCount { count: 0x10000, .. })
    );
}

#[rstest]
#[case::inside_offset_list(0, 16)]
#[case::end_of_body(2, 0x1000)]
#[case::huge(1, u64::MAX)]
fn test_item_offset(#[case] index: usize, #[case] offset: u64) {
    let mut capsule = sample();
    let at = item_offset_at(index);
    capsule[at..at + 8].copy_from_slice(&offset.to_le_bytes());
    assert_matches!(
        validate_fmp_capsule(&capsule),
        Err(Error::ItemOffset { index: i, .. }) if i == index
    );
}

#[test]
fn test_item_order() {
    let mut capsule = sample();
    let first = item_offset_at(0);
    let second = item_offset_at(1);
    let swapped = [&capsule[second..second + 8], &capsule[first..first + 8]].concat();
    capsule[first..second + 8].copy_from_slice(&swapped);
    assert_matches!(
        validate_fmp_capsule(&capsule),
        Err(Error::ItemOrder { index: 1, .. })
    );
}

#[test]
fn test_empty_driver() {
    let capsule = wrap(&body(&[b"", b"driver"], &[]));
    assert_matches!(
        validate_fmp_capsule(&capsule),
        Err(Error::EmptyDriver { index: 0, .. })
    );
}

#[test]
fn test_image_version_zero() {
    let payload = Payload {
        version: 0,
        image: b"image",
        vendor_code: b"",
    };
    let capsule = wrap(&body(&[], &[payload]));
    let err = validate_fmp_capsule(&capsule).unwrap_err();
    assert_matches!(err, Error::ImageVersion { index: 0, got: 0, .. });
    assert_eq!(err.kind(), ErrorKind::IncompatibleVersion);
}

#[rstest]
#[case(4)]
#[case(0x100)]
fn test_image_version_newer(#[case] version: u32) {
    let payload = Payload {
        version,
        image: b"image",
        vendor_code: b"code",
    };
    let capsule = wrap(&body(&[], &[payload]));
    let capsule = validate_fmp_capsule(&capsule).unwrap();
    let [payload] = capsule.payloads.as_slice() else {
        panic!("expected one payload, got {}", capsule.payloads.len());
    };
    assert_eq!(payload.header.version.to_ne(), version);
    assert_eq!(payload.header.image_capsule_support.to_ne(), 1);
    assert_eq!(payload.image, b"image");
    assert_eq!(payload.vendor_code, b"code");
}

#[rstest]
#[case(1)]
#[case(-1)]
fn test_image_size(#[case] delta: i32) {
    let payload = Payload {
        version: 2,
        image: b"image",
        vendor_code: b"code",
    };
    let mut body = body(&[], &[payload]);
    // Item data starts after the 8-byte FMP header and one offset.
    let at = 16 + FmpImageHdr::OFFSET_UPDATE_IMAGE_SIZE;
    put_u32(&mut body, at, (5 + delta) as u32);
    assert_matches!(
        validate_fmp_capsule(&wrap(&body)),
        Err(Error::ImageSize {
            index: 0,
            len: 49,
            ..
        })
    );
}

#[test]
fn test_truncated_image_header() {
    let mut body = body(&[], &[]);
    let at = FmpCapsuleHdr::OFFSET_PAYLOAD_ITEM_COUNT;
    body[at..at + 2].copy_from_slice(&1u16.to_le_bytes());
    body.extend(16u64.to_le_bytes());
    body.extend(2u32.to_le_bytes());
    assert_matches!(
        validate_fmp_capsule(&wrap(&body)),
        Err(Error::Bounds {
            what: "image header",
            ..
        })
    );
}
