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

//! Layout checks for firmware management (FMP) capsules.
//!
//! Only the structure is validated. Authentication of the payload images
//! and their dispatch to a device are left to the caller.

#[cfg(test)]
#[path = "capsule_test.rs"]
mod tests;

use std::mem::size_of;

use macros::Layout;
use snafu::{ResultExt, Snafu};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::{DebugTrace, ErrorKind, trace_error};
use crate::utils::bounds::{self, Cursor};
use crate::utils::endian::{Lu16, Lu32, Lu64};
use crate::utils::guid::Guid;

pub const FMP_CAPSULE_GUID: Guid = Guid::from_fields(
    0x6DCBD5ED,
    0xE82D,
    0x4C44,
    [0xBD, 0xA1, 0x71, 0x94, 0x19, 0x9A, 0xD9, 0x2A],
);
pub const FMP_CAPSULE_VERSION: u32 = 1;
pub const FMP_IMAGE_VERSION: u32 = 3;

/// EFI_CAPSULE_HEADER
#[repr(C)]
#[derive(Debug, Clone, Default, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct CapsuleHdr {
    pub capsule_guid: Guid,
    pub header_size: Lu32,
    pub flags: Lu32,
    pub capsule_image_size: Lu32,
}

/// EFI_FIRMWARE_MANAGEMENT_CAPSULE_HEADER, followed by
/// `embedded_driver_count + payload_item_count` `u64` item offsets.
#[repr(C)]
#[derive(Debug, Clone, Default, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct FmpCapsuleHdr {
    pub version: Lu32,
    pub embedded_driver_count: Lu16,
    pub payload_item_count: Lu16,
}

/// EFI_FIRMWARE_MANAGEMENT_CAPSULE_IMAGE_HEADER, version 3.
///
/// Version 1 ends before `update_hardware_instance`, version 2 before
/// `image_capsule_support`. Fields a shorter header lacks read as zero.
#[repr(C)]
#[derive(Debug, Clone, Default, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct FmpImageHdr {
    pub version: Lu32,
    pub update_image_type_id: Guid,
    pub update_image_index: u8,
    pub reserved_bytes: [u8; 3],
    pub update_image_size: Lu32,
    pub update_vendor_code_size: Lu32,
    pub update_hardware_instance: Lu64,
    pub image_capsule_support: Lu64,
}

/// Size of an image header of `version`. Versions newer than
/// [`FMP_IMAGE_VERSION`] only append fields, so they are read as the
/// current layout.
pub fn image_header_size(version: u32) -> Option<usize> {
    match version {
        0 => None,
        1 => Some(FmpImageHdr::OFFSET_UPDATE_HARDWARE_INSTANCE),
        2 => Some(FmpImageHdr::OFFSET_IMAGE_CAPSULE_SUPPORT),
        _ => Some(size_of::<FmpImageHdr>()),
    }
}

#[trace_error]
#[derive(Snafu, DebugTrace, ErrorKind)]
#[snafu(module, visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    #[kind(InvalidParameter)]
    #[snafu(display("Capsule is empty"))]
    EmptyCapsule,
    #[kind(BadBufferSize)]
    #[snafu(display("Capsule of {size:#x} bytes is smaller than its header"))]
    TooSmall { size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Capsule {got} is not an FMP capsule"))]
    CapsuleGuid { got: Guid },
    #[kind(CompromisedData)]
    #[snafu(display(
        "Capsule header size {header_size:#x}, image size {image_size:#x} and buffer size {size:#x} are inconsistent"
    ))]
    CapsuleSize {
        header_size: u32,
        image_size: u32,
        size: usize,
    },
    #[kind(IncompatibleVersion)]
    #[snafu(display("Expected FMP capsule version {FMP_CAPSULE_VERSION}, got {got}"))]
    FmpVersion { got: u32 },
    #[kind(CompromisedData)]
    #[snafu(display("{count} item offsets do not fit in {size:#x} bytes"))]
    ItemCount { count: usize, size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Capsule without items has {size:#x} bytes instead of {expected:#x}"))]
    TrailingData { size: usize, expected: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Item {index}: offset {offset:#x} is outside [{min:#x}, {max:#x})"))]
    ItemOffset {
        index: usize,
        offset: u64,
        min: usize,
        max: usize,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Item {index}: offset {offset:#x} is before the previous offset {previous:#x}"))]
    ItemOrder {
        index: usize,
        offset: u64,
        previous: u64,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Driver {index} is empty"))]
    EmptyDriver { index: usize },
    #[kind(IncompatibleVersion)]
    #[snafu(display("Payload {index}: unsupported image header version {got}"))]
    ImageVersion { index: usize, got: u32 },
    #[kind(CompromisedData)]
    #[snafu(display(
        "Payload {index}: item of {len:#x} bytes does not hold header, image and vendor code of {expected:#x} bytes"
    ))]
    ImageSize {
        index: usize,
        len: usize,
        expected: u64,
    },
    #[kind(source)]
    #[snafu(display("Capsule {what} is out of bounds"))]
    Bounds {
        what: &'static str,
        source: bounds::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A payload item whose image header matches its length.
#[derive(Debug, Clone)]
pub struct FmpPayload<'a> {
    pub header: FmpImageHdr,
    pub image: &'a [u8],
    pub vendor_code: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct FmpCapsule<'a> {
    pub header: CapsuleHdr,
    pub fmp_header: FmpCapsuleHdr,
    pub drivers: Vec<&'a [u8]>,
    pub payloads: Vec<FmpPayload<'a>>,
}

fn check_capsule_header(hdr: &CapsuleHdr, size: usize) -> Result<usize> {
    if hdr.capsule_guid != FMP_CAPSULE_GUID {
        return error::CapsuleGuid {
            got: hdr.capsule_guid,
        }
        .fail();
    }
    let header_size = hdr.header_size.to_ne();
    let image_size = hdr.capsule_image_size.to_ne();
    let consistent = size_of::<CapsuleHdr>() <= header_size as usize
        && header_size <= image_size
        && image_size as usize == size;
    if !consistent {
        return error::CapsuleSize {
            header_size,
            image_size,
            size,
        }
        .fail();
    }
    Ok(header_size as usize)
}

/// Reads the item offset list and checks it against the body.
///
/// Returns the byte range of every item, drivers first.
fn item_ranges(body: &Cursor<'_>, count: usize) -> Result<Vec<(usize, usize)>> {
    let size = body.len();
    let list_end = count
        .checked_mul(size_of::<u64>())
        .and_then(|len| len.checked_add(size_of::<FmpCapsuleHdr>()));
    let header_size = match list_end {
        Some(end) if end <= size => end,
        _ => return error::ItemCount { count, size }.fail(),
    };
    if count == 0 {
        if size != header_size {
            return error::TrailingData {
                size,
                expected: header_size,
            }
            .fail();
        }
        return Ok(vec![]);
    }

    let mut offsets = Vec::with_capacity(count);
    let mut previous = 0;
    for index in 0..count {
        let at = size_of::<FmpCapsuleHdr>() + index * size_of::<u64>();
        let offset = body.read::<Lu64>(at).context(error::Bounds {
            what: "item offset list",
        })?;
        let offset = offset.to_ne();
        let in_body = usize::try_from(offset)
            .ok()
            .filter(|o| (header_size..size).contains(o));
        let Some(start) = in_body else {
            return error::ItemOffset {
                index,
                offset,
                min: header_size,
                max: size,
            }
            .fail();
        };
        if offset < previous {
            return error::ItemOrder {
                index,
                offset,
                previous,
            }
            .fail();
        }
        previous = offset;
        offsets.push(start);
    }

    let ends = offsets.iter().skip(1).copied().chain([size]);
    Ok(offsets.iter().copied().zip(ends).collect())
}

fn check_payload<'a>(item: &'a [u8], index: usize) -> Result<FmpPayload<'a>> {
    let cursor = Cursor::new(item);
    let version = cursor.read_u32(0).context(error::Bounds {
        what: "image header version",
    })?;
    let Some(header_size) = image_header_size(version) else {
        return error::ImageVersion {
            index,
            got: version,
        }
        .fail();
    };
    let raw = cursor.slice(0, header_size).context(error::Bounds {
        what: "image header",
    })?;
    let mut header = FmpImageHdr::new_zeroed();
    header.as_mut_bytes()[..header_size].copy_from_slice(raw);

    let image_size = header.update_image_size.to_ne();
    let vendor_code_size = header.update_vendor_code_size.to_ne();
    let expected = header_size as u64 + image_size as u64 + vendor_code_size as u64;
    if expected != item.len() as u64 {
        return error::ImageSize {
            index,
            len: item.len(),
            expected,
        }
        .fail();
    }
    let image = cursor
        .slice(header_size, image_size as usize)
        .context(error::Bounds { what: "image" })?;
    let vendor_code = cursor
        .tail(header_size + image_size as usize)
        .context(error::Bounds {
            what: "vendor code",
        })?
        .bytes();
    Ok(FmpPayload {
        header,
        image,
        vendor_code,
    })
}

fn validate(bytes: &[u8]) -> Result<FmpCapsule<'_>> {
    if bytes.is_empty() {
        return error::EmptyCapsule.fail();
    }
    let size = bytes.len();
    let cursor = Cursor::new(bytes);
    let Ok(header) = cursor.read::<CapsuleHdr>(0) else {
        return error::TooSmall { size }.fail();
    };
    let header_size = check_capsule_header(&header, size)?;
    let body = cursor.tail(header_size).context(error::Bounds { what: "body" })?;

    let fmp_header = body
        .read::<FmpCapsuleHdr>(0)
        .context(error::Bounds { what: "FMP header" })?;
    let version = fmp_header.version.to_ne();
    if version != FMP_CAPSULE_VERSION {
        return error::FmpVersion { got: version }.fail();
    }
    let driver_count = fmp_header.embedded_driver_count.to_ne() as usize;
    let payload_count = fmp_header.payload_item_count.to_ne() as usize;
    let ranges = item_ranges(&body, driver_count + payload_count)?;

    let mut drivers = Vec::with_capacity(driver_count);
    let mut payloads = Vec::with_capacity(payload_count);
    for (index, (start, end)) in ranges.into_iter().enumerate() {
        let item = body
            .slice(start, end - start)
            .context(error::Bounds { what: "item" })?;
        if index < driver_count {
            if item.is_empty() {
                return error::EmptyDriver { index }.fail();
            }
            drivers.push(item);
        } else {
            payloads.push(check_payload(item, index - driver_count)?);
        }
    }
    Ok(FmpCapsule {
        header,
        fmp_header,
        drivers,
        payloads,
    })
}

/// Checks the capsule header, the item offset list, and the image header
/// of every payload against the sizes they declare.
pub fn validate_fmp_capsule(bytes: &[u8]) -> Result<FmpCapsule<'_>> {
    match validate(bytes) {
        Ok(capsule) => {
            log::debug!(
                "capsule accepted: {} drivers, {} payloads",
                capsule.drivers.len(),
                capsule.payloads.len()
            );
            Ok(capsule)
        }
        Err(e) => {
            log::warn!("capsule rejected: {e}");
            Err(e)
        }
    }
}

impl FmpCapsule<'_> {
    pub fn item_count(&self) -> usize {
        self.drivers.len() + self.payloads.len()
    }
}
