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

//! Targeted provisioning packets.
//!
//! ```text
//! 0                PacketHdr              32 bytes
//! mfg_offset       manufacturer\0         up to product_offset
//! product_offset   product\0              up to serial_offset
//! serial_offset    serial number\0        up to payload_offset
//! payload_offset   payload                payload_size bytes
//! signed_len       WinCertUefiGuid        dw_length bytes, to the end
//! ```
//!
//! `signed_len` is `payload_offset + payload_size`. Everything before it is
//! covered by the signature, which the caller verifies.

pub mod builder;
pub mod identity;
pub mod processor;

#[cfg(test)]
#[path = "packet_test.rs"]
mod tests;

use std::mem::size_of;

use macros::Layout;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::{DebugTrace, ErrorKind, trace_error};
use crate::identity::{DeviceIdentity, TargetField};
use crate::utils::bounds::{self, Cursor};
use crate::utils::endian::{Lu16, Lu32};
use crate::utils::guid::Guid;

pub const PACKET_SIGNATURE_IDENTITY: u32 = u32::from_le_bytes(*b"MSSI");
pub const PACKET_SIGNATURE_PERMISSION: u32 = u32::from_le_bytes(*b"MSPM");
pub const PACKET_SIGNATURE_SETTINGS: u32 = u32::from_le_bytes(*b"MSS2");
pub const PACKET_VERSION_IDENTITY: u8 = 2;
pub const PACKET_VERSION_PERMISSION: u8 = 2;
pub const PACKET_VERSION_SETTINGS: u8 = 1;

pub const PACKET_HDR_SIZE: usize = size_of::<PacketHdr>();
pub const PACKET_SIZE_MAX: usize = 0x10000;

pub const WIN_CERT_REVISION: u16 = 0x0200;
pub const WIN_CERT_TYPE_EFI_GUID: u16 = 0x0EF1;
pub const EFI_CERT_TYPE_PKCS7_GUID: Guid = Guid::from_fields(
    0x4AAFD29D,
    0x68DF,
    0x49EE,
    [0x8A, 0xA9, 0x34, 0x7D, 0x37, 0x56, 0x65, 0xA7],
);

#[repr(C)]
#[derive(Debug, Clone, Default, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct PacketHdr {
    pub signature: Lu32,
    pub version: u8,
    pub identity: u8,
    pub reserved: [u8; 2],
    pub session_id: Lu32,
    pub system_mfg_offset: Lu32,
    pub system_product_offset: Lu32,
    pub system_serial_offset: Lu32,
    pub payload_offset: Lu32,
    pub payload_size: Lu32,
}

/// `WIN_CERTIFICATE_UEFI_GUID` without its trailing certificate data.
#[repr(C)]
#[derive(Debug, Clone, Default, Layout, KnownLayout, Immutable, FromBytes, IntoBytes, Unaligned)]
pub struct WinCertUefiGuid {
    /// Includes this header.
    pub dw_length: Lu32,
    pub revision: Lu16,
    pub certificate_type: Lu16,
    pub cert_type: Guid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Identity,
    Permission,
    Settings,
}

impl PacketKind {
    pub fn signature(self) -> u32 {
        match self {
            PacketKind::Identity => PACKET_SIGNATURE_IDENTITY,
            PacketKind::Permission => PACKET_SIGNATURE_PERMISSION,
            PacketKind::Settings => PACKET_SIGNATURE_SETTINGS,
        }
    }

    pub fn version(self) -> u8 {
        match self {
            PacketKind::Identity => PACKET_VERSION_IDENTITY,
            PacketKind::Permission => PACKET_VERSION_PERMISSION,
            PacketKind::Settings => PACKET_VERSION_SETTINGS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PacketKind::Identity => "identity",
            PacketKind::Permission => "permission",
            PacketKind::Settings => "settings",
        }
    }
}

#[trace_error]
#[derive(Snafu, DebugTrace, ErrorKind)]
#[snafu(module, visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    #[kind(InvalidParameter)]
    #[snafu(display("Packet is empty"))]
    EmptyPacket,
    #[kind(BadBufferSize)]
    #[snafu(display("Packet size {size:#x} exceeds {PACKET_SIZE_MAX:#x}"))]
    TooLarge { size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Packet size {size:#x} is smaller than its header"))]
    TooSmall { size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Expected {} packet signature {expected:#010x}, got {got:#010x}", kind.as_str()))]
    Signature {
        kind: PacketKind,
        expected: u32,
        got: u32,
    },
    #[kind(IncompatibleVersion)]
    #[snafu(display("Expected {} packet version {expected}, got {got}", kind.as_str()))]
    Version {
        kind: PacketKind,
        expected: u8,
        got: u8,
    },
    #[kind(IncompatibleVersion)]
    #[snafu(display(
        "Offsets {mfg:#x}, {product:#x}, {serial:#x}, {payload:#x} are not strictly increasing from {PACKET_HDR_SIZE:#x}"
    ))]
    Offsets {
        mfg: u32,
        product: u32,
        serial: u32,
        payload: u32,
    },
    #[kind(source)]
    #[snafu(display("Packet {what} is out of bounds"))]
    Bounds {
        what: &'static str,
        source: bounds::Error,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Certificate at {offset:#x} with length {dw_length:#x} does not end the packet of {size:#x} bytes"))]
    CertLength {
        offset: usize,
        dw_length: u32,
        size: usize,
    },
    #[kind(CompromisedData)]
    #[snafu(display("Expected certificate revision {WIN_CERT_REVISION:#x}, got {got:#x}"))]
    CertRevision { got: u16 },
    #[kind(CompromisedData)]
    #[snafu(display("Expected certificate type {WIN_CERT_TYPE_EFI_GUID:#x}, got {got:#x}"))]
    CertType { got: u16 },
    #[kind(CompromisedData)]
    #[snafu(display("Expected certificate GUID {EFI_CERT_TYPE_PKCS7_GUID}, got {got}"))]
    CertGuid { got: Guid },
    #[kind(CompromisedData)]
    #[snafu(display("Target {} is not NUL-terminated", field.as_str()))]
    Unterminated { field: TargetField },
    #[kind(CompromisedData)]
    #[snafu(display("Target {} contains non-printable characters", field.as_str()))]
    NotPrintable { field: TargetField },
    #[kind(CompromisedData)]
    #[snafu(display("Identity byte {got:#04x} does not name a single known identity"))]
    Identity { got: u8 },
    #[kind(NotCorrectTarget)]
    #[snafu(display("Packet targets {} {expected:?}, device has {got:?}", field.as_str()))]
    TargetMismatch {
        field: TargetField,
        expected: String,
        got: String,
    },
    #[kind(Delayed)]
    #[snafu(display("Device {} is not available yet", field.as_str()))]
    IdentityUnavailable { field: TargetField },
    #[kind(InvalidParameter)]
    #[snafu(display("Packet cannot be processed in state {state:?}"))]
    State { state: processor::PacketState },
    #[kind(InvalidParameter)]
    #[snafu(display("Target {} {value:?} cannot be encoded", field.as_str()))]
    InvalidTarget { field: TargetField, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A packet whose structure has been checked, borrowing from its buffer.
#[derive(Debug, Clone)]
pub struct DecodedPacket<'a> {
    pub kind: PacketKind,
    pub header: PacketHdr,
    pub manufacturer: &'a str,
    pub product: &'a str,
    pub serial_number: &'a str,
    pub payload: &'a [u8],
    /// Bytes covered by the signature, `0..signed_len`.
    pub signed: &'a [u8],
    pub cert: WinCertUefiGuid,
    /// Certificate data following [`WinCertUefiGuid`].
    pub signature: &'a [u8],
}

impl DecodedPacket<'_> {
    pub fn session_id(&self) -> u32 {
        self.header.session_id.to_ne()
    }

    /// Targeting strings in comparison order.
    pub fn targets(&self) -> [(TargetField, &str); 3] {
        [
            (TargetField::Manufacturer, self.manufacturer),
            (TargetField::Product, self.product),
            (TargetField::SerialNumber, self.serial_number),
        ]
    }
}

fn check_offsets(hdr: &PacketHdr) -> Result<()> {
    let mfg = hdr.system_mfg_offset.to_ne();
    let product = hdr.system_product_offset.to_ne();
    let serial = hdr.system_serial_offset.to_ne();
    let payload = hdr.payload_offset.to_ne();
    let increasing =
        PACKET_HDR_SIZE <= mfg as usize && mfg < product && product < serial && serial < payload;
    if !increasing {
        return error::Offsets {
            mfg,
            product,
            serial,
            payload,
        }
        .fail();
    }
    Ok(())
}

fn check_cert(cert: &WinCertUefiGuid, offset: usize, size: usize) -> Result<()> {
    let dw_length = cert.dw_length.to_ne();
    if offset.checked_add(dw_length as usize) != Some(size) {
        return error::CertLength {
            offset,
            dw_length,
            size,
        }
        .fail();
    }
    let revision = cert.revision.to_ne();
    if revision != WIN_CERT_REVISION {
        return error::CertRevision { got: revision }.fail();
    }
    let certificate_type = cert.certificate_type.to_ne();
    if certificate_type != WIN_CERT_TYPE_EFI_GUID {
        return error::CertType {
            got: certificate_type,
        }
        .fail();
    }
    if cert.cert_type != EFI_CERT_TYPE_PKCS7_GUID {
        return error::CertGuid {
            got: cert.cert_type,
        }
        .fail();
    }
    Ok(())
}

/// Returns the string in `region` up to its first NUL.
fn target_string(region: &[u8], field: TargetField) -> Result<&str> {
    let Some(len) = region.iter().position(|b| *b == 0) else {
        return error::Unterminated { field }.fail();
    };
    let bytes = &region[..len];
    if !bytes.iter().all(|b| matches!(b, 0x20..=0x7e)) {
        return error::NotPrintable { field }.fail();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(_) => error::NotPrintable { field }.fail(),
    }
}

fn target_region<'a>(
    cursor: &Cursor<'a>,
    start: &Lu32,
    end: &Lu32,
    field: TargetField,
) -> Result<&'a str> {
    let start = start.to_ne() as usize;
    let size = (end.to_ne() as usize).saturating_sub(start);
    let region = cursor.slice(start, size).context(error::Bounds {
        what: field.as_str(),
    })?;
    target_string(region, field)
}

fn decode(data: &[u8], kind: PacketKind) -> Result<DecodedPacket<'_>> {
    if data.is_empty() {
        return error::EmptyPacket.fail();
    }
    let size = data.len();
    if size > PACKET_SIZE_MAX {
        return error::TooLarge { size }.fail();
    }
    if size < PACKET_HDR_SIZE {
        return error::TooSmall { size }.fail();
    }
    let cursor = Cursor::new(data);
    let header = cursor
        .read::<PacketHdr>(0)
        .context(error::Bounds { what: "header" })?;
    let signature = header.signature.to_ne();
    if signature != kind.signature() {
        return error::Signature {
            kind,
            expected: kind.signature(),
            got: signature,
        }
        .fail();
    }
    if header.version != kind.version() {
        return error::Version {
            kind,
            expected: kind.version(),
            got: header.version,
        }
        .fail();
    }
    check_offsets(&header)?;

    let payload_offset = header.payload_offset.to_ne() as usize;
    let payload_size = header.payload_size.to_ne() as usize;
    let payload = cursor
        .range(payload_offset, payload_size)
        .context(error::Bounds { what: "payload" })?;
    let signed_len = payload.end;
    let (cert, cert_data) = cursor
        .read_next::<WinCertUefiGuid>(signed_len)
        .context(error::Bounds {
            what: "certificate",
        })?;
    check_cert(&cert, signed_len, size)?;

    let manufacturer = target_region(
        &cursor,
        &header.system_mfg_offset,
        &header.system_product_offset,
        TargetField::Manufacturer,
    )?;
    let product = target_region(
        &cursor,
        &header.system_product_offset,
        &header.system_serial_offset,
        TargetField::Product,
    )?;
    let serial_number = target_region(
        &cursor,
        &header.system_serial_offset,
        &header.payload_offset,
        TargetField::SerialNumber,
    )?;
    Ok(DecodedPacket {
        kind,
        manufacturer,
        product,
        serial_number,
        payload: &data[payload],
        signed: &data[..signed_len],
        signature: &data[cert_data..],
        cert,
        header,
    })
}

/// Checks the structure of a `kind` packet and splits it into its parts.
///
/// Offsets are checked for order before any targeting string is read, and
/// the signed length is checked against the packet size once and reused
/// for both the payload and the certificate.
pub fn decode_packet(data: &[u8], kind: PacketKind) -> Result<DecodedPacket<'_>> {
    match decode(data, kind) {
        Ok(packet) => {
            log::debug!(
                "{} packet accepted: session {:#x}, payload {:#x} bytes",
                kind.as_str(),
                packet.session_id(),
                packet.payload.len()
            );
            Ok(packet)
        }
        Err(e) => {
            log::warn!("{} packet rejected: {e}", kind.as_str());
            Err(e)
        }
    }
}

/// Compares the targeting strings of `packet` with the live device
/// identity. An empty target matches any device.
pub fn check_target(packet: &DecodedPacket, identity: &dyn DeviceIdentity) -> Result<()> {
    for (field, expected) in packet.targets() {
        if expected.is_empty() {
            continue;
        }
        let Some(got) = identity.identity(field) else {
            log::debug!("{} not available, delaying packet", field.as_str());
            return error::IdentityUnavailable { field }.fail();
        };
        if expected.as_bytes() != got.as_bytes() {
            log::warn!("packet targets {} {expected:?}, device has {got:?}", field.as_str());
            return error::TargetMismatch {
                field,
                expected,
                got,
            }
            .fail();
        }
    }
    Ok(())
}
