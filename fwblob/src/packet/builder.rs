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

use crate::identity::TargetField;
use crate::packet::{
    EFI_CERT_TYPE_PKCS7_GUID, PACKET_HDR_SIZE, PACKET_SIZE_MAX, PacketHdr, PacketKind, Result,
    WIN_CERT_REVISION, WIN_CERT_TYPE_EFI_GUID, WinCertUefiGuid, error,
};
use crate::utils::endian::{Lu16, Lu32};

/// Lays out a packet around caller-supplied certificate data.
///
/// The certificate is not computed here; the bytes passed to
/// [`signature`](Self::signature) are appended as they are.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    kind: PacketKind,
    identity: u8,
    session_id: u32,
    targets: [String; 3],
    payload: Vec<u8>,
    signature: Vec<u8>,
}

const TARGETS: [TargetField; 3] = [
    TargetField::Manufacturer,
    TargetField::Product,
    TargetField::SerialNumber,
];

fn offset(len: usize) -> Result<u32> {
    match u32::try_from(len) {
        Ok(offset) if len <= PACKET_SIZE_MAX => Ok(offset),
        _ => error::TooLarge { size: len }.fail(),
    }
}

impl PacketBuilder {
    pub fn new(kind: PacketKind) -> Self {
        PacketBuilder {
            kind,
            identity: 0,
            session_id: 0,
            targets: Default::default(),
            payload: vec![],
            signature: vec![],
        }
    }

    pub fn identity(&mut self, identity: u8) -> &mut Self {
        self.identity = identity;
        self
    }

    pub fn session_id(&mut self, session_id: u32) -> &mut Self {
        self.session_id = session_id;
        self
    }

    /// An empty target matches every device.
    pub fn target(&mut self, field: TargetField, value: &str) -> &mut Self {
        if let Some(index) = TARGETS.iter().position(|f| *f == field) {
            self.targets[index] = value.to_owned();
        }
        self
    }

    pub fn payload(&mut self, payload: &[u8]) -> &mut Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn signature(&mut self, signature: &[u8]) -> &mut Self {
        self.signature = signature.to_vec();
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut packet = vec![0u8; PACKET_HDR_SIZE];
        let mut offsets = [0u32; 3];
        for ((field, value), offset_slot) in TARGETS.iter().zip(&self.targets).zip(&mut offsets) {
            if !value.bytes().all(|b| matches!(b, 0x20..=0x7e)) {
                return error::InvalidTarget {
                    field: *field,
                    value,
                }
                .fail();
            }
            *offset_slot = offset(packet.len())?;
            packet.extend(value.as_bytes());
            packet.push(0);
        }
        let payload_offset = offset(packet.len())?;
        let payload_size = offset(self.payload.len())?;
        packet.extend(&self.payload);

        let cert_len = size_of::<WinCertUefiGuid>() + self.signature.len();
        let cert = WinCertUefiGuid {
            dw_length: Lu32::new(offset(cert_len)?),
            revision: Lu16::new(WIN_CERT_REVISION),
            certificate_type: Lu16::new(WIN_CERT_TYPE_EFI_GUID),
            cert_type: EFI_CERT_TYPE_PKCS7_GUID,
        };
        packet.extend(cert.as_bytes());
        packet.extend(&self.signature);
        offset(packet.len())?;

        let [mfg, product, serial] = offsets;
        let hdr = PacketHdr {
            signature: Lu32::new(self.kind.signature()),
            version: self.kind.version(),
            identity: self.identity,
            reserved: [0; 2],
            session_id: Lu32::new(self.session_id),
            system_mfg_offset: Lu32::new(mfg),
            system_product_offset: Lu32::new(product),
            system_serial_offset: Lu32::new(serial),
            payload_offset: Lu32::new(payload_offset),
            payload_size: Lu32::new(payload_size),
        };
        packet[..PACKET_HDR_SIZE].copy_from_slice(hdr.as_bytes());
        Ok(packet)
    }
}
