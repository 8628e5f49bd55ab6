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
#[path = "identity_test.rs"]
mod tests;

use crate::consts;
use crate::packet::{DecodedPacket, PacketKind, Result, decode_packet, error};

consts! {
    /// Identity slots a certificate can be enrolled into. An identity
    /// packet names exactly one.
    #[derive(Default, Hash)]
    pub struct IdentityRole(u8) {
        OWNER = 1 << 0;
        USER = 1 << 1;
        USER1 = 1 << 2;
        USER2 = 1 << 3;
        ZTD = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityAction<'a> {
    /// DER certificate to install for the role.
    Enroll { certificate: &'a [u8] },
    Unenroll,
}

#[derive(Debug, Clone)]
pub struct IdentityPacket<'a> {
    pub packet: DecodedPacket<'a>,
    pub role: IdentityRole,
    pub action: IdentityAction<'a>,
}

/// Decodes an identity packet, whose payload is the certificate of
/// `role`. An empty payload removes the role's certificate.
pub fn decode_identity_packet(data: &[u8]) -> Result<IdentityPacket<'_>> {
    let packet = decode_packet(data, PacketKind::Identity)?;
    let role = IdentityRole::from(packet.header.identity);
    if role.raw().count_ones() != 1 || role.name().is_none() {
        log::warn!("identity packet rejected: identity {:#04x}", role.raw());
        return error::Identity { got: role.raw() }.fail();
    }
    let action = if packet.payload.is_empty() {
        IdentityAction::Unenroll
    } else {
        IdentityAction::Enroll {
            certificate: packet.payload,
        }
    };
    log::debug!(
        "identity packet for {role:?}, certificate {:#x} bytes",
        packet.payload.len()
    );
    Ok(IdentityPacket {
        packet,
        role,
        action,
    })
}
