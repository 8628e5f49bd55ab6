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
use crate::packet::builder::PacketBuilder;
use crate::packet::identity::{IdentityAction, IdentityRole, decode_identity_packet};
use crate::packet::{Error, PacketKind};

fn identity_packet(identity: u8, certificate: &[u8]) -> Vec<u8> {
    PacketBuilder::new(PacketKind::Identity)
        .identity(identity)
        .payload(certificate)
        .signature(b"sig")
        .build()
        .unwrap()
}

#[rstest]
#[case(IdentityRole::OWNER)]
#[case(IdentityRole::USER)]
#[case(IdentityRole::USER1)]
#[case(IdentityRole::USER2)]
#[case(IdentityRole::ZTD)]
fn test_enroll(#[case] role: IdentityRole) {
    let packet = identity_packet(role.raw(), b"\x30\x82cert");
    let decoded = decode_identity_packet(&packet).unwrap();
    assert_eq!(decoded.role, role);
    assert_eq!(
        decoded.action,
        IdentityAction::Enroll {
            certificate: b"\x30\x82cert"
        }
    );
}

#[test]
fn test_unenroll() {
    let packet = identity_packet(IdentityRole::USER.raw(), &[]);
    let decoded = decode_identity_packet(&packet).unwrap();
    assert_eq!(decoded.action, IdentityAction::Unenroll);
    assert!(decoded.packet.payload.is_empty());
}

#[rstest]
#[case(0)]
#[case(0x03)]
#[case(0x20)]
#[case(0x80)]
fn test_bad_identity(#[case] identity: u8) {
    let packet = identity_packet(identity, b"cert");
    let err = decode_identity_packet(&packet).unwrap_err();
    assert_matches!(err, Error::Identity { got, .. } if got == identity);
    assert_eq!(err.kind(), ErrorKind::CompromisedData);
}

#[test]
fn test_not_an_identity_packet() {
    let packet = PacketBuilder::new(PacketKind::Settings)
        .identity(IdentityRole::OWNER.raw())
        .build()
        .unwrap();
    assert_matches!(
        decode_identity_packet(&packet),
        Err(Error::Signature { .. })
    );
}

#[test]
fn test_role_name() {
    assert_eq!(IdentityRole::ZTD.name(), Some("ZTD"));
    assert_eq!(format!("{:?}", IdentityRole::from(0x40)), "IdentityRole(64)");
}
