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
use fwblob::identity::StaticIdentity;
use fwblob::packet::PacketKind;
use rstest::rstest;

use crate::packet::{Error, parse_identity_arg, parse_kind_arg};

#[rstest]
#[case("identity", PacketKind::Identity)]
#[case("permission", PacketKind::Permission)]
#[case("settings", PacketKind::Settings)]
fn test_parse_kind_arg(#[case] arg: &str, #[case] kind: PacketKind) {
    assert_eq!(parse_kind_arg(arg).unwrap(), kind);
    assert_eq!(kind.as_str(), arg);
}

#[rstest]
#[case("Settings")]
#[case("policy")]
fn test_parse_kind_arg_invalid(#[case] arg: &str) {
    assert_matches!(
        parse_kind_arg(arg),
        Err(Error::ParseArg { arg: a, .. }) if a == arg
    );
}

#[test]
fn test_parse_identity_arg() {
    let identity =
        parse_identity_arg("manufacturer=Contoso,product=Laptop,serial_number=SN-1,oem2=Lab")
            .unwrap();
    assert_eq!(
        identity,
        StaticIdentity {
            manufacturer: "Contoso".to_owned(),
            product: "Laptop".to_owned(),
            serial_number: "SN-1".to_owned(),
            oem2: "Lab".to_owned(),
            ..Default::default()
        }
    );
}
