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
use fwblob::policy::target::PolicyTarget;
use rstest::rstest;

use crate::policy::{Error, parse_identity_arg, parse_nonce_arg, parse_target_arg};

#[test]
fn test_parse_target_arg() {
    let target = parse_target_arg(
        "manufacturer=Contoso,product=Laptop,serial_number=SN-1,oem1=Fleet,nonce=4660,policy=3",
    )
    .unwrap();
    assert_eq!(
        target,
        PolicyTarget {
            manufacturer: "Contoso".to_owned(),
            product: "Laptop".to_owned(),
            serial_number: "SN-1".to_owned(),
            oem1: "Fleet".to_owned(),
            oem2: String::new(),
            nonce: 4660,
            policy: 3,
        }
    );
}

#[rstest]
#[case("manufacturer=Contoso,product=Laptop,serial_number=SN-1,policy=3")]
#[case("manufacturer=Contoso,product=Laptop,serial_number=SN-1,nonce=x,policy=3")]
fn test_parse_target_arg_invalid(#[case] arg: &str) {
    assert_matches!(
        parse_target_arg(arg),
        Err(Error::ParseArg { arg: a, .. }) if a == arg
    );
}

#[test]
fn test_parse_identity_arg() {
    let identity = parse_identity_arg("manufacturer=Contoso,product=Laptop,serial_number=SN-1")
        .unwrap();
    assert_eq!(
        identity,
        StaticIdentity {
            manufacturer: "Contoso".to_owned(),
            product: "Laptop".to_owned(),
            serial_number: "SN-1".to_owned(),
            ..Default::default()
        }
    );
    assert_matches!(
        parse_identity_arg("manufacturer=Contoso"),
        Err(Error::ParseArg { .. })
    );
}

#[rstest]
#[case("4660", Some(4660))]
#[case("nonce", None)]
fn test_parse_nonce_arg(#[case] arg: &str, #[case] expected: Option<u64>) {
    assert_eq!(parse_nonce_arg(arg).ok(), expected);
}
