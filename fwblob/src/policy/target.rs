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
#[path = "target_test.rs"]
mod tests;

use serde::Deserialize;

use crate::envelope::SignatureEnvelope;
use crate::identity::{DeviceIdentity, TargetField};
use crate::policy::{PolicyView, Result, ValueType, attached_content, check_content, error};

/// Well-known rules of a device-targeted policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    Manufacturer,
    Product,
    SerialNumber,
    Oem1,
    Oem2,
    Nonce,
    Policy,
}

const FIELDS: [(PolicyField, &str, ValueType); 7] = [
    (
        PolicyField::Manufacturer,
        "Target\\Manufacturer",
        ValueType::STRING,
    ),
    (PolicyField::Product, "Target\\Product", ValueType::STRING),
    (
        PolicyField::SerialNumber,
        "Target\\SerialNumber",
        ValueType::STRING,
    ),
    (PolicyField::Oem1, "Target\\OEM_01", ValueType::STRING),
    (PolicyField::Oem2, "Target\\OEM_02", ValueType::STRING),
    (PolicyField::Nonce, "Target\\Nonce", ValueType::QWORD),
    (PolicyField::Policy, "UEFI\\Policy", ValueType::QWORD),
];

impl PolicyField {
    pub const ALL: [PolicyField; 7] = [
        PolicyField::Manufacturer,
        PolicyField::Product,
        PolicyField::SerialNumber,
        PolicyField::Oem1,
        PolicyField::Oem2,
        PolicyField::Nonce,
        PolicyField::Policy,
    ];

    /// The `Subkey\ValueName` of this field.
    pub fn name(self) -> &'static str {
        FIELDS[self as usize].1
    }

    pub fn value_type(self) -> ValueType {
        FIELDS[self as usize].2
    }

    pub fn from_name(name: &str) -> Option<PolicyField> {
        FIELDS.iter().find(|(_, n, _)| *n == name).map(|(f, _, _)| *f)
    }

    /// The device identity this field is compared with, if any.
    pub fn target_field(self) -> Option<TargetField> {
        match self {
            PolicyField::Manufacturer => Some(TargetField::Manufacturer),
            PolicyField::Product => Some(TargetField::Product),
            PolicyField::SerialNumber => Some(TargetField::SerialNumber),
            PolicyField::Oem1 => Some(TargetField::Oem1),
            PolicyField::Oem2 => Some(TargetField::Oem2),
            PolicyField::Nonce | PolicyField::Policy => None,
        }
    }
}

/// The targeting rules of a policy together with its policy bits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyTarget {
    pub manufacturer: String,
    pub product: String,
    pub serial_number: String,
    #[serde(default)]
    pub oem1: String,
    #[serde(default)]
    pub oem2: String,
    pub nonce: u64,
    pub policy: u64,
}

impl PolicyTarget {
    pub fn from_view(view: &PolicyView) -> Result<Self> {
        let s = |field: PolicyField| view.get_string(field.name());
        let q = |field: PolicyField| view.get_u64(field.name());
        Ok(PolicyTarget {
            manufacturer: s(PolicyField::Manufacturer)?,
            product: s(PolicyField::Product)?,
            serial_number: s(PolicyField::SerialNumber)?,
            oem1: s(PolicyField::Oem1)?,
            oem2: s(PolicyField::Oem2)?,
            nonce: q(PolicyField::Nonce)?,
            policy: q(PolicyField::Policy)?,
        })
    }

    pub fn string(&self, field: TargetField) -> &str {
        match field {
            TargetField::Manufacturer => &self.manufacturer,
            TargetField::Product => &self.product,
            TargetField::SerialNumber => &self.serial_number,
            TargetField::Oem1 => &self.oem1,
            TargetField::Oem2 => &self.oem2,
        }
    }
}

/// Reads every targeting rule from one validated pass over the content.
pub fn extract_target<E>(envelope: &E, signed: &[u8]) -> Result<PolicyTarget>
where
    E: SignatureEnvelope + ?Sized,
{
    let content = attached_content(envelope, signed)?;
    let view = check_content(content)?;
    PolicyTarget::from_view(&view)
}

/// Requires every targeting string to equal the device value exactly and
/// the nonce to equal the one the device expects.
pub fn verify_target(
    target: &PolicyTarget,
    identity: &dyn DeviceIdentity,
    device_nonce: u64,
) -> Result<()> {
    for field in PolicyField::ALL {
        let Some(target_field) = field.target_field() else {
            continue;
        };
        let Some(device) = identity.identity(target_field) else {
            return error::IdentityUnavailable {
                field: target_field,
            }
            .fail();
        };
        let expected = target.string(target_field);
        if expected != device {
            log::warn!("policy targets {}, device has {device:?}", field.name());
            return error::TargetMismatch {
                field: target_field.as_str(),
                expected,
                got: device,
            }
            .fail();
        }
    }
    if target.nonce != device_nonce {
        return error::NonceMismatch {
            expected: target.nonce,
            got: device_nonce,
        }
        .fail();
    }
    Ok(())
}
