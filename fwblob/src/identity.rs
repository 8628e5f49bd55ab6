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

use serde::Deserialize;

/// Identity strings a policy or packet can be targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetField {
    Manufacturer,
    Product,
    SerialNumber,
    Oem1,
    Oem2,
}

impl TargetField {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetField::Manufacturer => "manufacturer",
            TargetField::Product => "product",
            TargetField::SerialNumber => "serial number",
            TargetField::Oem1 => "OEM 01",
            TargetField::Oem2 => "OEM 02",
        }
    }
}

/// Source of the live device identity.
pub trait DeviceIdentity {
    /// Returns `None` if the value is not available yet, e.g. before the
    /// platform has published its SMBIOS tables.
    fn identity(&self, field: TargetField) -> Option<&str>;
}

/// A fixed identity, typically taken from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StaticIdentity {
    pub manufacturer: String,
    pub product: String,
    pub serial_number: String,
    #[serde(default)]
    pub oem1: String,
    #[serde(default)]
    pub oem2: String,
}

impl DeviceIdentity for StaticIdentity {
    fn identity(&self, field: TargetField) -> Option<&str> {
        let val = match field {
            TargetField::Manufacturer => &self.manufacturer,
            TargetField::Product => &self.product,
            TargetField::SerialNumber => &self.serial_number,
            TargetField::Oem1 => &self.oem1,
            TargetField::Oem2 => &self.oem2,
        };
        Some(val)
    }
}
