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
#[path = "processor_test.rs"]
mod tests;

use crate::errors::ErrorKind;
use crate::identity::DeviceIdentity;
use crate::packet::{DecodedPacket, Error, PacketKind, Result, check_target, decode_packet, error};

/// Progress of one packet through [`PacketProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    Uninitialized,
    DataPresent,
    /// Rejected for good. Carries the kind of the failure.
    DataInvalid(ErrorKind),
    DataNotCorrectTarget,
    /// The device identity is not available yet; process again later.
    DataDelayedProcessing,
    DataTargeted,
    Aborted,
}

impl PacketState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PacketState::DataInvalid(_) | PacketState::DataNotCorrectTarget | PacketState::Aborted
        )
    }

    fn from_error(e: &Error) -> Self {
        match e.kind() {
            ErrorKind::Delayed => PacketState::DataDelayedProcessing,
            ErrorKind::NotCorrectTarget => PacketState::DataNotCorrectTarget,
            kind => PacketState::DataInvalid(kind),
        }
    }
}

/// Drives a single packet from delivery to a targeting decision.
///
/// Decoding is pure, so a packet in `DataDelayedProcessing` is decoded
/// again from scratch with identical results.
#[derive(Debug)]
pub struct PacketProcessor<'a> {
    kind: PacketKind,
    data: &'a [u8],
    state: PacketState,
}

impl<'a> PacketProcessor<'a> {
    pub fn new(kind: PacketKind) -> Self {
        PacketProcessor {
            kind,
            data: &[],
            state: PacketState::Uninitialized,
        }
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    fn transition(&mut self, state: PacketState) {
        if self.state != state {
            log::debug!(
                "{} packet: {:?} -> {state:?}",
                self.kind.as_str(),
                self.state
            );
        }
        self.state = state;
    }

    /// Hands the packet bytes to the processor. An empty packet is
    /// rejected immediately.
    pub fn set_data(&mut self, data: &'a [u8]) -> Result<PacketState> {
        if self.state != PacketState::Uninitialized {
            return error::State { state: self.state }.fail();
        }
        self.data = data;
        if data.is_empty() {
            self.transition(PacketState::DataInvalid(ErrorKind::InvalidParameter));
        } else {
            self.transition(PacketState::DataPresent);
        }
        Ok(self.state)
    }

    /// Decodes the packet and checks its targets against `identity`.
    pub fn process(&mut self, identity: &dyn DeviceIdentity) -> Result<DecodedPacket<'a>> {
        match self.state {
            PacketState::DataPresent
            | PacketState::DataDelayedProcessing
            | PacketState::DataTargeted => {}
            state => return error::State { state }.fail(),
        }
        let result = decode_packet(self.data, self.kind).and_then(|packet| {
            check_target(&packet, identity)?;
            Ok(packet)
        });
        match &result {
            Ok(_) => self.transition(PacketState::DataTargeted),
            Err(e) => self.transition(PacketState::from_error(e)),
        }
        result
    }

    /// Stops processing. Terminal states are kept as they are.
    pub fn abort(&mut self) -> PacketState {
        if !self.state.is_terminal() {
            self.transition(PacketState::Aborted);
        }
        self.state
    }
}
