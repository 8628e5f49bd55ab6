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

use std::error::Error;
use std::fmt;

use snafu::{ErrorCompat, IntoError, ResultExt};

pub use macros::{DebugTrace, ErrorKind, trace_error};

pub trait DebugTrace: Error {
    fn debug_trace(&self, f: &mut fmt::Formatter) -> Result<u32, fmt::Error>;
}

impl Error for Box<dyn DebugTrace + Send + Sync + 'static> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(Box::as_ref(self))
    }
}

pub trait BoxTrace<'a, T> {
    fn box_trace<C, E>(self, context: C) -> Result<T, E>
    where
        C: IntoError<E, Source = Box<dyn DebugTrace + Send + Sync + 'a>>,
        E: Error + ErrorCompat;
}

impl<'a, T, E1> BoxTrace<'a, T> for Result<T, E1>
where
    E1: DebugTrace + Send + Sync + 'a,
{
    fn box_trace<C, E>(self, context: C) -> Result<T, E>
    where
        C: IntoError<E, Source = Box<dyn DebugTrace + Send + Sync + 'a>>,
        E: Error + ErrorCompat,
    {
        self.map_err(|e| Box::new(e) as _).context(context)
    }
}

/// Coarse classification shared by every error in this crate.
///
/// Callers that only need to decide between "reject", "retry later", and
/// "absent" match on this instead of the per-module variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input was empty. A caller bug, not attacker-controlled.
    InvalidParameter,
    /// The buffer size is outside the fixed `[min, max]` envelope.
    BadBufferSize,
    /// A structural invariant failed after the minimum size was confirmed.
    CompromisedData,
    /// A version field does not equal the single supported value.
    IncompatibleVersion,
    /// The signature envelope failed verification.
    SecurityViolation,
    /// A well-formed blob does not contain the requested item.
    NotFound,
    /// A well-formed blob or packet targets a different device.
    NotCorrectTarget,
    /// Processing must be retried once the platform is ready.
    Delayed,
}

impl ErrorKind {
    /// Whether the input must be discarded without retry.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorKind::NotFound | ErrorKind::Delayed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::BadBufferSize => "bad buffer size",
            ErrorKind::CompromisedData => "compromised data",
            ErrorKind::IncompatibleVersion => "incompatible version",
            ErrorKind::SecurityViolation => "security violation",
            ErrorKind::NotFound => "not found",
            ErrorKind::NotCorrectTarget => "not the correct target",
            ErrorKind::Delayed => "delayed",
        };
        f.write_str(s)
    }
}
