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

//! Signature envelope around policy content.
//!
//! Cryptographic verification is performed by the platform. This crate only
//! consumes the outcome: either verified content borrowed from the signed
//! buffer, or an error.

use snafu::Snafu;

use crate::errors::{DebugTrace, trace_error};

/// A PKCS#7 (or equivalent) envelope verifier.
pub trait SignatureEnvelope {
    type Error: DebugTrace + Send + Sync + 'static;

    /// Verifies the signature over the whole of `signed` against
    /// `trust_anchor`, checks that the leaf certificate carries
    /// `required_eku`, and only then returns the embedded content.
    fn verify_and_extract<'a>(
        &self,
        signed: &'a [u8],
        trust_anchor: &[u8],
        required_eku: &str,
    ) -> Result<&'a [u8], Self::Error>;

    /// Returns the embedded content without verifying the signature. Only
    /// valid for buffers that already went through
    /// [`verify_and_extract`](Self::verify_and_extract).
    fn attached_content<'a>(&self, signed: &'a [u8]) -> Result<&'a [u8], Self::Error>;
}

#[trace_error]
#[derive(Snafu, DebugTrace)]
#[snafu(module, context(suffix(false)))]
pub enum Error {
    #[snafu(display("Unsigned content cannot be verified"))]
    NotSigned,
    #[snafu(display("Content is empty"))]
    EmptyContent,
}

/// Content whose envelope was stripped and verified elsewhere.
///
/// `verify_and_extract` always fails, so an unsigned buffer can never pass
/// [`validate_blob`](crate::policy::validate_blob).
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsigned;

impl SignatureEnvelope for Unsigned {
    type Error = Error;

    fn verify_and_extract<'a>(
        &self,
        _signed: &'a [u8],
        _trust_anchor: &[u8],
        _required_eku: &str,
    ) -> Result<&'a [u8], Error> {
        error::NotSigned.fail()
    }

    fn attached_content<'a>(&self, signed: &'a [u8]) -> Result<&'a [u8], Error> {
        if signed.is_empty() {
            return error::EmptyContent.fail();
        }
        Ok(signed)
    }
}
