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
#[path = "bounds_test.rs"]
mod tests;

use std::mem::size_of;
use std::ops::Range;

use snafu::Snafu;
use zerocopy::FromBytes;

use crate::errors::{DebugTrace, ErrorKind, trace_error};

#[trace_error]
#[derive(Snafu, DebugTrace, ErrorKind)]
#[snafu(module, visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    #[kind(CompromisedData)]
    #[snafu(display("Range at {offset:#x} with size {size:#x} overflows"))]
    Overflow { offset: usize, size: usize },
    #[kind(CompromisedData)]
    #[snafu(display("Range {offset:#x}+{size:#x} exceeds buffer length {len:#x}"))]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `offset..offset + size` if the whole range lies within `len`.
pub fn check(len: usize, offset: usize, size: usize) -> Result<Range<usize>> {
    let Some(end) = offset.checked_add(size) else {
        return error::Overflow { offset, size }.fail();
    };
    if end > len {
        return error::OutOfBounds { offset, size, len }.fail();
    }
    Ok(offset..end)
}

/// Read-only view over an untrusted buffer. Every access goes through
/// [`check`].
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn range(&self, offset: usize, size: usize) -> Result<Range<usize>> {
        check(self.buf.len(), offset, size)
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&'a [u8]> {
        let range = self.range(offset, size)?;
        Ok(&self.buf[range])
    }

    /// Everything from `offset` to the end of the buffer.
    pub fn tail(&self, offset: usize) -> Result<Cursor<'a>> {
        let size = self.buf.len().saturating_sub(offset);
        let buf = self.slice(offset, size)?;
        Ok(Cursor { buf })
    }

    pub fn read<T: FromBytes>(&self, offset: usize) -> Result<T> {
        let (val, _) = self.read_next(offset)?;
        Ok(val)
    }

    /// Reads a `T` at `offset`, also returning the offset just past it.
    pub fn read_next<T: FromBytes>(&self, offset: usize) -> Result<(T, usize)> {
        let range = self.range(offset, size_of::<T>())?;
        let end = range.end;
        match T::read_from_bytes(&self.buf[range]) {
            Ok(val) => Ok((val, end)),
            Err(_) => error::OutOfBounds {
                offset,
                size: size_of::<T>(),
                len: self.buf.len(),
            }
            .fail(),
        }
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        let bytes = self.read::<[u8; 2]>(offset)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let bytes = self.read::<[u8; 4]>(offset)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        let bytes = self.read::<[u8; 8]>(offset)?;
        Ok(u64::from_le_bytes(bytes))
    }
}
