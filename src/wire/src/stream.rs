// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Primitive write and read streams.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// An error decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The stream ended before the value did.
    #[error("stream truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the decoder needed.
        needed: u64,
        /// Bytes left in the stream.
        remaining: usize,
    },
    /// A string was not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// An enumeration code had no known assignment.
    #[error("unknown {what} code: {code}")]
    UnknownCode {
        /// The enumeration being decoded.
        what: &'static str,
        /// The offending code.
        code: u32,
    },
    /// A command tag had no registered decoder.
    #[error("unknown command tag: {tag}")]
    UnknownTag {
        /// The offending tag.
        tag: u32,
    },
}

/// A stream of appended primitive values.
///
/// Finish with [`WriteStream::finish`] to obtain the encoded payload.
#[derive(Debug, Default)]
pub struct WriteStream {
    buf: BytesMut,
}

impl WriteStream {
    /// Creates an empty stream.
    pub fn new() -> WriteStream {
        WriteStream::default()
    }

    /// Appends a `u32`.
    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    /// Appends an `i32`.
    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    /// Appends a `u64`.
    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    /// Appends an `i64`.
    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    /// Appends an `f32`.
    pub fn put_f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    /// Appends a length-prefixed UTF-8 string, without a trailing NUL.
    pub fn put_string(&mut self, v: &str) {
        self.put_u64(v.len() as u64);
        self.buf.put_slice(v.as_bytes());
    }

    /// Appends a length-prefixed byte buffer.
    pub fn put_bytes(&mut self, v: &[u8]) {
        self.put_u64(v.len() as u64);
        self.buf.put_slice(v);
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Reports whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the stream, returning the encoded bytes.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// A stream of consumed primitive values.
///
/// Values must be read in exactly the order they were written.
#[derive(Debug)]
pub struct ReadStream {
    buf: Bytes,
}

impl ReadStream {
    /// Creates a stream over the given bytes.
    pub fn new(buf: Bytes) -> ReadStream {
        ReadStream { buf }
    }

    fn check(&self, needed: u64) -> Result<(), WireError> {
        if needed > self.buf.remaining() as u64 {
            return Err(WireError::Truncated {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Consumes a `u32`.
    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        self.check(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// Consumes an `i32`.
    pub fn get_i32(&mut self) -> Result<i32, WireError> {
        self.check(4)?;
        Ok(self.buf.get_i32_le())
    }

    /// Consumes a `u64`.
    pub fn get_u64(&mut self) -> Result<u64, WireError> {
        self.check(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Consumes an `i64`.
    pub fn get_i64(&mut self) -> Result<i64, WireError> {
        self.check(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Consumes an `f32`.
    pub fn get_f32(&mut self) -> Result<f32, WireError> {
        self.check(4)?;
        Ok(self.buf.get_f32_le())
    }

    /// Consumes a length-prefixed UTF-8 string.
    pub fn get_string(&mut self) -> Result<String, WireError> {
        let bytes = self.get_bytes()?;
        let s = std::str::from_utf8(&bytes).map_err(|_| WireError::InvalidUtf8)?;
        Ok(s.to_owned())
    }

    /// Consumes a length-prefixed byte buffer.
    ///
    /// The returned buffer shares the stream's underlying allocation.
    pub fn get_bytes(&mut self) -> Result<Bytes, WireError> {
        let len = self.get_u64()?;
        self.check(len)?;
        // `check` guarantees `len` fits in the remaining usize-sized buffer.
        Ok(self.buf.split_to(len as usize))
    }

    /// The number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Consumes the stream, returning everything unread.
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }
}
