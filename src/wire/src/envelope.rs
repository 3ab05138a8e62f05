// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The broadcast envelope.

use bytes::Bytes;

use crate::stream::{ReadStream, WireError, WriteStream};

/// One broadcast message: a command tag and its encoded payload.
///
/// The transport is message-oriented, so the envelope does not length-prefix
/// the payload; the payload runs to the end of the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// The command tag, assigned at registration time in a stable order.
    pub tag: u32,
    /// The command payload, encoded per the command's contract.
    pub payload: Bytes,
}

impl Envelope {
    /// Assembles an envelope from a tag and an encoded payload stream.
    pub fn new(tag: u32, payload: WriteStream) -> Envelope {
        Envelope {
            tag,
            payload: payload.finish(),
        }
    }

    /// Encodes the envelope into a single message buffer.
    pub fn into_message(self) -> Bytes {
        let mut w = WriteStream::new();
        w.put_u32(self.tag);
        let mut buf = w.finish().to_vec();
        buf.extend_from_slice(&self.payload);
        Bytes::from(buf)
    }

    /// Decodes an envelope from a single message buffer.
    pub fn from_message(message: Bytes) -> Result<Envelope, WireError> {
        let mut r = ReadStream::new(message);
        let tag = r.get_u32()?;
        Ok(Envelope {
            tag,
            payload: r.into_remaining(),
        })
    }
}
