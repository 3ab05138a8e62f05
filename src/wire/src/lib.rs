// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Typed serialization streams and the broadcast envelope.
//!
//! The binary format is deliberately simple, because its only consumers are
//! other ranks running the same binary: integers are little-endian
//! two's-complement, floats are IEEE-754 binary32, strings and byte buffers
//! are prefixed with a `u64` count, strings carry no trailing NUL. The one
//! law everything else rests on is that for any value `v`,
//! `read(write(v)) == v`; the property tests in this crate enforce it.
//!
//! Decoding is total. Truncated input, invalid UTF-8, and unknown enum codes
//! surface as [`WireError`]s; nothing in this crate panics on wire data.
//! Cross-version compatibility is a non-goal: a reader that encounters a code
//! it does not understand fails fatally rather than resynchronizing.

#![warn(missing_docs)]

mod codec;
mod envelope;
mod stream;

pub use crate::codec::{Decode, Encode};
pub use crate::envelope::Envelope;
pub use crate::stream::{ReadStream, WireError, WriteStream};
