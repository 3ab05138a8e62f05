// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for guaranteed-lossless casts between numeric types.
//!
//! `as` casts silently truncate; `TryFrom` forces callers to handle an error
//! that cannot occur on the platforms Lux supports. `CastFrom` documents at
//! the call site that a conversion is lossless by construction.

/// A trait for safe, simple, and infallible casts.
///
/// `CastFrom` is like [`std::convert::From`], but it is implemented for some
/// platform-specific casts that are known to be lossless on the platforms Lux
/// supports (64-bit pointer widths).
pub trait CastFrom<T> {
    /// Performs the cast.
    fn cast_from(from: T) -> Self;
}

macro_rules! cast_from {
    ($from:ty, $to:ty) => {
        impl CastFrom<$from> for $to {
            #[allow(clippy::as_conversions)]
            fn cast_from(from: $from) -> $to {
                from as $to
            }
        }
    };
}

cast_from!(u8, usize);
cast_from!(u16, usize);
cast_from!(u32, usize);
cast_from!(u8, u64);
cast_from!(u16, u64);
cast_from!(u32, u64);
cast_from!(i32, i64);

#[cfg(target_pointer_width = "64")]
cast_from!(usize, u64);
#[cfg(target_pointer_width = "64")]
cast_from!(u64, usize);
