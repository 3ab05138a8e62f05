// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Object handles.

use std::fmt;

/// An opaque 64-bit name for a managed object, valid on every rank.
///
/// Handles are minted by the master from a monotonic counter and become
/// *defined* on a rank once the creating command has been delivered and
/// applied there. The zero value is reserved: it names no object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(pub u64);

impl ObjectHandle {
    /// The distinguished null handle.
    pub const NULL: ObjectHandle = ObjectHandle(0);

    /// Reports whether this is the null handle.
    pub fn is_null(self) -> bool {
        self == ObjectHandle::NULL
    }
}

impl From<u64> for ObjectHandle {
    fn from(id: u64) -> ObjectHandle {
        ObjectHandle(id)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}
