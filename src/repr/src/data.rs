// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Data-array element types and flags.

use std::fmt;

use bitflags::bitflags;

use crate::object::ObjectKind;

/// The element type of a data array or region update.
///
/// Object kinds are legal element types: such arrays carry object *handles*
/// on the wire and are translated to object references during worker-side
/// deserialization. Strings are representable but disallowed for broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Elements are handles to objects of the given kind.
    Object(ObjectKind),
    /// UTF-8 strings. Disallowed for broadcast.
    String,
    /// 32-bit signed integers.
    Int32,
    /// IEEE-754 binary32 floats.
    Float32,
    /// 2-element integer vectors.
    Vec2i,
    /// 3-element integer vectors.
    Vec3i,
    /// 2-element float vectors.
    Vec2f,
    /// 3-element float vectors.
    Vec3f,
    /// 4-element float vectors.
    Vec4f,
}

impl ElementKind {
    /// Returns the stable wire code for this element kind.
    ///
    /// Object kinds reuse their [`ObjectKind::code`] values; the scalar and
    /// vector kinds live in a disjoint range above them.
    pub fn code(self) -> u32 {
        match self {
            ElementKind::Object(kind) => kind.code(),
            ElementKind::String => 100,
            ElementKind::Int32 => 200,
            ElementKind::Float32 => 201,
            ElementKind::Vec2i => 210,
            ElementKind::Vec3i => 211,
            ElementKind::Vec2f => 220,
            ElementKind::Vec3f => 221,
            ElementKind::Vec4f => 222,
        }
    }

    /// Returns the element kind for a wire code, if the code is known.
    pub fn from_code(code: u32) -> Option<ElementKind> {
        if let Some(kind) = ObjectKind::from_code(code) {
            return Some(ElementKind::Object(kind));
        }
        let kind = match code {
            100 => ElementKind::String,
            200 => ElementKind::Int32,
            201 => ElementKind::Float32,
            210 => ElementKind::Vec2i,
            211 => ElementKind::Vec3i,
            220 => ElementKind::Vec2f,
            221 => ElementKind::Vec3f,
            222 => ElementKind::Vec4f,
            _ => return None,
        };
        Some(kind)
    }

    /// If this is an object element kind, returns the object kind.
    pub fn object_kind(self) -> Option<ObjectKind> {
        match self {
            ElementKind::Object(kind) => Some(kind),
            _ => None,
        }
    }

    /// The wire size of one element, in bytes.
    ///
    /// Object elements travel as 64-bit handles. Strings have no fixed size;
    /// they are disallowed for broadcast and report `None`.
    pub fn size_of(self) -> Option<usize> {
        let size = match self {
            ElementKind::Object(_) => 8,
            ElementKind::String => return None,
            ElementKind::Int32 | ElementKind::Float32 => 4,
            ElementKind::Vec2i | ElementKind::Vec2f => 8,
            ElementKind::Vec3i | ElementKind::Vec3f => 12,
            ElementKind::Vec4f => 16,
        };
        Some(size)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementKind::Object(kind) => write!(f, "{kind}"),
            ElementKind::String => f.write_str("string"),
            ElementKind::Int32 => f.write_str("int32"),
            ElementKind::Float32 => f.write_str("float32"),
            ElementKind::Vec2i => f.write_str("vec2i"),
            ElementKind::Vec3i => f.write_str("vec3i"),
            ElementKind::Vec2f => f.write_str("vec2f"),
            ElementKind::Vec3f => f.write_str("vec3f"),
            ElementKind::Vec4f => f.write_str("vec4f"),
        }
    }
}

bitflags! {
    /// Flags modifying data-array creation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DataFlags: u32 {
        /// On the master, reference the application's buffer without copying.
        ///
        /// Workers ignore this flag: deserialized arrays always own their
        /// contents.
        const SHARED_BUFFER = 1 << 0;
    }
}
