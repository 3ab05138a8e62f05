// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Parameter values.

use bytes::Bytes;

use crate::handle::ObjectHandle;
use crate::vector::{Vec2f, Vec2i, Vec3f, Vec3i, Vec4f};

/// A tagged parameter value, as it travels on the wire.
///
/// Object-valued parameters carry handles here; the receiving rank resolves
/// the handle against its registry when the parameter is stored, so the
/// stored form holds a strong object reference instead.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A 32-bit signed integer.
    Int(i32),
    /// A float.
    Float(f32),
    /// A 2-element float vector.
    Vec2f(Vec2f),
    /// A 3-element float vector.
    Vec3f(Vec3f),
    /// A 4-element float vector.
    Vec4f(Vec4f),
    /// A 2-element integer vector.
    Vec2i(Vec2i),
    /// A 3-element integer vector.
    Vec3i(Vec3i),
    /// A UTF-8 string.
    String(String),
    /// A handle naming a managed object, possibly null.
    Object(ObjectHandle),
    /// An opaque byte buffer.
    Buffer(Bytes),
}

impl ParamValue {
    /// Returns the stable wire code identifying this value's variant.
    pub fn code(&self) -> u32 {
        match self {
            ParamValue::Int(_) => 0,
            ParamValue::Float(_) => 1,
            ParamValue::Vec2f(_) => 2,
            ParamValue::Vec3f(_) => 3,
            ParamValue::Vec4f(_) => 4,
            ParamValue::Vec2i(_) => 5,
            ParamValue::Vec3i(_) => 6,
            ParamValue::String(_) => 7,
            ParamValue::Object(_) => 8,
            ParamValue::Buffer(_) => 9,
        }
    }

    /// A short name for the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Vec2f(_) => "vec2f",
            ParamValue::Vec3f(_) => "vec3f",
            ParamValue::Vec4f(_) => "vec4f",
            ParamValue::Vec2i(_) => "vec2i",
            ParamValue::Vec3i(_) => "vec3i",
            ParamValue::String(_) => "string",
            ParamValue::Object(_) => "object",
            ParamValue::Buffer(_) => "buffer",
        }
    }
}
