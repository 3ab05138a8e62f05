// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Small fixed-size vectors.
//!
//! These are plain parameter carriers, not a linear-algebra library: the
//! rendering kernels that would need one are out of scope for the dispatch
//! core. Components are IEEE-754 binary32 floats or 32-bit signed integers,
//! matching their wire encoding.

/// A 2-element float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2f {
    /// The x component.
    pub x: f32,
    /// The y component.
    pub y: f32,
}

/// A 3-element float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3f {
    /// The x component.
    pub x: f32,
    /// The y component.
    pub y: f32,
    /// The z component.
    pub z: f32,
}

/// A 4-element float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4f {
    /// The x component.
    pub x: f32,
    /// The y component.
    pub y: f32,
    /// The z component.
    pub z: f32,
    /// The w component.
    pub w: f32,
}

/// A 2-element integer vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2i {
    /// The x component.
    pub x: i32,
    /// The y component.
    pub y: i32,
}

/// A 3-element integer vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec3i {
    /// The x component.
    pub x: i32,
    /// The y component.
    pub y: i32,
    /// The z component.
    pub z: i32,
}

impl Vec2f {
    /// Creates a new vector.
    pub const fn new(x: f32, y: f32) -> Vec2f {
        Vec2f { x, y }
    }
}

impl Vec3f {
    /// Creates a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Vec3f {
        Vec3f { x, y, z }
    }

    /// Creates a vector with all components equal to `v`.
    pub const fn splat(v: f32) -> Vec3f {
        Vec3f { x: v, y: v, z: v }
    }
}

impl Vec4f {
    /// Creates a new vector.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Vec4f {
        Vec4f { x, y, z, w }
    }

    /// Extends a [`Vec3f`] with the given `w` component.
    pub const fn from_vec3f(v: Vec3f, w: f32) -> Vec4f {
        Vec4f {
            x: v.x,
            y: v.y,
            z: v.z,
            w,
        }
    }
}

impl Vec2i {
    /// Creates a new vector.
    pub const fn new(x: i32, y: i32) -> Vec2i {
        Vec2i { x, y }
    }

    /// The product of the components, widened to avoid overflow.
    pub fn area(self) -> i64 {
        i64::from(self.x) * i64::from(self.y)
    }
}

impl Vec3i {
    /// Creates a new vector.
    pub const fn new(x: i32, y: i32, z: i32) -> Vec3i {
        Vec3i { x, y, z }
    }

    /// The product of the components, widened to avoid overflow.
    ///
    /// Region extents multiplied by an element size can exceed `i32::MAX`
    /// long before the per-command byte budget rejects them.
    pub fn volume(self) -> i64 {
        i64::from(self.x) * i64::from(self.y) * i64::from(self.z)
    }
}
