// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Object kinds.

use std::fmt;

/// The kind of a managed scene object.
///
/// Every managed object carries exactly one kind, fixed at creation. Kinds
/// drive the master's mirroring policy (only renderer and volume parameters
/// are kept master-side) and the handle-to-pointer translation for
/// object-typed data arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    /// A generic managed object; the fallback kind.
    Object,
    /// A data array.
    Data,
    /// A framebuffer.
    FrameBuffer,
    /// A geometry.
    Geometry,
    /// A light.
    Light,
    /// A material.
    Material,
    /// A model: ordered collections of geometries and volumes.
    Model,
    /// A renderer.
    Renderer,
    /// A two-dimensional texture.
    Texture,
    /// A transfer function.
    TransferFunction,
    /// A volume.
    Volume,
    /// A camera.
    Camera,
    /// A pixel op: a post-processing stage chained onto a framebuffer.
    PixelOp,
}

impl ObjectKind {
    /// All object kinds, in code order.
    pub const ALL: [ObjectKind; 13] = [
        ObjectKind::Object,
        ObjectKind::Data,
        ObjectKind::FrameBuffer,
        ObjectKind::Geometry,
        ObjectKind::Light,
        ObjectKind::Material,
        ObjectKind::Model,
        ObjectKind::Renderer,
        ObjectKind::Texture,
        ObjectKind::TransferFunction,
        ObjectKind::Volume,
        ObjectKind::Camera,
        ObjectKind::PixelOp,
    ];

    /// Returns the stable wire code for this kind.
    pub fn code(self) -> u32 {
        match self {
            ObjectKind::Object => 0,
            ObjectKind::Data => 1,
            ObjectKind::FrameBuffer => 2,
            ObjectKind::Geometry => 3,
            ObjectKind::Light => 4,
            ObjectKind::Material => 5,
            ObjectKind::Model => 6,
            ObjectKind::Renderer => 7,
            ObjectKind::Texture => 8,
            ObjectKind::TransferFunction => 9,
            ObjectKind::Volume => 10,
            ObjectKind::Camera => 11,
            ObjectKind::PixelOp => 12,
        }
    }

    /// Returns the kind for a wire code, if the code is known.
    pub fn from_code(code: u32) -> Option<ObjectKind> {
        ObjectKind::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ObjectKind::Object => "object",
            ObjectKind::Data => "data",
            ObjectKind::FrameBuffer => "framebuffer",
            ObjectKind::Geometry => "geometry",
            ObjectKind::Light => "light",
            ObjectKind::Material => "material",
            ObjectKind::Model => "model",
            ObjectKind::Renderer => "renderer",
            ObjectKind::Texture => "texture",
            ObjectKind::TransferFunction => "transfer function",
            ObjectKind::Volume => "volume",
            ObjectKind::Camera => "camera",
            ObjectKind::PixelOp => "pixel op",
        };
        f.write_str(name)
    }
}
