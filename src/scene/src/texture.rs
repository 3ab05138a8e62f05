// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Two-dimensional textures.

use bytes::Bytes;
use lux_ore::cast::CastFrom;
use lux_repr::{TextureFilter, TextureFormat, Vec2i};

use crate::error::SceneError;

/// Kind-specific state for a texture: dimensions, format, filter, and the
/// texel payload.
///
/// Workers always back a texture with their own copy of the payload; the
/// shared-buffer optimization applies only to the master-side command
/// construction and never survives broadcast.
#[derive(Debug)]
pub struct Texture2d {
    size: Vec2i,
    format: TextureFormat,
    filter: TextureFilter,
    texels: Bytes,
}

impl Texture2d {
    /// Creates a texture, validating the payload against the dimensions and
    /// format.
    pub fn new(
        size: Vec2i,
        format: TextureFormat,
        filter: TextureFilter,
        texels: Bytes,
    ) -> Result<Texture2d, SceneError> {
        if size.x <= 0 || size.y <= 0 {
            return Err(SceneError::InvalidDimensions(size));
        }
        let expected = usize::cast_from(u64::try_from(size.area()).expect("positive area"))
            * format.texel_size();
        if texels.len() != expected {
            return Err(SceneError::TexelCountMismatch {
                expected,
                got: texels.len(),
            });
        }
        Ok(Texture2d {
            size,
            format,
            filter,
            texels,
        })
    }

    /// The texture's dimensions.
    pub fn size(&self) -> Vec2i {
        self.size
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The sampling filter.
    pub fn filter(&self) -> TextureFilter {
        self.filter
    }

    /// The texel payload.
    pub fn texels(&self) -> &Bytes {
        &self.texels
    }
}
