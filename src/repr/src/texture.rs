// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Texture formats, filters, and creation flags.

use bitflags::bitflags;

/// The element layout and channel count of a two-dimensional texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    /// Four 8-bit channels.
    Rgba8,
    /// Three 8-bit channels.
    Rgb8,
    /// One 8-bit channel.
    R8,
    /// Four float channels.
    Rgba32F,
    /// Three float channels.
    Rgb32F,
    /// One float channel.
    R32F,
}

impl TextureFormat {
    /// Returns the stable wire code for this format.
    pub fn code(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 0,
            TextureFormat::Rgb8 => 1,
            TextureFormat::R8 => 2,
            TextureFormat::Rgba32F => 3,
            TextureFormat::Rgb32F => 4,
            TextureFormat::R32F => 5,
        }
    }

    /// Returns the format for a wire code, if the code is known.
    pub fn from_code(code: u32) -> Option<TextureFormat> {
        let format = match code {
            0 => TextureFormat::Rgba8,
            1 => TextureFormat::Rgb8,
            2 => TextureFormat::R8,
            3 => TextureFormat::Rgba32F,
            4 => TextureFormat::Rgb32F,
            5 => TextureFormat::R32F,
            _ => return None,
        };
        Some(format)
    }

    /// The number of channels per texel.
    pub fn channels(self) -> usize {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Rgba32F => 4,
            TextureFormat::Rgb8 | TextureFormat::Rgb32F => 3,
            TextureFormat::R8 | TextureFormat::R32F => 1,
        }
    }

    /// The size of one texel, in bytes.
    pub fn texel_size(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgb8 => 3,
            TextureFormat::R8 => 1,
            TextureFormat::Rgba32F => 16,
            TextureFormat::Rgb32F => 12,
            TextureFormat::R32F => 4,
        }
    }
}

/// How a texture is sampled between texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    /// Bilinear interpolation. The default.
    #[default]
    Bilinear,
    /// Nearest-texel lookup.
    Nearest,
}

bitflags! {
    /// Flags modifying texture creation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TextureFlags: u32 {
        /// On the master, reference the application's buffer without copying.
        ///
        /// Workers always back textures with their own copy, regardless.
        const SHARED_BUFFER = 1 << 0;
        /// Sample with [`TextureFilter::Nearest`] instead of the default.
        const FILTER_NEAREST = 1 << 1;
    }
}

impl TextureFlags {
    /// The sampling filter these flags select.
    pub fn filter(self) -> TextureFilter {
        if self.contains(TextureFlags::FILTER_NEAREST) {
            TextureFilter::Nearest
        } else {
            TextureFilter::Bilinear
        }
    }
}
