// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Framebuffer formats, channels, and pixel filters.

use bitflags::bitflags;

/// The pixel format of a framebuffer's color channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameBufferFormat {
    /// 8 bits per channel, linear RGBA.
    Rgba8,
    /// 8 bits per channel, sRGB-encoded color with linear alpha.
    Srgba8,
    /// 32-bit float per channel RGBA.
    Rgba32F,
}

impl FrameBufferFormat {
    /// Returns the stable wire code for this format.
    pub fn code(self) -> u32 {
        match self {
            FrameBufferFormat::Rgba8 => 0,
            FrameBufferFormat::Srgba8 => 1,
            FrameBufferFormat::Rgba32F => 2,
        }
    }

    /// Returns the format for a wire code, if the code is known.
    pub fn from_code(code: u32) -> Option<FrameBufferFormat> {
        let format = match code {
            0 => FrameBufferFormat::Rgba8,
            1 => FrameBufferFormat::Srgba8,
            2 => FrameBufferFormat::Rgba32F,
            _ => return None,
        };
        Some(format)
    }
}

bitflags! {
    /// The set of channels a framebuffer carries, and the subset of channels
    /// an operation applies to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChannelMask: u32 {
        /// The color channel.
        const COLOR = 1 << 0;
        /// The depth channel.
        const DEPTH = 1 << 1;
        /// The accumulation channel, for progressive refinement.
        const ACCUM = 1 << 2;
        /// The per-pixel variance channel, for adaptive termination.
        const VARIANCE = 1 << 3;
    }
}

/// The reconstruction filter applied when samples are splatted to pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFilterKind {
    /// A unit-width box filter.
    Box,
    /// A point (Dirac) filter: each sample lands in exactly one pixel.
    Point,
    /// A truncated Gaussian. The default.
    #[default]
    Gauss,
    /// The Blackman-Harris window.
    BlackmanHarris,
    /// The Mitchell-Netravali filter.
    Mitchell,
}

impl PixelFilterKind {
    /// Returns the stable wire code for this filter kind.
    pub fn code(self) -> u32 {
        match self {
            PixelFilterKind::Box => 0,
            PixelFilterKind::Point => 1,
            PixelFilterKind::Gauss => 2,
            PixelFilterKind::BlackmanHarris => 3,
            PixelFilterKind::Mitchell => 4,
        }
    }

    /// Returns the filter kind for a wire code, if the code is known.
    pub fn from_code(code: u32) -> Option<PixelFilterKind> {
        let kind = match code {
            0 => PixelFilterKind::Box,
            1 => PixelFilterKind::Point,
            2 => PixelFilterKind::Gauss,
            3 => PixelFilterKind::BlackmanHarris,
            4 => PixelFilterKind::Mitchell,
            _ => return None,
        };
        Some(kind)
    }
}
