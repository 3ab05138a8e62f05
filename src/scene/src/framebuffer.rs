// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Framebuffers and tiles.

use std::fmt;

use lux_repr::{ChannelMask, FrameBufferFormat, Vec2i, Vec4f};

use crate::error::SceneError;
use crate::pixelop::PixelOpInstance;

/// The edge length of a screen-space tile, in pixels.
pub const TILE_SIZE: usize = 64;

/// One tile's worth of rendered samples, in linear RGBA.
#[derive(Debug)]
pub struct TileBuffer {
    /// The tile's top-left pixel in framebuffer coordinates.
    pub origin: Vec2i,
    /// The tile's dimensions; edge tiles are clipped to the framebuffer.
    pub size: Vec2i,
    /// Row-major samples, `size.x * size.y` of them.
    pub color: Vec<Vec4f>,
}

impl TileBuffer {
    /// Creates a zeroed tile.
    pub fn new(origin: Vec2i, size: Vec2i) -> TileBuffer {
        TileBuffer {
            origin,
            size,
            color: vec![Vec4f::default(); (size.x * size.y) as usize],
        }
    }
}

/// The contract the render-frame path holds a framebuffer to.
///
/// A distributed framebuffer implementation gathers tiles arriving from
/// other ranks behind this same interface; the local implementation below
/// simply merges tiles rendered in-process. Either way, the dispatch core
/// observes only `frame_variance` out of a frame.
pub trait FrameBufferOps: fmt::Debug {
    /// The framebuffer's dimensions.
    fn size(&self) -> Vec2i;

    /// The channels this framebuffer carries.
    fn channels(&self) -> ChannelMask;

    /// Resets the given channels.
    fn clear(&mut self, channels: ChannelMask);

    /// Opens a new frame writing the given channels.
    fn begin_frame(&mut self, channels: ChannelMask);

    /// Merges one rendered tile into the given channels, running the
    /// pixel-op chain over it first.
    fn apply_tile(&mut self, tile: &mut TileBuffer, channels: ChannelMask);

    /// The frame-level variance estimate; non-negative.
    fn frame_variance(&self) -> f32;
}

/// The in-process framebuffer.
#[derive(Debug)]
pub struct FrameBufferState {
    size: Vec2i,
    format: FrameBufferFormat,
    channels: ChannelMask,
    color: Vec<Vec4f>,
    depth: Vec<f32>,
    accum: Vec<Vec4f>,
    variance: Vec<f32>,
    frames: u32,
    pixel_op: Option<Box<dyn PixelOpInstance>>,
}

impl FrameBufferState {
    /// Creates a framebuffer. Dimensions must be strictly positive.
    pub fn new(
        size: Vec2i,
        format: FrameBufferFormat,
        channels: ChannelMask,
    ) -> Result<FrameBufferState, SceneError> {
        if size.x <= 0 || size.y <= 0 {
            return Err(SceneError::InvalidDimensions(size));
        }
        let pixels = (size.x * size.y) as usize;
        Ok(FrameBufferState {
            size,
            format,
            channels,
            color: vec![Vec4f::default(); pixels],
            depth: if channels.contains(ChannelMask::DEPTH) {
                vec![0.0; pixels]
            } else {
                Vec::new()
            },
            accum: if channels.contains(ChannelMask::ACCUM) {
                vec![Vec4f::default(); pixels]
            } else {
                Vec::new()
            },
            variance: if channels.contains(ChannelMask::VARIANCE) {
                vec![0.0; pixels]
            } else {
                Vec::new()
            },
            frames: 0,
            pixel_op: None,
        })
    }

    /// The color format.
    pub fn format(&self) -> FrameBufferFormat {
        self.format
    }

    /// The color plane.
    pub fn color(&self) -> &[Vec4f] {
        &self.color
    }

    /// The number of frames accumulated since the last clear.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Installs a pixel-op chain head, returning the previous one.
    pub fn replace_pixel_op(
        &mut self,
        op: Option<Box<dyn PixelOpInstance>>,
    ) -> Option<Box<dyn PixelOpInstance>> {
        std::mem::replace(&mut self.pixel_op, op)
    }

    /// Reports whether a pixel-op chain is installed.
    pub fn has_pixel_op(&self) -> bool {
        self.pixel_op.is_some()
    }

    /// The origins of all tiles covering the framebuffer, row-major.
    pub fn tile_origins(&self) -> Vec<Vec2i> {
        let mut origins = Vec::new();
        let mut y = 0;
        while y < self.size.y {
            let mut x = 0;
            while x < self.size.x {
                origins.push(Vec2i::new(x, y));
                x += TILE_SIZE as i32;
            }
            y += TILE_SIZE as i32;
        }
        origins
    }

    /// The dimensions of the tile at `origin`, clipped to the framebuffer.
    pub fn tile_size(&self, origin: Vec2i) -> Vec2i {
        Vec2i::new(
            (self.size.x - origin.x).min(TILE_SIZE as i32),
            (self.size.y - origin.y).min(TILE_SIZE as i32),
        )
    }

    fn luminance(c: Vec4f) -> f32 {
        0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
    }
}

impl FrameBufferOps for FrameBufferState {
    fn size(&self) -> Vec2i {
        self.size
    }

    fn channels(&self) -> ChannelMask {
        self.channels
    }

    fn clear(&mut self, channels: ChannelMask) {
        let channels = channels & self.channels;
        if channels.contains(ChannelMask::COLOR) {
            self.color.fill(Vec4f::default());
        }
        if channels.contains(ChannelMask::DEPTH) {
            self.depth.fill(0.0);
        }
        if channels.contains(ChannelMask::ACCUM) {
            self.accum.fill(Vec4f::default());
            self.frames = 0;
        }
        if channels.contains(ChannelMask::VARIANCE) {
            self.variance.fill(0.0);
        }
    }

    fn begin_frame(&mut self, channels: ChannelMask) {
        if (channels & self.channels).contains(ChannelMask::ACCUM) {
            self.frames = self.frames.saturating_add(1);
        }
    }

    fn apply_tile(&mut self, tile: &mut TileBuffer, channels: ChannelMask) {
        if let Some(op) = &self.pixel_op {
            op.process_tile(tile);
        }
        let channels = channels & self.channels;
        let accumulating = channels.contains(ChannelMask::ACCUM) && self.frames > 0;
        for ty in 0..tile.size.y {
            for tx in 0..tile.size.x {
                let px = tile.origin.x + tx;
                let py = tile.origin.y + ty;
                if px >= self.size.x || py >= self.size.y {
                    continue;
                }
                let sample = tile.color[(ty * tile.size.x + tx) as usize];
                let index = (py * self.size.x + px) as usize;
                if accumulating {
                    let acc = &mut self.accum[index];
                    acc.x += sample.x;
                    acc.y += sample.y;
                    acc.z += sample.z;
                    acc.w += sample.w;
                    let inv = 1.0 / self.frames as f32;
                    let mean = Vec4f::new(acc.x * inv, acc.y * inv, acc.z * inv, acc.w * inv);
                    if self.channels.contains(ChannelMask::VARIANCE) {
                        let delta = Self::luminance(sample) - Self::luminance(mean);
                        self.variance[index] = delta * delta;
                    }
                    if channels.contains(ChannelMask::COLOR) {
                        self.color[index] = mean;
                    }
                } else if channels.contains(ChannelMask::COLOR) {
                    self.color[index] = sample;
                }
            }
        }
    }

    fn frame_variance(&self) -> f32 {
        if self.variance.is_empty() || self.frames == 0 {
            return 0.0;
        }
        let sum: f32 = self.variance.iter().sum();
        (sum / self.variance.len() as f32).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fb(channels: ChannelMask) -> FrameBufferState {
        FrameBufferState::new(Vec2i::new(4, 4), FrameBufferFormat::Rgba8, channels).unwrap()
    }

    fn solid_tile(fb: &FrameBufferState, value: f32) -> TileBuffer {
        let origin = Vec2i::new(0, 0);
        let mut tile = TileBuffer::new(origin, fb.tile_size(origin));
        tile.color.fill(Vec4f::new(value, value, value, 1.0));
        tile
    }

    #[test]
    fn test_dimensions_must_be_positive() {
        let err =
            FrameBufferState::new(Vec2i::new(4, 0), FrameBufferFormat::Rgba8, ChannelMask::COLOR)
                .unwrap_err();
        assert_eq!(err, SceneError::InvalidDimensions(Vec2i::new(4, 0)));
    }

    #[test]
    fn test_tiling_covers_the_framebuffer() {
        let fb = FrameBufferState::new(
            Vec2i::new(100, 65),
            FrameBufferFormat::Rgba32F,
            ChannelMask::COLOR,
        )
        .unwrap();
        let origins = fb.tile_origins();
        assert_eq!(origins.len(), 4);
        assert_eq!(fb.tile_size(Vec2i::new(64, 64)), Vec2i::new(36, 1));
    }

    #[test]
    fn test_clear_resets_accumulation() {
        let channels = ChannelMask::COLOR | ChannelMask::ACCUM;
        let mut fb = fb(channels);
        fb.begin_frame(channels);
        let mut tile = solid_tile(&fb, 1.0);
        fb.apply_tile(&mut tile, channels);
        assert_eq!(fb.frames(), 1);
        assert_eq!(fb.color()[0].x, 1.0);

        fb.clear(channels);
        assert_eq!(fb.frames(), 0);
        assert_eq!(fb.color()[0].x, 0.0);
    }

    #[test]
    fn test_accumulation_converges_and_variance_shrinks() {
        let channels = ChannelMask::COLOR | ChannelMask::ACCUM | ChannelMask::VARIANCE;
        let mut fb = fb(channels);

        fb.begin_frame(channels);
        let mut tile = solid_tile(&fb, 1.0);
        fb.apply_tile(&mut tile, channels);
        let v1 = fb.frame_variance();

        fb.begin_frame(channels);
        let mut tile = solid_tile(&fb, 1.0);
        fb.apply_tile(&mut tile, channels);
        let v2 = fb.frame_variance();

        // Identical frames: the mean converges on the sample, so variance
        // cannot grow.
        assert!(v1 >= 0.0);
        assert!(v2 <= v1);
        assert_eq!(fb.color()[0].x, 1.0);
    }

    #[test]
    fn test_variance_is_zero_without_the_channel() {
        let mut fb = fb(ChannelMask::COLOR);
        fb.begin_frame(ChannelMask::COLOR);
        let mut tile = solid_tile(&fb, 0.5);
        fb.apply_tile(&mut tile, ChannelMask::COLOR);
        assert_eq!(fb.frame_variance(), 0.0);
    }
}
