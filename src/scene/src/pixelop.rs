// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Pixel ops: post-processing stages chained onto a framebuffer.

use std::fmt;

use crate::framebuffer::TileBuffer;

/// A live post-processing stage.
///
/// Instances form a linear chain: each instance owns its predecessor and
/// runs it first, so the framebuffer only holds the chain head.
pub trait PixelOpInstance: fmt::Debug {
    /// The instance's name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Processes one tile in place.
    fn process_tile(&self, tile: &mut TileBuffer);
}

/// The outcome of asking a pixel-op factory for an instance.
///
/// A factory that refuses must hand the previous chain back so the
/// framebuffer's existing chain stays unchanged.
#[derive(Debug)]
pub enum PixelOpBuild {
    /// A new chain head, owning the previous chain if it kept it.
    Built(Box<dyn PixelOpInstance>),
    /// The factory refused; the previous chain is returned untouched.
    Refused(Option<Box<dyn PixelOpInstance>>),
}

/// Produces a pixel-op instance chained over the framebuffer's previous one.
pub type PixelOpFactory = fn(prev: Option<Box<dyn PixelOpInstance>>) -> PixelOpBuild;

/// Kind-specific state for a pixel-op object: the factory its type
/// registered.
#[derive(Debug)]
pub struct PixelOpState {
    factory: PixelOpFactory,
}

impl PixelOpState {
    /// Creates the state around a factory.
    pub fn new(factory: PixelOpFactory) -> PixelOpState {
        PixelOpState { factory }
    }

    /// Asks the factory for an instance chained over `prev`.
    pub fn create_instance(&self, prev: Option<Box<dyn PixelOpInstance>>) -> PixelOpBuild {
        (self.factory)(prev)
    }
}

/// The built-in tone mapper: a simple Reinhard curve on the color channel.
#[derive(Debug)]
struct ToneMapper {
    prev: Option<Box<dyn PixelOpInstance>>,
}

impl PixelOpInstance for ToneMapper {
    fn name(&self) -> &'static str {
        "tone_mapper"
    }

    fn process_tile(&self, tile: &mut TileBuffer) {
        if let Some(prev) = &self.prev {
            prev.process_tile(tile);
        }
        for texel in &mut tile.color {
            texel.x /= 1.0 + texel.x;
            texel.y /= 1.0 + texel.y;
            texel.z /= 1.0 + texel.z;
            texel.w = texel.w.clamp(0.0, 1.0);
        }
    }
}

/// Factory for the built-in tone mapper.
pub(crate) fn tone_mapper_factory(prev: Option<Box<dyn PixelOpInstance>>) -> PixelOpBuild {
    PixelOpBuild::Built(Box::new(ToneMapper { prev }))
}

#[cfg(test)]
mod tests {
    use lux_repr::{Vec2i, Vec4f};

    use super::*;

    #[test]
    fn test_tone_mapper_chains_over_previous() {
        #[derive(Debug)]
        struct Doubler {
            prev: Option<Box<dyn PixelOpInstance>>,
        }

        impl PixelOpInstance for Doubler {
            fn name(&self) -> &'static str {
                "doubler"
            }

            fn process_tile(&self, tile: &mut TileBuffer) {
                assert!(self.prev.is_none());
                for texel in &mut tile.color {
                    texel.x *= 2.0;
                }
            }
        }

        let chain = match tone_mapper_factory(Some(Box::new(Doubler { prev: None }))) {
            PixelOpBuild::Built(chain) => chain,
            PixelOpBuild::Refused(_) => panic!("tone mapper never refuses"),
        };
        let mut tile = TileBuffer::new(Vec2i::new(0, 0), Vec2i::new(1, 1));
        tile.color[0] = Vec4f::new(0.5, 0.0, 0.0, 1.0);
        chain.process_tile(&mut tile);
        // Doubled to 1.0, then tone mapped to 0.5.
        assert_eq!(tile.color[0].x, 0.5);
    }
}
