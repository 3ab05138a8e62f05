// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The tiled load-balancer contract.

use std::fmt;

use lux_repr::ChannelMask;
use lux_scene::{FrameBufferOps, RendererState};

/// The master side of a frame: whatever scheduling or gathering policy is
/// installed, observed only through the returned variance scalar.
pub trait TiledLoadBalancer: fmt::Debug {
    /// Completes a frame on the master while the workers render their tiles.
    ///
    /// Returns the frame variance estimate, which must be non-negative.
    fn render_frame(
        &mut self,
        renderer: &RendererState,
        fb: &mut dyn FrameBufferOps,
        channels: ChannelMask,
    ) -> f32;
}

/// The default balancer: tiles arrive through the distributed framebuffer
/// behind [`FrameBufferOps`], so the master only reads the variance estimate
/// off its framebuffer once the frame completes.
#[derive(Debug, Default)]
pub struct LocalGatherBalancer;

impl TiledLoadBalancer for LocalGatherBalancer {
    fn render_frame(
        &mut self,
        _renderer: &RendererState,
        fb: &mut dyn FrameBufferOps,
        _channels: ChannelMask,
    ) -> f32 {
        fb.frame_variance().max(0.0)
    }
}
