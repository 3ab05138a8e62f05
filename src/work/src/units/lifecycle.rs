// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Lifecycle units: commit, release, module loading, rendering, finalize.

use lux_repr::{ChannelMask, ObjectHandle, ObjectKind};
use lux_scene::{Payload, SceneError};
use lux_wire::{Decode, Encode, ReadStream, WireError, WriteStream};
use tracing::info;

use crate::context::{MasterCx, WorkerCx};
use crate::error::WorkError;
use crate::registry::tags;
use crate::units::{Step, Work, WorkDecode};

/// Commits the target object, bracketed by a master/worker barrier.
///
/// Workers commit any object and finalize models afterwards; the master
/// commits only renderer mirrors. Both sides wait at the cross barrier so no
/// later unit observes a half-applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitObject {
    /// The object to commit.
    pub handle: ObjectHandle,
}

impl CommitObject {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle) -> CommitObject {
        CommitObject { handle }
    }
}

impl Work for CommitObject {
    fn tag(&self) -> u32 {
        tags::COMMIT_OBJECT
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let object = cx.scene.objects.expect(self.handle)?.clone();
        object.commit()?;
        if object.kind() == ObjectKind::Model {
            if let Payload::Model(state) = &mut object.core_mut().payload {
                state.finalize();
            }
        }
        cx.app.barrier();
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        if let Some(object) = cx.scene.objects.lookup(self.handle).cloned() {
            if object.kind() == ObjectKind::Renderer {
                object.commit()?;
            }
        }
        cx.workers.barrier();
        Ok(())
    }
}

impl WorkDecode for CommitObject {
    const TAG: u32 = tags::COMMIT_OBJECT;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(CommitObject {
            handle: ObjectHandle::decode(r)?,
        })
    }
}

/// Releases the registry's reference to the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRelease {
    /// The handle to release.
    pub handle: ObjectHandle,
}

impl CommandRelease {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle) -> CommandRelease {
        CommandRelease { handle }
    }
}

impl Work for CommandRelease {
    fn tag(&self) -> u32 {
        tags::COMMAND_RELEASE
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        cx.scene.objects.free(self.handle)?;
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        // Handles for objects the master never mirrors are not defined here.
        cx.scene.objects.free_if_defined(self.handle);
        Ok(())
    }
}

impl WorkDecode for CommandRelease {
    const TAG: u32 = tags::COMMAND_RELEASE;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(CommandRelease {
            handle: ObjectHandle::decode(r)?,
        })
    }
}

/// Loads a named module on every rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadModule {
    /// The module name.
    pub name: String,
}

impl LoadModule {
    /// Creates the unit.
    pub fn new(name: impl Into<String>) -> LoadModule {
        LoadModule { name: name.into() }
    }
}

impl Work for LoadModule {
    fn tag(&self) -> u32 {
        tags::LOAD_MODULE
    }

    fn encode(&self, w: &mut WriteStream) {
        w.put_string(&self.name);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        cx.scene.load_module(&self.name)?;
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        cx.scene.load_module(&self.name)?;
        Ok(())
    }
}

impl WorkDecode for LoadModule {
    const TAG: u32 = tags::LOAD_MODULE;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(LoadModule {
            name: r.get_string()?,
        })
    }
}

/// Clears framebuffer channels on every rank, the master included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearFrameBuffer {
    /// The target framebuffer.
    pub handle: ObjectHandle,
    /// The channels to clear.
    pub channels: ChannelMask,
}

impl ClearFrameBuffer {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle, channels: ChannelMask) -> ClearFrameBuffer {
        ClearFrameBuffer { handle, channels }
    }

    fn clear(&self, scene: &mut lux_scene::SceneState) -> Result<(), WorkError> {
        use lux_scene::FrameBufferOps;

        let fb = scene
            .objects
            .expect_kind(self.handle, ObjectKind::FrameBuffer)?
            .clone();
        let result = match &mut fb.core_mut().payload {
            Payload::FrameBuffer(state) => {
                state.clear(self.channels);
                Ok(())
            }
            _ => Err(SceneError::WrongKind {
                handle: self.handle,
                expected: ObjectKind::FrameBuffer,
                found: fb.kind(),
            }
            .into()),
        };
        result
    }
}

impl Work for ClearFrameBuffer {
    fn tag(&self) -> u32 {
        tags::CLEAR_FRAMEBUFFER
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        self.channels.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        self.clear(cx.scene)?;
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        self.clear(cx.scene)
    }
}

impl WorkDecode for ClearFrameBuffer {
    const TAG: u32 = tags::CLEAR_FRAMEBUFFER;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(ClearFrameBuffer {
            handle: ObjectHandle::decode(r)?,
            channels: ChannelMask::decode(r)?,
        })
    }
}

/// Renders a frame.
///
/// Workers invoke the renderer over their share of the tiles; the master
/// delegates to the installed tiled load balancer. Either way the observed
/// result is the variance scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// The target framebuffer.
    pub framebuffer: ObjectHandle,
    /// The renderer to run.
    pub renderer: ObjectHandle,
    /// The channels to write.
    pub channels: ChannelMask,
    /// The variance produced by the last run; not part of the wire payload.
    pub variance: f32,
}

impl RenderFrame {
    /// Creates the unit.
    pub fn new(framebuffer: ObjectHandle, renderer: ObjectHandle, channels: ChannelMask) -> RenderFrame {
        RenderFrame {
            framebuffer,
            renderer,
            channels,
            variance: 0.0,
        }
    }
}

impl Work for RenderFrame {
    fn tag(&self) -> u32 {
        tags::RENDER_FRAME
    }

    fn encode(&self, w: &mut WriteStream) {
        self.framebuffer.encode(w);
        self.renderer.encode(w);
        self.channels.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let renderer = cx
            .scene
            .objects
            .expect_kind(self.renderer, ObjectKind::Renderer)?
            .clone();
        let fb = cx
            .scene
            .objects
            .expect_kind(self.framebuffer, ObjectKind::FrameBuffer)?
            .clone();

        let renderer_core = renderer.core();
        let Payload::Renderer(renderer_state) = &renderer_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.renderer,
                expected: ObjectKind::Renderer,
                found: renderer.kind(),
            }
            .into());
        };
        let mut fb_core = fb.core_mut();
        let Payload::FrameBuffer(fb_state) = &mut fb_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.framebuffer,
                expected: ObjectKind::FrameBuffer,
                found: fb.kind(),
            }
            .into());
        };

        self.variance = renderer_state.render_frame(fb_state, self.channels, cx.rank, cx.size);
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        let renderer = cx
            .scene
            .objects
            .expect_kind(self.renderer, ObjectKind::Renderer)?
            .clone();
        let fb = cx
            .scene
            .objects
            .expect_kind(self.framebuffer, ObjectKind::FrameBuffer)?
            .clone();

        let renderer_core = renderer.core();
        let Payload::Renderer(renderer_state) = &renderer_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.renderer,
                expected: ObjectKind::Renderer,
                found: renderer.kind(),
            }
            .into());
        };
        let mut fb_core = fb.core_mut();
        let Payload::FrameBuffer(fb_state) = &mut fb_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.framebuffer,
                expected: ObjectKind::FrameBuffer,
                found: fb.kind(),
            }
            .into());
        };

        self.variance = cx
            .balancer
            .render_frame(renderer_state, fb_state, self.channels);
        Ok(())
    }
}

impl WorkDecode for RenderFrame {
    const TAG: u32 = tags::RENDER_FRAME;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(RenderFrame {
            framebuffer: ObjectHandle::decode(r)?,
            renderer: ObjectHandle::decode(r)?,
            channels: ChannelMask::decode(r)?,
            variance: 0.0,
        })
    }
}

/// Tears down the cluster: a world barrier, transport finalize, and the end
/// of dispatch.
///
/// The worker serve loop returns after this unit rather than exiting the
/// process, so embedders control process teardown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandFinalize;

impl CommandFinalize {
    /// Creates the unit.
    pub fn new() -> CommandFinalize {
        CommandFinalize
    }
}

impl Work for CommandFinalize {
    fn tag(&self) -> u32 {
        tags::COMMAND_FINALIZE
    }

    fn encode(&self, _w: &mut WriteStream) {}

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        cx.world.barrier();
        cx.world.finalize();
        cx.app.finalize();
        info!("rank finalized");
        Ok(Step::Shutdown)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        cx.world.barrier();
        cx.world.finalize();
        cx.workers.finalize();
        info!("master finalized");
        Ok(())
    }
}

impl WorkDecode for CommandFinalize {
    const TAG: u32 = tags::COMMAND_FINALIZE;

    fn decode(_r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(CommandFinalize)
    }
}
