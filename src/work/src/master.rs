// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The master-side dispatcher façade.

use bytes::Bytes;
use lux_comm::RankGroups;
use lux_ore::id_gen::Gen;
use lux_repr::{
    ChannelMask, DataFlags, ElementKind, FrameBufferFormat, ObjectHandle, ParamValue,
    TextureFlags, TextureFormat, Vec2f, Vec2i, Vec3i,
};
use lux_scene::{DynamicLoader, ModuleLoader, Payload, PickResult, SceneState};
use lux_wire::{Envelope, WriteStream};
use tracing::debug;

use crate::balancer::{LocalGatherBalancer, TiledLoadBalancer};
use crate::context::MasterCx;
use crate::error::WorkError;
use crate::units::{
    AddGeometry, AddVolume, ClearFrameBuffer, CommandFinalize, CommandRelease, CommitObject,
    CreateFrameBuffer, LoadModule, NewCamera, NewData, NewGeometry, NewLight, NewMaterial,
    NewModel, NewPixelOp, NewRenderer, NewTexture2d, NewTransferFunction, NewVolume,
    RemoveGeometry, RemoveParam, RemoveVolume, RenderFrame, SetMaterial, SetParam, SetPixelOp,
    SetRegion, Work,
};

/// Configuration for a master device.
#[derive(Debug)]
pub struct DeviceConfig {
    /// Modules to load on every rank at startup.
    pub modules: Vec<String>,
    /// The module loader for the master's own rank.
    pub loader: Box<dyn ModuleLoader>,
    /// The tiled load balancer driving the master side of each frame.
    pub balancer: Box<dyn TiledLoadBalancer>,
}

impl Default for DeviceConfig {
    fn default() -> DeviceConfig {
        DeviceConfig {
            modules: Vec::new(),
            loader: Box::new(DynamicLoader),
            balancer: Box::new(LocalGatherBalancer),
        }
    }
}

/// The master-side façade over the command stream.
///
/// Every method mints any required handle, broadcasts the corresponding work
/// unit to the worker group, and then runs the unit's master body. The
/// broadcast happens first: barrier-bracketed units rendezvous with workers,
/// which must be able to receive the command before the master blocks.
#[derive(Debug)]
pub struct MasterDevice {
    scene: SceneState,
    groups: RankGroups,
    handles: Gen<ObjectHandle>,
    balancer: Box<dyn TiledLoadBalancer>,
}

impl MasterDevice {
    /// Creates the device and preloads the configured modules on all ranks.
    pub fn new(groups: RankGroups, config: DeviceConfig) -> Result<MasterDevice, WorkError> {
        let mut device = MasterDevice {
            scene: SceneState::new(config.loader),
            groups,
            // Handle 0 stays the null handle on every rank.
            handles: Gen::starting_at(1),
            balancer: config.balancer,
        };
        for module in &config.modules {
            device.load_module(module)?;
        }
        Ok(device)
    }

    /// The master's mirror of the scene, for inspection.
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    fn submit(&mut self, unit: &mut dyn Work) -> Result<(), WorkError> {
        let mut w = WriteStream::new();
        unit.encode(&mut w);
        debug!(tag = unit.tag(), "broadcasting work unit");
        self.groups.worker.broadcast(Envelope::new(unit.tag(), w))?;
        let mut cx = MasterCx {
            scene: &mut self.scene,
            world: &self.groups.world,
            workers: &self.groups.worker,
            balancer: &mut *self.balancer,
        };
        unit.run_on_master(&mut cx)
    }

    fn mint(&mut self) -> ObjectHandle {
        self.handles.allocate_id()
    }

    /// Creates a renderer of the named type.
    pub fn new_renderer(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewRenderer::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a camera of the named type.
    pub fn new_camera(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewCamera::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a geometry of the named type.
    pub fn new_geometry(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewGeometry::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a volume of the named type.
    pub fn new_volume(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewVolume::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a transfer function of the named type.
    pub fn new_transfer_function(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewTransferFunction::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a pixel op of the named type.
    pub fn new_pixel_op(&mut self, type_name: &str) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewPixelOp::new(handle, type_name))?;
        Ok(handle)
    }

    /// Creates a material, trying the renderer's factory first.
    ///
    /// Pass [`ObjectHandle::NULL`] to use the global factory directly.
    pub fn new_material(
        &mut self,
        renderer: ObjectHandle,
        type_name: &str,
    ) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewMaterial::new(handle, renderer, type_name))?;
        Ok(handle)
    }

    /// Creates a light, trying the renderer's factory first.
    pub fn new_light(
        &mut self,
        renderer: ObjectHandle,
        type_name: &str,
    ) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewLight::new(handle, renderer, type_name))?;
        Ok(handle)
    }

    /// Creates an empty model.
    pub fn new_model(&mut self) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewModel::new(handle))?;
        Ok(handle)
    }

    /// Allocates a data array of `count` elements of `kind`.
    pub fn new_data(
        &mut self,
        count: u64,
        kind: ElementKind,
        payload: Bytes,
        flags: DataFlags,
    ) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewData::new(handle, count, kind, payload, flags)?)?;
        Ok(handle)
    }

    /// Allocates a texture.
    pub fn new_texture2d(
        &mut self,
        size: Vec2i,
        format: TextureFormat,
        payload: Bytes,
        flags: TextureFlags,
    ) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut NewTexture2d::new(handle, size, format, payload, flags))?;
        Ok(handle)
    }

    /// Constructs a distributed framebuffer.
    pub fn create_framebuffer(
        &mut self,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: ChannelMask,
    ) -> Result<ObjectHandle, WorkError> {
        let handle = self.mint();
        self.submit(&mut CreateFrameBuffer::new(handle, size, format, channels))?;
        Ok(handle)
    }

    /// Sets a named parameter on the target object.
    pub fn set_param(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        value: ParamValue,
    ) -> Result<(), WorkError> {
        self.submit(&mut SetParam::new(handle, name, value))
    }

    /// Removes a named parameter from the target object.
    pub fn remove_param(&mut self, handle: ObjectHandle, name: &str) -> Result<(), WorkError> {
        self.submit(&mut RemoveParam::new(handle, name))
    }

    /// Binds a material to a geometry.
    pub fn set_material(
        &mut self,
        geometry: ObjectHandle,
        material: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut SetMaterial::new(geometry, material))
    }

    /// Replaces a framebuffer's pixel-op chain head.
    pub fn set_pixel_op(
        &mut self,
        framebuffer: ObjectHandle,
        pixel_op: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut SetPixelOp::new(framebuffer, pixel_op))
    }

    /// Appends a geometry to a model.
    pub fn add_geometry(
        &mut self,
        model: ObjectHandle,
        geometry: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut AddGeometry::new(model, geometry))
    }

    /// Appends a volume to a model.
    pub fn add_volume(
        &mut self,
        model: ObjectHandle,
        volume: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut AddVolume::new(model, volume))
    }

    /// Removes a geometry from a model; no-op if absent.
    pub fn remove_geometry(
        &mut self,
        model: ObjectHandle,
        geometry: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut RemoveGeometry::new(model, geometry))
    }

    /// Removes a volume from a model; no-op if absent.
    pub fn remove_volume(
        &mut self,
        model: ObjectHandle,
        volume: ObjectHandle,
    ) -> Result<(), WorkError> {
        self.submit(&mut RemoveVolume::new(model, volume))
    }

    /// Copies a sub-volume update into the target volume.
    ///
    /// Updates beyond the per-command byte budget fail here, before any
    /// broadcast, leaving worker state untouched.
    pub fn set_region(
        &mut self,
        volume: ObjectHandle,
        start: Vec3i,
        extent: Vec3i,
        kind: ElementKind,
        payload: Bytes,
    ) -> Result<(), WorkError> {
        self.submit(&mut SetRegion::new(volume, start, extent, kind, payload)?)
    }

    /// Commits the target object on every rank, bracketed by a barrier.
    pub fn commit(&mut self, handle: ObjectHandle) -> Result<(), WorkError> {
        self.submit(&mut CommitObject::new(handle))
    }

    /// Releases the registry reference to the handle on every rank.
    pub fn release(&mut self, handle: ObjectHandle) -> Result<(), WorkError> {
        self.submit(&mut CommandRelease::new(handle))
    }

    /// Loads a named module on every rank.
    pub fn load_module(&mut self, name: &str) -> Result<(), WorkError> {
        self.submit(&mut LoadModule::new(name))
    }

    /// Clears framebuffer channels on every rank.
    pub fn clear_framebuffer(
        &mut self,
        handle: ObjectHandle,
        channels: ChannelMask,
    ) -> Result<(), WorkError> {
        self.submit(&mut ClearFrameBuffer::new(handle, channels))
    }

    /// Renders a frame, returning the variance estimate.
    pub fn render_frame(
        &mut self,
        framebuffer: ObjectHandle,
        renderer: ObjectHandle,
        channels: ChannelMask,
    ) -> Result<f32, WorkError> {
        let mut unit = RenderFrame::new(framebuffer, renderer, channels);
        self.submit(&mut unit)?;
        Ok(unit.variance)
    }

    /// Traces a pick ray against the master's renderer mirror.
    ///
    /// This is the reason the master mirrors renderer and volume parameters
    /// at all: picking must answer without a round trip to the workers.
    pub fn pick(
        &self,
        renderer: ObjectHandle,
        uv: Vec2f,
    ) -> Result<Option<PickResult>, WorkError> {
        let renderer = self
            .scene
            .objects
            .expect_kind(renderer, lux_repr::ObjectKind::Renderer)?;
        match &renderer.core().payload {
            Payload::Renderer(state) => Ok(state.pick(None, uv)),
            _ => Ok(None),
        }
    }

    /// Tears down the cluster and consumes the device.
    ///
    /// All ranks meet at the world barrier, finalize their transport, and
    /// the workers' serve loops return.
    pub fn finalize(mut self) -> Result<(), WorkError> {
        self.submit(&mut CommandFinalize::new())
    }
}
