// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Creation units: each takes a freshly minted handle.

use bytes::Bytes;
use lux_repr::{
    ChannelMask, DataFlags, ElementKind, FrameBufferFormat, ObjectHandle, ObjectKind,
    TextureFlags, TextureFormat, Vec2i,
};
use lux_scene::{DataArray, FrameBufferState, Payload, SceneObject, SceneState, Texture2d};
use lux_wire::{Decode, Encode, ReadStream, WireError, WriteStream};
use tracing::debug;

use crate::context::{MasterCx, WorkerCx};
use crate::error::WorkError;
use crate::registry::tags;
use crate::units::{Step, Work, WorkDecode};

/// Instantiates a payload via the factory table and binds it to the handle.
fn create_and_assign(
    scene: &mut SceneState,
    kind: ObjectKind,
    handle: ObjectHandle,
    type_name: &str,
) -> Result<(), WorkError> {
    let payload = scene.factories.create(kind, type_name)?;
    let object = SceneObject::new(kind, type_name, payload);
    scene.objects.assign(handle, object)?;
    Ok(())
}

/// Declares a creation unit parameterized by a type-name string.
///
/// These run on the master as well: the master holds a parameter-less mirror
/// of every created object, though only renderer and volume mirrors ever
/// receive parameters.
macro_rules! typed_creation_unit {
    ($(#[$attr:meta])* $name:ident, $kind:expr, $tag:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// The freshly minted handle to bind.
            pub handle: ObjectHandle,
            /// The type name to instantiate.
            pub type_name: String,
        }

        impl $name {
            /// Creates the unit.
            pub fn new(handle: ObjectHandle, type_name: impl Into<String>) -> $name {
                $name {
                    handle,
                    type_name: type_name.into(),
                }
            }
        }

        impl Work for $name {
            fn tag(&self) -> u32 {
                $tag
            }

            fn encode(&self, w: &mut WriteStream) {
                self.handle.encode(w);
                w.put_string(&self.type_name);
            }

            fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
                create_and_assign(cx.scene, $kind, self.handle, &self.type_name)?;
                Ok(Step::Continue)
            }

            fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
                create_and_assign(cx.scene, $kind, self.handle, &self.type_name)
            }
        }

        impl WorkDecode for $name {
            const TAG: u32 = $tag;

            fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
                Ok($name {
                    handle: ObjectHandle::decode(r)?,
                    type_name: r.get_string()?,
                })
            }
        }
    };
}

typed_creation_unit!(
    /// Creates a renderer of the named type.
    NewRenderer,
    ObjectKind::Renderer,
    tags::NEW_RENDERER
);
typed_creation_unit!(
    /// Creates a camera of the named type.
    NewCamera,
    ObjectKind::Camera,
    tags::NEW_CAMERA
);
typed_creation_unit!(
    /// Creates a geometry of the named type.
    NewGeometry,
    ObjectKind::Geometry,
    tags::NEW_GEOMETRY
);
typed_creation_unit!(
    /// Creates a volume of the named type.
    NewVolume,
    ObjectKind::Volume,
    tags::NEW_VOLUME
);
typed_creation_unit!(
    /// Creates a transfer function of the named type.
    NewTransferFunction,
    ObjectKind::TransferFunction,
    tags::NEW_TRANSFER_FUNCTION
);
typed_creation_unit!(
    /// Creates a pixel op of the named type.
    NewPixelOp,
    ObjectKind::PixelOp,
    tags::NEW_PIXEL_OP
);

/// Declares a creation unit that consults the target renderer's own factory
/// before the global table.
macro_rules! renderer_scoped_creation_unit {
    ($(#[$attr:meta])* $name:ident, $kind:expr, $tag:expr, $create:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// The freshly minted handle to bind.
            pub handle: ObjectHandle,
            /// The renderer whose factory is tried first; may be null.
            pub renderer: ObjectHandle,
            /// The type name to instantiate.
            pub type_name: String,
        }

        impl $name {
            /// Creates the unit.
            pub fn new(
                handle: ObjectHandle,
                renderer: ObjectHandle,
                type_name: impl Into<String>,
            ) -> $name {
                $name {
                    handle,
                    renderer,
                    type_name: type_name.into(),
                }
            }

            fn instantiate(&self, scene: &mut SceneState) -> Result<(), WorkError> {
                let intercepted = match scene.objects.lookup(self.renderer) {
                    Some(obj) if obj.kind() == ObjectKind::Renderer => {
                        match &obj.core().payload {
                            Payload::Renderer(state) => state.$create(&self.type_name),
                            _ => None,
                        }
                    }
                    _ => None,
                };
                match intercepted {
                    Some(payload) => {
                        let object = SceneObject::new($kind, &*self.type_name, payload);
                        scene.objects.assign(self.handle, object)?;
                        Ok(())
                    }
                    // No renderer present, or the renderer does not
                    // intercept this type.
                    None => create_and_assign(scene, $kind, self.handle, &self.type_name),
                }
            }
        }

        impl Work for $name {
            fn tag(&self) -> u32 {
                $tag
            }

            fn encode(&self, w: &mut WriteStream) {
                self.handle.encode(w);
                self.renderer.encode(w);
                w.put_string(&self.type_name);
            }

            fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
                self.instantiate(cx.scene)?;
                Ok(Step::Continue)
            }

            fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
                self.instantiate(cx.scene)
            }
        }

        impl WorkDecode for $name {
            const TAG: u32 = $tag;

            fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
                Ok($name {
                    handle: ObjectHandle::decode(r)?,
                    renderer: ObjectHandle::decode(r)?,
                    type_name: r.get_string()?,
                })
            }
        }
    };
}

renderer_scoped_creation_unit!(
    /// Creates a material, preferring the renderer's material factory.
    NewMaterial,
    ObjectKind::Material,
    tags::NEW_MATERIAL,
    create_material
);
renderer_scoped_creation_unit!(
    /// Creates a light, preferring the renderer's light factory.
    NewLight,
    ObjectKind::Light,
    tags::NEW_LIGHT,
    create_light
);

/// Creates an empty model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModel {
    /// The freshly minted handle to bind.
    pub handle: ObjectHandle,
}

impl NewModel {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle) -> NewModel {
        NewModel { handle }
    }
}

impl Work for NewModel {
    fn tag(&self) -> u32 {
        tags::NEW_MODEL
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let object = SceneObject::new(ObjectKind::Model, "model", Payload::Model(Default::default()));
        cx.scene.objects.assign(self.handle, object)?;
        Ok(Step::Continue)
    }
}

impl WorkDecode for NewModel {
    const TAG: u32 = tags::NEW_MODEL;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(NewModel {
            handle: ObjectHandle::decode(r)?,
        })
    }
}

/// Allocates a data array.
///
/// If the element type is an object kind, the payload carries handles; each
/// worker translates them to object references at deserialization,
/// incrementing every target's refcount.
#[derive(Debug, Clone, PartialEq)]
pub struct NewData {
    /// The freshly minted handle to bind.
    pub handle: ObjectHandle,
    /// The logical element count.
    pub count: u64,
    /// The element kind.
    pub kind: ElementKind,
    /// Creation flags.
    pub flags: DataFlags,
    /// The element payload. On the master with the shared-buffer flag this
    /// shares the application's allocation; workers own their copy.
    pub payload: Bytes,
}

impl NewData {
    /// Creates the unit, validating the element kind and flags.
    ///
    /// An empty payload clears the shared-buffer flag, so workers never
    /// observe a borrowed null.
    pub fn new(
        handle: ObjectHandle,
        count: u64,
        kind: ElementKind,
        payload: Bytes,
        mut flags: DataFlags,
    ) -> Result<NewData, WorkError> {
        if kind == ElementKind::String {
            return Err(lux_scene::SceneError::StringDataDisallowed.into());
        }
        if payload.is_empty() && flags.contains(DataFlags::SHARED_BUFFER) {
            debug!(%handle, "clearing shared-buffer flag on empty data payload");
            flags.remove(DataFlags::SHARED_BUFFER);
        }
        Ok(NewData {
            handle,
            count,
            kind,
            flags,
            payload,
        })
    }
}

impl Work for NewData {
    fn tag(&self) -> u32 {
        tags::NEW_DATA
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        w.put_u64(self.count);
        self.kind.encode(w);
        self.flags.encode(w);
        w.put_bytes(&self.payload);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let array = if self.kind.object_kind().is_some() {
            DataArray::resolve_objects(
                self.count,
                self.kind,
                self.payload.clone(),
                &cx.scene.objects,
            )?
        } else {
            DataArray::from_raw(self.count, self.kind, self.payload.clone())?
        };
        let object = SceneObject::new(ObjectKind::Data, "data", Payload::Data(array));
        cx.scene.objects.assign(self.handle, object)?;
        Ok(Step::Continue)
    }
}

impl WorkDecode for NewData {
    const TAG: u32 = tags::NEW_DATA;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(NewData {
            handle: ObjectHandle::decode(r)?,
            count: r.get_u64()?,
            kind: ElementKind::decode(r)?,
            flags: DataFlags::decode(r)?,
            payload: r.get_bytes()?,
        })
    }
}

/// Allocates a texture.
///
/// Workers always back the texture with their own copy, regardless of the
/// shared-buffer flag.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTexture2d {
    /// The freshly minted handle to bind.
    pub handle: ObjectHandle,
    /// The texture dimensions.
    pub size: Vec2i,
    /// The texel format.
    pub format: TextureFormat,
    /// Creation flags.
    pub flags: TextureFlags,
    /// The texel payload.
    pub payload: Bytes,
}

impl NewTexture2d {
    /// Creates the unit.
    pub fn new(
        handle: ObjectHandle,
        size: Vec2i,
        format: TextureFormat,
        payload: Bytes,
        flags: TextureFlags,
    ) -> NewTexture2d {
        NewTexture2d {
            handle,
            size,
            format,
            flags,
            payload,
        }
    }
}

impl Work for NewTexture2d {
    fn tag(&self) -> u32 {
        tags::NEW_TEXTURE2D
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        self.size.encode(w);
        self.format.encode(w);
        self.flags.encode(w);
        w.put_bytes(&self.payload);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let texture = Texture2d::new(
            self.size,
            self.format,
            self.flags.filter(),
            self.payload.clone(),
        )?;
        let object = SceneObject::new(ObjectKind::Texture, "texture2d", Payload::Texture(texture));
        cx.scene.objects.assign(self.handle, object)?;
        Ok(Step::Continue)
    }
}

impl WorkDecode for NewTexture2d {
    const TAG: u32 = tags::NEW_TEXTURE2D;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(NewTexture2d {
            handle: ObjectHandle::decode(r)?,
            size: Vec2i::decode(r)?,
            format: TextureFormat::decode(r)?,
            flags: TextureFlags::decode(r)?,
            payload: r.get_bytes()?,
        })
    }
}

/// Constructs a distributed framebuffer on every rank, the master included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFrameBuffer {
    /// The freshly minted handle to bind.
    pub handle: ObjectHandle,
    /// The framebuffer dimensions; must be strictly positive.
    pub size: Vec2i,
    /// The color format.
    pub format: FrameBufferFormat,
    /// The channels to allocate.
    pub channels: ChannelMask,
}

impl CreateFrameBuffer {
    /// Creates the unit.
    pub fn new(
        handle: ObjectHandle,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: ChannelMask,
    ) -> CreateFrameBuffer {
        CreateFrameBuffer {
            handle,
            size,
            format,
            channels,
        }
    }

    fn instantiate(&self, scene: &mut SceneState) -> Result<(), WorkError> {
        let fb = FrameBufferState::new(self.size, self.format, self.channels)?;
        let object = SceneObject::new(
            ObjectKind::FrameBuffer,
            "framebuffer",
            Payload::FrameBuffer(fb),
        );
        scene.objects.assign(self.handle, object)?;
        Ok(())
    }
}

impl Work for CreateFrameBuffer {
    fn tag(&self) -> u32 {
        tags::CREATE_FRAMEBUFFER
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        self.size.encode(w);
        self.format.encode(w);
        self.channels.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        self.instantiate(cx.scene)?;
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        self.instantiate(cx.scene)
    }
}

impl WorkDecode for CreateFrameBuffer {
    const TAG: u32 = tags::CREATE_FRAMEBUFFER;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(CreateFrameBuffer {
            handle: ObjectHandle::decode(r)?,
            size: Vec2i::decode(r)?,
            format: FrameBufferFormat::decode(r)?,
            channels: ChannelMask::decode(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use lux_scene::SceneError;

    use super::*;
    use crate::units::testutil::{assert_round_trip, WorkerFixture};

    #[test]
    fn test_round_trips() {
        assert_round_trip(&NewRenderer::new(ObjectHandle(1), "scivis"));
        assert_round_trip(&NewCamera::new(ObjectHandle(2), "perspective"));
        assert_round_trip(&NewMaterial::new(ObjectHandle(3), ObjectHandle(1), "obj"));
        assert_round_trip(&NewLight::new(ObjectHandle(4), ObjectHandle::NULL, "ambient"));
        assert_round_trip(&NewModel::new(ObjectHandle(5)));
        assert_round_trip(
            &NewData::new(
                ObjectHandle(6),
                2,
                ElementKind::Float32,
                Bytes::from_static(&[0; 8]),
                DataFlags::empty(),
            )
            .unwrap(),
        );
        assert_round_trip(&NewTexture2d::new(
            ObjectHandle(7),
            Vec2i::new(1, 1),
            TextureFormat::Rgba8,
            Bytes::from_static(&[0; 4]),
            TextureFlags::FILTER_NEAREST,
        ));
        assert_round_trip(&CreateFrameBuffer::new(
            ObjectHandle(8),
            Vec2i::new(16, 16),
            FrameBufferFormat::Srgba8,
            ChannelMask::COLOR | ChannelMask::ACCUM,
        ));
    }

    #[test]
    fn test_creation_binds_the_handle() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let h = ObjectHandle(1);
        NewRenderer::new(h, "scivis").run(&mut cx).unwrap();

        let obj = cx.scene.objects.lookup(h).unwrap();
        assert_eq!(obj.kind(), ObjectKind::Renderer);
        assert_eq!(obj.type_name(), "scivis");
    }

    #[test]
    fn test_unknown_type_fails_deterministically() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let err = NewRenderer::new(ObjectHandle(1), "neon")
            .run(&mut cx)
            .unwrap_err();
        assert_eq!(
            err,
            WorkError::Scene(SceneError::UnknownType {
                kind: ObjectKind::Renderer,
                name: "neon".into(),
            })
        );
    }

    #[test]
    fn test_material_falls_back_to_global_factory() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        NewRenderer::new(ObjectHandle(1), "scivis")
            .run(&mut cx)
            .unwrap();

        // The built-in kernels intercept nothing, so the global table serves
        // the request; a null renderer handle takes the same path.
        NewMaterial::new(ObjectHandle(2), ObjectHandle(1), "obj")
            .run(&mut cx)
            .unwrap();
        NewMaterial::new(ObjectHandle(3), ObjectHandle::NULL, "obj")
            .run(&mut cx)
            .unwrap();
        assert_eq!(
            cx.scene.objects.lookup(ObjectHandle(2)).unwrap().kind(),
            ObjectKind::Material
        );
        assert!(cx.scene.objects.defined(ObjectHandle(3)));
    }

    #[test]
    fn test_new_data_clears_shared_flag_on_empty_payload() {
        let unit = NewData::new(
            ObjectHandle(1),
            0,
            ElementKind::Int32,
            Bytes::new(),
            DataFlags::SHARED_BUFFER,
        )
        .unwrap();
        assert!(!unit.flags.contains(DataFlags::SHARED_BUFFER));
    }

    #[test]
    fn test_new_data_rejects_strings() {
        let err = NewData::new(
            ObjectHandle(1),
            1,
            ElementKind::String,
            Bytes::new(),
            DataFlags::empty(),
        )
        .unwrap_err();
        assert_eq!(err, WorkError::Scene(SceneError::StringDataDisallowed));
    }

    #[test]
    fn test_framebuffer_dimensions_are_checked() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let err = CreateFrameBuffer::new(
            ObjectHandle(1),
            Vec2i::new(0, 4),
            FrameBufferFormat::Rgba8,
            ChannelMask::COLOR,
        )
        .run(&mut cx)
        .unwrap_err();
        assert_eq!(
            err,
            WorkError::Scene(SceneError::InvalidDimensions(Vec2i::new(0, 4)))
        );
    }
}
