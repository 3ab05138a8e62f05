// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Mutation units.

use std::rc::Rc;

use bytes::Bytes;
use lux_ore::warn_once;
use lux_repr::{ElementKind, ObjectHandle, ObjectKind, ParamValue, Vec3i};
use lux_scene::{Payload, PixelOpBuild, SceneError, StoredParam};
use lux_wire::{Decode, Encode, ReadStream, WireError, WriteStream};

use crate::context::{MasterCx, WorkerCx};
use crate::error::{WorkError, REGION_BYTE_BUDGET};
use crate::registry::tags;
use crate::units::{Step, Work, WorkDecode};

/// Reports whether the master mirrors this object's parameters.
///
/// Only renderers and volumes keep master-side parameters; they feed `pick`.
/// Everything else matters only where rendering happens.
fn master_mirrors(kind: ObjectKind) -> bool {
    matches!(kind, ObjectKind::Renderer | ObjectKind::Volume)
}

/// Sets one named parameter on the target object.
#[derive(Debug, Clone, PartialEq)]
pub struct SetParam {
    /// The target object.
    pub handle: ObjectHandle,
    /// The parameter name.
    pub name: String,
    /// The tagged value.
    pub value: ParamValue,
}

impl SetParam {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle, name: impl Into<String>, value: ParamValue) -> SetParam {
        SetParam {
            handle,
            name: name.into(),
            value,
        }
    }
}

impl Work for SetParam {
    fn tag(&self) -> u32 {
        tags::SET_PARAM
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        w.put_string(&self.name);
        self.value.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let stored = StoredParam::resolve(self.value.clone(), &cx.scene.objects)?;
        let object = cx.scene.objects.expect(self.handle)?;
        object.set_param(&self.name, stored);
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        let Some(object) = cx.scene.objects.lookup(self.handle).cloned() else {
            return Ok(());
        };
        if !master_mirrors(object.kind()) {
            return Ok(());
        }
        // Object-valued parameters may reference handles the master never
        // defined (textures, data arrays); those are dropped, not errors.
        if let ParamValue::Object(h) = self.value {
            if !h.is_null() && !cx.scene.objects.defined(h) {
                return Ok(());
            }
        }
        let stored = StoredParam::resolve(self.value.clone(), &cx.scene.objects)?;
        object.set_param(&self.name, stored);
        Ok(())
    }
}

impl WorkDecode for SetParam {
    const TAG: u32 = tags::SET_PARAM;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(SetParam {
            handle: ObjectHandle::decode(r)?,
            name: r.get_string()?,
            value: ParamValue::decode(r)?,
        })
    }
}

/// Removes one named parameter from the target object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveParam {
    /// The target object.
    pub handle: ObjectHandle,
    /// The parameter name.
    pub name: String,
}

impl RemoveParam {
    /// Creates the unit.
    pub fn new(handle: ObjectHandle, name: impl Into<String>) -> RemoveParam {
        RemoveParam {
            handle,
            name: name.into(),
        }
    }
}

impl Work for RemoveParam {
    fn tag(&self) -> u32 {
        tags::REMOVE_PARAM
    }

    fn encode(&self, w: &mut WriteStream) {
        self.handle.encode(w);
        w.put_string(&self.name);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let object = cx.scene.objects.expect(self.handle)?;
        object.remove_param(&self.name);
        Ok(Step::Continue)
    }

    fn run_on_master(&mut self, cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        if let Some(object) = cx.scene.objects.lookup(self.handle) {
            if master_mirrors(object.kind()) {
                object.remove_param(&self.name);
            }
        }
        Ok(())
    }
}

impl WorkDecode for RemoveParam {
    const TAG: u32 = tags::REMOVE_PARAM;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(RemoveParam {
            handle: ObjectHandle::decode(r)?,
            name: r.get_string()?,
        })
    }
}

/// Binds a material to a geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMaterial {
    /// The target geometry.
    pub geometry: ObjectHandle,
    /// The material to bind.
    pub material: ObjectHandle,
}

impl SetMaterial {
    /// Creates the unit.
    pub fn new(geometry: ObjectHandle, material: ObjectHandle) -> SetMaterial {
        SetMaterial { geometry, material }
    }
}

impl Work for SetMaterial {
    fn tag(&self) -> u32 {
        tags::SET_MATERIAL
    }

    fn encode(&self, w: &mut WriteStream) {
        self.geometry.encode(w);
        self.material.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let geometry = cx
            .scene
            .objects
            .expect_kind(self.geometry, ObjectKind::Geometry)?
            .clone();
        let material = cx
            .scene
            .objects
            .expect_kind(self.material, ObjectKind::Material)?
            .clone();
        let mut core = geometry.core_mut();
        let core = &mut *core;
        match &mut core.payload {
            Payload::Geometry(state) => state.set_material(material),
            // Module geometries without structural state keep the binding in
            // the parameter bag.
            _ => {
                core.params
                    .set("material", StoredParam::Object(Some(material)));
                core.committed = false;
            }
        }
        Ok(Step::Continue)
    }
}

impl WorkDecode for SetMaterial {
    const TAG: u32 = tags::SET_MATERIAL;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(SetMaterial {
            geometry: ObjectHandle::decode(r)?,
            material: ObjectHandle::decode(r)?,
        })
    }
}

/// Replaces a framebuffer's pixel-op chain head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPixelOp {
    /// The target framebuffer.
    pub framebuffer: ObjectHandle,
    /// The pixel op whose factory produces the instance.
    pub pixel_op: ObjectHandle,
}

impl SetPixelOp {
    /// Creates the unit.
    pub fn new(framebuffer: ObjectHandle, pixel_op: ObjectHandle) -> SetPixelOp {
        SetPixelOp {
            framebuffer,
            pixel_op,
        }
    }
}

impl Work for SetPixelOp {
    fn tag(&self) -> u32 {
        tags::SET_PIXEL_OP
    }

    fn encode(&self, w: &mut WriteStream) {
        self.framebuffer.encode(w);
        self.pixel_op.encode(w);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let fb = cx
            .scene
            .objects
            .expect_kind(self.framebuffer, ObjectKind::FrameBuffer)?
            .clone();
        let op = cx
            .scene
            .objects
            .expect_kind(self.pixel_op, ObjectKind::PixelOp)?
            .clone();

        let mut fb_core = fb.core_mut();
        let Payload::FrameBuffer(fb_state) = &mut fb_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.framebuffer,
                expected: ObjectKind::FrameBuffer,
                found: fb.kind(),
            }
            .into());
        };
        let op_core = op.core();
        let Payload::PixelOp(op_state) = &op_core.payload else {
            return Err(SceneError::WrongKind {
                handle: self.pixel_op,
                expected: ObjectKind::PixelOp,
                found: op.kind(),
            }
            .into());
        };

        let prev = fb_state.replace_pixel_op(None);
        match op_state.create_instance(prev) {
            PixelOpBuild::Built(instance) => {
                fb_state.replace_pixel_op(Some(instance));
            }
            PixelOpBuild::Refused(prev) => {
                warn_once!("pixel op did not create an instance");
                fb_state.replace_pixel_op(prev);
            }
        }
        Ok(Step::Continue)
    }
}

impl WorkDecode for SetPixelOp {
    const TAG: u32 = tags::SET_PIXEL_OP;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(SetPixelOp {
            framebuffer: ObjectHandle::decode(r)?,
            pixel_op: ObjectHandle::decode(r)?,
        })
    }
}

/// Declares a unit operating on a model and one member object.
macro_rules! model_membership_unit {
    ($(#[$attr:meta])* $name:ident, $tag:expr, $member_kind:expr, $apply:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// The target model.
            pub model: ObjectHandle,
            /// The member object.
            pub object: ObjectHandle,
        }

        impl $name {
            /// Creates the unit.
            pub fn new(model: ObjectHandle, object: ObjectHandle) -> $name {
                $name { model, object }
            }
        }

        impl Work for $name {
            fn tag(&self) -> u32 {
                $tag
            }

            fn encode(&self, w: &mut WriteStream) {
                self.model.encode(w);
                self.object.encode(w);
            }

            fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
                let model = cx
                    .scene
                    .objects
                    .expect_kind(self.model, ObjectKind::Model)?
                    .clone();
                let member = cx
                    .scene
                    .objects
                    .expect_kind(self.object, $member_kind)?
                    .clone();
                let result = match &mut model.core_mut().payload {
                    Payload::Model(state) => {
                        #[allow(clippy::redundant_closure_call)]
                        ($apply)(state, member);
                        Ok(Step::Continue)
                    }
                    _ => Err(SceneError::WrongKind {
                        handle: self.model,
                        expected: ObjectKind::Model,
                        found: model.kind(),
                    }
                    .into()),
                };
                result
            }
        }

        impl WorkDecode for $name {
            const TAG: u32 = $tag;

            fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
                Ok($name {
                    model: ObjectHandle::decode(r)?,
                    object: ObjectHandle::decode(r)?,
                })
            }
        }
    };
}

model_membership_unit!(
    /// Appends a geometry to a model.
    AddGeometry,
    tags::ADD_GEOMETRY,
    ObjectKind::Geometry,
    |state: &mut lux_scene::ModelState, member| state.add_geometry(member)
);
model_membership_unit!(
    /// Appends a volume to a model.
    AddVolume,
    tags::ADD_VOLUME,
    ObjectKind::Volume,
    |state: &mut lux_scene::ModelState, member| state.add_volume(member)
);
model_membership_unit!(
    /// Removes a geometry from a model; no-op if absent.
    RemoveGeometry,
    tags::REMOVE_GEOMETRY,
    ObjectKind::Geometry,
    |state: &mut lux_scene::ModelState, member: Rc<_>| {
        state.remove_geometry(&member);
    }
);
model_membership_unit!(
    /// Removes a volume from a model; no-op if absent.
    RemoveVolume,
    tags::REMOVE_VOLUME,
    ObjectKind::Volume,
    |state: &mut lux_scene::ModelState, member: Rc<_>| {
        state.remove_volume(&member);
    }
);

/// Copies a sub-volume update into the target volume.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRegion {
    /// The target volume.
    pub volume: ObjectHandle,
    /// The region origin within the volume.
    pub start: Vec3i,
    /// The region extent.
    pub extent: Vec3i,
    /// The element kind of the payload.
    pub kind: ElementKind,
    /// The region payload.
    pub payload: Bytes,
}

impl SetRegion {
    /// Creates the unit, enforcing the per-command byte budget before
    /// anything is broadcast.
    pub fn new(
        volume: ObjectHandle,
        start: Vec3i,
        extent: Vec3i,
        kind: ElementKind,
        payload: Bytes,
    ) -> Result<SetRegion, WorkError> {
        if extent.x <= 0 || extent.y <= 0 || extent.z <= 0 {
            return Err(SceneError::InvalidExtent(extent).into());
        }
        let elem_size = kind.size_of().ok_or(SceneError::StringDataDisallowed)?;
        let bytes = extent.volume() as u64 * elem_size as u64;
        if bytes > REGION_BYTE_BUDGET {
            return Err(WorkError::RegionTooLarge { bytes });
        }
        Ok(SetRegion {
            volume,
            start,
            extent,
            kind,
            payload,
        })
    }
}

impl Work for SetRegion {
    fn tag(&self) -> u32 {
        tags::SET_REGION
    }

    fn encode(&self, w: &mut WriteStream) {
        self.volume.encode(w);
        self.start.encode(w);
        self.extent.encode(w);
        self.kind.encode(w);
        w.put_bytes(&self.payload);
    }

    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError> {
        let volume = cx
            .scene
            .objects
            .expect_kind(self.volume, ObjectKind::Volume)?
            .clone();
        let result = match &mut volume.core_mut().payload {
            Payload::Volume(state) => {
                state.set_region(&self.payload, self.start, self.extent, self.kind)?;
                Ok(Step::Continue)
            }
            _ => Err(SceneError::WrongKind {
                handle: self.volume,
                expected: ObjectKind::Volume,
                found: volume.kind(),
            }
            .into()),
        };
        result
    }
}

impl WorkDecode for SetRegion {
    const TAG: u32 = tags::SET_REGION;

    fn decode(r: &mut ReadStream) -> Result<Self, WireError> {
        Ok(SetRegion {
            volume: ObjectHandle::decode(r)?,
            start: Vec3i::decode(r)?,
            extent: Vec3i::decode(r)?,
            kind: ElementKind::decode(r)?,
            payload: r.get_bytes()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::create::{NewCamera, NewGeometry, NewModel, NewRenderer, NewVolume};
    use crate::units::testutil::{assert_round_trip, MasterFixture, WorkerFixture};

    #[test]
    fn test_round_trips() {
        assert_round_trip(&SetParam::new(
            ObjectHandle(1),
            "fovy",
            ParamValue::Float(45.0),
        ));
        assert_round_trip(&SetParam::new(
            ObjectHandle(1),
            "map_backplate",
            ParamValue::Object(ObjectHandle(9)),
        ));
        assert_round_trip(&RemoveParam::new(ObjectHandle(1), "fovy"));
        assert_round_trip(&SetMaterial::new(ObjectHandle(1), ObjectHandle(2)));
        assert_round_trip(&SetPixelOp::new(ObjectHandle(1), ObjectHandle(2)));
        assert_round_trip(&AddGeometry::new(ObjectHandle(1), ObjectHandle(2)));
        assert_round_trip(&RemoveVolume::new(ObjectHandle(1), ObjectHandle(2)));
        assert_round_trip(
            &SetRegion::new(
                ObjectHandle(1),
                Vec3i::new(0, 0, 0),
                Vec3i::new(1, 1, 1),
                ElementKind::Float32,
                Bytes::from_static(&[0; 4]),
            )
            .unwrap(),
        );
    }

    #[test]
    fn test_set_param_requires_the_target() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let err = SetParam::new(ObjectHandle(5), "fovy", ParamValue::Float(45.0))
            .run(&mut cx)
            .unwrap_err();
        assert_eq!(
            err,
            WorkError::Scene(SceneError::MissingObject(ObjectHandle(5)))
        );
    }

    #[test]
    fn test_master_drops_unmirrored_params() {
        let mut fixture = MasterFixture::new();
        let mut cx = fixture.cx();
        let camera = ObjectHandle(1);
        let volume = ObjectHandle(2);
        NewCamera::new(camera, "perspective")
            .run_on_master(&mut cx)
            .unwrap();
        NewVolume::new(volume, "structured_regular")
            .run_on_master(&mut cx)
            .unwrap();

        SetParam::new(camera, "fovy", ParamValue::Float(45.0))
            .run_on_master(&mut cx)
            .unwrap();
        SetParam::new(volume, "dimensions", ParamValue::Vec3i(Vec3i::new(2, 2, 2)))
            .run_on_master(&mut cx)
            .unwrap();

        let camera = cx.scene.objects.lookup(camera).unwrap();
        assert!(camera.core().params.is_empty());
        let volume = cx.scene.objects.lookup(volume).unwrap();
        assert_eq!(
            volume.core().params.get_vec3i("dimensions"),
            Some(Vec3i::new(2, 2, 2))
        );
    }

    #[test]
    fn test_master_skips_params_for_undefined_handles() {
        let mut fixture = MasterFixture::new();
        let mut cx = fixture.cx();
        // A handle the master never defined: silently ignored.
        SetParam::new(ObjectHandle(9), "fovy", ParamValue::Float(45.0))
            .run_on_master(&mut cx)
            .unwrap();

        // A mirrored target referencing an undefined object: dropped.
        let renderer = ObjectHandle(1);
        NewRenderer::new(renderer, "scivis")
            .run_on_master(&mut cx)
            .unwrap();
        SetParam::new(renderer, "map_backplate", ParamValue::Object(ObjectHandle(7)))
            .run_on_master(&mut cx)
            .unwrap();
        let renderer = cx.scene.objects.lookup(renderer).unwrap();
        assert!(renderer.core().params.get("map_backplate").is_none());
    }

    #[test]
    fn test_set_material_binds_by_lookup() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let geometry = ObjectHandle(1);
        let material = ObjectHandle(2);
        NewGeometry::new(geometry, "spheres").run(&mut cx).unwrap();
        crate::units::create::NewMaterial::new(material, ObjectHandle::NULL, "obj")
            .run(&mut cx)
            .unwrap();

        SetMaterial::new(geometry, material).run(&mut cx).unwrap();

        let geometry = cx.scene.objects.lookup(geometry).unwrap();
        let material = cx.scene.objects.lookup(material).unwrap().clone();
        match &geometry.core().payload {
            Payload::Geometry(state) => {
                assert!(Rc::ptr_eq(state.material().unwrap(), &material));
            }
            payload => panic!("unexpected payload: {payload:?}"),
        };
    }

    #[test]
    fn test_set_material_checks_kinds() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let geometry = ObjectHandle(1);
        NewGeometry::new(geometry, "spheres").run(&mut cx).unwrap();

        let err = SetMaterial::new(geometry, geometry).run(&mut cx).unwrap_err();
        assert_eq!(
            err,
            WorkError::Scene(SceneError::WrongKind {
                handle: geometry,
                expected: ObjectKind::Material,
                found: ObjectKind::Geometry,
            })
        );
    }

    #[test]
    fn test_model_membership_round_trip() {
        let mut fixture = WorkerFixture::new();
        let mut cx = fixture.cx();
        let model = ObjectHandle(1);
        let geometry = ObjectHandle(2);
        NewModel::new(model).run(&mut cx).unwrap();
        NewGeometry::new(geometry, "spheres").run(&mut cx).unwrap();

        let geometry_obj = cx.scene.objects.lookup(geometry).unwrap().clone();
        let baseline = Rc::strong_count(&geometry_obj);

        AddGeometry::new(model, geometry).run(&mut cx).unwrap();
        assert_eq!(Rc::strong_count(&geometry_obj), baseline + 1);

        RemoveGeometry::new(model, geometry).run(&mut cx).unwrap();
        assert_eq!(Rc::strong_count(&geometry_obj), baseline);

        // Removing again is a no-op, not an error.
        RemoveGeometry::new(model, geometry).run(&mut cx).unwrap();
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_value() -> impl Strategy<Value = ParamValue> {
            prop_oneof![
                any::<i32>().prop_map(ParamValue::Int),
                // NaN round-trips bit-exactly but defeats the equality the
                // law is stated with.
                any::<f32>()
                    .prop_filter("NaN defeats equality", |f| !f.is_nan())
                    .prop_map(ParamValue::Float),
                ".*".prop_map(ParamValue::String),
                any::<u64>().prop_map(|h| ParamValue::Object(ObjectHandle(h))),
            ]
        }

        proptest! {
            #[test]
            fn proptest_set_param_round_trip(
                handle in any::<u64>(),
                name in ".*",
                value in arb_value(),
            ) {
                assert_round_trip(&SetParam::new(ObjectHandle(handle), name, value));
            }
        }
    }

    #[test]
    fn test_region_budget_is_enforced_before_broadcast() {
        // 3 GiB worth of floats.
        let err = SetRegion::new(
            ObjectHandle(1),
            Vec3i::new(0, 0, 0),
            Vec3i::new(1024, 1024, 768),
            ElementKind::Float32,
            Bytes::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            WorkError::RegionTooLarge {
                bytes: 3_221_225_472,
            }
        );
    }
}
