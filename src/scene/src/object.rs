// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Managed scene objects.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use lux_repr::ObjectKind;

use crate::data::DataArray;
use crate::error::SceneError;
use crate::framebuffer::FrameBufferState;
use crate::model::{GeometryState, ModelState};
use crate::params::{ParamMap, StoredParam};
use crate::pixelop::PixelOpState;
use crate::renderer::RendererState;
use crate::texture::Texture2d;
use crate::transfer::TransferFunctionState;
use crate::volume::VolumeState;

/// A strong reference to a managed object.
///
/// The reference count is the ownership model: the registry holds one strong
/// reference per binding, containers hold one per contained reference, and
/// the object is destroyed when the count reaches zero. Counts are observable
/// via [`Rc::strong_count`] and the scene-graph laws in the tests rely on
/// that.
pub type ObjectRef = Rc<SceneObject>;

/// The kind-specific half of a managed object.
///
/// The dispatch core treats objects uniformly through the parameter bag and
/// the commit lifecycle; operations that need more (rendering a frame,
/// appending to a model) downcast by matching this variant after checking
/// [`SceneObject::kind`].
#[derive(Debug)]
pub enum Payload {
    /// No kind-specific state: cameras, lights, materials, and generic
    /// objects are pure parameter bags at this layer.
    Generic,
    /// A geometry.
    Geometry(GeometryState),
    /// A model.
    Model(ModelState),
    /// A volume.
    Volume(VolumeState),
    /// A data array.
    Data(DataArray),
    /// A texture.
    Texture(Texture2d),
    /// A framebuffer.
    FrameBuffer(FrameBufferState),
    /// A renderer.
    Renderer(RendererState),
    /// A transfer function.
    TransferFunction(TransferFunctionState),
    /// A pixel op.
    PixelOp(PixelOpState),
}

/// The mutable interior of a managed object.
#[derive(Debug)]
pub struct ObjectCore {
    /// The named-parameter bag.
    pub params: ParamMap,
    /// Whether the object has been committed since its last mutation.
    pub committed: bool,
    /// The kind-specific state.
    pub payload: Payload,
}

/// A managed object: a kind tag, a creation type name, and mutable state
/// behind a [`RefCell`].
#[derive(Debug)]
pub struct SceneObject {
    kind: ObjectKind,
    type_name: String,
    core: RefCell<ObjectCore>,
}

impl SceneObject {
    /// Creates a managed object and returns the first strong reference to it.
    pub fn new(kind: ObjectKind, type_name: impl Into<String>, payload: Payload) -> ObjectRef {
        Rc::new(SceneObject {
            kind,
            type_name: type_name.into(),
            core: RefCell::new(ObjectCore {
                params: ParamMap::new(),
                committed: false,
                payload,
            }),
        })
    }

    /// The object's kind, fixed at creation.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The type name the object was created with.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrows the object's mutable interior.
    pub fn core(&self) -> Ref<'_, ObjectCore> {
        self.core.borrow()
    }

    /// Mutably borrows the object's mutable interior.
    pub fn core_mut(&self) -> RefMut<'_, ObjectCore> {
        self.core.borrow_mut()
    }

    /// Sets a parameter, clearing the committed flag.
    ///
    /// Unknown names set silently; they are simply never read.
    pub fn set_param(&self, name: &str, value: StoredParam) {
        let mut core = self.core.borrow_mut();
        core.params.set(name, value);
        core.committed = false;
    }

    /// Removes a parameter, clearing the committed flag.
    pub fn remove_param(&self, name: &str) -> bool {
        let mut core = self.core.borrow_mut();
        let removed = core.params.remove(name);
        if removed {
            core.committed = false;
        }
        removed
    }

    /// Reports whether the object has been committed since its last mutation.
    pub fn is_committed(&self) -> bool {
        self.core.borrow().committed
    }

    /// Commits the object: materializes derived state from the parameter bag.
    ///
    /// Idempotent with respect to an unchanged parameter set; this is the
    /// only operation permitted to perform expensive derived-state rebuilds.
    pub fn commit(&self) -> Result<(), SceneError> {
        let mut core = self.core.borrow_mut();
        if core.committed {
            return Ok(());
        }
        let core = &mut *core;
        match &mut core.payload {
            Payload::Renderer(renderer) => renderer.commit(&core.params),
            Payload::Volume(volume) => volume.commit(&core.params)?,
            Payload::TransferFunction(tf) => tf.commit(&core.params),
            Payload::Generic
            | Payload::Geometry(_)
            | Payload::Model(_)
            | Payload::Data(_)
            | Payload::Texture(_)
            | Payload::FrameBuffer(_)
            | Payload::PixelOp(_) => {}
        }
        core.committed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_clears_committed() {
        let obj = SceneObject::new(ObjectKind::Camera, "perspective", Payload::Generic);
        obj.commit().unwrap();
        assert!(obj.is_committed());

        obj.set_param("fovy", StoredParam::Float(45.0));
        assert!(!obj.is_committed());

        obj.commit().unwrap();
        obj.remove_param("fovy");
        assert!(!obj.is_committed());
    }

    #[test]
    fn test_removing_absent_param_preserves_committed() {
        let obj = SceneObject::new(ObjectKind::Light, "ambient", Payload::Generic);
        obj.commit().unwrap();
        assert!(!obj.remove_param("intensity"));
        assert!(obj.is_committed());
    }

    #[test]
    fn test_commit_is_idempotent() {
        let obj = SceneObject::new(ObjectKind::Camera, "perspective", Payload::Generic);
        obj.set_param("fovy", StoredParam::Float(45.0));
        obj.commit().unwrap();
        obj.commit().unwrap();
        assert!(obj.is_committed());
    }
}
