// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Models and geometries.

use std::rc::Rc;

use tracing::debug;

use crate::object::ObjectRef;

/// Kind-specific state for a geometry.
///
/// Geometry shape data arrives through ordinary parameters (vertex and index
/// data arrays); the only structural slot is the bound material.
#[derive(Debug, Default)]
pub struct GeometryState {
    material: Option<ObjectRef>,
}

impl GeometryState {
    /// Binds the geometry's material, replacing any previous binding.
    pub fn set_material(&mut self, material: ObjectRef) {
        self.material = Some(material);
    }

    /// The bound material, if any.
    pub fn material(&self) -> Option<&ObjectRef> {
        self.material.as_ref()
    }
}

/// A summary of the acceleration structure built by finalization.
///
/// Actual spatial indexing belongs to the rendering kernels; the dispatch
/// core only tracks what the structure was built over so it can tell whether
/// it is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelSummary {
    /// The number of geometries indexed.
    pub geometry: usize,
    /// The number of volumes indexed.
    pub volumes: usize,
}

/// Kind-specific state for a model: ordered strong-reference sequences of
/// geometries and volumes.
#[derive(Debug, Default)]
pub struct ModelState {
    geometry: Vec<ObjectRef>,
    volumes: Vec<ObjectRef>,
    accel: Option<AccelSummary>,
}

impl ModelState {
    /// Appends a geometry.
    pub fn add_geometry(&mut self, geometry: ObjectRef) {
        self.geometry.push(geometry);
        self.accel = None;
    }

    /// Appends a volume.
    pub fn add_volume(&mut self, volume: ObjectRef) {
        self.volumes.push(volume);
        self.accel = None;
    }

    /// Removes the first element identical to `geometry`; no-op if absent.
    pub fn remove_geometry(&mut self, geometry: &ObjectRef) -> bool {
        match self.geometry.iter().position(|g| Rc::ptr_eq(g, geometry)) {
            Some(index) => {
                self.geometry.remove(index);
                self.accel = None;
                true
            }
            None => false,
        }
    }

    /// Removes the first element identical to `volume`; no-op if absent.
    pub fn remove_volume(&mut self, volume: &ObjectRef) -> bool {
        match self.volumes.iter().position(|v| Rc::ptr_eq(v, volume)) {
            Some(index) => {
                self.volumes.remove(index);
                self.accel = None;
                true
            }
            None => false,
        }
    }

    /// The model's geometries, in insertion order.
    pub fn geometry(&self) -> &[ObjectRef] {
        &self.geometry
    }

    /// The model's volumes, in insertion order.
    pub fn volumes(&self) -> &[ObjectRef] {
        &self.volumes
    }

    /// Rebuilds the acceleration structure. Invoked after commit.
    pub fn finalize(&mut self) {
        let summary = AccelSummary {
            geometry: self.geometry.len(),
            volumes: self.volumes.len(),
        };
        debug!(?summary, "finalized model");
        self.accel = Some(summary);
    }

    /// The acceleration summary, if finalization is current.
    pub fn accel(&self) -> Option<AccelSummary> {
        self.accel
    }
}

#[cfg(test)]
mod tests {
    use lux_repr::ObjectKind;

    use super::*;
    use crate::object::{Payload, SceneObject};

    fn geometry() -> ObjectRef {
        SceneObject::new(
            ObjectKind::Geometry,
            "spheres",
            Payload::Geometry(GeometryState::default()),
        )
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut model = ModelState::default();
        let g = geometry();
        let count_before = Rc::strong_count(&g);

        model.add_geometry(Rc::clone(&g));
        assert_eq!(model.geometry().len(), 1);
        assert_eq!(Rc::strong_count(&g), count_before + 1);

        assert!(model.remove_geometry(&g));
        assert!(model.geometry().is_empty());
        assert_eq!(Rc::strong_count(&g), count_before);
    }

    #[test]
    fn test_remove_absent_is_a_noop() {
        let mut model = ModelState::default();
        let g = geometry();
        let other = geometry();
        model.add_geometry(Rc::clone(&g));

        assert!(!model.remove_geometry(&other));
        assert_eq!(model.geometry().len(), 1);
    }

    #[test]
    fn test_remove_volume_does_not_append() {
        // Strict remove-only semantics: removing an absent volume leaves the
        // list untouched.
        let mut model = ModelState::default();
        let v = SceneObject::new(ObjectKind::Volume, "structured_regular", Payload::Generic);
        assert!(!model.remove_volume(&v));
        assert!(model.volumes().is_empty());
    }

    #[test]
    fn test_mutation_invalidates_accel() {
        let mut model = ModelState::default();
        let g = geometry();
        model.add_geometry(Rc::clone(&g));
        model.finalize();
        assert_eq!(
            model.accel(),
            Some(AccelSummary {
                geometry: 1,
                volumes: 0,
            })
        );

        model.remove_geometry(&g);
        assert!(model.accel().is_none());
    }
}
