// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Factory tables: (kind, type name) → constructor.

use std::collections::BTreeMap;

use lux_repr::ObjectKind;
use tracing::debug;

use crate::error::SceneError;
use crate::model::GeometryState;
use crate::object::Payload;
use crate::pixelop::{tone_mapper_factory, PixelOpState};
use crate::renderer::{pathtracer_kernel, scivis_kernel, RendererState};
use crate::transfer::TransferFunctionState;
use crate::volume::VolumeState;

/// Constructs the kind-specific payload for a type name.
pub type Builder = fn(type_name: &str) -> Payload;

/// The per-rank factory table.
///
/// Creation commands carry a kind and a type name; the table supplies the
/// constructor. Modules extend the table at load time, and may re-register a
/// name to override a built-in.
#[derive(Debug, Default)]
pub struct FactoryTable {
    builders: BTreeMap<(ObjectKind, String), Builder>,
}

impl FactoryTable {
    /// Creates an empty table.
    pub fn new() -> FactoryTable {
        FactoryTable::default()
    }

    /// Registers a builder for a (kind, type name) pair, replacing any
    /// previous registration.
    pub fn register(&mut self, kind: ObjectKind, name: &str, builder: Builder) {
        if self
            .builders
            .insert((kind, name.to_owned()), builder)
            .is_some()
        {
            debug!(%kind, name, "factory re-registered");
        }
    }

    /// Reports whether a builder is registered for the pair.
    pub fn contains(&self, kind: ObjectKind, name: &str) -> bool {
        self.builders.contains_key(&(kind, name.to_owned()))
    }

    /// Constructs the payload for a (kind, type name) pair.
    pub fn create(&self, kind: ObjectKind, name: &str) -> Result<Payload, SceneError> {
        let builder =
            self.builders
                .get(&(kind, name.to_owned()))
                .ok_or_else(|| SceneError::UnknownType {
                    kind,
                    name: name.to_owned(),
                })?;
        Ok(builder(name))
    }
}

fn build_renderer(type_name: &str) -> Payload {
    let kernel = match type_name {
        "pathtracer" => pathtracer_kernel(),
        _ => scivis_kernel(),
    };
    Payload::Renderer(RendererState::new(kernel))
}

fn build_generic(_type_name: &str) -> Payload {
    Payload::Generic
}

fn build_geometry(_type_name: &str) -> Payload {
    Payload::Geometry(GeometryState::default())
}

fn build_volume(_type_name: &str) -> Payload {
    Payload::Volume(VolumeState::default())
}

fn build_transfer_function(_type_name: &str) -> Payload {
    Payload::TransferFunction(TransferFunctionState::new())
}

fn build_pixel_op(_type_name: &str) -> Payload {
    Payload::PixelOp(PixelOpState::new(tone_mapper_factory))
}

/// Builds a table holding the built-in types.
pub fn builtin_table() -> FactoryTable {
    let mut table = FactoryTable::new();
    table.register(ObjectKind::Renderer, "scivis", build_renderer);
    table.register(ObjectKind::Renderer, "pathtracer", build_renderer);
    table.register(ObjectKind::Camera, "perspective", build_generic);
    table.register(ObjectKind::Camera, "orthographic", build_generic);
    table.register(ObjectKind::Geometry, "spheres", build_geometry);
    table.register(ObjectKind::Geometry, "triangles", build_geometry);
    table.register(ObjectKind::Volume, "structured_regular", build_volume);
    table.register(ObjectKind::Light, "ambient", build_generic);
    table.register(ObjectKind::Light, "distant", build_generic);
    table.register(ObjectKind::Material, "obj", build_generic);
    table.register(
        ObjectKind::TransferFunction,
        "piecewise_linear",
        build_transfer_function,
    );
    table.register(ObjectKind::PixelOp, "tone_mapper", build_pixel_op);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        let table = builtin_table();
        assert!(matches!(
            table.create(ObjectKind::Renderer, "scivis").unwrap(),
            Payload::Renderer(_)
        ));
        assert!(matches!(
            table.create(ObjectKind::Volume, "structured_regular").unwrap(),
            Payload::Volume(_)
        ));
        assert!(matches!(
            table.create(ObjectKind::Camera, "perspective").unwrap(),
            Payload::Generic
        ));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let table = builtin_table();
        assert_eq!(
            table.create(ObjectKind::Renderer, "neon").unwrap_err(),
            SceneError::UnknownType {
                kind: ObjectKind::Renderer,
                name: "neon".into(),
            }
        );
        // The same name under a different kind is a different entry.
        assert!(!table.contains(ObjectKind::Camera, "scivis"));
    }
}
