// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Per-rank scene state.

use crate::error::SceneError;
use crate::factory::{builtin_table, FactoryTable};
use crate::module::ModuleLoader;
use crate::registry::ObjectRegistry;

/// Everything one rank knows about the scene.
///
/// There is no global state: the dispatcher owns one of these per rank, and
/// its lifetime is bounded by cluster init and finalize. The master's
/// instance holds only its mirror subset of the objects; each worker's
/// instance holds the full replica.
#[derive(Debug)]
pub struct SceneState {
    /// The handle-to-object registry.
    pub objects: ObjectRegistry,
    /// The factory table, extended by loaded modules.
    pub factories: FactoryTable,
    loader: Box<dyn ModuleLoader>,
}

impl SceneState {
    /// Creates the state with the built-in factories and the given module
    /// loader.
    pub fn new(loader: Box<dyn ModuleLoader>) -> SceneState {
        SceneState {
            objects: ObjectRegistry::new(),
            factories: builtin_table(),
            loader,
        }
    }

    /// Loads a module, extending the factory table with its registrations.
    pub fn load_module(&mut self, name: &str) -> Result<(), SceneError> {
        self.loader.load(name, &mut self.factories)
    }
}

#[cfg(test)]
mod tests {
    use lux_repr::ObjectKind;

    use super::*;
    use crate::module::StaticLoader;
    use crate::object::Payload;

    #[test]
    fn test_modules_extend_factories() {
        let mut loader = StaticLoader::new();
        loader.provide("glow", |table| {
            table.register(ObjectKind::Light, "glow", |_| Payload::Generic);
        });
        let mut state = SceneState::new(Box::new(loader));

        assert!(!state.factories.contains(ObjectKind::Light, "glow"));
        state.load_module("glow").unwrap();
        assert!(state.factories.contains(ObjectKind::Light, "glow"));
        assert!(matches!(
            state.load_module("missing").unwrap_err(),
            SceneError::ModuleNotFound { .. }
        ));
    }
}
