// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Module loading.
//!
//! A module is a shared library named `lux_module_<name>` exposing a single
//! C-ABI entry point `lux_init_module_<name>`, which registers the module's
//! factories and returns. The unsafe symbol-resolution step is confined to
//! [`DynamicLoader`]; everything else, including tests and embedders that
//! link their modules statically, goes through [`StaticLoader`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use crate::error::SceneError;
use crate::factory::FactoryTable;

/// The C-ABI signature of a module's entry point.
///
/// The entry point receives the loading rank's factory table and performs
/// its registrations before returning. Modules must be built against the
/// same crate versions as the host binary.
pub type ModuleInitFn = unsafe extern "C" fn(table: *mut FactoryTable);

/// Loads named modules into a factory table.
pub trait ModuleLoader: fmt::Debug {
    /// Loads the module, running its initializer against `table`.
    fn load(&self, name: &str, table: &mut FactoryTable) -> Result<(), SceneError>;
}

/// A loader backed by a table of statically linked initializers.
#[derive(Default)]
pub struct StaticLoader {
    modules: BTreeMap<String, fn(&mut FactoryTable)>,
}

impl StaticLoader {
    /// Creates an empty loader.
    pub fn new() -> StaticLoader {
        StaticLoader::default()
    }

    /// Makes a module available under `name`.
    pub fn provide(&mut self, name: impl Into<String>, init: fn(&mut FactoryTable)) {
        self.modules.insert(name.into(), init);
    }
}

impl fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StaticLoader")
            .field("modules", &self.modules.keys())
            .finish()
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, name: &str, table: &mut FactoryTable) -> Result<(), SceneError> {
        let init = self
            .modules
            .get(name)
            .ok_or_else(|| SceneError::ModuleNotFound {
                name: name.to_owned(),
            })?;
        info!(name, "initializing static module");
        init(table);
        Ok(())
    }
}

/// A loader that resolves modules from shared libraries at runtime.
#[derive(Debug, Default)]
pub struct DynamicLoader;

#[cfg(unix)]
mod dl {
    use std::ffi::{c_char, c_int, c_void};

    pub const RTLD_NOW: c_int = 0x2;
    pub const RTLD_GLOBAL: c_int = 0x100;

    extern "C" {
        pub fn dlopen(filename: *const c_char, flags: c_int) -> *mut c_void;
        pub fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
    }
}

#[cfg(unix)]
impl ModuleLoader for DynamicLoader {
    fn load(&self, name: &str, table: &mut FactoryTable) -> Result<(), SceneError> {
        use std::ffi::CString;

        let library = format!("liblux_module_{name}.so");
        let symbol = format!("lux_init_module_{name}");
        let c_library = CString::new(library.clone()).map_err(|_| SceneError::ModuleNotFound {
            name: name.to_owned(),
        })?;
        let c_symbol = CString::new(symbol.clone()).expect("no interior NUL");

        // Handles are intentionally never closed: a loaded module's factory
        // registrations reference its code for the life of the process.
        let handle = unsafe { dl::dlopen(c_library.as_ptr(), dl::RTLD_NOW | dl::RTLD_GLOBAL) };
        if handle.is_null() {
            return Err(SceneError::ModuleNotFound {
                name: name.to_owned(),
            });
        }
        let init = unsafe { dl::dlsym(handle, c_symbol.as_ptr()) };
        if init.is_null() {
            return Err(SceneError::MissingInitSymbol { symbol });
        }
        info!(name, library, "initializing dynamic module");
        let init: ModuleInitFn = unsafe { std::mem::transmute(init) };
        unsafe { init(table) };
        Ok(())
    }
}

#[cfg(not(unix))]
impl ModuleLoader for DynamicLoader {
    fn load(&self, _name: &str, _table: &mut FactoryTable) -> Result<(), SceneError> {
        Err(SceneError::DynamicLoadingUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use lux_repr::ObjectKind;

    use super::*;
    use crate::object::Payload;

    fn init_neon(table: &mut FactoryTable) {
        table.register(ObjectKind::Renderer, "neon", |_| Payload::Generic);
    }

    #[test]
    fn test_static_loader_registers_factories() {
        let mut loader = StaticLoader::new();
        loader.provide("neon", init_neon);

        let mut table = FactoryTable::new();
        loader.load("neon", &mut table).unwrap();
        assert!(table.contains(ObjectKind::Renderer, "neon"));
    }

    #[test]
    fn test_missing_module_is_an_error() {
        let loader = StaticLoader::new();
        let mut table = FactoryTable::new();
        assert_eq!(
            loader.load("ghost", &mut table).unwrap_err(),
            SceneError::ModuleNotFound {
                name: "ghost".into(),
            }
        );
    }
}
