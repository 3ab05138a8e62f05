// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The per-rank object registry.

use std::collections::BTreeMap;

use lux_repr::{ObjectHandle, ObjectKind};
use tracing::error;

use crate::error::SceneError;
use crate::object::ObjectRef;

/// The per-rank mapping from handle to managed object.
///
/// A handle is *defined* while bound here. The registry owns one strong
/// reference per binding; [`free`](ObjectRegistry::free) releases it, and the
/// object is destroyed if that was the last reference anywhere.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: BTreeMap<ObjectHandle, ObjectRef>,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> ObjectRegistry {
        ObjectRegistry::default()
    }

    /// Binds `handle` to `object`, transferring one strong reference into
    /// the registry.
    ///
    /// The master never mints the same handle twice, so a rebind means the
    /// command stream diverged somewhere; it is logged and the newer binding
    /// wins.
    pub fn assign(&mut self, handle: ObjectHandle, object: ObjectRef) -> Result<(), SceneError> {
        if handle.is_null() {
            return Err(SceneError::NullHandle);
        }
        if self.entries.insert(handle, object).is_some() {
            error!(%handle, "handle rebound while still defined");
        }
        Ok(())
    }

    /// Returns the object bound to `handle`, without affecting its refcount.
    pub fn lookup(&self, handle: ObjectHandle) -> Option<&ObjectRef> {
        self.entries.get(&handle)
    }

    /// Returns the object bound to `handle`, or the contract error naming
    /// what went wrong.
    pub fn expect(&self, handle: ObjectHandle) -> Result<&ObjectRef, SceneError> {
        if handle.is_null() {
            return Err(SceneError::NullHandle);
        }
        self.lookup(handle).ok_or(SceneError::MissingObject(handle))
    }

    /// Like [`expect`](ObjectRegistry::expect), but additionally requires
    /// the bound object to be of the given kind.
    pub fn expect_kind(
        &self,
        handle: ObjectHandle,
        kind: ObjectKind,
    ) -> Result<&ObjectRef, SceneError> {
        let object = self.expect(handle)?;
        if object.kind() != kind {
            return Err(SceneError::WrongKind {
                handle,
                expected: kind,
                found: object.kind(),
            });
        }
        Ok(object)
    }

    /// Releases the registry's reference, destroying the object if that was
    /// the last one. The handle becomes undefined.
    pub fn free(&mut self, handle: ObjectHandle) -> Result<(), SceneError> {
        if handle.is_null() {
            return Err(SceneError::NullHandle);
        }
        self.entries
            .remove(&handle)
            .map(|_| ())
            .ok_or(SceneError::MissingObject(handle))
    }

    /// Releases the registry's reference if the handle is defined.
    ///
    /// The master-side release path uses this: handles for objects the
    /// master never mirrors are simply not defined there.
    pub fn free_if_defined(&mut self, handle: ObjectHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Reports whether `handle` is bound.
    pub fn defined(&self, handle: ObjectHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// The number of defined handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no handles are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::object::{Payload, SceneObject};

    #[test]
    fn test_assign_lookup_free() {
        let mut registry = ObjectRegistry::new();
        let h = ObjectHandle(1);
        let obj = SceneObject::new(ObjectKind::Geometry, "spheres", Payload::Generic);
        let external = Rc::clone(&obj);

        registry.assign(h, obj).unwrap();
        assert!(registry.defined(h));
        assert!(Rc::ptr_eq(registry.lookup(h).unwrap(), &external));
        assert_eq!(Rc::strong_count(&external), 2);

        registry.free(h).unwrap();
        assert!(!registry.defined(h));
        assert!(registry.lookup(h).is_none());
        // The registry's reference is gone; only the external one remains.
        assert_eq!(Rc::strong_count(&external), 1);
    }

    #[test]
    fn test_null_handle_is_rejected() {
        let mut registry = ObjectRegistry::new();
        let obj = SceneObject::new(ObjectKind::Geometry, "spheres", Payload::Generic);
        assert_eq!(
            registry.assign(ObjectHandle::NULL, obj),
            Err(SceneError::NullHandle)
        );
        assert_eq!(registry.free(ObjectHandle::NULL), Err(SceneError::NullHandle));
        assert_eq!(
            registry.expect(ObjectHandle::NULL).unwrap_err(),
            SceneError::NullHandle
        );
    }

    #[test]
    fn test_free_undefined_handle_is_an_error() {
        let mut registry = ObjectRegistry::new();
        assert_eq!(
            registry.free(ObjectHandle(7)),
            Err(SceneError::MissingObject(ObjectHandle(7)))
        );
        assert!(!registry.free_if_defined(ObjectHandle(7)));
    }

    #[test]
    fn test_expect_kind() {
        let mut registry = ObjectRegistry::new();
        let h = ObjectHandle(1);
        let obj = SceneObject::new(ObjectKind::Geometry, "spheres", Payload::Generic);
        registry.assign(h, obj).unwrap();

        assert!(registry.expect_kind(h, ObjectKind::Geometry).is_ok());
        assert_eq!(
            registry.expect_kind(h, ObjectKind::Material).unwrap_err(),
            SceneError::WrongKind {
                handle: h,
                expected: ObjectKind::Material,
                found: ObjectKind::Geometry,
            }
        );
    }
}
