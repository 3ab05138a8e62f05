// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Data arrays.

use bytes::Bytes;
use lux_ore::cast::CastFrom;
use lux_repr::{ElementKind, ObjectHandle};

use crate::error::SceneError;
use crate::object::ObjectRef;
use crate::registry::ObjectRegistry;

/// The contents of a data array.
#[derive(Debug)]
pub enum DataContents {
    /// Raw element bytes. On workers this buffer is always owned by the
    /// array; on the master it may share the application's allocation.
    Raw(Bytes),
    /// Resolved object references, for object element kinds after
    /// deserialization. Each `Some` holds a strong reference that keeps its
    /// target alive at least as long as the array.
    Objects(Vec<Option<ObjectRef>>),
}

/// A data array: an element count, an element kind, and contents.
#[derive(Debug)]
pub struct DataArray {
    len: usize,
    kind: ElementKind,
    contents: DataContents,
}

impl DataArray {
    /// Creates an array over raw element bytes.
    ///
    /// An empty payload yields a zero-length array regardless of the claimed
    /// count; otherwise the payload must match `len` elements of `kind`
    /// exactly.
    pub fn from_raw(len: u64, kind: ElementKind, bytes: Bytes) -> Result<DataArray, SceneError> {
        let elem_size = kind.size_of().ok_or(SceneError::StringDataDisallowed)?;
        if bytes.is_empty() {
            return Ok(DataArray {
                len: 0,
                kind,
                contents: DataContents::Raw(bytes),
            });
        }
        let len = usize::cast_from(len);
        let expected = len * elem_size;
        if bytes.len() != expected {
            return Err(SceneError::DataSizeMismatch {
                expected,
                got: bytes.len(),
            });
        }
        Ok(DataArray {
            len,
            kind,
            contents: DataContents::Raw(bytes),
        })
    }

    /// Creates an array of object references by translating a payload of
    /// handles against the rank's registry.
    ///
    /// Each non-null handle must be defined; its target's refcount rises by
    /// one. A zero-length payload resolves to a zero-length array.
    pub fn resolve_objects(
        len: u64,
        kind: ElementKind,
        bytes: Bytes,
        objects: &ObjectRegistry,
    ) -> Result<DataArray, SceneError> {
        debug_assert!(kind.object_kind().is_some());
        if bytes.is_empty() {
            return Ok(DataArray {
                len: 0,
                kind,
                contents: DataContents::Objects(Vec::new()),
            });
        }
        let len = usize::cast_from(len);
        let expected = len * 8;
        if bytes.len() != expected {
            return Err(SceneError::DataSizeMismatch {
                expected,
                got: bytes.len(),
            });
        }
        let mut resolved = Vec::with_capacity(len);
        for chunk in bytes.chunks_exact(8) {
            let handle = ObjectHandle(u64::from_le_bytes(chunk.try_into().expect("8-byte chunk")));
            if handle.is_null() {
                resolved.push(None);
            } else {
                let object = objects
                    .lookup(handle)
                    .cloned()
                    .ok_or(SceneError::MissingObject(handle))?;
                resolved.push(Some(object));
            }
        }
        Ok(DataArray {
            len,
            kind,
            contents: DataContents::Objects(resolved),
        })
    }

    /// The number of logical elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The raw bytes, for non-object arrays.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.contents {
            DataContents::Raw(bytes) => Some(bytes),
            DataContents::Objects(_) => None,
        }
    }

    /// The resolved references, for object arrays.
    pub fn objects(&self) -> Option<&[Option<ObjectRef>]> {
        match &self.contents {
            DataContents::Raw(_) => None,
            DataContents::Objects(refs) => Some(refs),
        }
    }
}
