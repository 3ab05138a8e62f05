// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Parameter bags.

use std::collections::BTreeMap;

use bytes::Bytes;
use lux_repr::{ParamValue, Vec2f, Vec2i, Vec3f, Vec3i, Vec4f};

use crate::error::SceneError;
use crate::object::ObjectRef;
use crate::registry::ObjectRegistry;

/// A parameter value as stored on a managed object.
///
/// This is [`ParamValue`] with the object variant resolved: the wire carries
/// handles, the bag holds a strong reference (or `None` for an explicit null
/// handle). The reference keeps its target alive for as long as the
/// parameter is set.
#[derive(Clone, Debug)]
pub enum StoredParam {
    /// A 32-bit signed integer.
    Int(i32),
    /// A float.
    Float(f32),
    /// A 2-element float vector.
    Vec2f(Vec2f),
    /// A 3-element float vector.
    Vec3f(Vec3f),
    /// A 4-element float vector.
    Vec4f(Vec4f),
    /// A 2-element integer vector.
    Vec2i(Vec2i),
    /// A 3-element integer vector.
    Vec3i(Vec3i),
    /// A UTF-8 string.
    String(String),
    /// A resolved object reference; `None` records an explicit null.
    Object(Option<ObjectRef>),
    /// An opaque byte buffer.
    Buffer(Bytes),
}

impl StoredParam {
    /// Resolves a wire-level parameter value against the rank's registry.
    ///
    /// A non-null object handle that is undefined on this rank is an error;
    /// the command stream guarantees the referenced object was created first.
    pub fn resolve(value: ParamValue, objects: &ObjectRegistry) -> Result<StoredParam, SceneError> {
        let stored = match value {
            ParamValue::Int(v) => StoredParam::Int(v),
            ParamValue::Float(v) => StoredParam::Float(v),
            ParamValue::Vec2f(v) => StoredParam::Vec2f(v),
            ParamValue::Vec3f(v) => StoredParam::Vec3f(v),
            ParamValue::Vec4f(v) => StoredParam::Vec4f(v),
            ParamValue::Vec2i(v) => StoredParam::Vec2i(v),
            ParamValue::Vec3i(v) => StoredParam::Vec3i(v),
            ParamValue::String(v) => StoredParam::String(v),
            ParamValue::Object(h) if h.is_null() => StoredParam::Object(None),
            ParamValue::Object(h) => {
                let object = objects
                    .lookup(h)
                    .cloned()
                    .ok_or(SceneError::MissingObject(h))?;
                StoredParam::Object(Some(object))
            }
            ParamValue::Buffer(v) => StoredParam::Buffer(v),
        };
        Ok(stored)
    }
}

/// A mapping from parameter name to stored value.
///
/// Unknown names set silently; readers apply their own defaults. Typed
/// getters return `None` on both a missing name and a type mismatch, which
/// is what lets `backgroundColor` be supplied as a float, a vec3, or a vec4.
#[derive(Clone, Debug, Default)]
pub struct ParamMap {
    values: BTreeMap<String, StoredParam>,
}

impl ParamMap {
    /// Creates an empty bag.
    pub fn new() -> ParamMap {
        ParamMap::default()
    }

    /// Sets a parameter, replacing any previous value under the name.
    pub fn set(&mut self, name: impl Into<String>, value: StoredParam) {
        self.values.insert(name.into(), value);
    }

    /// Removes a parameter. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    /// Returns the raw stored value, if present.
    pub fn get(&self, name: &str) -> Option<&StoredParam> {
        self.values.get(name)
    }

    /// The number of parameters set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an integer parameter.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(StoredParam::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a float parameter.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(StoredParam::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a 2-element float vector parameter.
    pub fn get_vec2f(&self, name: &str) -> Option<Vec2f> {
        match self.get(name) {
            Some(StoredParam::Vec2f(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a 3-element float vector parameter.
    pub fn get_vec3f(&self, name: &str) -> Option<Vec3f> {
        match self.get(name) {
            Some(StoredParam::Vec3f(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a 4-element float vector parameter.
    pub fn get_vec4f(&self, name: &str) -> Option<Vec4f> {
        match self.get(name) {
            Some(StoredParam::Vec4f(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a 2-element integer vector parameter.
    pub fn get_vec2i(&self, name: &str) -> Option<Vec2i> {
        match self.get(name) {
            Some(StoredParam::Vec2i(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a 3-element integer vector parameter.
    pub fn get_vec3i(&self, name: &str) -> Option<Vec3i> {
        match self.get(name) {
            Some(StoredParam::Vec3i(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns a string parameter.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(StoredParam::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns a non-null object parameter.
    pub fn get_object(&self, name: &str) -> Option<&ObjectRef> {
        match self.get(name) {
            Some(StoredParam::Object(Some(v))) => Some(v),
            _ => None,
        }
    }

    /// Returns a buffer parameter.
    pub fn get_buffer(&self, name: &str) -> Option<&Bytes> {
        match self.get(name) {
            Some(StoredParam::Buffer(v)) => Some(v),
            _ => None,
        }
    }
}
