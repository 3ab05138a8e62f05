// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Errors raised by scene-graph operations.
//!
//! All of these are programmer-contract or environment failures per the
//! protocol's error taxonomy: the dispatcher does not catch them, and because
//! every rank applies the same command stream, a contract violation aborts
//! deterministically on every rank.

use lux_repr::{ElementKind, ObjectHandle, ObjectKind, Vec2i, Vec3i};
use thiserror::Error;

/// An error raised by a scene-graph operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The null handle was used where an object was required.
    #[error("null handle")]
    NullHandle,
    /// No object is bound to the handle on this rank.
    #[error("no object bound to {0}")]
    MissingObject(ObjectHandle),
    /// The handle resolved to an object of the wrong kind.
    #[error("{handle} is a {found}, expected a {expected}")]
    WrongKind {
        /// The offending handle.
        handle: ObjectHandle,
        /// The kind the operation required.
        expected: ObjectKind,
        /// The kind actually bound.
        found: ObjectKind,
    },
    /// No factory is registered for the requested type name.
    #[error("no registered {kind} type named {name:?}")]
    UnknownType {
        /// The object kind requested.
        kind: ObjectKind,
        /// The type name requested.
        name: String,
    },
    /// Framebuffer or texture dimensions were not strictly positive.
    #[error("dimensions must be positive, got ({}, {})", .0.x, .0.y)]
    InvalidDimensions(Vec2i),
    /// A texture payload did not match its dimensions and format.
    #[error("texture payload is {got} bytes, expected {expected}")]
    TexelCountMismatch {
        /// The byte count the dimensions and format imply.
        expected: usize,
        /// The byte count supplied.
        got: usize,
    },
    /// String-typed data arrays cannot be broadcast.
    #[error("string-typed data arrays cannot be broadcast")]
    StringDataDisallowed,
    /// A data payload did not match its element count and kind.
    #[error("data payload is {got} bytes, expected {expected}")]
    DataSizeMismatch {
        /// The byte count the element count and kind imply.
        expected: usize,
        /// The byte count supplied.
        got: usize,
    },
    /// A region update arrived before the volume's dimensions were committed.
    #[error("volume has no committed dimensions")]
    VolumeNotCommitted,
    /// A region extent was not strictly positive.
    #[error("region extent ({}, {}, {}) is not positive", .0.x, .0.y, .0.z)]
    InvalidExtent(Vec3i),
    /// A region update fell outside the volume.
    #[error(
        "region at ({}, {}, {}) with extent ({}, {}, {}) exceeds volume dimensions \
         ({}, {}, {})",
        start.x, start.y, start.z, extent.x, extent.y, extent.z, dims.x, dims.y, dims.z
    )]
    RegionOutOfBounds {
        /// The region origin.
        start: Vec3i,
        /// The region extent.
        extent: Vec3i,
        /// The volume's committed dimensions.
        dims: Vec3i,
    },
    /// A region update's element kind disagreed with earlier updates.
    #[error("region element kind {got} does not match volume element kind {expected}")]
    ElementKindMismatch {
        /// The volume's element kind.
        expected: ElementKind,
        /// The update's element kind.
        got: ElementKind,
    },
    /// A module's shared library could not be found or opened.
    #[error("could not load module {name:?}")]
    ModuleNotFound {
        /// The module name.
        name: String,
    },
    /// A module library loaded but its initializer symbol is missing.
    #[error("missing module initializer {symbol:?}")]
    MissingInitSymbol {
        /// The expected symbol name.
        symbol: String,
    },
    /// Dynamic loading is unavailable on this platform.
    #[error("dynamic module loading is not supported on this platform")]
    DynamicLoadingUnsupported,
}
