// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The replicated scene graph.
//!
//! Every rank holds its own copy of the scene: a registry mapping object
//! handles to managed objects, a factory table mapping (kind, type name) to
//! constructors, and a module loader that can extend the factory table at
//! runtime. Because the dispatcher applies the same command sequence in the
//! same order on every rank, the copies converge without any cross-rank
//! coordination beyond the command stream itself.
//!
//! Everything in this crate is single-threaded per rank: the dispatcher runs
//! work units to completion one at a time, so objects are reference-counted
//! with plain [`Rc`](std::rc::Rc) and mutated through [`RefCell`]s without
//! locking. Object lifetime *is* the reference count: the registry owns one
//! strong reference per binding, and containers (models, object-typed data
//! arrays, parameter bags) own one per contained reference.
//!
//! [`RefCell`]: std::cell::RefCell

#![warn(missing_docs)]

mod data;
mod error;
mod factory;
mod filter;
mod framebuffer;
mod model;
mod module;
mod object;
mod params;
mod pixelop;
mod registry;
mod renderer;
mod state;
mod texture;
mod transfer;
mod volume;

pub use crate::data::{DataArray, DataContents};
pub use crate::error::SceneError;
pub use crate::factory::{builtin_table, Builder, FactoryTable};
pub use crate::filter::{filter_weight, filter_width};
pub use crate::framebuffer::{FrameBufferOps, FrameBufferState, TileBuffer, TILE_SIZE};
pub use crate::model::{AccelSummary, GeometryState, ModelState};
pub use crate::module::{DynamicLoader, ModuleInitFn, ModuleLoader, StaticLoader};
pub use crate::object::{ObjectCore, ObjectRef, Payload, SceneObject};
pub use crate::params::{ParamMap, StoredParam};
pub use crate::pixelop::{PixelOpBuild, PixelOpFactory, PixelOpInstance, PixelOpState};
pub use crate::registry::ObjectRegistry;
pub use crate::renderer::{KernelHit, PickResult, RendererDerived, RendererState, SampleKernel};
pub use crate::state::SceneState;
pub use crate::texture::Texture2d;
pub use crate::transfer::{ControlPoint, TransferFunctionState};
pub use crate::volume::VolumeState;
