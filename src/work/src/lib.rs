// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Work units, the command registry, and the dispatcher.
//!
//! Every state transition of the replicated scene travels as a *work unit*:
//! a plain struct with four operations (encode, decode, a worker-side
//! `run`, and a master-side `run_on_master`). The master façade
//! ([`MasterDevice`]) mints handles, broadcasts each unit tagged with its
//! stable registration tag, and runs the master body; each worker's serve
//! loop ([`Worker`]) decodes and runs units strictly one at a time, so the
//! scene evolves deterministically from the command sequence alone.
//!
//! Errors do not round-trip to the application: a failed unit surfaces at
//! the dispatcher boundary and the intended outcome is a terminated rank
//! with a diagnostic. Because all ranks see the same stream, a
//! contract-violating command fails on every rank, not just one.

#![warn(missing_docs)]

mod balancer;
mod context;
mod error;
mod master;
mod registry;
mod units;
mod worker;

pub use crate::balancer::{LocalGatherBalancer, TiledLoadBalancer};
pub use crate::context::{MasterCx, WorkerCx};
pub use crate::error::{WorkError, REGION_BYTE_BUDGET};
pub use crate::master::{DeviceConfig, MasterDevice};
pub use crate::registry::{core_registry, tags, WorkRegistry};
pub use crate::units::{Step, Work, WorkDecode};
pub use crate::units::{
    AddGeometry, AddVolume, ClearFrameBuffer, CommandFinalize, CommandRelease, CommitObject,
    CreateFrameBuffer, LoadModule, NewCamera, NewData, NewGeometry, NewLight, NewMaterial,
    NewModel, NewPixelOp, NewRenderer, NewTexture2d, NewTransferFunction, NewVolume,
    RemoveGeometry, RemoveParam, RemoveVolume, RenderFrame, SetMaterial, SetParam, SetPixelOp,
    SetRegion,
};
pub use crate::worker::Worker;
