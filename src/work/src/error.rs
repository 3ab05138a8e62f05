// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Errors raised by work units and the dispatcher.

use lux_comm::CommError;
use lux_scene::SceneError;
use lux_wire::WireError;
use thiserror::Error;

/// The per-command byte budget for region updates.
///
/// Oversize updates are rejected at the master before anything is broadcast,
/// so worker state is untouched.
pub const REGION_BYTE_BUDGET: u64 = 2_000_000_000;

/// An error raised by a work unit or the dispatcher.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkError {
    /// A scene-graph contract violation.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// A malformed or unknown command payload.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// A transport failure.
    #[error(transparent)]
    Comm(#[from] CommError),
    /// A region update exceeded the per-command byte budget.
    #[error("region update of {bytes} bytes exceeds the {REGION_BYTE_BUDGET}-byte budget")]
    RegionTooLarge {
        /// The update's size in bytes.
        bytes: u64,
    },
}
