// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The work-unit catalogue.
//!
//! Units are plain data structs. Their four operations ([`Work::encode`],
//! [`WorkDecode::decode`], [`Work::run`], and [`Work::run_on_master`]) are
//! the entire protocol surface; the dispatcher treats every unit uniformly
//! through the registry.

use std::fmt;

use lux_wire::{ReadStream, WireError, WriteStream};

use crate::context::{MasterCx, WorkerCx};
use crate::error::WorkError;

mod create;
mod lifecycle;
mod mutate;

pub use create::{
    CreateFrameBuffer, NewCamera, NewData, NewGeometry, NewLight, NewMaterial, NewModel,
    NewPixelOp, NewRenderer, NewTexture2d, NewTransferFunction, NewVolume,
};
pub use lifecycle::{
    ClearFrameBuffer, CommandFinalize, CommandRelease, CommitObject, LoadModule, RenderFrame,
};
pub use mutate::{
    AddGeometry, AddVolume, RemoveGeometry, RemoveParam, RemoveVolume, SetMaterial, SetParam,
    SetPixelOp, SetRegion,
};

/// What the worker serve loop does after a unit completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep dispatching.
    Continue,
    /// Finalize: the loop returns and the rank winds down.
    Shutdown,
}

/// A serializable command with master-side and worker-side execution bodies.
pub trait Work: fmt::Debug {
    /// The unit's stable command tag.
    fn tag(&self) -> u32;

    /// Appends the unit's payload to a stream.
    fn encode(&self, w: &mut WriteStream);

    /// Executes the unit on a worker rank.
    fn run(&mut self, cx: &mut WorkerCx<'_>) -> Result<Step, WorkError>;

    /// Executes the unit's master-side body. The default does nothing:
    /// most mutation units touch worker state only.
    fn run_on_master(&mut self, _cx: &mut MasterCx<'_>) -> Result<(), WorkError> {
        Ok(())
    }
}

/// A work unit the registry can materialize from a stream.
pub trait WorkDecode: Work + Sized {
    /// The unit's stable command tag.
    const TAG: u32;

    /// Consumes the unit's payload from a stream.
    fn decode(r: &mut ReadStream) -> Result<Self, WireError>;
}

#[cfg(test)]
pub(crate) mod testutil {
    use lux_comm::{RankGroups, Switchboard, SwitchboardConfig};
    use lux_scene::{SceneState, StaticLoader};

    use super::*;
    use crate::balancer::LocalGatherBalancer;

    /// Asserts `decode(encode(unit)) == unit`, field by field.
    pub(crate) fn assert_round_trip<W>(unit: &W)
    where
        W: WorkDecode + PartialEq,
    {
        let mut w = WriteStream::new();
        unit.encode(&mut w);
        let mut r = ReadStream::new(w.finish());
        let decoded = W::decode(&mut r).unwrap();
        assert_eq!(&decoded, unit);
        assert_eq!(r.remaining(), 0, "trailing bytes after decode");
    }

    /// A single-worker rank with empty scene state, for unit tests that do
    /// not cross a barrier.
    pub(crate) struct WorkerFixture {
        pub scene: SceneState,
        groups: RankGroups,
        _master: RankGroups,
    }

    impl WorkerFixture {
        pub fn new() -> WorkerFixture {
            let (master, mut workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 1 });
            WorkerFixture {
                scene: SceneState::new(Box::new(StaticLoader::new())),
                groups: workers.remove(0),
                _master: master,
            }
        }

        pub fn cx(&mut self) -> WorkerCx<'_> {
            WorkerCx {
                scene: &mut self.scene,
                world: &self.groups.world,
                app: &self.groups.app,
                rank: 0,
                size: 1,
            }
        }
    }

    /// A master rank with empty mirror state, for unit tests that do not
    /// cross a barrier.
    pub(crate) struct MasterFixture {
        pub scene: SceneState,
        groups: RankGroups,
        balancer: LocalGatherBalancer,
        _workers: Vec<RankGroups>,
    }

    impl MasterFixture {
        pub fn new() -> MasterFixture {
            let (master, workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 1 });
            MasterFixture {
                scene: SceneState::new(Box::new(StaticLoader::new())),
                groups: master,
                balancer: LocalGatherBalancer,
                _workers: workers,
            }
        }

        pub fn cx(&mut self) -> MasterCx<'_> {
            MasterCx {
                scene: &mut self.scene,
                world: &self.groups.world,
                workers: &self.groups.worker,
                balancer: &mut self.balancer,
            }
        }
    }
}
