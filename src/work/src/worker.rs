// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The worker-side serve loop.

use lux_comm::{Rank, RankGroups};
use lux_scene::{DynamicLoader, ModuleLoader, SceneState};
use tracing::{debug, error, info};

use crate::context::WorkerCx;
use crate::registry::{core_registry, WorkRegistry};
use crate::units::{Step, Work};

/// One worker rank: a scene replica and the serve loop that applies the
/// command stream to it.
#[derive(Debug)]
pub struct Worker {
    scene: SceneState,
    groups: RankGroups,
    registry: WorkRegistry,
    rank: usize,
}

impl Worker {
    /// Creates a worker rank with the default dynamic module loader.
    pub fn new(groups: RankGroups) -> Worker {
        Worker::with_loader(groups, Box::new(DynamicLoader))
    }

    /// Creates a worker rank with the given module loader.
    pub fn with_loader(groups: RankGroups, loader: Box<dyn ModuleLoader>) -> Worker {
        let rank = match groups.worker.rank() {
            Rank::Member(rank) => rank,
            Rank::Root => unreachable!("a worker is always a member of the worker group"),
        };
        Worker {
            scene: SceneState::new(loader),
            groups,
            registry: core_registry(),
            rank,
        }
    }

    /// This rank's index within the worker group.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// This rank's scene replica, for post-run inspection.
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// Receives, decodes, and runs work units until finalize.
    ///
    /// Units run strictly one at a time; the loop never overlaps two units.
    /// Any error is fatal for the rank: it is logged and returned, and the
    /// intended reaction is process exit with the diagnostic. Because every
    /// rank applies the same stream, a failing command fails everywhere.
    pub fn run(&mut self) -> Result<(), anyhow::Error> {
        info!(rank = self.rank, "worker serving");
        loop {
            let env = self.groups.app.recv()?;
            let mut unit: Box<dyn Work> = match self.registry.decode(&env) {
                Ok(unit) => unit,
                Err(err) => {
                    error!(rank = self.rank, tag = env.tag, %err, "undecodable command");
                    return Err(err.into());
                }
            };
            debug!(rank = self.rank, tag = env.tag, ?unit, "running work unit");
            let mut cx = WorkerCx {
                scene: &mut self.scene,
                world: &self.groups.world,
                app: &self.groups.app,
                rank: self.rank,
                size: self.groups.worker.size(),
            };
            match unit.run(&mut cx) {
                Ok(Step::Continue) => {}
                Ok(Step::Shutdown) => {
                    info!(rank = self.rank, "worker shut down");
                    return Ok(());
                }
                Err(err) => {
                    error!(rank = self.rank, tag = env.tag, %err, "work unit failed");
                    return Err(err.into());
                }
            }
        }
    }
}
