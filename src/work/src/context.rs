// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Execution contexts handed to work units.

use lux_comm::Group;
use lux_scene::SceneState;

use crate::balancer::TiledLoadBalancer;

/// What a work unit sees when running on a worker rank.
pub struct WorkerCx<'a> {
    /// This rank's scene replica.
    pub scene: &'a mut SceneState,
    /// All ranks.
    pub world: &'a Group,
    /// The inter-group addressing the application side; barrier-bracketed
    /// units wait here.
    pub app: &'a Group,
    /// This rank's index within the worker group.
    pub rank: usize,
    /// The worker group's size.
    pub size: usize,
}

/// What a work unit sees when running on the master.
pub struct MasterCx<'a> {
    /// The master's mirror of the scene.
    pub scene: &'a mut SceneState,
    /// All ranks.
    pub world: &'a Group,
    /// The inter-group addressing the worker set; barrier-bracketed units
    /// wait here.
    pub workers: &'a Group,
    /// The installed tiled load balancer.
    pub balancer: &'a mut dyn TiledLoadBalancer,
}
