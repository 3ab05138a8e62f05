// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Group abstraction and in-process communication fabric.
//!
//! The dispatch core sees the transport through exactly one lens: a
//! [`Group`], an ordered set of ranks offering a barrier, an ordered
//! broadcast, and (on the receiving side) an ordered receive. Three groups,
//! named `world`, `app`, and `worker`, are wired during bootstrap in the
//! classic master/worker topology: the master addresses the worker set
//! through an inter-group, each worker addresses the master through its own
//! inter-group, and everyone shares `world`.
//!
//! The [`Switchboard`](switchboard::Switchboard) in this crate is the
//! in-process realization of that topology: one OS thread per rank, channels
//! for ordered delivery, and shared barriers for the collectives. Cluster
//! membership is fixed at construction; there is no rendezvous, reconnection,
//! or dynamic join. Embedders with a real message-passing transport implement
//! [`GroupBackend`](group::GroupBackend) instead and never touch the
//! switchboard.

#![warn(missing_docs)]

pub mod group;
pub mod switchboard;

pub use crate::group::{CommError, Group, GroupBackend, Rank};
pub use crate::switchboard::{RankGroups, Switchboard, SwitchboardConfig};
