// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The group abstraction.

use std::fmt;
use std::sync::Arc;

use lux_wire::Envelope;
use thiserror::Error;

/// An error raised by a group operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// The peer side of the group is gone.
    #[error("group {group}: peer disconnected")]
    Disconnected {
        /// The group's name.
        group: &'static str,
    },
    /// The operation is not meaningful for this group from this rank.
    #[error("group {group}: {op} not supported from this rank")]
    Unsupported {
        /// The group's name.
        group: &'static str,
        /// The operation attempted.
        op: &'static str,
    },
}

/// The local rank's position within a group.
///
/// A rank addressing a group it is not a member of (an inter-group) has no
/// index within it; it acts as the remote root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rank {
    /// The local rank is a member of the group, at this index.
    Member(usize),
    /// The local rank addresses the group from outside.
    Root,
}

/// The transport half of a [`Group`].
///
/// Implementations must deliver broadcasts to every member in the order they
/// were broadcast, and must implement `barrier` as a collective: no
/// participant returns until all participants (including, for inter-groups,
/// the root side) have arrived.
pub trait GroupBackend: fmt::Debug + Send + Sync {
    /// Blocks until every participant has arrived.
    fn barrier(&self);

    /// Broadcasts an envelope to every member.
    fn broadcast(&self, env: Envelope) -> Result<(), CommError>;

    /// Receives the next envelope broadcast to this member.
    ///
    /// Blocks until one is available.
    fn recv(&self) -> Result<Envelope, CommError>;

    /// Releases transport resources. Called at most once, during finalize.
    fn finalize(&self) {}
}

/// A named collective of ranks.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone, Debug)]
pub struct Group {
    name: &'static str,
    rank: Rank,
    size: usize,
    backend: Arc<dyn GroupBackend>,
}

impl Group {
    /// Creates a group the local rank is a member of.
    pub fn intra(
        name: &'static str,
        rank: usize,
        size: usize,
        backend: Arc<dyn GroupBackend>,
    ) -> Group {
        assert!(rank < size, "rank {rank} out of range for size {size}");
        Group {
            name,
            rank: Rank::Member(rank),
            size,
            backend,
        }
    }

    /// Creates a group the local rank addresses from outside.
    ///
    /// `size` is the size of the remote set.
    pub fn inter(name: &'static str, size: usize, backend: Arc<dyn GroupBackend>) -> Group {
        Group {
            name,
            rank: Rank::Root,
            size,
            backend,
        }
    }

    /// The group's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The local rank's position within the group.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The number of members (for inter-groups, the remote size).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reports whether the local rank is a member.
    pub fn is_member(&self) -> bool {
        matches!(self.rank, Rank::Member(_))
    }

    /// Blocks until every participant has arrived at the barrier.
    pub fn barrier(&self) {
        self.backend.barrier();
    }

    /// Broadcasts an envelope to every member, in order.
    pub fn broadcast(&self, env: Envelope) -> Result<(), CommError> {
        self.backend.broadcast(env)
    }

    /// Receives the next envelope broadcast to this member.
    pub fn recv(&self) -> Result<Envelope, CommError> {
        self.backend.recv()
    }

    /// Releases the group's transport resources.
    pub fn finalize(&self) {
        self.backend.finalize();
    }
}
