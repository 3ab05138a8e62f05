// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! In-process realization of the master/worker group topology.
//!
//! One OS thread per rank. Command delivery rides crossbeam channels, which
//! preserve per-receiver FIFO order, so every worker observes broadcasts in
//! the order the master issued them. Collectives are [`std::sync::Barrier`]s
//! shared between the participating ranks; the inter-group barrier between
//! master and workers is one barrier sized for both sides, so the master's
//! `worker.barrier()` rendezvouses with the workers' `app.barrier()`.

use std::sync::{Arc, Barrier};

use crossbeam_channel::{Receiver, Sender};
use lux_wire::Envelope;
use tracing::debug;

use crate::group::{CommError, Group, GroupBackend};

/// Configuration for an in-process cluster.
#[derive(Clone, Copy, Debug)]
pub struct SwitchboardConfig {
    /// The number of worker ranks. Must be at least one.
    pub workers: usize,
}

/// The three canonical groups, from one rank's point of view.
#[derive(Clone, Debug)]
pub struct RankGroups {
    /// All ranks: the master and every worker.
    pub world: Group,
    /// The application side. On the master this is an intra-group of the
    /// application peers; on a worker it is the inter-group addressing them.
    pub app: Group,
    /// The worker set. On the master this is the inter-group addressing all
    /// workers; on a worker it is the intra-group of its peers.
    pub worker: Group,
}

/// Builder for in-process clusters.
#[derive(Debug)]
pub struct Switchboard;

impl Switchboard {
    /// Wires up the groups for one master and `config.workers` worker ranks.
    ///
    /// Returns the master's groups and one [`RankGroups`] per worker, in rank
    /// order. The caller moves each worker's groups onto its own thread.
    pub fn bootstrap(config: SwitchboardConfig) -> (RankGroups, Vec<RankGroups>) {
        let workers = config.workers;
        assert!(workers > 0, "a cluster requires at least one worker");

        let world_size = workers + 1;
        let world_barrier = Arc::new(Barrier::new(world_size));
        let cross_barrier = Arc::new(Barrier::new(world_size));
        let worker_barrier = Arc::new(Barrier::new(workers));

        let (txs, rxs): (Vec<_>, Vec<_>) = (0..workers)
            .map(|_| crossbeam_channel::unbounded::<Envelope>())
            .unzip();

        let master = RankGroups {
            world: Group::intra(
                "world",
                0,
                world_size,
                Arc::new(BarrierOnly {
                    name: "world",
                    barrier: Arc::clone(&world_barrier),
                }),
            ),
            app: Group::intra(
                "app",
                0,
                1,
                Arc::new(BarrierOnly {
                    name: "app",
                    barrier: Arc::new(Barrier::new(1)),
                }),
            ),
            worker: Group::inter(
                "worker",
                workers,
                Arc::new(Fanout {
                    barrier: Arc::clone(&cross_barrier),
                    txs,
                }),
            ),
        };

        let worker_groups = rxs
            .into_iter()
            .enumerate()
            .map(|(index, rx)| RankGroups {
                world: Group::intra(
                    "world",
                    index + 1,
                    world_size,
                    Arc::new(BarrierOnly {
                        name: "world",
                        barrier: Arc::clone(&world_barrier),
                    }),
                ),
                app: Group::inter(
                    "app",
                    1,
                    Arc::new(Inbox {
                        barrier: Arc::clone(&cross_barrier),
                        rx,
                    }),
                ),
                worker: Group::intra(
                    "worker",
                    index,
                    workers,
                    Arc::new(BarrierOnly {
                        name: "worker",
                        barrier: Arc::clone(&worker_barrier),
                    }),
                ),
            })
            .collect();

        (master, worker_groups)
    }
}

/// A backend supporting only the barrier collective.
#[derive(Debug)]
struct BarrierOnly {
    name: &'static str,
    barrier: Arc<Barrier>,
}

impl GroupBackend for BarrierOnly {
    fn barrier(&self) {
        self.barrier.wait();
    }

    fn broadcast(&self, _env: Envelope) -> Result<(), CommError> {
        Err(CommError::Unsupported {
            group: self.name,
            op: "broadcast",
        })
    }

    fn recv(&self) -> Result<Envelope, CommError> {
        Err(CommError::Unsupported {
            group: self.name,
            op: "recv",
        })
    }

    fn finalize(&self) {
        debug!(group = self.name, "finalizing group");
    }
}

/// The master's view of the worker set: broadcast fans out to one channel per
/// worker, in rank order.
#[derive(Debug)]
struct Fanout {
    barrier: Arc<Barrier>,
    txs: Vec<Sender<Envelope>>,
}

impl GroupBackend for Fanout {
    fn barrier(&self) {
        self.barrier.wait();
    }

    fn broadcast(&self, env: Envelope) -> Result<(), CommError> {
        for tx in &self.txs {
            tx.send(env.clone())
                .map_err(|_| CommError::Disconnected { group: "worker" })?;
        }
        Ok(())
    }

    fn recv(&self) -> Result<Envelope, CommError> {
        Err(CommError::Unsupported {
            group: "worker",
            op: "recv",
        })
    }

    fn finalize(&self) {
        debug!(group = "worker", "finalizing group");
    }
}

/// A worker's view of the application side: an ordered inbox of broadcasts.
#[derive(Debug)]
struct Inbox {
    barrier: Arc<Barrier>,
    rx: Receiver<Envelope>,
}

impl GroupBackend for Inbox {
    fn barrier(&self) {
        self.barrier.wait();
    }

    fn broadcast(&self, _env: Envelope) -> Result<(), CommError> {
        Err(CommError::Unsupported {
            group: "app",
            op: "broadcast",
        })
    }

    fn recv(&self) -> Result<Envelope, CommError> {
        self.rx
            .recv()
            .map_err(|_| CommError::Disconnected { group: "app" })
    }

    fn finalize(&self) {
        debug!(group = "app", "finalizing group");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use lux_wire::WriteStream;

    use super::*;
    use crate::group::Rank;

    fn envelope(tag: u32) -> Envelope {
        Envelope::new(tag, WriteStream::new())
    }

    #[test]
    fn test_topology() {
        let (master, workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 3 });

        assert_eq!(master.world.rank(), Rank::Member(0));
        assert_eq!(master.world.size(), 4);
        assert_eq!(master.worker.rank(), Rank::Root);
        assert_eq!(master.worker.size(), 3);
        assert!(master.app.is_member());

        for (index, w) in workers.iter().enumerate() {
            assert_eq!(w.world.rank(), Rank::Member(index + 1));
            assert_eq!(w.app.rank(), Rank::Root);
            assert_eq!(w.app.size(), 1);
            assert_eq!(w.worker.rank(), Rank::Member(index));
            assert_eq!(w.worker.size(), 3);
        }
    }

    #[test]
    fn test_broadcast_preserves_order() {
        let (master, workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 2 });

        for tag in 0..100 {
            master.worker.broadcast(envelope(tag)).unwrap();
        }

        let threads: Vec<_> = workers
            .into_iter()
            .map(|w| {
                thread::spawn(move || {
                    for tag in 0..100 {
                        assert_eq!(w.app.recv().unwrap().tag, tag);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
    }

    #[test]
    fn test_cross_barrier_rendezvous() {
        let (master, workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 2 });
        let arrived = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = workers
            .into_iter()
            .map(|w| {
                let arrived = Arc::clone(&arrived);
                thread::spawn(move || {
                    arrived.fetch_add(1, Ordering::SeqCst);
                    w.app.barrier();
                })
            })
            .collect();

        // The master's worker-group barrier completes only once both workers
        // have arrived at their app-group barriers.
        master.worker.barrier();
        assert_eq!(arrived.load(Ordering::SeqCst), 2);
        for t in threads {
            t.join().unwrap();
        }
    }

    #[test]
    fn test_unsupported_operations() {
        let (master, workers) = Switchboard::bootstrap(SwitchboardConfig { workers: 1 });
        assert!(matches!(
            master.worker.recv(),
            Err(CommError::Unsupported { op: "recv", .. })
        ));
        assert!(matches!(
            workers[0].app.broadcast(envelope(0)),
            Err(CommError::Unsupported { op: "broadcast", .. })
        ));
    }
}
