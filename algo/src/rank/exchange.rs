/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Worker pools exchanging rank vectors and contributions with the
//! coordinator.
//!
//! An [`Exchange`] receives the shards once, through
//! [`scatter`](Exchange::scatter), and then, at each iteration, broadcasts the
//! current rank vector to all workers and gathers their contributions through
//! [`broadcast_then_gather`](Exchange::broadcast_then_gather).
//!
//! Implementations must preserve two barriers: no worker computes before the
//! rank vector has been handed to all workers, and the gathered contributions
//! are returned only after all workers have completed. Contributions are
//! returned in shard order, so that the reduction performed by the caller is
//! deterministic.
//!
//! Two implementations are provided:
//! - [`RayonExchange`] runs the shards as tasks of a dedicated [Rayon](rayon)
//!   thread pool;
//! - [`ChannelExchange`] runs each shard on a long-lived worker thread, and
//!   exchanges messages with it through [crossbeam
//!   channels](crossbeam_channel), in the style of a message-passing
//!   deployment.
//!
//! Both catch panics in the computation and report them as shard failures.

use crate::errors::{PageRankError, Result};
use crate::partition::Shard;
use crate::rank::engine::{Contributions, RankEngine};
use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Barrier};
use std::thread::JoinHandle;

/// A pool of workers computing shard contributions.
pub trait Exchange {
    /// Distributes the shards to the workers.
    ///
    /// This method is called once, before any call to
    /// [`broadcast_then_gather`](Self::broadcast_then_gather).
    fn scatter(&mut self, shards: Vec<Shard>) -> Result<()>;

    /// Sends `rank` to all workers and returns their contributions in shard
    /// order.
    ///
    /// # Errors
    ///
    /// If any shard fails, returns a
    /// [`ShardComputeFailure`](PageRankError::ShardComputeFailure) for the
    /// failing shard with the smallest identifier.
    fn broadcast_then_gather(&mut self, rank: &Arc<[f64]>) -> Result<Vec<Contributions>>;

    /// Returns the number of shards handed to the workers.
    fn num_shards(&self) -> usize;
}

/// Runs [`RankEngine::contributions`] turning panics into errors.
fn compute(shard: &Shard, rank: &[f64]) -> Result<Contributions> {
    match catch_unwind(AssertUnwindSafe(|| RankEngine::contributions(shard, rank))) {
        Ok(result) => result.map_err(|e| e.in_shard(shard.id())),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            Err(PageRankError::WorkerLost {
                worker: shard.id(),
                reason,
            }
            .in_shard(shard.id()))
        }
    }
}

/// An [`Exchange`] running each shard as a task of a Rayon thread pool.
///
/// The broadcast is the hand-off of a shared reference to the rank vector
/// before the parallel map starts; the gather is the ordered collection of
/// the results of the parallel map.
pub struct RayonExchange {
    thread_pool: rayon::ThreadPool,
    shards: Vec<Shard>,
}

impl std::fmt::Debug for RayonExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonExchange")
            .field("num_threads", &self.thread_pool.current_num_threads())
            .field("num_shards", &self.shards.len())
            .finish()
    }
}

impl RayonExchange {
    /// Creates a new exchange backed by a thread pool with the given number
    /// of threads.
    pub fn new(num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(PageRankError::configuration(
                "The number of threads must be positive",
            ));
        }
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("shardrank-{i}"))
            .build()?;
        Ok(Self {
            thread_pool,
            shards: Vec::new(),
        })
    }
}

impl Exchange for RayonExchange {
    fn scatter(&mut self, shards: Vec<Shard>) -> Result<()> {
        log::info!(
            "Scattering {} shards on {} threads",
            shards.len(),
            self.thread_pool.current_num_threads()
        );
        self.shards = shards;
        Ok(())
    }

    fn broadcast_then_gather(&mut self, rank: &Arc<[f64]>) -> Result<Vec<Contributions>> {
        let rank: &[f64] = rank;
        let shards = &self.shards;
        let results: Vec<Result<Contributions>> = self.thread_pool.install(|| {
            shards
                .par_iter()
                .with_max_len(1)
                .map(|shard| compute(shard, rank))
                .collect()
        });
        results.into_iter().collect()
    }

    fn num_shards(&self) -> usize {
        self.shards.len()
    }
}

type Reply = (usize, Result<Contributions>);

struct Worker {
    commands: Sender<Arc<[f64]>>,
    handle: JoinHandle<()>,
}

/// An [`Exchange`] running each shard on a dedicated worker thread.
///
/// Each worker owns its shard and waits for rank vectors on a channel. After
/// receiving a vector, a worker waits on a barrier shared by all workers, so
/// that no computation starts before the vector has reached every worker;
/// then, it sends its contributions back on a channel shared by all workers.
///
/// Dropping the exchange closes the channels and joins the workers.
#[derive(Default)]
pub struct ChannelExchange {
    workers: Vec<Worker>,
    replies: Option<Receiver<Reply>>,
}

impl std::fmt::Debug for ChannelExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelExchange")
            .field("num_workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl ChannelExchange {
    /// Creates a new exchange; workers are started by
    /// [`scatter`](Exchange::scatter).
    pub fn new() -> Self {
        Self::default()
    }
}

impl Exchange for ChannelExchange {
    fn scatter(&mut self, shards: Vec<Shard>) -> Result<()> {
        if !self.workers.is_empty() {
            return Err(PageRankError::configuration(
                "Shards have already been scattered",
            ));
        }
        log::info!("Starting {} workers", shards.len());

        let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<Reply>();
        let barrier = Arc::new(Barrier::new(shards.len().max(1)));

        for shard in shards {
            let (command_tx, command_rx) = crossbeam_channel::bounded::<Arc<[f64]>>(1);
            let reply_tx = reply_tx.clone();
            let barrier = Arc::clone(&barrier);
            // Replies are tagged with the position of the worker, which is
            // also the position of the shard in the gathered vector.
            let index = self.workers.len();
            let id = shard.id();
            let handle = std::thread::Builder::new()
                .name(format!("shard-{id}"))
                .spawn(move || {
                    // The loop ends when the coordinator drops the command
                    // sender.
                    while let Ok(rank) = command_rx.recv() {
                        barrier.wait();
                        let result = compute(&shard, &rank);
                        if reply_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                    log::debug!("Worker {id} terminated");
                })?;
            self.workers.push(Worker {
                commands: command_tx,
                handle,
            });
        }
        self.replies = Some(reply_rx);
        Ok(())
    }

    fn broadcast_then_gather(&mut self, rank: &Arc<[f64]>) -> Result<Vec<Contributions>> {
        let Some(replies) = &self.replies else {
            return Ok(Vec::new());
        };

        for (worker, w) in self.workers.iter().enumerate() {
            w.commands
                .send(Arc::clone(rank))
                .map_err(|_| PageRankError::WorkerLost {
                    worker,
                    reason: "the worker stopped receiving rank vectors".to_owned(),
                })
                .map_err(|e| e.in_shard(worker))?;
        }

        let mut gathered: Vec<Option<Result<Contributions>>> =
            (0..self.workers.len()).map(|_| None).collect();
        for _ in 0..self.workers.len() {
            let (index, result) = replies.recv().map_err(|_| {
                let worker = gathered.iter().position(Option::is_none).unwrap_or(0);
                PageRankError::WorkerLost {
                    worker,
                    reason: "all workers disconnected".to_owned(),
                }
                .in_shard(worker)
            })?;
            gathered[index] = Some(result);
        }

        gathered
            .into_iter()
            .enumerate()
            .map(|(id, result)| {
                result.unwrap_or_else(|| {
                    Err(PageRankError::WorkerLost {
                        worker: id,
                        reason: "no reply".to_owned(),
                    }
                    .in_shard(id))
                })
            })
            .collect()
    }

    fn num_shards(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ChannelExchange {
    fn drop(&mut self) {
        self.replies = None;
        let handles: Vec<_> = self
            .workers
            .drain(..)
            .map(|worker| worker.handle)
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                log::warn!("A worker thread panicked while shutting down");
            }
        }
    }
}
