/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The coordinator driving the iterations.
//!
//! # The formula
//!
//! Let *n* be the number of pages, α the damping factor and *d*⁺(*p*) the
//! effective outdegree of page *p* (that is, *n* if *p* is dangling, as a
//! dangling page is considered linked to every page). The coordinator
//! computes, starting from the uniform vector **x**⁽⁰⁾ = **1**/*n*,
//!
//! > *x*⁽*ᵗ* ⁺ ¹⁾*_q* = (1 − α) / *n* + α ∑_(*p* → *q*) *x*⁽*ᵗ*⁾*_p* / *d*⁺(*p*).
//!
//! The sum is split among shards: each shard computes the terms of the pages
//! it owns, and the coordinator adds up the partial sums. The constant term
//! and the damping factor are applied once, after the partial sums of all
//! shards have been added.
//!
//! Since every page distributes all of its rank, each iterate is a
//! probability distribution: its entries sum to one, up to floating-point
//! error.
//!
//! # Phases
//!
//! The computation is a state machine whose current state is returned by
//! [`phase`](Coordinator::phase):
//!
//! > [`Init`](Phase::Init) → [`Broadcast`](Phase::Broadcast) →
//! > [`Compute`](Phase::Compute) → [`Reduce`](Phase::Reduce) →
//! > [`ConvergenceCheck`](Phase::ConvergenceCheck) →
//! > ([`Broadcast`](Phase::Broadcast) | [`Done`](Phase::Done))
//!
//! Only the [`Compute`](Phase::Compute) phase is parallel. The rank vector is
//! never modified in place: each iteration reads an immutable snapshot and
//! builds a new vector, which then replaces the snapshot wholesale.
//!
//! # Stopping criteria
//!
//! With [`run`](Coordinator::run) the computation stops after the configured
//! number of iterations or as soon as the Euclidean distance between two
//! successive vectors is smaller than the configured threshold, whichever
//! happens first. [`run_until`](Coordinator::run_until) accepts any
//! [predicate](super::preds) instead; predicates are evaluated only between
//! iterations.
//!
//! # Examples
//!
//! ```
//! use shardrank::graph::AdjGraph;
//! use shardrank::rank::{Config, Coordinator};
//!
//! let graph = AdjGraph::load("0 1\n1 2\n2 0 1\n".as_bytes()).unwrap();
//! let config = Config {
//!     iterations: Some(100),
//!     threshold: Some(1E-12),
//!     workers: 2,
//!     ..Config::default()
//! };
//! let mut coordinator = Coordinator::new(&graph, config).unwrap();
//! let outcome = coordinator.run().unwrap();
//!
//! assert!(outcome.converged);
//! assert!((outcome.rank.iter().sum::<f64>() - 1.0).abs() < 1E-9);
//! assert_eq!(outcome.ranking().top_k(1)[0].0, 1);
//! ```

use crate::errors::{PageRankError, Result};
use crate::graph::AdjGraph;
use crate::partition::{Shard, Strategy, partition};
use crate::rank::engine::Contributions;
use crate::rank::exchange::{Exchange, RayonExchange};
use crate::rank::preds::{self, L2Norm, MaxIter, PredParams};
use crate::ranking::Ranking;
use dsi_progress_logger::{ProgressLog, no_logging};
use kahan::KahanSum;
use predicates::{BoxPredicate, Predicate};
use predicates::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// The parameters of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The damping factor α, in the open interval (0 . . 1).
    pub damping: f64,
    /// The maximum number of iterations.
    pub iterations: Option<usize>,
    /// The threshold on the Euclidean distance between successive vectors.
    pub threshold: Option<f64>,
    /// The number of shards, and of workers.
    pub workers: usize,
    /// How pages are assigned to shards.
    pub strategy: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            damping: Self::DEFAULT_DAMPING,
            iterations: Some(MaxIter::DEFAULT_MAX_ITER),
            threshold: None,
            workers: num_cpus::get().max(1),
            strategy: Strategy::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_DAMPING: f64 = 0.85;

    /// Checks that the configuration can produce a run.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](PageRankError::Configuration) error if the
    /// damping factor is not in (0 . . 1), if the number of workers is zero,
    /// if the threshold is not positive, or if neither a number of iterations
    /// nor a threshold is specified.
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(PageRankError::configuration(format!(
                "The damping factor must be in (0 . . 1), got {}",
                self.damping
            )));
        }
        if self.workers == 0 {
            return Err(PageRankError::configuration(
                "The number of workers must be positive",
            ));
        }
        if let Some(threshold) = self.threshold {
            L2Norm::try_from(threshold)
                .map_err(|e| PageRankError::configuration(e.to_string()))?;
        }
        if self.iterations.is_none() && self.threshold.is_none() {
            return Err(PageRankError::configuration(
                "Either a number of iterations or a convergence threshold must be specified",
            ));
        }
        Ok(())
    }

    /// Returns the stopping predicate described by this configuration.
    pub fn predicate(&self) -> Result<BoxPredicate<PredParams>> {
        self.validate()?;
        let norm = self
            .threshold
            .map(L2Norm::try_from)
            .transpose()
            .map_err(|e| PageRankError::configuration(e.to_string()))?;
        Ok(match (self.iterations.map(MaxIter::from), norm) {
            (Some(max_iter), Some(norm)) => max_iter.or(norm).boxed(),
            (Some(max_iter), None) => max_iter.boxed(),
            (None, Some(norm)) => norm.boxed(),
            (None, None) => unreachable!(),
        })
    }
}

/// The states of the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The shards have been scattered and no iteration has started yet.
    Init,
    /// The current rank vector is being sent to the workers.
    Broadcast,
    /// Workers are computing their contributions.
    Compute,
    /// Contributions are being summed into the next rank vector.
    Reduce,
    /// The stopping criterion is being evaluated.
    ConvergenceCheck,
    /// The computation is complete.
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::Broadcast => "broadcast",
            Phase::Compute => "compute",
            Phase::Reduce => "reduce",
            Phase::ConvergenceCheck => "convergence check",
            Phase::Done => "done",
        })
    }
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    /// The final rank vector, indexed by page.
    pub rank: Arc<[f64]>,
    /// The number of iterations performed.
    pub iterations: usize,
    /// The Euclidean distance between the last two vectors, or infinity if
    /// no iteration was performed.
    pub norm_delta: f64,
    /// Whether the distance fell below the configured threshold.
    pub converged: bool,
}

impl RankOutcome {
    /// Returns the pages sorted by decreasing rank.
    pub fn ranking(&self) -> Ranking<'_> {
        Ranking::new(&self.rank)
    }
}

/// Drives the sharded computation.
///
/// The coordinator owns an [`Exchange`] to which it scatters the shards once,
/// at construction time. Then, each call to [`step`](Self::step) performs one
/// iteration, and [`run`](Self::run) iterates until the stopping criterion is
/// met.
///
/// If a shard fails, the run is aborted: the error is returned and the
/// coordinator moves to [`Done`](Phase::Done) without exposing a partial
/// result.
pub struct Coordinator<E: Exchange = RayonExchange> {
    config: Config,
    num_nodes: usize,
    exchange: E,
    phase: Phase,
    rank: Arc<[f64]>,
    iteration: usize,
    norm_delta: f64,
    failed: bool,
}

impl<E: Exchange> std::fmt::Debug for Coordinator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("num_nodes", &self.num_nodes)
            .field("phase", &self.phase)
            .field("iteration", &self.iteration)
            .field("norm_delta", &self.norm_delta)
            .finish_non_exhaustive()
    }
}

impl Coordinator<RayonExchange> {
    /// Creates a coordinator running the shards of `graph` on a Rayon thread
    /// pool with one thread per worker.
    pub fn new(graph: &AdjGraph, config: Config) -> Result<Self> {
        config.validate()?;
        let exchange = RayonExchange::new(config.workers)?;
        Self::with_exchange(graph, config, exchange)
    }
}

impl<E: Exchange> Coordinator<E> {
    /// Creates a coordinator partitioning `graph` as specified by `config` and
    /// running the shards on the given exchange.
    pub fn with_exchange(graph: &AdjGraph, config: Config, exchange: E) -> Result<Self> {
        config.validate()?;
        let shards = partition(graph, config.workers, config.strategy)?;
        Self::from_shards(graph.num_nodes(), shards, config, exchange)
    }

    /// Creates a coordinator from shards built elsewhere.
    ///
    /// Every page in [0 . . `num_nodes`) must be owned by exactly one shard,
    /// as otherwise some rank would be lost or counted twice. Out-links are
    /// not validated: invalid references will make the run fail with a
    /// [`ShardComputeFailure`](PageRankError::ShardComputeFailure). The
    /// number of workers in `config` is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](PageRankError::Configuration) error if a
    /// shard expects a different number of pages, or if the shards do not
    /// cover every page exactly once.
    pub fn from_shards(
        num_nodes: usize,
        shards: Vec<Shard>,
        config: Config,
        mut exchange: E,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(shard) = shards.iter().find(|s| s.num_nodes() != num_nodes) {
            return Err(PageRankError::configuration(format!(
                "Shard {} expects {} pages, but the graph has {num_nodes} pages",
                shard.id(),
                shard.num_nodes()
            )));
        }
        check_cover(num_nodes, &shards)?;

        log::info!("Pages: {}", num_nodes);
        log::info!("Damping factor: {}", config.damping);
        log::info!("Shards: {} ({})", shards.len(), config.strategy);

        let rank: Arc<[f64]> = if num_nodes == 0 {
            Arc::from([])
        } else {
            vec![1.0 / num_nodes as f64; num_nodes].into()
        };
        exchange.scatter(shards)?;

        Ok(Self {
            config,
            num_nodes,
            exchange,
            phase: Phase::Init,
            rank,
            iteration: 0,
            norm_delta: f64::INFINITY,
            failed: false,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the current rank vector.
    pub fn rank(&self) -> &Arc<[f64]> {
        &self.rank
    }

    /// Returns the number of iterations performed so far.
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the Euclidean distance between the last two vectors.
    pub fn norm_delta(&self) -> f64 {
        self.norm_delta
    }

    /// Performs one iteration: broadcast, compute and reduce.
    ///
    /// On success, the new vector replaces the current one, the coordinator
    /// is in the [`ConvergenceCheck`](Phase::ConvergenceCheck) phase and the
    /// Euclidean distance between the two vectors is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing shard; the coordinator then
    /// moves to [`Done`](Phase::Done). Calling this method after the
    /// computation is complete returns a
    /// [`Configuration`](PageRankError::Configuration) error.
    pub fn step(&mut self) -> Result<f64> {
        match self.phase {
            Phase::Init | Phase::ConvergenceCheck => {}
            Phase::Done => {
                return Err(PageRankError::configuration(if self.failed {
                    "The run was aborted by a shard failure"
                } else {
                    "The computation is complete"
                }));
            }
            phase => unreachable!("Unexpected phase {phase} between iterations"),
        }

        self.phase = Phase::Broadcast;
        let snapshot = Arc::clone(&self.rank);

        self.phase = Phase::Compute;
        let partials = match self.exchange.broadcast_then_gather(&snapshot) {
            Ok(partials) => partials,
            Err(e) => {
                log::error!("Iteration {} aborted: {}", self.iteration + 1, e);
                self.phase = Phase::Done;
                self.failed = true;
                return Err(e);
            }
        };

        self.phase = Phase::Reduce;
        let next = self.reduce(&partials);
        let norm_delta = euclidean_distance(&snapshot, &next);

        self.rank = next.into();
        self.norm_delta = norm_delta;
        self.iteration += 1;
        self.phase = Phase::ConvergenceCheck;

        log::info!(
            "Iteration {}: norm delta = {}",
            self.iteration,
            self.norm_delta
        );
        Ok(norm_delta)
    }

    /// Sums the partial contributions in shard order and applies the damping
    /// factor.
    fn reduce(&self, partials: &[Contributions]) -> Box<[f64]> {
        let n = self.num_nodes;
        let alpha = self.config.damping;
        let teleport = (1.0 - alpha) / n as f64;
        let uniform = partials
            .iter()
            .fold(KahanSum::<f64>::new(), |acc, c| acc + c.uniform())
            .sum();

        let next: Box<[f64]> = (0..n)
            .map(|page| {
                let summed = partials
                    .iter()
                    .fold(KahanSum::<f64>::new(), |acc, c| acc + c.scatter()[page])
                    + uniform;
                teleport + alpha * summed.sum()
            })
            .collect();

        log::debug!(
            "Rank mass after iteration {}: {}",
            self.iteration + 1,
            next.iter().fold(KahanSum::<f64>::new(), |acc, &x| acc + x).sum()
        );
        next
    }

    /// Runs the computation until the configured stopping criterion is met.
    pub fn run(&mut self) -> Result<RankOutcome> {
        self.run_with_logging(no_logging![])
    }

    /// Runs the computation until the configured stopping criterion is met,
    /// logging progress on `pl`.
    pub fn run_with_logging(&mut self, pl: &mut impl ProgressLog) -> Result<RankOutcome> {
        let predicate = self.config.predicate()?;
        self.run_until_with_logging(predicate, pl)
    }

    /// Runs the computation until the given predicate is satisfied.
    ///
    /// The predicate is evaluated before the first iteration and after each
    /// iteration.
    pub fn run_until(&mut self, predicate: impl Predicate<PredParams>) -> Result<RankOutcome> {
        self.run_until_with_logging(predicate, no_logging![])
    }

    /// Runs the computation until the given predicate is satisfied, logging
    /// progress on `pl`.
    pub fn run_until_with_logging(
        &mut self,
        predicate: impl Predicate<PredParams>,
        pl: &mut impl ProgressLog,
    ) -> Result<RankOutcome> {
        if self.failed {
            return Err(PageRankError::configuration(
                "The run was aborted by a shard failure",
            ));
        }
        log::info!("Stopping criterion: {}", predicate);
        let start = Instant::now();

        pl.item_name("iteration");
        pl.expected_updates(self.config.iterations);
        pl.start(format!(
            "Computing PageRank (damping={}, shards={})...",
            self.config.damping,
            self.exchange.num_shards()
        ));

        loop {
            self.phase = Phase::ConvergenceCheck;
            let params = preds::PredParams {
                iteration: self.iteration,
                norm_delta: self.norm_delta,
                elapsed: start.elapsed(),
            };
            if self.num_nodes == 0 || predicate.eval(&params) {
                self.phase = Phase::Done;
                break;
            }
            self.step()?;
            pl.update_and_display();
        }

        pl.done();
        log::info!(
            "Completed after {} iteration(s), norm delta = {}",
            self.iteration,
            self.norm_delta
        );

        Ok(self.outcome())
    }

    /// Returns the current state as an outcome.
    pub fn outcome(&self) -> RankOutcome {
        RankOutcome {
            rank: Arc::clone(&self.rank),
            iterations: self.iteration,
            norm_delta: self.norm_delta,
            converged: self.num_nodes == 0
                || self
                    .config
                    .threshold
                    .is_some_and(|threshold| self.norm_delta < threshold),
        }
    }
}

/// Checks that each page in [0 . . `num_nodes`) is owned by exactly one
/// shard. Pages out of range are left to the compute phase.
fn check_cover(num_nodes: usize, shards: &[Shard]) -> Result<()> {
    let mut owner: Vec<Option<usize>> = vec![None; num_nodes];
    for shard in shards {
        for &page in shard.pages().iter().filter(|&&page| page < num_nodes) {
            if let Some(first) = owner[page].replace(shard.id()) {
                return Err(PageRankError::configuration(format!(
                    "Page {page} is owned by shard {first} and by shard {}",
                    shard.id()
                )));
            }
        }
    }
    if let Some(page) = owner.iter().position(Option::is_none) {
        return Err(PageRankError::configuration(format!(
            "Page {page} is not owned by any shard"
        )));
    }
    Ok(())
}

/// Returns the Euclidean distance between two vectors of the same length.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(KahanSum::<f64>::new(), |acc, (x, y)| acc + (x - y) * (x - y))
        .sum()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        for damping in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let config = Config {
                damping,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PageRankError::Configuration(_))
            ));
        }
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            iterations: None,
            threshold: None,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            threshold: Some(0.0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance(&[0.0, 3.0], &[4.0, 0.0]), 5.0);
        assert_eq!(euclidean_distance(&[], &[]), 0.0);
    }
}
