/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Sharded power-iteration PageRank.
//!
//! The [`Coordinator`] partitions a graph into shards, hands them to an
//! [`Exchange`] and iterates: at each iteration the current rank vector is
//! broadcast to the workers, each worker computes the contributions of its
//! shard with the [`RankEngine`], and the coordinator sums them and applies
//! the damping factor.

pub mod coordinator;
pub mod engine;
pub mod exchange;
pub mod preds;

pub use coordinator::{Config, Coordinator, Phase, RankOutcome};
pub use engine::{Contributions, RankEngine};
pub use exchange::{ChannelExchange, Exchange, RayonExchange};
