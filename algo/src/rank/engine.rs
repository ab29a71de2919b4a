/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Per-shard computation of rank contributions.
//!
//! Given the current rank vector **x**, a shard computes, for each page *q* of
//! the graph, the sum of the contributions *xₚ* / *d*⁺(*p*) of the pages *p*
//! it owns such that *p* → *q*, where *d*⁺ is the effective outdegree.
//!
//! A dangling page *p* has effective outdegree *n* and links to every page, so
//! it contributes *xₚ* / *n* to all pages, itself included. Rather than
//! adding the same value to *n* entries, the contributions of all dangling
//! pages of a shard are accumulated into a single [uniform
//! term](Contributions::uniform) that is implicitly added to every page.
//!
//! The damping factor is not applied here: the coordinator applies it once,
//! after summing the contributions of all shards.

use crate::errors::{PageRankError, Result};
use crate::partition::Shard;
use kahan::KahanSum;

/// The contributions of a shard to all the pages of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Contributions {
    scatter: Box<[f64]>,
    uniform: f64,
}

impl Contributions {
    /// Returns the contributions computed through natural out-links, indexed
    /// by page.
    pub fn scatter(&self) -> &[f64] {
        &self.scatter
    }

    /// Returns the contribution received by every page from dangling pages.
    pub fn uniform(&self) -> f64 {
        self.uniform
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.scatter.len()
    }

    /// Returns whether there are no pages.
    pub fn is_empty(&self) -> bool {
        self.scatter.is_empty()
    }

    /// Returns the total contribution to `page`.
    #[inline]
    pub fn get(&self, page: usize) -> f64 {
        self.scatter[page] + self.uniform
    }

    /// Returns the total contributions as a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        self.scatter.iter().map(|&s| s + self.uniform).collect()
    }

    /// Returns the sum of all contributions, which is the rank mass owned by
    /// the shard.
    pub fn mass(&self) -> f64 {
        self.scatter
            .iter()
            .fold(KahanSum::<f64>::new(), |acc, &s| acc + s)
            .sum()
            + self.uniform * self.scatter.len() as f64
    }
}

/// Computes the contributions of shards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankEngine;

impl RankEngine {
    /// Computes the contributions of the pages owned by `shard` given the
    /// current rank vector.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](PageRankError::Configuration) error if the
    /// rank vector does not have one entry per page, and an
    /// [`InvalidReference`](PageRankError::InvalidReference) error if an owned
    /// page or one of its out-links is not a valid page.
    pub fn contributions(shard: &Shard, rank: &[f64]) -> Result<Contributions> {
        let n = shard.num_nodes();
        if rank.len() != n {
            return Err(PageRankError::configuration(format!(
                "Shard {} expects a rank vector of {n} entries, got {}",
                shard.id(),
                rank.len()
            )));
        }

        let mut scatter = vec![0.0; n].into_boxed_slice();
        let mut dangling_rank = KahanSum::<f64>::new();

        for (page, succ) in shard.iter() {
            if page >= n {
                return Err(PageRankError::InvalidReference {
                    page: page as i64,
                    target: page as i64,
                    num_nodes: n,
                });
            }
            if succ.is_empty() {
                dangling_rank += rank[page];
                continue;
            }
            let share = rank[page] / succ.len() as f64;
            for &target in succ {
                if target >= n {
                    return Err(PageRankError::InvalidReference {
                        page: page as i64,
                        target: target as i64,
                        num_nodes: n,
                    });
                }
                scatter[target] += share;
            }
        }

        let uniform = if n == 0 {
            0.0
        } else {
            dangling_rank.sum() / n as f64
        };

        Ok(Contributions { scatter, uniform })
    }
}
