/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Partitioning of the page space into shards.
//!
//! A [`Shard`] owns a subset of the pages of a graph and a private copy of
//! their adjacency entries. The out-links of the owned pages can point to
//! pages owned by any shard: the contributions computed by a shard are
//! scattered over the whole page space.
//!
//! Two [strategies](Strategy) are available. With
//! [`Contiguous`](Strategy::Contiguous), shards own intervals of equal length,
//! except for shard 0, which also takes the *n* mod *w* remaining pages. With
//! [`Striped`](Strategy::Striped), shard *i* owns the pages *p* such that *p*
//! mod *w* = *i*.

use crate::errors::{PageRankError, Result};
use crate::graph::AdjGraph;
use std::ops::Range;

/// How pages are assigned to shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Intervals of pages; shard 0 takes the remainder.
    #[default]
    Contiguous,
    /// Pages are assigned round-robin.
    Striped,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Contiguous => f.write_str("contiguous"),
            Strategy::Striped => f.write_str("striped"),
        }
    }
}

/// The pages owned by a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// An interval of pages.
    Range(Range<usize>),
    /// The pages `start`, `start + step`, `start + 2 step`, … smaller than
    /// `end`.
    Stride {
        start: usize,
        step: usize,
        end: usize,
    },
    /// An explicit list of pages.
    List(Box<[usize]>),
}

impl Ownership {
    /// Returns whether `page` is owned.
    pub fn contains(&self, page: usize) -> bool {
        match self {
            Ownership::Range(range) => range.contains(&page),
            Ownership::Stride { start, step, end } => {
                page >= *start && page < *end && (page - start) % step == 0
            }
            Ownership::List(pages) => pages.binary_search(&page).is_ok(),
        }
    }
}

/// A subset of pages together with their adjacency entries.
///
/// The entries are a copy of the natural out-links of the owned pages; an
/// empty entry denotes a dangling page, whose effective successors are all
/// the pages of the graph.
#[derive(Debug, Clone)]
pub struct Shard {
    id: usize,
    num_nodes: usize,
    ownership: Ownership,
    pages: Box<[usize]>,
    succ: Box<[Box<[usize]>]>,
}

impl Shard {
    /// Creates a shard from its parts, without any validation.
    ///
    /// This is the way to build a shard whose content was not produced by
    /// [`partition`], for example received from another process. References
    /// are checked when contributions are computed.
    ///
    /// # Panics
    ///
    /// Panics if `pages` and `succ` have different lengths.
    pub fn from_parts(
        id: usize,
        num_nodes: usize,
        pages: impl Into<Box<[usize]>>,
        succ: impl Into<Box<[Box<[usize]>]>>,
    ) -> Self {
        let mut pages: Box<[usize]> = pages.into();
        let mut succ: Box<[Box<[usize]>]> = succ.into();
        assert_eq!(
            pages.len(),
            succ.len(),
            "The number of pages ({}) does not match the number of adjacency entries ({})",
            pages.len(),
            succ.len()
        );
        if !pages.is_sorted() {
            let mut entries: Vec<_> = pages.iter().copied().zip(succ.into_vec()).collect();
            entries.sort_by_key(|&(page, _)| page);
            let (p, s): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
            pages = p.into_boxed_slice();
            succ = s.into_boxed_slice();
        }
        Self {
            id,
            num_nodes,
            ownership: Ownership::List(pages.clone()),
            pages,
            succ,
        }
    }

    /// Returns the identifier of the shard.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the number of pages of the whole graph.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Returns the ownership description of the shard.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Returns the owned pages in increasing order.
    pub fn pages(&self) -> &[usize] {
        &self.pages
    }

    /// Returns the number of owned pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns whether the shard owns no page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the number of natural arcs leaving the owned pages.
    pub fn num_arcs(&self) -> u64 {
        self.succ.iter().map(|s| s.len() as u64).sum()
    }

    /// Returns an iterator over the owned pages and their natural out-links.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.pages
            .iter()
            .copied()
            .zip(self.succ.iter().map(AsRef::as_ref))
    }
}

/// Returns the interval of pages owned by `shard` under the
/// [contiguous](Strategy::Contiguous) strategy.
///
/// Shard 0 owns [0 . . ⌊*n* / *w*⌋ + *n* mod *w*); the other shards follow,
/// each with ⌊*n* / *w*⌋ pages.
pub fn contiguous_range(num_nodes: usize, workers: usize, shard: usize) -> Range<usize> {
    debug_assert!(shard < workers);
    let base = num_nodes / workers;
    let first = base + num_nodes % workers;
    if shard == 0 {
        0..first
    } else {
        let start = first + (shard - 1) * base;
        start..start + base
    }
}

/// Splits the pages of `graph` into `workers` shards.
///
/// The result is deterministic for a given number of pages, number of workers
/// and strategy. If there are more workers than pages, some shards are empty.
///
/// # Errors
///
/// Returns a [`Configuration`](PageRankError::Configuration) error if
/// `workers` is zero.
pub fn partition(graph: &AdjGraph, workers: usize, strategy: Strategy) -> Result<Vec<Shard>> {
    if workers == 0 {
        return Err(PageRankError::configuration(
            "The number of workers must be positive",
        ));
    }
    let n = graph.num_nodes();

    let shards = (0..workers)
        .map(|id| {
            let (ownership, pages): (Ownership, Box<[usize]>) = match strategy {
                Strategy::Contiguous => {
                    let range = contiguous_range(n, workers, id);
                    (Ownership::Range(range.clone()), range.collect())
                }
                Strategy::Striped => (
                    Ownership::Stride {
                        start: id,
                        step: workers,
                        end: n,
                    },
                    (id..n).step_by(workers).collect(),
                ),
            };
            let succ = pages
                .iter()
                .map(|&page| Box::<[usize]>::from(graph.natural_successors(page)))
                .collect();
            Shard {
                id,
                num_nodes: n,
                ownership,
                pages,
                succ,
            }
        })
        .collect::<Vec<_>>();

    for shard in &shards {
        log::debug!(
            "Shard {}: {} pages, {} arcs",
            shard.id(),
            shard.len(),
            shard.num_arcs()
        );
    }

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_range_covers() {
        for n in 0..30 {
            for w in 1..8 {
                let mut next = 0;
                for i in 0..w {
                    let range = contiguous_range(n, w, i);
                    assert_eq!(range.start, next);
                    next = range.end;
                    if i > 0 {
                        assert_eq!(range.len(), n / w);
                    }
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn test_ownership_contains() {
        let stride = Ownership::Stride {
            start: 1,
            step: 3,
            end: 10,
        };
        let owned: Vec<_> = (0..12).filter(|&p| stride.contains(p)).collect();
        assert_eq!(owned, vec![1, 4, 7]);
        assert!(Ownership::Range(2..5).contains(4));
        assert!(!Ownership::Range(2..5).contains(5));
    }

    #[test]
    fn test_from_parts_sorts() {
        let shard = Shard::from_parts(
            0,
            4,
            vec![3usize, 1],
            vec![vec![0usize].into_boxed_slice(), vec![2usize, 3].into_boxed_slice()],
        );
        assert_eq!(shard.pages(), &[1, 3]);
        let entries: Vec<_> = shard.iter().collect();
        assert_eq!(entries, vec![(1usize, &[2usize, 3][..]), (3, &[0][..])]);
        assert!(shard.ownership().contains(3));
        assert!(!shard.ownership().contains(2));
    }
}
