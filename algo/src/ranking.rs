/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Pages sorted by decreasing score.
//!
//! A [`Ranking`] is a view on a rank vector that returns pairs (page, score)
//! by decreasing score; pages with the same score are returned by increasing
//! page. Scores are compared with [`f64::total_cmp`], so the order is total
//! even in the presence of NaNs.
//!
//! Iteration is lazy: [`iter`](Ranking::iter) builds a heap in linear time,
//! and each item is extracted in logarithmic time, so taking the first *k*
//! items costs O(*n* + *k* log *n*) rather than a full sort. Each call to
//! [`iter`](Ranking::iter) starts a new sequence.
//!
//! # Examples
//!
//! ```
//! use shardrank::ranking::Ranking;
//!
//! let ranking = Ranking::new(&[0.1, 0.4, 0.1, 0.4]);
//! assert_eq!(
//!     ranking.iter().collect::<Vec<_>>(),
//!     vec![(1, 0.4), (3, 0.4), (0, 0.1), (2, 0.1)]
//! );
//! assert_eq!(ranking.top_k(1), vec![(1, 0.4)]);
//! ```

use dary_heap::QuaternaryHeap;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// A heap entry: larger entries have larger scores or, for equal scores,
/// smaller pages.
#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f64,
    page: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.page.cmp(&self.page))
    }
}

/// A view on a rank vector returning pages by decreasing score.
#[derive(Debug, Clone, Copy)]
pub struct Ranking<'a> {
    scores: &'a [f64],
}

impl<'a> Ranking<'a> {
    /// Creates a ranking of the given scores, indexed by page.
    pub fn new(scores: &'a [f64]) -> Self {
        Self { scores }
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns whether there are no pages.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns a new lazy iterator on the pairs (page, score).
    pub fn iter(&self) -> RankIter {
        let entries: Vec<Entry> = self
            .scores
            .iter()
            .enumerate()
            .map(|(page, &score)| Entry { score, page })
            .collect();
        RankIter {
            heap: QuaternaryHeap::from(entries),
        }
    }

    /// Returns the first `k` pairs (page, score), or all of them if there are
    /// fewer than `k` pages.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        self.iter().take(k).collect()
    }
}

impl IntoIterator for &Ranking<'_> {
    type Item = (usize, f64);
    type IntoIter = RankIter;

    fn into_iter(self) -> RankIter {
        self.iter()
    }
}

/// A lazy iterator on the pairs (page, score) of a [`Ranking`].
#[derive(Debug, Clone)]
pub struct RankIter {
    heap: QuaternaryHeap<Entry>,
}

impl Iterator for RankIter {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<(usize, f64)> {
        self.heap.pop().map(|Entry { score, page }| (page, score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl ExactSizeIterator for RankIter {}

impl FusedIterator for RankIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_order() {
        let a = Entry {
            score: 0.5,
            page: 3,
        };
        let b = Entry {
            score: 0.5,
            page: 7,
        };
        let c = Entry {
            score: 0.6,
            page: 9,
        };
        assert!(a > b);
        assert!(c > a);
        assert_eq!(a, a);
    }

    #[test]
    fn test_restartable() {
        let scores = [0.2, 0.3, 0.5];
        let ranking = Ranking::new(&scores);
        let mut iter = ranking.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((2, 0.5)));
        assert_eq!(iter.len(), 2);
        assert_eq!(ranking.iter().next(), Some((2, 0.5)));
        assert_eq!(ranking.top_k(10).len(), 3);
    }
}
