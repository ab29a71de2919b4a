/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! In-memory directed graphs with dangling-node resolution.
//!
//! An [`AdjGraph`] stores, for each page in [0 . . *n*), the list of pages it
//! links to. Pages are loaded from records of the form
//!
//! ```text
//! page outlink₀ outlink₁ …
//! ```
//!
//! where all tokens are whitespace-separated non-negative integers. A page
//! with no out-link tokens is _dangling_: after loading, its _effective_
//! successors are all pages of the graph, including itself, and its effective
//! outdegree is *n*. The resolution is performed once, at load time, and it is
//! represented implicitly by [`Successors::All`] so that no dangling page
//! needs *n* words of memory.
//!
//! Page identifiers must be dense: the number of pages *n* is one plus the
//! largest page having a record, and every page in [0 . . *n*) must have its
//! own record.
//!
//! # Examples
//!
//! ```
//! use shardrank::graph::AdjGraph;
//!
//! let graph = AdjGraph::load("0 1 2\n1 2\n2\n".as_bytes()).unwrap();
//! assert_eq!(graph.num_nodes(), 3);
//! assert_eq!(graph.num_arcs(), 3);
//! assert!(graph.is_dangling(2));
//! assert_eq!(graph.successors(2).collect::<Vec<_>>(), vec![0, 1, 2]);
//! assert_eq!(graph.outdegree(2), 3);
//! ```

use crate::errors::{PageRankError, Result};
use std::io::BufRead;
use std::ops::Range;
use std::path::Path;

/// Effective successors of a page.
#[derive(Debug, Clone)]
pub enum Successors<'a> {
    /// The natural out-links of a non-dangling page.
    Links(std::slice::Iter<'a, usize>),
    /// All pages, for a dangling page.
    All(Range<usize>),
}

impl Iterator for Successors<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self {
            Successors::Links(iter) => iter.next().copied(),
            Successors::All(range) => range.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Successors::Links(iter) => iter.size_hint(),
            Successors::All(range) => range.size_hint(),
        }
    }
}

impl ExactSizeIterator for Successors<'_> {}

/// An immutable directed graph stored as a vector of successor lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjGraph {
    /// The number of natural arcs (dangling resolution excluded).
    num_arcs: u64,
    /// For each page, its sorted, deduplicated natural out-links.
    succ: Box<[Box<[usize]>]>,
    /// The dangling pages, in increasing order.
    dangling: Box<[usize]>,
}

impl AdjGraph {
    /// Loads a graph from a reader returning one record per line.
    ///
    /// Empty lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// - [`MalformedRecord`](PageRankError::MalformedRecord) if a token is not
    ///   an integer;
    /// - [`InvalidReference`](PageRankError::InvalidReference) if a token is
    ///   negative or an out-link is not smaller than the number of pages;
    /// - [`DuplicatePage`](PageRankError::DuplicatePage) if a page has two
    ///   records;
    /// - [`Configuration`](PageRankError::Configuration) if some page in
    ///   [0 . . *n*) has no record.
    pub fn load(reader: impl BufRead) -> Result<Self> {
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut tokens = trimmed.split_whitespace();
            // The line is not empty, so there is at least one token
            let page = parse_page(tokens.next().unwrap_or_default(), line_num, None)?;
            let outlinks = tokens
                .map(|token| parse_page(token, line_num, Some(page)))
                .collect::<Result<Vec<_>>>()?;
            records.push((line_num, page, outlinks));
        }
        Self::build(records)
    }

    /// Loads a graph from a file.
    ///
    /// See [`load`](Self::load) for the format and the possible errors.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading graph from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file))
    }

    /// Builds a graph from records given as pairs (page, out-links).
    ///
    /// Records are numbered from one in the order they are returned, and the
    /// numbering is used in error messages. The checks are the same as those
    /// of [`load`](Self::load).
    pub fn from_records<I, L>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, L)>,
        L: IntoIterator<Item = usize>,
    {
        Self::build(
            records
                .into_iter()
                .enumerate()
                .map(|(i, (page, succ))| (i + 1, page, succ.into_iter().collect()))
                .collect(),
        )
    }

    fn build(records: Vec<(usize, usize, Vec<usize>)>) -> Result<Self> {
        let num_nodes = match records.iter().map(|&(_, page, _)| page).max() {
            None => 0,
            // Dense identifiers from 0 cannot exceed the number of records
            Some(largest) if largest >= records.len() => {
                return Err(PageRankError::configuration(format!(
                    "Page identifiers must be contiguous from 0: the largest page is {largest}, but there are only {} records",
                    records.len()
                )));
            }
            Some(largest) => largest + 1,
        };

        // Line of the record of each page, if any
        let mut seen_at: Vec<Option<usize>> = vec![None; num_nodes];
        let mut succ: Vec<Box<[usize]>> = vec![Box::default(); num_nodes];
        let mut num_arcs = 0;

        for (line, page, mut outlinks) in records {
            if let Some(first_line) = seen_at[page] {
                return Err(PageRankError::DuplicatePage {
                    page,
                    line,
                    first_line,
                });
            }
            seen_at[page] = Some(line);

            if let Some(&target) = outlinks.iter().find(|&&target| target >= num_nodes) {
                return Err(PageRankError::InvalidReference {
                    page: page as i64,
                    target: target as i64,
                    num_nodes,
                });
            }
            outlinks.sort_unstable();
            outlinks.dedup();
            num_arcs += outlinks.len() as u64;
            succ[page] = outlinks.into_boxed_slice();
        }

        if let Some(missing) = seen_at.iter().position(Option::is_none) {
            return Err(PageRankError::configuration(format!(
                "Page identifiers must be contiguous from 0: page {missing} has no record, but the largest page is {}",
                num_nodes - 1
            )));
        }

        let dangling = succ
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_empty())
            .map(|(page, _)| page)
            .collect::<Box<[_]>>();

        log::debug!(
            "Loaded {} pages, {} arcs, {} dangling pages",
            num_nodes,
            num_arcs,
            dangling.len()
        );

        Ok(Self {
            num_arcs,
            succ: succ.into_boxed_slice(),
            dangling,
        })
    }

    /// Returns the number of pages.
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    /// Returns the number of natural arcs, that is, not counting the arcs
    /// implied by dangling-node resolution.
    #[inline(always)]
    pub fn num_arcs(&self) -> u64 {
        self.num_arcs
    }

    /// Returns whether `page` has no natural out-links.
    #[inline(always)]
    pub fn is_dangling(&self, page: usize) -> bool {
        self.succ[page].is_empty()
    }

    /// Returns the dangling pages in increasing order.
    pub fn dangling_nodes(&self) -> &[usize] {
        &self.dangling
    }

    /// Returns the number of dangling pages.
    pub fn num_dangling(&self) -> usize {
        self.dangling.len()
    }

    /// Returns the natural out-links of `page` (empty for dangling pages).
    #[inline(always)]
    pub fn natural_successors(&self, page: usize) -> &[usize] {
        &self.succ[page]
    }

    /// Returns the effective successors of `page`: its out-links, or all pages
    /// if `page` is dangling.
    #[inline]
    pub fn successors(&self, page: usize) -> Successors<'_> {
        if self.is_dangling(page) {
            Successors::All(0..self.num_nodes())
        } else {
            Successors::Links(self.succ[page].iter())
        }
    }

    /// Returns the effective outdegree of `page`, that is, the number of pages
    /// if `page` is dangling.
    #[inline]
    pub fn outdegree(&self, page: usize) -> usize {
        if self.is_dangling(page) {
            self.num_nodes()
        } else {
            self.succ[page].len()
        }
    }
}

/// Parses a page identifier; `source` is the page of the record, if the token
/// is an out-link.
fn parse_page(token: &str, line: usize, source: Option<usize>) -> Result<usize> {
    let value = token
        .parse::<i64>()
        .map_err(|_| PageRankError::MalformedRecord {
            line,
            token: token.to_owned(),
        })?;
    usize::try_from(value).map_err(|_| PageRankError::InvalidReference {
        page: source.map_or(value, |s| s as i64),
        target: value,
        num_nodes: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successors_size() {
        let graph = AdjGraph::from_records([(0, vec![1usize]), (1, vec![])]).unwrap();
        assert_eq!(graph.successors(0).len(), 1);
        assert_eq!(graph.successors(1).len(), 2);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("42", 1, None).unwrap(), 42);
        assert!(matches!(
            parse_page("x", 7, None),
            Err(PageRankError::MalformedRecord { line: 7, .. })
        ));
        assert!(matches!(
            parse_page("-1", 1, Some(3)),
            Err(PageRankError::InvalidReference {
                page: 3,
                target: -1,
                ..
            })
        ));
    }
}
