/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Errors returned by loading, partitioning and ranking.
//!
//! Every failure is surfaced to the caller as a distinct variant of
//! [`PageRankError`]; nothing is retried internally. A caller that wants to
//! retry must restart the whole run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageRankError {
    /// A record contains a token that is not an integer.
    #[error("Malformed record at line {line}: cannot parse {token:?} as a page identifier")]
    MalformedRecord { line: usize, token: String },

    /// The same page has two records.
    #[error("Page {page} appears twice: at line {first_line} and at line {line}")]
    DuplicatePage {
        page: usize,
        line: usize,
        first_line: usize,
    },

    /// A page identifier is negative or not smaller than the number of pages.
    #[error("Invalid reference from page {page}: target {target} is outside [0 . . {num_nodes})")]
    InvalidReference {
        page: i64,
        target: i64,
        num_nodes: usize,
    },

    /// The configuration or the shape of the input cannot produce a run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A shard failed during the compute phase; the whole run is aborted.
    #[error("Shard {shard} failed: {source}")]
    ShardComputeFailure {
        shard: usize,
        #[source]
        source: Box<PageRankError>,
    },

    /// A worker terminated without producing a result.
    #[error("Worker {worker} terminated: {reason}")]
    WorkerLost { worker: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PageRankError {
    /// Shorthand for [`PageRankError::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wraps `self` into a [`ShardComputeFailure`](Self::ShardComputeFailure)
    /// for the given shard, unless it already is one.
    pub fn in_shard(self, shard: usize) -> Self {
        match self {
            e @ Self::ShardComputeFailure { .. } => e,
            e => Self::ShardComputeFailure {
                shard,
                source: Box::new(e),
            },
        }
    }
}

pub type Result<T, E = PageRankError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_shard_does_not_nest() {
        let e = PageRankError::configuration("boom").in_shard(3).in_shard(5);
        match e {
            PageRankError::ShardComputeFailure { shard, source } => {
                assert_eq!(shard, 3);
                assert!(matches!(*source, PageRankError::Configuration(_)));
            }
            _ => panic!("Expected a shard failure"),
        }
    }
}
