/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Predicates implementing stopping conditions.
//!
//! The [coordinator](super::Coordinator) evaluates a [predicate](Predicate)
//! after each iteration: the computation stops as soon as it evaluates to
//! true. Predicates are evaluated only between iterations, never while shards
//! are computing.
//!
//! You can combine the predicates using the `and` and `or` methods provided
//! by the [`PredicateBooleanExt`](predicates::prelude::PredicateBooleanExt)
//! trait.
//!
//! # Examples
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use predicates::prelude::*;
//! use shardrank::rank::preds::{L2Norm, MaxIter};
//!
//! let mut predicate = L2Norm::try_from(1E-9)?.boxed();
//! predicate = predicate.or(MaxIter::from(100)).boxed();
//! #     Ok(())
//! # }
//! ```

use anyhow::ensure;
use predicates::{Predicate, reflection::PredicateReflection};
use std::fmt::Display;
use std::time::Duration;

/// This structure is passed to stopping predicates to provide the
/// information that is needed to evaluate them.
#[derive(Debug)]
pub struct PredParams {
    /// The number of completed iterations.
    pub iteration: usize,
    /// The Euclidean distance between the last two rank vectors.
    pub norm_delta: f64,
    /// The time elapsed since the start of the run.
    pub elapsed: Duration,
}

/// Stops after at most the provided number of iterations.
#[derive(Debug, Clone)]
pub struct MaxIter {
    max_iter: usize,
}

impl MaxIter {
    pub const DEFAULT_MAX_ITER: usize = 10;
}

impl From<usize> for MaxIter {
    fn from(max_iter: usize) -> Self {
        MaxIter { max_iter }
    }
}

impl Default for MaxIter {
    fn default() -> Self {
        Self::from(Self::DEFAULT_MAX_ITER)
    }
}

impl Display for MaxIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max iter: {})", self.max_iter))
    }
}

impl PredicateReflection for MaxIter {}

impl Predicate<PredParams> for MaxIter {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.iteration >= self.max_iter
    }
}

/// Stops when the Euclidean distance between successive rank vectors falls
/// strictly below a given threshold.
#[derive(Debug, Clone)]
pub struct L2Norm {
    threshold: f64,
}

impl L2Norm {
    pub const DEFAULT_THRESHOLD: f64 = 1E-9;

    /// Returns the threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl TryFrom<Option<f64>> for L2Norm {
    type Error = anyhow::Error;
    fn try_from(threshold: Option<f64>) -> anyhow::Result<Self> {
        Ok(match threshold {
            Some(threshold) => {
                ensure!(!threshold.is_nan(), "The threshold cannot be NaN");
                ensure!(threshold > 0.0, "The threshold must be positive");
                L2Norm { threshold }
            }
            None => Self::default(),
        })
    }
}

impl TryFrom<f64> for L2Norm {
    type Error = anyhow::Error;
    fn try_from(threshold: f64) -> anyhow::Result<Self> {
        Some(threshold).try_into()
    }
}

impl Default for L2Norm {
    fn default() -> Self {
        L2Norm {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl Display for L2Norm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(norm: {})", self.threshold))
    }
}

impl PredicateReflection for L2Norm {}
impl Predicate<PredParams> for L2Norm {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.norm_delta < self.threshold
    }
}

/// Stops when the run has lasted at least the given time.
///
/// The check happens between iterations, so the run can exceed the budget by
/// the duration of one iteration.
#[derive(Debug, Clone)]
pub struct MaxTime {
    max_time: Duration,
}

impl From<Duration> for MaxTime {
    fn from(max_time: Duration) -> Self {
        MaxTime { max_time }
    }
}

impl Display for MaxTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max time: {:?})", self.max_time))
    }
}

impl PredicateReflection for MaxTime {}
impl Predicate<PredParams> for MaxTime {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.elapsed >= self.max_time
    }
}
