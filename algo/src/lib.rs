/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod errors;
pub mod graph;
pub mod partition;
pub mod rank;
pub mod ranking;
pub mod sink;

pub mod prelude {
    pub use crate::errors::{PageRankError, Result};
    pub use crate::graph::AdjGraph;
    pub use crate::partition::{Shard, Strategy, partition};
    pub use crate::rank::preds::{L2Norm, MaxIter, MaxTime, PredParams};
    pub use crate::rank::{
        ChannelExchange, Config, Coordinator, Exchange, Phase, RankEngine, RankOutcome,
        RayonExchange,
    };
    pub use crate::ranking::Ranking;
    pub use crate::sink::{ResultSink, TextSink};
}
