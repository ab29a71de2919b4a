/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{FloatVectorFormat, GlobalArgs, create_parent_dir, num_workers_parser, parse_duration};
use anyhow::{Context, Result};
use clap::Args;
use dsi_progress_logger::{ProgressLog, progress_logger};
use predicates::prelude::*;
use shardrank::prelude::*;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

/// How pages are assigned to workers.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliStrategy {
    /// Intervals of consecutive pages; the first worker takes the remainder.
    #[default]
    Contiguous,
    /// Page p goes to worker p mod w.
    Striped,
}

impl From<CliStrategy> for Strategy {
    fn from(s: CliStrategy) -> Self {
        match s {
            CliStrategy::Contiguous => Strategy::Contiguous,
            CliStrategy::Striped => Strategy::Striped,
        }
    }
}

/// How the coordinator exchanges data with the workers.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliExchange {
    /// Workers are tasks of a Rayon thread pool.
    #[default]
    Rayon,
    /// Workers are threads receiving rank vectors on channels.
    Channels,
}

#[derive(Args, Debug)]
pub struct CliArgs {
    /// The graph, one line per page: the page followed by its out-links.
    pub input: PathBuf,

    #[arg(short, long)]
    /// Also write the top pages to this file.
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    /// Maximum number of iterations [default: 10 if no threshold is given].
    pub iterations: Option<usize>,

    #[arg(short, long, default_value_t = Config::DEFAULT_DAMPING)]
    /// The damping factor (must be in the interval (0 . . 1)).
    pub damping: f64,

    #[arg(short, long)]
    /// Stop when the Euclidean distance between successive rank vectors is
    /// below this threshold.
    pub threshold: Option<f64>,

    #[arg(long, value_parser = parse_duration)]
    /// Stop after the first iteration ending after this time, given as for
    /// --log-interval.
    pub max_time: Option<Duration>,

    #[arg(
        short = 'j',
        long,
        default_value_t = Config::default().workers,
        value_parser = num_workers_parser
    )]
    /// The number of workers, and of shards.
    pub workers: usize,

    #[arg(long, value_enum, default_value_t = CliStrategy::Contiguous)]
    /// How pages are assigned to workers.
    pub strategy: CliStrategy,

    #[arg(long, value_enum, default_value_t = CliExchange::Rayon)]
    /// How rank vectors and contributions are exchanged with the workers.
    pub exchange: CliExchange,

    #[arg(short = 'k', long, default_value_t = TextSink::<std::io::Stdout>::DEFAULT_TOP_K)]
    /// The number of top pages to write.
    pub top: usize,

    #[arg(long)]
    /// Where to store the whole rank vector.
    pub rank_vector: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The output format for the rank vector.
    pub fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for scores.
    pub precision: Option<usize>,
}

impl CliArgs {
    /// Returns the library configuration described by the arguments.
    pub fn config(&self) -> Config {
        let iterations = match (self.iterations, self.threshold) {
            (None, None) => Some(MaxIter::DEFAULT_MAX_ITER),
            (iterations, _) => iterations,
        };
        Config {
            damping: self.damping,
            iterations,
            threshold: self.threshold,
            workers: self.workers,
            strategy: self.strategy.into(),
        }
    }
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let mut pl = progress_logger![];
    pl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let graph = AdjGraph::load_from_path(&args.input)
        .with_context(|| format!("Could not load the graph from {}", args.input.display()))?;
    log::info!(
        "{} pages, {} arcs, {} dangling pages",
        graph.num_nodes(),
        graph.num_arcs(),
        graph.num_dangling()
    );

    let config = args.config();
    let mut predicate = config.predicate()?;
    if let Some(max_time) = args.max_time {
        predicate = predicate.or(MaxTime::from(max_time)).boxed();
    }

    let outcome = match args.exchange {
        CliExchange::Rayon => {
            Coordinator::new(&graph, config)?.run_until_with_logging(predicate, &mut pl)?
        }
        CliExchange::Channels => {
            Coordinator::with_exchange(&graph, config, ChannelExchange::new())?
                .run_until_with_logging(predicate, &mut pl)?
        }
    };

    if !outcome.converged && args.threshold.is_some() {
        log::warn!(
            "The threshold was not reached: the last norm delta is {}",
            outcome.norm_delta
        );
    }

    let ranking = outcome.ranking();
    TextSink::new(std::io::stdout().lock())
        .top_k(args.top)
        .precision(args.precision)
        .accept(outcome.iterations, &ranking)?;

    if let Some(output) = &args.output {
        create_parent_dir(output)?;
        let file = std::fs::File::create(output)
            .with_context(|| format!("Could not create {}", output.display()))?;
        let mut sink = TextSink::new(BufWriter::new(file))
            .top_k(args.top)
            .precision(args.precision);
        sink.accept(outcome.iterations, &ranking)
            .with_context(|| format!("Could not write to {}", output.display()))?;
        sink.into_inner()
            .flush()
            .with_context(|| format!("Could not write to {}", output.display()))?;
    }

    if let Some(path) = &args.rank_vector {
        args.fmt.store(path, &outcome.rank, args.precision)?;
    }

    Ok(())
}
