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

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, ValueEnum};
use jiff::SpanRound;
use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

pub mod pagerank;

pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    pub fn version_string() -> String {
        format!(
            "{}
git info: {} {} {}
build info: built on {} for {} with {}",
            PKG_VERSION,
            GIT_VERSION.unwrap_or(""),
            GIT_COMMIT_HASH.unwrap_or(""),
            match GIT_DIRTY {
                None => "",
                Some(true) => "(dirty)",
                Some(false) => "(clean)",
            },
            BUILD_DATE,
            TARGET,
            RUSTC_VERSION
        )
    }
}

/// Parses the number of workers from a string.
///
/// This function is meant to be used with `#[arg(..., value_parser =
/// num_workers_parser)]`.
pub fn num_workers_parser(arg: &str) -> Result<usize> {
    let num_workers = arg.parse::<usize>()?;
    ensure!(num_workers > 0, "Number of workers must be greater than 0");
    Ok(num_workers)
}

/// Formats for storing rank vectors.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FloatVectorFormat {
    /// One score per line, in page order.
    Ascii,
    /// A JSON array of scores, in page order.
    Json,
}

impl FloatVectorFormat {
    /// Stores `values` at `path`, creating parent directories as needed.
    ///
    /// With a `precision`, scores are written with that many decimal digits;
    /// otherwise, they are written in the shortest form that parses back to
    /// the same value.
    pub fn store(
        &self,
        path: impl AsRef<Path>,
        values: &[f64],
        precision: Option<usize>,
    ) -> Result<()> {
        let path = path.as_ref();
        create_parent_dir(path)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create vector at {}", path.display()))?;
        log::info!(
            "Storing {} scores in {:?} format at {}",
            values.len(),
            self,
            path.display()
        );
        self.write(BufWriter::new(file), values, precision)
            .with_context(|| format!("Could not write vector to {}", path.display()))
    }

    /// Writes `values` on `writer` and flushes it.
    pub fn write(
        &self,
        mut writer: impl Write,
        values: &[f64],
        precision: Option<usize>,
    ) -> std::io::Result<()> {
        let mut buf = zmij::Buffer::new();
        let mut score = |writer: &mut dyn Write, x: f64| match precision {
            None => writer.write_all(buf.format(x).as_bytes()),
            Some(precision) => write!(writer, "{x:.precision$}"),
        };
        match self {
            FloatVectorFormat::Ascii => {
                for &x in values {
                    score(&mut writer, x)?;
                    writeln!(writer)?;
                }
            }
            FloatVectorFormat::Json => {
                write!(writer, "[")?;
                for (i, &x) in values.iter().enumerate() {
                    if i != 0 {
                        write!(writer, ", ")?;
                    }
                    score(&mut writer, x)?;
                }
                write!(writer, "]")?;
            }
        }
        writer.flush()
    }
}

/// Creates all parent directories of the given file path.
pub fn create_parent_dir(file_path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent_dir) = file_path.as_ref().parent() {
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create the directory {}", parent_dir.display()))?;
    }
    Ok(())
}

/// Parses a duration for `--log-interval` and `--max-time`.
///
/// A bare integer is a number of milliseconds. Anything else is parsed by
/// [`jiff`] in its friendly format (e.g., `1h30m`, `2.5s`, `500ms`) or as an
/// ISO 8601 duration (e.g., `PT10S`).
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }
    let duration: jiff::SignedDuration = value
        .parse()
        .with_context(|| format!("Invalid duration {value:?}"))?;
    ensure!(!duration.is_negative(), "Negative duration {value:?}");
    Ok(Duration::try_from(duration)?)
}

/// Formats elapsed times as compact spans rounded to the millisecond, such as
/// `1h2m3s456ms`.
pub struct ElapsedFormat {
    printer: SpanPrinter,
    round: SpanRound<'static>,
}

impl Default for ElapsedFormat {
    fn default() -> Self {
        Self {
            printer: SpanPrinter::new()
                .spacing(Spacing::None)
                .designator(Designator::Compact),
            round: SpanRound::new()
                .largest(jiff::Unit::Day)
                .smallest(jiff::Unit::Millisecond)
                .days_are_24_hours(),
        }
    }
}

impl ElapsedFormat {
    /// Returns `elapsed` as a compact span.
    pub fn format(&self, elapsed: Duration) -> Result<String, jiff::Error> {
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64)
            .round(self.round)?;
        Ok(self.printer.span_to_string(&span))
    }
}

/// Initializes `env_logger` so that each line carries the wall-clock time,
/// the time elapsed since initialization and the name of the thread.
///
/// The default filter is `info`; it can be changed with `RUST_LOG`.
pub fn init_env_logger() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let start = Instant::now();
    let elapsed_format = ElapsedFormat::default();

    builder.format(move |buf, record| {
        let now = jiff::Timestamp::try_from(SystemTime::now()).map_err(std::io::Error::other)?;
        let elapsed = elapsed_format
            .format(start.elapsed())
            .map_err(std::io::Error::other)?;
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{} {elapsed} {style}{}{style:#} [{}] {} - {}",
            now.strftime("%F %T%.3f"),
            record.level(),
            std::thread::current().name().unwrap_or("main"),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[arg(long, value_parser = parse_duration, global = true, display_order = 1000)]
    /// How often to log progress [default: 10s]. A bare number is in
    /// milliseconds; otherwise, use units as in "500ms", "2s" or "1h30m".
    pub log_interval: Option<Duration>,
}

#[derive(Parser, Debug)]
#[command(name = "shardrank", version=build_info::version_string())]
/// Computes PageRank on a graph split into shards, each handled by a worker.
///
/// The graph is read from a text file containing one line per page: the
/// identifier of the page followed by the identifiers of the pages it links
/// to. The top pages are written to standard output, preceded by the number
/// of iterations.
///
/// Noteworthy environment variables:
///
/// - RUST_MIN_STACK: minimum thread stack size (in bytes).
///
/// - RUST_LOG: configuration for env_logger
///   <https://docs.rs/env_logger/latest/env_logger/>.
pub struct Cli {
    #[clap(flatten)]
    pub args: GlobalArgs,
    #[clap(flatten)]
    pub rank: pagerank::CliArgs,
}

/// The entry point of the command-line interface.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = Instant::now();
    let cli = Cli::parse_from(args);
    pagerank::main(cli.args, cli.rank)?;

    log::info!(
        "The command took {}",
        ElapsedFormat::default().format(start.elapsed())?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardrank::prelude::*;

    fn rank_of(input: &str, iterations: usize) -> RankOutcome {
        let graph = AdjGraph::load(input.as_bytes()).unwrap();
        let config = Config {
            iterations: Some(iterations),
            workers: 2,
            ..Config::default()
        };
        Coordinator::new(&graph, config).unwrap().run().unwrap()
    }

    #[test]
    fn test_store_rank_json() {
        let outcome = rank_of("0 1\n1 2\n2 0 1\n", 20);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranks").join("rank.json");
        FloatVectorFormat::Json
            .store(&path, &outcome.rank, None)
            .unwrap();
        let stored: Vec<f64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        // Shortest round-trip formatting loses nothing
        assert_eq!(stored, outcome.rank.to_vec());
        assert!((stored.iter().sum::<f64>() - 1.0).abs() < 1E-12);
    }

    #[test]
    fn test_store_rank_ascii_with_precision() {
        // A dangling page spreads its rank evenly, so one step keeps 1/4 each
        let outcome = rank_of("0\n1\n2\n3\n", 1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rank.txt");
        FloatVectorFormat::Ascii
            .store(&path, &outcome.rank, Some(3))
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0.250\n0.250\n0.250\n0.250\n"
        );
    }

    #[test]
    fn test_write_empty_rank() {
        let outcome = rank_of("", 1);
        let mut json = Vec::new();
        FloatVectorFormat::Json
            .write(&mut json, &outcome.rank, Some(2))
            .unwrap();
        assert_eq!(json, b"[]");
        let mut ascii = Vec::new();
        FloatVectorFormat::Ascii
            .write(&mut ascii, &outcome.rank, None)
            .unwrap();
        assert!(ascii.is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("PT2S").unwrap(), Duration::from_secs(2));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_elapsed_format() {
        let format = ElapsedFormat::default();
        assert_eq!(format.format(Duration::from_millis(1500)).unwrap(), "1s500ms");
        assert_eq!(
            format.format(Duration::from_secs(2 * 3600 + 61)).unwrap(),
            "2h1m1s"
        );
    }

    #[test]
    fn test_num_workers_parser() {
        assert_eq!(num_workers_parser("4").unwrap(), 4);
        assert!(num_workers_parser("0").is_err());
        assert!(num_workers_parser("-1").is_err());
    }
}
