/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Consumers of the final ranking.

use crate::errors::Result;
use crate::ranking::Ranking;
use std::io::Write;

/// A consumer of the result of a run.
pub trait ResultSink {
    /// Receives the number of iterations performed and the final ranking.
    fn accept(&mut self, iterations: usize, ranking: &Ranking<'_>) -> Result<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn accept(&mut self, iterations: usize, ranking: &Ranking<'_>) -> Result<()> {
        (**self).accept(iterations, ranking)
    }
}

/// A [`ResultSink`] writing the top-ranked pages in textual form.
///
/// The output is a header line `Number of Iterations = K` followed by one
/// line `page : score` for each of the top pages, by decreasing score.
///
/// # Examples
///
/// ```
/// use shardrank::ranking::Ranking;
/// use shardrank::sink::{ResultSink, TextSink};
///
/// let mut sink = TextSink::new(Vec::new()).top_k(2);
/// sink.accept(3, &Ranking::new(&[0.25, 0.5, 0.25])).unwrap();
/// assert_eq!(
///     String::from_utf8(sink.into_inner()).unwrap(),
///     "Number of Iterations = 3\n1 : 0.5\n0 : 0.25\n"
/// );
/// ```
#[derive(Debug)]
pub struct TextSink<W: Write> {
    writer: W,
    top_k: usize,
    precision: Option<usize>,
}

impl<W: Write> TextSink<W> {
    pub const DEFAULT_TOP_K: usize = 10;

    /// Creates a sink writing the top [`DEFAULT_TOP_K`](Self::DEFAULT_TOP_K)
    /// pages on `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            top_k: Self::DEFAULT_TOP_K,
            precision: None,
        }
    }

    /// Sets the number of pages to write.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the number of decimal digits of scores; by default, scores are
    /// written with the shortest representation that reads back exactly.
    pub fn precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for TextSink<W> {
    fn accept(&mut self, iterations: usize, ranking: &Ranking<'_>) -> Result<()> {
        writeln!(self.writer, "Number of Iterations = {iterations}")?;
        for (page, score) in ranking.iter().take(self.top_k) {
            match self.precision {
                Some(precision) => writeln!(self.writer, "{page} : {score:.precision$}")?,
                None => writeln!(self.writer, "{page} : {score}")?,
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
