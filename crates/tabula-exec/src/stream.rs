//! Bounded-memory batch streaming.
//!
//! A `BatchReader` pulls at most `batch_size` rows from a `CsvReader` at a
//! time and hands them out as DataFrames. Each batch is indexed `0..n` on
//! its own; `BatchReader::rows_read` gives the offset of the next batch in
//! the source. Only the current batch is resident. A stream never emits an
//! empty batch; the final batch may be short.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tabula_accel::{default_backend, SharedBackend};
use tabula_core::config::EngineConfig;
use tabula_core::error::{Error, Result};
use tabula_core::types::Value;
use tabula_frame::DataFrame;
use tabula_io::{CsvReader, ReaderState};

use crate::metrics::emit_span;

/// Receives batches in source order. An error stops the stream and is
/// returned to the caller unchanged.
pub trait BatchConsumer {
    fn consume(&mut self, batch: DataFrame) -> Result<()>;
}

impl<F> BatchConsumer for F
where
    F: FnMut(DataFrame) -> Result<()>,
{
    fn consume(&mut self, batch: DataFrame) -> Result<()> {
        self(batch)
    }
}

/// What one pass over a source delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub columns: Vec<String>,
    pub rows: usize,
    pub batches: usize,
}

pub struct BatchReader<R: BufRead> {
    reader: CsvReader<R>,
    batch_size: usize,
    /// global position of the next row
    offset: usize,
    batches: usize,
    drained: bool,
    backend: SharedBackend,
}

impl<R: BufRead> BatchReader<R> {
    /// Parse the header (and the inference sample) of `reader`.
    ///
    /// Fails with `InvalidArgument` before touching the input when
    /// `batch_size` is zero.
    pub fn new(reader: R, config: &EngineConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::invalid("batch size must be at least 1, got 0"));
        }
        let reader = CsvReader::open(reader, config.csv.clone())?;
        emit_span(
            "stream_start",
            &[
                ("columns", reader.headers().len().to_string()),
                ("batch_size", config.batch_size.to_string()),
            ],
        );
        Ok(Self {
            reader,
            batch_size: config.batch_size,
            offset: 0,
            batches: 0,
            drained: false,
            backend: default_backend(),
        })
    }

    /// Backend attached to every emitted batch.
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn headers(&self) -> &[String] {
        self.reader.headers()
    }

    pub fn state(&self) -> ReaderState {
        self.reader.state()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn rows_read(&self) -> usize {
        self.offset
    }

    pub fn batches_emitted(&self) -> usize {
        self.batches
    }

    /// Fail with `NotFound` if any of `columns` is missing from the header.
    /// A source with no header at all is empty and passes.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        let headers = self.headers();
        if headers.is_empty() {
            return Ok(());
        }
        for c in columns {
            if !headers.iter().any(|h| h == c) {
                return Err(Error::not_found(format!("column '{}'", c)));
            }
        }
        Ok(())
    }

    /// The next batch of up to `batch_size` rows, or `None` once drained.
    pub fn next_batch(&mut self) -> Result<Option<DataFrame>> {
        let rows = self.reader.next_rows(self.batch_size)?;
        if rows.is_empty() {
            if self.drained {
                return Ok(None);
            }
            self.drained = true;
            emit_span(
                "stream_drained",
                &[
                    ("rows", self.offset.to_string()),
                    ("batches", self.batches.to_string()),
                ],
            );
            return Ok(None);
        }

        self.offset += rows.len();
        self.batches += 1;
        let batch = DataFrame::from_rows(self.headers().to_vec(), rows)?.with_backend(self.backend.clone());

        emit_span(
            "batch",
            &[
                ("batch", self.batches.to_string()),
                ("rows", batch.len().to_string()),
            ],
        );
        Ok(Some(batch))
    }

    /// Drive every remaining batch into `consumer`, synchronously and in order.
    pub fn for_each_batch<C: BatchConsumer + ?Sized>(&mut self, consumer: &mut C) -> Result<StreamSummary> {
        while let Some(batch) = self.next_batch()? {
            consumer.consume(batch)?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            columns: self.headers().to_vec(),
            rows: self.offset,
            batches: self.batches,
        }
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = Result<DataFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

/// Stream `reader` into `consumer` in batches of `config.batch_size` rows.
pub fn read_csv_batches<R, C>(reader: R, config: &EngineConfig, consumer: &mut C) -> Result<StreamSummary>
where
    R: BufRead,
    C: BatchConsumer + ?Sized,
{
    BatchReader::new(reader, config)?.for_each_batch(consumer)
}

/// Re-chunks selected rows into output batches of the stream's batch size.
///
/// Used by operations whose output rows are a subset of their input rows, so
/// that consumers still see full batches and never an empty one.
pub(crate) struct Rebatcher {
    columns: Vec<String>,
    batch_size: usize,
    rows: Vec<Vec<Value>>,
    backend: SharedBackend,
    emitted: usize,
}

impl Rebatcher {
    pub(crate) fn new(columns: Vec<String>, batch_size: usize, backend: SharedBackend) -> Self {
        Self {
            columns,
            batch_size,
            rows: Vec::with_capacity(batch_size),
            backend,
            emitted: 0,
        }
    }

    /// Queue `positions` of `batch`, emitting every full batch.
    pub(crate) fn push<C: BatchConsumer + ?Sized>(
        &mut self,
        batch: &DataFrame,
        positions: &[usize],
        consumer: &mut C,
    ) -> Result<()> {
        for &p in positions {
            self.rows.push(batch.iloc(p)?.values());
            if self.rows.len() == self.batch_size {
                self.emit(consumer)?;
            }
        }
        Ok(())
    }

    fn emit<C: BatchConsumer + ?Sized>(&mut self, consumer: &mut C) -> Result<()> {
        let rows = std::mem::take(&mut self.rows);
        let batch = DataFrame::from_rows(self.columns.clone(), rows)?.with_backend(self.backend.clone());
        self.emitted += 1;
        consumer.consume(batch)
    }

    /// Flush the short final batch, if any. Returns the number of batches emitted.
    pub(crate) fn finish<C: BatchConsumer + ?Sized>(mut self, consumer: &mut C) -> Result<usize> {
        if !self.rows.is_empty() {
            self.emit(consumer)?;
        }
        Ok(self.emitted)
    }
}
