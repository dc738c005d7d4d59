//! Engine: owns the configuration and backend shared by every streaming
//! operation, and opens sources as batch readers.

use std::io::BufRead;

use tabula_accel::{default_backend, resolve, AccelBackend, SharedBackend};
use tabula_core::config::EngineConfig;
use tabula_core::error::Result;
use tabula_frame::DataFrame;
use tabula_io::CsvSource;

use crate::stream::{BatchConsumer, BatchReader, StreamSummary};

pub struct Engine {
    config: EngineConfig,
    backend: SharedBackend,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            backend: default_backend(),
        }
    }

    /// Configuration from `TABULA_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub(crate) fn accel(&self) -> &dyn AccelBackend {
        resolve(self.backend.as_ref())
    }

    /// Open a fresh pass over `source`.
    pub fn open<'s>(&self, source: &'s dyn CsvSource) -> Result<BatchReader<Box<dyn BufRead + 's>>> {
        let context = || format!("streaming {}", source.describe());
        let reader = source
            .open()
            .map_err(|e| tabula_core::Error::from(e).with_context(context()))?;
        Ok(BatchReader::new(reader, &self.config)
            .map_err(|e| e.with_context(context()))?
            .with_backend(self.backend.clone()))
    }

    /// Stream every batch of `source` into `consumer`.
    pub fn stream<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        self.open(source)?.for_each_batch(consumer)
    }

    /// One pass with a borrowing visitor, after checking that `columns` exist.
    pub(crate) fn scan(
        &self,
        source: &dyn CsvSource,
        columns: &[&str],
        mut visit: impl FnMut(&DataFrame) -> Result<()>,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        reader.require_columns(columns)?;
        while let Some(batch) = reader.next_batch()? {
            visit(&batch)?;
        }
        Ok(reader.summary())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
