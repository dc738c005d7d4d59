//! Re-openable byte sources.
//!
//! Multi-pass streaming operations read the same input more than once, so
//! they take a source they can reopen rather than a one-shot reader. Only
//! readability is required of the storage layer.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::PathBuf;

use crate::error::Result;

pub trait CsvSource {
    /// Open a fresh reader positioned at the start of the data.
    fn open(&self) -> Result<Box<dyn BufRead + '_>>;

    /// Short description for error context and traces.
    fn describe(&self) -> String;
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CsvSource for FileSource {
    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Bytes already resident in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl From<&str> for MemorySource {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for MemorySource {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl CsvSource for MemorySource {
    fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }

    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.bytes.len())
    }
}
