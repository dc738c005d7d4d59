#![forbid(unsafe_code)]
//! tabula-io: CSV tokenizing and streaming readers/writers.
//!
//! - `tokenize`: quote-aware single-line field splitter.
//! - `readers`: encoding-aware line reader and the CSV reader state machine
//!   that yields typed rows one at a time.
//! - `writers`: CSV writer for typed rows (non-quoting by default).
//! - `source`: re-openable byte sources for multi-pass streaming.
//!
//! Nothing here knows about DataFrames; callers assemble rows into frames.

pub mod error;
pub mod readers;
pub mod source;
pub mod tokenize;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::{CsvReader, ReaderState};
pub use source::{CsvSource, FileSource, MemorySource};
pub use tokenize::parse_line;
pub use writers::csv::{CsvWriter, QuoteMode};
