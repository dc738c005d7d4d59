#![forbid(unsafe_code)]
//! tabula-core: shared kernel for the tabula engine.
//!
//! This crate contains only *pure* types and helpers: the cell value model,
//! row labels, single-sample type inference, the error taxonomy, engine
//! configuration, and column statistics. There is **no I/O** here.
//!
//! Crates that use this:
//! - tabula-accel: numeric backends report length mismatches through `Error`.
//! - tabula-io: converts tokenized CSV fields into `Value`s via `infer`.
//! - tabula-frame: builds Series/DataFrame over `Value` and `Label`.
//! - tabula-exec: drives streaming reads using `EngineConfig`.

pub mod config;
pub mod error;
pub mod infer;
pub mod prelude;
pub mod stats;
pub mod types;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
