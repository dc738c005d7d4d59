#![forbid(unsafe_code)]
//! tabula-exec: bounded-memory streaming over CSV sources.
//!
//! - `stream`: `BatchReader` and the `BatchConsumer` callback contract.
//! - `engine`: `Engine` (config + backend) opening re-readable sources.
//! - `agg`: single-pass streaming aggregations on running accumulators.
//! - `multipass`: sort/normalize/filter/sample (two passes) and row
//!   transforms that carry state across batches.
//! - `metrics`: trace hooks, no-ops without the `tracing` feature.
//!
//! Everything runs on the caller's thread; consumers are invoked in order.

pub mod agg;
pub mod engine;
pub mod metrics;
pub mod multipass;
pub mod stream;

pub use agg::RunningStats;
pub use engine::Engine;
pub use multipass::RollingOp;
pub use stream::{read_csv_batches, BatchConsumer, BatchReader, StreamSummary};
