//! Common imports for downstream crates.

pub use crate::config::{CsvOptions, EngineConfig};
pub use crate::error::{Error, Result};
pub use crate::infer::{classify, convert, ColumnConverter, SampleClass};
pub use crate::stats::{ColumnStats, SchemaStats};
pub use crate::types::{Label, Value, ValueKey, ValueKind};
