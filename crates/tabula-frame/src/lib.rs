#![forbid(unsafe_code)]
//! tabula-frame: immutable Series and DataFrame.
//!
//! - `series`: labeled 1-D column with null handling, sorting, and numeric
//!   reductions dispatched through an acceleration backend.
//! - `frame`: column-major table sharing one row index; selection, column
//!   edits, row filters, aggregation, correlation, vectorized ops.
//! - `groupby` / `join`: in-memory group-by and hash equality joins.
//! - `csv`: whole-input CSV read and write.
//!
//! Everything here is resident in memory; see `tabula-exec` for the
//! bounded-memory streaming path.
//!
//! `df["name"]` is shorthand for tests and scripts and panics when the
//! column is missing. Library code should call `DataFrame::column` or
//! `DataFrame::column_values`, which return `Error::NotFound` instead.

pub mod agg;
pub mod csv;
pub mod frame;
pub mod groupby;
pub mod join;
pub mod series;

pub use agg::AggFunc;
pub use csv::{read_csv, read_csv_path, read_csv_source, read_csv_str};
pub use frame::{DataFrame, Row};
pub use groupby::{Group, GroupBy};
pub use join::JoinType;
pub use series::Series;
