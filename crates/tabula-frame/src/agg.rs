//! Aggregation functions shared by `DataFrame::agg` and `GroupBy::agg`.

use std::fmt;
use std::str::FromStr;

use tabula_accel::AccelBackend;
use tabula_core::error::{Error, Result};
use tabula_core::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl AggFunc {
    /// Parse "sum", "mean", "min", "max", "count" ("avg" is accepted for mean).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "mean" | "avg" => Ok(AggFunc::Mean),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            "count" => Ok(AggFunc::Count),
            other => Err(Error::invalid(format!("unknown aggregation: {}", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
        }
    }

    /// Apply to one column's cells.
    ///
    /// `Count` is the non-null count. Numeric ops over a column holding any
    /// non-null non-numeric cell give `Null`.
    pub fn apply(self, values: &[Value], backend: &dyn AccelBackend) -> Value {
        let reduce: fn(&dyn AccelBackend, &[f64]) -> f64 = match self {
            AggFunc::Sum => |b, xs| b.sum(xs),
            AggFunc::Mean => |b, xs| b.mean(xs),
            AggFunc::Min => |b, xs| b.min(xs),
            AggFunc::Max => |b, xs| b.max(xs),
            AggFunc::Count => {
                let n = values.iter().filter(|v| !v.is_null()).count();
                return Value::I64(n as i64);
            }
        };

        let mut xs = Vec::with_capacity(values.len());
        for v in values.iter().filter(|v| !v.is_null()) {
            match v.as_f64() {
                Some(x) => xs.push(x),
                None => return Value::Null,
            }
        }
        Value::F64(reduce(backend, &xs))
    }
}

impl FromStr for AggFunc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AggFunc::parse(s)
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
