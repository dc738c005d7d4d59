//! Column profile statistics.
//!
//! Tracks min, max, null_count, distinct_count, and total_count for a column.
//! Profiles are computed per Series in memory, or per batch and merged while
//! streaming.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{compare, Value};

/// Statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Minimum value observed (None if no non-null values)
    pub min: Option<Value>,
    /// Maximum value observed (None if no non-null values)
    pub max: Option<Value>,
    /// Number of null values
    pub null_count: u64,
    /// Exact distinct count of non-null values (None once merged)
    pub distinct_count: Option<u64>,
    /// Total number of values (including nulls)
    pub total_count: u64,
}

impl ColumnStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
            null_count: 0,
            distinct_count: None,
            total_count: 0,
        }
    }

    /// Profile a full column, including its distinct count.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut stats = Self::new();
        let mut seen = HashSet::new();
        for v in values {
            stats.update(v);
            if !v.is_null() {
                seen.insert(v.key());
            }
        }
        stats.distinct_count = Some(seen.len() as u64);
        stats
    }

    /// Update statistics with a new value.
    pub fn update(&mut self, value: &Value) {
        self.total_count += 1;

        if value.is_null() {
            self.null_count += 1;
            return;
        }

        match &mut self.min {
            Some(min) if compare(value, min).is_lt() => *min = value.clone(),
            Some(_) => {}
            None => self.min = Some(value.clone()),
        }

        match &mut self.max {
            Some(max) if compare(value, max).is_gt() => *max = value.clone(),
            Some(_) => {}
            None => self.max = Some(value.clone()),
        }
    }

    /// Merge statistics from another ColumnStats into this one.
    ///
    /// Used when combining profiles from multiple batches.
    pub fn merge(&self, other: &ColumnStats) -> ColumnStats {
        let pick = |a: &Option<Value>, b: &Option<Value>, want_lower: bool| match (a, b) {
            (Some(x), Some(y)) => {
                let x_first = if want_lower {
                    compare(x, y).is_le()
                } else {
                    compare(x, y).is_ge()
                };
                Some(if x_first { x.clone() } else { y.clone() })
            }
            (Some(x), None) => Some(x.clone()),
            (None, Some(y)) => Some(y.clone()),
            (None, None) => None,
        };

        ColumnStats {
            min: pick(&self.min, &other.min, true),
            max: pick(&self.max, &other.max, false),
            null_count: self.null_count + other.null_count,
            distinct_count: None, // distinct sets are not kept, so a merged count is unknown
            total_count: self.total_count + other.total_count,
        }
    }

    /// Get the number of non-null values.
    pub fn non_null_count(&self) -> u64 {
        self.total_count - self.null_count
    }

    /// Fraction of null cells, 0.0 for an empty column.
    pub fn null_fraction(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.null_count as f64 / self.total_count as f64
        }
    }
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for all columns of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaStats {
    /// Map from column name to its statistics
    pub column_stats: HashMap<String, ColumnStats>,
}

impl SchemaStats {
    /// Create empty schema statistics.
    pub fn new() -> Self {
        Self {
            column_stats: HashMap::new(),
        }
    }

    /// Get statistics for a column by name.
    pub fn get(&self, column_name: &str) -> Option<&ColumnStats> {
        self.column_stats.get(column_name)
    }

    /// Get or create statistics for a column.
    pub fn get_or_create(&mut self, column_name: String) -> &mut ColumnStats {
        self.column_stats.entry(column_name).or_default()
    }

    /// Merge statistics from another SchemaStats into this one.
    pub fn merge(&self, other: &SchemaStats) -> SchemaStats {
        let mut merged = SchemaStats::new();

        let mut all_columns: Vec<&String> = self
            .column_stats
            .keys()
            .chain(other.column_stats.keys())
            .collect();
        all_columns.sort();
        all_columns.dedup();

        for col_name in all_columns {
            let stats = match (self.column_stats.get(col_name), other.column_stats.get(col_name)) {
                (Some(a), Some(b)) => a.merge(b),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => continue,
            };
            merged.column_stats.insert(col_name.clone(), stats);
        }

        merged
    }
}

impl Default for SchemaStats {
    fn default() -> Self {
        Self::new()
    }
}
