//! Streaming aggregations.
//!
//! Each operation makes one pass, folding every batch into a small running
//! accumulator, and finalizes the statistic after the last batch. Only the
//! non-null numeric cells of the target column take part; text cells are
//! skipped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tabula_accel::{AccelBackend, Describe};
use tabula_core::error::Result;
use tabula_core::stats::SchemaStats;
use tabula_core::types::{Value, ValueKey};
use tabula_frame::{AggFunc, DataFrame};
use tabula_io::CsvSource;

use crate::engine::Engine;

/// Running scalars for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl RunningStats {
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }

    /// Accumulator for one batch's values, reduced through `backend`.
    pub fn from_values(values: &[f64], backend: &dyn AccelBackend) -> Result<Self> {
        if values.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            count: values.len() as u64,
            sum: backend.sum(values),
            sum_sq: backend.dot_product(values, values)?,
            min: backend.min(values),
            max: backend.max(values),
        })
    }

    pub fn merge(&mut self, other: &RunningStats) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    /// `(Σx² − (Σx)²/n) / (n − 1)`: 0 for one value, NaN for none. Rounding
    /// below zero is clamped.
    pub fn variance(&self) -> f64 {
        match self.count {
            0 => f64::NAN,
            1 => 0.0,
            n => {
                let n = n as f64;
                ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
            }
        }
    }

    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.max
        }
    }

    pub fn describe(&self) -> Describe {
        Describe {
            count: self.count as usize,
            mean: self.mean(),
            std: self.std(),
            min: self.min(),
            max: self.max(),
        }
    }
}

fn finish(f: AggFunc, stats: &RunningStats, non_null: u64) -> Value {
    match f {
        AggFunc::Sum => Value::F64(stats.sum),
        AggFunc::Mean => Value::F64(stats.mean()),
        AggFunc::Min => Value::F64(stats.min()),
        AggFunc::Max => Value::F64(stats.max()),
        AggFunc::Count => Value::I64(non_null as i64),
    }
}

/// Non-null numeric cells of `column` in one batch.
pub(crate) fn numeric_cells(batch: &DataFrame, column: &str) -> Result<Vec<f64>> {
    Ok(batch
        .column_values(column)?
        .iter()
        .filter_map(Value::as_f64)
        .collect())
}

/// Per-key accumulators in first-seen key order.
#[derive(Default)]
struct GroupTable {
    slot: HashMap<ValueKey, usize>,
    groups: Vec<(Value, RunningStats)>,
}

impl GroupTable {
    fn entry(&mut self, key: &Value) -> &mut RunningStats {
        let next = self.groups.len();
        let i = *self.slot.entry(key.key()).or_insert(next);
        if i == next {
            self.groups.push((key.clone(), RunningStats::default()));
        }
        &mut self.groups[i].1
    }

    fn into_frame(
        self,
        key_column: &str,
        value_column: &str,
        finish: impl Fn(&RunningStats) -> Value,
    ) -> Result<DataFrame> {
        let (keys, vals): (Vec<Value>, Vec<Value>) = self
            .groups
            .iter()
            .map(|(k, s)| (k.clone(), finish(s)))
            .unzip();
        DataFrame::from_columns(vec![(key_column, keys), (value_column, vals)])
    }
}

impl Engine {
    /// Running statistics of one column over the whole source.
    pub fn batch_stats(&self, source: &dyn CsvSource, column: &str) -> Result<RunningStats> {
        let mut total = RunningStats::default();
        self.scan(source, &[column], |batch| {
            let xs = numeric_cells(batch, column)?;
            total.merge(&RunningStats::from_values(&xs, self.accel())?);
            Ok(())
        })?;
        Ok(total)
    }

    /// 0 for an empty column.
    pub fn batch_sum(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.sum)
    }

    pub fn batch_mean(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.mean())
    }

    pub fn batch_min(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.min())
    }

    pub fn batch_max(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.max())
    }

    pub fn batch_variance(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.variance())
    }

    pub fn batch_std(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.std())
    }

    pub fn batch_describe(&self, source: &dyn CsvSource, column: &str) -> Result<Describe> {
        Ok(self.batch_stats(source, column)?.describe())
    }

    pub fn batch_norm(&self, source: &dyn CsvSource, column: &str) -> Result<f64> {
        Ok(self.batch_stats(source, column)?.sum_sq.sqrt())
    }

    /// Non-null cells of any type.
    pub fn batch_count(&self, source: &dyn CsvSource, column: &str) -> Result<u64> {
        let mut count = 0u64;
        self.scan(source, &[column], |batch| {
            count += batch
                .column_values(column)?
                .iter()
                .filter(|v| !v.is_null())
                .count() as u64;
            Ok(())
        })?;
        Ok(count)
    }

    /// Distinct non-null values.
    pub fn batch_nunique(&self, source: &dyn CsvSource, column: &str) -> Result<usize> {
        let mut seen: HashSet<ValueKey> = HashSet::new();
        self.scan(source, &[column], |batch| {
            seen.extend(
                batch
                    .column_values(column)?
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(Value::key),
            );
            Ok(())
        })?;
        Ok(seen.len())
    }

    /// Sums of several columns in a single pass.
    pub fn batch_sum_multiple(&self, source: &dyn CsvSource, columns: &[&str]) -> Result<Vec<(String, f64)>> {
        let mut sums = vec![0.0; columns.len()];
        self.scan(source, columns, |batch| {
            for (acc, c) in sums.iter_mut().zip(columns) {
                *acc += self.accel().sum(&numeric_cells(batch, c)?);
            }
            Ok(())
        })?;
        Ok(columns.iter().map(|c| c.to_string()).zip(sums).collect())
    }

    /// `describe` for every column whose first non-null value is numeric.
    pub fn batch_describe_all(&self, source: &dyn CsvSource) -> Result<Vec<(String, Describe)>> {
        // None until the column's first non-null cell decides it
        let mut state: Vec<Option<Option<RunningStats>>> = Vec::new();
        let summary = self.scan(source, &[], |batch| {
            if state.is_empty() {
                state = vec![None; batch.columns().len()];
            }
            for (slot, name) in state.iter_mut().zip(batch.columns()) {
                let cells = batch.column_values(name)?;
                if slot.is_none() {
                    if let Some(first) = cells.iter().find(|v| !v.is_null()) {
                        *slot = Some(first.is_numeric().then(RunningStats::default));
                    }
                }
                if let Some(Some(stats)) = slot {
                    let xs: Vec<f64> = cells.iter().filter_map(Value::as_f64).collect();
                    stats.merge(&RunningStats::from_values(&xs, self.accel())?);
                }
            }
            Ok(())
        })?;
        Ok(summary
            .columns
            .into_iter()
            .zip(state)
            .filter_map(|(name, s)| s.flatten().map(|stats| (name, stats.describe())))
            .collect())
    }

    /// Running stats and non-null cell count for each of `columns`, in one
    /// pass.
    fn column_accumulators(&self, source: &dyn CsvSource, columns: &[&str]) -> Result<Vec<(RunningStats, u64)>> {
        let mut acc = vec![(RunningStats::default(), 0u64); columns.len()];
        self.scan(source, columns, |batch| {
            for ((stats, non_null), column) in acc.iter_mut().zip(columns) {
                let cells = batch.column_values(column)?;
                *non_null += cells.iter().filter(|v| !v.is_null()).count() as u64;
                let xs: Vec<f64> = cells.iter().filter_map(Value::as_f64).collect();
                stats.merge(&RunningStats::from_values(&xs, self.accel())?);
            }
            Ok(())
        })?;
        Ok(acc)
    }

    /// One-row frame with a column per op (`sum`, `mean`, `min`, `max`,
    /// `count`), computed in a single pass.
    pub fn batch_aggregate(&self, source: &dyn CsvSource, column: &str, ops: &[&str]) -> Result<DataFrame> {
        let funcs = ops.iter().map(|op| AggFunc::parse(op)).collect::<Result<Vec<_>>>()?;
        let acc = self.column_accumulators(source, &[column])?;
        let (stats, non_null) = acc.first().copied().unwrap_or_default();
        let columns = funcs
            .iter()
            .map(|&f| (f.as_str(), vec![finish(f, &stats, non_null)]))
            .collect();
        DataFrame::from_columns(columns)
    }

    /// Several columns, each with its own ops, in a single pass.
    ///
    /// Returns one row per `(column, op)` pair, in the order given, with an
    /// `operation` column (`{column}_{op}`) and a float `value` column.
    pub fn batch_aggregate_multiple(&self, source: &dyn CsvSource, ops: &[(&str, &[&str])]) -> Result<DataFrame> {
        let plan = ops
            .iter()
            .map(|(column, names)| {
                let funcs = names.iter().map(|op| AggFunc::parse(op)).collect::<Result<Vec<_>>>()?;
                Ok((*column, funcs))
            })
            .collect::<Result<Vec<_>>>()?;
        let columns: Vec<&str> = plan.iter().map(|(c, _)| *c).collect();
        let acc = self.column_accumulators(source, &columns)?;

        let mut labels = Vec::new();
        let mut values = Vec::new();
        for ((column, funcs), (stats, non_null)) in plan.iter().zip(&acc) {
            for &f in funcs {
                labels.push(Value::Str(format!("{}_{}", column, f)));
                values.push(Value::F64(finish(f, stats, *non_null).as_f64().unwrap_or(f64::NAN)));
            }
        }
        DataFrame::from_columns(vec![("operation", labels), ("value", values)])
    }

    fn group_stats(&self, source: &dyn CsvSource, group: &str, value: &str) -> Result<GroupTable> {
        let mut table = GroupTable::default();
        self.scan(source, &[group, value], |batch| {
            let keys = batch.column_values(group)?;
            let vals = batch.column_values(value)?;
            for (k, v) in keys.iter().zip(vals) {
                if k.is_null() {
                    continue;
                }
                if let Some(x) = v.as_f64() {
                    table.entry(k).update(x);
                }
            }
            Ok(())
        })?;
        Ok(table)
    }

    /// Per-key sum of `value`; keys in first-seen order, null keys skipped.
    pub fn batch_group_by_sum(&self, source: &dyn CsvSource, group: &str, value: &str) -> Result<DataFrame> {
        self.group_stats(source, group, value)?
            .into_frame(group, value, |s| Value::F64(s.sum))
    }

    pub fn batch_group_by_mean(&self, source: &dyn CsvSource, group: &str, value: &str) -> Result<DataFrame> {
        self.group_stats(source, group, value)?
            .into_frame(group, value, |s| Value::F64(s.mean()))
    }

    /// Rows per non-null key, as a `count` column.
    pub fn batch_group_by_count(&self, source: &dyn CsvSource, group: &str) -> Result<DataFrame> {
        let mut table = GroupTable::default();
        self.scan(source, &[group], |batch| {
            for k in batch.column_values(group)?.iter().filter(|k| !k.is_null()) {
                table.entry(k).count += 1;
            }
            Ok(())
        })?;
        table.into_frame(group, "count", |s| Value::I64(s.count as i64))
    }

    /// Dot product over rows where both cells are numeric.
    pub fn batch_dot_product(&self, source: &dyn CsvSource, a: &str, b: &str) -> Result<f64> {
        let mut total = 0.0;
        self.scan(source, &[a, b], |batch| {
            let (xs, ys): (Vec<f64>, Vec<f64>) = batch
                .column_values(a)?
                .iter()
                .zip(batch.column_values(b)?)
                .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
                .unzip();
            total += self.accel().dot_product(&xs, &ys)?;
            Ok(())
        })?;
        Ok(total)
    }

    /// Column statistics merged across batches. Distinct counts are not
    /// tracked across batches and come back as `None`.
    pub fn batch_column_stats(&self, source: &dyn CsvSource) -> Result<SchemaStats> {
        let mut merged: Option<SchemaStats> = None;
        self.scan(source, &[], |batch| {
            let s = batch.stats();
            merged = Some(match merged.take() {
                Some(m) => m.merge(&s),
                None => s,
            });
            Ok(())
        })?;
        Ok(merged.unwrap_or_default())
    }
}
