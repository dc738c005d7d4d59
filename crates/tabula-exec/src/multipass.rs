//! Streaming operations that transform rows.
//!
//! Sort, normalize, threshold filter, and sample need a global property of
//! the column before they can emit anything, so they read the source twice:
//! pass 1 computes the statistic or the row set, pass 2 re-opens the source
//! and emits. The rest are single-pass transforms that carry a little state
//! across batch boundaries.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tabula_accel::seeded_rng;
use tabula_core::error::{Error, Result};
use tabula_core::types::{Label, Value, ValueKey};
use tabula_frame::{DataFrame, Row, Series};
use tabula_io::CsvSource;

use crate::engine::Engine;
use crate::stream::{BatchConsumer, Rebatcher, StreamSummary};

/// Reductions available to `batch_window` and `batch_cumulative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingOp {
    Sum,
    Mean,
    Min,
    Max,
}

impl RollingOp {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(RollingOp::Sum),
            "mean" => Ok(RollingOp::Mean),
            "min" => Ok(RollingOp::Min),
            "max" => Ok(RollingOp::Max),
            other => Err(Error::invalid(format!("unknown rolling operation: {}", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RollingOp::Sum => "sum",
            RollingOp::Mean => "mean",
            RollingOp::Min => "min",
            RollingOp::Max => "max",
        }
    }

    fn reduce<'a>(self, values: impl Iterator<Item = &'a f64>) -> f64 {
        let (mut n, mut sum, mut lo, mut hi) = (0usize, 0.0, f64::INFINITY, f64::NEG_INFINITY);
        for &x in values {
            n += 1;
            sum += x;
            lo = lo.min(x);
            hi = hi.max(x);
        }
        match self {
            RollingOp::Sum => sum,
            RollingOp::Mean if n == 0 => f64::NAN,
            RollingOp::Mean => sum / n as f64,
            RollingOp::Min => lo,
            RollingOp::Max => hi,
        }
    }
}

impl fmt::Display for RollingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn changed_between_passes(source: &dyn CsvSource) -> Error {
    Error::invalid(format!("{} changed between passes", source.describe()))
}

impl Engine {
    /// Whole source sorted by `column`, nulls last. Labels are the rows'
    /// original positions.
    pub fn batch_sort(&self, source: &dyn CsvSource, column: &str, descending: bool) -> Result<DataFrame> {
        let mut keys = Vec::new();
        self.scan(source, &[column], |batch| {
            keys.extend_from_slice(batch.column_values(column)?);
            Ok(())
        })?;
        let order = Series::new(keys)
            .with_backend(self.backend().clone())
            .argsort(descending);

        let mut rank = vec![0usize; order.len()];
        for (dst, &src) in order.iter().enumerate() {
            rank[src] = dst;
        }

        let mut slots: Vec<Option<Vec<Value>>> = vec![None; order.len()];
        let mut offset = 0;
        let summary = self.scan(source, &[column], |batch| {
            for row in batch.rows() {
                let dst = rank
                    .get(offset)
                    .copied()
                    .ok_or_else(|| changed_between_passes(source))?;
                slots[dst] = Some(row.values());
                offset += 1;
            }
            Ok(())
        })?;

        let rows = slots
            .into_iter()
            .map(|s| s.ok_or_else(|| changed_between_passes(source)))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataFrame::from_rows(summary.columns, rows)?
            .with_index(order.into_iter().map(Label::from).collect())?
            .with_backend(self.backend().clone()))
    }

    /// Emit batches with `column` replaced by its z-score, using the streaming
    /// mean and sample std. A zero or undefined std leaves the column as is.
    pub fn batch_normalize<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        column: &str,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let stats = self.batch_stats(source, column)?;
        let (mean, std) = (stats.mean(), stats.std());
        let scale = std.is_finite() && std > 0.0;

        let mut reader = self.open(source)?;
        reader.require_columns(&[column])?;
        while let Some(batch) = reader.next_batch()? {
            let batch = if scale {
                batch.apply_column(column, |v| match v.as_f64() {
                    Some(x) => Value::F64((x - mean) / std),
                    None => v.clone(),
                })?
            } else {
                batch
            };
            consumer.consume(batch)?;
        }
        Ok(reader.summary())
    }

    /// Emit the rows where `column > threshold`, re-chunked to the batch size.
    /// The summary counts emitted rows and batches.
    pub fn batch_filter_greater_than<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        column: &str,
        threshold: f64,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut selected: Vec<usize> = Vec::new();
        let mut offset = 0;
        self.scan(source, &[column], |batch| {
            let xs: Vec<f64> = batch
                .column_values(column)?
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect();
            let mask = self.accel().greater_than_mask(&xs, threshold);
            selected.extend(self.accel().where_indices(&mask).into_iter().map(|i| i + offset));
            offset += batch.len();
            Ok(())
        })?;

        self.emit_positions(source, &selected, consumer)
    }

    /// Pass 2 shared by the filters: emit the rows at ascending global
    /// `positions`.
    fn emit_positions<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        positions: &[usize],
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        let columns = reader.headers().to_vec();
        let mut out = Rebatcher::new(columns.clone(), self.config().batch_size, self.backend().clone());
        let (mut offset, mut cursor) = (0, 0);
        while let Some(batch) = reader.next_batch()? {
            let end = offset + batch.len();
            let mut local = Vec::new();
            while cursor < positions.len() && positions[cursor] < end {
                local.push(positions[cursor] - offset);
                cursor += 1;
            }
            out.push(&batch, &local, consumer)?;
            offset = end;
        }
        if cursor != positions.len() {
            return Err(changed_between_passes(source));
        }
        Ok(StreamSummary {
            columns,
            rows: positions.len(),
            batches: out.finish(consumer)?,
        })
    }

    /// `min(n, rows)` rows drawn without replacement, returned in source
    /// order. `seed` falls back to the configured seed.
    pub fn batch_sample(&self, source: &dyn CsvSource, n: usize, seed: Option<u64>) -> Result<DataFrame> {
        let total = self.scan(source, &[], |_| Ok(()))?.rows;
        let mut rng = seeded_rng(seed.or(self.config().seed));
        let mut picks = self.accel().sample(total, n, &mut rng);
        picks.sort_unstable();

        let mut rows = Vec::with_capacity(picks.len());
        let mut offset = 0;
        let mut cursor = 0;
        let summary = self.scan(source, &[], |batch| {
            let end = offset + batch.len();
            while cursor < picks.len() && picks[cursor] < end {
                rows.push(batch.iloc(picks[cursor] - offset)?.values());
                cursor += 1;
            }
            offset = end;
            Ok(())
        })?;
        if rows.len() != picks.len() {
            return Err(changed_between_passes(source));
        }
        Ok(DataFrame::from_rows(summary.columns, rows)?
            .with_index(picks.into_iter().map(Label::from).collect())?
            .with_backend(self.backend().clone()))
    }

    /// Map every cell of `column` through `f`, batch by batch.
    pub fn batch_transform<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        column: &str,
        f: impl Fn(&Value) -> Value,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        reader.require_columns(&[column])?;
        while let Some(batch) = reader.next_batch()? {
            consumer.consume(batch.apply_column(column, &f)?)?;
        }
        Ok(reader.summary())
    }

    /// Add (or replace) one column per `(name, f)` on every batch, where `f`
    /// sees the whole row. Transforms run in order, so a later one can read
    /// a column an earlier one produced.
    pub fn batch_transform_multiple<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        transforms: &[(&str, &dyn Fn(&Row<'_>) -> Value)],
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        let mut columns = reader.headers().to_vec();
        for (name, _) in transforms {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
        while let Some(batch) = reader.next_batch()? {
            let batch = transforms
                .iter()
                .try_fold(batch, |df, (name, f)| df.add_column_with(name, *f))?;
            consumer.consume(batch)?;
        }
        let summary = reader.summary();
        Ok(StreamSummary { columns, ..summary })
    }

    /// Emit the rows for which `pred` holds, re-chunked to the batch size.
    pub fn batch_filter<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        pred: impl Fn(&Row<'_>) -> bool,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        let columns = reader.headers().to_vec();
        let mut out = Rebatcher::new(columns.clone(), self.config().batch_size, self.backend().clone());
        let mut kept = 0;
        while let Some(batch) = reader.next_batch()? {
            let keep: Vec<usize> = batch.rows().filter(|r| pred(r)).map(|r| r.position()).collect();
            kept += keep.len();
            out.push(&batch, &keep, consumer)?;
        }
        Ok(StreamSummary {
            columns,
            rows: kept,
            batches: out.finish(consumer)?,
        })
    }

    /// Append `result = a + b` to every batch.
    pub fn batch_vectorized_add<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        a: &str,
        b: &str,
        result: &str,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        reader.require_columns(&[a, b])?;
        while let Some(batch) = reader.next_batch()? {
            consumer.consume(batch.vectorized_add(a, b, result)?)?;
        }
        Ok(reader.summary())
    }

    /// Append `result = a * b` to every batch.
    pub fn batch_vectorized_multiply<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        a: &str,
        b: &str,
        result: &str,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        reader.require_columns(&[a, b])?;
        while let Some(batch) = reader.next_batch()? {
            consumer.consume(batch.vectorized_multiply(a, b, result)?)?;
        }
        Ok(reader.summary())
    }

    /// Emit each row whose key over `columns` (all columns when empty) has not
    /// been seen earlier in the stream.
    pub fn batch_drop_duplicates<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        columns: &[&str],
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let mut reader = self.open(source)?;
        reader.require_columns(columns)?;
        let headers = reader.headers().to_vec();
        let key_cols: Vec<usize> = if columns.is_empty() {
            (0..headers.len()).collect()
        } else {
            columns
                .iter()
                .filter_map(|c| headers.iter().position(|h| h == c))
                .collect()
        };

        let mut seen: HashSet<Vec<ValueKey>> = HashSet::new();
        let mut out = Rebatcher::new(headers.clone(), self.config().batch_size, self.backend().clone());
        let mut kept = 0;
        while let Some(batch) = reader.next_batch()? {
            let keep: Vec<usize> = batch
                .rows()
                .filter(|r| {
                    let key = key_cols
                        .iter()
                        .map(|&c| r.value(c).map(Value::key).unwrap_or(ValueKey::Null))
                        .collect();
                    seen.insert(key)
                })
                .map(|r| r.position())
                .collect();
            kept += keep.len();
            out.push(&batch, &keep, consumer)?;
        }
        Ok(StreamSummary {
            columns: headers,
            rows: kept,
            batches: out.finish(consumer)?,
        })
    }

    /// Append `{column}_window_{window}`: `op` over the last `window` numeric
    /// values up to and including each row. The window carries across batch
    /// boundaries; null and text cells produce null and are not windowed.
    pub fn batch_window<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        column: &str,
        window: usize,
        op: &str,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        if window == 0 {
            return Err(Error::invalid("window size must be at least 1"));
        }
        let op = RollingOp::parse(op)?;
        let name = format!("{}_window_{}", column, window);

        let mut recent: VecDeque<f64> = VecDeque::with_capacity(window);
        let mut reader = self.open(source)?;
        reader.require_columns(&[column])?;
        while let Some(batch) = reader.next_batch()? {
            let values = batch
                .column_values(column)?
                .iter()
                .map(|v| match v.as_f64() {
                    Some(x) => {
                        if recent.len() == window {
                            recent.pop_front();
                        }
                        recent.push_back(x);
                        Value::F64(op.reduce(recent.iter()))
                    }
                    None => Value::Null,
                })
                .collect();
            consumer.consume(batch.add_column(&name, values)?)?;
        }
        Ok(reader.summary())
    }

    /// Append `{column}_cumulative_{op}`: `op` over every numeric value so far.
    pub fn batch_cumulative<C: BatchConsumer + ?Sized>(
        &self,
        source: &dyn CsvSource,
        column: &str,
        op: &str,
        consumer: &mut C,
    ) -> Result<StreamSummary> {
        let op = RollingOp::parse(op)?;
        let name = format!("{}_cumulative_{}", column, op);

        let (mut n, mut sum, mut lo, mut hi) = (0usize, 0.0, f64::INFINITY, f64::NEG_INFINITY);
        let mut reader = self.open(source)?;
        reader.require_columns(&[column])?;
        while let Some(batch) = reader.next_batch()? {
            let values = batch
                .column_values(column)?
                .iter()
                .map(|v| match v.as_f64() {
                    Some(x) => {
                        n += 1;
                        sum += x;
                        lo = lo.min(x);
                        hi = hi.max(x);
                        Value::F64(match op {
                            RollingOp::Sum => sum,
                            RollingOp::Mean => sum / n as f64,
                            RollingOp::Min => lo,
                            RollingOp::Max => hi,
                        })
                    }
                    None => Value::Null,
                })
                .collect();
            consumer.consume(batch.add_column(&name, values)?)?;
        }
        Ok(reader.summary())
    }
}
