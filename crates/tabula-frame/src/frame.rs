//! Immutable column-major table.
//!
//! Invariants:
//! - every column holds exactly `index.len()` values
//! - column names are unique
//!
//! Every operation that "changes" a frame returns a new one.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use tabula_accel::{default_backend, resolve, seeded_rng, AccelBackend, Describe, SharedBackend};
use tabula_core::error::{Error, Result};
use tabula_core::stats::SchemaStats;
use tabula_core::types::{Label, Value, ValueKey, ValueKind};

use crate::agg::AggFunc;
use crate::series::Series;

#[derive(Clone)]
pub struct DataFrame {
    pub(crate) columns: Vec<String>,
    pub(crate) data: Vec<Vec<Value>>,
    pub(crate) index: Vec<Label>,
    pub(crate) backend: SharedBackend,
}

/// Borrowed view of one row.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    frame: &'a DataFrame,
    pos: usize,
}

impl<'a> Row<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn label(&self) -> &'a Label {
        &self.frame.index[self.pos]
    }

    /// Cell by column name; `None` if the column does not exist.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let c = self.frame.columns.iter().position(|n| n == column)?;
        Some(&self.frame.data[c][self.pos])
    }

    /// Cell by column position.
    pub fn value(&self, column: usize) -> Option<&'a Value> {
        self.frame.data.get(column).map(|col| &col[self.pos])
    }

    pub fn len(&self) -> usize {
        self.frame.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.columns.is_empty()
    }

    pub fn values(&self) -> Vec<Value> {
        self.frame.data.iter().map(|col| col[self.pos].clone()).collect()
    }

    /// The row as a Series labeled by column name.
    pub fn to_series(&self) -> Series {
        Series::from_pairs(
            self.frame
                .columns
                .iter()
                .zip(&self.frame.data)
                .map(|(name, col)| (Label::from(name.as_str()), col[self.pos].clone())),
        )
        .named(self.label().to_string())
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("label", self.label())
            .field("values", &self.values())
            .finish()
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for c in columns {
        if !seen.insert(c.as_str()) {
            return Err(Error::invalid(format!("duplicate column name '{}'", c)));
        }
    }
    Ok(())
}

impl DataFrame {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            data: Vec::new(),
            index: Vec::new(),
            backend: default_backend(),
        }
    }

    /// Build from named columns of equal length, index `0..n`.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Value>)>) -> Result<Self> {
        let (names, data): (Vec<String>, Vec<Vec<Value>>) =
            columns.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        check_unique(&names)?;
        let rows = data.first().map(Vec::len).unwrap_or(0);
        for (name, col) in names.iter().zip(&data) {
            if col.len() != rows {
                return Err(Error::invalid(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    col.len(),
                    rows
                )));
            }
        }
        Ok(Self {
            columns: names,
            data,
            index: Label::range(rows),
            backend: default_backend(),
        })
    }

    /// Build from row-major values; every row must match the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        check_unique(&columns)?;
        let mut data: Vec<Vec<Value>> = columns
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::invalid(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            for (col, v) in data.iter_mut().zip(row) {
                col.push(v);
            }
        }
        let n = data.first().map(Vec::len).unwrap_or(0);
        Ok(Self {
            columns,
            data,
            index: Label::range(n),
            backend: default_backend(),
        })
    }

    /// Build from records of `(column, value)` pairs, index `0..n`.
    ///
    /// Columns are the union of every record's names in first-seen order; a
    /// record without some column gets `Null` there. A name repeated within
    /// one record keeps its last value.
    pub fn from_records<R, K>(records: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut slot: HashMap<String, usize> = HashMap::new();
        let mut data: Vec<Vec<Value>> = Vec::new();
        let mut n = 0;
        for record in records {
            for (name, value) in record {
                let name = name.into();
                let c = match slot.get(&name) {
                    Some(&c) => c,
                    None => {
                        slot.insert(name.clone(), columns.len());
                        columns.push(name);
                        data.push(vec![Value::Null; n]);
                        columns.len() - 1
                    }
                };
                let col = &mut data[c];
                if col.len() > n {
                    col[n] = value;
                } else {
                    col.push(value);
                }
            }
            n += 1;
            for col in &mut data {
                col.resize(n, Value::Null);
            }
        }
        Self {
            columns,
            data,
            index: Label::range(n),
            backend: default_backend(),
        }
    }

    /// Build from named Series sharing one index (taken from the first).
    pub fn from_series(series: Vec<Series>) -> Result<Self> {
        let index = series
            .first()
            .map(|s| s.index().to_vec())
            .unwrap_or_default();
        let mut columns = Vec::with_capacity(series.len());
        let mut data = Vec::with_capacity(series.len());
        for (i, s) in series.into_iter().enumerate() {
            if s.index() != index.as_slice() {
                return Err(Error::invalid(format!(
                    "series {} is not aligned with the first series' index",
                    i
                )));
            }
            columns.push(s.name().map(str::to_string).unwrap_or_else(|| i.to_string()));
            data.push(s.to_vec());
        }
        check_unique(&columns)?;
        Ok(Self {
            columns,
            data,
            index,
            backend: default_backend(),
        })
    }

    pub fn with_index(mut self, index: Vec<Label>) -> Result<Self> {
        if index.len() != self.len() {
            return Err(Error::invalid(format!(
                "index has {} labels, frame has {} rows",
                index.len(),
                self.len()
            )));
        }
        self.index = index;
        Ok(self)
    }

    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub(crate) fn accel(&self) -> &dyn AccelBackend {
        resolve(self.backend.as_ref())
    }

    /// Same columns and backend, new cells and labels.
    pub(crate) fn derive(&self, data: Vec<Vec<Value>>, index: Vec<Label>) -> Self {
        Self {
            columns: self.columns.clone(),
            data,
            index,
            backend: self.backend.clone(),
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.columns.len())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[Label] {
        &self.index
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub(crate) fn col_pos(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::not_found(format!("column '{}'", name)))
    }

    pub fn column_values(&self, name: &str) -> Result<&[Value]> {
        Ok(&self.data[self.col_pos(name)?])
    }

    pub fn column(&self, name: &str) -> Result<Series> {
        let values = self.column_values(name)?.to_vec();
        Ok(Series::with_index(values, self.index.clone())?
            .named(name)
            .with_backend(self.backend.clone()))
    }

    /// Kind of each column's first non-null value.
    pub fn dtypes(&self) -> Vec<(String, ValueKind)> {
        self.columns
            .iter()
            .zip(&self.data)
            .map(|(name, col)| {
                let kind = col
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::kind)
                    .unwrap_or(ValueKind::Unknown);
                (name.clone(), kind)
            })
            .collect()
    }

    fn is_numeric_column(col: &[Value]) -> bool {
        col.iter()
            .find(|v| !v.is_null())
            .map(Value::is_numeric)
            .unwrap_or(false)
    }

    /// Names of the columns whose first non-null value is a number.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.data)
            .filter(|(_, col)| Self::is_numeric_column(col))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Row by label; the last duplicate label wins.
    pub fn loc(&self, label: &Label) -> Result<Row<'_>> {
        self.index
            .iter()
            .rposition(|l| l == label)
            .map(|pos| Row { frame: self, pos })
            .ok_or_else(|| Error::not_found(format!("row label '{}'", label)))
    }

    pub fn iloc(&self, pos: usize) -> Result<Row<'_>> {
        if pos >= self.len() {
            return Err(Error::not_found(format!(
                "row position {} (frame has {} rows)",
                pos,
                self.len()
            )));
        }
        Ok(Row { frame: self, pos })
    }

    pub fn at(&self, pos: usize, column: &str) -> Result<&Value> {
        let c = self.col_pos(column)?;
        self.data[c]
            .get(pos)
            .ok_or_else(|| Error::not_found(format!("row position {}", pos)))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.len()).map(move |pos| Row { frame: self, pos })
    }

    pub fn select_columns(&self, names: &[&str]) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(names.len());
        let mut data = Vec::with_capacity(names.len());
        for name in names {
            let c = self.col_pos(name)?;
            columns.push(self.columns[c].clone());
            data.push(self.data[c].clone());
        }
        check_unique(&columns)?;
        Ok(DataFrame {
            columns,
            data,
            index: self.index.clone(),
            backend: self.backend.clone(),
        })
    }

    /// Rows at `positions`, in that order, labels kept.
    pub fn take(&self, positions: &[usize]) -> DataFrame {
        let data = self
            .data
            .iter()
            .map(|col| positions.iter().map(|&p| col[p].clone()).collect())
            .collect();
        let index = positions.iter().map(|&p| self.index[p].clone()).collect();
        self.derive(data, index)
    }

    pub fn head(&self, n: usize) -> DataFrame {
        let n = n.min(self.len());
        self.take(&(0..n).collect::<Vec<_>>())
    }

    pub fn tail(&self, n: usize) -> DataFrame {
        let start = self.len() - n.min(self.len());
        self.take(&(start..self.len()).collect::<Vec<_>>())
    }

    /// Add a column, or replace an existing one in place.
    pub fn add_column(&self, name: &str, values: Vec<Value>) -> Result<DataFrame> {
        if values.len() != self.len() {
            return Err(Error::invalid(format!(
                "column '{}' has {} values, frame has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }
        let mut out = self.clone();
        match out.columns.iter().position(|c| c == name) {
            Some(c) => out.data[c] = values,
            None => {
                out.columns.push(name.to_string());
                out.data.push(values);
            }
        }
        Ok(out)
    }

    /// Add a Series as a column; it must have as many values as the frame has rows.
    pub fn add_series(&self, name: &str, series: &Series) -> Result<DataFrame> {
        self.add_column(name, series.to_vec())
    }

    pub fn apply_column(&self, name: &str, f: impl Fn(&Value) -> Value) -> Result<DataFrame> {
        let values = self.column_values(name)?.iter().map(f).collect();
        self.add_column(name, values)
    }

    /// Add (or replace) `name` with a value derived from each whole row.
    pub fn add_column_with(&self, name: &str, f: impl Fn(&Row<'_>) -> Value) -> Result<DataFrame> {
        let values = self.rows().map(|r| f(&r)).collect();
        self.add_column(name, values)
    }

    pub fn drop_columns(&self, names: &[&str]) -> Result<DataFrame> {
        for name in names {
            self.col_pos(name)?;
        }
        let mut out = self.clone();
        let (columns, data): (Vec<String>, Vec<Vec<Value>>) = self
            .columns
            .iter()
            .cloned()
            .zip(self.data.iter().cloned())
            .filter(|(c, _)| !names.contains(&c.as_str()))
            .unzip();
        out.columns = columns;
        out.data = data;
        Ok(out)
    }

    pub fn rename(&self, mapping: &[(&str, &str)]) -> Result<DataFrame> {
        let mut out = self.clone();
        for (from, to) in mapping {
            let c = self.col_pos(from)?;
            out.columns[c] = to.to_string();
        }
        check_unique(&out.columns)?;
        Ok(out)
    }

    /// Keep rows for which `pred` holds. The result is re-indexed `0..n`.
    pub fn filter(&self, pred: impl Fn(&Row<'_>) -> bool) -> DataFrame {
        let keep: Vec<usize> = self.rows().filter(|r| pred(r)).map(|r| r.pos).collect();
        let mut out = self.take(&keep);
        out.index = Label::range(keep.len());
        out
    }

    fn map_cells(&self, f: impl Fn(&Value) -> Value) -> DataFrame {
        let data = self
            .data
            .iter()
            .map(|col| col.iter().map(&f).collect())
            .collect();
        self.derive(data, self.index.clone())
    }

    pub fn isnull(&self) -> DataFrame {
        self.map_cells(|v| Value::Bool(v.is_null()))
    }

    pub fn notnull(&self) -> DataFrame {
        self.map_cells(|v| Value::Bool(!v.is_null()))
    }

    /// Drop every row holding a null in any column; labels kept.
    pub fn dropna(&self) -> DataFrame {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&r| self.data.iter().all(|col| !col[r].is_null()))
            .collect();
        self.take(&keep)
    }

    pub fn fillna(&self, fill: impl Into<Value>) -> DataFrame {
        let fill = fill.into();
        self.map_cells(|v| if v.is_null() { fill.clone() } else { v.clone() })
    }

    /// Fill nulls in one column only.
    pub fn fill_null(&self, column: &str, fill: impl Into<Value>) -> Result<DataFrame> {
        let fill = fill.into();
        self.apply_column(column, |v| if v.is_null() { fill.clone() } else { v.clone() })
    }

    /// Positions of the null cells in `column`.
    pub fn find_null_indices(&self, column: &str) -> Result<Vec<usize>> {
        let mask: Vec<bool> = self.column_values(column)?.iter().map(Value::is_null).collect();
        Ok(self.accel().where_indices(&mask))
    }

    /// The non-null values of a numeric column.
    pub fn drop_null_values(&self, column: &str) -> Result<Vec<f64>> {
        let opts = self.numeric_options(column)?;
        Ok(self.accel().drop_null_values(&opts))
    }

    /// Per-row numeric view of a column; fails on a non-null non-numeric cell.
    pub(crate) fn numeric_options(&self, column: &str) -> Result<Vec<Option<f64>>> {
        self.column_values(column)?
            .iter()
            .map(|v| {
                if v.is_null() {
                    Ok(None)
                } else {
                    v.as_f64().map(Some).ok_or_else(|| {
                        Error::invalid(format!("column '{}' holds non-numeric '{}'", column, v))
                    })
                }
            })
            .collect()
    }

    /// A column as numbers, with no nulls allowed.
    pub(crate) fn dense_numeric(&self, column: &str) -> Result<Vec<f64>> {
        self.numeric_options(column)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| Error::invalid(format!("column '{}' is null at row {}", column, i)))
            })
            .collect()
    }

    /// Whole-frame aggregation: one output row with one column per entry of
    /// `ops`, in order.
    pub fn agg(&self, ops: &[(&str, &str)]) -> Result<DataFrame> {
        let plan = self.agg_plan(ops)?;
        let row = self.agg_row(&plan);
        let columns = plan.iter().map(|(c, _)| self.columns[*c].clone()).collect();
        DataFrame::from_rows(columns, vec![row]).map(|df| df.with_backend(self.backend.clone()))
    }

    /// Resolve `(column, op)` pairs. Ops are validated before columns.
    pub(crate) fn agg_plan(&self, ops: &[(&str, &str)]) -> Result<Vec<(usize, AggFunc)>> {
        let funcs = ops
            .iter()
            .map(|(_, op)| AggFunc::parse(op))
            .collect::<Result<Vec<_>>>()?;
        ops.iter()
            .zip(funcs)
            .map(|((col, _), f)| Ok((self.col_pos(col)?, f)))
            .collect()
    }

    pub(crate) fn agg_row(&self, plan: &[(usize, AggFunc)]) -> Vec<Value> {
        plan.iter()
            .map(|(c, f)| f.apply(&self.data[*c], self.accel()))
            .collect()
    }

    /// Row positions sorted by `column`, nulls last.
    pub fn sort_indices(&self, column: &str, descending: bool) -> Result<Vec<usize>> {
        Ok(self.column(column)?.argsort(descending))
    }

    /// Rows permuted by `column`; labels travel with their rows.
    pub fn sort_values(&self, column: &str, descending: bool) -> Result<DataFrame> {
        let order = self.sort_indices(column, descending)?;
        Ok(self.take(&order))
    }

    /// Pearson correlation matrix over the numeric columns.
    ///
    /// Each pair uses only rows where both cells are numeric. A zero
    /// denominator yields 0.0.
    pub fn corr(&self) -> Result<DataFrame> {
        let (names, cols): (Vec<String>, Vec<Vec<Option<f64>>>) = self
            .columns
            .iter()
            .zip(&self.data)
            .filter(|(_, col)| Self::is_numeric_column(col))
            .map(|(name, col)| (name.clone(), col.iter().map(Value::as_f64).collect()))
            .unzip();
        if names.len() < 2 {
            return Err(Error::invalid(format!(
                "corr needs at least two numeric columns, found {}",
                names.len()
            )));
        }

        let k = names.len();
        let mut matrix = vec![vec![Value::Null; k]; k];
        for i in 0..k {
            for j in i..k {
                let r = pearson(&cols[i], &cols[j]);
                matrix[i][j] = Value::F64(r);
                matrix[j][i] = Value::F64(r);
            }
        }
        let columns: Vec<(String, Vec<Value>)> = names
            .iter()
            .cloned()
            .zip(matrix)
            .collect();
        // matrix is symmetric, so row i doubles as column i
        DataFrame::from_columns(columns)?
            .with_index(names.iter().map(|n| Label::from(n.as_str())).collect())
    }

    /// `result = a + b`, appended (or replaced) as a column.
    pub fn vectorized_add(&self, a: &str, b: &str, result: &str) -> Result<DataFrame> {
        let out = self
            .accel()
            .vectorized_add(&self.dense_numeric(a)?, &self.dense_numeric(b)?)?;
        self.add_column(result, out.into_iter().map(Value::F64).collect())
    }

    pub fn vectorized_multiply(&self, a: &str, b: &str, result: &str) -> Result<DataFrame> {
        let out = self
            .accel()
            .vectorized_multiply(&self.dense_numeric(a)?, &self.dense_numeric(b)?)?;
        self.add_column(result, out.into_iter().map(Value::F64).collect())
    }

    pub fn dot_product(&self, a: &str, b: &str) -> Result<f64> {
        self.accel()
            .dot_product(&self.dense_numeric(a)?, &self.dense_numeric(b)?)
    }

    pub fn norm(&self, column: &str) -> Result<f64> {
        Ok(self.accel().norm(&self.dense_numeric(column)?))
    }

    /// Positions where `column > threshold`.
    pub fn where_greater(&self, column: &str, threshold: f64) -> Result<Vec<usize>> {
        let xs = self.dense_numeric(column)?;
        let mask = self.accel().greater_than_mask(&xs, threshold);
        Ok(self.accel().where_indices(&mask))
    }

    /// Rows where `column > threshold`, labels kept.
    pub fn filter_greater_than(&self, column: &str, threshold: f64) -> Result<DataFrame> {
        Ok(self.take(&self.where_greater(column, threshold)?))
    }

    /// Replace `column` with its population z-score.
    pub fn normalize(&self, column: &str) -> Result<DataFrame> {
        let xs = self.dense_numeric(column)?;
        let zs = self.accel().normalize(&xs);
        self.add_column(column, zs.into_iter().map(Value::F64).collect())
    }

    pub fn describe(&self, column: &str) -> Result<Describe> {
        self.column(column)?.describe()
    }

    /// `describe` for every numeric column, in column order.
    pub fn describe_all(&self) -> Result<Vec<(String, Describe)>> {
        self.numeric_columns()
            .into_iter()
            .map(|name| {
                let d = self.describe(&name)?;
                Ok((name, d))
            })
            .collect()
    }

    /// Sum `value` per distinct `group` key (first-seen order). Rows with a
    /// null group or value are skipped.
    pub fn group_by_sum(&self, group: &str, value: &str) -> Result<DataFrame> {
        let keys = self.column_values(group)?;
        let vals = self.numeric_options(value)?;

        let mut codes: HashMap<ValueKey, i64> = HashMap::new();
        let mut distinct: Vec<Value> = Vec::new();
        let mut xs = Vec::new();
        let mut groups = Vec::new();
        for (k, v) in keys.iter().zip(vals) {
            let Some(x) = v else { continue };
            if k.is_null() {
                continue;
            }
            let code = *codes.entry(k.key()).or_insert_with(|| {
                distinct.push(k.clone());
                distinct.len() as i64 - 1
            });
            xs.push(x);
            groups.push(code);
        }

        let sums = self.accel().group_by_sum(&xs, &groups)?;
        let (key_col, sum_col): (Vec<Value>, Vec<Value>) = sums
            .into_iter()
            .map(|(code, s)| (distinct[code as usize].clone(), Value::F64(s)))
            .unzip();
        Ok(DataFrame::from_columns(vec![(group, key_col), (value, sum_col)])?
            .with_backend(self.backend.clone()))
    }

    /// `min(n, rows)` rows drawn without replacement, labels kept.
    pub fn sample(&self, n: usize, seed: Option<u64>) -> DataFrame {
        let mut rng = seeded_rng(seed);
        let picks = self.accel().sample(self.len(), n, &mut rng);
        self.take(&picks)
    }

    /// Stack frames with identical column lists; labels are concatenated.
    pub fn concat(&self, others: &[DataFrame]) -> Result<DataFrame> {
        let mut out = self.clone();
        for other in others {
            if other.columns != self.columns {
                return Err(Error::invalid(format!(
                    "concat: columns {:?} do not match {:?}",
                    other.columns, self.columns
                )));
            }
            for (dst, src) in out.data.iter_mut().zip(&other.data) {
                dst.extend(src.iter().cloned());
            }
            out.index.extend(other.index.iter().cloned());
        }
        Ok(out)
    }

    /// Split into consecutive frames of at most `size` rows.
    pub fn chunks(&self, size: usize) -> Result<Vec<DataFrame>> {
        if size == 0 {
            return Err(Error::invalid("chunk size must be positive"));
        }
        Ok((0..self.len())
            .step_by(size)
            .map(|start| {
                let end = (start + size).min(self.len());
                self.take(&(start..end).collect::<Vec<_>>())
            })
            .collect())
    }

    pub fn stats(&self) -> SchemaStats {
        let mut stats = SchemaStats::new();
        for (name, col) in self.columns.iter().zip(&self.data) {
            let cs = stats.get_or_create(name.clone());
            for v in col {
                cs.update(v);
            }
        }
        stats
    }
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    let n = pairs.len() as f64;
    if pairs.is_empty() {
        return 0.0;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        sxy / denom
    }
}

/// Cells of a column by name.
///
/// Panics if the column does not exist. `column` and `column_values` are the
/// fallible forms.
impl Index<&str> for DataFrame {
    type Output = [Value];

    fn index(&self, column: &str) -> &[Value] {
        match self.column_values(column) {
            Ok(values) => values,
            Err(_) => panic!("no column named '{}'", column),
        }
    }
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.data == other.data && self.index == other.index
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFrame")
            .field("shape", &self.shape())
            .field("columns", &self.columns)
            .field("index", &self.index)
            .field("data", &self.data)
            .field("backend", &self.backend.name())
            .finish()
    }
}
