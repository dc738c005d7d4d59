//! Immutable labeled 1-D column.
//!
//! A `Series` owns its values and labels; every transformation returns a new
//! Series and leaves `self` untouched. Numeric reductions go through the
//! attached acceleration backend (or the pure fallback when that backend is
//! unavailable).

use std::collections::HashMap;
use std::fmt;

use tabula_accel::{default_backend, resolve, seeded_rng, AccelBackend, Describe, SharedBackend};
use tabula_core::error::{Error, Result};
use tabula_core::stats::ColumnStats;
use tabula_core::types::{compare, numeric_binop, Label, NumericOp, Value, ValueKey, ValueKind};

#[derive(Clone)]
pub struct Series {
    data: Vec<Value>,
    index: Vec<Label>,
    name: Option<String>,
    dtype: Option<ValueKind>,
    /// label → position, last duplicate wins
    positions: HashMap<Label, usize>,
    backend: SharedBackend,
}

fn label_positions(index: &[Label]) -> HashMap<Label, usize> {
    index
        .iter()
        .enumerate()
        .map(|(i, l)| (l.clone(), i))
        .collect()
}

impl Series {
    /// Values with default labels `0..n`.
    pub fn new(data: Vec<Value>) -> Self {
        let index = Label::range(data.len());
        Self::build(data, index, None, None, default_backend())
    }

    pub fn from_values<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::new(values.into_iter().map(Into::into).collect())
    }

    pub fn with_index(data: Vec<Value>, index: Vec<Label>) -> Result<Self> {
        if data.len() != index.len() {
            return Err(Error::invalid(format!(
                "series length mismatch: {} values vs {} labels",
                data.len(),
                index.len()
            )));
        }
        Ok(Self::build(data, index, None, None, default_backend()))
    }

    /// Build from an ordered label → value mapping.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Label, Value)>) -> Self {
        let (index, data): (Vec<Label>, Vec<Value>) = pairs.into_iter().unzip();
        Self::build(data, index, None, None, default_backend())
    }

    fn build(
        data: Vec<Value>,
        index: Vec<Label>,
        name: Option<String>,
        dtype: Option<ValueKind>,
        backend: SharedBackend,
    ) -> Self {
        let positions = label_positions(&index);
        Self {
            data,
            index,
            name,
            dtype,
            positions,
            backend,
        }
    }

    /// New series sharing this one's name, dtype, and backend.
    fn derive(&self, data: Vec<Value>, index: Vec<Label>) -> Self {
        Self::build(data, index, self.name.clone(), self.dtype, self.backend.clone())
    }

    fn suffixed(&self, suffix: &str) -> Option<String> {
        self.name.as_ref().map(|n| format!("{}{}", n, suffix))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_dtype(mut self, dtype: ValueKind) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    fn accel(&self) -> &dyn AccelBackend {
        resolve(self.backend.as_ref())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared dtype, else the kind of the first non-null value.
    pub fn dtype(&self) -> ValueKind {
        self.dtype.unwrap_or_else(|| {
            self.data
                .iter()
                .find(|v| !v.is_null())
                .map(Value::kind)
                .unwrap_or(ValueKind::Unknown)
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.data
    }

    pub fn index(&self) -> &[Label] {
        &self.index
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Value)> {
        self.index.iter().zip(self.data.iter())
    }

    /// Positional access; `None` when out of range.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.data.get(position)
    }

    pub fn position_of(&self, label: &Label) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn get_label(&self, label: &Label) -> Result<&Value> {
        self.position_of(label)
            .map(|p| &self.data[p])
            .ok_or_else(|| Error::not_found(format!("label '{}'", label)))
    }

    pub fn head(&self, n: usize) -> Series {
        let n = n.min(self.len());
        self.derive(self.data[..n].to_vec(), self.index[..n].to_vec())
    }

    pub fn tail(&self, n: usize) -> Series {
        let start = self.len() - n.min(self.len());
        self.derive(self.data[start..].to_vec(), self.index[start..].to_vec())
    }

    /// Rows at `positions`, labels kept. Positions must be in range.
    pub fn take(&self, positions: &[usize]) -> Series {
        self.derive(
            positions.iter().map(|&p| self.data[p].clone()).collect(),
            positions.iter().map(|&p| self.index[p].clone()).collect(),
        )
    }

    pub fn isnull(&self) -> Series {
        let data = self.data.iter().map(|v| Value::Bool(v.is_null())).collect();
        Self::build(
            data,
            self.index.clone(),
            self.suffixed("_isnull"),
            Some(ValueKind::Bool),
            self.backend.clone(),
        )
    }

    pub fn notnull(&self) -> Series {
        let data = self.data.iter().map(|v| Value::Bool(!v.is_null())).collect();
        Self::build(
            data,
            self.index.clone(),
            self.suffixed("_notnull"),
            Some(ValueKind::Bool),
            self.backend.clone(),
        )
    }

    pub fn null_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_null()).count()
    }

    pub fn dropna(&self) -> Series {
        self.filter(|v| !v.is_null())
    }

    pub fn fillna(&self, fill: impl Into<Value>) -> Series {
        let fill = fill.into();
        let data = self
            .data
            .iter()
            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
            .collect();
        self.derive(data, self.index.clone())
    }

    pub fn map(&self, f: impl Fn(&Value) -> Value) -> Series {
        let data = self.data.iter().map(f).collect();
        let mut out = self.derive(data, self.index.clone());
        out.dtype = None;
        out
    }

    /// Keep the values for which `pred` holds, labels kept.
    pub fn filter(&self, pred: impl Fn(&Value) -> bool) -> Series {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| pred(&self.data[i])).collect();
        self.take(&keep)
    }

    /// True when every non-null value is a number and at least one exists.
    pub fn is_numeric(&self) -> bool {
        let mut any = false;
        for v in &self.data {
            if v.is_null() {
                continue;
            }
            if !v.is_numeric() {
                return false;
            }
            any = true;
        }
        any
    }

    /// Positions in sorted order, nulls last.
    ///
    /// Numeric data uses the backend's index sort. Anything else falls back
    /// to `types::compare`, which still orders numbers by magnitude.
    pub fn argsort(&self, descending: bool) -> Vec<usize> {
        let (present, nulls): (Vec<usize>, Vec<usize>) =
            (0..self.len()).partition(|&i| !self.data[i].is_null());

        let mut order: Vec<usize> = if self.is_numeric() {
            let keys: Vec<f64> = present
                .iter()
                .map(|&i| self.data[i].as_f64().unwrap_or(f64::NAN))
                .collect();
            self.accel()
                .sort_indices(&keys, descending)
                .into_iter()
                .map(|k| present[k])
                .collect()
        } else {
            let mut p = present;
            p.sort_by(|&a, &b| {
                let ord = compare(&self.data[a], &self.data[b]);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
            p
        };
        order.extend(nulls);
        order
    }

    pub fn sort_values(&self, descending: bool) -> Series {
        self.take(&self.argsort(descending))
    }

    /// Sort by label: integer labels first, then string labels.
    pub fn sort_index(&self) -> Series {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.index[a].cmp(&self.index[b]));
        self.take(&order)
    }

    /// Distinct values in first-seen order (null included once).
    pub fn unique(&self) -> Vec<Value> {
        let mut seen = std::collections::HashSet::new();
        self.data
            .iter()
            .filter(|v| seen.insert(v.key()))
            .cloned()
            .collect()
    }

    /// Non-null value frequencies, most frequent first (ties by first appearance).
    pub fn value_counts(&self) -> Vec<(Value, usize)> {
        let mut slot: HashMap<ValueKey, usize> = HashMap::new();
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for v in self.data.iter().filter(|v| !v.is_null()) {
            match slot.get(&v.key()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    slot.insert(v.key(), counts.len());
                    counts.push((v.clone(), 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Non-null values as numbers; fails on a non-numeric cell.
    pub fn numeric_values(&self) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.len());
        for v in &self.data {
            if v.is_null() {
                continue;
            }
            match v.as_f64() {
                Some(x) => out.push(x),
                None => {
                    return Err(Error::invalid(format!(
                        "non-numeric value '{}' in series {}",
                        v,
                        self.name.as_deref().unwrap_or("<unnamed>")
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Per-position numeric view (`None` for null and non-numeric cells).
    pub fn numeric_options(&self) -> Vec<Option<f64>> {
        self.data.iter().map(Value::as_f64).collect()
    }

    pub fn sum(&self) -> Result<f64> {
        Ok(self.accel().sum(&self.numeric_values()?))
    }

    pub fn mean(&self) -> Result<f64> {
        Ok(self.accel().mean(&self.numeric_values()?))
    }

    pub fn max(&self) -> Result<f64> {
        Ok(self.accel().max(&self.numeric_values()?))
    }

    pub fn min(&self) -> Result<f64> {
        Ok(self.accel().min(&self.numeric_values()?))
    }

    /// Sample variance; NaN below two values.
    pub fn variance(&self) -> Result<f64> {
        Ok(self.accel().variance(&self.numeric_values()?))
    }

    pub fn std(&self) -> Result<f64> {
        Ok(self.accel().std(&self.numeric_values()?))
    }

    pub fn describe(&self) -> Result<Describe> {
        Ok(self.accel().describe(&self.numeric_values()?))
    }

    /// Population z-score, named `{name}_normalized`. Nulls stay null; a
    /// constant series comes back unchanged.
    pub fn normalize(&self) -> Result<Series> {
        let xs = self.numeric_values()?;
        let n = xs.len() as f64;
        let sigma = if xs.len() < 2 {
            0.0
        } else {
            (self.accel().variance(&xs) * (n - 1.0) / n).sqrt()
        };
        let mut out = if sigma == 0.0 || !sigma.is_finite() {
            self.clone()
        } else {
            let mut it = self.accel().normalize(&xs).into_iter();
            let data = self
                .data
                .iter()
                .map(|v| {
                    if v.is_null() {
                        Value::Null
                    } else {
                        it.next().map(Value::F64).unwrap_or(Value::Null)
                    }
                })
                .collect();
            let mut s = self.derive(data, self.index.clone());
            s.dtype = Some(ValueKind::Float64);
            s
        };
        out.name = self.suffixed("_normalized");
        Ok(out)
    }

    /// Dot product over positions where both sides are numeric.
    pub fn dot(&self, other: &Series) -> Result<f64> {
        if self.len() != other.len() {
            return Err(Error::invalid(format!(
                "dot: length mismatch ({} vs {})",
                self.len(),
                other.len()
            )));
        }
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .data
            .iter()
            .zip(&other.data)
            .filter_map(|(a, b)| Some((a.as_f64()?, b.as_f64()?)))
            .unzip();
        self.accel().dot_product(&xs, &ys)
    }

    /// Euclidean norm over the numeric values.
    pub fn norm(&self) -> Result<f64> {
        let xs: Vec<f64> = self.data.iter().filter_map(Value::as_f64).collect();
        Ok(self.accel().norm(&xs))
    }

    /// Running sum named `{name}_cumsum`. Non-numeric positions yield null
    /// and do not reset the total.
    pub fn cumsum(&self) -> Series {
        let mut acc = Value::I32(0);
        let data = self
            .data
            .iter()
            .map(|v| {
                if v.is_numeric() {
                    acc = numeric_binop(&acc, v, NumericOp::Add);
                    acc.clone()
                } else {
                    Value::Null
                }
            })
            .collect();
        let mut out = self.derive(data, self.index.clone());
        out.name = self.suffixed("_cumsum");
        out.dtype = None;
        out
    }

    fn binop(&self, other: &Series, op: NumericOp) -> Result<Series> {
        if self.len() != other.len() {
            return Err(Error::invalid(format!(
                "{:?}: length mismatch ({} vs {})",
                op,
                self.len(),
                other.len()
            )));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| numeric_binop(a, b, op))
            .collect();
        let mut out = self.derive(data, self.index.clone());
        out.dtype = None;
        Ok(out)
    }

    pub fn add(&self, other: &Series) -> Result<Series> {
        self.binop(other, NumericOp::Add)
    }

    pub fn sub(&self, other: &Series) -> Result<Series> {
        self.binop(other, NumericOp::Sub)
    }

    pub fn mul(&self, other: &Series) -> Result<Series> {
        self.binop(other, NumericOp::Mul)
    }

    pub fn mul_scalar(&self, k: f64) -> Series {
        self.map(|v| v.as_f64().map(|x| Value::F64(x * k)).unwrap_or(Value::Null))
    }

    /// `min(n, len)` values drawn without replacement.
    pub fn sample(&self, n: usize, seed: Option<u64>) -> Series {
        let mut rng = seeded_rng(seed);
        let picks = self.accel().sample(self.len(), n, &mut rng);
        self.take(&picks)
    }

    pub fn stats(&self) -> ColumnStats {
        ColumnStats::from_values(&self.data)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.data.clone()
    }

    pub fn to_pairs(&self) -> Vec<(Label, Value)> {
        self.index.iter().cloned().zip(self.data.iter().cloned()).collect()
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.index == other.index && self.name == other.name
        // backend and declared dtype are not part of equality
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("name", &self.name)
            .field("dtype", &self.dtype())
            .field("index", &self.index)
            .field("data", &self.data)
            .field("backend", &self.backend.name())
            .finish()
    }
}
