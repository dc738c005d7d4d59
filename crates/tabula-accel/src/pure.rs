//! Reference numeric algorithms.
//!
//! Every backend must agree with these within `1e-3`. NaN is treated as a
//! missing number by min/max/describe and sorts after every other value.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index;
use tabula_core::error::{Error, Result};
use tabula_core::types::cmp_f64;

use crate::backend::Describe;

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::max)
}

pub fn min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::min)
}

/// Sample variance `Σ(x-μ)²/(n-1)`; NaN for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mu = mean(values);
    let ss: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    ss / (n - 1) as f64
}

pub fn std(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population z-score. Returns the input unchanged when σ is zero.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    let sigma = var.sqrt();
    if sigma == 0.0 || !sigma.is_finite() {
        return values.to_vec();
    }
    values.iter().map(|v| (v - mu) / sigma).collect()
}

/// Ascending argsort (stable, NaN last).
pub fn argsort(values: &[f64]) -> Vec<usize> {
    sort_indices(values, false)
}

/// Stable index sort; NaN stays last in both directions.
pub fn sort_indices(values: &[f64], descending: bool) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| order_nan_last(values[a], values[b], descending));
    idx
}

pub fn greater_than_mask(values: &[f64], threshold: f64) -> Vec<bool> {
    values.iter().map(|v| *v > threshold).collect()
}

fn check_len(op: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::invalid(format!(
            "{}: length mismatch ({} vs {})",
            op,
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

pub fn vectorized_add(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_len("vectorized_add", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

pub fn vectorized_multiply(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    check_len("vectorized_multiply", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).collect())
}

pub fn dot_product(a: &[f64], b: &[f64]) -> Result<f64> {
    check_len("dot_product", a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

pub fn norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Per-group sums, groups reported in first-seen order.
pub fn group_by_sum(values: &[f64], groups: &[i64]) -> Result<Vec<(i64, f64)>> {
    if values.len() != groups.len() {
        return Err(Error::invalid(format!(
            "group_by_sum: length mismatch ({} values vs {} groups)",
            values.len(),
            groups.len()
        )));
    }
    let mut slot: HashMap<i64, usize> = HashMap::new();
    let mut out: Vec<(i64, f64)> = Vec::new();
    for (v, g) in values.iter().zip(groups) {
        let i = *slot.entry(*g).or_insert_with(|| {
            out.push((*g, 0.0));
            out.len() - 1
        });
        out[i].1 += v;
    }
    Ok(out)
}

fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Pairs `(i, j)` with `left[i] == right[j]`, left-major then right order.
pub fn merge_indices(left: &[f64], right: &[f64]) -> Vec<(usize, usize)> {
    let mut table: HashMap<u64, Vec<usize>> = HashMap::new();
    for (j, v) in right.iter().enumerate() {
        if !v.is_nan() {
            table.entry(float_key(*v)).or_default().push(j);
        }
    }

    let mut pairs = Vec::new();
    for (i, v) in left.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if let Some(matches) = table.get(&float_key(*v)) {
            pairs.extend(matches.iter().map(|&j| (i, j)));
        }
    }
    pairs
}

/// `min(n, len)` distinct indices drawn without replacement.
pub fn sample(len: usize, n: usize, rng: &mut StdRng) -> Vec<usize> {
    index::sample(rng, len, n.min(len)).into_vec()
}

pub fn describe(values: &[f64]) -> Describe {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    Describe {
        count: present.len(),
        mean: mean(&present),
        std: std(&present),
        min: min(&present),
        max: max(&present),
    }
}

fn is_missing(v: &Option<f64>) -> bool {
    v.map_or(true, f64::is_nan)
}

pub fn find_null_indices(values: &[Option<f64>]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| is_missing(v))
        .map(|(i, _)| i)
        .collect()
}

pub fn drop_null_values(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter(|v| !is_missing(v))
        .filter_map(|v| *v)
        .collect()
}

pub fn fill_null_with_constant(values: &[Option<f64>], fill: f64) -> Vec<f64> {
    values
        .iter()
        .map(|v| if is_missing(v) { fill } else { v.unwrap_or(fill) })
        .collect()
}

pub fn where_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(i, _)| i)
        .collect()
}

/// Ordering helper shared with callers that sort `(key, position)` pairs.
pub fn order_nan_last(a: f64, b: f64, descending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) if descending => cmp_f64(b, a),
        (false, false) => cmp_f64(a, b),
        (na, nb) => na.cmp(&nb),
    }
}
