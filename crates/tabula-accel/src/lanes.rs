//! 4-lane unrolled reductions.
//!
//! Splits each slice into chunks of four and keeps one accumulator per lane
//! so the compiler can vectorize the inner loop. Summation order differs from
//! the pure backend, so results agree within floating tolerance rather than
//! bit-for-bit.

use tabula_core::error::{Error, Result};

use crate::backend::AccelBackend;

const LANES: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct LaneBackend {
    enabled: bool,
}

impl LaneBackend {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// A backend that reports itself unavailable, so dispatch falls back to
    /// the pure algorithms.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for LaneBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn lane_sum(values: &[f64]) -> f64 {
    let mut acc = [0.0f64; LANES];
    let chunks = values.chunks_exact(LANES);
    let tail = chunks.remainder();
    for c in chunks {
        for l in 0..LANES {
            acc[l] += c[l];
        }
    }
    acc.iter().sum::<f64>() + tail.iter().sum::<f64>()
}

fn lane_sum_sq_dev(values: &[f64], mu: f64) -> f64 {
    let mut acc = [0.0f64; LANES];
    let chunks = values.chunks_exact(LANES);
    let tail = chunks.remainder();
    for c in chunks {
        for l in 0..LANES {
            let d = c[l] - mu;
            acc[l] += d * d;
        }
    }
    acc.iter().sum::<f64>() + tail.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>()
}

fn lane_fold(values: &[f64], f: fn(f64, f64) -> f64) -> f64 {
    // f64::min/max return the non-NaN operand, so NaN seeds and NaN cells drop out.
    let mut acc = [f64::NAN; LANES];
    let chunks = values.chunks_exact(LANES);
    let tail = chunks.remainder();
    for c in chunks {
        for l in 0..LANES {
            acc[l] = f(acc[l], c[l]);
        }
    }
    tail.iter().chain(acc.iter()).fold(f64::NAN, |a, b| f(a, *b))
}

impl AccelBackend for LaneBackend {
    fn name(&self) -> &'static str {
        "lanes"
    }

    fn is_available(&self) -> bool {
        self.enabled
    }

    fn sum(&self, values: &[f64]) -> f64 {
        lane_sum(values)
    }

    fn mean(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        lane_sum(values) / values.len() as f64
    }

    fn max(&self, values: &[f64]) -> f64 {
        lane_fold(values, f64::max)
    }

    fn min(&self, values: &[f64]) -> f64 {
        lane_fold(values, f64::min)
    }

    fn variance(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return f64::NAN;
        }
        let mu = self.mean(values);
        lane_sum_sq_dev(values, mu) / (values.len() - 1) as f64
    }

    fn dot_product(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::invalid(format!(
                "dot_product: length mismatch ({} vs {})",
                a.len(),
                b.len()
            )));
        }
        let mut acc = [0.0f64; LANES];
        let ca = a.chunks_exact(LANES);
        let cb = b.chunks_exact(LANES);
        let tail: f64 = ca
            .remainder()
            .iter()
            .zip(cb.remainder())
            .map(|(x, y)| x * y)
            .sum();
        for (x, y) in ca.zip(cb) {
            for l in 0..LANES {
                acc[l] += x[l] * y[l];
            }
        }
        Ok(acc.iter().sum::<f64>() + tail)
    }

    fn norm(&self, values: &[f64]) -> f64 {
        lane_sum_sq_dev(values, 0.0).sqrt()
    }
}
