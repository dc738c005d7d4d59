//! Acceleration backend trait + dispatch.
//!
//! Series and DataFrame hold a `SharedBackend` and call `resolve` before
//! every numeric hot path: a backend that reports itself unavailable is
//! replaced by the pure algorithms, so availability only changes speed.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tabula_core::error::Result;

use crate::pure;

/// Five-number summary over the non-NaN values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Numeric hot paths.
///
/// Invariants:
/// - Every method defaults to the matching `pure` algorithm; an override must
///   agree with it within `1e-3`.
/// - `is_available` must be side-effect-free and callable from any thread.
pub trait AccelBackend: Send + Sync {
    /// Stable backend name (used in traces).
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    fn sum(&self, values: &[f64]) -> f64 {
        pure::sum(values)
    }

    fn mean(&self, values: &[f64]) -> f64 {
        pure::mean(values)
    }

    fn max(&self, values: &[f64]) -> f64 {
        pure::max(values)
    }

    fn min(&self, values: &[f64]) -> f64 {
        pure::min(values)
    }

    fn variance(&self, values: &[f64]) -> f64 {
        pure::variance(values)
    }

    fn std(&self, values: &[f64]) -> f64 {
        self.variance(values).sqrt()
    }

    fn normalize(&self, values: &[f64]) -> Vec<f64> {
        pure::normalize(values)
    }

    fn argsort(&self, values: &[f64]) -> Vec<usize> {
        pure::argsort(values)
    }

    fn greater_than_mask(&self, values: &[f64], threshold: f64) -> Vec<bool> {
        pure::greater_than_mask(values, threshold)
    }

    fn vectorized_add(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        pure::vectorized_add(a, b)
    }

    fn vectorized_multiply(&self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        pure::vectorized_multiply(a, b)
    }

    fn dot_product(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        pure::dot_product(a, b)
    }

    fn norm(&self, values: &[f64]) -> f64 {
        pure::norm(values)
    }

    fn sort_indices(&self, values: &[f64], descending: bool) -> Vec<usize> {
        pure::sort_indices(values, descending)
    }

    fn group_by_sum(&self, values: &[f64], groups: &[i64]) -> Result<Vec<(i64, f64)>> {
        pure::group_by_sum(values, groups)
    }

    fn merge_indices(&self, left: &[f64], right: &[f64]) -> Vec<(usize, usize)> {
        pure::merge_indices(left, right)
    }

    fn sample(&self, len: usize, n: usize, rng: &mut StdRng) -> Vec<usize> {
        pure::sample(len, n, rng)
    }

    fn describe(&self, values: &[f64]) -> Describe {
        pure::describe(values)
    }

    fn find_null_indices(&self, values: &[Option<f64>]) -> Vec<usize> {
        pure::find_null_indices(values)
    }

    fn drop_null_values(&self, values: &[Option<f64>]) -> Vec<f64> {
        pure::drop_null_values(values)
    }

    fn fill_null_with_constant(&self, values: &[Option<f64>], fill: f64) -> Vec<f64> {
        pure::fill_null_with_constant(values, fill)
    }

    fn where_indices(&self, mask: &[bool]) -> Vec<usize> {
        pure::where_indices(mask)
    }
}

/// The mandatory fallback: every method is the reference algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct PureBackend;

impl AccelBackend for PureBackend {
    fn name(&self) -> &'static str {
        "pure"
    }
}

pub type SharedBackend = Arc<dyn AccelBackend>;

static PURE: PureBackend = PureBackend;

pub fn default_backend() -> SharedBackend {
    Arc::new(PureBackend)
}

/// Pick the backend to dispatch to: `backend` when it is available, the pure
/// fallback otherwise.
pub fn resolve(backend: &dyn AccelBackend) -> &dyn AccelBackend {
    if backend.is_available() {
        backend
    } else {
        &PURE
    }
}

/// RNG for sampling: deterministic when a seed is given, OS-seeded otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}
