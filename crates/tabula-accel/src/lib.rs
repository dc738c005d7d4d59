#![forbid(unsafe_code)]
//! tabula-accel: interchangeable numeric backends.
//!
//! - `backend`: the `AccelBackend` trait (every method defaults to the pure
//!   algorithm) and the dispatch helper that falls back when a backend
//!   reports itself unavailable.
//! - `pure`: reference algorithms over `f64` slices.
//! - `lanes`: a backend with 4-lane unrolled reductions.

pub mod backend;
pub mod lanes;
pub mod pure;

pub use backend::{
    default_backend, resolve, seeded_rng, AccelBackend, Describe, PureBackend, SharedBackend,
};
pub use lanes::LaneBackend;
