//! Test data generation utilities for the tabula test suite
#![allow(dead_code)]

use tabula_core::types::Value;
use tabula_frame::DataFrame;
use tabula_io::MemorySource;

/// CSV with `rows` rows: `id` (int), `group` (4 labels), `value` (float),
/// `score` (int, every 5th row empty).
pub fn numeric_csv(rows: usize) -> String {
    let mut out = String::from("id,group,value,score\n");
    for i in 0..rows {
        let group = ["north", "south", "east", "west"][i % 4];
        let value = (i as f64) * 1.5 - 7.25;
        let score = if i % 5 == 4 {
            String::new()
        } else {
            ((i * 7) % 23).to_string()
        };
        out.push_str(&format!("{},{},{},{}\n", i, group, value, score));
    }
    out
}

pub fn numeric_source(rows: usize) -> MemorySource {
    MemorySource::from(numeric_csv(rows))
}

/// The `value` column of `numeric_csv(rows)`.
pub fn numeric_values(rows: usize) -> Vec<f64> {
    (0..rows).map(|i| (i as f64) * 1.5 - 7.25).collect()
}

pub fn people_csv() -> &'static str {
    "name,age,score\nAlice,25,95.5\nBob,30,87.2\nCara,,70.0\nDan,41,\n"
}

pub fn people() -> DataFrame {
    DataFrame::from_csv(people_csv()).expect("people fixture")
}

/// Two-column frame `key`/`{prefix}` with one row per key.
pub fn keyed_frame(keys: &[i32], prefix: &str) -> DataFrame {
    DataFrame::from_columns(vec![
        ("key", keys.iter().map(|k| Value::I32(*k)).collect()),
        (
            prefix,
            keys.iter().map(|k| Value::from(format!("{}{}", prefix, k))).collect(),
        ),
    ])
    .expect("keyed fixture")
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}
