//! Equality joins on one key column.
//!
//! Build/probe hash join. Output rows come out in the order a nested loop
//! over (outer side, inner side) would produce them:
//!
//! - inner/left: left rows in order, each followed by its right matches in
//!   right order; left emits unmatched left rows inline.
//! - right: right rows in order, each with its left matches in left order.
//! - outer: matched pairs left-major, then unmatched left, then unmatched
//!   right.
//!
//! Null keys compare equal to each other.

use std::collections::HashMap;
use std::str::FromStr;

use tabula_core::error::{Error, Result};
use tabula_core::types::{Label, Value, ValueKey};

use crate::frame::DataFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinType {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "outer" | "full" => Ok(JoinType::Outer),
            _ => Err(Error::invalid(format!("unknown join type: {}", s))),
        }
    }
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        JoinType::parse(s)
    }
}

/// Row positions keyed by join key, each list in ascending row order.
fn build(keys: &[Value]) -> HashMap<ValueKey, Vec<usize>> {
    let mut table: HashMap<ValueKey, Vec<usize>> = HashMap::new();
    for (i, k) in keys.iter().enumerate() {
        table.entry(k.key()).or_default().push(i);
    }
    table
}

/// `(left, right)` row pairs in output order; `None` marks the padded side.
fn pair_rows(left: &[Value], right: &[Value], how: JoinType) -> Vec<(Option<usize>, Option<usize>)> {
    let mut pairs = Vec::new();
    match how {
        JoinType::Inner | JoinType::Left => {
            let table = build(right);
            for (i, k) in left.iter().enumerate() {
                match table.get(&k.key()) {
                    Some(js) => pairs.extend(js.iter().map(|&j| (Some(i), Some(j)))),
                    None if how == JoinType::Left => pairs.push((Some(i), None)),
                    None => {}
                }
            }
        }
        JoinType::Right => {
            let table = build(left);
            for (j, k) in right.iter().enumerate() {
                match table.get(&k.key()) {
                    Some(is) => pairs.extend(is.iter().map(|&i| (Some(i), Some(j)))),
                    None => pairs.push((None, Some(j))),
                }
            }
        }
        JoinType::Outer => {
            let table = build(right);
            let mut right_matched = vec![false; right.len()];
            let mut unmatched_left = Vec::new();
            for (i, k) in left.iter().enumerate() {
                match table.get(&k.key()) {
                    Some(js) => {
                        for &j in js {
                            right_matched[j] = true;
                            pairs.push((Some(i), Some(j)));
                        }
                    }
                    None => unmatched_left.push((Some(i), None)),
                }
            }
            pairs.extend(unmatched_left);
            pairs.extend(
                right_matched
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| !**m)
                    .map(|(j, _)| (None, Some(j))),
            );
        }
    }
    pairs
}

impl DataFrame {
    /// Join `other` on the `on` column. Output columns are every left column,
    /// then the right non-key columns (suffixed `_right` on a name clash).
    /// The result is indexed `0..n`.
    pub fn merge(&self, other: &DataFrame, on: &str, how: JoinType) -> Result<DataFrame> {
        let lk = self.col_pos(on)?;
        let rk = other.col_pos(on)?;
        let pairs = pair_rows(&self.data[lk], &other.data[rk], how);

        let mut columns = self.columns.clone();
        let mut data: Vec<Vec<Value>> = Vec::with_capacity(self.columns.len() + other.columns.len());

        for (c, col) in self.data.iter().enumerate() {
            let vals = pairs
                .iter()
                .map(|(l, r)| match (l, r) {
                    (Some(i), _) => col[*i].clone(),
                    // right-only row: the key comes from the right side
                    (None, Some(j)) if c == lk => other.data[rk][*j].clone(),
                    _ => Value::Null,
                })
                .collect();
            data.push(vals);
        }

        for (c, col) in other.data.iter().enumerate() {
            if c == rk {
                continue;
            }
            let name = &other.columns[c];
            let name = if self.has_column(name) {
                format!("{}_right", name)
            } else {
                name.clone()
            };
            if columns.contains(&name) {
                return Err(Error::invalid(format!(
                    "merge would produce duplicate column '{}'",
                    name
                )));
            }
            columns.push(name);
            data.push(
                pairs
                    .iter()
                    .map(|(_, r)| r.map(|j| col[j].clone()).unwrap_or(Value::Null))
                    .collect(),
            );
        }

        Ok(DataFrame {
            columns,
            data,
            index: Label::range(pairs.len()),
            backend: self.backend.clone(),
        })
    }

    /// `merge` with the join type given by name (`inner`, `left`, `right`,
    /// `outer`/`full`).
    pub fn join(&self, other: &DataFrame, on: &str, how: &str) -> Result<DataFrame> {
        self.merge(other, on, JoinType::parse(how)?)
    }

    /// Fold `merge` over `others`, left to right.
    pub fn merge_multiple(&self, others: &[DataFrame], on: &str, how: JoinType) -> Result<DataFrame> {
        others
            .iter()
            .try_fold(self.clone(), |acc, df| acc.merge(df, on, how))
    }
}
