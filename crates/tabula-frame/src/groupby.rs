//! In-memory group-by.
//!
//! The full key set is materialized up front (first-seen order) and every
//! row is assigned to exactly one group. Aggregations run on each group's
//! sub-frame and produce one output row per group, key columns first.

use std::collections::HashMap;

use tabula_core::error::{Error, Result};
use tabula_core::types::{Value, ValueKey};

use crate::agg::AggFunc;
use crate::frame::DataFrame;

/// One partition: its key tuple and the row positions that carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<Value>,
    pub rows: Vec<usize>,
}

#[derive(Debug)]
pub struct GroupBy<'a> {
    frame: &'a DataFrame,
    keys: Vec<String>,
    groups: Vec<Group>,
}

impl DataFrame {
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupBy<'_>> {
        if keys.is_empty() {
            return Err(Error::invalid("group_by needs at least one key column"));
        }
        let key_cols = keys
            .iter()
            .map(|k| self.column_values(k))
            .collect::<Result<Vec<_>>>()?;

        let mut slot: HashMap<Vec<ValueKey>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for row in 0..self.len() {
            let key: Vec<Value> = key_cols.iter().map(|c| c[row].clone()).collect();
            let hashed: Vec<ValueKey> = key.iter().map(Value::key).collect();
            match slot.get(&hashed) {
                Some(&g) => groups[g].rows.push(row),
                None => {
                    slot.insert(hashed, groups.len());
                    groups.push(Group { key, rows: vec![row] });
                }
            }
        }

        Ok(GroupBy {
            frame: self,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            groups,
        })
    }
}

impl<'a> GroupBy<'a> {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn ngroups(&self) -> usize {
        self.groups.len()
    }

    /// Rows of the group whose key equals `key`, labels kept.
    pub fn get_group(&self, key: &[Value]) -> Result<DataFrame> {
        let wanted: Vec<ValueKey> = key.iter().map(Value::key).collect();
        self.groups
            .iter()
            .find(|g| g.key.iter().map(Value::key).eq(wanted.iter().cloned()))
            .map(|g| self.frame.take(&g.rows))
            .ok_or_else(|| Error::not_found(format!("group {:?}", key)))
    }

    fn key_columns(&self) -> Vec<(String, Vec<Value>)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let vals = self.groups.iter().map(|g| g.key[i].clone()).collect();
                (name.clone(), vals)
            })
            .collect()
    }

    /// Key columns plus a `size` column holding each group's row count.
    pub fn size(&self) -> Result<DataFrame> {
        let mut cols = self.key_columns();
        let sizes = self
            .groups
            .iter()
            .map(|g| Value::I64(g.rows.len() as i64))
            .collect();
        cols.push(("size".to_string(), sizes));
        DataFrame::from_columns(cols)
    }

    /// Apply `(column, op)` pairs to every group. Key columns named in `ops`
    /// are skipped since the key already heads each row.
    pub fn agg(&self, ops: &[(&str, &str)]) -> Result<DataFrame> {
        let ops: Vec<(&str, &str)> = ops
            .iter()
            .filter(|(c, _)| !self.keys.iter().any(|k| k == c))
            .copied()
            .collect();
        let plan = self.frame.agg_plan(&ops)?;

        let mut cols = self.key_columns();
        let mut agg_cols: Vec<Vec<Value>> = vec![Vec::with_capacity(self.groups.len()); plan.len()];
        for group in &self.groups {
            let sub = self.frame.take(&group.rows);
            for (dst, v) in agg_cols.iter_mut().zip(sub.agg_row(&plan)) {
                dst.push(v);
            }
        }
        for ((c, _), vals) in plan.iter().zip(agg_cols) {
            cols.push((self.frame.columns[*c].clone(), vals));
        }
        Ok(DataFrame::from_columns(cols)?.with_backend(self.frame.backend.clone()))
    }

    fn agg_all(&self, func: AggFunc) -> Result<DataFrame> {
        let op = func.as_str();
        let ops: Vec<(&str, &str)> = self
            .frame
            .columns
            .iter()
            .map(|c| (c.as_str(), op))
            .collect();
        self.agg(&ops)
    }

    pub fn sum(&self) -> Result<DataFrame> {
        self.agg_all(AggFunc::Sum)
    }

    pub fn mean(&self) -> Result<DataFrame> {
        self.agg_all(AggFunc::Mean)
    }

    pub fn count(&self) -> Result<DataFrame> {
        self.agg_all(AggFunc::Count)
    }

    pub fn min(&self) -> Result<DataFrame> {
        self.agg_all(AggFunc::Min)
    }

    pub fn max(&self) -> Result<DataFrame> {
        self.agg_all(AggFunc::Max)
    }
}
