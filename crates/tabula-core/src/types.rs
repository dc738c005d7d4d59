//! Cell values, row labels, and value kinds.
//!
//! Cells are a closed tagged variant instead of dynamically typed objects;
//! a column's declared `ValueKind` is metadata only, the storage is always
//! `Vec<Value>` with `Value::Null` marking absent cells.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column value-kind enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
    /// Nothing observed yet (empty or all-null column).
    Unknown,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, ValueKind::Float32 | ValueKind::Float64)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ValueKind::Int8 | ValueKind::Int16 | ValueKind::Int32 | ValueKind::Int64
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Int8 => "int8",
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Unknown,
            Value::Bool(_) => ValueKind::Bool,
            Value::I32(_) => ValueKind::Int32,
            Value::I64(_) => ValueKind::Int64,
            Value::F32(_) => ValueKind::Float32,
            Value::F64(_) => ValueKind::Float64,
            Value::Str(_) => ValueKind::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Numeric view of the cell. Booleans and strings are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Hashable identity used for grouping and join keys.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::I32(v) => ValueKey::Int(*v as i64),
            Value::I64(v) => ValueKey::Int(*v),
            Value::F32(v) => ValueKey::float(*v as f64),
            Value::F64(v) => ValueKey::float(*v),
            Value::Str(s) => ValueKey::Str(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            // Keep a fractional digit on whole floats so they re-infer as floats.
            Value::F32(v) if v.is_finite() && v.fract() == 0.0 => {
                write!(f, "{:.1}", v)
            }
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) if v.is_finite() && v.fract() == 0.0 => {
                write!(f, "{:.1}", v)
            }
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Normalized, hashable form of a `Value`.
///
/// Integers of every width collapse into `Int`; floats are keyed by their bit
/// pattern with `-0.0` folded into `0.0` and every NaN folded into one key.
/// An integer and a float never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
}

impl ValueKey {
    fn float(v: f64) -> Self {
        if v.is_nan() {
            ValueKey::Float(f64::NAN.to_bits())
        } else if v == 0.0 {
            ValueKey::Float(0.0f64.to_bits())
        } else {
            ValueKey::Float(v.to_bits())
        }
    }
}

/// Row label. Only integers and strings are valid labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl Label {
    /// Default positional labels `0..n`.
    pub fn range(n: usize) -> Vec<Label> {
        (0..n).map(|i| Label::Int(i as i64)).collect()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Label::Int(v)
    }
}

impl From<i32> for Label {
    fn from(v: i32) -> Self {
        Label::Int(v as i64)
    }
}

impl From<usize> for Label {
    fn from(v: usize) -> Self {
        Label::Int(v as i64)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Label::Str(v.to_string())
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Label::Str(v)
    }
}

/// Element-wise arithmetic supported on numeric cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
}

/// Apply `op` to two cells.
///
/// Two integers stay integral (widening to `I64`, then `F64` on overflow);
/// any float operand produces `F64`. Null or non-numeric operands give `Null`.
pub fn numeric_binop(a: &Value, b: &Value, op: NumericOp) -> Value {
    match (a, b) {
        (Value::I32(x), Value::I32(y)) => {
            let r = match op {
                NumericOp::Add => x.checked_add(*y),
                NumericOp::Sub => x.checked_sub(*y),
                NumericOp::Mul => x.checked_mul(*y),
            };
            match r {
                Some(v) => Value::I32(v),
                None => int_binop(*x as i64, *y as i64, op),
            }
        }
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => int_binop(x, y, op),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Value::F64(float_binop(x, y, op)),
                _ => Value::Null,
            },
        },
    }
}

fn int_binop(x: i64, y: i64, op: NumericOp) -> Value {
    let r = match op {
        NumericOp::Add => x.checked_add(y),
        NumericOp::Sub => x.checked_sub(y),
        NumericOp::Mul => x.checked_mul(y),
    };
    match r {
        Some(v) => Value::I64(v),
        None => Value::F64(float_binop(x as f64, y as f64, op)),
    }
}

fn float_binop(x: f64, y: f64, op: NumericOp) -> f64 {
    match op {
        NumericOp::Add => x + y,
        NumericOp::Sub => x - y,
        NumericOp::Mul => x * y,
    }
}

/// Total ordering over cells.
///
/// Numbers compare numerically across widths (NaN above every number), so a
/// column of mixed `I32`/`F64` sorts by magnitude rather than by its text.
/// Across kinds the order is Null < Bool < number < Str.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    use Value::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Bool(x), Bool(y)) => x.cmp(y),
        (Str(x), Str(y)) => x.cmp(y),
        _ if a.is_numeric() && b.is_numeric() => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => cmp_f64(a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN)),
        },
        _ => type_order(a).cmp(&type_order(b)),
    }
}

/// Float ordering with NaN placed after every number.
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn type_order(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::I32(_) | Value::I64(_) | Value::F32(_) | Value::F64(_) => 2,
        Value::Str(_) => 3,
    }
}
