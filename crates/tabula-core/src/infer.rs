//! Single-sample type inference.
//!
//! A column's class is decided from one sample cell (the first data row) and
//! the resulting `ColumnConverter` is applied to every later cell of that
//! column without re-validation. Conversion never fails: a cell that does not
//! parse as its column's class is kept as the raw string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{Value, ValueKind};

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("static regex"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").expect("static regex"));
static DECIMAL_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.\d+[eE][+-]?\d+$").expect("static regex"));
static INTEGER_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+[eE][+-]?\d+$").expect("static regex"));
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));
static US_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static regex"));

const BOOL_WORDS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];
const TRUE_WORDS: [&str; 3] = ["true", "yes", "1"];

/// Outcome of classifying one sample cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleClass {
    Null,
    /// Fits in 32 bits.
    Int,
    /// Integral but wider than 32 bits.
    Long,
    Double,
    Bool,
    /// Recognized date shape; values stay strings.
    Date,
    Text,
}

impl SampleClass {
    pub fn value_kind(self) -> ValueKind {
        match self {
            SampleClass::Null => ValueKind::Unknown,
            SampleClass::Int => ValueKind::Int32,
            SampleClass::Long => ValueKind::Int64,
            SampleClass::Double => ValueKind::Float64,
            SampleClass::Bool => ValueKind::Bool,
            SampleClass::Date | SampleClass::Text => ValueKind::String,
        }
    }
}

/// Classify a sample cell. Rules are checked in priority order.
pub fn classify(sample: &str, null_tokens: &[String]) -> SampleClass {
    if is_null_token(sample, null_tokens) {
        return SampleClass::Null;
    }

    if INTEGER.is_match(sample) {
        return if sample.parse::<i32>().is_ok() {
            SampleClass::Int
        } else if sample.parse::<i64>().is_ok() {
            SampleClass::Long
        } else {
            SampleClass::Text
        };
    }

    if DECIMAL.is_match(sample) || DECIMAL_EXP.is_match(sample) || INTEGER_EXP.is_match(sample) {
        return SampleClass::Double;
    }

    if BOOL_WORDS.iter().any(|w| sample.eq_ignore_ascii_case(w)) {
        return SampleClass::Bool;
    }

    if ISO_DATE.is_match(sample) || US_DATE.is_match(sample) {
        return SampleClass::Date;
    }

    SampleClass::Text
}

/// Convert a raw cell according to `class`, keeping the raw string when the
/// parse fails.
pub fn convert(raw: &str, class: SampleClass) -> Value {
    match class {
        SampleClass::Int => raw
            .parse::<i32>()
            .map(Value::I32)
            .unwrap_or_else(|_| Value::Str(raw.to_string())),
        SampleClass::Long => raw
            .parse::<i64>()
            .map(Value::I64)
            .unwrap_or_else(|_| Value::Str(raw.to_string())),
        SampleClass::Double => raw
            .parse::<f64>()
            .map(Value::F64)
            .unwrap_or_else(|_| Value::Str(raw.to_string())),
        SampleClass::Bool => Value::Bool(TRUE_WORDS.iter().any(|w| raw.eq_ignore_ascii_case(w))),
        SampleClass::Date | SampleClass::Text | SampleClass::Null => Value::Str(raw.to_string()),
    }
}

pub fn is_null_token(raw: &str, null_tokens: &[String]) -> bool {
    null_tokens.iter().any(|t| t == raw)
}

/// Per-column conversion function derived from one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConverter {
    pub class: SampleClass,
}

impl ColumnConverter {
    pub fn infer(sample: &str, null_tokens: &[String]) -> Self {
        Self {
            class: classify(sample, null_tokens),
        }
    }

    /// Converter used when type inference is disabled: null tokens still map
    /// to `Null`, everything else stays text.
    pub fn raw() -> Self {
        Self {
            class: SampleClass::Text,
        }
    }

    pub fn apply(&self, raw: &str, null_tokens: &[String]) -> Value {
        if is_null_token(raw, null_tokens) {
            Value::Null
        } else {
            convert(raw, self.class)
        }
    }

    /// Whether `raw` actually conforms to this column's class.
    ///
    /// Only consulted by strict validation; the default read path trusts the
    /// sample.
    pub fn check(&self, raw: &str) -> bool {
        match self.class {
            SampleClass::Int => raw.parse::<i32>().is_ok(),
            SampleClass::Long => raw.parse::<i64>().is_ok(),
            SampleClass::Double => raw.parse::<f64>().is_ok(),
            SampleClass::Bool => BOOL_WORDS.iter().any(|w| raw.eq_ignore_ascii_case(w)),
            SampleClass::Date => ISO_DATE.is_match(raw) || US_DATE.is_match(raw),
            SampleClass::Text | SampleClass::Null => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<String> {
        crate::config::CsvOptions::default().null_tokens
    }

    #[test]
    fn classify_priority() {
        let nt = tokens();
        assert_eq!(classify("NA", &nt), SampleClass::Null);
        assert_eq!(classify("", &nt), SampleClass::Null);
        assert_eq!(classify("25", &nt), SampleClass::Int);
        assert_eq!(classify("1", &nt), SampleClass::Int);
        assert_eq!(classify("-3000000000", &nt), SampleClass::Long);
        assert_eq!(classify("99999999999999999999", &nt), SampleClass::Text);
        assert_eq!(classify("95.5", &nt), SampleClass::Double);
        assert_eq!(classify("1.5e10", &nt), SampleClass::Double);
        assert_eq!(classify("2E-3", &nt), SampleClass::Double);
        assert_eq!(classify("Yes", &nt), SampleClass::Bool);
        assert_eq!(classify("2024-01-31", &nt), SampleClass::Date);
        assert_eq!(classify("01/31/2024", &nt), SampleClass::Date);
        assert_eq!(classify(".5", &nt), SampleClass::Text);
        assert_eq!(classify("Alice", &nt), SampleClass::Text);
    }

    #[test]
    fn convert_degrades_to_raw() {
        assert_eq!(convert("42", SampleClass::Int), Value::I32(42));
        assert_eq!(convert("abc", SampleClass::Int), Value::from("abc"));
        assert_eq!(convert("3000000000", SampleClass::Int), Value::from("3000000000"));
        assert_eq!(convert("2.5", SampleClass::Double), Value::F64(2.5));
        assert_eq!(convert("YES", SampleClass::Bool), Value::Bool(true));
        assert_eq!(convert("maybe", SampleClass::Bool), Value::Bool(false));
        assert_eq!(convert("2024-01-31", SampleClass::Date), Value::from("2024-01-31"));
    }

    #[test]
    fn converter_maps_null_tokens() {
        let nt = tokens();
        let conv = ColumnConverter::infer("10", &nt);
        assert_eq!(conv.apply("N/A", &nt), Value::Null);
        assert_eq!(conv.apply("11", &nt), Value::I32(11));
        assert!(conv.check("12"));
        assert!(!conv.check("12.5"));
        assert_eq!(ColumnConverter::raw().apply("12", &nt), Value::from("12"));
    }
}
