//! Single-sample type inference tests

use tabula_core::config::CsvOptions;
use tabula_core::infer::{classify, convert, ColumnConverter, SampleClass};
use tabula_core::types::{Value, ValueKind};
use tabula_frame::{read_csv_str, DataFrame};

fn nulls() -> Vec<String> {
    CsvOptions::default().null_tokens
}

#[test]
fn test_classify_priority_order() {
    let n = nulls();
    assert_eq!(classify("", &n), SampleClass::Null);
    assert_eq!(classify("NA", &n), SampleClass::Null);
    assert_eq!(classify("42", &n), SampleClass::Int);
    assert_eq!(classify("-7", &n), SampleClass::Int);
    assert_eq!(classify("3000000000", &n), SampleClass::Long);
    assert_eq!(classify("2.5", &n), SampleClass::Double);
    assert_eq!(classify("1.5e3", &n), SampleClass::Double);
    assert_eq!(classify("2E-4", &n), SampleClass::Double);
    assert_eq!(classify("TRUE", &n), SampleClass::Bool);
    assert_eq!(classify("no", &n), SampleClass::Bool);
    assert_eq!(classify("2024-01-15", &n), SampleClass::Date);
    assert_eq!(classify("01/15/2024", &n), SampleClass::Date);
    assert_eq!(classify("hello", &n), SampleClass::Text);
}

#[test]
fn test_integer_wins_over_bool_for_digits() {
    // "1" and "0" are also bool words, but the integer rule comes first
    assert_eq!(classify("1", &nulls()), SampleClass::Int);
    assert_eq!(classify("0", &nulls()), SampleClass::Int);
}

#[test]
fn test_integer_too_wide_for_i64_is_text() {
    assert_eq!(classify("99999999999999999999", &nulls()), SampleClass::Text);
}

#[test]
fn test_convert_keeps_raw_string_on_mismatch() {
    assert_eq!(convert("12", SampleClass::Int), Value::I32(12));
    assert_eq!(convert("2.5", SampleClass::Int), Value::from("2.5"));
    assert_eq!(convert("abc", SampleClass::Double), Value::from("abc"));
    assert_eq!(convert("yes", SampleClass::Bool), Value::Bool(true));
    assert_eq!(convert("whatever", SampleClass::Bool), Value::Bool(false));
    assert_eq!(convert("2024-01-15", SampleClass::Date), Value::from("2024-01-15"));
}

#[test]
fn test_value_kinds_per_class() {
    assert_eq!(SampleClass::Int.value_kind(), ValueKind::Int32);
    assert_eq!(SampleClass::Long.value_kind(), ValueKind::Int64);
    assert_eq!(SampleClass::Double.value_kind(), ValueKind::Float64);
    assert_eq!(SampleClass::Date.value_kind(), ValueKind::String);
    assert_eq!(SampleClass::Null.value_kind(), ValueKind::Unknown);
}

#[test]
fn test_converter_maps_null_tokens_first() {
    let conv = ColumnConverter::infer("5", &nulls());
    assert_eq!(conv.apply("NULL", &nulls()), Value::Null);
    assert_eq!(conv.apply("8", &nulls()), Value::I32(8));
    assert!(conv.check("8"));
    assert!(!conv.check("8.5"));
}

#[test]
fn test_first_row_decides_column_type() {
    let df = DataFrame::from_csv("n\n1\n2.5\nx\n").unwrap();
    assert_eq!(df["n"], [Value::I32(1), Value::from("2.5"), Value::from("x")]);
}

#[test]
fn test_float_first_row_parses_later_integers_as_floats() {
    let df = DataFrame::from_csv("v\n1.5\n2\n").unwrap();
    assert_eq!(df["v"], [Value::F64(1.5), Value::F64(2.0)]);
}

#[test]
fn test_null_sample_leaves_column_as_text() {
    let df = DataFrame::from_csv("a,b\n,1\n7,2\n").unwrap();
    assert_eq!(df["a"], [Value::Null, Value::from("7")]);
    assert_eq!(df["b"], [Value::I32(1), Value::I32(2)]);
}

#[test]
fn test_auto_type_off_keeps_strings() {
    let opts = CsvOptions::default().with_auto_type(false);
    let df = read_csv_str("a,b\n1,\n2,x\n", &opts).unwrap();
    assert_eq!(df["a"], [Value::from("1"), Value::from("2")]);
    assert_eq!(df["b"], [Value::Null, Value::from("x")]);
}

#[test]
fn test_strict_types_rejects_mismatched_cell() {
    let opts = CsvOptions::default().with_strict_types(true);
    let err = read_csv_str("n\n1\n2.5\n", &opts).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("line 3"));
}

#[test]
fn test_strict_types_accepts_nulls() {
    let opts = CsvOptions::default().with_strict_types(true);
    let df = read_csv_str("n\n1\n\n3\n", &opts).unwrap();
    assert_eq!(df["n"], [Value::I32(1), Value::Null, Value::I32(3)]);
}

#[test]
fn test_dates_stay_strings() {
    let df = DataFrame::from_csv("day\n2024-03-01\n2024-03-02\n").unwrap();
    assert_eq!(df.dtypes(), vec![("day".to_string(), ValueKind::String)]);
}
