//! Error taxonomy and configuration tests

mod test_data_gen;

use std::io;

use tabula_core::config::{CsvOptions, EngineConfig};
use tabula_core::Error;
use tabula_exec::Engine;
use tabula_io::FileSource;
use test_data_gen::*;

#[test]
fn test_display_strings() {
    assert_eq!(Error::not_found("column 'x'").to_string(), "not found: column 'x'");
    assert_eq!(Error::invalid("bad op").to_string(), "invalid argument: bad op");
    let wrapped = Error::not_found("column 'x'").with_context("aggregating");
    assert_eq!(wrapped.to_string(), "Error in aggregating: not found: column 'x'");
}

#[test]
fn test_context_chain_keeps_root() {
    let err = Error::invalid("length mismatch (2 vs 3)")
        .with_context("batch 4")
        .with_context("streaming input.csv");
    assert!(matches!(err, Error::Context { .. }));
    assert!(matches!(err.root(), Error::InvalidArgument(_)));
    assert!(err.is_invalid_argument());
    assert!(!err.is_not_found());

    let source = std::error::Error::source(&err).map(|e| e.to_string());
    assert_eq!(
        source.as_deref(),
        Some("Error in batch 4: invalid argument: length mismatch (2 vs 3)")
    );
}

#[test]
fn test_suggestions() {
    let column = Error::not_found("column 'prcie'").with_context("agg");
    assert_eq!(column.suggestions().len(), 2);
    assert!(column.suggestions()[0].contains("spelled"));

    let row = Error::not_found("row label '9'");
    assert!(row.suggestions()[0].contains("iloc"));

    assert!(Error::invalid("batch size must be at least 1").suggestions()[0].contains("batch size"));
    assert!(Error::invalid("length mismatch").suggestions()[0].contains("same number of rows"));
    assert!(Error::invalid("column 'name' is non-numeric").suggestions()[0].contains("non-numeric"));
    assert!(Error::Security("denied".into()).suggestions()[0].contains("permissions"));
    assert!(Error::invalid("unknown aggregation 'mode'").suggestions().is_empty());
}

#[test]
fn test_io_errors_are_classified() {
    let denied: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
    assert!(matches!(denied, Error::Security(_)));

    let missing: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(missing, Error::Io(_)));
    // an absent file is an I/O failure, not a lookup miss
    assert!(!missing.is_not_found());
}

#[test]
fn test_frame_lookup_errors() {
    let df = people();
    let err = df.column("salary").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("salary"));
    assert!(!err.suggestions().is_empty());

    assert!(df.iloc(10).unwrap_err().is_not_found());
    assert!(df.agg(&[("age", "median")]).unwrap_err().is_invalid_argument());
}

#[test]
fn test_engine_wraps_open_failures_with_source() {
    let engine = Engine::default();
    let path = std::env::temp_dir().join("tabula_missing_input_5d1e.csv");
    let path = path.to_string_lossy().to_string();
    let err = engine.batch_sum(&FileSource::new(&path), "value").unwrap_err();
    assert!(matches!(err, Error::Context { .. }));
    assert!(matches!(err.root(), Error::Io(_)));
    assert!(err.to_string().contains(&path));
}

#[test]
fn test_config_json_round_trip() {
    let cfg = EngineConfig::default()
        .with_batch_size(64)
        .with_seed(11)
        .with_csv(CsvOptions::default().with_delimiter('|').with_strict_types(true));
    let json = cfg.to_json().unwrap();
    assert_eq!(EngineConfig::from_json(&json).unwrap(), cfg);
}

#[test]
fn test_config_json_errors_are_invalid_argument() {
    let err = EngineConfig::from_json("{ \"batch_size\": \"many\" }").unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("config"));
}

#[test]
fn test_csv_option_defaults() {
    let opts = CsvOptions::default();
    assert_eq!(opts.delimiter, ',');
    assert!(opts.has_header);
    assert!(opts.auto_type);
    assert_eq!(opts.encoding, "UTF-8");
    assert_eq!(opts.skip_lines, 0);
    assert_eq!(opts.null_tokens, ["", "null", "NULL", "NA", "N/A"]);
    assert!(opts.trim);
    assert!(!opts.strict_types);

    let cfg = EngineConfig::default();
    assert_eq!(cfg.batch_size, 1000);
    assert_eq!(cfg.seed, None);
}

#[test]
fn test_config_from_env() {
    std::env::set_var("TABULA_BATCH_SIZE", "250");
    std::env::set_var("TABULA_SEED", "3");
    std::env::set_var("TABULA_DELIMITER", ";");
    std::env::set_var("TABULA_SKIP_LINES", "not-a-number");

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.batch_size, 250);
    assert_eq!(cfg.seed, Some(3));
    assert_eq!(cfg.csv.delimiter, ';');
    // unparsable values fall back to the default
    assert_eq!(cfg.csv.skip_lines, 0);

    for var in ["TABULA_BATCH_SIZE", "TABULA_SEED", "TABULA_DELIMITER", "TABULA_SKIP_LINES"] {
        std::env::remove_var(var);
    }
}
