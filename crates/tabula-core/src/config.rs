//! Reader and engine configuration that downstream crates can serialize/deserialize.
//!
//! Passed explicitly to the parser and the streaming engine; there is no
//! process-wide settings object.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How CSV text is tokenized and typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field separator.
    pub delimiter: char,

    /// First (non-skipped) line holds the column names.
    pub has_header: bool,

    /// Infer one converter per column from the first data row.
    pub auto_type: bool,

    /// Source encoding label (`UTF-8` or `ISO-8859-1`).
    pub encoding: String,

    /// Raw lines dropped before the header.
    pub skip_lines: usize,

    /// Cells equal to one of these become `Value::Null`.
    pub null_tokens: Vec<String>,

    /// Strip whitespace around every field.
    pub trim: bool,

    /// Check every cell against its column's inferred class and fail on the
    /// first mismatch instead of keeping the raw string.
    #[serde(default)]
    pub strict_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            auto_type: true,
            encoding: "UTF-8".to_string(),
            skip_lines: 0,
            null_tokens: ["", "null", "NULL", "NA", "N/A"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trim: true,
            strict_types: false,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_auto_type(mut self, auto_type: bool) -> Self {
        self.auto_type = auto_type;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    pub fn with_null_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }
}

/// Streaming engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub csv: CsvOptions,

    /// Rows per emitted batch. Zero is rejected when a stream starts.
    pub batch_size: usize,

    /// Optional seed for deterministic sampling.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            batch_size: 1000,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABULA_BATCH_SIZE`: rows per batch
    /// - `TABULA_SEED`: sampling seed
    /// - `TABULA_DELIMITER`: single-character field separator
    /// - `TABULA_ENCODING`: source encoding label
    /// - `TABULA_SKIP_LINES`: lines to skip before the header
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABULA_BATCH_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.batch_size = v;
            }
        }

        if let Ok(s) = std::env::var("TABULA_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        if let Ok(s) = std::env::var("TABULA_DELIMITER") {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                cfg.csv.delimiter = c;
            }
        }

        if let Ok(s) = std::env::var("TABULA_ENCODING") {
            cfg.csv.encoding = s;
        }

        if let Ok(s) = std::env::var("TABULA_SKIP_LINES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.csv.skip_lines = v;
            }
        }

        cfg
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
