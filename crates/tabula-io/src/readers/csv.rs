//! Streaming CSV reader → typed rows.
//!
//! The reader walks `Idle → HeaderParsed → (TypeInferred)? → Streaming →
//! Drained`. Starting it skips the configured lines, reads the header (or
//! synthesizes `col0..colN-1`), and, with type inference on, looks at the
//! first data row to fix one converter per column. That first row is held
//! back and returned by the first `next_row` call, so it is never consumed
//! twice and never lost.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};

use tabula_core::config::CsvOptions;
use tabula_core::infer::{is_null_token, ColumnConverter};
use tabula_core::types::Value;

use crate::error::{Error, Result};
use crate::readers::lines::{Encoding, LineReader};
use crate::tokenize::parse_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    HeaderParsed,
    TypeInferred,
    Streaming,
    Drained,
}

pub struct CsvReader<R: BufRead> {
    lines: LineReader<R>,
    options: CsvOptions,
    headers: Vec<String>,
    converters: Vec<ColumnConverter>,
    /// First data row, read early for header synthesis or inference.
    pending: Option<(usize, Vec<String>)>,
    state: ReaderState,
    rows_read: usize,
}

impl CsvReader<BufReader<File>> {
    pub fn from_path(path: &str, options: CsvOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file), options)
    }
}

impl<R: BufRead> CsvReader<R> {
    /// Create an idle reader. Nothing is read until `start` (or the first
    /// `next_row`).
    pub fn new(reader: R, options: CsvOptions) -> Result<Self> {
        let encoding = Encoding::from_label(&options.encoding)?;
        Ok(Self {
            lines: LineReader::new(reader, encoding),
            options,
            headers: Vec::new(),
            converters: Vec::new(),
            pending: None,
            state: ReaderState::Idle,
            rows_read: 0,
        })
    }

    /// Create a reader and parse its header (plus the inference sample).
    pub fn open(reader: R, options: CsvOptions) -> Result<Self> {
        let mut rdr = Self::new(reader, options)?;
        rdr.start()?;
        Ok(rdr)
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state != ReaderState::Idle {
            return Ok(());
        }

        for _ in 0..self.options.skip_lines {
            if self.lines.next_line()?.is_none() {
                self.state = ReaderState::Drained;
                return Ok(());
            }
        }

        let first = match self.lines.next_line()? {
            Some(line) => line,
            None => {
                self.state = ReaderState::Drained;
                return Ok(());
            }
        };
        let fields = parse_line(&first, self.options.delimiter, self.options.trim);

        if self.options.has_header {
            self.headers = fields;
        } else {
            self.headers = (0..fields.len()).map(|i| format!("col{}", i)).collect();
            self.pending = Some((self.lines.line_no(), fields));
        }

        if self.headers.is_empty() {
            return Err(Error::Parse {
                line: self.lines.line_no(),
                message: "no column names found".into(),
            });
        }
        let mut seen = HashSet::new();
        for h in &self.headers {
            if !seen.insert(h.as_str()) {
                return Err(tabula_core::Error::invalid(format!("duplicate column name '{}'", h)).into());
            }
        }
        self.state = ReaderState::HeaderParsed;

        #[cfg(feature = "tracing")]
        tracing::debug!(columns = self.headers.len(), "csv header parsed");

        self.converters = vec![ColumnConverter::raw(); self.headers.len()];
        if self.options.auto_type {
            if self.pending.is_none() {
                if let Some(line) = self.lines.next_line()? {
                    let fields = parse_line(&line, self.options.delimiter, self.options.trim);
                    self.pending = Some((self.lines.line_no(), fields));
                }
            }
            if let Some((_, sample)) = &self.pending {
                let sample = fit_width(sample.clone(), self.headers.len());
                self.converters = sample
                    .iter()
                    .map(|s| ColumnConverter::infer(s, &self.options.null_tokens))
                    .collect();
                self.state = ReaderState::TypeInferred;

                #[cfg(feature = "tracing")]
                tracing::debug!(converters = ?self.converters, "column types inferred");
            }
        }

        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn converters(&self) -> &[ColumnConverter] {
        &self.converters
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Data rows returned so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read, pad/truncate, and convert the next data row.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if self.state == ReaderState::Idle {
            self.start()?;
        }
        if self.state == ReaderState::Drained {
            return Ok(None);
        }

        let (line_no, fields) = match self.pending.take() {
            Some(p) => p,
            None => match self.lines.next_line()? {
                Some(line) => (
                    self.lines.line_no(),
                    parse_line(&line, self.options.delimiter, self.options.trim),
                ),
                None => {
                    self.state = ReaderState::Drained;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(rows = self.rows_read, "csv source drained");
                    return Ok(None);
                }
            },
        };
        self.state = ReaderState::Streaming;

        let fields = fit_width(fields, self.headers.len());
        let mut row = Vec::with_capacity(fields.len());
        for (i, raw) in fields.iter().enumerate() {
            let conv = &self.converters[i];
            if self.options.strict_types
                && !is_null_token(raw, &self.options.null_tokens)
                && !conv.check(raw)
            {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!(
                        "column '{}': '{}' does not match inferred {:?}",
                        self.headers[i], raw, conv.class
                    ),
                });
            }
            row.push(conv.apply(raw, &self.options.null_tokens));
        }

        self.rows_read += 1;
        Ok(Some(row))
    }

    /// Read up to `limit` rows. An empty result means the source is drained.
    pub fn next_rows(&mut self, limit: usize) -> Result<Vec<Vec<Value>>> {
        let mut rows = Vec::with_capacity(limit.min(4096));
        while rows.len() < limit {
            match self.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }
}

/// Pad with empty fields or truncate so the row matches the header width.
fn fit_width(mut fields: Vec<String>, width: usize) -> Vec<String> {
    fields.resize(width, String::new());
    fields
}
