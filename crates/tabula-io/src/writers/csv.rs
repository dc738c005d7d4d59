//! Streaming CSV writer for typed rows.
//!
//! Default output is header + comma-joined cells with `Null` as an empty
//! field and **no quoting**: a cell that contains the delimiter is written
//! verbatim and will split on re-read. `QuoteMode::Necessary` opts into
//! `"`-quoting that the reader understands.

use std::fs::File;
use std::io::Write;

use csv as csv_crate;
use tabula_core::types::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    #[default]
    Never,
    Necessary,
}

pub struct CsvWriter<W: Write> {
    wtr: csv_crate::Writer<W>,
    wrote_header: bool,
}

impl CsvWriter<File> {
    pub fn to_path(path: &str, mode: QuoteMode) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::to_writer(file, mode))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W, mode: QuoteMode) -> Self {
        let style = match mode {
            QuoteMode::Never => csv_crate::QuoteStyle::Never,
            QuoteMode::Necessary => csv_crate::QuoteStyle::Necessary,
        };
        let wtr = csv_crate::WriterBuilder::new()
            .delimiter(b',')
            .quote_style(style)
            .terminator(csv_crate::Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(writer);
        Self {
            wtr,
            wrote_header: false,
        }
    }

    pub fn write_header(&mut self, columns: &[String]) -> Result<()> {
        if !self.wrote_header && !columns.is_empty() {
            self.wtr.write_record(columns)?;
            self.wrote_header = true;
        }
        Ok(())
    }

    pub fn write_row(&mut self, row: &[Value]) -> Result<()> {
        if row.is_empty() {
            return Ok(());
        }
        self.wtr.write_record(row.iter().map(|v| v.to_string()))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}
