//! Whole-file CSV in and out of a DataFrame.

use std::io::{BufRead, Write};

use tabula_core::config::CsvOptions;
use tabula_core::error::Result;
use tabula_io::{CsvReader, CsvSource, CsvWriter, FileSource, QuoteMode};

use crate::frame::DataFrame;

/// Read every row of `reader` into memory.
pub fn read_csv<R: BufRead>(reader: R, options: &CsvOptions) -> Result<DataFrame> {
    let mut rdr = CsvReader::open(reader, options.clone())?;
    let mut rows = Vec::new();
    while let Some(row) = rdr.next_row()? {
        rows.push(row);
    }
    DataFrame::from_rows(rdr.headers().to_vec(), rows)
}

pub fn read_csv_str(text: &str, options: &CsvOptions) -> Result<DataFrame> {
    read_csv(text.as_bytes(), options)
}

pub fn read_csv_path(path: &str, options: &CsvOptions) -> Result<DataFrame> {
    read_csv_source(&FileSource::new(path), options)
}

pub fn read_csv_source(source: &dyn CsvSource, options: &CsvOptions) -> Result<DataFrame> {
    let context = || format!("reading {}", source.describe());
    let reader = source
        .open()
        .map_err(|e| tabula_core::Error::from(e).with_context(context()))?;
    read_csv(reader, options).map_err(|e| e.with_context(context()))
}

impl DataFrame {
    /// Parse CSV text with default options.
    pub fn from_csv(text: &str) -> Result<DataFrame> {
        read_csv_str(text, &CsvOptions::default())
    }

    /// Write header and rows to `writer`. Labels are not written.
    pub fn write_csv<W: Write>(&self, writer: W, mode: QuoteMode) -> Result<W> {
        let mut w = CsvWriter::to_writer(writer, mode);
        w.write_header(&self.columns)?;
        for row in self.rows() {
            w.write_row(&row.values())?;
        }
        Ok(w.into_inner()?)
    }

    /// Header plus comma-joined cells, null as empty, nothing quoted.
    ///
    /// A cell containing a comma therefore does not read back as one field;
    /// use `to_csv_quoted` when that matters.
    pub fn to_csv(&self) -> Result<String> {
        self.to_csv_with(QuoteMode::Never)
    }

    /// Like `to_csv`, quoting cells that contain the delimiter, a quote, or
    /// a line break.
    pub fn to_csv_quoted(&self) -> Result<String> {
        self.to_csv_with(QuoteMode::Necessary)
    }

    fn to_csv_with(&self, mode: QuoteMode) -> Result<String> {
        let bytes = self.write_csv(Vec::new(), mode)?;
        String::from_utf8(bytes)
            .map_err(|e| tabula_core::Error::invalid(format!("csv output is not utf-8: {}", e)))
    }

    pub fn to_csv_path(&self, path: &str, mode: QuoteMode) -> Result<()> {
        let mut w = CsvWriter::to_path(path, mode)
            .map_err(|e| tabula_core::Error::from(e).with_context(format!("writing {}", path)))?;
        w.write_header(&self.columns)?;
        for row in self.rows() {
            w.write_row(&row.values())?;
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::types::Value;

    #[test]
    fn reads_typed_frame() {
        let df = DataFrame::from_csv("name,age,score\nAlice,25,95.5\nBob,30,87.2\n").unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.iloc(0).unwrap().values(), vec![
            Value::from("Alice"),
            Value::I32(25),
            Value::F64(95.5)
        ]);
    }

    #[test]
    fn empty_input_is_empty_frame() {
        let df = DataFrame::from_csv("").unwrap();
        assert_eq!(df.shape(), (0, 0));
    }

    #[test]
    fn writer_is_unquoted_by_default() {
        let df = DataFrame::from_csv("who,n\n\"Smith, Jane\",3\n").unwrap();
        assert_eq!(df.to_csv().unwrap(), "who,n\nSmith, Jane,3\n");
        assert_eq!(df.to_csv_quoted().unwrap(), "who,n\n\"Smith, Jane\",3\n");
    }

    #[test]
    fn round_trip() {
        let text = "id,label,weight\n1,alpha,0.5\n2,beta,1.0\n3,,2.25\n";
        let df = DataFrame::from_csv(text).unwrap();
        let again = DataFrame::from_csv(&df.to_csv().unwrap()).unwrap();
        assert_eq!(df, again);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_csv_path("/definitely/not/here.csv", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err.root(), tabula_core::Error::Io(_)));
    }
}
