//! Encoding-aware line reader.
//!
//! Pulls one line at a time from a `BufRead`, so peak memory is one line
//! regardless of source size. Accepts `\n` and `\r\n` endings.

use std::io::{self, BufRead};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn from_label(label: &str) -> Result<Self> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(Encoding::Latin1),
            _ => Err(Error::Encoding(label.to_string())),
        }
    }
}

pub struct LineReader<R: BufRead> {
    inner: R,
    encoding: Encoding,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            buf: Vec::with_capacity(256),
            line_no: 0,
        }
    }

    /// 1-based number of the last line returned (0 before the first read).
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        self.line_no += 1;

        let mut line = match self.encoding {
            Encoding::Utf8 => std::str::from_utf8(&self.buf)
                .map(str::to_string)
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line {}: {}", self.line_no, e),
                    )
                })?,
            Encoding::Latin1 => self.buf.iter().map(|&b| b as char).collect(),
        };

        if self.line_no == 1 && line.starts_with('\u{feff}') {
            line.remove(0);
        }
        Ok(Some(line))
    }
}
