//! Row sources for running filters outside a host tool.
//!
//! Two formats are supported:
//! - delimited text (CSV, TSV) with a header record, read with the `csv` crate
//! - JSON lines, one object per line

use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::row::Row;

/// Record is one delimited record, sharing its header with the other
/// records of the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Create a record from a shared header and its values.
    pub fn new(headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Get the column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get the field values in column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Records may be shorter than the header; trailing fields are then absent.
impl Row for Record {
    fn field(&self, name: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.values.get(idx).map(String::as_str)
    }
}

/// Reader yielding [`Record`]s from delimited text.
///
/// The first record is the header. Quoted fields may contain the delimiter,
/// quotes and line breaks. Records of differing length are accepted.
pub struct DelimitedReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    headers: Arc<[String]>,
    delimiter: u8,
}

impl<R: Read> DelimitedReader<R> {
    /// Create a reader and consume the header record.
    pub fn new(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Arc<[String]> = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into();
        if headers.is_empty() {
            return Err(Error::Config("input has no header line".to_string()));
        }
        log::debug!("Read header with {} columns: {:?}", headers.len(), headers);

        Ok(Self {
            records: reader.into_records(),
            headers,
            delimiter,
        })
    }

    /// Get the column names from the header record.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get the field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl<R: Read> Iterator for DelimitedReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        let values = record.iter().map(str::to_string).collect();
        Some(Ok(Record::new(Arc::clone(&self.headers), values)))
    }
}

/// JsonLine is one JSON-lines row: the parsed object and the line it was
/// read from.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonLine {
    line: String,
    fields: Map<String, Value>,
}

impl JsonLine {
    /// Parse one line, which must hold a JSON object.
    pub fn parse(line: impl Into<String>) -> Result<Self> {
        let line = line.into();
        let fields = serde_json::from_str(line.trim())?;
        Ok(Self { line, fields })
    }

    /// Get the line exactly as it was read, without its line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Get the parsed object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Row for JsonLine {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.field(name)
    }
}

/// Read JSON-lines rows.
///
/// Blank lines are skipped. Every other line must be a JSON object;
/// anything else is reported as [`Error::Json`].
pub fn read_json_lines<R: Read>(reader: R) -> impl Iterator<Item = Result<JsonLine>> {
    BufReader::new(reader).lines().filter_map(|line| {
        let line = match line {
            Ok(l) => l,
            Err(e) => return Some(Err(Error::from(e))),
        };
        let line = match line.strip_suffix('\r') {
            Some(stripped) => stripped.to_string(),
            None => line,
        };
        if line.trim().is_empty() {
            return None;
        }
        Some(JsonLine::parse(line))
    })
}
