// src/export.rs

//! Buffering of produced records for the export collaborator.
//!
//! The buffer fixes its header from the first stored record's field order,
//! then flattens every record into a row of cells. Multi-valued fields are
//! joined with the configured delimiter. The actual file writer lives
//! outside this subsystem; it only consumes [`rows`].
//!
//! [`rows`]: RecordBuffer::rows

use crate::models::{FieldValue, Record};

/// Row buffer with a stable header.
#[derive(Debug, Clone, Default)]
pub struct RecordBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    delimiter: String,
}

impl RecordBuffer {
    /// Create a buffer joining list-valued fields with `;`.
    pub fn new() -> Self {
        Self::with_delimiter(";")
    }

    /// Create a buffer with a custom in-cell delimiter.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            header: Vec::new(),
            rows: Vec::new(),
            delimiter: delimiter.into(),
        }
    }

    /// Number of buffered rows, the header row included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The header row, empty until the first record is stored.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Iterate the buffered rows in storage order.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Flatten a record into a row.
    ///
    /// The first record determines the header; later records contribute one
    /// cell per header field, empty when the field is missing.
    pub fn store(&mut self, record: &Record) {
        if self.header.is_empty() {
            self.header = record
                .fields
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            self.rows.push(self.header.clone());
        }

        let row = self
            .header
            .iter()
            .map(|name| match record.field(name) {
                Some(FieldValue::Text(text)) => text.clone(),
                Some(FieldValue::List(values)) => values.join(&self.delimiter),
                None => String::new(),
            })
            .collect();
        self.rows.push(row);
    }
}
