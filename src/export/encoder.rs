//! Format encoders
//!
//! Every payload goes through the same preprocessing before it reaches a
//! format: it is decoded into a field-name → value mapping and the fields are
//! sorted by name into a [`FieldRow`]. A record that cannot be decoded aborts
//! the whole export.

use std::collections::HashMap;

use crate::error::{Error, ExportError, Result};
use crate::types::{ExportFormat, Project, ResultRecord};

/// UTF-8 byte-order mark written at the start of CSV artifacts
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A decoded record: `(field name, value)` pairs in ascending name order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow(Vec<(String, String)>);

impl FieldRow {
    /// Decode a stored payload into a sorted row
    pub fn decode(record: &ResultRecord) -> Result<Self> {
        let fields: HashMap<String, String> =
            serde_json::from_str(&record.payload).map_err(|e| {
                Error::Export(ExportError::MalformedRecord {
                    record_id: record.id,
                    reason: e.to_string(),
                })
            })?;

        let mut pairs: Vec<(String, String)> = fields.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self(pairs))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Values in field-name order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, value)| value.as_str())
    }
}

/// Quote a value as a SQL string literal
fn sql_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Per-export encoder state
///
/// One encoder lives for the whole export so that state such as the CSV
/// header flag survives page boundaries.
#[derive(Debug)]
pub enum RecordEncoder {
    /// `insert into` statements against `t_<project>`
    Sql {
        /// Target table name
        table: String,
    },
    /// CSV rows, header emitted once
    Csv {
        /// Whether the header row has been emitted
        header_written: bool,
    },
    /// Stored payloads, one per line
    Json,
}

impl RecordEncoder {
    /// Build the encoder for `format`
    pub fn new(format: ExportFormat, project: &Project) -> Self {
        match format {
            ExportFormat::Sql => RecordEncoder::Sql {
                table: format!("t_{}", project.slug()),
            },
            ExportFormat::Csv => RecordEncoder::Csv {
                header_written: false,
            },
            ExportFormat::Json => RecordEncoder::Json,
        }
    }

    /// Bytes to write once at the start of the artifact
    pub fn preamble(&self) -> &'static [u8] {
        match self {
            RecordEncoder::Csv { .. } => UTF8_BOM,
            _ => b"",
        }
    }

    /// Whether a CSV header has been emitted
    pub fn header_written(&self) -> bool {
        matches!(
            self,
            RecordEncoder::Csv {
                header_written: true
            }
        )
    }

    /// Encode a page of records, appending to `out`
    ///
    /// Returns the number of records that produced output.
    pub fn encode_page(&mut self, records: &[ResultRecord], out: &mut Vec<u8>) -> Result<usize> {
        let mut emitted = 0;

        match self {
            RecordEncoder::Sql { table } => {
                for record in records {
                    let row = FieldRow::decode(record)?;
                    if row.is_empty() {
                        continue;
                    }
                    let cols = row.names().collect::<Vec<_>>().join(",");
                    let vals = row.values().map(sql_quote).collect::<Vec<_>>().join(",");
                    out.extend_from_slice(
                        format!("insert into {table}({cols}) values ({vals});\n").as_bytes(),
                    );
                    emitted += 1;
                }
            }
            RecordEncoder::Csv { header_written } => {
                let mut writer = csv::WriterBuilder::new()
                    .flexible(true)
                    .from_writer(&mut *out);
                for record in records {
                    let row = FieldRow::decode(record)?;
                    if row.is_empty() {
                        continue;
                    }
                    if !*header_written {
                        writer.write_record(row.names()).map_err(csv_error)?;
                        *header_written = true;
                    }
                    writer.write_record(row.values()).map_err(csv_error)?;
                    emitted += 1;
                }
                writer.flush()?;
            }
            RecordEncoder::Json => {
                for record in records {
                    FieldRow::decode(record)?;
                    out.extend_from_slice(record.payload.as_bytes());
                    out.push(b'\n');
                    emitted += 1;
                }
            }
        }

        Ok(emitted)
    }
}

fn csv_error(e: csv::Error) -> Error {
    Error::Io(e.into())
}
