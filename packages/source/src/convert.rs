//! CSV to [`Complaint`] conversion.
//!
//! The upstream CSV export has a header row naming each column followed by
//! one row per ticket. Conversion runs in three steps, each usable on its
//! own: rows are read into ordered header→cell maps ([`csv_to_rows`]),
//! turned into a JSON array ([`rows_to_json`]), and finally deserialized
//! into [`Complaint`]s ([`complaints_from_json`]).
//!
//! Cells are kept verbatim as text. A row whose width differs from the
//! header fails the whole conversion; nothing is padded or truncated.
//! Repeated header names are rejected since each row is keyed by name.

use std::collections::{BTreeMap, BTreeSet};

use fondue_complaint_models::Complaint;

/// A single CSV data row keyed by header name.
pub type CsvRow = BTreeMap<String, String>;

/// Errors that can occur while converting CSV content.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The CSV content could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A data row has a different number of cells than the header.
    #[error("Malformed row at line {line}: expected {expected} cells, found {found}")]
    MalformedRow {
        /// 1-based line number of the offending row.
        line: u64,
        /// Number of header columns.
        expected: usize,
        /// Number of cells in the row.
        found: usize,
    },

    /// Two header columns share a name, so a row could not keep every cell.
    #[error("Duplicate CSV header: {name}")]
    DuplicateHeader {
        /// The repeated column name.
        name: String,
    },

    /// The intermediate JSON did not match the [`Complaint`] shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads CSV content into one ordered map per data row.
///
/// Empty content and header-only content both yield an empty vector.
///
/// # Errors
///
/// Returns [`ConvertError::DuplicateHeader`] if a column name repeats,
/// [`ConvertError::MalformedRow`] if any row's cell count differs from the
/// header's, or [`ConvertError::Csv`] if the content cannot be tokenized.
pub fn csv_to_rows(content: &str) -> Result<Vec<CsvRow>, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = BTreeSet::new();
    if let Some(name) = headers.iter().find(|name| !seen.insert(*name)) {
        return Err(ConvertError::DuplicateHeader {
            name: name.to_owned(),
        });
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;

        if record.len() != headers.len() {
            let line = record.position().map_or(0, csv::Position::line);
            return Err(ConvertError::MalformedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }

        let row: CsvRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_owned(), cell.to_owned()))
            .collect();
        rows.push(row);
    }

    log::debug!(
        "Parsed {} CSV rows with {} columns",
        rows.len(),
        headers.len()
    );

    Ok(rows)
}

/// Turns parsed rows into a JSON array of string-valued objects.
#[must_use]
pub fn rows_to_json(rows: Vec<CsvRow>) -> serde_json::Value {
    serde_json::Value::Array(
        rows.into_iter()
            .map(|row| {
                serde_json::Value::Object(
                    row.into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Deserializes a JSON array of row objects into [`Complaint`]s.
///
/// # Errors
///
/// Returns [`ConvertError::Json`] if the value is not an array of objects
/// with string values for the known columns.
pub fn complaints_from_json(value: serde_json::Value) -> Result<Vec<Complaint>, ConvertError> {
    Ok(serde_json::from_value(value)?)
}

/// Converts raw CSV content straight into [`Complaint`]s.
///
/// # Errors
///
/// Returns [`ConvertError`] if any conversion step fails.
pub fn csv_to_complaints(content: &str) -> Result<Vec<Complaint>, ConvertError> {
    let rows = csv_to_rows(content)?;
    complaints_from_json(rows_to_json(rows))
}
