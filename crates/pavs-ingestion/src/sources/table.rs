//! Header-addressed tab-separated tables.
//!
//! Cohort exports are loosely structured: header cells carry stray
//! whitespace, rows may be short, and some files are Latin-1. [`RawTable`]
//! absorbs all of that so the cohort mappers only ask for a column by name.

use std::collections::{HashMap, HashSet};

use pavs_common::{FieldValue, Result, RowError};
use tracing::debug;

/// Decode UTF-8, falling back to Latin-1 (every byte maps to one char).
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// A parsed table with trimmed headers and cleaned rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse TSV text. All-empty rows and exact duplicate rows are dropped;
    /// rows the CSV reader rejects are returned as errors.
    pub fn parse(text: &str) -> Result<(Self, Vec<RowError>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let columns = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();

        let mut rows = Vec::new();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut errors = Vec::new();
        let (mut empty, mut duplicate) = (0usize, 0usize);

        for (i, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    errors.push(RowError::new(i, format!("row {}", i + 1), e.to_string()));
                    continue;
                }
            };
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().all(|c| c.is_empty()) {
                empty += 1;
                continue;
            }
            if !seen.insert(cells.clone()) {
                duplicate += 1;
                continue;
            }
            rows.push(cells);
        }

        debug!(rows = rows.len(), empty, duplicate, "Parsed table");
        Ok((Self { columns, rows }, errors))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// First of `names` present in the header.
    pub fn find_column<'n>(&self, names: &[&'n str]) -> Option<&'n str> {
        names.iter().copied().find(|n| self.has_column(n))
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |cells| RawRow { table: self, cells })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row, addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    table: &'a RawTable,
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    /// Cell text; missing columns and short rows read as empty.
    pub fn text(&self, column: &str) -> &'a str {
        self.table
            .columns
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn field(&self, column: &str) -> FieldValue {
        FieldValue::from_raw(self.text(column))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
