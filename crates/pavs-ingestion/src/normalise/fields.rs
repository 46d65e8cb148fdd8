//! Field splitting.
//!
//! Canonicalises equivalent delimiters and whitespace in a raw text field and
//! returns its segments in original order. An absent field has no segments.

use pavs_common::FieldValue;

/// A set of delimiters that are treated as equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterSet {
    delimiters: Vec<char>,
}

impl DelimiterSet {
    pub fn new(delimiters: impl IntoIterator<Item = char>) -> Self {
        Self { delimiters: delimiters.into_iter().collect() }
    }

    /// `,` `|` `;` for phenotype lists.
    pub fn phenotype() -> Self {
        Self::new([',', '|', ';'])
    }

    /// `;` `|` for distinct variants. Commas stay inside a segment.
    pub fn variant() -> Self {
        Self::new([';', '|'])
    }

    pub fn contains(&self, c: char) -> bool {
        self.delimiters.contains(&c)
    }

    /// Canonical separator every delimiter is mapped onto.
    pub fn canonical(&self) -> char {
        self.delimiters.first().copied().unwrap_or(';')
    }

    /// Split `text` into trimmed, whitespace-collapsed, non-empty segments.
    pub fn split(&self, text: &str) -> Vec<String> {
        let canonical = self.canonical();
        let unified: String = text
            .chars()
            .map(|c| if self.contains(c) { canonical } else { c })
            .collect();

        unified
            .split(canonical)
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for DelimiterSet {
    fn default() -> Self {
        Self::phenotype()
    }
}

/// Segments of a field; the "Not reported" marker yields none.
pub fn split_field(field: &FieldValue, delimiters: &DelimiterSet) -> Vec<String> {
    match field.as_deref() {
        Some(text) => split_text(text, delimiters),
        None => Vec::new(),
    }
}

/// Segments of raw text. Sentinel spellings (`Not reported`, `NULL`, blank)
/// yield none rather than a single segment.
pub fn split_text(text: &str, delimiters: &DelimiterSet) -> Vec<String> {
    match FieldValue::from_raw(text) {
        FieldValue::Reported(t) => delimiters.split(&t),
        FieldValue::NotReported => Vec::new(),
    }
}

/// Trim and replace every run of whitespace with one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
