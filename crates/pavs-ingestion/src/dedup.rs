//! Multi-source HPO id merge and deduplication.
//!
//! Each cohort numbers its patients from 1, so per-source annotations are
//! keyed by a cohort-prefixed id (`LIT_12`, `CLIT_12`). For every patient
//! the merger unions the ids from all sources, keeps only well-formed
//! `HP:nnnnnnn` ids and returns them sorted. A source with no entry for a
//! patient contributes nothing. Merging is idempotent.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use pavs_common::{FieldValue, PavsError, Result};
use regex::Regex;
use tracing::{debug, info};

fn re_hpo_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HP:\d{7}$").expect("hpo id regex"))
}

/// `HP:` followed by exactly seven digits.
pub fn is_hpo_id(id: &str) -> bool {
    re_hpo_id().is_match(id)
}

/// `prefix` + patient id, e.g. `LIT_` + `12`.
pub fn prefixed_id(prefix: &str, id: &str) -> String {
    format!("{prefix}{id}")
}

/// Union two id sets, keeping only well-formed ids.
pub fn merge_sets<'a, I, J>(a: I, b: J) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
    J: IntoIterator<Item = &'a str>,
{
    a.into_iter()
        .chain(b)
        .map(str::trim)
        .filter(|id| is_hpo_id(id))
        .map(str::to_string)
        .collect()
}

/// Comma-joined sorted ids, or "Not reported" when empty.
pub fn join_ids(ids: &BTreeSet<String>) -> FieldValue {
    if ids.is_empty() {
        FieldValue::NotReported
    } else {
        FieldValue::Reported(ids.iter().cloned().collect::<Vec<_>>().join(","))
    }
}

/// Ids listed in a comma-separated field.
pub fn field_ids(field: &FieldValue) -> Vec<&str> {
    field
        .as_deref()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

// ── Merger ────────────────────────────────────────────────────────────────────

/// Accumulates HPO ids per prefixed patient id across sources.
#[derive(Debug, Default, Clone)]
pub struct HpoMerger {
    by_patient: BTreeMap<String, BTreeSet<String>>,
}

impl HpoMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source's ids for a patient. Malformed ids are dropped.
    pub fn add<'a, I>(&mut self, patient_id: &str, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entry = self.by_patient.entry(patient_id.to_string()).or_default();
        for id in ids.into_iter().map(str::trim) {
            if is_hpo_id(id) {
                entry.insert(id.to_string());
            } else if !id.is_empty() {
                debug!(patient_id, id, "Dropping malformed HPO id");
            }
        }
    }

    /// Merged ids for a patient; empty when no source mentioned it.
    pub fn merged(&self, patient_id: &str) -> BTreeSet<String> {
        self.by_patient.get(patient_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_patient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_patient.is_empty()
    }
}

// ── NLP annotations ───────────────────────────────────────────────────────────

/// Output of the external phrase-to-HPO annotator: prefixed patient id → ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NlpAnnotations {
    entries: BTreeMap<String, Vec<String>>,
}

impl NlpAnnotations {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PavsError::Pipeline(format!("cannot read NLP annotations {}: {e}", path.display()))
        })?;
        let annotations = Self::from_json_str(&content)?;
        info!("Loaded NLP annotations for {} patients from {}", annotations.len(), path.display());
        Ok(annotations)
    }

    /// Entries whose key carries `prefix`, with the prefix stripped.
    pub fn for_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [String])> + 'a {
        self.entries.iter().filter_map(move |(key, ids)| {
            key.strip_prefix(prefix).map(|id| (id, ids.as_slice()))
        })
    }

    pub fn insert(&mut self, prefixed_id: impl Into<String>, ids: Vec<String>) {
        self.entries.insert(prefixed_id.into(), ids);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
