//! HPO label and synonym lookup.
//!
//! The phenotype extractor and the record assembler only see the
//! [`TermLookup`] trait. [`HpoLabels`] is a thin OBO reader that fills it from
//! `hp.obo`; it is built once and shared read-only for the whole run.

use std::collections::HashMap;
use std::path::Path;

use pavs_common::{PavsError, Result};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

/// Read-only access to ontology term labels and label/synonym resolution.
pub trait TermLookup: Send + Sync {
    /// Display label of a term id, e.g. `HP:0001250` → `Seizure`.
    fn label(&self, id: &str) -> Option<&str>;

    /// Term id for text already passed through [`normalise_label`].
    fn resolve(&self, normalised: &str) -> Option<&str>;
}

/// NFKC-fold, lowercase and trim free text so it can be compared to labels.
pub fn normalise_label(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

/// In-memory HPO labels built from an OBO document.
#[derive(Debug, Default, Clone)]
pub struct HpoLabels {
    /// Term id → primary name.
    labels: HashMap<String, String>,
    /// Normalised primary name → term id.
    names: HashMap<String, String>,
    /// Normalised synonym → term id.
    synonyms: HashMap<String, String>,
}

impl HpoLabels {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from an OBO file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PavsError::Ontology(format!("cannot read {}: {e}", path.display()))
        })?;
        let labels = Self::from_obo_str(&content)?;
        info!("Loaded {} HPO terms with labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Load from an OBO file, falling back to an empty lookup on failure so the
    /// run can continue without labels.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(labels) => labels,
            Err(e) => {
                warn!("Could not load HPO ontology: {e}. Continuing without HPO labels");
                Self::empty()
            }
        }
    }

    /// Parse `[Term]` stanzas. Non-HP terms and obsolete terms are skipped.
    pub fn from_obo_str(content: &str) -> Result<Self> {
        let mut out = Self::empty();
        let mut saw_term = false;

        for stanza in stanzas(content) {
            let mut lines = stanza.iter();
            match lines.next() {
                Some(&"[Term]") => saw_term = true,
                _ => continue,
            }

            let mut id: Option<&str> = None;
            let mut name: Option<&str> = None;
            let mut synonyms: Vec<&str> = Vec::new();
            let mut obsolete = false;

            for line in lines {
                let Some((key, value)) = line.split_once(": ") else { continue };
                match key {
                    "id" => id = Some(value.trim()),
                    "name" => name = Some(value.trim()),
                    "synonym" => {
                        if let Some(text) = quoted(value) {
                            synonyms.push(text);
                        }
                    }
                    "is_obsolete" => obsolete = value.trim() == "true",
                    _ => (),
                }
            }

            match (id, name) {
                (Some(id), Some(name)) if id.starts_with("HP:") && !obsolete => {
                    out.insert_term(id, name, &synonyms);
                }
                (Some(id), _) if obsolete => debug!("Skipping obsolete term {id}"),
                _ => (),
            }
        }

        if !saw_term {
            return Err(PavsError::Ontology("no [Term] stanzas found".to_string()));
        }
        Ok(out)
    }

    /// Add one term with its synonyms.
    pub fn insert_term(&mut self, id: &str, name: &str, synonyms: &[&str]) {
        self.labels.insert(id.to_string(), name.to_string());
        self.names.insert(normalise_label(name), id.to_string());
        for syn in synonyms {
            self.synonyms
                .entry(normalise_label(syn))
                .or_insert_with(|| id.to_string());
        }
    }

    /// Number of terms with labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl TermLookup for HpoLabels {
    fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    fn resolve(&self, normalised: &str) -> Option<&str> {
        self.names
            .get(normalised)
            .or_else(|| self.synonyms.get(normalised))
            .map(String::as_str)
    }
}

/// Blank-line separated groups of trimmed lines.
fn stanzas(content: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Text between the first pair of double quotes.
fn quoted(value: &str) -> Option<&str> {
    let start = value.find('"')? + 1;
    let len = value[start..].find('"')?;
    Some(&value[start..start + len])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
