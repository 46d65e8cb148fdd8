//! Phenotype term extraction.
//!
//! Splits a phenotype blob into terms and sorts every term into exactly one of
//! three buckets: HPO ids, OMIM ids, or unmapped free text. Terms are matched
//! against an ordered rule list; the first rule that finds an identifier
//! decides the bucket:
//!
//! 1. `label (HP:0000000)` or bare `(HP:0000000)`
//! 2. `label (OMIM:000000)` or bare `(OMIM:000000)`
//! 3. an unparenthesised `HP:0000000`
//! 4. an unparenthesised `OMIM:000000`
//!
//! A term matching none of them has its parenthetical content stripped and is
//! treated as free text, optionally promoted to an HPO id through a
//! [`TermLookup`].
//!
//! A label written next to an identifier never becomes free text. Under
//! [`LabelPolicy::Retain`] it is kept in [`PhenotypeAnnotation::id_labels`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use pavs_common::{FieldValue, LabelPolicy};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalise::fields::{collapse_whitespace, split_field, split_text, DelimiterSet};
use crate::ontology::{normalise_label, TermLookup};

/// Identifier namespace a rule extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdKind {
    Hpo,
    Omim,
}

/// Ordered identifier rules. Every pattern has two groups: label and id.
const ID_RULES: &[(IdKind, &str)] = &[
    (IdKind::Hpo, r"([^()]*?)\s*\(\s*(HP:\d{7})\s*\)"),
    (IdKind::Omim, r"([^()]*?)\s*\(\s*(OMIM:\d{6})\s*\)"),
    (IdKind::Hpo, r"()\b(HP:\d{7})\b"),
    (IdKind::Omim, r"()\b(OMIM:\d{6})\b"),
];

fn id_rules() -> &'static [(IdKind, Regex)] {
    static RULES: OnceLock<Vec<(IdKind, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        ID_RULES
            .iter()
            .map(|(kind, pattern)| (*kind, Regex::new(pattern).expect("phenotype rule regex")))
            .collect()
    })
}

fn parenthetical_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("parenthetical regex"))
}

fn loose_hpo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"HP:\d+").expect("loose hpo regex"))
}

/// Phenotype identifiers and leftover text derived from one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeAnnotation {
    /// Sorted, deduplicated `HP:\d{7}` ids.
    pub hpo_ids: Vec<String>,
    /// Sorted, deduplicated `OMIM:\d{6}` ids.
    pub omim_ids: Vec<String>,
    /// Sorted, deduplicated free text that did not resolve to an id.
    pub unmapped_text: Vec<String>,
    /// Labels written next to ids, kept only under [`LabelPolicy::Retain`].
    pub id_labels: BTreeMap<String, String>,
}

impl PhenotypeAnnotation {
    pub fn is_empty(&self) -> bool {
        self.hpo_ids.is_empty() && self.omim_ids.is_empty() && self.unmapped_text.is_empty()
    }
}

/// How a single term was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermClass {
    /// HPO ids found in the term, each with the label written before it.
    Hpo(Vec<(String, Option<String>)>),
    /// OMIM ids found in the term, each with the label written before it.
    Omim(Vec<(String, Option<String>)>),
    /// Free text promoted to an HPO id through the synonym lookup.
    Resolved { text: String, hpo_id: String },
    /// Free text with no identifier.
    Unmapped(String),
    /// Nothing left after cleaning.
    Empty,
}

/// Extracts [`PhenotypeAnnotation`]s from phenotype text.
pub struct PhenotypeExtractor<'a> {
    delimiters: DelimiterSet,
    policy: LabelPolicy,
    lookup: Option<&'a dyn TermLookup>,
}

impl<'a> PhenotypeExtractor<'a> {
    pub fn new() -> Self {
        Self {
            delimiters: DelimiterSet::phenotype(),
            policy: LabelPolicy::default(),
            lookup: None,
        }
    }

    pub fn with_delimiters(mut self, delimiters: DelimiterSet) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_policy(mut self, policy: LabelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve free text through `lookup`.
    pub fn with_lookup(mut self, lookup: &'a dyn TermLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn extract(&self, field: &FieldValue) -> PhenotypeAnnotation {
        self.collect(split_field(field, &self.delimiters))
    }

    pub fn extract_text(&self, text: &str) -> PhenotypeAnnotation {
        self.collect(split_text(text, &self.delimiters))
    }

    fn collect(&self, terms: Vec<String>) -> PhenotypeAnnotation {
        let mut hpo = BTreeSet::new();
        let mut omim = BTreeSet::new();
        let mut unmapped = BTreeSet::new();
        let mut id_labels = BTreeMap::new();

        for term in &terms {
            match self.classify(term) {
                TermClass::Hpo(ids) => {
                    for (id, label) in ids {
                        self.keep_label(&mut id_labels, &id, label);
                        hpo.insert(id);
                    }
                }
                TermClass::Omim(ids) => {
                    for (id, label) in ids {
                        self.keep_label(&mut id_labels, &id, label);
                        omim.insert(id);
                    }
                }
                TermClass::Resolved { hpo_id, .. } => {
                    hpo.insert(hpo_id);
                }
                TermClass::Unmapped(text) => {
                    unmapped.insert(text);
                }
                TermClass::Empty => (),
            }
        }

        PhenotypeAnnotation {
            hpo_ids: hpo.into_iter().collect(),
            omim_ids: omim.into_iter().collect(),
            unmapped_text: unmapped.into_iter().collect(),
            id_labels,
        }
    }

    fn keep_label(&self, labels: &mut BTreeMap<String, String>, id: &str, label: Option<String>) {
        if self.policy == LabelPolicy::Retain {
            if let Some(label) = label {
                labels.entry(id.to_string()).or_insert(label);
            }
        }
    }

    /// Classify one term. The first identifier rule with a match wins.
    pub fn classify(&self, term: &str) -> TermClass {
        for (kind, re) in id_rules() {
            let ids: Vec<(String, Option<String>)> = re
                .captures_iter(term)
                .filter_map(|caps| {
                    let id = caps.get(2)?.as_str().to_string();
                    let label = caps.get(1).and_then(|m| clean_label(m.as_str()));
                    Some((id, label))
                })
                .collect();
            if ids.is_empty() {
                continue;
            }
            return match kind {
                IdKind::Hpo => TermClass::Hpo(ids),
                IdKind::Omim => TermClass::Omim(ids),
            };
        }

        let cleaned = collapse_whitespace(&parenthetical_regex().replace_all(term, ""));
        if cleaned.is_empty() {
            return TermClass::Empty;
        }

        if let Some(lookup) = self.lookup {
            if let Some(hpo_id) = lookup.resolve(&normalise_label(&cleaned)) {
                return TermClass::Resolved { hpo_id: hpo_id.to_string(), text: cleaned };
            }
        }
        TermClass::Unmapped(cleaned)
    }
}

impl Default for PhenotypeExtractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every `HP:<digits>` occurrence in `text`, first-seen order, deduplicated.
/// Shape is not validated here.
pub fn scan_hpo_ids(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    loose_hpo_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn clean_label(raw: &str) -> Option<String> {
    let label = collapse_whitespace(raw.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ':'));
    if label.is_empty() { None } else { Some(label) }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
