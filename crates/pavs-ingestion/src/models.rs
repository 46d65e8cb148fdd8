//! Canonical per-patient records produced by the assembler.

use pavs_common::CaseRecord;

use crate::normalise::hgnc::GeneContext;
use crate::normalise::identifiers::{AcmgClass, Sex, Zygosity};
use crate::normalise::variant::VariantExpression;

/// One HPO feature of a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypeTerm {
    pub id: String,
    /// Ontology label, else a label written next to the id in the input.
    pub label: Option<String>,
}

/// One distinct variant with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    /// 1-based position within the variants field.
    pub index: usize,
    /// Expression with canonicalised notation slots.
    pub expression: VariantExpression,
    pub gene: Option<GeneContext>,
    pub acmg: AcmgClass,
    pub zygosity: Option<Zygosity>,
    /// Notation slots that parsed as HGVS.
    pub parsed: usize,
    /// Notation slots kept as opaque text.
    pub opaque: usize,
}

impl VariantCall {
    /// Text of the variant as it appeared in the input segment.
    pub fn text(&self) -> &str {
        &self.expression.raw
    }
}

/// A disease term. The id is `OMIM:`-prefixed, or empty when no OMIM id
/// could be resolved for the reported diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseTerm {
    pub id: String,
    pub label: String,
}

/// Fully normalised record for one patient. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub id: String,
    pub sex: Sex,
    /// ISO-8601 duration.
    pub age: Option<String>,
    /// Sorted by id.
    pub phenotypes: Vec<PhenotypeTerm>,
    /// Phenotype text that resolved to no identifier.
    pub unmapped_phenotypes: Vec<String>,
    pub variants: Vec<VariantCall>,
    pub diseases: Vec<DiseaseTerm>,
    /// The ingested row, kept for provenance fields.
    pub case: CaseRecord,
}

impl CanonicalRecord {
    pub fn labelled_phenotypes(&self) -> usize {
        self.phenotypes.iter().filter(|p| p.label.is_some()).count()
    }

    pub fn variants_with_gene(&self) -> usize {
        self.variants.iter().filter(|v| v.gene.is_some()).count()
    }

    pub fn has_omim_disease(&self) -> bool {
        self.diseases.iter().any(|d| d.id.starts_with("OMIM:"))
    }
}
