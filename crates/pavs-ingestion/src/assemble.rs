//! Record assembly.
//!
//! Runs the extractors over one [`CaseRecord`] and composes their outputs
//! into a [`CanonicalRecord`]. Malformed or absent fields degrade to empty
//! or "not provided" values; only a record that cannot be identified is an
//! error.

use std::collections::BTreeSet;

use pavs_common::config::NormaliseConfig;
use pavs_common::{CaseRecord, FieldValue, PavsError, Result};

use crate::dedup::{field_ids, merge_sets};
use crate::models::{CanonicalRecord, DiseaseTerm, PhenotypeTerm, VariantCall};
use crate::normalise::fields::{split_field, DelimiterSet};
use crate::normalise::hgnc::GeneResolver;
use crate::normalise::hgvs::VariantCanonicalizer;
use crate::normalise::identifiers::{
    classify_acmg, classify_zygosity, extract_gene_from_variant, extract_omim_id, parse_age,
    parse_sex, AcmgClass,
};
use crate::normalise::phenotype::{PhenotypeAnnotation, PhenotypeExtractor};
use crate::normalise::variant::split_variants;
use crate::ontology::TermLookup;

/// Builds [`CanonicalRecord`]s. Holds only read-only lookups, so one
/// assembler serves a whole batch.
pub struct RecordAssembler<'a> {
    lookup: &'a dyn TermLookup,
    phenotypes: PhenotypeExtractor<'a>,
    variant_delimiters: DelimiterSet,
    genes: GeneResolver<'a>,
    canonicalizer: VariantCanonicalizer,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(lookup: &'a dyn TermLookup, config: &NormaliseConfig) -> Self {
        let mut phenotypes = PhenotypeExtractor::new()
            .with_delimiters(DelimiterSet::new(config.phenotype_delimiters.iter().copied()))
            .with_policy(config.label_policy);
        if config.synonym_lookup {
            phenotypes = phenotypes.with_lookup(lookup);
        }
        Self {
            lookup,
            phenotypes,
            variant_delimiters: DelimiterSet::new(config.variant_delimiters.iter().copied()),
            genes: GeneResolver::default(),
            canonicalizer: VariantCanonicalizer::new(),
        }
    }

    pub fn with_genes(mut self, genes: GeneResolver<'a>) -> Self {
        self.genes = genes;
        self
    }

    pub fn with_canonicalizer(mut self, canonicalizer: VariantCanonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn assemble(&self, case: &CaseRecord) -> Result<CanonicalRecord> {
        let id = case.id.trim();
        if id.is_empty() {
            return Err(PavsError::MissingField { field: "ID" });
        }
        if id.contains(['/', '\\']) {
            return Err(PavsError::Pipeline(format!("patient id {id:?} contains a path separator")));
        }

        let annotation = self.phenotypes.extract(&case.phenotypic_features);
        let phenotypes = self.phenotype_terms(case, &annotation);
        let variants = self.variant_calls(case);
        let diseases = disease_terms(case, &annotation);

        Ok(CanonicalRecord {
            id: id.to_string(),
            sex: parse_sex(text(&case.sex)),
            age: parse_age(text(&case.age)),
            phenotypes,
            unmapped_phenotypes: annotation.unmapped_text,
            variants,
            diseases,
            case: case.clone(),
        })
    }

    /// Merged ids from the table unioned with ids found in the text.
    fn phenotype_terms(&self, case: &CaseRecord, annotation: &PhenotypeAnnotation) -> Vec<PhenotypeTerm> {
        let ids: BTreeSet<String> = merge_sets(
            field_ids(&case.phenotypic_feature_ids),
            annotation.hpo_ids.iter().map(String::as_str),
        );
        ids.into_iter()
            .map(|id| {
                let label = self
                    .lookup
                    .label(&id)
                    .map(str::to_string)
                    .or_else(|| annotation.id_labels.get(&id).cloned());
                PhenotypeTerm { id, label }
            })
            .collect()
    }

    fn variant_calls(&self, case: &CaseRecord) -> Vec<VariantCall> {
        let expressions = split_variants(&case.genomic_variants, &self.variant_delimiters);
        let n = expressions.len();
        let acmg = per_variant(&case.variant_interpretation, &self.variant_delimiters, n, classify_acmg);
        let zygosity =
            per_variant(&case.zygosity_status, &self.variant_delimiters, n, classify_zygosity);

        expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                let canonical = self.canonicalizer.canonicalize_expression(expr);
                let gene = expr
                    .gene
                    .clone()
                    .or_else(|| extract_gene_from_variant(&expr.raw))
                    .map(|symbol| self.genes.resolve(&symbol));
                VariantCall {
                    index: i + 1,
                    expression: canonical.expression,
                    gene,
                    acmg: acmg.get(i).copied().unwrap_or(AcmgClass::NotProvided),
                    zygosity: zygosity.get(i).copied().flatten(),
                    parsed: canonical.parsed,
                    opaque: canonical.opaque,
                }
            })
            .collect()
    }
}

fn text(field: &FieldValue) -> &str {
    field.as_deref().unwrap_or("")
}

/// Classify a field once per variant when it has one segment per variant,
/// otherwise classify the whole field and apply it to every variant.
fn per_variant<T: Copy>(
    field: &FieldValue,
    delimiters: &DelimiterSet,
    n: usize,
    classify: fn(&str) -> T,
) -> Vec<T> {
    let segments = split_field(field, delimiters);
    if n > 1 && segments.len() == n {
        segments.iter().map(|s| classify(s)).collect()
    } else {
        vec![classify(text(field)); n]
    }
}

/// The reported diagnostic comment as the primary disease, carrying the OMIM
/// id from the comment or else the diagnosis (empty when neither resolves).
/// Without a comment, a diagnosis that resolves stands in. OMIM ids written
/// in the phenotype text follow.
fn disease_terms(case: &CaseRecord, annotation: &PhenotypeAnnotation) -> Vec<DiseaseTerm> {
    let mut out: Vec<DiseaseTerm> = Vec::new();
    let resolved = [&case.diagnostic_comment, &case.diagnosis]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .find_map(|t| extract_omim_id(t).map(|id| (id, t)));
    match (case.diagnostic_comment.as_deref(), resolved) {
        (Some(comment), resolved) => out.push(DiseaseTerm {
            id: resolved.map(|(id, _)| id).unwrap_or_default(),
            label: comment.to_string(),
        }),
        (None, Some((id, label))) => out.push(DiseaseTerm { id, label: label.to_string() }),
        (None, None) => {}
    }
    for id in &annotation.omim_ids {
        if out.iter().any(|d| &d.id == id) {
            continue;
        }
        let label = annotation.id_labels.get(id).cloned().unwrap_or_else(|| id.clone());
        out.push(DiseaseTerm { id: id.clone(), label });
    }
    out
}
