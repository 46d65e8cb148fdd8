//! Cohort merge: regex and NLP HPO ids reconciled, cohorts concatenated and
//! renumbered into the combined table.

use pavs_common::config::MergeConfig;
use pavs_common::CaseRecord;
use tracing::{debug, info, instrument};

use crate::dedup::{field_ids, join_ids, merge_sets, prefixed_id, HpoMerger, NlpAnnotations};

/// The three ingested cohorts, each numbered from 1.
#[derive(Debug, Clone, Default)]
pub struct Cohorts {
    pub literature: Vec<CaseRecord>,
    pub clinical_literature: Vec<CaseRecord>,
    pub hospital: Vec<CaseRecord>,
}

impl Cohorts {
    pub fn len(&self) -> usize {
        self.literature.len() + self.clinical_literature.len() + self.hospital.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Feed one cohort's regex ids, plus any NLP ids carrying `prefix`, into `merger`.
fn collect_cohort(
    merger: &mut HpoMerger,
    records: &[CaseRecord],
    prefix: &str,
    nlp: Option<&NlpAnnotations>,
) {
    for rec in records {
        merger.add(&prefixed_id(prefix, &rec.id), field_ids(&rec.phenotypic_feature_ids));
    }
    if let Some(nlp) = nlp {
        let mut routed = 0usize;
        for (id, ids) in nlp.for_prefix(prefix) {
            merger.add(&prefixed_id(prefix, id), ids.iter().map(String::as_str));
            routed += 1;
        }
        debug!(prefix, routed, "NLP annotations routed");
    }
}

/// Merge the cohorts into the combined table.
///
/// Literature and clinical-literature records get the union of their regex
/// and NLP ids; hospital records keep their regex ids. Output order is
/// literature, clinical literature, hospital, renumbered
/// `<final_prefix>1..n`.
#[instrument(skip_all, fields(n = cohorts.len()))]
pub fn merge_cohorts(
    cohorts: Cohorts,
    nlp: Option<&NlpAnnotations>,
    config: &MergeConfig,
) -> Vec<CaseRecord> {
    let mut merger = HpoMerger::new();
    collect_cohort(&mut merger, &cohorts.literature, &config.literature_prefix, nlp);
    collect_cohort(
        &mut merger,
        &cohorts.clinical_literature,
        &config.clinical_literature_prefix,
        nlp,
    );

    let prefixed = cohorts
        .literature
        .into_iter()
        .map(|r| (Some(config.literature_prefix.as_str()), r))
        .chain(
            cohorts
                .clinical_literature
                .into_iter()
                .map(|r| (Some(config.clinical_literature_prefix.as_str()), r)),
        )
        .chain(cohorts.hospital.into_iter().map(|r| (None, r)));

    let mut out = Vec::new();
    let mut with_ids = 0usize;
    for (n, (prefix, mut rec)) in prefixed.enumerate() {
        let ids = match prefix {
            Some(p) => merger.merged(&prefixed_id(p, &rec.id)),
            None => merge_sets(field_ids(&rec.phenotypic_feature_ids), std::iter::empty()),
        };
        if !ids.is_empty() {
            with_ids += 1;
        }
        rec.phenotypic_feature_ids = join_ids(&ids);
        rec.id = format!("{}{}", config.final_prefix, n + 1);
        out.push(rec);
    }

    info!(n = out.len(), with_ids, "Cohorts merged");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavs_common::{FieldValue, SourceType};
    use pretty_assertions::assert_eq;

    fn rec(id: &str, source: SourceType, ids: &str) -> CaseRecord {
        let mut r = CaseRecord::new(id, source);
        r.phenotypic_feature_ids = ids.into();
        r
    }

    #[test]
    fn test_order_renumbering_and_routing() {
        let cohorts = Cohorts {
            literature: vec![rec("1", SourceType::Literature, "HP:0001250")],
            clinical_literature: vec![rec("1", SourceType::ClinicalLiterature, "")],
            hospital: vec![rec("1", SourceType::ClinicalCollaborator, "HP:0000252,HP:12")],
        };
        let nlp = NlpAnnotations::from_json_str(
            r#"{"LIT_1": ["HP:0000252", "HP:0001250"], "CLIT_1": ["HP:0001263"]}"#,
        )
        .unwrap();
        let out = merge_cohorts(cohorts, Some(&nlp), &MergeConfig::default());

        let ids: Vec<_> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["PAVS1", "PAVS2", "PAVS3"]);
        assert_eq!(out[0].phenotypic_feature_ids.as_deref(), Some("HP:0000252,HP:0001250"));
        assert_eq!(out[1].phenotypic_feature_ids.as_deref(), Some("HP:0001263"));
        assert_eq!(out[2].phenotypic_feature_ids.as_deref(), Some("HP:0000252"));
        assert_eq!(out[2].data_source_type, SourceType::ClinicalCollaborator);
    }

    #[test]
    fn test_without_nlp_and_empty_ids() {
        let cohorts = Cohorts {
            literature: vec![rec("1", SourceType::Literature, "")],
            ..Default::default()
        };
        let out = merge_cohorts(cohorts, None, &MergeConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].phenotypic_feature_ids, FieldValue::NotReported);
    }
}
