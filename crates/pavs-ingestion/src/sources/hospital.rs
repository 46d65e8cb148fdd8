//! Hospital collaborator export.
//!
//! Variants are spread over up to four gene/variant column pairs and the
//! matching pathogenicity columns; they are folded into the `;`-delimited
//! common fields here.

use pavs_common::{CaseRecord, FieldValue, Result, SourceType};

use super::{CohortSource, RawRow};

/// `(gene column, variant column, pathogenicity column)` per variant slot.
const VARIANT_SLOTS: &[(&str, &str, &str)] = &[
    ("Gene", "Variant", "pathogenicity"),
    ("Gene 2", "Variant 2", "pathogenicity 2"),
    ("Gene 3", "Variant 3", "pathogenicity 3"),
    ("Gene 4", "Variant4", "pathogenicity 4"),
];

/// Labelled parts of the diagnostic comment, in output order.
const COMMENT_PARTS: &[(&str, &str)] = &[
    ("Comments", "Comments"),
    ("Inheritance", "Inheritance"),
    ("Omim", "OMIM"),
];

pub const HOSPITAL_REFERENCE: &str = "hospital_collaborator, \
     https://link.springer.com/article/10.1186/s12920-020-00743-8 , \
     https://onlinelibrary.wiley.com/doi/full/10.1111/cge.13842";

#[derive(Debug, Clone)]
pub struct HospitalCollaboratorSource {
    reference: String,
}

impl HospitalCollaboratorSource {
    pub fn new() -> Self {
        Self { reference: HOSPITAL_REFERENCE.to_string() }
    }

    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self { reference: reference.into() }
    }
}

impl Default for HospitalCollaboratorSource {
    fn default() -> Self { Self::new() }
}

/// `GENE:variant` for one slot; the bare variant when the gene is blank.
fn variant_segment(row: &RawRow<'_>, gene_col: &str, variant_col: &str) -> Option<String> {
    let gene = row.field(gene_col);
    let variant = row.field(variant_col);
    match (gene.as_deref(), variant.as_deref()) {
        (Some(g), Some(v)) if v.starts_with(&format!("{g}:")) => Some(v.to_string()),
        (Some(g), Some(v)) => Some(format!("{g}:{v}")),
        (None, Some(v)) => Some(v.to_string()),
        _ => None,
    }
}

fn join_reported<I: IntoIterator<Item = String>>(parts: I) -> FieldValue {
    let joined = parts.into_iter().collect::<Vec<_>>().join(";");
    FieldValue::from_raw(&joined)
}

impl CohortSource for HospitalCollaboratorSource {
    fn source_type(&self) -> SourceType {
        SourceType::ClinicalCollaborator
    }

    fn required_columns(&self) -> &[&str] {
        &["HPOs", "Gene", "Variant"]
    }

    fn map_row(&self, row: &RawRow<'_>, id: usize) -> Result<Option<CaseRecord>> {
        let variants = join_reported(
            VARIANT_SLOTS.iter().filter_map(|(g, v, _)| variant_segment(row, g, v)),
        );
        let pathogenicity = join_reported(
            VARIANT_SLOTS
                .iter()
                .filter_map(|(_, _, p)| row.field(p).as_deref().map(str::to_string)),
        );
        let comment = join_reported(COMMENT_PARTS.iter().filter_map(|(col, label)| {
            row.field(col).as_deref().map(|v| format!("{label}: {v}"))
        }));
        let test_type = row.field("Test Type");

        let mut rec = CaseRecord::new(id.to_string(), SourceType::ClinicalCollaborator);
        rec.procedure = row.field("Test");
        rec.procedure_strategy = test_type.clone();
        rec.sex = row.field("Gender");
        rec.age = row.field("DOB");
        rec.consanguinity_status = row.field("Consanguinity");
        rec.family_id = row.field("Family ID");
        rec.total_family_members = test_type.clone();
        rec.total_cohort_members = test_type;
        rec.phenotypic_features = row.field("HPOs");
        rec.diagnosis = row.field("Results Internal");
        rec.diagnostic_comment = comment;
        rec.genomic_variants = variants;
        rec.zygosity_status = row.field("Zygosity");
        rec.variant_interpretation = pathogenicity;
        rec.external_reference = FieldValue::from_raw(&self.reference);
        Ok(Some(rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn export(rows: &[&str]) -> String {
        let header = "Case\tTest\t Test Type\tGender\tDOB\tConsanguinity \tResults Internal\tZygosity\tHPOs\t\
                      Family ID\tGene\tVariant \tGene 2\tVariant 2  \tGene 3\tVariant 3  \tGene 4\tVariant4\t\
                      pathogenicity \tpathogenicity 2 \tpathogenicity 3\tpathogenicity 4\tComments\tInheritance\tOmim";
        let mut out = header.to_string();
        for r in rows {
            out.push('\n');
            out.push_str(r);
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_variant_pairs_folded() {
        let row = "NG-1\tWES\tTrio\tF\t5Y\tYes\tPositive\tHomozygous\tSeizures (HP:0001250); Ataxia (HP:0001251)\t\
                   FAM9\tPAH\tc.1222C>T\t\tc.5G>T\t\t\t\t\t\
                   Pathogenic\tVUS\t\t\tAffected sibling\tAR\t261600";
        let batch = HospitalCollaboratorSource::new().read(export(&[row]).as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        let rec = &batch.records[0];
        assert_eq!(rec.genomic_variants.as_deref(), Some("PAH:c.1222C>T;c.5G>T"));
        assert_eq!(rec.variant_interpretation.as_deref(), Some("Pathogenic;VUS"));
        assert_eq!(
            rec.diagnostic_comment.as_deref(),
            Some("Comments: Affected sibling;Inheritance: AR;OMIM: 261600")
        );
        assert_eq!(rec.total_family_members.as_deref(), Some("Trio"));
        assert_eq!(rec.total_cohort_members.as_deref(), Some("Trio"));
        assert_eq!(rec.family_id.as_deref(), Some("FAM9"));
        assert_eq!(rec.phenotypic_feature_ids.as_deref(), Some("HP:0001250,HP:0001251"));
        assert_eq!(rec.external_reference.as_deref(), Some(HOSPITAL_REFERENCE));
    }

    #[test]
    fn test_no_variants_not_reported() {
        let row = "NG-2\tPanel\tSolo\tM\t\tNo\tNegative\t\tHypotonia\tFAM1\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t";
        let batch = HospitalCollaboratorSource::new().read(export(&[row]).as_bytes()).unwrap();
        let rec = &batch.records[0];
        assert_eq!(rec.genomic_variants, FieldValue::NotReported);
        assert_eq!(rec.variant_interpretation, FieldValue::NotReported);
        assert_eq!(rec.diagnostic_comment, FieldValue::NotReported);
        assert_eq!(rec.phenotypic_feature_ids, FieldValue::NotReported);
    }
}
