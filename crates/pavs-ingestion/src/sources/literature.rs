//! Literature curation export.

use pavs_common::{CaseRecord, Result, SourceType};

use super::{CohortSource, RawRow};

/// Reader for the curated literature cohort. Rows citing `excluded_reference`
/// are dropped because that publication is ingested as its own cohort.
#[derive(Debug, Clone)]
pub struct LiteratureSource {
    excluded_reference: String,
}

impl LiteratureSource {
    pub fn new(excluded_reference: impl Into<String>) -> Self {
        Self { excluded_reference: excluded_reference.into() }
    }
}

impl CohortSource for LiteratureSource {
    fn source_type(&self) -> SourceType {
        SourceType::Literature
    }

    fn required_columns(&self) -> &[&str] {
        &["phenotypes", "variants", "reference"]
    }

    fn map_row(&self, row: &RawRow<'_>, id: usize) -> Result<Option<CaseRecord>> {
        if row.text("reference") == self.excluded_reference {
            return Ok(None);
        }
        let mut rec = CaseRecord::new(id.to_string(), SourceType::Literature);
        rec.procedure = row.field("test");
        rec.procedure_strategy = row.field("test_strategy");
        rec.sex = row.field("patient_gender");
        rec.age = row.field("patient_age");
        rec.consanguinity_status = row.field("consanguinity");
        rec.family_id = row.field("family_id");
        rec.total_family_members = row.field("number_of_family_members");
        rec.total_cohort_members = row.field("cohort_size");
        rec.phenotypic_features = row.field("phenotypes");
        rec.diagnosis = row.field("result");
        rec.diagnostic_comment = row.field("result_comment");
        rec.genomic_variants = row.field("variants");
        rec.zygosity_status = row.field("zygosity");
        rec.variant_interpretation = row.field("pathogenicity");
        rec.external_reference = row.field("reference");
        Ok(Some(rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavs_common::FieldValue;

    const COLUMNS: &[&str] = &[
        "test",
        "test_strategy",
        "patient_gender",
        "patient_age",
        "consanguinity",
        "family_id",
        "number_of_family_members",
        "cohort_size",
        "phenotypes",
        "result",
        "result_comment",
        "variants",
        "zygosity",
        "pathogenicity",
        "reference",
    ];

    const EXCLUDED: &str = "https://pubmed.ncbi.nlm.nih.gov/28600779/";

    fn export() -> String {
        let header = ["id"].iter().chain(COLUMNS).copied().collect::<Vec<_>>().join("\t");
        let a = "7\tWES\tTrio\tMale\t22Y\tYes\tF1\t4\t1\tSeizures (HP:0001250), HP:0001250, Ataxia\tPositive\t\tBRCA1:c.123A>G\tHet\tPathogenic\thttps://pubmed.ncbi.nlm.nih.gov/1/";
        let excluded = format!("8\tWES\tTrio\tFemale\t3Y\tNo\tF2\t2\t1\tHypotonia\tPositive\t\tc.5G>T\tHom\tVUS\t{EXCLUDED}");
        let b = "9\tPanel\tSolo\tFemale\tinfant\tNo\tF3\t1\t1\tMicrocephaly (HP:0000252)\tNegative\tnone\tNot reported\t\t\thttps://pubmed.ncbi.nlm.nih.gov/2/";
        format!("{header}\n{a}\n{excluded}\n{b}\n{a}\n")
    }

    #[test]
    fn test_maps_filters_and_renumbers() {
        let batch = LiteratureSource::new(EXCLUDED).read(export().as_bytes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.errors.is_empty());

        let first = &batch.records[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.sex.as_deref(), Some("Male"));
        assert_eq!(first.diagnostic_comment, FieldValue::NotReported);
        assert_eq!(first.phenotypic_feature_ids.as_deref(), Some("HP:0001250"));
        assert_eq!(first.data_source_type, SourceType::Literature);

        let second = &batch.records[1];
        assert_eq!(second.id, "2");
        assert_eq!(second.genomic_variants, FieldValue::NotReported);
        assert_eq!(second.phenotypic_feature_ids.as_deref(), Some("HP:0000252"));
    }

    #[test]
    fn test_missing_required_column_is_error() {
        let err = LiteratureSource::new(EXCLUDED).read(b"id\tphenotypes\n1\tSeizures\n");
        assert!(err.is_err());
    }
}
