//! Clinical literature supplement: a single published cohort exported as TSV.

use pavs_common::{CaseRecord, FieldValue, Result, SourceType};

use super::{CohortSource, RawRow};

/// The export spells the zygosity header both ways.
const ZYGOSITY_COLUMNS: &[&str] = &["Zyogsity", "Zygosity"];

#[derive(Debug, Clone)]
pub struct ClinicalLiteratureSource {
    /// Publication the whole cohort comes from.
    reference: String,
}

impl ClinicalLiteratureSource {
    pub fn new(reference: impl Into<String>) -> Self {
        Self { reference: reference.into() }
    }
}

impl CohortSource for ClinicalLiteratureSource {
    fn source_type(&self) -> SourceType {
        SourceType::ClinicalLiterature
    }

    fn required_columns(&self) -> &[&str] {
        &["Phenotype", "Variant(s)"]
    }

    fn map_row(&self, row: &RawRow<'_>, id: usize) -> Result<Option<CaseRecord>> {
        let id = id.to_string();
        let zygosity = ZYGOSITY_COLUMNS
            .iter()
            .map(|c| row.field(c))
            .find(FieldValue::is_reported)
            .unwrap_or_default();

        let mut rec = CaseRecord::new(id.clone(), SourceType::ClinicalLiterature);
        rec.procedure = row.field("Test");
        rec.procedure_strategy = row.field("Testing Strategy");
        rec.sex = row.field("Gender");
        rec.age = row.field("Age");
        rec.consanguinity_status = row.field("Consanguinity");
        rec.family_id = FieldValue::Reported(id);
        rec.phenotypic_features = row.field("Phenotype");
        rec.diagnosis = row.field("Result");
        rec.diagnostic_comment = row.field("Family hx");
        rec.genomic_variants = row.field("Variant(s)");
        rec.zygosity_status = zygosity;
        rec.variant_interpretation = row.field("HGMD");
        rec.external_reference = FieldValue::from_raw(&self.reference);
        Ok(Some(rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "https://pubmed.ncbi.nlm.nih.gov/28600779/";

    #[test]
    fn test_fixed_fields_and_typo_column() {
        let text = "ID\tTesting Strategy\tGender\tAge\tTest\tConsanguinity\tFamily hx\tResult\tZyogsity\tPhenotype\tVariant(s)\tHGMD\n\
                    P-17\tSingleton\tM\t4Y\tWES\tYes\tSibling affected\tPositive\tHomozygous\tAtaxia (HP:0001251)\tNM_000277.3:c.1222C>T\tDM\n";
        let batch = ClinicalLiteratureSource::new(REFERENCE).read(text.as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        let rec = &batch.records[0];
        assert_eq!(rec.id, "1");
        assert_eq!(rec.family_id.as_deref(), Some("1"));
        assert_eq!(rec.zygosity_status.as_deref(), Some("Homozygous"));
        assert_eq!(rec.diagnostic_comment.as_deref(), Some("Sibling affected"));
        assert_eq!(rec.external_reference.as_deref(), Some(REFERENCE));
        assert_eq!(rec.total_family_members, FieldValue::NotReported);
        assert_eq!(rec.phenotypic_feature_ids.as_deref(), Some("HP:0001251"));
        assert_eq!(rec.data_source_type, SourceType::ClinicalLiterature);
    }
}
