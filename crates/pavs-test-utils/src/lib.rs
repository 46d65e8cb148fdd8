//! Shared fixtures for PAVS tests: small cohort exports, an OBO document,
//! NLP annotations and a [`CaseRecord`] builder.

use std::path::PathBuf;

use pavs_common::{CaseRecord, FieldValue, SourceType};

// ── Cohort exports ────────────────────────────────────────────────────────────

/// Literature export: two kept rows, one row citing the excluded reference
/// and one exact duplicate.
pub const LITERATURE_TSV: &str = "id\ttest\ttest_strategy\tpatient_gender\tpatient_age\tconsanguinity\tfamily_id\tnumber_of_family_members\tcohort_size\tphenotypes\tresult\tresult_comment\tvariants\tzygosity\tpathogenicity\treference\n\
1\tWES\tTrio\tMale\t22Y\tYes\tF1\t4\t120\tSeizures (HP:0001250), Hypotonia\tPositive\tEpileptic encephalopathy (OMIM:615338)\tSCN1A:NM_001165963.4:c.2836C>T,p.Arg946Cys\tHeterozygous\tPathogenic\thttps://pubmed.ncbi.nlm.nih.gov/31000001/\n\
2\tPanel\tSingleton\tFemale\t3 years 6 months\tNo\tF2\t1\t120\tMicrocephaly (HP:0000252); global developmental delay\tPositive\tNot reported\tASPM:c.3978G>A;ASPM:c.9557C>G\tCompound heterozygous\tLikely pathogenic;VUS\thttps://pubmed.ncbi.nlm.nih.gov/31000002/\n\
3\tWES\tTrio\tMale\t4Y\tNo\tF3\t3\t40\tAtaxia (HP:0001251)\tPositive\t\tATM:c.5932G>T\tHomozygous\tPathogenic\thttps://pubmed.ncbi.nlm.nih.gov/28600779/\n\
1\tWES\tTrio\tMale\t22Y\tYes\tF1\t4\t120\tSeizures (HP:0001250), Hypotonia\tPositive\tEpileptic encephalopathy (OMIM:615338)\tSCN1A:NM_001165963.4:c.2836C>T,p.Arg946Cys\tHeterozygous\tPathogenic\thttps://pubmed.ncbi.nlm.nih.gov/31000001/\n\
";

/// Clinical literature export with the misspelt `Zyogsity` header.
pub const CLINICAL_LITERATURE_TSV: &str = "ID\tTesting Strategy\tGender\tAge\tTest\tConsanguinity\tFamily hx\tResult\tZyogsity\tPhenotype\tVariant(s)\tHGMD\n\
P1\tTrio\tF\tinfant\tWES\tYes\tMenkes disease #309400\tPositive\tHemizygous\tAtaxia (HP:0001251)\tATP7A:c.2179G>A\tDM\n\
P2\tSingleton\tM\tnewborn\tPanel\tNo\t\tNegative\t\tHypotonia\t\t\n\
";

/// Hospital collaborator export with the padded headers of the original sheet.
pub const HOSPITAL_TSV: &str = "Case\tTest\t Test Type\tGender\tDOB\tConsanguinity \tResults Internal\tZygosity\tHPOs\tFamily ID\tGene\tVariant \tGene 2\tVariant 2  \tGene 3\tVariant 3  \tGene 4\tVariant4\tpathogenicity \tpathogenicity 2 \tpathogenicity 3\tpathogenicity 4\tComments\tInheritance\tOmim\n\
NG-1\tWES\tTrio\tMale\t5Y\tYes\tPositive\tHomozygous\tSeizures (HP:0001250); Ataxia (HP:0001251)\tFAM9\tPAH\tc.1222C>T\t\t\t\t\t\t\tPathogenic\t\t\t\tAffected sibling\tAR\t261600\n\
";
/// Annotator output for the literature and clinical-literature cohorts.
pub const NLP_JSON: &str = r#"{
  "LIT_1": ["HP:0001252"],
  "LIT_2": ["HP:0001263", "not-an-id"],
  "CLIT_2": ["HP:0001252"]
}"#;

// ── Ontology ──────────────────────────────────────────────────────────────────

pub const SAMPLE_OBO: &str = "format-version: 1.2
data-version: hp/releases/2024-04-26
ontology: hp

[Term]
id: HP:0000252
name: Microcephaly
synonym: \"Small head\" EXACT []

[Term]
id: HP:0001250
name: Seizure
synonym: \"Seizures\" EXACT []
synonym: \"Epileptic seizure\" EXACT []

[Term]
id: HP:0001251
name: Ataxia

[Term]
id: HP:0001252
name: Hypotonia
synonym: \"Muscle hypotonia\" EXACT []

[Term]
id: HP:0001263
name: Global developmental delay

[Term]
id: HP:0000001
name: Obsolete placeholder
is_obsolete: true

[Typedef]
id: part_of
name: part of
";

/// `(id, name, synonyms)` rows matching [`SAMPLE_OBO`], for building a
/// lookup without parsing.
pub const HPO_TERMS: &[(&str, &str, &[&str])] = &[
    ("HP:0000252", "Microcephaly", &["Small head"]),
    ("HP:0001250", "Seizure", &["Seizures", "Epileptic seizure"]),
    ("HP:0001251", "Ataxia", &[]),
    ("HP:0001252", "Hypotonia", &["Muscle hypotonia"]),
    ("HP:0001263", "Global developmental delay", &[]),
];

pub const HGNC_TSV: &str = "hgnc_id\tsymbol\tname\tstatus\talias_symbol\tprev_symbol
HGNC:10585\tSCN1A\tsodium voltage-gated channel alpha subunit 1\tApproved\tNav1.1|GEFSP2\t
HGNC:869\tATP7A\tATPase copper transporting alpha\tApproved\tMNK\tMK
HGNC:8582\tPAH\tphenylalanine hydroxylase\tApproved\t\tPKU1
";

// ── Builders ──────────────────────────────────────────────────────────────────

/// Fluent builder for [`CaseRecord`]s in tests.
#[derive(Debug, Clone)]
pub struct CaseBuilder {
    record: CaseRecord,
}

impl CaseBuilder {
    pub fn new(id: &str) -> Self {
        Self { record: CaseRecord::new(id, SourceType::Literature) }
    }

    pub fn source(mut self, source: SourceType) -> Self {
        self.record.data_source_type = source;
        self
    }

    pub fn sex(mut self, v: &str) -> Self {
        self.record.sex = FieldValue::from_raw(v);
        self
    }

    pub fn age(mut self, v: &str) -> Self {
        self.record.age = FieldValue::from_raw(v);
        self
    }

    pub fn phenotypes(mut self, text: &str, ids: &str) -> Self {
        self.record.phenotypic_features = FieldValue::from_raw(text);
        self.record.phenotypic_feature_ids = FieldValue::from_raw(ids);
        self
    }

    pub fn variants(mut self, variants: &str, interpretation: &str, zygosity: &str) -> Self {
        self.record.genomic_variants = FieldValue::from_raw(variants);
        self.record.variant_interpretation = FieldValue::from_raw(interpretation);
        self.record.zygosity_status = FieldValue::from_raw(zygosity);
        self
    }

    pub fn diagnosis(mut self, diagnosis: &str, comment: &str) -> Self {
        self.record.diagnosis = FieldValue::from_raw(diagnosis);
        self.record.diagnostic_comment = FieldValue::from_raw(comment);
        self
    }

    pub fn reference(mut self, v: &str) -> Self {
        self.record.external_reference = FieldValue::from_raw(v);
        self
    }

    pub fn build(self) -> CaseRecord {
        self.record
    }
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// Write `content` to `name` inside `dir` and return the path.
pub fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Parse a JSON file written by a test.
pub fn read_json(path: &std::path::Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_classifies_absent_values() {
        let rec = CaseBuilder::new("PAVS1").sex("Not reported").age("22Y").build();
        assert_eq!(rec.sex, FieldValue::NotReported);
        assert_eq!(rec.age.as_deref(), Some("22Y"));
    }

    #[test]
    fn test_nlp_fixture_is_json_object() {
        let value: serde_json::Value = serde_json::from_str(NLP_JSON).unwrap();
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }
}
