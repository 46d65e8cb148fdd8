//! Core record types shared by the ingestion pipeline and the CLI.
//!
//! Every column of the common tabular schema is represented by a named field.
//! Absence is decided once, at ingestion, by [`FieldValue::from_raw`]; downstream
//! code matches on [`FieldValue::NotReported`] instead of comparing strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal written for absent values in every tabular export.
pub const NOT_REPORTED: &str = "Not reported";

/// Raw spellings treated as "no value" when a field is ingested.
const ABSENT_SPELLINGS: &[&str] = &["", "not reported", "null", "nan"];

/// Column order of the common 18-column schema.
pub const COMMON_COLUMNS: [&str; 18] = [
    "ID",
    "sex",
    "age",
    "consanguinityStatus",
    "familyId",
    "totalFamilyMembers",
    "totalCohortMembers",
    "phenotypicFeatures",
    "phenotypicFeatureIds",
    "procedure",
    "procedureStrategy",
    "diagnosis",
    "diagnosticComment",
    "genomicVariants",
    "zygosityStatus",
    "variantInterpretation",
    "dataSourceType",
    "externalReference",
];

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single free-text field: either a reported (trimmed, non-empty) value or
/// the explicit "Not reported" marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldValue {
    Reported(String),
    #[default]
    NotReported,
}

impl FieldValue {
    /// Classify a raw cell. Sentinels, `NULL`, `nan` and blank cells are absent.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();
        if ABSENT_SPELLINGS.contains(&lowered.as_str()) {
            FieldValue::NotReported
        } else {
            FieldValue::Reported(trimmed.to_string())
        }
    }

    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map(Self::from_raw).unwrap_or_default()
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::Reported(s) => Some(s.as_str()),
            FieldValue::NotReported => None,
        }
    }

    pub fn is_reported(&self) -> bool {
        matches!(self, FieldValue::Reported(_))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::from_raw(&s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::from_raw(s)
    }
}

impl From<FieldValue> for String {
    fn from(v: FieldValue) -> Self {
        v.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Reported(s) => f.write_str(s),
            FieldValue::NotReported => f.write_str(NOT_REPORTED),
        }
    }
}

// ---------------------------------------------------------------------------
// Source type
// ---------------------------------------------------------------------------

/// Cohort a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Literature,
    ClinicalLiterature,
    ClinicalCollaborator,
    #[serde(other)]
    Unknown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Literature           => "literature",
            SourceType::ClinicalLiterature   => "clinical_literature",
            SourceType::ClinicalCollaborator => "clinical_collaborator",
            SourceType::Unknown              => "unknown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CaseRecord
// ---------------------------------------------------------------------------

/// One row of the common schema. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub sex: FieldValue,
    #[serde(default)]
    pub age: FieldValue,
    #[serde(rename = "consanguinityStatus", default)]
    pub consanguinity_status: FieldValue,
    #[serde(rename = "familyId", default)]
    pub family_id: FieldValue,
    #[serde(rename = "totalFamilyMembers", default)]
    pub total_family_members: FieldValue,
    #[serde(rename = "totalCohortMembers", default)]
    pub total_cohort_members: FieldValue,
    #[serde(rename = "phenotypicFeatures", default)]
    pub phenotypic_features: FieldValue,
    #[serde(rename = "phenotypicFeatureIds", default)]
    pub phenotypic_feature_ids: FieldValue,
    #[serde(default)]
    pub procedure: FieldValue,
    #[serde(rename = "procedureStrategy", default)]
    pub procedure_strategy: FieldValue,
    #[serde(default)]
    pub diagnosis: FieldValue,
    #[serde(rename = "diagnosticComment", default)]
    pub diagnostic_comment: FieldValue,
    #[serde(rename = "genomicVariants", default)]
    pub genomic_variants: FieldValue,
    #[serde(rename = "zygosityStatus", default)]
    pub zygosity_status: FieldValue,
    #[serde(rename = "variantInterpretation", default)]
    pub variant_interpretation: FieldValue,
    #[serde(rename = "dataSourceType")]
    pub data_source_type: SourceType,
    #[serde(rename = "externalReference", default)]
    pub external_reference: FieldValue,
}

impl CaseRecord {
    /// Empty record for `id`; every field starts as not reported.
    pub fn new(id: impl Into<String>, data_source_type: SourceType) -> Self {
        Self {
            id: id.into(),
            sex: FieldValue::NotReported,
            age: FieldValue::NotReported,
            consanguinity_status: FieldValue::NotReported,
            family_id: FieldValue::NotReported,
            total_family_members: FieldValue::NotReported,
            total_cohort_members: FieldValue::NotReported,
            phenotypic_features: FieldValue::NotReported,
            phenotypic_feature_ids: FieldValue::NotReported,
            procedure: FieldValue::NotReported,
            procedure_strategy: FieldValue::NotReported,
            diagnosis: FieldValue::NotReported,
            diagnostic_comment: FieldValue::NotReported,
            genomic_variants: FieldValue::NotReported,
            zygosity_status: FieldValue::NotReported,
            variant_interpretation: FieldValue::NotReported,
            data_source_type,
            external_reference: FieldValue::NotReported,
        }
    }
}

// ---------------------------------------------------------------------------
// Row errors
// ---------------------------------------------------------------------------

/// A row that was excluded from output, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based position of the row within its batch.
    #[serde(skip)]
    pub row: usize,
    #[serde(rename = "ID")]
    pub patient_id: String,
    #[serde(rename = "error")]
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, patient_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { row, patient_id: patient_id.into(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_not_reported() {
        assert_eq!(FieldValue::from_raw("Not reported"), FieldValue::NotReported);
        assert_eq!(FieldValue::from_raw("  NULL "), FieldValue::NotReported);
        assert_eq!(FieldValue::from_raw("nan"), FieldValue::NotReported);
        assert_eq!(FieldValue::from_raw(""), FieldValue::NotReported);
    }

    #[test]
    fn test_reported_value_is_trimmed() {
        let v = FieldValue::from_raw("  Seizures ");
        assert_eq!(v.as_deref(), Some("Seizures"));
        assert!(v.is_reported());
    }

    #[test]
    fn test_display_writes_sentinel() {
        assert_eq!(FieldValue::NotReported.to_string(), NOT_REPORTED);
        assert_eq!(FieldValue::from("Male").to_string(), "Male");
    }

    #[test]
    fn test_source_type_roundtrip() {
        let json = serde_json::to_string(&SourceType::ClinicalLiterature).unwrap();
        assert_eq!(json, "\"clinical_literature\"");
        let parsed: SourceType = serde_json::from_str("\"something_else\"").unwrap();
        assert_eq!(parsed, SourceType::Unknown);
    }

    #[test]
    fn test_case_record_reads_common_schema() {
        let header = COMMON_COLUMNS.join("\t");
        let row = "PAVS1\tMale\t22Y\tYes\tF1\t4\tNot reported\tSeizures (HP:0001250)\tHP:0001250\tWES\tTrio\tPositive\tNot reported\tBRCA1:c.123A>G\tHeterozygous\tPathogenic\tliterature\thttps://pubmed.ncbi.nlm.nih.gov/1/";
        let data = format!("{header}\n{row}\n");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(data.as_bytes());
        let rec: CaseRecord = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(rec.id, "PAVS1");
        assert_eq!(rec.sex.as_deref(), Some("Male"));
        assert_eq!(rec.total_cohort_members, FieldValue::NotReported);
        assert_eq!(rec.data_source_type, SourceType::Literature);
    }
}
