//! GA4GH Phenopacket v2 shaped output.
//!
//! Field names and enum spellings follow the phenopacket JSON schema, so
//! these types serialise straight to what downstream validators expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pavs_common::{PipelineConfig, SourceType};

use crate::models::{CanonicalRecord, VariantCall};
use crate::normalise::hgnc::GeneContext;
use crate::normalise::identifiers::{AcmgClass, Sex};

pub const SCHEMA_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phenopacket {
    pub id: String,
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phenotypic_features: Vec<PhenotypicFeature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretations: Vec<Interpretation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diseases: Vec<Disease>,
    pub meta_data: MetaData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyClass {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_at_last_encounter: Option<TimeElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeElement {
    pub age: Age,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    pub iso8601duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhenotypicFeature {
    #[serde(rename = "type")]
    pub term: OntologyClass,
}

// ── Interpretations ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpretationStatus {
    UnknownStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub id: String,
    pub progress_status: ProgressStatus,
    pub diagnosis: Diagnosis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub genomic_interpretations: Vec<GenomicInterpretation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomicInterpretation {
    pub subject_or_biosample_id: String,
    pub interpretation_status: InterpretationStatus,
    pub variant_interpretation: VariantInterpretation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInterpretation {
    pub acmg_pathogenicity_classification: AcmgClass,
    pub variation_descriptor: VariationDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationDescriptor {
    pub id: String,
    pub variation: Variation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_context: Option<GeneContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allelic_state: Option<OntologyClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub syntax: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disease {
    pub term: OntologyClass,
}

// ── Metadata ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub version: String,
    pub namespace_prefix: String,
    pub iri_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub id: String,
    pub reference: String,
    pub description: String,
}

/// Cohort-specific fields with no phenopacket counterpart. Absent values
/// are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PavsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consanguinity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_family_members: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cohort_members: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_procedure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zygosity_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmapped_phenotypes: Vec<String>,
}

impl PavsData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub created: String,
    pub created_by: String,
    pub resources: Vec<Resource>,
    pub phenopacket_schema_version: String,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pavs_data: Option<PavsData>,
}

/// Run-wide metadata shared by every phenopacket of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaContext {
    pub created: String,
    pub created_by: String,
    pub resources: Vec<Resource>,
}

impl MetaContext {
    pub fn new(config: &PipelineConfig, created: DateTime<Utc>) -> Self {
        let onto = &config.ontology;
        Self {
            created: created.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            created_by: config.output.created_by.clone(),
            resources: vec![
                resource("hp", "Human Phenotype Ontology", "http://purl.obolibrary.org/obo/hp.owl",
                         &onto.hp_version, "HP", "http://purl.obolibrary.org/obo/HP_"),
                resource("geno", "Genotype Ontology", "http://purl.obolibrary.org/obo/geno.owl",
                         &onto.geno_version, "GENO", "http://purl.obolibrary.org/obo/GENO_"),
                resource("omim", "Online Mendelian Inheritance in Man", "https://www.omim.org",
                         &onto.omim_version, "OMIM", "https://omim.org/entry/"),
            ],
        }
    }

    /// Context stamped with the current time.
    pub fn now(config: &PipelineConfig) -> Self {
        Self::new(config, Utc::now())
    }
}

fn resource(id: &str, name: &str, url: &str, version: &str, prefix: &str, iri: &str) -> Resource {
    Resource {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        version: version.to_string(),
        namespace_prefix: prefix.to_string(),
        iri_prefix: iri.to_string(),
    }
}

// ── Shaping ───────────────────────────────────────────────────────────────────

fn variation_descriptor(pid: &str, call: &VariantCall) -> VariationDescriptor {
    let expr = &call.expression;
    VariationDescriptor {
        id: format!("{pid}_variant{}", call.index),
        variation: Variation { text: call.text().to_string() },
        expressions: expr
            .notations
            .iter()
            .map(|n| Expression { syntax: n.kind.syntax().to_string(), value: expr.qualified(n) })
            .collect(),
        gene_context: call.gene.clone(),
        allelic_state: call.zygosity.map(|z| OntologyClass {
            id: z.id.to_string(),
            label: z.label.to_string(),
        }),
    }
}

fn interpretations(record: &CanonicalRecord) -> Vec<Interpretation> {
    if record.variants.is_empty() {
        return Vec::new();
    }
    let genomic_interpretations = record
        .variants
        .iter()
        .map(|call| GenomicInterpretation {
            subject_or_biosample_id: record.id.clone(),
            interpretation_status: InterpretationStatus::UnknownStatus,
            variant_interpretation: VariantInterpretation {
                acmg_pathogenicity_classification: call.acmg,
                variation_descriptor: variation_descriptor(&record.id, call),
            },
        })
        .collect();
    vec![Interpretation {
        id: format!("{}_interpretation", record.id),
        progress_status: ProgressStatus::Completed,
        diagnosis: Diagnosis { genomic_interpretations },
    }]
}

fn external_references(record: &CanonicalRecord) -> Vec<ExternalReference> {
    let source = record.case.data_source_type;
    record
        .case
        .external_reference
        .as_deref()
        .map(|refs| {
            refs.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| ExternalReference {
                    id: r.to_string(),
                    reference: r.to_string(),
                    description: format!("Source: {source}"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn pavs_data(record: &CanonicalRecord) -> Option<PavsData> {
    let case = &record.case;
    let owned = |f: &pavs_common::FieldValue| f.as_deref().map(str::to_string);
    let data = PavsData {
        consanguinity: owned(&case.consanguinity_status),
        family_id: owned(&case.family_id),
        total_family_members: owned(&case.total_family_members),
        total_cohort_members: owned(&case.total_cohort_members),
        testing_procedure: owned(&case.procedure),
        testing_strategy: owned(&case.procedure_strategy),
        diagnostic_comment: owned(&case.diagnostic_comment),
        zygosity_status: owned(&case.zygosity_status),
        data_source_type: Some(case.data_source_type).filter(|s| *s != SourceType::Unknown),
        unmapped_phenotypes: record.unmapped_phenotypes.clone(),
    };
    (!data.is_empty()).then_some(data)
}

/// Shape a canonical record as a phenopacket.
pub fn to_phenopacket(record: &CanonicalRecord, meta: &MetaContext) -> Phenopacket {
    Phenopacket {
        id: record.id.clone(),
        subject: Subject {
            id: record.id.clone(),
            sex: Some(record.sex).filter(|s| *s != Sex::UnknownSex),
            time_at_last_encounter: record
                .age
                .clone()
                .map(|iso8601duration| TimeElement { age: Age { iso8601duration } }),
        },
        phenotypic_features: record
            .phenotypes
            .iter()
            .map(|p| PhenotypicFeature {
                term: OntologyClass {
                    id: p.id.clone(),
                    label: p.label.clone().unwrap_or_else(|| format!("Unknown term: {}", p.id)),
                },
            })
            .collect(),
        interpretations: interpretations(record),
        diseases: record
            .diseases
            .iter()
            .map(|d| Disease { term: OntologyClass { id: d.id.clone(), label: d.label.clone() } })
            .collect(),
        meta_data: MetaData {
            created: meta.created.clone(),
            created_by: meta.created_by.clone(),
            resources: meta.resources.clone(),
            phenopacket_schema_version: SCHEMA_VERSION.to_string(),
            external_references: external_references(record),
            pavs_data: pavs_data(record),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::RecordAssembler;
    use crate::ontology::HpoLabels;
    use chrono::TimeZone;
    use pavs_common::config::NormaliseConfig;
    use pavs_common::CaseRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn meta() -> MetaContext {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        MetaContext::new(&PipelineConfig::default(), created)
    }

    fn packet(case: &CaseRecord) -> serde_json::Value {
        let mut labels = HpoLabels::empty();
        labels.insert_term("HP:0001250", "Seizure", &[]);
        let record = RecordAssembler::new(&labels, &NormaliseConfig::default())
            .assemble(case)
            .unwrap();
        serde_json::to_value(to_phenopacket(&record, &meta())).unwrap()
    }

    #[test]
    fn test_subject_and_features() {
        let mut case = CaseRecord::new("PAVS1", SourceType::Literature);
        case.sex = "M".into();
        case.age = "22Y".into();
        case.phenotypic_feature_ids = "HP:0001250,HP:0000252".into();
        let pp = packet(&case);

        assert_eq!(
            pp["subject"],
            json!({"id": "PAVS1", "sex": "MALE", "timeAtLastEncounter": {"age": {"iso8601duration": "P22Y"}}})
        );
        assert_eq!(
            pp["phenotypicFeatures"],
            json!([
                {"type": {"id": "HP:0000252", "label": "Unknown term: HP:0000252"}},
                {"type": {"id": "HP:0001250", "label": "Seizure"}}
            ])
        );
        assert!(pp.get("interpretations").is_none());
        assert!(pp.get("diseases").is_none());
    }

    #[test]
    fn test_unknown_sex_omitted() {
        let pp = packet(&CaseRecord::new("PAVS2", SourceType::Literature));
        assert_eq!(pp["subject"], json!({"id": "PAVS2"}));
    }

    #[test]
    fn test_interpretation_shape() {
        let mut case = CaseRecord::new("PAVS3", SourceType::Literature);
        case.genomic_variants = "BRCA1:NM_007294.3:c.123A>G,p.Lys41Arg".into();
        case.variant_interpretation = "Likely pathogenic".into();
        case.zygosity_status = "Heterozygous".into();
        let pp = packet(&case);

        let interp = &pp["interpretations"][0];
        assert_eq!(interp["id"], "PAVS3_interpretation");
        assert_eq!(interp["progressStatus"], "COMPLETED");
        let gi = &interp["diagnosis"]["genomicInterpretations"][0];
        assert_eq!(gi["subjectOrBiosampleId"], "PAVS3");
        assert_eq!(gi["interpretationStatus"], "UNKNOWN_STATUS");
        assert_eq!(gi["variantInterpretation"]["acmgPathogenicityClassification"], "LIKELY_PATHOGENIC");
        assert_eq!(
            gi["variantInterpretation"]["variationDescriptor"],
            json!({
                "id": "PAVS3_variant1",
                "variation": {"text": "BRCA1:NM_007294.3:c.123A>G,p.Lys41Arg"},
                "expressions": [
                    {"syntax": "hgvs.c", "value": "NM_007294.3:c.123A>G"},
                    {"syntax": "hgvs.p", "value": "p.Lys41Arg"}
                ],
                "geneContext": {"valueId": "HGNC:BRCA1", "symbol": "BRCA1"},
                "allelicState": {"id": "GENO:0000135", "label": "heterozygous"}
            })
        );
    }

    #[test]
    fn test_metadata_references_and_pavs_data() {
        let mut case = CaseRecord::new("PAVS4", SourceType::ClinicalCollaborator);
        case.external_reference = "hospital_collaborator, https://a.example/1 , https://b.example/2".into();
        case.family_id = "FAM9".into();
        case.diagnostic_comment = "OMIM: 261600".into();
        let pp = packet(&case);
        let md = &pp["metaData"];

        assert_eq!(md["created"], "2024-05-01T12:30:00.000000Z");
        assert_eq!(md["createdBy"], "PAVS Data Pipeline");
        assert_eq!(md["phenopacketSchemaVersion"], "2.0");
        assert_eq!(md["resources"][0]["iriPrefix"], "http://purl.obolibrary.org/obo/HP_");
        assert_eq!(md["resources"][2]["version"], "2024-01");
        assert_eq!(md["externalReferences"].as_array().unwrap().len(), 3);
        assert_eq!(
            md["externalReferences"][1],
            json!({"id": "https://a.example/1", "reference": "https://a.example/1",
                   "description": "Source: clinical_collaborator"})
        );
        assert_eq!(
            md["pavsData"],
            json!({"familyId": "FAM9", "diagnosticComment": "OMIM: 261600",
                   "dataSourceType": "clinical_collaborator"})
        );
        assert_eq!(pp["diseases"], json!([{"term": {"id": "OMIM:261600", "label": "OMIM: 261600"}}]));
    }
}
