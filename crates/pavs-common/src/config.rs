//! Pipeline configuration.
//!
//! Read from `pavs.toml` in the current directory, or the path named by the
//! `PAVS_CONFIG` env var. Every section has defaults, so an empty file (or no
//! file at all) yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PavsError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input files
    #[serde(default)]
    pub inputs: InputConfig,

    /// Ontology resources and their versions
    #[serde(default)]
    pub ontology: OntologyConfig,

    /// Field splitting and phenotype policies
    #[serde(default)]
    pub normalise: NormaliseConfig,

    /// Cohort merge options
    #[serde(default)]
    pub merge: MergeConfig,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,
}

// ── Inputs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub literature: Option<String>,
    pub clinical_literature: Option<String>,
    pub hospital_collaborator: Option<String>,

    /// NLP annotations: JSON object of prefixed patient id → HPO ids
    pub nlp_annotations: Option<String>,

    /// Combined 18-column TSV read by `convert`
    #[serde(default = "default_combined")]
    pub combined: String,
}

fn default_combined() -> String { "PAVS_final_data.tsv".to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            literature: None,
            clinical_literature: None,
            hospital_collaborator: None,
            nlp_annotations: None,
            combined: default_combined(),
        }
    }
}

// ── Ontology ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    #[serde(default = "default_hpo_path")]
    pub hpo_path: String,

    /// Optional HGNC complete-set TSV for gene symbol resolution
    pub hgnc_path: Option<String>,

    #[serde(default = "default_hp_version")]
    pub hp_version: String,

    #[serde(default = "default_geno_version")]
    pub geno_version: String,

    #[serde(default = "default_omim_version")]
    pub omim_version: String,
}

fn default_hpo_path() -> String { "resources/hp.obo".to_string() }
fn default_hp_version() -> String { "2024-04-26".to_string() }
fn default_geno_version() -> String { "2020-03-08".to_string() }
fn default_omim_version() -> String { "2024-01".to_string() }

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            hpo_path: default_hpo_path(),
            hgnc_path: None,
            hp_version: default_hp_version(),
            geno_version: default_geno_version(),
            omim_version: default_omim_version(),
        }
    }
}

// ── Normalisation ─────────────────────────────────────────────────────────────

/// What happens to a free-text label written next to an explicit identifier,
/// e.g. `Seizures (HP:0001250)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Keep only the identifier.
    #[default]
    Suppress,
    /// Keep the identifier and remember the label as written for it.
    Retain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormaliseConfig {
    /// Delimiters separating phenotype terms
    #[serde(default = "default_phenotype_delimiters")]
    pub phenotype_delimiters: Vec<char>,

    /// Delimiters separating distinct variants; commas are left alone because
    /// they join alternate notations of one variant
    #[serde(default = "default_variant_delimiters")]
    pub variant_delimiters: Vec<char>,

    #[serde(default)]
    pub label_policy: LabelPolicy,

    /// Resolve free-text phenotype terms through the ontology synonym table
    #[serde(default = "default_true")]
    pub synonym_lookup: bool,
}

fn default_phenotype_delimiters() -> Vec<char> { vec![',', '|', ';'] }
fn default_variant_delimiters() -> Vec<char> { vec![';', '|'] }
fn default_true() -> bool { true }

impl Default for NormaliseConfig {
    fn default() -> Self {
        Self {
            phenotype_delimiters: default_phenotype_delimiters(),
            variant_delimiters: default_variant_delimiters(),
            label_policy: LabelPolicy::default(),
            synonym_lookup: true,
        }
    }
}

// ── Merge ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_literature_prefix")]
    pub literature_prefix: String,

    #[serde(default = "default_clinical_literature_prefix")]
    pub clinical_literature_prefix: String,

    /// Prefix of the final renumbered patient ids
    #[serde(default = "default_final_prefix")]
    pub final_prefix: String,

    /// Literature rows citing this reference duplicate the clinical-literature cohort
    #[serde(default = "default_excluded_reference")]
    pub excluded_literature_reference: String,
}

fn default_literature_prefix() -> String { "LIT_".to_string() }
fn default_clinical_literature_prefix() -> String { "CLIT_".to_string() }
fn default_final_prefix() -> String { "PAVS".to_string() }
fn default_excluded_reference() -> String {
    "https://pubmed.ncbi.nlm.nih.gov/28600779/".to_string()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            literature_prefix: default_literature_prefix(),
            clinical_literature_prefix: default_clinical_literature_prefix(),
            final_prefix: default_final_prefix(),
            excluded_literature_reference: default_excluded_reference(),
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Single pretty-printed JSON array
    #[default]
    Json,
    /// One phenopacket per line
    JsonLines,
    /// One file per phenopacket
    Individual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_output_path")]
    pub path: String,

    #[serde(default = "default_error_report")]
    pub error_report: String,

    #[serde(default = "default_created_by")]
    pub created_by: String,
}

fn default_output_path() -> String { "PAVS_phenopackets.json".to_string() }
fn default_error_report() -> String { "phenopacket_conversion_errors.tsv".to_string() }
fn default_created_by() -> String { "PAVS Data Pipeline".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: default_output_path(),
            error_report: default_error_report(),
            created_by: default_created_by(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from `PAVS_CONFIG` or `./pavs.toml`; defaults when neither exists.
    pub fn load() -> Result<Self> {
        let path = std::env::var("PAVS_CONFIG").unwrap_or_else(|_| "pavs.toml".to_string());
        if !Path::new(&path).exists() {
            tracing::warn!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Load from a file, choosing the format by extension (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn from_path(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(PavsError::Config(format!(
                "unsupported config extension {:?} for {}",
                other, path
            ))),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the merge ambiguous.
    pub fn validate(&self) -> Result<()> {
        let lit = &self.merge.literature_prefix;
        let clit = &self.merge.clinical_literature_prefix;
        if lit.is_empty() || clit.is_empty() {
            return Err(PavsError::Config("cohort prefixes must not be empty".into()));
        }
        if lit.starts_with(clit.as_str()) || clit.starts_with(lit.as_str()) {
            return Err(PavsError::Config(format!(
                "cohort prefixes {lit:?} and {clit:?} overlap"
            )));
        }
        if self.normalise.phenotype_delimiters.is_empty() {
            return Err(PavsError::Config("phenotype_delimiters must not be empty".into()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.merge.literature_prefix, "LIT_");
        assert_eq!(config.merge.clinical_literature_prefix, "CLIT_");
        assert_eq!(config.normalise.label_policy, LabelPolicy::Suppress);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [normalise]
            label_policy = "retain"

            [output]
            format = "json-lines"
            "#,
        )
        .unwrap();
        assert_eq!(config.normalise.label_policy, LabelPolicy::Retain);
        assert_eq!(config.output.format, OutputFormat::JsonLines);
        assert_eq!(config.normalise.phenotype_delimiters, vec![',', '|', ';']);
        assert_eq!(config.ontology.hp_version, "2024-04-26");
    }

    #[test]
    fn test_overlapping_prefixes_rejected() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [merge]
            literature_prefix = "LIT"
            clinical_literature_prefix = "LIT_C"
            "#,
        );
        assert!(matches!(err, Err(PavsError::Config(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PipelineConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: PipelineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.merge.final_prefix, parsed.merge.final_prefix);
    }
}
