//! PAVS: curated case records to GA4GH phenopackets.
//! Entry point for the `pavs` binary.

mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pavs_common::{CaseRecord, OutputFormat, PipelineConfig, RowError};
use pavs_ingestion::normalise::{GeneResolver, HgncTable};
use pavs_ingestion::sources::combined::{read_combined, write_annotation_input, write_combined};
use pavs_ingestion::sources::{ClinicalLiteratureSource, HospitalCollaboratorSource, LiteratureSource};
use pavs_ingestion::{
    convert_batch, merge_cohorts, CohortSource, Cohorts, HpoLabels, MetaContext, NlpAnnotations,
    RecordAssembler,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pavs", version, about = "Convert curated case records into GA4GH phenopackets")]
struct Cli {
    /// Config file; defaults to $PAVS_CONFIG or ./pavs.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default, Clone)]
struct CohortArgs {
    /// Literature curation export
    #[arg(long, value_name = "TSV")]
    literature: Option<PathBuf>,

    /// Clinical literature export
    #[arg(long, value_name = "TSV")]
    clinical_literature: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the cohort exports into the combined table
    Merge {
        #[command(flatten)]
        cohorts: CohortArgs,

        /// Hospital collaborator export
        #[arg(long, value_name = "TSV")]
        hospital: Option<PathBuf>,

        /// NLP annotations (JSON object of prefixed id → HPO ids)
        #[arg(long, value_name = "JSON")]
        nlp: Option<PathBuf>,

        /// Combined table to write
        #[arg(short, long, value_name = "TSV")]
        output: Option<PathBuf>,

        /// Report of unreadable source rows; defaults to `<combined stem>_errors.tsv`
        #[arg(long, value_name = "TSV")]
        errors: Option<PathBuf>,
    },

    /// Write the prefixed `ID\tphenotypes` table for the external annotator
    AnnotationInput {
        #[command(flatten)]
        cohorts: CohortArgs,

        #[arg(short, long, value_name = "TSV", default_value = "id_pheno_combined.tsv")]
        output: PathBuf,
    },

    /// Convert a combined table to phenopackets
    Convert {
        /// Combined table; defaults to inputs.combined
        #[arg(value_name = "TSV")]
        input: Option<PathBuf>,

        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// HPO ontology (.obo)
        #[arg(long, value_name = "OBO")]
        hpo: Option<PathBuf>,

        /// HGNC complete set (TSV)
        #[arg(long, value_name = "TSV")]
        hgnc: Option<PathBuf>,

        /// Error report path
        #[arg(long, value_name = "TSV")]
        errors: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FormatArg {
    Json,
    JsonLines,
    Individual,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json       => OutputFormat::Json,
            FormatArg::JsonLines  => OutputFormat::JsonLines,
            FormatArg::Individual => OutputFormat::Individual,
        }
    }
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_path(&path_string(p))
            .with_context(|| format!("loading config {}", p.display())),
        None => PipelineConfig::load().context("loading pavs.toml"),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut PipelineConfig, command: &Command) {
    let set = |slot: &mut Option<String>, v: &Option<PathBuf>| {
        if let Some(p) = v {
            *slot = Some(path_string(p));
        }
    };
    match command {
        Command::Merge { cohorts, hospital, nlp, output, .. } => {
            set(&mut config.inputs.literature, &cohorts.literature);
            set(&mut config.inputs.clinical_literature, &cohorts.clinical_literature);
            set(&mut config.inputs.hospital_collaborator, hospital);
            set(&mut config.inputs.nlp_annotations, nlp);
            if let Some(o) = output {
                config.inputs.combined = path_string(o);
            }
        }
        Command::AnnotationInput { cohorts, .. } => {
            set(&mut config.inputs.literature, &cohorts.literature);
            set(&mut config.inputs.clinical_literature, &cohorts.clinical_literature);
        }
        Command::Convert { input, output, format, hpo, hgnc, errors } => {
            if let Some(i) = input {
                config.inputs.combined = path_string(i);
            }
            if let Some(o) = output {
                config.output.path = path_string(o);
            }
            if let Some(f) = format {
                config.output.format = (*f).into();
            }
            if let Some(h) = hpo {
                config.ontology.hpo_path = path_string(h);
            }
            set(&mut config.ontology.hgnc_path, hgnc);
            if let Some(e) = errors {
                config.output.error_report = path_string(e);
            }
        }
    }
}

async fn read_optional(path: Option<&str>) -> Result<Option<Vec<u8>>> {
    match path {
        Some(p) => {
            let bytes = tokio::fs::read(p).await.with_context(|| format!("reading {p}"))?;
            Ok(Some(bytes))
        }
        None => Ok(None),
    }
}

/// Read one cohort export. Unreadable rows are appended to `errors` with
/// their ID tagged by source, e.g. `literature:row 4`.
fn read_cohort<S: CohortSource>(
    source: &S,
    bytes: Option<Vec<u8>>,
    errors: &mut Vec<RowError>,
) -> Result<Vec<CaseRecord>> {
    let Some(bytes) = bytes else { return Ok(Vec::new()) };
    let batch = source.read(&bytes)?;
    let tag = source.source_type();
    info!(source = %tag, records = batch.records.len(), skipped = batch.errors.len(), "Cohort read");
    errors.extend(batch.errors.into_iter().map(|mut e| {
        e.patient_id = format!("{tag}:{}", e.patient_id);
        e
    }));
    Ok(batch.records)
}

async fn run_merge(config: PipelineConfig, error_report: PathBuf) -> Result<()> {
    let inputs = &config.inputs;
    if inputs.literature.is_none()
        && inputs.clinical_literature.is_none()
        && inputs.hospital_collaborator.is_none()
    {
        bail!("merge needs at least one cohort export (--literature, --clinical-literature, --hospital)");
    }
    let lit = read_optional(inputs.literature.as_deref()).await?;
    let clit = read_optional(inputs.clinical_literature.as_deref()).await?;
    let hosp = read_optional(inputs.hospital_collaborator.as_deref()).await?;
    let output = PathBuf::from(&inputs.combined);

    let (records, errors) = tokio::task::spawn_blocking(move || -> Result<_> {
        let excluded = config.merge.excluded_literature_reference.as_str();
        let mut errors = Vec::new();
        let cohorts = Cohorts {
            literature: read_cohort(&LiteratureSource::new(excluded), lit, &mut errors)?,
            clinical_literature: read_cohort(
                &ClinicalLiteratureSource::new(excluded),
                clit,
                &mut errors,
            )?,
            hospital: read_cohort(&HospitalCollaboratorSource::new(), hosp, &mut errors)?,
        };
        let nlp = config
            .inputs
            .nlp_annotations
            .as_deref()
            .map(NlpAnnotations::load)
            .transpose()?;
        Ok((merge_cohorts(cohorts, nlp.as_ref(), &config.merge), errors))
    })
    .await??;

    let file = std::fs::File::create(&output)
        .with_context(|| format!("creating {}", output.display()))?;
    write_combined(&records, std::io::BufWriter::new(file))?;
    info!(n = records.len(), path = %output.display(), "Combined table written");
    if output::write_error_report(&errors, &error_report)? {
        warn!(n = errors.len(), path = %error_report.display(), "Some source rows were not merged");
    }
    Ok(())
}

async fn run_annotation_input(config: PipelineConfig, output: PathBuf) -> Result<()> {
    let lit = read_optional(config.inputs.literature.as_deref()).await?;
    let clit = read_optional(config.inputs.clinical_literature.as_deref()).await?;
    if lit.is_none() && clit.is_none() {
        bail!("annotation-input needs --literature and/or --clinical-literature");
    }

    // Unreadable rows are already logged by the readers.
    let mut skipped = Vec::new();
    let excluded = config.merge.excluded_literature_reference.as_str();
    let lit = read_cohort(&LiteratureSource::new(excluded), lit, &mut skipped)?;
    let clit = read_cohort(&ClinicalLiteratureSource::new(excluded), clit, &mut skipped)?;
    let file = std::fs::File::create(&output)
        .with_context(|| format!("creating {}", output.display()))?;
    let n = write_annotation_input(
        &[
            (config.merge.literature_prefix.as_str(), lit.as_slice()),
            (config.merge.clinical_literature_prefix.as_str(), clit.as_slice()),
        ],
        std::io::BufWriter::new(file),
    )?;
    info!(n, literature = lit.len(), clinical_literature = clit.len(), path = %output.display(),
          "Annotation input written");
    Ok(())
}

async fn run_convert(config: PipelineConfig) -> Result<()> {
    let input = config.inputs.combined.clone();
    let bytes = tokio::fs::read(&input).await.with_context(|| format!("reading {input}"))?;
    let format = config.output.format;
    let output = PathBuf::from(&config.output.path);
    let error_report = PathBuf::from(&config.output.error_report);

    // Ontology loading and assembly are CPU-bound.
    let (packets, errors, summary) = tokio::task::spawn_blocking(move || -> Result<_> {
        let table = read_combined(&bytes)?;
        let labels = HpoLabels::load_or_empty(&config.ontology.hpo_path);
        let hgnc = HgncTable::load_optional(config.ontology.hgnc_path.as_deref());
        let assembler = RecordAssembler::new(&labels, &config.normalise)
            .with_genes(GeneResolver::new(hgnc.as_ref()));

        let out = convert_batch(&table.records, &assembler);
        let packets = out.phenopackets(&MetaContext::now(&config));

        let mut summary = out.summary;
        summary.total_rows += table.errors.len();
        summary.errored += table.errors.len();
        let mut errors = table.errors;
        errors.extend(out.errors);
        Ok((packets, errors, summary))
    })
    .await??;

    let written = output::write_phenopackets(&packets, format, &output)?;
    if output::write_error_report(&errors, &error_report)? {
        warn!(n = errors.len(), path = %error_report.display(), "Some rows were not converted");
    }
    println!("{summary}");
    println!("Output: {}", written.display());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pavs=debug,info" } else { "pavs=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("PAVS {}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.command);
    config.validate()?;

    match cli.command {
        Command::Merge { errors, .. } => {
            let report = errors
                .unwrap_or_else(|| output::merge_error_report(Path::new(&config.inputs.combined)));
            run_merge(config, report).await
        }
        Command::AnnotationInput { output, .. } => run_annotation_input(config, output).await,
        Command::Convert { .. } => run_convert(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pavs_common::{PavsError, SourceType};
    use pavs_ingestion::sources::RawRow;
    use pavs_test_utils::{write_fixture, CLINICAL_LITERATURE_TSV, LITERATURE_TSV, SAMPLE_OBO};

    /// Rejects rows whose `status` is `bad`.
    struct StrictSource;

    impl CohortSource for StrictSource {
        fn source_type(&self) -> SourceType {
            SourceType::Literature
        }

        fn required_columns(&self) -> &[&str] {
            &["id"]
        }

        fn map_row(&self, row: &RawRow<'_>, id: usize) -> pavs_common::Result<Option<CaseRecord>> {
            if row.text("status") == "bad" {
                return Err(PavsError::MissingField { field: "phenotypes" });
            }
            Ok(Some(CaseRecord::new(id.to_string(), SourceType::Literature)))
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_overrides() {
        let cli = Cli::try_parse_from([
            "pavs", "convert", "combined.tsv", "--format", "json-lines", "--hgnc", "hgnc.tsv",
        ])
        .unwrap();
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.inputs.combined, "combined.tsv");
        assert_eq!(config.output.format, OutputFormat::JsonLines);
        assert_eq!(config.ontology.hgnc_path.as_deref(), Some("hgnc.tsv"));
        assert_eq!(config.output.path, "PAVS_phenopackets.json");
    }

    #[tokio::test]
    async fn test_merge_then_convert() {
        let dir = tempfile::tempdir().unwrap();
        let lit = write_fixture(&dir, "lit.tsv", LITERATURE_TSV).unwrap();
        let clit = write_fixture(&dir, "clit.tsv", CLINICAL_LITERATURE_TSV).unwrap();
        let obo = write_fixture(&dir, "hp.obo", SAMPLE_OBO).unwrap();
        let combined = dir.path().join("combined.tsv");

        let mut config = PipelineConfig::default();
        config.inputs.literature = Some(path_string(&lit));
        config.inputs.clinical_literature = Some(path_string(&clit));
        config.inputs.combined = path_string(&combined);
        config.ontology.hpo_path = path_string(&obo);
        config.output.path = path_string(&dir.path().join("out.json"));
        config.output.error_report = path_string(&dir.path().join("errors.tsv"));

        let merge_report = dir.path().join("combined_errors.tsv");
        run_merge(config.clone(), merge_report.clone()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&combined).unwrap().lines().count(), 5);
        assert!(!merge_report.exists());

        run_convert(config).await.unwrap();
        let packets = pavs_test_utils::read_json(&dir.path().join("out.json")).unwrap();
        assert_eq!(packets.as_array().map(Vec::len), Some(4));
        assert!(!dir.path().join("errors.tsv").exists());
    }

    #[tokio::test]
    async fn test_merge_without_inputs_fails() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("errors.tsv");
        assert!(run_merge(PipelineConfig::default(), report).await.is_err());
    }

    #[test]
    fn test_unreadable_source_rows_reach_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut errors = Vec::new();
        let bytes = b"id\tstatus\n1\tok\n2\tbad\n3\tok\n".to_vec();
        let records = read_cohort(&StrictSource, Some(bytes), &mut errors).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].patient_id, "literature:row 2");

        let report = output::merge_error_report(&dir.path().join("combined.tsv"));
        assert_eq!(report, dir.path().join("combined_errors.tsv"));
        assert!(output::write_error_report(&errors, &report).unwrap());
        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.starts_with("ID\terror\nliterature:row 2\t"));
    }

    #[test]
    fn test_merge_errors_flag() {
        let cli = Cli::try_parse_from(["pavs", "merge", "--hospital", "h.tsv", "--errors", "bad.tsv"])
            .unwrap();
        match cli.command {
            Command::Merge { errors, hospital, .. } => {
                assert_eq!(errors, Some(PathBuf::from("bad.tsv")));
                assert_eq!(hospital, Some(PathBuf::from("h.tsv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
