//! Phenopacket and error-report writers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pavs_common::{OutputFormat, RowError};
use pavs_ingestion::Phenopacket;
use tracing::info;

/// `<stem>_individual/` next to `path`.
pub fn individual_dir(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("phenopackets");
    path.with_file_name(format!("{stem}_individual"))
}

/// `<stem>_errors.tsv` next to the combined table, for rows the cohort
/// readers could not map.
pub fn merge_error_report(combined: &Path) -> PathBuf {
    let stem = combined.file_stem().and_then(|s| s.to_str()).unwrap_or("combined");
    combined.with_file_name(format!("{stem}_errors.tsv"))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write phenopackets in `format`. Returns the file or directory written.
pub fn write_phenopackets(packets: &[Phenopacket], format: OutputFormat, path: &Path) -> Result<PathBuf> {
    match format {
        OutputFormat::Json => {
            let mut out = create(path)?;
            serde_json::to_writer_pretty(&mut out, packets)?;
            out.flush()?;
            info!(n = packets.len(), path = %path.display(), "Wrote phenopacket array");
            Ok(path.to_path_buf())
        }
        OutputFormat::JsonLines => {
            let mut out = create(path)?;
            for pp in packets {
                serde_json::to_writer(&mut out, pp)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
            info!(n = packets.len(), path = %path.display(), "Wrote phenopacket lines");
            Ok(path.to_path_buf())
        }
        OutputFormat::Individual => {
            let dir = individual_dir(path);
            fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
            for pp in packets {
                let mut out = create(&dir.join(format!("{}.json", pp.id)))?;
                serde_json::to_writer_pretty(&mut out, pp)?;
                out.flush()?;
            }
            info!(n = packets.len(), dir = %dir.display(), "Wrote individual phenopackets");
            Ok(dir)
        }
    }
}

/// `ID\terror` report. Nothing is written when there are no errors.
pub fn write_error_report(errors: &[RowError], path: &Path) -> Result<bool> {
    if errors.is_empty() {
        return Ok(false);
    }
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_writer(create(path)?);
    for e in errors {
        out.serialize(e)?;
    }
    out.flush()?;
    info!(n = errors.len(), path = %path.display(), "Wrote error report");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavs_common::{PipelineConfig, SourceType};
    use pavs_ingestion::{convert_batch, HpoLabels, MetaContext, RecordAssembler};
    use pavs_test_utils::{read_json, CaseBuilder};
    use pretty_assertions::assert_eq;

    fn packets() -> Vec<Phenopacket> {
        let config = PipelineConfig::default();
        let labels = HpoLabels::empty();
        let assembler = RecordAssembler::new(&labels, &config.normalise);
        let cases = vec![
            CaseBuilder::new("PAVS1").sex("F").build(),
            CaseBuilder::new("PAVS2").source(SourceType::ClinicalLiterature).build(),
        ];
        convert_batch(&cases, &assembler).phenopackets(&MetaContext::now(&config))
    }

    #[test]
    fn test_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/packets.json");
        write_phenopackets(&packets(), OutputFormat::Json, &path).unwrap();
        let value = read_json(&path).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["subject"]["sex"], "FEMALE");
    }

    #[test]
    fn test_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.jsonl");
        write_phenopackets(&packets(), OutputFormat::JsonLines, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let ids: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["id"].to_string())
            .collect();
        assert_eq!(ids, vec!["\"PAVS1\"", "\"PAVS2\""]);
    }

    #[test]
    fn test_individual_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packets.json");
        let written = write_phenopackets(&packets(), OutputFormat::Individual, &path).unwrap();
        assert_eq!(written, dir.path().join("packets_individual"));
        let second = read_json(&written.join("PAVS2.json")).unwrap();
        assert_eq!(second["metaData"]["pavsData"]["dataSourceType"], "clinical_literature");
    }

    #[test]
    fn test_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.tsv");
        assert!(!write_error_report(&[], &path).unwrap());
        assert!(!path.exists());

        let errors = vec![RowError::new(3, "PAVS4", "Missing required field `ID`")];
        assert!(write_error_report(&errors, &path).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ID\terror\nPAVS4\tMissing required field `ID`\n"
        );
    }
}
