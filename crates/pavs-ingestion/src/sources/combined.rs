//! The combined 18-column table shared by `merge` and `convert`.

use std::io;

use pavs_common::{CaseRecord, Result, RowError};
use tracing::{info, warn};

use super::{decode_text, SourceBatch};

/// Read a combined TSV. Rows that do not fit the schema are reported, not fatal.
pub fn read_combined(bytes: &[u8]) -> Result<SourceBatch> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut batch = SourceBatch::default();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                batch.errors.push(RowError::new(row, format!("row {}", row + 1), e.to_string()));
                continue;
            }
        };
        match record.deserialize::<CaseRecord>(Some(&headers)) {
            Ok(rec) => batch.records.push(rec),
            Err(e) => {
                let patient_id = record.get(0).filter(|s| !s.is_empty()).unwrap_or("unknown");
                warn!(patient_id, error = %e, "Skipping malformed combined row");
                batch.errors.push(RowError::new(row, patient_id, e.to_string()));
            }
        }
    }
    info!(n = batch.len(), errors = batch.errors.len(), "Combined table read");
    Ok(batch)
}

/// Write records in the common column order; absent values as `Not reported`.
pub fn write_combined<W: io::Write>(records: &[CaseRecord], writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for rec in records {
        out.serialize(rec)?;
    }
    out.flush()?;
    Ok(())
}

/// `ID\tphenotypes` input for the external annotator: each cohort's
/// records with their ids prefixed. Absent phenotypes are written empty.
pub fn write_annotation_input<W: io::Write>(
    cohorts: &[(&str, &[CaseRecord])],
    writer: W,
) -> Result<usize> {
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    out.write_record(["ID", "phenotypes"])?;
    let mut n = 0;
    for (prefix, records) in cohorts {
        for rec in records.iter() {
            let id = format!("{prefix}{}", rec.id);
            out.write_record([id.as_str(), rec.phenotypic_features.as_deref().unwrap_or("")])?;
            n += 1;
        }
    }
    out.flush()?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavs_common::entities::COMMON_COLUMNS;
    use pavs_common::{FieldValue, SourceType};
    use pretty_assertions::assert_eq;

    fn sample() -> CaseRecord {
        let mut rec = CaseRecord::new("PAVS1", SourceType::Literature);
        rec.sex = "Male".into();
        rec.phenotypic_features = "Seizures (HP:0001250)".into();
        rec.phenotypic_feature_ids = "HP:0001250".into();
        rec.genomic_variants = "BRCA1:c.123A>G".into();
        rec
    }

    #[test]
    fn test_write_then_read_keeps_schema() {
        let mut buf = Vec::new();
        write_combined(&[sample()], &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().next().unwrap(), COMMON_COLUMNS.join("\t"));
        assert!(text.contains("\tNot reported\t"));

        let batch = read_combined(&buf).unwrap();
        assert!(batch.errors.is_empty());
        assert_eq!(batch.records, vec![sample()]);
    }

    #[test]
    fn test_bad_row_reported_by_id() {
        let header = COMMON_COLUMNS.join("\t");
        let good = "PAVS1\tMale\t\t\t\t\t\t\t\t\t\t\t\t\t\t\tliterature\t";
        let data = format!("{header}\n{good}\nPAVS2\tFemale\n");
        let batch = read_combined(data.as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records[0].age, FieldValue::NotReported);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].patient_id, "PAVS2");
    }

    #[test]
    fn test_annotation_input_prefixes_ids() {
        let mut lit = CaseRecord::new("1", SourceType::Literature);
        lit.phenotypic_features = "Seizures".into();
        let clit = CaseRecord::new("1", SourceType::ClinicalLiterature);
        let mut buf = Vec::new();
        let n = write_annotation_input(
            &[("LIT_", std::slice::from_ref(&lit)), ("CLIT_", std::slice::from_ref(&clit))],
            &mut buf,
        )
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(buf).unwrap(), "ID\tphenotypes\nLIT_1\tSeizures\nCLIT_1\t\n");
    }
}
