//! Batch conversion.
//!
//! Assembles every row of a combined table, isolating failures at the row
//! boundary: a row that cannot be assembled is recorded in the error report
//! and the batch continues. Output is sorted by patient id, so it does not
//! depend on processing order.

use std::collections::HashSet;
use std::time::Instant;

use pavs_common::{CaseRecord, PavsError, RowError};
use tracing::{info, instrument, warn};

use crate::assemble::RecordAssembler;
use crate::models::CanonicalRecord;
use crate::phenopacket::{to_phenopacket, MetaContext, Phenopacket};
use crate::report::BatchSummary;

/// Result of converting one batch.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub records: Vec<CanonicalRecord>,
    pub errors: Vec<RowError>,
    pub summary: BatchSummary,
}

impl ConversionOutput {
    pub fn phenopackets(&self, meta: &MetaContext) -> Vec<Phenopacket> {
        self.records.iter().map(|r| to_phenopacket(r, meta)).collect()
    }
}

/// Sort key that orders `PAVS2` before `PAVS10`. Digit runs compare by
/// length once leading zeros are dropped, then lexically, so runs of any
/// length order numerically.
pub fn natural_key(id: &str) -> (String, usize, String, String) {
    let prefix_end = id.find(|c: char| c.is_ascii_digit()).unwrap_or(id.len());
    let (prefix, rest) = id.split_at(prefix_end);
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(digits_end);
    let significant = digits.trim_start_matches('0');
    (prefix.to_string(), significant.len(), significant.to_string(), tail.to_string())
}

/// Convert a batch of combined-table rows.
#[instrument(skip(cases, assembler), fields(n = cases.len()))]
pub fn convert_batch(cases: &[CaseRecord], assembler: &RecordAssembler<'_>) -> ConversionOutput {
    let start = Instant::now();
    let mut records = Vec::with_capacity(cases.len());
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (row, case) in cases.iter().enumerate() {
        let result = assembler.assemble(case).and_then(|rec| {
            if seen.insert(rec.id.clone()) {
                Ok(rec)
            } else {
                Err(PavsError::DuplicatePatient(rec.id))
            }
        });
        match result {
            Ok(rec) => records.push(rec),
            Err(e) => {
                warn!(patient_id = %case.id, row, error = %e, "Row excluded from output");
                errors.push(RowError::new(row, case.id.clone(), e.to_string()));
            }
        }
    }

    records.sort_by_cached_key(|r| natural_key(&r.id));

    let mut summary = BatchSummary::from_records(cases.len(), &records, errors.len());
    summary.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        converted = summary.converted,
        errored = summary.errored,
        phenotype_coverage = format!("{:.1}%", summary.phenotype_coverage()),
        gene_coverage = format!("{:.1}%", summary.gene_coverage()),
        omim_coverage = format!("{:.1}%", summary.omim_coverage()),
        "Batch converted"
    );

    ConversionOutput { records, errors, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::HpoLabels;
    use pavs_common::config::NormaliseConfig;
    use pavs_common::SourceType;

    #[test]
    fn test_natural_key_orders_numeric_suffix() {
        let mut ids = vec!["PAVS10", "PAVS2", "PAVS1", "ABC"];
        ids.sort_by_key(|id| natural_key(id));
        assert_eq!(ids, vec!["ABC", "PAVS1", "PAVS2", "PAVS10"]);
    }

    #[test]
    fn test_natural_key_handles_long_digit_runs() {
        let mut ids = vec![
            "PAVS100000000000000000000",
            "PAVS99999999999999999999",
            "PAVS3",
            "PAVS007",
        ];
        ids.sort_by_key(|id| natural_key(id));
        assert_eq!(
            ids,
            vec!["PAVS3", "PAVS007", "PAVS99999999999999999999", "PAVS100000000000000000000"]
        );
    }

    #[test]
    fn test_failing_rows_reported_and_skipped() {
        let lookup = HpoLabels::empty();
        let assembler = RecordAssembler::new(&lookup, &NormaliseConfig::default());
        let cases = vec![
            CaseRecord::new("PAVS2", SourceType::Literature),
            CaseRecord::new("", SourceType::Literature),
            CaseRecord::new("PAVS1", SourceType::Literature),
            CaseRecord::new("PAVS2", SourceType::Literature),
        ];
        let out = convert_batch(&cases, &assembler);

        let ids: Vec<_> = out.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["PAVS1", "PAVS2"]);
        assert_eq!(out.errors.len(), 2);
        assert_eq!(out.errors[0].row, 1);
        assert_eq!(out.errors[1].patient_id, "PAVS2");
        assert!(out.errors[1].message.contains("Duplicate"));
        assert_eq!((out.summary.total_rows, out.summary.converted, out.summary.errored), (4, 2, 2));
    }
}
