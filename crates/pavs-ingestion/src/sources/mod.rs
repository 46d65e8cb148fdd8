//! Cohort source readers.
//!
//! Each cohort export has its own column layout. A [`CohortSource`] maps one
//! cleaned row onto the common [`CaseRecord`] schema; the shared
//! [`CohortSource::read`] drives decoding, cleaning, filtering and
//! renumbering so every cohort is ingested the same way.

pub mod clinical_literature;
pub mod combined;
pub mod hospital;
pub mod literature;
pub mod table;

use pavs_common::{CaseRecord, PavsError, Result, RowError, SourceType};
use tracing::{info, warn};

use crate::normalise::phenotype::scan_hpo_ids;
pub use clinical_literature::ClinicalLiteratureSource;
pub use hospital::HospitalCollaboratorSource;
pub use literature::LiteratureSource;
pub use table::{decode_text, RawRow, RawTable};

/// Records ingested from one file plus the rows that could not be read.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<CaseRecord>,
    pub errors: Vec<RowError>,
}

impl SourceBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Common interface for the cohort export readers.
pub trait CohortSource: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Columns that must be present in the header.
    fn required_columns(&self) -> &[&str];

    /// Map one row. `id` is the row's position-based patient number.
    /// `Ok(None)` filters the row out.
    fn map_row(&self, row: &RawRow<'_>, id: usize) -> Result<Option<CaseRecord>>;

    /// Decode and map a whole export. Patients are renumbered `1..N` after
    /// filtering; `phenotypicFeatureIds` is seeded with the `HP:` ids found
    /// in the phenotype text.
    fn read(&self, bytes: &[u8]) -> Result<SourceBatch> {
        let text = decode_text(bytes);
        let (table, mut errors) = RawTable::parse(&text)?;

        if let Some(missing) = self.required_columns().iter().find(|c| !table.has_column(c)) {
            return Err(PavsError::Pipeline(format!(
                "{} export is missing column {missing:?}",
                self.source_type()
            )));
        }

        let mut records = Vec::with_capacity(table.len());
        for (row_no, row) in table.rows().enumerate() {
            let next_id = records.len() + 1;
            match self.map_row(&row, next_id) {
                Ok(Some(mut rec)) => {
                    let ids = rec
                        .phenotypic_features
                        .as_deref()
                        .map(scan_hpo_ids)
                        .unwrap_or_default();
                    rec.phenotypic_feature_ids = ids.join(",").into();
                    records.push(rec);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(source = %self.source_type(), row = row_no + 1, error = %e, "Skipping row");
                    errors.push(RowError::new(row_no, format!("row {}", row_no + 1), e.to_string()));
                }
            }
        }

        info!(
            source = %self.source_type(),
            n = records.len(),
            errors = errors.len(),
            "Cohort export read"
        );
        Ok(SourceBatch { records, errors })
    }
}
