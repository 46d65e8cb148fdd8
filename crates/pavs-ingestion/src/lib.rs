//! pavs-ingestion: case record normalisation and phenopacket assembly.
//! - Cohort source readers and the combined table
//! - Field normalisation and entity extraction (phenotypes, variants, identifiers)
//! - Multi-source HPO merge and deduplication
//! - Record assembly and phenopacket shaping
//! - Batch conversion with coverage reporting

pub mod assemble;
pub mod dedup;
pub mod merge;
pub mod models;
pub mod normalise;
pub mod ontology;
pub mod phenopacket;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use assemble::RecordAssembler;
pub use dedup::{HpoMerger, NlpAnnotations};
pub use merge::{merge_cohorts, Cohorts};
pub use models::{CanonicalRecord, DiseaseTerm, PhenotypeTerm, VariantCall};
pub use ontology::{HpoLabels, TermLookup};
pub use phenopacket::{to_phenopacket, MetaContext, Phenopacket};
pub use pipeline::{convert_batch, ConversionOutput};
pub use report::BatchSummary;
pub use sources::{CohortSource, SourceBatch};
