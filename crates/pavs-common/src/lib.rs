//! pavs-common: shared record types, errors and configuration used across all PAVS crates.

pub mod error;
pub mod entities;
pub mod config;

// Re-export commonly used types
pub use config::{LabelPolicy, OutputFormat, PipelineConfig};
pub use entities::{CaseRecord, FieldValue, RowError, SourceType, NOT_REPORTED};
pub use error::{PavsError, Result};
