//! Field normalisation and entity extraction.
//!
//! - `fields`: delimiter and whitespace canonicalisation
//! - `phenotype`: HPO / OMIM / free-text classification of phenotype terms
//! - `variant`: decomposition of variant segments into expressions
//! - `hgvs`: strict HGVS parsing with fail-open canonicalisation
//! - `identifiers`: OMIM, gene, ACMG, zygosity, sex and age extractors
//! - `hgnc`: optional HGNC symbol resolution

pub mod fields;
pub mod hgnc;
pub mod hgvs;
pub mod identifiers;
pub mod phenotype;
pub mod variant;

pub use fields::{split_field, split_text, DelimiterSet};
pub use hgnc::{GeneContext, GeneResolver, HgncRecord, HgncTable};
pub use hgvs::{Canonicalized, GrammarParser, HgvsError, HgvsParser, ParsedHgvs, VariantCanonicalizer};
pub use identifiers::{AcmgClass, Sex, Zygosity};
pub use phenotype::{PhenotypeAnnotation, PhenotypeExtractor};
pub use variant::{NotationKind, VariantExpression};
