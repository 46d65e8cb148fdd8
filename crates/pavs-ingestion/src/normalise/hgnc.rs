//! HGNC gene symbol resolution.
//!
//! Reads an HGNC complete-set TSV and maps any approved, alias or previous
//! symbol to the canonical record. The table is optional: without it,
//! [`GeneResolver`] still produces a gene context with an `HGNC:<SYMBOL>` id.
//!
//! ```ignore
//! let hgnc = HgncTable::load("resources/hgnc_complete_set.txt")?;
//! let ctx = GeneResolver::new(Some(&hgnc)).resolve("K-RAS");
//! assert_eq!(ctx.value_id, "HGNC:6407");
//! ```

use std::collections::HashMap;
use std::path::Path;

use pavs_common::{PavsError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A canonical HGNC gene record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HgncRecord {
    /// HGNC accession, e.g. "HGNC:6407"
    pub hgnc_id: String,
    /// Approved symbol, e.g. "KRAS"
    pub symbol: String,
    pub name: String,
}

/// In-memory HGNC lookup. Build once; shared read-only.
#[derive(Debug, Default, Clone)]
pub struct HgncTable {
    /// Upper-cased symbol/alias/previous symbol → canonical record.
    lookup: HashMap<String, HgncRecord>,
    n_records: usize,
}

impl HgncTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PavsError::Ontology(format!("cannot read HGNC table {}: {e}", path.display()))
        })?;
        Self::from_tsv(&content)
    }

    /// Load if a path is configured; a broken table degrades to `None`.
    pub fn load_optional(path: Option<&str>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Could not load HGNC table: {e}. Gene ids fall back to symbols");
                None
            }
        }
    }

    /// Parse the TSV. Columns are located by header name, so column order and
    /// extra columns do not matter. Only `Approved` entries are kept.
    pub fn from_tsv(tsv: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_reader(tsv.as_bytes());

        let headers = reader.headers()?.clone();
        let col = |name: &str| headers.iter().position(|h| h.trim() == name);
        let (Some(id_col), Some(symbol_col)) = (col("hgnc_id"), col("symbol")) else {
            return Err(PavsError::Ontology(
                "HGNC table needs hgnc_id and symbol columns".to_string(),
            ));
        };
        let name_col = col("name");
        let status_col = col("status");
        let alias_col = col("alias_symbol");
        let prev_col = col("prev_symbol");

        let mut lookup: HashMap<String, HgncRecord> = HashMap::new();
        let mut n_records = 0usize;

        for row in reader.records() {
            let row = row?;
            let get = |i: Option<usize>| i.and_then(|i| row.get(i)).unwrap_or("").trim();

            let symbol = get(Some(symbol_col));
            if symbol.is_empty() { continue; }
            if status_col.is_some() && !get(status_col).contains("Approved") { continue; }

            let record = HgncRecord {
                hgnc_id: get(Some(id_col)).to_string(),
                symbol: symbol.to_string(),
                name: get(name_col).to_string(),
            };

            // Approved symbols win over aliases of other genes.
            lookup.insert(symbol.to_uppercase(), record.clone());
            let others = get(alias_col).split('|').chain(get(prev_col).split('|'));
            for other in others.map(str::trim).filter(|s| !s.is_empty()) {
                lookup.entry(other.to_uppercase()).or_insert_with(|| record.clone());
            }
            n_records += 1;
        }

        info!("HGNC table built: {} records, {} lookup entries", n_records, lookup.len());
        Ok(Self { lookup, n_records })
    }

    /// Case-insensitive lookup by any known symbol.
    pub fn lookup(&self, symbol: &str) -> Option<&HgncRecord> {
        self.lookup.get(&symbol.trim().to_uppercase())
    }

    pub fn n_records(&self) -> usize { self.n_records }
}

/// Gene context attached to a variant descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneContext {
    pub value_id: String,
    pub symbol: String,
}

/// Turns extracted gene symbols into gene contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneResolver<'a> {
    table: Option<&'a HgncTable>,
}

impl<'a> GeneResolver<'a> {
    pub fn new(table: Option<&'a HgncTable>) -> Self {
        Self { table }
    }

    pub fn resolve(&self, symbol: &str) -> GeneContext {
        match self.table.and_then(|t| t.lookup(symbol)) {
            Some(rec) => GeneContext { value_id: rec.hgnc_id.clone(), symbol: rec.symbol.clone() },
            None => {
                let symbol = symbol.trim().to_string();
                GeneContext { value_id: format!("HGNC:{symbol}"), symbol }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal synthetic HGNC TSV.
    fn sample_tsv() -> String {
        let header = "hgnc_id\tsymbol\tname\tlocus_group\tlocus_type\tstatus\talias_symbol\tprev_symbol";
        let kras = "HGNC:6407\tKRAS\tKRAS proto-oncogene, GTPase\tprotein-coding gene\tgene with protein product\tApproved\tK-RAS|KRAS2\tKI-RAS|C-K-RAS";
        let brca1 = "HGNC:1100\tBRCA1\tBRCA1 DNA repair associated\tprotein-coding gene\tgene with protein product\tApproved\tRNF53\tBRCC1";
        let gone = "HGNC:9999\tOLDGENE\twithdrawn\t\t\tEntry Withdrawn\t\t";
        format!("{header}\n{kras}\n{brca1}\n{gone}\n")
    }

    #[test]
    fn test_lookup_symbol_alias_prev() {
        let t = HgncTable::from_tsv(&sample_tsv()).unwrap();
        assert_eq!(t.n_records(), 2);
        assert_eq!(t.lookup("KRAS").unwrap().hgnc_id, "HGNC:6407");
        assert_eq!(t.lookup("k-ras").unwrap().symbol, "KRAS");
        assert_eq!(t.lookup("BRCC1").unwrap().symbol, "BRCA1");
        assert!(t.lookup("OLDGENE").is_none());
    }

    #[test]
    fn test_missing_columns_rejected() {
        assert!(HgncTable::from_tsv("foo\tbar\n1\t2\n").is_err());
    }

    #[test]
    fn test_resolver_with_and_without_table() {
        let t = HgncTable::from_tsv(&sample_tsv()).unwrap();
        let ctx = GeneResolver::new(Some(&t)).resolve("RNF53");
        assert_eq!(ctx, GeneContext { value_id: "HGNC:1100".into(), symbol: "BRCA1".into() });

        let ctx = GeneResolver::new(None).resolve("TP53");
        assert_eq!(ctx.value_id, "HGNC:TP53");
        assert_eq!(ctx.symbol, "TP53");
    }

    #[test]
    fn test_load_optional_degrades() {
        assert!(HgncTable::load_optional(None).is_none());
        assert!(HgncTable::load_optional(Some("/no/such/hgnc.txt")).is_none());
    }
}
