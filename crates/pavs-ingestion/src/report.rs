//! Batch coverage summary: the data-quality signal printed after every run.

use std::fmt;

use serde::Serialize;

use crate::models::CanonicalRecord;
use crate::normalise::identifiers::Sex;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub converted: usize,
    pub errored: usize,

    pub with_sex: usize,
    pub with_age: usize,

    pub with_phenotypes: usize,
    pub total_features: usize,
    pub labelled_features: usize,

    pub with_variants: usize,
    pub total_variants: usize,
    pub variants_with_gene: usize,
    pub total_notations: usize,
    pub parsed_notations: usize,

    pub with_diseases: usize,
    pub diseases_with_omim: usize,

    pub duration_ms: u64,
}

/// Share of `n` in `of` as a percentage; 0 when `of` is 0.
pub fn pct(n: usize, of: usize) -> f64 {
    if of == 0 { 0.0 } else { n as f64 * 100.0 / of as f64 }
}

impl BatchSummary {
    pub fn from_records(total_rows: usize, records: &[CanonicalRecord], errored: usize) -> Self {
        let mut s = Self { total_rows, converted: records.len(), errored, ..Default::default() };
        for r in records {
            s.with_sex += usize::from(r.sex != Sex::UnknownSex);
            s.with_age += usize::from(r.age.is_some());
            s.with_phenotypes += usize::from(!r.phenotypes.is_empty());
            s.total_features += r.phenotypes.len();
            s.labelled_features += r.labelled_phenotypes();
            s.with_variants += usize::from(!r.variants.is_empty());
            s.total_variants += r.variants.len();
            s.variants_with_gene += r.variants_with_gene();
            for v in &r.variants {
                s.total_notations += v.parsed + v.opaque;
                s.parsed_notations += v.parsed;
            }
            s.with_diseases += usize::from(!r.diseases.is_empty());
            s.diseases_with_omim += usize::from(r.has_omim_disease());
        }
        s
    }

    pub fn phenotype_coverage(&self) -> f64 {
        pct(self.with_phenotypes, self.converted)
    }

    pub fn gene_coverage(&self) -> f64 {
        pct(self.variants_with_gene, self.total_variants)
    }

    pub fn omim_coverage(&self) -> f64 {
        pct(self.diseases_with_omim, self.with_diseases)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.converted;
        writeln!(f, "Conversion summary")?;
        writeln!(f, "  Rows processed:        {}", self.total_rows)?;
        writeln!(f, "  Phenopackets written:  {}", n)?;
        writeln!(f, "  Rows with errors:      {}", self.errored)?;
        writeln!(f, "Subject")?;
        writeln!(f, "  With sex:              {} ({:.1}%)", self.with_sex, pct(self.with_sex, n))?;
        writeln!(f, "  With age:              {} ({:.1}%)", self.with_age, pct(self.with_age, n))?;
        writeln!(f, "Phenotypic features")?;
        writeln!(f, "  Cases with phenotypes: {} ({:.1}%)", self.with_phenotypes, self.phenotype_coverage())?;
        writeln!(
            f,
            "  Features with labels:  {}/{} ({:.1}%)",
            self.labelled_features,
            self.total_features,
            pct(self.labelled_features, self.total_features)
        )?;
        writeln!(f, "Genomic variants")?;
        writeln!(f, "  Cases with variants:   {} ({:.1}%)", self.with_variants, pct(self.with_variants, n))?;
        writeln!(
            f,
            "  With gene symbols:     {}/{} ({:.1}%)",
            self.variants_with_gene,
            self.total_variants,
            self.gene_coverage()
        )?;
        writeln!(
            f,
            "  Canonical notations:   {}/{} ({:.1}%)",
            self.parsed_notations,
            self.total_notations,
            pct(self.parsed_notations, self.total_notations)
        )?;
        writeln!(f, "Diseases")?;
        writeln!(f, "  Cases with diagnosis:  {} ({:.1}%)", self.with_diseases, pct(self.with_diseases, n))?;
        write!(
            f,
            "  With OMIM ids:         {}/{} ({:.1}%)",
            self.diseases_with_omim,
            self.with_diseases,
            self.omim_coverage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_of_zero() {
        assert_eq!(pct(3, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_empty_summary_renders() {
        let s = BatchSummary::from_records(2, &[], 2);
        let text = s.to_string();
        assert!(text.contains("Rows with errors:      2"));
        assert!(text.contains("With gene symbols:     0/0 (0.0%)"));
    }
}
