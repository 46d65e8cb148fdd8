//! Variant expression splitting.
//!
//! A variants field holds distinct variants separated by `;` or `|`. Each
//! segment describes one variant, possibly in several notations joined by `,`
//! (e.g. `g.43045712A>G,p.Arg41Gly`). A segment always becomes exactly one
//! [`VariantExpression`]; alternate notations fill its notation slots.
//!
//! Pieces containing `:` are split into at most three components. The first
//! component may be a gene symbol, a transcript (`NM_`, `NR_`) or a reference
//! sequence (`NC_`, `chr`); later components are transcripts or notations.

use pavs_common::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalise::fields::{split_field, DelimiterSet};

const TRANSCRIPT_PREFIXES: &[&str] = &["NM_", "NR_"];
const REFERENCE_PREFIXES: &[&str] = &["NC_", "chr", "CHR", "Chr"];

/// Coordinate system of a notation, from its leading prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotationKind {
    /// `c.`
    Coding,
    /// `g.`
    Genomic,
    /// `p.`
    Protein,
    /// `n.`
    NonCoding,
    /// `r.`
    Rna,
    /// `m.`
    Mitochondrial,
    /// No recognised prefix.
    Other,
}

impl NotationKind {
    pub fn from_text(text: &str) -> Self {
        let t = text.trim_start();
        match t.get(..2) {
            Some("c.") => NotationKind::Coding,
            Some("g.") => NotationKind::Genomic,
            Some("p.") => NotationKind::Protein,
            Some("n.") => NotationKind::NonCoding,
            Some("r.") => NotationKind::Rna,
            Some("m.") => NotationKind::Mitochondrial,
            _ => NotationKind::Other,
        }
    }

    /// Expression syntax label used in phenopacket output.
    pub fn syntax(&self) -> &'static str {
        match self {
            NotationKind::Coding    => "hgvs.c",
            NotationKind::Genomic   => "hgvs.g",
            NotationKind::Protein   => "hgvs.p",
            NotationKind::NonCoding => "hgvs.n",
            NotationKind::Rna       => "hgvs.r",
            NotationKind::Mitochondrial => "hgvs.m",
            NotationKind::Other     => "hgvs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotationKind::Coding    => "coding",
            NotationKind::Genomic   => "genomic",
            NotationKind::Protein   => "protein",
            NotationKind::NonCoding => "non_coding",
            NotationKind::Rna       => "rna",
            NotationKind::Mitochondrial => "mitochondrial",
            NotationKind::Other     => "other",
        }
    }
}

/// One notation slot of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notation {
    pub kind: NotationKind,
    pub text: String,
}

impl Notation {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { kind: NotationKind::from_text(&text), text }
    }
}

/// One logical variant, possibly written in several notations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantExpression {
    pub gene: Option<String>,
    pub transcript: Option<String>,
    /// Genomic reference sequence such as `NC_000017.11` or `chr17`.
    pub reference: Option<String>,
    pub notations: Vec<Notation>,
    /// Segment exactly as it appeared in the input.
    pub raw: String,
}

impl VariantExpression {
    /// Kind of the leading notation, or `Other` when there is none.
    pub fn kind(&self) -> NotationKind {
        self.notations.first().map(|n| n.kind).unwrap_or(NotationKind::Other)
    }

    /// First notation of the given kind.
    pub fn notation(&self, kind: NotationKind) -> Option<&Notation> {
        self.notations.iter().find(|n| n.kind == kind)
    }

    /// Notation texts joined with `,`.
    pub fn notation_text(&self) -> String {
        self.notations.iter().map(|n| n.text.as_str()).collect::<Vec<_>>().join(",")
    }

    /// A notation prefixed with the accession it is relative to, if any:
    /// transcripts for `c.`/`n.`/`r.`, the reference sequence for `g.`/`m.`.
    pub fn qualified(&self, notation: &Notation) -> String {
        let accession = match notation.kind {
            NotationKind::Coding | NotationKind::NonCoding | NotationKind::Rna => {
                self.transcript.as_deref()
            }
            NotationKind::Genomic | NotationKind::Mitochondrial => self.reference.as_deref(),
            NotationKind::Protein | NotationKind::Other => None,
        };
        match accession {
            Some(ac) => format!("{ac}:{}", notation.text),
            None => notation.text.clone(),
        }
    }
}

impl fmt::Display for VariantExpression {
    /// `GENE:TRANSCRIPT:notation,notation` with absent parts left out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(g) = &self.gene { parts.push(g); }
        if let Some(r) = &self.reference { parts.push(r); }
        if let Some(t) = &self.transcript { parts.push(t); }
        let notations = self.notation_text();
        if !notations.is_empty() { parts.push(&notations); }
        if parts.is_empty() {
            f.write_str(&self.raw)
        } else {
            f.write_str(&parts.join(":"))
        }
    }
}

/// Split a variants field into one expression per distinct variant.
pub fn split_variants(field: &FieldValue, delimiters: &DelimiterSet) -> Vec<VariantExpression> {
    split_field(field, delimiters)
        .iter()
        .map(|segment| split_segment(segment))
        .collect()
}

/// Render expressions back to a field: variants joined by `;`, alternate
/// notations of one variant joined by `,`.
pub fn join_variants(expressions: &[VariantExpression]) -> String {
    expressions.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(";")
}

/// Decompose one variant segment.
pub fn split_segment(segment: &str) -> VariantExpression {
    let mut expr = VariantExpression {
        gene: None,
        transcript: None,
        reference: None,
        notations: Vec::new(),
        raw: segment.trim().to_string(),
    };

    let pieces = segment
        .split([',', ';'])
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for piece in pieces {
        if piece.contains(':') {
            for (pos, component) in piece.splitn(3, ':').map(str::trim).enumerate() {
                if !component.is_empty() {
                    classify_component(&mut expr, component, pos == 0);
                }
            }
        } else {
            classify_component(&mut expr, piece, false);
        }
    }
    expr
}

fn classify_component(expr: &mut VariantExpression, component: &str, first: bool) {
    if has_prefix(component, TRANSCRIPT_PREFIXES) {
        expr.transcript.get_or_insert_with(|| component.to_string());
        return;
    }
    if NotationKind::from_text(component) != NotationKind::Other {
        expr.notations.push(Notation::new(component));
        return;
    }
    if first {
        if has_prefix(component, REFERENCE_PREFIXES) {
            expr.reference.get_or_insert_with(|| component.to_string());
            return;
        }
        if looks_like_symbol(component) {
            expr.gene.get_or_insert_with(|| component.to_string());
            return;
        }
    }
    expr.notations.push(Notation::new(component));
}

fn has_prefix(s: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| s.starts_with(p))
}

/// Single token of letters, digits, `-` and `.` starting with a letter.
fn looks_like_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gene_transcript_notation() {
        let e = split_segment("BRCA1:NM_007294.3:c.5266dupC");
        assert_eq!(e.gene.as_deref(), Some("BRCA1"));
        assert_eq!(e.transcript.as_deref(), Some("NM_007294.3"));
        assert_eq!(e.notations, vec![Notation::new("c.5266dupC")]);
        assert_eq!(e.kind(), NotationKind::Coding);
    }

    #[test]
    fn test_transcript_first() {
        let e = split_segment("NM_000492.4:c.1521_1523del");
        assert!(e.gene.is_none());
        assert_eq!(e.transcript.as_deref(), Some("NM_000492.4"));
        assert_eq!(e.kind(), NotationKind::Coding);
    }

    #[test]
    fn test_reference_prefix_is_not_gene() {
        let e = split_segment("chr17:g.43045712A>G");
        assert!(e.gene.is_none());
        assert_eq!(e.reference.as_deref(), Some("chr17"));
        assert_eq!(e.kind(), NotationKind::Genomic);

        let e = split_segment("NC_000017.11:g.43045712A>G");
        assert!(e.gene.is_none());
        assert_eq!(e.reference.as_deref(), Some("NC_000017.11"));
    }

    #[test]
    fn test_mitochondrial_notation() {
        let e = split_segment("NC_012920.1:m.3243A>G");
        assert_eq!(e.reference.as_deref(), Some("NC_012920.1"));
        assert_eq!(e.kind(), NotationKind::Mitochondrial);
        assert_eq!(e.kind().syntax(), "hgvs.m");
        assert_eq!(e.qualified(&e.notations[0]), "NC_012920.1:m.3243A>G");
    }

    #[test]
    fn test_alternate_notations_share_one_expression() {
        let e = split_segment("g.43045712A>G,p.Arg41Gly");
        assert_eq!(e.notations.len(), 2);
        assert_eq!(e.notations[0].kind, NotationKind::Genomic);
        assert_eq!(e.notations[1].kind, NotationKind::Protein);
        assert_eq!(e.notation_text(), "g.43045712A>G,p.Arg41Gly");
    }

    #[test]
    fn test_alternates_after_colon_split() {
        let e = split_segment("PAH:NM_000277.3:c.1222C>T,p.Arg408Trp");
        assert_eq!(e.gene.as_deref(), Some("PAH"));
        assert_eq!(e.notation_text(), "c.1222C>T,p.Arg408Trp");
        assert_eq!(e.to_string(), "PAH:NM_000277.3:c.1222C>T,p.Arg408Trp");
    }

    #[test]
    fn test_no_colon_single_expression_tagged() {
        assert_eq!(split_segment("c.123A>G").kind(), NotationKind::Coding);
        assert_eq!(split_segment("p.Arg175His").kind(), NotationKind::Protein);
        assert_eq!(split_segment("n.45del").kind(), NotationKind::NonCoding);
        assert_eq!(split_segment("r.76a>c").kind(), NotationKind::Rna);
        assert_eq!(split_segment("m.3243A>G").kind(), NotationKind::Mitochondrial);
        assert_eq!(split_segment("exon 2 deletion").kind(), NotationKind::Other);
    }

    #[test]
    fn test_distinct_variants_split_on_semicolon() {
        let field = FieldValue::from("BRCA1:c.123A>G; TP53:p.Arg175His | c.5G>T,p.Gly2Val");
        let exprs = split_variants(&field, &DelimiterSet::variant());
        assert_eq!(exprs.len(), 3);
        assert_eq!(exprs[2].notations.len(), 2);
        assert_eq!(
            join_variants(&exprs),
            "BRCA1:c.123A>G;TP53:p.Arg175His;c.5G>T,p.Gly2Val"
        );
    }

    #[test]
    fn test_not_reported_has_no_variants() {
        assert!(split_variants(&FieldValue::NotReported, &DelimiterSet::variant()).is_empty());
    }

    #[test]
    fn test_qualified_notation() {
        let e = split_segment("BRCA1:NM_007294.3:c.123A>G,p.Arg41Gly");
        assert_eq!(e.qualified(&e.notations[0]), "NM_007294.3:c.123A>G");
        assert_eq!(e.qualified(&e.notations[1]), "p.Arg41Gly");
    }
}
