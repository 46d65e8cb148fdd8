//! HGVS notation canonicalisation.
//!
//! [`GrammarParser`] is a strict parser for the common subset of HGVS:
//! nucleotide substitutions, deletions, duplications, insertions, delins,
//! inversions and identity on `c.`/`g.`/`n.`/`r.` coordinates, and protein
//! substitutions, indels and frameshifts on `p.`. Its canonical form uses
//! three-letter amino acids, `Ter` for stop codons, upper-case DNA bases and
//! lower-case RNA bases, and parses back to itself.
//!
//! [`VariantCanonicalizer`] wraps any [`HgvsParser`] and never fails: a
//! notation that does not parse is kept verbatim as an opaque description.
//!
//! # Example
//! ```ignore
//! let canon = VariantCanonicalizer::new();
//! assert_eq!(canon.canonicalize("p.R175H").text(), "p.Arg175His");
//! assert!(!canon.canonicalize("exon 2 deletion").is_parsed());
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalise::variant::{Notation, NotationKind, VariantExpression};

/// Single-letter → three-letter amino acid map.
fn aa1_to_aa3(aa: &str) -> Option<&'static str> {
    match aa {
        "A" => Some("Ala"), "C" => Some("Cys"), "D" => Some("Asp"),
        "E" => Some("Glu"), "F" => Some("Phe"), "G" => Some("Gly"),
        "H" => Some("His"), "I" => Some("Ile"), "K" => Some("Lys"),
        "L" => Some("Leu"), "M" => Some("Met"), "N" => Some("Asn"),
        "P" => Some("Pro"), "Q" => Some("Gln"), "R" => Some("Arg"),
        "S" => Some("Ser"), "T" => Some("Thr"), "V" => Some("Val"),
        "W" => Some("Trp"), "Y" => Some("Tyr"), "*" | "X" => Some("Ter"),
        _ => None,
    }
}

/// Three-letter amino acid name → three-letter (title-case) canonical form.
fn normalise_aa3(aa: &str) -> Option<&'static str> {
    match aa.to_lowercase().as_str() {
        "ala" => Some("Ala"), "cys" => Some("Cys"), "asp" => Some("Asp"),
        "glu" => Some("Glu"), "phe" => Some("Phe"), "gly" => Some("Gly"),
        "his" => Some("His"), "ile" => Some("Ile"), "lys" => Some("Lys"),
        "leu" => Some("Leu"), "met" => Some("Met"), "asn" => Some("Asn"),
        "pro" => Some("Pro"), "gln" => Some("Gln"), "arg" => Some("Arg"),
        "ser" => Some("Ser"), "thr" => Some("Thr"), "val" => Some("Val"),
        "trp" => Some("Trp"), "tyr" => Some("Tyr"), "ter" => Some("Ter"),
        "sec" => Some("Sec"),
        _ => None,
    }
}

// ── Parsed form ───────────────────────────────────────────────────────────────

/// Why a notation did not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HgvsError {
    #[error("empty notation")]
    Empty,

    #[error("no recognised coordinate prefix in {0:?}")]
    UnknownPrefix(String),

    #[error("cannot parse location in {0:?}")]
    Location(String),

    #[error("unrecognised edit {0:?}")]
    Edit(String),

    #[error("invalid residue or base in {0:?}")]
    Residue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NucleotideEdit {
    Substitution { reference: String, alternate: String },
    Deletion(String),
    Duplication(String),
    Insertion(String),
    DeletionInsertion(String),
    Inversion,
    Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProteinEdit {
    Substitution(&'static str),
    Deletion,
    Duplication,
    Insertion(Vec<&'static str>),
    DeletionInsertion(Vec<&'static str>),
    Frameshift { alternate: Option<&'static str>, stop: Option<String> },
    Identity,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HgvsChange {
    Nucleotide { start: String, end: Option<String>, edit: NucleotideEdit },
    Protein {
        start: (&'static str, u32),
        end: Option<(&'static str, u32)>,
        edit: ProteinEdit,
    },
    /// `p.=`, `p.0` or `p.?`
    WholeProtein(&'static str),
}

/// A successfully parsed notation. `Display` renders the canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHgvs {
    pub accession: Option<String>,
    pub kind: NotationKind,
    /// Protein consequence written in parentheses, i.e. predicted.
    pub predicted: bool,
    pub change: HgvsChange,
}

impl fmt::Display for ParsedHgvs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ac) = &self.accession {
            write!(f, "{ac}:")?;
        }
        let prefix = match self.kind {
            NotationKind::Coding    => "c.",
            NotationKind::Genomic   => "g.",
            NotationKind::Protein   => "p.",
            NotationKind::NonCoding => "n.",
            NotationKind::Rna       => "r.",
            NotationKind::Mitochondrial => "m.",
            NotationKind::Other     => "",
        };
        f.write_str(prefix)?;
        if self.predicted { f.write_str("(")?; }
        match &self.change {
            HgvsChange::Nucleotide { start, end, edit } => {
                f.write_str(start)?;
                if let Some(end) = end { write!(f, "_{end}")?; }
                match edit {
                    NucleotideEdit::Substitution { reference, alternate } => {
                        write!(f, "{reference}>{alternate}")?
                    }
                    NucleotideEdit::Deletion(s)          => write!(f, "del{s}")?,
                    NucleotideEdit::Duplication(s)       => write!(f, "dup{s}")?,
                    NucleotideEdit::Insertion(s)         => write!(f, "ins{s}")?,
                    NucleotideEdit::DeletionInsertion(s) => write!(f, "delins{s}")?,
                    NucleotideEdit::Inversion            => f.write_str("inv")?,
                    NucleotideEdit::Identity             => f.write_str("=")?,
                }
            }
            HgvsChange::Protein { start, end, edit } => {
                write!(f, "{}{}", start.0, start.1)?;
                if let Some((aa, pos)) = end { write!(f, "_{aa}{pos}")?; }
                match edit {
                    ProteinEdit::Substitution(aa)       => f.write_str(aa)?,
                    ProteinEdit::Deletion               => f.write_str("del")?,
                    ProteinEdit::Duplication            => f.write_str("dup")?,
                    ProteinEdit::Insertion(seq)         => write!(f, "ins{}", seq.concat())?,
                    ProteinEdit::DeletionInsertion(seq) => write!(f, "delins{}", seq.concat())?,
                    ProteinEdit::Identity               => f.write_str("=")?,
                    ProteinEdit::Unknown                => f.write_str("?")?,
                    ProteinEdit::Frameshift { alternate, stop } => {
                        if let Some(aa) = alternate { f.write_str(aa)?; }
                        f.write_str("fs")?;
                        if let Some(stop) = stop { write!(f, "Ter{stop}")?; }
                    }
                }
            }
            HgvsChange::WholeProtein(s) => f.write_str(s)?,
        }
        if self.predicted { f.write_str(")")?; }
        Ok(())
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Grammar-based HGVS parsing.
pub trait HgvsParser: Send + Sync {
    fn parse(&self, notation: &str) -> Result<ParsedHgvs, HgvsError>;
}

fn re_accession() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:N[CGMRTW]|X[MR])_\d+(?:\.\d+)?|ENS[TG]\d+(?:\.\d+)?):(.+)$")
            .expect("accession regex")
    })
}

fn re_nucleotide_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([-*]?\d+(?:[+-]\d+)?|\?)(?:_([-*]?\d+(?:[+-]\d+)?|\?))?(.+)$")
            .expect("location regex")
    })
}

fn re_protein_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z][a-z]{2}|[A-Z*])(\d+)(?:_([A-Z][a-z]{2}|[A-Z*])(\d+))?(.+)$")
            .expect("protein location regex")
    })
}

fn re_frameshift() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z][a-z]{2}|[A-Z])?fs(?:(?:Ter|\*|X)(\d+|\?))?$")
            .expect("frameshift regex")
    })
}

/// Built-in strict parser for the HGVS subset described in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrammarParser;

impl HgvsParser for GrammarParser {
    fn parse(&self, notation: &str) -> Result<ParsedHgvs, HgvsError> {
        let compact: String = notation.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(HgvsError::Empty);
        }

        let (accession, body) = match re_accession().captures(&compact) {
            Some(caps) => (Some(caps[1].to_string()), caps[2].to_string()),
            None => (None, compact.clone()),
        };

        let kind = match body.get(..2).map(str::to_ascii_lowercase).as_deref() {
            Some("c.") => NotationKind::Coding,
            Some("g.") => NotationKind::Genomic,
            Some("p.") => NotationKind::Protein,
            Some("n.") => NotationKind::NonCoding,
            Some("r.") => NotationKind::Rna,
            _ => return Err(HgvsError::UnknownPrefix(notation.to_string())),
        };
        let rest = &body[2..];

        if kind == NotationKind::Protein {
            let (predicted, inner) = match rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
                Some(inner) => (true, inner),
                None => (false, rest),
            };
            let change = parse_protein(inner)?;
            return Ok(ParsedHgvs { accession, kind, predicted, change });
        }

        let change = parse_nucleotide(rest, kind)?;
        Ok(ParsedHgvs { accession, kind, predicted: false, change })
    }
}

fn parse_nucleotide(rest: &str, kind: NotationKind) -> Result<HgvsChange, HgvsError> {
    let caps = re_nucleotide_location()
        .captures(rest)
        .ok_or_else(|| HgvsError::Location(rest.to_string()))?;
    let start = caps[1].to_string();
    let end = caps.get(2).map(|m| m.as_str().to_string());
    let edit_text = &caps[3];

    // Genomic coordinates have no intronic offsets or UTR markers.
    if kind == NotationKind::Genomic {
        let plain = |p: &str| p == "?" || p.chars().all(|c| c.is_ascii_digit());
        if !plain(&start) || !end.as_deref().map_or(true, plain) {
            return Err(HgvsError::Location(rest.to_string()));
        }
    }

    let rna = kind == NotationKind::Rna;
    let lower = edit_text.to_ascii_lowercase();
    let bases = |s: &str, allow_empty: bool| -> Result<String, HgvsError> {
        normalise_bases(s, rna, allow_empty).ok_or_else(|| HgvsError::Residue(s.to_string()))
    };

    let edit = if let Some((r, a)) = edit_text.split_once('>') {
        if end.is_some() || r.len() != 1 || a.len() != 1 {
            return Err(HgvsError::Edit(edit_text.to_string()));
        }
        NucleotideEdit::Substitution { reference: bases(r, false)?, alternate: bases(a, false)? }
    } else if lower == "=" {
        NucleotideEdit::Identity
    } else if lower == "inv" {
        if end.is_none() {
            return Err(HgvsError::Edit(edit_text.to_string()));
        }
        NucleotideEdit::Inversion
    } else if lower.starts_with("delins") {
        NucleotideEdit::DeletionInsertion(bases(&edit_text[6..], false)?)
    } else if lower.starts_with("del") {
        NucleotideEdit::Deletion(bases(&edit_text[3..], true)?)
    } else if lower.starts_with("dup") {
        NucleotideEdit::Duplication(bases(&edit_text[3..], true)?)
    } else if lower.starts_with("ins") {
        if end.is_none() {
            return Err(HgvsError::Edit(edit_text.to_string()));
        }
        NucleotideEdit::Insertion(bases(&edit_text[3..], false)?)
    } else {
        return Err(HgvsError::Edit(edit_text.to_string()));
    };

    Ok(HgvsChange::Nucleotide { start, end, edit })
}

/// Upper-case DNA (`ACGTN`) or lower-case RNA (`acgun`) bases.
fn normalise_bases(s: &str, rna: bool, allow_empty: bool) -> Option<String> {
    if s.is_empty() {
        return allow_empty.then(String::new);
    }
    let valid: &[char] = if rna { &['a', 'c', 'g', 'u', 'n'] } else { &['A', 'C', 'G', 'T', 'N'] };
    let out: String = if rna { s.to_ascii_lowercase() } else { s.to_ascii_uppercase() };
    out.chars().all(|c| valid.contains(&c)).then_some(out)
}

fn parse_protein(inner: &str) -> Result<HgvsChange, HgvsError> {
    match inner {
        "=" => return Ok(HgvsChange::WholeProtein("=")),
        "0" => return Ok(HgvsChange::WholeProtein("0")),
        "?" => return Ok(HgvsChange::WholeProtein("?")),
        _ => (),
    }

    let caps = re_protein_location()
        .captures(inner)
        .ok_or_else(|| HgvsError::Location(inner.to_string()))?;
    let residue = |s: &str| parse_residue(s).ok_or_else(|| HgvsError::Residue(s.to_string()));
    let position = |s: &str| s.parse::<u32>().map_err(|_| HgvsError::Location(s.to_string()));

    let start = (residue(&caps[1])?, position(&caps[2])?);
    let end = match (caps.get(3), caps.get(4)) {
        (Some(aa), Some(pos)) => Some((residue(aa.as_str())?, position(pos.as_str())?)),
        _ => None,
    };
    let edit_text = &caps[5];

    let edit = if edit_text == "=" {
        ProteinEdit::Identity
    } else if edit_text == "?" {
        ProteinEdit::Unknown
    } else if edit_text == "del" {
        ProteinEdit::Deletion
    } else if edit_text == "dup" {
        ProteinEdit::Duplication
    } else if let Some(seq) = edit_text.strip_prefix("delins") {
        ProteinEdit::DeletionInsertion(parse_residues(seq)?)
    } else if let Some(seq) = edit_text.strip_prefix("ins") {
        if end.is_none() {
            return Err(HgvsError::Edit(edit_text.to_string()));
        }
        ProteinEdit::Insertion(parse_residues(seq)?)
    } else if let Some(fs) = re_frameshift().captures(edit_text) {
        let alternate = match fs.get(1) {
            Some(aa) => Some(residue(aa.as_str())?),
            None => None,
        };
        ProteinEdit::Frameshift { alternate, stop: fs.get(2).map(|m| m.as_str().to_string()) }
    } else {
        let seq = parse_residues(edit_text)?;
        match seq.as_slice() {
            [aa] if end.is_none() => ProteinEdit::Substitution(*aa),
            _ => return Err(HgvsError::Edit(edit_text.to_string())),
        }
    };

    Ok(HgvsChange::Protein { start, end, edit })
}

fn parse_residue(s: &str) -> Option<&'static str> {
    match s.len() {
        1 => aa1_to_aa3(s),
        3 => normalise_aa3(s),
        _ => None,
    }
}

/// A run of residues in three-letter or one-letter code, e.g. `GlyAla` or `GA`.
fn parse_residues(mut s: &str) -> Result<Vec<&'static str>, HgvsError> {
    let original = s;
    let mut out = Vec::new();
    while !s.is_empty() {
        let three = s
            .get(..3)
            .filter(|t| t.starts_with(|c: char| c.is_ascii_uppercase()))
            .and_then(normalise_aa3);
        if let Some(aa) = three {
            out.push(aa);
            s = &s[3..];
            continue;
        }
        match s.get(..1).and_then(aa1_to_aa3) {
            Some(aa) => {
                out.push(aa);
                s = &s[1..];
            }
            None => return Err(HgvsError::Residue(original.to_string())),
        }
    }
    if out.is_empty() {
        return Err(HgvsError::Residue(original.to_string()));
    }
    Ok(out)
}

// ── Canonicaliser ─────────────────────────────────────────────────────────────

/// Outcome of canonicalising one notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Canonicalized {
    /// Parsed and re-rendered in canonical form.
    Parsed(String),
    /// Did not parse; original text kept.
    Opaque(String),
}

impl Canonicalized {
    pub fn text(&self) -> &str {
        match self {
            Canonicalized::Parsed(s) | Canonicalized::Opaque(s) => s,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Canonicalized::Parsed(_))
    }
}

/// A variant expression whose notations have been canonicalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalExpression {
    pub expression: VariantExpression,
    pub parsed: usize,
    pub opaque: usize,
}

/// Fail-open canonicaliser over an injected [`HgvsParser`].
pub struct VariantCanonicalizer {
    parser: Box<dyn HgvsParser>,
}

impl VariantCanonicalizer {
    /// Canonicaliser backed by the built-in [`GrammarParser`].
    pub fn new() -> Self {
        Self::with_parser(GrammarParser)
    }

    pub fn with_parser<P: HgvsParser + 'static>(parser: P) -> Self {
        Self { parser: Box::new(parser) }
    }

    pub fn canonicalize(&self, notation: &str) -> Canonicalized {
        match self.parser.parse(notation) {
            Ok(parsed) => Canonicalized::Parsed(parsed.to_string()),
            Err(e) => {
                debug!(notation, error = %e, "Keeping variant notation as opaque text");
                Canonicalized::Opaque(notation.to_string())
            }
        }
    }

    /// Canonicalise every notation slot of an expression. Slot order and
    /// kinds are preserved.
    pub fn canonicalize_expression(&self, expr: &VariantExpression) -> CanonicalExpression {
        let mut out = expr.clone();
        let (mut parsed, mut opaque) = (0, 0);
        for slot in out.notations.iter_mut() {
            match self.canonicalize(&slot.text) {
                Canonicalized::Parsed(text) => {
                    parsed += 1;
                    *slot = Notation { kind: slot.kind, text };
                }
                Canonicalized::Opaque(_) => opaque += 1,
            }
        }
        CanonicalExpression { expression: out, parsed, opaque }
    }
}

impl Default for VariantCanonicalizer {
    fn default() -> Self { Self::new() }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalise::variant::split_segment;

    fn canon(s: &str) -> String {
        GrammarParser.parse(s).unwrap().to_string()
    }

    #[test]
    fn test_coding_substitution() {
        assert_eq!(canon("c.123a>g"), "c.123A>G");
        assert_eq!(canon("C.123A>G"), "c.123A>G");
        assert_eq!(canon("c. 123 A > G"), "c.123A>G");
    }

    #[test]
    fn test_intronic_and_utr_positions() {
        assert_eq!(canon("c.123+1G>A"), "c.123+1G>A");
        assert_eq!(canon("c.-14G>C"), "c.-14G>C");
        assert_eq!(canon("c.*5del"), "c.*5del");
        assert!(GrammarParser.parse("g.123+1G>A").is_err());
    }

    #[test]
    fn test_indels() {
        assert_eq!(canon("c.5266dupc"), "c.5266dupC");
        assert_eq!(canon("c.1521_1523delCTT"), "c.1521_1523delCTT");
        assert_eq!(canon("c.1521_1523del"), "c.1521_1523del");
        assert_eq!(canon("c.76_77insT"), "c.76_77insT");
        assert_eq!(canon("c.112_117delinsTG"), "c.112_117delinsTG");
        assert_eq!(canon("g.100_200inv"), "g.100_200inv");
        assert_eq!(canon("c.123="), "c.123=");
    }

    #[test]
    fn test_rna_bases_lower_case() {
        assert_eq!(canon("r.76A>C"), "r.76a>c");
    }

    #[test]
    fn test_accession_prefix_kept() {
        assert_eq!(canon("NM_007294.3:c.68_69delAG"), "NM_007294.3:c.68_69delAG");
        assert_eq!(canon("NC_000017.11:g.43045712A>G"), "NC_000017.11:g.43045712A>G");
    }

    #[test]
    fn test_protein_one_letter_to_three() {
        assert_eq!(canon("p.R175H"), "p.Arg175His");
        assert_eq!(canon("p.R213*"), "p.Arg213Ter");
        assert_eq!(canon("p.(Gly12Asp)"), "p.(Gly12Asp)");
    }

    #[test]
    fn test_protein_edits() {
        assert_eq!(canon("p.Arg97ProfsTer23"), "p.Arg97ProfsTer23");
        assert_eq!(canon("p.R97Pfs*23"), "p.Arg97ProfsTer23");
        assert_eq!(canon("p.Lys23fs"), "p.Lys23fs");
        assert_eq!(canon("p.Phe508del"), "p.Phe508del");
        assert_eq!(canon("p.Lys2_Met3insGlnSerLys"), "p.Lys2_Met3insGlnSerLys");
        assert_eq!(canon("p.C28delinsWV"), "p.Cys28delinsTrpVal");
        assert_eq!(canon("p.Met1?"), "p.Met1?");
        assert_eq!(canon("p.="), "p.=");
        assert_eq!(canon("p.0"), "p.0");
    }

    #[test]
    fn test_canonical_round_trips() {
        for s in [
            "c.123A>G",
            "c.5266dupC",
            "c.76_77insT",
            "g.43045712A>G",
            "n.45del",
            "r.76a>c",
            "p.Arg175His",
            "p.(Arg97ProfsTer23)",
            "NM_000277.3:c.1222C>T",
        ] {
            let once = canon(s);
            assert_eq!(once, s);
            assert_eq!(canon(&once), once);
        }
    }

    #[test]
    fn test_rejects_free_text() {
        let p = GrammarParser;
        assert_eq!(p.parse(""), Err(HgvsError::Empty));
        assert!(matches!(p.parse("exon 2 deletion"), Err(HgvsError::UnknownPrefix(_))));
        assert!(matches!(p.parse("m.3243A>G"), Err(HgvsError::UnknownPrefix(_))));
        assert!(p.parse("c.123insA").is_err());
        assert!(p.parse("c.123_125A>G").is_err());
        assert!(p.parse("c.123B>G").is_err());
        assert!(p.parse("p.Xyz12Asp").is_err());
    }

    #[test]
    fn test_canonicalizer_fails_open() {
        let c = VariantCanonicalizer::new();
        assert_eq!(c.canonicalize("p.R175H"), Canonicalized::Parsed("p.Arg175His".into()));
        assert_eq!(
            c.canonicalize("large deletion exons 1-3"),
            Canonicalized::Opaque("large deletion exons 1-3".into())
        );
    }

    #[test]
    fn test_canonicalize_expression_keeps_slots() {
        let c = VariantCanonicalizer::new();
        let expr = split_segment("TP53:c.524g>a,p.R175H,unclear");
        let out = c.canonicalize_expression(&expr);
        assert_eq!(out.parsed, 2);
        assert_eq!(out.opaque, 1);
        assert_eq!(out.expression.gene.as_deref(), Some("TP53"));
        assert_eq!(out.expression.notation_text(), "c.524G>A,p.Arg175His,unclear");
    }

    struct RejectAll;
    impl HgvsParser for RejectAll {
        fn parse(&self, notation: &str) -> Result<ParsedHgvs, HgvsError> {
            Err(HgvsError::UnknownPrefix(notation.to_string()))
        }
    }

    #[test]
    fn test_injected_parser() {
        let c = VariantCanonicalizer::with_parser(RejectAll);
        assert!(!c.canonicalize("c.123A>G").is_parsed());
    }
}
