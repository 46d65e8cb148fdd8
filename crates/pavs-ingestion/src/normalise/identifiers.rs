//! Identifier extractors.
//!
//! Total classification functions over short free-text fields. Each one
//! applies an ordered rule table, first match wins, and returns `None` or a
//! "not provided" value instead of failing. Sentinel and blank input is
//! always absent.

use std::fmt;
use std::sync::OnceLock;

use pavs_common::FieldValue;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

fn reported(text: &str) -> Option<String> {
    match FieldValue::from_raw(text) {
        FieldValue::Reported(s) => Some(s),
        FieldValue::NotReported => None,
    }
}

/// Compile an ordered rule table once.
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("identifier rule regex"))
        .collect()
}

// ── OMIM ──────────────────────────────────────────────────────────────────────

const OMIM_RULES: &[&str] = &[
    r"(?i)OMIM:\s*(\d{6})",
    r"(?i)OMIM\s+(\d{6})",
    r"#(\d{6})",
];

fn omim_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| compile(OMIM_RULES))
}

/// OMIM id from a diagnosis string, e.g. `Disease [OMIM 204000]` → `OMIM:204000`.
pub fn extract_omim_id(text: &str) -> Option<String> {
    let text = reported(text)?;
    omim_rules()
        .iter()
        .find_map(|re| re.captures(&text))
        .map(|caps| format!("OMIM:{}", &caps[1]))
}

// ── Gene symbol ───────────────────────────────────────────────────────────────

/// Uppercase tokens in first position that are accessions, not genes.
const NON_GENE_PREFIXES: &[&str] = &["NM_", "NR_", "NC_", "CHR"];

/// `(pattern, accept)`: a rule whose `accept` rejects the capture falls
/// through to the next rule.
const GENE_RULES: &[(&str, fn(&str) -> bool)] = &[
    (r"^([A-Z][A-Z0-9]+):", is_not_accession),
    (r"^([A-Z][A-Z0-9]+)\s*[(\[]", accept_any),
    (r"^([A-Z][A-Z0-9]+)\s+[cpgn]\.", accept_any),
];

fn is_not_accession(symbol: &str) -> bool {
    !NON_GENE_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

fn accept_any(_: &str) -> bool {
    true
}

fn gene_rules() -> &'static [(Regex, fn(&str) -> bool)] {
    static RULES: OnceLock<Vec<(Regex, fn(&str) -> bool)>> = OnceLock::new();
    RULES.get_or_init(|| {
        GENE_RULES
            .iter()
            .map(|(p, accept)| (Regex::new(p).expect("gene rule regex"), *accept))
            .collect()
    })
}

/// Gene symbol leading a variant description: `BRCA1:c.123A>G`,
/// `TP53 p.Arg175His`, `PAH (c.1222C>T)`.
pub fn extract_gene_from_variant(text: &str) -> Option<String> {
    let text = reported(text)?;
    gene_rules().iter().find_map(|(re, accept)| {
        re.captures(&text)
            .map(|caps| caps[1].to_string())
            .filter(|gene| accept(gene))
    })
}

// ── ACMG classification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcmgClass {
    Pathogenic,
    LikelyPathogenic,
    UncertainSignificance,
    LikelyBenign,
    Benign,
    #[default]
    NotProvided,
}

impl AcmgClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcmgClass::Pathogenic            => "PATHOGENIC",
            AcmgClass::LikelyPathogenic      => "LIKELY_PATHOGENIC",
            AcmgClass::UncertainSignificance => "UNCERTAIN_SIGNIFICANCE",
            AcmgClass::LikelyBenign          => "LIKELY_BENIGN",
            AcmgClass::Benign                => "BENIGN",
            AcmgClass::NotProvided           => "NOT_PROVIDED",
        }
    }
}

impl fmt::Display for AcmgClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualified keys come before the bare keys they contain.
const ACMG_RULES: &[(&str, AcmgClass)] = &[
    ("likely pathogenic", AcmgClass::LikelyPathogenic),
    ("likely benign", AcmgClass::LikelyBenign),
    ("uncertain significance", AcmgClass::UncertainSignificance),
    ("vus", AcmgClass::UncertainSignificance),
    ("pathogenic", AcmgClass::Pathogenic),
    ("benign", AcmgClass::Benign),
];

/// Case-insensitive substring match against [`ACMG_RULES`].
pub fn classify_acmg(text: &str) -> AcmgClass {
    let Some(text) = reported(text) else { return AcmgClass::NotProvided };
    let lowered = text.to_lowercase();
    ACMG_RULES
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(_, class)| *class)
        .unwrap_or_default()
}

// ── Zygosity ──────────────────────────────────────────────────────────────────

/// Allelic state as a GENO ontology class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Zygosity {
    pub id: &'static str,
    pub label: &'static str,
}

pub const COMPOUND_HETEROZYGOUS: Zygosity = Zygosity { id: "GENO:0000402", label: "compound heterozygous" };
pub const HOMOZYGOUS: Zygosity = Zygosity { id: "GENO:0000136", label: "homozygous" };
pub const HETEROZYGOUS: Zygosity = Zygosity { id: "GENO:0000135", label: "heterozygous" };
pub const HEMIZYGOUS: Zygosity = Zygosity { id: "GENO:0000134", label: "hemizygous" };

const ZYGOSITY_RULES: &[(&str, Zygosity)] = &[
    ("compound heterozygous", COMPOUND_HETEROZYGOUS),
    ("homozygous", HOMOZYGOUS),
    ("heterozygous", HETEROZYGOUS),
    ("hemizygous", HEMIZYGOUS),
];

pub fn classify_zygosity(text: &str) -> Option<Zygosity> {
    let lowered = reported(text)?.to_lowercase();
    ZYGOSITY_RULES
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(_, z)| *z)
}

// ── Sex ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    #[default]
    UnknownSex,
    Female,
    Male,
    OtherSex,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::UnknownSex => "UNKNOWN_SEX",
            Sex::Female     => "FEMALE",
            Sex::Male       => "MALE",
            Sex::OtherSex   => "OTHER_SEX",
        }
    }
}

const SEX_RULES: &[(&[&str], Sex)] = &[
    (&["male", "m", "man", "boy"], Sex::Male),
    (&["female", "f", "woman", "girl"], Sex::Female),
    (&["other", "intersex"], Sex::OtherSex),
];

/// Whole-value match, case-insensitive.
pub fn parse_sex(text: &str) -> Sex {
    let Some(text) = reported(text) else { return Sex::UnknownSex };
    let lowered = text.to_lowercase();
    SEX_RULES
        .iter()
        .find(|(spellings, _)| spellings.contains(&lowered.as_str()))
        .map(|(_, sex)| *sex)
        .unwrap_or_default()
}

// ── Age ───────────────────────────────────────────────────────────────────────

const AGE_KEYWORDS: &[(&str, &str)] = &[
    ("NEWBORN", "P0D"),
    ("NEONATE", "P0D"),
    ("NEONATAL", "P0D"),
    ("INFANT", "P6M"),
    ("CHILD", "P5Y"),
    ("CHILDHOOD", "P5Y"),
    ("ADOLESCENT", "P15Y"),
    ("ADOLESCENCE", "P15Y"),
    ("ADULT", "P25Y"),
    ("ADULTHOOD", "P25Y"),
];

struct AgeRules {
    iso: Regex,
    years: Regex,
    months: Regex,
    days: Regex,
    weeks: Regex,
}

fn age_rules() -> &'static AgeRules {
    static RULES: OnceLock<AgeRules> = OnceLock::new();
    RULES.get_or_init(|| AgeRules {
        iso: Regex::new(r"^P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?$").expect("iso age regex"),
        years: Regex::new(r"(\d+)\s*(?:YEARS?|Y)").expect("years regex"),
        months: Regex::new(r"(\d+)\s*(?:MONTHS?|M)").expect("months regex"),
        days: Regex::new(r"(\d+)\s*(?:DAYS?|D)").expect("days regex"),
        weeks: Regex::new(r"(\d+)\s*(?:WEEKS?|W)").expect("weeks regex"),
    })
}

/// Free-text age → ISO-8601 duration: `22Y` → `P22Y`, `3 years 6 months` →
/// `P3Y6M`, `infant` → `P6M`, `2 weeks` → `P14D`.
///
/// Components are read in the order years, months, days, weeks. A month
/// match directly followed by `Y` is skipped so `MY`-style tokens are not
/// taken as months. Weeks are added to days.
pub fn parse_age(text: &str) -> Option<String> {
    let upper = reported(text)?.to_uppercase();
    let rules = age_rules();

    if upper.len() > 1 && rules.iso.is_match(&upper) {
        return Some(upper);
    }
    if let Some((_, iso)) = AGE_KEYWORDS.iter().find(|(k, _)| *k == upper) {
        return Some(iso.to_string());
    }

    // A component too large for u64 makes the whole age unparseable.
    let number = |caps: Captures<'_>| caps[1].parse::<u64>();
    let years = rules.years.captures(&upper).map(number).transpose().ok()?;
    let months = rules
        .months
        .captures_iter(&upper)
        .find(|caps| {
            let end = caps.get(0).map_or(0, |m| m.end());
            !upper[end..].starts_with('Y')
        })
        .map(number)
        .transpose()
        .ok()?;
    let days = rules.days.captures(&upper).map(number).transpose().ok()?;
    let weeks = rules.weeks.captures(&upper).map(number).transpose().ok()?;

    let total_days = match (days, weeks) {
        (None, None) => None,
        (d, w) => Some(w.unwrap_or(0).checked_mul(7)?.checked_add(d.unwrap_or(0))?),
    };

    let mut iso = String::from("P");
    if let Some(y) = years { iso.push_str(&format!("{y}Y")); }
    if let Some(m) = months { iso.push_str(&format!("{m}M")); }
    if let Some(d) = total_days { iso.push_str(&format!("{d}D")); }
    (iso.len() > 1).then_some(iso)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
