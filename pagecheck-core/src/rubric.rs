// Rubric evaluation: the fixed, ordered rule table mapping Facts to Findings.

use pagecheck_scanner::fact::Fact;
use serde::{Deserialize, Serialize};

/// Character ranges and counts the rubric checks against.
pub const TITLE_LENGTH: (usize, usize) = (10, 60);
pub const DESCRIPTION_LENGTH: (usize, usize) = (50, 160);
pub const MIN_KEYWORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Error,
    Warning,
    Info,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Error => "error",
            FindingKind::Warning => "warning",
            FindingKind::Info => "info",
        }
    }
}

/// One rubric violation attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub code: String,
    pub message: String,
    pub weight: u32,
}

/// One entry of the rule table. `check` is `None` for corpus-scope codes
/// (duplicates), which are registered here so their weight is fixed in the
/// same place as everything else but triggered by the DuplicateIndex.
pub struct Rule {
    pub code: &'static str,
    pub kind: FindingKind,
    pub weight: u32,
    pub check: Option<fn(&Fact) -> Option<String>>,
}

pub struct RubricEngine {
    rules: Vec<Rule>,
}

impl RubricEngine {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Custom rule table. Weights are fixed for the lifetime of the engine,
    /// which is what keeps one run deterministic.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Build a finding for a registered code, e.g. from the duplicate pass.
    pub fn finding_for(&self, code: &str, message: String) -> Option<Finding> {
        self.rules.iter().find(|r| r.code == code).map(|r| Finding {
            kind: r.kind,
            code: r.code.to_string(),
            message,
            weight: r.weight,
        })
    }

    /// Run every per-document rule. Rules never short-circuit: the full
    /// finding list is what fix planning works from.
    pub fn evaluate(&self, fact: &Fact) -> Evaluation {
        let mut findings = Vec::new();

        for rule in &self.rules {
            if let Some(check) = rule.check
                && let Some(message) = check(fact)
            {
                findings.push(Finding {
                    kind: rule.kind,
                    code: rule.code.to_string(),
                    message,
                    weight: rule.weight,
                });
            }
        }

        Evaluation {
            score: score_from(&findings),
            findings,
        }
    }
}

impl Default for RubricEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub score: u32,
    pub findings: Vec<Finding>,
}

/// `clamp(100 - Σ weights, 0, 100)`.
pub fn score_from(findings: &[Finding]) -> u32 {
    let deducted: u32 = findings.iter().map(|f| f.weight).sum();
    100u32.saturating_sub(deducted)
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

pub fn default_rules() -> Vec<Rule> {
    use FindingKind::{Error, Info, Warning};

    vec![
        Rule {
            code: "missing-title",
            kind: Error,
            weight: 15,
            check: Some(|f| f.title.is_none().then(|| "Title tag is missing".to_string())),
        },
        Rule {
            code: "title-length",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                let title = f.title.as_deref()?;
                let len = chars(title);
                let (min, max) = TITLE_LENGTH;
                (len < min || len > max).then(|| {
                    format!("Title is {} characters (recommended {}-{})", len, min, max)
                })
            }),
        },
        Rule {
            code: "missing-description",
            kind: Error,
            weight: 15,
            check: Some(|f| {
                f.description
                    .is_none()
                    .then(|| "Meta description is missing".to_string())
            }),
        },
        Rule {
            code: "description-length",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                let description = f.description.as_deref()?;
                let len = chars(description);
                let (min, max) = DESCRIPTION_LENGTH;
                (len < min || len > max).then(|| {
                    format!(
                        "Description is {} characters (recommended {}-{})",
                        len, min, max
                    )
                })
            }),
        },
        Rule {
            code: "missing-keywords",
            kind: Error,
            weight: 10,
            check: Some(|f| {
                f.keywords
                    .is_empty()
                    .then(|| "Meta keywords are missing".to_string())
            }),
        },
        Rule {
            code: "few-keywords",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                (!f.keywords.is_empty() && f.keywords.len() < MIN_KEYWORDS).then(|| {
                    format!("Only {} keywords (recommended at least {})", f.keywords.len(), MIN_KEYWORDS)
                })
            }),
        },
        Rule {
            code: "missing-h1",
            kind: Warning,
            weight: 10,
            check: Some(|f| (f.h1_count() == 0).then(|| "No <h1> heading".to_string())),
        },
        Rule {
            code: "multiple-h1",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                (f.h1_count() > 1).then(|| format!("{} <h1> headings (expected one)", f.h1_count()))
            }),
        },
        Rule {
            code: "missing-canonical",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                f.canonical
                    .is_none()
                    .then(|| "Canonical URL is missing".to_string())
            }),
        },
        Rule {
            code: "missing-og-title",
            kind: Warning,
            weight: 3,
            check: Some(|f| {
                f.open_graph
                    .title
                    .is_none()
                    .then(|| "og:title is missing".to_string())
            }),
        },
        Rule {
            code: "missing-og-description",
            kind: Warning,
            weight: 3,
            check: Some(|f| {
                f.open_graph
                    .description
                    .is_none()
                    .then(|| "og:description is missing".to_string())
            }),
        },
        Rule {
            code: "missing-og-image",
            kind: Warning,
            weight: 3,
            check: Some(|f| {
                f.open_graph
                    .image
                    .is_none()
                    .then(|| "og:image is missing".to_string())
            }),
        },
        Rule {
            code: "missing-hreflang",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                f.hreflangs
                    .is_empty()
                    .then(|| "No hreflang alternate links".to_string())
            }),
        },
        Rule {
            code: "missing-schema",
            kind: Warning,
            weight: 5,
            check: Some(|f| {
                (!f.has_valid_schema()).then(|| "No valid JSON-LD block".to_string())
            }),
        },
        // Informational rules deduct nothing; they keep the report honest
        // about conditions the score does not move for.
        Rule {
            code: "multiple-titles",
            kind: Info,
            weight: 0,
            check: Some(|f| {
                (f.title_count > 1).then(|| format!("{} <title> tags (expected one)", f.title_count))
            }),
        },
        Rule {
            code: "invalid-schema",
            kind: Info,
            weight: 0,
            check: Some(|f| {
                (f.invalid_schema_blocks > 0).then(|| {
                    format!("{} JSON-LD block(s) failed to parse", f.invalid_schema_blocks)
                })
            }),
        },
        Rule {
            code: "missing-twitter-card",
            kind: Info,
            weight: 0,
            check: Some(|f| {
                f.twitter
                    .card
                    .is_none()
                    .then(|| "twitter:card is missing".to_string())
            }),
        },
        Rule {
            code: "images-missing-alt",
            kind: Info,
            weight: 0,
            check: Some(|f| {
                let missing = f.images_missing_alt();
                (missing > 0).then(|| format!("{} image(s) without alt text", missing))
            }),
        },
        // Corpus-scope codes: weight lives here, the DuplicateIndex triggers them.
        Rule {
            code: "duplicate-title",
            kind: FindingKind::Error,
            weight: 10,
            check: None,
        },
        Rule {
            code: "duplicate-description",
            kind: FindingKind::Error,
            weight: 10,
            check: None,
        },
    ]
}
