// Tests for rubric evaluation and scoring.

use pagecheck_core::rubric::{FindingKind, Rule, RubricEngine, default_rules, score_from};
use pagecheck_scanner::fact::{Fact, Heading, Hreflang, ImageFact, OpenGraph, TwitterCard};

/// A fact that satisfies every rule in the default table.
fn perfect_fact() -> Fact {
    Fact {
        title: Some("Acme Widgets Catalog and Industrial Supplies".to_string()),
        title_count: 1,
        description: Some(
            "Browse the full Acme industrial widget catalog with datasheets, \
             pricing and same-day shipping across all of Europe."
                .to_string(),
        ),
        keywords: vec![
            "widgets".to_string(),
            "catalog".to_string(),
            "industrial".to_string(),
            "acme".to_string(),
            "supplies".to_string(),
        ],
        canonical: Some("https://acme.example/widgets".to_string()),
        headings: vec![Heading {
            level: 1,
            text: "Industrial Widgets".to_string(),
        }],
        open_graph: OpenGraph {
            title: Some("Acme Widgets".to_string()),
            description: Some("The industrial widget catalog.".to_string()),
            image: Some("https://acme.example/og.png".to_string()),
            url: Some("https://acme.example/widgets".to_string()),
            og_type: Some("website".to_string()),
            locale: Some("en_US".to_string()),
        },
        twitter: TwitterCard {
            card: Some("summary_large_image".to_string()),
            image: Some("https://acme.example/card.png".to_string()),
        },
        hreflangs: vec![
            Hreflang {
                lang: "en".to_string(),
                href: "https://acme.example/widgets".to_string(),
            },
            Hreflang {
                lang: "de".to_string(),
                href: "https://acme.example/de/widgets".to_string(),
            },
        ],
        schema_blocks: vec![serde_json::json!({"@type": "WebPage"})],
        invalid_schema_blocks: 0,
        images: vec![ImageFact { has_alt: true }],
    }
}

fn codes(findings: &[pagecheck_core::rubric::Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.code.as_str()).collect()
}

#[test]
fn test_perfect_fact_scores_100_with_no_findings() {
    let evaluation = RubricEngine::new().evaluate(&perfect_fact());
    assert_eq!(evaluation.score, 100);
    assert!(evaluation.findings.is_empty());
}

#[test]
fn test_missing_title_description_keywords_scores_60() {
    // End-to-end scenario 1: everything else present, three errors.
    let fact = Fact {
        title: None,
        description: None,
        keywords: vec![],
        ..perfect_fact()
    };

    let evaluation = RubricEngine::new().evaluate(&fact);
    assert_eq!(evaluation.score, 60);
    assert_eq!(evaluation.findings.len(), 3);
    assert_eq!(
        codes(&evaluation.findings),
        vec!["missing-title", "missing-description", "missing-keywords"]
    );
    assert!(
        evaluation
            .findings
            .iter()
            .all(|f| f.kind == FindingKind::Error)
    );
}

#[test]
fn test_title_length_out_of_range_is_a_warning() {
    let rubric = RubricEngine::new();

    let short = Fact {
        title: Some("Tiny".to_string()),
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&short);
    assert_eq!(codes(&evaluation.findings), vec!["title-length"]);
    assert_eq!(evaluation.findings[0].weight, 5);
    assert_eq!(evaluation.score, 95);

    let long = Fact {
        title: Some("x".repeat(61)),
        ..perfect_fact()
    };
    assert_eq!(codes(&rubric.evaluate(&long).findings), vec!["title-length"]);

    // A missing title is the missing-title rule's business, not this one's.
    let missing = Fact {
        title: None,
        ..perfect_fact()
    };
    assert!(!codes(&rubric.evaluate(&missing).findings).contains(&"title-length"));
}

#[test]
fn test_description_length_bounds() {
    let rubric = RubricEngine::new();

    let short = Fact {
        description: Some("Too short.".to_string()),
        ..perfect_fact()
    };
    assert_eq!(
        codes(&rubric.evaluate(&short).findings),
        vec!["description-length"]
    );

    let long = Fact {
        description: Some("d".repeat(161)),
        ..perfect_fact()
    };
    assert_eq!(
        codes(&rubric.evaluate(&long).findings),
        vec!["description-length"]
    );

    let edge = Fact {
        description: Some("d".repeat(160)),
        ..perfect_fact()
    };
    assert!(rubric.evaluate(&edge).findings.is_empty());
}

#[test]
fn test_keyword_rules() {
    let rubric = RubricEngine::new();

    let none = Fact {
        keywords: vec![],
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&none);
    assert_eq!(codes(&evaluation.findings), vec!["missing-keywords"]);
    assert_eq!(evaluation.findings[0].weight, 10);

    let few = Fact {
        keywords: vec!["one".to_string(), "two".to_string()],
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&few);
    assert_eq!(codes(&evaluation.findings), vec!["few-keywords"]);
    assert_eq!(evaluation.score, 95);
}

#[test]
fn test_heading_rules() {
    let rubric = RubricEngine::new();

    let none = Fact {
        headings: vec![],
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&none);
    assert_eq!(codes(&evaluation.findings), vec!["missing-h1"]);
    assert_eq!(evaluation.score, 90);

    let two = Fact {
        headings: vec![
            Heading {
                level: 1,
                text: "One".to_string(),
            },
            Heading {
                level: 1,
                text: "Two".to_string(),
            },
        ],
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&two);
    assert_eq!(codes(&evaluation.findings), vec!["multiple-h1"]);
    assert_eq!(evaluation.score, 95);
}

#[test]
fn test_open_graph_rules_deduct_three_each() {
    let fact = Fact {
        open_graph: OpenGraph::default(),
        ..perfect_fact()
    };
    let evaluation = RubricEngine::new().evaluate(&fact);
    assert_eq!(
        codes(&evaluation.findings),
        vec![
            "missing-og-title",
            "missing-og-description",
            "missing-og-image"
        ]
    );
    assert_eq!(evaluation.score, 91);
}

#[test]
fn test_hreflang_canonical_and_schema_rules() {
    let rubric = RubricEngine::new();

    let fact = Fact {
        canonical: None,
        hreflangs: vec![],
        schema_blocks: vec![],
        ..perfect_fact()
    };
    let evaluation = rubric.evaluate(&fact);
    assert_eq!(
        codes(&evaluation.findings),
        vec!["missing-canonical", "missing-hreflang", "missing-schema"]
    );
    assert_eq!(evaluation.score, 85);
}

#[test]
fn test_informational_rules_do_not_move_the_score() {
    let fact = Fact {
        title_count: 2,
        invalid_schema_blocks: 1,
        twitter: TwitterCard::default(),
        images: vec![ImageFact { has_alt: false }],
        ..perfect_fact()
    };

    let evaluation = RubricEngine::new().evaluate(&fact);
    assert_eq!(evaluation.score, 100);
    assert_eq!(
        codes(&evaluation.findings),
        vec![
            "multiple-titles",
            "invalid-schema",
            "missing-twitter-card",
            "images-missing-alt"
        ]
    );
    assert!(
        evaluation
            .findings
            .iter()
            .all(|f| f.kind == FindingKind::Info && f.weight == 0)
    );
}

#[test]
fn test_rules_never_short_circuit() {
    let evaluation = RubricEngine::new().evaluate(&Fact::default());
    // An empty fact violates every error rule and then some; all of them
    // must be present, not just the first.
    let found = codes(&evaluation.findings);
    for expected in [
        "missing-title",
        "missing-description",
        "missing-keywords",
        "missing-h1",
        "missing-canonical",
        "missing-og-title",
        "missing-og-description",
        "missing-og-image",
        "missing-hreflang",
        "missing-schema",
    ] {
        assert!(found.contains(&expected), "missing {}", expected);
    }
}

#[test]
fn test_score_is_monotonic_in_findings() {
    let rubric = RubricEngine::new();
    let base = rubric.evaluate(&perfect_fact()).score;

    // Each single extra violation can only lower the score.
    let mutations: Vec<Fact> = vec![
        Fact {
            title: None,
            ..perfect_fact()
        },
        Fact {
            description: None,
            ..perfect_fact()
        },
        Fact {
            keywords: vec![],
            ..perfect_fact()
        },
        Fact {
            canonical: None,
            ..perfect_fact()
        },
        Fact {
            hreflangs: vec![],
            ..perfect_fact()
        },
        Fact {
            schema_blocks: vec![],
            ..perfect_fact()
        },
    ];

    for fact in mutations {
        assert!(rubric.evaluate(&fact).score <= base);
    }
}

#[test]
fn test_removing_the_cause_removes_the_finding() {
    let rubric = RubricEngine::new();

    let broken = Fact {
        title: None,
        ..perfect_fact()
    };
    assert!(codes(&rubric.evaluate(&broken).findings).contains(&"missing-title"));

    let fixed = Fact {
        title: Some("A perfectly reasonable page title".to_string()),
        ..broken
    };
    assert!(!codes(&rubric.evaluate(&fixed).findings).contains(&"missing-title"));
}

#[test]
fn test_duplicate_codes_are_registered_with_fixed_weights() {
    let rubric = RubricEngine::new();

    let title = rubric
        .finding_for("duplicate-title", "msg".to_string())
        .unwrap();
    assert_eq!(title.weight, 10);
    assert_eq!(title.kind, FindingKind::Error);

    let description = rubric
        .finding_for("duplicate-description", "msg".to_string())
        .unwrap();
    assert_eq!(description.weight, 10);

    assert!(rubric.finding_for("no-such-code", "msg".to_string()).is_none());
}

#[test]
fn test_weights_are_fixed_per_code() {
    let rubric = RubricEngine::new();
    let a = rubric.evaluate(&Fact::default());
    let b = rubric.evaluate(&Fact {
        canonical: Some("https://x.example/".to_string()),
        ..Fact::default()
    });

    for finding in &a.findings {
        if let Some(other) = b.findings.iter().find(|f| f.code == finding.code) {
            assert_eq!(finding.weight, other.weight);
        }
    }
}

#[test]
fn test_score_clamps_at_zero_with_custom_weights() {
    let rubric = RubricEngine::with_rules(vec![Rule {
        code: "missing-title",
        kind: FindingKind::Error,
        weight: 150,
        check: Some(|f| f.title.is_none().then(|| "no title".to_string())),
    }]);

    let evaluation = rubric.evaluate(&Fact::default());
    assert_eq!(evaluation.score, 0);
}

#[test]
fn test_score_from_sums_weights() {
    let rubric = RubricEngine::new();
    let evaluation = rubric.evaluate(&Fact {
        title: None,
        description: None,
        ..perfect_fact()
    });
    assert_eq!(evaluation.score, 70);
    assert_eq!(score_from(&evaluation.findings), 70);
}

#[test]
fn test_default_table_is_ordered_and_stable() {
    let rules = default_rules();
    assert_eq!(rules[0].code, "missing-title");
    assert!(rules.iter().any(|r| r.code == "duplicate-title"));
    // Two engines built from the default table agree on everything.
    let a = RubricEngine::new().evaluate(&Fact::default());
    let b = RubricEngine::new().evaluate(&Fact::default());
    assert_eq!(a.findings, b.findings);
    assert_eq!(a.score, b.score);
}
