// Cross-document duplicate detection for titles and descriptions.

use crate::report::ScoreBreakdown;
use crate::rubric::{RubricEngine, score_from};
use pagecheck_scanner::fact::Fact;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateField {
    Title,
    Description,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Title => "title",
            DuplicateField::Description => "description",
        }
    }

    fn finding_code(&self) -> &'static str {
        match self {
            DuplicateField::Title => "duplicate-title",
            DuplicateField::Description => "duplicate-description",
        }
    }
}

/// One exact value shared by two or more documents. `document_paths` keeps
/// discovery order; the first entry is the occurrence that stays clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub field_name: DuplicateField,
    pub value: String,
    pub document_paths: Vec<String>,
}

/// Corpus-wide index of duplicated titles and descriptions. Built as a
/// second pass over facts already extracted per document.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    pub titles: Vec<DuplicateGroup>,
    pub descriptions: Vec<DuplicateGroup>,
}

impl DuplicateIndex {
    /// Group by exact (not normalized) string equality. `facts` must be in
    /// discovery order.
    pub fn build(facts: &[(String, Fact)]) -> Self {
        Self {
            titles: group_field(facts, DuplicateField::Title, |f| f.title.as_deref()),
            descriptions: group_field(facts, DuplicateField::Description, |f| {
                f.description.as_deref()
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.descriptions.is_empty()
    }

    /// Attach duplicate findings to every group member after the first and
    /// re-clamp the affected scores. Weights come from the rubric table.
    pub fn apply_to(&self, rubric: &RubricEngine, breakdowns: &mut [ScoreBreakdown]) {
        for group in self.titles.iter().chain(self.descriptions.iter()) {
            for path in group.document_paths.iter().skip(1) {
                let Some(breakdown) = breakdowns.iter_mut().find(|b| &b.document_path == path)
                else {
                    continue;
                };

                let message = match group.field_name {
                    DuplicateField::Title => {
                        format!(r#"Duplicate title: "{}""#, group.value)
                    }
                    DuplicateField::Description => {
                        format!("Duplicate description (first used by {})", group.document_paths[0])
                    }
                };

                if let Some(finding) = rubric.finding_for(group.field_name.finding_code(), message)
                {
                    breakdown.findings.push(finding);
                    breakdown.score = score_from(&breakdown.findings);
                }
            }
        }
    }
}

fn group_field(
    facts: &[(String, Fact)],
    field: DuplicateField,
    value_of: impl Fn(&Fact) -> Option<&str>,
) -> Vec<DuplicateGroup> {
    // Insertion-ordered grouping: the index map points into `groups` so the
    // output follows first-occurrence order.
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (path, fact) in facts {
        let Some(value) = value_of(fact) else { continue };

        match index.get(value) {
            Some(&i) => groups[i].document_paths.push(path.clone()),
            None => {
                index.insert(value.to_string(), groups.len());
                groups.push(DuplicateGroup {
                    field_name: field,
                    value: value.to_string(),
                    document_paths: vec![path.clone()],
                });
            }
        }
    }

    groups.retain(|g| g.document_paths.len() >= 2);
    groups
}
