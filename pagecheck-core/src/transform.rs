// Fix planning and application: minimal idempotent edits, backed up once
// per campaign, written atomically.

use crate::rubric::Finding;
use crate::splice::{self, TagSelector, escape_attr, escape_text};
use chrono::Utc;
use pagecheck_scanner::{Document, FactExtractor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

const DESCRIPTION_SELECTOR: &str = r#"meta[name="description"]"#;
const SCHEMA_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Default replacement content, supplied by the caller. The core never
/// invents copy of its own.
pub trait ContentGenerator {
    fn title_for(&self, path: &str) -> String;
    fn description_for(&self, path: &str) -> String;
    fn keywords_for(&self, path: &str) -> Vec<String>;
    fn canonical_for(&self, path: &str) -> Option<String>;
    fn og_image_for(&self, path: &str) -> Option<String>;
    fn schema_for(&self, path: &str, title: &str, description: &str)
    -> Option<serde_json::Value>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    InsertTagsAfterHead {
        tags: Vec<String>,
    },
    ReplaceAttr {
        selector: String,
        attr: String,
        value: String,
    },
    RemoveBlock {
        selector: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationPlan {
    pub document_path: String,
    pub edits: Vec<Edit>,
    /// Finding codes with no known remediation, reported as manual work.
    pub manual: Vec<String>,
}

impl TransformationPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub document_path: String,
    pub backup_path: String,
    pub created_at: String,
}

/// Outcome of applying one plan to one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResult {
    pub document_path: String,
    pub edits_applied: usize,
    pub backup: Option<BackupRecord>,
    pub backup_reused: bool,
    pub manual: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransformResult {
    pub fn failed(document_path: String, manual: Vec<String>, error: String) -> Self {
        Self {
            document_path,
            edits_applied: 0,
            backup: None,
            backup_reused: false,
            manual,
            error: Some(error),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Could not read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Backup write failed for {path}: {source}")]
    BackupFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Write failed for {path}: {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Edit could not be applied to {path}: {reason}")]
    EditFailed { path: String, reason: String },
}

pub struct Transformer<'a> {
    campaign_id: String,
    generator: &'a dyn ContentGenerator,
}

impl<'a> Transformer<'a> {
    pub fn new(campaign_id: impl Into<String>, generator: &'a dyn ContentGenerator) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            generator,
        }
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    /// Map findings to edits, re-checking the document's current tree before
    /// emitting each one. On a document that already satisfies a finding's
    /// rule (e.g. a previous campaign fixed it) the edit is simply not
    /// planned — this is what makes re-runs no-ops.
    pub fn plan(&self, document: &Document, findings: &[Finding]) -> TransformationPlan {
        let fact = FactExtractor::new().extract(&document.tree);
        let path = document.path.as_str();

        let mut edits = Vec::new();
        let mut inserts: Vec<String> = Vec::new();
        let mut manual = Vec::new();

        for finding in findings {
            match finding.code.as_str() {
                "missing-title" => {
                    if fact.title.is_none() {
                        inserts.push(format!(
                            "<title>{}</title>",
                            escape_text(&self.generator.title_for(path))
                        ));
                    }
                }
                "missing-description" => {
                    if fact.description.is_none() {
                        inserts.push(meta_named(
                            "description",
                            &self.generator.description_for(path),
                        ));
                    }
                }
                "missing-keywords" => {
                    if fact.keywords.is_empty() {
                        let keywords = self.generator.keywords_for(path).join(", ");
                        inserts.push(meta_named("keywords", &keywords));
                    }
                }
                "missing-canonical" => {
                    if fact.canonical.is_none() {
                        match self.generator.canonical_for(path) {
                            Some(href) => inserts.push(format!(
                                r#"<link rel="canonical" href="{}">"#,
                                escape_attr(&href)
                            )),
                            None => manual.push(finding.code.clone()),
                        }
                    }
                }
                "missing-og-title" => {
                    if fact.open_graph.title.is_none() {
                        let title = fact
                            .title
                            .clone()
                            .unwrap_or_else(|| self.generator.title_for(path));
                        inserts.push(meta_property("og:title", &title));
                    }
                }
                "missing-og-description" => {
                    if fact.open_graph.description.is_none() {
                        let description = fact
                            .description
                            .clone()
                            .unwrap_or_else(|| self.generator.description_for(path));
                        inserts.push(meta_property("og:description", &description));
                    }
                }
                "missing-og-image" => {
                    if fact.open_graph.image.is_none() {
                        match self.generator.og_image_for(path) {
                            Some(image) => inserts.push(meta_property("og:image", &image)),
                            None => manual.push(finding.code.clone()),
                        }
                    }
                }
                "missing-twitter-card" => {
                    if fact.twitter.card.is_none() {
                        inserts.push(meta_named("twitter:card", "summary_large_image"));
                    }
                }
                "description-length" => {
                    if let Some(current) = fact.description.as_deref()
                        && let Some(value) = clamped_description(current, || {
                            self.generator.description_for(path)
                        })
                    {
                        edits.push(Edit::ReplaceAttr {
                            selector: DESCRIPTION_SELECTOR.to_string(),
                            attr: "content".to_string(),
                            value,
                        });
                    }
                }
                "missing-schema" => {
                    if !fact.has_valid_schema() {
                        let title = fact
                            .title
                            .clone()
                            .unwrap_or_else(|| self.generator.title_for(path));
                        let description = fact
                            .description
                            .clone()
                            .unwrap_or_else(|| self.generator.description_for(path));

                        match self.generator.schema_for(path, &title, &description) {
                            Some(schema) => {
                                if fact.invalid_schema_blocks > 0 {
                                    edits.push(Edit::RemoveBlock {
                                        selector: SCHEMA_SELECTOR.to_string(),
                                    });
                                }
                                inserts.push(format!(
                                    "<script type=\"application/ld+json\">\n{}\n</script>",
                                    serde_json::to_string_pretty(&schema)
                                        .unwrap_or_else(|_| "{}".to_string())
                                ));
                            }
                            None => manual.push(finding.code.clone()),
                        }
                    }
                }
                // Length problems on titles, heading structure, hreflang
                // sets and duplicates need a human (or at least content
                // decisions this core refuses to make).
                _ => manual.push(finding.code.clone()),
            }
        }

        if !inserts.is_empty() {
            edits.push(Edit::InsertTagsAfterHead { tags: inserts });
        }

        debug!(
            "Planned {} edit(s), {} manual for {}",
            edits.len(),
            manual.len(),
            document.path
        );

        TransformationPlan {
            document_path: document.path.clone(),
            edits,
            manual,
        }
    }

    /// Apply a plan in the order: backup (at most once per campaign), edit,
    /// atomic write. An empty plan touches nothing on disk.
    pub fn apply(
        &self,
        document: &Document,
        plan: &TransformationPlan,
    ) -> Result<TransformResult, TransformError> {
        if plan.is_empty() {
            return Ok(TransformResult {
                document_path: document.path.clone(),
                edits_applied: 0,
                backup: None,
                backup_reused: false,
                manual: plan.manual.clone(),
                error: None,
            });
        }

        let disk_path = &document.disk_path;
        let backup_path = PathBuf::from(format!(
            "{}.backup-{}",
            disk_path.display(),
            self.campaign_id
        ));

        // Snapshot what is on disk right now, not what was loaded earlier.
        let current = fs::read(disk_path).map_err(|source| TransformError::ReadFailed {
            path: document.path.clone(),
            source,
        })?;

        let (backup, backup_reused) = if backup_path.exists() {
            // A backup from this campaign already holds the true original;
            // it must never be overwritten.
            debug!("Backup already exists, keeping it: {}", backup_path.display());
            (None, true)
        } else {
            fs::write(&backup_path, &current).map_err(|source| TransformError::BackupFailed {
                path: document.path.clone(),
                source,
            })?;
            (
                Some(BackupRecord {
                    document_path: document.path.clone(),
                    backup_path: backup_path.display().to_string(),
                    created_at: Utc::now().to_rfc3339(),
                }),
                false,
            )
        };

        let mut text =
            String::from_utf8(current).map_err(|_| TransformError::EditFailed {
                path: document.path.clone(),
                reason: "document is no longer valid UTF-8".to_string(),
            })?;

        for edit in &plan.edits {
            text = self.apply_edit(&document.path, text, edit)?;
        }

        // Temp-then-rename keeps the original intact if the write dies.
        let tmp_path = PathBuf::from(format!("{}.tmp-{}", disk_path.display(), self.campaign_id));
        fs::write(&tmp_path, &text).map_err(|source| TransformError::WriteFailed {
            path: document.path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, disk_path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            TransformError::WriteFailed {
                path: document.path.clone(),
                source,
            }
        })?;

        info!(
            "Applied {} edit(s) to {} (campaign {})",
            plan.edits.len(),
            document.path,
            self.campaign_id
        );

        Ok(TransformResult {
            document_path: document.path.clone(),
            edits_applied: plan.edits.len(),
            backup,
            backup_reused,
            manual: plan.manual.clone(),
            error: None,
        })
    }

    fn apply_edit(
        &self,
        path: &str,
        text: String,
        edit: &Edit,
    ) -> Result<String, TransformError> {
        match edit {
            Edit::InsertTagsAfterHead { tags } => splice::insert_after_head(&text, tags)
                .ok_or_else(|| TransformError::EditFailed {
                    path: path.to_string(),
                    reason: "no <head> or <html> tag to insert after".to_string(),
                }),
            Edit::ReplaceAttr {
                selector,
                attr,
                value,
            } => {
                let parsed =
                    TagSelector::parse(selector).ok_or_else(|| TransformError::EditFailed {
                        path: path.to_string(),
                        reason: format!("unsupported selector: {}", selector),
                    })?;
                splice::replace_attr(&text, &parsed, attr, value).ok_or_else(|| {
                    TransformError::EditFailed {
                        path: path.to_string(),
                        reason: format!("no element matches {}", selector),
                    }
                })
            }
            Edit::RemoveBlock { selector } => {
                let parsed =
                    TagSelector::parse(selector).ok_or_else(|| TransformError::EditFailed {
                        path: path.to_string(),
                        reason: format!("unsupported selector: {}", selector),
                    })?;
                // Nothing left to remove means the goal is already met.
                let (out, _removed) = splice::remove_blocks(&text, &parsed);
                Ok(out)
            }
        }
    }
}

fn meta_named(name: &str, content: &str) -> String {
    format!(
        r#"<meta name="{}" content="{}">"#,
        name,
        escape_attr(content)
    )
}

fn meta_property(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}">"#,
        property,
        escape_attr(content)
    )
}

/// Bring an out-of-range description back into range: over-long text is
/// truncated on a character boundary with an ellipsis, under-length text is
/// replaced wholesale by generated copy. In-range input plans nothing.
fn clamped_description(current: &str, regenerate: impl FnOnce() -> String) -> Option<String> {
    let (min, max) = crate::rubric::DESCRIPTION_LENGTH;
    let len = current.chars().count();

    if len > max {
        let truncated: String = current.chars().take(max - 3).collect();
        Some(format!("{}...", truncated.trim_end()))
    } else if len < min {
        Some(regenerate())
    } else {
        None
    }
}
