// Run report assembly and rendering.

use crate::duplicates::{DuplicateGroup, DuplicateIndex};
use crate::rubric::{Finding, FindingKind};
use crate::transform::TransformResult;
use pagecheck_scanner::fact::Fact;
use pagecheck_scanner::store::LoadFailure;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Score thresholds for the pass / needs-work / poor buckets.
pub const PASS_SCORE: u32 = 80;
pub const WARN_SCORE: u32 = 60;

const WORST_LIMIT: usize = 20;

/// Per-document outcome: the score, every finding, and a compact fact
/// summary for report readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub document_path: String,
    pub score: u32,
    pub findings: Vec<Finding>,
    pub facts: FactSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactSummary {
    pub title: Option<String>,
    pub title_length: usize,
    pub description: Option<String>,
    pub description_length: usize,
    pub keyword_count: usize,
    pub h1_count: usize,
    pub has_canonical: bool,
    pub has_schema: bool,
    pub hreflang_count: usize,
    pub og_complete: bool,
}

impl From<&Fact> for FactSummary {
    fn from(fact: &Fact) -> Self {
        Self {
            title: fact.title.clone(),
            title_length: fact.title.as_deref().map(|t| t.chars().count()).unwrap_or(0),
            description: fact.description.clone(),
            description_length: fact
                .description
                .as_deref()
                .map(|d| d.chars().count())
                .unwrap_or(0),
            keyword_count: fact.keywords.len(),
            h1_count: fact.h1_count(),
            has_canonical: fact.canonical.is_some(),
            has_schema: fact.has_valid_schema(),
            hreflang_count: fact.hreflangs.len(),
            og_complete: fact.open_graph.title.is_some()
                && fact.open_graph.description.is_some()
                && fact.open_graph.image.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub average_score: f64,
    pub total_errors: usize,
    pub total_warnings: usize,
    /// Triggered findings per code, in stable (sorted) order.
    pub finding_totals: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub titles: Vec<DuplicateGroup>,
    pub descriptions: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorstOffender {
    pub document_path: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixSummary {
    pub documents_fixed: usize,
    pub already_satisfied: usize,
    pub edits_applied: usize,
    pub backups_created: usize,
    pub manual_fix_required: usize,
    pub write_errors: usize,
}

/// The single artifact a run commits to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub stats: RunStats,
    pub duplicates: DuplicateReport,
    pub worst: Vec<WorstOffender>,
    pub documents: Vec<ScoreBreakdown>,
    pub load_failures: Vec<LoadFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixSummary>,
}

/// Fold per-document results into the run report. Pure function of its
/// inputs; nothing here mutates shared state.
pub fn aggregate(
    mode: &str,
    campaign_id: Option<String>,
    documents: Vec<ScoreBreakdown>,
    duplicates: DuplicateIndex,
    load_failures: Vec<LoadFailure>,
    fix_results: Option<&[TransformResult]>,
) -> RunReport {
    let total = documents.len();
    let passed = documents.iter().filter(|d| d.score >= PASS_SCORE).count();
    let warned = documents
        .iter()
        .filter(|d| d.score >= WARN_SCORE && d.score < PASS_SCORE)
        .count();
    let failed = documents.iter().filter(|d| d.score < WARN_SCORE).count();

    let average_score = if total == 0 {
        0.0
    } else {
        documents.iter().map(|d| d.score as f64).sum::<f64>() / total as f64
    };

    let mut finding_totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;
    for doc in &documents {
        for finding in &doc.findings {
            *finding_totals.entry(finding.code.clone()).or_insert(0) += 1;
            match finding.kind {
                FindingKind::Error => total_errors += 1,
                FindingKind::Warning => total_warnings += 1,
                FindingKind::Info => {}
            }
        }
    }

    let mut worst: Vec<WorstOffender> = documents
        .iter()
        .filter(|d| d.score < PASS_SCORE)
        .map(|d| WorstOffender {
            document_path: d.document_path.clone(),
            score: d.score,
        })
        .collect();
    worst.sort_by(|a, b| {
        a.score
            .cmp(&b.score)
            .then_with(|| a.document_path.cmp(&b.document_path))
    });
    worst.truncate(WORST_LIMIT);

    let fix = fix_results.map(|results| FixSummary {
        documents_fixed: results
            .iter()
            .filter(|r| r.edits_applied > 0 && r.error.is_none())
            .count(),
        already_satisfied: results
            .iter()
            .filter(|r| r.edits_applied == 0 && r.error.is_none())
            .count(),
        edits_applied: results.iter().map(|r| r.edits_applied).sum(),
        backups_created: results.iter().filter(|r| r.backup.is_some()).count(),
        manual_fix_required: results.iter().filter(|r| !r.manual.is_empty()).count(),
        write_errors: results.iter().filter(|r| r.error.is_some()).count(),
    });

    RunReport {
        timestamp: Utc::now().to_rfc3339(),
        mode: mode.to_string(),
        campaign_id,
        stats: RunStats {
            total,
            passed,
            warned,
            failed,
            average_score,
            total_errors,
            total_warnings,
            finding_totals,
        },
        duplicates: DuplicateReport {
            titles: duplicates.titles,
            descriptions: duplicates.descriptions,
        },
        worst,
        documents,
        load_failures,
        fix,
    }
}

fn colored_score(score: u32) -> String {
    match score {
        s if s >= PASS_SCORE => format!("\x1b[32m{}\x1b[0m", s), // Green
        s if s >= WARN_SCORE => format!("\x1b[33m{}\x1b[0m", s), // Yellow
        s => format!("\x1b[31m{}\x1b[0m", s),                    // Red
    }
}

pub fn generate_text_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("              PAGECHECK SEO AUDIT REPORT\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Generated:    {}\n", report.timestamp));
    out.push_str(&format!("Mode:         {}\n", report.mode));
    if let Some(ref campaign) = report.campaign_id {
        out.push_str(&format!("Campaign:     {}\n", campaign));
    }
    out.push_str(&format!("Documents:    {}\n", report.stats.total));
    if !report.load_failures.is_empty() {
        out.push_str(&format!(
            "Load errors:  {} (excluded from scoring)\n",
            report.load_failures.len()
        ));
    }
    out.push_str(&format!(
        "Average:      {:.2}/100\n\n",
        report.stats.average_score
    ));

    out.push_str("Score distribution:\n");
    out.push_str(&format!(
        "  Good (>= {}):        {}\n",
        PASS_SCORE, report.stats.passed
    ));
    out.push_str(&format!(
        "  Needs work ({}-{}):  {}\n",
        WARN_SCORE,
        PASS_SCORE - 1,
        report.stats.warned
    ));
    out.push_str(&format!(
        "  Poor (< {}):         {}\n\n",
        WARN_SCORE, report.stats.failed
    ));

    if !report.stats.finding_totals.is_empty() {
        out.push_str("Findings by code:\n");
        for (code, count) in &report.stats.finding_totals {
            out.push_str(&format!("  {:<24} {}\n", code, count));
        }
        out.push('\n');
    }

    if !report.worst.is_empty() {
        out.push_str("Pages needing attention:\n");
        for offender in &report.worst {
            out.push_str(&format!(
                "  {} {}\n",
                colored_score(offender.score),
                offender.document_path
            ));
        }
        out.push('\n');
    }

    let duplicate_count = report.duplicates.titles.len() + report.duplicates.descriptions.len();
    if duplicate_count > 0 {
        out.push_str("Duplicates:\n");
        for group in &report.duplicates.titles {
            out.push_str(&format!(
                "  title \"{}\" used by {} pages\n",
                group.value,
                group.document_paths.len()
            ));
        }
        for group in &report.duplicates.descriptions {
            out.push_str(&format!(
                "  description shared by {} pages (first: {})\n",
                group.document_paths.len(),
                group.document_paths[0]
            ));
        }
        out.push('\n');
    }

    if let Some(ref fix) = report.fix {
        out.push_str("Fix run:\n");
        out.push_str(&format!("  Documents fixed:     {}\n", fix.documents_fixed));
        out.push_str(&format!("  Already satisfied:   {}\n", fix.already_satisfied));
        out.push_str(&format!("  Edits applied:       {}\n", fix.edits_applied));
        out.push_str(&format!("  Backups created:     {}\n", fix.backups_created));
        out.push_str(&format!("  Manual fixes needed: {}\n", fix.manual_fix_required));
        if fix.write_errors > 0 {
            out.push_str(&format!("  Write errors:        {}\n", fix.write_errors));
        }
        out.push('\n');
    }

    if !report.load_failures.is_empty() {
        out.push_str("Load failures:\n");
        for failure in &report.load_failures {
            out.push_str(&format!("  {} ({})\n", failure.path, failure.reason));
        }
        out.push('\n');
    }

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out
}

pub fn generate_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
