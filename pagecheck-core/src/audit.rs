// Audit orchestration: discover, extract, score, dedupe, optionally fix.

use crate::duplicates::DuplicateIndex;
use crate::report::{self, RunReport, ScoreBreakdown};
use crate::rubric::RubricEngine;
use crate::transform::{ContentGenerator, TransformResult, Transformer};
use indicatif::{ProgressBar, ProgressStyle};
use pagecheck_scanner::{Document, DocumentStore, FactExtractor, ScanError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    Analyze,
    Fix,
}

impl AuditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditMode::Analyze => "analyze",
            AuditMode::Fix => "fix",
        }
    }
}

/// Options for configuring an audit run.
pub struct AuditOptions {
    pub root_dir: PathBuf,
    pub mode: AuditMode,
    pub campaign_id: String,
    pub show_progress: bool,
}

/// Callback for reporting audit progress messages.
pub type AuditProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute an audit with the given options. Returns the run report.
///
/// Documents are processed one at a time, fully, so each file's
/// backup-then-write sequence is naturally a critical section. Only an
/// unenumerable root directory is a run-level error; everything per-document
/// is captured in the report instead.
pub fn execute_audit(
    options: &AuditOptions,
    generator: &dyn ContentGenerator,
    progress_callback: Option<AuditProgressCallback>,
) -> Result<RunReport, ScanError> {
    let store = DocumentStore::new(&options.root_dir);
    let paths = store.discover()?;

    info!(
        "Auditing {} documents under {} ({})",
        paths.len(),
        options.root_dir.display(),
        options.mode.as_str()
    );

    if let Some(ref callback) = progress_callback {
        callback(format!("Discovered {} documents", paths.len()));
    }

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Analyzing...");
        Some(pb)
    } else {
        None
    };

    let extractor = FactExtractor::new();
    let rubric = RubricEngine::new();

    let mut loaded: Vec<Document> = Vec::new();
    let mut breakdowns: Vec<ScoreBreakdown> = Vec::new();
    let mut facts = Vec::new();
    let mut load_failures = Vec::new();

    for (idx, path) in paths.iter().enumerate() {
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!("Analyzing... {}/{}", idx + 1, paths.len()));
            pb.tick();
        }

        match store.load(path) {
            Ok(document) => {
                let fact = extractor.extract(&document.tree);
                let evaluation = rubric.evaluate(&fact);

                breakdowns.push(ScoreBreakdown {
                    document_path: document.path.clone(),
                    score: evaluation.score,
                    findings: evaluation.findings,
                    facts: (&fact).into(),
                });
                facts.push((document.path.clone(), fact));
                loaded.push(document);
            }
            Err(failure) => {
                warn!("Skipping {}: {}", failure.path, failure.reason);
                load_failures.push(failure);
            }
        }
    }

    // Second pass: duplicates across the whole corpus.
    let duplicates = DuplicateIndex::build(&facts);
    duplicates.apply_to(&rubric, &mut breakdowns);

    let fix_results: Option<Vec<TransformResult>> = match options.mode {
        AuditMode::Analyze => None,
        AuditMode::Fix => {
            if let Some(ref pb) = progress_bar {
                pb.set_message("Applying fixes...");
            }
            Some(run_fix_pass(
                &loaded,
                &breakdowns,
                &options.campaign_id,
                generator,
            ))
        }
    };

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Audit complete: {} documents", breakdowns.len()));
    }

    let campaign_id = match options.mode {
        AuditMode::Fix => Some(options.campaign_id.clone()),
        AuditMode::Analyze => None,
    };

    Ok(report::aggregate(
        options.mode.as_str(),
        campaign_id,
        breakdowns,
        duplicates,
        load_failures,
        fix_results.as_deref(),
    ))
}

/// Plan and apply fixes, one document fully before the next. A failed write
/// aborts that document only; the original file stays as the backup left it.
fn run_fix_pass(
    documents: &[Document],
    breakdowns: &[ScoreBreakdown],
    campaign_id: &str,
    generator: &dyn ContentGenerator,
) -> Vec<TransformResult> {
    let transformer = Transformer::new(campaign_id, generator);
    let mut results = Vec::with_capacity(documents.len());

    for (document, breakdown) in documents.iter().zip(breakdowns) {
        let plan = transformer.plan(document, &breakdown.findings);
        match transformer.apply(document, &plan) {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Fix failed for {}: {}", document.path, e);
                results.push(TransformResult::failed(
                    document.path.clone(),
                    plan.manual.clone(),
                    e.to_string(),
                ));
            }
        }
    }

    results
}
