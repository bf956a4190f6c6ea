use clap::ArgMatches;
use colored::Colorize;
use pagecheck_core::audit::{AuditMode, AuditOptions, execute_audit};
use pagecheck_core::report::{self, RunReport};
use pagecheck_core::rubric::{FindingKind, RubricEngine};
use pagecheck_core::transform::ContentGenerator;
use std::path::PathBuf;
use tracing::info;
use url::Url;
use uuid::Uuid;

/// Default replacement copy for fix runs, derived from the page's location.
/// Titles land inside the 10-60 range and descriptions inside 50-160, so a
/// fixed document satisfies the length rules on re-analysis.
pub struct SiteContent {
    base_url: Option<Url>,
}

impl SiteContent {
    pub fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }
}

impl ContentGenerator for SiteContent {
    fn title_for(&self, path: &str) -> String {
        clamp_chars(&format!("{} - Overview and Resources", page_name(path)), 60)
    }

    fn description_for(&self, path: &str) -> String {
        clamp_chars(
            &format!(
                "{}: practical guidance, feature overviews and reference \
                material for this page, kept current by the site team.",
                page_name(path)
            ),
            160,
        )
    }

    fn keywords_for(&self, path: &str) -> Vec<String> {
        vec![
            page_name(path).to_lowercase(),
            "guide".to_string(),
            "overview".to_string(),
            "reference".to_string(),
        ]
    }

    fn canonical_for(&self, path: &str) -> Option<String> {
        let base = self.base_url.as_ref()?;
        let clean = path.trim_end_matches(".html");
        base.join(clean).ok().map(|u| u.to_string())
    }

    fn og_image_for(&self, _path: &str) -> Option<String> {
        let base = self.base_url.as_ref()?;
        base.join("/og-image.png").ok().map(|u| u.to_string())
    }

    fn schema_for(
        &self,
        path: &str,
        title: &str,
        description: &str,
    ) -> Option<serde_json::Value> {
        let mut schema = serde_json::json!({
            "@context": "https://schema.org",
            "@type": "WebPage",
            "name": title,
            "description": description,
        });
        if let Some(url) = self.canonical_for(path) {
            schema["url"] = serde_json::Value::String(url);
        }
        Some(schema)
    }
}

/// Human-readable page name from a corpus path:
/// `/docs/getting-started.html` becomes `Getting Started`.
pub fn page_name(path: &str) -> String {
    let trimmed = path.trim_end_matches(".html");
    let segment = trimmed
        .rsplit('/')
        .find(|s| !s.is_empty() && *s != "index")
        .unwrap_or("");

    if segment.is_empty() {
        return "Home".to_string();
    }

    segment
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

fn clamp_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated.trim_end())
    }
}

/// Short random campaign id for fix runs started without `--campaign`.
pub fn default_campaign_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn expand_root(args: &ArgMatches) -> PathBuf {
    let dir = args.get_one::<String>("DIR").unwrap();
    let expanded = shellexpand::tilde(dir);
    PathBuf::from(expanded.as_ref())
}

fn save_report_if_requested(run_report: &RunReport, path: Option<&PathBuf>) {
    let Some(path) = path else { return };

    let json = match report::generate_json_report(run_report) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("{} Could not serialize report: {}", "✗".red().bold(), e);
            return;
        }
    };

    match report::save_report(&json, path) {
        Ok(()) => {
            info!("Report written to {}", path.display());
            println!(
                "{} Report saved: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        Err(e) => eprintln!(
            "{} Failed to save report to {}: {}",
            "✗".red().bold(),
            path.display(),
            e
        ),
    }
}

pub fn handle_analyze(args: &ArgMatches) {
    tracing_subscriber::fmt::init();

    let root = expand_root(args);
    let base_url = args.get_one::<Url>("base-url").cloned();
    let report_path = args.get_one::<PathBuf>("report");

    print_divider();
    println!("{}", "  PAGECHECK ANALYZE".bright_white().bold());
    print_divider();
    println!();
    println!(
        "{} Corpus: {}",
        "→".blue(),
        root.display().to_string().bright_white()
    );
    println!();

    let options = AuditOptions {
        root_dir: root,
        mode: AuditMode::Analyze,
        campaign_id: String::new(),
        show_progress: true,
    };
    let generator = SiteContent::new(base_url);

    let run_report = match execute_audit(&options, &generator, None) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!();
    print!("{}", report::generate_text_report(&run_report));
    println!();

    save_report_if_requested(&run_report, report_path);

    if run_report.stats.total == 0 {
        eprintln!("{} No documents were scored.", "✗".red().bold());
        std::process::exit(1);
    }

    if run_report.stats.average_score < f64::from(report::PASS_SCORE) {
        eprintln!(
            "{} Average score {:.2} is below {}. Review and fix the findings above.",
            "✗".red().bold(),
            run_report.stats.average_score,
            report::PASS_SCORE
        );
        std::process::exit(1);
    }

    println!(
        "{} Audit complete. Average score: {:.2}/100",
        "✓".green().bold(),
        run_report.stats.average_score
    );
}

pub fn handle_fix(args: &ArgMatches) {
    tracing_subscriber::fmt::init();

    let root = expand_root(args);
    let base_url = args.get_one::<Url>("base-url").cloned();
    let report_path = args.get_one::<PathBuf>("report");
    let campaign_id = args
        .get_one::<String>("campaign")
        .cloned()
        .unwrap_or_else(default_campaign_id);

    print_divider();
    println!("{}", "  PAGECHECK FIX".bright_white().bold());
    print_divider();
    println!();
    println!(
        "{} Corpus:   {}",
        "→".blue(),
        root.display().to_string().bright_white()
    );
    println!(
        "{} Campaign: {}",
        "→".blue(),
        campaign_id.bright_white()
    );
    println!();

    let options = AuditOptions {
        root_dir: root,
        mode: AuditMode::Fix,
        campaign_id,
        show_progress: true,
    };
    let generator = SiteContent::new(base_url);

    let run_report = match execute_audit(&options, &generator, None) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!();
    print!("{}", report::generate_text_report(&run_report));
    println!();

    save_report_if_requested(&run_report, report_path);

    if let Some(ref fix) = run_report.fix {
        if fix.write_errors > 0 {
            eprintln!(
                "{} {} document(s) could not be written; their originals are untouched.",
                "✗".red().bold(),
                fix.write_errors
            );
            std::process::exit(1);
        }

        println!(
            "{} Fixed {} document(s), {} already satisfied every remediable rule.",
            "✓".green().bold(),
            fix.documents_fixed,
            fix.already_satisfied
        );
    }
}

pub fn handle_rules() {
    let rubric = RubricEngine::new();

    print_divider();
    println!("{}", "  RUBRIC RULES".bright_white().bold());
    print_divider();
    println!();

    for rule in rubric.rules() {
        let kind = format!("{:<8}", rule.kind.as_str());
        let kind = match rule.kind {
            FindingKind::Error => kind.red().bold(),
            FindingKind::Warning => kind.yellow(),
            FindingKind::Info => kind.blue(),
        };
        let scope = if rule.check.is_some() { "" } else { "  (corpus-wide)" };
        println!("  {:<24} {} -{:<3}{}", rule.code, kind, rule.weight, scope);
    }
    println!();
}
