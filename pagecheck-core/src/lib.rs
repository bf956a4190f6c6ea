pub mod audit;
pub mod duplicates;
pub mod report;
pub mod rubric;
mod splice;
pub mod transform;

pub fn print_banner() {
    println!(
        r#"
  ___  __ _ __ _  ___  __| |_   ___  __| |__
 | _ \/ _` / _` |/ -_)/ _| ' \ / -_)/ _| / /
 | __/\__,_\__, |\___|\__|_||_|\___|\__|_\_\
 |_|       |___/
"#
    );
    println!(
        "  pagecheck v{} - SEO rubric scanner and fixer\n",
        env!("CARGO_PKG_VERSION")
    );
}
