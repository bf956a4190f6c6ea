use scraper::Html;
use std::path::PathBuf;

/// One HTML file under analysis.
///
/// `path` is the `/`-separated location relative to the corpus root (with a
/// leading `/`), which is what reports and duplicate groups key on.
/// `raw_text` is the content exactly as read from disk; `tree` is the parsed
/// DOM that extraction and fix planning run against.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: String,
    pub disk_path: PathBuf,
    pub raw_text: String,
    pub tree: Html,
}

impl Document {
    pub fn parse(path: String, disk_path: PathBuf, raw_text: String) -> Self {
        let tree = Html::parse_document(&raw_text);
        Self {
            path,
            disk_path,
            raw_text,
            tree,
        }
    }

    /// Rebuild the tree from new content, e.g. after edits were applied.
    pub fn with_content(&self, raw_text: String) -> Self {
        Self::parse(self.path.clone(), self.disk_path.clone(), raw_text)
    }
}
