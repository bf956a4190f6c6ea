use crate::document::Document;
use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EXCLUDED_DIRS: &[&str] = &["node_modules"];
const BACKUP_MARKER: &str = "backup";

/// Discovers and loads the HTML corpus under a root directory.
///
/// Discovery order is lexicographic by full path, so every downstream
/// "first occurrence wins" decision is stable across runs.
pub struct DocumentStore {
    root: PathBuf,
}

/// A document that could not be read or decoded. Recorded in the report and
/// excluded from scoring; never aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadFailure {
    pub path: String,
    pub reason: String,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root recursively and return every `.html` file, sorted.
    ///
    /// Hidden directories, `node_modules`, and anything carrying a backup
    /// marker in its name are skipped. An unenumerable directory is the one
    /// error that fails the whole run.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ScanError::InvalidRoot(self.root.display().to_string()));
        }

        let mut found = Vec::new();
        Self::walk(&self.root, &mut found)?;
        found.sort();

        debug!("Discovered {} documents under {}", found.len(), self.root.display());
        Ok(found)
    }

    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if name.starts_with('.')
                    || EXCLUDED_DIRS.contains(&name.as_str())
                    || Self::is_backup(&name)
                {
                    continue;
                }
                Self::walk(&entry.path(), out)?;
            } else if file_type.is_file() && name.ends_with(".html") && !Self::is_backup(&name) {
                out.push(entry.path());
            }
        }
        Ok(())
    }

    fn is_backup(name: &str) -> bool {
        name.to_ascii_lowercase().contains(BACKUP_MARKER)
    }

    /// Read and parse one discovered file.
    pub fn load(&self, disk_path: &Path) -> std::result::Result<Document, LoadFailure> {
        let path = self.relative_url_path(disk_path);

        let bytes = fs::read(disk_path).map_err(|e| {
            warn!("Failed to read {}: {}", disk_path.display(), e);
            LoadFailure {
                path: path.clone(),
                reason: format!("unreadable: {}", e),
            }
        })?;

        let raw_text = String::from_utf8(bytes).map_err(|_| LoadFailure {
            path: path.clone(),
            reason: "not valid UTF-8".to_string(),
        })?;

        if raw_text.trim().is_empty() {
            return Err(LoadFailure {
                path,
                reason: "empty document".to_string(),
            });
        }

        Ok(Document::parse(path, disk_path.to_path_buf(), raw_text))
    }

    /// `/`-separated path relative to the corpus root, with a leading `/`.
    pub fn relative_url_path(&self, disk_path: &Path) -> String {
        let rel = disk_path.strip_prefix(&self.root).unwrap_or(disk_path);
        let joined = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_discover_finds_html_sorted() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "zebra.html", b"<html></html>");
        write_file(tmp.path(), "alpha.html", b"<html></html>");
        write_file(tmp.path(), "sub/nested.html", b"<html></html>");
        write_file(tmp.path(), "notes.txt", b"not html");

        let store = DocumentStore::new(tmp.path());
        let found = store.discover().unwrap();

        let rel: Vec<String> = found.iter().map(|p| store.relative_url_path(p)).collect();
        assert_eq!(rel, vec!["/alpha.html", "/sub/nested.html", "/zebra.html"]);
    }

    #[test]
    fn test_discover_skips_excluded_directories_and_backups() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "index.html", b"<html></html>");
        write_file(tmp.path(), ".git/objects/page.html", b"<html></html>");
        write_file(tmp.path(), "node_modules/pkg/page.html", b"<html></html>");
        write_file(tmp.path(), "index.html.backup-seo", b"<html></html>");
        write_file(tmp.path(), "old-BACKUP.html", b"<html></html>");

        let store = DocumentStore::new(tmp.path());
        let found = store.discover().unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(store.relative_url_path(&found[0]), "/index.html");
    }

    #[test]
    fn test_discover_rejects_missing_root() {
        let store = DocumentStore::new("/definitely/not/here");
        assert!(matches!(store.discover(), Err(ScanError::InvalidRoot(_))));
    }

    #[test]
    fn test_load_produces_relative_path_and_tree() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "sub/page.html",
            b"<html><head><title>Hi there</title></head></html>",
        );

        let store = DocumentStore::new(tmp.path());
        let doc = store.load(&path).unwrap();

        assert_eq!(doc.path, "/sub/page.html");
        assert_eq!(doc.disk_path, path);
        assert!(doc.raw_text.contains("Hi there"));
    }

    #[test]
    fn test_load_reports_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "bad.html", &[0x3c, 0xff, 0xfe, 0x3e]);

        let store = DocumentStore::new(tmp.path());
        let err = store.load(&path).unwrap_err();

        assert_eq!(err.path, "/bad.html");
        assert!(err.reason.contains("UTF-8"));
    }

    #[test]
    fn test_load_reports_empty_document() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "empty.html", b"   \n  ");

        let store = DocumentStore::new(tmp.path());
        let err = store.load(&path).unwrap_err();

        assert_eq!(err.reason, "empty document");
    }

    #[test]
    fn test_load_reports_unreadable_file() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());
        let err = store.load(&tmp.path().join("missing.html")).unwrap_err();

        assert!(err.reason.starts_with("unreadable:"));
    }
}
