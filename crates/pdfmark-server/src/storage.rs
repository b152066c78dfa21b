//! Public file storage on the local disk.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const PDF_DIR: &str = "pdfs";
pub const ANNOTATED_DIR: &str = "annotated";

/// Files written under `root`, published under `<public_base_url>/storage/`.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    public_base_url: String,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to `dir/name`, creating `dir` if needed.
    /// Returns the public URL of the stored file.
    pub async fn put(&self, dir: &str, name: &str, bytes: &[u8]) -> io::Result<String> {
        let dir_path = self.root.join(dir);
        fs::create_dir_all(&dir_path).await?;
        fs::write(dir_path.join(name), bytes).await?;
        Ok(self.public_url(dir, name))
    }

    pub fn public_url(&self, dir: &str, name: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base_url, dir, name)
    }
}

/// ASCII slug with `_` as separator: accents folded, lowercased, runs of
/// anything else collapsed into one separator, no leading or trailing `_`.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// `<slug>_<unix-seconds>`
pub fn timestamped(base: &str, unix_seconds: i64) -> String {
    let slug = slug(base);
    if slug.is_empty() {
        unix_seconds.to_string()
    } else {
        format!("{}_{}", slug, unix_seconds)
    }
}

/// File name without its last extension.
pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("My Report (final)"), "my_report_final");
        assert_eq!(slug("  Café  Menü "), "cafe_menu");
        assert_eq!(slug("already_slugged"), "already_slugged");
        assert_eq!(slug("---"), "");
    }

    #[test]
    fn test_timestamped() {
        assert_eq!(timestamped("Report 2024", 1700000000), "report_2024_1700000000");
        assert_eq!(timestamped("???", 5), "5");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("report.final.pdf"), "report.final");
        assert_eq!(file_stem("noext"), "noext");
    }

    #[tokio::test]
    async fn test_put_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path(), "http://host");
        let url = storage.put(PDF_DIR, "a_1.pdf", b"%PDF").await.unwrap();
        assert_eq!(url, "http://host/storage/pdfs/a_1.pdf");
        assert_eq!(std::fs::read(dir.path().join("pdfs/a_1.pdf")).unwrap(), b"%PDF");
    }
}
