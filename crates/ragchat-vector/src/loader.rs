//! Corpus loader.
//!
//! Reads every supported file directly under the data directory (no
//! recursion) into a [`Document`]. Plain text and markdown are read as-is;
//! PDFs go through `pdf-extract`. A file `<name>.meta.toml` next to a
//! document overrides its title, author and date.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, info, warn};

use ragchat_core::error::RagChatError;
use ragchat_core::types::{Document, DocumentMetadata};

const SIDECAR_SUFFIX: &str = ".meta.toml";

/// Kinds of files the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Text,
    Pdf,
}

impl FileKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" => Some(FileKind::Text),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Sidecar {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
}

/// Loads documents from a flat directory.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load all supported documents, ordered by file name.
    ///
    /// A missing directory is an error. Files that fail to parse are skipped
    /// with a warning so one bad PDF does not stop startup.
    pub fn load(&self) -> Result<Vec<Document>, RagChatError> {
        if !self.dir.is_dir() {
            return Err(RagChatError::Corpus(format!(
                "Data directory not found: {}",
                self.dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

        let mut documents = Vec::new();
        for path in paths {
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if file_name.starts_with('.') || file_name.ends_with(SIDECAR_SUFFIX) {
                continue;
            }

            let kind = match FileKind::from_path(&path) {
                Some(kind) => kind,
                None => {
                    warn!(file = %file_name, "Skipping unsupported file");
                    continue;
                }
            };

            match self.load_file(&path, &file_name, kind) {
                Ok(doc) => {
                    debug!(file = %file_name, chars = doc.content.len(), "Document loaded");
                    documents.push(doc);
                }
                Err(e) => warn!(file = %file_name, error = %e, "Skipping unreadable document"),
            }
        }

        info!(
            dir = %self.dir.display(),
            count = documents.len(),
            "Corpus loaded"
        );
        Ok(documents)
    }

    fn load_file(
        &self,
        path: &Path,
        file_name: &str,
        kind: FileKind,
    ) -> Result<Document, RagChatError> {
        let content = match kind {
            FileKind::Text => fs::read_to_string(path)?,
            FileKind::Pdf => {
                let bytes = fs::read(path)?;
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                    RagChatError::Corpus(format!("PDF extraction failed for {}: {}", file_name, e))
                })?
            }
        };

        let mut metadata = DocumentMetadata::new(file_name);
        metadata.date = modified_date(path);

        let sidecar = self.read_sidecar(file_name)?;
        if let Some(title) = sidecar.title {
            metadata.title = Some(title);
        }
        if let Some(author) = sidecar.author {
            metadata.author = Some(author);
        }
        if let Some(date) = sidecar.date {
            metadata.date = Some(date);
        }

        Ok(Document::new(content, metadata))
    }

    fn read_sidecar(&self, file_name: &str) -> Result<Sidecar, RagChatError> {
        let path = self.dir.join(format!("{}{}", file_name, SIDECAR_SUFFIX));
        if !path.is_file() {
            return Ok(Sidecar::default());
        }
        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| {
            RagChatError::Corpus(format!("Invalid metadata file {}: {}", path.display(), e))
        })
    }
}

/// Last-modified time of `path` as `YYYY-MM-DD`.
fn modified_date(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let local: DateTime<Local> = modified.into();
    Some(local.format("%Y-%m-%d").to_string())
}

/// Convenience wrapper for [`CorpusLoader::load`].
pub fn load_corpus(dir: impl Into<PathBuf>) -> Result<Vec<Document>, RagChatError> {
    CorpusLoader::new(dir).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_load_sorted_text_documents() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.md", "# Beta");
        write(&dir, "a.txt", "Alpha text");
        write(&dir, "c.markdown", "Gamma");

        let docs = load_corpus(dir.path()).unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.id()).collect();
        assert_eq!(names, vec!["a.txt", "b.md", "c.markdown"]);
        assert_eq!(docs[0].content, "Alpha text");
    }

    #[test]
    fn test_unsupported_and_hidden_files_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "notes.txt", "keep");
        write(&dir, "image.png", "binary");
        write(&dir, ".hidden.txt", "secret");
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("inner.txt"), "deep").unwrap();

        let docs = load_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "notes.txt");
    }

    #[test]
    fn test_modified_date_format() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.txt", "x");
        let docs = load_corpus(dir.path()).unwrap();
        let date = docs[0].metadata.date.as_deref().unwrap();
        assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
        assert!(docs[0].metadata.title.is_none());
        assert!(docs[0].metadata.author.is_none());
    }

    #[test]
    fn test_sidecar_overrides_metadata() {
        let dir = TempDir::new().unwrap();
        write(&dir, "paper.txt", "body");
        write(
            &dir,
            "paper.txt.meta.toml",
            "title = \"Test Document\"\nauthor = \"Test Author\"\ndate = \"2025-01-01\"\n",
        );

        let docs = load_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        let meta = &docs[0].metadata;
        assert_eq!(meta.title.as_deref(), Some("Test Document"));
        assert_eq!(meta.author.as_deref(), Some("Test Author"));
        assert_eq!(meta.date.as_deref(), Some("2025-01-01"));
    }

    #[test]
    fn test_broken_pdf_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.pdf", "not really a pdf");
        write(&dir, "ok.txt", "fine");

        let docs = load_corpus(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "ok.txt");
    }

    #[test]
    fn test_missing_directory() {
        let err = load_corpus("/nonexistent/ragchat/data").unwrap_err();
        assert!(matches!(err, RagChatError::Corpus(_)));
    }
}
