use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tangent_core::{normalize_slug, Document};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum RawContentError {
    #[error("invalid slug")]
    InvalidSlug,
    #[error("content not found")]
    NotFound,
}

#[derive(Default)]
struct StoreInner {
    /// `None` until the first successful load.
    documents: Option<Arc<Vec<Document>>>,
    paths: HashMap<String, PathBuf>,
}

/// In-memory corpus of parsed markdown documents.
///
/// `load` replaces the whole corpus atomically; readers always see either
/// the previous snapshot or the new one, never a partial scan.
pub struct ContentStore {
    dir: PathBuf,
    inner: RwLock<StoreInner>,
}

impl ContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ContentStore {
            dir: dir.into(),
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Scan the content directory and parse every markdown file. Documents
    /// with malformed frontmatter are skipped with a warning; a missing
    /// directory is an error. Returns the number of documents loaded.
    pub fn load(&self) -> Result<usize> {
        if !self.dir.is_dir() {
            return Err(anyhow!(
                "content directory {} does not exist",
                self.dir.display()
            ));
        }

        let mut documents = Vec::new();
        let mut paths = HashMap::new();

        for entry in WalkDir::new(&self.dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let slug = normalize_slug(stem);

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read document");
                    continue;
                }
            };

            match Document::from_markdown(&slug, &raw) {
                Ok(doc) => {
                    paths.insert(slug, path.to_path_buf());
                    documents.push(doc);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable document");
                }
            }
        }

        // Fixed iteration order keeps index builds deterministic across runs
        documents.sort_by(|a, b| a.slug.cmp(&b.slug));
        let count = documents.len();

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.documents = Some(Arc::new(documents));
        inner.paths = paths;

        Ok(count)
    }

    /// Snapshot of the loaded corpus. Errors until a load has succeeded.
    pub fn documents(&self) -> Result<Arc<Vec<Document>>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .documents
            .clone()
            .ok_or_else(|| anyhow!("content store has not been loaded"))
    }

    pub fn get(&self, slug: &str) -> Option<Document> {
        let docs = self.documents().ok()?;
        docs.iter().find(|d| d.slug == slug).cloned()
    }

    /// Re-read a document's raw markdown from disk. Slugs that could name
    /// anything outside the content directory are rejected outright.
    pub fn raw(&self, slug: &str) -> Result<String, RawContentError> {
        if slug.is_empty()
            || slug.contains("..")
            || slug.contains('/')
            || slug.contains('\\')
            || slug.contains('\0')
        {
            return Err(RawContentError::InvalidSlug);
        }

        let path = {
            let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
            inner.paths.get(slug).cloned()
        };
        let Some(path) = path else {
            return Err(RawContentError::NotFound);
        };

        std::fs::read_to_string(&path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to read raw content");
            RawContentError::NotFound
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_note(dir: &std::path::Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_markdown_files_sorted_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "Zebra.md", "---\ntitle: Zebra\n---\nbody");
        write_note(dir.path(), "apple.md", "body only");
        write_note(dir.path(), "notes.txt", "not markdown");

        let store = ContentStore::new(dir.path());
        assert_eq!(store.load().unwrap(), 2);

        let docs = store.documents().unwrap();
        let slugs: Vec<&str> = docs.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["apple", "zebra"]);
    }

    #[test]
    fn nested_directories_are_scanned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_note(&dir.path().join("sub"), "Deep Note.md", "nested");

        let store = ContentStore::new(dir.path());
        store.load().unwrap();
        assert!(store.get("deep-note").is_some());
    }

    #[test]
    fn malformed_frontmatter_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "good.md", "fine");
        write_note(dir.path(), "bad.md", "---\ntitle: [unclosed\n---\nbody");

        let store = ContentStore::new(dir.path());
        assert_eq!(store.load().unwrap(), 1);
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let store = ContentStore::new("/definitely/not/a/real/dir");
        assert!(store.load().is_err());
    }

    #[test]
    fn documents_errors_before_first_load() {
        let store = ContentStore::new(".");
        assert!(store.documents().is_err());
    }

    #[test]
    fn raw_reads_from_disk_and_guards_traversal() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "note.md", "raw text");

        let store = ContentStore::new(dir.path());
        store.load().unwrap();

        assert_eq!(store.raw("note").unwrap(), "raw text");
        assert!(matches!(
            store.raw("missing"),
            Err(RawContentError::NotFound)
        ));
        assert!(matches!(
            store.raw("../etc/passwd"),
            Err(RawContentError::InvalidSlug)
        ));
        assert!(matches!(store.raw(""), Err(RawContentError::InvalidSlug)));
    }
}
