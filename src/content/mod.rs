//! Content Documents
//!
//! Loading the site's Markdown/MDX files per category, plus the in-place
//! edits the migration and scrape runs make to them.

pub mod document;
pub mod rewrite;

pub use document::Document;
pub use rewrite::{rewrite_urls, Rewrite, UrlMap};

use crate::types::{ContentCategory, MigrateError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// A content file as read from disk.
#[derive(Debug, Clone)]
pub struct ContentFile {
    pub path: PathBuf,
    pub category: ContentCategory,
    pub text: String,
}

impl ContentFile {
    /// File stem, which doubles as the page slug.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Write `text` back to this file.
    pub async fn write(&self, text: &str) -> Result<(), MigrateError> {
        fs::write(&self.path, text)
            .await
            .map_err(|e| MigrateError::io(&self.path, e))
    }
}

/// Files loaded for a run, plus per-file read failures.
#[derive(Debug, Default)]
pub struct ContentScan {
    pub files: Vec<ContentFile>,
    pub errors: Vec<MigrateError>,
}

/// Load every `.md`/`.mdx` file under `{content_dir}/{category}` for the
/// selected categories. A missing category directory is skipped with a
/// warning; unreadable files are reported without stopping the scan.
pub async fn load_documents(content_dir: &Path, categories: &[ContentCategory]) -> ContentScan {
    let mut scan = ContentScan::default();

    for &category in categories {
        let root = content_dir.join(category.as_str());
        if !root.is_dir() {
            warn!(category = %category, dir = %root.display(), "Content directory not found, skipping");
            continue;
        }

        let paths = match list_content_files(&root).await {
            Ok(paths) => paths,
            Err(e) => {
                scan.errors.push(e);
                continue;
            }
        };

        for path in paths {
            match fs::read_to_string(&path).await {
                Ok(text) => scan.files.push(ContentFile { path, category, text }),
                Err(e) => scan.errors.push(MigrateError::io(&path, e)),
            }
        }
    }

    debug!(files = scan.files.len(), errors = scan.errors.len(), "Loaded content");
    scan
}

/// Content files below `root`, sorted by path.
async fn list_content_files(root: &Path) -> Result<Vec<PathBuf>, MigrateError> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|e| MigrateError::io(&dir, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| MigrateError::io(&dir, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| MigrateError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if is_content_file(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONTENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
