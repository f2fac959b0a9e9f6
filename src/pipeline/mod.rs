//! Migration Pipelines
//!
//! The two one-shot runs the CLI exposes:
//!
//! ```text
//!  migrate-images                     scrape
//!  ──────────────                     ──────
//!  load content                       load content
//!       │                                  │
//!  scan CDN URLs                      fetch legacy pages ─▶ Markdown
//!       │                                  │
//!       └──────────┬───────────────────────┘
//!                  ▼
//!        download (batches of 10)
//!                  │
//!        upload   (batches of 5)
//!                  │
//!        rewrite documents ─▶ write changed files
//!                  │
//!        summary + error log
//! ```
//!
//! Per-item failures are recorded in the [`RunReport`] and never stop a run.

pub mod migrate;
pub mod scrape;
pub mod transfer;

pub use migrate::run_migration;
pub use scrape::run_scrape;
pub use transfer::{transfer_assets, DOWNLOAD_BATCH_SIZE, UPLOAD_BATCH_SIZE};

use crate::assets::{AssetCatalog, CdnMatcher};
use crate::storage::ObjectStore;
use crate::types::{ContentCategory, MigrateError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

/// Options shared by both runs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub content_dir: PathBuf,
    pub categories: Vec<ContentCategory>,
    pub dry_run: bool,
    pub cdn_hosts: Vec<String>,
    pub legacy_site_url: Option<String>,
}

impl RunOptions {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            categories: ContentCategory::ALL.to_vec(),
            dry_run: false,
            cdn_hosts: crate::assets::DEFAULT_CDN_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            legacy_site_url: None,
        }
    }
}

/// Reserve the storage paths `texts` already link to, so that a new asset
/// deriving the same filename gets a suffix instead of overwriting an object
/// uploaded by an earlier run.
pub fn reserve_stored_paths<'a>(
    catalog: &mut AssetCatalog,
    texts: impl IntoIterator<Item = &'a str>,
    store: &dyn ObjectStore,
) -> Result<usize, regex::Error> {
    let prefix = store.public_url("");
    let matcher = CdnMatcher::with_prefix(&prefix)?;

    let mut reserved = 0;
    for text in texts {
        for url in matcher.find_urls(text) {
            if catalog.reserve(&url[prefix.len()..]) {
                reserved += 1;
            }
        }
    }
    if reserved > 0 {
        debug!(reserved, "Reserved existing storage paths");
    }
    Ok(reserved)
}

/// Counts and failures collected over a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub documents: usize,
    pub scraped: usize,
    pub found: usize,
    pub downloaded: usize,
    pub uploaded: usize,
    pub modified: usize,
    pub errors: Vec<MigrateError>,
}

impl RunReport {
    pub fn record(&mut self, err: MigrateError) {
        error!(kind = err.kind(), "{}", err);
        self.errors.push(err);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "documents: {}, scraped: {}, found: {}, downloaded: {}, uploaded: {}, modified: {}, errors: {}",
            self.documents,
            self.scraped,
            self.found,
            self.downloaded,
            self.uploaded,
            self.modified,
            self.errors.len()
        )
    }

    pub fn log_summary(&self, dry_run: bool) {
        info!(
            dry_run,
            documents = self.documents,
            scraped = self.scraped,
            found = self.found,
            downloaded = self.downloaded,
            uploaded = self.uploaded,
            modified = self.modified,
            errors = self.errors.len(),
            "Run complete"
        );
    }

    /// One line per failure. Nothing is written when the run had no errors;
    /// returns whether a file was written.
    pub async fn write_error_log(&self, path: &Path) -> std::io::Result<bool> {
        if self.errors.is_empty() {
            return Ok(false);
        }

        let mut log = String::new();
        for err in &self.errors {
            let line = err.to_string().replace(['\r', '\n'], " ");
            log.push_str(&format!("[{}] {}\n", err.kind(), line));
        }
        fs::write(path, log).await?;
        info!(path = %path.display(), errors = self.errors.len(), "Wrote error log");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_error_log_written_only_with_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.log");

        let mut report = RunReport::default();
        assert!(!report.write_error_log(&path).await.unwrap());
        assert!(!path.exists());

        report.record(MigrateError::Download {
            url: "https://cdn.prod.website-files.com/a/1_x.png".to_string(),
            reason: "HTTP status client error (404 Not Found)".to_string(),
        });
        report.record(MigrateError::Upload {
            path: "blog/y.png".to_string(),
            reason: "Storage API error (500): boom".to_string(),
        });

        assert!(report.write_error_log(&path).await.unwrap());
        let log = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[download] Download failed for https://cdn.prod.website-files.com/a/1_x.png"));
        assert!(lines[1].starts_with("[upload] Upload failed for blog/y.png"));
    }

    #[test]
    fn test_summary_lists_counts() {
        let report = RunReport {
            documents: 4,
            found: 3,
            downloaded: 3,
            uploaded: 2,
            modified: 1,
            ..Default::default()
        };
        assert_eq!(
            report.summary(),
            "documents: 4, scraped: 0, found: 3, downloaded: 3, uploaded: 2, modified: 1, errors: 0"
        );
    }
}
