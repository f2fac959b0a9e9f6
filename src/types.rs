// Shared type definitions and the run-level error taxonomy

use std::path::PathBuf;

/// Content categories the site keeps under its content directory.
///
/// Each category is both a directory (`{content_dir}/{category}`) and the
/// storage folder its migrated images land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum ContentCategory {
    Blog,
    CaseStudies,
    Features,
    Solutions,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Blog,
        ContentCategory::CaseStudies,
        ContentCategory::Features,
        ContentCategory::Solutions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Blog => "blog",
            ContentCategory::CaseStudies => "case-studies",
            ContentCategory::Features => "features",
            ContentCategory::Solutions => "solutions",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "blog" => Some(ContentCategory::Blog),
            "case-studies" => Some(ContentCategory::CaseStudies),
            "features" => Some(ContentCategory::Features),
            "solutions" => Some(ContentCategory::Solutions),
            _ => None,
        }
    }

    /// Categories selected by `--type`; an empty selection means all of them.
    pub fn selection(requested: &[ContentCategory]) -> Vec<ContentCategory> {
        if requested.is_empty() {
            return Self::ALL.to_vec();
        }
        let mut selected = requested.to_vec();
        selected.sort();
        selected.dedup();
        selected
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failures recorded during a migration or scrape run.
///
/// Only `Config` is fatal; every other variant is collected into the run
/// report and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Upload failed for {path}: {reason}")]
    Upload { path: String, reason: String },

    #[error("Extraction failed for {document}: {reason}")]
    Extraction { document: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io { path: path.into(), source }
    }

    /// Short label used as the prefix of each error log line.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::Config(_) => "config",
            MigrateError::Download { .. } => "download",
            MigrateError::Upload { .. } => "upload",
            MigrateError::Extraction { .. } => "extraction",
            MigrateError::Io { .. } => "io",
        }
    }
}
