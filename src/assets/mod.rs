//! Legacy Asset Handling
//!
//! Everything that happens to a single legacy CDN file on its way to object
//! storage:
//!
//! - **scan**: find CDN URLs in content text
//! - **filename**: derive a human filename and disambiguate collisions
//! - **fetch**: download the file into memory
//!
//! Uploading lives in [`crate::storage`]; the batching that ties the steps
//! together lives in [`crate::pipeline`].

pub mod fetch;
pub mod filename;
pub mod scan;

pub use fetch::*;
pub use filename::*;
pub use scan::*;

use crate::types::ContentCategory;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// A legacy file discovered in content, on its way to object storage.
#[derive(Debug, Clone)]
pub struct AssetRef {
    pub source_url: String,
    pub category: ContentCategory,
    pub filename: String,
    /// `{category}/{filename}` inside the bucket
    pub storage_path: String,
    pub content_type: Option<String>,
    pub buffer: Option<Bytes>,
}

impl AssetRef {
    pub fn new(source_url: impl Into<String>, category: ContentCategory, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            source_url: source_url.into(),
            category,
            storage_path: format!("{}/{}", category.as_str(), filename),
            filename,
            content_type: None,
            buffer: None,
        }
    }

    /// Attach downloaded bytes. A missing or generic content type is replaced
    /// by one guessed from the filename.
    pub fn with_download(mut self, buffer: Bytes, content_type: Option<String>) -> Self {
        let content_type = content_type
            .filter(|ct| !is_generic_content_type(ct))
            .unwrap_or_else(|| guess_content_type(&self.filename));
        self.content_type = Some(content_type);
        self.buffer = Some(buffer);
        self
    }

    pub fn size(&self) -> usize {
        self.buffer.as_ref().map(|b| b.len()).unwrap_or(0)
    }
}

pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn is_generic_content_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/octet-stream" | "binary/octet-stream" | ""
    )
}

/// Deduplicated set of assets found during a scan.
///
/// Each source URL appears once, under the first category that referenced
/// it. Filenames are unique per category, since categories are separate
/// storage folders.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    registries: HashMap<ContentCategory, FilenameRegistry>,
    index: HashMap<String, usize>,
    assets: Vec<AssetRef>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source_url` (no-op if already known) and return its entry.
    pub fn add(&mut self, source_url: &str, category: ContentCategory) -> &AssetRef {
        let idx = match self.index.get(source_url) {
            Some(&idx) => idx,
            None => {
                let filename = self.registries.entry(category).or_default().assign(source_url);
                self.assets.push(AssetRef::new(source_url, category, filename));
                self.index.insert(source_url.to_string(), self.assets.len() - 1);
                self.assets.len() - 1
            }
        };
        &self.assets[idx]
    }

    /// Keep new uploads off an object that already exists at
    /// `{category}/{filename}`. Returns false for paths outside the category
    /// folders.
    pub fn reserve(&mut self, storage_path: &str) -> bool {
        let decoded = percent_decode_str(storage_path).decode_utf8_lossy();
        let Some((folder, filename)) = decoded.split_once('/') else {
            return false;
        };
        let Some(category) = ContentCategory::from_id(folder) else {
            return false;
        };
        if filename.is_empty() || filename.contains('/') {
            return false;
        }
        self.registries.entry(category).or_default().reserve(filename);
        true
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn assets(&self) -> &[AssetRef] {
        &self.assets
    }

    pub fn into_assets(self) -> Vec<AssetRef> {
        self.assets
    }
}
