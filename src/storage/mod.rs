// Storage layer (object storage behind an HTTP API)

use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;
pub mod supabase_client;

pub use memory::*;
pub use supabase_client::*;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Asset has no downloaded content: {0}")]
    MissingContent(String),
}

/// Destination for migrated assets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` to `path` inside the bucket, replacing any existing object.
    async fn put_object(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Public URL an uploaded object is served from.
    fn public_url(&self, path: &str) -> String;
}

/// Percent-encode each segment of a bucket path, keeping the `/` separators.
pub fn encode_object_path(path: &str) -> String {
    use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'`')
        .add(b'{')
        .add(b'}')
        .add(b'/');

    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
