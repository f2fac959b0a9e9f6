// Supabase Storage client
// Upload: POST {url}/storage/v1/object/{bucket}/{path}
// Public read: GET {url}/storage/v1/object/public/{bucket}/{path}

use super::{encode_object_path, ObjectStore, StorageError};
use crate::config::StorageCredentials;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(credentials: StorageCredentials) -> Self {
        Self::with_client(Client::new(), credentials)
    }

    pub fn with_client(client: Client, credentials: StorageCredentials) -> Self {
        Self {
            client,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            service_key: credentials.service_key,
            bucket: credentials.bucket,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_object_path(path)
        )
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put_object(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        let size = data.len();
        let response = self
            .client
            .post(self.object_url(path))
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(path = %path, bytes = size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_object_path(path)
        )
    }
}
