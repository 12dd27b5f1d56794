//! Blob store client.
//!
//! Fetches generated artifacts (images) from the platform's object storage.
//! The gateway is a pure passthrough: bytes and content type come straight
//! from the store.

use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    /// No object with the requested id exists in the bucket.
    #[error("object not found")]
    NotFound,

    /// The store answered with an unexpected non-success status.
    #[error("blob store error (HTTP {status}): {detail}")]
    Upstream { status: u16, detail: String },

    #[error("blob store unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// A downloaded object: raw bytes plus the store's content type.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// REST client for the blob store.
#[derive(Debug, Clone)]
pub struct BlobClient {
    client: Client,
    base_url: String,
    bucket: String,
    anon_key: String,
}

impl BlobClient {
    /// `base_url` is the platform root; the `/storage/v1` prefix is appended.
    pub fn new(client: Client, base_url: &str, bucket: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/storage/v1", base_url.trim_end_matches('/')),
            bucket: bucket.to_owned(),
            anon_key: anon_key.to_owned(),
        }
    }

    /// Download one object by id from the configured bucket.
    pub async fn download(&self, object_id: &str) -> Result<BlobObject, BlobError> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, object_id);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = resp.text().await.unwrap_or_default();
            return Err(BlobError::Upstream { status, detail });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = resp.bytes().await?;
        Ok(BlobObject { bytes, content_type })
    }
}
