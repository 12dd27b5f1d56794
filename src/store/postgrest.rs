//! PostgREST implementation of [`JobStore`].
//!
//! Talks to `{base}/rest/v1/model_requests` with the platform's `apikey` /
//! bearer headers on every call.  Inserts ask for `return=representation` so
//! the stored row comes back in the same round trip and the caller never sees
//! an id that is not durably recorded.

use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::{JobRecord, JobStore, StoreError};

/// REST client for the `model_requests` table.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl PostgrestStore {
    /// `base_url` is the platform root, e.g. `http://localhost:54321`;
    /// the `/rest/v1` prefix is appended here.
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_owned(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/model_requests", self.base_url)
    }

    /// Apply the headers PostgREST expects on every request.
    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Read a successful response body as a row array; a non-success status
    /// becomes [`StoreError::Rejected`] with whatever detail the store sent.
    async fn read_rows(resp: reqwest::Response) -> Result<Vec<JobRecord>, StoreError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                detail: body,
            });
        }
        decode_rows(&body)
    }
}

/// PostgREST returns rows as a JSON array, for single-row reads too.
fn decode_rows(body: &str) -> Result<Vec<JobRecord>, StoreError> {
    Ok(serde_json::from_str(body)?)
}

impl JobStore for PostgrestStore {
    async fn insert(&self, record: JobRecord) -> Result<JobRecord, StoreError> {
        debug!(id = %record.id, "inserting job record");
        let resp = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let mut rows = Self::read_rows(resp).await?;
        rows.pop().ok_or(StoreError::Rejected {
            status: 200,
            detail: "insert returned no representation".to_owned(),
        })
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_owned())])
            .send()
            .await?;
        let mut rows = Self::read_rows(resp).await?;
        Ok(rows.pop())
    }

    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<JobRecord>, StoreError> {
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[("user_id", format!("eq.{user_id}")), ("select", "*".to_owned())])
            .send()
            .await?;
        Self::read_rows(resp).await
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
