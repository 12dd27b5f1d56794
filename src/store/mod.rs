//! Record store abstraction.
//!
//! [`JobStore`] defines the interface the job lifecycle controller needs from
//! the persistence layer: insert one record, re-read it by id, list by owner.
//! The production implementation is [`postgrest::PostgrestStore`], which talks
//! to a PostgREST-style REST endpoint over a relational `model_requests`
//! table.  Tests substitute an in-process fake.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod postgrest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a job record.
///
/// The gateway only ever writes `Pending`; every other value is written
/// out-of-band by the worker and is terminal.  Unknown strings are preserved
/// as [`JobStatus::Other`] so that a worker introducing a new terminal status
/// does not wedge the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Other,
}

impl JobStatus {
    /// Every status except `pending` is terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// One row in the `model_requests` table.
///
/// Written once by the gateway at submission time; the worker writes the
/// terminal status and the output/diagnostic fields.  The gateway never
/// updates a record after dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: JobStatus,
    pub model_type: String,
    pub input_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Build a fresh pending record for a new submission.
    pub fn new(user_id: Uuid, model_type: String, input_data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: JobStatus::Pending,
            model_type,
            input_data,
            output_data: None,
            error_msg: None,
            token_used: None,
            token_count: None,
            processing_time: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Errors from the record store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure reaching the store.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store rejected the operation (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The store's response body could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for persisting and reading job records.
///
/// Implement this to swap the PostgREST backend for another keyed store
/// without touching the controller or any handler code.
pub trait JobStore: Send + Sync + 'static {
    /// Persist a new record, returning the stored representation.
    fn insert(
        &self,
        record: JobRecord,
    ) -> impl std::future::Future<Output = Result<JobRecord, StoreError>> + Send;

    /// Re-read a single record by id; `None` if it does not exist.
    fn get(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<JobRecord>, StoreError>> + Send;

    /// All records owned by `user_id`, in store-defined order.
    fn list_for_owner(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<JobRecord>, StoreError>> + Send;
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pending_is_not_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn every_non_pending_status_is_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Other.is_terminal());
    }

    #[test]
    fn unknown_status_string_deserializes_as_other() {
        let status: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, JobStatus::Other);
        assert!(status.is_terminal());
    }

    #[test]
    fn new_record_starts_pending_with_empty_worker_fields() {
        let record = JobRecord::new(
            Uuid::new_v4(),
            "text-gen".to_owned(),
            serde_json::json!({ "prompt": "hello" }),
        );
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.output_data.is_none());
        assert!(record.error_msg.is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = JobRecord::new(
            Uuid::new_v4(),
            "text-gen".to_owned(),
            serde_json::json!({ "prompt": "hello" }),
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.status, JobStatus::Pending);
    }
}
