//! Inference dispatcher abstraction.
//!
//! [`Dispatcher`] hands a job payload to the external asynchronous worker.
//! The controller cares about exactly three outcomes: accepted, timed out
//! (tolerated — the worker may still be processing), or rejected (fatal).
//! The production implementation is [`edge::EdgeDispatcher`].

pub mod edge;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Payload forwarded to the worker function.
///
/// Field names follow the worker's contract: it expects `modelId` and
/// `userId`, not the snake_case names used in the record store.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchPayload {
    pub id: Uuid,
    pub input: serde_json::Value,
    #[serde(rename = "modelId")]
    pub model_id: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Why a dispatch call did not succeed.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// The call exceeded its timeout.  The worker may still be processing
    /// asynchronously, so the controller treats this as non-fatal.
    #[error("worker dispatch timed out")]
    TimedOut,

    /// The worker answered with a non-success status; its detail is
    /// surfaced to the caller.
    #[error("worker rejected the job (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The worker could not be reached at all.
    #[error("worker request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Trait for forwarding a job to the external worker.
pub trait Dispatcher: Send + Sync + 'static {
    /// Send `payload` to the worker with the configured timeout.
    fn dispatch(
        &self,
        payload: &DispatchPayload,
    ) -> impl std::future::Future<Output = Result<(), DispatchFailure>> + Send;
}

// ── Tests ──────────────────────────────────────────────────────────────────────
