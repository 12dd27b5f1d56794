//! Job lifecycle controller.
//!
//! Turns a submission into a durable job record, hands the work to the
//! external worker, then polls the record store until the worker writes a
//! terminal status or the polling budget runs out.  The controller writes
//! each record exactly once (at creation); after dispatch it only reads.
//!
//! The one designed resilience behavior lives here: a dispatch *timeout* is
//! tolerated and polling proceeds, because the worker may still be processing
//! asynchronously.  Every other dispatch failure is fatal to the submission.
//!
//! Polling runs inside the request handler's own future, so when the client
//! disconnects axum drops the future and polling stops immediately.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::{DispatchFailure, DispatchPayload, Dispatcher};
use crate::error::ServerError;
use crate::store::{JobRecord, JobStore};

/// How a submission came back to the caller.  Both variants are successes.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The worker wrote a terminal status within the polling budget.
    Terminal(JobRecord),
    /// The budget expired with the job still pending; the caller should
    /// poll again later.
    StillPending(JobRecord),
}

/// Orchestrates record creation, worker dispatch and status polling.
///
/// Collaborators are injected at construction time so tests can substitute
/// in-process fakes for the store and the worker.
pub struct JobController<S, D> {
    store: Arc<S>,
    dispatcher: Arc<D>,
    poll_interval: Duration,
    poll_budget: Duration,
}

impl<S: JobStore, D: Dispatcher> JobController<S, D> {
    pub fn new(
        store: Arc<S>,
        dispatcher: Arc<D>,
        poll_interval: Duration,
        poll_budget: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            poll_interval,
            poll_budget,
        }
    }

    /// Submit a new inference job on behalf of `owner_id`.
    ///
    /// Creation strictly precedes dispatch, which strictly precedes the
    /// first poll; the caller never sees an id that is not durably recorded.
    pub async fn submit(
        &self,
        owner_id: Uuid,
        model_type: String,
        input_data: Value,
    ) -> Result<SubmitOutcome, ServerError> {
        let prompt_ok = input_data
            .get("prompt")
            .and_then(Value::as_str)
            .is_some_and(|p| !p.trim().is_empty());
        if !prompt_ok {
            return Err(ServerError::Validation(
                "input_data.prompt must be a non-empty string".to_owned(),
            ));
        }

        let record = self
            .store
            .insert(JobRecord::new(owner_id, model_type, input_data))
            .await?;
        info!(id = %record.id, model_type = %record.model_type, "job record created");

        let payload = DispatchPayload {
            id: record.id,
            input: record.input_data.clone(),
            model_id: record.model_type.clone(),
            user_id: record.user_id,
        };
        match self.dispatcher.dispatch(&payload).await {
            Ok(()) => debug!(id = %record.id, "worker accepted dispatch"),
            Err(DispatchFailure::TimedOut) => {
                // The worker may still be processing; the record store will
                // tell us either way.
                warn!(id = %record.id, "worker dispatch timed out; continuing to poll");
            }
            Err(e) => return Err(ServerError::Dispatch(e.to_string())),
        }

        self.poll(record.id).await
    }

    /// All records owned by `owner_id`, in store-defined order.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<JobRecord>, ServerError> {
        Ok(self.store.list_for_owner(owner_id).await?)
    }

    /// Re-read the record at a fixed interval until its status is terminal
    /// or the budget is exhausted.  Budget exhaustion is a success: the
    /// still-pending record goes back to the caller.
    async fn poll(&self, id: Uuid) -> Result<SubmitOutcome, ServerError> {
        let deadline = tokio::time::Instant::now() + self.poll_budget;
        loop {
            let current = self.store.get(id).await?.ok_or_else(|| {
                ServerError::Internal(format!("job {id} disappeared from store during polling"))
            })?;

            if current.status.is_terminal() {
                info!(id = %id, status = ?current.status, "job reached terminal status");
                return Ok(SubmitOutcome::Terminal(current));
            }
            if tokio::time::Instant::now() >= deadline {
                info!(id = %id, "polling budget exhausted; job still pending");
                return Ok(SubmitOutcome::StillPending(current));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::{JobStatus, StoreError};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory [`JobStore`] with scripted worker-side completion: the
    /// record flips to `terminal_status` once it has been read
    /// `terminal_after_reads` times.
    struct FakeStore {
        records: Mutex<HashMap<Uuid, JobRecord>>,
        reads: AtomicUsize,
        inserts: AtomicUsize,
        terminal_after_reads: Option<usize>,
        terminal_status: JobStatus,
        fail_inserts: bool,
        fail_reads: bool,
    }

    impl FakeStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                reads: AtomicUsize::new(0),
                inserts: AtomicUsize::new(0),
                terminal_after_reads: None,
                terminal_status: JobStatus::Completed,
                fail_inserts: false,
                fail_reads: false,
            }
        }

        fn completing_after(reads: usize, status: JobStatus) -> Self {
            Self {
                terminal_after_reads: Some(reads),
                terminal_status: status,
                ..Self::new()
            }
        }

        fn rejected() -> StoreError {
            StoreError::Rejected {
                status: 503,
                detail: "store unavailable".to_owned(),
            }
        }
    }

    impl JobStore for FakeStore {
        async fn insert(&self, record: JobRecord) -> Result<JobRecord, StoreError> {
            if self.fail_inserts {
                return Err(Self::rejected());
            }
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .unwrap()
                .insert(record.id, record.clone());
            Ok(record)
        }

        async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
            if self.fail_reads {
                return Err(Self::rejected());
            }
            let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            let mut record = self.records.lock().unwrap().get(&id).cloned();
            if let (Some(after), Some(r)) = (self.terminal_after_reads, record.as_mut()) {
                if n >= after {
                    r.status = self.terminal_status;
                    r.output_data = Some(json!({ "text": "generated" }));
                    r.completed_at = Some(chrono::Utc::now());
                }
            }
            Ok(record)
        }

        async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<JobRecord>, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    enum DispatchBehavior {
        Accept,
        Timeout,
        Reject,
    }

    /// Fake worker endpoint.  Holds a handle to the store so it can check
    /// that the record was durably inserted before dispatch arrived.
    struct FakeDispatcher {
        store: Arc<FakeStore>,
        behavior: DispatchBehavior,
        calls: AtomicUsize,
        saw_pending_record: AtomicBool,
    }

    impl FakeDispatcher {
        fn new(store: Arc<FakeStore>, behavior: DispatchBehavior) -> Self {
            Self {
                store,
                behavior,
                calls: AtomicUsize::new(0),
                saw_pending_record: AtomicBool::new(false),
            }
        }
    }

    impl Dispatcher for FakeDispatcher {
        async fn dispatch(&self, payload: &DispatchPayload) -> Result<(), DispatchFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let pending_in_store = self
                .store
                .records
                .lock()
                .unwrap()
                .get(&payload.id)
                .is_some_and(|r| r.status == JobStatus::Pending);
            self.saw_pending_record
                .store(pending_in_store, Ordering::SeqCst);
            match self.behavior {
                DispatchBehavior::Accept => Ok(()),
                DispatchBehavior::Timeout => Err(DispatchFailure::TimedOut),
                DispatchBehavior::Reject => Err(DispatchFailure::Rejected {
                    status: 422,
                    detail: "unsupported model".to_owned(),
                }),
            }
        }
    }

    fn controller(
        store: Arc<FakeStore>,
        dispatcher: Arc<FakeDispatcher>,
    ) -> JobController<FakeStore, FakeDispatcher> {
        JobController::new(
            store,
            dispatcher,
            Duration::from_secs(2),
            Duration::from_secs(180),
        )
    }

    fn prompt_input() -> Value {
        json!({ "prompt": "hello" })
    }

    #[tokio::test(start_paused = true)]
    async fn empty_prompt_fails_before_any_store_write() {
        let store = Arc::new(FakeStore::new());
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        for input in [json!({}), json!({ "prompt": "" }), json!({ "prompt": "   " })] {
            let err = ctl
                .submit(Uuid::new_v4(), "text-gen".into(), input)
                .await
                .unwrap_err();
            assert!(matches!(err, ServerError::Validation(_)));
        }
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn record_is_pending_in_store_before_dispatch() {
        let store = Arc::new(FakeStore::completing_after(1, JobStatus::Completed));
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        ctl.submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap();
        assert!(dispatcher.saw_pending_record.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_returns_immediately_with_output() {
        let store = Arc::new(FakeStore::completing_after(3, JobStatus::Completed));
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let outcome = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap();
        let SubmitOutcome::Terminal(record) = outcome else {
            panic!("expected terminal outcome");
        };
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.output_data.is_some());
        // No extra reads once the terminal status was observed.
        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_is_terminal_too() {
        let store = Arc::new(FakeStore::completing_after(2, JobStatus::Failed));
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let outcome = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Terminal(ref r) if r.status == JobStatus::Failed
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_timeout_is_tolerated_and_polling_proceeds() {
        let store = Arc::new(FakeStore::completing_after(2, JobStatus::Completed));
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Timeout));
        let ctl = controller(store.clone(), dispatcher.clone());

        let outcome = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Terminal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_rejection_is_fatal_and_skips_polling() {
        let store = Arc::new(FakeStore::completing_after(1, JobStatus::Completed));
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Reject));
        let ctl = controller(store.clone(), dispatcher.clone());

        let err = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Dispatch(_)));
        // The polling loop was never entered.
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
        // But the record was created first.
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_returns_still_pending_success() {
        // Never completes.
        let store = Arc::new(FakeStore::new());
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let outcome = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap();
        let SubmitOutcome::StillPending(record) = outcome else {
            panic!("expected still-pending outcome");
        };
        assert_eq!(record.status, JobStatus::Pending);
        // 180s budget at a 2s interval: first read at t=0, last at t=180.
        assert_eq!(store.reads.load(Ordering::SeqCst), 91);
    }

    #[tokio::test(start_paused = true)]
    async fn store_insert_failure_aborts_before_dispatch() {
        let store = Arc::new(FakeStore {
            fail_inserts: true,
            ..FakeStore::new()
        });
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let err = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Store(_)));
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn store_read_failure_fails_the_submission() {
        let store = Arc::new(FakeStore {
            fail_reads: true,
            ..FakeStore::new()
        });
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let err = ctl
            .submit(Uuid::new_v4(), "text-gen".into(), prompt_input())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Store(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn list_never_returns_another_owners_records() {
        let store = Arc::new(FakeStore::new());
        let dispatcher = Arc::new(FakeDispatcher::new(store.clone(), DispatchBehavior::Accept));
        let ctl = controller(store.clone(), dispatcher.clone());

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .insert(JobRecord::new(alice, "text-gen".into(), prompt_input()))
            .await
            .unwrap();
        store
            .insert(JobRecord::new(bob, "text-gen".into(), prompt_input()))
            .await
            .unwrap();

        let records = ctl.list(alice).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.user_id == alice));
    }
}
