//! Serverless-function implementation of [`Dispatcher`].

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::{DispatchFailure, DispatchPayload, Dispatcher};

/// Dispatches jobs to a serverless worker function over HTTP.
#[derive(Debug, Clone)]
pub struct EdgeDispatcher {
    client: Client,
    url: String,
    anon_key: String,
    timeout: Duration,
}

impl EdgeDispatcher {
    /// `functions_url` is the functions base, e.g.
    /// `http://localhost:54321/functions/v1`; `worker_fn` the function name.
    pub fn new(client: Client, functions_url: &str, worker_fn: &str, anon_key: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: format!("{}/{}", functions_url.trim_end_matches('/'), worker_fn),
            anon_key: anon_key.to_owned(),
            timeout,
        }
    }
}

impl Dispatcher for EdgeDispatcher {
    async fn dispatch(&self, payload: &DispatchPayload) -> Result<(), DispatchFailure> {
        debug!(id = %payload.id, url = %self.url, "dispatching job to worker");
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .bearer_auth(&self.anon_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchFailure::TimedOut
                } else {
                    DispatchFailure::Transport(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = resp.text().await.unwrap_or_default();
            return Err(DispatchFailure::Rejected { status, detail });
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn worker_url_is_joined_without_double_slash() {
        let d = EdgeDispatcher::new(
            Client::new(),
            "http://localhost:54321/functions/v1/",
            "hf-inference",
            "key",
            Duration::from_secs(90),
        );
        assert_eq!(d.url, "http://localhost:54321/functions/v1/hf-inference");
    }
}
