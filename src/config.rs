//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Runtime configuration for model-gateway.
///
/// Every field has a sensible default so the server works out-of-the-box
/// against a local upstream stack without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Base URL of the upstream platform hosting the identity provider,
    /// record store and blob store (default: `"http://localhost:54321"`).
    pub upstream_url: String,

    /// Anonymous API key sent to every upstream service.
    pub anon_key: String,

    /// Base URL for serverless worker functions.  Defaults to
    /// `{upstream_url}/functions/v1` when unset.
    pub functions_url: String,

    /// Name of the worker function that performs inference
    /// (default: `"hf-inference"`).
    pub worker_fn: String,

    /// Blob-store bucket holding generated images
    /// (default: `"generated-images"`).
    pub image_bucket: String,

    /// Timeout on the worker dispatch call.  Deliberately much shorter than
    /// the polling budget; a timeout here is tolerated, not fatal.
    pub dispatch_timeout: Duration,

    /// Sleep between consecutive status polls (default: 2s).
    pub poll_interval: Duration,

    /// Total wall-clock budget for the polling loop (default: 180s).  When it
    /// expires the still-pending record is returned to the caller.
    pub poll_budget: Duration,

    /// Comma-separated list of allowed CORS origins; `None` means wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui` (default: true).  Disable in
    /// production with `GATEWAY_ENABLE_SWAGGER=false`.
    pub enable_swagger: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let upstream_url = env_or("GATEWAY_UPSTREAM_URL", "http://localhost:54321");
        let functions_url = std::env::var("GATEWAY_FUNCTIONS_URL")
            .unwrap_or_else(|_| format!("{}/functions/v1", upstream_url.trim_end_matches('/')));
        Self {
            bind_address: env_or("GATEWAY_BIND", "0.0.0.0:3000"),
            anon_key: env_or("GATEWAY_ANON_KEY", ""),
            worker_fn: env_or("GATEWAY_WORKER_FN", "hf-inference"),
            image_bucket: env_or("GATEWAY_IMAGE_BUCKET", "generated-images"),
            dispatch_timeout: Duration::from_secs(parse_env("GATEWAY_DISPATCH_TIMEOUT_SECS", 90)),
            poll_interval: Duration::from_secs(parse_env("GATEWAY_POLL_INTERVAL_SECS", 2)),
            poll_budget: Duration::from_secs(parse_env("GATEWAY_POLL_BUDGET_SECS", 180)),
            cors_allowed_origins: std::env::var("GATEWAY_CORS_ORIGINS").ok(),
            enable_swagger: std::env::var("GATEWAY_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            log_level: env_or("GATEWAY_LOG", "info"),
            log_json: std::env::var("GATEWAY_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            upstream_url,
            functions_url,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
