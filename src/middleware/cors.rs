//! CORS layer, driven by `GATEWAY_CORS_ORIGINS`.

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    match parse_origins(state.config.cors_allowed_origins.as_deref()) {
        // Wildcard – suitable for development; set GATEWAY_CORS_ORIGINS in production.
        origins if origins.is_empty() => layer.allow_origin(Any),
        origins => layer.allow_origin(origins),
    }
}

/// Split a comma-separated origin list into header values, dropping blanks
/// and anything that is not a valid header value.  `None` or an effectively
/// empty list means "no restriction configured".
fn parse_origins(spec: Option<&str>) -> Vec<HeaderValue> {
    spec.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unset_spec_means_no_restriction() {
        assert!(parse_origins(None).is_empty());
    }

    #[test]
    fn blank_entries_are_dropped() {
        assert!(parse_origins(Some("  , ,")).is_empty());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins(Some("https://a.example, https://b.example"));
        assert_eq!(
            origins,
            vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]
        );
    }
}
