//! Request logging middleware. The named `/metrics` counters themselves
//! (`queries_total`, `cache_hit_rate`, `query_latency_seconds`) are
//! recorded directly by the `/lookup` handler (state::Metrics); this
//! middleware only emits structured per-request tracing, the way the
//! rest of this crate logs rather than printing.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

/// Log method, normalized path, status, and latency for every request.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "shadow_atlas::service",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response
}

/// Collapse dynamic path segments so log lines stay low-cardinality.
/// Shadow Atlas's own routes are all static (`/lookup`, `/health`,
/// `/metrics`), but this stays in place for any future per-resource route.
fn normalize_path(path: &str) -> String {
    let uuid_regex =
        regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap();
    uuid_regex.replace_all(path, ":id").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_routes_pass_through_unchanged() {
        assert_eq!(normalize_path("/lookup"), "/lookup");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn normalize_path_replaces_uuid() {
        let path = "/resource/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/resource/:id");
    }
}
