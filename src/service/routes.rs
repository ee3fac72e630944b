//! Axum routes for the `/lookup`, `/health`, `/metrics` surface (§6).

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::proof::lookup_point;
use crate::types::{BoundaryType, Point};

use super::state::ServiceState;

/// Shared app state handle, cheap to clone across handlers.
pub type AppState = Arc<ServiceState>;

/// Query parameters for `GET /lookup?lat=&lon=&types=`.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub lat: f64,
    pub lon: f64,
    /// Comma-separated [`BoundaryType`] names to restrict the match to.
    pub types: Option<String>,
}

/// `{id, name, type, jurisdiction}` district summary (§6).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BoundaryType,
    pub jurisdiction: String,
}

/// Merkle inclusion proof, hex-encoded for JSON transport (§6).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProofDto {
    pub leaf: String,
    pub siblings: Vec<String>,
    pub path_indices: Vec<u8>,
}

/// `GET /lookup` success body (§6).
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub district: DistrictDto,
    #[serde(rename = "merkleProof")]
    pub merkle_proof: MerkleProofDto,
}

/// Structured error response with a correlation id for tracing, matching
/// §7's "no internal error text or stack is exposed" rule.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub correlation_id: String,
}

impl ErrorResponse {
    fn new(code: &'static str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(code = %self.code, correlation_id = %self.correlation_id, "lookup_error");
        let status = match self.code.as_str() {
            "not_recognized" | "out_of_coverage" | "invalid_coordinates" => StatusCode::BAD_REQUEST,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, axum::Json(self)).into_response()
    }
}

fn parse_requested_types(raw: &Option<String>) -> Option<Vec<BoundaryType>> {
    raw.as_ref().map(|s| {
        s.split(',')
            .filter_map(|name| serde_json::from_value(serde_json::Value::String(name.trim().to_string())).ok())
            .collect()
    })
}

async fn lookup_handler(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<axum::Json<LookupResponse>, ErrorResponse> {
    let start = Instant::now();

    let point = Point::new(query.lon, query.lat)
        .ok_or_else(|| ErrorResponse::new("invalid_coordinates", "lat/lon out of WGS84 range"))?;

    let requested_types = parse_requested_types(&query.types);
    let snapshot = state.snapshot.read().clone();
    let source = Arc::clone(&state.source);

    let cache_hit = state
        .cache
        .get(&format!("{:.6},{:.6}", point.lng, point.lat), "point", &snapshot.version.to_string())
        .is_some();

    // `lookup_point` needs the full matched Boundary, not just its id, to
    // encode the Merkle leaf — fetch this request's candidates once up
    // front so the lookup callback stays synchronous.
    let candidates = source
        .candidates_for_point(point, requested_types.as_deref())
        .await
        .map_err(|e| ErrorResponse::new("unavailable", &e.to_string()))?;

    let result = lookup_point(
        point,
        source.as_ref(),
        &snapshot,
        requested_types.as_deref(),
        |id| candidates.iter().find(|b| b.id == id).cloned(),
        chrono::Utc::now(),
    )
    .await;

    state.metrics.record_query(start.elapsed(), cache_hit);

    let result = result.map_err(|e| match e {
        crate::proof::LookupError::Resolve(inner) => {
            ErrorResponse::new(inner.user_facing(), &inner.to_string())
        }
        crate::proof::LookupError::NotInSnapshot(_) => {
            ErrorResponse::new("out_of_coverage", "resolved boundary is not in the published snapshot")
        }
    })?;

    let matched = candidates
        .iter()
        .find(|b| b.id == result.boundary.boundary_id)
        .ok_or_else(|| ErrorResponse::new("out_of_coverage", "matched boundary vanished between resolve and encode"))?;

    Ok(axum::Json(LookupResponse {
        district: DistrictDto {
            id: matched.id.clone(),
            name: matched.name.clone(),
            kind: matched.r#type,
            jurisdiction: matched.jurisdiction.clone(),
        },
        merkle_proof: MerkleProofDto {
            leaf: format!("0x{}", hex::encode(result.merkle_proof.leaf)),
            siblings: result.merkle_proof.siblings.iter().map(|s| format!("0x{}", hex::encode(s))).collect(),
            path_indices: result.merkle_proof.path_indices,
        },
    }))
}

/// `GET /health` (§6): service status and cache hit rate.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: i64,
    cache_hit_rate: f64,
    queries_total: u64,
    snapshot_version: u64,
}

async fn health_handler(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    let snapshot_version = state.snapshot.read().version;
    axum::Json(HealthResponse {
        status: "healthy",
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
        cache_hit_rate: state.metrics.cache_hit_rate(),
        queries_total: state.metrics.queries_total(),
        snapshot_version,
    })
}

/// `GET /metrics` (§6): text-format counters and latency quantiles.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = String::new();
    body.push_str("# HELP queries_total Total /lookup queries served.\n");
    body.push_str("# TYPE queries_total counter\n");
    body.push_str(&format!("queries_total {}\n", state.metrics.queries_total()));

    body.push_str("# HELP cache_hit_rate Fraction of /lookup queries served from cache.\n");
    body.push_str("# TYPE cache_hit_rate gauge\n");
    body.push_str(&format!("cache_hit_rate {}\n", state.metrics.cache_hit_rate()));

    body.push_str("# HELP query_latency_seconds Lookup latency distribution.\n");
    body.push_str("# TYPE query_latency_seconds summary\n");
    for q in [0.5, 0.9, 0.95, 0.99] {
        body.push_str(&format!(
            "query_latency_seconds{{quantile=\"{q}\"}} {}\n",
            state.metrics.latency_quantile_seconds(q)
        ));
    }

    ([("content-type", "text/plain; version=0.0.4")], body)
}

/// Build the `/lookup`, `/health`, `/metrics` router (§6).
pub fn create_router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/lookup", get(lookup_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(super::middleware::request_logging_middleware))
        .with_state(state)
}
