//! Shadow Atlas REST service (§6).
//!
//! Exposes exactly the external interface `spec.md` §6 names: `GET
//! /lookup?lat=&lon=`, `GET /health`, `GET /metrics`. Everything else
//! (batch slicing, policy registries, HMAC tokens) belonged to a prior
//! system this crate no longer implements.

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::request_logging_middleware;
pub use routes::{create_router, AppState};
pub use state::{Metrics, RuntimeConfig, ServiceState};
