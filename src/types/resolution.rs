//! [`Resolution`]: the result of resolving a point/address to a boundary (C5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::point::Point;

/// One matched boundary for a resolved point, cacheable by
/// `(normalized_address, geocoder_version, atlas_version)` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// Stable id of the matched boundary.
    pub boundary_id: String,
    /// Precision rank (lower = finer), the boundary type's ordinal.
    pub precision: u8,
    /// Confidence in `[0, 100]`.
    pub confidence: u8,
    /// The point that was resolved.
    pub query_point: Point,
    /// When this resolution was computed.
    pub resolved_at: DateTime<Utc>,
    /// Cache lifetime in seconds (default one year, §3).
    pub ttl_seconds: u64,
}

impl Resolution {
    /// Default TTL: one year.
    pub const DEFAULT_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

    /// Whether this resolution, computed at `resolved_at`, is still fresh
    /// at `now` (testable property #8).
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.resolved_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.ttl_seconds
    }
}
