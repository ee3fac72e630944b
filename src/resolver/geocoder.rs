//! The geocoder interface consumed by [`super::resolve`] (§4.5 step 2):
//! address → point with confidence. Implementations are out of scope; this
//! is a seam.

use async_trait::async_trait;

use crate::types::Point;

/// A geocoded address: the resolved point plus the geocoder's own
/// confidence in `[0, 100]`.
#[derive(Debug, Clone, Copy)]
pub struct GeocodeResult {
    /// Resolved point.
    pub point: Point,
    /// Geocoder confidence, `[0, 100]`.
    pub confidence: u8,
}

/// Error surfaced when an address cannot be geocoded at all.
#[derive(Debug, Clone, thiserror::Error)]
#[error("address not geocodable: {0}")]
pub struct GeocodeError(pub String);

/// Address-to-point geocoding, supplied by the embedding application.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a normalized address.
    async fn geocode(&self, normalized_address: &str) -> Result<GeocodeResult, GeocodeError>;
}

/// A fixed-table geocoder for tests: exact-match lookups only.
#[derive(Debug, Clone, Default)]
pub struct FixedGeocoder {
    entries: std::collections::BTreeMap<String, GeocodeResult>,
}

impl FixedGeocoder {
    /// An empty fixed geocoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known address.
    pub fn insert(&mut self, normalized_address: &str, result: GeocodeResult) {
        self.entries.insert(normalized_address.to_string(), result);
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, normalized_address: &str) -> Result<GeocodeResult, GeocodeError> {
        self.entries
            .get(normalized_address)
            .copied()
            .ok_or_else(|| GeocodeError(normalized_address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_geocoder_returns_registered_entry() {
        let mut g = FixedGeocoder::new();
        g.insert(
            "1 main st, honolulu, hi",
            GeocodeResult {
                point: Point::new(-157.8581, 21.3099).unwrap(),
                confidence: 95,
            },
        );
        let result = g.geocode("1 main st, honolulu, hi").await.unwrap();
        assert_eq!(result.confidence, 95);
    }

    #[tokio::test]
    async fn unknown_address_is_an_error() {
        let g = FixedGeocoder::new();
        assert!(g.geocode("nowhere").await.is_err());
    }
}
