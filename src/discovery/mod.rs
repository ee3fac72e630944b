//! C9: discovery engine. For jurisdictions not in the pinned registry,
//! explore municipal GIS servers to find council-district layers (§4.9).
//!
//! `probe` finds live ArcGIS/GeoServer roots for a city slug; `traversal`
//! BFS-walks an ArcGIS server's folder tree to enumerate layers;
//! `scoring` ranks each discovered layer's districtness; `rate_limit`
//! bounds request volume per target server.

pub mod probe;
pub mod rate_limit;
pub mod scoring;
pub mod traversal;

pub use probe::{discover_servers, DiscoveredServer, ServerKind};
pub use rate_limit::TokenBucket;
pub use scoring::{disposition, score_layer, Disposition};
pub use traversal::{traverse, DiscoveredLayer};

use crate::types::BBox;

/// A scored, fully discovered layer, ready to hand off to a human reviewer
/// or straight into C7 extraction depending on [`Disposition`].
#[derive(Debug, Clone)]
pub struct ScoredLayer {
    pub layer: DiscoveredLayer,
    pub score: u8,
    pub disposition: Disposition,
}

/// Run the full discovery pipeline for one city: probe for a live server,
/// traverse its folder tree, and score every layer found (§4.9 end to end).
pub async fn discover_city(
    slug: &str,
    expected_city_extent: Option<BBox>,
    rate_per_second: f64,
) -> Vec<ScoredLayer> {
    let mut bucket = TokenBucket::new(rate_per_second);
    let servers = discover_servers(slug, &mut bucket).await;

    let client = reqwest::Client::builder()
        .user_agent("shadow-atlas/1.0 (+https://github.com/shadow-atlas)")
        .build()
        .expect("reqwest client configuration is static and always valid");

    let mut scored = Vec::new();
    for server in servers {
        if server.kind != ServerKind::ArcGis {
            continue;
        }
        let layers = traverse(&client, &server.base_url, &mut bucket).await;
        for layer in layers {
            let feature_count = None;
            let score = score_layer(&layer.detail, feature_count, expected_city_extent);
            scored.push(ScoredLayer {
                disposition: disposition(score),
                score,
                layer,
            });
        }
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::traversal::LayerDetail;

    #[test]
    fn scored_layer_carries_its_disposition() {
        let layer = DiscoveredLayer {
            service_path: "CouncilDistricts/MapServer".to_string(),
            detail: LayerDetail {
                id: 0,
                name: "Council Districts".to_string(),
                geometry_type: Some("esriGeometryPolygon".to_string()),
                fields: vec![],
                extent: None,
            },
        };
        let score = score_layer(&layer.detail, Some(9), None);
        let scored = ScoredLayer {
            disposition: disposition(score),
            score,
            layer,
        };
        assert_eq!(scored.disposition, Disposition::HighConfidence);
    }
}
