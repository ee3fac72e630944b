//! Server probing (§4.9): for a city slug, try a closed set of URL patterns
//! and confirm liveness by fetching a parseable, schema-matching JSON
//! endpoint. Failed probes are silent — a 404 or malformed body is just a
//! negative result, not an error worth surfacing.

use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = "shadow-atlas/1.0 (+https://github.com/shadow-atlas)";
const PROBE_TIMEOUT_SECS: u64 = 5;

/// The ArcGIS `?f=json` root response shape a live FeatureServer exposes.
#[derive(Debug, Deserialize)]
struct ArcGisServicesRoot {
    #[serde(default)]
    folders: Vec<String>,
    #[serde(default)]
    services: Vec<serde_json::Value>,
}

/// The GeoServer `about/version.json` response shape.
#[derive(Debug, Deserialize)]
struct GeoServerVersion {
    about: serde_json::Value,
}

/// Which GIS server kind a probe matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    ArcGis,
    GeoServer,
}

/// A live server found at `base_url`.
#[derive(Debug, Clone)]
pub struct DiscoveredServer {
    pub base_url: String,
    pub kind: ServerKind,
}

/// The closed set of URL patterns tried per city slug (§4.9).
pub fn candidate_base_urls(slug: &str) -> Vec<String> {
    vec![
        format!("https://gis.{slug}.gov"),
        format!("https://maps.{slug}.gov"),
        format!("https://{slug}.maps.arcgis.com"),
        format!("https://gis.{slug}.org"),
    ]
}

fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
        .build()
        .expect("reqwest client configuration is static and always valid")
}

/// Probe one candidate base URL for an ArcGIS or GeoServer root. Returns
/// `None` on any failure (timeout, non-2xx, malformed body) — probing is
/// exploratory and silent by design.
pub async fn probe_candidate(client: &reqwest::Client, base_url: &str) -> Option<DiscoveredServer> {
    let arcgis_url = format!("{base_url}/arcgis/rest/services?f=json");
    if let Ok(resp) = client.get(&arcgis_url).send().await {
        if resp.status().is_success() {
            if let Ok(body) = resp.text().await {
                if serde_json::from_str::<ArcGisServicesRoot>(&body).is_ok() {
                    return Some(DiscoveredServer {
                        base_url: base_url.to_string(),
                        kind: ServerKind::ArcGis,
                    });
                }
            }
        }
    }

    let geoserver_url = format!("{base_url}/geoserver/rest/about/version.json");
    if let Ok(resp) = client.get(&geoserver_url).send().await {
        if resp.status().is_success() {
            if let Ok(body) = resp.text().await {
                if serde_json::from_str::<GeoServerVersion>(&body).is_ok() {
                    return Some(DiscoveredServer {
                        base_url: base_url.to_string(),
                        kind: ServerKind::GeoServer,
                    });
                }
            }
        }
    }

    None
}

/// Build a client and probe every candidate for `slug`, rate-limited by
/// `bucket` (§4.9, §5). Returns every server that responded, in probe order.
pub async fn discover_servers(slug: &str, bucket: &mut super::rate_limit::TokenBucket) -> Vec<DiscoveredServer> {
    let client = probe_client();
    let mut found = Vec::new();
    for base_url in candidate_base_urls(slug) {
        bucket.acquire().await;
        if let Some(server) = probe_candidate(&client, &base_url).await {
            found.push(server);
        }
    }
    found
}
