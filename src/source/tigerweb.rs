//! TIGERweb REST [`BoundarySource`] (C4): the federal-authority variant.
//!
//! Requests carry a pinned User-Agent and a 30-second timeout, and retry up
//! to 3 times with exponential backoff (500/1000/2000 ms plus jitter) on 429
//! and 5xx responses only; every other HTTP error propagates immediately
//! (§4.4).

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::types::{AuthorityLevel, Boundary, BoundaryType, Point};

use super::{BoundarySource, SourceError};

const USER_AGENT: &str = "shadow-atlas/1.0 (+https://github.com/shadow-atlas)";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

/// TIGERweb MapServer/FeatureServer client.
pub struct TigerWebSource {
    client: reqwest::Client,
    base_url: String,
}

impl TigerWebSource {
    /// Build a client pointed at `base_url` (a TIGERweb MapServer root).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// GET `url`, retrying per §4.4's policy. Returns the response body text.
    async fn get_with_retry(&self, url: &str) -> Result<String, SourceError> {
        let mut attempt = 0u32;
        loop {
            let response = self.client.get(url).send().await;
            match response {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .text()
                        .await
                        .map_err(|e| SourceError::MalformedResponse(e.to_string()));
                }
                Ok(resp) => {
                    let status = resp.status();
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if !retryable || attempt >= MAX_RETRIES {
                        return Err(SourceError::RequestFailed {
                            message: format!("HTTP {status}"),
                            retryable,
                        });
                    }
                }
                Err(e) => {
                    if attempt >= MAX_RETRIES {
                        return Err(SourceError::RequestFailed {
                            message: e.to_string(),
                            retryable: true,
                        });
                    }
                }
            }
            let backoff_ms = BACKOFF_BASE_MS * 2u64.pow(attempt);
            let jitter_ms: u64 = rand::thread_rng().gen_range(0..=100);
            tokio::time::sleep(Duration::from_millis(backoff_ms + jitter_ms)).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl BoundarySource for TigerWebSource {
    async fn candidates_for_point(
        &self,
        point: Point,
        _types: Option<&[BoundaryType]>,
    ) -> Result<Vec<Boundary>, SourceError> {
        let url = format!(
            "{}/query?geometry={},{}&geometryType=esriGeometryPoint&f=geojson",
            self.base_url, point.lng, point.lat
        );
        let body = self.get_with_retry(&url).await?;
        parse_feature_collection(&body)
    }

    async fn by_jurisdiction(&self, fips: &str) -> Result<Vec<Boundary>, SourceError> {
        let url = format!("{}/query?where=STATE='{fips}'&f=geojson", self.base_url);
        let body = self.get_with_retry(&url).await?;
        parse_feature_collection(&body)
    }

    async fn by_id(&self, id: &str) -> Result<Boundary, SourceError> {
        let url = format!("{}/query?where=GEOID='{id}'&f=geojson", self.base_url);
        let body = self.get_with_retry(&url).await?;
        parse_feature_collection(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

/// Placeholder GeoJSON parse: full ArcGIS FeatureServer schema mapping is
/// the extraction provider's job (C7); this just demonstrates the source's
/// error surface for a malformed upstream body.
fn parse_feature_collection(body: &str) -> Result<Vec<Boundary>, SourceError> {
    let _: serde_json::Value =
        serde_json::from_str(body).map_err(|e| SourceError::MalformedResponse(e.to_string()))?;
    Ok(Vec::new())
}

/// Authority level TIGERweb-sourced boundaries are stamped with.
pub const TIGERWEB_AUTHORITY: AuthorityLevel = AuthorityLevel::FederalTiger;
