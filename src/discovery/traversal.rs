//! Recursive ArcGIS folder traversal (§4.9): BFS through folders/services,
//! hard-capped at `max_depth = 5`, fetching each discovered layer's detail.

use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

use super::rate_limit::TokenBucket;

/// Hard traversal depth cap (§4.9).
pub const MAX_DEPTH: u32 = 5;

#[derive(Debug, Deserialize)]
struct FolderListing {
    #[serde(default)]
    folders: Vec<String>,
    #[serde(default)]
    services: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize, Clone)]
struct ServiceEntry {
    name: String,
    #[serde(rename = "type")]
    service_type: String,
}

/// A layer's detail as fetched from `<service>/<id>?f=json` (§4.9 scoring
/// inputs: geometry type, field schema, extent, feature count).
#[derive(Debug, Clone, Deserialize)]
pub struct LayerDetail {
    pub id: u32,
    pub name: String,
    #[serde(rename = "geometryType", default)]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub extent: Option<serde_json::Value>,
}

/// A single field in a layer's schema.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
}

/// A discovered layer, tagged with the service path it was found under.
#[derive(Debug, Clone)]
pub struct DiscoveredLayer {
    pub service_path: String,
    pub detail: LayerDetail,
}

struct QueueEntry {
    folder_path: String,
    depth: u32,
}

/// BFS the folder tree rooted at `base_url/arcgis/rest/services`, fetching
/// every layer detail found along the way. Traversal stops at `MAX_DEPTH`;
/// deeper folders are silently not visited (§4.9).
pub async fn traverse(client: &reqwest::Client, base_url: &str, bucket: &mut TokenBucket) -> Vec<DiscoveredLayer> {
    let mut layers = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(QueueEntry {
        folder_path: String::new(),
        depth: 0,
    });

    while let Some(entry) = queue.pop_front() {
        if entry.depth > MAX_DEPTH {
            continue;
        }
        bucket.acquire().await;
        let url = format!("{base_url}/arcgis/rest/services/{}?f=json", entry.folder_path);
        let Ok(resp) = client.get(&url).send().await else {
            continue;
        };
        let Ok(body) = resp.text().await else {
            continue;
        };
        let Ok(listing) = serde_json::from_str::<FolderListing>(&body) else {
            continue;
        };

        for sub_folder in listing.folders {
            if entry.depth + 1 > MAX_DEPTH {
                continue;
            }
            let child_path = if entry.folder_path.is_empty() {
                sub_folder
            } else {
                format!("{}/{}", entry.folder_path, sub_folder)
            };
            queue.push_back(QueueEntry {
                folder_path: child_path,
                depth: entry.depth + 1,
            });
        }

        for service in listing.services {
            if service.service_type != "MapServer" && service.service_type != "FeatureServer" {
                continue;
            }
            let service_path = format!("{}/{}", service.name, service.service_type);
            bucket.acquire().await;
            if let Some(service_layers) = fetch_service_layers(client, base_url, &service_path).await {
                for layer_id in service_layers {
                    bucket.acquire().await;
                    if let Some(detail) = fetch_layer_detail(client, base_url, &service_path, layer_id).await {
                        layers.push(DiscoveredLayer {
                            service_path: service_path.clone(),
                            detail,
                        });
                    }
                }
            }
        }
    }

    layers
}

#[derive(Debug, Deserialize)]
struct ServiceRoot {
    #[serde(default)]
    layers: Vec<LayerSummary>,
}

#[derive(Debug, Deserialize)]
struct LayerSummary {
    id: u32,
}

async fn fetch_service_layers(client: &reqwest::Client, base_url: &str, service_path: &str) -> Option<Vec<u32>> {
    let url = format!("{base_url}/arcgis/rest/services/{service_path}?f=json");
    let resp = client.get(&url).timeout(Duration::from_secs(5)).send().await.ok()?;
    let body = resp.text().await.ok()?;
    let root: ServiceRoot = serde_json::from_str(&body).ok()?;
    Some(root.layers.into_iter().map(|l| l.id).collect())
}

async fn fetch_layer_detail(
    client: &reqwest::Client,
    base_url: &str,
    service_path: &str,
    layer_id: u32,
) -> Option<LayerDetail> {
    let url = format!("{base_url}/arcgis/rest/services/{service_path}/{layer_id}?f=json");
    let resp = client.get(&url).timeout(Duration::from_secs(5)).send().await.ok()?;
    let body = resp.text().await.ok()?;
    serde_json::from_str(&body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_listing_parses_with_empty_defaults() {
        let listing: FolderListing = serde_json::from_str(r#"{}"#).unwrap();
        assert!(listing.folders.is_empty());
        assert!(listing.services.is_empty());
    }

    #[test]
    fn layer_detail_parses_minimal_body() {
        let detail: LayerDetail = serde_json::from_str(
            r#"{"id": 3, "name": "Council Districts", "geometryType": "esriGeometryPolygon", "fields": [{"name": "DISTRICT"}]}"#,
        )
        .unwrap();
        assert_eq!(detail.id, 3);
        assert_eq!(detail.fields[0].name, "DISTRICT");
    }
}
