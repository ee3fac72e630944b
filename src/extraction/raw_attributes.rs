//! Sidecar raw-attributes handling (§9): unknown upstream fields are never
//! dropped, only carried in [`crate::types::Boundary::raw_attributes`] for
//! forensics.

use serde_json::Value;
use std::collections::BTreeMap;

/// The well-known GeoJSON property keys extraction already promotes to
/// typed [`crate::types::Boundary`] fields; everything else in a feature's
/// `properties` object is preserved verbatim.
const PROMOTED_KEYS: &[&str] = &["GEOID", "NAME", "STATE", "id"];

/// Split a feature's raw `properties` object into the subset already
/// promoted to typed fields (dropped here) and the rest (kept, per §9).
pub fn sidecar_attributes(properties: &Value) -> BTreeMap<String, Value> {
    properties
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(k, _)| !PROMOTED_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}
