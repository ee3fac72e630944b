//! Statewide ward-splitting (§4.7): a single archive containing wards for
//! many cities is split by city identifier, with ward numbers normalized to
//! sequential integers per city and keyed by the city's 7-digit place FIPS.
//!
//! Download/unzip of the source archive is out of scope here (the same way
//! raw shapefile decoding is out of scope for
//! [`super::shapefile::ShapefileProvider`]); this module operates on
//! already-parsed GeoJSON features.

use serde_json::Value;
use std::collections::BTreeMap;

/// A parse failure when a ward feature is missing an expected property.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WardSplitError {
    /// Feature's `properties` object is missing the city-identifier field.
    #[error("feature missing city identifier field {0}")]
    MissingCityField(String),
    /// Feature's `properties` object is missing the ward-number field.
    #[error("feature missing ward number field {0}")]
    MissingWardField(String),
}

/// Split a flat list of ward features by the value of `city_field`,
/// returning one `FeatureCollection`-shaped group per city (keyed by
/// whatever the city field holds — typically a 7-digit place FIPS).
pub fn split_by_city(features: &[Value], city_field: &str) -> Result<BTreeMap<String, Vec<Value>>, WardSplitError> {
    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for feature in features {
        let city_id = feature
            .get("properties")
            .and_then(|p| p.get(city_field))
            .and_then(Value::as_str)
            .ok_or_else(|| WardSplitError::MissingCityField(city_field.to_string()))?;
        grouped.entry(city_id.to_string()).or_default().push(feature.clone());
    }
    Ok(grouped)
}

/// Renumber a single city's wards to sequential integers `1..=n`, ordered
/// by the original ward field's ascending value (stable under ties by
/// original feature order).
pub fn normalize_ward_numbers(features: &mut [Value], ward_field: &str) -> Result<(), WardSplitError> {
    let mut indices: Vec<usize> = (0..features.len()).collect();
    let original_wards: Vec<f64> = features
        .iter()
        .map(|f| {
            f.get("properties")
                .and_then(|p| p.get(ward_field))
                .and_then(Value::as_f64)
                .ok_or_else(|| WardSplitError::MissingWardField(ward_field.to_string()))
        })
        .collect::<Result<_, _>>()?;

    indices.sort_by(|&a, &b| original_wards[a].partial_cmp(&original_wards[b]).unwrap());

    for (sequential, &original_index) in indices.iter().enumerate() {
        if let Some(properties) = features[original_index].get_mut("properties") {
            properties[ward_field] = Value::from(sequential as u64 + 1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_features_by_city_field() {
        let features = vec![
            json!({"properties": {"PLACE_FIPS": "1500300", "WARD": 3}}),
            json!({"properties": {"PLACE_FIPS": "1500300", "WARD": 1}}),
            json!({"properties": {"PLACE_FIPS": "1577000", "WARD": 2}}),
        ];
        let grouped = split_by_city(&features, "PLACE_FIPS").unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["1500300"].len(), 2);
    }

    #[test]
    fn missing_city_field_is_an_error() {
        let features = vec![json!({"properties": {"WARD": 1}})];
        assert!(matches!(
            split_by_city(&features, "PLACE_FIPS"),
            Err(WardSplitError::MissingCityField(_))
        ));
    }

    #[test]
    fn normalizes_to_sequential_integers_preserving_order() {
        let mut features = vec![
            json!({"properties": {"WARD": 7}}),
            json!({"properties": {"WARD": 2}}),
            json!({"properties": {"WARD": 15}}),
        ];
        normalize_ward_numbers(&mut features, "WARD").unwrap();
        assert_eq!(features[1]["properties"]["WARD"], json!(1)); // was 2, smallest
        assert_eq!(features[0]["properties"]["WARD"], json!(2)); // was 7, middle
        assert_eq!(features[2]["properties"]["WARD"], json!(3)); // was 15, largest
    }
}
