//! Semantic districtness scoring (§4.9): a 0-100 heuristic confidence that
//! a discovered layer is a council-district layer.

use crate::types::BBox;

use super::traversal::LayerDetail;

const POSITIVE_NAME_PATTERNS: &[&str] = &["council", "district", "ward", "voting", "aldermanic"];
const NEGATIVE_NAME_PATTERNS: &[&str] = &["school", "police", "fire", "park", "water"];
const DISTRICT_FIELD_PATTERNS: &[&str] = &["district", "council", "ward"];

/// High-confidence threshold (§4.9).
pub const HIGH_CONFIDENCE_THRESHOLD: u8 = 70;
/// Lower bound of the human-review band (§4.9).
pub const REVIEW_THRESHOLD: u8 = 50;

/// A disposition derived from a districtness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    HighConfidence,
    NeedsReview,
    Rejected,
}

/// Parse an ArcGIS-style `{xmin,ymin,xmax,ymax}` extent object into a
/// [`BBox`]. Returns `None` for a missing or malformed extent.
fn parse_extent(extent: &serde_json::Value) -> Option<BBox> {
    let xmin = extent.get("xmin")?.as_f64()?;
    let ymin = extent.get("ymin")?.as_f64()?;
    let xmax = extent.get("xmax")?.as_f64()?;
    let ymax = extent.get("ymax")?.as_f64()?;
    BBox::new(xmin, ymin, xmax, ymax)
}

fn extents_overlap(a: &BBox, b: &BBox) -> bool {
    a.min_lng <= b.max_lng && a.max_lng >= b.min_lng && a.min_lat <= b.max_lat && a.max_lat >= b.min_lat
}

/// Score `layer`'s districtness 0-100 (§4.9). `expected_city_extent` is the
/// city's expected bounds; `None` skips the extent-overlap term.
pub fn score_layer(layer: &LayerDetail, feature_count: Option<u64>, expected_city_extent: Option<BBox>) -> u8 {
    let mut score: i32 = 0;
    let name_lower = layer.name.to_lowercase();

    if NEGATIVE_NAME_PATTERNS.iter().any(|p| name_lower.contains(p)) {
        return 0;
    }
    if POSITIVE_NAME_PATTERNS.iter().any(|p| name_lower.contains(p)) {
        score += 40;
    }

    if layer.geometry_type.as_deref() == Some("esriGeometryPolygon") {
        score += 30;
    }

    if layer
        .fields
        .iter()
        .any(|f| DISTRICT_FIELD_PATTERNS.iter().any(|p| f.name.to_lowercase().contains(p)))
    {
        score += 20;
    }

    if let Some(count) = feature_count {
        if (3..=25).contains(&count) {
            score += 10;
        }
    }

    if let (Some(city_extent), Some(layer_extent)) = (expected_city_extent, layer.extent.as_ref().and_then(parse_extent))
    {
        if extents_overlap(&city_extent, &layer_extent) {
            score += 5;
        }
    }

    score.clamp(0, 100) as u8
}

/// Classify a score into the three §4.9 bands.
pub fn disposition(score: u8) -> Disposition {
    if score >= HIGH_CONFIDENCE_THRESHOLD {
        Disposition::HighConfidence
    } else if score >= REVIEW_THRESHOLD {
        Disposition::NeedsReview
    } else {
        Disposition::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::traversal::FieldSchema;

    fn layer(name: &str, geometry_type: Option<&str>, fields: Vec<&str>) -> LayerDetail {
        LayerDetail {
            id: 0,
            name: name.to_string(),
            geometry_type: geometry_type.map(|s| s.to_string()),
            fields: fields.into_iter().map(|f| FieldSchema { name: f.to_string() }).collect(),
            extent: None,
        }
    }

    #[test]
    fn strong_council_district_layer_scores_high() {
        let l = layer("Council Districts", Some("esriGeometryPolygon"), vec!["DISTRICT"]);
        let score = score_layer(&l, Some(9), None);
        assert_eq!(score, 100);
        assert_eq!(disposition(score), Disposition::HighConfidence);
    }

    #[test]
    fn school_district_layer_is_rejected_outright() {
        let l = layer("School District Boundaries", Some("esriGeometryPolygon"), vec!["DISTRICT"]);
        assert_eq!(score_layer(&l, Some(9), None), 0);
    }

    #[test]
    fn generic_polygon_layer_with_no_other_signal_is_rejected() {
        let l = layer("Parcels", Some("esriGeometryPolygon"), vec![]);
        let score = score_layer(&l, None, None);
        assert_eq!(disposition(score), Disposition::Rejected);
        assert_eq!(score, 30);
    }

    #[test]
    fn feature_count_outside_typical_range_does_not_contribute() {
        let l = layer("Ward Map", Some("esriGeometryPolygon"), vec!["WARD"]);
        let in_range = score_layer(&l, Some(10), None);
        let out_of_range = score_layer(&l, Some(500), None);
        assert!(in_range > out_of_range);
    }

    #[test]
    fn overlapping_extent_adds_five_points() {
        let mut l = layer("Ward Map", Some("esriGeometryPolygon"), vec!["WARD"]);
        l.extent = Some(serde_json::json!({"xmin": -158.0, "ymin": 21.0, "xmax": -157.0, "ymax": 22.0}));
        let city_extent = BBox::new(-157.9, 21.2, -157.8, 21.4).unwrap();
        let with_overlap = score_layer(&l, Some(10), Some(city_extent));
        let without = score_layer(&l, Some(10), None);
        assert_eq!(with_overlap, without + 5);
    }
}
