//! TIGER FTP archive extraction provider (§4.7): the federal-authority
//! shapefile distribution. TIGER shapefiles ship in EPSG:4326 already, so
//! this is a thin [`super::shapefile::ShapefileProvider`] wrapper stamped
//! with [`AuthorityLevel::FederalTiger`].

use crate::types::{AuthorityLevel, BoundaryType};

use super::shapefile::{ShapefileProvider, SourceProjection};

/// TIGER archive filenames follow `tl_<year>_<state_fips>_<layer_code>.zip`.
/// Parse the state FIPS and layer code out of one.
pub fn parse_archive_name(filename: &str) -> Option<(String, String)> {
    let stem = filename.strip_suffix(".zip")?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() != 4 || parts[0] != "tl" {
        return None;
    }
    Some((parts[2].to_string(), parts[3].to_string()))
}

/// Map a TIGER layer code to its [`BoundaryType`].
pub fn layer_code_to_boundary_type(layer_code: &str) -> Option<BoundaryType> {
    match layer_code {
        "cd118" | "cd119" => Some(BoundaryType::CongressionalDistrict),
        "county" => Some(BoundaryType::County),
        "sldl" => Some(BoundaryType::StateLegislativeLower),
        "sldu" => Some(BoundaryType::StateLegislativeUpper),
        "place" => Some(BoundaryType::CityLimits),
        "cousub" => Some(BoundaryType::CouncilDistrict),
        _ => None,
    }
}

/// Build a shapefile provider for a TIGER archive. TIGER data is already
/// geographic, so [`SourceProjection::Wgs84`] is always correct here.
pub fn tiger_provider(archive_url: impl Into<String>, boundary_type: BoundaryType) -> ShapefileProvider {
    ShapefileProvider::new(archive_url, boundary_type, AuthorityLevel::FederalTiger, SourceProjection::Wgs84)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_archive_name() {
        assert_eq!(
            parse_archive_name("tl_2024_06_cd118.zip"),
            Some(("06".to_string(), "cd118".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(parse_archive_name("not-a-tiger-file.zip"), None);
        assert_eq!(parse_archive_name("tl_2024_06_cd118.shp"), None);
    }

    #[test]
    fn maps_known_layer_codes() {
        assert_eq!(layer_code_to_boundary_type("cd118"), Some(BoundaryType::CongressionalDistrict));
        assert_eq!(layer_code_to_boundary_type("unknown-layer"), None);
    }
}
