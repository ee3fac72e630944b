//! Geometry check (§4.6): invalid coordinates, unclosed rings,
//! self-intersections, bowties, and hole-ring overlap, for every ring of a
//! boundary.

use crate::errors::InvalidGeometry;
use crate::geometry::ring::{validate_hole_overlap, validate_ring};
use crate::types::Boundary;

/// Validate every ring of `boundary`'s geometry, collecting all defects
/// rather than stopping at the first (§9: "every rejected record produces
/// a discrepancy in the report").
pub fn check_geometry(boundary: &Boundary) -> Vec<InvalidGeometry> {
    let mut issues = Vec::new();
    match &boundary.geometry {
        crate::types::Geometry::Polygon { exterior, holes } => {
            if let Err(e) = validate_ring(exterior, 0) {
                issues.push(e);
            }
            for (i, hole) in holes.iter().enumerate() {
                if let Err(e) = validate_ring(hole, i + 1) {
                    issues.push(e);
                }
                if let Err(e) = validate_hole_overlap(exterior, hole, i + 1) {
                    issues.push(e);
                }
            }
        }
        crate::types::Geometry::MultiPolygon(polys) => {
            let mut ring_index = 0;
            for (exterior, holes) in polys {
                if let Err(e) = validate_ring(exterior, ring_index) {
                    issues.push(e);
                }
                ring_index += 1;
                for hole in holes {
                    if let Err(e) = validate_ring(hole, ring_index) {
                        issues.push(e);
                    }
                    if let Err(e) = validate_hole_overlap(exterior, hole, ring_index) {
                        issues.push(e);
                    }
                    ring_index += 1;
                }
            }
        }
    }
    issues
}
