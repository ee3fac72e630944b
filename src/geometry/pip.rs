//! Ray-casting point-in-polygon containment (C3, §4.3).

use crate::types::{BBox, Boundary, Geometry, Point, Resolution};

/// Default edge tolerance, in degrees (~1 mm at equatorial scale).
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.lng - a.lng, b.lat - a.lat);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        // Degenerate segment: distance reduces to point-point (§4.3).
        let (ex, ey) = (p.lng - a.lng, p.lat - a.lat);
        return (ex * ex + ey * ey).sqrt();
    }
    let t = ((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    let (cx, cy) = (a.lng + t * dx, a.lat + t * dy);
    ((p.lng - cx).powi(2) + (p.lat - cy).powi(2)).sqrt()
}

fn near_any_edge(p: Point, ring: &[Point], tol: f64) -> bool {
    ring.windows(2)
        .any(|pair| distance_to_segment(p, pair[0], pair[1]) <= tol)
}

/// Ray-cast a single ring: count crossings of a horizontal ray from `p`
/// toward `+inf` along x. Odd count means inside.
fn ray_cast_ring(p: Point, ring: &[Point]) -> bool {
    let mut inside = false;
    for pair in ring.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.lat == b.lat {
            continue; // horizontal edges are skipped (§4.3)
        }
        let (y1, y2) = (a.lat, b.lat);
        if p.lat >= y1.min(y2) && p.lat < y1.max(y2) {
            let t = (p.lat - a.lat) / (b.lat - a.lat);
            let x_intersect = a.lng + t * (b.lng - a.lng);
            if x_intersect > p.lng {
                inside = !inside;
            }
        }
    }
    inside
}

/// Distance (degrees) from `point` to the nearest edge of any ring in
/// `geometry`, used by the resolver (C5) to discount confidence for points
/// near a boundary edge.
pub fn distance_to_nearest_edge(point: Point, geometry: &Geometry) -> f64 {
    geometry
        .rings()
        .into_iter()
        .flat_map(|ring| ring.windows(2))
        .map(|pair| distance_to_segment(point, pair[0], pair[1]))
        .fold(f64::INFINITY, f64::min)
}

/// `contains(point, polygon, tol)` from §4.3.
pub fn contains(point: Point, geometry: &Geometry, tol: f64) -> bool {
    match geometry {
        Geometry::Polygon { exterior, holes } => contains_polygon(point, exterior, holes, tol),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .any(|(exterior, holes)| contains_polygon(point, exterior, holes, tol)),
    }
}

fn contains_polygon(point: Point, exterior: &[Point], holes: &[Vec<Point>], tol: f64) -> bool {
    if near_any_edge(point, exterior, tol) {
        return true;
    }
    for hole in holes {
        if near_any_edge(point, hole, tol) {
            return true;
        }
    }
    if !ray_cast_ring(point, exterior) {
        return false;
    }
    !holes.iter().any(|hole| ray_cast_ring(point, hole))
}

fn bbox_hit(point: Point, bbox: &BBox) -> bool {
    bbox.contains(point)
}

/// `find_containing(point, candidates) → Resolution[]`: bbox pre-filter,
/// then PIP, emitting matches sorted by precision rank ascending, ties
/// broken by highest authority then earliest `valid_from` (§4.5 ordering
/// guarantee, applied here since C3 is where precision ordering happens).
pub fn find_containing(point: Point, candidates: &[Boundary], now: chrono::DateTime<chrono::Utc>) -> Vec<Resolution> {
    let mut matches: Vec<&Boundary> = candidates
        .iter()
        .filter(|b| b.is_valid(now))
        .filter(|b| bbox_hit(point, &b.bbox))
        .filter(|b| contains(point, &b.geometry, DEFAULT_TOLERANCE))
        .collect();

    matches.sort_by(|a, b| {
        a.r#type
            .ordinal()
            .cmp(&b.r#type.ordinal())
            .then_with(|| b.provenance.authority_level.rank().cmp(&a.provenance.authority_level.rank()))
            .then_with(|| a.valid_from.cmp(&b.valid_from))
    });

    matches
        .into_iter()
        .map(|b| Resolution {
            boundary_id: b.id.clone(),
            precision: b.r#type.ordinal(),
            confidence: 100,
            query_point: point,
            resolved_at: now,
            ttl_seconds: Resolution::DEFAULT_TTL_SECONDS,
        })
        .collect()
}

/// `find_finest`: the head of [`find_containing`], or `None`.
pub fn find_finest(point: Point, candidates: &[Boundary], now: chrono::DateTime<chrono::Utc>) -> Option<Resolution> {
    find_containing(point, candidates, now).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorityLevel, BoundaryType, Provenance, SourceKind};
    use chrono::{DateTime, Utc};

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min).unwrap(),
            Point::new(max, min).unwrap(),
            Point::new(max, max).unwrap(),
            Point::new(min, max).unwrap(),
            Point::new(min, min).unwrap(),
        ]
    }

    fn square_geometry(min: f64, max: f64, holes: Vec<Vec<Point>>) -> Geometry {
        let mut g = Geometry::Polygon {
            exterior: square(min, max),
            holes,
        };
        g.recompute_bbox();
        g
    }

    #[test]
    fn point_strictly_inside_is_contained() {
        let g = square_geometry(0.0, 10.0, vec![]);
        assert!(contains(Point::new(5.0, 5.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn point_strictly_outside_is_not_contained() {
        let g = square_geometry(0.0, 10.0, vec![]);
        assert!(!contains(Point::new(50.0, 50.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn point_on_vertex_is_contained_via_tolerance() {
        let g = square_geometry(0.0, 10.0, vec![]);
        assert!(contains(Point::new(0.0, 0.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn point_on_edge_is_contained_via_tolerance() {
        let g = square_geometry(0.0, 10.0, vec![]);
        assert!(contains(Point::new(5.0, 0.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn point_in_hole_is_not_contained() {
        let hole = square(4.0, 6.0);
        let g = square_geometry(0.0, 10.0, vec![hole]);
        assert!(!contains(Point::new(5.0, 5.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn point_outside_hole_but_inside_exterior_is_contained() {
        let hole = square(4.0, 6.0);
        let g = square_geometry(0.0, 10.0, vec![hole]);
        assert!(contains(Point::new(1.0, 1.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    #[test]
    fn multipolygon_contained_if_any_member_contains() {
        let a = (square(0.0, 10.0), vec![]);
        let b = (square(100.0, 110.0), vec![]);
        let g = Geometry::MultiPolygon(vec![a, b]);
        assert!(contains(Point::new(105.0, 105.0).unwrap(), &g, DEFAULT_TOLERANCE));
    }

    fn boundary(id: &str, kind: BoundaryType, min: f64, max: f64, authority: AuthorityLevel) -> Boundary {
        let geometry = square_geometry(min, max, vec![]);
        let bbox = geometry.recompute_bbox().unwrap();
        Boundary {
            id: id.to_string(),
            r#type: kind,
            name: id.to_string(),
            jurisdiction: id.to_string(),
            jurisdiction_fips: "06".to_string(),
            geometry,
            bbox,
            valid_from: DateTime::from_timestamp(0, 0).unwrap(),
            valid_until: None,
            provenance: Provenance {
                source_kind: SourceKind::InMemory,
                source_url: "memory://test".to_string(),
                retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
                data_version: None,
                license: None,
                processing_steps: vec![],
                authority_level: authority,
                last_verified: DateTime::from_timestamp(0, 0).unwrap(),
            },
            raw_attributes: Default::default(),
        }
    }

    #[test]
    fn finest_precision_wins_when_both_contain() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        let precinct = boundary("p1", BoundaryType::Precinct, 0.0, 10.0, AuthorityLevel::Unknown);
        let county = boundary("c1", BoundaryType::County, 0.0, 10.0, AuthorityLevel::Unknown);
        let resolved = find_containing(Point::new(5.0, 5.0).unwrap(), &[county, precinct], now);
        assert_eq!(resolved[0].boundary_id, "p1");
    }

    #[test]
    fn tie_broken_by_higher_authority() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        let low = boundary("low", BoundaryType::County, 0.0, 10.0, AuthorityLevel::Unknown);
        let high = boundary("high", BoundaryType::County, 0.0, 10.0, AuthorityLevel::FederalMandate);
        let resolved = find_containing(Point::new(5.0, 5.0).unwrap(), &[low, high], now);
        assert_eq!(resolved[0].boundary_id, "high");
    }

    #[test]
    fn bbox_prefilter_excludes_non_overlapping_candidates() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        let far = boundary("far", BoundaryType::County, 100.0, 110.0, AuthorityLevel::Unknown);
        assert!(find_finest(Point::new(5.0, 5.0).unwrap(), &[far], now).is_none());
    }
}
