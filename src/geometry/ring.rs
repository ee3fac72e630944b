//! Ring structural validation (C6 geometry checks, §4.3 edge cases):
//! closure, minimum vertex count, self-intersection classification, hole
//! overlap.

use crate::errors::{GeometryIssue, InvalidGeometry};
use crate::types::Point;

fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    fn cross(o: Point, a: Point, b: Point) -> f64 {
        (a.lng - o.lng) * (b.lat - o.lat) - (a.lat - o.lat) * (b.lng - o.lng)
    }
    fn on_segment(p: Point, q: Point, r: Point) -> bool {
        q.lng <= p.lng.max(r.lng) && q.lng >= p.lng.min(r.lng) && q.lat <= p.lat.max(r.lat) && q.lat >= p.lat.min(r.lat)
    }

    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    if d1 == 0.0 && on_segment(b1, a1, b2) {
        return true;
    }
    if d2 == 0.0 && on_segment(b1, a2, b2) {
        return true;
    }
    if d3 == 0.0 && on_segment(a1, b1, a2) {
        return true;
    }
    if d4 == 0.0 && on_segment(a1, b2, a2) {
        return true;
    }
    false
}

/// Count self-intersections among a ring's non-adjacent edges. Adjacent
/// edges always "intersect" at their shared vertex, so they're excluded.
fn count_self_intersections(ring: &[Point]) -> usize {
    // ring[last] == ring[0]; edges are (ring[i], ring[i+1]) for i in 0..n-1.
    let n = ring.len() - 1;
    if n < 2 {
        return 0;
    }
    let mut count = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            if segments_intersect(ring[i], ring[i + 1], ring[j], ring[j + 1]) {
                count += 1;
            }
        }
    }
    count
}

fn coordinates_in_range(ring: &[Point]) -> bool {
    ring.iter()
        .all(|p| (-180.0..=180.0).contains(&p.lng) && (-90.0..=90.0).contains(&p.lat))
}

/// Validate a single ring (`ring_index` 0 = exterior, N = hole N-1, per the
/// `InvalidGeometry{ring, ...}` convention in §4.3).
pub fn validate_ring(ring: &[Point], ring_index: usize) -> Result<(), InvalidGeometry> {
    if !coordinates_in_range(ring) {
        return Err(InvalidGeometry {
            ring: ring_index,
            reason: GeometryIssue::CoordinateOutOfRange,
        });
    }
    if ring.len() < 4 {
        return Err(InvalidGeometry {
            ring: ring_index,
            reason: GeometryIssue::TooFewPoints,
        });
    }
    if ring.first() != ring.last() {
        return Err(InvalidGeometry {
            ring: ring_index,
            reason: GeometryIssue::UnclosedRing,
        });
    }
    match count_self_intersections(ring) {
        0 => {}
        1 => {
            return Err(InvalidGeometry {
                ring: ring_index,
                reason: GeometryIssue::Bowtie,
            })
        }
        _ => {
            return Err(InvalidGeometry {
                ring: ring_index,
                reason: GeometryIssue::SelfIntersection,
            })
        }
    }
    Ok(())
}

/// Hole-overlap check: a hole ring must not share any vertex with the
/// exterior ring (§4.6).
pub fn validate_hole_overlap(exterior: &[Point], hole: &[Point], hole_index: usize) -> Result<(), InvalidGeometry> {
    if hole.iter().any(|h| exterior.contains(h)) {
        return Err(InvalidGeometry {
            ring: hole_index,
            reason: GeometryIssue::HoleOverlap,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(pts: &[(f64, f64)]) -> Vec<Point> {
        pts.iter().map(|(x, y)| Point::new(*x, *y).unwrap()).collect()
    }

    #[test]
    fn valid_square_passes() {
        let r = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        assert!(validate_ring(&r, 0).is_ok());
    }

    #[test]
    fn unclosed_ring_is_rejected() {
        let r = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(
            validate_ring(&r, 0).unwrap_err().reason,
            GeometryIssue::UnclosedRing
        );
    }

    #[test]
    fn too_few_points_is_rejected() {
        let r = ring(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]);
        assert_eq!(
            validate_ring(&r, 0).unwrap_err().reason,
            GeometryIssue::TooFewPoints
        );
    }

    #[test]
    fn bowtie_is_rejected() {
        // Self-crosses exactly once: (0,0)->(10,10)->(10,0)->(0,10)->(0,0)
        let r = ring(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]);
        assert_eq!(validate_ring(&r, 0).unwrap_err().reason, GeometryIssue::Bowtie);
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let r = ring(&[(0.0, 0.0), (200.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        assert_eq!(
            validate_ring(&r, 1).unwrap_err().reason,
            GeometryIssue::CoordinateOutOfRange
        );
    }

    #[test]
    fn hole_sharing_vertex_with_exterior_is_rejected() {
        let exterior = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let hole = ring(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0), (0.0, 0.0)]);
        assert!(validate_hole_overlap(&exterior, &hole, 1).is_err());
    }

    #[test]
    fn disjoint_hole_passes() {
        let exterior = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let hole = ring(&[(3.0, 3.0), (6.0, 3.0), (6.0, 6.0), (3.0, 6.0), (3.0, 3.0)]);
        assert!(validate_hole_overlap(&exterior, &hole, 1).is_ok());
    }
}
