//! [`Boundary`]: a typed polygonal region with provenance and validity
//! interval (§3). Frozen once included in a snapshot; never mutated, only
//! superseded by a later snapshot whose validity interval starts later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::authority::AuthorityLevel;
use super::boundary_type::BoundaryType;
use super::point::{BBox, Point};
use super::provenance::Provenance;

/// A closed ring: first point equals last point, at least 4 points total
/// (§3, §4.3 edge cases). Validity of this invariant is enforced by
/// [`crate::geometry::ring::validate_ring`], not by the constructor here —
/// boundaries arrive from untrusted upstream data and must be checked by
/// the validation pipeline (C6), not silently rejected at parse time.
pub type Ring = Vec<Point>;

/// Polygon geometry: exterior ring plus zero or more hole rings, or a
/// MultiPolygon (disjoint union of such polygons).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    /// A single polygon: exterior ring followed by interior (hole) rings.
    Polygon {
        /// Exterior ring.
        exterior: Ring,
        /// Interior rings (holes).
        holes: Vec<Ring>,
    },
    /// Multiple disjoint polygons, each with its own holes.
    MultiPolygon(Vec<(Ring, Vec<Ring>)>),
}

impl Geometry {
    /// Recompute the bounding box from the underlying rings (testable
    /// property #1: `recompute_bbox(b.geometry) == b.bbox`).
    pub fn recompute_bbox(&self) -> Option<BBox> {
        match self {
            Geometry::Polygon { exterior, .. } => BBox::of_points(exterior),
            Geometry::MultiPolygon(polys) => {
                let mut acc: Option<BBox> = None;
                for (exterior, _) in polys {
                    let b = BBox::of_points(exterior)?;
                    acc = Some(match acc {
                        Some(existing) => existing.union(&b),
                        None => b,
                    });
                }
                acc
            }
        }
    }

    /// All rings (exterior first, then holes), across all polygons if a
    /// MultiPolygon. Ring index 0 is always an exterior ring for its polygon.
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Polygon { exterior, holes } => {
                let mut v = vec![exterior];
                v.extend(holes.iter());
                v
            }
            Geometry::MultiPolygon(polys) => {
                let mut v = Vec::new();
                for (exterior, holes) in polys {
                    v.push(exterior);
                    v.extend(holes.iter());
                }
                v
            }
        }
    }
}

/// A typed political/administrative boundary (§3).
///
/// Ownership: exclusively owned by whichever snapshot/shard created it;
/// downstream consumers receive read-only references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    /// Stable GEOID-derived identifier. Equality of boundaries is by `id`.
    pub id: String,
    /// Boundary kind, driving precision ranking.
    pub r#type: BoundaryType,
    /// Human-readable name.
    pub name: String,
    /// Jurisdiction name (e.g. "Honolulu").
    pub jurisdiction: String,
    /// Jurisdiction FIPS code.
    pub jurisdiction_fips: String,
    /// Geometry (polygon or multipolygon, holes as interior rings).
    pub geometry: Geometry,
    /// Bounding box, derived from `geometry` at construction time.
    pub bbox: BBox,
    /// Start of validity.
    pub valid_from: DateTime<Utc>,
    /// End of validity. `None` means "indefinitely valid until superseded"
    /// (§9 Open Question: upstream rarely declares an end date).
    pub valid_until: Option<DateTime<Utc>>,
    /// Immutable origin record.
    pub provenance: Provenance,
    /// Unknown upstream fields preserved for forensics (§9 design note:
    /// "Unknown fields are preserved in a sidecar raw attributes map").
    pub raw_attributes: BTreeMap<String, serde_json::Value>,
}

impl Boundary {
    /// `valid_from <= now < valid_until` (absent `valid_until` ⇒ always valid
    /// once started).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.valid_until.map_or(true, |until| now < until)
    }

    /// GEOID-style prefix check: first two characters must equal the
    /// jurisdiction's state FIPS (C6 GEOID format check).
    pub fn geoid_state_prefix_matches(&self, state_fips: &str) -> bool {
        self.id.get(0..2) == Some(state_fips)
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Boundary {}
