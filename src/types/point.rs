//! Geographic primitives: [`Point`] and [`BBox`].

use serde::{Deserialize, Serialize};

/// A WGS84 point, `(lng, lat)` in degrees.
///
/// Invariant: `-180 <= lng <= 180` and `-90 <= lat <= 90`, both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Point {
    /// Construct a point, returning `None` if it violates the WGS84 range
    /// invariant or is non-finite.
    pub fn new(lng: f64, lat: f64) -> Option<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some(Self { lng, lat })
    }
}

/// An axis-aligned bounding box: `(min_lng, min_lat, max_lng, max_lat)`.
///
/// Invariant: `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Minimum longitude.
    pub min_lng: f64,
    /// Minimum latitude.
    pub min_lat: f64,
    /// Maximum longitude.
    pub max_lng: f64,
    /// Maximum latitude.
    pub max_lat: f64,
}

impl BBox {
    /// Construct a bbox, returning `None` if `min > max` on either axis.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Option<Self> {
        if min_lng > max_lng || min_lat > max_lat {
            return None;
        }
        Some(Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        })
    }

    /// O(1) rejection test used by every [`crate::source`] variant before
    /// running the (comparatively expensive) point-in-polygon test.
    pub fn contains(&self, p: Point) -> bool {
        p.lng >= self.min_lng && p.lng <= self.max_lng && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    /// Bounding box of a set of ring points. Returns `None` for an empty ring.
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut b = Self {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        };
        for p in iter {
            b.min_lng = b.min_lng.min(p.lng);
            b.min_lat = b.min_lat.min(p.lat);
            b.max_lng = b.max_lng.max(p.lng);
            b.max_lat = b.max_lat.max(p.lat);
        }
        Some(b)
    }

    /// Union of two bounding boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}
