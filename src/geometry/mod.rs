//! C3: the point-in-polygon geometry engine and ring validation (C6 geometry
//! checks share the same ray-casting primitives).

pub mod pip;
pub mod ring;

pub use pip::{contains, distance_to_nearest_edge, find_containing, find_finest};
pub use ring::validate_ring;
