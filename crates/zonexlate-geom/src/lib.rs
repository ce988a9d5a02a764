//! Geometry-only planar overlay primitives.
//!
//! This crate knows nothing about zones, weights or translations — it only
//! indexes polygons for fast bounding-box pruning and computes exact planar
//! intersections between two such indices. Domain semantics (zone ids,
//! tile provenance, weight distribution) live in the `zonexlate` crate.

mod bbox;
mod index;
mod overlay;

pub use index::Index;
pub use overlay::{overlay_pairs, RawTile};
