use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use rayon::prelude::*;
use rstar::AABB;

use crate::index::Index;

/// A single overlay cell: the exact intersection of shape `left` in the
/// left index with shape `right` in the right index.
///
/// Carries no provenance beyond the two source indices — the caller maps
/// these back to zone/lower-zone identifiers.
#[derive(Debug, Clone)]
pub struct RawTile {
    pub left: usize,
    pub right: usize,
    pub geom: MultiPolygon<f64>,
    pub area: f64,
}

/// Planar intersection of every shape in `left` against every
/// bounding-box-overlapping shape in `right`, producing one `RawTile` per
/// nonempty intersection. Degenerate (zero-area) intersections are dropped.
///
/// Candidate pairs are pruned with `right`'s R-tree before the exact `geo`
/// boolean intersection is computed, and independent left-shapes are
/// overlaid in parallel; the result is otherwise order-independent, so this
/// can be called repeatedly to reduce left-to-right over more than two
/// layers.
pub fn overlay_pairs(left: &Index, right: &Index) -> Vec<RawTile> {
    (0..left.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let l = left.shape(i);
            let Some(rect) = l.bounding_rect() else {
                return Vec::new().into_iter();
            };
            let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
            let tiles: Vec<RawTile> = right
                .query(&envelope)
                .filter_map(|j| {
                    let r = right.shape(j);
                    let piece = l.intersection(r);
                    let area = piece.unsigned_area();
                    (area > 0.0).then_some(RawTile {
                        left: i,
                        right: j,
                        geom: piece,
                        area,
                    })
                })
                .collect();
            tiles.into_iter()
        })
        .collect()
}
