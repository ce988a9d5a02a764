//! `Overlay`: planar pairwise or triple intersection producing disjoint
//! tiles with provenance ids (spec.md §4.3).
//!
//! The exact geometric work (R-tree pruning, `geo::BooleanOps`
//! intersection) lives in the geometry-only `zonexlate-geom` crate; this
//! module only attaches zoning provenance to the raw index pairs it
//! returns.

use geo::MultiPolygon;
use zonexlate_geom::{overlay_pairs, Index};

use crate::zone::{WeightedLower, ZoneId, ZoningLayer};

/// One cell of an overlay: a piece of geometry carrying the ids of every
/// input layer it came from, its own area, and (for weighted
/// translations) its distributed weight.
///
/// `weight == area` for spatial translations, and tiles never carry a
/// lower-zone id in that case; [`crate::weight::distribute`] fills in
/// `weight` for weighted translations once lower-zone area/weight are
/// known.
#[derive(Debug, Clone)]
pub struct Tile {
    pub a: ZoneId,
    pub b: ZoneId,
    pub l: Option<ZoneId>,
    pub area: f64,
    pub weight: f64,
}

/// Two-layer spatial overlay: tiles carry only `a`/`b` provenance and use
/// area as weight directly (spec.md §4.4: "Spatial translations bypass
/// [WeightDistributor] and treat each tile's area as its weight").
pub fn overlay_spatial(a: &ZoningLayer, b: &ZoningLayer) -> Vec<Tile> {
    let a_index = Index::new(a.zones.iter().map(|z| z.geom.clone()).collect());
    let b_index = Index::new(b.zones.iter().map(|z| z.geom.clone()).collect());

    overlay_pairs(&a_index, &b_index)
        .into_iter()
        .map(|raw| Tile {
            a: a.zones[raw.left].id.clone(),
            b: b.zones[raw.right].id.clone(),
            l: None,
            area: raw.area,
            weight: raw.area,
        })
        .collect()
}

/// Three-layer overlay for a weighted translation: reduces left-to-right
/// (A, then B, then L) per spec.md §4.3, so every tile carries a unique
/// (a, b, l) provenance rather than double-counting lower zones that
/// straddle an A-B boundary. `weight` is left unset (`NaN`); the caller
/// runs [`crate::weight::distribute`] once the lower zones' area/weight are
/// available.
pub fn overlay_weighted(a: &ZoningLayer, b: &ZoningLayer, lower: &WeightedLower) -> Vec<Tile> {
    let a_index = Index::new(a.zones.iter().map(|z| z.geom.clone()).collect());
    let b_index = Index::new(b.zones.iter().map(|z| z.geom.clone()).collect());
    let ab_raw = overlay_pairs(&a_index, &b_index);

    let ab_geoms: Vec<MultiPolygon<f64>> = ab_raw.iter().map(|t| t.geom.clone()).collect();
    let ab_index = Index::new(ab_geoms);
    let l_index = Index::new(lower.zones.iter().map(|z| z.geom.clone()).collect());

    overlay_pairs(&ab_index, &l_index)
        .into_iter()
        .map(|raw| {
            let ab = &ab_raw[raw.left];
            Tile {
                a: a.zones[ab.left].id.clone(),
                b: b.zones[ab.right].id.clone(),
                l: Some(lower.zones[raw.right].id.clone()),
                area: raw.area,
                weight: f64::NAN,
            }
        })
        .collect()
}
