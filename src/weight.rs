//! `WeightDistributor`: spreads a lower zone's exogenous weight across the
//! overlay tiles it participates in, by areal proportion (spec.md §4.4).

use ahash::AHashMap;

use crate::overlay::Tile;
use crate::zone::WeightedLower;

/// Fills in `tile.weight = lower.weight * (tile.area / lower.area)` for
/// every tile produced by [`crate::overlay::overlay_weighted`]. Purely
/// local: each tile's weight depends only on its own area and the lower
/// zone it came from, never on sibling tiles.
///
/// Panics if any tile lacks a lower-zone id or names one absent from
/// `lower` — both are internal invariants of [`crate::overlay::overlay_weighted`],
/// not conditions a caller-supplied config can trigger.
pub fn distribute(tiles: &mut [Tile], lower: &WeightedLower) {
    let by_id: AHashMap<_, _> = lower.zones.iter().map(|z| (z.id.clone(), z)).collect();
    for tile in tiles {
        let l_id = tile.l.as_ref().expect("weighted tiles always carry a lower-zone id");
        let lower_zone = by_id.get(l_id).expect("tile lower-zone id must exist in the lower layer");
        tile.weight = if lower_zone.area > 0.0 {
            lower_zone.weight * (tile.area / lower_zone.area)
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    use super::*;
    use crate::zone::{WeightedLowerZone, ZoneId};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString(vec![
                Coord { x: x0, y: y0 },
                Coord { x: x1, y: y0 },
                Coord { x: x1, y: y1 },
                Coord { x: x0, y: y1 },
                Coord { x: x0, y: y0 },
            ]),
            vec![],
        )])
    }

    #[test]
    fn weight_scales_by_area_fraction() {
        let lower = WeightedLower {
            name: "l".to_string(),
            zones: vec![WeightedLowerZone {
                id: ZoneId::new("l1"),
                geom: square(0.0, 0.0, 2.0, 2.0),
                area: 4.0,
                weight: 40.0,
            }],
            missing_weight_count: 0,
        };
        let mut tiles = vec![Tile {
            a: ZoneId::new("a1"),
            b: ZoneId::new("b1"),
            l: Some(ZoneId::new("l1")),
            area: 1.0,
            weight: f64::NAN,
        }];
        distribute(&mut tiles, &lower);
        assert_eq!(tiles[0].weight, 10.0);
    }

    #[test]
    fn zero_area_lower_zone_yields_zero_weight() {
        let lower = WeightedLower {
            name: "l".to_string(),
            zones: vec![WeightedLowerZone {
                id: ZoneId::new("l1"),
                geom: square(0.0, 0.0, 0.0, 0.0),
                area: 0.0,
                weight: 40.0,
            }],
            missing_weight_count: 0,
        };
        let mut tiles = vec![Tile {
            a: ZoneId::new("a1"),
            b: ZoneId::new("b1"),
            l: Some(ZoneId::new("l1")),
            area: 0.0,
            weight: f64::NAN,
        }];
        distribute(&mut tiles, &lower);
        assert_eq!(tiles[0].weight, 0.0);
    }
}
