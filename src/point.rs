//! `PointSubstitution`: replaces near-degenerate "point" zones with their
//! enclosing lower zone (spec.md §4.2), plus the point-to-point
//! reconciliation that short-circuits overlay entirely for matched pairs.

use std::collections::HashSet;

use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::context::{RunContext, Warning};
use crate::error::{Error, Result};
use crate::zone::{Zone, ZoneId, ZoningLayer, WeightedLower};

/// Buffer applied to a true point before it can be treated as a polygon
/// with an area. The original tool's equivalent constant was unexplained;
/// this value is named and documented here rather than left as an
/// unexplained magic number (spec.md §9 Open Question).
pub const TRUE_POINT_BUFFER: f64 = 0.1;

/// Default cap on point-to-point nearest-neighbor matching, in CRS units
/// (spec.md §4.2).
pub const DEFAULT_POINT_MATCH_DISTANCE: f64 = 1000.0;

fn buffer_point(pt: Point<f64>, radius: f64) -> MultiPolygon<f64> {
    let (x, y) = pt.x_y();
    let ring = LineString(vec![
        Coord { x: x - radius, y: y - radius },
        Coord { x: x + radius, y: y - radius },
        Coord { x: x + radius, y: y + radius },
        Coord { x: x - radius, y: y + radius },
        Coord { x: x - radius, y: y - radius },
    ]);
    MultiPolygon(vec![Polygon::new(ring, vec![])])
}

/// Promotes true points whose id matches a zone in `layer` (or that carry
/// an id absent from it) into infinitesimal buffered polygons, then
/// replaces every zone below `point_tolerance` with the geometry of the
/// single lower zone that contains it (spec.md §4.2 algorithm, steps 1-4).
///
/// Returns the input layer unchanged if no zone falls below
/// `point_tolerance`.
pub fn substitute_points(
    ctx: &mut RunContext,
    layer: &ZoningLayer,
    true_points: &[(Option<String>, Point<f64>)],
    lower: &WeightedLower,
    point_tolerance: f64,
) -> Result<ZoningLayer> {
    use geo::Area;

    let mut zones = layer.zones.clone();
    for (id, pt) in true_points {
        let Some(id) = id else { continue };
        let id = ZoneId::new(id);
        let geom = buffer_point(*pt, TRUE_POINT_BUFFER);
        let area = geom.unsigned_area();
        match zones.iter_mut().find(|z| z.id == id) {
            Some(z) => {
                z.geom = geom;
                z.area = area;
            }
            None => zones.push(Zone { id, geom, area }),
        }
    }

    if zones.iter().all(|z| z.area >= point_tolerance) {
        return Ok(ZoningLayer::new(layer.name.clone(), zones));
    }

    use geo::BooleanOps;

    let mut replaced = Vec::new();
    let mut kept = Vec::new();
    for zone in zones {
        if zone.area >= point_tolerance {
            kept.push(zone);
            continue;
        }
        let containers: Vec<_> = lower
            .zones
            .iter()
            .filter(|l| l.geom.contains(&zone.geom))
            .collect();
        let chosen = match containers.len() {
            0 => {
                return Err(Error::AmbiguousPointContainment {
                    layer: layer.name.clone(),
                    zone_id: zone.id.to_string(),
                    count: 0,
                })
            }
            1 => containers[0],
            _ => {
                let lowest = containers.iter().min_by_key(|l| l.id.clone()).expect("non-empty");
                ctx.warn(Warning::AmbiguousPointTieBreak {
                    layer: layer.name.clone(),
                    zone_id: zone.id.to_string(),
                    chosen_lower: lowest.id.to_string(),
                });
                *lowest
            }
        };
        replaced.push(Zone {
            id: zone.id,
            geom: chosen.geom.clone(),
            area: chosen.area,
        });
    }

    // "The original zoning with selected zones excised" (spec.md §4.2 step
    // 4): each replacement now occupies the full footprint of its chosen
    // lower zone, which may overlap neighboring zones that used to contain
    // the tiny original point. Carve that footprint out of every kept zone
    // before unioning the replacements back in, or the layer would no
    // longer be a disjoint cover.
    if !replaced.is_empty() {
        let mut footprint = replaced[0].geom.clone();
        for r in &replaced[1..] {
            footprint = footprint.union(&r.geom);
        }
        for zone in &mut kept {
            zone.geom = zone.geom.difference(&footprint);
            zone.area = zone.geom.unsigned_area();
        }
    }

    kept.extend(replaced);
    Ok(ZoningLayer::new(layer.name.clone(), kept))
}

#[derive(Clone)]
struct IndexedPoint {
    id: ZoneId,
    point: Point<f64>,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point.x() - point[0];
        let dy = self.point.y() - point[1];
        dx * dx + dy * dy
    }
}

/// A reconciled point-to-point pair that bypasses overlay entirely and
/// becomes the factor row `(a, b, 1, 1)` (spec.md §4.2, §8 invariant 12).
#[derive(Debug, Clone)]
pub struct PointMatch {
    pub a: ZoneId,
    pub b: ZoneId,
}

/// Nearest-neighbor matches the two layers' auxiliary point layers,
/// querying whichever side has more points against the smaller side's
/// index (spec.md §4.2: "asymmetric: whichever layer has more points is
/// queried against the smaller"). Each point matches at most once.
pub fn match_points(
    a_points: &[(ZoneId, Point<f64>)],
    b_points: &[(ZoneId, Point<f64>)],
    max_distance: f64,
) -> Vec<PointMatch> {
    let (query, index_side, swapped) = if a_points.len() >= b_points.len() {
        (a_points, b_points, false)
    } else {
        (b_points, a_points, true)
    };

    let tree = RTree::bulk_load(
        index_side
            .iter()
            .map(|(id, pt)| IndexedPoint { id: id.clone(), point: *pt })
            .collect(),
    );

    let mut used = HashSet::new();
    let mut matches = Vec::new();
    for (query_id, query_pt) in query {
        let Some(nearest) = tree.nearest_neighbor(&[query_pt.x(), query_pt.y()]) else {
            continue;
        };
        if used.contains(&nearest.id) {
            continue;
        }
        let dist = nearest.point.distance_2(&[query_pt.x(), query_pt.y()]).sqrt();
        if dist > max_distance {
            continue;
        }
        used.insert(nearest.id.clone());
        let (a, b) = if swapped {
            (nearest.id.clone(), query_id.clone())
        } else {
            (query_id.clone(), nearest.id.clone())
        };
        matches.push(PointMatch { a, b });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_points_respects_distance_cap() {
        let a = vec![(ZoneId::new("a1"), Point::new(6.0, 8.0))];
        let b = vec![(ZoneId::new("b1"), Point::new(5.0, 7.0))];
        let matches = match_points(&a, &b, DEFAULT_POINT_MATCH_DISTANCE);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].a, ZoneId::new("a1"));
        assert_eq!(matches[0].b, ZoneId::new("b1"));
    }

    #[test]
    fn match_points_drops_pairs_beyond_cap() {
        let a = vec![(ZoneId::new("a1"), Point::new(0.0, 0.0))];
        let b = vec![(ZoneId::new("b1"), Point::new(5000.0, 5000.0))];
        let matches = match_points(&a, &b, DEFAULT_POINT_MATCH_DISTANCE);
        assert!(matches.is_empty());
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        use geo::{Coord, LineString, Polygon};
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
    fn tiny_zone_is_replaced_by_its_containing_lower_zone() {
        use crate::zone::WeightedLowerZone;
        use geo::Area;

        let mut ctx = RunContext::new("t");
        let lower_geom = square(4.0, 6.0, 6.0, 8.0);
        let lower_area = lower_geom.unsigned_area();
        let lower = WeightedLower {
            name: "l".to_string(),
            zones: vec![WeightedLowerZone {
                id: ZoneId::new("L1"),
                geom: lower_geom,
                area: lower_area,
                weight: 25.0,
            }],
            missing_weight_count: 0,
        };
        let layer = ZoningLayer::new(
            "b",
            vec![Zone {
                id: ZoneId::new("pseudo_point"),
                geom: square(4.9, 6.9, 5.1, 7.1),
                area: 0.04,
            }],
        );

        let replaced = substitute_points(&mut ctx, &layer, &[], &lower, 2.0).unwrap();
        assert_eq!(replaced.zones.len(), 1);
        assert_eq!(replaced.zones[0].id, ZoneId::new("pseudo_point"));
        assert!((replaced.zones[0].area - lower_area).abs() < 1e-9);
    }
}
