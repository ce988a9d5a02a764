//! `FactorBuilder`: aggregates tiles into the `(a, b)` factor table
//! (spec.md §4.5).

use ahash::{AHashMap, AHashSet};

use crate::context::{RunContext, Warning};
use crate::overlay::Tile;
use crate::zone::ZoneId;

/// One row of the output factor table.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRow {
    pub a: ZoneId,
    pub b: ZoneId,
    pub a_to_b: f64,
    pub b_to_a: f64,
}

/// Builds the factor table from a tile set. `T(a, b)`, `S_a(a)`, `S_b(b)`
/// are the three sums described in spec.md §4.5; a source whose total
/// weight is zero gets a `NaN` sentinel in that direction rather than a
/// division, and is reported once as a zero-weight zone.
pub fn build(
    ctx: &mut RunContext,
    layer_a_name: &str,
    layer_b_name: &str,
    tiles: &[Tile],
) -> Vec<FactorRow> {
    let mut pair_totals: AHashMap<(ZoneId, ZoneId), f64> = AHashMap::default();
    let mut s_a: AHashMap<ZoneId, f64> = AHashMap::default();
    let mut s_b: AHashMap<ZoneId, f64> = AHashMap::default();

    for tile in tiles {
        *pair_totals.entry((tile.a.clone(), tile.b.clone())).or_insert(0.0) += tile.weight;
        *s_a.entry(tile.a.clone()).or_insert(0.0) += tile.weight;
        *s_b.entry(tile.b.clone()).or_insert(0.0) += tile.weight;
    }

    let mut reported_a: AHashSet<ZoneId> = AHashSet::default();
    let mut reported_b: AHashSet<ZoneId> = AHashSet::default();

    let mut rows: Vec<FactorRow> = pair_totals
        .into_iter()
        .map(|((a, b), t_ab)| {
            let total_a = s_a[&a];
            let a_to_b = if total_a > 0.0 {
                t_ab / total_a
            } else {
                if reported_a.insert(a.clone()) {
                    ctx.warn(Warning::ZeroWeightZone {
                        layer: layer_a_name.to_string(),
                        zone_id: a.to_string(),
                    });
                }
                f64::NAN
            };

            let total_b = s_b[&b];
            let b_to_a = if total_b > 0.0 {
                t_ab / total_b
            } else {
                if reported_b.insert(b.clone()) {
                    ctx.warn(Warning::ZeroWeightZone {
                        layer: layer_b_name.to_string(),
                        zone_id: b.to_string(),
                    });
                }
                f64::NAN
            };

            FactorRow { a, b, a_to_b, b_to_a }
        })
        .collect();

    rows.sort_by(|x, y| (x.a.as_str(), x.b.as_str()).cmp(&(y.a.as_str(), y.b.as_str())));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(a: &str, b: &str, weight: f64) -> Tile {
        Tile {
            a: ZoneId::new(a),
            b: ZoneId::new(b),
            l: None,
            area: weight,
            weight,
        }
    }

    #[test]
    fn splits_weight_proportionally_in_both_directions() {
        let mut ctx = RunContext::new("t");
        let tiles = vec![tile("a", "x", 3.0), tile("a", "y", 1.0)];
        let rows = build(&mut ctx, "a_layer", "b_layer", &tiles);
        let ax = rows.iter().find(|r| r.b == ZoneId::new("x")).unwrap();
        assert!((ax.a_to_b - 0.75).abs() < 1e-9);
        assert_eq!(ax.b_to_a, 1.0);
    }

    #[test]
    fn zero_weight_zone_yields_nan_and_warning() {
        let mut ctx = RunContext::new("t");
        let tiles = vec![tile("a", "x", 0.0)];
        let rows = build(&mut ctx, "a_layer", "b_layer", &tiles);
        assert!(rows[0].a_to_b.is_nan());
        assert!(rows[0].b_to_a.is_nan());
        assert_eq!(ctx.warnings().len(), 2);
    }
}
