//! `ConservationAuditor`: detects missing zones, off sums, and over-one
//! factors after rounding correction (spec.md §4.8).

use ahash::{AHashMap, AHashSet};
use std::path::Path;

use crate::context::{RunContext, Warning};
use crate::error::Result;
use crate::factor::FactorRow;
use crate::zone::{ZoneId, ZoningLayer};

/// The three advisory reports computed over the final factor table.
#[derive(Debug, Default)]
pub struct ConservationReport {
    pub missing_a: Vec<ZoneId>,
    pub missing_b: Vec<ZoneId>,
    pub sum_mismatches_a: Vec<(ZoneId, f64)>,
    pub sum_mismatches_b: Vec<(ZoneId, f64)>,
    pub over_one: Vec<FactorRow>,
}

/// Runs the three conservation checks over `rows` and warns for every
/// finding (negative factors are not checked here; they are already fatal
/// inside [`crate::rounding::correct`]).
pub fn audit(
    ctx: &mut RunContext,
    layer_a: &ZoningLayer,
    layer_b: &ZoningLayer,
    rows: &[FactorRow],
) -> ConservationReport {
    let present_a: AHashSet<ZoneId> = rows.iter().map(|r| r.a.clone()).collect();
    let present_b: AHashSet<ZoneId> = rows.iter().map(|r| r.b.clone()).collect();

    let missing_a: Vec<ZoneId> = layer_a.ids().filter(|id| !present_a.contains(*id)).cloned().collect();
    let missing_b: Vec<ZoneId> = layer_b.ids().filter(|id| !present_b.contains(*id)).cloned().collect();
    for id in &missing_a {
        ctx.warn(Warning::MissingZone { layer: layer_a.name.clone(), zone_id: id.to_string() });
    }
    for id in &missing_b {
        ctx.warn(Warning::MissingZone { layer: layer_b.name.clone(), zone_id: id.to_string() });
    }

    let mut sum_a: AHashMap<ZoneId, f64> = AHashMap::default();
    let mut sum_b: AHashMap<ZoneId, f64> = AHashMap::default();
    for row in rows {
        if !row.a_to_b.is_nan() {
            *sum_a.entry(row.a.clone()).or_insert(0.0) += row.a_to_b;
        }
        if !row.b_to_a.is_nan() {
            *sum_b.entry(row.b.clone()).or_insert(0.0) += row.b_to_a;
        }
    }

    let mut sum_mismatches_a: Vec<(ZoneId, f64)> = sum_a
        .into_iter()
        .filter(|(_, sum)| (sum - 1.0).abs() > 1e-6)
        .collect();
    sum_mismatches_a.sort_by(|x, y| x.0.as_str().cmp(y.0.as_str()));
    for (id, sum) in &sum_mismatches_a {
        ctx.warn(Warning::PreRoundingResidual {
            layer: layer_a.name.clone(),
            zone_id: id.to_string(),
            diff: 1.0 - sum,
        });
    }

    let mut sum_mismatches_b: Vec<(ZoneId, f64)> = sum_b
        .into_iter()
        .filter(|(_, sum)| (sum - 1.0).abs() > 1e-6)
        .collect();
    sum_mismatches_b.sort_by(|x, y| x.0.as_str().cmp(y.0.as_str()));
    for (id, sum) in &sum_mismatches_b {
        ctx.warn(Warning::PreRoundingResidual {
            layer: layer_b.name.clone(),
            zone_id: id.to_string(),
            diff: 1.0 - sum,
        });
    }

    let round3 = |v: f64| (v * 1000.0).round() / 1000.0;
    let over_one: Vec<FactorRow> = rows
        .iter()
        .filter(|r| round3(r.a_to_b) > 1.0 || round3(r.b_to_a) > 1.0)
        .cloned()
        .collect();

    ConservationReport {
        missing_a,
        missing_b,
        sum_mismatches_a,
        sum_mismatches_b,
        over_one,
    }
}

/// Serializes a [`ConservationReport`] to a side-channel sink. The spec's
/// original "multi-sheet workbook" is a directory of CSV sheets here: no
/// crate in this lineage writes `.xlsx`, and introducing one purely for an
/// advisory report would be a fabricated dependency.
pub trait AuditWriter {
    fn write(&self, dir: &Path, layer_a_name: &str, layer_b_name: &str, report: &ConservationReport) -> Result<()>;
}

/// The default [`AuditWriter`]: one CSV sheet per report, named after the
/// two layers being translated, each rendered into memory and written out
/// via [`crate::cache::write_atomic`] (temp file in `dir`, then rename),
/// per spec.md §5's atomic-write requirement.
pub struct CsvAuditWriter;

impl AuditWriter for CsvAuditWriter {
    fn write(&self, dir: &Path, layer_a_name: &str, layer_b_name: &str, report: &ConservationReport) -> Result<()> {
        use std::fmt::Write as _;

        let mut missing = String::from("layer,zone_id\n");
        for id in &report.missing_a {
            writeln!(missing, "{layer_a_name},{id}").unwrap();
        }
        for id in &report.missing_b {
            writeln!(missing, "{layer_b_name},{id}").unwrap();
        }
        crate::cache::write_atomic(dir, &format!("missing_{layer_a_name}_{layer_b_name}.csv"), missing.as_bytes())?;

        let mut sums = String::from("layer,zone_id,sum\n");
        for (id, sum) in &report.sum_mismatches_a {
            writeln!(sums, "{layer_a_name},{id},{sum}").unwrap();
        }
        for (id, sum) in &report.sum_mismatches_b {
            writeln!(sums, "{layer_b_name},{id},{sum}").unwrap();
        }
        crate::cache::write_atomic(dir, &format!("sums_{layer_a_name}_{layer_b_name}.csv"), sums.as_bytes())?;

        let mut over_one = format!(
            "{layer_a_name}_id,{layer_b_name}_id,{layer_a_name}_to_{layer_b_name},{layer_b_name}_to_{layer_a_name}\n"
        );
        for row in &report.over_one {
            writeln!(over_one, "{},{},{},{}", row.a, row.b, row.a_to_b, row.b_to_a).unwrap();
        }
        crate::cache::write_atomic(dir, "over_one.csv", over_one.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{Zone, ZoningLayer};
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )])
    }

    #[test]
    fn flags_zones_absent_from_factor_table() {
        let mut ctx = RunContext::new("t");
        let layer_a = ZoningLayer::new(
            "a",
            vec![Zone { id: ZoneId::new("a1"), geom: square(), area: 1.0 }],
        );
        let layer_b = ZoningLayer::new("b", vec![]);
        let report = audit(&mut ctx, &layer_a, &layer_b, &[]);
        assert_eq!(report.missing_a, vec![ZoneId::new("a1")]);
    }

    #[test]
    fn flags_rows_rounding_above_one() {
        let mut ctx = RunContext::new("t");
        let layer = ZoningLayer::new("a", vec![]);
        let rows = vec![FactorRow {
            a: ZoneId::new("a1"),
            b: ZoneId::new("b1"),
            a_to_b: 1.0004,
            b_to_a: 0.5,
        }];
        let report = audit(&mut ctx, &layer, &layer, &rows);
        assert_eq!(report.over_one.len(), 1);
    }
}
