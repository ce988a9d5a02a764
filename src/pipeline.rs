//! Top-level orchestration: wires `GeomSource` through `ConservationAuditor`
//! in the control-flow order described in spec.md §2.

use geo::Point;

use crate::audit::{self, ConservationReport};
use crate::config::Config;
use crate::context::RunContext;
use crate::error::Result;
use crate::factor::{self, FactorRow};
use crate::geomsource;
use crate::io::shapefile as shp_io;
use crate::overlay;
use crate::point;
use crate::rounding::{self, ResidualStats};
use crate::sliver;
use crate::weight;
use crate::zone::ZoneId;

/// Everything a caller needs from a completed run: the factor table, the
/// conservation report, and the pre-rounding residual statistics in each
/// direction (`None` when rounding was skipped or no source zone had more
/// than one row).
pub struct Outcome {
    pub rows: Vec<FactorRow>,
    pub report: ConservationReport,
    pub residuals_a: Option<ResidualStats>,
    pub residuals_b: Option<ResidualStats>,
}

fn named_points(path: &std::path::Path, id_col: &str) -> Result<Vec<(ZoneId, Point<f64>)>> {
    Ok(shp_io::read_points(path, id_col)?
        .into_iter()
        .filter_map(|(id, pt)| id.map(|id| (ZoneId::new(id), pt)))
        .collect())
}

/// Runs a full translation (spatial or weighted, selected by
/// `config.is_weighted()`) and returns its outcome. Fatal errors abort
/// before any output is written, per spec.md §7's propagation policy;
/// callers are responsible for only calling the `io` writers on `Ok`.
pub fn run(ctx: &mut RunContext, config: &Config) -> Result<Outcome> {
    let mut layer_a = geomsource::load_zoning_layer(ctx, &config.zone_1, &config.working_crs)?;
    let mut layer_b = geomsource::load_zoning_layer(ctx, &config.zone_2, &config.working_crs)?;

    let lower = match &config.lower_zoning {
        Some(spec) => Some(geomsource::load_weighted_lower(ctx, spec, &config.working_crs)?),
        None => None,
    };

    // Point-handling coordination: both point-to-point matching and
    // point-zone substitution must finish before overlay begins, or the
    // point-injected geometry would be absent from half the intersection
    // (spec.md §5 "Point-handling coordination").
    let mut point_matches = Vec::new();
    if config.point_handling {
        if let (Some(pa), Some(pb)) = (&config.zone_1.point_shapefile, &config.zone_2.point_shapefile) {
            let points_a = named_points(pa, &config.zone_1.id_col)?;
            let points_b = named_points(pb, &config.zone_2.id_col)?;
            point_matches = point::match_points(&points_a, &points_b, point::DEFAULT_POINT_MATCH_DISTANCE);

            let matched_a: Vec<ZoneId> = point_matches.iter().map(|m| m.a.clone()).collect();
            let matched_b: Vec<ZoneId> = point_matches.iter().map(|m| m.b.clone()).collect();
            layer_a = layer_a.without(&matched_a);
            layer_b = layer_b.without(&matched_b);
        }

        // Substitution itself is not conditional on an auxiliary point
        // shapefile: a layer with no point layer at all can still contain
        // sub-threshold "pseudo-point" polygons that need replacing, so
        // this always runs once a lower zoning is available to replace
        // into; a missing point shapefile just means no true points get
        // promoted into the layer first.
        if let Some(lower) = &lower {
            let raw_points_a = match &config.zone_1.point_shapefile {
                Some(pa) => shp_io::read_points(pa, &config.zone_1.id_col)?,
                None => Vec::new(),
            };
            layer_a = point::substitute_points(ctx, &layer_a, &raw_points_a, lower, config.point_tolerance)?;

            let raw_points_b = match &config.zone_2.point_shapefile {
                Some(pb) => shp_io::read_points(pb, &config.zone_2.id_col)?,
                None => Vec::new(),
            };
            layer_b = point::substitute_points(ctx, &layer_b, &raw_points_b, lower, config.point_tolerance)?;
        }
    }

    let tiles = match (&lower, config.is_weighted()) {
        (Some(lower), true) => {
            let mut tiles = overlay::overlay_weighted(&layer_a, &layer_b, lower);
            weight::distribute(&mut tiles, lower);
            tiles
        }
        _ => overlay::overlay_spatial(&layer_a, &layer_b),
    };

    let mut rows = factor::build(ctx, &layer_a.name, &layer_b.name, &tiles);
    for matched in &point_matches {
        rows.push(FactorRow {
            a: matched.a.clone(),
            b: matched.b.clone(),
            a_to_b: 1.0,
            b_to_a: 1.0,
        });
    }

    if config.filter_slivers {
        rows = sliver::filter(rows, config.sliver_tolerance);
    }

    let (residuals_a, residuals_b) = if config.rounding {
        rounding::correct(ctx, &mut rows)?
    } else {
        (None, None)
    };

    let report = audit::audit(ctx, &layer_a, &layer_b, &rows);

    Ok(Outcome { rows, report, residuals_a, residuals_b })
}
