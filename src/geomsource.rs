//! `GeomSource`: reads a zoning layer into the canonical (id, geometry,
//! area) form described in spec.md §4.1.

use std::collections::HashMap;
use std::path::Path;

use geo::Area;

use crate::config::{LowerZoningConfig, ZoneLayerConfig};
use crate::context::{RunContext, Warning};
use crate::error::{Error, Result};
use crate::io::shapefile as shp_io;
use crate::zone::{Zone, ZoningLayer, WeightedLower, WeightedLowerZone, ZoneId};

/// Checks a layer's `.prj` sidecar against the run's declared working CRS.
/// No CRS present is a warning (assume the working CRS); a different,
/// explicit CRS is a fatal mismatch (spec.md §9 Open Question, resolved in
/// favor of failing rather than silently reprojecting).
fn check_crs(ctx: &mut RunContext, layer_name: &str, shapefile: &Path, working_crs: &str) -> Result<()> {
    match shp_io::read_prj(shapefile) {
        None => {
            ctx.warn(Warning::CrsAssumed {
                layer: layer_name.to_string(),
                assumed_crs: working_crs.to_string(),
            });
            Ok(())
        }
        Some(found) if found == working_crs => Ok(()),
        Some(found) => Err(Error::CrsMismatch {
            layer: layer_name.to_string(),
            expected: working_crs.to_string(),
            found,
        }),
    }
}

/// Loads a primary zoning layer: checks CRS, reads every polygon feature,
/// drops empty/degenerate geometries and empty ids, and fails fast if the
/// declared id column never appeared.
pub fn load_zoning_layer(
    ctx: &mut RunContext,
    spec: &ZoneLayerConfig,
    working_crs: &str,
) -> Result<ZoningLayer> {
    check_crs(ctx, &spec.name, &spec.shapefile, working_crs)?;

    let features = shp_io::read_polygons(&spec.shapefile, &spec.id_col)?;
    let mut zones = Vec::with_capacity(features.len());
    let mut dropped = 0usize;
    for feature in features {
        let area = feature.geom.unsigned_area();
        if area <= 0.0 {
            dropped += 1;
            continue;
        }
        let id = feature.id.ok_or_else(|| Error::EmptyZoneId {
            layer: spec.name.clone(),
            column: spec.id_col.clone(),
        })?;
        if id.trim().is_empty() {
            return Err(Error::EmptyZoneId {
                layer: spec.name.clone(),
                column: spec.id_col.clone(),
            });
        }
        zones.push(Zone {
            id: ZoneId::new(id),
            geom: feature.geom,
            area,
        });
    }
    ctx.info(format!(
        "loaded {} zones for layer `{}` ({dropped} dropped for null area)",
        zones.len(),
        spec.name
    ));

    Ok(ZoningLayer::new(spec.name.clone(), zones))
}

/// Loads the lower zoning layer and joins in its weight table, producing a
/// [`WeightedLower`] (spec.md §3 "Lower weighting record"). Missing joins
/// are counted, not fatal.
pub fn load_weighted_lower(
    ctx: &mut RunContext,
    spec: &LowerZoningConfig,
    working_crs: &str,
) -> Result<WeightedLower> {
    check_crs(ctx, &spec.name, &spec.shapefile, working_crs)?;

    let features = shp_io::read_polygons(&spec.shapefile, &spec.id_col)?;
    let weights = read_weight_table(&spec.weight_path, &spec.weight_id_col, &spec.weight_col)?;

    let mut zones = Vec::with_capacity(features.len());
    let mut missing = 0usize;
    for feature in features {
        let area = feature.geom.unsigned_area();
        if area <= 0.0 {
            continue;
        }
        let id = feature.id.ok_or_else(|| Error::EmptyZoneId {
            layer: spec.name.clone(),
            column: spec.id_col.clone(),
        })?;
        let weight = match weights.get(id.trim()) {
            Some(w) => *w,
            None => {
                missing += 1;
                0.0
            }
        };
        zones.push(WeightedLowerZone {
            id: ZoneId::new(id),
            geom: feature.geom,
            area,
            weight,
        });
    }

    if missing > 0 {
        ctx.warn(Warning::LowerWeightJoinMiss {
            lower_layer: spec.name.clone(),
            missing,
        });
    }

    Ok(WeightedLower {
        name: spec.name.clone(),
        zones,
        missing_weight_count: missing,
    })
}

/// Reads a two-or-more-column weight table keyed by `id_col`, keeping only
/// `weight_col` (spec.md §6 "lower zoning weight table").
fn read_weight_table(path: &Path, id_col: &str, weight_col: &str) -> Result<HashMap<String, f64>> {
    use polars::prelude::*;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let ids = df.column(id_col).map_err(|_| Error::MissingColumn {
        layer: path.display().to_string(),
        column: id_col.to_string(),
    })?;
    let weights = df.column(weight_col).map_err(|_| Error::MissingColumn {
        layer: path.display().to_string(),
        column: weight_col.to_string(),
    })?;

    let ids = ids.cast(&DataType::String)?;
    let weights = weights.cast(&DataType::Float64)?;

    let mut map = HashMap::with_capacity(df.height());
    for (id, weight) in ids.str()?.into_iter().zip(weights.f64()?.into_iter()) {
        if let (Some(id), Some(weight)) = (id, weight) {
            map.insert(id.trim().to_string(), weight.max(0.0));
        }
    }
    Ok(map)
}
