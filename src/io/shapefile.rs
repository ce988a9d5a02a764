//! Shapefile loading: polygon layers, point layers, and the `.prj` sidecar
//! that (optionally) declares a layer's CRS.
//!
//! The ring-grouping algorithm in [`polygon_from_shp`] mirrors the
//! shapefile/`geo` conversion used elsewhere in this codebase's lineage:
//! rings are classified exterior/hole by signed area (shapefile stores
//! exteriors clockwise, holes counterclockwise) and grouped in file order,
//! each exterior starting a new `geo::Polygon` that accumulates the holes
//! that follow it.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use shapefile::dbase::FieldValue;
use shapefile::{Reader, Shape};

use crate::error::{Error, Result};

fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
}

fn signed_area(pts: &[Coord<f64>]) -> f64 {
    pts.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

/// Convert a `shapefile::Polygon` into a `geo::MultiPolygon`, grouping each
/// exterior ring with the hole rings that follow it until the next
/// exterior.
pub(crate) fn polygon_from_shp(p: &shapefile::Polygon) -> MultiPolygon<f64> {
    let mut rings: Vec<(LineString<f64>, bool)> = Vec::with_capacity(p.rings().len());
    for ring in p.rings() {
        let mut coords: Vec<Coord<f64>> =
            ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        ensure_closed(&mut coords);
        let is_exterior = signed_area(&coords) < 0.0;
        rings.push((LineString(coords), is_exterior));
    }

    let mut polys = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();
    for (ls, is_exterior) in rings {
        if is_exterior {
            if let Some(ext) = exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(ls);
        } else {
            holes.push(ls);
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }
    MultiPolygon(polys)
}

fn field_to_id(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Character(None) => None,
        FieldValue::Numeric(Some(n)) => Some(format!("{n}")),
        FieldValue::Numeric(None) => None,
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Float(Some(n)) => Some(format!("{n}")),
        FieldValue::Float(None) => None,
        FieldValue::Logical(Some(b)) => Some(b.to_string()),
        other => Some(format!("{other:?}")),
    }
}

/// One polygon feature read from a shapefile, with its raw id attribute.
pub(crate) struct RawPolygonFeature {
    pub id: Option<String>,
    pub geom: MultiPolygon<f64>,
}

/// Reads every polygon feature out of `path`, pulling `id_col` out of the
/// attached dBase record. `id` is `None` when the column's value is null or
/// the geometry is degenerate (both are handled by the caller).
pub(crate) fn read_polygons(path: &Path, id_col: &str) -> Result<Vec<RawPolygonFeature>> {
    let mut reader =
        Reader::from_path(path).map_err(|e| Error::Shapefile(format!("{}: {e}", path.display())))?;

    let mut saw_id_col = false;
    let mut features = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| Error::Shapefile(e.to_string()))?;
        if record.get(id_col).is_some() {
            saw_id_col = true;
        }
        let id = record.get(id_col).and_then(field_to_id);
        let Shape::Polygon(p) = shape else {
            // M/Z variants and other geometry types are not zoning polygons;
            // skip rather than guess at an unsupported ring format.
            continue;
        };
        let mp = polygon_from_shp(&p);
        if mp.0.is_empty() {
            continue;
        }
        features.push(RawPolygonFeature { id, geom: mp });
    }

    if !saw_id_col {
        return Err(Error::MissingColumn {
            layer: path.display().to_string(),
            column: id_col.to_string(),
        });
    }

    Ok(features)
}

/// Reads every point feature out of `path`, pulling `id_col` out of the
/// attached dBase record.
pub(crate) fn read_points(path: &Path, id_col: &str) -> Result<Vec<(Option<String>, Point<f64>)>> {
    let mut reader =
        Reader::from_path(path).map_err(|e| Error::Shapefile(format!("{}: {e}", path.display())))?;

    let mut out = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| Error::Shapefile(e.to_string()))?;
        let id = record.get(id_col).and_then(field_to_id);
        let point = match shape {
            Shape::Point(pt) => Point::new(pt.x, pt.y),
            Shape::PointM(pt) => Point::new(pt.x, pt.y),
            Shape::PointZ(pt) => Point::new(pt.x, pt.y),
            _ => continue,
        };
        out.push((id, point));
    }
    Ok(out)
}

/// Reads the WKT text from a shapefile's `.prj` sidecar, if present.
pub(crate) fn read_prj(shp_path: &Path) -> Option<String> {
    let prj_path = shp_path.with_extension("prj");
    fs::read_to_string(prj_path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
