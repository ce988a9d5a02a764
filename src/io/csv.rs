//! Factor table output: the four-column tabular file described in
//! spec.md §6, via the same `polars` CSV stack used to read the lower
//! zoning weight table.

use std::path::Path;

use polars::prelude::*;

use crate::cache;
use crate::error::Result;
use crate::factor::FactorRow;

/// Writes the factor table for an `{a}_to_{b}` translation: columns
/// `{a}_id`, `{b}_id`, `{a}_to_{b}`, `{b}_to_{a}`.
///
/// The CSV is rendered into memory first and written out via
/// [`cache::write_atomic`] (temp file in `path`'s directory, then rename),
/// per spec.md §5's atomic-write requirement for output artifacts.
pub fn write_factor_table(path: &Path, layer_a_name: &str, layer_b_name: &str, rows: &[FactorRow]) -> Result<()> {
    let a_id: Vec<String> = rows.iter().map(|r| r.a.to_string()).collect();
    let b_id: Vec<String> = rows.iter().map(|r| r.b.to_string()).collect();
    let a_to_b: Vec<f64> = rows.iter().map(|r| r.a_to_b).collect();
    let b_to_a: Vec<f64> = rows.iter().map(|r| r.b_to_a).collect();

    let mut df = DataFrame::new(vec![
        Column::new(format!("{layer_a_name}_id").into(), a_id),
        Column::new(format!("{layer_b_name}_id").into(), b_id),
        Column::new(format!("{layer_a_name}_to_{layer_b_name}").into(), a_to_b),
        Column::new(format!("{layer_b_name}_to_{layer_a_name}").into(), b_to_a),
    ])?;

    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).finish(&mut df)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let filename = path.file_name().expect("factor table path must name a file");
    cache::write_atomic(dir, &filename.to_string_lossy(), &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneId;

    #[test]
    fn writes_one_row_per_factor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![FactorRow {
            a: ZoneId::new("a1"),
            b: ZoneId::new("b1"),
            a_to_b: 1.0,
            b_to_a: 1.0,
        }];
        write_factor_table(&path, "zone_a", "zone_b", &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("zone_a_id"));
        assert!(text.contains("zone_a_to_zone_b"));
        assert_eq!(text.lines().count(), 2);
    }
}
