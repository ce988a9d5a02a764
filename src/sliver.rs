//! `SliverFilter`: drops tile contributions both of whose directional
//! factors are sliver-sized (spec.md §4.6).

use crate::factor::FactorRow;

pub const DEFAULT_SLIVER_TOLERANCE: f64 = 0.98;

/// Drops any row where *both* `a_to_b` and `b_to_a` fall below `1 - tolerance`.
/// A row survives if either direction is meaningful — this is a joint test,
/// not a per-direction filter, so small-but-intentional correspondences are
/// preserved (spec.md §4.6). `NaN` sentinels for zero-weight zones never
/// compare less than the threshold, so they are never treated as slivers.
pub fn filter(rows: Vec<FactorRow>, tolerance: f64) -> Vec<FactorRow> {
    let threshold = 1.0 - tolerance;
    rows.into_iter()
        .filter(|r| !(r.a_to_b < threshold && r.b_to_a < threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneId;

    fn row(a_to_b: f64, b_to_a: f64) -> FactorRow {
        FactorRow {
            a: ZoneId::new("a"),
            b: ZoneId::new("b"),
            a_to_b,
            b_to_a,
        }
    }

    #[test]
    fn drops_only_when_both_directions_are_slivers() {
        let rows = vec![row(0.01, 0.01), row(0.01, 0.9), row(0.9, 0.9)];
        let kept = filter(rows, DEFAULT_SLIVER_TOLERANCE);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn nan_sentinel_is_never_filtered_as_a_sliver() {
        let rows = vec![row(f64::NAN, f64::NAN)];
        let kept = filter(rows, DEFAULT_SLIVER_TOLERANCE);
        assert_eq!(kept.len(), 1);
    }
}
