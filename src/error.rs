//! Structured error kinds for the translation pipeline.
//!
//! Severity follows spec.md §7: the `Fatal` variants below abort the
//! pipeline before any output is written; everything else the pipeline
//! handles as a [`crate::context::Warning`] instead of an `Err`.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("column `{column}` not found in layer `{layer}`")]
    MissingColumn { layer: String, column: String },

    #[error("zone id column `{column}` in layer `{layer}` contains an empty id")]
    EmptyZoneId { layer: String, column: String },

    #[error(
        "layer `{layer}` reports CRS `{found}`, which does not match the declared working CRS `{expected}`"
    )]
    CrsMismatch {
        layer: String,
        expected: String,
        found: String,
    },

    #[error("unrecognized weighting method `{0}` for a weighted translation")]
    UnknownMethod(String),

    #[error(
        "point zone `{zone_id}` in layer `{layer}` lies within {count} lower zones; point_tolerance substitution requires exactly one"
    )]
    AmbiguousPointContainment {
        layer: String,
        zone_id: String,
        count: usize,
    },

    #[error(
        "{count} negative `{factor_col}` factors after rounding correction; upstream geometry is likely corrupt"
    )]
    NegativeFactor { factor_col: String, count: usize },

    #[error("sliver_tolerance must be in (0, 1], got {0}")]
    InvalidTolerance(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("shapefile error: {0}")]
    Shapefile(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}
