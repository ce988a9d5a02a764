//! Explicit logging/warning context threaded through the pipeline.
//!
//! The original tool logged through a module-level `logging.getLogger`
//! singleton shared by every function. That works for a single process
//! running one translation at a time, but two concurrent translations would
//! interleave each other's warnings in the same log stream with no way to
//! tell them apart. `RunContext` instead carries its own name (used as the
//! `log` target) and its own warning buffer, so each translation's warnings
//! stay attributable to that translation regardless of how many run
//! concurrently in the same process.

use std::fmt;

/// One warning-severity condition observed during a run, per spec.md §7.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A layer reported no CRS; the declared working CRS was assumed.
    CrsAssumed { layer: String, assumed_crs: String },
    /// The lower-zone weight join missed some number of lower zones.
    LowerWeightJoinMiss { lower_layer: String, missing: usize },
    /// A point zone was contained by more than one lower zone; the lowest
    /// id was chosen as a deterministic tie-break.
    AmbiguousPointTieBreak {
        layer: String,
        zone_id: String,
        chosen_lower: String,
    },
    /// `count` rows had a factor that rounded to something above 1.
    FactorAboveOne { factor_col: String, count: usize },
    /// A source zone's directional factors did not sum to 1 before rounding
    /// correction, by `diff = 1 - sum`.
    PreRoundingResidual {
        layer: String,
        zone_id: String,
        diff: f64,
    },
    /// A zone from a primary layer never appeared in the factor table.
    MissingZone { layer: String, zone_id: String },
    /// A zone intersected the other layer but its total distributed weight
    /// was zero, so its factor is a sentinel NaN rather than a division.
    ZeroWeightZone { layer: String, zone_id: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CrsAssumed { layer, assumed_crs } => {
                write!(f, "layer `{layer}` has no CRS, assuming `{assumed_crs}`")
            }
            Warning::LowerWeightJoinMiss { lower_layer, missing } => write!(
                f,
                "{missing} lower zones in `{lower_layer}` have no matching weight row"
            ),
            Warning::AmbiguousPointTieBreak { layer, zone_id, chosen_lower } => write!(
                f,
                "point zone `{zone_id}` in `{layer}` touches multiple lower zones, chose `{chosen_lower}`"
            ),
            Warning::FactorAboveOne { factor_col, count } => {
                write!(f, "{count} `{factor_col}` factors exceed 1 after rounding")
            }
            Warning::PreRoundingResidual { layer, zone_id, diff } => write!(
                f,
                "`{layer}` zone `{zone_id}` summed to 1 - {diff:.6} before rounding correction"
            ),
            Warning::MissingZone { layer, zone_id } => {
                write!(f, "zone `{zone_id}` from layer `{layer}` is missing from the factor table")
            }
            Warning::ZeroWeightZone { layer, zone_id } => {
                write!(f, "zone `{zone_id}` from layer `{layer}` received zero distributed weight")
            }
        }
    }
}

/// Carries a run's identity (used as the `log` target, so warnings from
/// concurrent translations can be told apart) and accumulates every
/// [`Warning`] raised along the way for later serialization to the audit
/// sink.
#[derive(Debug, Default)]
pub struct RunContext {
    name: String,
    warnings: Vec<Warning>,
}

impl RunContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            warnings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self, msg: impl fmt::Display) {
        log::info!(target: "zonexlate", "[{}] {}", self.name, msg);
    }

    pub fn warn(&mut self, warning: Warning) {
        log::warn!(target: "zonexlate", "[{}] {}", self.name, warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
