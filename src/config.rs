//! Run configuration: the structured document described in spec.md §6.
//!
//! The original tool's config layer (`caf.toolkit.BaseConfig`, loaded from
//! YAML) is out of scope per spec.md §1 ("a *config layer*"); this module
//! is the minimal stand-in every other component needs to exist at all.
//! Serialized as JSON via `serde_json`, the teacher's own dependency, rather
//! than introducing a YAML crate no repo in this lineage carries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_sliver_tolerance() -> f64 {
    0.98
}

fn default_true() -> bool {
    true
}

fn default_point_tolerance() -> f64 {
    2.0
}

/// Path, name and id column for one of the two primary zoning layers, plus
/// an optional auxiliary point layer for point-zone substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneLayerConfig {
    pub name: String,
    pub shapefile: PathBuf,
    pub id_col: String,
    #[serde(default)]
    pub point_shapefile: Option<PathBuf>,
}

/// Path, name, id column, and weight join information for the lower
/// zoning used by weighted translations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowerZoningConfig {
    pub name: String,
    pub shapefile: PathBuf,
    pub id_col: String,
    pub weight_path: PathBuf,
    pub weight_col: String,
    pub weight_id_col: String,
    pub weight_year: i32,
}

/// The full run configuration (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub zone_1: ZoneLayerConfig,
    pub zone_2: ZoneLayerConfig,
    #[serde(default)]
    pub lower_zoning: Option<LowerZoningConfig>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default = "default_sliver_tolerance")]
    pub sliver_tolerance: f64,
    #[serde(default = "default_true")]
    pub rounding: bool,
    #[serde(default = "default_true")]
    pub filter_slivers: bool,
    #[serde(default)]
    pub point_handling: bool,
    #[serde(default = "default_point_tolerance")]
    pub point_tolerance: f64,
    pub cache_path: PathBuf,
    /// Working CRS every input layer is expected to share (spec.md §1:
    /// "CRS unification is a precondition"). A layer with no declared CRS
    /// is assumed to be this one; a layer with a different declared CRS is
    /// rejected (see the CRS Open Question in SPEC_FULL.md §9).
    pub working_crs: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::InvalidInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sliver_tolerance <= 0.0 || self.sliver_tolerance > 1.0 {
            return Err(Error::InvalidTolerance(self.sliver_tolerance));
        }
        for layer in [&self.zone_1, &self.zone_2] {
            if !layer.shapefile.is_file() {
                return Err(Error::InvalidInput {
                    path: layer.shapefile.clone(),
                    reason: "shapefile does not exist".to_string(),
                });
            }
        }
        if let Some(method) = &self.method {
            if method.trim().is_empty() {
                return Err(Error::UnknownMethod(method.clone()));
            }
            let lower = self.lower_zoning.as_ref().ok_or_else(|| Error::InvalidInput {
                path: PathBuf::new(),
                reason: format!("method `{method}` selects a weighted translation but lower_zoning is absent"),
            })?;
            if !lower.shapefile.is_file() {
                return Err(Error::InvalidInput {
                    path: lower.shapefile.clone(),
                    reason: "lower zoning shapefile does not exist".to_string(),
                });
            }
            if !lower.weight_path.is_file() {
                return Err(Error::InvalidInput {
                    path: lower.weight_path.clone(),
                    reason: "lower zoning weight data does not exist".to_string(),
                });
            }
        }
        if self.point_handling && self.lower_zoning.is_none() {
            return Err(Error::InvalidInput {
                path: PathBuf::new(),
                reason: "point_handling requires lower_zoning, even for a spatial run, since point \
                         substitution replaces a point zone with its containing lower zone"
                    .to_string(),
            });
        }
        Ok(())
    }

    pub fn is_weighted(&self) -> bool {
        self.method.as_ref().is_some_and(|m| !m.trim().is_empty())
    }

    /// The output file basename: `{sorted_name_1}_to_{sorted_name_2}_{spatial|method_year}`.
    /// Serializes this configuration alongside the factor table it produced,
    /// under the same basename (spec.md §6: "The configuration document
    /// used to produce the file is serialized alongside with the same
    /// basename").
    pub fn write_alongside(&self, dir: &Path) -> Result<()> {
        let filename = format!("{}.json", self.output_stem());
        let text = serde_json::to_string_pretty(self)?;
        crate::cache::write_atomic(dir, &filename, text.as_bytes())
    }

    pub fn output_stem(&self) -> String {
        let (name_1, name_2) = if self.zone_1.name <= self.zone_2.name {
            (&self.zone_1.name, &self.zone_2.name)
        } else {
            (&self.zone_2.name, &self.zone_1.name)
        };
        let suffix = match (&self.method, &self.lower_zoning) {
            (Some(method), Some(lower)) => format!("{method}_{}", lower.weight_year),
            _ => "spatial".to_string(),
        };
        format!("{name_1}_to_{name_2}_{suffix}")
    }
}
