//! Core data model: stable zone identifiers, zones, zoning layers, and the
//! lower-zoning-plus-weight join described in spec.md §3.

use std::fmt;
use std::sync::Arc;

use geo::MultiPolygon;

/// A stable, hashable zone identifier, unique within its layer.
///
/// Kept as an `Arc<str>` rather than a `String` so that the many tiles a
/// single zone participates in during overlay can share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(Arc<str>);

impl ZoneId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZoneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single zone in a zoning layer: a stable id, its polygonal geometry,
/// and the area derived from that geometry at load time.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub geom: MultiPolygon<f64>,
    pub area: f64,
}

/// A disjoint cover of some region by [`Zone`]s, tagged with the
/// layer-qualified name used to build output column names
/// (`{name}_id`, `{name}_area`, `{name}_to_{other}`).
#[derive(Debug, Clone)]
pub struct ZoningLayer {
    pub name: String,
    pub zones: Vec<Zone>,
}

impl ZoningLayer {
    pub fn new(name: impl Into<String>, zones: Vec<Zone>) -> Self {
        Self {
            name: name.into(),
            zones,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.iter().map(|z| &z.id)
    }

    pub fn find(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn without(&self, excluded: &[ZoneId]) -> ZoningLayer {
        ZoningLayer::new(
            self.name.clone(),
            self.zones
                .iter()
                .filter(|z| !excluded.contains(&z.id))
                .cloned()
                .collect(),
        )
    }
}

/// A lower zone joined to its exogenous weight (spec.md §3,
/// `WeightedLower`).
#[derive(Debug, Clone)]
pub struct WeightedLowerZone {
    pub id: ZoneId,
    pub geom: MultiPolygon<f64>,
    pub area: f64,
    pub weight: f64,
}

/// A lower zoning layer with per-zone weights joined in, plus the count of
/// lower zones whose weight row was missing (spec.md §3: "missing joins are
/// allowed but counted and warned").
#[derive(Debug, Clone)]
pub struct WeightedLower {
    pub name: String,
    pub zones: Vec<WeightedLowerZone>,
    pub missing_weight_count: usize,
}
