//! Zone translation engine: computes sparse bipartite directional weight
//! factors between two polygonal zoning systems, either by pure area
//! (spatial translation) or by an exogenous weight distributed across a
//! finer lower zoning (weighted translation).
//!
//! The pipeline is `GeomSource -> (optional PointSubstitution) -> Overlay ->
//! (weighted path: WeightDistributor) -> FactorBuilder -> SliverFilter ->
//! RoundingCorrector -> ConservationAuditor`; see [`pipeline::run`] for the
//! orchestration and each module below for its component.

pub mod audit;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod factor;
pub mod geomsource;
pub mod io;
pub mod overlay;
pub mod pipeline;
pub mod point;
pub mod rounding;
pub mod sliver;
pub mod weight;
pub mod zone;

pub use config::Config;
pub use context::RunContext;
pub use error::{Error, Result};
pub use factor::FactorRow;
pub use pipeline::Outcome;
pub use zone::ZoneId;
