//! Cargo load planning for trucks, trailers and intermodal containers.
//!
//! Given a vehicle interior and a list of cargo lines, [`optimize_load`] packs
//! the cargo with a deterministic extreme-point heuristic and reports volume
//! use, center of gravity, load length and advisory axle loads.
//!
//! Coordinates are vehicle-local: `x` runs from the headboard to the rear
//! doors, `y` is vertical and `z` lateral.

pub mod advisories;
pub mod api;
pub mod candidates;
pub mod config;
pub mod constraints;
pub mod geometry;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod presets;
pub mod types;

pub use metrics::OptimizationResult;
pub use model::{CargoItem, ValidationError, VehicleProfile};
pub use optimizer::{
    LoadEvent, PackingConfig, StrategyKind, optimize_load, optimize_load_with_config,
    optimize_load_with_progress,
};
