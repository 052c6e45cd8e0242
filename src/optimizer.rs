//! Load planning driver.
//!
//! Places cargo into one vehicle with a greedy big-rocks-first heuristic:
//! - quantities are expanded into single instances
//! - instances are tried largest volume first, heavier first on ties
//! - each instance takes the first candidate the validator accepts
//! - nothing is ever moved once committed (no backtracking)

use log::{debug, info};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::candidates::{CandidateSource, ExtremePoints, GridScan};
use crate::constraints::{ConstraintValidator, Rejection};
use crate::metrics::{self, OptimizationResult};
use crate::model::{
    CargoItem, PlacedItem, Placement, Rotation, UnplacedItem, UnplacedReason, ValidationError,
    VehicleProfile, expand_instances,
};
use crate::types::{Dimensional, EPSILON_GENERAL, EPSILON_HEIGHT, Vec3};

/// How candidate positions are generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Anchors on the faces of placed items. Fast and the default.
    #[default]
    ExtremePoint,
    /// Fixed-step scan of the floor and every stackable top face.
    GridSearch,
}

impl StrategyKind {
    /// Parses a strategy name, accepting a few common spellings.
    ///
    /// # Examples
    /// ```
    /// use load_planner::optimizer::StrategyKind;
    ///
    /// assert_eq!(StrategyKind::parse("grid"), Some(StrategyKind::GridSearch));
    /// assert_eq!(StrategyKind::parse("Extreme-Point"), Some(StrategyKind::ExtremePoint));
    /// assert_eq!(StrategyKind::parse("random"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "extreme_point" | "extreme_points" | "ep" => Some(StrategyKind::ExtremePoint),
            "grid_search" | "grid" => Some(StrategyKind::GridSearch),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::ExtremePoint => "extreme_point",
            StrategyKind::GridSearch => "grid_search",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tolerances and switches for one optimization run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Minimum supported share of the footprint for stacked items (0.0 to 1.0)
    pub support_ratio: f64,
    /// Tolerance for matching a bottom face to a top face
    pub height_epsilon: f64,
    /// General numerical tolerance
    pub general_epsilon: f64,
    /// Scan step for [`StrategyKind::GridSearch`]
    pub grid_step: f64,
    pub strategy: StrategyKind,
    /// Honor `max_stack_weight` on the candidate and the items beneath it
    pub enforce_stack_weight: bool,
    /// Upper bound on the expanded instance count of one run
    pub max_instances: usize,
}

impl PackingConfig {
    pub const DEFAULT_SUPPORT_RATIO: f64 = 0.8;
    pub const DEFAULT_HEIGHT_EPSILON: f64 = EPSILON_HEIGHT;
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_GRID_STEP: f64 = 12.0;
    pub const DEFAULT_ENFORCE_STACK_WEIGHT: bool = true;
    pub const DEFAULT_MAX_INSTANCES: usize = 5_000;

    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    /// Rejects ratios outside `0..=1`, non-positive tolerances or steps and a
    /// zero instance limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: String| Err(ValidationError::InvalidConfiguration(msg));

        if !self.support_ratio.is_finite() || !(0.0..=1.0).contains(&self.support_ratio) {
            return invalid(format!(
                "support_ratio must be between 0 and 1, got: {}",
                self.support_ratio
            ));
        }
        for (name, value) in [
            ("height_epsilon", self.height_epsilon),
            ("general_epsilon", self.general_epsilon),
            ("grid_step", self.grid_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{} must be positive, got: {}", name, value));
            }
        }
        if self.max_instances == 0 {
            return invalid("max_instances must be at least 1".to_string());
        }
        Ok(())
    }

    /// Rejects cargo lists that would expand past `max_instances`.
    ///
    /// Runs before expansion, so an absurd `quantity` costs nothing.
    pub fn check_instance_count(&self, items: &[CargoItem]) -> Result<(), ValidationError> {
        let requested: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();
        if requested > self.max_instances as u64 {
            return Err(ValidationError::TooManyInstances {
                requested,
                limit: self.max_instances,
            });
        }
        Ok(())
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            support_ratio: Self::DEFAULT_SUPPORT_RATIO,
            height_epsilon: Self::DEFAULT_HEIGHT_EPSILON,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            grid_step: Self::DEFAULT_GRID_STEP,
            strategy: StrategyKind::default(),
            enforce_stack_weight: Self::DEFAULT_ENFORCE_STACK_WEIGHT,
            max_instances: Self::DEFAULT_MAX_INSTANCES,
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn support_ratio(mut self, ratio: f64) -> Self {
        self.config.support_ratio = ratio;
        self
    }

    pub fn height_epsilon(mut self, epsilon: f64) -> Self {
        self.config.height_epsilon = epsilon;
        self
    }

    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn grid_step(mut self, step: f64) -> Self {
        self.config.grid_step = step;
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn enforce_stack_weight(mut self, enforce: bool) -> Self {
        self.config.enforce_stack_weight = enforce;
        self
    }

    pub fn max_instances(mut self, limit: usize) -> Self {
        self.config.max_instances = limit;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Progress of a run, emitted in order for live visualisation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum LoadEvent {
    /// Input validated and expanded.
    Started {
        instances: usize,
        vehicle: Vec3,
        strategy: StrategyKind,
    },
    /// An instance was committed.
    ItemPlaced {
        instance_id: String,
        item_id: String,
        position: Vec3,
        dims: Vec3,
        rotation: Rotation,
        weight: f64,
        total_weight: f64,
    },
    /// An instance could not be placed.
    ItemRejected {
        item_id: String,
        reason_code: String,
        reason_text: String,
    },
    /// Run complete.
    Finished {
        placed: usize,
        unplaced: usize,
        utilization: f64,
    },
}

/// Plans a load with default settings.
///
/// # Parameters
/// * `items` - Cargo lines; quantities are expanded
/// * `vehicle` - Target vehicle
///
/// # Returns
/// The plan, or a `ValidationError` if any input is invalid. Items that do not
/// fit are reported in `unplaced`, never as an error.
///
/// # Examples
/// ```
/// use load_planner::model::{CargoItem, VehicleProfile};
/// use load_planner::optimizer::optimize_load;
///
/// let vehicle = VehicleProfile::new((10.0, 2.0, 2.5)).unwrap();
/// let items = vec![CargoItem::new("crate", (10.0, 2.0, 2.5), 100.0).unwrap()];
/// let plan = optimize_load(&items, &vehicle).unwrap();
/// assert_eq!(plan.placed.len(), 1);
/// assert!((plan.utilization - 100.0).abs() < 1e-9);
/// ```
pub fn optimize_load(
    items: &[CargoItem],
    vehicle: &VehicleProfile,
) -> Result<OptimizationResult, ValidationError> {
    optimize_load_with_config(items, vehicle, &PackingConfig::default())
}

/// Like [`optimize_load`] with explicit settings.
pub fn optimize_load_with_config(
    items: &[CargoItem],
    vehicle: &VehicleProfile,
    config: &PackingConfig,
) -> Result<OptimizationResult, ValidationError> {
    optimize_load_with_progress(items, vehicle, config, |_| {})
}

/// Like [`optimize_load_with_config`], reporting each step to `on_event`.
///
/// No event is emitted when validation fails.
pub fn optimize_load_with_progress(
    items: &[CargoItem],
    vehicle: &VehicleProfile,
    config: &PackingConfig,
    mut on_event: impl FnMut(&LoadEvent),
) -> Result<OptimizationResult, ValidationError> {
    config.validate()?;
    vehicle.validate()?;
    for item in items {
        item.validate()?;
    }
    config.check_instance_count(items)?;

    let mut instances = expand_instances(items);
    sort_big_rocks_first(&mut instances);

    on_event(&LoadEvent::Started {
        instances: instances.len(),
        vehicle: vehicle.interior(),
        strategy: config.strategy,
    });

    let grid = GridScan {
        step: config.grid_step,
        epsilon: config.general_epsilon,
    };
    let source: &dyn CandidateSource = match config.strategy {
        StrategyKind::ExtremePoint => &ExtremePoints,
        StrategyKind::GridSearch => &grid,
    };
    let validator = ConstraintValidator::new(vehicle, config);

    let mut placed: Vec<PlacedItem> = Vec::with_capacity(instances.len());
    let mut unplaced: Vec<UnplacedItem> = Vec::new();
    let mut loaded_weight = 0.0;

    for item in instances {
        let found = if item.fits_envelope(vehicle, config.general_epsilon) {
            find_placement(&item, &placed, vehicle, &validator, source).map_err(|last| {
                if let Some(rejection) = last {
                    debug!(
                        "last candidate for {} refused ({}): {}",
                        item.id,
                        rejection.code(),
                        rejection
                    );
                }
                UnplacedReason::NoValidPlacement
            })
        } else {
            Err(UnplacedReason::ExceedsVehicle)
        };

        match found {
            Ok(placement) => {
                let instance_id = format!("{}-{}", item.id, placed.len());
                let placed_item = PlacedItem::new(instance_id, item, placement);
                loaded_weight += placed_item.item.weight;
                debug!(
                    "placed {} at ({:.3}, {:.3}, {:.3}) rotated {}°",
                    placed_item.instance_id,
                    placement.x,
                    placement.y,
                    placement.z,
                    placement.rotation.degrees()
                );
                on_event(&LoadEvent::ItemPlaced {
                    instance_id: placed_item.instance_id.clone(),
                    item_id: placed_item.item.id.clone(),
                    position: placement.position(),
                    dims: placed_item.dims,
                    rotation: placement.rotation,
                    weight: placed_item.item.weight,
                    total_weight: loaded_weight,
                });
                placed.push(placed_item);
            }
            Err(reason) => {
                debug!("could not place {}: {}", item.id, reason.code());
                on_event(&LoadEvent::ItemRejected {
                    item_id: item.id.clone(),
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                unplaced.push(UnplacedItem { item, reason });
            }
        }
    }

    let result = metrics::summarize(placed, unplaced, vehicle, config.strategy);
    info!(
        "{} run finished: {} placed, {} unplaced, {:.1}% volume used",
        config.strategy,
        result.placed.len(),
        result.unplaced.len(),
        result.utilization
    );
    on_event(&LoadEvent::Finished {
        placed: result.placed.len(),
        unplaced: result.unplaced.len(),
        utilization: result.utilization,
    });
    Ok(result)
}

/// Stable sort by volume, then weight, both descending.
fn sort_big_rocks_first(instances: &mut [CargoItem]) {
    instances.sort_by(|a, b| {
        b.volume()
            .total_cmp(&a.volume())
            .then_with(|| b.weight.total_cmp(&a.weight))
    });
}

/// First candidate the validator accepts, in candidate order.
///
/// Fails with the rejection of the last candidate tried, or `None` when there
/// was no candidate at all.
fn find_placement(
    item: &CargoItem,
    placed: &[PlacedItem],
    vehicle: &VehicleProfile,
    validator: &ConstraintValidator<'_>,
    source: &dyn CandidateSource,
) -> Result<Placement, Option<Rejection>> {
    let mut last_rejection = None;
    for candidate in source.candidates(item, placed, vehicle) {
        match validator.validate(item, &candidate, placed) {
            Ok(()) => return Ok(candidate),
            Err(rejection) => last_rejection = Some(rejection),
        }
    }
    Err(last_rejection)
}
