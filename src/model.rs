//! Data models for vehicle load planning.
//!
//! - `CargoItem`: a unit of cargo with dimensions, weight and stacking rules
//! - `VehicleProfile`: the usable cargo space of a vehicle and its axles
//! - `Placement` / `PlacedItem`: where an item ended up
//! - `UnplacedItem`: an item for which no valid placement exists
//!
//! Dimension vectors are always ordered along the vehicle axes:
//! (length → x, height → y, width → z).

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::geometry::BoundingBox;
use crate::types::{Dimensional, Vec3, Weighted, validation};

/// Rejected input. Raised before any packing work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid vehicle: {0}")]
    InvalidVehicle(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Too many cargo instances: {requested} requested, limit is {limit}")]
    TooManyInstances { requested: u64, limit: usize },
}

fn default_quantity() -> u32 {
    1
}

/// A cargo line to be loaded.
///
/// `quantity` is expanded into independent instances before packing; see
/// [`expand_instances`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "PAL-EUR",
    "length": 48.0,
    "width": 40.0,
    "height": 50.0,
    "weight": 900.0,
    "stackable": true,
    "max_stack_weight": 1200.0,
    "rotation_allowed": true,
    "quantity": 10
}))]
pub struct CargoItem {
    pub id: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    #[serde(default, alias = "can_stack")]
    pub stackable: bool,
    /// Maximum weight one instance may carry, counting everything resting on
    /// it directly or through other items.
    #[serde(default)]
    pub max_stack_weight: Option<f64>,
    /// Permits a 90° turn about the vertical axis (length and width swap).
    #[serde(default, alias = "rotatable")]
    pub rotation_allowed: bool,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CargoItem {
    /// Creates a single, non-stackable, non-rotatable item after validation.
    ///
    /// # Parameters
    /// * `id` - Identifier (SKU or line id)
    /// * `dims` - (length, width, height)
    /// * `weight` - Weight of one unit
    ///
    /// # Examples
    /// ```
    /// use load_planner::model::CargoItem;
    ///
    /// assert!(CargoItem::new("crate", (10.0, 20.0, 30.0), 5.0).is_ok());
    /// assert!(CargoItem::new("crate", (-10.0, 20.0, 30.0), 5.0).is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id: id.into(),
            length: dims.0,
            width: dims.1,
            height: dims.2,
            weight,
            stackable: false,
            max_stack_weight: None,
            rotation_allowed: false,
            quantity: 1,
        };
        item.validate()?;
        Ok(item)
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_stacking(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn with_rotation(mut self, rotation_allowed: bool) -> Self {
        self.rotation_allowed = rotation_allowed;
        self
    }

    pub fn with_max_stack_weight(mut self, max_stack_weight: f64) -> Self {
        self.max_stack_weight = Some(max_stack_weight);
        self
    }

    /// Checks dimensions, weight and stack limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let check_dimension = |value: f64, name: &str| {
            validation::validate_dimension(value, name).map_err(|msg| {
                ValidationError::InvalidDimension(format!("cargo item '{}': {}", self.id, msg))
            })
        };
        check_dimension(self.length, "length")?;
        check_dimension(self.width, "width")?;
        check_dimension(self.height, "height")?;

        let check_weight = |value: f64, name: &str| {
            validation::validate_weight(value, name).map_err(|msg| {
                ValidationError::InvalidWeight(format!("cargo item '{}': {}", self.id, msg))
            })
        };
        check_weight(self.weight, "weight")?;
        if let Some(limit) = self.max_stack_weight {
            check_weight(limit, "max_stack_weight")?;
        }
        Ok(())
    }

    /// Dimensions along (x, y, z) for the given rotation.
    pub fn oriented_dims(&self, rotation: Rotation) -> Vec3 {
        match rotation {
            Rotation::Original => Vec3::new(self.length, self.height, self.width),
            Rotation::Rotated90 => Vec3::new(self.width, self.height, self.length),
        }
    }

    /// Orientations the item may be placed in, unrotated first.
    pub fn allowed_rotations(&self) -> &'static [Rotation] {
        if self.rotation_allowed {
            &[Rotation::Original, Rotation::Rotated90]
        } else {
            &[Rotation::Original]
        }
    }

    /// Checks whether some allowed orientation fits an empty vehicle.
    pub fn fits_envelope(&self, vehicle: &VehicleProfile, tolerance: f64) -> bool {
        let envelope = vehicle.interior();
        self.allowed_rotations()
            .iter()
            .any(|rotation| self.oriented_dims(*rotation).fits_within(&envelope, tolerance))
    }
}

impl Dimensional for CargoItem {
    fn dimensions(&self) -> Vec3 {
        self.oriented_dims(Rotation::Original)
    }
}

impl Weighted for CargoItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Expands every line into `quantity` independent single instances.
///
/// Lines with `quantity == 0` contribute nothing. Input order is preserved.
pub fn expand_instances(items: &[CargoItem]) -> Vec<CargoItem> {
    items
        .iter()
        .flat_map(|item| {
            (0..item.quantity).map(move |_| CargoItem {
                quantity: 1,
                ..item.clone()
            })
        })
        .collect()
}

/// Turn about the vertical axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Original,
    /// Length runs across the vehicle, width along it.
    Rotated90,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Original => 0,
            Rotation::Rotated90 => 90,
        }
    }
}

/// Position of an item's lower-near-left corner plus its orientation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Placement {
    pub const fn new(x: f64, y: f64, z: f64, rotation: Rotation) -> Self {
        Self { x, y, z, rotation }
    }

    pub const fn origin(rotation: Rotation) -> Self {
        Self::new(0.0, 0.0, 0.0, rotation)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Box occupied by `item` at this placement.
    #[inline]
    pub fn bounding_box(&self, item: &CargoItem) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position(), item.oriented_dims(self.rotation))
    }
}

/// A cargo instance bound to its final placement.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacedItem {
    /// Unique within one result, e.g. `PAL-EUR-3`.
    pub instance_id: String,
    pub item: CargoItem,
    pub placement: Placement,
    /// Effective (length, height, width) after rotation.
    pub dims: Vec3,
}

impl PlacedItem {
    pub fn new(instance_id: impl Into<String>, item: CargoItem, placement: Placement) -> Self {
        let dims = item.oriented_dims(placement.rotation);
        Self {
            instance_id: instance_id.into(),
            item,
            placement,
            dims,
        }
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.placement.position(), self.dims)
    }

    /// Geometric center, rotation-aware.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.placement.position() + self.dims.center()
    }

    /// Furthest longitudinal extent.
    #[inline]
    pub fn far_x(&self) -> f64 {
        self.placement.x + self.dims.x
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

impl Weighted for PlacedItem {
    fn weight(&self) -> f64 {
        self.item.weight
    }
}

/// Load-bearing configuration of an axle or axle group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AxleKind {
    #[default]
    Single,
    Dual,
    Tridem,
}

impl AxleKind {
    /// Typical legal limit (lbs) used when an axle carries no explicit limit.
    pub fn default_limit(&self) -> f64 {
        match self {
            AxleKind::Single => 20_000.0,
            AxleKind::Dual => 34_000.0,
            AxleKind::Tridem => 42_000.0,
        }
    }
}

/// An axle (or axle group) of the vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Axle {
    /// Longitudinal position in the cargo coordinate system (may lie outside
    /// the cargo box, e.g. a drive axle under the kingpin).
    pub position: f64,
    #[serde(default)]
    pub kind: AxleKind,
    #[serde(default)]
    pub legal_limit: Option<f64>,
}

impl Axle {
    pub fn new(position: f64, kind: AxleKind) -> Self {
        Self {
            position,
            kind,
            legal_limit: None,
        }
    }

    pub fn with_limit(mut self, legal_limit: f64) -> Self {
        self.legal_limit = Some(legal_limit);
        self
    }

    /// Explicit legal limit, or the default for its kind.
    pub fn effective_limit(&self) -> f64 {
        self.legal_limit.unwrap_or_else(|| self.kind.default_limit())
    }
}

/// Usable cargo space of a vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "53' Dry Van",
    "length": 636.0,
    "width": 102.0,
    "height": 110.0,
    "axles": [
        { "position": 36.0, "kind": "dual" },
        { "position": 576.0, "kind": "dual" }
    ],
    "max_payload": 66000.0
}))]
pub struct VehicleProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub axles: Vec<Axle>,
    /// Advisory payload capacity; the engine never refuses cargo on weight.
    #[serde(default)]
    pub max_payload: Option<f64>,
}

impl VehicleProfile {
    /// Creates an axle-less vehicle after validation.
    ///
    /// # Parameters
    /// * `dims` - interior (length, width, height)
    pub fn new(dims: (f64, f64, f64)) -> Result<Self, ValidationError> {
        let vehicle = Self {
            name: None,
            length: dims.0,
            width: dims.1,
            height: dims.2,
            axles: Vec::new(),
            max_payload: None,
        };
        vehicle.validate()?;
        Ok(vehicle)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_axle(mut self, axle: Axle) -> Self {
        self.axles.push(axle);
        self
    }

    pub fn with_max_payload(mut self, max_payload: f64) -> Self {
        self.max_payload = Some(max_payload);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let vehicle_err = |msg: String| ValidationError::InvalidVehicle(msg);

        validation::validate_dimension(self.length, "vehicle length").map_err(vehicle_err)?;
        validation::validate_dimension(self.width, "vehicle width").map_err(vehicle_err)?;
        validation::validate_dimension(self.height, "vehicle height").map_err(vehicle_err)?;

        for (idx, axle) in self.axles.iter().enumerate() {
            validation::validate_finite(axle.position, &format!("axle {} position", idx + 1))
                .map_err(vehicle_err)?;
            if let Some(limit) = axle.legal_limit {
                validation::validate_dimension(limit, &format!("axle {} legal limit", idx + 1))
                    .map_err(vehicle_err)?;
            }
        }

        if let Some(payload) = self.max_payload {
            validation::validate_dimension(payload, "max payload").map_err(vehicle_err)?;
        }
        Ok(())
    }

    /// Interior envelope as (length, height, width) along (x, y, z).
    #[inline]
    pub fn interior(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.interior().volume()
    }

    /// Geometric center of the cargo space.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.interior().center()
    }
}

/// Why an instance ended up unplaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No allowed orientation fits even the empty vehicle.
    ExceedsVehicle,
    /// Every candidate position was rejected.
    NoValidPlacement,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::ExceedsVehicle => "exceeds_vehicle",
            UnplacedReason::NoValidPlacement => "no_valid_placement",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::ExceedsVehicle => {
                write!(f, "Item does not fit the vehicle interior in any allowed orientation")
            }
            UnplacedReason::NoValidPlacement => {
                write!(f, "No collision-free, supported position left in the vehicle")
            }
        }
    }
}

/// A single instance that could not be placed.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UnplacedItem {
    pub item: CargoItem,
    pub reason: UnplacedReason,
}
