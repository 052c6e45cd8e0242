//! Figures computed from a finished load plan.

use serde::Serialize;
use utoipa::ToSchema;

use crate::advisories::{self, LoadAdvisory};
use crate::model::{AxleKind, PlacedItem, UnplacedItem, VehicleProfile};
use crate::optimizer::StrategyKind;
use crate::types::{CenterOfGravityCalculator, Dimensional, Vec3, Weighted};

/// Share of the legal limit above which an axle is flagged.
pub const AXLE_WARNING_PERCENT: f64 = 80.0;

/// Outcome of one optimization run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct OptimizationResult {
    /// Committed items in placement order.
    pub placed: Vec<PlacedItem>,
    pub unplaced: Vec<UnplacedItem>,
    /// Placed volume as a percentage of the vehicle volume.
    pub utilization: f64,
    /// Placed weight as a percentage of `max_payload`, if the vehicle has one.
    pub weight_utilization: Option<f64>,
    pub total_weight: f64,
    pub center_of_gravity: Vec3,
    /// Furthest longitudinal extent of the cargo, for linear-foot billing.
    pub load_length: f64,
    pub axle_loads: Vec<AxleLoad>,
    pub advisories: Vec<LoadAdvisory>,
    pub strategy: StrategyKind,
}

impl OptimizationResult {
    /// Whether every instance was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn overloaded_axles(&self) -> impl Iterator<Item = &AxleLoad> {
        self.axle_loads
            .iter()
            .filter(|a| a.status == AxleStatus::Overloaded)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AxleStatus {
    Ok,
    /// Above [`AXLE_WARNING_PERCENT`] of the limit.
    Warning,
    Overloaded,
}

impl AxleStatus {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 100.0 {
            AxleStatus::Overloaded
        } else if percent > AXLE_WARNING_PERCENT {
            AxleStatus::Warning
        } else {
            AxleStatus::Ok
        }
    }
}

/// Estimated cargo weight on one axle.
///
/// **Advisory only.** The estimate splits each item's weight across the axles
/// by a linear distance heuristic. It ignores tare weight, suspension and
/// kingpin geometry and must not be used as a structural or legal
/// calculation. Weigh the loaded vehicle before departure.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct AxleLoad {
    /// Zero-based index into the vehicle's axle list.
    pub index: usize,
    pub position: f64,
    pub kind: AxleKind,
    pub load: f64,
    pub limit: f64,
    pub percent_of_limit: f64,
    pub status: AxleStatus,
}

/// Builds the result record for a finished run.
pub fn summarize(
    placed: Vec<PlacedItem>,
    unplaced: Vec<UnplacedItem>,
    vehicle: &VehicleProfile,
    strategy: StrategyKind,
) -> OptimizationResult {
    let total_weight = total_weight(&placed);
    let mut result = OptimizationResult {
        utilization: utilization(&placed, vehicle),
        weight_utilization: weight_utilization(total_weight, vehicle),
        total_weight,
        center_of_gravity: center_of_gravity(&placed, vehicle),
        load_length: load_length(&placed),
        axle_loads: axle_loads(&placed, vehicle),
        advisories: Vec::new(),
        strategy,
        placed,
        unplaced,
    };
    result.advisories = advisories::assess(&result, vehicle);
    result
}

/// Placed volume / vehicle volume × 100. Not capped.
pub fn utilization(placed: &[PlacedItem], vehicle: &VehicleProfile) -> f64 {
    let used: f64 = placed.iter().map(|p| p.volume()).sum();
    used / vehicle.volume() * 100.0
}

pub fn total_weight(placed: &[PlacedItem]) -> f64 {
    placed.iter().map(Weighted::weight).sum()
}

pub fn weight_utilization(total_weight: f64, vehicle: &VehicleProfile) -> Option<f64> {
    vehicle
        .max_payload
        .map(|payload| total_weight / payload * 100.0)
}

/// Weight-weighted mean of the placed item centers.
///
/// Falls back to the vehicle's geometric center when nothing with weight is
/// loaded.
pub fn center_of_gravity(placed: &[PlacedItem], vehicle: &VehicleProfile) -> Vec3 {
    let mut calc = CenterOfGravityCalculator::new();
    for p in placed {
        calc.add_point(p.center(), p.weight());
    }
    calc.compute().unwrap_or_else(|| vehicle.center())
}

pub fn load_length(placed: &[PlacedItem]) -> f64 {
    placed.iter().map(|p| p.far_x()).fold(0.0, f64::max)
}

/// Distributes every item's weight over the axles.
///
/// An axle's influence on an item is `max(0, 1 - |cx - axle_x| / L)` where
/// `cx` is the item's longitudinal center and `L` the vehicle length. The item
/// weight is split in proportion to the influences, or evenly when all of them
/// are zero, so the axle loads always sum to the placed weight.
pub fn axle_loads(placed: &[PlacedItem], vehicle: &VehicleProfile) -> Vec<AxleLoad> {
    let mut loads = vec![0.0; vehicle.axles.len()];

    if !loads.is_empty() {
        for p in placed {
            let cx = p.center().x;
            let influences: Vec<f64> = vehicle
                .axles
                .iter()
                .map(|axle| (1.0 - (cx - axle.position).abs() / vehicle.length).max(0.0))
                .collect();
            let sum: f64 = influences.iter().sum();

            for (load, influence) in loads.iter_mut().zip(&influences) {
                *load += if sum > 0.0 {
                    p.item.weight * influence / sum
                } else {
                    p.item.weight / influences.len() as f64
                };
            }
        }
    }

    vehicle
        .axles
        .iter()
        .zip(loads)
        .enumerate()
        .map(|(index, (axle, load))| {
            let limit = axle.effective_limit();
            let percent_of_limit = load / limit * 100.0;
            AxleLoad {
                index,
                position: axle.position,
                kind: axle.kind,
                load,
                limit,
                percent_of_limit,
                status: AxleStatus::from_percent(percent_of_limit),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axle, CargoItem, Placement, Rotation};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn vehicle() -> VehicleProfile {
        VehicleProfile::new((10.0, 2.0, 2.0)).unwrap()
    }

    fn placed(id: &str, dims: (f64, f64, f64), weight: f64, x: f64, rotation: Rotation) -> PlacedItem {
        let item = CargoItem::new(id, dims, weight).unwrap();
        PlacedItem::new(format!("{id}-0"), item, Placement::new(x, 0.0, 0.0, rotation))
    }

    #[test]
    fn utilization_is_volume_share() {
        let items = vec![placed("A", (5.0, 2.0, 2.0), 1.0, 0.0, Rotation::Original)];
        assert_close(utilization(&items, &vehicle()), 50.0);
        assert_eq!(utilization(&[], &vehicle()), 0.0);
    }

    #[test]
    fn center_of_gravity_weights_by_mass() {
        let items = vec![
            placed("A", (2.0, 2.0, 2.0), 10.0, 0.0, Rotation::Original),
            placed("B", (2.0, 2.0, 2.0), 30.0, 8.0, Rotation::Original),
        ];
        let cog = center_of_gravity(&items, &vehicle());
        // centers at x=1 and x=9
        assert_close(cog.x, 7.0);
        assert_close(cog.y, 1.0);
        assert_close(cog.z, 1.0);
    }

    #[test]
    fn center_of_gravity_uses_rotated_dims() {
        let items = vec![placed("A", (4.0, 2.0, 1.0), 10.0, 0.0, Rotation::Rotated90)];
        let cog = center_of_gravity(&items, &vehicle());
        assert_close(cog.x, 1.0);
        assert_close(cog.z, 2.0);
    }

    #[test]
    fn weightless_load_centers_on_vehicle() {
        let items = vec![placed("A", (2.0, 2.0, 2.0), 0.0, 0.0, Rotation::Original)];
        assert_eq!(center_of_gravity(&items, &vehicle()), vehicle().center());
        assert_eq!(center_of_gravity(&[], &vehicle()), vehicle().center());
    }

    #[test]
    fn load_length_is_furthest_extent() {
        let items = vec![
            placed("A", (2.0, 2.0, 2.0), 1.0, 0.0, Rotation::Original),
            placed("B", (3.0, 1.0, 1.0), 1.0, 4.0, Rotation::Rotated90),
        ];
        assert_close(load_length(&items), 5.0);
        assert_eq!(load_length(&[]), 0.0);
    }

    #[test]
    fn axle_loads_sum_to_placed_weight() {
        let vehicle = vehicle()
            .with_axle(Axle::new(1.0, AxleKind::Single))
            .with_axle(Axle::new(9.0, AxleKind::Dual));
        let items = vec![
            placed("A", (2.0, 2.0, 2.0), 100.0, 0.0, Rotation::Original),
            placed("B", (2.0, 2.0, 2.0), 50.0, 4.0, Rotation::Original),
        ];
        let loads = axle_loads(&items, &vehicle);
        let sum: f64 = loads.iter().map(|a| a.load).sum();
        assert_close(sum, 150.0);

        // A sits over the front axle: influences 1.0 and 0.2
        // B at x=5: influences 0.6 and 0.6
        assert_close(loads[0].load, 100.0 / 1.2 + 25.0);
        assert_close(loads[1].load, 100.0 * 0.2 / 1.2 + 25.0);
        assert_eq!(loads[1].kind, AxleKind::Dual);
        assert_close(loads[1].limit, 34_000.0);
    }

    #[test]
    fn distant_axles_share_evenly() {
        let vehicle = vehicle()
            .with_axle(Axle::new(-20.0, AxleKind::Single))
            .with_axle(Axle::new(30.0, AxleKind::Single));
        let items = vec![placed("A", (2.0, 2.0, 2.0), 80.0, 4.0, Rotation::Original)];
        let loads = axle_loads(&items, &vehicle);
        assert_close(loads[0].load, 40.0);
        assert_close(loads[1].load, 40.0);
    }

    #[test]
    fn no_axles_no_loads() {
        let items = vec![placed("A", (2.0, 2.0, 2.0), 80.0, 0.0, Rotation::Original)];
        assert!(axle_loads(&items, &vehicle()).is_empty());
    }

    #[test]
    fn axle_status_thresholds() {
        assert_eq!(AxleStatus::from_percent(50.0), AxleStatus::Ok);
        assert_eq!(AxleStatus::from_percent(80.0), AxleStatus::Ok);
        assert_eq!(AxleStatus::from_percent(80.5), AxleStatus::Warning);
        assert_eq!(AxleStatus::from_percent(100.0), AxleStatus::Warning);
        assert_eq!(AxleStatus::from_percent(140.0), AxleStatus::Overloaded);
    }

    #[test]
    fn weight_utilization_needs_payload() {
        assert_eq!(weight_utilization(500.0, &vehicle()), None);
        let vehicle = vehicle().with_max_payload(1_000.0);
        assert_eq!(weight_utilization(500.0, &vehicle), Some(50.0));
    }

    #[test]
    fn summarize_fills_every_field() {
        let vehicle = vehicle()
            .with_axle(Axle::new(5.0, AxleKind::Single).with_limit(100.0))
            .with_max_payload(200.0);
        let items = vec![placed("A", (10.0, 2.0, 2.0), 150.0, 0.0, Rotation::Original)];
        let result = summarize(items, Vec::new(), &vehicle, StrategyKind::ExtremePoint);

        assert!(result.is_complete());
        assert_close(result.utilization, 100.0);
        assert_close(result.total_weight, 150.0);
        assert_eq!(result.weight_utilization, Some(75.0));
        assert_close(result.load_length, 10.0);
        assert_eq!(result.overloaded_axles().count(), 1);
        assert!(!result.advisories.is_empty());
    }
}
