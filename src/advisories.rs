//! Findings attached to a load plan.
//!
//! Advisories never change the plan. They point at conditions a dispatcher
//! should look at before the vehicle leaves: axle and payload limits, cargo
//! left behind, poor cube usage and an off-center load.

use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics::{AxleStatus, OptimizationResult};
use crate::model::VehicleProfile;

/// Volume utilization below which a plan is flagged.
pub const LOW_UTILIZATION_PERCENT: f64 = 60.0;
/// More unplaced instances than this raise the severity to high.
pub const MANY_UNPLACED: usize = 3;
/// Longitudinal offset of the center of gravity, relative to half the vehicle length.
pub const COG_OFFSET_MEDIUM: f64 = 0.3;
pub const COG_OFFSET_HIGH: f64 = 0.5;
/// Share of the rated payload above which the load weight is flagged.
pub const WEIGHT_NEAR_CAPACITY_PERCENT: f64 = 90.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    AxleOverload,
    WeightNearCapacity,
    UnplacedItems,
    LowUtilization,
    CenterOfGravityOffset,
    AxleNearLimit,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LoadAdvisory {
    pub kind: AdvisoryKind,
    pub severity: Severity,
    pub message: String,
    /// Cargo item ids concerned, if any.
    pub item_ids: Vec<String>,
    pub suggestion: Option<String>,
}

/// Evaluates every rule against a finished plan, most urgent rule first.
pub fn assess(result: &OptimizationResult, vehicle: &VehicleProfile) -> Vec<LoadAdvisory> {
    let mut advisories = Vec::new();

    for axle in result
        .axle_loads
        .iter()
        .filter(|a| a.status == AxleStatus::Overloaded)
    {
        advisories.push(LoadAdvisory {
            kind: AdvisoryKind::AxleOverload,
            severity: Severity::Critical,
            message: format!(
                "Axle {} is estimated at {:.0}% of its {:.0} limit",
                axle.index + 1,
                axle.percent_of_limit,
                axle.limit
            ),
            item_ids: Vec::new(),
            suggestion: Some(
                "Move heavy items away from this axle or split the load".to_string(),
            ),
        });
    }

    if let Some(percent) = result
        .weight_utilization
        .filter(|percent| *percent > WEIGHT_NEAR_CAPACITY_PERCENT)
    {
        let (severity, suggestion) = if percent > 100.0 {
            (Severity::Critical, "Remove cargo until the load is within the rated payload")
        } else {
            (Severity::Medium, "Check the scale ticket before dispatch")
        };
        advisories.push(LoadAdvisory {
            kind: AdvisoryKind::WeightNearCapacity,
            severity,
            message: format!("Load weight is {:.0}% of the rated payload", percent),
            item_ids: Vec::new(),
            suggestion: Some(suggestion.to_string()),
        });
    }

    if !result.unplaced.is_empty() {
        let mut item_ids: Vec<String> = Vec::new();
        for u in &result.unplaced {
            if !item_ids.contains(&u.item.id) {
                item_ids.push(u.item.id.clone());
            }
        }
        let severity = if result.unplaced.len() > MANY_UNPLACED {
            Severity::High
        } else {
            Severity::Medium
        };
        advisories.push(LoadAdvisory {
            kind: AdvisoryKind::UnplacedItems,
            severity,
            message: format!("{} item(s) could not be loaded", result.unplaced.len()),
            item_ids,
            suggestion: Some("Book a second vehicle or a larger equipment type".to_string()),
        });
    }

    if !result.placed.is_empty() && result.utilization < LOW_UTILIZATION_PERCENT {
        advisories.push(LoadAdvisory {
            kind: AdvisoryKind::LowUtilization,
            severity: Severity::Low,
            message: format!("Only {:.1}% of the cargo volume is used", result.utilization),
            item_ids: Vec::new(),
            suggestion: Some(
                "Consolidate with another shipment or use a smaller vehicle".to_string(),
            ),
        });
    }

    if result.total_weight > 0.0 {
        let half = vehicle.length / 2.0;
        let offset = (result.center_of_gravity.x - half) / half;
        let severity = if offset.abs() > COG_OFFSET_HIGH {
            Some(Severity::High)
        } else if offset.abs() > COG_OFFSET_MEDIUM {
            Some(Severity::Medium)
        } else {
            None
        };
        if let Some(severity) = severity {
            let (toward, away) = if offset < 0.0 {
                ("front", "rear")
            } else {
                ("rear", "front")
            };
            advisories.push(LoadAdvisory {
                kind: AdvisoryKind::CenterOfGravityOffset,
                severity,
                message: format!(
                    "Center of gravity sits {:.0}% of half the length toward the {}",
                    offset.abs() * 100.0,
                    toward
                ),
                item_ids: Vec::new(),
                suggestion: Some(format!("Shift heavy items toward the {}", away)),
            });
        }
    }

    for axle in result
        .axle_loads
        .iter()
        .filter(|a| a.status == AxleStatus::Warning)
    {
        advisories.push(LoadAdvisory {
            kind: AdvisoryKind::AxleNearLimit,
            severity: Severity::Medium,
            message: format!(
                "Axle {} is estimated at {:.0}% of its limit",
                axle.index + 1,
                axle.percent_of_limit
            ),
            item_ids: Vec::new(),
            suggestion: None,
        });
    }

    advisories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::summarize;
    use crate::model::{
        Axle, AxleKind, CargoItem, PlacedItem, Placement, Rotation, UnplacedItem, UnplacedReason,
    };
    use crate::optimizer::StrategyKind;

    fn vehicle() -> VehicleProfile {
        VehicleProfile::new((10.0, 2.0, 2.0)).unwrap()
    }

    fn placed(id: &str, length: f64, weight: f64, x: f64) -> PlacedItem {
        let item = CargoItem::new(id, (length, 2.0, 2.0), weight).unwrap();
        PlacedItem::new(format!("{id}-0"), item, Placement::new(x, 0.0, 0.0, Rotation::Original))
    }

    fn unplaced(id: &str) -> UnplacedItem {
        UnplacedItem {
            item: CargoItem::new(id, (1.0, 1.0, 1.0), 1.0).unwrap(),
            reason: UnplacedReason::NoValidPlacement,
        }
    }

    fn kinds(advisories: &[LoadAdvisory]) -> Vec<AdvisoryKind> {
        advisories.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn balanced_full_load_has_no_findings() {
        let result = summarize(
            vec![placed("A", 10.0, 100.0, 0.0)],
            Vec::new(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn empty_plan_has_no_findings() {
        let result = summarize(Vec::new(), Vec::new(), &vehicle(), StrategyKind::ExtremePoint);
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn unplaced_severity_depends_on_count() {
        let few = summarize(
            vec![placed("A", 10.0, 1.0, 0.0)],
            vec![unplaced("X"), unplaced("X")],
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert_eq!(kinds(&few.advisories), vec![AdvisoryKind::UnplacedItems]);
        assert_eq!(few.advisories[0].severity, Severity::Medium);
        assert_eq!(few.advisories[0].item_ids, vec!["X".to_string()]);

        let many = summarize(
            vec![placed("A", 10.0, 1.0, 0.0)],
            (0..4).map(|i| unplaced(&format!("U{i}"))).collect(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert_eq!(many.advisories[0].severity, Severity::High);
        assert_eq!(many.advisories[0].item_ids.len(), 4);
    }

    #[test]
    fn front_heavy_load_is_flagged() {
        // 5 long at the headboard: 50% volume, center at x=2.5
        let result = summarize(
            vec![placed("A", 5.0, 100.0, 0.0)],
            Vec::new(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert_eq!(
            kinds(&result.advisories),
            vec![
                AdvisoryKind::LowUtilization,
                AdvisoryKind::CenterOfGravityOffset
            ]
        );
        let cog = &result.advisories[1];
        assert_eq!(cog.severity, Severity::Medium);
        assert!(cog.message.contains("front"));
    }

    #[test]
    fn strongly_offset_load_is_high() {
        let result = summarize(
            vec![placed("A", 2.0, 100.0, 8.0)],
            Vec::new(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        let cog = result
            .advisories
            .iter()
            .find(|a| a.kind == AdvisoryKind::CenterOfGravityOffset)
            .unwrap();
        assert_eq!(cog.severity, Severity::High);
        assert!(cog.message.contains("rear"));
    }

    #[test]
    fn weightless_load_skips_center_of_gravity_rule() {
        let result = summarize(
            vec![placed("A", 2.0, 0.0, 8.0)],
            Vec::new(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert_eq!(kinds(&result.advisories), vec![AdvisoryKind::LowUtilization]);
    }

    #[test]
    fn axle_rules_come_first_and_last() {
        let vehicle = vehicle()
            .with_axle(Axle::new(0.0, AxleKind::Single).with_limit(50.0))
            .with_axle(Axle::new(10.0, AxleKind::Single).with_limit(55.0));
        let result = summarize(
            vec![placed("A", 10.0, 100.0, 0.0)],
            vec![unplaced("X")],
            &vehicle,
            StrategyKind::ExtremePoint,
        );
        // 50 on each axle: 100% and ~91%
        assert_eq!(
            kinds(&result.advisories),
            vec![
                AdvisoryKind::UnplacedItems,
                AdvisoryKind::AxleNearLimit,
                AdvisoryKind::AxleNearLimit
            ]
        );

        let vehicle = VehicleProfile::new((10.0, 2.0, 2.0))
            .unwrap()
            .with_axle(Axle::new(5.0, AxleKind::Single).with_limit(10.0));
        let result = summarize(
            vec![placed("A", 10.0, 100.0, 0.0)],
            vec![unplaced("X")],
            &vehicle,
            StrategyKind::ExtremePoint,
        );
        assert_eq!(result.advisories[0].kind, AdvisoryKind::AxleOverload);
        assert_eq!(result.advisories[0].severity, Severity::Critical);
    }

    #[test]
    fn payload_rule_needs_a_rated_payload() {
        let result = summarize(
            vec![placed("A", 10.0, 1_000.0, 0.0)],
            Vec::new(),
            &vehicle(),
            StrategyKind::ExtremePoint,
        );
        assert!(result.advisories.is_empty());
    }

    #[test]
    fn heavy_load_is_flagged_against_payload() {
        let rated = vehicle().with_max_payload(1_000.0);

        let at_90 = summarize(
            vec![placed("A", 10.0, 900.0, 0.0)],
            Vec::new(),
            &rated,
            StrategyKind::ExtremePoint,
        );
        assert!(at_90.advisories.is_empty());

        let near = summarize(
            vec![placed("A", 10.0, 950.0, 0.0)],
            Vec::new(),
            &rated,
            StrategyKind::ExtremePoint,
        );
        assert_eq!(kinds(&near.advisories), vec![AdvisoryKind::WeightNearCapacity]);
        assert_eq!(near.advisories[0].severity, Severity::Medium);
        assert!(near.advisories[0].message.contains("95%"));

        let over = summarize(
            vec![placed("A", 10.0, 1_200.0, 0.0)],
            vec![unplaced("X")],
            &rated,
            StrategyKind::ExtremePoint,
        );
        assert_eq!(
            kinds(&over.advisories),
            vec![AdvisoryKind::WeightNearCapacity, AdvisoryKind::UnplacedItems]
        );
        assert_eq!(over.advisories[0].severity, Severity::Critical);
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }
}
