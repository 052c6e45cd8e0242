//! Built-in vehicle profiles.
//!
//! Interior dimensions are in inches and weights in pounds. Every preset gets
//! two approximate axle groups: one 36" behind the headboard and one 48" ahead
//! of the rear doors. Payload is gross vehicle weight minus tare.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Axle, AxleKind, VehicleProfile};

const FRONT_AXLE_OFFSET: f64 = 36.0;
const REAR_AXLE_OFFSET: f64 = 48.0;

struct PresetSpec {
    id: &'static str,
    name: &'static str,
    length: f64,
    width: f64,
    height: f64,
    tare_weight: f64,
    max_gross_weight: f64,
    rear_axle: AxleKind,
}

const PRESETS: &[PresetSpec] = &[
    PresetSpec {
        id: "dry-van-53",
        name: "53' Dry Van",
        length: 636.0,
        width: 102.0,
        height: 110.0,
        tare_weight: 14_000.0,
        max_gross_weight: 80_000.0,
        rear_axle: AxleKind::Dual,
    },
    PresetSpec {
        id: "reefer-53",
        name: "53' Reefer",
        length: 630.0,
        width: 100.0,
        height: 108.0,
        tare_weight: 16_000.0,
        max_gross_weight: 80_000.0,
        rear_axle: AxleKind::Dual,
    },
    PresetSpec {
        id: "flatbed-48",
        name: "48' Flatbed",
        length: 576.0,
        width: 102.0,
        height: 108.0,
        tare_weight: 12_000.0,
        max_gross_weight: 80_000.0,
        rear_axle: AxleKind::Dual,
    },
    PresetSpec {
        id: "step-deck-48",
        name: "48' Step Deck",
        length: 576.0,
        width: 102.0,
        height: 132.0,
        tare_weight: 15_000.0,
        max_gross_weight: 80_000.0,
        rear_axle: AxleKind::Tridem,
    },
    PresetSpec {
        id: "container-40",
        name: "40' Intermodal",
        length: 480.0,
        width: 94.0,
        height: 110.0,
        tare_weight: 8_600.0,
        max_gross_weight: 67_200.0,
        rear_axle: AxleKind::Dual,
    },
    PresetSpec {
        id: "container-20",
        name: "20' Intermodal",
        length: 240.0,
        width: 94.0,
        height: 110.0,
        tare_weight: 5_070.0,
        max_gross_weight: 67_200.0,
        rear_axle: AxleKind::Dual,
    },
];

/// A named vehicle profile with its weight ratings.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VehiclePreset {
    pub id: String,
    pub tare_weight: f64,
    pub max_gross_weight: f64,
    pub profile: VehicleProfile,
}

impl PresetSpec {
    fn to_preset(&self) -> VehiclePreset {
        let profile = VehicleProfile {
            name: Some(self.name.to_string()),
            length: self.length,
            width: self.width,
            height: self.height,
            axles: vec![
                Axle::new(FRONT_AXLE_OFFSET, AxleKind::Dual),
                Axle::new(self.length - REAR_AXLE_OFFSET, self.rear_axle),
            ],
            max_payload: Some(self.max_gross_weight - self.tare_weight),
        };
        VehiclePreset {
            id: self.id.to_string(),
            tare_weight: self.tare_weight,
            max_gross_weight: self.max_gross_weight,
            profile,
        }
    }
}

/// All presets in catalogue order.
pub fn all() -> Vec<VehiclePreset> {
    PRESETS.iter().map(PresetSpec::to_preset).collect()
}

/// Looks up a preset by id, ignoring case and surrounding whitespace.
///
/// # Examples
/// ```
/// use load_planner::presets;
///
/// let van = presets::find("dry-van-53").unwrap();
/// assert_eq!(van.profile.length, 636.0);
/// assert!(presets::find("hovercraft").is_none());
/// ```
pub fn find(id: &str) -> Option<VehiclePreset> {
    let id = id.trim();
    PRESETS
        .iter()
        .find(|spec| spec.id.eq_ignore_ascii_case(id))
        .map(PresetSpec::to_preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_a_valid_vehicle() {
        let presets = all();
        assert_eq!(presets.len(), 6);
        for preset in &presets {
            assert!(preset.profile.validate().is_ok(), "{} is invalid", preset.id);
            assert_eq!(preset.profile.axles.len(), 2);
            assert!(preset.profile.max_payload.unwrap() > 0.0);
        }
    }

    #[test]
    fn ids_are_unique() {
        let presets = all();
        for (i, a) in presets.iter().enumerate() {
            assert!(presets[i + 1..].iter().all(|b| b.id != a.id));
        }
    }

    #[test]
    fn payload_is_gross_minus_tare() {
        let van = find("dry-van-53").unwrap();
        assert_eq!(van.profile.max_payload, Some(66_000.0));
        assert_eq!(van.profile.name.as_deref(), Some("53' Dry Van"));
    }

    #[test]
    fn axles_sit_near_both_ends() {
        let deck = find("step-deck-48").unwrap();
        let axles = &deck.profile.axles;
        assert_eq!(axles[0].position, 36.0);
        assert_eq!(axles[1].position, 528.0);
        assert_eq!(axles[1].kind, AxleKind::Tridem);
    }

    #[test]
    fn lookup_ignores_case() {
        assert!(find(" Reefer-53 ").is_some());
        assert!(find("unknown").is_none());
    }
}
