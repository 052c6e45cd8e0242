//! Candidate placement generation.
//!
//! Two sources are provided behind [`CandidateSource`]:
//! - [`ExtremePoints`]: anchors derived from the faces of already placed items
//! - [`GridScan`]: a fixed-step scan of the floor and of every stackable top face
//!
//! Both return candidates ordered bottom first, then front to back, then left
//! to right, so the first accepted candidate keeps the load low and tight
//! against the headboard.

use std::cmp::Ordering;

use crate::model::{CargoItem, PlacedItem, Placement, VehicleProfile};

/// Proposes placements for one item given the items already placed.
///
/// Implementations must be pure: same input, same ordered output.
pub trait CandidateSource {
    fn candidates(
        &self,
        item: &CargoItem,
        placed: &[PlacedItem],
        vehicle: &VehicleProfile,
    ) -> Vec<Placement>;
}

/// Extreme-point heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtremePoints;

impl CandidateSource for ExtremePoints {
    fn candidates(
        &self,
        item: &CargoItem,
        placed: &[PlacedItem],
        _vehicle: &VehicleProfile,
    ) -> Vec<Placement> {
        extreme_point_candidates(item, placed)
    }
}

/// Generates extreme-point candidates.
///
/// Seeds the origin, then for every placed item adds the point beyond its far
/// x face, beyond its far z face and, when both items are stackable, on its
/// top face. Rotatable items get every anchor a second time in the turned
/// orientation.
pub fn extreme_point_candidates(item: &CargoItem, placed: &[PlacedItem]) -> Vec<Placement> {
    let mut anchors: Vec<(f64, f64, f64)> = Vec::with_capacity(1 + placed.len() * 3);
    anchors.push((0.0, 0.0, 0.0));

    for p in placed {
        let pos = p.placement;
        anchors.push((pos.x + p.dims.x, pos.y, pos.z));
        anchors.push((pos.x, pos.y, pos.z + p.dims.z));
        if item.stackable && p.item.stackable {
            anchors.push((pos.x, pos.y + p.dims.y, pos.z));
        }
    }

    let mut candidates: Vec<Placement> = item
        .allowed_rotations()
        .iter()
        .flat_map(|rotation| {
            anchors
                .iter()
                .map(move |&(x, y, z)| Placement::new(x, y, z, *rotation))
        })
        .collect();

    sort_bottom_front_left(&mut candidates);
    candidates
}

/// Fixed-step scan, the slower alternative to [`ExtremePoints`].
#[derive(Clone, Copy, Debug)]
pub struct GridScan {
    /// Distance between scanned positions along x and z.
    pub step: f64,
    /// Tolerance used to merge nearly identical positions and layers.
    pub epsilon: f64,
}

impl CandidateSource for GridScan {
    fn candidates(
        &self,
        item: &CargoItem,
        placed: &[PlacedItem],
        vehicle: &VehicleProfile,
    ) -> Vec<Placement> {
        let mut layers: Vec<f64> = vec![0.0];
        if item.stackable {
            layers.extend(
                placed
                    .iter()
                    .filter(|p| p.item.stackable)
                    .map(|p| p.bounding_box().top()),
            );
        }
        layers.sort_by(|a, b| a.total_cmp(b));
        layers.dedup_by(|a, b| (*a - *b).abs() < self.epsilon);

        let mut candidates = Vec::new();
        for rotation in item.allowed_rotations() {
            let dims = item.oriented_dims(*rotation);
            let xs = axis_positions(vehicle.length, dims.x, self.step, self.epsilon);
            let zs = axis_positions(vehicle.width, dims.z, self.step, self.epsilon);

            for &y in &layers {
                if y + dims.y > vehicle.height + self.epsilon {
                    continue;
                }
                for &x in &xs {
                    for &z in &zs {
                        candidates.push(Placement::new(x, y, z, *rotation));
                    }
                }
            }
        }

        sort_bottom_front_left(&mut candidates);
        candidates
    }
}

/// Generates scan positions along one axis.
///
/// Steps from 0 by `step` and always includes the flush-to-wall end position.
///
/// # Parameters
/// * `container_len` - Interior length along this axis
/// * `object_len` - Item length along this axis
/// * `step` - Scan step
/// * `epsilon` - Numerical tolerance
pub fn axis_positions(container_len: f64, object_len: f64, step: f64, epsilon: f64) -> Vec<f64> {
    let max_pos = (container_len - object_len).max(0.0);
    let mut positions = Vec::new();

    if max_pos <= epsilon || step <= 0.0 {
        positions.push(0.0);
        if max_pos > epsilon {
            positions.push(max_pos);
        }
        return positions;
    }

    let mut pos = 0.0;
    while pos <= max_pos + epsilon {
        positions.push(pos.min(max_pos));
        pos += step;
    }

    if let Some(&last) = positions.last() {
        if (last - max_pos).abs() > epsilon {
            positions.push(max_pos);
        }
    }

    positions.sort_by(|a, b| a.total_cmp(b));
    positions.dedup_by(|a, b| (*a - *b).abs() < epsilon);
    positions
}

/// Stable sort by ascending y, then x, then z; drops exact duplicates.
///
/// At an identical anchor the unrotated orientation stays first.
fn sort_bottom_front_left(candidates: &mut Vec<Placement>) {
    candidates.sort_by(|a, b| compare_bottom_front_left(a, b));
    candidates.dedup();
}

fn compare_bottom_front_left(a: &Placement, b: &Placement) -> Ordering {
    a.y.total_cmp(&b.y)
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.z.total_cmp(&b.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rotation;

    fn vehicle() -> VehicleProfile {
        VehicleProfile::new((10.0, 4.0, 3.0)).unwrap()
    }

    fn item(id: &str, dims: (f64, f64, f64)) -> CargoItem {
        CargoItem::new(id, dims, 10.0).unwrap()
    }

    fn placed_at(item: CargoItem, x: f64, y: f64, z: f64) -> PlacedItem {
        PlacedItem::new(
            format!("{}-0", item.id),
            item,
            Placement::new(x, y, z, Rotation::Original),
        )
    }

    #[test]
    fn empty_vehicle_offers_origin_only() {
        let candidates = extreme_point_candidates(&item("A", (2.0, 2.0, 1.0)), &[]);
        assert_eq!(candidates, vec![Placement::origin(Rotation::Original)]);
    }

    #[test]
    fn placed_item_adds_x_and_z_anchors() {
        let placed = vec![placed_at(item("A", (2.0, 1.5, 1.0)), 0.0, 0.0, 0.0)];
        let candidates = extreme_point_candidates(&item("B", (1.0, 1.0, 1.0)), &placed);

        assert_eq!(
            candidates,
            vec![
                Placement::new(0.0, 0.0, 0.0, Rotation::Original),
                Placement::new(0.0, 0.0, 1.5, Rotation::Original),
                Placement::new(2.0, 0.0, 0.0, Rotation::Original),
            ]
        );
    }

    #[test]
    fn top_anchor_requires_both_stackable() {
        let base = item("A", (2.0, 2.0, 1.0));
        let stackable_base = base.clone().with_stacking(true);
        let new_item = item("B", (1.0, 1.0, 1.0));
        let stackable_new = new_item.clone().with_stacking(true);

        let has_top = |candidates: &[Placement]| candidates.iter().any(|c| c.y > 0.0);

        let placed = vec![placed_at(base.clone(), 0.0, 0.0, 0.0)];
        assert!(!has_top(&extreme_point_candidates(&stackable_new, &placed)));

        let placed = vec![placed_at(stackable_base, 0.0, 0.0, 0.0)];
        assert!(!has_top(&extreme_point_candidates(&new_item, &placed)));

        let candidates = extreme_point_candidates(&stackable_new, &placed);
        assert!(has_top(&candidates));
        assert_eq!(
            candidates.last(),
            Some(&Placement::new(0.0, 1.0, 0.0, Rotation::Original))
        );
    }

    #[test]
    fn rotatable_items_get_both_orientations() {
        let placed = vec![placed_at(item("A", (2.0, 2.0, 1.0)), 0.0, 0.0, 0.0)];
        let rotatable = item("B", (3.0, 1.0, 1.0)).with_rotation(true);
        let candidates = extreme_point_candidates(&rotatable, &placed);

        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0], Placement::origin(Rotation::Original));
        assert_eq!(candidates[1], Placement::origin(Rotation::Rotated90));
        for pair in candidates.chunks(2) {
            assert_eq!(pair[0].position(), pair[1].position());
            assert_eq!(pair[0].rotation, Rotation::Original);
            assert_eq!(pair[1].rotation, Rotation::Rotated90);
        }
    }

    #[test]
    fn candidates_are_sorted_bottom_front_left() {
        let stack = |id: &str| item(id, (2.0, 2.0, 1.0)).with_stacking(true);
        let placed = vec![
            placed_at(stack("A"), 0.0, 0.0, 0.0),
            placed_at(stack("B"), 2.0, 0.0, 0.0),
            placed_at(stack("C"), 0.0, 1.0, 0.0),
        ];
        let candidates = extreme_point_candidates(&stack("D"), &placed);

        for pair in candidates.windows(2) {
            assert_ne!(
                compare_bottom_front_left(&pair[0], &pair[1]),
                Ordering::Greater
            );
        }
        assert_eq!(candidates[0], Placement::origin(Rotation::Original));
    }

    #[test]
    fn duplicate_anchors_are_removed() {
        // B's z anchor and A's x anchor both land on (2, 0, 2)
        let placed = vec![
            placed_at(item("A", (2.0, 2.0, 1.0)), 0.0, 0.0, 2.0),
            placed_at(item("B", (2.0, 2.0, 1.0)), 2.0, 0.0, 0.0),
        ];
        let candidates = extreme_point_candidates(&item("C", (1.0, 1.0, 1.0)), &placed);
        let mut unique = candidates.clone();
        unique.dedup();
        assert_eq!(candidates, unique);
        assert_eq!(
            candidates
                .iter()
                .filter(|c| c.x == 2.0 && c.z == 2.0)
                .count(),
            1
        );
    }

    #[test]
    fn generation_does_not_touch_placed_items() {
        let placed = vec![placed_at(item("A", (2.0, 1.0, 2.0)), 0.0, 0.0, 0.0)];
        let before = placed.clone();
        let _ = extreme_point_candidates(&item("B", (1.0, 1.0, 1.0)), &placed);
        assert_eq!(placed, before);
    }

    #[test]
    fn axis_positions_include_wall_flush_end() {
        let positions = axis_positions(10.0, 3.0, 4.0, 1e-6);
        assert_eq!(positions, vec![0.0, 4.0, 7.0]);
    }

    #[test]
    fn axis_positions_for_exact_fit() {
        assert_eq!(axis_positions(10.0, 10.0, 4.0, 1e-6), vec![0.0]);
        assert_eq!(axis_positions(10.0, 12.0, 4.0, 1e-6), vec![0.0]);
    }

    #[test]
    fn grid_scan_covers_floor_and_stackable_tops() {
        let grid = GridScan {
            step: 5.0,
            epsilon: 1e-6,
        };
        let base = item("A", (5.0, 3.0, 1.0)).with_stacking(true);
        let placed = vec![placed_at(base, 0.0, 0.0, 0.0)];
        let new_item = item("B", (5.0, 3.0, 1.0)).with_stacking(true);

        let candidates = grid.candidates(&new_item, &placed, &vehicle());
        // x in {0, 5}, z in {0, 1}, y in {0, 1}
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], Placement::origin(Rotation::Original));
        assert!(candidates.iter().any(|c| c.y == 1.0));
        for pair in candidates.windows(2) {
            assert_ne!(
                compare_bottom_front_left(&pair[0], &pair[1]),
                Ordering::Greater
            );
        }
    }

    #[test]
    fn grid_scan_skips_layers_that_would_exceed_height() {
        let grid = GridScan {
            step: 5.0,
            epsilon: 1e-6,
        };
        let base = item("A", (5.0, 3.0, 2.5)).with_stacking(true);
        let placed = vec![placed_at(base, 0.0, 0.0, 0.0)];
        let new_item = item("B", (5.0, 3.0, 1.0)).with_stacking(true);

        let candidates = grid.candidates(&new_item, &placed, &vehicle());
        assert!(candidates.iter().all(|c| c.y == 0.0));
    }
}
