//! Placement validation.
//!
//! A candidate is checked, failing fast, for:
//! 1. bounds: the oriented box lies inside the vehicle interior
//! 2. collision: no shared volume with any placed item
//! 3. support: above the floor, enough footprint rests on coincident top faces
//! 4. stackability: above the floor, the item and everything under it may stack;
//!    an item that would end up under already placed cargo must be stackable
//! 5. stack weight: the item and every item beneath it keep within their
//!    `max_stack_weight`, counting the whole column resting on each
//!
//! Validation has no side effects; committing a placement is the caller's job.

use crate::geometry::BoundingBox;
use crate::model::{CargoItem, PlacedItem, Placement, VehicleProfile};
use crate::optimizer::PackingConfig;

/// Why a candidate placement was refused.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    OutOfBounds,
    Collision {
        instance_id: String,
    },
    InsufficientSupport {
        supported_ratio: f64,
    },
    /// `instance_id` is `None` when the candidate itself is not stackable.
    NotStackable {
        instance_id: Option<String>,
    },
    /// The candidate is not stackable but `instance_id` would rest on it.
    CannotCarry {
        instance_id: String,
    },
    StackWeightExceeded {
        instance_id: String,
        load: f64,
        limit: f64,
    },
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::OutOfBounds => "out_of_bounds",
            Rejection::Collision { .. } => "collision",
            Rejection::InsufficientSupport { .. } => "insufficient_support",
            Rejection::NotStackable { .. } => "not_stackable",
            Rejection::CannotCarry { .. } => "cannot_carry",
            Rejection::StackWeightExceeded { .. } => "stack_weight_exceeded",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::OutOfBounds => write!(f, "Placement leaves the vehicle interior"),
            Rejection::Collision { instance_id } => {
                write!(f, "Placement collides with {}", instance_id)
            }
            Rejection::InsufficientSupport { supported_ratio } => write!(
                f,
                "Only {:.1}% of the footprint is supported",
                supported_ratio * 100.0
            ),
            Rejection::NotStackable { instance_id: None } => {
                write!(f, "Item may not be placed on top of other cargo")
            }
            Rejection::NotStackable {
                instance_id: Some(id),
            } => write!(f, "{} may not carry other cargo", id),
            Rejection::CannotCarry { instance_id } => {
                write!(f, "Item may not carry other cargo, but {} would rest on it", instance_id)
            }
            Rejection::StackWeightExceeded {
                instance_id,
                load,
                limit,
            } => write!(
                f,
                "{} would carry {:.1} on top, limit is {:.1}",
                instance_id, load, limit
            ),
        }
    }
}

/// Checks candidate placements against one vehicle.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintValidator<'a> {
    vehicle: &'a VehicleProfile,
    config: &'a PackingConfig,
}

impl<'a> ConstraintValidator<'a> {
    pub fn new(vehicle: &'a VehicleProfile, config: &'a PackingConfig) -> Self {
        Self { vehicle, config }
    }

    /// Accepts or rejects `item` at `placement` given the already placed items.
    ///
    /// To re-check a committed item, pass the placed set without that item.
    pub fn validate(
        &self,
        item: &CargoItem,
        placement: &Placement,
        placed: &[PlacedItem],
    ) -> Result<(), Rejection> {
        let candidate = placement.bounding_box(item);

        self.check_bounds(&candidate)?;
        self.check_collision(&candidate, placed)?;

        if candidate.bottom() > self.config.general_epsilon {
            let supporters = supporting_items(&candidate, placed, self.config.height_epsilon);
            self.check_support(&candidate, &supporters)?;
            self.check_stackability(item, &supporters)?;
        }
        self.check_carried(item, &candidate, placed)?;
        if self.config.enforce_stack_weight {
            self.check_stack_weight(item, &candidate, placed)?;
        }
        Ok(())
    }

    fn check_bounds(&self, candidate: &BoundingBox) -> Result<(), Rejection> {
        if candidate.lies_within(&self.vehicle.interior(), self.config.general_epsilon) {
            Ok(())
        } else {
            Err(Rejection::OutOfBounds)
        }
    }

    fn check_collision(
        &self,
        candidate: &BoundingBox,
        placed: &[PlacedItem],
    ) -> Result<(), Rejection> {
        match placed
            .iter()
            .find(|p| p.bounding_box().intersects(candidate))
        {
            Some(hit) => Err(Rejection::Collision {
                instance_id: hit.instance_id.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_support(
        &self,
        candidate: &BoundingBox,
        supporters: &[(&PlacedItem, f64)],
    ) -> Result<(), Rejection> {
        let footprint = candidate.footprint_area();
        let supported: f64 = supporters.iter().map(|(_, area)| area).sum();

        if supported + self.config.general_epsilon >= footprint * self.config.support_ratio {
            Ok(())
        } else {
            Err(Rejection::InsufficientSupport {
                supported_ratio: supported / footprint,
            })
        }
    }

    fn check_stackability(
        &self,
        item: &CargoItem,
        supporters: &[(&PlacedItem, f64)],
    ) -> Result<(), Rejection> {
        if !item.stackable {
            return Err(Rejection::NotStackable { instance_id: None });
        }
        match supporters.iter().find(|(p, _)| !p.item.stackable) {
            Some((below, _)) => Err(Rejection::NotStackable {
                instance_id: Some(below.instance_id.clone()),
            }),
            None => Ok(()),
        }
    }

    /// Items placed earlier may already overhang the candidate's top face.
    fn check_carried(
        &self,
        item: &CargoItem,
        candidate: &BoundingBox,
        placed: &[PlacedItem],
    ) -> Result<(), Rejection> {
        if item.stackable {
            return Ok(());
        }
        match carried_items(candidate, placed, self.config.height_epsilon).first() {
            Some(above) => Err(Rejection::CannotCarry {
                instance_id: above.instance_id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Each item carries the full weight of every item resting on it, directly
    /// or through other items. Only the candidate and the items beneath it see
    /// their load change, so only those are checked. A rejection naming the
    /// candidate uses its item id.
    fn check_stack_weight(
        &self,
        item: &CargoItem,
        candidate: &BoundingBox,
        placed: &[PlacedItem],
    ) -> Result<(), Rejection> {
        if item.max_stack_weight.is_none() && placed.iter().all(|p| p.item.max_stack_weight.is_none())
        {
            return Ok(());
        }
        let graph = StackGraph::new(candidate, item.weight, placed, self.config.height_epsilon);
        let own = placed.len();

        let within = |index: usize, limit: Option<f64>| -> Result<(), (f64, f64)> {
            let Some(limit) = limit else {
                return Ok(());
            };
            let load = graph.load_on(index);
            if load > limit + self.config.general_epsilon {
                Err((load, limit))
            } else {
                Ok(())
            }
        };

        within(own, item.max_stack_weight).map_err(|(load, limit)| {
            Rejection::StackWeightExceeded {
                instance_id: item.id.clone(),
                load,
                limit,
            }
        })?;
        for index in graph.reachable(own, Direction::Down) {
            let below = &placed[index];
            within(index, below.item.max_stack_weight).map_err(|(load, limit)| {
                Rejection::StackWeightExceeded {
                    instance_id: below.instance_id.clone(),
                    load,
                    limit,
                }
            })?;
        }
        Ok(())
    }
}

/// Placed items whose top face meets the candidate's bottom face, with the
/// shared footprint area of each.
pub fn supporting_items<'p>(
    candidate: &BoundingBox,
    placed: &'p [PlacedItem],
    height_epsilon: f64,
) -> Vec<(&'p PlacedItem, f64)> {
    placed
        .iter()
        .filter_map(|p| {
            let below = p.bounding_box();
            if (below.top() - candidate.bottom()).abs() > height_epsilon {
                return None;
            }
            let area = below.footprint_overlap_area(candidate);
            (area > 0.0).then_some((p, area))
        })
        .collect()
}

/// Share of the candidate's footprint resting on coincident top faces.
pub fn supported_ratio(candidate: &BoundingBox, placed: &[PlacedItem], height_epsilon: f64) -> f64 {
    let footprint = candidate.footprint_area();
    if footprint <= 0.0 {
        return 0.0;
    }
    let supported: f64 = supporting_items(candidate, placed, height_epsilon)
        .iter()
        .map(|(_, area)| area)
        .sum();
    supported / footprint
}

/// Placed items whose bottom face meets the candidate's top face.
pub fn carried_items<'p>(
    candidate: &BoundingBox,
    placed: &'p [PlacedItem],
    height_epsilon: f64,
) -> Vec<&'p PlacedItem> {
    placed
        .iter()
        .filter(|p| rests_on(&p.bounding_box(), candidate, height_epsilon))
        .collect()
}

fn rests_on(upper: &BoundingBox, lower: &BoundingBox, height_epsilon: f64) -> bool {
    (upper.bottom() - lower.top()).abs() <= height_epsilon
        && upper.footprint_overlap_area(lower) > 0.0
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Resting contacts between the placed items and one candidate, which takes
/// the last index.
struct StackGraph {
    boxes: Vec<BoundingBox>,
    weights: Vec<f64>,
    height_epsilon: f64,
}

impl StackGraph {
    fn new(candidate: &BoundingBox, weight: f64, placed: &[PlacedItem], height_epsilon: f64) -> Self {
        let mut boxes: Vec<BoundingBox> = placed.iter().map(PlacedItem::bounding_box).collect();
        let mut weights: Vec<f64> = placed.iter().map(|p| p.item.weight).collect();
        boxes.push(*candidate);
        weights.push(weight);
        Self {
            boxes,
            weights,
            height_epsilon,
        }
    }

    /// Indices reachable from `start` through resting contacts, in ascending
    /// order and without `start`.
    fn reachable(&self, start: usize, direction: Direction) -> Vec<usize> {
        let mut seen = vec![false; self.boxes.len()];
        seen[start] = true;
        let mut pending = vec![start];

        while let Some(current) = pending.pop() {
            for next in 0..self.boxes.len() {
                if seen[next] {
                    continue;
                }
                let linked = match direction {
                    Direction::Up => {
                        rests_on(&self.boxes[next], &self.boxes[current], self.height_epsilon)
                    }
                    Direction::Down => {
                        rests_on(&self.boxes[current], &self.boxes[next], self.height_epsilon)
                    }
                };
                if linked {
                    seen[next] = true;
                    pending.push(next);
                }
            }
        }

        seen[start] = false;
        (0..seen.len()).filter(|&i| seen[i]).collect()
    }

    /// Weight of everything resting on `index`, each item counted once.
    fn load_on(&self, index: usize) -> f64 {
        self.reachable(index, Direction::Up)
            .into_iter()
            .map(|i| self.weights[i])
            .sum()
    }
}
