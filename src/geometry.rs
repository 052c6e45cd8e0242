//! Axis-aligned box primitives for collision and support checks.
//!
//! Every placed or candidate item is represented as a [`BoundingBox`] in
//! vehicle-local coordinates (see [`crate::types`] for the axis convention).

use crate::types::Vec3;

/// An axis-aligned bounding box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Lower-near-left corner (position)
    pub min: Vec3,
    /// Upper-far-right corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from position and (length, height, width).
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks whether two boxes share interior volume.
    ///
    /// Intervals are half-open: boxes that only touch along a face, edge or
    /// corner do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
            || self.max.z <= other.min.z
            || other.max.z <= self.min.z)
    }

    /// Overlap area of the two boxes projected onto the floor (x-z) plane.
    #[inline]
    pub fn footprint_overlap_area(&self, other: &Self) -> f64 {
        let overlap_x = overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x);
        let overlap_z = overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z);
        overlap_x * overlap_z
    }

    /// Checks whether this box lies inside `[0, envelope]` on every axis.
    #[inline]
    pub fn lies_within(&self, envelope: &Vec3, tolerance: f64) -> bool {
        self.min.x >= -tolerance
            && self.min.y >= -tolerance
            && self.min.z >= -tolerance
            && self.max.fits_within(envelope, tolerance)
    }

    /// Height of the top face.
    #[inline]
    pub fn top(&self) -> f64 {
        self.max.y
    }

    /// Height of the bottom face.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn footprint_area(&self) -> f64 {
        self.dimensions().footprint_area()
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Checks whether two boxes overlap in all three axes.
///
/// # Examples
/// ```
/// use load_planner::geometry::{BoundingBox, intersects};
/// use load_planner::types::Vec3;
///
/// let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(2.0, 2.0, 2.0));
/// let b = BoundingBox::from_position_and_dims(Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
/// assert!(!intersects(&a, &b)); // touching faces
/// ```
pub fn intersects(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.intersects(b)
}

/// Overlap area of two boxes on the x-z plane, 0 when disjoint.
pub fn footprint_overlap_area(a: &BoundingBox, b: &BoundingBox) -> f64 {
    a.footprint_overlap_area(b)
}

/// Length of the overlap of `[a1, a2]` and `[b1, b2]`, at least 0.0.
///
/// # Examples
/// ```
/// use load_planner::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn cube(x: f64, y: f64, z: f64, size: f64) -> BoundingBox {
        BoundingBox::from_position_and_dims(Vec3::new(x, y, z), Vec3::new(size, size, size))
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = cube(0.0, 0.0, 0.0, 10.0);
        let b = cube(5.0, 5.0, 5.0, 10.0);
        assert!(intersects(&a, &b));
        assert!(intersects(&b, &a));
    }

    #[test]
    fn separated_boxes_do_not_intersect() {
        let a = cube(0.0, 0.0, 0.0, 10.0);
        let c = cube(20.0, 20.0, 20.0, 10.0);
        assert!(!intersects(&a, &c));
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let a = cube(0.0, 0.0, 0.0, 1.0);
        assert!(!intersects(&a, &cube(1.0, 0.0, 0.0, 1.0)));
        assert!(!intersects(&a, &cube(0.0, 1.0, 0.0, 1.0)));
        assert!(!intersects(&a, &cube(0.0, 0.0, 1.0, 1.0)));
        assert!(!intersects(&a, &cube(1.0, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn overlap_in_two_axes_only_is_not_an_intersection() {
        let a = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(4.0, 1.0, 4.0));
        let above = BoundingBox::from_position_and_dims(
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::new(4.0, 1.0, 4.0),
        );
        assert!(!intersects(&a, &above));
        // the footprints still overlap
        assert!((footprint_overlap_area(&a, &above) - 9.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn footprint_overlap_ignores_height() {
        let a = cube(0.0, 0.0, 0.0, 10.0);
        let b = cube(5.0, 50.0, 5.0, 10.0);
        assert!((footprint_overlap_area(&a, &b) - 25.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn footprint_overlap_is_zero_without_horizontal_overlap() {
        let a = cube(0.0, 0.0, 0.0, 2.0);
        assert_eq!(footprint_overlap_area(&a, &cube(2.0, 0.0, 0.0, 2.0)), 0.0);
        assert_eq!(footprint_overlap_area(&a, &cube(0.0, 0.0, 5.0, 2.0)), 0.0);
    }

    #[test]
    fn lies_within_envelope() {
        let envelope = Vec3::new(10.0, 2.5, 2.0);
        let inside = BoundingBox::from_position_and_dims(Vec3::zero(), Vec3::new(10.0, 2.5, 2.0));
        let outside = BoundingBox::from_position_and_dims(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(6.0, 2.5, 2.0),
        );
        let negative = BoundingBox::from_position_and_dims(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        );
        assert!(inside.lies_within(&envelope, EPSILON_GENERAL));
        assert!(!outside.lies_within(&envelope, EPSILON_GENERAL));
        assert!(!negative.lies_within(&envelope, EPSILON_GENERAL));
    }

    #[test]
    fn box_accessors() {
        let b = BoundingBox::from_position_and_dims(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 2.0, 2.0),
        );
        assert_eq!(b.bottom(), 2.0);
        assert_eq!(b.top(), 4.0);
        assert_eq!(b.center(), Vec3::new(3.0, 3.0, 4.0));
        assert_eq!(b.dimensions(), Vec3::new(4.0, 2.0, 2.0));
        assert!((b.footprint_area() - 8.0).abs() < EPSILON_GENERAL);
        assert!((b.volume() - 16.0).abs() < EPSILON_GENERAL);
    }
}
