//! Common types and traits for vehicle-local 3D geometry.
//!
//! Axis convention used everywhere in this crate:
//! - `x`: longitudinal, from the front wall (headboard) toward the rear doors
//! - `y`: vertical, from the floor upward
//! - `z`: lateral, from the left wall to the right wall

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for bounds checks and dimension comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Tolerance for matching a bottom face against a top face when stacking.
pub const EPSILON_HEIGHT: f64 = 1e-3;

/// A 3D vector or point in vehicle-local coordinates.
///
/// # Examples
/// ```
/// use load_planner::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let dimensions = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + dimensions * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    ///
    /// # Parameters
    /// * `x` - Longitudinal component (length)
    /// * `y` - Vertical component (height)
    /// * `z` - Lateral component (width)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Product of all components.
    ///
    /// Meaningful for dimension vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Floor footprint (x × z).
    #[inline]
    pub fn footprint_area(&self) -> f64 {
        self.x * self.z
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }

    /// Midpoint between the origin and this point.
    #[inline]
    pub fn center(&self) -> Self {
        *self * 0.5
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

/// Objects with a 3D extent.
pub trait Dimensional {
    /// Dimensions as (length, height, width) along (x, y, z).
    fn dimensions(&self) -> Vec3;

    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    fn footprint_area(&self) -> f64 {
        self.dimensions().footprint_area()
    }
}

/// Objects with a weight.
pub trait Weighted {
    fn weight(&self) -> f64;
}

/// Scalar validation shared by cargo items and vehicle profiles.
pub mod validation {
    /// Validates a strictly positive, finite measure.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a non-negative, finite weight.
    ///
    /// Zero is accepted: empty pallets and dunnage weigh next to nothing.
    pub fn validate_weight(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a finite coordinate (may be negative).
    pub fn validate_finite(value: f64, name: &str) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{} must be finite, got: {}", name, value));
        }
        Ok(())
    }
}

/// Accumulates weighted points for a 3D center of gravity.
#[derive(Clone, Debug, Default)]
pub struct CenterOfGravityCalculator {
    weighted_x: f64,
    weighted_y: f64,
    weighted_z: f64,
    total_weight: f64,
}

impl CenterOfGravityCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point carrying `weight`.
    pub fn add_point(&mut self, point: Vec3, weight: f64) {
        self.weighted_x += point.x * weight;
        self.weighted_y += point.y * weight;
        self.weighted_z += point.z * weight;
        self.total_weight += weight;
    }

    /// Total weight seen so far.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Computes the center of gravity.
    ///
    /// # Returns
    /// `Some(point)` when weight is present, `None` otherwise
    pub fn compute(&self) -> Option<Vec3> {
        if self.total_weight <= 0.0 {
            None
        } else {
            Some(Vec3::new(
                self.weighted_x / self.total_weight,
                self.weighted_y / self.total_weight,
                self.weighted_z / self.total_weight,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(Vec3::from((1.0, 2.0, 3.0)), a);
    }

    #[test]
    fn test_vec3_volume_and_footprint() {
        let dims = Vec3::new(10.0, 20.0, 30.0);
        assert!((dims.volume() - 6000.0).abs() < EPSILON_GENERAL);
        // footprint uses length (x) and width (z), never height
        assert!((dims.footprint_area() - 300.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_vec3_fits_within() {
        let small = Vec3::new(5.0, 5.0, 5.0);
        let large = Vec3::new(10.0, 10.0, 10.0);

        assert!(small.fits_within(&large, EPSILON_GENERAL));
        assert!(!large.fits_within(&small, EPSILON_GENERAL));
        assert!(large.fits_within(&large, EPSILON_GENERAL));
    }

    #[test]
    fn test_center_of_gravity_calculator() {
        let mut calc = CenterOfGravityCalculator::new();
        calc.add_point(Vec3::new(0.0, 0.0, 0.0), 10.0);
        calc.add_point(Vec3::new(10.0, 4.0, 2.0), 30.0);

        let center = calc.compute().unwrap();
        assert!((center.x - 7.5).abs() < EPSILON_GENERAL);
        assert!((center.y - 3.0).abs() < EPSILON_GENERAL);
        assert!((center.z - 1.5).abs() < EPSILON_GENERAL);
        assert!((calc.total_weight() - 40.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_center_of_gravity_without_weight() {
        let mut calc = CenterOfGravityCalculator::new();
        assert!(calc.compute().is_none());
        calc.add_point(Vec3::new(3.0, 3.0, 3.0), 0.0);
        assert!(calc.compute().is_none());
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::validate_dimension(10.0, "Length").is_ok());
        assert!(validation::validate_dimension(0.0, "Length").is_err());
        assert!(validation::validate_dimension(-1.0, "Length").is_err());
        assert!(validation::validate_dimension(f64::NAN, "Length").is_err());
        assert!(validation::validate_dimension(f64::INFINITY, "Length").is_err());
    }

    #[test]
    fn test_validation_weight() {
        assert!(validation::validate_weight(10.0, "Weight").is_ok());
        assert!(validation::validate_weight(0.0, "Weight").is_ok());
        assert!(validation::validate_weight(-1.0, "Weight").is_err());
        assert!(validation::validate_weight(f64::NAN, "Weight").is_err());
    }
}
