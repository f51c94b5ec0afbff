use crate::{Interval, Vec3};

/// A ray with an origin, a unit direction and a valid parameter range.
///
/// The direction is normalized on construction. Intersection routines only
/// report hits whose parameter lies inside `t`, which keeps secondary rays
/// from re-hitting their own surface and bounds shadow rays.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t: Interval,
}

impl Ray {
    /// Create a ray valid over `[0, inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            t: Interval::FORWARD,
        }
    }

    /// Create a ray valid over `[min_t, max_t]`.
    pub fn segment(origin: Vec3, direction: Vec3, min_t: f32, max_t: f32) -> Self {
        Self {
            t: Interval::new(min_t, max_t),
            ..Self::new(origin, direction)
        }
    }

    /// Same ray with a new lower bound.
    pub fn with_min_t(mut self, min_t: f32) -> Self {
        self.t.min = min_t;
        self
    }

    /// Same ray moved by `offset`; the direction and range are kept.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True if `t` lies inside the valid range.
    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        self.t.contains(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.at(5.0), Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn test_ray_segment_bounds() {
        let ray = Ray::segment(Vec3::ZERO, Vec3::X, 0.5, 2.0);
        assert!(!ray.accepts(0.25));
        assert!(ray.accepts(1.0));
        assert!(!ray.accepts(2.5));

        let moved = ray.with_min_t(1.5);
        assert!(!moved.accepts(1.0));
    }

    #[test]
    fn test_ray_translated() {
        let ray = Ray::segment(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 0.1, 4.0);
        let local = ray.translated(-Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(local.origin, Vec3::ZERO);
        assert_eq!(local.direction, ray.direction);
        assert_eq!(local.t, ray.t);
    }

    #[test]
    fn test_zero_direction_does_not_produce_nan() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert!(!ray.direction.is_nan());
    }
}
