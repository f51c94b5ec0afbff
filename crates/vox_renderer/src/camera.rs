//! Pinhole camera for ray generation.

use vox_math::{Quat, Ray, Vec2, Vec3};

/// Pinhole camera.
///
/// With zero yaw and pitch the camera looks down -Z with +Y up. The focal
/// length is measured in pixels, so the horizontal field of view is
/// `2 * atan(width / (2 * focal_length))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation about +Y in radians
    pub yaw: f32,
    /// Rotation above the horizon in radians
    pub pitch: f32,
    pub width: u32,
    pub height: u32,
    pub focal_length: f32,
}

impl Camera {
    /// Camera at the origin with a 90 degree horizontal field of view.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            width,
            height,
            focal_length: width as f32 / 2.0,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    pub fn with_focal_length(mut self, focal_length: f32) -> Self {
        self.focal_length = focal_length;
        self
    }

    /// Turn the camera to face `target`.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        let dir = (target - self.position).normalize_or_zero();
        if dir != Vec3::ZERO {
            self.yaw = (-dir.x).atan2(-dir.z);
            self.pitch = dir.y.clamp(-1.0, 1.0).asin();
        }
        self
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Ray through pixel `(x, y)`, row 0 at the top of the image.
    ///
    /// `jitter` is the sample position inside the pixel in `[0, 1)^2`;
    /// `(0.5, 0.5)` is the pixel centre.
    pub fn get_ray(&self, x: u32, y: u32, jitter: Vec2) -> Ray {
        let px = x as f32 + jitter.x - self.width as f32 / 2.0;
        let py = self.height as f32 / 2.0 - (y as f32 + jitter.y);
        let dir = self.orientation() * Vec3::new(px, py, -self.focal_length);
        Ray::new(self.position, dir)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const CENTRE: Vec2 = Vec2::new(0.5, 0.5);

    #[test]
    fn test_centre_ray_looks_forward() {
        let camera = Camera::new(100, 100).with_position(Vec3::new(1.0, 2.0, 3.0));
        let ray = camera.get_ray(50, 50, Vec2::ZERO);
        assert_eq!(ray.origin, Vec3::new(1.0, 2.0, 3.0));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_image_axes() {
        let camera = Camera::new(100, 100);
        // Top-left pixel points up and to the left
        let ray = camera.get_ray(0, 0, CENTRE);
        assert!(ray.direction.x < 0.0 && ray.direction.y > 0.0);

        // Half the width at focal length width/2 is 45 degrees
        let edge = camera.get_ray(100, 50, Vec2::new(0.0, 0.0));
        assert!((edge.direction.x - edge.direction.z.abs()).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_and_pitch() {
        let camera = Camera::new(10, 10).with_rotation(FRAC_PI_2, 0.0);
        assert!((camera.forward() - Vec3::NEG_X).length() < 1e-5);

        let camera = Camera::new(10, 10).with_rotation(0.0, FRAC_PI_2);
        assert!((camera.forward() - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_looking_at() {
        let target = Vec3::new(3.0, 1.0, -2.0);
        let camera = Camera::new(10, 10)
            .with_position(Vec3::new(0.0, 1.0, 4.0))
            .looking_at(target);
        let expected = (target - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-5);
    }
}
