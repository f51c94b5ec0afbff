//! Sphere primitive centred on its object's origin.

use std::f32::consts::PI;

use vox_math::{BoundingBox, Ray, Vec2, Vec3};

use crate::{Intersection, Sampler};

/// A sphere in object-local space.
#[derive(Debug, Clone)]
pub struct Sphere {
    radius: f32,
    material_id: usize,
}

impl Sphere {
    pub fn new(radius: f32, material_id: usize) -> Self {
        Self {
            radius: radius.max(0.0),
            material_id,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material_id(&self) -> usize {
        self.material_id
    }

    /// Spherical UV of a point on the unit sphere.
    fn uv(p: Vec3) -> Vec2 {
        // theta: angle down from +Y, phi: angle around Y from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    /// Nearest hit inside the ray's valid range.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let oc = -ray.origin;
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = h - sqrtd;
        if !ray.accepts(root) {
            root = h + sqrtd;
            if !ray.accepts(root) {
                return None;
            }
        }

        let position = ray.at(root);
        let normal = position / self.radius;
        Some(Intersection::surface(
            position,
            root,
            normal,
            self.material_id,
            Self::uv(normal),
        ))
    }

    /// Uniformly distributed point on the surface and its outward normal.
    pub fn sample_surface(&self, sampler: &mut Sampler) -> (Vec3, Vec3) {
        let z = 1.0 - 2.0 * sampler.next_float();
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * sampler.next_float();
        let normal = Vec3::new(r * phi.cos(), r * phi.sin(), z);
        (normal * self.radius, normal)
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(Vec3::splat(-self.radius), Vec3::splat(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = Sphere::new(1.0, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);

        let hit = sphere.intersect(&ray).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = Sphere::new(1.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let hit = sphere.intersect(&ray).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
        // Normal stays outward
        assert!(hit.normal.x > 0.99);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(0.5, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Y);
        assert!(sphere.intersect(&ray).is_none());

        // Behind the ray range
        let ray = Ray::segment(Vec3::new(0.0, 0.0, -3.0), Vec3::Z, 0.0, 1.0);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_grazing_ray_is_finite() {
        let sphere = Sphere::new(1.0, 0);
        let ray = Ray::new(Vec3::new(1.0, 0.0, -3.0), Vec3::Z);
        if let Some(hit) = sphere.intersect(&ray) {
            assert!(hit.position.is_finite());
            assert!(hit.normal.is_finite());
        }
    }

    #[test]
    fn test_surface_samples_lie_on_sphere() {
        let sphere = Sphere::new(2.0, 0);
        let mut sampler = Sampler::new(5);
        for _ in 0..100 {
            let (p, n) = sphere.sample_surface(&mut sampler);
            assert!((p.length() - 2.0).abs() < 1e-4);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }
}
