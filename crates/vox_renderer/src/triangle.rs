//! Triangle primitive.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use vox_math::{BoundingBox, Ray, Vec3, EPSILON};

use crate::Sampler;

/// A single triangle with a cached geometric normal.
#[derive(Debug, Clone)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    /// Counter-clockwise face normal (unit length)
    pub normal: Vec3,
    pub material_id: usize,
}

/// Barycentric hit on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material_id: usize) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            v0,
            v1,
            v2,
            normal,
            material_id,
        }
    }

    /// Möller-Trumbore ray-triangle intersection.
    pub fn intersect(&self, ray: &Ray) -> Option<TriangleHit> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray.accepts(t) {
            return None;
        }

        Some(TriangleHit { t, u, v })
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v1 - self.v0).cross(self.v2 - self.v0).length()
    }

    /// Uniformly distributed point on the triangle.
    pub fn sample_point(&self, sampler: &mut Sampler) -> Vec3 {
        let su = sampler.next_float().sqrt();
        let b0 = 1.0 - su;
        let b1 = sampler.next_float() * su;
        self.v0 * b0 + self.v1 * b1 + self.v2 * (1.0 - b0 - b1)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.v0.min(self.v1).min(self.v2), self.v0.max(self.v1).max(self.v2))
    }
}
