//! Geometry placed in world space.

use std::sync::Arc;

use vox_math::{BoundingBox, Ray, Vec3};

use crate::{Geometry, IgnoreMask, Intersection, Sampler};

/// A translated instance of a shared geometry.
#[derive(Debug, Clone)]
pub struct Object {
    position: Vec3,
    geometry: Arc<Geometry>,
    /// World-space bounds
    bbox: BoundingBox,
}

impl Object {
    pub fn new(geometry: impl Into<Arc<Geometry>>, position: Vec3) -> Self {
        let geometry = geometry.into();
        let bbox = geometry.bounding_box().translate(position).padded(1e-4);
        Self {
            position,
            geometry,
            bbox,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Nearest world-space hit, culled against the bounding box first.
    pub fn intersect(&self, ray: &Ray, ignore: IgnoreMask) -> Option<Intersection> {
        self.bbox.intersect(ray)?;

        let local = ray.translated(-self.position);
        let mut hit = self.geometry.intersect(&local, ignore)?;
        hit.position += self.position;
        Some(hit)
    }

    /// World-space surface sample with its outward normal.
    pub fn sample_surface(&self, sampler: &mut Sampler) -> Option<(Vec3, Vec3)> {
        let (p, n) = self.geometry.sample_surface(sampler)?;
        Some((p + self.position, n))
    }

    pub fn area(&self) -> f32 {
        self.geometry.area()
    }
}
