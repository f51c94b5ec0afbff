//! Shapes that can be placed in a scene.

use vox_math::{BoundingBox, Ray, Vec3};

use crate::{IgnoreMask, Intersection, Mesh, Sampler, Sphere, Triangle};

/// Immutable shape description in object-local space.
#[derive(Debug, Clone)]
pub enum Geometry {
    Sphere(Sphere),
    Mesh(Mesh),
}

impl Geometry {
    /// Nearest hit inside the ray's valid range, skipping ignored materials.
    pub fn intersect(&self, ray: &Ray, ignore: IgnoreMask) -> Option<Intersection> {
        match self {
            Geometry::Sphere(sphere) => {
                if ignore.contains(sphere.material_id()) {
                    None
                } else {
                    sphere.intersect(ray)
                }
            }
            Geometry::Mesh(mesh) => mesh.intersect(ray, |id| ignore.contains(id)),
        }
    }

    /// Point and outward normal drawn uniformly over the surface area.
    pub fn sample_surface(&self, sampler: &mut Sampler) -> Option<(Vec3, Vec3)> {
        match self {
            Geometry::Sphere(sphere) => Some(sphere.sample_surface(sampler)),
            Geometry::Mesh(mesh) => mesh.sample_surface(sampler),
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Geometry::Sphere(sphere) => sphere.area(),
            Geometry::Mesh(mesh) => mesh.area(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Sphere(sphere) => sphere.bounding_box(),
            Geometry::Mesh(mesh) => mesh.bounding_box(),
        }
    }

    /// Same shape with every material id replaced by `material_id`.
    pub fn with_material(self, material_id: usize) -> Self {
        match self {
            Geometry::Sphere(sphere) => Geometry::Sphere(Sphere::new(sphere.radius(), material_id)),
            Geometry::Mesh(mesh) => Geometry::Mesh(Mesh::new(
                mesh.triangles()
                    .iter()
                    .map(|t| Triangle::new(t.v0, t.v1, t.v2, material_id))
                    .collect(),
            )),
        }
    }

    /// Every material id referenced by this shape.
    pub fn material_ids(&self) -> Vec<usize> {
        match self {
            Geometry::Sphere(sphere) => vec![sphere.material_id()],
            Geometry::Mesh(mesh) => {
                let mut ids: Vec<usize> = mesh.triangles().iter().map(|t| t.material_id).collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        }
    }
}

impl From<Sphere> for Geometry {
    fn from(sphere: Sphere) -> Self {
        Geometry::Sphere(sphere)
    }
}

impl From<Mesh> for Geometry {
    fn from(mesh: Mesh) -> Self {
        Geometry::Mesh(mesh)
    }
}
