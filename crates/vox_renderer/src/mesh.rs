//! Triangle mesh in object-local space.
//!
//! Meshes are intersected by testing every triangle; there is no spatial
//! index.

use vox_math::{BoundingBox, Ray, Vec2, Vec3};

use crate::{Intersection, Sampler, Triangle};

/// An ordered list of triangles.
#[derive(Debug, Clone)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    /// Running sum of triangle areas, used for area-proportional sampling
    cumulative_area: Vec<f32>,
    bbox: BoundingBox,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let cumulative_area = triangles
            .iter()
            .scan(0.0, |sum, tri| {
                *sum += tri.area();
                Some(*sum)
            })
            .collect();
        let bbox = BoundingBox::from_points(triangles.iter().flat_map(|t| [t.v0, t.v1, t.v2]))
            .unwrap_or_else(|| BoundingBox::new(Vec3::ZERO, Vec3::ZERO));

        Self {
            triangles,
            cumulative_area,
            bbox,
        }
    }

    /// Two-triangle quad `a b c d` (counter-clockwise when seen from the
    /// normal side).
    pub fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3, material_id: usize) -> Self {
        Self::new(vec![
            Triangle::new(a, b, c, material_id),
            Triangle::new(a, c, d, material_id),
        ])
    }

    /// Axis-aligned box with outward-facing triangles.
    pub fn cuboid(min: Vec3, max: Vec3, material_id: usize) -> Self {
        let corner = |i: usize| {
            Vec3::new(
                if i & 4 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 1 != 0 { max.z } else { min.z },
            )
        };
        // Faces listed counter-clockwise from outside
        const FACES: [[usize; 4]; 6] = [
            [0, 1, 3, 2], // -x
            [4, 6, 7, 5], // +x
            [0, 4, 5, 1], // -y
            [2, 3, 7, 6], // +y
            [0, 2, 6, 4], // -z
            [1, 5, 7, 3], // +z
        ];
        let triangles = FACES
            .iter()
            .flat_map(|f| {
                [
                    Triangle::new(corner(f[0]), corner(f[1]), corner(f[2]), material_id),
                    Triangle::new(corner(f[0]), corner(f[2]), corner(f[3]), material_id),
                ]
            })
            .collect();
        Self::new(triangles)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Nearest triangle hit inside the ray's valid range.
    pub fn intersect(&self, ray: &Ray, ignore: impl Fn(usize) -> bool) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;
        let mut ray = *ray;

        for tri in &self.triangles {
            if ignore(tri.material_id) {
                continue;
            }
            if let Some(hit) = tri.intersect(&ray) {
                // Only closer hits survive from here on
                ray.t.max = hit.t;
                best = Some(Intersection::surface(
                    ray.at(hit.t),
                    hit.t,
                    tri.normal,
                    tri.material_id,
                    Vec2::new(hit.u, hit.v),
                ));
            }
        }
        best
    }

    /// Point sampled uniformly over the whole mesh area, with its normal.
    pub fn sample_surface(&self, sampler: &mut Sampler) -> Option<(Vec3, Vec3)> {
        let total = self.area();
        if total <= 0.0 {
            return None;
        }
        let target = sampler.next_float() * total;
        let index = self
            .cumulative_area
            .partition_point(|&a| a <= target)
            .min(self.triangles.len() - 1);
        let tri = &self.triangles[index];
        Some((tri.sample_point(sampler), tri.normal))
    }

    pub fn area(&self) -> f32 {
        self.cumulative_area.last().copied().unwrap_or(0.0)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}
