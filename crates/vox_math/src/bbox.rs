use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box with a cached midpoint.
///
/// Used for culling objects, for the volume's outer bounds and for octree
/// nodes. Boxes are built once and then treated as immutable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
    pub mid: Vec3,
}

impl BoundingBox {
    /// Create a box from its two corners (in any order).
    pub fn new(a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            min,
            max,
            mid: (min + max) * 0.5,
        }
    }

    /// Smallest box containing all `points`; `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::new(min, max))
    }

    /// Grow every face outwards by `delta`.
    pub fn padded(&self, delta: f32) -> Self {
        Self::new(self.min - Vec3::splat(delta), self.max + Vec3::splat(delta))
    }

    /// Translate (move) the box by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Index (0..8) of the octant containing `p`, as `x << 2 | y << 1 | z`
    /// where each bit is set when `p` is on the upper side of the midpoint.
    pub fn octant_of(&self, p: Vec3) -> usize {
        let side = p.cmpge(self.mid);
        ((side.test(0) as usize) << 2) | ((side.test(1) as usize) << 1) | (side.test(2) as usize)
    }

    /// Child box for an octant index produced by [`BoundingBox::octant_of`].
    pub fn octant(&self, index: usize) -> BoundingBox {
        let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
            if index & bit != 0 {
                (mid, hi)
            } else {
                (lo, mid)
            }
        };
        let (x0, x1) = pick(4, self.min.x, self.mid.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, self.mid.y, self.max.y);
        let (z0, z1) = pick(1, self.min.z, self.mid.z, self.max.z);
        BoundingBox::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }

    /// Slab test against a ray.
    ///
    /// Returns the `[near, far]` parameters where the ray's line crosses the
    /// box, or `None` when it misses or the crossing lies entirely outside
    /// the ray's valid range. The returned interval is not clipped to the
    /// ray range, so a ray starting inside the box reports `near <= 0`.
    pub fn intersect(&self, ray: &Ray) -> Option<Interval> {
        let inv_dir = ray.direction.recip();
        let d_min = self.min - ray.origin;
        let d_max = self.max - ray.origin;

        // inf * 0 would give NaN: an origin lying exactly on a slab plane is
        // treated as touching it at t = 0.
        let bottom = Vec3::select(d_min.cmpeq(Vec3::ZERO), Vec3::ZERO, d_min * inv_dir);
        let top = Vec3::select(d_max.cmpeq(Vec3::ZERO), Vec3::ZERO, d_max * inv_dir);

        let near = top.min(bottom).max_element();
        let far = top.max(bottom).min_element();

        if far < near || far < ray.t.min || near > ray.t.max {
            return None;
        }

        Some(Interval::new(near, far))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_bbox_corners_and_mid() {
        let bb = BoundingBox::new(Vec3::new(10.0, 0.0, 4.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(bb.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max, Vec3::new(10.0, 10.0, 4.0));
        assert_eq!(bb.mid, Vec3::new(5.0, 5.0, 2.0));
    }

    #[test]
    fn test_bbox_from_points() {
        let bb = BoundingBox::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(0.0, 0.0, -4.0),
        ])
        .unwrap();
        assert_eq!(bb.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(bb.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_bbox_hit_and_miss() {
        let bb = unit_box();

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = bb.intersect(&ray).unwrap();
        assert!((hit.min - 4.0).abs() < 1e-5);
        assert!((hit.max - 6.0).abs() < 1e-5);

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Z);
        assert!(bb.intersect(&ray).is_none());

        // Parallel and outside
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(bb.intersect(&ray).is_none());
    }

    #[test]
    fn test_bbox_origin_inside_reports_straddling_interval() {
        let bb = unit_box();
        let directions = [
            Vec3::X,
            Vec3::NEG_Y,
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-0.3, 0.2, -0.9),
        ];
        let origins = [Vec3::ZERO, Vec3::new(0.5, -0.9, 0.1), Vec3::new(-0.99, 0.99, 0.0)];

        for origin in origins {
            for direction in directions {
                let ray = Ray::segment(origin, direction, 1e-4, f32::INFINITY);
                let hit = bb.intersect(&ray).expect("ray starting inside must hit");
                assert!(hit.min <= 0.0, "near = {}", hit.min);
                assert!(hit.max >= 0.0, "far = {}", hit.max);
            }
        }
    }

    #[test]
    fn test_bbox_respects_ray_range() {
        let bb = unit_box();
        let ray = Ray::segment(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0, 3.0);
        assert!(bb.intersect(&ray).is_none());
    }

    #[test]
    fn test_bbox_origin_on_face_plane() {
        let bb = unit_box();
        // Origin on the x = 1 plane, travelling along that plane
        let ray = Ray::new(Vec3::new(1.0, 0.0, -3.0), Vec3::Z);
        let result = bb.intersect(&ray);
        assert!(result.map_or(true, |hit| !hit.min.is_nan() && !hit.max.is_nan()));
    }

    #[test]
    fn test_bbox_octants() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(bb.octant_of(Vec3::new(0.5, 0.5, 0.5)), 0);
        assert_eq!(bb.octant_of(Vec3::new(1.5, 0.5, 0.5)), 4);
        assert_eq!(bb.octant_of(Vec3::new(0.5, 1.5, 1.5)), 3);

        for i in 0..8 {
            let child = bb.octant(i);
            assert_eq!(bb.octant_of(child.mid), i);
            assert_eq!(child.size(), Vec3::ONE);
        }
    }

    #[test]
    fn test_bbox_translate() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::ONE).translate(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(bb.min.x, 5.0);
        assert_eq!(bb.max.x, 6.0);
        assert_eq!(bb.min.y, 0.0);
    }
}
