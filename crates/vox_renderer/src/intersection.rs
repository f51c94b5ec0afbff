//! Result of a ray-scene query.

use vox_math::{Vec2, Vec3};

/// Whether a hit came from a surface or from a volume scattering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceType {
    #[default]
    Surface,
    Volume,
}

/// A ray hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub position: Vec3,
    /// Ray parameter of the hit
    pub distance: f32,
    /// Outward geometric normal (unit length for surfaces, zero for volume hits)
    pub normal: Vec3,
    pub material_id: usize,
    pub uv: Vec2,
    pub surface_type: SurfaceType,
    /// Index of the hit object in the scene, set by the scene dispatcher
    pub object: Option<usize>,
}

impl Intersection {
    pub fn surface(position: Vec3, distance: f32, normal: Vec3, material_id: usize, uv: Vec2) -> Self {
        Self {
            position,
            distance,
            normal,
            material_id,
            uv,
            surface_type: SurfaceType::Surface,
            object: None,
        }
    }

    pub fn volume(position: Vec3, distance: f32) -> Self {
        Self {
            position,
            distance,
            normal: Vec3::ZERO,
            material_id: 0,
            uv: Vec2::ZERO,
            surface_type: SurfaceType::Volume,
            object: None,
        }
    }

    pub fn is_volume(&self) -> bool {
        self.surface_type == SurfaceType::Volume
    }
}

/// Set of material ids a query should skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IgnoreMask(u64);

impl IgnoreMask {
    /// Mask that ignores nothing.
    pub const NONE: IgnoreMask = IgnoreMask(0);

    pub fn with(self, material_id: usize) -> Self {
        if material_id < 64 {
            IgnoreMask(self.0 | (1 << material_id))
        } else {
            self
        }
    }

    #[inline]
    pub fn contains(self, material_id: usize) -> bool {
        material_id < 64 && self.0 & (1 << material_id) != 0
    }
}
