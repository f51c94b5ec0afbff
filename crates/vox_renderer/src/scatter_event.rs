//! Working state threaded through BSDF evaluation and sampling.

use bitflags::bitflags;
use vox_math::{Vec2, Vec3, RAY_EPSILON};

use crate::{Intersection, SurfaceType};

bitflags! {
    /// BSDF lobes a material supports or a sample was drawn from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BsdfLobe: u8 {
        const DIFFUSE = 1 << 0;
        const SPECULAR_REFLECTION = 1 << 1;
        const SPECULAR_TRANSMISSION = 1 << 2;
        const DIFFUSE_TRANSMISSION = 1 << 3;
        const SPECULAR = Self::SPECULAR_REFLECTION.bits() | Self::SPECULAR_TRANSMISSION.bits();
        /// Lobes that carry the path across the interface
        const TRANSMISSION = Self::SPECULAR_TRANSMISSION.bits() | Self::DIFFUSE_TRANSMISSION.bits();
    }
}

/// Surface interaction at a path vertex.
///
/// Directions follow the transport convention: `output_dir` points back
/// towards the previous vertex (the viewer), `input_dir` is the sampled
/// direction the path continues in. Both are unit vectors pointing away
/// from the surface.
#[derive(Debug, Clone, Copy)]
pub struct ScatterEvent {
    pub position: Vec3,
    /// Shading normal; may be flipped to face `output_dir`
    pub normal: Vec3,
    pub uv: Vec2,
    pub output_dir: Vec3,
    pub input_dir: Vec3,
    /// Refractive index on the incident side
    pub ior_i: f32,
    /// Refractive index on the far side, updated by transmissive sampling
    pub ior_o: f32,
    pub surface_type: SurfaceType,
    pub sampled_lobe: BsdfLobe,
}

impl ScatterEvent {
    /// Event for a hit reached by a ray travelling along `ray_dir`.
    pub fn new(hit: &Intersection, ray_dir: Vec3, ior: f32) -> Self {
        Self {
            position: hit.position,
            normal: hit.normal,
            uv: hit.uv,
            output_dir: -ray_dir,
            input_dir: Vec3::ZERO,
            ior_i: ior,
            ior_o: ior,
            surface_type: hit.surface_type,
            sampled_lobe: BsdfLobe::empty(),
        }
    }

    /// Flip the normal onto the side of `output_dir`.
    pub fn face_forward(&mut self) {
        if self.normal.dot(self.output_dir) < 0.0 {
            self.normal = -self.normal;
        }
    }

    /// Position nudged off the surface on the side `dir` points to, used as
    /// the origin of every ray leaving this event.
    pub fn safe_position(&self, dir: Vec3) -> Vec3 {
        let n = self.normal;
        if n.dot(dir) >= 0.0 {
            self.position + n * RAY_EPSILON
        } else {
            self.position - n * RAY_EPSILON
        }
    }

    /// Cosine between the shading normal and the sampled direction.
    #[inline]
    pub fn cos_input(&self) -> f32 {
        self.normal.dot(self.input_dir)
    }
}
