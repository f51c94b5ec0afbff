//! Math primitives shared by the vox crates.
//!
//! Re-exports glam and adds the ray-tracing specific types: parametric
//! intervals, rays with a valid parameter range, and axis-aligned boxes.

// Re-export glam for convenience
pub use glam::*;

mod bbox;
mod interval;
mod ray;

pub use bbox::BoundingBox;
pub use interval::Interval;
pub use ray::Ray;

/// Generic epsilon for geometric comparisons (determinants, lengths).
pub const EPSILON: f32 = 1e-6;

/// Minimum ray parameter used when spawning secondary rays.
pub const RAY_EPSILON: f32 = 1e-4;

/// Builds an orthonormal tangent frame `(tangent, bitangent)` around a unit normal.
#[inline]
pub fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let tangent = if n.x.abs() > n.y.abs() {
        Vec3::new(n.z, 0.0, -n.x) / (n.x * n.x + n.z * n.z).sqrt()
    } else {
        Vec3::new(0.0, -n.z, n.y) / (n.y * n.y + n.z * n.z).sqrt()
    };
    (tangent, n.cross(tangent))
}
