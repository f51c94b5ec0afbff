//! Vox Renderer - CPU path tracing through surfaces and volumes
//!
//! A Monte Carlo path tracer with next-event estimation and multiple
//! importance sampling. Scenes mix triangle meshes and spheres with a single
//! scalar-field participating medium, which is sampled by Woodcock delta
//! tracking, optionally accelerated by a bracket octree.

mod sampler;
mod intersection;
mod scatter_event;
mod texture;
mod sphere;
mod triangle;
mod mesh;
mod geometry;
mod object;
mod material;
mod light;
mod octree;
mod medium;
mod woodcock;
mod scene;
mod integrator;
mod camera;
mod bucket;
mod renderer;
pub mod scenes;

pub use sampler::Sampler;
pub use intersection::{IgnoreMask, Intersection, SurfaceType};
pub use scatter_event::{BsdfLobe, ScatterEvent};
pub use texture::Texture;
pub use sphere::Sphere;
pub use triangle::{Triangle, TriangleHit};
pub use mesh::Mesh;
pub use geometry::Geometry;
pub use object::Object;
pub use material::Material;
pub use light::{Light, LightSample};
pub use octree::{Octree, OctreeNode, NO_CHILD};
pub use medium::Medium;
pub use woodcock::{woodcock, woodcock_octree};
pub use scene::{Scene, SceneError};
pub use integrator::{
    power_heuristic, russian_roulette, sample_one_light, single_scatter, trace, TraceResult, SHADOW_EPSILON,
};
pub use camera::Camera;
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use renderer::{bucket_seed, render, render_frame, render_pixel, Accumulator, RenderConfig};

/// Re-export the math types used throughout the public API
pub use vox_math::{BoundingBox, Interval, Ray, Vec2, Vec3};
