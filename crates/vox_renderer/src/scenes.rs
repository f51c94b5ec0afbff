//! Canonical test scenes.

use vox_core::{Settings, TransferFunction, Volume, VolumeResult};
use vox_math::Vec3;

use crate::{Camera, Geometry, Light, Material, Medium, Mesh, Object, Scene, Sphere, Triangle};

/// Two triangles of the quad `a b c d`, counter-clockwise seen from the front.
fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3, material: usize) -> [Triangle; 2] {
    [Triangle::new(a, b, c, material), Triangle::new(a, c, d, material)]
}

/// Cornell box spanning `[-1, 1]^3`, open towards +Z.
///
/// Red wall on the left, green on the right, a tall blue block, a short
/// white block, a mirror sphere and a square area light just below the
/// ceiling. The camera sits in front of the opening and sees exactly the
/// box front.
pub fn cornell_box(width: u32, height: u32) -> (Scene, Camera) {
    let mut scene = Scene::new();

    let red = scene.add_material(Material::lambert(Vec3::new(0.75, 0.15, 0.15)));
    let green = scene.add_material(Material::lambert(Vec3::new(0.15, 0.75, 0.15)));
    let white = scene.add_material(Material::lambert(Vec3::splat(0.75)));
    let blue = scene.add_material(Material::lambert(Vec3::new(0.15, 0.15, 0.75)));
    let mirror = scene.add_material(Material::mirror(Vec3::splat(0.9)));

    let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let mut walls = Vec::with_capacity(10);
    // Floor, ceiling and back wall
    walls.extend(quad(p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0), white));
    walls.extend(quad(p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0), white));
    walls.extend(quad(p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0), white));
    // Left and right
    walls.extend(quad(p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0), p(-1.0, -1.0, 1.0), red));
    walls.extend(quad(p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), green));
    scene.add_object(Object::new(Geometry::from(Mesh::new(walls)), Vec3::ZERO));

    let tall = Mesh::cuboid(p(-0.65, -1.0, -0.6), p(-0.05, 0.2, 0.0), blue);
    scene.add_object(Object::new(Geometry::from(tall), Vec3::ZERO));
    let short = Mesh::cuboid(p(0.1, -1.0, -0.7), p(0.7, -0.4, -0.1), white);
    scene.add_object(Object::new(Geometry::from(short), Vec3::ZERO));
    scene.add_object(Object::new(Geometry::from(Sphere::new(0.3, mirror)), p(0.4, -0.7, 0.45)));

    // Facing down from just under the ceiling
    let s = 0.25;
    let light = Mesh::quad(p(-s, 0.0, -s), p(s, 0.0, -s), p(s, 0.0, s), p(-s, 0.0, s), 0);
    scene.add_area_light(Geometry::from(light), p(0.0, 0.99, 0.0), Vec3::ONE, 8.0, Vec3::splat(0.78));

    // Half-width 1 at distance 2 from the opening
    let camera = Camera::new(width, height)
        .with_position(p(0.0, 0.0, 3.0))
        .with_focal_length(width as f32);

    (scene, camera)
}

/// Settings matching [`cornell_box`].
pub fn cornell_settings() -> Settings {
    Settings {
        min_depth: 3,
        max_depth: 8,
        ..Default::default()
    }
}

/// Cubic grid holding a sphere whose density falls off linearly from 1 at
/// the centre to 0 at the surface.
pub fn density_sphere(size: usize) -> VolumeResult<Volume> {
    let centre = Vec3::splat(size as f32 / 2.0);
    let radius = size as f32 / 2.0;
    Volume::from_fn(size, size, size, |x, y, z| {
        let p = Vec3::new(x as f32, y as f32, z as f32) + 0.5;
        (1.0 - p.distance(centre) / radius).max(0.0)
    })
}

/// Settings for [`density_sphere_scene`].
pub fn density_sphere_settings() -> Settings {
    Settings {
        transfer_function: TransferFunction::linear_ramp(0.0, 1.0, Vec3::new(0.9, 0.7, 0.5), 1.0),
        density_scale: 0.5,
        step_size_woodcock: 1.0,
        gradient_factor: 2.0,
        brackets: vec![0.0, 0.25, 0.5, 0.75, 1.0],
        octree_levels: 4,
        min_depth: 2,
        max_depth: 6,
        background: Vec3::splat(0.05),
        ..Default::default()
    }
}

/// Density sphere centred on the origin, lit by a key light and a dim
/// ambient term, seen from +Z.
pub fn density_sphere_scene(size: usize, settings: &Settings, width: u32, height: u32) -> VolumeResult<(Scene, Camera)> {
    let grid = density_sphere(size)?;
    let offset = Vec3::splat(-(size as f32) / 2.0);
    let mut scene = Scene::new().with_medium(Medium::new(grid, offset, settings));

    scene.add_light(Light::directional(Vec3::ONE, 2.0, Vec3::new(-1.0, -1.0, -1.0)));
    scene.add_light(Light::Ambient {
        colour: Vec3::new(0.4, 0.5, 0.7),
        intensity: 0.2,
    });

    let distance = size as f32 * 2.0;
    let camera = Camera::new(width, height)
        .with_position(Vec3::new(0.0, 0.0, distance))
        .with_focal_length(width as f32 * 1.5);

    Ok((scene, camera))
}
