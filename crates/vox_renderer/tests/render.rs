//! End-to-end rendering through the public API.

use std::sync::atomic::AtomicBool;

use vox_core::Settings;
use vox_renderer::scenes::{cornell_box, cornell_settings, density_sphere_scene, density_sphere_settings};
use vox_renderer::{render, render_frame, render_pixel, Accumulator, Camera, RenderConfig, Sampler, Scene, Vec3};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn is_valid(p: Vec3) -> bool {
    p.is_finite() && p.min_element() >= 0.0
}

#[test]
fn cornell_centre_pixel_is_reproducible() {
    init();
    let (scene, camera) = cornell_box(64, 64);
    let settings = cornell_settings();

    let first = render_pixel(&scene, &camera, &settings, 32, 32, 64, &mut Sampler::new(7));
    let second = render_pixel(&scene, &camera, &settings, 32, 32, 64, &mut Sampler::new(7));
    assert_eq!(first, second);
    assert!(is_valid(first));
    assert!(first.max_element() > 0.0, "centre pixel is black");

    let other = render_pixel(&scene, &camera, &settings, 32, 32, 64, &mut Sampler::new(8));
    assert_ne!(first, other);
}

#[test]
fn cornell_centre_pixel_matches_converged_reference() {
    init();
    let (scene, camera) = cornell_box(64, 64);
    let settings = cornell_settings();

    // Per-path mean and variance of the centre pixel from an unrelated stream
    let paths = 4096;
    let mut sampler = Sampler::new(1000);
    let (mut sum, mut sum_sq) = (Vec3::ZERO, Vec3::ZERO);
    for _ in 0..paths {
        let p = render_pixel(&scene, &camera, &settings, 32, 32, 1, &mut sampler);
        sum += p;
        sum_sq += p * p;
    }
    let reference = sum / paths as f32;
    let variance = (sum_sq / paths as f32 - reference * reference).max(Vec3::ZERO);
    assert!(reference.min_element() > 0.0, "reference {reference:?}");

    let spp = 64.0;
    let estimate = render_pixel(&scene, &camera, &settings, 32, 32, 64, &mut Sampler::new(7)) / spp;
    let sigma = (variance / spp + variance / paths as f32).powf(0.5);
    let error = (estimate - reference).abs();
    for axis in 0..3 {
        assert!(
            error[axis] <= 4.0 * sigma[axis] + 1e-4,
            "seed 7 estimate {estimate:?} strays from reference {reference:?} (sigma {sigma:?})"
        );
    }
}

#[test]
fn cornell_frame_independent_of_thread_count() {
    init();
    let (scene, camera) = cornell_box(24, 16);
    let settings = cornell_settings();
    let config = RenderConfig {
        samples_per_pixel: 2,
        bucket_size: 8,
        seed: 3,
    };

    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| render(&scene, &camera, &settings, &config, 2))
    };
    let single = run(1);
    let parallel = run(4);

    assert_eq!(single.samples(), 4);
    assert_eq!(single.image(), parallel.image());
    assert!(single.image().into_iter().all(is_valid));
}

#[test]
fn cornell_walls_show_their_colour() {
    init();
    let (scene, camera) = cornell_box(32, 32);
    let settings = cornell_settings();
    let mut sampler = Sampler::new(11);

    // Pixels just inside the left and right walls, halfway up
    let left = render_pixel(&scene, &camera, &settings, 1, 12, 256, &mut sampler);
    let right = render_pixel(&scene, &camera, &settings, 30, 12, 256, &mut sampler);
    assert!(left.x > left.y, "left wall {left:?}");
    assert!(right.y > right.x, "right wall {right:?}");
}

#[test]
fn empty_scene_renders_background() {
    init();
    let settings = Settings {
        background: Vec3::new(0.2, 0.3, 0.4),
        ..Default::default()
    };
    let camera = Camera::new(5, 3);
    let config = RenderConfig {
        samples_per_pixel: 2,
        ..Default::default()
    };
    let image = render(&Scene::new(), &camera, &settings, &config, 1);
    assert!(image.image().iter().all(|&p| p == settings.background));
}

#[test]
fn density_sphere_renders_finite_radiance() {
    init();
    let settings = density_sphere_settings();
    let (scene, camera) = density_sphere_scene(16, &settings, 12, 12).unwrap();
    let image = render(&scene, &camera, &settings, &RenderConfig::default(), 2);

    let pixels = image.image();
    assert!(pixels.iter().copied().all(is_valid));
    // The sphere covers the centre and lets the background through at the corners
    assert_ne!(image.pixel(6, 6), settings.background);
    assert_eq!(image.pixel(0, 0), settings.background);
}

#[test]
fn progressive_frames_accumulate() {
    init();
    let (scene, camera) = cornell_box(8, 8);
    let settings = cornell_settings();
    let config = RenderConfig::default();
    let never = AtomicBool::new(false);

    let mut accumulator = Accumulator::new(8, 8);
    for frame in 0..3 {
        assert!(render_frame(&scene, &camera, &settings, &config, frame, &mut accumulator, &never));
    }
    assert_eq!(accumulator.samples(), 3);

    // Same frames from a fresh start give the same average
    let again = render(&scene, &camera, &settings, &config, 3);
    assert_eq!(accumulator.image(), again.image());
}
