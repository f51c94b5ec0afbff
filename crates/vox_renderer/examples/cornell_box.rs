//! Cornell box example.
//!
//! Renders the Cornell box progressively and logs per-frame statistics.
//! Set `RUST_LOG=debug` for bucket-level timings.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::Result;
use vox_renderer::scenes::{cornell_box, cornell_settings};
use vox_renderer::{render_frame, Accumulator, RenderConfig, Vec3};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (scene, camera) = cornell_box(256, 256);
    scene.validate()?;
    let settings = cornell_settings();
    settings.validate()?;
    log::info!(
        "Scene: {} objects, {} materials, {} lights",
        scene.objects.len(),
        scene.materials.len(),
        scene.lights.len()
    );

    let config = RenderConfig {
        samples_per_pixel: 4,
        seed: 1,
        ..Default::default()
    };
    let frames = 8;

    let start = Instant::now();
    let never = AtomicBool::new(false);
    let mut accumulator = Accumulator::new(camera.width, camera.height);
    for frame in 0..frames {
        render_frame(&scene, &camera, &settings, &config, frame, &mut accumulator, &never);

        let image = accumulator.image();
        let mean = image.iter().copied().sum::<Vec3>() / image.len() as f32;
        log::info!(
            "Frame {}: {} spp, mean radiance ({:.4}, {:.4}, {:.4})",
            frame,
            accumulator.samples(),
            mean.x,
            mean.y,
            mean.z
        );
    }

    let centre = accumulator.pixel(camera.width / 2, camera.height / 2);
    log::info!("Centre pixel: {:?}", centre);
    log::info!("Rendered {} frames in {:?}", frames, start.elapsed());

    Ok(())
}
