//! Progressive bucket renderer.
//!
//! A frame traces a fixed number of paths through every pixel, buckets in
//! parallel, and adds them to an [`Accumulator`] that keeps running sums
//! across frames. Frames are reproducible: bucket `i` of frame `f` always
//! uses the sampler seeded from `(seed, f, i)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use vox_core::{RenderMode, Settings};
use vox_math::{Vec2, Vec3};

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::{single_scatter, trace, Camera, Sampler, Scene};

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Paths traced per pixel in every frame
    pub samples_per_pixel: u32,
    pub bucket_size: u32,
    /// Base seed of every bucket sampler
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            bucket_size: DEFAULT_BUCKET_SIZE,
            seed: 0,
        }
    }
}

/// Radiance sums over every committed frame.
#[derive(Debug, Clone)]
pub struct Accumulator {
    width: u32,
    height: u32,
    sums: Vec<Vec3>,
    /// Paths per pixel accumulated so far
    samples: u32,
}

impl Accumulator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sums: vec![Vec3::ZERO; (width * height) as usize],
            samples: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Discard everything accumulated so far, e.g. after the camera moved.
    pub fn reset(&mut self) {
        self.sums.fill(Vec3::ZERO);
        self.samples = 0;
    }

    /// Average radiance of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        if self.samples == 0 {
            return Vec3::ZERO;
        }
        self.sums[(y * self.width + x) as usize] / self.samples as f32
    }

    /// Average radiance of every pixel in row-major order.
    pub fn image(&self) -> Vec<Vec3> {
        let scale = if self.samples == 0 {
            0.0
        } else {
            1.0 / self.samples as f32
        };
        self.sums.iter().map(|&s| s * scale).collect()
    }

    /// Add a completed frame of `samples` paths per pixel.
    fn commit(&mut self, results: &[BucketResult], samples: u32) {
        for result in results {
            let bucket = &result.bucket;
            for (i, &sum) in result.pixels.iter().enumerate() {
                let x = bucket.x + i as u32 % bucket.width;
                let y = bucket.y + i as u32 / bucket.width;
                self.sums[(y * self.width + x) as usize] += sum;
            }
        }
        self.samples += samples;
    }
}

/// Sum of `samples` jittered paths through pixel `(x, y)`, each estimated
/// with the settings' render mode.
pub fn render_pixel(
    scene: &Scene,
    camera: &Camera,
    settings: &Settings,
    x: u32,
    y: u32,
    samples: u32,
    sampler: &mut Sampler,
) -> Vec3 {
    let mut sum = Vec3::ZERO;
    for _ in 0..samples {
        let jitter = Vec2::new(sampler.next_float(), sampler.next_float());
        let ray = camera.get_ray(x, y, jitter);
        sum += match settings.render_mode {
            RenderMode::PathTrace => trace(scene, &ray, settings, sampler).radiance,
            RenderMode::SingleScatter => single_scatter(scene, &ray, settings, sampler),
        };
    }
    sum
}

/// Seed of the sampler used for one bucket of one frame.
pub fn bucket_seed(seed: u64, frame: u32, bucket: usize) -> u64 {
    seed ^ (u64::from(frame) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (bucket as u64 + 1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// Render one frame into `accumulator`.
///
/// Buckets are rendered in parallel. `cancel` is checked before each bucket
/// starts; a cancelled frame is dropped without touching the accumulator and
/// `false` is returned. An accumulator whose size does not match the camera
/// is reset to the camera's resolution first.
pub fn render_frame(
    scene: &Scene,
    camera: &Camera,
    settings: &Settings,
    config: &RenderConfig,
    frame: u32,
    accumulator: &mut Accumulator,
    cancel: &AtomicBool,
) -> bool {
    if accumulator.width != camera.width || accumulator.height != camera.height {
        log::warn!(
            "Accumulator is {}x{} but the camera renders {}x{}; resetting",
            accumulator.width,
            accumulator.height,
            camera.width,
            camera.height
        );
        *accumulator = Accumulator::new(camera.width, camera.height);
    }

    let start = Instant::now();
    let buckets = generate_buckets(camera.width, camera.height, config.bucket_size);

    let results: Option<Vec<BucketResult>> = buckets
        .par_iter()
        .map(|bucket| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let mut sampler = Sampler::new(bucket_seed(config.seed, frame, bucket.index));
            let pixels = render_bucket(bucket, scene, camera, settings, config.samples_per_pixel, &mut sampler);
            Some(BucketResult::new(*bucket, pixels))
        })
        .collect();

    let results = match results {
        Some(results) if !cancel.load(Ordering::Relaxed) => results,
        _ => {
            log::debug!("Frame {} cancelled after {:?}", frame, start.elapsed());
            return false;
        }
    };

    accumulator.commit(&results, config.samples_per_pixel);
    log::debug!(
        "Frame {}: {} buckets, {} spp total, {:?}",
        frame,
        results.len(),
        accumulator.samples,
        start.elapsed()
    );
    true
}

/// Render `frames` frames into a fresh accumulator.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    settings: &Settings,
    config: &RenderConfig,
    frames: u32,
) -> Accumulator {
    let start = Instant::now();
    let never = AtomicBool::new(false);
    let mut accumulator = Accumulator::new(camera.width, camera.height);
    for frame in 0..frames {
        render_frame(scene, camera, settings, config, frame, &mut accumulator, &never);
    }
    log::info!(
        "Rendered {}x{} at {} spp in {:?}",
        camera.width,
        camera.height,
        accumulator.samples,
        start.elapsed()
    );
    accumulator
}
