//! Woodcock (delta) tracking through a medium.
//!
//! Both samplers work on a ray in the grid's local space and return the
//! ray parameter of the first real collision. Tentative collisions are
//! placed with exponential steps of the majorant extinction and accepted
//! with probability `extinction / majorant`, so the majorant must bound the
//! extinction everywhere it is used.

use vox_core::Settings;
use vox_math::Ray;

use crate::{Medium, OctreeNode, Sampler};

/// Delta tracking over the whole grid box with the global majorant.
pub fn woodcock(medium: &Medium, ray: &Ray, settings: &Settings, sampler: &mut Sampler) -> Option<f32> {
    let span = medium.grid().bounds().intersect(ray)?.clip(&ray.t);
    if span.is_empty() {
        return None;
    }
    track(medium, ray, span.min, span.max, settings.global_majorant(), settings, sampler)
}

/// Delta tracking through the bracket octree.
///
/// Nodes without enabled brackets are skipped entirely. Leaves are tracked
/// with either the global majorant or, with `tight_majorant`, the largest
/// extinction of the brackets present in the leaf.
pub fn woodcock_octree(
    medium: &Medium,
    ray: &Ray,
    settings: &Settings,
    sampler: &mut Sampler,
) -> Option<f32> {
    let octree = medium.octree();
    let span = octree.root().bbox.intersect(ray)?.clip(&ray.t);
    if span.is_empty() {
        return None;
    }

    let enabled = settings.enabled_brackets;
    let mut stack = vec![Frame {
        node: 0,
        cursor: span.min,
        far: span.max,
        visited: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let node = octree.node(frame.node);
        if frame.cursor >= frame.far || node.mask & enabled == 0 {
            stack.pop();
            continue;
        }

        if node.is_leaf {
            let (near, far) = (frame.cursor, frame.far);
            stack.pop();
            let majorant = leaf_majorant(medium, node, settings);
            if let Some(t) = track(medium, ray, near, far, majorant, settings, sampler) {
                return Some(t);
            }
            continue;
        }

        // Child occupied between the cursor and the next split plane
        let next = next_split(node, ray, frame.cursor, frame.far);
        let octant = node.bbox.octant_of(ray.at(0.5 * (frame.cursor + next)));
        let near = frame.cursor;
        frame.cursor = next;

        let bit = 1u8 << octant;
        if frame.visited & bit != 0 {
            continue;
        }
        frame.visited |= bit;

        stack.push(Frame {
            node: node.children[octant],
            cursor: near,
            far: next,
            visited: 0,
        });
    }
    None
}

/// Traversal state of one octree node.
struct Frame {
    node: u32,
    /// Start of the part of `[cursor, far]` not yet traversed
    cursor: f32,
    far: f32,
    /// Children already entered, one bit per octant
    visited: u8,
}

/// Smallest split-plane crossing after `cursor`, or `far`.
fn next_split(node: &OctreeNode, ray: &Ray, cursor: f32, far: f32) -> f32 {
    let t = (node.bbox.mid - ray.origin) / ray.direction;
    [t.x, t.y, t.z]
        .into_iter()
        .filter(|&t| t > cursor)
        .fold(far, f32::min)
}

fn leaf_majorant(medium: &Medium, node: &OctreeNode, settings: &Settings) -> f32 {
    if settings.tight_majorant {
        let mask = node.mask & settings.enabled_brackets;
        medium.brackets().max_opacity(mask) * settings.density_scale
    } else {
        settings.global_majorant()
    }
}

/// Delta tracking over `[near, far]` with a constant majorant.
fn track(
    medium: &Medium,
    ray: &Ray,
    near: f32,
    far: f32,
    majorant: f32,
    settings: &Settings,
    sampler: &mut Sampler,
) -> Option<f32> {
    if !(majorant > 0.0) || !majorant.is_finite() {
        return None;
    }

    let mut t = near;
    loop {
        t += sampler.next_exponential(majorant);
        if !(t <= far) {
            return None;
        }
        let extinction = medium.extinction(ray.at(t), settings);
        if sampler.next_float() * majorant < extinction {
            return Some(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::{TransferFunction, Volume, VolumeSampler};
    use vox_math::Vec3;

    /// Uniform 64^3 grid with extinction 0.4 * 0.5 = 0.2.
    fn uniform() -> (Volume, Settings) {
        let grid = Volume::from_fn(64, 64, 64, |_, _, _| 1.0).unwrap();
        let settings = Settings {
            transfer_function: TransferFunction::linear_ramp(0.0, 1.0, Vec3::ONE, 0.4),
            density_scale: 0.5,
            step_size_woodcock: 5.0,
            ..Default::default()
        };
        (grid, settings)
    }

    fn distances(medium: &Medium, settings: &Settings, seed: u64, n: usize) -> Vec<f32> {
        let mut sampler = Sampler::new(seed);
        let ray = Ray::new(Vec3::new(0.0, 32.0, 32.0), Vec3::X);
        (0..n)
            .filter_map(|_| match settings.volume_sampler {
                VolumeSampler::Woodcock => woodcock(medium, &ray, settings, &mut sampler),
                VolumeSampler::WoodcockOctree => woodcock_octree(medium, &ray, settings, &mut sampler),
            })
            .collect()
    }

    fn mean(values: &[f32]) -> f32 {
        values.iter().sum::<f32>() / values.len() as f32
    }

    #[test]
    fn test_uniform_medium_is_exponential() {
        let (grid, mut settings) = uniform();
        settings.volume_sampler = VolumeSampler::Woodcock;
        let medium = Medium::new(grid, Vec3::ZERO, &settings);

        let n = 20000;
        let d = distances(&medium, &settings, 1, n);
        assert!(d.len() >= n - 5);

        // Rate 0.2: mean free path 5, P(d < 5) = 1 - 1/e
        let m = mean(&d);
        assert!((m - 5.0).abs() < 0.15, "mean = {m}");
        let below = d.iter().filter(|&&t| t < 5.0).count() as f32 / n as f32;
        assert!((below - (1.0 - (-1.0f32).exp())).abs() < 0.015, "cdf(5) = {below}");
    }

    #[test]
    fn test_loose_majorant_is_unbiased() {
        let (grid, mut settings) = uniform();
        settings.step_size_woodcock = 1.0;
        settings.volume_sampler = VolumeSampler::Woodcock;
        let medium = Medium::new(grid, Vec3::ZERO, &settings);

        let m = mean(&distances(&medium, &settings, 2, 20000));
        assert!((m - 5.0).abs() < 0.15, "mean = {m}");
    }

    #[test]
    fn test_octree_matches_exponential() {
        let (grid, mut settings) = uniform();
        settings.volume_sampler = VolumeSampler::WoodcockOctree;
        for tight in [false, true] {
            settings.tight_majorant = tight;
            let medium = Medium::new(grid.clone(), Vec3::ZERO, &settings);
            let m = mean(&distances(&medium, &settings, 3, 20000));
            assert!((m - 5.0).abs() < 0.15, "tight = {tight}, mean = {m}");
        }
    }

    #[test]
    fn test_samplers_agree_on_heterogeneous_grid() {
        // Empty half followed by a dense half
        let grid = Volume::from_fn(64, 64, 64, |x, _, _| if x >= 32 { 1.0 } else { 0.0 }).unwrap();
        let mut settings = Settings {
            transfer_function: TransferFunction::linear_ramp(0.0, 1.0, Vec3::ONE, 0.2),
            step_size_woodcock: 4.0,
            brackets: vec![0.0, 0.5, 1.0],
            octree_levels: 4,
            ..Default::default()
        };
        let medium = Medium::new(grid, Vec3::ZERO, &settings);
        assert!(!medium.octree().root().is_leaf);

        settings.volume_sampler = VolumeSampler::Woodcock;
        let plain = distances(&medium, &settings, 4, 10000);
        settings.volume_sampler = VolumeSampler::WoodcockOctree;
        let octree = distances(&medium, &settings, 5, 10000);

        assert!(plain.iter().chain(&octree).all(|&t| t > 31.0));
        let (a, b) = (mean(&plain), mean(&octree));
        assert!((a - b).abs() < 0.3, "plain = {a}, octree = {b}");
        assert!((a - 37.0).abs() < 0.5, "plain = {a}");
    }

    #[test]
    fn test_transparent_medium_never_scatters() {
        let (grid, mut settings) = uniform();
        settings.transfer_function = TransferFunction::linear_ramp(0.0, 1.0, Vec3::ONE, 0.0);
        for sampler in [VolumeSampler::Woodcock, VolumeSampler::WoodcockOctree] {
            settings.volume_sampler = sampler;
            for tight in [false, true] {
                settings.tight_majorant = tight;
                let medium = Medium::new(grid.clone(), Vec3::ZERO, &settings);
                assert!(distances(&medium, &settings, 6, 200).is_empty());
            }
        }
    }

    #[test]
    fn test_disabled_brackets_are_skipped() {
        let (grid, mut settings) = uniform();
        settings.brackets = vec![0.0, 0.5, 2.0];
        settings.enabled_brackets = 0b01;
        for sampler in [VolumeSampler::Woodcock, VolumeSampler::WoodcockOctree] {
            settings.volume_sampler = sampler;
            let medium = Medium::new(grid.clone(), Vec3::ZERO, &settings);
            assert!(distances(&medium, &settings, 7, 200).is_empty());
        }
    }

    #[test]
    fn test_ray_range_limits_tracking() {
        let (grid, settings) = uniform();
        let medium = Medium::new(grid, Vec3::ZERO, &settings);
        let mut sampler = Sampler::new(8);

        // Misses the grid entirely
        let miss = Ray::new(Vec3::new(-1.0, 100.0, 0.0), Vec3::X);
        assert!(woodcock(&medium, &miss, &settings, &mut sampler).is_none());
        assert!(woodcock_octree(&medium, &miss, &settings, &mut sampler).is_none());

        // Segment ending before the grid
        let short = Ray::segment(Vec3::new(-10.0, 32.0, 32.0), Vec3::X, 0.0, 5.0);
        assert!(woodcock(&medium, &short, &settings, &mut sampler).is_none());
        assert!(woodcock_octree(&medium, &short, &settings, &mut sampler).is_none());

        // Starting inside: every collision lies ahead of the origin
        let inside = Ray::new(Vec3::splat(32.0), Vec3::new(1.0, 1.0, 0.0));
        for _ in 0..100 {
            if let Some(t) = woodcock_octree(&medium, &inside, &settings, &mut sampler) {
                assert!(t >= 0.0);
            }
        }
    }
}
