//! Participating medium placed in a scene.

use std::sync::Arc;

use vox_core::{BracketTable, Settings, Volume, VolumeSampler};
use vox_math::{BoundingBox, Ray, Vec3};

use crate::woodcock::{woodcock, woodcock_octree};
use crate::{Intersection, Octree, Sampler};

/// A density grid translated into world space, with the acceleration data
/// the free-flight samplers need.
///
/// The octree and bracket table depend on the transfer function, the
/// brackets and the octree depth of the settings it was built with; build a
/// new medium when those change.
#[derive(Debug, Clone)]
pub struct Medium {
    grid: Arc<Volume>,
    octree: Octree,
    brackets: BracketTable,
    /// World-space position of the grid origin
    position: Vec3,
}

impl Medium {
    pub fn new(grid: impl Into<Arc<Volume>>, position: Vec3, settings: &Settings) -> Self {
        let grid = grid.into();
        let brackets = settings.bracket_table();
        let octree = Octree::build(&grid, &brackets, settings.octree_levels);

        let peak = brackets.overall_max_opacity() * settings.density_scale;
        if !settings.tight_majorant && peak > settings.global_majorant() {
            log::warn!(
                "Woodcock majorant {:.3} is below the peak extinction {:.3}; \
                 lower step_size_woodcock to at most {:.3}",
                settings.global_majorant(),
                peak,
                1.0 / peak
            );
        }

        Self {
            grid,
            octree,
            brackets,
            position,
        }
    }

    pub fn grid(&self) -> &Volume {
        &self.grid
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn brackets(&self) -> &BracketTable {
        &self.brackets
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World-space bounds of the grid.
    pub fn bounding_box(&self) -> BoundingBox {
        self.grid.bounds().translate(self.position)
    }

    /// Field value at a world-space point.
    pub fn density(&self, p: Vec3) -> f32 {
        self.grid.sample(p - self.position)
    }

    /// Field gradient at a world-space point, pointing towards lower density.
    pub fn gradient(&self, p: Vec3, eps: f32) -> Vec3 {
        self.grid.gradient(p - self.position, eps)
    }

    /// Extinction at a local-space point; disabled brackets are transparent.
    pub fn extinction(&self, local: Vec3, settings: &Settings) -> f32 {
        let value = self.grid.sample(local);
        if settings.enabled_brackets != u32::MAX
            && self.brackets.mask_between(value, value) & settings.enabled_brackets == 0
        {
            return 0.0;
        }
        settings.transfer_function.opacity(value) * settings.density_scale
    }

    /// Sample a scattering event along a world-space ray.
    pub fn sample_free_flight(
        &self,
        ray: &Ray,
        settings: &Settings,
        sampler: &mut Sampler,
    ) -> Option<Intersection> {
        let local = ray.translated(-self.position);
        let t = match settings.volume_sampler {
            VolumeSampler::Woodcock => woodcock(self, &local, settings, sampler),
            VolumeSampler::WoodcockOctree => woodcock_octree(self, &local, settings, sampler),
        }?;
        Some(Intersection::volume(ray.at(t), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::TransferFunction;

    fn settings() -> Settings {
        Settings {
            transfer_function: TransferFunction::linear_ramp(0.0, 1.0, Vec3::ONE, 1.0),
            step_size_woodcock: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_world_space_lookup() {
        let grid = Volume::from_fn(4, 4, 4, |x, _, _| x as f32).unwrap();
        let medium = Medium::new(grid, Vec3::new(10.0, 0.0, 0.0), &settings());
        assert_eq!(medium.density(Vec3::new(11.5, 2.0, 2.0)), 1.0);
        assert_eq!(medium.bounding_box().min, Vec3::new(10.0, 0.0, 0.0));
        assert!(medium.gradient(Vec3::new(12.0, 2.0, 2.0), 0.5).x < 0.0);
    }

    #[test]
    fn test_disabled_bracket_is_transparent() {
        let grid = Volume::from_fn(4, 4, 4, |_, _, _| 0.8).unwrap();
        let mut settings = Settings {
            brackets: vec![0.0, 0.5, 1.0],
            ..settings()
        };
        let medium = Medium::new(grid, Vec3::ZERO, &settings);
        let p = Vec3::splat(2.0);
        assert!((medium.extinction(p, &settings) - 0.8).abs() < 1e-6);

        settings.enabled_brackets = 0b01;
        assert_eq!(medium.extinction(p, &settings), 0.0);
    }

    #[test]
    fn test_free_flight_hit_is_in_world_space() {
        let grid = Volume::from_fn(8, 8, 8, |_, _, _| 1.0).unwrap();
        let settings = settings();
        let medium = Medium::new(grid, Vec3::new(0.0, 0.0, 5.0), &settings);
        let mut sampler = Sampler::new(4);
        let ray = Ray::new(Vec3::new(4.0, 4.0, 0.0), Vec3::Z);
        let hit = medium.sample_free_flight(&ray, &settings, &mut sampler).unwrap();
        assert!(hit.is_volume());
        assert!(hit.distance >= 5.0 && hit.distance <= 13.0);
        assert!((hit.position - ray.at(hit.distance)).length() < 1e-5);
    }
}
