//! Scene description and the closest-hit dispatcher.

use thiserror::Error;
use vox_core::Settings;
use vox_math::{Ray, Vec3};

use crate::{Geometry, IgnoreMask, Intersection, Light, Material, Medium, Object, Sampler};

/// Dangling references between scene tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Object {object} uses material {material}, but only {count} materials exist")]
    MissingMaterial {
        object: usize,
        material: usize,
        count: usize,
    },

    #[error("Material {material} emits as light {light}, but only {count} lights exist")]
    MissingLight {
        material: usize,
        light: usize,
        count: usize,
    },

    #[error("Light {light} is attached to object {object}, but only {count} objects exist")]
    MissingObject {
        light: usize,
        object: usize,
        count: usize,
    },
}

/// Everything a path can interact with.
///
/// Objects refer to materials by index, emissive materials refer to lights
/// and object lights refer back to objects. The scene is read-only while
/// rendering and shared between worker threads.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub materials: Vec<Material>,
    pub lights: Vec<Light>,
    pub medium: Option<Medium>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Add `geometry` at `position` as an area light of the given radiance.
    ///
    /// Creates the light, its emissive Lambert material and the object, and
    /// returns the light index. The geometry's material ids are replaced.
    pub fn add_area_light(
        &mut self,
        geometry: Geometry,
        position: Vec3,
        colour: Vec3,
        intensity: f32,
        albedo: Vec3,
    ) -> usize {
        let object = self.objects.len();
        let light = self.add_light(Light::Object {
            colour,
            intensity,
            object,
        });
        let material = self.add_material(Material::emissive(albedo, light));
        self.add_object(Object::new(geometry.with_material(material), position));
        light
    }

    pub fn with_medium(mut self, medium: Medium) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Check that every cross-table index points at an existing entry.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (object, o) in self.objects.iter().enumerate() {
            if let Some(&material) = o
                .geometry()
                .material_ids()
                .iter()
                .find(|&&id| id >= self.materials.len())
            {
                return Err(SceneError::MissingMaterial {
                    object,
                    material,
                    count: self.materials.len(),
                });
            }
        }

        for (material, m) in self.materials.iter().enumerate() {
            if let Some(light) = m.light().filter(|&l| l >= self.lights.len()) {
                return Err(SceneError::MissingLight {
                    material,
                    light,
                    count: self.lights.len(),
                });
            }
        }

        for (light, l) in self.lights.iter().enumerate() {
            if let Light::Object { object, .. } = *l {
                if object >= self.objects.len() {
                    return Err(SceneError::MissingObject {
                        light,
                        object,
                        count: self.objects.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Nearest surface or volume hit along `ray`.
    ///
    /// Objects are scanned in order and a later hit only replaces the current
    /// one when it is strictly closer, so exact ties go to the first object.
    /// The medium, if any, then samples a free flight over the remaining
    /// range; being stochastic, repeated queries along the same ray may
    /// disagree about volume hits.
    pub fn closest_intersection(
        &self,
        ray: &Ray,
        settings: &Settings,
        sampler: &mut Sampler,
        ignore: IgnoreMask,
    ) -> Option<Intersection> {
        let mut ray = *ray;
        let mut closest: Option<Intersection> = None;

        for (index, object) in self.objects.iter().enumerate() {
            let Some(mut hit) = object.intersect(&ray, ignore) else {
                continue;
            };
            if closest.map_or(true, |c| hit.distance < c.distance) {
                hit.object = Some(index);
                ray.t.max = hit.distance;
                closest = Some(hit);
            }
        }

        if let Some(medium) = &self.medium {
            if let Some(hit) = medium.sample_free_flight(&ray, settings, sampler) {
                if closest.map_or(true, |c| hit.distance < c.distance) {
                    closest = Some(hit);
                }
            }
        }

        closest
    }

    /// Material at a surface hit; `None` for volume hits and dangling ids.
    pub fn material(&self, hit: &Intersection) -> Option<&Material> {
        if hit.is_volume() {
            return None;
        }
        self.materials.get(hit.material_id)
    }
}
