//! Light sources.
//!
//! Lights are sampled from a shading point by [`Light::illuminate`]. Object
//! lights reference an entry of the scene's object list by index; the
//! material of that object points back at the light so that paths hitting
//! the emitter can query its emittance.

use std::f32::consts::PI;

use vox_math::Vec3;

use crate::{Object, Sampler, ScatterEvent};

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Illuminates every point from its normal direction, without visibility.
    Ambient { colour: Vec3, intensity: f32 },
    /// Isotropic point emitter; `intensity` is its total power.
    Point {
        colour: Vec3,
        intensity: f32,
        position: Vec3,
    },
    /// Light arriving from infinitely far away, travelling along `direction`.
    Directional {
        colour: Vec3,
        intensity: f32,
        direction: Vec3,
    },
    /// Area light over the surface of a scene object.
    Object {
        colour: Vec3,
        intensity: f32,
        object: usize,
    },
}

/// Illumination arriving at a shading point from one light sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub colour: Vec3,
    /// Unit vector from the shading point towards the light
    pub direction: Vec3,
    /// Distance to the sampled point, infinite for directional lights
    pub distance: f32,
    /// Solid-angle density of the sample, 1 for delta lights; 0 means no
    /// contribution
    pub pdf: f32,
}

impl LightSample {
    fn none() -> Self {
        Self {
            colour: Vec3::ZERO,
            direction: Vec3::ZERO,
            distance: 0.0,
            pdf: 0.0,
        }
    }
}

impl Light {
    pub fn point(colour: Vec3, intensity: f32, position: Vec3) -> Self {
        Light::Point {
            colour,
            intensity,
            position,
        }
    }

    pub fn directional(colour: Vec3, intensity: f32, direction: Vec3) -> Self {
        Light::Directional {
            colour,
            intensity,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn radiance(&self) -> Vec3 {
        match *self {
            Light::Ambient { colour, intensity }
            | Light::Point { colour, intensity, .. }
            | Light::Directional { colour, intensity, .. }
            | Light::Object { colour, intensity, .. } => colour * intensity,
        }
    }

    /// True for lights that can only be reached by explicit sampling.
    pub fn is_delta(&self) -> bool {
        !matches!(self, Light::Object { .. })
    }

    /// True for lights that need no shadow ray.
    pub fn is_ambient(&self) -> bool {
        matches!(self, Light::Ambient { .. })
    }

    /// Sample the light as seen from `event`.
    pub fn illuminate(&self, event: &ScatterEvent, objects: &[Object], sampler: &mut Sampler) -> LightSample {
        match *self {
            Light::Ambient { .. } => LightSample {
                colour: self.radiance(),
                direction: event.normal,
                distance: 0.0,
                pdf: 1.0,
            },
            Light::Point { position, .. } => {
                let offset = position - event.position;
                let distance = offset.length();
                if distance <= 0.0 {
                    return LightSample::none();
                }
                LightSample {
                    colour: self.radiance() / (4.0 * PI * distance * distance),
                    direction: offset / distance,
                    distance,
                    pdf: 1.0,
                }
            }
            Light::Directional { direction, .. } => LightSample {
                colour: self.radiance(),
                direction: -direction,
                distance: f32::INFINITY,
                pdf: 1.0,
            },
            Light::Object { object, .. } => {
                let Some(object) = objects.get(object) else {
                    return LightSample::none();
                };
                let Some((point, normal)) = object.sample_surface(sampler) else {
                    return LightSample::none();
                };

                let offset = point - event.position;
                let distance = offset.length();
                if distance <= 0.0 {
                    return LightSample::none();
                }
                let direction = offset / distance;

                // Back faces of an emitter are dark
                let cos_light = normal.dot(-direction);
                if cos_light <= 0.0 {
                    return LightSample::none();
                }

                LightSample {
                    colour: self.radiance() * cos_light,
                    direction,
                    distance,
                    pdf: distance * distance / (object.area() * cos_light),
                }
            }
        }
    }

    /// Radiance leaving the emitter towards `event.output_dir`.
    ///
    /// `event.normal` must still be the outward geometric normal.
    pub fn emittance(&self, event: &ScatterEvent) -> Vec3 {
        self.radiance() * event.normal.dot(event.output_dir).max(0.0)
    }

    /// Solid-angle density with which [`Light::illuminate`] would have
    /// produced the point `hit` with outward normal `normal`, seen from `from`.
    pub fn pdf(&self, from: Vec3, hit: Vec3, normal: Vec3, objects: &[Object]) -> f32 {
        match *self {
            Light::Object { object, .. } => {
                let Some(object) = objects.get(object) else {
                    return 0.0;
                };
                let offset = hit - from;
                let distance_sq = offset.length_squared();
                let cos_light = normal.dot(-offset.normalize_or_zero());
                let area = object.area();
                if cos_light <= 0.0 || area <= 0.0 {
                    return 0.0;
                }
                distance_sq / (area * cos_light)
            }
            _ => 0.0,
        }
    }
}
