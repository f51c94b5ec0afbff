//! Unidirectional path tracer with next-event estimation.
//!
//! Each vertex adds emission from the surface it hit and one light sample;
//! the path then continues along a BSDF-sampled direction. Emission found
//! by BSDF sampling and light samples are combined with the power heuristic.
//! Both estimators see the light selection probability as part of the light
//! density, so their weights sum to one.

use vox_core::Settings;
use vox_math::{Ray, Vec3, EPSILON, RAY_EPSILON};

use crate::{BsdfLobe, IgnoreMask, Intersection, Material, Medium, Sampler, ScatterEvent, Scene, Texture};

/// Slack allowed when deciding whether a shadow ray reached its light.
pub const SHADOW_EPSILON: f32 = 1e-3;

/// Lowest shading factor of the single-scatter preview.
const PREVIEW_AMBIENT: f32 = 0.1;

/// Radiance carried by one camera path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub radiance: Vec3,
    /// Number of scattering events that continued the path
    pub bounces: u32,
}

/// Power heuristic (exponent 2) weight of a strategy with density `f`
/// against one with density `g`.
pub fn power_heuristic(f: f32, g: f32) -> f32 {
    if f.is_infinite() {
        return 1.0;
    }
    let (f2, g2) = (f * f, g * g);
    let sum = f2 + g2;
    if sum > 0.0 && sum.is_finite() {
        f2 / sum
    } else {
        0.0
    }
}

/// Randomly terminate a path, reweighting survivors.
///
/// Continues with probability `max(throughput)` clamped to 1 and returns the
/// compensated throughput, or `None` when the path is killed.
pub fn russian_roulette(throughput: Vec3, sampler: &mut Sampler) -> Option<Vec3> {
    let p = throughput.max_element().min(1.0);
    if !(p > 0.0) {
        return None;
    }
    if sampler.next_float() >= p {
        return None;
    }
    Some(throughput / p)
}

/// Previous path vertex, as needed to weight emission found by the BSDF sample.
#[derive(Debug, Clone, Copy)]
struct Vertex {
    position: Vec3,
    bsdf_pdf: f32,
    specular: bool,
    /// Light excluded from next-event estimation at this vertex
    excluded: Option<usize>,
    /// Probability of each remaining light being picked for NEE
    pick: f32,
}

/// Trace one path from `ray` and return the radiance it carries back.
pub fn trace(scene: &Scene, ray: &Ray, settings: &Settings, sampler: &mut Sampler) -> TraceResult {
    let mut radiance = Vec3::ZERO;
    let mut throughput = Vec3::ONE;
    let mut ray = *ray;
    let mut ior = 1.0;
    let mut previous: Option<Vertex> = None;
    let mut bounces = 0;

    for depth in 0..settings.max_depth {
        let Some(hit) = scene.closest_intersection(&ray, settings, sampler, IgnoreMask::NONE) else {
            radiance += throughput * settings.background;
            break;
        };

        let mut event = ScatterEvent::new(&hit, ray.direction, ior);
        let material = match &scene.medium {
            Some(medium) if hit.is_volume() => volume_material(scene, medium, &mut event, settings, sampler),
            _ => match scene.material(&hit) {
                Some(material) => *material,
                None => break,
            },
        };

        let hit_light = material.light();
        radiance += throughput * emission(scene, &hit, &event, hit_light, previous);

        if !material.is_transmissive() {
            event.face_forward();
        }

        let (direct, pick) = sample_one_light(scene, &material, &event, hit_light, settings, sampler);
        radiance += throughput * direct;

        if depth + 1 >= settings.max_depth {
            break;
        }

        material.sample(&mut event, sampler);
        let pdf = material.pdf(&event);
        if !(pdf > 0.0) || !pdf.is_finite() {
            break;
        }
        throughput *= material.evaluate(&event) / pdf;
        if !throughput.is_finite() || throughput == Vec3::ZERO {
            break;
        }
        bounces += 1;

        if event.sampled_lobe.intersects(BsdfLobe::TRANSMISSION) {
            ior = event.ior_o;
        }

        previous = Some(Vertex {
            position: event.position,
            bsdf_pdf: pdf,
            specular: material.is_specular(),
            excluded: hit_light,
            pick,
        });
        ray = Ray::new(event.safe_position(event.input_dir), event.input_dir).with_min_t(RAY_EPSILON);

        if depth + 1 >= settings.min_depth {
            match russian_roulette(throughput, sampler) {
                Some(t) => throughput = t,
                None => break,
            }
        }
    }

    let radiance = settings.normalization.apply(radiance, bounces, settings.min_depth);
    TraceResult {
        radiance: if radiance.is_finite() { radiance } else { Vec3::ZERO },
        bounces,
    }
}

/// Single-scatter preview of the medium.
///
/// Finds one scattering event along `ray` and shades it with the directional
/// light travelling along `settings.light_dir`: the transfer function colour
/// times the cosine against the gradient normal, or 0.1 when
/// the shadow ray scatters in the medium or the cosine is smaller. Surfaces
/// are not intersected. Rays that never scatter return the background.
pub fn single_scatter(scene: &Scene, ray: &Ray, settings: &Settings, sampler: &mut Sampler) -> Vec3 {
    let Some(medium) = &scene.medium else {
        return settings.background;
    };
    let Some(hit) = medium.sample_free_flight(ray, settings, sampler) else {
        return settings.background;
    };

    let gradient = medium.gradient(hit.position, settings.gradient_epsilon);
    let magnitude = gradient.length();
    let normal = if magnitude > EPSILON {
        gradient / magnitude
    } else {
        -ray.direction
    };
    let colour = settings.transfer_function.evaluate(medium.density(hit.position)).truncate();

    let to_light = -settings.light_dir.normalize_or_zero();
    let shadow = Ray::new(hit.position + normal * settings.step_size, to_light);
    let shade = if medium.sample_free_flight(&shadow, settings, sampler).is_none() {
        normal.dot(to_light).max(PREVIEW_AMBIENT)
    } else {
        PREVIEW_AMBIENT
    };

    let radiance = colour * shade;
    if radiance.is_finite() {
        radiance
    } else {
        Vec3::ZERO
    }
}

/// Emission of the hit surface towards the path, MIS-weighted against the
/// light sample taken at the previous vertex.
fn emission(
    scene: &Scene,
    hit: &Intersection,
    event: &ScatterEvent,
    hit_light: Option<usize>,
    previous: Option<Vertex>,
) -> Vec3 {
    let Some(index) = hit_light else {
        return Vec3::ZERO;
    };
    let Some(light) = scene.lights.get(index) else {
        return Vec3::ZERO;
    };
    let emitted = light.emittance(event);
    if emitted == Vec3::ZERO {
        return emitted;
    }

    let weight = match previous {
        // Camera rays and specular bounces cannot be matched by light sampling
        None => 1.0,
        Some(prev) if prev.specular => 1.0,
        Some(prev) => {
            let light_pdf = if prev.excluded == Some(index) {
                0.0
            } else {
                light.pdf(prev.position, hit.position, hit.normal, &scene.objects) * prev.pick
            };
            power_heuristic(prev.bsdf_pdf, light_pdf)
        }
    };
    emitted * weight
}

/// Next-event estimation with one uniformly chosen light.
///
/// The light just hit (if any) is never chosen. The estimate is multiplied
/// by the number of candidate lights. Returns the contribution and the
/// probability with which each candidate was picked, 0 when no light could
/// be sampled.
pub fn sample_one_light(
    scene: &Scene,
    material: &Material,
    event: &ScatterEvent,
    hit_light: Option<usize>,
    settings: &Settings,
    sampler: &mut Sampler,
) -> (Vec3, f32) {
    if material.is_specular() {
        return (Vec3::ZERO, 0.0);
    }
    let count = scene.lights.len();
    let excluded = hit_light.filter(|&i| i < count);
    let candidates = count - usize::from(excluded.is_some());
    if candidates == 0 {
        return (Vec3::ZERO, 0.0);
    }
    let pick = 1.0 / candidates as f32;

    let index = loop {
        let i = sampler.next_discrete(count);
        if Some(i) != excluded {
            break i;
        }
    };
    let light = &scene.lights[index];

    let sample = light.illuminate(event, &scene.objects, sampler);
    if !(sample.pdf > 0.0) || !sample.pdf.is_finite() {
        return (Vec3::ZERO, pick);
    }

    let mut shading = *event;
    shading.input_dir = sample.direction;
    let f = material.evaluate(&shading);
    if f == Vec3::ZERO {
        return (Vec3::ZERO, pick);
    }

    let scale = candidates as f32 / sample.pdf;
    if light.is_ambient() {
        return (f * sample.colour * scale, pick);
    }

    let shadow = Ray::new(event.safe_position(sample.direction), sample.direction).with_min_t(RAY_EPSILON);
    let visible = match scene.closest_intersection(&shadow, settings, sampler, IgnoreMask::NONE) {
        None => true,
        Some(blocker) => blocker.distance + SHADOW_EPSILON >= sample.distance,
    };
    if !visible {
        return (Vec3::ZERO, pick);
    }

    let weight = if light.is_delta() {
        1.0
    } else {
        power_heuristic(sample.pdf * pick, material.pdf(&shading))
    };
    (f * sample.colour * weight * scale, pick)
}

/// Material for a scattering event inside the medium.
///
/// The density gradient becomes the shading normal. Strong gradients relative
/// to the density favour a Lambert response nudged out along the normal,
/// weak ones an isotropic phase function; both take the transfer function
/// colour. With `node_materials`, a material attached to the transfer
/// function takes precedence.
fn volume_material(
    scene: &Scene,
    medium: &Medium,
    event: &mut ScatterEvent,
    settings: &Settings,
    sampler: &mut Sampler,
) -> Material {
    let value = medium.density(event.position);
    let gradient = medium.gradient(event.position, settings.gradient_epsilon);
    let magnitude = gradient.length();
    event.normal = if magnitude > EPSILON {
        gradient / magnitude
    } else {
        event.output_dir
    };

    if settings.node_materials {
        let node = settings.transfer_function.material_at(value, sampler.next_float());
        if let Some(material) = node.and_then(|id| scene.materials.get(id)) {
            return *material;
        }
    }

    let colour = settings.transfer_function.evaluate(value).truncate();
    let p_surface = if value > 0.0 {
        1.0 - (-settings.gradient_factor * magnitude / value).exp()
    } else if magnitude > EPSILON {
        1.0
    } else {
        0.0
    };

    if sampler.next_float() < p_surface {
        event.position += event.normal * settings.step_size;
        Material::Lambert {
            texture: Texture::Solid(colour),
            light: None,
        }
    } else {
        Material::isotropic(colour)
    }
}
