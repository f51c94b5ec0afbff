//! BSDF library.
//!
//! Materials are stateless: every operation is a function of the
//! [`ScatterEvent`] alone. `sample` writes the new `input_dir` and the lobe it
//! was drawn from; `evaluate` and `pdf` read the current direction pair.
//!
//! Delta lobes (mirror and specular dielectric) follow the convention
//! `pdf = 1` with `evaluate` returning the reflectance directly, so
//! `evaluate / pdf` is the path throughput factor in both cases.

use std::f32::consts::{FRAC_1_PI, PI};

use vox_math::{tangent_frame, Vec3};

use crate::{BsdfLobe, Sampler, ScatterEvent, Texture};

/// Surface or phase-function response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Ideal diffuse reflector, optionally coupled to an area light.
    Lambert {
        texture: Texture,
        light: Option<usize>,
    },
    /// Perfect specular reflector.
    Mirror { texture: Texture },
    /// Smooth glass: Fresnel-weighted specular reflection or refraction.
    SpecularDielectric { texture: Texture, ior: f32 },
    /// Rough translucent surface: Fresnel-weighted diffuse reflection or
    /// diffuse transmission.
    DiffuseDielectric { texture: Texture, ior: f32 },
    /// Uniform phase function for participating media.
    Isotropic { texture: Texture },
    /// Normalized Phong lobe around the mirror direction.
    Glossy { texture: Texture, exponent: f32 },
    /// Lambert plus glossy lobe, picked proportionally to their luminance.
    Phong {
        diffuse: Texture,
        specular: Vec3,
        exponent: f32,
    },
}

impl Material {
    pub fn lambert(colour: Vec3) -> Self {
        Material::Lambert {
            texture: Texture::Solid(colour),
            light: None,
        }
    }

    /// Lambertian surface that is also the emitter of light `light`.
    pub fn emissive(colour: Vec3, light: usize) -> Self {
        Material::Lambert {
            texture: Texture::Solid(colour),
            light: Some(light),
        }
    }

    pub fn mirror(colour: Vec3) -> Self {
        Material::Mirror {
            texture: Texture::Solid(colour),
        }
    }

    pub fn glass(ior: f32) -> Self {
        Material::SpecularDielectric {
            texture: Texture::Solid(Vec3::ONE),
            ior,
        }
    }

    pub fn isotropic(colour: Vec3) -> Self {
        Material::Isotropic {
            texture: Texture::Solid(colour),
        }
    }

    /// BSDF value for the current direction pair, cosine included.
    pub fn evaluate(&self, event: &ScatterEvent) -> Vec3 {
        match *self {
            Material::Lambert { texture, .. } => {
                texture.evaluate(event.uv) * event.cos_input().max(0.0) * FRAC_1_PI
            }
            Material::Mirror { texture } | Material::SpecularDielectric { texture, .. } => {
                texture.evaluate(event.uv)
            }
            Material::DiffuseDielectric { texture, ior } => {
                let split = Interface::new(event, ior).split(event.input_dir);
                texture.evaluate(event.uv) * split * event.cos_input().abs() * FRAC_1_PI
            }
            Material::Isotropic { texture } => texture.evaluate(event.uv) / (4.0 * PI),
            Material::Glossy { texture, exponent } => {
                texture.evaluate(event.uv) * glossy_value(event, exponent)
            }
            Material::Phong {
                diffuse,
                specular,
                exponent,
            } => {
                diffuse.evaluate(event.uv) * event.cos_input().max(0.0) * FRAC_1_PI
                    + specular * glossy_value(event, exponent)
            }
        }
    }

    /// Draw a new `input_dir` and record the lobe used.
    pub fn sample(&self, event: &mut ScatterEvent, sampler: &mut Sampler) {
        match *self {
            Material::Lambert { .. } => {
                event.input_dir = cosine_hemisphere(event.normal, sampler);
                event.sampled_lobe = BsdfLobe::DIFFUSE;
            }
            Material::Mirror { .. } => {
                event.input_dir = reflect(event.output_dir, event.normal);
                event.sampled_lobe = BsdfLobe::SPECULAR_REFLECTION;
            }
            Material::SpecularDielectric { ior, .. } => {
                let interface = Interface::new(event, ior);
                if sampler.next_float() < interface.fresnel {
                    event.input_dir = reflect(event.output_dir, interface.normal);
                    event.sampled_lobe = BsdfLobe::SPECULAR_REFLECTION;
                    event.ior_o = event.ior_i;
                } else {
                    event.input_dir = refract(
                        event.output_dir,
                        interface.normal,
                        interface.cos_o,
                        interface.eta,
                        interface.sin2_t,
                    );
                    event.sampled_lobe = BsdfLobe::SPECULAR_TRANSMISSION;
                    event.ior_o = interface.ior_t;
                }
            }
            Material::DiffuseDielectric { ior, .. } => {
                let interface = Interface::new(event, ior);
                if sampler.next_float() < interface.fresnel {
                    event.input_dir = cosine_hemisphere(interface.normal, sampler);
                    event.sampled_lobe = BsdfLobe::DIFFUSE;
                    event.ior_o = event.ior_i;
                } else {
                    event.input_dir = cosine_hemisphere(-interface.normal, sampler);
                    event.sampled_lobe = BsdfLobe::DIFFUSE_TRANSMISSION;
                    event.ior_o = interface.ior_t;
                }
            }
            Material::Isotropic { .. } => {
                event.input_dir = uniform_sphere(sampler);
                event.sampled_lobe = BsdfLobe::DIFFUSE;
            }
            Material::Glossy { exponent, .. } => {
                event.input_dir = sample_lobe(event, exponent, sampler);
                event.sampled_lobe = BsdfLobe::DIFFUSE;
            }
            Material::Phong {
                diffuse,
                specular,
                exponent,
            } => {
                if sampler.next_float() < diffuse_weight(diffuse.evaluate(event.uv), specular) {
                    event.input_dir = cosine_hemisphere(event.normal, sampler);
                } else {
                    event.input_dir = sample_lobe(event, exponent, sampler);
                }
                event.sampled_lobe = BsdfLobe::DIFFUSE;
            }
        }
    }

    /// Density of the current `input_dir` under `sample`, in solid angle.
    pub fn pdf(&self, event: &ScatterEvent) -> f32 {
        match *self {
            Material::Lambert { .. } => event.cos_input().max(0.0) * FRAC_1_PI,
            Material::Mirror { .. } | Material::SpecularDielectric { .. } => 1.0,
            Material::DiffuseDielectric { ior, .. } => {
                let split = Interface::new(event, ior).split(event.input_dir);
                split * event.cos_input().abs() * FRAC_1_PI
            }
            Material::Isotropic { .. } => 1.0 / (4.0 * PI),
            Material::Glossy { exponent, .. } => lobe_pdf(event, exponent),
            Material::Phong {
                diffuse,
                specular,
                exponent,
            } => {
                let w = diffuse_weight(diffuse.evaluate(event.uv), specular);
                w * event.cos_input().max(0.0) * FRAC_1_PI + (1.0 - w) * lobe_pdf(event, exponent)
            }
        }
    }

    pub fn lobes(&self) -> BsdfLobe {
        match self {
            Material::Lambert { .. }
            | Material::Isotropic { .. }
            | Material::Glossy { .. }
            | Material::Phong { .. } => BsdfLobe::DIFFUSE,
            Material::Mirror { .. } => BsdfLobe::SPECULAR_REFLECTION,
            Material::SpecularDielectric { .. } => BsdfLobe::SPECULAR,
            Material::DiffuseDielectric { .. } => BsdfLobe::DIFFUSE | BsdfLobe::DIFFUSE_TRANSMISSION,
        }
    }

    /// True when every supported lobe is a delta distribution.
    pub fn is_specular(&self) -> bool {
        BsdfLobe::SPECULAR.contains(self.lobes())
    }

    /// True when paths may pass through to the other side of the surface.
    pub fn is_transmissive(&self) -> bool {
        self.lobes().intersects(BsdfLobe::TRANSMISSION)
    }

    /// Index of the light this material emits as, if any.
    pub fn light(&self) -> Option<usize> {
        match self {
            Material::Lambert { light, .. } => *light,
            _ => None,
        }
    }
}

/// Geometry of a dielectric interface as seen from `output_dir`.
struct Interface {
    /// Normal on the side of `output_dir`
    normal: Vec3,
    cos_o: f32,
    /// Refractive index on the transmitted side
    ior_t: f32,
    eta: f32,
    sin2_t: f32,
    fresnel: f32,
}

impl Interface {
    fn new(event: &ScatterEvent, ior: f32) -> Self {
        let mut normal = event.normal;
        let mut cos_o = event.output_dir.dot(normal);
        let mut ior_t = ior;

        // Leaving the medium
        if cos_o < 0.0 {
            normal = -normal;
            cos_o = -cos_o;
            ior_t = 1.0;
        }

        let eta = event.ior_i / ior_t;
        let sin2_t = sin2_theta_t(cos_o, eta);
        let fresnel = fresnel(event.ior_i, ior_t, cos_o, sin2_t);

        Self {
            normal,
            cos_o,
            ior_t,
            eta,
            sin2_t,
            fresnel,
        }
    }

    /// Probability of the lobe `dir` belongs to.
    fn split(&self, dir: Vec3) -> f32 {
        if dir.dot(self.normal) >= 0.0 {
            self.fresnel
        } else {
            1.0 - self.fresnel
        }
    }
}

/// `sin^2` of the transmitted angle by Snell's law.
#[inline]
pub fn sin2_theta_t(cos_i: f32, eta: f32) -> f32 {
    eta * eta * (1.0 - cos_i * cos_i).max(0.0)
}

/// Unpolarized Fresnel reflectance of a dielectric interface.
///
/// Returns 1 under total internal reflection (`sin2_t > 1`).
pub fn fresnel(ior_i: f32, ior_o: f32, cos_i: f32, sin2_t: f32) -> f32 {
    if sin2_t > 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let cos_i = cos_i.abs();

    let r_perp = (ior_i * cos_i - ior_o * cos_t) / (ior_i * cos_i + ior_o * cos_t);
    let r_par = (ior_o * cos_i - ior_i * cos_t) / (ior_o * cos_i + ior_i * cos_t);
    let r = 0.5 * (r_perp * r_perp + r_par * r_par);
    if r.is_finite() {
        r.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Mirror `v` about `n`; both point away from the surface.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    n * 2.0 * n.dot(v) - v
}

/// Refract `v` (pointing away from the surface, on the side of `n`).
#[inline]
pub fn refract(v: Vec3, n: Vec3, cos_v: f32, eta: f32, sin2_t: f32) -> Vec3 {
    n * (eta * cos_v - (1.0 - sin2_t).max(0.0).sqrt()) - v * eta
}

/// Cosine-weighted direction around `n` (pdf `cos / pi`).
pub fn cosine_hemisphere(n: Vec3, sampler: &mut Sampler) -> Vec3 {
    let u1 = sampler.next_float();
    let u2 = sampler.next_float();
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;

    let (tangent, bitangent) = tangent_frame(n);
    tangent * (r * phi.cos()) + bitangent * (r * phi.sin()) + n * (1.0 - u1).max(0.0).sqrt()
}

/// Uniform direction on the unit sphere (pdf `1 / 4pi`).
pub fn uniform_sphere(sampler: &mut Sampler) -> Vec3 {
    let z = 1.0 - 2.0 * sampler.next_float();
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * sampler.next_float();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// `cos^n` of the angle between `input_dir` and the mirror direction.
fn lobe_cos_pow(event: &ScatterEvent, exponent: f32) -> f32 {
    let mirror = reflect(event.output_dir, event.normal);
    mirror.dot(event.input_dir).max(0.0).powf(exponent)
}

fn glossy_value(event: &ScatterEvent, exponent: f32) -> f32 {
    let cos_i = event.cos_input();
    if cos_i <= 0.0 {
        return 0.0;
    }
    (exponent + 2.0) / (2.0 * PI) * lobe_cos_pow(event, exponent) * cos_i
}

fn lobe_pdf(event: &ScatterEvent, exponent: f32) -> f32 {
    (exponent + 1.0) / (2.0 * PI) * lobe_cos_pow(event, exponent)
}

/// Direction drawn from the `cos^n` lobe around the mirror direction.
fn sample_lobe(event: &ScatterEvent, exponent: f32, sampler: &mut Sampler) -> Vec3 {
    let mirror = reflect(event.output_dir, event.normal);
    let cos_a = sampler.next_float().powf(1.0 / (exponent + 1.0));
    let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
    let phi = 2.0 * PI * sampler.next_float();

    let (tangent, bitangent) = tangent_frame(mirror);
    tangent * (sin_a * phi.cos()) + bitangent * (sin_a * phi.sin()) + mirror * cos_a
}

fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

/// Probability of picking the diffuse lobe of a Phong blend.
fn diffuse_weight(kd: Vec3, ks: Vec3) -> f32 {
    let d = luminance(kd);
    let s = luminance(ks);
    if d + s <= 0.0 {
        1.0
    } else {
        d / (d + s)
    }
}
