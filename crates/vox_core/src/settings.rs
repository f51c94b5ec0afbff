//! Render settings shared by the integrator and the volume samplers.
//!
//! Settings are immutable for the duration of a render pass. They can be
//! built in code, deserialized from JSON (missing fields take their default
//! values) and partially overridden by a transfer function file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vox_math::Vec3;

use crate::TransferFunction;

/// Maximum number of density brackets (one bit each in a `u32` mask).
pub const MAX_BRACKETS: usize = 32;

/// Errors that can occur while loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("max_depth must be at least 1")]
    InvalidDepth,

    #[error("light_dir must be a non-zero, finite vector")]
    InvalidLightDirection,

    #[error("Bracket bounds must be ascending")]
    UnsortedBrackets,

    #[error("At most 32 brackets are supported, got {0}")]
    TooManyBrackets(usize),

    #[error("At least two bracket bounds are required")]
    TooFewBrackets,
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Free-flight sampler used for volume hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeSampler {
    /// Delta tracking over the whole volume box with the global majorant.
    Woodcock,
    /// Delta tracking through the bracket octree, skipping empty nodes.
    #[default]
    WoodcockOctree,
}

/// Estimator used for every camera ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Full path tracing through surfaces and the medium.
    #[default]
    PathTrace,
    /// Volume preview: one scattering event, shaded by a single
    /// directional light along `light_dir` with a shadow ray through the
    /// medium.
    SingleScatter,
}

/// Optional post-step applied to the radiance returned for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathNormalization {
    /// Return the path contribution as estimated.
    #[default]
    None,
    /// Divide by `1 + bounces`.
    BounceCount,
    /// Divide by the minimum path depth.
    MinDepth,
}

impl PathNormalization {
    pub fn apply(self, radiance: Vec3, bounces: u32, min_depth: u32) -> Vec3 {
        match self {
            PathNormalization::None => radiance,
            PathNormalization::BounceCount => radiance / (1 + bounces) as f32,
            PathNormalization::MinDepth => radiance / min_depth.max(1) as f32,
        }
    }
}

/// Parameters of a render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Distance a volume hit is nudged along its gradient normal
    pub step_size: f32,
    /// Central difference offset for volume gradients
    pub gradient_epsilon: f32,
    /// Mean free path of the global Woodcock majorant
    pub step_size_woodcock: f32,
    pub density_scale: f32,
    /// Controls how quickly strong gradients favour surface-like shading
    pub gradient_factor: f32,

    /// Segments traced before Russian roulette may terminate a path
    pub min_depth: u32,
    pub max_depth: u32,
    pub background: Vec3,

    pub transfer_function: TransferFunction,
    /// Ascending bracket bounds; bracket `i` covers `[brackets[i], brackets[i + 1])`
    pub brackets: Vec<f32>,
    /// Brackets considered during octree traversal
    pub enabled_brackets: u32,
    pub octree_levels: u32,

    pub volume_sampler: VolumeSampler,
    /// Use the per-node bracket majorant instead of the global one
    pub tight_majorant: bool,
    /// Use the transfer function's per-node materials for volume hits
    pub node_materials: bool,
    pub normalization: PathNormalization,

    pub render_mode: RenderMode,
    /// Direction the single-scatter light travels in
    pub light_dir: Vec3,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_size: 0.5,
            gradient_epsilon: 0.5,
            step_size_woodcock: 0.5,
            density_scale: 1.0,
            gradient_factor: 1.0,
            min_depth: 3,
            max_depth: 8,
            background: Vec3::ZERO,
            transfer_function: TransferFunction::default(),
            brackets: vec![-f32::MAX, f32::MAX],
            enabled_brackets: u32::MAX,
            octree_levels: 4,
            volume_sampler: VolumeSampler::default(),
            tight_majorant: false,
            node_materials: false,
            normalization: PathNormalization::default(),
            render_mode: RenderMode::default(),
            light_dir: Vec3::new(-1.0, -1.0, -1.0),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let settings = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        for (name, value) in [
            ("step_size", self.step_size),
            ("gradient_epsilon", self.gradient_epsilon),
            ("step_size_woodcock", self.step_size_woodcock),
        ] {
            if !(value > 0.0) {
                return Err(SettingsError::NonPositive { name, value });
            }
        }
        for (name, value) in [
            ("density_scale", self.density_scale),
            ("gradient_factor", self.gradient_factor),
        ] {
            if !(value >= 0.0) {
                return Err(SettingsError::Negative { name, value });
            }
        }
        if self.max_depth == 0 {
            return Err(SettingsError::InvalidDepth);
        }
        if !self.light_dir.is_finite() || self.light_dir.length_squared() == 0.0 {
            return Err(SettingsError::InvalidLightDirection);
        }
        if self.brackets.len() < 2 {
            return Err(SettingsError::TooFewBrackets);
        }
        if self.brackets.len() - 1 > MAX_BRACKETS {
            return Err(SettingsError::TooManyBrackets(self.brackets.len() - 1));
        }
        if self.brackets.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(SettingsError::UnsortedBrackets);
        }
        Ok(())
    }

    /// Extinction bound of the global Woodcock majorant.
    pub fn global_majorant(&self) -> f32 {
        1.0 / self.step_size_woodcock
    }

    /// Precompute the per-bracket opacity bounds for the current transfer function.
    pub fn bracket_table(&self) -> BracketTable {
        BracketTable::new(self.brackets.clone(), &self.transfer_function)
    }
}

/// Bracket bounds plus the largest transfer function opacity inside each bracket.
#[derive(Debug, Clone)]
pub struct BracketTable {
    bounds: Vec<f32>,
    max_opacity: Vec<f32>,
}

impl BracketTable {
    pub fn new(bounds: Vec<f32>, tf: &TransferFunction) -> Self {
        let max_opacity = bounds
            .windows(2)
            .take(MAX_BRACKETS)
            .map(|w| tf.max_opacity_in(w[0], w[1]))
            .collect();
        Self { bounds, max_opacity }
    }

    pub fn len(&self) -> usize {
        self.max_opacity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_opacity.is_empty()
    }

    /// Index of the bracket containing `value`, if any.
    pub fn bracket_of(&self, value: f32) -> Option<usize> {
        let upper = self.bounds.partition_point(|&b| b <= value);
        if upper == 0 || upper >= self.bounds.len() {
            // The last bound closes the final bracket
            return (self.bounds.last() == Some(&value) && !self.is_empty())
                .then(|| self.len() - 1);
        }
        Some(upper - 1)
    }

    /// Mask of every bracket overlapping `[lo, hi]`.
    ///
    /// Values between the extremes are covered too, matching what trilinear
    /// interpolation between voxels can produce.
    pub fn mask_between(&self, lo: f32, hi: f32) -> u32 {
        let clamp = |v: f32| -> usize {
            self.bounds
                .partition_point(|&b| b <= v)
                .saturating_sub(1)
                .min(self.len().saturating_sub(1))
        };
        if self.is_empty() || hi < lo {
            return 0;
        }
        let (first, last) = (clamp(lo), clamp(hi));
        (first..=last).fold(0, |mask, i| mask | (1 << i))
    }

    /// Largest opacity over the brackets set in `mask`.
    pub fn max_opacity(&self, mask: u32) -> f32 {
        self.max_opacity
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &o)| o)
            .fold(0.0, f32::max)
    }

    pub fn overall_max_opacity(&self) -> f32 {
        self.max_opacity(u32::MAX)
    }
}
