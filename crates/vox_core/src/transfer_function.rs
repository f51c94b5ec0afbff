//! Transfer functions mapping scalar intensity to colour and opacity.
//!
//! A transfer function is a list of nodes sorted by intensity. Queries
//! interpolate linearly between the two nodes surrounding the intensity and
//! clamp to the end nodes outside the covered range.
//!
//! # File format
//!
//! ```text
//! # density scale, gradient factor, step size
//! 1.0
//! 2.5
//! 0.5
//! # intensity opacity r g b [material]
//! 0     0.0  0.0 0.0 0.0
//! 80    0.1  0.8 0.3 0.2
//! 255   0.9  1.0 1.0 1.0  2
//! ```
//!
//! `#` starts a comment that runs to the end of the line. The optional sixth
//! column is a material id for per-node material lookup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vox_math::{Vec3, Vec4};

use crate::Settings;

/// Errors that can occur while reading a transfer function file.
#[derive(Error, Debug)]
pub enum TransferFunctionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing leading parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid number at line {line}: {value}")]
    InvalidNumber { line: usize, value: String },

    #[error("Line {line} has {found} columns, expected at least 5")]
    TooFewColumns { line: usize, found: usize },

    #[error("Unexpected token at line {line}: {token}")]
    UnexpectedToken { line: usize, token: String },

    #[error("Transfer function has no nodes")]
    Empty,
}

pub type TransferFunctionResult<T> = Result<T, TransferFunctionError>;

/// A single control point of a transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfNode {
    pub intensity: f32,
    pub opacity: f32,
    pub colour: Vec3,
    /// Index into the scene's material list
    #[serde(default)]
    pub material: Option<usize>,
}

impl TfNode {
    pub fn new(intensity: f32, opacity: f32, colour: Vec3) -> Self {
        Self {
            intensity,
            opacity,
            colour,
            material: None,
        }
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }
}

/// Piecewise-linear intensity to (colour, opacity) mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TfNode>", into = "Vec<TfNode>")]
pub struct TransferFunction {
    nodes: Vec<TfNode>,
}

impl From<Vec<TfNode>> for TransferFunction {
    fn from(nodes: Vec<TfNode>) -> Self {
        Self::new(nodes)
    }
}

impl From<TransferFunction> for Vec<TfNode> {
    fn from(tf: TransferFunction) -> Self {
        tf.nodes
    }
}

impl TransferFunction {
    /// Create a transfer function; nodes are sorted by intensity.
    pub fn new(mut nodes: Vec<TfNode>) -> Self {
        nodes.sort_by(|a, b| a.intensity.total_cmp(&b.intensity));
        Self { nodes }
    }

    /// Two-node ramp from transparent black at `lo` to `colour`/`opacity` at `hi`.
    pub fn linear_ramp(lo: f32, hi: f32, colour: Vec3, opacity: f32) -> Self {
        Self::new(vec![
            TfNode::new(lo, 0.0, Vec3::ZERO),
            TfNode::new(hi, opacity, colour),
        ])
    }

    pub fn nodes(&self) -> &[TfNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Locate the segment around `intensity`.
    ///
    /// Returns `(lower, upper, fraction)`; outside the covered range both
    /// indices refer to the same end node.
    fn segment(&self, intensity: f32) -> Option<(usize, usize, f32)> {
        let last = self.nodes.len().checked_sub(1)?;
        let upper = self.nodes.partition_point(|n| n.intensity <= intensity);
        if upper == 0 {
            return Some((0, 0, 0.0));
        }
        if upper > last {
            return Some((last, last, 0.0));
        }
        let (lo, hi) = (&self.nodes[upper - 1], &self.nodes[upper]);
        let frac = (intensity - lo.intensity) / (hi.intensity - lo.intensity);
        Some((upper - 1, upper, frac))
    }

    /// Interpolated colour in `xyz` and opacity in `w`.
    pub fn evaluate(&self, intensity: f32) -> Vec4 {
        match self.segment(intensity) {
            Some((lo, hi, t)) => {
                let a = &self.nodes[lo];
                let b = &self.nodes[hi];
                a.colour.extend(a.opacity).lerp(b.colour.extend(b.opacity), t)
            }
            None => Vec4::ZERO,
        }
    }

    /// Interpolated opacity.
    pub fn opacity(&self, intensity: f32) -> f32 {
        self.evaluate(intensity).w
    }

    /// Stochastic nearest-node material lookup.
    ///
    /// `u` is a uniform variate in [0, 1); the upper node is chosen with
    /// probability equal to the interpolation fraction, so the expected
    /// material matches the linear blend.
    pub fn material_at(&self, intensity: f32, u: f32) -> Option<usize> {
        let (lo, hi, t) = self.segment(intensity)?;
        if u < t {
            self.nodes[hi].material
        } else {
            self.nodes[lo].material
        }
    }

    /// Largest opacity reached for intensities in `[lo, hi]`.
    pub fn max_opacity_in(&self, lo: f32, hi: f32) -> f32 {
        if self.nodes.is_empty() || hi < lo {
            return 0.0;
        }
        self.nodes
            .iter()
            .filter(|n| n.intensity > lo && n.intensity < hi)
            .map(|n| n.opacity)
            .fold(self.opacity(lo).max(self.opacity(hi)), f32::max)
    }
}

/// Contents of a transfer function file: leading scalars plus the node table.
#[derive(Debug, Clone)]
pub struct TransferFunctionFile {
    pub density_scale: f32,
    pub gradient_factor: f32,
    pub step_size: f32,
    pub function: TransferFunction,
}

impl TransferFunctionFile {
    /// Parse the text table format.
    pub fn parse(content: &str) -> TransferFunctionResult<Self> {
        const PARAMETERS: [&str; 3] = ["density scale", "gradient factor", "step size"];

        let mut scalars = Vec::with_capacity(PARAMETERS.len());
        let mut nodes = Vec::new();

        for (i, raw) in content.lines().enumerate() {
            let line = i + 1;
            let text = raw.split('#').next().unwrap_or("");
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            if scalars.len() < PARAMETERS.len() {
                for token in tokens {
                    if scalars.len() == PARAMETERS.len() {
                        return Err(TransferFunctionError::UnexpectedToken {
                            line,
                            token: token.to_string(),
                        });
                    }
                    scalars.push(parse_number::<f32>(token, line)?);
                }
                continue;
            }

            if tokens.len() < 5 {
                return Err(TransferFunctionError::TooFewColumns {
                    line,
                    found: tokens.len(),
                });
            }
            if let Some(extra) = tokens.get(6) {
                return Err(TransferFunctionError::UnexpectedToken {
                    line,
                    token: extra.to_string(),
                });
            }

            let mut node = TfNode::new(
                parse_number(tokens[0], line)?,
                parse_number(tokens[1], line)?,
                Vec3::new(
                    parse_number(tokens[2], line)?,
                    parse_number(tokens[3], line)?,
                    parse_number(tokens[4], line)?,
                ),
            );
            if let Some(material) = tokens.get(5) {
                node.material = Some(parse_number(material, line)?);
            }
            nodes.push(node);
        }

        if let Some(missing) = PARAMETERS.get(scalars.len()) {
            return Err(TransferFunctionError::MissingParameter(*missing));
        }
        if nodes.is_empty() {
            return Err(TransferFunctionError::Empty);
        }

        Ok(Self {
            density_scale: scalars[0],
            gradient_factor: scalars[1],
            step_size: scalars[2],
            function: TransferFunction::new(nodes),
        })
    }

    /// Read and parse a transfer function file.
    pub fn load(path: impl AsRef<Path>) -> TransferFunctionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file = Self::parse(&content)?;
        log::info!(
            "Loaded transfer function {} ({} nodes)",
            path.display(),
            file.function.nodes().len()
        );
        Ok(file)
    }

    /// Copy the scalars and the node table into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.density_scale = self.density_scale;
        settings.gradient_factor = self.gradient_factor;
        settings.step_size = self.step_size;
        settings.transfer_function = self.function.clone();
    }
}

fn parse_number<T: std::str::FromStr>(token: &str, line: usize) -> TransferFunctionResult<T> {
    token
        .parse::<T>()
        .map_err(|_| TransferFunctionError::InvalidNumber {
            line,
            value: token.to_string(),
        })
}
