//! Dense scalar volume grid.
//!
//! Voxel `(x, y, z)` covers the unit cube `[x, x+1] x [y, y+1] x [z, z+1]` in
//! volume-local space, with its sample located at the cube centre. Sampling
//! positions outside the grid clamps to the nearest edge voxel.

use std::path::Path;

use thiserror::Error;
use vox_math::{BoundingBox, Vec3};

/// Errors that can occur while building or loading a volume.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Volume dimensions must be non-zero, got {0}x{1}x{2}")]
    EmptyDimensions(usize, usize, usize),

    #[error("Expected {expected} voxels for the given dimensions, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

pub type VolumeResult<T> = Result<T, VolumeError>;

/// Element type of a headerless raw volume file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    U8,
    /// Little-endian unsigned 16 bit
    U16Le,
    /// Little-endian 32 bit float
    F32Le,
}

impl RawFormat {
    fn bytes_per_voxel(self) -> usize {
        match self {
            RawFormat::U8 => 1,
            RawFormat::U16Le => 2,
            RawFormat::F32Le => 4,
        }
    }
}

/// A dense 3D scalar field.
#[derive(Debug, Clone)]
pub struct Volume {
    width: usize,
    height: usize,
    depth: usize,
    /// Voxels in x-major order: index = (x * height + y) * depth + z
    data: Vec<f32>,
}

impl Volume {
    /// Create a zero-filled volume.
    pub fn new(width: usize, height: usize, depth: usize) -> VolumeResult<Self> {
        Self::from_data(width, height, depth, vec![0.0; width * height * depth])
    }

    /// Create a volume from voxel values in x-major order.
    pub fn from_data(width: usize, height: usize, depth: usize, data: Vec<f32>) -> VolumeResult<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(VolumeError::EmptyDimensions(width, height, depth));
        }
        let expected = width * height * depth;
        if data.len() != expected {
            return Err(VolumeError::SizeMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Create a volume by evaluating `f` at every voxel index.
    pub fn from_fn(
        width: usize,
        height: usize,
        depth: usize,
        f: impl Fn(usize, usize, usize) -> f32,
    ) -> VolumeResult<Self> {
        let mut data = Vec::with_capacity(width * height * depth);
        for x in 0..width {
            for y in 0..height {
                for z in 0..depth {
                    data.push(f(x, y, z));
                }
            }
        }
        Self::from_data(width, height, depth, data)
    }

    /// Decode a headerless raw volume. The file stores z-major slices
    /// (x varies fastest), the usual layout of CT/MRI dumps.
    pub fn from_raw_bytes(
        (width, height, depth): (usize, usize, usize),
        bytes: &[u8],
        format: RawFormat,
    ) -> VolumeResult<Self> {
        let stride = format.bytes_per_voxel();
        let count = width * height * depth;
        if bytes.len() != count * stride {
            return Err(VolumeError::SizeMismatch {
                expected: count,
                found: bytes.len() / stride,
            });
        }

        let decode = |chunk: &[u8]| -> f32 {
            match format {
                RawFormat::U8 => chunk[0] as f32,
                RawFormat::U16Le => u16::from_le_bytes([chunk[0], chunk[1]]) as f32,
                RawFormat::F32Le => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            }
        };

        let mut volume = Self::new(width, height, depth)?;
        for (i, chunk) in bytes.chunks_exact(stride).enumerate() {
            let x = i % width;
            let y = (i / width) % height;
            let z = i / (width * height);
            volume.set(x, y, z, decode(chunk));
        }
        Ok(volume)
    }

    /// Load a headerless raw volume file.
    pub fn load_raw(
        path: impl AsRef<Path>,
        dimensions: (usize, usize, usize),
        format: RawFormat,
    ) -> VolumeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let volume = Self::from_raw_bytes(dimensions, &bytes, format)?;
        let (lo, hi) = volume.value_range();
        log::info!(
            "Loaded volume {} ({}x{}x{}), values in [{}, {}]",
            path.display(),
            dimensions.0,
            dimensions.1,
            dimensions.2,
            lo,
            hi
        );
        Ok(volume)
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.height + y) * self.depth + z
    }

    /// Raw voxel value; indices are clamped to the grid.
    #[inline]
    pub fn voxel(&self, x: isize, y: isize, z: isize) -> f32 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        let cz = z.clamp(0, self.depth as isize - 1) as usize;
        self.data[self.index(cx, cy, cz)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
        let i = self.index(x, y, z);
        self.data[i] = value;
    }

    /// Local-space extent of the grid.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            Vec3::ZERO,
            Vec3::new(self.width as f32, self.height as f32, self.depth as f32),
        )
    }

    /// Smallest and largest voxel value.
    pub fn value_range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Trilinear interpolation of the field at a local-space position.
    pub fn sample(&self, pos: Vec3) -> f32 {
        let p = pos - Vec3::splat(0.5);
        let base = p.floor();
        let d = p - base;
        let (x, y, z) = (base.x as isize, base.y as isize, base.z as isize);

        let c000 = self.voxel(x, y, z);
        let c001 = self.voxel(x, y, z + 1);
        let c010 = self.voxel(x, y + 1, z);
        let c011 = self.voxel(x, y + 1, z + 1);
        let c100 = self.voxel(x + 1, y, z);
        let c101 = self.voxel(x + 1, y, z + 1);
        let c110 = self.voxel(x + 1, y + 1, z);
        let c111 = self.voxel(x + 1, y + 1, z + 1);

        let c00 = lerp(c000, c100, d.x);
        let c01 = lerp(c001, c101, d.x);
        let c10 = lerp(c010, c110, d.x);
        let c11 = lerp(c011, c111, d.x);

        let c0 = lerp(c00, c10, d.y);
        let c1 = lerp(c01, c11, d.y);

        lerp(c0, c1, d.z)
    }

    /// Central-difference gradient pointing from dense towards sparse regions,
    /// i.e. outwards from the surfaces embedded in the field.
    pub fn gradient(&self, pos: Vec3, eps: f32) -> Vec3 {
        let dx = Vec3::new(eps, 0.0, 0.0);
        let dy = Vec3::new(0.0, eps, 0.0);
        let dz = Vec3::new(0.0, 0.0, eps);

        Vec3::new(
            self.sample(pos - dx) - self.sample(pos + dx),
            self.sample(pos - dy) - self.sample(pos + dy),
            self.sample(pos - dz) - self.sample(pos + dz),
        )
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(matches!(
            Volume::new(0, 4, 4),
            Err(VolumeError::EmptyDimensions(0, 4, 4))
        ));
        assert!(matches!(
            Volume::from_data(2, 2, 2, vec![0.0; 7]),
            Err(VolumeError::SizeMismatch { expected: 8, found: 7 })
        ));
    }

    #[test]
    fn test_sample_at_voxel_centre_returns_voxel() {
        let volume = Volume::from_fn(4, 4, 4, |x, y, z| (x + 10 * y + 100 * z) as f32).unwrap();
        let v = volume.sample(Vec3::new(2.5, 1.5, 3.5));
        assert!((v - (2.0 + 10.0 + 300.0)).abs() < 1e-4);
    }

    #[test]
    fn test_sample_interpolates_linear_field() {
        let volume = Volume::from_fn(8, 8, 8, |x, _, _| x as f32).unwrap();
        // Halfway between centres of voxel 2 and 3
        let v = volume.sample(Vec3::new(3.0, 4.0, 4.0));
        assert!((v - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_sample_outside_is_clamped() {
        let volume = Volume::from_fn(4, 4, 4, |x, _, _| x as f32).unwrap();
        assert_eq!(volume.sample(Vec3::new(-10.0, 1.0, 1.0)), 0.0);
        assert_eq!(volume.sample(Vec3::new(100.0, 1.0, 1.0)), 3.0);
    }

    #[test]
    fn test_gradient_points_towards_lower_values() {
        let volume = Volume::from_fn(8, 8, 8, |x, _, _| x as f32).unwrap();
        let g = volume.gradient(Vec3::splat(4.0), 0.5);
        assert!(g.x < 0.0);
        assert!(g.y.abs() < 1e-6 && g.z.abs() < 1e-6);
    }

    #[test]
    fn test_raw_u16_layout_is_x_fastest() {
        // 2x1x2 volume, values 1..=4 in file order
        let bytes: Vec<u8> = [1u16, 2, 3, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        let volume = Volume::from_raw_bytes((2, 1, 2), &bytes, RawFormat::U16Le).unwrap();
        assert_eq!(volume.voxel(0, 0, 0), 1.0);
        assert_eq!(volume.voxel(1, 0, 0), 2.0);
        assert_eq!(volume.voxel(0, 0, 1), 3.0);
        assert_eq!(volume.voxel(1, 0, 1), 4.0);
    }

    #[test]
    fn test_raw_size_mismatch() {
        let result = Volume::from_raw_bytes((2, 2, 2), &[0u8; 5], RawFormat::U8);
        assert!(matches!(result, Err(VolumeError::SizeMismatch { .. })));
    }

    #[test]
    fn test_load_raw_file() {
        let path = std::env::temp_dir().join(format!("vox_core_volume_{}.raw", std::process::id()));
        std::fs::write(&path, [0u8, 64, 128, 255]).unwrap();
        let volume = Volume::load_raw(&path, (4, 1, 1), RawFormat::U8);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(volume.unwrap().value_range(), (0.0, 255.0));

        let missing = Volume::load_raw(path, (4, 1, 1), RawFormat::U8);
        assert!(matches!(missing, Err(VolumeError::Io(_))));
    }

    #[test]
    fn test_value_range() {
        let volume = Volume::from_fn(3, 3, 3, |x, y, z| (x + y + z) as f32 - 1.0).unwrap();
        assert_eq!(volume.value_range(), (-1.0, 5.0));
    }
}
