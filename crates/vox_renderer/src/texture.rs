//! Procedural textures evaluated on surface UVs.

use vox_math::{Vec2, Vec3};

/// Colour source for materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Texture {
    Solid(Vec3),
    /// Alternating squares, `frequency` cells per unit of UV
    Checker { even: Vec3, odd: Vec3, frequency: f32 },
}

impl Texture {
    pub fn evaluate(&self, uv: Vec2) -> Vec3 {
        match *self {
            Texture::Solid(colour) => colour,
            Texture::Checker { even, odd, frequency } => {
                let cell = (uv * frequency).floor();
                if (cell.x + cell.y).rem_euclid(2.0) < 0.5 {
                    even
                } else {
                    odd
                }
            }
        }
    }
}

impl From<Vec3> for Texture {
    fn from(colour: Vec3) -> Self {
        Texture::Solid(colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_alternates() {
        let t = Texture::Checker {
            even: Vec3::ONE,
            odd: Vec3::ZERO,
            frequency: 2.0,
        };
        assert_eq!(t.evaluate(Vec2::new(0.1, 0.1)), Vec3::ONE);
        assert_eq!(t.evaluate(Vec2::new(0.6, 0.1)), Vec3::ZERO);
        assert_eq!(t.evaluate(Vec2::new(0.6, 0.6)), Vec3::ONE);
    }
}
