//! Deterministic 2D noise: smooth gradient noise and cellular (Worley) noise.
//!
//! Both kinds hash lattice coordinates with the same seven-constant
//! quadratic hash, so a single [`NoiseSeeds`] drives the whole height field.

mod cellular;
mod gradient;

pub use cellular::CellularNoise;
pub use gradient::GradientNoise;

/// Largest value of an unsigned 32-bit integer, as used by the lattice hash.
pub(crate) const UINT_MAX: f64 = 4_294_967_295.0;

/// A scalar field over the plane.
pub trait Noise2D {
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// The seven integer constants of the lattice hash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSeeds {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub q0: f64,
    pub q1: f64,
    pub q2: f64,
}

impl Default for NoiseSeeds {
    fn default() -> Self {
        Self {
            x1: 1_273_472_206.0,
            x2: 4_278_162_623.0,
            y1: 1_440_014_778.0,
            y2: 524_485_263.0,
            q0: 1_498_573_726.0,
            q1: 3_476_519_523.0,
            q2: 3_905_844_518.0,
        }
    }
}

impl NoiseSeeds {
    /// Quadratic residue hash of a lattice point. Evaluated in f64 so every
    /// platform with IEEE doubles produces the same bits.
    #[inline]
    pub fn hash(&self, ix: f64, iy: f64) -> f64 {
        let n = self.x1 * ix + self.y1 * iy;
        let quad = self.q2 * n * n + self.q1 * n + self.q0;
        quad + self.x2 * ix + self.y2 * iy
    }
}

/// Truncating conversion to a wrapped signed 32-bit integer.
#[inline]
pub(crate) fn to_int32(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    v.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_int32_wraps_like_a_32bit_register() {
        assert_eq!(to_int32(0.0), 0);
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn hash_is_pure() {
        let seeds = NoiseSeeds::default();
        assert_eq!(seeds.hash(3.0, -7.0).to_bits(), seeds.hash(3.0, -7.0).to_bits());
        assert_eq!(seeds.hash(0.0, 0.0), seeds.q0);
    }
}
