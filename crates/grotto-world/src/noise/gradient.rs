use std::f64::consts::TAU;

use super::{Noise2D, NoiseSeeds};

/// Smooth lattice gradient noise with output in `[0, amplitude]`.
#[derive(Clone, Debug)]
pub struct GradientNoise {
    pub grid_size: f64,
    pub amplitude: f64,
    seeds: NoiseSeeds,
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, w: f64) -> f64 {
    (b - a) * w + a
}

impl GradientNoise {
    pub fn new(grid_size: f64, amplitude: f64, seeds: NoiseSeeds) -> Self {
        Self {
            grid_size,
            amplitude,
            seeds,
        }
    }

    /// Unit gradient at a lattice corner.
    #[inline]
    pub fn gradient(&self, ix: f64, iy: f64) -> (f64, f64) {
        let radians = TAU * self.seeds.hash(ix, iy);
        (radians.cos(), radians.sin())
    }

    #[inline]
    fn corner_dot(&self, ix: f64, iy: f64, gx: f64, gy: f64) -> f64 {
        let (cx, cy) = self.gradient(ix, iy);
        (gx - ix) * cx + (gy - iy) * cy
    }

    /// Raw blended value in `[-1, 1]` before the amplitude remap.
    pub fn signed(&self, x: f64, y: f64) -> f64 {
        let gx = x / self.grid_size;
        let gy = y / self.grid_size;
        let x0 = gx.floor();
        let y0 = gy.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;
        let sx = fade(gx - x0);
        let sy = fade(gy - y0);

        let top = lerp(
            self.corner_dot(x0, y0, gx, gy),
            self.corner_dot(x1, y0, gx, gy),
            sx,
        );
        let bottom = lerp(
            self.corner_dot(x0, y1, gx, gy),
            self.corner_dot(x1, y1, gx, gy),
            sx,
        );
        lerp(top, bottom, sy)
    }
}

impl Noise2D for GradientNoise {
    #[inline]
    fn sample(&self, x: f64, y: f64) -> f64 {
        (self.signed(x, y) + 1.0) / 2.0 * self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise() -> GradientNoise {
        GradientNoise::new(40.0, 70.0, NoiseSeeds::default())
    }

    #[test]
    fn lattice_points_sit_at_half_amplitude() {
        let n = noise();
        for (ix, iy) in [(0.0, 0.0), (3.0, 7.0), (-2.0, 5.0)] {
            let v = n.sample(ix * 40.0, iy * 40.0);
            assert!((v - 35.0).abs() < 1e-9, "lattice value {v}");
        }
    }

    #[test]
    fn fade_hits_endpoints_and_midpoint() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn continuous_across_cell_edges() {
        let n = noise();
        let edge = 80.0;
        let a = n.sample(edge - 1e-7, 13.0);
        let b = n.sample(edge + 1e-7, 13.0);
        assert!((a - b).abs() < 1e-4);
    }
}
