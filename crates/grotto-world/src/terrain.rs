//! Floor and ceiling elevation of the cave, carved radially around the map center.

use std::f64::consts::PI;

use grotto_geom::Vec3;

use crate::noise::{CellularNoise, GradientNoise, Noise2D};
use crate::worldgen::{TerrainParams, WorldGenParams};

/// Half gap reported where the rock is solid.
const SOLID_GAP: f64 = 3.0;
/// Finite-difference step of the floor normal estimate.
const NORMAL_STEP: f64 = 0.1;

/// Intermediate terms of the height field at one position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainShape {
    /// Tunnel half-width.
    pub s: f64,
    /// Base elevation.
    pub b: f64,
    /// Cavern blend factor.
    pub f: f64,
    /// Cellular ridge signal.
    pub w: f64,
}

impl TerrainShape {
    #[inline]
    pub fn is_solid(&self) -> bool {
        self.s <= 0.0
    }

    #[inline]
    fn floor(&self) -> f64 {
        if self.is_solid() {
            self.b + SOLID_GAP
        } else {
            self.b * self.f - self.s + (self.w * self.w * self.f) / self.s
        }
    }

    #[inline]
    fn ceil(&self) -> f64 {
        if self.is_solid() {
            self.b - SOLID_GAP
        } else {
            self.b * self.f + self.s - (self.w * self.w * self.f) / self.s
        }
    }
}

/// Floor and ceiling at one position.
///
/// Inside solid rock `floor > ceil`; callers go through [`HeightSample::is_open`]
/// or [`TerrainHeightModel::valid_floor_position`] rather than comparing the two.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightSample {
    pub floor: f64,
    pub ceil: f64,
    pub solid: bool,
}

impl HeightSample {
    #[inline]
    pub fn clearance(&self) -> f64 {
        self.ceil - self.floor
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.solid && self.ceil >= self.floor
    }
}

#[derive(Clone, Debug)]
pub struct TerrainHeightModel {
    gradient: GradientNoise,
    cellular: CellularNoise,
    center: (f64, f64),
    radius: f64,
    params: TerrainParams,
}

impl TerrainHeightModel {
    pub fn new(p: &WorldGenParams) -> Self {
        let t = p.terrain;
        Self {
            gradient: GradientNoise::new(t.gradient_grid, t.gradient_amplitude, p.seeds),
            cellular: CellularNoise::new(t.cellular_grid, t.cellular_amplitude, p.seeds),
            center: p.map.center(),
            radius: p.map.half_width(),
            params: t,
        }
    }

    #[inline]
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Tunnel half-width and cavern blend as functions of distance to center.
    pub fn radial_profile(&self, d: f64) -> (f64, f64) {
        let t = &self.params;
        let h = self.radius;
        let cavern = h * t.cavern_band;
        let s = if d > h {
            0.0
        } else if d > h * t.tunnel_band {
            ((h - d) / (h * (1.0 - t.tunnel_band))).powf(t.edge_exponent) * t.tunnel_half_width
        } else if d > cavern {
            t.tunnel_half_width
        } else {
            t.tunnel_half_width + (1.0 + (d / cavern * PI).cos()) * t.cavern_boost
        };
        let f = if d > cavern {
            1.0
        } else {
            0.75 - (d / cavern * PI).cos() * 0.25
        };
        (s, f)
    }

    pub fn shape(&self, x: f64, z: f64) -> TerrainShape {
        let b = self.gradient.sample(x, z) - self.params.offset;
        let w = self.cellular.sample(x, z);
        let d = (x - self.center.0).hypot(z - self.center.1);
        let (s, f) = self.radial_profile(d);
        TerrainShape { s, b, f, w }
    }

    pub fn floor_and_ceiling(&self, x: f64, z: f64) -> HeightSample {
        let shape = self.shape(x, z);
        HeightSample {
            floor: shape.floor(),
            ceil: shape.ceil(),
            solid: shape.is_solid(),
        }
    }

    #[inline]
    pub fn floor(&self, x: f64, z: f64) -> f64 {
        self.shape(x, z).floor()
    }

    #[inline]
    pub fn ceil(&self, x: f64, z: f64) -> f64 {
        self.shape(x, z).ceil()
    }

    /// Floor height when the position is carved and at least `min_clearance` tall.
    pub fn valid_floor_position(&self, x: f64, z: f64, min_clearance: f64) -> Option<f64> {
        let shape = self.shape(x, z);
        if shape.is_solid() {
            return None;
        }
        let floor = shape.floor();
        (shape.ceil() - floor >= min_clearance).then_some(floor)
    }

    /// Unit normal of the floor surface from central differences.
    pub fn normal_at_floor(&self, x: f64, z: f64) -> Vec3 {
        let e = NORMAL_STEP;
        let dx = self.floor(x + e, z) - self.floor(x - e, z);
        let dz = self.floor(x, z + e) - self.floor(x, z - e);
        let n = Vec3::new(-dx as f32, (2.0 * e) as f32, -dz as f32).normalized();
        if n.y.is_finite() { n } else { Vec3::UP }
    }
}
