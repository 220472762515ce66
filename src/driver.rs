use std::error::Error;
use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

use grotto_geom::Vec3;
use grotto_world::TerrainHeightModel;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
struct DriverFile {
    #[serde(default)]
    driver: DriverConfig,
}

/// Scripted flight settings, the `[driver]` section of the config file.
#[derive(Clone, Debug, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f64,
    #[serde(default = "default_orbit_period_s")]
    pub orbit_period_s: f64,
    /// Height above the floor, kept below the ceiling.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Fire a net every this many frames; 0 disables.
    #[serde(default = "default_net_every")]
    pub net_every: u32,
    #[serde(default = "default_report_every")]
    pub report_every: u32,
}
fn default_frame_ms() -> f64 {
    1000.0 / 60.0
}
fn default_orbit_radius() -> f64 {
    18.0
}
fn default_orbit_period_s() -> f64 {
    40.0
}
fn default_height() -> f64 {
    1.5
}
fn default_net_every() -> u32 {
    45
}
fn default_report_every() -> u32 {
    120
}
impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            orbit_radius: default_orbit_radius(),
            orbit_period_s: default_orbit_period_s(),
            height: default_height(),
            net_every: default_net_every(),
            report_every: default_report_every(),
        }
    }
}

pub fn load_driver_config(path: &Path) -> Result<DriverConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let file: DriverFile = toml::from_str(&s)?;
    Ok(file.driver)
}

/// Circular flight around the map center, hugging the floor.
#[derive(Clone, Debug)]
pub struct CameraPath {
    center: (f64, f64),
    radius: f64,
    period_s: f64,
    height: f64,
}

impl CameraPath {
    pub fn new(cfg: &DriverConfig, model: &TerrainHeightModel) -> Self {
        Self {
            center: model.center(),
            radius: cfg.orbit_radius,
            period_s: cfg.orbit_period_s.max(1.0),
            height: cfg.height,
        }
    }

    /// Camera position and view direction at `t` seconds.
    pub fn at(&self, model: &TerrainHeightModel, t: f64) -> (Vec3, Vec3) {
        let a = t / self.period_s * TAU;
        let x = self.center.0 + self.radius * a.cos();
        let z = self.center.1 + self.radius * a.sin();
        let h = model.floor_and_ceiling(x, z);
        let y = if h.is_open() {
            (h.floor + self.height).min((h.floor + h.ceil) / 2.0)
        } else {
            h.floor + self.height
        };
        let position = Vec3::new(x as f32, y as f32, z as f32);
        // Tangent of the circle, tipped slightly toward the floor.
        let forward = Vec3::new(-a.sin() as f32, -0.2, a.cos() as f32).normalized();
        (position, forward)
    }
}
