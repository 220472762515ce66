use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::ChunkCoord;
use crate::noise::NoiseSeeds;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub map: Map,
    #[serde(default)]
    pub seeds: Seeds,
    #[serde(default)]
    pub terrain: Terrain,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Map {
    #[serde(default = "default_chunks")]
    pub x_chunks: usize,
    #[serde(default = "default_chunks")]
    pub z_chunks: usize,
    #[serde(default = "default_chunk_width")]
    pub chunk_width_x: f64,
    #[serde(default = "default_chunk_width")]
    pub chunk_width_z: f64,
    #[serde(default = "default_cells")]
    pub x_cells: usize,
    #[serde(default = "default_cells")]
    pub z_cells: usize,
}
fn default_chunks() -> usize {
    80
}
fn default_chunk_width() -> f64 {
    6.25
}
fn default_cells() -> usize {
    20
}
impl Default for Map {
    fn default() -> Self {
        Self {
            x_chunks: default_chunks(),
            z_chunks: default_chunks(),
            chunk_width_x: default_chunk_width(),
            chunk_width_z: default_chunk_width(),
            x_cells: default_cells(),
            z_cells: default_cells(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Seeds {
    #[serde(default = "d_x1")]
    pub x1: u32,
    #[serde(default = "d_x2")]
    pub x2: u32,
    #[serde(default = "d_y1")]
    pub y1: u32,
    #[serde(default = "d_y2")]
    pub y2: u32,
    #[serde(default = "d_q0")]
    pub q0: u32,
    #[serde(default = "d_q1")]
    pub q1: u32,
    #[serde(default = "d_q2")]
    pub q2: u32,
}
fn d_x1() -> u32 {
    1_273_472_206
}
fn d_x2() -> u32 {
    4_278_162_623
}
fn d_y1() -> u32 {
    1_440_014_778
}
fn d_y2() -> u32 {
    524_485_263
}
fn d_q0() -> u32 {
    1_498_573_726
}
fn d_q1() -> u32 {
    3_476_519_523
}
fn d_q2() -> u32 {
    3_905_844_518
}
impl Default for Seeds {
    fn default() -> Self {
        Self {
            x1: d_x1(),
            x2: d_x2(),
            y1: d_y1(),
            y2: d_y2(),
            q0: d_q0(),
            q1: d_q1(),
            q2: d_q2(),
        }
    }
}

impl From<&Seeds> for NoiseSeeds {
    fn from(s: &Seeds) -> Self {
        NoiseSeeds {
            x1: f64::from(s.x1),
            x2: f64::from(s.x2),
            y1: f64::from(s.y1),
            y2: f64::from(s.y2),
            q0: f64::from(s.q0),
            q1: f64::from(s.q1),
            q2: f64::from(s.q2),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Terrain {
    #[serde(default = "default_offset")]
    pub offset: f64,
    #[serde(default = "default_gradient_grid")]
    pub gradient_grid: f64,
    #[serde(default = "default_gradient_amplitude")]
    pub gradient_amplitude: f64,
    #[serde(default = "default_cellular_grid")]
    pub cellular_grid: f64,
    /// Defaults to half the cellular cell diagonal.
    #[serde(default)]
    pub cellular_amplitude: Option<f64>,
    #[serde(default = "default_tunnel_half_width")]
    pub tunnel_half_width: f64,
    #[serde(default = "default_cavern_boost")]
    pub cavern_boost: f64,
    #[serde(default = "default_cavern_band")]
    pub cavern_band: f64,
    #[serde(default = "default_tunnel_band")]
    pub tunnel_band: f64,
    #[serde(default = "default_edge_exponent")]
    pub edge_exponent: f64,
}
fn default_offset() -> f64 {
    35.0
}
fn default_gradient_grid() -> f64 {
    40.0
}
fn default_gradient_amplitude() -> f64 {
    70.0
}
fn default_cellular_grid() -> f64 {
    30.0
}
fn default_tunnel_half_width() -> f64 {
    3.0
}
fn default_cavern_boost() -> f64 {
    10.0
}
fn default_cavern_band() -> f64 {
    0.4
}
fn default_tunnel_band() -> f64 {
    0.8
}
fn default_edge_exponent() -> f64 {
    0.6
}
impl Default for Terrain {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            gradient_grid: default_gradient_grid(),
            gradient_amplitude: default_gradient_amplitude(),
            cellular_grid: default_cellular_grid(),
            cellular_amplitude: None,
            tunnel_half_width: default_tunnel_half_width(),
            cavern_boost: default_cavern_boost(),
            cavern_band: default_cavern_band(),
            tunnel_band: default_tunnel_band(),
            edge_exponent: default_edge_exponent(),
        }
    }
}

/// Grid dimensions shared by the chunk index, the scanner and the height texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapParams {
    pub x_chunks: usize,
    pub z_chunks: usize,
    pub chunk_width_x: f64,
    pub chunk_width_z: f64,
    pub x_cells: usize,
    pub z_cells: usize,
}

impl Default for MapParams {
    fn default() -> Self {
        let m = Map::default();
        Self {
            x_chunks: m.x_chunks,
            z_chunks: m.z_chunks,
            chunk_width_x: m.chunk_width_x,
            chunk_width_z: m.chunk_width_z,
            x_cells: m.x_cells,
            z_cells: m.z_cells,
        }
    }
}

impl MapParams {
    #[inline]
    pub fn world_size_x(&self) -> f64 {
        self.chunk_width_x * self.x_chunks as f64
    }

    #[inline]
    pub fn world_size_z(&self) -> f64 {
        self.chunk_width_z * self.z_chunks as f64
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.world_size_x() * 0.5, self.world_size_z() * 0.5)
    }

    /// Radius of the carved disc; equals the half width on square maps.
    #[inline]
    pub fn half_width(&self) -> f64 {
        let (cx, cz) = self.center();
        cx.min(cz)
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.x_chunks * self.z_chunks
    }

    /// Chunk containing a world position; may lie outside the grid.
    #[inline]
    pub fn chunk_of(&self, x: f64, z: f64) -> ChunkCoord {
        ChunkCoord::new(
            (x / self.chunk_width_x).floor() as i32,
            (z / self.chunk_width_z).floor() as i32,
        )
    }

    #[inline]
    pub fn contains(&self, c: ChunkCoord) -> bool {
        c.cx >= 0 && c.cz >= 0 && (c.cx as usize) < self.x_chunks && (c.cz as usize) < self.z_chunks
    }

    #[inline]
    pub fn chunk_center(&self, c: ChunkCoord) -> (f64, f64) {
        (
            (f64::from(c.cx) + 0.5) * self.chunk_width_x,
            (f64::from(c.cz) + 0.5) * self.chunk_width_z,
        )
    }
}

/// Height-field shaping constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    pub offset: f64,
    pub gradient_grid: f64,
    pub gradient_amplitude: f64,
    pub cellular_grid: f64,
    pub cellular_amplitude: f64,
    pub tunnel_half_width: f64,
    pub cavern_boost: f64,
    pub cavern_band: f64,
    pub tunnel_band: f64,
    pub edge_exponent: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_section(&Terrain::default())
    }
}

impl TerrainParams {
    fn from_section(t: &Terrain) -> Self {
        Self {
            offset: t.offset,
            gradient_grid: t.gradient_grid,
            gradient_amplitude: t.gradient_amplitude,
            cellular_grid: t.cellular_grid,
            cellular_amplitude: t
                .cellular_amplitude
                .unwrap_or_else(|| t.cellular_grid.hypot(t.cellular_grid) / 2.0),
            tunnel_half_width: t.tunnel_half_width,
            cavern_boost: t.cavern_boost,
            cavern_band: t.cavern_band,
            tunnel_band: t.tunnel_band,
            edge_exponent: t.edge_exponent,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldGenParams {
    pub map: MapParams,
    pub seeds: NoiseSeeds,
    pub terrain: TerrainParams,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMap(&'static str),
    InvalidTerrain(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMap(msg) => write!(f, "invalid [map] config: {}", msg),
            ConfigError::InvalidTerrain(msg) => write!(f, "invalid [terrain] config: {}", msg),
        }
    }
}

impl Error for ConfigError {}

impl WorldGenParams {
    pub fn from_config(cfg: &WorldGenConfig) -> Result<Self, ConfigError> {
        let m = &cfg.map;
        if m.x_chunks == 0 || m.z_chunks == 0 {
            return Err(ConfigError::InvalidMap("chunk counts must be non-zero"));
        }
        if m.x_chunks > usize::from(u16::MAX) || m.z_chunks > usize::from(u16::MAX) {
            return Err(ConfigError::InvalidMap("chunk counts must fit in 16 bits"));
        }
        if !(m.chunk_width_x > 0.0 && m.chunk_width_z > 0.0) {
            return Err(ConfigError::InvalidMap("chunk widths must be positive"));
        }
        if m.x_cells == 0 || m.z_cells == 0 {
            return Err(ConfigError::InvalidMap("cells per chunk must be non-zero"));
        }
        let t = &cfg.terrain;
        if !(t.gradient_grid > 0.0 && t.cellular_grid > 0.0) {
            return Err(ConfigError::InvalidTerrain("noise grid sizes must be positive"));
        }
        if !(0.0 < t.cavern_band && t.cavern_band < t.tunnel_band && t.tunnel_band < 1.0) {
            return Err(ConfigError::InvalidTerrain(
                "bands must satisfy 0 < cavern_band < tunnel_band < 1",
            ));
        }
        Ok(Self {
            map: MapParams {
                x_chunks: m.x_chunks,
                z_chunks: m.z_chunks,
                chunk_width_x: m.chunk_width_x,
                chunk_width_z: m.chunk_width_z,
                x_cells: m.x_cells,
                z_cells: m.z_cells,
            },
            seeds: NoiseSeeds::from(&cfg.seeds),
            terrain: TerrainParams::from_section(t),
        })
    }
}

pub fn load_params_from_path(path: &Path) -> Result<WorldGenParams, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(WorldGenParams::from_config(&cfg)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: WorldGenConfig = toml::from_str("").unwrap();
        let p = WorldGenParams::from_config(&cfg).unwrap();
        assert_eq!(p, WorldGenParams::default());
        assert_eq!(p.map.half_width(), 250.0);
        assert!((p.terrain.cellular_amplitude - 30.0f64.hypot(30.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: WorldGenConfig = toml::from_str(
            r#"
            [map]
            x_chunks = 10
            [terrain]
            cavern_boost = 4.5
            [population]
            attempt_cap = 3
            "#,
        )
        .unwrap();
        let p = WorldGenParams::from_config(&cfg).unwrap();
        assert_eq!(p.map.x_chunks, 10);
        assert_eq!(p.map.z_chunks, 80);
        assert_eq!(p.terrain.cavern_boost, 4.5);
        assert_eq!(p.terrain.offset, 35.0);
    }

    #[test]
    fn rejects_zero_chunks() {
        let mut cfg = WorldGenConfig::default();
        cfg.map.z_chunks = 0;
        assert!(matches!(
            WorldGenParams::from_config(&cfg),
            Err(ConfigError::InvalidMap(_))
        ));
    }

    #[test]
    fn chunk_lookup_and_center() {
        let m = MapParams::default();
        assert_eq!(m.chunk_of(6.3, 12.4), ChunkCoord::new(1, 1));
        assert_eq!(m.chunk_of(-0.1, 0.0), ChunkCoord::new(-1, 0));
        assert!(!m.contains(ChunkCoord::new(80, 0)));
        assert_eq!(m.chunk_center(ChunkCoord::new(0, 2)), (3.125, 15.625));
    }
}
