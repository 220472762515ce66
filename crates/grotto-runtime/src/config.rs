use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Simulation tuning, read from the same TOML file as the world config.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub population: Population,
    #[serde(default)]
    pub crabs: Crabs,
    #[serde(default)]
    pub nets: Nets,
    #[serde(default)]
    pub pickup: Pickup,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub clock: Clock,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Population {
    #[serde(default = "default_attempt_cap")]
    pub attempt_cap: u32,
    #[serde(default)]
    pub rocks: Rocks,
    #[serde(default)]
    pub chests: Chests,
    #[serde(default = "default_crab_count")]
    pub crab_count: usize,
    #[serde(default = "default_clearance")]
    pub crab_clearance: f64,
    #[serde(default = "default_crab_lift")]
    pub crab_lift: f32,
    #[serde(default = "default_doodads")]
    pub doodads: Vec<DoodadKind>,
}
fn default_attempt_cap() -> u32 {
    25_000
}
fn default_crab_count() -> usize {
    2000
}
pub(crate) fn default_clearance() -> f64 {
    1.0
}
fn default_crab_lift() -> f32 {
    0.05
}
impl Default for Population {
    fn default() -> Self {
        Self {
            attempt_cap: default_attempt_cap(),
            rocks: Rocks::default(),
            chests: Chests::default(),
            crab_count: default_crab_count(),
            crab_clearance: default_clearance(),
            crab_lift: default_crab_lift(),
            doodads: default_doodads(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Rocks {
    #[serde(default = "default_rock_count")]
    pub count: usize,
    /// Number of rock meshes; tags run `rock_A`, `rock_B`, ...
    #[serde(default = "default_rock_kinds")]
    pub kinds: usize,
    #[serde(default = "default_rock_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_rock_max_radius")]
    pub max_radius: f32,
    #[serde(default = "default_anchor_radius")]
    pub anchor_radius: f32,
    /// Fraction of the radius buried below the floor.
    #[serde(default = "default_sink")]
    pub sink: f32,
    #[serde(default = "default_clearance")]
    pub clearance: f64,
}
fn default_rock_count() -> usize {
    2000
}
fn default_rock_kinds() -> usize {
    20
}
fn default_rock_min_radius() -> f32 {
    2.0
}
fn default_rock_max_radius() -> f32 {
    5.0
}
fn default_anchor_radius() -> f32 {
    5.0
}
fn default_sink() -> f32 {
    0.6
}
impl Default for Rocks {
    fn default() -> Self {
        Self {
            count: default_rock_count(),
            kinds: default_rock_kinds(),
            min_radius: default_rock_min_radius(),
            max_radius: default_rock_max_radius(),
            anchor_radius: default_anchor_radius(),
            sink: default_sink(),
            clearance: default_clearance(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chests {
    #[serde(default = "default_chest_count")]
    pub count: usize,
    /// Anchor chest sits this far from the map center along both axes.
    #[serde(default = "default_chest_anchor_offset")]
    pub anchor_offset: f64,
    #[serde(default = "default_chest_sink")]
    pub sink: f32,
    #[serde(default = "default_clearance")]
    pub clearance: f64,
}
fn default_chest_count() -> usize {
    50
}
fn default_chest_anchor_offset() -> f64 {
    -9.5
}
fn default_chest_sink() -> f32 {
    0.05
}
impl Default for Chests {
    fn default() -> Self {
        Self {
            count: default_chest_count(),
            anchor_offset: default_chest_anchor_offset(),
            sink: default_chest_sink(),
            clearance: default_clearance(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DoodadKind {
    pub name: String,
    pub count: usize,
    #[serde(default)]
    pub billboard: bool,
}

fn default_doodads() -> Vec<DoodadKind> {
    let solid = ["starfish_3d", "seashell_3d", "urchin_3d"]
        .into_iter()
        .map(|name| DoodadKind {
            name: name.to_string(),
            count: 200,
            billboard: false,
        });
    let flat = [
        "five_plants",
        "green_algae2",
        "kelp",
        "seaweed_tall",
        "seaweed_wide",
        "together",
    ];
    let per_billboard = 25_000 / flat.len();
    solid
        .chain(flat.into_iter().map(|name| DoodadKind {
            name: name.to_string(),
            count: per_billboard,
            billboard: true,
        }))
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
pub struct Crabs {
    #[serde(default = "default_crab_size")]
    pub size: f32,
    #[serde(default = "default_crab_speed")]
    pub speed: f32,
    #[serde(default = "default_turn_chance")]
    pub turn_chance: f64,
    #[serde(default = "default_max_turn")]
    pub max_turn: f32,
    #[serde(default = "default_flee_radius")]
    pub flee_radius: f32,
    #[serde(default = "default_flee_speed")]
    pub flee_speed: f32,
    #[serde(default = "default_crab_size")]
    pub min_separation: f32,
}
fn default_crab_size() -> f32 {
    0.4
}
fn default_crab_speed() -> f32 {
    1.0
}
fn default_turn_chance() -> f64 {
    0.05
}
fn default_max_turn() -> f32 {
    0.5
}
fn default_flee_radius() -> f32 {
    6.0
}
fn default_flee_speed() -> f32 {
    3.0
}
impl Default for Crabs {
    fn default() -> Self {
        Self {
            size: default_crab_size(),
            speed: default_crab_speed(),
            turn_chance: default_turn_chance(),
            max_turn: default_max_turn(),
            flee_radius: default_flee_radius(),
            flee_speed: default_flee_speed(),
            min_separation: default_crab_size(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Nets {
    #[serde(default = "default_launch_speed")]
    pub launch_speed: f32,
    #[serde(default = "default_drag")]
    pub drag: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default)]
    pub size: f32,
    #[serde(default = "default_catch_radius")]
    pub catch_radius: f32,
    #[serde(default = "default_crab_offset")]
    pub crab_offset: f32,
}
fn default_launch_speed() -> f32 {
    10.0
}
fn default_drag() -> f32 {
    0.2
}
fn default_gravity() -> f32 {
    5.0
}
fn default_catch_radius() -> f32 {
    0.8
}
fn default_crab_offset() -> f32 {
    0.25
}
impl Default for Nets {
    fn default() -> Self {
        Self {
            launch_speed: default_launch_speed(),
            drag: default_drag(),
            gravity: default_gravity(),
            size: 0.0,
            catch_radius: default_catch_radius(),
            crab_offset: default_crab_offset(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pickup {
    #[serde(default = "default_player_size")]
    pub player_size: f32,
    #[serde(default = "default_chest_radius")]
    pub chest_radius: f32,
    #[serde(default = "default_crab_pickup_radius")]
    pub crab_radius: f32,
    #[serde(default = "default_chest_score")]
    pub chest_score: u32,
    #[serde(default = "default_crab_score")]
    pub crab_score: u32,
}
fn default_player_size() -> f32 {
    0.5
}
fn default_chest_radius() -> f32 {
    1.5
}
fn default_crab_pickup_radius() -> f32 {
    0.5
}
fn default_chest_score() -> u32 {
    100
}
fn default_crab_score() -> u32 {
    50
}
impl Default for Pickup {
    fn default() -> Self {
        Self {
            player_size: default_player_size(),
            chest_radius: default_chest_radius(),
            crab_radius: default_crab_pickup_radius(),
            chest_score: default_chest_score(),
            crab_score: default_crab_score(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct View {
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_max_cell_range")]
    pub max_cell_range: u32,
    #[serde(default = "default_min_cell_radius")]
    pub min_cell_radius: u32,
    #[serde(default = "default_max_cell_radius")]
    pub max_cell_radius: u32,
}
fn default_fov_degrees() -> f32 {
    45.0
}
fn default_aspect() -> f32 {
    16.0 / 9.0
}
fn default_max_cell_range() -> u32 {
    14
}
fn default_min_cell_radius() -> u32 {
    2
}
fn default_max_cell_radius() -> u32 {
    8
}
impl Default for View {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov_degrees(),
            aspect: default_aspect(),
            max_cell_range: default_max_cell_range(),
            min_cell_radius: default_min_cell_radius(),
            max_cell_radius: default_max_cell_radius(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Clock {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: f64,
    #[serde(default = "default_max_frame_ms")]
    pub max_frame_ms: f64,
    #[serde(default = "default_average_window")]
    pub average_window: usize,
}
fn default_tick_ms() -> f64 {
    1000.0 / 60.0
}
fn default_max_frame_ms() -> f64 {
    250.0
}
fn default_average_window() -> usize {
    20
}
impl Default for Clock {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            max_frame_ms: default_max_frame_ms(),
            average_window: default_average_window(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeConfigError {
    InvalidPopulation(&'static str),
    InvalidCrabs(&'static str),
    InvalidNets(&'static str),
    InvalidPickup(&'static str),
    InvalidView(&'static str),
    InvalidClock(&'static str),
}

impl fmt::Display for RuntimeConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (section, msg) = match self {
            RuntimeConfigError::InvalidPopulation(m) => ("population", m),
            RuntimeConfigError::InvalidCrabs(m) => ("crabs", m),
            RuntimeConfigError::InvalidNets(m) => ("nets", m),
            RuntimeConfigError::InvalidPickup(m) => ("pickup", m),
            RuntimeConfigError::InvalidView(m) => ("view", m),
            RuntimeConfigError::InvalidClock(m) => ("clock", m),
        };
        write!(f, "invalid [{}] config: {}", section, msg)
    }
}

impl Error for RuntimeConfigError {}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl RuntimeConfig {
    /// Rejects values that would make placement, movement or the clock misbehave.
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        use RuntimeConfigError::*;

        let r = &self.population.rocks;
        if !(r.min_radius.is_finite() && r.min_radius > 0.0 && r.max_radius.is_finite()) {
            return Err(InvalidPopulation("rock radii must be positive"));
        }
        if !(non_negative(r.anchor_radius) && r.sink.is_finite()) {
            return Err(InvalidPopulation("anchor radius and sink must be finite"));
        }
        let p = &self.population;
        if !(non_negative(p.crab_lift) && p.crab_clearance >= 0.0 && r.clearance >= 0.0) {
            return Err(InvalidPopulation("lift and clearances must be non-negative"));
        }

        let c = &self.crabs;
        if ![c.size, c.speed, c.max_turn, c.flee_radius, c.flee_speed, c.min_separation]
            .into_iter()
            .all(non_negative)
        {
            return Err(InvalidCrabs("sizes, speeds and radii must be non-negative"));
        }
        if !(0.0..=1.0).contains(&c.turn_chance) {
            return Err(InvalidCrabs("turn_chance must lie in [0, 1]"));
        }

        let n = &self.nets;
        if ![n.launch_speed, n.drag, n.size, n.catch_radius]
            .into_iter()
            .all(non_negative)
            || !(n.gravity.is_finite() && n.crab_offset.is_finite())
        {
            return Err(InvalidNets("speeds and radii must be non-negative"));
        }

        let k = &self.pickup;
        if ![k.player_size, k.chest_radius, k.crab_radius].into_iter().all(non_negative) {
            return Err(InvalidPickup("radii must be non-negative"));
        }

        let v = &self.view;
        if !(v.fov_degrees > 0.0 && v.fov_degrees < 180.0) {
            return Err(InvalidView("fov_degrees must lie in (0, 180)"));
        }
        if !(v.aspect.is_finite() && v.aspect > 0.0) {
            return Err(InvalidView("aspect must be positive"));
        }
        if v.min_cell_radius > v.max_cell_radius {
            return Err(InvalidView("min_cell_radius exceeds max_cell_radius"));
        }

        let t = &self.clock;
        if !(t.tick_ms.is_finite() && t.tick_ms > 0.0) {
            return Err(InvalidClock("tick_ms must be positive"));
        }
        if !(t.max_frame_ms.is_finite() && t.max_frame_ms >= 0.0) {
            return Err(InvalidClock("max_frame_ms must be non-negative"));
        }
        if t.average_window == 0 {
            return Err(InvalidClock("average_window must be non-zero"));
        }
        Ok(())
    }
}

pub fn load_runtime_config(path: &Path) -> Result<RuntimeConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: RuntimeConfig = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_document() {
        let cfg: RuntimeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.population.attempt_cap, 25_000);
        assert_eq!(cfg.population.rocks.kinds, 20);
        assert_eq!(cfg.population.doodads.len(), 9);
        assert_eq!(
            cfg.population.doodads.iter().filter(|d| d.billboard).count(),
            6
        );
        assert_eq!(cfg.nets.size, 0.0);
        assert!((cfg.clock.tick_ms - 16.666_666).abs() < 1e-3);
    }

    #[test]
    fn doodad_list_override() {
        let cfg: RuntimeConfig = toml::from_str(
            r#"
            [map]
            x_chunks = 4
            [[population.doodads]]
            name = "kelp"
            count = 3
            billboard = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.population.doodads.len(), 1);
        assert_eq!(cfg.population.doodads[0].name, "kelp");
        assert_eq!(cfg.population.crab_count, 2000);
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(RuntimeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn bad_clock_is_rejected() {
        let cfg: RuntimeConfig = toml::from_str("[clock]\nmax_frame_ms = -1.0\n").unwrap();
        assert_eq!(
            cfg.validate(),
            Err(RuntimeConfigError::InvalidClock("max_frame_ms must be non-negative"))
        );
        let cfg: RuntimeConfig = toml::from_str("[clock]\ntick_ms = 0.0\n").unwrap();
        assert!(matches!(cfg.validate(), Err(RuntimeConfigError::InvalidClock(_))));
    }

    #[test]
    fn bad_sections_name_themselves() {
        let cfg: RuntimeConfig = toml::from_str("[crabs]\nturn_chance = 1.5\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().starts_with("invalid [crabs] config"));
        let cfg: RuntimeConfig =
            toml::from_str("[view]\nmin_cell_radius = 9\nmax_cell_radius = 3\n").unwrap();
        assert!(matches!(cfg.validate(), Err(RuntimeConfigError::InvalidView(_))));
    }
}
