//! Rejection-sampling placement of rocks, chests, crabs and doodads.

use std::f32::consts::PI;
use std::sync::Arc;

use grotto_chunk::entity::{CHEST, CRAB};
use grotto_chunk::{ChunkGrid, EntityKind, EntitySpec, GridError, floor_ceil_normal};
use grotto_geom::{Mat4, Quat, Vec3};
use grotto_world::TerrainHeightModel;
use rand::Rng;

use crate::config::{RuntimeConfig, default_clearance};
use crate::crabs::crab_transform;

/// Outcome of placing one kind of entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopulationReport {
    pub tag: Arc<str>,
    pub requested: usize,
    pub placed: usize,
    pub attempts: u64,
}

/// Kind-specific half of the placement loop.
pub trait Placer {
    fn tag(&self) -> &Arc<str>;

    /// Minimum floor-to-ceiling gap at a candidate.
    fn clearance(&self) -> f64;

    /// Extra veto after the terrain accepted `candidate` (floor height in `y`).
    fn rejects(&self, _model: &TerrainHeightModel, _grid: &ChunkGrid, _candidate: Vec3) -> bool {
        false
    }

    fn build<R: Rng>(
        &mut self,
        model: &TerrainHeightModel,
        grid: &ChunkGrid,
        candidate: Vec3,
        rng: &mut R,
    ) -> EntitySpec;
}

/// Places up to `count` entities, sampling at most `attempt_cap` candidates
/// for each. Entities that exhaust their attempts are skipped.
pub fn populate<P: Placer, R: Rng>(
    placer: &mut P,
    count: usize,
    attempt_cap: u32,
    model: &TerrainHeightModel,
    grid: &mut ChunkGrid,
    rng: &mut R,
) -> Result<PopulationReport, GridError> {
    let w = grid.map().world_size_x() as f32;
    let h = grid.map().world_size_z() as f32;
    let mut report = PopulationReport {
        tag: placer.tag().clone(),
        requested: count,
        placed: 0,
        attempts: 0,
    };
    for _ in 0..count {
        for _ in 0..attempt_cap {
            report.attempts += 1;
            let x: f32 = rng.random_range(0.0..w);
            let z: f32 = rng.random_range(0.0..h);
            if grid.chunk_of(x, z).is_none() {
                continue;
            }
            let Some(floor) =
                model.valid_floor_position(f64::from(x), f64::from(z), placer.clearance())
            else {
                continue;
            };
            let candidate = Vec3::new(x, floor as f32, z);
            if placer.rejects(model, grid, candidate) {
                continue;
            }
            let spec = placer.build(model, grid, candidate, rng);
            grid.insert(x, z, spec)?;
            report.placed += 1;
            break;
        }
    }
    if report.placed < report.requested {
        log::debug!(
            target: "populate",
            "{}: placed {}/{} after {} attempts",
            report.tag,
            report.placed,
            report.requested,
            report.attempts
        );
    }
    Ok(report)
}

/// Orientation with local +Y along `normal`, the way floor-mounted props are modelled.
fn upright_on(pos: Vec3, normal: Vec3) -> Mat4 {
    Mat4::target_to(pos, pos + normal, Vec3::Z).rotate_x(PI / 2.0)
}

pub fn rock_tag(i: usize) -> String {
    match u8::try_from(i) {
        Ok(n) if n < 26 => format!("rock_{}", char::from(b'A' + n)),
        _ => format!("rock_{}", i + 1),
    }
}

pub struct RockPlacer {
    tag: Arc<str>,
    min_radius: f32,
    max_radius: f32,
    sink: f32,
    clearance: f64,
}

impl RockPlacer {
    pub fn new(tag: impl Into<Arc<str>>, cfg: &crate::config::Rocks) -> Self {
        Self {
            tag: tag.into(),
            min_radius: cfg.min_radius,
            max_radius: cfg.max_radius.max(cfg.min_radius),
            sink: cfg.sink,
            clearance: cfg.clearance,
        }
    }

    fn spec(&self, floor_at: Vec3, radius: f32, tilt_x: f32, tilt_y: f32) -> EntitySpec {
        let pos = Vec3::new(floor_at.x, floor_at.y - radius * self.sink, floor_at.z);
        let transform = Mat4::from_translation(pos)
            .scale(Vec3::new(radius, radius, radius))
            .rotate_x(tilt_x)
            .rotate_y(tilt_y);
        EntitySpec::new(self.tag.clone(), EntityKind::Rock { radius }, pos, transform)
    }
}

impl Placer for RockPlacer {
    fn tag(&self) -> &Arc<str> {
        &self.tag
    }

    fn clearance(&self) -> f64 {
        self.clearance
    }

    fn build<R: Rng>(
        &mut self,
        _model: &TerrainHeightModel,
        _grid: &ChunkGrid,
        candidate: Vec3,
        rng: &mut R,
    ) -> EntitySpec {
        let radius = if self.max_radius > self.min_radius {
            rng.random_range(self.min_radius..self.max_radius)
        } else {
            self.min_radius
        };
        let tilt_x = rng.random_range(0.0..PI);
        let tilt_y = rng.random_range(0.0..PI);
        self.spec(candidate, radius, tilt_x, tilt_y)
    }
}

pub struct ChestPlacer {
    tag: Arc<str>,
    sink: f32,
    clearance: f64,
}

impl ChestPlacer {
    pub fn new(cfg: &crate::config::Chests) -> Self {
        Self {
            tag: Arc::from(CHEST),
            sink: cfg.sink,
            clearance: cfg.clearance,
        }
    }
}

impl Placer for ChestPlacer {
    fn tag(&self) -> &Arc<str> {
        &self.tag
    }

    fn clearance(&self) -> f64 {
        self.clearance
    }

    fn build<R: Rng>(
        &mut self,
        model: &TerrainHeightModel,
        grid: &ChunkGrid,
        candidate: Vec3,
        rng: &mut R,
    ) -> EntitySpec {
        let contact = floor_ceil_normal(model, grid, candidate, 0.0);
        let pos = Vec3::new(candidate.x, contact.floor - self.sink, candidate.z);
        let q = Quat::rotation_to(Vec3::Z, contact.normal)
            .rotate_x(PI / 2.0)
            .rotate_y(rng.random_range(0.0..PI));
        EntitySpec::new(
            self.tag.clone(),
            EntityKind::Chest,
            pos,
            Mat4::from_rotation_translation(q, pos),
        )
    }
}

pub struct CrabPlacer {
    tag: Arc<str>,
    size: f32,
    lift: f32,
    clearance: f64,
}

impl CrabPlacer {
    pub fn new(size: f32, lift: f32, clearance: f64) -> Self {
        Self {
            tag: Arc::from(CRAB),
            size,
            lift,
            clearance,
        }
    }
}

impl Placer for CrabPlacer {
    fn tag(&self) -> &Arc<str> {
        &self.tag
    }

    fn clearance(&self) -> f64 {
        self.clearance
    }

    /// Compares against the height `build` would use, so crabs on the same
    /// rock are spaced like crabs on open floor.
    fn rejects(&self, model: &TerrainHeightModel, grid: &ChunkGrid, candidate: Vec3) -> bool {
        let limit = self.size * self.size;
        let floor = floor_ceil_normal(model, grid, candidate, 0.0).floor;
        let at = Vec3::new(candidate.x, floor + self.lift, candidate.z);
        grid.surrounding_chunks(candidate.x, candidate.z)
            .flat_map(|c| grid.chunk_entities(c.cx, c.cz))
            .filter(|e| e.has_tag(&self.tag))
            .any(|e| (e.position - at).length_sq() < limit)
    }

    fn build<R: Rng>(
        &mut self,
        model: &TerrainHeightModel,
        grid: &ChunkGrid,
        candidate: Vec3,
        rng: &mut R,
    ) -> EntitySpec {
        let contact = floor_ceil_normal(model, grid, candidate, 0.0);
        let pos = Vec3::new(candidate.x, contact.floor + self.lift, candidate.z);
        let velocity = Vec3::new(rng.random_range(-1.0..1.0), 0.0, rng.random_range(-1.0..1.0));
        let forward = if velocity.length_sq() > 0.0 {
            velocity.normalized()
        } else {
            Vec3::X
        };
        EntitySpec::new(
            self.tag.clone(),
            EntityKind::Crab { velocity, forward },
            pos,
            crab_transform(pos, forward, contact.normal),
        )
    }
}

pub struct DoodadPlacer {
    tag: Arc<str>,
    billboard: bool,
    clearance: f64,
}

impl DoodadPlacer {
    pub fn new(tag: impl Into<Arc<str>>, billboard: bool, clearance: f64) -> Self {
        Self {
            tag: tag.into(),
            billboard,
            clearance,
        }
    }
}

impl Placer for DoodadPlacer {
    fn tag(&self) -> &Arc<str> {
        &self.tag
    }

    fn clearance(&self) -> f64 {
        self.clearance
    }

    fn build<R: Rng>(
        &mut self,
        model: &TerrainHeightModel,
        grid: &ChunkGrid,
        candidate: Vec3,
        _rng: &mut R,
    ) -> EntitySpec {
        let contact = floor_ceil_normal(model, grid, candidate, 0.0);
        let pos = Vec3::new(candidate.x, contact.floor, candidate.z);
        let transform = if self.billboard {
            Mat4::from_translation(pos)
        } else {
            upright_on(pos, contact.normal)
        };
        EntitySpec::new(
            self.tag.clone(),
            EntityKind::Doodad {
                billboard: self.billboard,
            },
            pos,
            transform,
        )
    }
}

/// Fills an empty grid: rocks first so later kinds can sit on them, then
/// chests, crabs and doodads.
pub fn populate_world<R: Rng>(
    config: &RuntimeConfig,
    model: &TerrainHeightModel,
    grid: &mut ChunkGrid,
    rng: &mut R,
) -> Result<Vec<PopulationReport>, GridError> {
    let cfg = &config.population;
    let cap = cfg.attempt_cap;
    let (cx, cz) = model.center();
    let mut reports = Vec::new();

    let kinds = cfg.rocks.kinds.max(1);
    let mut remaining = cfg.rocks.count;
    for i in 0..kinds {
        let mut placer = RockPlacer::new(rock_tag(i), &cfg.rocks);
        let mut share = cfg.rocks.count / kinds + usize::from(i < cfg.rocks.count % kinds);
        share = share.min(remaining);
        remaining -= share;
        let mut anchored = 0;
        if i == 0 && share > 0 {
            let at = Vec3::new(cx as f32, model.floor(cx, cz) as f32, cz as f32);
            grid.insert(at.x, at.z, placer.spec(at, cfg.rocks.anchor_radius, 0.0, 0.0))?;
            anchored = 1;
        }
        let mut report = populate(&mut placer, share - anchored, cap, model, grid, rng)?;
        report.requested += anchored;
        report.placed += anchored;
        reports.push(report);
    }

    let mut chests = ChestPlacer::new(&cfg.chests);
    let mut anchored = 0;
    let (x, z) = (cx + cfg.chests.anchor_offset, cz + cfg.chests.anchor_offset);
    if cfg.chests.count > 0 && grid.chunk_of(x as f32, z as f32).is_some() {
        let pos = Vec3::new(x as f32, model.floor(x, z) as f32, z as f32);
        let spec = EntitySpec::new(
            CHEST,
            EntityKind::Chest,
            pos,
            upright_on(pos, model.normal_at_floor(x, z)),
        );
        grid.insert(pos.x, pos.z, spec)?;
        anchored = 1;
    }
    let mut report = populate(&mut chests, cfg.chests.count - anchored, cap, model, grid, rng)?;
    report.requested += anchored;
    report.placed += anchored;
    reports.push(report);

    let mut crabs = CrabPlacer::new(config.crabs.size, cfg.crab_lift, cfg.crab_clearance);
    reports.push(populate(&mut crabs, cfg.crab_count, cap, model, grid, rng)?);

    for kind in &cfg.doodads {
        let mut placer = DoodadPlacer::new(kind.name.as_str(), kind.billboard, default_clearance());
        reports.push(populate(&mut placer, kind.count, cap, model, grid, rng)?);
    }

    for r in &reports {
        log::info!(
            target: "populate",
            "{:<14} placed {:>5}/{:<5} ({} attempts)",
            r.tag,
            r.placed,
            r.requested,
            r.attempts
        );
    }
    Ok(reports)
}
