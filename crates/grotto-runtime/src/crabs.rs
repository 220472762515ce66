use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use grotto_chunk::{ChunkGrid, Entity, EntityKind, GridError, floor_ceil_normal};
use grotto_geom::{Mat4, Vec3};
use grotto_world::{ChunkCoord, TerrainHeightModel};
use hashbrown::HashMap;
use rand::Rng;

use crate::config::Crabs;

/// Heading offsets tried in order when the straight step is blocked, with the
/// fraction of speed used for each.
const TRIALS: [(f32, f32); 5] = [
    (0.0, 1.0),
    (FRAC_PI_4, 0.75),
    (-FRAC_PI_4, 0.75),
    (FRAC_PI_2, 0.5),
    (-FRAC_PI_2, 0.5),
];

/// Crab model space: local +Y on the surface normal, facing sideways.
pub(crate) fn crab_transform(pos: Vec3, forward: Vec3, normal: Vec3) -> Mat4 {
    let right = forward.cross(normal);
    Mat4::target_to(pos, pos + right, normal)
}

fn yawed(v: Vec3, radians: f32) -> Vec3 {
    let r = v.xz().rotated(radians);
    Vec3::new(r.x, 0.0, r.y)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WanderReport {
    pub crabs: usize,
    pub moved: usize,
    pub stuck: usize,
    pub fled: usize,
}

/// Per-tick crab movement over the rock-augmented floor.
#[derive(Clone, Debug)]
pub struct CrabWander {
    cfg: Crabs,
    lift: f32,
}

impl CrabWander {
    pub fn new(cfg: &Crabs, lift: f32) -> Self {
        Self {
            cfg: cfg.clone(),
            lift,
        }
    }

    /// Advances every wandering crab in `chunks` by `dt` seconds.
    ///
    /// Crabs are taken out of the grid first, so each is stepped exactly once
    /// even when it crosses into a chunk that is visited later, and then put
    /// back at their new positions.
    pub fn update<R: Rng>(
        &self,
        grid: &mut ChunkGrid,
        model: &TerrainHeightModel,
        chunks: &[ChunkCoord],
        camera: Vec3,
        dt: f32,
        rng: &mut R,
    ) -> Result<WanderReport, GridError> {
        let mut crabs: Vec<Entity> = Vec::new();
        for &c in chunks {
            crabs.extend(grid.drain_chunk_where(c, |e| e.kind.is_wandering_crab()));
        }

        let mut by_chunk: HashMap<ChunkCoord, Vec<usize>> = HashMap::new();
        for (i, crab) in crabs.iter().enumerate() {
            if let Some(c) = grid.chunk_of(crab.position.x, crab.position.z) {
                by_chunk.entry(c).or_default().push(i);
            }
        }

        let mut report = WanderReport {
            crabs: crabs.len(),
            ..WanderReport::default()
        };
        for i in 0..crabs.len() {
            let step = self.step(&crabs[i], grid, model, camera, dt, rng);
            if step.fled {
                report.fled += 1;
            }
            let start = crabs[i].position;
            let mut target = step.target;
            if let Some(to) = target {
                if self.crowded(grid, &crabs, &by_chunk, i, start, to) {
                    target = None;
                }
            }

            let (pos, velocity, forward) = match target {
                Some(to) => {
                    report.moved += 1;
                    (to, step.heading * step.speed, step.heading)
                }
                None => {
                    report.stuck += 1;
                    (start, Vec3::ZERO, step.facing)
                }
            };

            let contact = floor_ceil_normal(model, grid, pos, 0.0);
            let pos = Vec3::new(pos.x, contact.floor + self.lift, pos.z);
            let from = grid.chunk_of(start.x, start.z);
            let to = grid.chunk_of(pos.x, pos.z);
            if from != to {
                if let Some(list) = from.and_then(|c| by_chunk.get_mut(&c)) {
                    list.retain(|&j| j != i);
                }
                if let Some(c) = to {
                    by_chunk.entry(c).or_default().push(i);
                }
            }

            let crab = &mut crabs[i];
            crab.position = pos;
            crab.kind = EntityKind::Crab { velocity, forward };
            crab.transform = crab_transform(pos, forward, contact.normal);
        }

        for crab in crabs {
            grid.relocate(crab)?;
        }
        log::trace!(
            target: "crabs",
            "{} crabs: {} moved, {} stuck, {} fleeing",
            report.crabs,
            report.moved,
            report.stuck,
            report.fled
        );
        Ok(report)
    }

    fn step<R: Rng>(
        &self,
        crab: &Entity,
        grid: &ChunkGrid,
        model: &TerrainHeightModel,
        camera: Vec3,
        dt: f32,
        rng: &mut R,
    ) -> Step {
        let (mut velocity, facing) = match crab.kind {
            EntityKind::Crab { velocity, forward } => (velocity, forward),
            _ => (Vec3::ZERO, Vec3::X),
        };
        velocity.y = 0.0;
        if velocity.length_sq() == 0.0 {
            velocity = Vec3::new(rng.random_range(-1.0..1.0), 0.0, rng.random_range(-1.0..1.0));
        }
        if rng.random_bool(self.cfg.turn_chance.clamp(0.0, 1.0)) && self.cfg.max_turn > 0.0 {
            velocity = yawed(velocity, rng.random_range(-self.cfg.max_turn..self.cfg.max_turn));
        }

        let mut heading = if velocity.length_sq() > 0.0 {
            velocity.normalized()
        } else {
            facing
        };
        let mut speed = self.cfg.speed;
        let mut fled = false;
        let mut away = crab.position - camera;
        away.y = 0.0;
        let d2 = away.length_sq();
        if d2 > 0.0 && d2 < self.cfg.flee_radius * self.cfg.flee_radius {
            heading = away.normalized();
            speed = self.cfg.flee_speed;
            fled = true;
        }

        let target = TRIALS.iter().find_map(|&(angle, factor)| {
            let dir = yawed(heading, angle);
            let to = crab.position + dir * (speed * factor * dt);
            self.fits(grid, model, to).then_some((to, dir))
        });
        match target {
            Some((to, dir)) => Step {
                target: Some(to),
                heading: dir,
                facing,
                speed,
                fled,
            },
            None => Step {
                target: None,
                heading,
                facing,
                speed,
                fled,
            },
        }
    }

    fn fits(&self, grid: &ChunkGrid, model: &TerrainHeightModel, at: Vec3) -> bool {
        if grid.chunk_of(at.x, at.z).is_none() {
            return false;
        }
        let contact = floor_ceil_normal(model, grid, at, 0.0);
        !contact.solid && contact.clearance() >= self.cfg.size
    }

    /// A move is refused when it brings the crab closer than the minimum
    /// separation to another crab in the destination chunk.
    fn crowded(
        &self,
        grid: &ChunkGrid,
        crabs: &[Entity],
        by_chunk: &HashMap<ChunkCoord, Vec<usize>>,
        me: usize,
        from: Vec3,
        to: Vec3,
    ) -> bool {
        let Some(c) = grid.chunk_of(to.x, to.z) else {
            return true;
        };
        let limit = self.cfg.min_separation * self.cfg.min_separation;
        let too_close = |other: Vec3| {
            let d = horizontal_sq(to, other);
            d < limit && d < horizontal_sq(from, other)
        };
        let moving = by_chunk
            .get(&c)
            .into_iter()
            .flatten()
            .filter(|&&j| j != me)
            .any(|&j| too_close(crabs[j].position));
        moving
            || grid
                .chunk_entities(c.cx, c.cz)
                .iter()
                .filter(|e| matches!(e.kind, EntityKind::Crab { .. } | EntityKind::NettedCrab))
                .any(|e| too_close(e.position))
    }
}

fn horizontal_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

struct Step {
    target: Option<Vec3>,
    heading: Vec3,
    facing: Vec3,
    speed: f32,
    fled: bool,
}
