use std::f32::consts::FRAC_PI_2;

use grotto_chunk::{ChunkGrid, EntityKey, floor_ceil_normal};
use grotto_geom::{Mat4, Vec3};
use grotto_world::TerrainHeightModel;

use crate::config::Nets;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetState {
    Flying,
    /// Holding the crab with this key; no longer integrated.
    Caught { crab: EntityKey },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Net {
    pub position: Vec3,
    pub forward: Vec3,
    pub normal: Vec3,
    pub velocity: Vec3,
    state: NetState,
}

impl Net {
    /// A net one step ahead of `origin`, moving along `forward`.
    pub fn launch(origin: Vec3, forward: Vec3, speed: f32) -> Self {
        Self {
            position: origin + forward,
            forward,
            normal: Vec3::UP,
            velocity: forward * speed,
            state: NetState::Flying,
        }
    }

    #[inline]
    pub fn state(&self) -> NetState {
        self.state
    }

    #[inline]
    pub fn is_flying(&self) -> bool {
        self.state == NetState::Flying
    }

    /// Locks the net over a crab, pulled back along the surface normal.
    pub fn catch_crab(&mut self, crab: EntityKey, crab_pos: Vec3, normal: Vec3, offset: f32) {
        self.position = crab_pos - normal * offset;
        self.normal = normal.normalized();
        self.state = NetState::Caught { crab };
    }

    /// Integrates one step of `dt` seconds; `false` once the net hit a wall.
    pub fn update(&mut self, dt: f32, cfg: &Nets, model: &TerrainHeightModel, grid: &ChunkGrid) -> bool {
        if !self.is_flying() {
            return true;
        }
        self.position += self.velocity * dt;

        let contact = floor_ceil_normal(model, grid, self.position, 0.0);
        if contact.clearance() < cfg.size
            || contact.ceil - self.position.y < cfg.size
            || self.position.y - contact.floor < cfg.size
        {
            return false;
        }

        self.velocity = self.velocity * cfg.drag.powf(dt);
        self.velocity.y -= cfg.gravity * dt;
        true
    }

    /// Model matrix with the net mouth facing along its normal.
    pub fn transform(&self) -> Mat4 {
        Mat4::target_to(self.position, self.position + self.normal, Vec3::new(0.0, 0.0, -1.0))
            .rotate_x(-FRAC_PI_2)
    }
}

/// Every net in flight or holding a crab.
#[derive(Clone, Debug, Default)]
pub struct NetManager {
    cfg: Nets,
    nets: Vec<Net>,
}

impl NetManager {
    pub fn new(cfg: &Nets) -> Self {
        Self {
            cfg: cfg.clone(),
            nets: Vec::new(),
        }
    }

    #[inline]
    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn fire(&mut self, origin: Vec3, forward: Vec3) {
        let forward = if forward.length_sq() > 0.0 {
            forward.normalized()
        } else {
            Vec3::Z
        };
        self.nets.push(Net::launch(origin, forward, self.cfg.launch_speed));
        log::debug!(target: "nets", "fired net #{} from {:?}", self.nets.len(), origin);
    }

    /// Steps all nets and drops the ones that hit a wall; returns how many were dropped.
    pub fn update(&mut self, dt: f32, model: &TerrainHeightModel, grid: &ChunkGrid) -> usize {
        let before = self.nets.len();
        for i in (0..self.nets.len()).rev() {
            if !self.nets[i].update(dt, &self.cfg, model, grid) {
                self.nets.remove(i);
            }
        }
        before - self.nets.len()
    }

    /// Lets each flying net grab the nearest wandering crab within the catch
    /// radius. Caught crabs are retagged in place; their keys are returned.
    pub fn catch_crabs(&mut self, model: &TerrainHeightModel, grid: &mut ChunkGrid) -> Vec<EntityKey> {
        let reach = self.cfg.catch_radius * self.cfg.catch_radius;
        let mut caught = Vec::new();
        for net in self.nets.iter_mut().filter(|n| n.is_flying()) {
            let target = grid
                .surrounding_chunks(net.position.x, net.position.z)
                .flat_map(|c| grid.chunk_entities(c.cx, c.cz))
                .filter(|e| e.kind.is_wandering_crab())
                .map(|e| (e.id(), (e.position - net.position).length_sq()))
                .filter(|&(_, d)| d < reach)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id);
            let Some(id) = target else {
                continue;
            };
            let Some(crab) = grid.get_mut(id) else {
                continue;
            };
            crab.mark_netted();
            let (key, pos) = (crab.key(), crab.position);
            let normal = floor_ceil_normal(model, grid, pos, 0.0).normal;
            net.catch_crab(key, pos, normal, self.cfg.crab_offset);
            log::debug!(target: "nets", "net caught crab {:?} at {:?}", key, pos);
            caught.push(key);
        }
        caught
    }

    /// Drops the net holding `crab`, if any.
    pub fn remove_net_with_crab(&mut self, crab: EntityKey) -> bool {
        match self
            .nets
            .iter()
            .position(|n| n.state == NetState::Caught { crab })
        {
            Some(i) => {
                self.nets.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn transforms(&self) -> Vec<[f32; 16]> {
        self.nets.iter().map(|n| n.transform().to_cols_array()).collect()
    }
}
