//! Cave simulation: population, visibility, crabs, nets and pickups driven
//! by a fixed-step clock.
#![forbid(unsafe_code)]

mod clock;
pub mod config;
mod crabs;
mod nets;
mod pickup;
pub mod populate;
mod visibility;

use std::sync::Arc;

use grotto_chunk::entity::{CHEST, CRAB, CRAB_NETTED};
use grotto_chunk::{ChunkGrid, GridError, InstancedEntityGroup, MeshHandle};
use grotto_geom::Vec3;
use grotto_world::{ChunkCoord, TerrainHeightModel, WorldGenParams};
use rand::SeedableRng;
use rand::rngs::SmallRng;

pub use clock::{FixedStep, RollingAverage};
pub use config::{RuntimeConfig, RuntimeConfigError, load_runtime_config};
pub use crabs::{CrabWander, WanderReport};
pub use nets::{Net, NetManager, NetState};
pub use pickup::{PickupReport, Pickups};
pub use populate::{PopulationReport, populate_world};
pub use visibility::{CameraView, ScanOutcome, ViewRanges, VisibilityScanner};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub crabs: WanderReport,
    pub nets_lost: usize,
    pub crabs_caught: usize,
    pub pickups: PickupReport,
}

/// What a renderer needs after one frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub ticks: u32,
    pub scan: ScanOutcome,
    /// Column-major instance matrices per render group, in group order.
    pub instances: Vec<(Arc<str>, Vec<[f32; 16]>)>,
    pub nets: Vec<[f32; 16]>,
}

pub struct Simulation {
    config: RuntimeConfig,
    model: TerrainHeightModel,
    grid: ChunkGrid,
    scanner: VisibilityScanner,
    groups: Vec<InstancedEntityGroup>,
    wander: CrabWander,
    nets: NetManager,
    pickups: Pickups,
    clock: FixedStep,
    frame_ms: RollingAverage,
    rng: SmallRng,
    camera: Vec3,
    forward: Vec3,
    ticks: u64,
}

impl Simulation {
    pub fn new(params: &WorldGenParams, config: RuntimeConfig, seed: u64) -> Self {
        let model = TerrainHeightModel::new(params);
        let (cx, cz) = params.map.center();
        let camera = Vec3::new(cx as f32, model.floor(cx, cz) as f32 + 2.0, cz as f32);

        let rock_kinds = config.population.rocks.kinds.max(1);
        let tags = [CHEST, CRAB, CRAB_NETTED]
            .into_iter()
            .map(String::from)
            .chain((0..rock_kinds).map(populate::rock_tag))
            .chain(config.population.doodads.iter().map(|d| d.name.clone()));
        let groups = tags
            .enumerate()
            .map(|(i, tag)| InstancedEntityGroup::new(tag, MeshHandle(i as u32)))
            .collect();

        Self {
            wander: CrabWander::new(&config.crabs, config.population.crab_lift),
            nets: NetManager::new(&config.nets),
            pickups: Pickups::new(&config.pickup),
            clock: FixedStep::new(&config.clock),
            frame_ms: RollingAverage::new(config.clock.average_window),
            grid: ChunkGrid::new(&params.map),
            scanner: VisibilityScanner::new(&params.map),
            rng: SmallRng::seed_from_u64(seed),
            groups,
            model,
            config,
            camera,
            forward: Vec3::X,
            ticks: 0,
        }
    }

    pub fn populate(&mut self) -> Result<Vec<PopulationReport>, GridError> {
        let reports = populate_world(&self.config, &self.model, &mut self.grid, &mut self.rng)?;
        log::info!(target: "sim", "populated {} entities", self.grid.len());
        Ok(reports)
    }

    #[inline]
    pub fn model(&self) -> &TerrainHeightModel {
        &self.model
    }

    #[inline]
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    #[inline]
    pub fn scanner(&self) -> &VisibilityScanner {
        &self.scanner
    }

    #[inline]
    pub fn nets(&self) -> &NetManager {
        &self.nets
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.pickups.score()
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn camera(&self) -> (Vec3, Vec3) {
        (self.camera, self.forward)
    }

    pub fn average_frame_ms(&self) -> Option<f64> {
        self.frame_ms.average()
    }

    pub fn set_camera(&mut self, position: Vec3, forward: Vec3) {
        self.camera = position;
        if forward.length_sq() > 0.0 {
            self.forward = forward.normalized();
        }
    }

    pub fn fire_net(&mut self) {
        self.nets.fire(self.camera, self.forward);
    }

    /// One fixed step of `dt` seconds over the chunks active at the last scan.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, GridError> {
        let active: Vec<ChunkCoord> = self.scanner.active().to_vec();
        let crabs = self
            .wander
            .update(&mut self.grid, &self.model, &active, self.camera, dt, &mut self.rng)?;
        let nets_lost = self.nets.update(dt, &self.model, &self.grid);
        let crabs_caught = self.nets.catch_crabs(&self.model, &mut self.grid).len();
        let pickups = self.pickups.collect(self.camera, &mut self.grid, &mut self.nets);
        self.ticks += 1;
        Ok(TickReport {
            crabs,
            nets_lost,
            crabs_caught,
            pickups,
        })
    }

    /// Runs the ticks that `frame_ms` of wall time owes, then rescans
    /// visibility and gathers instance data.
    pub fn frame(&mut self, frame_ms: f64) -> Result<FrameOutput, GridError> {
        self.frame_ms.add(frame_ms);
        let ticks = self.clock.advance(frame_ms);
        let dt = self.clock.tick_seconds();
        for _ in 0..ticks {
            self.tick(dt)?;
        }

        let ranges = ViewRanges::from_forward(self.forward, &self.config.view);
        let scan = self
            .scanner
            .scan(&self.model, &ranges.camera(self.camera, self.forward));
        let instances = self
            .groups
            .iter()
            .map(|g| (g.type_tag.clone(), g.collect(&self.grid, &scan.chunks)))
            .collect();
        Ok(FrameOutput {
            ticks,
            scan,
            instances,
            nets: self.nets.transforms(),
        })
    }
}
