use grotto_chunk::ChunkGrid;
use grotto_runtime::config::{Crabs, Rocks};
use grotto_runtime::populate::{CrabPlacer, DoodadPlacer, RockPlacer, populate};
use grotto_runtime::{CrabWander, FixedStep, RollingAverage};
use grotto_world::{ChunkCoord, TerrainHeightModel, WorldGenParams};
use grotto_geom::Vec3;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn small_params() -> WorldGenParams {
    let mut p = WorldGenParams::default();
    p.map.x_chunks = 24;
    p.map.z_chunks = 24;
    p
}

fn all_chunks(grid: &ChunkGrid) -> Vec<ChunkCoord> {
    let m = grid.map();
    (0..m.z_chunks as i32)
        .flat_map(|cz| (0..m.x_chunks as i32).map(move |cx| ChunkCoord::new(cx, cz)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // Placed entities always sit on carved floor with the requested headroom
    #[test]
    fn placements_land_on_valid_floor(seed in any::<u64>(), count in 1usize..60) {
        let p = small_params();
        let model = TerrainHeightModel::new(&p);
        let mut grid = ChunkGrid::new(&p.map);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut placer = DoodadPlacer::new("kelp", true, 1.0);
        let report = populate(&mut placer, count, 500, &model, &mut grid, &mut rng).unwrap();
        prop_assert_eq!(report.placed, grid.len());
        prop_assert!(report.placed <= count);
        prop_assert!(report.attempts <= count as u64 * 500);
        for e in grid.iter() {
            let (x, z) = (f64::from(e.position.x), f64::from(e.position.z));
            let floor = model.valid_floor_position(x, z, 1.0);
            prop_assert!(floor.is_some());
            prop_assert_eq!(e.position.y, floor.unwrap_or_default() as f32);
        }
    }

    // Terrain with no carved tunnels yields nothing, after exactly count * cap attempts
    #[test]
    fn solid_world_exhausts_attempts(seed in any::<u64>(), count in 0usize..20, cap in 1u32..200) {
        let mut p = small_params();
        p.terrain.tunnel_half_width = 0.0;
        p.terrain.cavern_boost = 0.0;
        let model = TerrainHeightModel::new(&p);
        let mut grid = ChunkGrid::new(&p.map);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut placer = RockPlacer::new("rock_A", &Rocks::default());
        let report = populate(&mut placer, count, cap, &model, &mut grid, &mut rng).unwrap();
        prop_assert_eq!(report.placed, 0);
        prop_assert_eq!(report.attempts, count as u64 * u64::from(cap));
        prop_assert!(grid.is_empty());
    }

    // No two crabs are placed closer than the crab size
    #[test]
    fn crabs_do_not_overlap(seed in any::<u64>()) {
        let p = small_params();
        let model = TerrainHeightModel::new(&p);
        let mut grid = ChunkGrid::new(&p.map);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut placer = CrabPlacer::new(0.4, 0.05, 1.0);
        populate(&mut placer, 200, 2000, &model, &mut grid, &mut rng).unwrap();
        let crabs: Vec<Vec3> = grid.iter().map(|e| e.position).collect();
        for (i, a) in crabs.iter().enumerate() {
            for b in &crabs[i + 1..] {
                prop_assert!((*a - *b).length_sq() >= 0.4 * 0.4);
            }
        }
    }

    // Wandering never loses or duplicates a crab, and keys survive relocation
    #[test]
    fn wander_preserves_crabs(seed in any::<u64>(), ticks in 1usize..30) {
        let p = small_params();
        let model = TerrainHeightModel::new(&p);
        let mut grid = ChunkGrid::new(&p.map);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut placer = CrabPlacer::new(0.4, 0.05, 1.0);
        populate(&mut placer, 40, 2000, &model, &mut grid, &mut rng).unwrap();
        let mut keys: Vec<_> = grid.iter().map(|e| e.key()).collect();
        keys.sort();

        let wander = CrabWander::new(&Crabs::default(), 0.05);
        let chunks = all_chunks(&grid);
        let (cx, cz) = model.center();
        let camera = Vec3::new(cx as f32, 0.0, cz as f32);
        for _ in 0..ticks {
            let r = wander.update(&mut grid, &model, &chunks, camera, 1.0 / 60.0, &mut rng).unwrap();
            prop_assert_eq!(r.crabs, keys.len());
            prop_assert_eq!(r.moved + r.stuck, r.crabs);
        }
        let mut after: Vec<_> = grid.iter().map(|e| e.key()).collect();
        after.sort();
        prop_assert_eq!(after, keys);
        for (slot_owner, e) in grid.iter().map(|e| (e.id(), e)) {
            prop_assert_eq!(grid.get(slot_owner).map(|g| g.key()), Some(e.key()));
        }
    }

    // The clock never runs more ticks than the clamped frame time allows
    #[test]
    fn clock_ticks_are_bounded(frames in prop::collection::vec(0.0f64..400.0, 1..50)) {
        let cfg = grotto_runtime::config::Clock::default();
        let mut clock = FixedStep::new(&cfg);
        let mut total_ms = 0.0;
        let mut ticks = 0u64;
        for f in frames {
            total_ms += f.min(cfg.max_frame_ms);
            ticks += u64::from(clock.advance(f));
        }
        prop_assert!(ticks as f64 * cfg.tick_ms <= total_ms + 1e-6);
        prop_assert!((ticks as f64 + 1.0) * cfg.tick_ms >= total_ms - 1e-6);
    }

    // The rolling average matches a plain mean of the last window samples
    #[test]
    fn rolling_average_matches_window_mean(xs in prop::collection::vec(0.0f64..100.0, 1..60), window in 1usize..25) {
        let mut avg = RollingAverage::new(window);
        for &x in &xs {
            avg.add(x);
        }
        let tail = &xs[xs.len().saturating_sub(window)..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        let got = avg.average().unwrap_or(f64::NAN);
        prop_assert!((got - mean).abs() < 1e-9);
    }
}
