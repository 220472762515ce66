use grotto_chunk::{ChunkGrid, EntityId, EntityKind, EntitySpec, floor_ceil_normal};
use grotto_geom::{Mat4, Vec3};
use grotto_world::{ChunkCoord, MapParams, TerrainHeightModel, WorldGenParams};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(f32, f32),
    Remove(usize),
}

fn small_map() -> MapParams {
    MapParams {
        x_chunks: 4,
        z_chunks: 4,
        ..MapParams::default()
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f32..25.0, 0.0f32..25.0).prop_map(|(x, z)| Op::Insert(x, z)),
        (0usize..64).prop_map(Op::Remove),
    ]
}

fn spec(x: f32, z: f32) -> EntitySpec {
    let p = Vec3::new(x, 0.0, z);
    EntitySpec::new("chest", EntityKind::Chest, p, Mat4::from_translation(p))
}

fn assert_ids_consistent(g: &ChunkGrid) -> Result<(), TestCaseError> {
    let mut total = 0;
    for cz in 0..4 {
        for cx in 0..4 {
            for (slot, e) in g.chunk_entities(cx, cz).iter().enumerate() {
                prop_assert_eq!(e.id(), EntityId::new(cx as u16, cz as u16, slot as u32));
                prop_assert_eq!(g.chunk_of(e.position.x, e.position.z), Some(ChunkCoord::new(cx, cz)));
                total += 1;
            }
        }
    }
    prop_assert_eq!(total, g.len());
    Ok(())
}

proptest! {
    // Every live id names the chunk and slot where its entity sits, after any mix of ops
    #[test]
    fn ids_track_slots(ops in prop::collection::vec(op(), 1..120)) {
        let mut g = ChunkGrid::new(&small_map());
        let mut live: Vec<EntityId> = Vec::new();
        for op in ops {
            match op {
                Op::Insert(x, z) => {
                    let id = g.insert(x, z, spec(x, z)).unwrap();
                    prop_assert_eq!(g.get(id).map(|e| e.position.x), Some(x));
                    live.push(id);
                }
                Op::Remove(i) => {
                    let all: Vec<EntityId> = g.iter().map(|e| e.id()).collect();
                    if all.is_empty() {
                        prop_assert!(!g.remove(EntityId::new(0, 0, 0)));
                    } else {
                        let id = all[i % all.len()];
                        let before = g.len();
                        prop_assert!(g.remove(id));
                        prop_assert_eq!(g.len(), before - 1);
                    }
                }
            }
            assert_ids_consistent(&g)?;
        }
        prop_assert!(live.len() >= g.len());
    }

    // Removing the same slot twice in a single-entity chunk fails the second time
    #[test]
    fn double_remove_reports_false(x in 0.0f32..25.0, z in 0.0f32..25.0) {
        let mut g = ChunkGrid::new(&small_map());
        let id = g.insert(x, z, spec(x, z)).unwrap();
        prop_assert!(g.remove(id));
        prop_assert!(!g.remove(id));
        prop_assert!(g.is_empty());
    }

    // Rocks only ever raise the effective floor
    #[test]
    fn rocks_never_lower_the_floor(
        rocks in prop::collection::vec((230.0f32..270.0, -40.0f32..10.0, 230.0f32..270.0, 0.5f32..5.0), 0..12),
        qx in 235.0f32..265.0,
        qz in 235.0f32..265.0,
        radius in 0.0f32..2.0,
    ) {
        let p = WorldGenParams::default();
        let model = TerrainHeightModel::new(&p);
        let mut g = ChunkGrid::new(&p.map);
        for (x, y, z, r) in rocks {
            let at = Vec3::new(x, y, z);
            g.insert(x, z, EntitySpec::new("rock_B", EntityKind::Rock { radius: r }, at, Mat4::from_translation(at))).unwrap();
        }
        let contact = floor_ceil_normal(&model, &g, Vec3::new(qx, 0.0, qz), radius);
        let base = model.floor_and_ceiling(f64::from(qx), f64::from(qz));
        prop_assert!(contact.floor >= base.floor as f32);
        prop_assert_eq!(contact.ceil, base.ceil as f32);
        prop_assert!((contact.normal.length() - 1.0).abs() < 1e-4);
    }
}
