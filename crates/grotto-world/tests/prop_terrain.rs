use grotto_world::noise::{CellularNoise, GradientNoise, Noise2D, NoiseSeeds};
use grotto_world::{TerrainHeightModel, WorldGenParams};
use proptest::prelude::*;

fn model() -> TerrainHeightModel {
    TerrainHeightModel::new(&WorldGenParams::default())
}

fn map_pos() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..500.0, 0.0f64..500.0)
}

proptest! {
    // Two independently built models agree bit for bit
    #[test]
    fn height_field_is_deterministic((x, z) in map_pos()) {
        let a = model().floor_and_ceiling(x, z);
        let b = model().floor_and_ceiling(x, z);
        prop_assert_eq!(a.floor.to_bits(), b.floor.to_bits());
        prop_assert_eq!(a.ceil.to_bits(), b.ceil.to_bits());
        prop_assert_eq!(a.solid, b.solid);
    }

    // A valid position always reports the model floor and enough headroom
    #[test]
    fn valid_floor_respects_clearance((x, z) in map_pos(), clearance in 0.0f64..10.0) {
        let m = model();
        let h = m.floor_and_ceiling(x, z);
        match m.valid_floor_position(x, z, clearance) {
            Some(floor) => {
                prop_assert!(!h.solid);
                prop_assert_eq!(floor, h.floor);
                prop_assert!(h.ceil >= h.floor);
                prop_assert!(h.clearance() >= clearance);
            }
            None => prop_assert!(h.solid || h.clearance() < clearance),
        }
    }

    // Solid rock reports floor = b + 3 above ceil = b - 3
    #[test]
    fn solid_positions_are_inverted((x, z) in map_pos()) {
        let m = model();
        let shape = m.shape(x, z);
        let h = m.floor_and_ceiling(x, z);
        if shape.is_solid() {
            prop_assert!(h.floor > h.ceil);
            prop_assert!((h.floor - h.ceil - 6.0).abs() < 1e-9);
            prop_assert!(!h.is_open());
            prop_assert_eq!(m.valid_floor_position(x, z, 0.0), None);
        } else {
            prop_assert!(shape.s > 0.0);
        }
    }

    // Everything beyond the carved disc is solid
    #[test]
    fn corners_are_solid(angle in 0.0f64..std::f64::consts::TAU, extra in 0.5f64..100.0) {
        let m = model();
        let (cx, cz) = m.center();
        let r = m.radius() + extra;
        let (x, z) = (cx + r * angle.cos(), cz + r * angle.sin());
        prop_assert!(m.floor_and_ceiling(x, z).solid);
        prop_assert_eq!(m.valid_floor_position(x, z, 0.0), None);
    }

    // Gradient noise stays inside [0, amplitude], cellular ridge is non-negative
    #[test]
    fn noise_ranges(x in -1000.0f64..1000.0, y in -1000.0f64..1000.0) {
        let seeds = NoiseSeeds::default();
        let g = GradientNoise::new(40.0, 70.0, seeds).sample(x, y);
        prop_assert!((0.0..=70.0).contains(&g));
        let w = CellularNoise::new(30.0, 21.0, seeds).sample(x, y);
        prop_assert!(w >= 0.0);
        prop_assert!(w.is_finite());
    }

    // Floor normals are unit length and face upward
    #[test]
    fn floor_normals_face_up((x, z) in map_pos()) {
        let n = model().normal_at_floor(x, z);
        prop_assert!((n.length() - 1.0).abs() < 1e-4);
        prop_assert!(n.y > 0.0);
    }
}

#[test]
fn center_scenario() {
    let m = model();
    let shape = m.shape(250.0, 250.0);
    assert_eq!(shape.s, 23.0);
    assert_eq!(shape.f, 0.5);
}

#[test]
fn far_corner_scenario() {
    let m = model();
    assert_eq!(m.radius(), 250.0);
    let h = m.floor_and_ceiling(0.0, 0.0);
    let b = m.shape(0.0, 0.0).b;
    assert_eq!(h.floor, b + 3.0);
    assert_eq!(h.ceil, b - 3.0);
    assert_eq!(m.valid_floor_position(0.0, 0.0, 1.0), None);
}
