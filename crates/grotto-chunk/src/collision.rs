use grotto_geom::Vec3;
use grotto_world::TerrainHeightModel;

use crate::grid::ChunkGrid;

/// Result of the floor/ceiling query at one position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    pub floor: f32,
    pub ceil: f32,
    pub normal: Vec3,
    /// Position is inside solid rock.
    pub solid: bool,
}

impl SurfaceContact {
    #[inline]
    pub fn clearance(&self) -> f32 {
        self.ceil - self.floor
    }
}

/// Terrain floor and ceiling at `position`, with the floor raised over any
/// rock in the surrounding chunks whose sphere, grown by `collision_radius`,
/// covers the point horizontally. Rocks never lower the floor.
///
/// Only horizontal distance is tested: rocks are assumed to rest on the
/// terrain floor, as the populators place them. A rock floating clear of the
/// floor would still lift the floor to its top.
pub fn floor_ceil_normal(
    model: &TerrainHeightModel,
    grid: &ChunkGrid,
    position: Vec3,
    collision_radius: f32,
) -> SurfaceContact {
    let (x, z) = (f64::from(position.x), f64::from(position.z));
    let base = model.floor_and_ceiling(x, z);
    let mut contact = SurfaceContact {
        floor: base.floor as f32,
        ceil: base.ceil as f32,
        normal: model.normal_at_floor(x, z),
        solid: base.solid,
    };

    for c in grid.surrounding_chunks(position.x, position.z) {
        for rock in grid.chunk_entities(c.cx, c.cz) {
            let Some(radius) = rock.kind.rock_radius() else {
                continue;
            };
            let r = radius + collision_radius;
            let dx = position.x - rock.position.x;
            let dz = position.z - rock.position.z;
            let h_sq = dx * dx + dz * dz;
            if h_sq >= r * r {
                continue;
            }
            let dy = (r * r - h_sq).sqrt();
            let top = rock.position.y + dy;
            if top > contact.floor {
                contact.floor = top;
                contact.normal = Vec3::new(dx, dy, dz).normalized();
            }
        }
    }
    contact
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, EntitySpec};
    use grotto_geom::Mat4;
    use grotto_world::WorldGenParams;

    fn setup() -> (TerrainHeightModel, ChunkGrid) {
        let p = WorldGenParams::default();
        (TerrainHeightModel::new(&p), ChunkGrid::new(&p.map))
    }

    fn rock(grid: &mut ChunkGrid, at: Vec3, radius: f32) {
        grid.insert(
            at.x,
            at.z,
            EntitySpec::new("rock_A", EntityKind::Rock { radius }, at, Mat4::from_translation(at)),
        )
        .unwrap();
    }

    #[test]
    fn no_rocks_matches_terrain() {
        let (m, g) = setup();
        let c = floor_ceil_normal(&m, &g, Vec3::new(250.0, 0.0, 250.0), 0.5);
        let h = m.floor_and_ceiling(250.0, 250.0);
        assert_eq!(c.floor, h.floor as f32);
        assert_eq!(c.ceil, h.ceil as f32);
        assert!(!c.solid);
    }

    #[test]
    fn rock_raises_floor_to_sphere_top() {
        let (m, mut g) = setup();
        let floor = m.floor(250.0, 250.0) as f32;
        let center = Vec3::new(250.0, floor - 1.0, 250.0);
        rock(&mut g, center, 5.0);
        let c = floor_ceil_normal(&m, &g, Vec3::new(250.0, 0.0, 250.0), 0.5);
        assert!((c.floor - (center.y + 5.5)).abs() < 1e-4);
        assert!((c.normal.y - 1.0).abs() < 1e-6);

        let side = floor_ceil_normal(&m, &g, Vec3::new(252.0, 0.0, 250.0), 0.5);
        assert!(side.normal.x > 0.0);
    }

    #[test]
    fn buried_rock_leaves_floor_alone() {
        let (m, mut g) = setup();
        let floor = m.floor(250.0, 250.0) as f32;
        rock(&mut g, Vec3::new(250.0, floor - 10.0, 250.0), 2.0);
        let c = floor_ceil_normal(&m, &g, Vec3::new(250.0, 0.0, 250.0), 0.0);
        assert_eq!(c.floor, floor);
    }
}
