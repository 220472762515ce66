use std::sync::Arc;

use grotto_world::ChunkCoord;

use crate::grid::ChunkGrid;

/// Opaque renderer token for a mesh or billboard quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// One instanced draw: every entity sharing `type_tag` drawn with `mesh`.
#[derive(Clone, Debug)]
pub struct InstancedEntityGroup {
    pub type_tag: Arc<str>,
    pub mesh: MeshHandle,
}

impl InstancedEntityGroup {
    pub fn new(type_tag: impl Into<Arc<str>>, mesh: MeshHandle) -> Self {
        Self {
            type_tag: type_tag.into(),
            mesh,
        }
    }

    #[inline]
    pub fn collect(&self, grid: &ChunkGrid, active: &[ChunkCoord]) -> Vec<[f32; 16]> {
        collect_instances(grid, active, &self.type_tag)
    }
}

/// Column-major instance matrices of every entity tagged `type_tag` in the
/// active chunks, in chunk order.
pub fn collect_instances(grid: &ChunkGrid, active: &[ChunkCoord], type_tag: &str) -> Vec<[f32; 16]> {
    active
        .iter()
        .flat_map(|c| grid.chunk_entities(c.cx, c.cz))
        .filter(|e| e.has_tag(type_tag))
        .map(|e| e.transform.to_cols_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, EntitySpec, CHEST};
    use grotto_geom::{Mat4, Vec3};
    use grotto_world::MapParams;

    #[test]
    fn only_active_chunks_and_matching_tags() {
        let mut g = ChunkGrid::new(&MapParams::default());
        let spots = [(1.0, 1.0, CHEST), (2.0, 2.0, "kelp"), (20.0, 1.0, CHEST)];
        for (x, z, tag) in spots {
            let p = Vec3::new(x, 0.0, z);
            g.insert(x, z, EntitySpec::new(tag, EntityKind::Chest, p, Mat4::from_translation(p)))
                .unwrap();
        }
        let group = InstancedEntityGroup::new(CHEST, MeshHandle(3));
        let near = group.collect(&g, &[ChunkCoord::new(0, 0)]);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0][12], 1.0);
        let both = group.collect(&g, &[ChunkCoord::new(0, 0), ChunkCoord::new(3, 0)]);
        assert_eq!(both.len(), 2);
        assert!(collect_instances(&g, &[], CHEST).is_empty());
    }
}
