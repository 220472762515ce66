use std::fmt;

use grotto_world::{ChunkCoord, MapParams};

use crate::entity::{Entity, EntityId, EntityKey, EntitySpec};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridError {
    OutOfBounds { x: f32, z: f32 },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds { x, z } => {
                write!(f, "position ({}, {}) lies outside the chunk grid", x, z)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Fixed grid of chunk cells, each an unordered packed list of entities.
///
/// Removal is swap-remove: the last entity of the cell fills the hole and its
/// id is rewritten, so ids read before a removal may be stale afterwards.
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    map: MapParams,
    cells: Vec<Vec<Entity>>,
    next_key: u64,
    len: usize,
}

impl ChunkGrid {
    pub fn new(map: &MapParams) -> Self {
        Self {
            map: *map,
            cells: (0..map.chunk_count()).map(|_| Vec::new()).collect(),
            next_key: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn map(&self) -> &MapParams {
        &self.map
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn cell_index(&self, c: ChunkCoord) -> Option<usize> {
        self.map
            .contains(c)
            .then(|| c.cz as usize * self.map.x_chunks + c.cx as usize)
    }

    /// In-bounds chunk containing a world position.
    pub fn chunk_of(&self, x: f32, z: f32) -> Option<ChunkCoord> {
        let c = self.map.chunk_of(f64::from(x), f64::from(z));
        self.map.contains(c).then_some(c)
    }

    fn push(&mut self, x: f32, z: f32, key: EntityKey, spec: EntitySpec) -> Result<EntityId, GridError> {
        let c = self.map.chunk_of(f64::from(x), f64::from(z));
        let Some(idx) = self.cell_index(c).filter(|_| x.is_finite() && z.is_finite()) else {
            log::debug!(target: "grid", "rejected {} at ({}, {}): outside the grid", spec.tag, x, z);
            return Err(GridError::OutOfBounds { x, z });
        };
        let cell = &mut self.cells[idx];
        let id = EntityId::new(c.cx as u16, c.cz as u16, cell.len() as u32);
        cell.push(Entity {
            id,
            key,
            tag: spec.tag,
            kind: spec.kind,
            position: spec.position,
            transform: spec.transform,
        });
        self.len += 1;
        Ok(id)
    }

    /// Appends an entity to the chunk containing `(x, z)` and returns its id.
    pub fn insert(&mut self, x: f32, z: f32, spec: EntitySpec) -> Result<EntityId, GridError> {
        let key = EntityKey(self.next_key);
        let id = self.push(x, z, key, spec)?;
        self.next_key += 1;
        Ok(id)
    }

    /// Re-inserts an entity previously returned by [`ChunkGrid::take`] at its
    /// current position, keeping its key.
    pub fn relocate(&mut self, entity: Entity) -> Result<EntityId, GridError> {
        let Entity {
            key,
            tag,
            kind,
            position,
            transform,
            ..
        } = entity;
        self.push(
            position.x,
            position.z,
            key,
            EntitySpec {
                tag,
                kind,
                position,
                transform,
            },
        )
    }

    /// Swap-removes the entity at `id`, handing it back.
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.cell_index(id.chunk())?;
        let cell = &mut self.cells[idx];
        let slot = id.slot as usize;
        if slot >= cell.len() {
            return None;
        }
        let removed = cell.swap_remove(slot);
        if let Some(moved) = cell.get_mut(slot) {
            moved.id.slot = id.slot;
        }
        self.len -= 1;
        Some(removed)
    }

    /// Removes the entity at `id`; `false` when the slot is already empty.
    #[inline]
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.take(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let idx = self.cell_index(id.chunk())?;
        self.cells[idx].get(id.slot as usize)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let idx = self.cell_index(id.chunk())?;
        self.cells[idx].get_mut(id.slot as usize)
    }

    /// Live entities of a chunk; empty outside the grid.
    pub fn chunk_entities(&self, cx: i32, cz: i32) -> &[Entity] {
        match self.cell_index(ChunkCoord::new(cx, cz)) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    pub fn chunk_entities_mut(&mut self, cx: i32, cz: i32) -> &mut [Entity] {
        match self.cell_index(ChunkCoord::new(cx, cz)) {
            Some(idx) => &mut self.cells[idx],
            None => &mut [],
        }
    }

    /// Removes every entity of a chunk matching `pred`, in slot order of discovery.
    pub fn drain_chunk_where<F>(&mut self, c: ChunkCoord, mut pred: F) -> Vec<Entity>
    where
        F: FnMut(&Entity) -> bool,
    {
        let Some(idx) = self.cell_index(c) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut slot = 0;
        while slot < self.cells[idx].len() {
            if pred(&self.cells[idx][slot]) {
                let id = self.cells[idx][slot].id;
                if let Some(e) = self.take(id) {
                    out.push(e);
                }
            } else {
                slot += 1;
            }
        }
        out
    }

    /// Current id of the entity with `key`, searching `hint` first.
    pub fn find_key(&self, key: EntityKey, hint: Option<ChunkCoord>) -> Option<EntityId> {
        if let Some(c) = hint {
            let found = self
                .chunk_entities(c.cx, c.cz)
                .iter()
                .find(|e| e.key == key)
                .map(|e| e.id);
            if found.is_some() {
                return found;
            }
        }
        self.iter().find(|e| e.key == key).map(|e| e.id)
    }

    /// The in-bounds chunks overlapped by a chunk-sized square centred on `(x, z)`.
    pub fn surrounding_chunks(&self, x: f32, z: f32) -> impl Iterator<Item = ChunkCoord> + '_ {
        let wx = self.map.chunk_width_x;
        let wz = self.map.chunk_width_z;
        let x0 = ((f64::from(x) - wx / 2.0) / wx).floor() as i32;
        let z0 = ((f64::from(z) - wz / 2.0) / wz).floor() as i32;
        [(0, 0), (1, 0), (0, 1), (1, 1)]
            .into_iter()
            .map(move |(dx, dz)| ChunkCoord::new(x0 + dx, z0 + dz))
            .filter(|c| self.map.contains(*c))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.cells.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, CHEST};
    use grotto_geom::{Mat4, Vec3};

    fn grid() -> ChunkGrid {
        ChunkGrid::new(&MapParams::default())
    }

    fn chest_at(x: f32, z: f32) -> EntitySpec {
        EntitySpec::new(
            CHEST,
            EntityKind::Chest,
            Vec3::new(x, 0.0, z),
            Mat4::from_translation(Vec3::new(x, 0.0, z)),
        )
    }

    #[test]
    fn insert_then_lookup() {
        let mut g = grid();
        let id = g.insert(13.0, 20.0, chest_at(13.0, 20.0)).unwrap();
        assert_eq!(id, EntityId::new(2, 3, 0));
        let list = g.chunk_entities(2, 3);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), id);
        assert_eq!(list[0].id().chunk(), ChunkCoord::new(2, 3));
    }

    #[test]
    fn swap_remove_rewrites_moved_id() {
        let mut g = grid();
        let a = g.insert(1.0, 1.0, chest_at(1.0, 1.0)).unwrap();
        let b = g.insert(2.0, 1.0, chest_at(2.0, 1.0)).unwrap();
        let c = g.insert(3.0, 1.0, chest_at(3.0, 1.0)).unwrap();
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));

        assert!(g.remove(b));
        let list = g.chunk_entities(0, 0);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].position.x, 1.0);
        assert_eq!(list[1].position.x, 3.0);
        assert_eq!(list[1].id().slot, 1);

        assert!(!g.remove(EntityId::new(0, 0, 2)));
        assert_eq!(g.chunk_entities(0, 0).len(), 2);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn out_of_bounds_insert_fails() {
        let mut g = grid();
        let err = g.insert(-0.5, 3.0, chest_at(-0.5, 3.0)).unwrap_err();
        assert_eq!(err, GridError::OutOfBounds { x: -0.5, z: 3.0 });
        assert!(g.insert(500.0, 3.0, chest_at(500.0, 3.0)).is_err());
        assert!(g.insert(f32::NAN, 3.0, chest_at(0.0, 3.0)).is_err());
        assert!(g.is_empty());
        assert!(!g.remove(EntityId::new(900, 0, 0)));
    }

    #[test]
    fn relocate_keeps_key_and_moves_chunk() {
        let mut g = grid();
        let id = g.insert(1.0, 1.0, chest_at(1.0, 1.0)).unwrap();
        let key = g.get(id).unwrap().key();
        let mut e = g.take(id).unwrap();
        e.position = Vec3::new(40.0, 0.0, 1.0);
        let moved = g.relocate(e).unwrap();
        assert_eq!(moved.chunk(), ChunkCoord::new(6, 0));
        assert_eq!(g.find_key(key, None), Some(moved));
        assert_eq!(g.find_key(key, Some(ChunkCoord::new(6, 0))), Some(moved));
    }

    #[test]
    fn drain_where_takes_every_match() {
        let mut g = grid();
        for i in 0..6 {
            let x = 0.5 + i as f32 * 0.5;
            let mut spec = chest_at(x, 0.5);
            if i % 2 == 0 {
                spec.kind = EntityKind::Rock { radius: 1.0 };
            }
            g.insert(x, 0.5, spec).unwrap();
        }
        let rocks = g.drain_chunk_where(ChunkCoord::new(0, 0), |e| e.kind.rock_radius().is_some());
        assert_eq!(rocks.len(), 3);
        let rest = g.chunk_entities(0, 0);
        assert_eq!(rest.len(), 3);
        for (slot, e) in rest.iter().enumerate() {
            assert_eq!(e.id().slot as usize, slot);
            assert_eq!(e.kind, EntityKind::Chest);
        }
    }

    #[test]
    fn surrounding_chunks_clip_to_grid() {
        let g = grid();
        let inner: Vec<_> = g.surrounding_chunks(10.0, 10.0).collect();
        assert_eq!(
            inner,
            vec![
                ChunkCoord::new(1, 1),
                ChunkCoord::new(2, 1),
                ChunkCoord::new(1, 2),
                ChunkCoord::new(2, 2)
            ]
        );
        let corner: Vec<_> = g.surrounding_chunks(1.0, 1.0).collect();
        assert_eq!(corner, vec![ChunkCoord::new(0, 0)]);
    }
}
