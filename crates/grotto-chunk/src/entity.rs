use std::fmt;
use std::sync::Arc;

use grotto_geom::{Mat4, Vec3};
use grotto_world::ChunkCoord;

pub const CHEST: &str = "chest";
pub const CRAB: &str = "crab";
pub const CRAB_NETTED: &str = "crab_netted";

/// Where an entity currently lives in the grid. Changes whenever the entity
/// or a sibling in the same chunk is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub chunk_x: u16,
    pub chunk_z: u16,
    pub slot: u32,
}

impl EntityId {
    #[inline]
    pub const fn new(chunk_x: u16, chunk_z: u16, slot: u32) -> Self {
        Self {
            chunk_x,
            chunk_z,
            slot,
        }
    }

    #[inline]
    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord::new(i32::from(self.chunk_x), i32::from(self.chunk_z))
    }

    /// Single integer form for picking buffers: `z << 48 | x << 32 | slot`.
    #[inline]
    pub fn to_packed(self) -> u64 {
        (u64::from(self.chunk_z) << 48) | (u64::from(self.chunk_x) << 32) | u64::from(self.slot)
    }

    #[inline]
    pub fn from_packed(v: u64) -> Self {
        Self {
            chunk_x: (v >> 32) as u16,
            chunk_z: (v >> 48) as u16,
            slot: v as u32,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.chunk_x, self.chunk_z, self.slot)
    }
}

/// Identity that survives relocation between chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Chest,
    Rock { radius: f32 },
    Crab { velocity: Vec3, forward: Vec3 },
    /// A crab held by a net; stationary until picked up.
    NettedCrab,
    Doodad { billboard: bool },
}

impl EntityKind {
    #[inline]
    pub fn rock_radius(&self) -> Option<f32> {
        match self {
            EntityKind::Rock { radius } => Some(*radius),
            _ => None,
        }
    }

    #[inline]
    pub fn is_wandering_crab(&self) -> bool {
        matches!(self, EntityKind::Crab { .. })
    }
}

/// An entity before the grid assigns it an id.
#[derive(Clone, Debug)]
pub struct EntitySpec {
    pub tag: Arc<str>,
    pub kind: EntityKind,
    pub position: Vec3,
    pub transform: Mat4,
}

impl EntitySpec {
    pub fn new(tag: impl Into<Arc<str>>, kind: EntityKind, position: Vec3, transform: Mat4) -> Self {
        Self {
            tag: tag.into(),
            kind,
            position,
            transform,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) key: EntityKey,
    /// Render group, e.g. `chest`, `rock_C` or a doodad name.
    pub tag: Arc<str>,
    pub kind: EntityKind,
    pub position: Vec3,
    pub transform: Mat4,
}

impl Entity {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn key(&self) -> EntityKey {
        self.key
    }

    #[inline]
    pub fn has_tag(&self, tag: &str) -> bool {
        &*self.tag == tag
    }

    /// Turns a wandering crab into net bait.
    pub fn mark_netted(&mut self) {
        self.kind = EntityKind::NettedCrab;
        self.tag = Arc::from(CRAB_NETTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_id_round_trips_extremes() {
        let id = EntityId::new(u16::MAX, 7, u32::MAX);
        assert_eq!(EntityId::from_packed(id.to_packed()), id);
        assert_eq!(id.chunk(), ChunkCoord::new(65535, 7));
    }

    #[test]
    fn netting_retags() {
        let mut e = Entity {
            id: EntityId::new(0, 0, 0),
            key: EntityKey(1),
            tag: Arc::from(CRAB),
            kind: EntityKind::Crab {
                velocity: Vec3::X,
                forward: Vec3::X,
            },
            position: Vec3::ZERO,
            transform: Mat4::IDENTITY,
        };
        assert!(e.kind.is_wandering_crab());
        e.mark_netted();
        assert!(e.has_tag(CRAB_NETTED));
        assert_eq!(e.kind, EntityKind::NettedCrab);
    }
}
