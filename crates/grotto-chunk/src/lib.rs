//! Chunked spatial index of cave entities, instance gathering and the
//! floor/ceiling collision query.
#![forbid(unsafe_code)]

mod collision;
pub mod entity;
mod grid;
mod instances;

pub use collision::{SurfaceContact, floor_ceil_normal};
pub use entity::{Entity, EntityId, EntityKey, EntityKind, EntitySpec};
pub use grid::{ChunkGrid, GridError};
pub use instances::{InstancedEntityGroup, MeshHandle, collect_instances};
