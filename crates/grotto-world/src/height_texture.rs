use crate::ChunkCoord;
use crate::terrain::TerrainHeightModel;
use crate::worldgen::MapParams;

/// Two-channel `(ceil, floor)` sample grid covering the whole map, filled in
/// lazily one chunk at a time and uploaded by the renderer when dirty.
#[derive(Clone, Debug)]
pub struct HeightTexture {
    map: MapParams,
    width: usize,
    height: usize,
    data: Vec<f32>,
    generated: Vec<bool>,
    generated_count: usize,
    materialized: u64,
    dirty: bool,
}

impl HeightTexture {
    pub fn new(map: &MapParams) -> Self {
        let width = map.x_cells * map.x_chunks;
        let height = map.z_cells * map.z_chunks;
        Self {
            map: *map,
            width,
            height,
            data: vec![0.0; width * height * 2],
            generated: vec![false; map.chunk_count()],
            generated_count: 0,
            materialized: 0,
            dirty: false,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved `ceil, floor` pairs, row-major by texel z.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn chunk_index(&self, c: ChunkCoord) -> Option<usize> {
        self.map
            .contains(c)
            .then(|| c.cz as usize * self.map.x_chunks + c.cx as usize)
    }

    pub fn is_generated(&self, c: ChunkCoord) -> bool {
        self.chunk_index(c).is_some_and(|i| self.generated[i])
    }

    #[inline]
    pub fn generated_count(&self) -> usize {
        self.generated_count
    }

    /// Number of chunk materializations performed so far.
    #[inline]
    pub fn materialized(&self) -> u64 {
        self.materialized
    }

    /// `(ceil, floor)` at a texel.
    pub fn texel(&self, ix: usize, iz: usize) -> Option<(f32, f32)> {
        if ix >= self.width || iz >= self.height {
            return None;
        }
        let i = (iz * self.width + ix) * 2;
        Some((self.data[i], self.data[i + 1]))
    }

    /// Samples the height field over a chunk plus a one-texel border. Returns
    /// `false` when the chunk was already generated or lies off the map.
    pub fn materialize(&mut self, model: &TerrainHeightModel, c: ChunkCoord) -> bool {
        let Some(idx) = self.chunk_index(c) else {
            return false;
        };
        if self.generated[idx] {
            return false;
        }
        let xc = self.map.x_cells as i64;
        let zc = self.map.z_cells as i64;
        let step_x = self.map.chunk_width_x / xc as f64;
        let step_z = self.map.chunk_width_z / zc as f64;
        let x0 = i64::from(c.cx) * xc;
        let z0 = i64::from(c.cz) * zc;
        for iz in (z0 - 1).max(0)..=(z0 + zc).min(self.height as i64 - 1) {
            for ix in (x0 - 1).max(0)..=(x0 + xc).min(self.width as i64 - 1) {
                let h = model.floor_and_ceiling(ix as f64 * step_x, iz as f64 * step_z);
                let i = (iz as usize * self.width + ix as usize) * 2;
                self.data[i] = h.ceil as f32;
                self.data[i + 1] = h.floor as f32;
            }
        }
        self.generated[idx] = true;
        self.generated_count += 1;
        self.materialized += 1;
        self.dirty = true;
        log::debug!(target: "visibility", "materialized chunk ({}, {})", c.cx, c.cz);
        true
    }

    /// Returns whether new samples arrived since the last call, clearing the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
