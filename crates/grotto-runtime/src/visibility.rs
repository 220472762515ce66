use std::f32::consts::PI;

use grotto_geom::{Vec2, Vec3};
use grotto_world::{ChunkCoord, HeightTexture, MapParams, TerrainHeightModel};

use crate::config::View;

/// Camera parameters of one visibility scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub forward: Vec3,
    /// Horizontal field of view; boundary rays sit at `±fov_radians`.
    pub fov_radians: f32,
    /// Maximum reach of the cone, in chunks.
    pub cell_range: u32,
    /// Chebyshev radius around the camera chunk that is always active.
    pub cell_radius: u32,
}

/// Pitch-adaptive scan ranges: looking up or down widens the always-on
/// neighbourhood and shortens the cone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRanges {
    pub cell_range: u32,
    pub cell_radius: u32,
    pub fov_x: f32,
}

impl ViewRanges {
    pub fn from_forward(forward: Vec3, view: &View) -> Self {
        let tilt = forward
            .angle_between(Vec3::UP)
            .max(forward.angle_between(Vec3::DOWN));
        let down = (tilt / PI * 2.0 - 1.0).clamp(0.0, 1.0);
        let span = view.max_cell_radius.saturating_sub(view.min_cell_radius) as f32;
        let cell_radius = (down * span + view.min_cell_radius as f32).ceil() as u32;
        let cell_range = ((1.0 - down).cbrt() * view.max_cell_range as f32).ceil() as u32;
        let half_fov = view.fov_degrees.to_radians() / 2.0;
        let fov_x = 2.0 * (view.aspect * half_fov.tan()).atan();
        Self {
            cell_range,
            cell_radius,
            fov_x,
        }
    }

    #[inline]
    pub fn camera(&self, position: Vec3, forward: Vec3) -> CameraView {
        CameraView {
            position,
            forward,
            fov_radians: self.fov_x,
            cell_range: self.cell_range,
            cell_radius: self.cell_radius,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScanOutcome {
    pub chunks: Vec<ChunkCoord>,
    /// Differs from the previous scan element-wise.
    pub changed: bool,
    /// Chunks whose terrain samples were materialized by this scan.
    pub generated: usize,
}

/// Chooses the active chunks each frame and lazily fills in their terrain samples.
#[derive(Clone, Debug)]
pub struct VisibilityScanner {
    map: MapParams,
    texture: HeightTexture,
    last_active: Vec<ChunkCoord>,
}

impl VisibilityScanner {
    pub fn new(map: &MapParams) -> Self {
        Self {
            map: *map,
            texture: HeightTexture::new(map),
            last_active: Vec::new(),
        }
    }

    #[inline]
    pub fn active(&self) -> &[ChunkCoord] {
        &self.last_active
    }

    #[inline]
    pub fn texture(&self) -> &HeightTexture {
        &self.texture
    }

    #[inline]
    pub fn texture_mut(&mut self) -> &mut HeightTexture {
        &mut self.texture
    }

    #[inline]
    pub fn is_generated(&self, c: ChunkCoord) -> bool {
        self.texture.is_generated(c)
    }

    /// Chunks selected for `view`, in row-major order, without side effects.
    pub fn select(&self, view: &CameraView) -> Vec<ChunkCoord> {
        let pos = view.position.xz();
        let dir = view.forward.xz().normalized();
        let cone = Cone::new(pos, dir, view, &self.map);
        let home = self
            .map
            .chunk_of(f64::from(view.position.x), f64::from(view.position.z));
        let radius = i32::try_from(view.cell_radius).unwrap_or(i32::MAX);

        let mut out = Vec::new();
        for cz in 0..self.map.z_chunks as i32 {
            for cx in 0..self.map.x_chunks as i32 {
                let c = ChunkCoord::new(cx, cz);
                if home.chebyshev(c) <= radius {
                    out.push(c);
                    continue;
                }
                let (x, z) = self.map.chunk_center(c);
                if cone.contains(Vec2::new(x as f32, z as f32)) {
                    out.push(c);
                }
            }
        }
        out
    }

    pub fn scan(&mut self, model: &TerrainHeightModel, view: &CameraView) -> ScanOutcome {
        let chunks = self.select(view);
        let mut generated = 0;
        for &c in &chunks {
            if self.texture.materialize(model, c) {
                generated += 1;
            }
        }
        let changed = chunks != self.last_active;
        if changed {
            log::debug!(
                target: "visibility",
                "active chunks {} -> {} ({} newly generated)",
                self.last_active.len(),
                chunks.len(),
                generated
            );
            self.last_active.clone_from(&chunks);
        }
        ScanOutcome {
            chunks,
            changed,
            generated,
        }
    }
}

/// Horizontal view cone between two boundary rays.
struct Cone {
    origin: Vec2,
    dir: Vec2,
    ray_a: Vec2,
    ray_b: Vec2,
    spread: f32,
    behind: f32,
    max_dist_sq: f32,
}

impl Cone {
    fn new(origin: Vec2, dir: Vec2, view: &CameraView, map: &MapParams) -> Self {
        let ray_a = dir.rotated(-view.fov_radians);
        let ray_b = dir.rotated(view.fov_radians);
        let range = view.cell_range as f32;
        let rx = map.chunk_width_x as f32 * range;
        let rz = map.chunk_width_z as f32 * range;
        Self {
            origin,
            dir,
            ray_a,
            ray_b,
            spread: ray_a.angle_between(ray_b),
            behind: view.fov_radians / 2.0,
            max_dist_sq: rx * rx + rz * rz,
        }
    }

    fn contains(&self, point: Vec2) -> bool {
        if self.dir == Vec2::ZERO {
            return false;
        }
        let to = point - self.origin;
        if to.length_sq() > self.max_dist_sq {
            return false;
        }
        if to.dot(self.dir) < self.behind {
            return false;
        }
        to.angle_between(self.ray_a) < self.spread && to.angle_between(self.ray_b) < self.spread
    }
}
