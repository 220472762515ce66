use core::ops::Mul;

use crate::Vec3;

/// Unit rotation quaternion, `w` last.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// `axis` must be unit length.
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Self {
        let (s, c) = (radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
    pub fn rotation_to(from: Vec3, to: Vec3) -> Self {
        let dot = from.dot(to);
        if dot < -0.999_999 {
            let mut axis = Vec3::X.cross(from);
            if axis.length() < 1e-6 {
                axis = Vec3::UP.cross(from);
            }
            Self::from_axis_angle(axis.normalized(), core::f32::consts::PI)
        } else if dot > 0.999_999 {
            Self::IDENTITY
        } else {
            let axis = from.cross(to);
            Self::new(axis.x, axis.y, axis.z, 1.0 + dot).normalized()
        }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            self
        }
    }

    /// Applies a rotation about the local X axis after this one.
    #[inline]
    pub fn rotate_x(self, radians: f32) -> Self {
        self * Self::from_axis_angle(Vec3::X, radians)
    }

    /// Applies a rotation about the local Y axis after this one.
    #[inline]
    pub fn rotate_y(self, radians: f32) -> Self {
        self * Self::from_axis_angle(Vec3::UP, radians)
    }

    pub fn rotate_vec(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}

impl Mul for Quat {
    type Output = Quat;
    fn mul(self, b: Quat) -> Quat {
        let a = self;
        Quat::new(
            a.x * b.w + a.w * b.x + a.y * b.z - a.z * b.y,
            a.y * b.w + a.w * b.y + a.z * b.x - a.x * b.z,
            a.z * b.w + a.w * b.z + a.x * b.y - a.y * b.x,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn rotation_to_maps_source_onto_target() {
        let from = Vec3::Z;
        let to = Vec3::new(0.3, 0.9, -0.2).normalized();
        let q = Quat::rotation_to(from, to);
        assert!(close(q.rotate_vec(from), to));
    }

    #[test]
    fn rotation_to_opposite_vectors_is_half_turn() {
        let q = Quat::rotation_to(Vec3::UP, Vec3::DOWN);
        assert!(close(q.rotate_vec(Vec3::UP), Vec3::DOWN));
    }

    #[test]
    fn rotation_to_same_vector_is_identity() {
        assert_eq!(Quat::rotation_to(Vec3::UP, Vec3::UP), Quat::IDENTITY);
    }
}
