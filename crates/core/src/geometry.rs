use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self.scale(1.0 / len)
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }
}

/// Euler angles in radians, applied in XYZ order (`R = Rx * Ry * Rz`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Euler {
    pub const ZERO: Euler = Euler {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Orientation whose local +Z axis points along `direction`, with +Y kept
    /// as close to world up as possible.
    pub fn facing(direction: Vec3) -> Self {
        let forward = direction.normalized();
        let up = Vec3::new(0.0, 1.0, 0.0);
        let mut right = up.cross(forward);
        if right.length() < 1e-9 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let right = right.normalized();
        let top = forward.cross(right);
        // columns: right, top, forward
        let m13 = forward.x.clamp(-1.0, 1.0);
        let y = m13.asin();
        if m13.abs() < 0.999_999_9 {
            Self::new((-forward.y).atan2(forward.z), y, (-top.x).atan2(right.x))
        } else {
            Self::new(top.z.atan2(top.y), y, 0.0)
        }
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let (sx, cx) = self.x.sin_cos();
        let (sy, cy) = self.y.sin_cos();
        let (sz, cz) = self.z.sin_cos();
        let v = Vec3::new(cz * v.x - sz * v.y, sz * v.x + cz * v.y, v.z);
        let v = Vec3::new(cy * v.x + sy * v.z, v.y, -sy * v.x + cy * v.z);
        Vec3::new(v.x, cx * v.y - sx * v.z, sx * v.y + cx * v.z)
    }

    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Euler,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Euler::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(140.0, 200.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 && (a.z - b.z).abs() < 1e-9
    }

    #[test]
    fn facing_points_local_z_along_direction() {
        for dir in [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-4.0, 0.5, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.3, -0.9, 0.1),
        ] {
            let rot = Euler::facing(dir);
            let forward = rot.rotate(Vec3::new(0.0, 0.0, 1.0));
            assert!(close(forward, dir.normalized()), "{dir:?} -> {forward:?}");
        }
    }

    #[test]
    fn facing_straight_up_is_finite() {
        let rot = Euler::facing(Vec3::new(0.0, 5.0, 0.0));
        let forward = rot.rotate(Vec3::new(0.0, 0.0, 1.0));
        assert!(close(forward, Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn zero_rotation_is_identity() {
        let v = Vec3::new(3.0, -2.0, 7.0);
        assert!(close(Euler::ZERO.rotate(v), v));
    }
}
