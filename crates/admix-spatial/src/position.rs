//! Polar/Cartesian positions and rotation utilities
//!
//! Positions follow the ADM convention: azimuth in degrees with positive
//! values anticlockwise (towards the left), elevation positive upwards.
//! Cartesian +x points right, +y to the front and +z up.
//!
//! Rotations are done in a right-handed "math frame" whose axes are
//! (forward, left, up). [`CartesianPosition::to_math_frame`] and
//! [`CartesianPosition::from_math_frame`] permute between the two.

use serde::{Deserialize, Serialize};

/// Below this magnitude a vector is treated as the origin
const MIN_MAGNITUDE: f64 = 1e-10;

/// Polar position (ADM convention)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarPosition {
    /// Azimuth in degrees (positive = left)
    pub azimuth: f64,
    /// Elevation in degrees (positive = up)
    pub elevation: f64,
    /// Distance from origin
    pub distance: f64,
}

impl PolarPosition {
    /// Create new polar position
    pub fn new(azimuth: f64, elevation: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            distance,
        }
    }

    /// Convert to Cartesian coordinates
    pub fn to_cartesian(&self) -> CartesianPosition {
        polar_to_cartesian(self)
    }

    /// Same direction at unit distance
    pub fn unit(&self) -> Self {
        Self::new(self.azimuth, self.elevation, 1.0)
    }
}

impl Default for PolarPosition {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Cartesian position (ADM convention)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianPosition {
    /// X coordinate (positive = right)
    pub x: f64,
    /// Y coordinate (positive = front)
    pub y: f64,
    /// Z coordinate (positive = up)
    pub z: f64,
}

impl CartesianPosition {
    /// Create new Cartesian position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to polar coordinates
    pub fn to_polar(&self) -> PolarPosition {
        cartesian_to_polar(self)
    }

    /// Distance from origin
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Permute into the (forward, left, up) math frame
    pub fn to_math_frame(&self) -> [f64; 3] {
        [self.y, -self.x, self.z]
    }

    /// Permute back from the (forward, left, up) math frame
    pub fn from_math_frame(v: [f64; 3]) -> Self {
        Self::new(-v[1], v[0], v[2])
    }
}

impl Default for CartesianPosition {
    fn default() -> Self {
        // Straight ahead
        Self::new(0.0, 1.0, 0.0)
    }
}

/// Convert a polar position to Cartesian coordinates
pub fn polar_to_cartesian(polar: &PolarPosition) -> CartesianPosition {
    let az = polar.azimuth.to_radians();
    let el = polar.elevation.to_radians();
    let cos_el = el.cos();

    CartesianPosition {
        x: -az.sin() * cos_el * polar.distance,
        y: az.cos() * cos_el * polar.distance,
        z: el.sin() * polar.distance,
    }
}

/// Convert a Cartesian position to polar coordinates
///
/// The origin maps to `{0, 0, 0}`.
pub fn cartesian_to_polar(cartesian: &CartesianPosition) -> PolarPosition {
    let distance = cartesian.magnitude();
    if distance < MIN_MAGNITUDE {
        return PolarPosition::new(0.0, 0.0, 0.0);
    }

    let horizontal = (cartesian.x * cartesian.x + cartesian.y * cartesian.y).sqrt();

    PolarPosition {
        azimuth: (-cartesian.x).atan2(cartesian.y).to_degrees(),
        elevation: cartesian.z.atan2(horizontal).to_degrees(),
        distance,
    }
}

/// 3x3 rotation matrix in the (forward, left, up) math frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(pub [[f64; 3]; 3]);

impl RotationMatrix {
    /// Identity rotation
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Build `Rz(yaw) * Ry(pitch) * Rx(roll)`, angles in degrees
    ///
    /// Positive yaw turns forward towards left, negative pitch lifts forward
    /// upwards. Re-orienting the forward axis onto a polar direction therefore
    /// uses `from_yaw_pitch_roll(azimuth, -elevation, 0.0)`.
    pub fn from_yaw_pitch_roll(yaw: f64, pitch: f64, roll: f64) -> Self {
        let (sy, cy) = yaw.to_radians().sin_cos();
        let (sp, cp) = pitch.to_radians().sin_cos();
        let (sr, cr) = roll.to_radians().sin_cos();

        Self([
            [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
            [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
            [-sp, cp * sr, cp * cr],
        ])
    }

    /// Rotation that carries the forward axis onto `direction`
    pub fn towards(direction: &PolarPosition) -> Self {
        Self::from_yaw_pitch_roll(direction.azimuth, -direction.elevation, 0.0)
    }

    /// Apply to a math-frame vector
    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Transposed matrix (the inverse rotation)
    pub fn transpose(&self) -> Self {
        let m = &self.0;
        Self([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polar_to_cartesian_axes() {
        let front = polar_to_cartesian(&PolarPosition::new(0.0, 0.0, 1.0));
        assert_abs_diff_eq!(front.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(front.y, 1.0, epsilon = 1e-12);

        // Positive azimuth is to the left
        let left = polar_to_cartesian(&PolarPosition::new(90.0, 0.0, 1.0));
        assert_abs_diff_eq!(left.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(left.y, 0.0, epsilon = 1e-12);

        let up = polar_to_cartesian(&PolarPosition::new(0.0, 90.0, 2.0));
        assert_abs_diff_eq!(up.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let original = PolarPosition::new(-110.0, 30.0, 0.75);
        let back = original.to_cartesian().to_polar();

        assert_abs_diff_eq!(back.azimuth, original.azimuth, epsilon = 1e-9);
        assert_abs_diff_eq!(back.elevation, original.elevation, epsilon = 1e-9);
        assert_abs_diff_eq!(back.distance, original.distance, epsilon = 1e-9);
    }

    #[test]
    fn test_origin_has_no_nan() {
        let polar = cartesian_to_polar(&CartesianPosition::new(0.0, 0.0, 0.0));
        assert_eq!(polar, PolarPosition::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_math_frame_permutation() {
        let pos = CartesianPosition::new(0.3, -0.2, 0.9);
        let frame = pos.to_math_frame();
        assert_eq!(frame, [-0.2, -0.3, 0.9]);
        assert_eq!(CartesianPosition::from_math_frame(frame), pos);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let rot = RotationMatrix::from_yaw_pitch_roll(37.0, -21.0, 12.0);
        let t = rot.transpose();

        for i in 0..3 {
            let e = {
                let mut e = [0.0; 3];
                e[i] = 1.0;
                e
            };
            let back = t.apply(rot.apply(e));
            for j in 0..3 {
                assert_abs_diff_eq!(back[j], e[j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rotation_towards_direction() {
        let target = PolarPosition::new(60.0, 25.0, 1.0);
        let rotated = RotationMatrix::towards(&target).apply([1.0, 0.0, 0.0]);
        let polar = CartesianPosition::from_math_frame(rotated).to_polar();

        assert_abs_diff_eq!(polar.azimuth, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.elevation, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(polar.distance, 1.0, epsilon = 1e-9);
    }
}
