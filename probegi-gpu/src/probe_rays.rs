use core::f32::consts::PI;

use glam::{EulerRot, Mat4, Vec3};

/// Returns `nth` out of `count` points evenly distributed over the unit
/// sphere.
pub fn spherical_fibonacci(nth: u32, count: u32) -> Vec3 {
    let b = (5.0f32.sqrt() * 0.5 + 0.5) - 1.0;
    let phi = 2.0 * PI * (nth as f32 * b).fract();
    let cos_theta = 1.0 - (2.0 * nth as f32 + 1.0) / (count as f32);
    let sin_theta = (1.0 - cos_theta * cos_theta).clamp(0.0, 1.0).sqrt();

    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

/// Set of directions traced out of each probe during a frame.
///
/// All probes share the same set; it's rotated slightly each frame so that
/// the temporal filter converges towards the full sphere instead of a fixed
/// sample pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeRays {
    pub count: u32,
    pub rotation: Mat4,
}

impl ProbeRays {
    /// Largest rotation (in radians, per axis) applied to the ray set.
    pub const MAX_ROTATION: f32 = 0.001;

    pub fn new(count: u32, rotation: Mat4) -> Self {
        Self { count, rotation }
    }

    /// Builds the rotation out of three numbers in `-1.0..=1.0`, which get
    /// scaled by [`Self::MAX_ROTATION`] and applied as XYZ Euler angles.
    pub fn rotation(angles: Vec3) -> Mat4 {
        let angles =
            angles.clamp(Vec3::NEG_ONE, Vec3::ONE) * Self::MAX_ROTATION;

        Mat4::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
    }

    pub fn direction(&self, nth: u32) -> Vec3 {
        self.rotation
            .transform_vector3(spherical_fibonacci(nth, self.count))
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.count).map(move |nth| self.direction(nth))
    }
}
