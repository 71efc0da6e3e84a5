use glam::{Mat4, UVec2, Vec3};

/// Where the G-buffer has been rendered from; needed to turn its depth back
/// into world-space positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Inverse of the view-projection matrix
    pub ndc_to_world: Mat4,
    pub origin: Vec3,
}

impl Camera {
    pub fn new(ndc_to_world: Mat4, origin: Vec3) -> Self {
        Self {
            ndc_to_world,
            origin,
        }
    }

    /// Builds camera out of its view (camera-to-world) and projection
    /// matrices.
    pub fn from_matrices(view: Mat4, projection: Mat4) -> Self {
        Self {
            ndc_to_world: view * projection.inverse(),
            origin: view.w_axis.truncate(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ZERO)
    }
}

/// Surface data rendered by the rasterizer, read by the irradiance sampling.
#[derive(Clone, Debug)]
pub struct GBuffer {
    /// World-space normals (`xyz`)
    pub normal: crate::ExternalTexture,

    /// Non-linear depth, as written by the projection matrix
    pub depth: crate::ExternalTexture,

    pub size: UVec2,
}

impl GBuffer {
    /// Returns whether switching from `self` to `other` requires the passes
    /// to be built anew.
    pub fn is_invalidated_by(&self, other: &Self) -> bool {
        self.size != other.size
            || !std::ptr::eq(self.normal.view(), other.normal.view())
            || !std::ptr::eq(self.depth.view(), other.depth.view())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, vec4, Vec4Swizzles};

    use super::*;

    #[test]
    fn from_matrices() {
        let view = Mat4::from_translation(vec3(1.0, 2.0, 3.0));

        let projection = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        );

        let target = Camera::from_matrices(view, projection);

        assert_eq!(vec3(1.0, 2.0, 3.0), target.origin);

        // The near plane's center lays right in front of the camera
        let point = target.ndc_to_world * vec4(0.0, 0.0, 0.0, 1.0);
        let point = point.xyz() / point.w;

        assert_relative_eq!(1.0, point.x, epsilon = 1e-4);
        assert_relative_eq!(2.0, point.y, epsilon = 1e-4);
        assert_relative_eq!(2.9, point.z, epsilon = 1e-4);
    }
}
