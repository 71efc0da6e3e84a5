use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{TraceLight, TraceLightKind};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ProbeTracingPassParams {
    /// rgb - color of rays that escape the scene
    pub sky_color: Vec4,

    /// xyz - light's position (or direction, for directional lights),
    /// w - light's intensity
    pub light_position: Vec4,

    /// rgb - light's color,
    /// w - light's kind (bits)
    pub light_color: Vec4,
}

impl ProbeTracingPassParams {
    pub fn new(sky_color: Vec3, light: TraceLight) -> Self {
        Self {
            sky_color: sky_color.extend(1.0),
            light_position: light.position.extend(light.intensity),
            light_color: light
                .color
                .extend(f32::from_bits(light.kind.serialize())),
        }
    }

    pub fn sky_color(&self) -> Vec3 {
        self.sky_color.xyz()
    }

    pub fn light(&self) -> TraceLight {
        TraceLight {
            position: self.light_position.xyz(),
            color: self.light_color.xyz(),
            intensity: self.light_position.w,
            kind: TraceLightKind::deserialize(self.light_color.w.to_bits()),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ProbeRelocationPassParams {
    pub first_frame: u32,
}

impl ProbeRelocationPassParams {
    pub fn is_first_frame(&self) -> bool {
        self.first_frame == 1
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ProbeBlendingPassParams {
    pub first_frame: u32,
}

impl ProbeBlendingPassParams {
    pub fn is_first_frame(&self) -> bool {
        self.first_frame == 1
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct IrradianceSamplingPassParams {
    pub half_resolution: u32,
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn tracing_params() {
        let light = TraceLight {
            position: vec3(1.0, 2.0, 3.0),
            color: vec3(0.5, 0.25, 1.0),
            intensity: 40.0,
            kind: TraceLightKind::Directional,
        };

        let params = ProbeTracingPassParams::new(vec3(0.1, 0.2, 0.3), light);

        assert_eq!(vec3(0.1, 0.2, 0.3), params.sky_color());
        assert_eq!(light, params.light());
        assert_eq!(48, core::mem::size_of::<ProbeTracingPassParams>());
    }
}
