use bytemuck::{Pod, Zeroable};
use glam::{
    uvec2, uvec4, vec2, Mat4, UVec2, UVec4, Vec3, Vec4,
    Vec4Swizzles,
};

use crate::{
    AtlasLayout, ProbeGrid, ProbeRelocation, ProbeRelocationPassParams,
    UpdateRange,
};

/// Everything the probe kernels know about the volume, uploaded once per
/// frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GiConstants {
    /// x - radiance slot,
    /// y - probe offsets slot,
    /// z - irradiance slot,
    /// w - visibility slot
    pub slots_d0: UVec4,

    /// x - normal slot,
    /// y - depth slot,
    /// z - indirect slot,
    /// w - probe status slot
    pub slots_d1: UVec4,

    /// xyz - grid origin,
    /// w - max probe offset (fraction of spacing)
    pub grid_origin: Vec4,

    /// xyz - probe spacing,
    /// w - self-shadow bias
    pub probe_spacing: Vec4,

    /// xyz - 1 / probe spacing,
    /// w - hysteresis
    pub reciprocal_spacing: Vec4,

    /// xyz - probe counts,
    /// w - rays per probe
    pub probe_counts: UVec4,

    /// x - width,
    /// y - height,
    /// z - interior size of a probe's tile
    pub irradiance_atlas: UVec4,

    /// See: [`Self::irradiance_atlas`].
    pub visibility_atlas: UVec4,

    /// x - probe update offset,
    /// y - probe update count,
    /// z - feature flags,
    /// w - frame
    pub update: UVec4,

    /// x - infinite bounces multiplier,
    /// y - intensity,
    /// z - probe sphere scale
    pub tunables: Vec4,

    pub random_rotation: Mat4,
    pub ndc_to_world: Mat4,
    pub camera_origin: Vec4,

    /// xy - viewport size,
    /// zw - indirect output size
    pub resolution: Vec4,
}

impl GiConstants {
    pub fn slot(&self, slot: ResourceSlot) -> u32 {
        let id = slot.id() as usize;

        if id < 4 {
            self.slots_d0.to_array()[id]
        } else {
            self.slots_d1.to_array()[id - 4]
        }
    }

    pub fn set_slots(&mut self) {
        self.slots_d0 = uvec4(
            ResourceSlot::Radiance.id(),
            ResourceSlot::ProbeOffsets.id(),
            ResourceSlot::Irradiance.id(),
            ResourceSlot::Visibility.id(),
        );

        self.slots_d1 = uvec4(
            ResourceSlot::Normal.id(),
            ResourceSlot::Depth.id(),
            ResourceSlot::Indirect.id(),
            ResourceSlot::ProbeStatus.id(),
        );
    }

    pub fn grid(&self) -> ProbeGrid {
        ProbeGrid {
            origin: self.grid_origin.xyz(),
            spacing: self.probe_spacing.xyz(),
            counts: self.probe_counts.xyz(),
        }
    }

    pub fn set_grid(&mut self, grid: ProbeGrid) {
        self.grid_origin = grid.origin.extend(self.grid_origin.w);
        self.probe_spacing = grid.spacing.extend(self.probe_spacing.w);
        self.probe_counts = grid.counts.extend(self.probe_counts.w);

        self.reciprocal_spacing =
            (Vec3::ONE / grid.spacing).extend(self.reciprocal_spacing.w);
    }

    pub fn reciprocal_spacing(&self) -> Vec3 {
        self.reciprocal_spacing.xyz()
    }

    pub fn rays_per_probe(&self) -> u32 {
        self.probe_counts.w
    }

    pub fn max_probe_offset(&self) -> f32 {
        self.grid_origin.w
    }

    pub fn self_shadow_bias(&self) -> f32 {
        self.probe_spacing.w
    }

    pub fn hysteresis(&self) -> f32 {
        self.reciprocal_spacing.w
    }

    pub fn relocation(
        &self,
        params: &ProbeRelocationPassParams,
    ) -> ProbeRelocation {
        ProbeRelocation {
            spacing: self.probe_spacing.xyz(),
            max_offset: self.max_probe_offset(),
            first_frame: params.is_first_frame(),
        }
    }

    pub fn irradiance_layout(&self) -> AtlasLayout {
        AtlasLayout::new(self.irradiance_atlas.z, self.probe_counts.xyz())
    }

    pub fn visibility_layout(&self) -> AtlasLayout {
        AtlasLayout::new(self.visibility_atlas.z, self.probe_counts.xyz())
    }

    pub fn set_layouts(
        &mut self,
        irradiance: AtlasLayout,
        visibility: AtlasLayout,
    ) {
        self.irradiance_atlas = Self::encode_layout(irradiance);
        self.visibility_atlas = Self::encode_layout(visibility);
    }

    fn encode_layout(layout: AtlasLayout) -> UVec4 {
        let size = layout.size();

        uvec4(size.x, size.y, layout.probe_size, 0)
    }

    pub fn update_range(&self) -> UpdateRange {
        UpdateRange {
            offset: self.update.x,
            count: self.update.y,
            total: self.grid().len(),
        }
    }

    pub fn flags(&self) -> FeatureFlags {
        FeatureFlags(self.update.z)
    }

    pub fn frame(&self) -> u32 {
        self.update.w
    }

    pub fn infinite_bounces_multiplier(&self) -> f32 {
        self.tunables.x
    }

    pub fn intensity(&self) -> f32 {
        self.tunables.y
    }

    pub fn probe_sphere_scale(&self) -> f32 {
        self.tunables.z
    }

    pub fn camera_origin(&self) -> Vec3 {
        self.camera_origin.xyz()
    }

    pub fn viewport_size(&self) -> UVec2 {
        self.resolution.xy().as_uvec2()
    }

    pub fn output_size(&self) -> UVec2 {
        self.resolution.zw().as_uvec2()
    }

    pub fn set_resolution(&mut self, viewport: UVec2, half_resolution: bool) {
        let output = Self::output_size_for(viewport, half_resolution);

        self.resolution = Vec4::new(
            viewport.x as f32,
            viewport.y as f32,
            output.x as f32,
            output.y as f32,
        );
    }

    /// Returns size of the indirect output for given viewport.
    pub fn output_size_for(viewport: UVec2, half_resolution: bool) -> UVec2 {
        if half_resolution {
            uvec2((viewport.x + 1) / 2, (viewport.y + 1) / 2).max(UVec2::ONE)
        } else {
            viewport.max(UVec2::ONE)
        }
    }

    /// Given a pixel of the indirect output, returns the G-buffer pixel it
    /// corresponds to.
    pub fn gbuffer_pixel(&self, output_pixel: UVec2) -> UVec2 {
        let pixel = if self.flags().has(FeatureFlags::HALF_RESOLUTION) {
            output_pixel * 2
        } else {
            output_pixel
        };

        pixel.min(self.viewport_size().max(UVec2::ONE) - UVec2::ONE)
    }

    /// Given a G-buffer pixel and its depth, returns its world-space
    /// position.
    pub fn reconstruct_position(&self, pixel: UVec2, depth: f32) -> Vec3 {
        let uv = (pixel.as_vec2() + 0.5) / self.viewport_size().as_vec2();
        let ndc = vec2(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
        let point = self.ndc_to_world * ndc.extend(depth).extend(1.0);

        point.xyz() / point.w
    }
}

/// Logical index of each resource the probe kernels know about; shared by the
/// constants block and the debug-texture hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceSlot {
    Radiance,
    ProbeOffsets,
    Irradiance,
    Visibility,
    Normal,
    Depth,
    Indirect,
    ProbeStatus,
}

impl ResourceSlot {
    pub const ALL: [Self; 8] = [
        Self::Radiance,
        Self::ProbeOffsets,
        Self::Irradiance,
        Self::Visibility,
        Self::Normal,
        Self::Depth,
        Self::Indirect,
        Self::ProbeStatus,
    ];

    pub fn id(self) -> u32 {
        match self {
            ResourceSlot::Radiance => 0,
            ResourceSlot::ProbeOffsets => 1,
            ResourceSlot::Irradiance => 2,
            ResourceSlot::Visibility => 3,
            ResourceSlot::Normal => 4,
            ResourceSlot::Depth => 5,
            ResourceSlot::Indirect => 6,
            ResourceSlot::ProbeStatus => 7,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

/// Feature bit-field stored in [`GiConstants::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags(pub u32);

impl FeatureFlags {
    pub const DEBUG_BORDER: u32 = 1 << 0;
    pub const DEBUG_BORDER_TYPE: u32 = 1 << 1;
    pub const DEBUG_BORDER_SOURCE: u32 = 1 << 2;
    pub const VISIBILITY: u32 = 1 << 3;
    pub const WRAP_SHADING: u32 = 1 << 4;
    pub const PERCEPTUAL_ENCODING: u32 = 1 << 5;
    pub const BACKFACE_BLENDING: u32 = 1 << 6;
    pub const PROBE_OFFSETTING: u32 = 1 << 7;
    pub const PROBE_STATUS: u32 = 1 << 8;
    pub const INFINITE_BOUNCES: u32 = 1 << 9;
    pub const HALF_RESOLUTION: u32 = 1 << 10;

    pub fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn with(self, flag: u32, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }
}

#[cfg(test)]
mod tests {
    use core::mem;

    use approx::assert_relative_eq;
    use glam::{uvec3, vec3};

    use super::*;

    #[test]
    fn layout() {
        assert_eq!(10 * 16 + 2 * 64 + 2 * 16, mem::size_of::<GiConstants>());
        assert_eq!(0, mem::size_of::<GiConstants>() % 16);
    }

    #[test]
    fn debug() {
        let constants = format!("{:?}", GiConstants::default());
        let flags = format!("{:?}", FeatureFlags::default());

        assert!(constants.starts_with("GiConstants"), "{constants}");
        assert!(flags.starts_with("FeatureFlags"), "{flags}");
    }

    #[test]
    fn slots() {
        let mut constants = GiConstants::default();

        constants.set_slots();

        for slot in ResourceSlot::ALL {
            assert_eq!(slot.id(), constants.slot(slot));
            assert_eq!(Some(slot), ResourceSlot::from_id(slot.id()));
        }

        assert_eq!(None, ResourceSlot::from_id(8));
    }

    #[test]
    fn flag_bits() {
        let flags = [
            FeatureFlags::DEBUG_BORDER,
            FeatureFlags::DEBUG_BORDER_TYPE,
            FeatureFlags::DEBUG_BORDER_SOURCE,
            FeatureFlags::VISIBILITY,
            FeatureFlags::WRAP_SHADING,
            FeatureFlags::PERCEPTUAL_ENCODING,
            FeatureFlags::BACKFACE_BLENDING,
            FeatureFlags::PROBE_OFFSETTING,
            FeatureFlags::PROBE_STATUS,
            FeatureFlags::INFINITE_BOUNCES,
            FeatureFlags::HALF_RESOLUTION,
        ];

        for (bit, flag) in flags.into_iter().enumerate() {
            assert_eq!(1 << bit, flag);
        }

        let target = FeatureFlags::default()
            .with(FeatureFlags::VISIBILITY, true)
            .with(FeatureFlags::HALF_RESOLUTION, true)
            .with(FeatureFlags::VISIBILITY, false);

        assert!(target.has(FeatureFlags::HALF_RESOLUTION));
        assert!(!target.has(FeatureFlags::VISIBILITY));
    }

    #[test]
    fn grid() {
        let mut constants = GiConstants::default();

        constants.grid_origin.w = 0.5;
        constants.probe_counts.w = 128;

        let grid = ProbeGrid {
            origin: vec3(1.0, 2.0, 3.0),
            spacing: vec3(2.0, 4.0, 0.5),
            counts: uvec3(4, 5, 6),
        };

        constants.set_grid(grid);

        assert_eq!(grid, constants.grid());
        assert_eq!(vec3(0.5, 0.25, 2.0), constants.reciprocal_spacing());
        assert_eq!(0.5, constants.max_probe_offset());
        assert_eq!(128, constants.rays_per_probe());
        assert_eq!(120, constants.update_range().total);
    }

    #[test]
    fn output_size() {
        let size = uvec2(1921, 1080);

        assert_eq!(size, GiConstants::output_size_for(size, false));
        assert_eq!(uvec2(961, 540), GiConstants::output_size_for(size, true));

        let mut constants = GiConstants::default();

        constants.set_resolution(size, true);

        assert_eq!(size, constants.viewport_size());
        assert_eq!(uvec2(961, 540), constants.output_size());
    }

    #[test]
    fn gbuffer_pixel() {
        let mut constants = GiConstants::default();

        constants.set_resolution(uvec2(100, 50), true);
        constants.update.z = FeatureFlags::HALF_RESOLUTION;

        assert_eq!(uvec2(20, 10), constants.gbuffer_pixel(uvec2(10, 5)));
        assert_eq!(uvec2(99, 49), constants.gbuffer_pixel(uvec2(50, 25)));
    }

    #[test]
    fn reconstruct_position() {
        let mut constants = GiConstants::default();

        constants.set_resolution(uvec2(2, 2), false);
        constants.ndc_to_world = Mat4::from_translation(vec3(10.0, 0.0, 0.0));

        let actual = constants.reconstruct_position(uvec2(1, 0), 0.25);

        assert_relative_eq!(10.5, actual.x);
        assert_relative_eq!(0.5, actual.y);
        assert_relative_eq!(0.25, actual.z);
    }
}
