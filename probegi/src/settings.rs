use glam::{vec3, Vec3};
use probegi_gpu as gpu;

use crate::ConfigError;

/// Knobs that can be changed every frame without reallocating anything.
#[derive(Clone, Debug, PartialEq)]
pub struct GiSettings {
    /// How much of the previous frame's irradiance and visibility survives
    /// each update; close to one means stable but slowly-reacting lighting
    pub hysteresis: f32,

    /// Largest distance a probe can be moved away from its grid position, as
    /// a fraction of the spacing
    pub max_probe_offset: f32,

    pub self_shadow_bias: f32,

    /// Maximum number of probes whose atlases get refreshed per frame once
    /// the volume has settled
    pub probe_update_budget: u32,

    pub infinite_bounces_multiplier: f32,

    /// Strength of indirect lighting; forwarded to whoever composes the
    /// final image
    pub intensity: f32,

    pub probe_sphere_scale: f32,

    /// Requests probe offsets to be found again, as if the grid was moved
    pub recalculate_offsets: bool,

    /// Whether indirect lighting should be composed into the final image
    pub indirect_enabled: bool,

    pub features: GiFeatures,
    pub lighting: TraceLighting,
    pub debug: DebugSettings,
}

impl GiSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.hysteresis) {
            return Err(ConfigError::InvalidHysteresis(self.hysteresis));
        }

        if !(0.0..=0.5).contains(&self.max_probe_offset) {
            return Err(ConfigError::InvalidMaxProbeOffset(
                self.max_probe_offset,
            ));
        }

        if self.probe_update_budget == 0 {
            return Err(ConfigError::NoUpdateBudget);
        }

        Ok(())
    }

    /// Returns whether switching from `self` to `other` invalidates probe
    /// offsets found so far.
    pub fn needs_resettling(&self, other: &Self) -> bool {
        self.max_probe_offset != other.max_probe_offset
            || other.recalculate_offsets
    }
}

impl Default for GiSettings {
    fn default() -> Self {
        Self {
            hysteresis: 0.65,
            max_probe_offset: 0.5,
            self_shadow_bias: 0.85,
            probe_update_budget: 1000,
            infinite_bounces_multiplier: 0.75,
            intensity: 0.8,
            probe_sphere_scale: 0.1,
            recalculate_offsets: false,
            indirect_enabled: true,
            features: Default::default(),
            lighting: Default::default(),
            debug: Default::default(),
        }
    }
}

/// Optional parts of the algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GiFeatures {
    /// Attenuates probes that cannot see the shaded point
    pub visibility: bool,

    pub wrap_shading: bool,

    /// Stores irradiance with a `x^(1/5)` curve
    pub perceptual_encoding: bool,

    /// Attenuates probes laying behind the shaded surface
    pub backface_blending: bool,

    /// Moves probes out of geometry
    pub probe_offsetting: bool,

    /// Ignores probes stuck inside geometry
    pub probe_status: bool,

    /// Feeds the previous frame's irradiance back into the rays' hits
    pub infinite_bounces: bool,

    /// Renders indirect lighting at half of the viewport's resolution
    pub half_resolution: bool,

    pub debug_border: bool,
    pub debug_border_type: bool,
    pub debug_border_source: bool,
}

impl GiFeatures {
    pub fn serialize(&self) -> gpu::FeatureFlags {
        use gpu::FeatureFlags as F;

        F::default()
            .with(F::DEBUG_BORDER, self.debug_border)
            .with(F::DEBUG_BORDER_TYPE, self.debug_border_type)
            .with(F::DEBUG_BORDER_SOURCE, self.debug_border_source)
            .with(F::VISIBILITY, self.visibility)
            .with(F::WRAP_SHADING, self.wrap_shading)
            .with(F::PERCEPTUAL_ENCODING, self.perceptual_encoding)
            .with(F::BACKFACE_BLENDING, self.backface_blending)
            .with(F::PROBE_OFFSETTING, self.probe_offsetting)
            .with(F::PROBE_STATUS, self.probe_status)
            .with(F::INFINITE_BOUNCES, self.infinite_bounces)
            .with(F::HALF_RESOLUTION, self.half_resolution)
    }
}

impl Default for GiFeatures {
    fn default() -> Self {
        Self {
            visibility: true,
            wrap_shading: true,
            perceptual_encoding: false,
            backface_blending: true,
            probe_offsetting: true,
            probe_status: false,
            infinite_bounces: false,
            half_resolution: true,
            debug_border: false,
            debug_border_type: false,
            debug_border_source: false,
        }
    }
}

/// Lighting used to shade the probes' rays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceLighting {
    /// Radiance of rays that escape the scene
    pub sky_color: Vec3,
    pub light: gpu::TraceLight,
}

impl TraceLighting {
    pub fn serialize(&self) -> gpu::ProbeTracingPassParams {
        gpu::ProbeTracingPassParams::new(self.sky_color, self.light)
    }
}

impl Default for TraceLighting {
    fn default() -> Self {
        Self {
            sky_color: vec3(0.5, 0.5, 0.5),
            light: gpu::TraceLight {
                position: vec3(-4.0, 1.0, 0.3),
                color: Vec3::ONE,
                intensity: 150.0,
                kind: gpu::TraceLightKind::Point,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugSettings {
    /// Whether [`crate::VolumeController::debug_view()`] should return
    /// anything
    pub show_textures: bool,

    /// Which texture gets exposed through the debug view
    pub texture: gpu::ResourceSlot,

    /// Whether [`crate::VolumeController::probe_spheres()`] should return
    /// anything
    pub show_probes: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            show_textures: false,
            texture: gpu::ResourceSlot::Irradiance,
            show_probes: false,
        }
    }
}
