//! Host-side pipeline of probe-volume global illumination: keeps a grid of
//! light probes traced, relocated, classified and filtered into irradiance
//! and visibility atlases, then samples them into an indirect-lighting
//! texture for every pixel of the G-buffer.

mod buffers;
mod camera;
mod debug;
mod error;
mod schedule;
mod settings;
mod shaders;
mod state;
mod utils;
mod volume;
mod volume_controller;

use std::sync::Arc;

use log::info;
pub use probegi_gpu as gpu;

pub use self::buffers::*;
pub use self::camera::*;
pub use self::debug::*;
pub use self::error::*;
pub use self::schedule::*;
pub use self::settings::*;
pub use self::shaders::*;
pub use self::state::*;
pub use self::volume::*;
pub use self::volume_controller::*;

/// Storage buffers describing the scene probes get traced against; owned by
/// the application.
#[derive(Clone, Debug)]
pub struct SceneInputs {
    pub bvh: Arc<wgpu::Buffer>,
    pub triangles: Arc<wgpu::Buffer>,
    pub materials: Arc<wgpu::Buffer>,
    pub lights: Arc<wgpu::Buffer>,
}

#[derive(Debug)]
pub struct Engine {
    shaders: Shaders,
    bvh: ExternalBuffer,
    triangles: ExternalBuffer,
    materials: ExternalBuffer,
    lights: ExternalBuffer,
}

impl Engine {
    pub fn new(
        device: &wgpu::Device,
        shaders: ShaderSources<'_>,
        scene: SceneInputs,
    ) -> Result<Self> {
        info!("Initializing");

        let shaders = Shaders::new(device, shaders)?;

        Ok(Self {
            shaders,
            bvh: ExternalBuffer::new(scene.bvh),
            triangles: ExternalBuffer::new(scene.triangles),
            materials: ExternalBuffer::new(scene.materials),
            lights: ExternalBuffer::new(scene.lights),
        })
    }

    /// Device features required by the kernels: push constants for the
    /// per-dispatch parameters and read-write storage access to half-float
    /// textures for the in-place probe offsets.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::PUSH_CONSTANTS
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
    }

    /// Device features that aren't required, but get used when present:
    /// timestamp queries for [`VolumeController::stage_timings()`].
    pub fn optional_features() -> wgpu::Features {
        wgpu::Features::TIMESTAMP_QUERY
    }

    /// Device limits required by the kernels; the rest of the limits is
    /// checked against the probe volume when it's created.
    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: 128,
            ..Default::default()
        }
    }

    /// Replaces buffers describing the scene; volumes created beforehand
    /// have to be rebuilt through [`VolumeController::rebuild()`].
    pub fn set_scene(&mut self, scene: SceneInputs) {
        info!("Scene changed");

        self.bvh = ExternalBuffer::new(scene.bvh);
        self.triangles = ExternalBuffer::new(scene.triangles);
        self.materials = ExternalBuffer::new(scene.materials);
        self.lights = ExternalBuffer::new(scene.lights);
    }

    pub fn create_volume(
        &self,
        device: &wgpu::Device,
        volume: ProbeVolume,
        settings: GiSettings,
        camera: Camera,
        gbuffer: GBuffer,
    ) -> Result<VolumeController> {
        VolumeController::new(self, device, volume, settings, camera, gbuffer)
    }
}
