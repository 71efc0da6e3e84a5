mod bind_group;
mod buffers;
mod pass;
mod passes;
mod timestamps;

use std::mem;
use std::time::Duration;

use derivative::Derivative;
use glam::{uvec4, vec3, vec4, Mat4, UVec2};
use log::{debug, info, trace, warn};
use rand::Rng;

pub use self::bind_group::*;
pub use self::buffers::*;
pub use self::pass::*;
pub use self::passes::*;
pub use self::timestamps::*;
use crate::{
    gpu, utils, Camera, ConfigError, Engine, FrameUpdate, GBuffer, GiSettings,
    ProbeSphere, ProbeVolume, Result, Schedule, StageId, VolumeState,
};

/// Probe volume living on the GPU, together with everything needed to keep
/// its probes up to date.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct VolumeController {
    volume: ProbeVolume,
    settings: GiSettings,
    camera: Camera,
    gbuffer: GBuffer,
    state: VolumeState,
    update: FrameUpdate,
    schedule: Schedule,
    buffers: VolumeBuffers,

    #[derivative(Debug = "ignore")]
    passes: VolumePasses,

    timestamps: Option<StageTimestamps>,

    /// When set, the last configuration we've been given was invalid and
    /// we're falling back to direct lighting only
    disabled: Option<ConfigError>,
}

impl VolumeController {
    pub(crate) fn new(
        engine: &Engine,
        device: &wgpu::Device,
        volume: ProbeVolume,
        settings: GiSettings,
        camera: Camera,
        gbuffer: GBuffer,
    ) -> Result<Self> {
        info!("Creating volume: {}", volume.describe());

        volume.validate(&device.limits())?;
        settings.validate()?;

        let state = VolumeState::new(
            volume.total_probes(),
            settings.probe_update_budget,
        )?;

        let update = state.current();
        let schedule = Schedule::probe_volume()?;
        let buffers = VolumeBuffers::new(device, &volume, &settings, &gbuffer)?;
        let passes = VolumePasses::new(engine, device, &gbuffer, &buffers)?;

        let timestamps = StageTimestamps::new(
            device,
            schedule.stages().iter().map(|stage| stage.id),
        )?;

        debug!("Volume created");

        Ok(Self {
            volume,
            settings,
            camera,
            gbuffer,
            state,
            update,
            schedule,
            buffers,
            passes,
            timestamps,
            disabled: None,
        })
    }

    /// Applies new configuration.
    ///
    /// Invalid configuration doesn't get applied; instead, the volume stops
    /// rendering (see: [`Self::indirect_enabled()`]) until a valid one comes
    /// in.
    pub fn update(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        volume: ProbeVolume,
        settings: GiSettings,
    ) -> Result<()> {
        let validation = volume
            .validate(&device.limits())
            .and_then(|_| settings.validate());

        if let Err(err) = validation {
            if self.disabled.as_ref() != Some(&err) {
                warn!(
                    "Invalid configuration, falling back to direct lighting: \
                     {err}"
                );
            }

            self.disabled = Some(err);

            return Ok(());
        }

        let change = Reconfiguration::between(
            (&self.volume, &self.settings),
            (&volume, &settings),
        );

        // Nothing gets committed until all of the new resources are there, so
        // that a failed allocation leaves the previous configuration working
        let mut state = self.state.clone();

        change.apply(&mut state, &volume, &settings)?;

        if change.reallocate {
            debug!("Reallocating volume: {}", volume.describe());

            let buffers =
                VolumeBuffers::new(device, &volume, &settings, &self.gbuffer)?;

            let passes =
                VolumePasses::new(engine, device, &self.gbuffer, &buffers)?;

            self.buffers = buffers;
            self.passes = passes;
        } else if change.rebuild_output {
            self.passes = rebuild_output(
                engine,
                device,
                &mut self.buffers,
                &settings,
                &self.gbuffer,
            )?;
        }

        if change.resettle {
            debug!("Probes moved, relocating them again");
        }

        if self.disabled.take().is_some() {
            info!("Configuration is valid again, enabling indirect lighting");
        }

        if change.reallocate {
            self.update = state.current();
        }

        self.volume = volume;
        self.settings = settings;
        self.state = state;

        Ok(())
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Replaces the G-buffer, e.g. after the window's been resized.
    pub fn set_gbuffer(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        gbuffer: GBuffer,
    ) -> Result<()> {
        if !self.gbuffer.is_invalidated_by(&gbuffer) {
            return Ok(());
        }

        let passes = if self.gbuffer.size != gbuffer.size {
            rebuild_output(
                engine,
                device,
                &mut self.buffers,
                &self.settings,
                &gbuffer,
            )?
        } else {
            VolumePasses::new(engine, device, &gbuffer, &self.buffers)?
        };

        self.gbuffer = gbuffer;
        self.passes = passes;

        Ok(())
    }

    /// Rebuilds passes, e.g. after the scene's buffers have been replaced.
    pub fn rebuild(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
    ) -> Result<()> {
        debug!("Rebuilding passes for volume: {}", self.volume.describe());

        self.passes =
            VolumePasses::new(engine, device, &self.gbuffer, &self.buffers)?;

        Ok(())
    }

    /// Moves to the next frame and uploads its constants.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if self.disabled.is_some() {
            return;
        }

        self.update = self.state.advance();

        let rotation = {
            let mut rng = rand::thread_rng();

            gpu::ProbeRays::rotation(vec3(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ))
        };

        let constants = utils::measure("serialize_constants", || {
            serialize_constants(
                &self.volume,
                &self.settings,
                &self.camera,
                self.gbuffer.size,
                &self.update,
                rotation,
            )
        });

        *self.buffers.constants = constants;

        self.buffers.constants.flush(queue);
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        if self.disabled.is_some() {
            return;
        }

        for (stage_idx, stage) in self.schedule.stages().iter().enumerate() {
            trace!(
                "Recording stage `{}`; barriers={}",
                stage.id,
                self.schedule.barriers_before(stage.id).count()
            );

            encoder.push_debug_group(stage.id.name());

            if let Some(timestamps) = &self.timestamps {
                timestamps.begin(encoder, stage_idx);
            }

            match stage.id {
                // Constants are written through the queue in `flush()`
                StageId::ConstantsUpload => (),

                StageId::ProbeTracing => {
                    self.passes.probe_tracing.run(self, encoder);
                }

                StageId::ProbeRelocation => {
                    if self.update.is_settling() {
                        self.passes.probe_relocation.run(self, encoder);
                    }
                }

                StageId::ProbeClassification => {
                    self.passes.probe_classification.run(self, encoder);
                }

                StageId::IrradianceBlending => {
                    self.passes.irradiance_blending.run(self, encoder);
                }

                StageId::VisibilityBlending => {
                    self.passes.visibility_blending.run(self, encoder);
                }

                StageId::IrradianceSampling => {
                    self.passes.irradiance_sampling.run(self, encoder);
                }
            }

            if let Some(timestamps) = &self.timestamps {
                timestamps.end(encoder, stage_idx);
            }

            encoder.pop_debug_group();
        }

        if let Some(timestamps) = &self.timestamps {
            timestamps.resolve(encoder);
        }
    }

    /// Waits for the most recently submitted frame and reports how long each
    /// of its stages took on the GPU.
    ///
    /// Returns nothing unless the `metrics` feature is enabled and the device
    /// has been created with [`Engine::optional_features()`].
    pub fn stage_timings(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Vec<(StageId, Duration)> {
        let Some(timestamps) = &self.timestamps else {
            return Default::default();
        };

        let timings = timestamps.read(device, queue);

        for (stage, duration) in &timings {
            utils::report(stage.name(), *duration);
        }

        timings
    }

    /// Returns the texture with indirect lighting, to be composed with the
    /// direct lighting and scaled by [`Self::intensity()`].
    pub fn indirect_view(&self) -> &wgpu::TextureView {
        self.buffers.indirect.view()
    }

    /// Returns the texture selected through [`crate::DebugSettings`].
    pub fn debug_view(&self) -> Option<&wgpu::TextureView> {
        if !self.settings.debug.show_textures {
            return None;
        }

        self.buffers.view(
            self.settings.debug.texture,
            &self.gbuffer,
            self.is_alternate(),
        )
    }

    /// Returns spheres marking probes, if enabled through
    /// [`crate::DebugSettings`].
    pub fn probe_spheres(&self) -> Vec<ProbeSphere> {
        if !self.settings.debug.show_probes {
            return Default::default();
        }

        crate::probe_spheres(&self.volume, self.settings.probe_sphere_scale)
            .collect()
    }

    /// Whether the indirect output should be composed into the final image.
    pub fn indirect_enabled(&self) -> bool {
        self.settings.indirect_enabled && self.disabled.is_none()
    }

    pub fn intensity(&self) -> f32 {
        self.settings.intensity
    }

    /// Returns the configuration error that has disabled this volume, if any.
    pub fn config_error(&self) -> Option<&ConfigError> {
        self.disabled.as_ref()
    }

    pub fn volume(&self) -> &ProbeVolume {
        &self.volume
    }

    pub fn settings(&self) -> &GiSettings {
        &self.settings
    }

    pub fn state(&self) -> &VolumeState {
        &self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_alternate(&self) -> bool {
        self.state.is_alternate()
    }
}

impl Drop for VolumeController {
    fn drop(&mut self) {
        info!("Deleting volume: {}", self.volume.describe());
    }
}

/// What switching from one configuration to another involves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Reconfiguration {
    /// Probe counts or atlas sizes have changed, so every resource has to be
    /// allocated anew
    reallocate: bool,

    /// Probes have moved, so their offsets have to be found again
    resettle: bool,

    /// Only the indirect output has changed its size
    rebuild_output: bool,
}

impl Reconfiguration {
    fn between(
        (volume, settings): (&ProbeVolume, &GiSettings),
        (new_volume, new_settings): (&ProbeVolume, &GiSettings),
    ) -> Self {
        let reallocate = volume.needs_reallocation(new_volume);

        Self {
            reallocate,
            resettle: volume.needs_resettling(new_volume)
                || settings.needs_resettling(new_settings),
            rebuild_output: !reallocate
                && settings.features.half_resolution
                    != new_settings.features.half_resolution,
        }
    }

    fn apply(
        &self,
        state: &mut VolumeState,
        volume: &ProbeVolume,
        settings: &GiSettings,
    ) -> Result<(), ConfigError> {
        if self.reallocate {
            state.resize(volume.total_probes());
        }

        if self.resettle {
            state.request_recalculation();
        }

        state.set_budget(settings.probe_update_budget)
    }
}

/// Swaps a new indirect output into `buffers` and builds passes writing into
/// it; on failure `buffers` is left as it was.
fn rebuild_output(
    engine: &Engine,
    device: &wgpu::Device,
    buffers: &mut VolumeBuffers,
    settings: &GiSettings,
    gbuffer: &GBuffer,
) -> Result<VolumePasses> {
    let indirect = VolumeBuffers::new_indirect(device, settings, gbuffer)?;
    let previous = mem::replace(&mut buffers.indirect, indirect);

    match VolumePasses::new(engine, device, gbuffer, buffers) {
        Ok(passes) => Ok(passes),

        Err(err) => {
            buffers.indirect = previous;
            Err(err)
        }
    }
}

fn serialize_constants(
    volume: &ProbeVolume,
    settings: &GiSettings,
    camera: &Camera,
    viewport: UVec2,
    update: &FrameUpdate,
    rotation: Mat4,
) -> gpu::GiConstants {
    let mut constants = gpu::GiConstants::default();

    constants.set_slots();
    constants.set_grid(volume.grid());
    constants.set_layouts(
        volume.irradiance_layout(),
        volume.visibility_layout(),
    );

    constants.grid_origin.w = settings.max_probe_offset;
    constants.probe_spacing.w = settings.self_shadow_bias;
    constants.reciprocal_spacing.w = settings.hysteresis;
    constants.probe_counts.w = volume.rays_per_probe;

    constants.update = uvec4(
        update.range.offset,
        update.range.count,
        settings.features.serialize().0,
        update.frame,
    );

    constants.tunables = vec4(
        settings.infinite_bounces_multiplier,
        settings.intensity,
        settings.probe_sphere_scale,
        0.0,
    );

    constants.random_rotation = rotation;
    constants.ndc_to_world = camera.ndc_to_world;
    constants.camera_origin = camera.origin.extend(1.0);
    constants.set_resolution(viewport, settings.features.half_resolution);

    constants
}
