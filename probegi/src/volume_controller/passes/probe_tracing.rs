use glam::uvec2;

use crate::{
    gpu, Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass,
    VolumeController,
};

#[derive(Debug)]
pub struct ProbeTracingPass {
    pass: VolumeComputePass<gpu::ProbeTracingPassParams>,
}

impl ProbeTracingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("probe_tracing")
            .bind([
                &buffers.constants.bind_readable(),
                &buffers.probe_offsets.bind_readable(),
                &buffers.irradiance.past().bind_sampled(),
                &buffers.radiance.bind_writable(),
            ])
            .bind([
                &engine.bvh.bind_readable(),
                &engine.triangles.bind_readable(),
                &engine.materials.bind_readable(),
                &engine.lights.bind_readable(),
            ])
            .build(device, &engine.shaders.probe_tracing)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 32x1 warps, with one row of warps per probe:
        let size = uvec2(
            (volume.volume.rays_per_probe + 31) / 32,
            volume.volume.total_probes(),
        );

        let params = volume.settings.lighting.serialize();

        self.pass.run(volume, encoder, size, params);
    }
}
