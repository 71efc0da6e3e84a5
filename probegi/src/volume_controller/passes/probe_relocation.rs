use glam::uvec2;

use crate::{
    gpu, Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass,
    VolumeController,
};

#[derive(Debug)]
pub struct ProbeRelocationPass {
    pass: VolumeComputePass<gpu::ProbeRelocationPassParams>,
}

impl ProbeRelocationPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("probe_relocation")
            .bind([
                &buffers.constants.bind_readable(),
                &buffers.radiance.bind_readable(),
                &buffers.probe_offsets.bind_read_writable(),
            ])
            .build(device, &engine.shaders.probe_relocation)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 32x1 warps, one invocation per probe:
        let size = uvec2((volume.volume.total_probes() + 31) / 32, 1);

        let params = gpu::ProbeRelocationPassParams {
            first_frame: volume.update.first_frame as u32,
        };

        self.pass.run(volume, encoder, size, params);
    }
}
