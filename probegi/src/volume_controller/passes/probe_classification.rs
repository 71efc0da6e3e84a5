use glam::uvec2;

use crate::{
    Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass, VolumeController,
};

#[derive(Debug)]
pub struct ProbeClassificationPass {
    pass: VolumeComputePass<()>,
}

impl ProbeClassificationPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("probe_classification")
            .bind([
                &buffers.constants.bind_readable(),
                &buffers.radiance.bind_readable(),
                &buffers.probe_status.bind_writable(),
            ])
            .build(device, &engine.shaders.probe_classification)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 32x1 warps, one invocation per probe of the update
        // range:
        let size = uvec2((volume.update.range.len() + 31) / 32, 1);

        self.pass.run(volume, encoder, size, ());
    }
}
