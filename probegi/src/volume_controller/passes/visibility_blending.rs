use crate::{
    gpu, Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass,
    VolumeController,
};

#[derive(Debug)]
pub struct VisibilityBlendingPass {
    pass: VolumeComputePass<gpu::ProbeBlendingPassParams>,
}

impl VisibilityBlendingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("visibility_blending")
            .bind([
                &buffers.constants.bind_readable(),
                &buffers.radiance.bind_readable(),
                &buffers.visibility.past().bind_readable(),
                &buffers.visibility.curr().bind_writable(),
            ])
            .build(device, &engine.shaders.visibility_blending)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 8x8 warps, one invocation per atlas texel:
        let size = (volume.volume.visibility_layout().size() + 7) / 8;

        let params = gpu::ProbeBlendingPassParams {
            first_frame: volume.update.first_frame as u32,
        };

        self.pass.run(volume, encoder, size, params);
    }
}
