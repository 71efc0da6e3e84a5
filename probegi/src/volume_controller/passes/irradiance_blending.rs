use crate::{
    gpu, Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass,
    VolumeController,
};

#[derive(Debug)]
pub struct IrradianceBlendingPass {
    pass: VolumeComputePass<gpu::ProbeBlendingPassParams>,
}

impl IrradianceBlendingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("irradiance_blending")
            .bind([
                &buffers.constants.bind_readable(),
                &buffers.radiance.bind_readable(),
                &buffers.irradiance.past().bind_readable(),
                &buffers.irradiance.curr().bind_writable(),
            ])
            .build(device, &engine.shaders.irradiance_blending)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 8x8 warps, one invocation per atlas texel:
        let size = (volume.volume.irradiance_layout().size() + 7) / 8;

        let params = gpu::ProbeBlendingPassParams {
            first_frame: volume.update.first_frame as u32,
        };

        self.pass.run(volume, encoder, size, params);
    }
}
