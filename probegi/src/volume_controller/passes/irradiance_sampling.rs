use crate::{
    gpu, Engine, GBuffer, Result, VolumeBuffers, VolumeComputePass,
    VolumeController,
};

#[derive(Debug)]
pub struct IrradianceSamplingPass {
    pass: VolumeComputePass<gpu::IrradianceSamplingPassParams>,
}

impl IrradianceSamplingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        gbuffer: &GBuffer,
        buffers: &VolumeBuffers,
    ) -> Result<Self> {
        let pass = VolumeComputePass::builder("irradiance_sampling")
            .bind([
                &buffers.constants.bind_readable(),
                &gbuffer.normal.bind_readable(),
                &gbuffer.depth.bind_readable(),
                &buffers.probe_offsets.bind_readable(),
                &buffers.probe_status.bind_readable(),
                &buffers.irradiance.curr().bind_sampled(),
                &buffers.visibility.curr().bind_sampled(),
                &buffers.indirect.bind_writable(),
            ])
            .build(device, &engine.shaders.irradiance_sampling)?;

        Ok(Self { pass })
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        // This pass uses 8x8 warps, one invocation per output pixel:
        let size = (volume.buffers.indirect.size() + 7) / 8;

        let params = gpu::IrradianceSamplingPassParams {
            half_resolution: volume.settings.features.half_resolution as u32,
        };

        self.pass.run(volume, encoder, size, params);
    }
}
