use std::mem;

use glam::UVec2;
use log::debug;

use crate::{
    gpu, utils, DoubleBuffered, GBuffer, GiSettings, MappedUniformBuffer,
    ProbeVolume, Result, StorageBuffer, Texture,
};

/// Every GPU resource owned by a probe volume; dropping it releases them all.
#[derive(Debug)]
pub struct VolumeBuffers {
    pub constants: MappedUniformBuffer<gpu::GiConstants>,
    pub radiance: Texture,
    pub probe_offsets: Texture,
    pub probe_status: StorageBuffer,
    pub irradiance: DoubleBuffered<Texture>,
    pub visibility: DoubleBuffered<Texture>,
    pub indirect: Texture,
}

impl VolumeBuffers {
    pub fn new(
        device: &wgpu::Device,
        volume: &ProbeVolume,
        settings: &GiSettings,
        gbuffer: &GBuffer,
    ) -> Result<Self> {
        debug!("Initializing volume buffers");

        utils::scoped(device, "volume buffers", || {
            let constants =
                MappedUniformBuffer::new_default(device, "constants");

            let radiance = Texture::builder("radiance")
                .with_size(volume.radiance_size())
                .with_format(wgpu::TextureFormat::Rgba16Float)
                .build(device);

            let probe_offsets = Texture::builder("probe_offsets")
                .with_size(volume.offsets_size())
                .with_format(wgpu::TextureFormat::Rgba16Float)
                .build(device);

            let probe_status = StorageBuffer::new(
                device,
                "probe_status",
                volume.total_probes() as usize * mem::size_of::<u32>(),
            );

            let irradiance = DoubleBuffered::new(
                device,
                "irradiance",
                volume.irradiance_layout().size(),
                wgpu::TextureFormat::Rgba16Float,
            );

            let visibility = DoubleBuffered::new(
                device,
                "visibility",
                volume.visibility_layout().size(),
                wgpu::TextureFormat::Rgba16Float,
            );

            let indirect = Self::build_indirect(
                device,
                Self::indirect_size(settings, gbuffer),
            );

            Self {
                constants,
                radiance,
                probe_offsets,
                probe_status,
                irradiance,
                visibility,
                indirect,
            }
        })
    }

    /// Allocates a new indirect output, to be swapped in place of
    /// [`Self::indirect`] when the output's size changes.
    pub fn new_indirect(
        device: &wgpu::Device,
        settings: &GiSettings,
        gbuffer: &GBuffer,
    ) -> Result<Texture> {
        let size = Self::indirect_size(settings, gbuffer);

        debug!("Allocating indirect output; size={}x{}", size.x, size.y);

        utils::scoped(device, "indirect output", || {
            Self::build_indirect(device, size)
        })
    }

    pub fn indirect_size(settings: &GiSettings, gbuffer: &GBuffer) -> UVec2 {
        gpu::GiConstants::output_size_for(
            gbuffer.size,
            settings.features.half_resolution,
        )
    }

    fn build_indirect(device: &wgpu::Device, size: UVec2) -> Texture {
        Texture::builder("indirect")
            .with_size(size)
            .with_format(wgpu::TextureFormat::Rgba16Float)
            .build(device)
    }

    /// Returns texture backing given slot, as it is after the current frame;
    /// `None` for resources that aren't textures.
    pub fn view<'a>(
        &'a self,
        slot: gpu::ResourceSlot,
        gbuffer: &'a GBuffer,
        alternate: bool,
    ) -> Option<&'a wgpu::TextureView> {
        match slot {
            gpu::ResourceSlot::Radiance => Some(self.radiance.view()),
            gpu::ResourceSlot::ProbeOffsets => Some(self.probe_offsets.view()),
            gpu::ResourceSlot::Irradiance => {
                Some(self.irradiance.get(alternate).view())
            }
            gpu::ResourceSlot::Visibility => {
                Some(self.visibility.get(alternate).view())
            }
            gpu::ResourceSlot::Normal => Some(gbuffer.normal.view()),
            gpu::ResourceSlot::Depth => Some(gbuffer.depth.view()),
            gpu::ResourceSlot::Indirect => Some(self.indirect.view()),
            gpu::ResourceSlot::ProbeStatus => None,
        }
    }
}
