use glam::UVec2;
use log::info;

use crate::Bindable;

#[derive(Debug)]
pub struct Texture {
    tex: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
    size: UVec2,
}

impl Texture {
    pub fn builder(label: impl AsRef<str>) -> TextureBuilder {
        TextureBuilder {
            label: label.as_ref().to_string(),
            size: UVec2::ONE,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn tex(&self) -> &wgpu::Texture {
        &self.tex
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Binds texture together with a filtering sampler.
    pub fn bind_sampled(&self) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            access: TextureAccess::Sampled,
        }
    }

    /// Binds texture for `textureLoad()`-style reads.
    pub fn bind_readable(&self) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            access: TextureAccess::Readable,
        }
    }

    /// Binds texture as a write-only storage texture.
    pub fn bind_writable(&self) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            access: TextureAccess::Writable,
        }
    }

    /// Binds texture as a read-write storage texture; requires the device
    /// to support adapter-specific format features.
    pub fn bind_read_writable(&self) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            access: TextureAccess::ReadWritable,
        }
    }
}

pub struct TextureBuilder {
    label: String,
    size: UVec2,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
}

impl TextureBuilder {
    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn build(self, device: &wgpu::Device) -> Texture {
        let label = format!("probegi_{}", self.label);

        info!(
            "Allocating texture `{label}`; size={}x{}, format={:?}",
            self.size.x, self.size.y, self.format,
        );

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: self.size.x.max(1),
                height: self.size.y.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        });

        let view = tex.create_view(&Default::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label}_sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Texture {
            tex,
            view,
            sampler,
            format: self.format,
            size: self.size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextureAccess {
    Sampled,
    Readable,
    Writable,
    ReadWritable,
}

struct TextureBinder<'a> {
    parent: &'a Texture,
    access: TextureAccess,
}

impl Bindable for TextureBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let ty = match self.access {
            TextureAccess::Sampled | TextureAccess::Readable => {
                wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float {
                        filterable: self.access == TextureAccess::Sampled,
                    },
                }
            }

            TextureAccess::Writable => wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: self.parent.format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },

            TextureAccess::ReadWritable => wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::ReadWrite,
                format: self.parent.format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
        };

        let tex_layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty,
            count: None,
        };

        let tex_resource =
            wgpu::BindingResource::TextureView(&self.parent.view);

        if self.access != TextureAccess::Sampled {
            return vec![(tex_layout, tex_resource)];
        }

        let sampler_layout = wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let sampler_resource =
            wgpu::BindingResource::Sampler(&self.parent.sampler);

        vec![
            (tex_layout, tex_resource),
            (sampler_layout, sampler_resource),
        ]
    }
}
