use std::sync::Arc;

use crate::Bindable;

/// Read-only storage buffer owned by the host application (e.g. the scene's
/// BVH); we only ever bind it.
#[derive(Clone, Debug)]
pub struct ExternalBuffer {
    buffer: Arc<wgpu::Buffer>,
}

impl ExternalBuffer {
    pub fn new(buffer: Arc<wgpu::Buffer>) -> Self {
        Self { buffer }
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        ExternalBufferBinder { parent: self }
    }
}

struct ExternalBufferBinder<'a> {
    parent: &'a ExternalBuffer,
}

impl Bindable for ExternalBufferBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let resource = self.parent.buffer.as_entire_binding();

        vec![(layout, resource)]
    }
}

/// Texture view owned by the host application (e.g. the g-buffer's normals).
#[derive(Clone, Debug)]
pub struct ExternalTexture {
    view: Arc<wgpu::TextureView>,
    sample_type: wgpu::TextureSampleType,
}

impl ExternalTexture {
    pub fn new(
        view: Arc<wgpu::TextureView>,
        sample_type: wgpu::TextureSampleType,
    ) -> Self {
        Self { view, sample_type }
    }

    /// Wraps a non-filterable float view, which is what g-buffer passes
    /// usually produce.
    pub fn float(view: Arc<wgpu::TextureView>) -> Self {
        Self::new(
            view,
            wgpu::TextureSampleType::Float { filterable: false },
        )
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        ExternalTextureBinder { parent: self }
    }
}

struct ExternalTextureBinder<'a> {
    parent: &'a ExternalTexture,
}

impl Bindable for ExternalTextureBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: self.parent.sample_type,
            },
            count: None,
        };

        let resource = wgpu::BindingResource::TextureView(&self.parent.view);

        vec![(layout, resource)]
    }
}
