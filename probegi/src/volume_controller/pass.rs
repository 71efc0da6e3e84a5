use std::marker::PhantomData;
use std::mem;
use std::ops::Range;

use bytemuck::Pod;
use glam::UVec2;
use log::debug;

use crate::{
    utils, AlternatingBindable, Result, Shader, VolumeBindGroup,
    VolumeBindGroupBuilder, VolumeController,
};

#[derive(Debug)]
pub struct VolumeComputePass<P> {
    label: String,
    bind_groups: Vec<VolumeBindGroup>,
    pipeline: wgpu::ComputePipeline,
    _params: PhantomData<P>,
}

impl<P> VolumeComputePass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> VolumePassBuilder<'a, P> {
        VolumePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    pub fn run(
        &self,
        volume: &VolumeController,
        encoder: &mut wgpu::CommandEncoder,
        size: UVec2,
        params: P,
    ) {
        let label = format!("probegi_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
            });

        pass.set_pipeline(&self.pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(&params));
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(
                bind_group_idx as u32,
                bind_group.get(volume.is_alternate()),
                &[],
            );
        }

        pass.dispatch_workgroups(size.x, size.y, 1);
    }
}

pub struct VolumePassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<VolumeBindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> VolumePassBuilder<'a, P>
where
    P: Pod,
{
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn AlternatingBindable; N],
    ) -> Self {
        let mut bind_group = VolumeBindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        (module, entry_point): &Shader,
    ) -> Result<VolumeComputePass<P>> {
        debug!("Initializing pass: {}:{}", self.label, entry_point);

        let label = self.label;

        utils::scoped(device, format!("pass `{label}`"), || {
            let bind_groups: Vec<_> = self
                .bind_groups
                .into_iter()
                .map(|bg| bg.build(device))
                .collect();

            let bind_group_layouts: Vec<_> =
                bind_groups.iter().map(|bg| bg.layout()).collect();

            let push_constant_ranges = push_constant_ranges::<P>();

            let pipeline_layout_label =
                format!("probegi_{label}_pipeline_layout");

            let pipeline_layout = device.create_pipeline_layout(
                &wgpu::PipelineLayoutDescriptor {
                    label: Some(&pipeline_layout_label),
                    bind_group_layouts: &bind_group_layouts,
                    push_constant_ranges: &push_constant_ranges,
                },
            );

            let pipeline_label = format!("probegi_{label}_pipeline");

            let pipeline = device.create_compute_pipeline(
                &wgpu::ComputePipelineDescriptor {
                    label: Some(&pipeline_label),
                    layout: Some(&pipeline_layout),
                    module,
                    entry_point,
                },
            );

            VolumeComputePass {
                label,
                bind_groups,
                pipeline,
                _params: PhantomData,
            }
        })
    }
}

/// Returns push constants a pass with parameters `P` needs; parameterless
/// passes don't have any.
fn push_constant_ranges<P>() -> Vec<wgpu::PushConstantRange> {
    if mem::size_of::<P>() > 0 {
        vec![wgpu::PushConstantRange {
            stages: wgpu::ShaderStages::COMPUTE,
            range: Range {
                start: 0,
                end: mem::size_of::<P>() as u32,
            },
        }]
    } else {
        vec![]
    }
}
