use log::trace;

use crate::AlternatingBindable;

/// Bind groups of a single pass, one for even and one for odd frames.
///
/// Both share the same layout and differ only in which copy of each
/// double-buffered atlas they point at.
#[derive(Debug)]
pub struct VolumeBindGroup {
    even: wgpu::BindGroup,
    odd: wgpu::BindGroup,
    layout: wgpu::BindGroupLayout,
}

impl VolumeBindGroup {
    pub fn builder<'a>(label: impl ToString) -> VolumeBindGroupBuilder<'a> {
        VolumeBindGroupBuilder {
            label: label.to_string(),
            items: Default::default(),
        }
    }

    pub fn get(&self, alternate: bool) -> &wgpu::BindGroup {
        if alternate {
            &self.odd
        } else {
            &self.even
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }
}

pub struct VolumeBindGroupBuilder<'a> {
    label: String,
    items: Vec<&'a dyn AlternatingBindable>,
}

impl<'a> VolumeBindGroupBuilder<'a> {
    pub fn add(mut self, item: &'a dyn AlternatingBindable) -> Self {
        self.items.push(item);
        self
    }

    pub fn build(self, device: &wgpu::Device) -> VolumeBindGroup {
        let label = format!("probegi_{}", self.label);
        let (layouts, even) = Self::entries(&self.items, false);
        let (_, odd) = Self::entries(&self.items, true);

        trace!("Building bind group `{label}`; entries={}", layouts.len());

        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label}_layout")),
                entries: &layouts,
            });

        let build = |suffix: &str, entries: &[wgpu::BindGroupEntry]| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label}_{suffix}")),
                layout: &layout,
                entries,
            })
        };

        let even = build("even", &even);
        let odd = build("odd", &odd);

        VolumeBindGroup { even, odd, layout }
    }

    /// Collects entries of all items, numbering their bindings in order.
    fn entries(
        items: &[&'a dyn AlternatingBindable],
        alternate: bool,
    ) -> (Vec<wgpu::BindGroupLayoutEntry>, Vec<wgpu::BindGroupEntry<'a>>) {
        let mut layouts = Vec::new();
        let mut entries = Vec::new();

        for &item in items {
            let binding = layouts.len() as u32;

            for (layout, resource) in item.bind_alternate(binding, alternate) {
                entries.push(wgpu::BindGroupEntry {
                    binding: layout.binding,
                    resource,
                });

                layouts.push(layout);
            }
        }

        (layouts, entries)
    }
}
