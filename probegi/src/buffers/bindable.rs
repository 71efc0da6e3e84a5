/// Object that can be attached to a pipeline, e.g. a buffer or a texture
pub trait Bindable {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)>;
}

/// Object whose resources depend on which of the two alternating frames is
/// being recorded.
///
/// Everything that's [`Bindable`] is the same in both frames; the atlases,
/// wrapped in [`crate::DoubleBuffered`], swap their copies.
pub trait AlternatingBindable {
    fn bind_alternate(
        &self,
        binding: u32,
        alternate: bool,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)>;
}

impl<T> AlternatingBindable for T
where
    T: Bindable,
{
    fn bind_alternate(
        &self,
        binding: u32,
        _: bool,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        Bindable::bind(self, binding)
    }
}
