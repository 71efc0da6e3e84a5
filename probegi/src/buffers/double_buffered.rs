use glam::UVec2;

use crate::{AlternatingBindable, Bindable, Texture};

/// Resource existing in two versions: one written during the current frame
/// and one holding what's been written during the previous frame.
///
/// Even frames write into `a`, odd (alternate) frames write into `b`.
#[derive(Clone, Copy, Debug)]
pub struct DoubleBuffered<T> {
    a: T,
    b: T,
}

impl DoubleBuffered<Texture> {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
        format: wgpu::TextureFormat,
    ) -> Self {
        let label = label.as_ref();

        let build = |suffix: &str| {
            Texture::builder(format!("{label}_{suffix}"))
                .with_size(size)
                .with_format(format)
                .build(device)
        };

        Self {
            a: build("a"),
            b: build("b"),
        }
    }
}

impl<'a> DoubleBuffered<&'a Texture> {
    /// See: [`Texture::bind_sampled()`].
    pub fn bind_sampled(self) -> impl AlternatingBindable + 'a {
        self.map(|tex| tex.bind_sampled())
    }

    /// See: [`Texture::bind_readable()`].
    pub fn bind_readable(self) -> impl AlternatingBindable + 'a {
        self.map(|tex| tex.bind_readable())
    }

    /// See: [`Texture::bind_writable()`].
    pub fn bind_writable(self) -> impl AlternatingBindable + 'a {
        self.map(|tex| tex.bind_writable())
    }
}

impl<T> DoubleBuffered<T> {
    pub fn get(&self, alternate: bool) -> &T {
        if alternate {
            &self.b
        } else {
            &self.a
        }
    }

    /// Returns the version written during the current frame.
    pub fn curr(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.a,
            b: &self.b,
        }
    }

    /// Returns the version written during the previous frame.
    pub fn past(&self) -> DoubleBuffered<&T> {
        DoubleBuffered {
            a: &self.b,
            b: &self.a,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DoubleBuffered<U> {
        DoubleBuffered {
            a: f(self.a),
            b: f(self.b),
        }
    }
}

impl<T> AlternatingBindable for DoubleBuffered<T>
where
    T: Bindable,
{
    fn bind_alternate(
        &self,
        binding: u32,
        alternate: bool,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        Bindable::bind(self.get(alternate), binding)
    }
}
