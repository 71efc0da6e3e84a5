use log::debug;

use crate::{utils, Result};

/// Compiled kernel together with the name of its entry point.
pub type Shader = (wgpu::ShaderModule, &'static str);

/// Not-yet-compiled kernel, as provided by the application.
pub struct ShaderSource<'a> {
    pub module: wgpu::ShaderModuleDescriptor<'a>,
    pub entry_point: &'static str,
}

macro_rules! shaders {
    ([ $( $name:ident, )* ]) => {
        /// Kernels for each stage of the probe pipeline.
        pub struct ShaderSources<'a> {
            $( pub $name: ShaderSource<'a>, )*
        }

        #[derive(Debug)]
        pub struct Shaders {
            $( pub $name: Shader, )*
        }

        impl Shaders {
            pub fn new(
                device: &wgpu::Device,
                sources: ShaderSources<'_>,
            ) -> Result<Self> {
                Ok(Self {
                    $( $name: Self::compile(
                        device,
                        stringify!($name),
                        sources.$name,
                    )?, )*
                })
            }
        }
    };
}

shaders!([
    probe_tracing,
    probe_relocation,
    probe_classification,
    irradiance_blending,
    visibility_blending,
    irradiance_sampling,
]);

impl Shaders {
    fn compile(
        device: &wgpu::Device,
        name: &str,
        source: ShaderSource<'_>,
    ) -> Result<Shader> {
        debug!("Compiling shader: {}:{}", name, source.entry_point);

        let module = utils::scoped(device, format!("shader `{name}`"), || {
            device.create_shader_module(source.module)
        })?;

        Ok((module, source.entry_point))
    }
}
