use log::debug;

use crate::{Engine, GBuffer, Result, VolumeBuffers};

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct VolumePasses {
            $( pub $name: $class, )*
        }

        impl VolumePasses {
            pub fn new(
                engine: &Engine,
                device: &wgpu::Device,
                gbuffer: &GBuffer,
                buffers: &VolumeBuffers,
            ) -> Result<Self> {
                debug!("Initializing volume passes");

                Ok(Self {
                    $( $name: $class::new(engine, device, gbuffer, buffers)?, )*
                })
            }
        }
    };
}

passes!([
    irradiance_blending => IrradianceBlendingPass,
    irradiance_sampling => IrradianceSamplingPass,
    probe_classification => ProbeClassificationPass,
    probe_relocation => ProbeRelocationPass,
    probe_tracing => ProbeTracingPass,
    visibility_blending => VisibilityBlendingPass,
]);
