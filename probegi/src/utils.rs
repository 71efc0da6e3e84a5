mod metrics;

pub use self::metrics::*;

use crate::{Error, Result};

/// Runs `f`, turning any validation or out-of-memory error the device raises
/// meanwhile into [`Error::Device`].
pub fn scoped<T>(
    device: &wgpu::Device,
    context: impl AsRef<str>,
    f: impl FnOnce() -> T,
) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = f();

    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    match validation.or(out_of_memory) {
        Some(source) => Err(Error::Device {
            context: context.as_ref().to_string(),
            source,
        }),
        None => Ok(value),
    }
}
