use std::time::Duration;
#[cfg(feature = "metrics")]
use std::time::Instant;

/// Measures how long given piece of the host-side work took and reports it
/// through `log::trace!()`; compiles down to nothing without the `metrics`
/// feature.
#[cfg(feature = "metrics")]
pub fn measure<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let tt = Instant::now();
    let value = f();

    report(label, tt.elapsed());

    value
}

#[cfg(not(feature = "metrics"))]
pub fn measure<T>(_: &str, f: impl FnOnce() -> T) -> T {
    f()
}

/// Reports how long something took, e.g. a stage measured on the GPU.
#[cfg(feature = "metrics")]
pub fn report(label: &str, duration: Duration) {
    log::trace!("{label}: {}", humantime::format_duration(duration));
}

#[cfg(not(feature = "metrics"))]
pub fn report(_: &str, _: Duration) {}
