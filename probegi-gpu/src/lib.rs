//! Common structs and algorithms used by probegi's kernels and renderer.
//!
//! Everything here operates on a single probe or a single texel, so that the
//! host-side renderer, the GPU kernels and the tests all share the exact same
//! definition of what each stage of the probe pipeline computes.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod atlas;
mod constants;
mod irradiance_sampling;
mod octahedral;
mod passes;
mod probe_blending;
mod probe_grid;
mod probe_rays;
mod probe_relocation;
mod probe_status;
mod probe_trace;
mod update_range;
mod utils;

pub use self::atlas::*;
pub use self::constants::*;
pub use self::irradiance_sampling::*;
pub use self::octahedral::*;
pub use self::passes::*;
pub use self::probe_blending::*;
pub use self::probe_grid::*;
pub use self::probe_rays::*;
pub use self::probe_relocation::*;
pub use self::probe_status::*;
pub use self::probe_trace::*;
pub use self::update_range::*;
pub use self::utils::*;

/// Number of frames during which probes get relocated after the grid has been
/// moved or resized.
pub const SETTLE_FRAMES: u32 = 24;

/// Fraction of backface hits at which a probe is considered to be stuck inside
/// geometry.
pub const BACKFACE_THRESHOLD: f32 = 0.25;

/// Hit distance stored for rays that escaped the scene.
///
/// Must fit into a half-float texel.
pub const MISS_DISTANCE: f32 = 1.0e4;

/// Backface hits are stored as `-BACKFACE_DISTANCE_SCALE * distance`.
pub const BACKFACE_DISTANCE_SCALE: f32 = 0.2;

pub const PROBEGI_EPSILON: f32 = 1.0e-4;
