use crate::Resource;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("device rejected {context}")]
    Device {
        context: String,

        #[source]
        source: wgpu::Error,
    },

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Configuration that cannot be turned into a working probe volume.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    #[error("probe volume has no probes (counts: {x}x{y}x{z})")]
    NoProbes { x: u32, y: u32, z: u32 },

    #[error("probe volume has too many probes (counts: {x}x{y}x{z})")]
    TooManyProbes { x: u32, y: u32, z: u32 },

    #[error("probes must trace at least one ray")]
    NoRays,

    #[error("probe spacing must be positive and finite on every axis")]
    DegenerateSpacing,

    #[error("grid origin must be finite")]
    NonFiniteOrigin,

    #[error("{atlas} atlas needs at least one interior texel per probe")]
    EmptyProbeTile { atlas: &'static str },

    #[error("per-frame probe update budget must be positive")]
    NoUpdateBudget,

    #[error("hysteresis must lay within 0.0..=1.0, got {0}")]
    InvalidHysteresis(f32),

    #[error("max probe offset must lay within 0.0..=0.5, got {0}")]
    InvalidMaxProbeOffset(f32),

    #[error(
        "{texture} texture would be {width}x{height}, but device supports \
         at most {limit}x{limit}"
    )]
    TextureTooLarge {
        texture: &'static str,
        width: u64,
        height: u64,
        limit: u32,
    },
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{resource:?} is written by both `{first}` and `{second}`")]
    MultipleWriters {
        resource: Resource,
        first: &'static str,
        second: &'static str,
    },

    #[error("`{stage}` reads {resource:?}, which no earlier stage provides")]
    MissingProducer {
        stage: &'static str,
        resource: Resource,
    },
}
