use crate::{RadianceSample, BACKFACE_THRESHOLD};

/// Validity of a probe, stored as one `u32` per probe.
///
/// Zero means active, so a freshly zeroed buffer has all probes enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProbeStatus {
    #[default]
    Active,

    /// Probe sees too many backfaces to be trusted
    Inactive,

    /// Probe is fully enclosed by geometry
    Off,
}

impl ProbeStatus {
    pub fn classify(samples: impl IntoIterator<Item = RadianceSample>) -> Self {
        let mut rays = 0;
        let mut backfaces = 0;

        for sample in samples {
            rays += 1;

            if sample.is_backface() {
                backfaces += 1;
            }
        }

        if rays == 0 {
            return ProbeStatus::Active;
        }

        if backfaces == rays {
            ProbeStatus::Off
        } else if backfaces as f32 / rays as f32 >= BACKFACE_THRESHOLD {
            ProbeStatus::Inactive
        } else {
            ProbeStatus::Active
        }
    }

    pub fn is_active(self) -> bool {
        self == ProbeStatus::Active
    }

    pub fn serialize(self) -> u32 {
        match self {
            ProbeStatus::Active => 0,
            ProbeStatus::Inactive => 1,
            ProbeStatus::Off => 2,
        }
    }

    pub fn deserialize(status: u32) -> Self {
        match status {
            0 => ProbeStatus::Active,
            1 => ProbeStatus::Inactive,
            _ => ProbeStatus::Off,
        }
    }
}
