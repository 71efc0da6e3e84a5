use std::fmt;

use fxhash::{FxHashMap, FxHashSet};
use log::debug;

use crate::ScheduleError;

/// Everything the stages of the probe pipeline read or write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Constants,
    SceneGeometry,
    GBufferNormal,
    GBufferDepth,
    Radiance,
    ProbeOffsets,
    ProbeStatus,
    IrradianceAtlas,
    VisibilityAtlas,
    Indirect,
}

impl Resource {
    /// Whether the resource is produced outside of the probe pipeline (and so
    /// doesn't need a writer within it).
    pub fn is_external(self) -> bool {
        matches!(
            self,
            Self::SceneGeometry | Self::GBufferNormal | Self::GBufferDepth
        )
    }

    /// Whether the resource exists in two copies, so that reading the previous
    /// frame's copy never conflicts with writing the current one.
    pub fn is_double_buffered(self) -> bool {
        matches!(self, Self::IrradianceAtlas | Self::VisibilityAtlas)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Reads what an earlier stage of the same frame has written
    Read,

    /// Reads what's been left there by the previous frame
    ReadPrevious,

    Write,

    /// Reads the previous frame's value and updates it in place
    ReadWrite,
}

impl Access {
    pub fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadPrevious | Self::ReadWrite)
    }

    pub fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageId {
    ConstantsUpload,
    ProbeTracing,
    ProbeRelocation,
    ProbeClassification,
    IrradianceBlending,
    VisibilityBlending,
    IrradianceSampling,
}

impl StageId {
    pub fn name(self) -> &'static str {
        match self {
            Self::ConstantsUpload => "constants_upload",
            Self::ProbeTracing => "probe_tracing",
            Self::ProbeRelocation => "probe_relocation",
            Self::ProbeClassification => "probe_classification",
            Self::IrradianceBlending => "irradiance_blending",
            Self::VisibilityBlending => "visibility_blending",
            Self::IrradianceSampling => "irradiance_sampling",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stage {
    pub id: StageId,
    pub accesses: Vec<(Resource, Access)>,
}

impl Stage {
    pub fn new(id: StageId) -> Self {
        Self {
            id,
            accesses: Default::default(),
        }
    }

    pub fn read(self, resource: Resource) -> Self {
        self.with(resource, Access::Read)
    }

    pub fn read_previous(self, resource: Resource) -> Self {
        self.with(resource, Access::ReadPrevious)
    }

    pub fn write(self, resource: Resource) -> Self {
        self.with(resource, Access::Write)
    }

    pub fn read_write(self, resource: Resource) -> Self {
        self.with(resource, Access::ReadWrite)
    }

    fn with(mut self, resource: Resource, access: Access) -> Self {
        self.accesses.push((resource, access));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hazard {
    ReadAfterWrite,
    WriteAfterWrite,
    WriteAfterRead,
}

/// Ordering constraint between two stages: `after` must not start touching
/// `resource` until `before` is done with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Barrier {
    pub resource: Resource,
    pub hazard: Hazard,
    pub before: StageId,
    pub after: StageId,
}

/// Ordered list of stages, together with the barriers derived from what each
/// of them accesses.
#[derive(Clone, Debug)]
pub struct Schedule {
    stages: Vec<Stage>,
    barriers: Vec<Barrier>,
}

impl Schedule {
    pub fn new(stages: Vec<Stage>) -> Result<Self, ScheduleError> {
        Self::validate(&stages)?;

        let barriers = Self::derive_barriers(&stages);

        debug!(
            "Schedule built; stages={}, barriers={}",
            stages.len(),
            barriers.len()
        );

        Ok(Self { stages, barriers })
    }

    /// Returns the schedule of a probe volume's frame.
    pub fn probe_volume() -> Result<Self, ScheduleError> {
        use self::Resource::*;

        Self::new(vec![
            Stage::new(StageId::ConstantsUpload).write(Constants),
            Stage::new(StageId::ProbeTracing)
                .read(Constants)
                .read(SceneGeometry)
                .read_previous(ProbeOffsets)
                .read_previous(IrradianceAtlas)
                .write(Radiance),
            Stage::new(StageId::ProbeRelocation)
                .read(Constants)
                .read(Radiance)
                .read_write(ProbeOffsets),
            Stage::new(StageId::ProbeClassification)
                .read(Constants)
                .read(Radiance)
                .read_write(ProbeStatus),
            Stage::new(StageId::IrradianceBlending)
                .read(Constants)
                .read(Radiance)
                .read_previous(IrradianceAtlas)
                .write(IrradianceAtlas),
            Stage::new(StageId::VisibilityBlending)
                .read(Constants)
                .read(Radiance)
                .read_previous(VisibilityAtlas)
                .write(VisibilityAtlas),
            Stage::new(StageId::IrradianceSampling)
                .read(Constants)
                .read(GBufferNormal)
                .read(GBufferDepth)
                .read(ProbeOffsets)
                .read(ProbeStatus)
                .read(IrradianceAtlas)
                .read(VisibilityAtlas)
                .write(Indirect),
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    /// Returns barriers that must be satisfied before given stage starts.
    pub fn barriers_before(
        &self,
        stage: StageId,
    ) -> impl Iterator<Item = &Barrier> + '_ {
        self.barriers
            .iter()
            .filter(move |barrier| barrier.after == stage)
    }

    fn validate(stages: &[Stage]) -> Result<(), ScheduleError> {
        let mut writers: FxHashMap<Resource, StageId> = Default::default();

        for stage in stages {
            for &(resource, access) in &stage.accesses {
                if !access.writes() {
                    continue;
                }

                if let Some(&first) = writers.get(&resource) {
                    if first != stage.id {
                        return Err(ScheduleError::MultipleWriters {
                            resource,
                            first: first.name(),
                            second: stage.id.name(),
                        });
                    }
                }

                writers.insert(resource, stage.id);
            }
        }

        let mut written: FxHashSet<Resource> = Default::default();

        for stage in stages {
            for &(resource, access) in &stage.accesses {
                if resource.is_external() {
                    continue;
                }

                let provided = match access {
                    Access::Read => written.contains(&resource),
                    Access::ReadPrevious => writers.contains_key(&resource),
                    Access::Write | Access::ReadWrite => true,
                };

                if !provided {
                    return Err(ScheduleError::MissingProducer {
                        stage: stage.id.name(),
                        resource,
                    });
                }
            }

            for &(resource, access) in &stage.accesses {
                if access.writes() {
                    written.insert(resource);
                }
            }
        }

        Ok(())
    }

    fn derive_barriers(stages: &[Stage]) -> Vec<Barrier> {
        #[derive(Default)]
        struct Tracker {
            writer: Option<StageId>,
            readers: Vec<StageId>,
        }

        let mut trackers: FxHashMap<Resource, Tracker> = Default::default();
        let mut barriers = Vec::new();
        let mut seen = FxHashSet::default();

        let mut push = |barrier: Barrier| {
            if barrier.before != barrier.after && seen.insert(barrier) {
                barriers.push(barrier);
            }
        };

        for stage in stages {
            for &(resource, access) in &stage.accesses {
                let tracker = trackers.entry(resource).or_default();

                if let (Access::Read | Access::ReadWrite, Some(writer)) =
                    (access, tracker.writer)
                {
                    push(Barrier {
                        resource,
                        hazard: Hazard::ReadAfterWrite,
                        before: writer,
                        after: stage.id,
                    });
                }

                let reads_current = match access {
                    Access::Read | Access::ReadWrite => true,
                    Access::ReadPrevious => !resource.is_double_buffered(),
                    Access::Write => false,
                };

                if access.writes() {
                    let readers: Vec<_> = tracker
                        .readers
                        .iter()
                        .copied()
                        .filter(|&reader| reader != stage.id)
                        .collect();

                    for &reader in &readers {
                        push(Barrier {
                            resource,
                            hazard: Hazard::WriteAfterRead,
                            before: reader,
                            after: stage.id,
                        });
                    }

                    if let Some(writer) = tracker.writer {
                        if readers.is_empty() && access == Access::Write {
                            push(Barrier {
                                resource,
                                hazard: Hazard::WriteAfterWrite,
                                before: writer,
                                after: stage.id,
                            });
                        }
                    }

                    tracker.writer = Some(stage.id);
                    tracker.readers.clear();
                } else if reads_current {
                    tracker.readers.push(stage.id);
                }
            }
        }

        barriers
    }
}
