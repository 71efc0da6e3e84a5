use std::mem;
use std::sync::mpsc;
use std::time::Duration;

use derivative::Derivative;
use log::{debug, warn};

use crate::{utils, Result, StageId};

/// GPU timestamps written around each stage of the schedule, read back after
/// the frame has been submitted.
///
/// Only allocated with the `metrics` feature enabled and on devices that
/// support [`wgpu::Features::TIMESTAMP_QUERY`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct StageTimestamps {
    stages: Vec<StageId>,

    #[derivative(Debug = "ignore")]
    query_set: wgpu::QuerySet,

    resolved: wgpu::Buffer,
    readback: wgpu::Buffer,
}

impl StageTimestamps {
    pub fn new(
        device: &wgpu::Device,
        stages: impl IntoIterator<Item = StageId>,
    ) -> Result<Option<Self>> {
        if !cfg!(feature = "metrics")
            || !device.features().contains(wgpu::Features::TIMESTAMP_QUERY)
        {
            return Ok(None);
        }

        let stages: Vec<_> = stages.into_iter().collect();

        debug!("Initializing timestamps; stages={}", stages.len());

        utils::scoped(device, "stage timestamps", || {
            let count = 2 * stages.len() as u32;
            let size = Self::size(count);

            let query_set =
                device.create_query_set(&wgpu::QuerySetDescriptor {
                    label: Some("probegi_timestamps"),
                    ty: wgpu::QueryType::Timestamp,
                    count,
                });

            let resolved = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("probegi_timestamps_resolved"),
                size,
                usage: wgpu::BufferUsages::QUERY_RESOLVE
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            });

            let readback = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("probegi_timestamps_readback"),
                size,
                usage: wgpu::BufferUsages::MAP_READ
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            Some(Self {
                stages,
                query_set,
                resolved,
                readback,
            })
        })
    }

    fn size(count: u32) -> wgpu::BufferAddress {
        (count as usize * mem::size_of::<u64>()) as wgpu::BufferAddress
    }

    pub fn begin(&self, encoder: &mut wgpu::CommandEncoder, stage: usize) {
        encoder.write_timestamp(&self.query_set, 2 * stage as u32);
    }

    pub fn end(&self, encoder: &mut wgpu::CommandEncoder, stage: usize) {
        encoder.write_timestamp(&self.query_set, 2 * stage as u32 + 1);
    }

    /// Records copying this frame's timestamps into the readback buffer.
    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        let count = 2 * self.stages.len() as u32;

        encoder.resolve_query_set(&self.query_set, 0..count, &self.resolved, 0);

        encoder.copy_buffer_to_buffer(
            &self.resolved,
            0,
            &self.readback,
            0,
            Self::size(count),
        );
    }

    /// Waits for the most recently submitted frame and returns how long each
    /// of its stages took.
    pub fn read(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Vec<(StageId, Duration)> {
        let slice = self.readback.slice(..);
        let (sender, receiver) = mpsc::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device.poll(wgpu::Maintain::Wait);

        match receiver.recv() {
            Ok(Ok(())) => (),

            Ok(Err(err)) => {
                warn!("Couldn't read timestamps: {err}");
                return Default::default();
            }

            Err(_) => {
                warn!("Couldn't read timestamps: mapping was abandoned");
                return Default::default();
            }
        }

        let ticks: Vec<u64> = slice
            .get_mapped_range()
            .chunks_exact(mem::size_of::<u64>())
            .map(bytemuck::pod_read_unaligned)
            .collect();

        self.readback.unmap();

        stage_durations(&self.stages, &ticks, queue.get_timestamp_period())
    }
}

/// Pairs stages with the time they took, given their `(begin, end)` ticks
/// and the number of nanoseconds per tick.
///
/// Timestamps that went backwards (e.g. on a counter reset) yield zero.
pub fn stage_durations(
    stages: &[StageId],
    ticks: &[u64],
    period: f32,
) -> Vec<(StageId, Duration)> {
    stages
        .iter()
        .zip(ticks.chunks_exact(2))
        .map(|(&stage, ticks)| {
            let elapsed = ticks[1].saturating_sub(ticks[0]);
            let nanos = (elapsed as f64 * period as f64).round() as u64;

            (stage, Duration::from_nanos(nanos))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        let stages = [
            StageId::ProbeTracing,
            StageId::ProbeRelocation,
            StageId::IrradianceBlending,
        ];

        let ticks = [100, 1100, 1100, 1100, 5000, 4000];

        assert_eq!(
            vec![
                (StageId::ProbeTracing, Duration::from_nanos(2500)),
                (StageId::ProbeRelocation, Duration::ZERO),
                (StageId::IrradianceBlending, Duration::ZERO),
            ],
            stage_durations(&stages, &ticks, 2.5)
        );
    }

    #[test]
    fn durations_of_missing_ticks() {
        let stages = [StageId::ProbeTracing, StageId::ProbeRelocation];

        assert_eq!(
            vec![(StageId::ProbeTracing, Duration::from_nanos(10))],
            stage_durations(&stages, &[0, 10, 20], 1.0)
        );
    }
}
