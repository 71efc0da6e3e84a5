use probegi_gpu::{UpdateRange, SETTLE_FRAMES};

use crate::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeMode {
    /// Probes are being relocated and every probe gets refreshed each frame
    Settling,

    /// Probes stay put and only a budgeted, rolling range of them gets
    /// refreshed each frame
    Steady,
}

/// What a single frame should do, as decided by [`VolumeState::advance()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameUpdate {
    pub frame: u32,
    pub mode: VolumeMode,

    /// Whether this is the first frame after (re)settling, i.e. the one that
    /// drops probe offsets and atlas history
    pub first_frame: bool,

    /// Settling frames left, including this one
    pub countdown: u32,

    pub range: UpdateRange,
}

impl FrameUpdate {
    pub fn is_settling(&self) -> bool {
        self.mode == VolumeMode::Settling
    }
}

/// Mutable, per-frame state of a probe volume.
#[derive(Clone, Debug)]
pub struct VolumeState {
    total_probes: u32,
    budget: u32,
    cursor: u32,
    countdown: u32,
    frame: u32,
    issued: bool,
    recalculation_requested: bool,
}

impl VolumeState {
    pub fn new(total_probes: u32, budget: u32) -> Result<Self, ConfigError> {
        if budget == 0 {
            return Err(ConfigError::NoUpdateBudget);
        }

        Ok(Self {
            total_probes,
            budget,
            cursor: 0,
            countdown: SETTLE_FRAMES,
            frame: 0,
            issued: false,
            recalculation_requested: false,
        })
    }

    /// Changes the number of probes, starting over the settling.
    pub fn resize(&mut self, total_probes: u32) {
        self.total_probes = total_probes;
        self.cursor = 0;
        self.recalculation_requested = true;
    }

    pub fn set_budget(&mut self, budget: u32) -> Result<(), ConfigError> {
        if budget == 0 {
            return Err(ConfigError::NoUpdateBudget);
        }

        self.budget = budget;

        Ok(())
    }

    /// Schedules probe offsets to be found again, starting with the next
    /// frame.
    pub fn request_recalculation(&mut self) {
        self.recalculation_requested = true;
    }

    /// Moves to the next frame and returns what it should do.
    pub fn advance(&mut self) -> FrameUpdate {
        if self.issued {
            self.countdown = self.countdown.saturating_sub(1);
            self.frame = self.frame.wrapping_add(1);

            if self.total_probes > 0 {
                self.cursor = (self.cursor + self.budget % self.total_probes)
                    % self.total_probes;
            }
        }

        if std::mem::take(&mut self.recalculation_requested) {
            self.countdown = SETTLE_FRAMES;
        }

        self.issued = true;
        self.current()
    }

    /// Returns what the most recently advanced frame does.
    pub fn current(&self) -> FrameUpdate {
        let mode = self.mode();

        let range = match mode {
            VolumeMode::Settling => UpdateRange::full(self.total_probes),
            VolumeMode::Steady => UpdateRange::rolling(
                self.cursor,
                self.budget,
                self.total_probes,
            ),
        };

        FrameUpdate {
            frame: self.frame,
            mode,
            first_frame: self.countdown == SETTLE_FRAMES,
            countdown: self.countdown,
            range,
        }
    }

    pub fn mode(&self) -> VolumeMode {
        if self.countdown > 0 {
            VolumeMode::Settling
        } else {
            VolumeMode::Steady
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Whether double-buffered resources should be used in their swapped
    /// configuration this frame.
    pub fn is_alternate(&self) -> bool {
        self.frame % 2 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu;

    fn settle(state: &mut VolumeState) {
        for _ in 0..SETTLE_FRAMES {
            assert!(state.advance().is_settling());
        }
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert_eq!(
            ConfigError::NoUpdateBudget,
            VolumeState::new(100, 0).unwrap_err()
        );
    }

    #[test]
    fn starts_settling() {
        let mut state = VolumeState::new(100, 30).unwrap();
        let update = state.advance();

        assert_eq!(VolumeMode::Settling, update.mode);
        assert!(update.first_frame);
        assert_eq!(SETTLE_FRAMES, update.countdown);
        assert_eq!(UpdateRange::full(100), update.range);

        let update = state.advance();

        assert!(!update.first_frame);
        assert_eq!(SETTLE_FRAMES - 1, update.countdown);
        assert_eq!(UpdateRange::full(100), update.range);
    }

    #[test]
    fn becomes_steady_after_settle_frames() {
        let mut state = VolumeState::new(100, 30).unwrap();

        settle(&mut state);

        let update = state.advance();

        assert_eq!(VolumeMode::Steady, update.mode);
        assert_eq!(0, update.countdown);
        assert!(!update.range.is_full());
        assert_eq!(30, update.range.len());
    }

    #[test]
    fn cursor_sequence() {
        let mut state = VolumeState::new(100, 30).unwrap();

        let actual: Vec<_> = (0..5)
            .map(|_| {
                state.advance();
                state.cursor()
            })
            .collect();

        assert_eq!(vec![0, 30, 60, 90, 20], actual);
    }

    #[test]
    fn rolling_range_covers_every_probe() {
        let mut state = VolumeState::new(100, 30).unwrap();

        settle(&mut state);

        let mut touched = vec![false; 100];

        // ceil(100 / 30) = 4
        for _ in 0..4 {
            let update = state.advance();

            assert_eq!(VolumeMode::Steady, update.mode);

            for probe in update.range.iter() {
                touched[probe as usize] = true;
            }
        }

        assert!(touched.iter().all(|touched| *touched));
    }

    #[test]
    fn recalculation_restarts_settling() {
        let mut state = VolumeState::new(100, 30).unwrap();

        settle(&mut state);

        assert_eq!(VolumeMode::Steady, state.advance().mode);

        state.request_recalculation();

        let update = state.advance();

        assert!(update.first_frame);
        assert_eq!(SETTLE_FRAMES, update.countdown);
        assert_eq!(UpdateRange::full(100), update.range);

        for _ in 1..SETTLE_FRAMES {
            assert!(state.advance().is_settling());
        }

        assert_eq!(VolumeMode::Steady, state.advance().mode);
    }

    #[test]
    fn recalculation_resets_offsets() {
        let mut state = VolumeState::new(100, 30).unwrap();

        settle(&mut state);
        state.advance();
        state.request_recalculation();

        let update = state.advance();

        assert!(update.first_frame);
        assert_eq!(SETTLE_FRAMES, update.countdown);

        let mut constants = gpu::GiConstants::default();

        constants.grid_origin.w = 0.45;
        constants.probe_spacing = glam::vec4(2.0, 2.0, 2.0, 0.0);

        let relocation =
            constants.relocation(&gpu::ProbeRelocationPassParams {
                first_frame: update.first_frame as u32,
            });

        let rays = gpu::ProbeRays::new(64, glam::Mat4::IDENTITY);

        for offset in [glam::vec3(0.5, -0.3, 0.8), glam::Vec3::ZERO] {
            let samples = rays.iter().map(|dir| {
                (dir, gpu::RadianceSample::miss(glam::Vec3::ONE))
            });

            assert_eq!(glam::Vec3::ZERO, relocation.relocate(offset, samples));
        }
    }

    #[test]
    fn recalculation_during_settling() {
        let mut state = VolumeState::new(100, 30).unwrap();

        for _ in 0..10 {
            state.advance();
        }

        state.request_recalculation();

        assert!(state.advance().first_frame);
    }

    #[test]
    fn budget_is_clamped_to_volume() {
        let mut state = VolumeState::new(24, 1000).unwrap();

        settle(&mut state);

        let update = state.advance();

        assert_eq!(VolumeMode::Steady, update.mode);
        assert!(update.range.is_full());
    }

    #[test]
    fn alternation() {
        let mut state = VolumeState::new(8, 8).unwrap();

        state.advance();
        assert!(!state.is_alternate());

        state.advance();
        assert!(state.is_alternate());

        state.advance();
        assert!(!state.is_alternate());
    }
}
