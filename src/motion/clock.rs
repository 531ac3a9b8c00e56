use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::sim::physics;

/// Playback rate multiplier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedFactor {
    #[default]
    Normal,
    Slow,
}

/// Timing limits of the sub-step loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClockSettings {
    /// Fixed integration sub-step, seconds.
    pub substep_dt: f64,
    /// Longest frame time accepted per tick; longer frames are clamped.
    pub max_frame_dt: f64,
    pub max_substeps_per_tick: usize,
    /// Multiplier applied in [`SpeedFactor::Slow`].
    pub slow_speed_factor: f64,
    /// Simulated time of one requested single step.
    pub step_frame_dt: f64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            substep_dt: physics::DT,
            max_frame_dt: 0.1,
            max_substeps_per_tick: 500,
            slow_speed_factor: 0.25,
            step_frame_dt: 1.0 / 60.0,
        }
    }
}

/// Converts wall-clock frame time into a whole number of fixed sub-steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    settings: ClockSettings,
    playing: bool,
    step_requested: bool,
    speed: SpeedFactor,
    accumulator: f64,
}

impl SimulationClock {
    pub fn new(settings: ClockSettings) -> Self {
        Self {
            settings,
            playing: false,
            step_requested: false,
            speed: SpeedFactor::Normal,
            accumulator: 0.0,
        }
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn play(&mut self) {
        self.playing = true;
        self.step_requested = false;
    }

    /// Stops time; leftover accumulated time is dropped.
    pub fn pause(&mut self) {
        self.playing = false;
        self.accumulator = 0.0;
    }

    /// Advances one frame on the next tick while paused.
    pub fn request_step(&mut self) {
        if !self.playing {
            self.step_requested = true;
        }
    }

    pub fn set_speed(&mut self, speed: SpeedFactor) {
        self.speed = speed;
    }

    pub fn speed(&self) -> SpeedFactor {
        self.speed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_pending_step(&self) -> bool {
        self.step_requested
    }

    /// Unconsumed simulated time carried to the next tick.
    pub fn accumulated(&self) -> f64 {
        self.accumulator
    }

    pub fn speed_factor(&self) -> f64 {
        match self.speed {
            SpeedFactor::Normal => 1.0,
            SpeedFactor::Slow => self.settings.slow_speed_factor,
        }
    }

    /// Stops playback and clears all pending time.
    pub fn reset(&mut self) {
        *self = Self {
            speed: self.speed,
            ..Self::new(self.settings)
        };
    }

    /// Runs `substep` once per fixed sub-step owed for `external_dt` seconds
    /// of wall time and returns how many ran.
    ///
    /// Negative or non-finite frame times run nothing.
    pub fn tick<F: FnMut(f64)>(&mut self, external_dt: f64, mut substep: F) -> usize {
        if !(external_dt.is_finite() && external_dt >= 0.0) {
            return 0;
        }
        let dt = self.settings.substep_dt;
        let factor = self.speed_factor();

        if !self.playing {
            if !self.step_requested {
                return 0;
            }
            self.step_requested = false;
            let steps = ((self.settings.step_frame_dt * factor / dt + 1e-9).floor() as usize)
                .clamp(1, self.settings.max_substeps_per_tick.max(1));
            for _ in 0..steps {
                substep(dt);
            }
            trace!(steps, "single step");
            return steps;
        }

        self.accumulator += external_dt.min(self.settings.max_frame_dt) * factor;
        let owed = (self.accumulator / dt + 1e-9).floor() as usize;
        let steps = owed.min(self.settings.max_substeps_per_tick);
        for _ in 0..steps {
            substep(dt);
        }
        if steps < owed {
            trace!(owed, steps, "sub-step budget exceeded, dropping time");
            self.accumulator = 0.0;
        } else {
            self.accumulator = (self.accumulator - steps as f64 * dt).max(0.0);
        }
        trace!(steps, carry = self.accumulator, "tick");
        steps
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(ClockSettings::default())
    }
}
