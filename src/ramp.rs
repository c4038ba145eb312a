//! Linear ramp engine
//!
//! A ramp moves color temperature and brightness from the current lamp state to a
//! destination in equal increments, one increment per [`TICK_PERIOD`].

use embassy_time::{Duration, Instant};

use crate::bounds::{TICK_PERIOD, cct_in_range, level_in_range};
use crate::driver::LampDriver;
use crate::mode::OperatingMode;
use crate::output::{LampOutput, LampState};

/// Linear ramp register
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RampRegister {
    /// Color temperature increment per tick
    pub cct_step: f32,
    /// Brightness increment per tick
    pub level_step: f32,
    /// Increments applied so far
    pub tick_counter: u32,
    /// Increments in the whole ramp
    pub tick_target: u32,
    /// Mode to restore once the ramp finishes
    pub next_mode: OperatingMode,
    /// Destination of each axis, `None` if the axis does not move
    dest_cct: Option<f32>,
    dest_level: Option<f32>,
}

impl RampRegister {
    pub const fn is_finished(&self) -> bool {
        self.tick_counter >= self.tick_target
    }
}

#[derive(Debug, Clone, Default)]
pub struct RampEngine {
    register: RampRegister,
    /// Time of the last applied increment
    last_step: Option<Instant>,
}

impl RampEngine {
    pub const fn new() -> Self {
        Self {
            register: RampRegister {
                cct_step: 0.0,
                level_step: 0.0,
                tick_counter: 0,
                tick_target: 0,
                next_mode: OperatingMode::Default,
                dest_cct: None,
                dest_level: None,
            },
            last_step: None,
        }
    }

    pub const fn register(&self) -> &RampRegister {
        &self.register
    }

    pub const fn next_mode(&self) -> OperatingMode {
        self.register.next_mode
    }

    pub const fn is_finished(&self) -> bool {
        self.register.is_finished()
    }

    /// Prepare a ramp from `from` to the destination.
    ///
    /// A destination outside the legal range freezes that axis instead of failing.
    /// `next_mode` is recorded when given; programs pass `None` and keep their own mode.
    #[allow(clippy::cast_precision_loss)]
    pub fn setup(
        &mut self,
        from: LampState,
        dest_cct: f32,
        dest_level: f32,
        duration: Duration,
        next_mode: Option<OperatingMode>,
    ) {
        // Ramps shorter than a tick complete in a single increment
        let steps = (duration.as_millis() / TICK_PERIOD.as_millis()).max(1);
        let divisor = steps as f32;

        let dest_cct = cct_in_range(dest_cct).then_some(dest_cct);
        let dest_level = level_in_range(dest_level).then_some(dest_level);

        self.register.cct_step = dest_cct.map_or(0.0, |dest| (dest - from.cct()) / divisor);
        self.register.level_step = dest_level.map_or(0.0, |dest| (dest - from.level()) / divisor);
        self.register.dest_cct = dest_cct;
        self.register.dest_level = dest_level;
        self.register.tick_target = u32::try_from(steps).unwrap_or(u32::MAX);
        self.register.tick_counter = 0;
        if let Some(next_mode) = next_mode {
            self.register.next_mode = next_mode;
        }
        self.last_step = None;
    }

    /// Advance the ramp by at most one increment.
    ///
    /// Returns `false` once the ramp has finished, without touching the output.
    pub fn step<D: LampDriver>(&mut self, now: Instant, output: &mut LampOutput<D>) -> bool {
        if self.register.is_finished() {
            return false;
        }
        let throttled = self
            .last_step
            .is_some_and(|last| now.saturating_duration_since(last) < TICK_PERIOD);
        if throttled {
            return true;
        }

        let state = output.state();
        let register = &mut self.register;
        register.tick_counter += 1;
        let last = register.is_finished();

        // Land exactly on the destination instead of accumulating float error
        let cct = match register.dest_cct {
            Some(dest) if last => dest,
            _ => state.cct() + register.cct_step,
        };
        let level = match register.dest_level {
            Some(dest) if last => dest,
            _ => state.level() + register.level_step,
        };

        output.load(cct, level);
        self.last_step = Some(now);
        true
    }
}
