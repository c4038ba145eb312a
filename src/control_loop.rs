//! Control loop timing.
//!
//! Runs the scheduler at a fixed period without async/await or platform timers.
//! The caller is responsible for sleeping between ticks.

use embassy_time::{Duration, Instant};

use crate::bounds::TICK_PERIOD;
use crate::clock::WallClock;
use crate::driver::LampDriver;
use crate::scheduler::Scheduler;
use crate::sensor::SensorInputs;
use crate::settings::SettingsStore;
use crate::telemetry::TelemetrySink;

/// Result of a control tick.
#[derive(Debug, Clone, Copy)]
pub struct TickResult {
    /// The deadline for the next tick.
    pub next_deadline: Instant,
    /// How long to wait until the next tick (zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Feeds the scheduler with wall clock time and sensor reads.
///
/// # Usage
///
/// ```ignore
/// let mut control = ControlLoop::new(clock, sensors);
/// control.start(&mut scheduler);
///
/// loop {
///     let result = control.tick(&mut scheduler, Instant::now());
///     sleep_ms(result.sleep_duration.as_millis());
/// }
/// ```
pub struct ControlLoop<C: WallClock, I: SensorInputs> {
    clock: C,
    sensors: I,
    next_tick: Instant,
    period: Duration,
}

impl<C: WallClock, I: SensorInputs> ControlLoop<C, I> {
    /// Create a control loop ticking every [`TICK_PERIOD`].
    pub fn new(clock: C, sensors: I) -> Self {
        Self::with_period(clock, sensors, TICK_PERIOD)
    }

    pub fn with_period(clock: C, sensors: I, period: Duration) -> Self {
        Self {
            clock,
            sensors,
            next_tick: Instant::from_millis(0),
            period,
        }
    }

    /// Apply the stored time zone and initialize the scheduler.
    pub fn start<D, S, T, const QUEUE_SIZE: usize>(
        &mut self,
        scheduler: &mut Scheduler<'_, D, S, T, QUEUE_SIZE>,
    ) where
        D: LampDriver,
        S: SettingsStore,
        T: TelemetrySink,
    {
        self.clock.set_zone(scheduler.settings().time_zone.hours());
        let time = self.clock.now();
        scheduler.init(&time);
    }

    /// Run one scheduler tick and return timing information.
    ///
    /// If the loop fell more than two periods behind, the schedule restarts from `now`
    /// instead of catching up with a burst of ticks.
    pub fn tick<D, S, T, const QUEUE_SIZE: usize>(
        &mut self,
        scheduler: &mut Scheduler<'_, D, S, T, QUEUE_SIZE>,
        now: Instant,
    ) -> TickResult
    where
        D: LampDriver,
        S: SettingsStore,
        T: TelemetrySink,
    {
        let max_drift = self.period * 2;
        if now > self.next_tick + max_drift {
            self.next_tick = now;
        }

        let time = self.clock.now();
        scheduler.tick(now, &time, &mut self.sensors);

        self.next_tick += self.period;

        TickResult {
            next_deadline: self.next_tick,
            sleep_duration: self.next_tick.saturating_duration_since(now),
        }
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub const fn sensors_mut(&mut self) -> &mut I {
        &mut self.sensors
    }
}
