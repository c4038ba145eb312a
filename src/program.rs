//! Timed lighting programs
//!
//! A program is a fixed table of steps. Each step waits for its condition, then runs its
//! action, usually handing a new ramp to the [`RampEngine`]. All programs share the
//! same driver, [`Program::step`], which advances at most one step per tick.

use embassy_time::{Duration, Instant};

use crate::bounds::{CCT_1800, CCT_6500, MAX_BRIGHTNESS, MIN_BRIGHTNESS, MIN_CCT};
use crate::driver::LampDriver;
use crate::mode::OperatingMode;
use crate::output::LampOutput;
use crate::ramp::RampEngine;

const HALF_HOUR: Duration = Duration::from_secs(30 * 60);

/// Color temperature a step ramps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CctTarget {
    Kelvin(f32),
    /// The configured max CCT
    MaxCct,
    /// One kelvin below the configured max CCT
    BelowMaxCct,
}

/// Length of a step's ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepDuration {
    Fixed(Duration),
    /// Fraction of the program length
    Share(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPlan {
    pub cct: CctTarget,
    pub level: f32,
    pub duration: StepDuration,
}

/// Condition a step waits for before running its action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepWait {
    Immediately,
    /// The previous ramp reports finished
    RampFinished,
    /// Wall clock reached the hold deadline armed earlier
    HoldDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction {
    Ramp(RampPlan),
    /// Arm the hold deadline at `now + program length`
    ArmHold,
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramStep {
    pub wait: StepWait,
    pub action: StepAction,
}

const fn fixed(millis: u64) -> StepDuration {
    StepDuration::Fixed(Duration::from_millis(millis))
}

const fn kelvin(cct: f32) -> CctTarget {
    CctTarget::Kelvin(cct)
}

const fn ramp(wait: StepWait, cct: CctTarget, level: f32, duration: StepDuration) -> ProgramStep {
    ProgramStep {
        wait,
        action: StepAction::Ramp(RampPlan {
            cct,
            level,
            duration,
        }),
    }
}

const fn first(cct: CctTarget, level: f32, duration: StepDuration) -> ProgramStep {
    ramp(StepWait::Immediately, cct, level, duration)
}

const fn then(cct: CctTarget, level: f32, duration: StepDuration) -> ProgramStep {
    ramp(StepWait::RampFinished, cct, level, duration)
}

const FINISH: ProgramStep = ProgramStep {
    wait: StepWait::RampFinished,
    action: StepAction::Nothing,
};

const BREATH_HIGH: f32 = 127.0;
const BREATH_LOW: f32 = 5.0;

/// Full range sweep, ends dark
pub const DEMO_STEPS: [ProgramStep; 9] = [
    first(kelvin(MIN_CCT + 1.0), MIN_BRIGHTNESS, fixed(500)),
    then(kelvin(MIN_CCT), 100.0, fixed(1500)),
    then(kelvin(CCT_1800), 100.0, fixed(2000)),
    // the demo always shows the full range, regardless of max CCT
    then(kelvin(CCT_6500), MAX_BRIGHTNESS, fixed(7000)),
    then(kelvin(CCT_1800), MAX_BRIGHTNESS, fixed(9000)),
    then(kelvin(MIN_CCT), MAX_BRIGHTNESS, fixed(4000)),
    then(kelvin(MIN_CCT), MIN_BRIGHTNESS, fixed(4000)),
    then(kelvin(MIN_CCT + 1.0), MIN_BRIGHTNESS, fixed(2000)),
    FINISH,
];

/// Sunrise over the alarm duration, then half an hour at full cold light
pub const DAWN_SIM_STEPS: [ProgramStep; 5] = [
    // 0K is out of range: only the brightness moves during the first phase
    first(kelvin(0.0), MAX_BRIGHTNESS * 0.375, StepDuration::Share(0.375)),
    then(kelvin(CCT_1800), MAX_BRIGHTNESS * 0.5, StepDuration::Share(0.125)),
    then(CctTarget::BelowMaxCct, MAX_BRIGHTNESS, StepDuration::Share(0.5)),
    then(CctTarget::MaxCct, MAX_BRIGHTNESS, StepDuration::Fixed(HALF_HOUR)),
    FINISH,
];

/// Breathing reminder, a dim hold for the configured duration, then fade out
pub const BEDTIME_STEPS: [ProgramStep; 11] = [
    first(kelvin(MIN_CCT), BREATH_HIGH, fixed(2000)),
    then(kelvin(MIN_CCT), BREATH_LOW, fixed(1000)),
    then(kelvin(MIN_CCT), BREATH_HIGH, fixed(1000)),
    then(kelvin(MIN_CCT), BREATH_LOW, fixed(1000)),
    then(kelvin(MIN_CCT), BREATH_HIGH, fixed(1000)),
    then(kelvin(MIN_CCT), BREATH_LOW, fixed(1000)),
    then(kelvin(MIN_CCT), BREATH_HIGH, fixed(1000)),
    then(kelvin(MIN_CCT), 25.0, fixed(2000)),
    ProgramStep {
        wait: StepWait::RampFinished,
        action: StepAction::ArmHold,
    },
    ramp(StepWait::HoldDeadline, kelvin(MIN_CCT), MIN_BRIGHTNESS, fixed(2000)),
    FINISH,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    Demo,
    DawnSim,
    Bedtime,
}

impl ProgramKind {
    pub const fn steps(self) -> &'static [ProgramStep] {
        match self {
            Self::Demo => &DEMO_STEPS,
            Self::DawnSim => &DAWN_SIM_STEPS,
            Self::Bedtime => &BEDTIME_STEPS,
        }
    }

    /// Operating mode the scheduler is in while the program plays
    pub const fn mode(self) -> OperatingMode {
        match self {
            Self::Demo => OperatingMode::Demo,
            Self::DawnSim => OperatingMode::DawnSim,
            Self::Bedtime => OperatingMode::Bedtime,
        }
    }

    /// Output loaded when the program starts, if any
    pub const fn initial_state(self) -> Option<(f32, f32)> {
        match self {
            Self::Demo => Some((MIN_CCT, MIN_BRIGHTNESS)),
            Self::DawnSim => Some((MIN_CCT, 1.0)),
            Self::Bedtime => None,
        }
    }
}

/// A playing program and its counter
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    kind: ProgramKind,
    counter: usize,
    /// Dawn: total sunrise duration. Bedtime: length of the dim hold.
    length: Duration,
    /// Wall clock second at which the hold ends
    hold_until: Option<u32>,
}

impl Program {
    pub const fn new(kind: ProgramKind, length: Duration) -> Self {
        Self {
            kind,
            counter: 0,
            length,
            hold_until: None,
        }
    }

    /// Create the program and load its initial output
    pub fn start<D: LampDriver>(kind: ProgramKind, length: Duration, output: &mut LampOutput<D>) -> Self {
        if let Some((cct, level)) = kind.initial_state() {
            output.load(cct, level);
        }
        Self::new(kind, length)
    }

    pub const fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub const fn counter(&self) -> usize {
        self.counter
    }

    pub const fn hold_until(&self) -> Option<u32> {
        self.hold_until
    }

    /// Advance the program by one tick.
    ///
    /// Returns `false` once the last step completed; the counter is then back at zero.
    pub fn step<D: LampDriver>(
        &mut self,
        ramp: &mut RampEngine,
        output: &mut LampOutput<D>,
        now: Instant,
        epoch: u32,
        max_cct: f32,
    ) -> bool {
        let steps = self.kind.steps();
        let Some(step) = steps.get(self.counter) else {
            self.counter = 0;
            return false;
        };

        let ready = match step.wait {
            StepWait::Immediately => true,
            StepWait::RampFinished => !ramp.step(now, output),
            StepWait::HoldDeadline => self.hold_until.is_some_and(|deadline| epoch >= deadline),
        };
        if ready {
            match step.action {
                StepAction::Ramp(plan) => {
                    let cct = Self::resolve_cct(plan.cct, max_cct);
                    let duration = self.resolve_duration(plan.duration);
                    ramp.setup(output.state(), cct, plan.level, duration, None);
                }
                StepAction::ArmHold => {
                    let hold = u32::try_from(self.length.as_secs()).unwrap_or(u32::MAX);
                    self.hold_until = Some(epoch.saturating_add(hold));
                }
                StepAction::Nothing => {}
            }
            self.counter += 1;
        }

        if self.counter >= steps.len() {
            self.counter = 0;
            return false;
        }
        true
    }

    fn resolve_cct(target: CctTarget, max_cct: f32) -> f32 {
        match target {
            CctTarget::Kelvin(cct) => cct,
            CctTarget::MaxCct => max_cct,
            CctTarget::BelowMaxCct => max_cct - 1.0,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn resolve_duration(&self, duration: StepDuration) -> Duration {
        match duration {
            StepDuration::Fixed(duration) => duration,
            StepDuration::Share(share) => {
                Duration::from_millis((self.length.as_millis() as f32 * share) as u64)
            }
        }
    }
}
