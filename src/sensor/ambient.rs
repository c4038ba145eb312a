//! Ambient light estimation
//!
//! Once per [`MEASURE_PERIOD`] the estimator averages [`SAMPLES`] readings taken
//! [`SAMPLE_INTERVAL`] apart. The lamp's own contribution is subtracted from the average.
//! The remaining background light lowers the scheduled brightness, scaled by the
//! configured sensitivity.

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::output::LampState;
use crate::timer::Marker;

pub const SAMPLES: u16 = 100;
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);
pub const MEASURE_PERIOD: Duration = Duration::from_secs(60);
pub const REPORT_PERIOD: Duration = Duration::from_secs(30 * 60);

/// Bounds of the adjusted brightness
pub const MIN_ADJUSTED_LEVEL: f32 = 10.0;
pub const MAX_ADJUSTED_LEVEL: f32 = 255.0;

const SENSITIVITY_HIGH: u8 = 16;
const SENSITIVITY_MEDIUM: u8 = 12;
const SENSITIVITY_LOW: u8 = 8;

/// How strongly background light lowers the brightness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Sensitivity {
    #[default]
    High = SENSITIVITY_HIGH,
    Medium = SENSITIVITY_MEDIUM,
    Low = SENSITIVITY_LOW,
}

impl Sensitivity {
    /// Decode the stored divisor, unknown values fall back to the default
    pub fn from_raw(value: u8) -> Self {
        match value {
            SENSITIVITY_MEDIUM => Self::Medium,
            SENSITIVITY_LOW => Self::Low,
            _ => Self::High,
        }
    }

    pub const fn divisor(self) -> f32 {
        match self {
            Self::High => 16.0,
            Self::Medium => 12.0,
            Self::Low => 8.0,
        }
    }

    /// Background level cap applied before dividing
    pub const fn cap(self) -> Option<f32> {
        match self {
            Self::High => None,
            Self::Medium => Some(3060.0),
            Self::Low => Some(2040.0),
        }
    }

    /// Scale a background level into brightness counts
    pub fn scale(self, background: f32) -> f32 {
        let capped = match self.cap() {
            Some(cap) => background.min(cap),
            None => background,
        };
        capped / self.divisor()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmbientConfig {
    pub enabled: bool,
    pub sensitivity: Sensitivity,
}

/// Light the lamp itself adds to the sensor reading at `level`
pub fn self_interference(level: f32) -> f32 {
    6.95 + 0.38 * level - 0.000_65 * level * level
}

/// Latest estimate, every field unset until the first window completes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientEstimate {
    /// Average raw reading, including the lamp's own light
    pub measured: Option<f32>,
    /// Ambient light with the lamp's contribution removed
    pub background: Option<f32>,
    /// Brightness the lamp should run at
    pub adjusted: Option<f32>,
}

impl AmbientEstimate {
    /// Derive the estimate from an averaged reading
    pub fn evaluate(measured: f32, lamp: &LampState, reference: f32, sensitivity: Sensitivity) -> Self {
        let background = if lamp.is_on() {
            measured - self_interference(lamp.level())
        } else {
            measured
        };
        let adjusted = (reference - sensitivity.scale(background))
            .clamp(MIN_ADJUSTED_LEVEL, MAX_ADJUSTED_LEVEL);

        Self {
            measured: Some(measured),
            background: Some(background),
            adjusted: Some(adjusted),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sampling {
        count: u16,
        sum: u32,
        last_sample: Option<Instant>,
    },
    Idle,
}

impl Phase {
    const fn sampling() -> Self {
        Self::Sampling {
            count: 0,
            sum: 0,
            last_sample: None,
        }
    }
}

pub struct AmbientEstimator {
    phase: Phase,
    /// Start of the current measurement window
    window: Marker,
    report: Marker,
    estimate: AmbientEstimate,
}

impl AmbientEstimator {
    /// Create the estimator, sampling starts right away
    pub const fn new(now: Instant) -> Self {
        Self {
            phase: Phase::sampling(),
            window: Marker::new(now),
            report: Marker::new(now),
            estimate: AmbientEstimate {
                measured: None,
                background: None,
                adjusted: None,
            },
        }
    }

    pub const fn estimate(&self) -> AmbientEstimate {
        self.estimate
    }

    pub const fn adjusted(&self) -> Option<f32> {
        self.estimate.adjusted
    }

    pub const fn is_sampling(&self) -> bool {
        matches!(self.phase, Phase::Sampling { .. })
    }

    /// Advance the sampling state machine.
    ///
    /// `read` is only called when a sample is due. `reference` is the brightness the
    /// schedule asks for right now. Returns the new adjusted level when a window completes.
    #[allow(clippy::cast_precision_loss)]
    pub fn poll(
        &mut self,
        now: Instant,
        lamp: &LampState,
        reference: f32,
        sensitivity: Sensitivity,
        read: impl FnOnce() -> u16,
    ) -> Option<f32> {
        if self.phase == Phase::Idle && self.window.has_exceeded(now, MEASURE_PERIOD) {
            self.window.reset(now);
            self.phase = Phase::sampling();
        }

        let Phase::Sampling {
            count,
            sum,
            last_sample,
        } = &mut self.phase
        else {
            return None;
        };

        let due = last_sample.is_none_or(|last| now.saturating_duration_since(last) >= SAMPLE_INTERVAL);
        if *count < SAMPLES && due {
            *sum += u32::from(read());
            *count += 1;
            *last_sample = Some(now);
        }
        if *count < SAMPLES {
            return None;
        }

        let measured = *sum as f32 / f32::from(SAMPLES);
        self.estimate = AmbientEstimate::evaluate(measured, lamp, reference, sensitivity);
        self.phase = Phase::Idle;

        #[cfg(feature = "esp32-log")]
        println!("[AmbientEstimator.poll] estimate {:?}", self.estimate);

        self.estimate.adjusted
    }

    /// Returns true when the periodic ambient report is due, and restarts its timer
    pub fn report_due(&mut self, now: Instant) -> bool {
        if self.estimate.background.is_none() || !self.report.has_exceeded(now, REPORT_PERIOD) {
            return false;
        }
        self.report.reset(now);
        true
    }
}
