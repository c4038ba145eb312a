#![allow(dead_code, unreachable_pub)]

use embassy_time::{Duration, Instant};
use myrtio_lamp_core::color::Densities;
use myrtio_lamp_core::driver::{REG_DENSITY, REG_POWER};
use myrtio_lamp_core::{
    LampDriver, LampStore, Scheduler, SensorInputs, TelemetrySink, WallClock, WallTime,
};

pub const QUEUE_SIZE: usize = 8;

pub type TestScheduler<'a> = Scheduler<'a, RecordingDriver, LampStore, RecordingSink, QUEUE_SIZE>;

pub fn ms(millis: u64) -> Instant {
    Instant::from_millis(millis)
}

/// Tuesday, 12:00:00
pub fn noon() -> WallTime {
    WallTime::new(12, 0, 0, 3, 1_700_000_000)
}

/// Driver that remembers what the lamp was told last
#[derive(Debug, Default)]
pub struct RecordingDriver {
    /// Byte returned by the status register
    pub status: u8,
    pub fail: bool,
    pub power: Option<bool>,
    pub densities: Option<Densities>,
    pub channel_writes: Vec<(u8, u8)>,
    pub writes: usize,
}

impl RecordingDriver {
    pub fn lamp_on() -> Self {
        Self {
            status: 1,
            ..Self::default()
        }
    }

    pub fn lamp_off() -> Self {
        Self::default()
    }
}

impl LampDriver for RecordingDriver {
    type Error = ();

    fn write(&mut self, register: u8, data: &[u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.writes += 1;
        match (register, data) {
            (REG_POWER, [on]) => self.power = Some(*on != 0),
            (REG_DENSITY, [a, b, c, d]) => self.densities = Some([*a, *b, *c, *d]),
            (register, [value]) => self.channel_writes.push((register.wrapping_sub(REG_DENSITY), *value)),
            _ => {}
        }
        Ok(())
    }

    fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, ()> {
        if self.fail || register != REG_POWER || buffer.is_empty() {
            return Err(());
        }
        buffer[0] = self.status;
        Ok(1)
    }
}

/// Telemetry sink keeping every published message
#[derive(Debug)]
pub struct RecordingSink {
    pub connected: bool,
    pub published: Vec<(String, String)>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            connected: true,
            published: Vec::new(),
        }
    }
}

impl RecordingSink {
    pub fn has(&self, topic: &str, payload: &str) -> bool {
        self.published
            .iter()
            .any(|(t, p)| t == topic && p == payload)
    }

    pub fn payloads(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str) {
        self.published.push((topic.to_string(), payload.to_string()));
    }
}

/// Sensor readings set by the test
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptedSensors {
    pub motion: bool,
    pub ambient: u16,
}

impl SensorInputs for ScriptedSensors {
    fn presence(&mut self) -> bool {
        self.motion
    }

    fn ambient(&mut self) -> u16 {
        self.ambient
    }
}

#[derive(Debug, Default)]
pub struct FakeClock {
    pub time: WallTime,
    pub zone: Option<f32>,
}

impl WallClock for FakeClock {
    fn now(&mut self) -> WallTime {
        self.time
    }

    fn set_zone(&mut self, hours: f32) {
        self.zone = Some(hours);
    }
}

/// Tick the scheduler every `step` in `[from, to)`, returns `to`
pub fn run(
    scheduler: &mut TestScheduler<'_>,
    sensors: &mut ScriptedSensors,
    time: &WallTime,
    from: Instant,
    to: Instant,
    step: Duration,
) -> Instant {
    let mut now = from;
    while now < to {
        scheduler.tick(now, time, sensors);
        now += step;
    }
    to
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}
