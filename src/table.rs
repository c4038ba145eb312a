//! Time-of-day lookup tables
//!
//! A day is described by 24 hourly values for color temperature and brightness.
//! Values between two hours are linearly interpolated.

use crate::bounds::MIN_BRIGHTNESS;

pub const HOURS: usize = 24;

/// One value per hour of the day
pub type HourTable = [u16; HOURS];

/// Factory color temperature schedule
pub const FACTORY_CCT: HourTable = [
    300, 300, 300, 300, 300, 1800, // 00 - 05
    3000, 5000, 6500, 6500, 6500, 6500, // 06 - 11
    6500, 6500, 6500, 6500, 5000, 4000, // 12 - 17
    3000, 2500, 1800, 1500, 300, 300, // 18 - 23
];

/// Factory brightness schedule
pub const FACTORY_LEVEL: HourTable = [
    10, 10, 10, 10, 10, 40, // 00 - 05
    60, 150, 200, 255, 255, 255, // 06 - 11
    255, 255, 255, 255, 200, 170, // 12 - 17
    130, 80, 80, 60, 30, 10, // 18 - 23
];

/// Position within the day: hour and the elapsed fraction of that hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub fraction: f32,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        let seconds = u16::from(minute) * 60 + u16::from(second);
        Self {
            hour,
            fraction: f32::from(seconds) / 3600.0,
        }
    }
}

/// Interpolate the table at the given time of day.
///
/// The result is clamped to `[MIN_BRIGHTNESS, max_cct]` for both kinds of tables.
/// Brightness tables never reach the lower max CCT limit, so the shared bound is harmless.
pub fn value_at(table: &HourTable, at: TimeOfDay, max_cct: f32) -> f32 {
    let hour = usize::from(at.hour) % HOURS;
    let next = (hour + 1) % HOURS;
    let from = f32::from(table[hour]);
    let to = f32::from(table[next]);

    (from + at.fraction * (to - from)).clamp(MIN_BRIGHTNESS, max_cct)
}

/// Pair of hourly tables the default mode follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub cct: HourTable,
    pub level: HourTable,
}

impl DaySchedule {
    pub const fn factory() -> Self {
        Self {
            cct: FACTORY_CCT,
            level: FACTORY_LEVEL,
        }
    }

    pub fn cct_at(&self, at: TimeOfDay, max_cct: f32) -> f32 {
        value_at(&self.cct, at, max_cct)
    }

    pub fn level_at(&self, at: TimeOfDay, max_cct: f32) -> f32 {
        value_at(&self.level, at, max_cct)
    }
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self::factory()
    }
}
