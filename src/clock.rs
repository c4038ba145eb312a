//! Wall clock service

use crate::table::TimeOfDay;

/// Calendar time as seen by the lamp, already shifted to the local zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 1 = Sunday .. 7 = Saturday
    pub weekday: u8,
    /// Seconds since the Unix epoch
    pub epoch: u32,
}

impl WallTime {
    pub const fn new(hour: u8, minute: u8, second: u8, weekday: u8, epoch: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            weekday,
            epoch,
        }
    }

    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::new(self.hour, self.minute, self.second)
    }
}

/// Wall clock provided by the host
pub trait WallClock {
    fn now(&mut self) -> WallTime;

    /// Offset from UTC in hours applied to every following reading
    fn set_zone(&mut self, hours: f32);
}
