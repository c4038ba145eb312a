//! Presence (motion) estimation
//!
//! The motion detector output is debounced before it counts as presence. It has to stay
//! active for [`CONFIRM_TIME`] before a [`PresenceEvent::Confirmed`] is raised. While
//! motion continues, or comes back within [`RELEASE_TIMEOUT`], the session is only
//! extended. A new confirmation needs a quiet period longer than the release timeout.

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::mode::OperatingMode;
use crate::timer::Marker;

pub const CONFIRM_TIME: Duration = Duration::from_millis(1600);
pub const RELEASE_TIMEOUT: Duration = Duration::from_millis(3000);
/// Delay after a manual turn-off before presence may turn the lamp back on
pub const OFF_COOLDOWN: Duration = Duration::from_secs(60);
pub const REPORT_PERIOD: Duration = Duration::from_secs(10 * 60);

/// Minutes the lamp stays on without motion when the store has no value
pub const DEFAULT_HOLD_MINUTES: u8 = 15;

/// Daily time window in which presence may switch the lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceWindow {
    /// Minute of day the window opens
    pub start: u16,
    /// Minute of day the window closes, at or before `start` spans midnight
    pub end: u16,
}

impl PresenceWindow {
    pub fn contains(self, minute_of_day: u16) -> bool {
        if self.end > self.start {
            minute_of_day >= self.start && minute_of_day < self.end
        } else {
            minute_of_day >= self.start || minute_of_day < self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    pub turn_on: bool,
    pub turn_off: bool,
    /// Minutes without motion before presence turns the lamp off
    pub hold_minutes: u8,
    /// Restrict presence control to a daily window
    pub window: Option<PresenceWindow>,
}

impl PresenceConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_secs(u64::from(self.hold_minutes) * 60)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            turn_on: false,
            turn_off: false,
            hold_minutes: DEFAULT_HOLD_MINUTES,
            window: None,
        }
    }
}

/// Whether presence may switch the lamp right now
pub fn presence_allowed(mode: OperatingMode, config: &PresenceConfig, minute_of_day: u16) -> bool {
    if !matches!(mode, OperatingMode::Default | OperatingMode::Adjust) {
        return false;
    }
    if !config.turn_on && !config.turn_off {
        return false;
    }
    config.window.is_none_or(|window| window.contains(minute_of_day))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Motion accepted after debouncing
    Confirmed,
    /// Motion continues in an already confirmed session
    Sustained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Debounce {
    Idle,
    Pending { since: Instant, last_high: Instant },
    Active { last_high: Instant },
}

pub struct PresenceEstimator {
    debounce: Debounce,
    /// Last sign of someone using the lamp; delays the presence turn-off
    hold: Marker,
    /// Last manual turn-off
    cooldown: Marker,
    last_report: Option<Instant>,
}

impl PresenceEstimator {
    pub const fn new(now: Instant) -> Self {
        Self {
            debounce: Debounce::Idle,
            hold: Marker::new(now),
            cooldown: Marker::new(now),
            last_report: None,
        }
    }

    /// Feed one reading of the motion detector
    pub fn poll(&mut self, now: Instant, motion: bool) -> Option<PresenceEvent> {
        if let Debounce::Pending { last_high, .. } | Debounce::Active { last_high } = self.debounce {
            if now.saturating_duration_since(last_high) > RELEASE_TIMEOUT {
                self.debounce = Debounce::Idle;
            }
        }
        if !motion {
            return None;
        }

        match self.debounce {
            Debounce::Idle => {
                self.debounce = Debounce::Pending {
                    since: now,
                    last_high: now,
                };
                None
            }
            Debounce::Pending { since, .. } => {
                if now.saturating_duration_since(since) > CONFIRM_TIME {
                    self.debounce = Debounce::Active { last_high: now };
                    self.hold.reset(now);
                    #[cfg(feature = "esp32-log")]
                    println!("[PresenceEstimator.poll] presence confirmed");
                    Some(PresenceEvent::Confirmed)
                } else {
                    self.debounce = Debounce::Pending {
                        since,
                        last_high: now,
                    };
                    None
                }
            }
            Debounce::Active { .. } => {
                self.debounce = Debounce::Active { last_high: now };
                self.hold.reset(now);
                Some(PresenceEvent::Sustained)
            }
        }
    }

    /// Drop any debounce or session in progress
    pub fn clear(&mut self) {
        self.debounce = Debounce::Idle;
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.debounce, Debounce::Active { .. })
    }

    /// Postpone the presence turn-off
    pub fn refresh_hold(&mut self, now: Instant) {
        self.hold.reset(now);
    }

    /// No refreshing activity for longer than `hold`
    pub fn hold_expired(&self, now: Instant, hold: Duration) -> bool {
        self.hold.has_exceeded(now, hold)
    }

    /// Start the post manual turn-off cool-down
    pub fn start_cooldown(&mut self, now: Instant) {
        self.cooldown.reset(now);
    }

    pub fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.cooldown.has_exceeded(now, OFF_COOLDOWN)
    }

    /// Rate limit for presence reports; marks a report as sent when due
    pub fn report_due(&mut self, now: Instant) -> bool {
        let due = self
            .last_report
            .is_none_or(|last| now.saturating_duration_since(last) > REPORT_PERIOD);
        if due {
            self.last_report = Some(now);
        }
        due
    }
}
