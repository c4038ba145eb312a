//! Command intake
//!
//! Requests reach the scheduler as [`LampRequest`] values. Remote commands arrive as a
//! one byte code, configuration arrives as short comma separated strings with fixed
//! field offsets. Both are decoded here, before the request is queued.

use core::ops::{Range, RangeFrom};
use core::str::FromStr;

use crate::settings::{
    ADDR_AMBIENT_ENABLE, ADDR_AMBIENT_SENSITIVITY, ADDR_PRESENCE_BEGIN_HOUR,
    ADDR_PRESENCE_BEGIN_MINUTE, ADDR_PRESENCE_END_HOUR, ADDR_PRESENCE_END_MINUTE,
    ADDR_PRESENCE_HOLD, ADDR_PRESENCE_OFF, ADDR_PRESENCE_ON, ADDR_PRESENCE_SCHEDULE, AlarmKind,
    SettingsStore,
};

const CMD_TURN_OFF: u8 = 0xA0;
const CMD_TURN_ON: u8 = 0xA1;
const CMD_DEMO_ON: u8 = 0xA2;
const CMD_BRIGHTNESS_DOWN: u8 = 0x10;
const CMD_BRIGHTNESS_UP: u8 = 0x11;
const CMD_CCT_DOWN: u8 = 0x12;
const CMD_CCT_UP: u8 = 0x13;

const SENSITIVITY_MIN: u16 = 8;
const SENSITIVITY_MAX: u16 = 16;

/// Remote command codes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LampCommand {
    TurnOff = CMD_TURN_OFF,
    TurnOn = CMD_TURN_ON,
    /// Play the demo program, only while the lamp is on
    DemoOn = CMD_DEMO_ON,
    BrightnessDown = CMD_BRIGHTNESS_DOWN,
    BrightnessUp = CMD_BRIGHTNESS_UP,
    CctDown = CMD_CCT_DOWN,
    CctUp = CMD_CCT_UP,
}

impl LampCommand {
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            CMD_TURN_OFF => Self::TurnOff,
            CMD_TURN_ON => Self::TurnOn,
            CMD_DEMO_ON => Self::DemoOn,
            CMD_BRIGHTNESS_DOWN => Self::BrightnessDown,
            CMD_BRIGHTNESS_UP => Self::BrightnessUp,
            CMD_CCT_DOWN => Self::CctDown,
            CMD_CCT_UP => Self::CctUp,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Origin of a power change, reported along with it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    Button,
    App,
    Presence,
}

impl Interaction {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Button => "btn",
            Self::App => "web",
            Self::Presence => "pir",
        }
    }

    /// Interactions made by a person at the lamp or in the app
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Button | Self::App)
    }
}

/// Held physical button, sent on every poll while pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Up,
    Down,
}

/// What a held button changes while the lamp is on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ButtonTarget {
    /// Brightness, continuing into the warm range at the ends
    #[default]
    Brightness,
    /// Color temperature between `MIN_CCT` and the max CCT
    Cct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The string ends before a fixed field
    MissingField,
    /// A field is not a number, or does not fit its setting
    InvalidNumber,
}

fn field(input: &str, range: Range<usize>) -> Result<&str, ParseError> {
    input.get(range).ok_or(ParseError::MissingField)
}

fn tail(input: &str, range: RangeFrom<usize>) -> Result<&str, ParseError> {
    match input.get(range) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(ParseError::MissingField),
    }
}

fn number<T: FromStr>(text: &str) -> Result<T, ParseError> {
    text.trim().parse().map_err(|_| ParseError::InvalidNumber)
}

/// Time part of an alarm configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime {
    pub hour: u8,
    pub minute: u8,
    pub duration_minutes: u8,
}

/// Wake or bedtime alarm configuration for one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRequest {
    /// 1 = Sunday .. 7 = Saturday
    pub weekday: u8,
    pub enable: u8,
    /// `None` only toggles the alarm and keeps the stored time
    pub time: Option<AlarmTime>,
}

impl AlarmRequest {
    /// Parse `"<weekday>,<enable>,<HHMM>,<duration>"`, e.g. `"2,1,0700,30"`.
    ///
    /// The time and duration may be left out: `"2,0"`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let weekday = number(field(input, 0..1)?)?;
        let enable = number(field(input, 2..3)?)?;
        let time = if input.get(3..4) == Some(",") {
            Some(AlarmTime {
                hour: number(field(input, 4..6)?)?,
                minute: number(field(input, 6..8)?)?,
                duration_minutes: number(tail(input, 9..)?)?,
            })
        } else {
            None
        };

        Ok(Self {
            weekday,
            enable,
            time,
        })
    }

    pub fn write_to<S: SettingsStore + ?Sized>(&self, store: &mut S, kind: AlarmKind) {
        store.write(kind.enable_address(self.weekday), self.enable);
        if let Some(time) = self.time {
            store.write(kind.hour_address(self.weekday), time.hour);
            store.write(kind.minute_address(self.weekday), time.minute);
            store.write(kind.duration_address(self.weekday), time.duration_minutes);
        }
    }
}

/// Daily presence window, as entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTimes {
    pub begin_hour: u8,
    pub begin_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceRequest {
    pub turn_on: u8,
    pub turn_off: u8,
    pub hold_minutes: u8,
    pub schedule: u8,
    /// `None` keeps the stored window
    pub window: Option<WindowTimes>,
}

impl PresenceRequest {
    /// Parse `"<on>,<off>,<hold>,<schedule>[,<HHMM>,<HHMM>]"`, e.g. `"1,1,060,1,1950,2010"`
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let window = if input.len() > 9 {
            Some(WindowTimes {
                begin_hour: number(field(input, 10..12)?)?,
                begin_minute: number(field(input, 12..14)?)?,
                end_hour: number(field(input, 15..17)?)?,
                end_minute: number(field(input, 17..19)?)?,
            })
        } else {
            None
        };

        Ok(Self {
            turn_on: number(field(input, 0..1)?)?,
            turn_off: number(field(input, 2..3)?)?,
            hold_minutes: number(field(input, 4..7)?)?,
            schedule: number(field(input, 8..9)?)?,
            window,
        })
    }

    pub fn write_to<S: SettingsStore + ?Sized>(&self, store: &mut S) {
        store.write(ADDR_PRESENCE_ON, self.turn_on);
        store.write(ADDR_PRESENCE_OFF, self.turn_off);
        store.write(ADDR_PRESENCE_HOLD, self.hold_minutes);
        store.write(ADDR_PRESENCE_SCHEDULE, self.schedule);
        if let Some(window) = self.window {
            store.write(ADDR_PRESENCE_BEGIN_HOUR, window.begin_hour);
            store.write(ADDR_PRESENCE_BEGIN_MINUTE, window.begin_minute);
            store.write(ADDR_PRESENCE_END_HOUR, window.end_hour);
            store.write(ADDR_PRESENCE_END_MINUTE, window.end_minute);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientRequest {
    pub enable: u8,
    /// Sensitivity divisor, limited to `8..=16`
    pub sensitivity: u8,
}

impl AmbientRequest {
    /// Parse `"<enable>,<sensitivity>"`, e.g. `"1,12"`
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let enable = number(field(input, 0..1)?)?;
        let sensitivity: u16 = number(tail(input, 2..)?)?;
        let sensitivity = sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);

        Ok(Self {
            enable,
            sensitivity: u8::try_from(sensitivity).map_err(|_| ParseError::InvalidNumber)?,
        })
    }

    pub const fn enabled(&self) -> bool {
        self.enable == 1
    }

    pub fn write_to<S: SettingsStore + ?Sized>(&self, store: &mut S) {
        store.write(ADDR_AMBIENT_ENABLE, self.enable);
        store.write(ADDR_AMBIENT_SENSITIVITY, self.sensitivity);
    }
}

/// Everything the scheduler can be asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampRequest {
    /// Remote command from the app
    Command(LampCommand),
    /// Remote command code that matched no command
    UnknownCommand(u8),
    Button(ButtonAction),
    /// Switch what the buttons adjust
    ButtonTarget(ButtonTarget),
    SetBrightness(u16),
    SetCct(u16),
    WakeAlarm(AlarmRequest),
    BedtimeAlarm(AlarmRequest),
    Presence(PresenceRequest),
    Ambient(AmbientRequest),
    MaxCct(u16),
    /// 1 and 2 select a custom schedule, anything else the factory one
    SelectSchedule(u8),
    /// Adjust mode hold in minutes
    AdjustHold(u8),
    TelemetryDebug(bool),
    /// Send the active schedule tables as debug telemetry
    PublishSchedule,
    /// Write one channel density directly
    Diagnostic { channel: u8, value: u8 },
}

impl LampRequest {
    pub const fn from_code(code: u8) -> Self {
        match LampCommand::from_code(code) {
            Some(command) => Self::Command(command),
            None => Self::UnknownCommand(code),
        }
    }
}

impl From<LampCommand> for LampRequest {
    fn from(command: LampCommand) -> Self {
        Self::Command(command)
    }
}

impl From<ButtonAction> for LampRequest {
    fn from(action: ButtonAction) -> Self {
        Self::Button(action)
    }
}
