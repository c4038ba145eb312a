//! Operating modes of the lamp.
//!
//! Exactly one mode is active at a time. Raw ids match the values the lamp
//! reports in its ambient telemetry.

const MODE_NAME_DEFAULT: &str = "default";
const MODE_NAME_DEMO: &str = "demo";
const MODE_NAME_ADJUST: &str = "adjust";
const MODE_NAME_DAWN_SIM: &str = "dawn_sim";
const MODE_NAME_BEDTIME: &str = "bedtime";
const MODE_NAME_RAMP: &str = "ramp";

const MODE_ID_DEFAULT: u8 = 0;
const MODE_ID_DEMO: u8 = 1;
const MODE_ID_ADJUST: u8 = 2;
const MODE_ID_DAWN_SIM: u8 = 3;
const MODE_ID_BEDTIME: u8 = 4;
const MODE_ID_RAMP: u8 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatingMode {
    /// Follows the time-of-day schedule (and ambient adjustment)
    #[default]
    Default = MODE_ID_DEFAULT,
    /// Demonstration sweep
    Demo = MODE_ID_DEMO,
    /// User adjusted brightness or color, held until timeout
    Adjust = MODE_ID_ADJUST,
    /// Wake-up sunrise simulation
    DawnSim = MODE_ID_DAWN_SIM,
    /// Bedtime wind-down
    Bedtime = MODE_ID_BEDTIME,
    /// Linear ramp, returns to the recorded follow-up mode
    Ramp = MODE_ID_RAMP,
}

impl OperatingMode {
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            MODE_ID_DEFAULT => Self::Default,
            MODE_ID_DEMO => Self::Demo,
            MODE_ID_ADJUST => Self::Adjust,
            MODE_ID_DAWN_SIM => Self::DawnSim,
            MODE_ID_BEDTIME => Self::Bedtime,
            MODE_ID_RAMP => Self::Ramp,
            _ => return None,
        })
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => MODE_NAME_DEFAULT,
            Self::Demo => MODE_NAME_DEMO,
            Self::Adjust => MODE_NAME_ADJUST,
            Self::DawnSim => MODE_NAME_DAWN_SIM,
            Self::Bedtime => MODE_NAME_BEDTIME,
            Self::Ramp => MODE_NAME_RAMP,
        }
    }
}
