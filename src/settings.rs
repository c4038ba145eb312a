//! Persistent lamp settings
//!
//! Settings live in a byte addressed store (EEPROM on the lamp). Every address reads
//! `0xFF` until written, which selects the factory default of that setting.

use embassy_time::Duration;

use crate::bounds::clamp_max_cct;
use crate::sensor::{AmbientConfig, PresenceConfig, PresenceWindow, Sensitivity};
use crate::sensor::presence::DEFAULT_HOLD_MINUTES;
use crate::table::{DaySchedule, HOURS, HourTable};

/// Value of a never written byte
pub const UNSET: u8 = 0xFF;

/// Size of the settings area
pub const STORE_SIZE: usize = 0x300;

pub const ADDR_TIME_ZONE: u16 = 0x003;
pub const ADDR_ADJUST_HOLD: u16 = 0x004;
/// Little-endian word
pub const ADDR_MAX_CCT: u16 = 0x005;
pub const ADDR_SCHEDULE_SELECT: u16 = 0x007;
pub const ADDR_TELEMETRY_DEBUG: u16 = 0x009;
pub const ADDR_DST: u16 = 0x00A;

pub const ADDR_PRESENCE_ON: u16 = 0x090;
pub const ADDR_PRESENCE_OFF: u16 = 0x091;
pub const ADDR_PRESENCE_HOLD: u16 = 0x092;
pub const ADDR_PRESENCE_SCHEDULE: u16 = 0x094;
pub const ADDR_PRESENCE_BEGIN_HOUR: u16 = 0x095;
pub const ADDR_PRESENCE_BEGIN_MINUTE: u16 = 0x097;
pub const ADDR_PRESENCE_END_HOUR: u16 = 0x099;
pub const ADDR_PRESENCE_END_MINUTE: u16 = 0x09A;

pub const ADDR_AMBIENT_ENABLE: u16 = 0x0A0;
pub const ADDR_AMBIENT_SENSITIVITY: u16 = 0x0A1;

/// Hourly CCT words of the custom schedules
pub const ADDR_SCHEDULE_1_CCT: u16 = 0x100;
pub const ADDR_SCHEDULE_2_CCT: u16 = 0x180;
/// Hourly brightness bytes of the custom schedules
pub const ADDR_SCHEDULE_1_LEVEL: u16 = 0x200;
pub const ADDR_SCHEDULE_2_LEVEL: u16 = 0x280;

/// Adjust mode hold when the store has no value
pub const FACTORY_ADJUST_HOLD_MINUTES: u8 = 60;

const TRUE: u8 = 1;

/// Byte addressed settings storage
pub trait SettingsStore {
    fn read(&self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);

    fn read_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    fn write_word(&mut self, address: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write(address, low);
        self.write(address.wrapping_add(1), high);
    }

    fn read_flag(&self, address: u16) -> bool {
        self.read(address) == TRUE
    }
}

/// In-memory store, every byte starts unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore<const N: usize> {
    bytes: [u8; N],
}

/// Memory store covering the whole settings area
pub type LampStore = MemoryStore<STORE_SIZE>;

impl<const N: usize> MemoryStore<N> {
    pub const fn new() -> Self {
        Self { bytes: [UNSET; N] }
    }

    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SettingsStore for MemoryStore<N> {
    fn read(&self, address: u16) -> u8 {
        self.bytes.get(usize::from(address)).copied().unwrap_or(UNSET)
    }

    fn write(&mut self, address: u16, value: u8) {
        if let Some(byte) = self.bytes.get_mut(usize::from(address)) {
            *byte = value;
        }
    }
}

/// Which alarm a per-weekday block belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlarmKind {
    Wake,
    Bedtime,
}

impl AlarmKind {
    /// Base addresses of the enable, hour, minute and duration blocks
    const fn blocks(self) -> [u16; 4] {
        match self {
            Self::Wake => [0x010, 0x020, 0x030, 0x040],
            Self::Bedtime => [0x050, 0x060, 0x070, 0x080],
        }
    }

    pub fn enable_address(self, weekday: u8) -> u16 {
        Self::offset(self.blocks()[0], weekday)
    }

    pub fn hour_address(self, weekday: u8) -> u16 {
        Self::offset(self.blocks()[1], weekday)
    }

    pub fn minute_address(self, weekday: u8) -> u16 {
        Self::offset(self.blocks()[2], weekday)
    }

    pub fn duration_address(self, weekday: u8) -> u16 {
        Self::offset(self.blocks()[3], weekday)
    }

    // Each block is 16 bytes, a bad weekday must not spill into the next block
    fn offset(base: u16, weekday: u8) -> u16 {
        base + u16::from(weekday & 0x0F)
    }
}

/// Alarm settings of one weekday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmConfig {
    pub enabled: bool,
    pub hour: u8,
    pub minute: u8,
    pub duration_minutes: u8,
}

impl AlarmConfig {
    pub fn load<S: SettingsStore + ?Sized>(store: &S, kind: AlarmKind, weekday: u8) -> Self {
        Self {
            enabled: store.read_flag(kind.enable_address(weekday)),
            hour: store.read(kind.hour_address(weekday)),
            minute: store.read(kind.minute_address(weekday)),
            duration_minutes: store.read(kind.duration_address(weekday)),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_minutes) * 60)
    }

    pub fn matches(&self, hour: u8, minute: u8) -> bool {
        self.hour == hour && self.minute == minute
    }
}

/// One alarm per weekday, 1 = Sunday .. 7 = Saturday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmTable([AlarmConfig; 7]);

impl AlarmTable {
    pub fn load<S: SettingsStore + ?Sized>(store: &S, kind: AlarmKind) -> Self {
        let mut days = [AlarmConfig::default(); 7];
        for (weekday, day) in (1..=7).zip(days.iter_mut()) {
            *day = AlarmConfig::load(store, kind, weekday);
        }
        Self(days)
    }

    pub fn for_weekday(&self, weekday: u8) -> Option<&AlarmConfig> {
        usize::from(weekday).checked_sub(1).and_then(|index| self.0.get(index))
    }
}

/// Offset from UTC in hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeZone(f32);

impl TimeZone {
    /// Decode the stored zone byte and daylight saving flag.
    ///
    /// Zones are stored in quarter hours as `(offset + 12) * 4`. Values of 100 and up
    /// encode the +13 and +14 zones. Unset or invalid values select UTC-8.
    pub fn from_raw(zone: u8, dst: u8) -> Self {
        let zone_f = f32::from(zone);
        let offset = if zone == UNSET || zone > 104 {
            -8.0
        } else if zone >= 100 {
            zone_f / 4.0 - 36.0
        } else {
            (zone_f - 48.0) / 4.0
        };
        let daylight = if dst == TRUE { 1.0 } else { 0.0 };
        Self(offset + daylight)
    }

    pub const fn hours(self) -> f32 {
        self.0
    }
}

/// Which hourly tables the default mode follows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScheduleSlot {
    #[default]
    Factory,
    Custom1,
    Custom2,
}

impl ScheduleSlot {
    pub const fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Custom1,
            2 => Self::Custom2,
            _ => Self::Factory,
        }
    }

    /// Addresses of the CCT and level tables, `None` for the factory tables
    const fn addresses(self) -> Option<(u16, u16)> {
        match self {
            Self::Factory => None,
            Self::Custom1 => Some((ADDR_SCHEDULE_1_CCT, ADDR_SCHEDULE_1_LEVEL)),
            Self::Custom2 => Some((ADDR_SCHEDULE_2_CCT, ADDR_SCHEDULE_2_LEVEL)),
        }
    }

    pub fn load<S: SettingsStore + ?Sized>(self, store: &S) -> DaySchedule {
        let Some((cct_base, level_base)) = self.addresses() else {
            return DaySchedule::factory();
        };
        let mut cct: HourTable = [0; HOURS];
        let mut level: HourTable = [0; HOURS];
        for (hour, (cct, level)) in (0u16..).zip(cct.iter_mut().zip(level.iter_mut())) {
            *cct = store.read_word(cct_base + hour * 2);
            *level = u16::from(store.read(level_base + hour));
        }
        DaySchedule { cct, level }
    }
}

/// Everything the scheduler reads from the store, decoded
#[derive(Debug, Clone, PartialEq)]
pub struct LampSettings {
    pub schedule_slot: ScheduleSlot,
    pub schedule: DaySchedule,
    pub max_cct: f32,
    pub wake: AlarmTable,
    pub bedtime: AlarmTable,
    pub presence: PresenceConfig,
    pub ambient: AmbientConfig,
    pub adjust_hold: Duration,
    pub telemetry_debug: bool,
    pub time_zone: TimeZone,
}

impl LampSettings {
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Self {
        let schedule_slot = ScheduleSlot::from_raw(store.read(ADDR_SCHEDULE_SELECT));
        let adjust_hold = match store.read(ADDR_ADJUST_HOLD) {
            UNSET => FACTORY_ADJUST_HOLD_MINUTES,
            minutes => minutes,
        };

        Self {
            schedule_slot,
            schedule: schedule_slot.load(store),
            max_cct: clamp_max_cct(store.read_word(ADDR_MAX_CCT)),
            wake: AlarmTable::load(store, AlarmKind::Wake),
            bedtime: AlarmTable::load(store, AlarmKind::Bedtime),
            presence: load_presence(store),
            ambient: AmbientConfig {
                enabled: store.read_flag(ADDR_AMBIENT_ENABLE),
                sensitivity: Sensitivity::from_raw(store.read(ADDR_AMBIENT_SENSITIVITY)),
            },
            adjust_hold: Duration::from_secs(u64::from(adjust_hold) * 60),
            telemetry_debug: store.read_flag(ADDR_TELEMETRY_DEBUG),
            time_zone: TimeZone::from_raw(store.read(ADDR_TIME_ZONE), store.read(ADDR_DST)),
        }
    }
}

impl Default for LampSettings {
    fn default() -> Self {
        Self::load(&LampStore::new())
    }
}

fn load_presence<S: SettingsStore + ?Sized>(store: &S) -> PresenceConfig {
    let minute_of_day = |hour: u16, minute: u16| {
        u16::from(store.read(hour)) * 60 + u16::from(store.read(minute))
    };
    let window = store.read_flag(ADDR_PRESENCE_SCHEDULE).then(|| PresenceWindow {
        start: minute_of_day(ADDR_PRESENCE_BEGIN_HOUR, ADDR_PRESENCE_BEGIN_MINUTE),
        end: minute_of_day(ADDR_PRESENCE_END_HOUR, ADDR_PRESENCE_END_MINUTE),
    });

    PresenceConfig {
        turn_on: store.read_flag(ADDR_PRESENCE_ON),
        turn_off: store.read_flag(ADDR_PRESENCE_OFF),
        hold_minutes: match store.read(ADDR_PRESENCE_HOLD) {
            UNSET => DEFAULT_HOLD_MINUTES,
            minutes => minutes,
        },
        window,
    }
}
