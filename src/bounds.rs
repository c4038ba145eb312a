//! Legal output ranges of the lamp and the constants shared by the control core.

use embassy_time::Duration;

/// Cold emitter
pub const CCT_6500: f32 = 6500.0;
/// Neutral emitter
pub const CCT_4000: f32 = 4000.0;
/// Warm emitter, split into a top and a bottom string
pub const CCT_1800: f32 = 1800.0;
/// Lowest renderable temperature (warm top string fully dimmed)
pub const MIN_CCT: f32 = 300.0;

pub const MAX_BRIGHTNESS: f32 = 255.0;
pub const MIN_BRIGHTNESS: f32 = 0.0;

/// Accepted range for the user configured max CCT
pub const MAX_CCT_UPPER_LIMIT: u16 = 6500;
pub const MAX_CCT_LOWER_LIMIT: u16 = 4000;

/// Granularity of ramps and of the control loop
pub const TICK_PERIOD: Duration = Duration::from_millis(5);

/// Returns true if a ramp may move the color temperature to `cct`
pub fn cct_in_range(cct: f32) -> bool {
    (MIN_CCT..=CCT_6500).contains(&cct)
}

/// Returns true if a ramp may move the brightness to `level`
pub fn level_in_range(level: f32) -> bool {
    (MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&level)
}

/// Clamp a color temperature into the renderable range
pub fn clamp_cct(cct: f32) -> f32 {
    cct.clamp(MIN_CCT, CCT_6500)
}

/// Clamp a brightness into the renderable range
pub fn clamp_level(level: f32) -> f32 {
    level.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

/// Decode the stored max CCT word.
///
/// Unset (`0xFFFF`) and out of range values end up at the nearest limit.
pub fn clamp_max_cct(raw: u16) -> f32 {
    f32::from(raw.clamp(MAX_CCT_LOWER_LIMIT, MAX_CCT_UPPER_LIMIT))
}
