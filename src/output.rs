//! Lamp output state
//!
//! Every LED change goes through [`LampOutput`]: the new state is clamped, mixed and
//! pushed to the driver in call order.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::bounds::{MIN_CCT, clamp_cct, clamp_level};
use crate::color::{ColorMix, Densities};
use crate::driver::{DriverCommand, LampDriver, REG_POWER};

/// Current output of the lamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampState {
    cct: f32,
    level: f32,
    is_on: bool,
}

impl LampState {
    pub const fn cct(&self) -> f32 {
        self.cct
    }

    pub const fn level(&self) -> f32 {
        self.level
    }

    pub const fn is_on(&self) -> bool {
        self.is_on
    }
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            cct: MIN_CCT,
            level: 0.0,
            is_on: false,
        }
    }
}

/// Owns the driver and the state it was last told to show
pub struct LampOutput<D: LampDriver> {
    driver: D,
    state: LampState,
    mix: ColorMix,
}

impl<D: LampDriver> LampOutput<D> {
    pub fn new(driver: D) -> Self {
        let state = LampState::default();
        Self {
            driver,
            mix: ColorMix::for_cct(state.cct),
            state,
        }
    }

    pub const fn state(&self) -> LampState {
        self.state
    }

    pub const fn mix(&self) -> ColorMix {
        self.mix
    }

    /// Densities matching the current state
    pub fn densities(&self) -> Densities {
        self.mix.densities(self.state.level)
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub const fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Ask the driver whether its output stage is on.
    ///
    /// A failed read leaves the lamp considered off.
    pub fn read_status(&mut self) -> bool {
        let mut status = [0u8; 1];
        self.state.is_on = match self.driver.read(REG_POWER, &mut status) {
            Ok(count) => count > 0 && status[0] != 0,
            Err(_) => false,
        };
        self.state.is_on
    }

    /// Show a new color temperature and brightness
    pub fn load(&mut self, cct: f32, level: f32) {
        self.state.cct = clamp_cct(cct);
        self.state.level = clamp_level(level);
        self.mix = ColorMix::for_cct(self.state.cct);
        self.send(DriverCommand::Densities(self.densities()));
    }

    /// Switch the output stage
    pub fn set_power(&mut self, on: bool) {
        self.state.is_on = on;
        self.send(DriverCommand::Power(on));
    }

    /// Diagnostic write of a single channel, bypassing the mixer
    pub fn write_channel(&mut self, index: u8, value: u8) {
        if let Some(command) = DriverCommand::channel(index, value) {
            self.send(command);
        }
    }

    fn send(&mut self, command: DriverCommand) {
        // Failed writes are not retried, the next state push repeats the target
        if let Err(_err) = command.send(&mut self.driver) {
            #[cfg(feature = "esp32-log")]
            println!("[LampOutput.send] {:?} failed: {:?}", command, _err);
        }
    }
}
