//! LED driver transport
//!
//! The driver is a small register device on an addressed bus:
//! - register 0: power flag
//! - register 1: brightness (unused by the control core)
//! - registers 2..=5: channel densities

use crate::color::{CHANNELS, Densities};

pub const REG_POWER: u8 = 0;
pub const REG_DENSITY: u8 = 2;

/// Abstract LED driver transport
///
/// Implement this trait to support different buses. Each call is one complete
/// addressed transaction.
pub trait LampDriver {
    type Error: core::fmt::Debug;

    /// Write `data` starting at `register`
    fn write(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read into `buffer` starting at `register`.
    ///
    /// Returns the number of bytes received, the device may send less than requested.
    fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Commands understood by the LED driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Switch the output stage on or off
    Power(bool),
    /// Set all four channel densities
    Densities(Densities),
    /// Diagnostic write of a single channel
    Channel { index: u8, value: u8 },
}

impl DriverCommand {
    /// Diagnostic channel write, `None` if the channel does not exist
    pub fn channel(index: u8, value: u8) -> Option<Self> {
        (usize::from(index) < CHANNELS).then_some(Self::Channel { index, value })
    }

    /// Register the command writes to
    pub const fn register(self) -> u8 {
        match self {
            Self::Power(_) => REG_POWER,
            Self::Densities(_) => REG_DENSITY,
            Self::Channel { index, .. } => REG_DENSITY + index,
        }
    }

    /// Send the command in a single transaction
    pub fn send<D: LampDriver>(self, driver: &mut D) -> Result<(), D::Error> {
        match self {
            Self::Power(on) => driver.write(REG_POWER, &[u8::from(on)]),
            Self::Densities(densities) => driver.write(REG_DENSITY, &densities),
            Self::Channel { value, .. } => driver.write(self.register(), &[value]),
        }
    }
}
