//! Sensor estimators
//!
//! Estimators only publish new targets and events. They never write the driver,
//! the scheduler decides what to do with their output.

pub mod ambient;
pub mod presence;

pub use ambient::{AmbientConfig, AmbientEstimate, AmbientEstimator, Sensitivity};
pub use presence::{PresenceConfig, PresenceEstimator, PresenceEvent, PresenceWindow};

/// Raw sensor reads provided by the host
pub trait SensorInputs {
    /// Digital output of the motion detector
    fn presence(&mut self) -> bool;

    /// Raw ambient light sensor reading
    fn ambient(&mut self) -> u16;
}
