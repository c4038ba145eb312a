#![no_std]

pub mod bounds;
pub mod channel;
pub mod clock;
pub mod color;
pub mod command;
pub mod control_loop;
pub mod driver;
pub mod mode;
pub mod output;
pub mod program;
pub mod ramp;
pub mod scheduler;
pub mod sensor;
pub mod settings;
pub mod table;
pub mod telemetry;
pub mod timer;

pub use channel::{RequestQueue, RequestReceiver, RequestSender};
pub use clock::{WallClock, WallTime};
pub use color::{ColorMix, Densities};
pub use command::{ButtonAction, ButtonTarget, Interaction, LampCommand, LampRequest, ParseError};
pub use control_loop::{ControlLoop, TickResult};
pub use driver::{DriverCommand, LampDriver};
pub use mode::OperatingMode;
pub use output::{LampOutput, LampState};
pub use program::{Program, ProgramKind};
pub use ramp::{RampEngine, RampRegister};
pub use scheduler::Scheduler;
pub use sensor::SensorInputs;
pub use settings::{LampSettings, LampStore, MemoryStore, SettingsStore};
pub use table::{DaySchedule, TimeOfDay};
pub use telemetry::{Reporter, TelemetrySink, Topic};

pub use embassy_time::{Duration, Instant};
