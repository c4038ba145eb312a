//! Best-effort telemetry
//!
//! Reports are formatted into a fixed buffer and handed to a [`TelemetrySink`].
//! Nothing is queued or retried: a disconnected sink or an oversized payload drops
//! the report.

use core::fmt::{self, Write};

use heapless::String;

#[cfg(feature = "esp32-log")]
use esp_println::println;

pub const PAYLOAD_CAPACITY: usize = 160;

/// Formatted telemetry payload
pub type Payload = String<PAYLOAD_CAPACITY>;

const TOPIC_POWER: &str = "power";
const TOPIC_BRIGHTNESS: &str = "brightness";
const TOPIC_COLOR: &str = "color";
const TOPIC_SENSOR: &str = "sensor";
const TOPIC_DEBUG: &str = "debug";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    /// `"true,<tag>"` / `"false,<tag>"`
    Power,
    /// `"<level>,btn"`
    Brightness,
    /// `"<cct>,btn"`
    Color,
    /// `"pir,true"` or `"ambient,<background>,<on>,<cct>,<level>,<mode>"`
    Sensor,
    /// Free text, only sent while debug telemetry is enabled
    Debug,
}

impl Topic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Power => TOPIC_POWER,
            Self::Brightness => TOPIC_BRIGHTNESS,
            Self::Color => TOPIC_COLOR,
            Self::Sensor => TOPIC_SENSOR,
            Self::Debug => TOPIC_DEBUG,
        }
    }
}

/// Abstract telemetry transport
pub trait TelemetrySink {
    /// Whether publishing can currently succeed
    fn is_connected(&self) -> bool {
        true
    }

    /// Fire and forget publish
    fn publish(&mut self, topic: &str, payload: &str);
}

/// Formats reports and applies the debug gate
pub struct Reporter<T: TelemetrySink> {
    sink: T,
    debug: bool,
}

impl<T: TelemetrySink> Reporter<T> {
    pub const fn new(sink: T) -> Self {
        Self { sink, debug: false }
    }

    pub const fn sink(&self) -> &T {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut T {
        &mut self.sink
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub const fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Publish a report, e.g. `reporter.report(Topic::Power, format_args!("true,{}", tag))`
    pub fn report(&mut self, topic: Topic, args: fmt::Arguments<'_>) {
        if topic == Topic::Debug && !self.debug {
            return;
        }
        if !self.sink.is_connected() {
            return;
        }
        let mut payload = Payload::new();
        if payload.write_fmt(args).is_err() {
            #[cfg(feature = "esp32-log")]
            println!("[Reporter.report] {} payload too long, dropped", topic.as_str());
            return;
        }
        self.sink.publish(topic.as_str(), &payload);
    }

    /// Publish a debug message
    pub fn debug(&mut self, message: &str) {
        self.report(Topic::Debug, format_args!("{message}"));
    }
}
