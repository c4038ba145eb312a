//! Mode scheduler

use core::fmt::Write;

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::bounds::{CCT_1800, MAX_BRIGHTNESS, MIN_BRIGHTNESS, MIN_CCT};
use crate::channel::RequestReceiver;
use crate::clock::WallTime;
use crate::command::{
    AmbientRequest, ButtonAction, ButtonTarget, Interaction, LampCommand, LampRequest,
    PresenceRequest,
};
use crate::driver::LampDriver;
use crate::mode::OperatingMode;
use crate::output::{LampOutput, LampState};
use crate::program::{Program, ProgramKind};
use crate::ramp::RampEngine;
use crate::sensor::presence::presence_allowed;
use crate::sensor::{AmbientEstimate, AmbientEstimator, PresenceEstimator, SensorInputs};
use crate::settings::{
    ADDR_ADJUST_HOLD, ADDR_MAX_CCT, ADDR_SCHEDULE_SELECT, ADDR_TELEMETRY_DEBUG, AlarmConfig,
    AlarmKind, LampSettings, SettingsStore,
};
use crate::table::HourTable;
use crate::telemetry::{Payload, Reporter, TelemetrySink, Topic};
use crate::timer::Marker;

/// Delay before a button adjustment is reported
pub const ADJUST_REPORT_DELAY: Duration = Duration::from_secs(5);
/// Fade back into the default mode after a program or an adjust timeout
pub const MODE_CHANGE_FADE: Duration = Duration::from_secs(15);
/// Fade used by app adjustments, power on and ambient reconfiguration
pub const QUICK_FADE: Duration = Duration::from_millis(500);
/// Fade towards a new ambient estimate
pub const AMBIENT_FADE: Duration = Duration::from_secs(10);

const BUTTON_CCT_STEP: f32 = 20.0;
const BUTTON_CCT_INTERVAL: Duration = Duration::from_millis(15);
const BUTTON_FAST_INTERVAL: Duration = Duration::from_millis(5);
const BUTTON_SLOW_INTERVAL: Duration = Duration::from_millis(10);
/// Buttons never dim below this level
const BUTTON_MIN_LEVEL: f32 = MIN_BRIGHTNESS + 3.0;
/// App and absolute brightness requests never go below this level
const APP_MIN_LEVEL: f32 = MIN_BRIGHTNESS + 2.0;

/// Brightness the app "up" command ramps to
fn app_level_up(level: f32) -> f32 {
    let dest = if level < 30.0 {
        level + 10.0
    } else if level < 80.0 {
        level + 30.0
    } else if level < 150.0 {
        level + 50.0
    } else if level < 200.0 {
        level + 70.0
    } else {
        MAX_BRIGHTNESS
    };
    dest.min(MAX_BRIGHTNESS)
}

/// Brightness the app "down" command ramps to
fn app_level_down(level: f32) -> f32 {
    if level < 20.0 {
        APP_MIN_LEVEL
    } else if level < 50.0 {
        level - 15.0
    } else if level < 80.0 {
        level - 30.0
    } else if level < 170.0 {
        level - 50.0
    } else {
        level - 70.0
    }
}

fn app_cct_up(cct: f32, max_cct: f32) -> f32 {
    if cct > max_cct - 1500.0 {
        max_cct
    } else {
        cct + 1000.0
    }
}

fn app_cct_down(cct: f32) -> f32 {
    let dest = if cct < 500.0 {
        MIN_CCT
    } else if cct < 3000.0 {
        cct - 750.0
    } else {
        cct - 700.0
    };
    dest.max(MIN_CCT)
}

/// Ramp length for an absolute CCT change
fn cct_fade(delta: f32) -> Duration {
    let delta = libm::fabsf(delta);
    if delta > 3000.0 {
        Duration::from_millis(1500)
    } else if delta > 2000.0 {
        Duration::from_millis(1000)
    } else {
        QUICK_FADE
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole(value: f32) -> i32 {
    value as i32
}

fn join_table(table: &HourTable) -> Payload {
    let mut payload = Payload::new();
    for value in table {
        // 24 values of at most five digits always fit
        if write!(payload, " {value}").is_err() {
            break;
        }
    }
    payload
}

/// Manual adjustment bookkeeping
struct AdjustState {
    /// Last manual adjustment
    marker: Marker,
    /// A button adjustment has not been reported yet
    report_pending: bool,
}

/// Mode scheduler - the root of the control core
///
/// Owns the lamp output and every estimator. The host calls [`Scheduler::tick`] once per
/// control cycle; requests queued between two ticks are applied at the start of the next.
pub struct Scheduler<
    'a,
    D: LampDriver,
    S: SettingsStore,
    T: TelemetrySink,
    const QUEUE_SIZE: usize,
> {
    // External dependencies and configuration
    requests: RequestReceiver<'a, QUEUE_SIZE>,
    store: S,
    reporter: Reporter<T>,
    settings: LampSettings,

    // Internal state
    output: LampOutput<D>,
    mode: OperatingMode,
    ramp: RampEngine,
    program: Option<Program>,
    adjust: AdjustState,
    button_target: ButtonTarget,
    presence: PresenceEstimator,
    ambient: AmbientEstimator,
    wake_armed: bool,
    bedtime_armed: bool,
    presence_allowed: bool,
    last_second: Option<u8>,
}

impl<'a, D, S, T, const QUEUE_SIZE: usize> Scheduler<'a, D, S, T, QUEUE_SIZE>
where
    D: LampDriver,
    S: SettingsStore,
    T: TelemetrySink,
{
    pub fn new(
        requests: RequestReceiver<'a, QUEUE_SIZE>,
        driver: D,
        store: S,
        telemetry: T,
        now: Instant,
    ) -> Self {
        let settings = LampSettings::load(&store);
        let mut reporter = Reporter::new(telemetry);
        reporter.set_debug(settings.telemetry_debug);

        Self {
            requests,
            store,
            reporter,
            settings,
            output: LampOutput::new(driver),
            mode: OperatingMode::Default,
            ramp: RampEngine::new(),
            program: None,
            adjust: AdjustState {
                marker: Marker::new(now),
                report_pending: false,
            },
            button_target: ButtonTarget::default(),
            presence: PresenceEstimator::new(now),
            ambient: AmbientEstimator::new(now),
            wake_armed: true,
            bedtime_armed: true,
            presence_allowed: false,
            last_second: None,
        }
    }

    /// Learn the power state from the driver and show the default target
    pub fn init(&mut self, time: &WallTime) {
        let _is_on = self.output.read_status();
        #[cfg(feature = "esp32-log")]
        println!("[Scheduler.init] lamp is on: {}", _is_on);

        let (cct, level) = self.default_target(time);
        self.output.load(cct, level);
        self.last_second = Some(time.second);
    }

    /// Run one control cycle
    pub fn tick(&mut self, now: Instant, time: &WallTime, sensors: &mut impl SensorInputs) {
        self.process_requests(now, time);

        if !self.output.state().is_on() {
            self.set_mode(OperatingMode::Default);
            self.program = None;
        }

        self.check_wake_alarm(time);
        self.check_bedtime_alarm(time);
        self.presence_allowed =
            presence_allowed(self.mode, &self.settings.presence, time.minute_of_day());

        self.process_presence(now, time, sensors.presence());
        self.process_ambient(now, time, sensors);

        match self.mode {
            OperatingMode::Ramp => {
                if !self.ramp.step(now, &mut self.output) {
                    self.set_mode(self.ramp.next_mode());
                }
            }
            OperatingMode::Adjust => self.step_adjust(now, time),
            OperatingMode::Demo | OperatingMode::DawnSim | OperatingMode::Bedtime => {
                self.step_program(now, time);
            }
            OperatingMode::Default => self.step_default(time),
        }
    }

    /// Apply a single request right away
    pub fn handle(&mut self, request: LampRequest, now: Instant, time: &WallTime) {
        match request {
            LampRequest::Command(command) => self.handle_command(command, now, time),
            LampRequest::UnknownCommand(code) => {
                self.reporter.report(
                    Topic::Debug,
                    format_args!("Unknown command received: {code:#04x}"),
                );
            }
            LampRequest::Button(action) => self.handle_button(action, now, time),
            LampRequest::ButtonTarget(target) => self.button_target = target,
            LampRequest::SetBrightness(level) => self.set_brightness(level, now),
            LampRequest::SetCct(cct) => self.set_cct(cct, now),
            LampRequest::WakeAlarm(alarm) => {
                alarm.write_to(&mut self.store, AlarmKind::Wake);
                self.reload();
            }
            LampRequest::BedtimeAlarm(alarm) => {
                alarm.write_to(&mut self.store, AlarmKind::Bedtime);
                self.reload();
            }
            LampRequest::Presence(presence) => self.configure_presence(&presence, now),
            LampRequest::Ambient(ambient) => self.configure_ambient(&ambient, time),
            LampRequest::MaxCct(max_cct) => {
                self.store.write_word(ADDR_MAX_CCT, max_cct);
                self.reload();
            }
            LampRequest::SelectSchedule(slot) => {
                self.store.write(ADDR_SCHEDULE_SELECT, slot);
                self.reload();
            }
            LampRequest::AdjustHold(minutes) => {
                self.store.write(ADDR_ADJUST_HOLD, minutes);
                self.reload();
            }
            LampRequest::TelemetryDebug(enabled) => {
                self.store.write(ADDR_TELEMETRY_DEBUG, u8::from(enabled));
                self.reload();
            }
            LampRequest::PublishSchedule => self.publish_schedule(),
            LampRequest::Diagnostic { channel, value } => {
                self.output.write_channel(channel, value);
            }
        }
    }

    /// Switch the lamp on and fade into the default target
    pub fn turn_on(&mut self, via: Interaction, now: Instant, time: &WallTime) {
        // A lamp switched on by hand must not be switched off by presence right away
        self.presence.refresh_hold(now);
        self.output.load(self.output.state().cct(), MIN_BRIGHTNESS);
        self.output.set_power(true);
        self.reporter
            .report(Topic::Power, format_args!("true,{}", via.tag()));

        let (cct, level) = self.default_target(time);
        self.ramp_to(cct, level, QUICK_FADE, OperatingMode::Default);
    }

    pub fn turn_off(&mut self, via: Interaction, now: Instant) {
        self.presence.refresh_hold(now);
        self.output.set_power(false);
        if via.is_manual() {
            self.presence.start_cooldown(now);
        }
        self.reporter
            .report(Topic::Power, format_args!("false,{}", via.tag()));
        self.set_mode(OperatingMode::Default);
        self.program = None;
    }

    /// Target of the default mode: scheduled CCT and the ambient adjusted or scheduled level
    pub fn default_target(&self, time: &WallTime) -> (f32, f32) {
        let at = time.time_of_day();
        let max_cct = self.settings.max_cct;
        let cct = self.settings.schedule.cct_at(at, max_cct);
        let level = match self.ambient.adjusted() {
            Some(adjusted) if self.settings.ambient.enabled => adjusted,
            _ => self.settings.schedule.level_at(at, max_cct),
        };
        (cct, level)
    }

    /// Send both active schedule tables as debug telemetry
    pub fn publish_schedule(&mut self) {
        if !self.reporter.debug_enabled() {
            return;
        }
        let cct = join_table(&self.settings.schedule.cct);
        let level = join_table(&self.settings.schedule.level);
        self.reporter
            .report(Topic::Debug, format_args!("CCT Schedule:{cct}"));
        self.reporter
            .report(Topic::Debug, format_args!("Brightness Schedule:{level}"));
    }

    pub const fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub const fn state(&self) -> LampState {
        self.output.state()
    }

    pub const fn output(&self) -> &LampOutput<D> {
        &self.output
    }

    pub const fn settings(&self) -> &LampSettings {
        &self.settings
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn telemetry(&self) -> &T {
        self.reporter.sink()
    }

    pub const fn telemetry_mut(&mut self) -> &mut T {
        self.reporter.sink_mut()
    }

    pub const fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub const fn ramp(&self) -> &RampEngine {
        &self.ramp
    }

    pub const fn ambient_estimate(&self) -> AmbientEstimate {
        self.ambient.estimate()
    }

    /// Whether presence may switch the lamp, as of the last tick
    pub const fn is_presence_allowed(&self) -> bool {
        self.presence_allowed
    }

    fn process_requests(&mut self, now: Instant, time: &WallTime) {
        while let Ok(request) = self.requests.try_receive() {
            self.handle(request, now, time);
        }
    }

    fn reload(&mut self) {
        self.settings = LampSettings::load(&self.store);
        self.reporter.set_debug(self.settings.telemetry_debug);
    }

    fn set_mode(&mut self, mode: OperatingMode) {
        if self.mode == mode {
            return;
        }
        #[cfg(feature = "esp32-log")]
        println!("[Scheduler.set_mode] {} -> {}", self.mode.as_str(), mode.as_str());
        self.mode = mode;
    }

    /// Abandon whatever runs now and ramp, then continue in `next_mode`
    fn ramp_to(&mut self, cct: f32, level: f32, duration: Duration, next_mode: OperatingMode) {
        self.program = None;
        self.ramp
            .setup(self.output.state(), cct, level, duration, Some(next_mode));
        self.set_mode(OperatingMode::Ramp);
    }

    fn handle_command(&mut self, command: LampCommand, now: Instant, time: &WallTime) {
        self.presence.refresh_hold(now);
        let is_on = self.output.state().is_on();

        match command {
            LampCommand::TurnOn => {
                if !is_on {
                    self.turn_on(Interaction::App, now, time);
                }
            }
            LampCommand::TurnOff => {
                if is_on {
                    self.turn_off(Interaction::App, now);
                }
            }
            LampCommand::DemoOn => {
                if is_on {
                    self.start_program(ProgramKind::Demo, Duration::from_secs(0));
                }
            }
            _ if !is_on => {}
            LampCommand::BrightnessUp => {
                let level = self.output.state().level();
                if level < MAX_BRIGHTNESS {
                    self.app_adjust(None, Some(app_level_up(level)), now);
                }
            }
            LampCommand::BrightnessDown => {
                let level = self.output.state().level();
                if level > APP_MIN_LEVEL {
                    self.app_adjust(None, Some(app_level_down(level)), now);
                }
            }
            LampCommand::CctUp => {
                let cct = self.output.state().cct();
                if cct < self.settings.max_cct {
                    self.app_adjust(Some(app_cct_up(cct, self.settings.max_cct)), None, now);
                }
            }
            LampCommand::CctDown => {
                let cct = self.output.state().cct();
                if cct > MIN_CCT {
                    self.app_adjust(Some(app_cct_down(cct)), None, now);
                }
            }
        }
    }

    /// Ramp one axis from the app, the other one keeps its value
    fn app_adjust(&mut self, cct: Option<f32>, level: Option<f32>, now: Instant) {
        self.app_adjust_over(cct, level, QUICK_FADE, now);
    }

    fn app_adjust_over(
        &mut self,
        cct: Option<f32>,
        level: Option<f32>,
        duration: Duration,
        now: Instant,
    ) {
        let state = self.output.state();
        self.adjust.marker.reset(now);
        self.ramp_to(
            cct.unwrap_or(state.cct()),
            level.unwrap_or(state.level()),
            duration,
            OperatingMode::Adjust,
        );
    }

    fn set_brightness(&mut self, level: u16, now: Instant) {
        if !self.output.state().is_on() {
            return;
        }
        let level = f32::from(level).clamp(APP_MIN_LEVEL, MAX_BRIGHTNESS);
        self.app_adjust(None, Some(level), now);
    }

    fn set_cct(&mut self, cct: u16, now: Instant) {
        if !self.output.state().is_on() {
            return;
        }
        let cct = f32::from(cct).clamp(MIN_CCT, self.settings.max_cct);
        let duration = cct_fade(self.output.state().cct() - cct);
        self.app_adjust_over(Some(cct), None, duration, now);
    }

    fn handle_button(&mut self, action: ButtonAction, now: Instant, time: &WallTime) {
        self.presence.refresh_hold(now);
        if !self.output.state().is_on() {
            self.turn_on(Interaction::Button, now, time);
            return;
        }
        if self.mode != OperatingMode::Adjust {
            self.program = None;
            self.adjust.marker.reset(now);
            self.set_mode(OperatingMode::Adjust);
        }

        let state = self.output.state();
        let (cct, level) = (state.cct(), state.level());
        let elapsed = self.adjust.marker.elapsed(now);
        let max_cct = self.settings.max_cct;
        let target = match (self.button_target, action) {
            (ButtonTarget::Cct, ButtonAction::Up) => {
                (elapsed >= BUTTON_CCT_INTERVAL && cct < max_cct)
                    .then_some(((cct + BUTTON_CCT_STEP).min(max_cct), level))
            }
            (ButtonTarget::Cct, ButtonAction::Down) => {
                (elapsed >= BUTTON_CCT_INTERVAL && cct > MIN_CCT)
                    .then_some(((cct - BUTTON_CCT_STEP).max(MIN_CCT), level))
            }
            (_, ButtonAction::Up) if cct < CCT_1800 && level > MAX_BRIGHTNESS - 1.0 => {
                // Already at full level: continue into the warm range
                (elapsed >= BUTTON_CCT_INTERVAL)
                    .then_some(((cct + BUTTON_CCT_STEP).min(CCT_1800), level))
            }
            (_, ButtonAction::Up) => {
                let interval = if level < 100.0 {
                    BUTTON_SLOW_INTERVAL
                } else {
                    BUTTON_FAST_INTERVAL
                };
                (elapsed >= interval && level < MAX_BRIGHTNESS).then_some((cct, level + 1.0))
            }
            (_, ButtonAction::Down) if cct <= CCT_1800 + 1.0 && cct > MIN_CCT => {
                (elapsed >= BUTTON_CCT_INTERVAL).then_some((cct - BUTTON_CCT_STEP, level))
            }
            (_, ButtonAction::Down) => {
                let interval = if level < 100.0 {
                    BUTTON_FAST_INTERVAL
                } else {
                    BUTTON_SLOW_INTERVAL
                };
                (elapsed >= interval && level > BUTTON_MIN_LEVEL).then_some((cct, level - 1.0))
            }
        };

        if let Some((cct, level)) = target {
            self.output.load(cct, level);
            self.adjust.marker.reset(now);
            self.adjust.report_pending = true;
        }
    }

    fn configure_presence(&mut self, request: &PresenceRequest, now: Instant) {
        self.presence.refresh_hold(now);
        self.reporter.debug("PIR Timer reset");
        request.write_to(&mut self.store);
        self.reload();
    }

    fn configure_ambient(&mut self, request: &AmbientRequest, time: &WallTime) {
        let was_enabled = self.settings.ambient.enabled;
        request.write_to(&mut self.store);
        self.reload();

        let toggled = was_enabled != self.settings.ambient.enabled;
        let applicable = self.output.state().is_on()
            && self.mode == OperatingMode::Default
            && self.ambient.adjusted().is_some();
        if toggled && applicable {
            let (cct, level) = self.default_target(time);
            self.ramp_to(cct, level, QUICK_FADE, OperatingMode::Default);
        }
    }

    fn start_program(&mut self, kind: ProgramKind, length: Duration) {
        self.program = Some(Program::start(kind, length, &mut self.output));
        self.set_mode(kind.mode());
    }

    fn check_wake_alarm(&mut self, time: &WallTime) {
        let Some(alarm) = self.settings.wake.for_weekday(time.weekday).copied() else {
            return;
        };
        if time.minute != alarm.minute {
            self.wake_armed = true;
        }
        let eligible = alarm.enabled
            && !self.output.state().is_on()
            && !matches!(self.mode, OperatingMode::Demo | OperatingMode::Bedtime);
        if eligible && self.wake_armed && alarm.matches(time.hour, time.minute) {
            self.wake_armed = false;
            self.start_dawn(&alarm);
        }
    }

    fn check_bedtime_alarm(&mut self, time: &WallTime) {
        let Some(alarm) = self.settings.bedtime.for_weekday(time.weekday).copied() else {
            return;
        };
        if time.minute != alarm.minute {
            self.bedtime_armed = true;
        }
        let eligible = alarm.enabled
            && self.output.state().is_on()
            && !matches!(self.mode, OperatingMode::Demo | OperatingMode::DawnSim);
        if eligible && self.bedtime_armed && alarm.matches(time.hour, time.minute) {
            self.bedtime_armed = false;
            self.start_program(ProgramKind::Bedtime, alarm.duration());
            self.reporter.debug("Bedtime Reminder begins.");
        }
    }

    fn start_dawn(&mut self, alarm: &AlarmConfig) {
        self.start_program(ProgramKind::DawnSim, alarm.duration());
        self.output.set_power(true);
        self.reporter.debug("Wake Up Alarm begins.");
        self.reporter.report(Topic::Power, format_args!("true,alarm"));
    }

    fn process_presence(&mut self, now: Instant, time: &WallTime, motion: bool) {
        let config = self.settings.presence;

        if self.presence.poll(now, motion).is_some() {
            if self.presence.report_due(now) {
                self.reporter.report(Topic::Sensor, format_args!("pir,true"));
            }
            let may_turn_on = self.presence_allowed
                && config.turn_on
                && !self.output.state().is_on()
                && self.presence.cooldown_elapsed(now);
            if may_turn_on {
                self.turn_on(Interaction::Presence, now, time);
            }
        }

        let may_turn_off = self.presence_allowed
            && config.turn_off
            && self.output.state().is_on()
            && self.presence.hold_expired(now, config.hold());
        if may_turn_off {
            self.turn_off(Interaction::Presence, now);
            self.presence.clear();
        }
    }

    fn process_ambient(&mut self, now: Instant, time: &WallTime, sensors: &mut impl SensorInputs) {
        let lamp = self.output.state();
        let reference = self
            .settings
            .schedule
            .level_at(time.time_of_day(), self.settings.max_cct);
        let sensitivity = self.settings.ambient.sensitivity;

        let adjusted = self
            .ambient
            .poll(now, &lamp, reference, sensitivity, || sensors.ambient());
        if let Some(adjusted) = adjusted {
            if self.settings.ambient.enabled && lamp.is_on() && self.mode == OperatingMode::Default
            {
                let (cct, _) = self.default_target(time);
                self.ramp_to(cct, adjusted, AMBIENT_FADE, OperatingMode::Default);
            }
        }

        if self.ambient.report_due(now) {
            let background = self.ambient.estimate().background.unwrap_or_default();
            let lamp = self.output.state();
            self.reporter.report(
                Topic::Sensor,
                format_args!(
                    "ambient,{},{},{},{},{}",
                    whole(background),
                    u8::from(lamp.is_on()),
                    whole(lamp.cct()),
                    whole(lamp.level()),
                    self.mode.id(),
                ),
            );
        }
    }

    fn step_adjust(&mut self, now: Instant, time: &WallTime) {
        let state = self.output.state();

        if self.adjust.report_pending && self.adjust.marker.has_elapsed(now, ADJUST_REPORT_DELAY) {
            self.adjust.report_pending = false;
            self.reporter
                .report(Topic::Brightness, format_args!("{},btn", whole(state.level())));
            self.reporter
                .report(Topic::Color, format_args!("{},btn", whole(state.cct())));
        }

        // The max CCT may have been lowered while adjusted
        if state.cct() > self.settings.max_cct {
            self.output.load(self.settings.max_cct, state.level());
        }

        if self.adjust.marker.has_elapsed(now, self.settings.adjust_hold) {
            let (cct, level) = self.default_target(time);
            self.ramp_to(cct, level, MODE_CHANGE_FADE, OperatingMode::Default);
        }
    }

    fn step_program(&mut self, now: Instant, time: &WallTime) {
        let Some(program) = self.program.as_mut() else {
            self.set_mode(OperatingMode::Default);
            return;
        };
        let running = program.step(
            &mut self.ramp,
            &mut self.output,
            now,
            time.epoch,
            self.settings.max_cct,
        );
        if running {
            return;
        }

        let kind = program.kind();
        self.program = None;
        #[cfg(feature = "esp32-log")]
        println!("[Scheduler.step_program] {:?} finished", kind);

        match kind {
            ProgramKind::Demo | ProgramKind::DawnSim => {
                if kind == ProgramKind::DawnSim {
                    // Keep presence from switching off right after waking up
                    self.presence.refresh_hold(now);
                }
                let (cct, level) = self.default_target(time);
                self.ramp_to(cct, level, MODE_CHANGE_FADE, OperatingMode::Default);
            }
            ProgramKind::Bedtime => {
                self.output.set_power(false);
                self.presence.start_cooldown(now);
                self.reporter.report(Topic::Power, format_args!("false,bed"));
                self.set_mode(OperatingMode::Default);
            }
        }
    }

    fn step_default(&mut self, time: &WallTime) {
        if self.last_second == Some(time.second) {
            return;
        }
        self.last_second = Some(time.second);
        let (cct, level) = self.default_target(time);
        self.output.load(cct, level);
    }
}
