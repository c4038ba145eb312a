mod support;

mod tests {
    use embassy_time::{Duration, Instant};
    use myrtio_lamp_core::command::{AlarmRequest, AmbientRequest, PresenceRequest};
    use myrtio_lamp_core::settings::ScheduleSlot;
    use myrtio_lamp_core::{
        ButtonAction, ButtonTarget, LampCommand, LampRequest, LampStore, OperatingMode, ProgramKind,
        RequestQueue, Scheduler, WallTime,
    };

    use super::support::{
        QUEUE_SIZE, RecordingDriver, RecordingSink, ScriptedSensors, TestScheduler, assert_close,
        ms, noon, run,
    };

    const TICK: Duration = Duration::from_millis(5);
    const EPOCH_BASE: u32 = 1_700_000_000;

    fn scheduler(queue: &RequestQueue<QUEUE_SIZE>, driver: RecordingDriver) -> TestScheduler<'_> {
        Scheduler::new(
            queue.receiver(),
            driver,
            LampStore::new(),
            RecordingSink::default(),
            ms(0),
        )
    }

    fn at(hour: u8, minute: u8, second: u8, weekday: u8) -> WallTime {
        let seconds = u32::from(weekday) * 86_400
            + u32::from(hour) * 3600
            + u32::from(minute) * 60
            + u32::from(second);
        WallTime::new(hour, minute, second, weekday, EPOCH_BASE + seconds)
    }

    /// Run until `to` in ticks of 5ms
    fn run_until(
        scheduler: &mut TestScheduler<'_>,
        time: &WallTime,
        from: Instant,
        to: Instant,
    ) -> Instant {
        let mut sensors = ScriptedSensors::default();
        run(scheduler, &mut sensors, time, from, to, TICK)
    }

    fn count(scheduler: &TestScheduler<'_>, topic: &str, payload: &str) -> usize {
        scheduler
            .telemetry()
            .payloads(topic)
            .into_iter()
            .filter(|p| *p == payload)
            .count()
    }

    #[test]
    fn test_init_shows_default_target() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        scheduler.init(&noon());

        let state = scheduler.state();
        assert!(state.is_on());
        assert_close(state.cct(), 6500.0);
        assert_close(state.level(), 255.0);
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.output().driver().densities.is_some());
    }

    #[test]
    fn test_init_with_failing_driver_assumes_off() {
        let queue = RequestQueue::new();
        let driver = RecordingDriver {
            status: 1,
            fail: true,
            ..RecordingDriver::default()
        };
        let mut scheduler = scheduler(&queue, driver);
        scheduler.init(&noon());

        assert!(!scheduler.state().is_on());
    }

    #[test]
    fn test_default_mode_follows_schedule() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        scheduler.init(&at(16, 29, 59, 3));

        let afternoon = at(16, 30, 0, 3);
        run_until(&mut scheduler, &afternoon, ms(0), ms(10));
        assert_close(scheduler.state().cct(), 4500.0);
        assert_close(scheduler.state().level(), 185.0);
    }

    #[test]
    fn test_turn_on_fades_in_once() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        queue.sender().send_code(0xA1).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(5));
        assert!(scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Ramp);
        assert!(scheduler.state().level() < 10.0);
        assert!(scheduler.telemetry().has("power", "true,web"));

        run_until(&mut scheduler, &time, ms(5), ms(600));
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().level(), 255.0);

        queue.sender().try_send(LampCommand::TurnOn).unwrap();
        run_until(&mut scheduler, &time, ms(600), ms(610));
        assert_eq!(count(&scheduler, "power", "true,web"), 1);
        assert_eq!(scheduler.mode(), OperatingMode::Default);
    }

    #[test]
    fn test_requests_ignored_while_off() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        let sender = queue.sender();
        sender.try_send(LampRequest::SetBrightness(20)).unwrap();
        sender.try_send(LampRequest::SetCct(2000)).unwrap();
        sender.try_send(LampCommand::BrightnessDown).unwrap();
        sender.try_send(LampCommand::DemoOn).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(100));

        assert!(!scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.program().is_none());
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_brightness_steps_and_adjust_timeout() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampRequest::SetBrightness(20)).unwrap();
        let mut now = run_until(&mut scheduler, &time, ms(0), ms(1000));
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
        assert_close(scheduler.state().level(), 20.0);

        for expected in [30.0, 60.0, 90.0, 140.0, 190.0] {
            queue.sender().try_send(LampCommand::BrightnessUp).unwrap();
            now = run_until(&mut scheduler, &time, now, now + Duration::from_secs(1));
            assert_eq!(scheduler.mode(), OperatingMode::Adjust);
            assert_close(scheduler.state().level(), expected);
        }
        assert_close(scheduler.state().cct(), 6500.0);

        // Adjust mode holds for an hour after the last change
        let last_change = now - Duration::from_secs(1);
        let later = at(13, 0, 30, 3);
        let timeout = last_change + Duration::from_secs(3600);
        run_until(&mut scheduler, &later, timeout - Duration::from_secs(1), timeout - TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);

        run_until(&mut scheduler, &later, timeout, timeout + TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Ramp);

        run_until(
            &mut scheduler,
            &later,
            timeout + TICK,
            timeout + Duration::from_secs(16),
        );
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().cct(), 6500.0);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_app_steps_down() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampCommand::BrightnessDown).unwrap();
        queue.sender().try_send(LampCommand::CctDown).unwrap();
        let now = run_until(&mut scheduler, &time, ms(0), ms(1000));
        // The second request replaced the first ramp before it moved
        assert_close(scheduler.state().cct(), 5800.0);
        assert_close(scheduler.state().level(), 255.0);

        queue.sender().try_send(LampCommand::BrightnessDown).unwrap();
        run_until(&mut scheduler, &time, now, now + Duration::from_secs(1));
        assert_close(scheduler.state().level(), 185.0);
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
    }

    #[test]
    fn test_set_cct_fade_length() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampRequest::SetCct(2000)).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(1000));
        assert_eq!(scheduler.mode(), OperatingMode::Ramp);

        run_until(&mut scheduler, &time, ms(1000), ms(1600));
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
        assert_close(scheduler.state().cct(), 2000.0);
    }

    #[test]
    fn test_button_turns_lamp_on() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(ButtonAction::Up).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(600));

        assert!(scheduler.state().is_on());
        assert!(scheduler.telemetry().has("power", "true,btn"));
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_button_dims_and_reports_later() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        // The first poll only enters adjust mode, the next one is throttled
        let down = LampRequest::Button(ButtonAction::Down);
        scheduler.handle(down, ms(1000), &time);
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
        assert_close(scheduler.state().level(), 255.0);
        scheduler.handle(down, ms(1005), &time);
        assert_close(scheduler.state().level(), 255.0);
        scheduler.handle(down, ms(1010), &time);
        assert_close(scheduler.state().level(), 254.0);

        run_until(&mut scheduler, &time, ms(1010), ms(5000));
        assert!(scheduler.telemetry().payloads("brightness").is_empty());

        run_until(&mut scheduler, &time, ms(5000), ms(7000));
        assert_eq!(scheduler.telemetry().payloads("brightness"), vec!["254,btn"]);
        assert_eq!(scheduler.telemetry().payloads("color"), vec!["6500,btn"]);
    }

    #[test]
    fn test_button_up_at_full_level_warms() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampRequest::SetCct(1000)).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(2000));
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);

        let up = LampRequest::Button(ButtonAction::Up);
        scheduler.handle(up, ms(2000), &time);
        assert_close(scheduler.state().cct(), 1020.0);
        scheduler.handle(up, ms(2005), &time);
        assert_close(scheduler.state().cct(), 1020.0);
        scheduler.handle(up, ms(2015), &time);
        assert_close(scheduler.state().cct(), 1040.0);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_lowered_max_cct_pulls_back_adjusted_color() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampRequest::SetBrightness(100)).unwrap();
        let now = run_until(&mut scheduler, &time, ms(0), ms(1000));
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);

        queue.sender().try_send(LampRequest::MaxCct(5000)).unwrap();
        run_until(&mut scheduler, &time, now, now + TICK);
        assert_close(scheduler.settings().max_cct, 5000.0);
        assert_close(scheduler.state().cct(), 5000.0);
        assert_close(scheduler.state().level(), 100.0);
    }

    #[test]
    fn test_wake_alarm_fires_once_per_day() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        scheduler.init(&at(6, 59, 0, 2));

        let sender = queue.sender();
        for alarm in ["2,1,0700,1", "3,1,0700,1"] {
            let alarm = AlarmRequest::parse(alarm).unwrap();
            sender.try_send(LampRequest::WakeAlarm(alarm)).unwrap();
        }
        run_until(&mut scheduler, &at(6, 59, 0, 2), ms(0), ms(5));
        assert_eq!(scheduler.mode(), OperatingMode::Default);

        run_until(&mut scheduler, &at(7, 0, 0, 2), ms(60_000), ms(60_005));
        assert_eq!(scheduler.mode(), OperatingMode::DawnSim);
        assert_eq!(
            scheduler.program().map(|program| program.kind()),
            Some(ProgramKind::DawnSim)
        );
        assert!(scheduler.state().is_on());
        assert!(scheduler.telemetry().has("power", "true,alarm"));

        sender.try_send(LampCommand::TurnOff).unwrap();
        run_until(&mut scheduler, &at(7, 0, 1, 2), ms(61_000), ms(61_005));
        assert!(!scheduler.state().is_on());
        assert!(scheduler.telemetry().has("power", "false,web"));

        run_until(&mut scheduler, &at(7, 0, 30, 2), ms(90_000), ms(90_005));
        assert!(!scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_eq!(count(&scheduler, "power", "true,alarm"), 1);

        run_until(&mut scheduler, &at(7, 1, 0, 2), ms(120_000), ms(120_005));
        run_until(
            &mut scheduler,
            &at(7, 0, 0, 3),
            ms(86_400_000),
            ms(86_400_005),
        );
        assert_eq!(scheduler.mode(), OperatingMode::DawnSim);
        assert_eq!(count(&scheduler, "power", "true,alarm"), 2);
    }

    #[test]
    fn test_wake_alarm_needs_lamp_off() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        scheduler.init(&at(6, 59, 0, 2));

        let alarm = AlarmRequest::parse("2,1,0700,1").unwrap();
        queue.sender().try_send(LampRequest::WakeAlarm(alarm)).unwrap();
        run_until(&mut scheduler, &at(7, 0, 0, 2), ms(0), ms(100));

        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(!scheduler.telemetry().has("power", "true,alarm"));
    }

    #[test]
    fn test_bedtime_reminder_switches_lamp_off() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        scheduler.init(&at(21, 59, 0, 3));

        let alarm = AlarmRequest::parse("3,1,2200,1").unwrap();
        queue.sender().try_send(LampRequest::BedtimeAlarm(alarm)).unwrap();
        run_until(&mut scheduler, &at(21, 59, 0, 3), ms(0), ms(5));
        assert_eq!(scheduler.mode(), OperatingMode::Default);

        let mut sensors = ScriptedSensors::default();
        for elapsed in (0..80_000u32).step_by(5) {
            let seconds = elapsed / 1000;
            let time = at(
                22,
                u8::try_from(seconds / 60).unwrap(),
                u8::try_from(seconds % 60).unwrap(),
                3,
            );
            scheduler.tick(ms(1000 + u64::from(elapsed)), &time, &mut sensors);

            if elapsed == 0 {
                assert_eq!(scheduler.mode(), OperatingMode::Bedtime);
            }
            if elapsed == 30_000 {
                assert_eq!(scheduler.mode(), OperatingMode::Bedtime);
                assert_close(scheduler.state().level(), 25.0);
                assert_close(scheduler.state().cct(), 300.0);
            }
        }

        assert!(!scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.program().is_none());
        assert!(scheduler.telemetry().has("power", "false,bed"));
    }

    #[test]
    fn test_demo_plays_and_returns_to_default() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampCommand::DemoOn).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(20_000));
        assert_eq!(scheduler.mode(), OperatingMode::Demo);

        run_until(&mut scheduler, &time, ms(20_000), ms(50_000));
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.program().is_none());
        assert_close(scheduler.state().cct(), 6500.0);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_turn_off_aborts_program() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampCommand::DemoOn).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(3000));
        queue.sender().try_send(LampCommand::TurnOff).unwrap();
        run_until(&mut scheduler, &time, ms(3000), ms(3010));

        assert!(!scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.program().is_none());
    }

    #[test]
    fn test_presence_switches_lamp() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        let presence = PresenceRequest::parse("1,1,001,0").unwrap();
        queue.sender().try_send(LampRequest::Presence(presence)).unwrap();

        let mut sensors = ScriptedSensors::default();
        let now = run(&mut scheduler, &mut sensors, &time, ms(0), ms(61_000), TICK);
        assert!(scheduler.is_presence_allowed());
        assert!(!scheduler.state().is_on());

        sensors.motion = true;
        let now = run(&mut scheduler, &mut sensors, &time, now, ms(63_000), TICK);
        assert!(scheduler.state().is_on());
        assert!(scheduler.telemetry().has("power", "true,pir"));
        assert!(scheduler.telemetry().has("sensor", "pir,true"));

        // One minute hold after the last motion
        sensors.motion = false;
        let now = run(&mut scheduler, &mut sensors, &time, now, ms(122_000), TICK);
        assert!(scheduler.state().is_on());

        run(&mut scheduler, &mut sensors, &time, now, ms(124_000), TICK);
        assert!(!scheduler.state().is_on());
        assert!(scheduler.telemetry().has("power", "false,pir"));
    }

    #[test]
    fn test_manual_turn_off_blocks_presence() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        let presence = PresenceRequest::parse("1,0,001,0").unwrap();
        queue.sender().try_send(LampRequest::Presence(presence)).unwrap();

        let mut sensors = ScriptedSensors::default();
        let now = run(&mut scheduler, &mut sensors, &time, ms(0), ms(61_000), TICK);
        sensors.motion = true;
        let now = run(&mut scheduler, &mut sensors, &time, now, ms(70_000), TICK);
        assert!(scheduler.state().is_on());

        queue.sender().try_send(LampCommand::TurnOff).unwrap();
        let now = run(&mut scheduler, &mut sensors, &time, now, ms(129_000), TICK);
        assert!(!scheduler.state().is_on());

        run(&mut scheduler, &mut sensors, &time, now, ms(131_000), TICK);
        assert!(scheduler.state().is_on());
        assert_eq!(count(&scheduler, "power", "true,pir"), 2);
    }

    #[test]
    fn test_presence_window_gates_switching() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);

        let presence = PresenceRequest::parse("1,1,001,1,1950,2010").unwrap();
        queue.sender().try_send(LampRequest::Presence(presence)).unwrap();

        let mut sensors = ScriptedSensors {
            motion: true,
            ..ScriptedSensors::default()
        };
        run(&mut scheduler, &mut sensors, &time, ms(0), ms(65_000), TICK);
        assert!(!scheduler.is_presence_allowed());
        assert!(!scheduler.state().is_on());
    }

    #[test]
    fn test_ambient_light_lowers_brightness() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let ambient = AmbientRequest::parse("1,16").unwrap();
        queue.sender().try_send(LampRequest::Ambient(ambient)).unwrap();

        let mut sensors = ScriptedSensors {
            ambient: 1600,
            ..ScriptedSensors::default()
        };
        let now = run(&mut scheduler, &mut sensors, &time, ms(0), ms(1_500), TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Ramp);

        run(&mut scheduler, &mut sensors, &time, now, ms(15_000), TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        // 255 - (1600 - lamp interference) / 16
        assert_close(scheduler.state().level(), 158.849);
        assert_close(scheduler.state().cct(), 6500.0);
    }

    #[test]
    fn test_ambient_disabled_keeps_schedule() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let mut sensors = ScriptedSensors {
            ambient: 1600,
            ..ScriptedSensors::default()
        };
        run(&mut scheduler, &mut sensors, &time, ms(0), ms(15_000), TICK);
        assert!(scheduler.ambient_estimate().adjusted.is_some());
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_debug_telemetry_is_gated() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let sender = queue.sender();
        sender.send_code(0x42).unwrap();
        sender.try_send(LampRequest::PublishSchedule).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(5));
        assert!(scheduler.telemetry().payloads("debug").is_empty());

        sender.try_send(LampRequest::TelemetryDebug(true)).unwrap();
        sender.send_code(0x42).unwrap();
        sender.try_send(LampRequest::PublishSchedule).unwrap();
        run_until(&mut scheduler, &time, ms(5), ms(10));

        let debug = scheduler.telemetry().payloads("debug");
        assert_eq!(debug[0], "Unknown command received: 0x42");
        assert!(debug[1].starts_with("CCT Schedule: 300 300 300"));
        assert!(debug[2].starts_with("Brightness Schedule: 10 10 10"));
        // Label plus all 24 hourly values
        assert_eq!(debug[1].split_whitespace().count(), 26);
        assert_eq!(debug[2].split_whitespace().count(), 26);
    }

    #[test]
    fn test_disconnected_sink_drops_reports() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_off());
        let time = noon();
        scheduler.init(&time);
        scheduler.telemetry_mut().connected = false;

        queue.sender().try_send(LampCommand::TurnOn).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(5));

        assert!(scheduler.state().is_on());
        assert!(scheduler.telemetry().published.is_empty());
    }

    #[test]
    fn test_diagnostic_channel_write() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        scheduler.handle(
            LampRequest::Diagnostic {
                channel: 2,
                value: 99,
            },
            ms(0),
            &time,
        );
        scheduler.handle(
            LampRequest::Diagnostic {
                channel: 7,
                value: 1,
            },
            ms(0),
            &time,
        );
        assert_eq!(scheduler.output().driver().channel_writes, vec![(2, 99)]);
    }

    #[test]
    fn test_settings_requests_are_stored() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let sender = queue.sender();
        sender.try_send(LampRequest::AdjustHold(5)).unwrap();
        sender.try_send(LampRequest::SelectSchedule(2)).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(5));

        let settings = scheduler.settings();
        assert_eq!(settings.adjust_hold, Duration::from_secs(5 * 60));
        assert_eq!(settings.schedule_slot, ScheduleSlot::Custom2);
        assert_eq!(scheduler.store().as_bytes()[0x004], 5);
    }

    #[test]
    fn test_app_steps_cct_up() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue.sender().try_send(LampRequest::SetCct(3000)).unwrap();
        let mut now = run_until(&mut scheduler, &time, ms(0), ms(2000));
        assert_close(scheduler.state().cct(), 3000.0);

        // +1000 until within 1500K of the max, then straight to the max
        for expected in [4000.0, 5000.0, 6000.0, 6500.0] {
            queue.sender().try_send(LampCommand::CctUp).unwrap();
            now = run_until(&mut scheduler, &time, now, now + Duration::from_secs(1));
            assert_eq!(scheduler.mode(), OperatingMode::Adjust);
            assert_close(scheduler.state().cct(), expected);
        }

        queue.sender().try_send(LampCommand::CctUp).unwrap();
        run_until(&mut scheduler, &time, now, now + TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
        assert_close(scheduler.state().cct(), 6500.0);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_cct_button_target_steps_color() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        queue
            .sender()
            .try_send(LampRequest::ButtonTarget(ButtonTarget::Cct))
            .unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(5));

        let down = LampRequest::Button(ButtonAction::Down);
        let up = LampRequest::Button(ButtonAction::Up);
        scheduler.handle(down, ms(1000), &time);
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);
        assert_close(scheduler.state().cct(), 6500.0);

        scheduler.handle(down, ms(1015), &time);
        assert_close(scheduler.state().cct(), 6480.0);
        scheduler.handle(down, ms(1020), &time);
        assert_close(scheduler.state().cct(), 6480.0);
        scheduler.handle(down, ms(1030), &time);
        assert_close(scheduler.state().cct(), 6460.0);
        assert_close(scheduler.state().level(), 255.0);

        // Up stops at the max CCT
        scheduler.handle(up, ms(1045), &time);
        scheduler.handle(up, ms(1060), &time);
        assert_close(scheduler.state().cct(), 6500.0);
        scheduler.handle(up, ms(1075), &time);
        assert_close(scheduler.state().cct(), 6500.0);

        run_until(&mut scheduler, &time, ms(1075), ms(7000));
        assert_eq!(scheduler.telemetry().payloads("color"), vec!["6500,btn"]);
        assert_eq!(scheduler.telemetry().payloads("brightness"), vec!["255,btn"]);
    }

    #[test]
    fn test_cct_button_target_stops_at_min_cct() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let sender = queue.sender();
        sender.try_send(LampRequest::ButtonTarget(ButtonTarget::Cct)).unwrap();
        sender.try_send(LampRequest::SetCct(310)).unwrap();
        run_until(&mut scheduler, &time, ms(0), ms(2000));
        assert_eq!(scheduler.mode(), OperatingMode::Adjust);

        let down = LampRequest::Button(ButtonAction::Down);
        scheduler.handle(down, ms(2000), &time);
        assert_close(scheduler.state().cct(), 300.0);
        scheduler.handle(down, ms(2100), &time);
        assert_close(scheduler.state().cct(), 300.0);

        // Back to brightness: the same button dims again
        scheduler.handle(
            LampRequest::ButtonTarget(ButtonTarget::Brightness),
            ms(2200),
            &time,
        );
        scheduler.handle(down, ms(2300), &time);
        assert_close(scheduler.state().cct(), 300.0);
        assert_close(scheduler.state().level(), 254.0);
    }

    #[test]
    fn test_ambient_toggle_ramps_to_new_target() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        let time = noon();
        scheduler.init(&time);

        let mut sensors = ScriptedSensors {
            ambient: 1600,
            ..ScriptedSensors::default()
        };
        let now = run(&mut scheduler, &mut sensors, &time, ms(0), ms(2_000), TICK);
        assert!(scheduler.ambient_estimate().adjusted.is_some());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().level(), 255.0);

        let enable = AmbientRequest::parse("1,16").unwrap();
        queue.sender().try_send(LampRequest::Ambient(enable)).unwrap();
        let now = run(&mut scheduler, &mut sensors, &time, now, now + TICK, TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Ramp);

        let now = run(&mut scheduler, &mut sensors, &time, now, ms(3_000), TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().level(), 158.849);

        let disable = AmbientRequest::parse("0,16").unwrap();
        queue.sender().try_send(LampRequest::Ambient(disable)).unwrap();
        run(&mut scheduler, &mut sensors, &time, now, ms(4_000), TICK);
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert_close(scheduler.state().level(), 255.0);
    }

    #[test]
    fn test_bedtime_alarm_fires_once_per_day() {
        let queue = RequestQueue::new();
        let mut scheduler = scheduler(&queue, RecordingDriver::lamp_on());
        scheduler.init(&at(21, 59, 0, 3));

        let sender = queue.sender();
        for alarm in ["3,1,2200,1", "4,1,2200,1"] {
            let alarm = AlarmRequest::parse(alarm).unwrap();
            sender.try_send(LampRequest::BedtimeAlarm(alarm)).unwrap();
        }
        run_until(&mut scheduler, &at(21, 59, 0, 3), ms(0), ms(5));

        run_until(&mut scheduler, &at(22, 0, 0, 3), ms(60_000), ms(60_005));
        assert_eq!(scheduler.mode(), OperatingMode::Bedtime);

        sender.try_send(LampCommand::TurnOff).unwrap();
        run_until(&mut scheduler, &at(22, 0, 5, 3), ms(65_000), ms(65_005));
        assert!(!scheduler.state().is_on());

        // Switched back on within the alarm minute
        sender.try_send(LampCommand::TurnOn).unwrap();
        run_until(&mut scheduler, &at(22, 0, 10, 3), ms(70_000), ms(71_000));
        run_until(&mut scheduler, &at(22, 0, 30, 3), ms(90_000), ms(90_005));
        assert!(scheduler.state().is_on());
        assert_eq!(scheduler.mode(), OperatingMode::Default);
        assert!(scheduler.program().is_none());

        run_until(&mut scheduler, &at(22, 1, 0, 3), ms(120_000), ms(120_005));
        run_until(
            &mut scheduler,
            &at(22, 0, 0, 4),
            ms(86_460_000),
            ms(86_460_005),
        );
        assert_eq!(scheduler.mode(), OperatingMode::Bedtime);
        assert_eq!(
            scheduler.program().map(|program| program.kind()),
            Some(ProgramKind::Bedtime)
        );
    }
}
