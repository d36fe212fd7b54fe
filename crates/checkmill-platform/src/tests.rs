#[cfg(test)]
mod tests {
    use checkmill_core::{ConfigError, Size, Vec2};
    use checkmill_ui::{
        CellAddress, CheckMill, ClickEvent, DeltaMode, EngineConfig, EventFlow, InputEvent,
        PointerEventKind,
    };

    use crate::headless::HeadlessHost;
    use crate::runner::{Fling, RunOptions, run_headless};

    const FRAME: f64 = 40.0;

    fn start() -> (HeadlessHost, CheckMill) {
        let host = HeadlessHost::new(Size::new(800.0, 600.0));
        let mill = CheckMill::new(host.host(), EngineConfig::default()).unwrap();
        (host, mill)
    }

    /// Pumps `n` frames `FRAME` ms apart, returning the last timestamp.
    fn run(host: &HeadlessHost, mill: &CheckMill, from: f64, n: u32) -> f64 {
        let mut now = from;
        for _ in 0..n {
            now += FRAME;
            host.pump(mill, now);
        }
        now
    }

    fn position(mill: &CheckMill) -> (f64, f64, i64, f64) {
        mill.with_app(|app| {
            (
                app.motion.current,
                app.motion.velocity,
                app.loop_state.iteration,
                app.geometry.range(),
            )
        })
        .unwrap()
    }

    fn at(y: f64) -> Vec2 {
        Vec2::new(400.0, y)
    }

    #[test]
    fn test_start_requests_a_frame_and_connects() {
        let (host, mill) = start();
        assert!(mill.is_running());
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.layout_writes(), 1);
        assert_eq!(host.observer_count(), 1);
        assert!(host.is_connected());
        assert_eq!(host.connects(), 1);
    }

    #[test]
    fn test_visible_slides_get_hydrated() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        assert!(host.hydrated().is_empty());

        run(&host, &mill, 0.0, 10);

        let hydrated = host.hydrated();
        assert!(!hydrated.is_empty());
        let total_pages = mill.with_app(|app| app.geometry.total_pages).unwrap();
        for (id, page) in hydrated {
            assert!(page < total_pages);
            let state = host.container(id).unwrap();
            assert!(state.mounted);
            assert!(!state.checked.is_empty());
        }
    }

    #[test]
    fn test_fling_keeps_moving_after_release_then_rests() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);

        host.pointer(PointerEventKind::Down, at(400.0), 100.0);
        host.pointer(PointerEventKind::Move, at(390.0), 110.0);
        host.pointer(PointerEventKind::Move, at(380.0), 120.0);
        host.pointer(PointerEventKind::Up, at(380.0), 125.0);

        let now = run(&host, &mill, 0.0, 1);
        let (current, velocity, _, _) = position(&mill);
        assert!(velocity < 0.0);
        assert!(current < -20.0);

        run(&host, &mill, now, 150);
        let (current, velocity, iteration, range) = position(&mill);
        assert_eq!(velocity, 0.0);
        let travelled = current - iteration as f64 * range;
        assert!(travelled < -200.0, "travelled {travelled}");
        assert!((-range..=0.0).contains(&current));
    }

    #[test]
    fn test_dragging_past_the_range_wraps_around() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        let (_, _, _, range) = position(&mill);

        host.pointer(PointerEventKind::Down, at(0.0), 0.0);
        host.pointer(PointerEventKind::Move, at(-(range + 50.0)), 10.0);
        host.pointer(PointerEventKind::Up, at(-(range + 50.0)), 20.0);
        host.pump(&mill, 20.0);

        let (current, velocity, iteration, _) = position(&mill);
        assert_eq!(velocity, 0.0);
        assert_eq!(iteration, 1);
        assert!((current + 50.0).abs() < 1e-6, "current {current}");
    }

    #[test]
    fn test_scrolling_flag_follows_the_drag() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);

        host.pointer(PointerEventKind::Down, at(300.0), 0.0);
        host.pointer(PointerEventKind::Move, at(250.0), 10.0);
        host.pump(&mill, FRAME);
        assert!(host.is_scrolling());

        host.pointer(PointerEventKind::Up, at(250.0), 20.0);
        host.pump(&mill, 2.0 * FRAME);
        assert!(!host.is_scrolling());
    }

    #[test]
    fn test_wheel_pushes_content_against_the_wheel() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);

        let flow = host.wheel(3.0, DeltaMode::Line, 0.0);
        assert!(flow.contains(EventFlow::PREVENT_DEFAULT));
        run(&host, &mill, 0.0, 2);

        let (current, velocity, _, _) = position(&mill);
        assert!(velocity < 0.0);
        assert!(current < 0.0);

        // The wheel kick is drained once; later frames only decay it.
        let now = run(&host, &mill, 2.0 * FRAME, 1);
        let (_, decayed, _, _) = position(&mill);
        assert!(decayed < 0.0);
        assert!(decayed.abs() < velocity.abs(), "{decayed} vs {velocity}");

        run(&host, &mill, now, 1);
        let (_, later, _, _) = position(&mill);
        assert!(later <= 0.0);
        assert!(later.abs() < decayed.abs(), "{later} vs {decayed}");
    }

    #[test]
    fn test_click_toggles_the_cell_and_refreshes_the_slide() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        let now = run(&host, &mill, 0.0, 10);

        let (container, page) = host.hydrated()[0];
        let ips = mill.with_app(|app| app.items_per_slide()).unwrap();
        let index = page * ips + 3;

        host.click(container, 3, now);
        let now = run(&host, &mill, now, 1);
        assert!(mill.with_app(|app| app.board.has(index)).unwrap());
        assert!(host.container(container).unwrap().checked[3]);

        host.click(container, 3, now);
        run(&host, &mill, now, 1);
        assert!(!mill.with_app(|app| app.board.has(index)).unwrap());
        assert!(!host.container(container).unwrap().checked[3]);
    }

    #[test]
    fn test_click_on_an_unaddressable_page_is_ignored() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        let now = run(&host, &mill, 0.0, 2);

        host.dispatch(InputEvent::Click(ClickEvent {
            target: Some(CellAddress {
                page: u64::MAX / 2,
                cell: 0,
            }),
            timestamp: now,
        }));
        run(&host, &mill, now, 1);

        assert!(mill.is_running());
        assert_eq!(mill.with_app(|app| app.board.checked_count()).unwrap(), 0);
    }

    #[test]
    fn test_click_right_after_a_drag_does_not_toggle() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        let now = run(&host, &mill, 0.0, 10);
        let (container, _) = host.hydrated()[0];

        host.pointer(PointerEventKind::Down, at(300.0), now);
        host.pointer(PointerEventKind::Move, at(280.0), now + 10.0);
        host.pointer(PointerEventKind::Up, at(280.0), now + 20.0);
        let flow = host.click(container, 0, now + 21.0);
        assert!(flow.contains(EventFlow::STOP_PROPAGATION));

        run(&host, &mill, now, 1);
        assert_eq!(mill.with_app(|app| app.board.checked_count()).unwrap(), 0);
    }

    #[test]
    fn test_resize_rebuilds_systems_and_keeps_the_board() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        let now = run(&host, &mill, 0.0, 10);
        let listeners = host.listener_count();

        let (container, page) = host.hydrated()[0];
        let ips = mill.with_app(|app| app.items_per_slide()).unwrap();
        host.click(container, 0, now);
        let now = run(&host, &mill, now, 1);

        host.resize(Size::new(1200.0, 900.0));
        let now = run(&host, &mill, now, 1);
        assert_eq!(host.layout_writes(), 2);
        assert_eq!(host.listener_count(), listeners);
        assert_eq!(host.observer_count(), 1);
        assert_eq!(host.connects(), 1);
        let total = mill.with_app(|app| app.geometry.total).unwrap();
        assert_eq!(host.containers().len(), total);

        // Same toggle count, so the board carries over even though the grid changed.
        assert!(mill.with_app(|app| app.board.has(page * ips)).unwrap());

        // A second resize inside the throttle window waits.
        host.resize(Size::new(1000.0, 700.0));
        let now = run(&host, &mill, now, 1);
        assert_eq!(host.layout_writes(), 2);
        run(&host, &mill, now, 8);
        assert_eq!(host.layout_writes(), 3);
    }

    #[test]
    fn test_hidden_page_stops_the_loop() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);

        host.set_hidden(true);
        assert!(!mill.is_running());
        assert_eq!(host.pending_frames(), 0);
        assert!(host.pump(&mill, FRAME).is_none());

        host.set_hidden(false);
        assert!(mill.is_running());
        let report = host.pump(&mill, 10_000.0).unwrap();
        assert_eq!(report.frame_time, 0.0);
    }

    #[test]
    fn test_missing_mount_point_is_an_error() {
        let host = HeadlessHost::new(Size::new(800.0, 600.0));
        host.detach();
        let err = CheckMill::new(host.host(), EngineConfig::default()).err();
        assert!(matches!(err, Some(ConfigError::MissingRenderContext)));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_runaway_friction_is_rejected() {
        let host = HeadlessHost::new(Size::new(800.0, 600.0));
        let config = EngineConfig {
            friction: 1.5,
            ..EngineConfig::default()
        };
        let err = CheckMill::new(host.host(), config).err();
        assert!(matches!(
            err,
            Some(ConfigError::InvalidEngineSetting { name: "friction", .. })
        ));
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let (host, mill) = start();
        run(&host, &mill, 0.0, 3);

        mill.destroy();
        assert!(!mill.is_running());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.observer_count(), 0);
        assert!(!host.is_connected());
        assert!(mill.with_app(|_| ()).is_none());
    }

    #[test]
    fn test_stats_count_frames_and_updates() {
        let (host, mill) = start();
        host.pump(&mill, 0.0);
        run(&host, &mill, 0.0, 5);

        let stats = mill.stats();
        assert_eq!(stats.frames, 6);
        // 200 ms at 60 Hz, give or take float rounding on the last step.
        assert!((11..=12).contains(&stats.updates), "updates {}", stats.updates);
        assert!(stats.smoothed_frame_ms >= 0.0);
    }

    #[test]
    fn test_run_headless_reports_the_session() {
        let summary = run_headless(
            EngineConfig::default(),
            &RunOptions {
                frames: 120,
                fling: Some(Fling::default()),
                ..RunOptions::default()
            },
        )
        .unwrap();
        assert_eq!(summary.frames, 121);
        assert!(summary.updates > 0);
        assert!(summary.position != 0.0 || summary.iteration != 0);
        assert!(!summary.hydrated_pages.is_empty());
    }

    #[test]
    fn test_run_options_parse_partial_json() {
        let options: RunOptions = serde_json::from_str(r#"{ "frames": 10, "fling": null }"#).unwrap();
        assert_eq!(options.frames, 10);
        assert!(options.fling.is_none());
        assert_eq!(options.viewport, Size::new(800.0, 600.0));
    }

    #[test]
    fn test_run_headless_rejects_bad_interval() {
        let options = RunOptions {
            frame_interval_ms: 0.0,
            ..RunOptions::default()
        };
        assert!(run_headless(EngineConfig::default(), &options).is_err());
    }
}
