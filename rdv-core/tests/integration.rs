//! Integration tests: session lifecycle against a scripted engine, with
//! the frame pump running on its real thread.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FILL, FakeEngine, Recorded, RecordingTarget, wait_until};
use rdv_core::render::{RenderLoopState, TickOutcome};
use rdv_core::{
    Credentials, EngineError, FramePump, PixelFormat, PumpConfig, Rect, ScaleMode,
    SessionController, SessionError, SessionMode, SessionStatus, SoftwareTarget, StopOutcome,
    SurfaceBinder, SurfaceEvent,
};
use tokio_test::{assert_err, assert_ok};

// ── Helpers ──────────────────────────────────────────────────────

fn fast_config() -> PumpConfig {
    PumpConfig {
        tick: Duration::from_millis(2),
        ..PumpConfig::default()
    }
}

fn controller(engine: &Arc<FakeEngine>, config: PumpConfig) -> SessionController {
    let surface = Arc::new(SurfaceBinder::new(config.scale_mode));
    SessionController::new(engine.clone(), surface, config)
}

fn creds() -> Credentials {
    Credentials::new("secret")
}

fn attach(surface: &SurfaceBinder, recorded: &Arc<Recorded>, width: u32, height: u32) {
    surface.apply(SurfaceEvent::Created(RecordingTarget::boxed(recorded)));
    surface.apply(SurfaceEvent::Changed {
        width,
        height,
        format: PixelFormat::Rgba8,
    });
}

// ── Start ────────────────────────────────────────────────────────

#[test]
fn empty_id_is_rejected_without_engine_calls() {
    let engine = FakeEngine::steady(4, 4);
    let mut ctl = controller(&engine, fast_config());

    let err = ctl
        .start("", creds(), SessionMode::Interactive)
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidId));
    assert_eq!(engine.total_calls(), 0);
    assert_eq!(ctl.current_status(), SessionStatus::Idle);
    assert_eq!(ctl.stop(), StopOutcome::NoSession);
    assert_eq!(engine.total_calls(), 0);
}

#[test]
fn missing_link_terminates_without_spawning_pump() {
    let engine = FakeEngine::steady(4, 4);
    engine.lose_link();
    let mut ctl = controller(&engine, fast_config());

    let err = ctl
        .start("123456789", creds(), SessionMode::Interactive)
        .unwrap_err();
    assert!(matches!(err, SessionError::LinkMissing(_)));
    assert!(err.to_string().contains("link"));
    assert_eq!(ctl.current_status(), SessionStatus::Terminated);
    assert!(!ctl.is_pumping());

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(FakeEngine::count(&engine.queries), 0);
    assert_eq!(FakeEngine::count(&engine.fetches), 0);
}

#[test]
fn engine_rejection_is_surfaced() {
    let engine = FakeEngine::steady(4, 4);
    engine.fail_start_with(EngineError::Rejected("unknown peer".into()));
    let mut ctl = controller(&engine, fast_config());

    let err = assert_err!(ctl.start("987", creds(), SessionMode::FileTransfer));
    assert!(matches!(err, SessionError::EngineStartFailure(_)));
    assert_eq!(ctl.current_status(), SessionStatus::Terminated);

    // The failed session is still released exactly once.
    assert_eq!(ctl.stop(), StopOutcome::Stopped);
    assert_eq!(ctl.stop(), StopOutcome::NoSession);
    assert_eq!(FakeEngine::count(&engine.stops), 1);
}

#[test]
fn second_start_while_active_is_rejected() {
    let engine = FakeEngine::steady(4, 4);
    let mut ctl = controller(&engine, fast_config());

    assert_ok!(ctl.start("111", creds(), SessionMode::Interactive));
    let err = assert_err!(ctl.start("222", creds(), SessionMode::Interactive));
    assert!(matches!(err, SessionError::AlreadyActive(ref id) if id == "111"));
    assert_eq!(FakeEngine::count(&engine.starts), 1);
    assert_eq!(ctl.session_id(), Some("111"));

    ctl.stop();
}

// ── Rendering ────────────────────────────────────────────────────

#[test]
fn active_session_composites_fetched_frames() {
    let engine = FakeEngine::steady(8, 4);
    let mut ctl = controller(&engine, fast_config());

    let target = SoftwareTarget::new(16, 8);
    let canvas = target.front();
    ctl.surface().apply(SurfaceEvent::Created(Box::new(target)));

    assert_ok!(ctl.start("123456789", creds(), SessionMode::Interactive));
    assert_eq!(ctl.current_status(), SessionStatus::Active);
    assert_eq!(ctl.mode(), Some(SessionMode::Interactive));

    assert!(wait_until(Duration::from_secs(2), || ctl.frames_rendered() >= 3));
    {
        let canvas = canvas.lock().unwrap();
        assert!(canvas.posted >= 3);
        assert_eq!(canvas.pixel(15, 7), Some(&[FILL; 4][..]));
    }

    assert_eq!(ctl.stop(), StopOutcome::Stopped);
    assert_eq!(ctl.current_status(), SessionStatus::Terminated);

    // The pump thread has exited: the engine sees no more fetches.
    let fetched = FakeEngine::count(&engine.fetches);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(FakeEngine::count(&engine.fetches), fetched);
    assert_eq!(FakeEngine::count(&engine.stops), 1);
}

#[test]
fn frames_are_dropped_without_a_surface() {
    let engine = FakeEngine::steady(4, 4);
    let mut ctl = controller(&engine, fast_config());

    assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));
    assert!(wait_until(Duration::from_secs(2), || {
        FakeEngine::count(&engine.fetches) >= 5
    }));
    assert_eq!(ctl.frames_rendered(), 0);
    ctl.stop();
}

// ── Stop ─────────────────────────────────────────────────────────

#[test]
fn stop_is_idempotent() {
    let engine = FakeEngine::steady(4, 4);
    let mut ctl = controller(&engine, fast_config());

    assert_eq!(ctl.stop(), StopOutcome::NoSession);
    assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));
    assert_eq!(ctl.stop(), StopOutcome::Stopped);
    assert_eq!(ctl.stop(), StopOutcome::NoSession);
    assert_eq!(ctl.stop(), StopOutcome::NoSession);

    assert_eq!(FakeEngine::count(&engine.stops), 1);
    assert_eq!(ctl.current_status(), SessionStatus::Terminated);
}

#[test]
fn stop_releases_engine_after_termination_timeout() {
    let engine = FakeEngine::steady(4, 4);
    engine.delay_fetch(Duration::from_millis(500));
    let config = PumpConfig {
        join_timeout: Duration::from_millis(50),
        ..fast_config()
    };
    let mut ctl = controller(&engine, config);

    assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));
    assert!(wait_until(Duration::from_secs(2), || {
        FakeEngine::count(&engine.fetches) >= 1
    }));

    let outcome = ctl.stop();
    assert_eq!(
        outcome,
        StopOutcome::TerminationTimeout(Duration::from_millis(50))
    );
    assert_eq!(FakeEngine::count(&engine.stops), 1);
    assert_eq!(ctl.current_status(), SessionStatus::Terminated);
    assert_eq!(ctl.stop(), StopOutcome::NoSession);
    assert_eq!(FakeEngine::count(&engine.stops), 1);
}

#[test]
fn dropping_controller_stops_session() {
    let engine = FakeEngine::steady(4, 4);
    {
        let mut ctl = controller(&engine, fast_config());
        assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));
    }
    assert_eq!(FakeEngine::count(&engine.stops), 1);
}

// ── Link loss ────────────────────────────────────────────────────

#[test]
fn link_loss_terminates_session_and_next_start_reaps_it() {
    let engine = FakeEngine::steady(4, 4);
    let mut ctl = controller(&engine, fast_config());
    let mut status = ctl.status();

    assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));
    assert!(wait_until(Duration::from_secs(2), || {
        FakeEngine::count(&engine.fetches) >= 2
    }));

    engine.lose_link();
    assert!(wait_until(Duration::from_secs(2), || {
        ctl.current_status() == SessionStatus::Terminated
    }));
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), SessionStatus::Terminated);
    assert!(!ctl.is_pumping());

    // The next start releases the dead session before trying again.
    assert_eq!(FakeEngine::count(&engine.stops), 0);
    let err = assert_err!(ctl.start("456", creds(), SessionMode::Interactive));
    assert!(matches!(err, SessionError::LinkMissing(_)));
    assert_eq!(FakeEngine::count(&engine.stops), 1);
}

// ── Surface lifecycle ────────────────────────────────────────────

#[test]
fn surface_recreated_with_same_size_resumes_without_reallocation() {
    let engine = FakeEngine::steady(800, 600);
    let surface = Arc::new(SurfaceBinder::new(ScaleMode::Stretch));
    let state = Arc::new(RenderLoopState::running());
    let mut pump = FramePump::new(
        engine.clone(),
        "123",
        Arc::clone(&surface),
        state,
        &PumpConfig::default(),
    );

    let first = Arc::new(Recorded::default());
    attach(&surface, &first, 1080, 2340);
    for _ in 0..3 {
        assert_eq!(pump.tick().unwrap(), TickOutcome::Composited);
    }
    assert_eq!(pump.frames().generation(), 1);

    surface.apply(SurfaceEvent::Destroyed);
    for _ in 0..2 {
        assert_eq!(pump.tick().unwrap(), TickOutcome::Dropped);
    }
    assert_eq!(FakeEngine::count(&engine.fetches), 5);
    assert_eq!(FakeEngine::count(&first.commits), 3);

    let second = Arc::new(Recorded::default());
    attach(&surface, &second, 1080, 2340);
    assert_eq!(pump.tick().unwrap(), TickOutcome::Composited);
    assert_eq!(pump.frames().generation(), 1);
    assert_eq!(FakeEngine::count(&second.commits), 1);
    assert_eq!(FakeEngine::count(&first.begins), 3);
}

#[test]
fn resolution_change_reallocates_at_first_changed_tick() {
    let mut script = vec![(1_920_000, 800, 600); 5];
    script.push((3_145_728, 1024, 768));
    let engine = FakeEngine::scripted(script);
    let surface = Arc::new(SurfaceBinder::new(ScaleMode::Stretch));
    let recorded = Arc::new(Recorded::default());
    attach(&surface, &recorded, 1080, 2340);

    let mut pump = FramePump::new(
        engine.clone(),
        "123",
        surface,
        Arc::new(RenderLoopState::running()),
        &PumpConfig::default(),
    );

    for tick in 1..=5 {
        pump.tick().unwrap();
        assert_eq!(pump.frames().generation(), 1, "tick {tick}");
    }
    pump.tick().unwrap();
    assert_eq!(pump.frames().generation(), 2);
    assert_eq!(pump.frames().buffer().capacity(), 3_145_728);
    assert_eq!(
        *recorded.last_dst.lock().unwrap(),
        Some(Rect::sized(1080, 2340))
    );
}

#[test]
fn toggling_surface_under_running_pump_never_crashes() {
    let engine = FakeEngine::steady(16, 16);
    let config = PumpConfig {
        tick: Duration::from_millis(1),
        ..PumpConfig::default()
    };
    let mut ctl = controller(&engine, config);
    let surface = ctl.surface();

    assert_ok!(ctl.start("123", creds(), SessionMode::Interactive));

    let recorded = Arc::new(Recorded::default());
    let toggler = std::thread::spawn(move || {
        for i in 0..200u32 {
            attach(&surface, &recorded, 100 + i % 3, 100);
            std::thread::yield_now();
            surface.apply(SurfaceEvent::Destroyed);
        }
        recorded
    });
    let recorded = toggler.join().unwrap();

    assert_eq!(ctl.stop(), StopOutcome::Stopped);
    assert_eq!(
        FakeEngine::count(&recorded.begins),
        FakeEngine::count(&recorded.commits)
    );
}
