//! Remote desktop viewer entry point.
//!
//! ```text
//! rdv-viewer --id <peer>                   Open an interactive session
//! rdv-viewer --id <peer> --file-transfer   Open a file-transfer session
//! rdv-viewer --config <path>               Use custom config TOML
//! rdv-viewer --gen-config                  Write default config and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rdv_core::engine::boundary;
use rdv_core::{
    Credentials, Engine, NativeEngine, PixelFormat, SessionController, SessionMode, SessionStatus,
    SoftwareTarget, StopOutcome, SurfaceBinder, SurfaceEvent,
};

use rdv_viewer::config::ViewerConfig;

type BoxError = Box<dyn std::error::Error>;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rdv-viewer", about = "Remote desktop viewer")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rdv-viewer.toml")]
    config: PathBuf,

    /// Remote peer id (overrides config).
    #[arg(short, long)]
    id: Option<String>,

    /// Session password.
    #[arg(short, long)]
    password: Option<String>,

    /// Open a file-transfer session instead of an interactive one.
    #[arg(long)]
    file_transfer: bool,

    /// Render into an in-memory canvas instead of a window.
    #[arg(long)]
    headless: bool,

    /// Write the default configuration to `--config` and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    if cli.gen_config {
        ViewerConfig::write_default(&cli.config)?;
        println!("wrote default config to {}", cli.config.display());
        return Ok(());
    }

    let mut config = ViewerConfig::load(&cli.config);
    if let Some(id) = cli.id {
        config.session.remote_id = id;
    }
    if cli.file_transfer {
        config.session.mode = SessionMode::FileTransfer;
    }
    if cli.headless {
        config.display.headless = true;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rdv-viewer v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Load the engine ──────────────────────────────────────

    let engine = boundary::install(Arc::new(NativeEngine::new())).inspect_err(|e| {
        error!("failed to load engine: {e}");
    })?;

    // ── 2. Session controller ───────────────────────────────────

    let surface = Arc::new(SurfaceBinder::new(config.render.scale_mode));
    let controller =
        SessionController::new(Arc::clone(&engine), surface, config.to_pump_config());
    let credentials = Credentials::from(cli.password);

    // ── 3. Render until the session ends ────────────────────────

    run(controller, engine, &config, credentials).await
}

#[cfg(target_os = "windows")]
async fn run(
    controller: SessionController,
    engine: Arc<dyn Engine>,
    config: &ViewerConfig,
    credentials: Credentials,
) -> Result<(), BoxError> {
    if config.display.headless {
        run_headless(controller, config, credentials).await
    } else {
        run_windowed(controller, engine, config, credentials).await
    }
}

#[cfg(not(target_os = "windows"))]
async fn run(
    controller: SessionController,
    _engine: Arc<dyn Engine>,
    config: &ViewerConfig,
    credentials: Credentials,
) -> Result<(), BoxError> {
    if !config.display.headless {
        info!("no native window on this platform; rendering headless");
    }
    run_headless(controller, config, credentials).await
}

// ── Session start / stop ─────────────────────────────────────────

/// Start the configured session.
fn open(
    controller: &mut SessionController,
    config: &ViewerConfig,
    credentials: Credentials,
) -> Result<(), BoxError> {
    let id = config.session.remote_id.clone();
    if let Err(e) = controller.start(&id, credentials, config.session.mode) {
        error!("failed to start session: {e}");
        return Err(e.into());
    }
    info!(id, mode = ?config.session.mode, "session started");
    Ok(())
}

/// Stop the session off the async thread; `stop` blocks for up to the
/// join timeout.
async fn shutdown(mut controller: SessionController) {
    info!("shutting down");
    match tokio::task::spawn_blocking(move || controller.stop()).await {
        Ok(StopOutcome::TerminationTimeout(waited)) => {
            warn!("frame pump did not stop within {waited:?}")
        }
        Ok(outcome) => info!(?outcome, "session closed"),
        Err(e) => error!("stop task failed: {e}"),
    }
}

// ── Headless ─────────────────────────────────────────────────────

async fn run_headless(
    mut controller: SessionController,
    config: &ViewerConfig,
    credentials: Credentials,
) -> Result<(), BoxError> {
    let (width, height) = (config.display.width, config.display.height);
    let target = SoftwareTarget::new(width, height);
    let canvas = target.front();

    let surface = controller.surface();
    surface.apply(SurfaceEvent::Created(Box::new(target)));
    surface.apply(SurfaceEvent::Changed {
        width,
        height,
        format: PixelFormat::Rgba8,
    });

    let mut status = controller.status();
    if let Err(e) = open(&mut controller, config, credentials) {
        shutdown(controller).await;
        return Err(e);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut report = tokio::time::interval(Duration::from_secs(5));
    report.tick().await;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = *status.borrow_and_update();
                info!("session status: {now}");
                if now == SessionStatus::Terminated {
                    warn!("session ended");
                    break;
                }
            }
            _ = report.tick() => {
                let posted = canvas.lock().map(|c| c.posted).unwrap_or_default();
                info!(frames = controller.frames_rendered(), posted, "render progress");
            }
        }
    }

    shutdown(controller).await;
    surface.apply(SurfaceEvent::Destroyed);
    Ok(())
}

// ── Windowed ─────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
async fn run_windowed(
    mut controller: SessionController,
    engine: Arc<dyn Engine>,
    config: &ViewerConfig,
    credentials: Credentials,
) -> Result<(), BoxError> {
    use std::time::Instant;

    use rdv_core::InputForwarder;
    use rdv_viewer::display::GdiTarget;
    use rdv_viewer::input::PointerTracker;
    use rdv_viewer::window::{LifecycleStep, NativeWindow, SurfaceLifecycle, WindowEvent};

    let (width, height) = (config.display.width, config.display.height);
    let window = NativeWindow::create(&config.display.title, width, height)?;
    let surface = controller.surface();
    let mut lifecycle = SurfaceLifecycle::new();
    let mut tracker = PointerTracker::new(width, height);
    let mut forwarder = InputForwarder::new(config.input.queue_capacity);
    let clock = Instant::now();

    // Frames arriving before the first resize are dropped.
    let mut status = controller.status();
    if let Err(e) = open(&mut controller, config, credentials) {
        shutdown(controller).await;
        return Err(e);
    }
    let session_id = config.session.remote_id.clone();

    'event_loop: loop {
        for ev in window.poll_events() {
            for step in lifecycle.on_event(&ev) {
                match step {
                    LifecycleStep::Create => surface.apply(SurfaceEvent::Created(Box::new(
                        GdiTarget::new(window.hwnd()),
                    ))),
                    LifecycleStep::Resize(width, height) => surface.apply(SurfaceEvent::Changed {
                        width,
                        height,
                        format: PixelFormat::Bgra8,
                    }),
                    LifecycleStep::Destroy => surface.apply(SurfaceEvent::Destroyed),
                }
            }

            if config.input.capture_pointer {
                let now_ms = clock.elapsed().as_millis() as u64;
                if let Some(input) = tracker.translate(&ev, now_ms) {
                    forwarder.on_event(input);
                }
            }

            if ev == WindowEvent::Close {
                break 'event_loop;
            }
        }

        if !forwarder.is_empty() {
            forwarder.flush(engine.as_ref(), &session_id);
        }

        if status.has_changed().unwrap_or(false) {
            let now = *status.borrow_and_update();
            info!("session status: {now}");
            if now == SessionStatus::Terminated {
                warn!("session ended");
                break;
            }
        }

        // Yield briefly so Tokio can make progress.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    shutdown(controller).await;
    surface.apply(SurfaceEvent::Destroyed);
    drop(window);
    Ok(())
}
