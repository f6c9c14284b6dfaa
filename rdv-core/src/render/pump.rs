//! Frame pump: the per-session render loop.
//!
//! Polls the engine at a fixed cadence, independent of frame arrival:
//!
//! 1. Query frame size and dimensions.
//! 2. Skip the tick while any of them is non-positive.
//! 3. [`FrameBufferManager::ensure`] the buffer and staged image.
//! 4. Fetch pixel bytes for the configured display.
//! 5. Stage the image and [`SurfaceBinder::composite`] it.
//!
//! Per-tick failures are logged and the tick skipped. Losing the engine
//! link ends the loop.
//!
//! [`FramePump::run`] is a plain future bound to the shared `running`
//! flag, so tests drive it on a paused tokio clock. [`FramePump::spawn`]
//! runs it on a dedicated thread with its own current-thread runtime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::engine::{Engine, PRIMARY_DISPLAY};
use crate::error::{EngineError, RenderError};
use crate::render::buffer::FrameBufferManager;
use crate::render::surface::{Composite, SurfaceBinder};
use crate::render::types::{FrameGeometry, PixelFormat, ScaleMode};

/// Progress is logged once per this many frames / ticks.
const LOG_EVERY: u64 = 60;

// ── PumpConfig ───────────────────────────────────────────────────

/// Configuration for [`FramePump`] and the session that owns it.
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Interval between ticks.
    pub tick: Duration,
    /// Display index passed to `fetch_frame`.
    pub display_index: u32,
    /// Bounded wait for the pump thread on stop.
    pub join_timeout: Duration,
    /// How frames are mapped onto the surface.
    pub scale_mode: ScaleMode,
    /// Pixel layout of engine frames.
    pub pixel_format: PixelFormat,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16), // ~60 FPS
            display_index: PRIMARY_DISPLAY,
            join_timeout: Duration::from_secs(1),
            scale_mode: ScaleMode::Stretch,
            pixel_format: PixelFormat::Rgba8,
        }
    }
}

// ── RenderLoopState ──────────────────────────────────────────────

/// State shared between the pump and its owner.
#[derive(Debug)]
pub struct RenderLoopState {
    running: AtomicBool,
    frame_count: AtomicU64,
}

impl RenderLoopState {
    /// A state whose loop is allowed to run.
    pub fn running() -> Self {
        Self {
            running: AtomicBool::new(true),
            frame_count: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Frames composited so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::SeqCst)
    }

    fn record_frame(&self) -> u64 {
        self.frame_count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

// ── Outcomes ─────────────────────────────────────────────────────

/// What a successful tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine had no frame yet.
    NotReady,
    /// The frame was drawn.
    Composited,
    /// The frame was fetched but the surface was invalid.
    Dropped,
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpExit {
    /// `running` was cleared.
    Cancelled,
    /// The engine binding disappeared.
    LinkLost(EngineError),
}

/// Result of joining the pump thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// The thread finished within the bounded wait.
    Exited(PumpExit),
    /// The thread ended without reporting an exit.
    Panicked,
    /// The thread was still running when the wait elapsed. It is detached.
    TimedOut(Duration),
}

// ── FramePump ────────────────────────────────────────────────────

/// The render loop for one session.
pub struct FramePump {
    engine: Arc<dyn Engine>,
    session_id: String,
    display: u32,
    frames: FrameBufferManager,
    surface: Arc<SurfaceBinder>,
    state: Arc<RenderLoopState>,
    interval: Duration,
    ticks: u64,
}

impl FramePump {
    pub fn new(
        engine: Arc<dyn Engine>,
        session_id: impl Into<String>,
        surface: Arc<SurfaceBinder>,
        state: Arc<RenderLoopState>,
        config: &PumpConfig,
    ) -> Self {
        Self {
            engine,
            session_id: session_id.into(),
            display: config.display_index,
            frames: FrameBufferManager::new(config.pixel_format),
            surface,
            state,
            interval: config.tick,
            ticks: 0,
        }
    }

    /// Buffer state, for observability.
    pub fn frames(&self) -> &FrameBufferManager {
        &self.frames
    }

    /// Run a single tick.
    pub fn tick(&mut self) -> Result<TickOutcome, RenderError> {
        self.ticks += 1;
        let id = self.session_id.as_str();

        let size = self.engine.frame_size(id).map_err(RenderError::query)?;
        let width = self.engine.width(id).map_err(RenderError::query)?;
        let height = self.engine.height(id).map_err(RenderError::query)?;

        if self.ticks % LOG_EVERY == 1 {
            trace!("frame data - size: {size}, width: {width}, height: {height}");
        }

        let Some(geometry) = FrameGeometry::from_reported(size, width, height) else {
            return Ok(TickOutcome::NotReady);
        };

        self.frames.ensure(geometry)?;

        let engine = &self.engine;
        let display = self.display;
        self.frames
            .fill(|dest| engine.fetch_frame(id, display, dest))?;

        let image = self.frames.decode()?;
        match self.surface.composite(image)? {
            Composite::Drawn => {
                let n = self.state.record_frame();
                if n % LOG_EVERY == 0 {
                    debug!("rendered {n} frames");
                }
                Ok(TickOutcome::Composited)
            }
            Composite::Dropped => Ok(TickOutcome::Dropped),
        }
    }

    /// Tick until `running` is cleared or the link is lost.
    pub async fn run(&mut self) -> PumpExit {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(session = %self.session_id, "frame pump running");

        while self.state.is_running() {
            interval.tick().await;
            if !self.state.is_running() {
                break;
            }

            match self.tick() {
                Ok(_) => {}
                Err(RenderError::LinkLost(e)) => {
                    error!(session = %self.session_id, "engine link lost: {e}");
                    self.state.stop();
                    return PumpExit::LinkLost(e);
                }
                Err(e) => warn!(session = %self.session_id, "render error: {e}"),
            }
        }

        info!(
            session = %self.session_id,
            "frame pump stopped after {} frames",
            self.state.frame_count()
        );
        PumpExit::Cancelled
    }

    /// Run the pump on a dedicated thread.
    ///
    /// `on_exit` runs on the pump thread after the loop ends and before
    /// the exit is reported to [`PumpThread::join`].
    pub fn spawn<F>(mut self, on_exit: F) -> std::io::Result<PumpThread>
    where
        F: FnOnce(&PumpExit) + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let state = Arc::clone(&self.state);
        let (done_tx, done_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("frame-pump".into())
            .spawn(move || {
                let exit = runtime.block_on(self.run());
                on_exit(&exit);
                let _ = done_tx.send(exit);
            })?;

        Ok(PumpThread {
            handle,
            done: done_rx,
            state,
        })
    }
}

// ── PumpThread ───────────────────────────────────────────────────

/// Handle to a pump running on its own thread.
pub struct PumpThread {
    handle: JoinHandle<()>,
    done: mpsc::Receiver<PumpExit>,
    state: Arc<RenderLoopState>,
}

impl PumpThread {
    pub fn state(&self) -> &Arc<RenderLoopState> {
        &self.state
    }

    /// Clear `running` and wait up to `timeout` for the thread to finish.
    pub fn join(self, timeout: Duration) -> Join {
        self.state.stop();
        match self.done.recv_timeout(timeout) {
            Ok(exit) => {
                if self.handle.join().is_err() {
                    return Join::Panicked;
                }
                Join::Exited(exit)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Join::TimedOut(timeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = self.handle.join();
                Join::Panicked
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
