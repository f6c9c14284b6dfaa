//! Session controller.
//!
//! Orchestrates one remote session at a time:
//!
//! ```text
//! start ─► Engine::start_session ─► FramePump::spawn
//! stop  ─► running = false ─► bounded join ─► Engine::stop_session
//! ```
//!
//! Status is published on a `tokio::sync::watch` channel so the UI can
//! observe it without blocking the controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::error::SessionError;
use crate::render::pump::{FramePump, Join, PumpConfig, PumpExit, PumpThread, RenderLoopState};
use crate::render::surface::SurfaceBinder;
use crate::session::state::{Credentials, SessionMode, SessionStatus};

// ── StopOutcome ──────────────────────────────────────────────────

/// What [`SessionController::stop`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no session to stop.
    NoSession,
    /// The pump (if any) exited and the engine session was released.
    Stopped,
    /// The pump did not exit within the bounded wait. The engine session
    /// was released anyway and the pump thread detached.
    TerminationTimeout(Duration),
}

// ── Session ──────────────────────────────────────────────────────

struct Session {
    id: String,
    mode: SessionMode,
    pump: Option<PumpThread>,
}

// ── SessionController ────────────────────────────────────────────

/// Owns the current session and its frame pump.
pub struct SessionController {
    engine: Arc<dyn Engine>,
    surface: Arc<SurfaceBinder>,
    config: PumpConfig,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    status_rx: watch::Receiver<SessionStatus>,
    /// Incremented per start; a pump only reports for its own epoch.
    epoch: Arc<AtomicU64>,
    session: Option<Session>,
}

impl SessionController {
    pub fn new(engine: Arc<dyn Engine>, surface: Arc<SurfaceBinder>, config: PumpConfig) -> Self {
        let (status_tx, status_rx) = watch::channel(SessionStatus::Idle);
        Self {
            engine,
            surface,
            config,
            status_tx: Arc::new(status_tx),
            status_rx,
            epoch: Arc::new(AtomicU64::new(0)),
            session: None,
        }
    }

    /// Start a session to `id`.
    ///
    /// Returns once the engine accepted the session and the frame pump
    /// thread is spawned; frames arrive asynchronously.
    pub fn start(
        &mut self,
        id: &str,
        credentials: Credentials,
        mode: SessionMode,
    ) -> Result<(), SessionError> {
        if id.is_empty() {
            warn!("invalid remote id");
            return Err(SessionError::InvalidId);
        }

        if let Some(current) = &self.session {
            if self.current_status().is_live() {
                return Err(SessionError::AlreadyActive(current.id.clone()));
            }
            // A session whose pump died still holds an engine session.
            self.stop();
        }

        info!(
            id,
            password_len = credentials.len(),
            ?mode,
            "starting session"
        );
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.status_tx.send_replace(SessionStatus::Connecting);

        if let Err(e) = self.engine.start_session(id, credentials.expose()) {
            error!(id, "failed to start session: {e}");
            self.advance(SessionStatus::Terminated);
            // Kept so that stop() releases the engine side exactly once.
            self.session = Some(Session {
                id: id.to_owned(),
                mode,
                pump: None,
            });
            return Err(e.into());
        }
        self.advance(SessionStatus::Active);

        let pump = FramePump::new(
            Arc::clone(&self.engine),
            id,
            Arc::clone(&self.surface),
            Arc::new(RenderLoopState::running()),
            &self.config,
        );
        let status = Arc::clone(&self.status_tx);
        let epochs = Arc::clone(&self.epoch);
        let spawned = pump.spawn(move |exit| {
            if let PumpExit::LinkLost(_) = exit {
                if epochs.load(Ordering::SeqCst) == epoch {
                    status.send_if_modified(|s| s.advance(SessionStatus::Terminated));
                }
            }
        });

        let pump = match spawned {
            Ok(thread) => Some(thread),
            Err(e) => {
                error!(id, "failed to spawn frame pump: {e}");
                self.advance(SessionStatus::Terminated);
                self.session = Some(Session {
                    id: id.to_owned(),
                    mode,
                    pump: None,
                });
                return Err(SessionError::Spawn(e));
            }
        };

        self.session = Some(Session {
            id: id.to_owned(),
            mode,
            pump,
        });
        debug!(id, "frame pump started");
        Ok(())
    }

    /// Stop the current session, if any.
    ///
    /// Safe to call at any time and any number of times. Blocks for at
    /// most the configured join timeout.
    pub fn stop(&mut self) -> StopOutcome {
        let Some(mut session) = self.session.take() else {
            debug!("stop: no session");
            return StopOutcome::NoSession;
        };

        info!(id = %session.id, "stopping session");
        self.advance(SessionStatus::Terminating);

        let mut outcome = StopOutcome::Stopped;
        if let Some(pump) = session.pump.take() {
            debug!("waiting for frame pump to stop...");
            match pump.join(self.config.join_timeout) {
                Join::Exited(exit) => debug!(?exit, "frame pump stopped"),
                Join::Panicked => warn!("frame pump ended abnormally"),
                Join::TimedOut(waited) => {
                    warn!(
                        "termination timeout: frame pump still running after {waited:?}; \
                         releasing engine session anyway"
                    );
                    outcome = StopOutcome::TerminationTimeout(waited);
                }
            }
        }

        if let Err(e) = self.engine.stop_session(&session.id) {
            warn!(id = %session.id, "error stopping session: {e}");
        }
        self.advance(SessionStatus::Terminated);
        info!(id = %session.id, "session stopped");
        outcome
    }

    // ── Observability ────────────────────────────────────────────

    /// Side channel carrying the current status.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    pub fn current_status(&self) -> SessionStatus {
        *self.status_rx.borrow()
    }

    /// The binder that lifecycle callbacks feed.
    pub fn surface(&self) -> Arc<SurfaceBinder> {
        Arc::clone(&self.surface)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    /// Frames composited by the current session's pump.
    pub fn frames_rendered(&self) -> u64 {
        self.pump().map_or(0, |p| p.state().frame_count())
    }

    /// Whether a pump thread exists and has not been told to stop.
    pub fn is_pumping(&self) -> bool {
        self.pump().is_some_and(|p| p.state().is_running())
    }

    fn pump(&self) -> Option<&PumpThread> {
        self.session.as_ref().and_then(|s| s.pump.as_ref())
    }

    fn advance(&self, next: SessionStatus) -> bool {
        self.status_tx.send_if_modified(|s| s.advance(next))
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}
