//! Domain-specific error types for the rendering pipeline.
//!
//! Three layers, three enums:
//!
//! - [`EngineError`]: what the engine boundary reports.
//! - [`SessionError`]: what the session controller surfaces to the user.
//! - [`RenderError`]: per-tick failures contained inside the frame pump.
//!
//! Nothing here panics; every failure is typed and recoverable.

use thiserror::Error;

// ── EngineError ──────────────────────────────────────────────────

/// Failure reported by an [`Engine`](crate::engine::Engine) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The native binding (or one of its symbols) is absent.
    #[error("engine binding missing: {0}")]
    LinkMissing(&'static str),

    /// The engine refused the request (bad id, auth failure, ...).
    #[error("engine rejected request: {0}")]
    Rejected(String),

    /// A call reached the engine but did not complete.
    #[error("engine call failed: {0}")]
    Failed(String),

    /// The binding exists but does not implement this entry point.
    #[error("engine entry point not supported: {0}")]
    Unsupported(&'static str),

    /// [`boundary::install`](crate::engine::boundary::install) was called twice.
    #[error("engine already initialised")]
    AlreadyInitialized,

    /// The process-wide engine was used before it was installed.
    #[error("engine not initialised")]
    NotInitialized,
}

impl EngineError {
    /// Whether this error means the binding itself is gone.
    pub fn is_link_missing(&self) -> bool {
        matches!(self, EngineError::LinkMissing(_))
    }
}

// ── SessionError ─────────────────────────────────────────────────

/// Errors surfaced to the user by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote id was empty. No engine call was made.
    #[error("invalid remote id")]
    InvalidId,

    /// The native engine binding is missing.
    #[error("engine link missing: {0}")]
    LinkMissing(EngineError),

    /// The engine rejected the session start.
    #[error("connection failed: {0}")]
    EngineStartFailure(EngineError),

    /// A session is already connecting, active or terminating.
    #[error("session {0} is already running")]
    AlreadyActive(String),

    /// The frame pump thread could not be spawned.
    #[error("failed to spawn frame pump: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<EngineError> for SessionError {
    fn from(e: EngineError) -> Self {
        if e.is_link_missing() {
            SessionError::LinkMissing(e)
        } else {
            SessionError::EngineStartFailure(e)
        }
    }
}

// ── RenderError ──────────────────────────────────────────────────

/// A failure inside one frame-pump tick.
///
/// Only [`RenderError::LinkLost`] stops the loop; every other variant
/// skips the current tick.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine binding disappeared mid-session.
    #[error("engine link lost: {0}")]
    LinkLost(EngineError),

    /// Querying the frame geometry failed.
    #[error("frame query failed: {0}")]
    Query(EngineError),

    /// Fetching pixel bytes failed.
    #[error("frame fetch failed: {0}")]
    Fetch(EngineError),

    /// The fetched bytes could not be staged as an image.
    #[error("frame decode failed: need {expected} bytes, have {actual}")]
    Decode { expected: usize, actual: usize },

    /// The buffer has not been filled by a successful fetch.
    #[error("frame buffer not filled")]
    NotFetched,

    /// The draw target failed to begin, draw or commit.
    #[error("draw failed: {0}")]
    Draw(String),
}

impl RenderError {
    /// Whether this error ends the render loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::LinkLost(_))
    }

    /// Classify a failed geometry query.
    pub(crate) fn query(e: EngineError) -> Self {
        if e.is_link_missing() {
            RenderError::LinkLost(e)
        } else {
            RenderError::Query(e)
        }
    }

    /// Classify a failed pixel fetch.
    pub(crate) fn fetch(e: EngineError) -> Self {
        if e.is_link_missing() {
            RenderError::LinkLost(e)
        } else {
            RenderError::Fetch(e)
        }
    }
}
