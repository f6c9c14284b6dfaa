//! Session status state machine and session descriptors.
//!
//! ```text
//!  Idle ──► Connecting ──► Active ──► Terminating ──► Terminated
//!               │            │                            ▲
//!               │            └── link lost ───────────────┤
//!               └── start failed ─────────────────────────┘
//! ```
//!
//! Status only moves forward; a backward transition is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── SessionStatus ────────────────────────────────────────────────

/// Lifecycle status of a remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Connecting,
    Active,
    Terminating,
    Terminated,
}

impl SessionStatus {
    /// Whether a session in this status blocks a new `start`.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Connecting | SessionStatus::Active | SessionStatus::Terminating
        )
    }

    /// Move to `next` if it lies ahead of the current status.
    ///
    /// Returns `false` (and leaves the status unchanged) otherwise.
    pub fn advance(&mut self, next: SessionStatus) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Active => write!(f, "Active"),
            Self::Terminating => write!(f, "Terminating"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

// ── SessionMode ──────────────────────────────────────────────────

/// What the session was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Interactive,
    FileTransfer,
}

// ── Credentials ──────────────────────────────────────────────────

/// Opaque session credentials. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// The raw secret, for the engine call only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials([{} chars])", self.0.len())
    }
}

impl From<Option<String>> for Credentials {
    fn from(password: Option<String>) -> Self {
        Self(password.unwrap_or_default())
    }
}

// ── Tests ────────────────────────────────────────────────────────
