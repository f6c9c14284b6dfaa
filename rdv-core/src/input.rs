//! Pointer/touch input capture.
//!
//! Events delivered to the rendering surface are normalised against the
//! surface size and queued in arrival order. The base behaviour only
//! records and logs them; [`InputForwarder::flush`] is the delivery path
//! through [`Engine::inject_input`].
//!
//! The queue never blocks the caller: when full, the oldest unsent event
//! is dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::engine::Engine;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// ── InputEvent ───────────────────────────────────────────────────

/// Pointer or touch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerAction {
    Down,
    Up,
    Move,
    Cancel,
    Scroll,
}

/// One input event in surface-normalised coordinates (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
    /// Milliseconds on the caller's monotonic clock.
    pub timestamp_ms: u64,
}

impl InputEvent {
    /// Normalise a surface-relative pixel position.
    pub fn from_surface(
        action: PointerAction,
        x: f32,
        y: f32,
        surface_width: u32,
        surface_height: u32,
        timestamp_ms: u64,
    ) -> Self {
        let norm = |v: f32, extent: u32| {
            if extent == 0 {
                0.0
            } else {
                (v / extent as f32).clamp(0.0, 1.0)
            }
        };
        Self {
            action,
            x: norm(x, surface_width),
            y: norm(y, surface_height),
            timestamp_ms,
        }
    }

    /// Position in a `width`×`height` remote frame.
    pub fn to_remote(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x as f64 * width as f64) as i32,
            (self.y as f64 * height as f64) as i32,
        )
    }

    /// Wire payload for the engine's injection call.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }
}

// ── InputForwarder ───────────────────────────────────────────────

/// Bounded, drop-oldest queue of captured input events.
#[derive(Debug)]
pub struct InputForwarder {
    queue: VecDeque<InputEvent>,
    capacity: usize,
    dropped: u64,
}

impl InputForwarder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Record an event. Never blocks.
    pub fn on_event(&mut self, event: InputEvent) {
        trace!(
            "input event: {:?} at ({:.3}, {:.3})",
            event.action, event.x, event.y
        );
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(event);
    }

    /// Queued events, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &InputEvent> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Send every queued event to the engine, in order. Fire-and-forget:
    /// failures are logged and the event discarded. Returns the number
    /// accepted by the engine.
    pub fn flush(&mut self, engine: &dyn Engine, session_id: &str) -> usize {
        let mut sent = 0;
        while let Some(event) = self.queue.pop_front() {
            let payload = match event.encode() {
                Ok(p) => p,
                Err(e) => {
                    debug!("failed to encode input event: {e}");
                    continue;
                }
            };
            match engine.inject_input(session_id, &payload) {
                Ok(()) => sent += 1,
                Err(e) => debug!("input not delivered: {e}"),
            }
        }
        sent
    }
}

impl Default for InputForwarder {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

// ── Tests ────────────────────────────────────────────────────────
