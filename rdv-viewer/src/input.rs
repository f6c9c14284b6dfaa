//! Local pointer capture → [`InputEvent`] conversion.
//!
//! Translates [`WindowEvent`]s from the message loop into
//! surface-normalised events for the [`InputForwarder`].
//!
//! [`InputForwarder`]: rdv_core::InputForwarder

use rdv_core::{InputEvent, PointerAction};

use crate::window::WindowEvent;

/// Pointer state needed to translate window events.
#[derive(Debug, Default)]
pub struct PointerTracker {
    width: u32,
    height: u32,
    last: (i32, i32),
    pressed: u8,
}

impl PointerTracker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Convert a window event to an input event (if applicable).
    pub fn translate(&mut self, event: &WindowEvent, timestamp_ms: u64) -> Option<InputEvent> {
        let (action, x, y) = match *event {
            WindowEvent::Resize(w, h) => {
                self.width = w;
                self.height = h;
                return None;
            }
            WindowEvent::MouseMove(x, y) => {
                self.last = (x, y);
                (PointerAction::Move, x, y)
            }
            WindowEvent::MouseButton(_, true, x, y) => {
                self.last = (x, y);
                self.pressed = self.pressed.saturating_add(1);
                (PointerAction::Down, x, y)
            }
            WindowEvent::MouseButton(_, false, x, y) => {
                self.last = (x, y);
                self.pressed = self.pressed.saturating_sub(1);
                (PointerAction::Up, x, y)
            }
            WindowEvent::MouseWheel(_) => (PointerAction::Scroll, self.last.0, self.last.1),
            WindowEvent::CaptureLost if self.pressed > 0 => {
                self.pressed = 0;
                (PointerAction::Cancel, self.last.0, self.last.1)
            }
            WindowEvent::CaptureLost | WindowEvent::Minimized | WindowEvent::Close => {
                return None;
            }
        };

        Some(InputEvent::from_surface(
            action,
            x as f32,
            y as f32,
            self.width,
            self.height,
            timestamp_ms,
        ))
    }
}

// ── Tests ────────────────────────────────────────────────────────
