//! The remote-desktop engine boundary.
//!
//! The engine lives behind a foreign-function interface. Everything the
//! pipeline needs from it is captured by the [`Engine`] trait:
//!
//! ```text
//! init ─► start_session ─► { frame_size, width, height, fetch_frame }* ─► stop_session
//! ```
//!
//! Production code binds [`NativeEngine`]; tests bind scripted fakes.
//! The process-wide instance is installed once through [`boundary`].

pub mod boundary;
pub mod native;

pub use native::NativeEngine;

use crate::error::EngineError;

/// Display index of the primary monitor.
pub const PRIMARY_DISPLAY: u32 = 0;

/// Capability interface over the native engine.
///
/// Query methods return `Ok(n)` with `n <= 0` while no frame is ready.
/// Any call may fail with [`EngineError::LinkMissing`] if the binding is
/// absent.
pub trait Engine: Send + Sync {
    /// Process-wide one-time initialisation.
    fn init(&self) -> Result<(), EngineError>;

    /// Open a session to `id`.
    fn start_session(&self, id: &str, password: &str) -> Result<(), EngineError>;

    /// Close the session. Idempotent from the caller's perspective.
    fn stop_session(&self, id: &str) -> Result<(), EngineError>;

    /// Byte size of the current frame.
    fn frame_size(&self, id: &str) -> Result<i32, EngineError>;

    /// Width of the current frame in pixels.
    fn width(&self, id: &str) -> Result<i32, EngineError>;

    /// Height of the current frame in pixels.
    fn height(&self, id: &str) -> Result<i32, EngineError>;

    /// Copy the current frame of `display` into `dest`.
    ///
    /// Writes exactly [`frame_size`](Self::frame_size) bytes; the caller
    /// sizes `dest` beforehand.
    fn fetch_frame(&self, id: &str, display: u32, dest: &mut [u8]) -> Result<(), EngineError>;

    /// Deliver a serialised input event. Fire-and-forget.
    fn inject_input(&self, _id: &str, _payload: &[u8]) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("inject_input"))
    }
}
