//! # rdv-core
//!
//! Rendering pipeline for a remote-desktop client whose session engine
//! sits behind a foreign-function boundary.
//!
//! This crate contains:
//! - **Engine**: the `Engine` capability trait, the process-wide
//!   boundary singleton and the native binding
//! - **Render**: `FrameBufferManager`, `SurfaceBinder`, `FramePump` and
//!   the in-memory `SoftwareTarget`
//! - **Session**: `SessionController` and the `SessionStatus` state machine
//! - **Input**: `InputForwarder`, the pointer-event capture contract
//! - **Error**: `EngineError`, `SessionError`, `RenderError`

pub mod engine;
pub mod error;
pub mod input;
pub mod render;
pub mod session;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use engine::{Engine, NativeEngine, PRIMARY_DISPLAY};
pub use error::{EngineError, RenderError, SessionError};
pub use input::{InputEvent, InputForwarder, PointerAction};
pub use render::{
    Composite, DrawTarget, FrameBufferManager, FramePump, PixelFormat, PumpConfig, Rect,
    ScaleMode, SoftwareTarget, StagedImage, SurfaceBinder, SurfaceEvent,
};
pub use session::{Credentials, SessionController, SessionMode, SessionStatus, StopOutcome};
