//! # Rendering pipeline
//!
//! ```text
//!  Engine ──fetch──► FrameBufferManager ──stage──► SurfaceBinder ──► DrawTarget
//!    ▲                      (pump thread)              ▲ (lock)
//!    └──── FramePump tick (every ~16 ms) ──────────────┘
//!                                                      │
//!                          SurfaceEvent (window thread)┘
//! ```
//!
//! | Module     | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `types`    | Pixel formats, frame geometry, rects, scale mode |
//! | `buffer`   | Backing store + staged image, resize on change   |
//! | `surface`  | Lifecycle-driven drawable with locked composite  |
//! | `software` | In-memory RGBA draw target                       |
//! | `pump`     | The periodic fetch/composite loop                |

pub mod buffer;
pub mod pump;
pub mod software;
pub mod surface;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use buffer::{FrameBuffer, FrameBufferManager, StagedImage};
pub use pump::{FramePump, PumpConfig, PumpExit, RenderLoopState, TickOutcome};
pub use software::{Canvas, SoftwareTarget};
pub use surface::{Composite, DrawTarget, SurfaceBinder, SurfaceEvent};
pub use types::{FrameGeometry, PixelFormat, Rect, ScaleMode};
