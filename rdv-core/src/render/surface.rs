//! Surface binder.
//!
//! Holds the platform drawable and its validity and size. The windowing
//! system drives it with [`SurfaceEvent`]s from its own thread; the frame
//! pump reads it through [`SurfaceBinder::composite`]. Both go through the
//! same lock, so a surface is never drawn after `Destroyed` returns.
//!
//! ```text
//!            Created(handle)             Destroyed
//!  Invalid ───────────────────► Valid ─────────────► Invalid
//!                                │ ▲
//!                                └─┘ Changed(w, h, format)
//! ```

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::RenderError;
use crate::render::buffer::StagedImage;
use crate::render::types::{PixelFormat, Rect, ScaleMode};

// ── DrawTarget ───────────────────────────────────────────────────

/// A platform drawable that accepts one draw transaction at a time.
pub trait DrawTarget: Send {
    /// Begin a transaction. Returns the canvas size in pixels.
    fn begin(&mut self) -> Result<(u32, u32), RenderError>;

    /// Scale `src` of `image` onto `dst` of the canvas.
    fn draw(&mut self, image: &StagedImage, src: Rect, dst: Rect) -> Result<(), RenderError>;

    /// Post the transaction to the display.
    fn commit(&mut self) -> Result<(), RenderError>;
}

// ── SurfaceEvent ─────────────────────────────────────────────────

/// Lifecycle callbacks from the windowing system.
pub enum SurfaceEvent {
    Created(Box<dyn DrawTarget>),
    Changed {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    Destroyed,
}

impl fmt::Debug for SurfaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(_) => write!(f, "Created"),
            Self::Changed {
                width,
                height,
                format,
            } => write!(f, "Changed({width}x{height}, {format:?})"),
            Self::Destroyed => write!(f, "Destroyed"),
        }
    }
}

// ── Composite ────────────────────────────────────────────────────

/// Result of a composite attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// The frame was drawn and committed.
    Drawn,
    /// The surface was invalid; the frame was discarded.
    Dropped,
}

// ── SurfaceBinder ────────────────────────────────────────────────

struct SurfaceState {
    handle: Option<Box<dyn DrawTarget>>,
    valid: bool,
    width: u32,
    height: u32,
}

/// Shared owner of the current drawable.
pub struct SurfaceBinder {
    state: Mutex<SurfaceState>,
    scale: ScaleMode,
}

impl SurfaceBinder {
    pub fn new(scale: ScaleMode) -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                handle: None,
                valid: false,
                width: 0,
                height: 0,
            }),
            scale,
        }
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale
    }

    /// Apply a lifecycle event.
    pub fn apply(&self, event: SurfaceEvent) {
        let mut state = self.lock();
        match event {
            SurfaceEvent::Created(handle) => {
                info!("surface created");
                state.handle = Some(handle);
                state.valid = true;
            }
            SurfaceEvent::Changed {
                width,
                height,
                format,
            } => {
                debug!("surface changed: {width}x{height}, format={format:?}");
                state.width = width;
                state.height = height;
            }
            SurfaceEvent::Destroyed => {
                info!("surface destroyed");
                state.valid = false;
                state.handle = None;
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lock().valid
    }

    /// Last size reported by `Changed`.
    pub fn size(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }

    /// Draw `image` onto the surface.
    ///
    /// Drops the frame when the surface is invalid. The whole source
    /// rectangle is mapped onto the destination chosen by the scale mode.
    pub fn composite(&self, image: &StagedImage) -> Result<Composite, RenderError> {
        let mut state = self.lock();
        if !state.valid {
            return Ok(Composite::Dropped);
        }
        let (width, height) = (state.width, state.height);
        let Some(target) = state.handle.as_mut() else {
            return Ok(Composite::Dropped);
        };

        let (canvas_w, canvas_h) = target.begin()?;
        let (dest_w, dest_h) = if width > 0 && height > 0 {
            (width, height)
        } else {
            (canvas_w, canvas_h)
        };

        let src = Rect::sized(image.width, image.height);
        let dst = self.scale.destination(image.width, image.height, dest_w, dest_h);
        target.draw(image, src, dst)?;
        target.commit()?;
        Ok(Composite::Drawn)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SurfaceBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SurfaceBinder")
            .field("valid", &state.valid)
            .field("width", &state.width)
            .field("height", &state.height)
            .field("scale", &self.scale)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────
