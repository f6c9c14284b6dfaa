//! In-memory draw target.
//!
//! Scales staged images onto a CPU canvas with nearest-neighbour
//! sampling. Used by the viewer's headless mode and by tests that need
//! to inspect composited pixels.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::RenderError;
use crate::render::buffer::StagedImage;
use crate::render::surface::DrawTarget;
use crate::render::types::Rect;

/// Bytes per canvas pixel (RGBA8).
const CANVAS_BPP: usize = 4;

// ── Canvas ───────────────────────────────────────────────────────

/// The pixels most recently posted by a [`SoftwareTarget`].
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Number of committed transactions.
    pub posted: u64,
}

impl Canvas {
    /// RGBA bytes at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CANVAS_BPP;
        self.pixels.get(offset..offset + CANVAS_BPP)
    }
}

// ── SoftwareTarget ───────────────────────────────────────────────

/// A [`DrawTarget`] backed by a fixed-size RGBA canvas.
pub struct SoftwareTarget {
    back: Canvas,
    front: Arc<Mutex<Canvas>>,
    in_transaction: bool,
}

impl SoftwareTarget {
    pub fn new(width: u32, height: u32) -> Self {
        let back = Canvas {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * CANVAS_BPP],
            posted: 0,
        };
        Self {
            front: Arc::new(Mutex::new(back.clone())),
            back,
            in_transaction: false,
        }
    }

    /// Handle to the posted canvas, readable from any thread.
    pub fn front(&self) -> Arc<Mutex<Canvas>> {
        Arc::clone(&self.front)
    }
}

impl DrawTarget for SoftwareTarget {
    fn begin(&mut self) -> Result<(u32, u32), RenderError> {
        // A transaction abandoned by a failed draw is discarded here.
        self.in_transaction = true;
        Ok((self.back.width, self.back.height))
    }

    fn draw(&mut self, image: &StagedImage, src: Rect, dst: Rect) -> Result<(), RenderError> {
        if !self.in_transaction {
            return Err(RenderError::Draw("draw outside transaction".into()));
        }
        if image.format.bytes_per_pixel() != CANVAS_BPP {
            return Err(RenderError::Draw(format!(
                "unsupported source format {:?}",
                image.format
            )));
        }
        if src.is_empty() || dst.is_empty() {
            return Ok(());
        }

        let stride = image.stride();
        let canvas_w = self.back.width as i64;
        let canvas_h = self.back.height as i64;

        for dy in 0..dst.height as i64 {
            let cy = dst.y as i64 + dy;
            if cy < 0 || cy >= canvas_h {
                continue;
            }
            let sy = src.y as i64 + dy * src.height as i64 / dst.height as i64;
            for dx in 0..dst.width as i64 {
                let cx = dst.x as i64 + dx;
                if cx < 0 || cx >= canvas_w {
                    continue;
                }
                let sx = src.x as i64 + dx * src.width as i64 / dst.width as i64;
                let s = sy as usize * stride + sx as usize * CANVAS_BPP;
                let d = (cy as usize * canvas_w as usize + cx as usize) * CANVAS_BPP;
                let Some(px) = image.pixels.get(s..s + CANVAS_BPP) else {
                    continue;
                };
                self.back.pixels[d..d + CANVAS_BPP].copy_from_slice(px);
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), RenderError> {
        if !self.in_transaction {
            return Err(RenderError::Draw("commit outside transaction".into()));
        }
        self.in_transaction = false;
        self.back.posted += 1;

        let mut front = self.front.lock().unwrap_or_else(PoisonError::into_inner);
        front.width = self.back.width;
        front.height = self.back.height;
        front.pixels.copy_from_slice(&self.back.pixels);
        front.posted = self.back.posted;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
