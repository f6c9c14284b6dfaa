//! Shared types for the fetch → stage → composite pipeline.

use serde::{Deserialize, Serialize};

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of engine frames and surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha (engine default).
    #[default]
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha (GDI, DXGI).
    Bgra8,
    /// 2 bytes per pixel, 5-6-5.
    Rgb565,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }
}

// ── FrameGeometry ────────────────────────────────────────────────

/// Size and dimensions of the engine's current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Frame size in bytes.
    pub size: usize,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameGeometry {
    /// Build from the raw values the engine reports.
    ///
    /// Returns `None` while any value is non-positive (no frame yet).
    pub fn from_reported(size: i32, width: i32, height: i32) -> Option<Self> {
        if size <= 0 || width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            size: size as usize,
            width: width as u32,
            height: height as u32,
        })
    }
}

// ── Rect ─────────────────────────────────────────────────────────

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// A rectangle anchored at the origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ── ScaleMode ────────────────────────────────────────────────────

/// How a frame is mapped onto a surface of a different size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Fill the whole surface; aspect ratio is not preserved.
    #[default]
    Stretch,
    /// Largest centred rectangle with the frame's aspect ratio.
    Letterbox,
}

impl ScaleMode {
    /// Destination rectangle for a `src_w`×`src_h` frame on a
    /// `dest_w`×`dest_h` surface.
    pub fn destination(self, src_w: u32, src_h: u32, dest_w: u32, dest_h: u32) -> Rect {
        match self {
            ScaleMode::Stretch => Rect::sized(dest_w, dest_h),
            ScaleMode::Letterbox => {
                if src_w == 0 || src_h == 0 {
                    return Rect::sized(dest_w, dest_h);
                }
                // Compare dest_w / dest_h against src_w / src_h without floats.
                let (w, h) = if dest_w as u64 * src_h as u64 > dest_h as u64 * src_w as u64 {
                    ((dest_h as u64 * src_w as u64 / src_h as u64) as u32, dest_h)
                } else {
                    (dest_w, (dest_w as u64 * src_h as u64 / src_w as u64) as u32)
                };
                Rect {
                    x: ((dest_w - w) / 2) as i32,
                    y: ((dest_h - h) / 2) as i32,
                    width: w,
                    height: h,
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
