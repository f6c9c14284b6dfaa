//! Frame buffer manager.
//!
//! Owns the raw pixel backing store the engine writes into and the staged
//! image handed to the surface. Owned by the frame pump thread alone.
//!
//! The backing store is reallocated only when the engine-reported byte
//! size changes; the staged image only when the pixel dimensions change.

use tracing::debug;

use crate::error::{EngineError, RenderError};
use crate::render::types::{FrameGeometry, PixelFormat};

// ── FrameBuffer ──────────────────────────────────────────────────

/// Raw pixel bytes as fetched from the engine.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    /// Number of (re)allocations so far.
    generation: u64,
    /// Set by a successful fetch, cleared by reallocation.
    filled: bool,
}

impl FrameBuffer {
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ── StagedImage ──────────────────────────────────────────────────

/// Decoded image ready for compositing, tightly packed rows.
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl StagedImage {
    fn new(width: u32, height: u32, format: PixelFormat, len: usize) -> Self {
        Self {
            width,
            height,
            format,
            pixels: vec![0u8; len],
        }
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

// ── Ensure ───────────────────────────────────────────────────────

/// What [`FrameBufferManager::ensure`] had to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ensure {
    pub reallocated: bool,
    pub restaged: bool,
}

// ── FrameBufferManager ───────────────────────────────────────────

/// Backing store plus staged image.
#[derive(Debug)]
pub struct FrameBufferManager {
    buffer: FrameBuffer,
    staged: Option<StagedImage>,
    format: PixelFormat,
}

impl FrameBufferManager {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            buffer: FrameBuffer::default(),
            staged: None,
            format,
        }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn staged(&self) -> Option<&StagedImage> {
        self.staged.as_ref()
    }

    /// Number of backing-store allocations so far.
    pub fn generation(&self) -> u64 {
        self.buffer.generation
    }

    /// Match the backing store and staged image to `geometry`.
    ///
    /// A geometry whose dimensions need more bytes than its reported size
    /// is rejected before anything is allocated.
    pub fn ensure(&mut self, geometry: FrameGeometry) -> Result<Ensure, RenderError> {
        let staged_len = (geometry.width as usize)
            .checked_mul(geometry.height as usize)
            .and_then(|n| n.checked_mul(self.format.bytes_per_pixel()));
        let staged_len = match staged_len {
            Some(len) if len <= geometry.size => len,
            other => {
                return Err(RenderError::Decode {
                    expected: other.unwrap_or(usize::MAX),
                    actual: geometry.size,
                });
            }
        };

        let mut ensure = Ensure::default();

        if self.buffer.bytes.len() != geometry.size {
            debug!(
                "allocating frame buffer: {} bytes, {}x{}",
                geometry.size, geometry.width, geometry.height
            );
            self.buffer.bytes = vec![0u8; geometry.size];
            self.buffer.generation += 1;
            self.buffer.filled = false;
            ensure.reallocated = true;
        }
        self.buffer.width = geometry.width;
        self.buffer.height = geometry.height;

        let stale = match &self.staged {
            Some(img) => img.width != geometry.width || img.height != geometry.height,
            None => true,
        };
        if stale {
            debug!("creating staged image: {}x{}", geometry.width, geometry.height);
            self.staged = Some(StagedImage::new(
                geometry.width,
                geometry.height,
                self.format,
                staged_len,
            ));
            ensure.restaged = true;
        }

        Ok(ensure)
    }

    /// Fill the backing store with `fetch`.
    ///
    /// On failure the buffer is marked unfilled so it cannot be staged.
    pub fn fill<F>(&mut self, fetch: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), EngineError>,
    {
        self.buffer.filled = false;
        fetch(&mut self.buffer.bytes).map_err(RenderError::fetch)?;
        self.buffer.filled = true;
        Ok(())
    }

    /// Copy the fetched bytes into the staged image.
    pub fn decode(&mut self) -> Result<&StagedImage, RenderError> {
        if !self.buffer.filled {
            return Err(RenderError::NotFetched);
        }
        let Some(staged) = self.staged.as_mut() else {
            return Err(RenderError::NotFetched);
        };

        let expected = staged.pixels.len();
        let actual = self.buffer.bytes.len();
        if actual < expected {
            return Err(RenderError::Decode { expected, actual });
        }
        staged.pixels.copy_from_slice(&self.buffer.bytes[..expected]);
        Ok(staged)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(width: u32, height: u32) -> FrameGeometry {
        FrameGeometry {
            size: width as usize * height as usize * 4,
            width,
            height,
        }
    }

    #[test]
    fn reallocates_once_per_size_change() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);

        for _ in 0..5 {
            mgr.ensure(geometry(800, 600)).unwrap();
        }
        assert_eq!(mgr.buffer().capacity(), 1_920_000);
        assert_eq!(mgr.generation(), 1);

        let ensure = mgr.ensure(geometry(1024, 768)).unwrap();
        assert!(ensure.reallocated);
        assert_eq!(mgr.buffer().capacity(), 3_145_728);
        assert_eq!(mgr.generation(), 2);

        assert!(!mgr.ensure(geometry(1024, 768)).unwrap().reallocated);
        assert_eq!(mgr.generation(), 2);
    }

    #[test]
    fn generation_counts_distinct_consecutive_sizes() {
        let sizes = [100, 100, 200, 200, 200, 100, 300, 300, 100];
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        for size in sizes {
            mgr.ensure(FrameGeometry {
                size,
                width: 5,
                height: 5,
            })
            .unwrap();
        }
        let runs = 1 + sizes.windows(2).filter(|w| w[0] != w[1]).count() as u64;
        assert_eq!(mgr.generation(), runs);
    }

    #[test]
    fn restages_on_dimension_change_only() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        assert!(mgr.ensure(geometry(4, 4)).unwrap().restaged);
        assert!(!mgr.ensure(geometry(4, 4)).unwrap().restaged);

        // Same byte size, different shape: staged image rebuilt, buffer kept.
        let ensure = mgr
            .ensure(FrameGeometry {
                size: 64,
                width: 8,
                height: 2,
            })
            .unwrap();
        assert!(ensure.restaged);
        assert!(!ensure.reallocated);
    }

    #[test]
    fn decode_requires_successful_fetch() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        mgr.ensure(geometry(2, 2)).unwrap();
        assert!(matches!(mgr.decode(), Err(RenderError::NotFetched)));

        mgr.fill(|buf| {
            buf.fill(7);
            Ok(())
        })
        .unwrap();
        let img = mgr.decode().unwrap();
        assert_eq!(img.pixels, vec![7u8; 16]);

        let err = mgr.fill(|_| Err(EngineError::Failed("timeout".into())));
        assert!(matches!(err, Err(RenderError::Fetch(_))));
        assert!(matches!(mgr.decode(), Err(RenderError::NotFetched)));
    }

    #[test]
    fn short_geometry_is_rejected_before_allocation() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        let err = mgr
            .ensure(FrameGeometry {
                size: 10,
                width: 4,
                height: 4,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Decode {
                expected: 64,
                actual: 10
            }
        ));
        assert_eq!(mgr.generation(), 0);
        assert!(mgr.staged().is_none());
    }

    #[test]
    fn oversized_dimensions_leave_buffers_untouched() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        mgr.ensure(geometry(2, 2)).unwrap();

        let lying = FrameGeometry::from_reported(16, i32::MAX, i32::MAX).unwrap();
        let err = mgr.ensure(lying).unwrap_err();
        assert!(matches!(err, RenderError::Decode { actual: 16, .. }));
        assert!(!err.is_fatal());

        assert_eq!(mgr.generation(), 1);
        let staged = mgr.staged().unwrap();
        assert_eq!((staged.width, staged.height), (2, 2));
        assert_eq!(mgr.buffer().capacity(), 16);
    }

    #[test]
    fn reallocation_clears_fill() {
        let mut mgr = FrameBufferManager::new(PixelFormat::Rgba8);
        mgr.ensure(geometry(2, 2)).unwrap();
        mgr.fill(|_| Ok(())).unwrap();
        mgr.ensure(geometry(3, 3)).unwrap();
        assert!(!mgr.buffer().is_filled());
    }
}
