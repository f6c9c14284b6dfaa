//! GDI draw target: blits staged frames into the window.
//!
//! Uses `StretchDIBits` for maximum compatibility. GDI wants 32-bit BGRA,
//! so RGBA frames are swizzled into a scratch buffer first.

use rdv_core::{PixelFormat, RenderError, StagedImage};

/// `image` as tightly packed BGRA bytes, converting through `scratch`
/// when needed.
pub fn bgra_pixels<'a>(
    image: &'a StagedImage,
    scratch: &'a mut Vec<u8>,
) -> Result<&'a [u8], RenderError> {
    match image.format {
        PixelFormat::Bgra8 => Ok(image.pixels.as_slice()),
        PixelFormat::Rgba8 => {
            scratch.clear();
            scratch.reserve(image.pixels.len());
            for px in image.pixels.chunks_exact(4) {
                scratch.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
            Ok(scratch.as_slice())
        }
        PixelFormat::Rgb565 => Err(RenderError::Draw(
            "GDI target needs a 32-bit pixel format".into(),
        )),
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use rdv_core::{DrawTarget, Rect, RenderError, StagedImage};
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::*;
    use windows::Win32::UI::WindowsAndMessaging::GetClientRect;

    use super::bgra_pixels;

    /// Draws into an HWND's client area.
    pub struct GdiTarget {
        hwnd: HWND,
        hdc: Option<HDC>,
        canvas: (u32, u32),
        scratch: Vec<u8>,
    }

    // SAFETY: the handles are plain identifiers owned by the window; GDI
    // calls on them are valid from any thread, and the binder serialises
    // every use behind its lock.
    unsafe impl Send for GdiTarget {}

    impl GdiTarget {
        /// Create a target for the given window.
        pub fn new(hwnd: HWND) -> Self {
            Self {
                hwnd,
                hdc: None,
                canvas: (0, 0),
                scratch: Vec::new(),
            }
        }

        fn release(&mut self) {
            if let Some(hdc) = self.hdc.take() {
                let _ = unsafe { ReleaseDC(self.hwnd, hdc) };
            }
        }
    }

    impl DrawTarget for GdiTarget {
        fn begin(&mut self) -> Result<(u32, u32), RenderError> {
            // A transaction abandoned by a failed draw is closed here.
            self.release();

            let mut rect = RECT::default();
            unsafe { GetClientRect(self.hwnd, &mut rect) }
                .map_err(|e| RenderError::Draw(format!("GetClientRect: {e}")))?;

            let hdc = unsafe { GetDC(self.hwnd) };
            if hdc.is_invalid() {
                return Err(RenderError::Draw("GetDC failed".into()));
            }
            self.hdc = Some(hdc);
            self.canvas = (
                (rect.right - rect.left).max(0) as u32,
                (rect.bottom - rect.top).max(0) as u32,
            );
            Ok(self.canvas)
        }

        fn draw(&mut self, image: &StagedImage, src: Rect, dst: Rect) -> Result<(), RenderError> {
            let Some(hdc) = self.hdc else {
                return Err(RenderError::Draw("draw outside transaction".into()));
            };
            let pixels = bgra_pixels(image, &mut self.scratch)?;

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: image.width as i32,
                    // Negative height = top-down DIB (origin at top-left).
                    biHeight: -(image.height as i32),
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    biSizeImage: 0,
                    biXPelsPerMeter: 0,
                    biYPelsPerMeter: 0,
                    biClrUsed: 0,
                    biClrImportant: 0,
                },
                bmiColors: [RGBQUAD::default(); 1],
            };

            let (cw, ch) = self.canvas;
            let covers = dst.x <= 0 && dst.y <= 0 && dst.width >= cw && dst.height >= ch;

            let lines = unsafe {
                if !covers {
                    // Letterbox bars.
                    let _ = PatBlt(hdc, 0, 0, cw as i32, ch as i32, BLACKNESS);
                }
                StretchDIBits(
                    hdc,
                    dst.x,
                    dst.y,
                    dst.width as i32,
                    dst.height as i32,
                    src.x,
                    src.y,
                    src.width as i32,
                    src.height as i32,
                    Some(pixels.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                )
            };
            if lines == 0 {
                return Err(RenderError::Draw("StretchDIBits failed".into()));
            }
            Ok(())
        }

        fn commit(&mut self) -> Result<(), RenderError> {
            if self.hdc.is_none() {
                return Err(RenderError::Draw("commit outside transaction".into()));
            }
            self.release();
            Ok(())
        }
    }

    impl Drop for GdiTarget {
        fn drop(&mut self) {
            self.release();
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::GdiTarget;

// ── Tests ────────────────────────────────────────────────────────
