//! Win32 window creation and message loop.
//!
//! The window produces [`WindowEvent`]s. [`SurfaceLifecycle`] turns them
//! into surface lifecycle steps for the [`SurfaceBinder`]: minimising
//! the window invalidates the surface and restoring it creates a new one.
//!
//! [`SurfaceBinder`]: rdv_core::SurfaceBinder

/// Events produced by the window message loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Window close requested (Alt-F4/X button).
    Close,
    /// Client area resized.
    Resize(u32, u32),
    /// Window minimised; nothing can be drawn.
    Minimized,
    /// Mouse moved (client-relative coordinates).
    MouseMove(i32, i32),
    /// Mouse button pressed or released at a client position.
    MouseButton(MouseBtn, bool, i32, i32),
    /// Mouse wheel delta.
    MouseWheel(i16),
    /// Mouse capture taken away mid-gesture.
    CaptureLost,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

// ── SurfaceLifecycle ─────────────────────────────────────────────

/// One step to apply to the surface binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Bind a new draw target for the window.
    Create,
    /// The drawable is now `width`×`height`.
    Resize(u32, u32),
    /// Unbind the draw target.
    Destroy,
}

/// Tracks whether the window currently has a drawable surface.
#[derive(Debug, Default)]
pub struct SurfaceLifecycle {
    bound: bool,
}

impl SurfaceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn on_event(&mut self, event: &WindowEvent) -> Vec<LifecycleStep> {
        match *event {
            WindowEvent::Resize(w, h) if w > 0 && h > 0 => {
                if self.bound {
                    vec![LifecycleStep::Resize(w, h)]
                } else {
                    self.bound = true;
                    vec![LifecycleStep::Create, LifecycleStep::Resize(w, h)]
                }
            }
            WindowEvent::Resize(..) | WindowEvent::Minimized | WindowEvent::Close => {
                if self.bound {
                    self.bound = false;
                    vec![LifecycleStep::Destroy]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }
}

// ── Win32 window ─────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::mpsc;

    use windows::Win32::Foundation::*;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use super::{MouseBtn, WindowEvent};

    /// Handle to the native window.
    pub struct NativeWindow {
        hwnd: HWND,
        event_rx: mpsc::Receiver<WindowEvent>,
    }

    fn client_pos(lparam: LPARAM) -> (i32, i32) {
        let x = (lparam.0 & 0xFFFF) as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
        (x, y)
    }

    fn button(tx: &mpsc::Sender<WindowEvent>, btn: MouseBtn, pressed: bool, lparam: LPARAM) {
        let (x, y) = client_pos(lparam);
        let _ = tx.send(WindowEvent::MouseButton(btn, pressed, x, y));
    }

    // GWLP_USERDATA holds a boxed sender that lives as long as the window.
    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let tx_ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) }
            as *const mpsc::Sender<WindowEvent>;

        if tx_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let tx = unsafe { &*tx_ptr };

        match msg {
            WM_CLOSE => {
                let _ = tx.send(WindowEvent::Close);
                LRESULT(0)
            }
            WM_SIZE => {
                if wparam.0 as u32 == SIZE_MINIMIZED {
                    let _ = tx.send(WindowEvent::Minimized);
                } else {
                    let w = (lparam.0 & 0xFFFF) as u32;
                    let h = ((lparam.0 >> 16) & 0xFFFF) as u32;
                    let _ = tx.send(WindowEvent::Resize(w, h));
                }
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let (x, y) = client_pos(lparam);
                let _ = tx.send(WindowEvent::MouseMove(x, y));
                LRESULT(0)
            }
            WM_LBUTTONDOWN => {
                button(tx, MouseBtn::Left, true, lparam);
                LRESULT(0)
            }
            WM_LBUTTONUP => {
                button(tx, MouseBtn::Left, false, lparam);
                LRESULT(0)
            }
            WM_RBUTTONDOWN => {
                button(tx, MouseBtn::Right, true, lparam);
                LRESULT(0)
            }
            WM_RBUTTONUP => {
                button(tx, MouseBtn::Right, false, lparam);
                LRESULT(0)
            }
            WM_MBUTTONDOWN => {
                button(tx, MouseBtn::Middle, true, lparam);
                LRESULT(0)
            }
            WM_MBUTTONUP => {
                button(tx, MouseBtn::Middle, false, lparam);
                LRESULT(0)
            }
            WM_MOUSEWHEEL => {
                let delta = ((wparam.0 >> 16) & 0xFFFF) as i16;
                let _ = tx.send(WindowEvent::MouseWheel(delta));
                LRESULT(0)
            }
            WM_CAPTURECHANGED => {
                let _ = tx.send(WindowEvent::CaptureLost);
                LRESULT(0)
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    impl NativeWindow {
        /// Create a new top-level window.
        ///
        /// The first event queued is a `Resize` carrying the initial
        /// client size.
        pub fn create(title: &str, width: u32, height: u32) -> Result<Self, String> {
            let (event_tx, event_rx) = mpsc::channel();

            let hinstance = unsafe { GetModuleHandleW(None) }
                .map_err(|e| format!("GetModuleHandle: {e}"))?;

            let class_name_wide: Vec<u16> = "RdvViewerClass\0".encode_utf16().collect();

            let wc = WNDCLASSW {
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name_wide.as_ptr()),
                hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
                ..Default::default()
            };

            let atom = unsafe { RegisterClassW(&wc) };
            if atom == 0 {
                return Err("RegisterClassW failed".into());
            }

            let title_wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();

            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(class_name_wide.as_ptr()),
                    PCWSTR(title_wide.as_ptr()),
                    WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                    CW_USEDEFAULT,
                    CW_USEDEFAULT,
                    width as i32,
                    height as i32,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| format!("CreateWindowExW failed: {e}"))?;

            if hwnd.is_invalid() {
                return Err("CreateWindowExW returned invalid HWND".into());
            }

            // WM_SIZE during creation arrives before the sender is
            // installed, so report the initial size by hand.
            let mut rect = RECT::default();
            if unsafe { GetClientRect(hwnd, &mut rect) }.is_ok() {
                let _ = event_tx.send(WindowEvent::Resize(
                    (rect.right - rect.left).max(0) as u32,
                    (rect.bottom - rect.top).max(0) as u32,
                ));
            }

            let tx_ptr = Box::into_raw(Box::new(event_tx));
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, tx_ptr as isize);
            }

            Ok(Self { hwnd, event_rx })
        }

        /// Pump windows messages (non-blocking). Returns collected events.
        pub fn poll_events(&self) -> Vec<WindowEvent> {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            self.event_rx.try_iter().collect()
        }

        /// The raw window handle.
        pub fn hwnd(&self) -> HWND {
            self.hwnd
        }
    }

    impl Drop for NativeWindow {
        fn drop(&mut self) {
            unsafe {
                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA)
                    as *mut mpsc::Sender<WindowEvent>;
                if !ptr.is_null() {
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    drop(Box::from_raw(ptr));
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::NativeWindow;

// ── Tests ────────────────────────────────────────────────────────
