//! Binding to the engine's C entry points.
//!
//! With the `native` feature the symbols are linked from the `rustdesk`
//! library. Without it the binding is absent and every call reports
//! [`EngineError::LinkMissing`].

use crate::engine::Engine;
use crate::error::EngineError;

/// The production [`Engine`].
#[derive(Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

// ── Linked implementation ────────────────────────────────────────

#[cfg(feature = "native")]
mod platform {
    use std::ffi::{CString, c_char, c_int};

    use super::*;

    #[link(name = "rustdesk")]
    unsafe extern "C" {
        fn rdv_engine_init();
        fn rdv_session_start(id: *const c_char, password: *const c_char) -> c_int;
        fn rdv_session_stop(id: *const c_char) -> c_int;
        fn rdv_frame_size(id: *const c_char) -> c_int;
        fn rdv_frame_width(id: *const c_char) -> c_int;
        fn rdv_frame_height(id: *const c_char) -> c_int;
        fn rdv_fetch_frame(id: *const c_char, display: c_int, dest: *mut u8, len: usize) -> c_int;
        fn rdv_inject_input(id: *const c_char, payload: *const u8, len: usize) -> c_int;
    }

    fn c_string(s: &str) -> Result<CString, EngineError> {
        CString::new(s).map_err(|_| EngineError::Rejected("string contains NUL".into()))
    }

    fn check(code: c_int, call: &str) -> Result<(), EngineError> {
        if code == 0 {
            Ok(())
        } else {
            Err(EngineError::Rejected(format!("{call} returned {code}")))
        }
    }

    impl Engine for NativeEngine {
        fn init(&self) -> Result<(), EngineError> {
            unsafe { rdv_engine_init() };
            Ok(())
        }

        fn start_session(&self, id: &str, password: &str) -> Result<(), EngineError> {
            let id = c_string(id)?;
            let password = c_string(password)?;
            let code = unsafe { rdv_session_start(id.as_ptr(), password.as_ptr()) };
            check(code, "rdv_session_start")
        }

        fn stop_session(&self, id: &str) -> Result<(), EngineError> {
            let id = c_string(id)?;
            let code = unsafe { rdv_session_stop(id.as_ptr()) };
            check(code, "rdv_session_stop")
        }

        fn frame_size(&self, id: &str) -> Result<i32, EngineError> {
            let id = c_string(id)?;
            Ok(unsafe { rdv_frame_size(id.as_ptr()) })
        }

        fn width(&self, id: &str) -> Result<i32, EngineError> {
            let id = c_string(id)?;
            Ok(unsafe { rdv_frame_width(id.as_ptr()) })
        }

        fn height(&self, id: &str) -> Result<i32, EngineError> {
            let id = c_string(id)?;
            Ok(unsafe { rdv_frame_height(id.as_ptr()) })
        }

        fn fetch_frame(&self, id: &str, display: u32, dest: &mut [u8]) -> Result<(), EngineError> {
            let id = c_string(id)?;
            let display = c_int::try_from(display)
                .map_err(|_| EngineError::Rejected(format!("display {display} out of range")))?;
            // The engine writes at most `len` bytes into `dest`.
            let code =
                unsafe { rdv_fetch_frame(id.as_ptr(), display, dest.as_mut_ptr(), dest.len()) };
            if code == 0 {
                Ok(())
            } else {
                Err(EngineError::Failed(format!("rdv_fetch_frame returned {code}")))
            }
        }

        fn inject_input(&self, id: &str, payload: &[u8]) -> Result<(), EngineError> {
            let id = c_string(id)?;
            let code = unsafe { rdv_inject_input(id.as_ptr(), payload.as_ptr(), payload.len()) };
            check(code, "rdv_inject_input")
        }
    }
}

// ── Unlinked stub ────────────────────────────────────────────────

#[cfg(not(feature = "native"))]
mod platform {
    use super::*;

    impl Engine for NativeEngine {
        fn init(&self) -> Result<(), EngineError> {
            Err(EngineError::LinkMissing("rdv_engine_init"))
        }

        fn start_session(&self, _id: &str, _password: &str) -> Result<(), EngineError> {
            Err(EngineError::LinkMissing("rdv_session_start"))
        }

        fn stop_session(&self, _id: &str) -> Result<(), EngineError> {
            Err(EngineError::LinkMissing("rdv_session_stop"))
        }

        fn frame_size(&self, _id: &str) -> Result<i32, EngineError> {
            Err(EngineError::LinkMissing("rdv_frame_size"))
        }

        fn width(&self, _id: &str) -> Result<i32, EngineError> {
            Err(EngineError::LinkMissing("rdv_frame_width"))
        }

        fn height(&self, _id: &str) -> Result<i32, EngineError> {
            Err(EngineError::LinkMissing("rdv_frame_height"))
        }

        fn fetch_frame(&self, _id: &str, _display: u32, _dest: &mut [u8]) -> Result<(), EngineError> {
            Err(EngineError::LinkMissing("rdv_fetch_frame"))
        }

        fn inject_input(&self, _id: &str, _payload: &[u8]) -> Result<(), EngineError> {
            Err(EngineError::LinkMissing("rdv_inject_input"))
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(all(test, not(feature = "native")))]
mod tests {
    use super::*;

    #[test]
    fn unlinked_engine_reports_missing_link() {
        let engine = NativeEngine::new();
        assert!(engine.init().unwrap_err().is_link_missing());
        assert!(engine.start_session("123", "pw").unwrap_err().is_link_missing());
        let mut buf = [0u8; 4];
        assert!(engine.fetch_frame("123", 0, &mut buf).unwrap_err().is_link_missing());
    }
}
