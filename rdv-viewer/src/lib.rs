//! # rdv-viewer: Remote Desktop Viewer
//!
//! Opens one remote session through the engine, renders its frames into
//! a native Win32 window (or an in-memory canvas when headless) and
//! captures local pointer input for the session.

pub mod config;
pub mod display;
pub mod input;
pub mod window;
