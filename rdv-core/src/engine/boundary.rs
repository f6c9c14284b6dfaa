//! Process-wide engine instance.
//!
//! The native library is loaded once per process. [`install`] runs
//! [`Engine::init`] exactly once and publishes the engine; later calls are
//! rejected rather than re-initialising.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::info;

use crate::engine::Engine;
use crate::error::EngineError;

static ENGINE: OnceLock<Arc<dyn Engine>> = OnceLock::new();
static INSTALL: Mutex<()> = Mutex::new(());

/// Initialise `engine` and make it the process-wide instance.
///
/// Fails with [`EngineError::AlreadyInitialized`] on a second call, or with
/// whatever `init` reports. A failed `init` leaves nothing installed.
pub fn install(engine: Arc<dyn Engine>) -> Result<Arc<dyn Engine>, EngineError> {
    let _guard = INSTALL.lock().unwrap_or_else(PoisonError::into_inner);
    if ENGINE.get().is_some() {
        return Err(EngineError::AlreadyInitialized);
    }

    engine.init()?;
    info!("engine initialised");

    // Serialised by INSTALL, so the cell is still empty here.
    let installed = ENGINE.get_or_init(|| engine);
    Ok(Arc::clone(installed))
}

/// The installed engine.
pub fn get() -> Result<Arc<dyn Engine>, EngineError> {
    ENGINE.get().cloned().ok_or(EngineError::NotInitialized)
}

/// Whether [`install`] has completed.
pub fn is_installed() -> bool {
    ENGINE.get().is_some()
}
