//! Viewer configuration.

use std::path::Path;
use std::time::Duration;

use rdv_core::{PixelFormat, PumpConfig, ScaleMode, SessionMode};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Session to open at startup.
    pub session: SessionConfig,
    /// Frame pump tuning.
    pub render: RenderConfig,
    /// Window / canvas settings.
    pub display: DisplayConfig,
    /// Pointer capture.
    pub input: InputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Remote peer id. Empty means "must be given on the command line".
    pub remote_id: String,
    pub mode: SessionMode,
}

/// Frame pump settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Milliseconds between polls of the engine.
    pub tick_ms: u64,
    /// How long `stop` waits for the pump thread, in milliseconds.
    pub join_timeout_ms: u64,
    /// Remote display to fetch.
    pub display_index: u32,
    /// "stretch" or "letterbox".
    pub scale_mode: ScaleMode,
    /// Pixel layout the engine hands out.
    pub pixel_format: PixelFormat,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial window width (canvas width when headless).
    pub width: u32,
    /// Initial window height (canvas height when headless).
    pub height: u32,
    pub title: String,
    /// Render into an in-memory canvas instead of a window.
    pub headless: bool,
}

/// Input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Capture pointer events delivered to the surface.
    pub capture_pointer: bool,
    /// Pending events kept before the oldest is dropped.
    pub queue_capacity: usize,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            join_timeout_ms: 1000,
            display_index: rdv_core::PRIMARY_DISPLAY,
            scale_mode: ScaleMode::Stretch,
            pixel_format: PixelFormat::Rgba8,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Remote Desktop".into(),
            headless: false,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            capture_pointer: true,
            queue_capacity: rdv_core::input::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Build the frame pump configuration, clamping out-of-range values.
    pub fn to_pump_config(&self) -> PumpConfig {
        PumpConfig {
            tick: Duration::from_millis(self.render.tick_ms.clamp(1, 1000)),
            display_index: self.render.display_index,
            join_timeout: Duration::from_millis(self.render.join_timeout_ms.max(50)),
            scale_mode: self.render.scale_mode,
            pixel_format: self.render.pixel_format,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
