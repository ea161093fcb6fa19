//! Session configuration and injected render preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for the capture/edit session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// JPEG quality for persisted photos (1-100).
    pub export_quality: u8,
    /// Longest edge of live-preview renders, in pixels.
    pub preview_max_edge: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            export_quality: 90,
            preview_max_edge: 512,
        }
    }
}

/// Errors loading settings from disk.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SessionSettings {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

/// Read-only appearance preferences injected by the host.
///
/// These drive rendering chrome only (picker highlights, slider tint);
/// nothing in the pipeline consults them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPrefs {
    /// Accent color as RGB.
    pub accent: [u8; 3],
    /// Dark-mode flag.
    pub dark_mode: bool,
}

impl Default for RenderPrefs {
    fn default() -> Self {
        Self {
            accent: [0, 122, 255],
            dark_mode: false,
        }
    }
}
