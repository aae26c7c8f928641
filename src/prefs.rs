// Preferences - persisted user settings
// Loaded with full fallback to defaults: a corrupt file must never keep
// the metronome from starting.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::click::SoundType;
use crate::engine::tempo::Tempo;

/// Preferences persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed preferences: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory available")]
    NoConfigDir,
}

/// The scalar settings that survive across sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub tempo: u16,
    pub volume: f32,
    pub sound_type: SoundType,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tempo: Tempo::DEFAULT.bpm(),
            volume: 0.5,
            sound_type: SoundType::Sine,
        }
    }
}

impl Preferences {
    /// Clamp whatever was on disk into valid ranges. A stored value can
    /// be out of range (hand-edited file, older build); it must never be
    /// observable.
    pub fn sanitized(mut self) -> Self {
        self.tempo = Tempo::clamped(self.tempo as i64).bpm();
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            Self::default().volume
        };
        self
    }

    /// The tempo as a validated domain value
    pub fn initial_tempo(&self) -> Tempo {
        Tempo::clamped(self.tempo as i64)
    }

    /// Default location under the platform config directory
    pub fn default_path() -> Result<PathBuf, PrefsError> {
        Ok(dirs::config_dir()
            .ok_or(PrefsError::NoConfigDir)?
            .join("metrobeat")
            .join("preferences.json"))
    }

    /// Read preferences from `path`; any failure (missing file, bad
    /// JSON) yields the defaults
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<Self>(&text).ok())
            .map(Self::sanitized)
            .unwrap_or_default()
    }

    /// Write preferences to `path`, creating parent directories as
    /// needed
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
