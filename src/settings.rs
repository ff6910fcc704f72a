//! Game settings and preferences
//!
//! Stored as pretty-printed JSON next to the binary (or wherever the command
//! line points). Missing fields fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FPS, MAX_FPS, MIN_FPS, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::difficulty::Difficulty;
use crate::error::{GameError, Result};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Shown on the game-over overlay
    pub player_name: String,

    // === Display ===
    /// Target ticks per second
    pub fps: u32,
    pub window_width: u32,
    pub window_height: u32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    /// Directory holding maps, tileset and sprite sheets
    pub asset_dir: PathBuf,
    /// Seed for all gameplay randomness
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            player_name: "Zombie".into(),

            fps: DEFAULT_FPS,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            asset_dir: PathBuf::from("assets"),
            seed: 0x5EED_B4A1,
        }
    }
}

impl Settings {
    /// Tick rate clamped to the supported range
    pub fn effective_fps(&self) -> u32 {
        self.fps.clamp(MIN_FPS, MAX_FPS)
    }

    /// Read settings from a JSON file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| GameError::file_load_io(path, e))?;
        let settings: Settings = serde_json::from_str(&json)
            .map_err(|e| GameError::InvalidConfig(format!("{}: {e}", path.display())))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, using defaults when the file is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| GameError::file_load_io(path, e))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.difficulty = Difficulty::Hard;
        settings.seed = 42;
        settings.save(&path).unwrap();

        let loaded = Settings::try_load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("partial.json");
        std::fs::write(&partial, r#"{"difficulty": "Normal", "fps": 0}"#).unwrap();

        let settings = Settings::load(&partial);
        assert_eq!(settings.difficulty, Difficulty::Normal);
        assert_eq!(settings.effective_fps(), 1);
        assert_eq!(settings.window_width, WINDOW_WIDTH);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ nope").unwrap();
        assert!(matches!(Settings::try_load(&broken), Err(GameError::InvalidConfig(_))));
        assert_eq!(Settings::load(&broken), Settings::default());
        assert_eq!(Settings::load(dir.path().join("missing.json")), Settings::default());
    }
}
