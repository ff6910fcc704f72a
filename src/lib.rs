//! Brain Drain - a tile-map arcade game
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (tile map, entities, screen loop, spawners)
//! - `game`: The concrete entities and level setup built on `sim`
//! - `difficulty`: Difficulty bundles and score multipliers
//! - `platform`: Input events, frame pacing and the headless backend
//! - `render`: Drawables and the canvas abstraction
//! - `audio`: Sound and music cues
//! - `resources`: Cached asset loading
//! - `settings`: Player-facing configuration

pub mod audio;
pub mod difficulty;
pub mod error;
pub mod game;
pub mod platform;
pub mod render;
pub mod resources;
pub mod settings;
pub mod sim;

pub use difficulty::{Difficulty, DifficultyModifiers, ScoreKeeper};
pub use error::{GameError, Result};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Simulation rate every frame-denominated constant assumes
    pub const FRAMES_PER_SECOND: u64 = 60;
    /// Default target tick rate for a screen
    pub const DEFAULT_FPS: u32 = 60;
    /// Tick rate bounds accepted by the pacer
    pub const MIN_FPS: u32 = 1;
    pub const MAX_FPS: u32 = 1000;

    /// Default window size in pixels
    pub const WINDOW_WIDTH: u32 = 1024;
    pub const WINDOW_HEIGHT: u32 = 768;

    /// Sprite sheet layouts (columns x rows)
    pub const CHARACTER_SHEET: (u32, u32) = (4, 12);
    pub const CITIZEN_SHEET: (u32, u32) = (4, 4);
    pub const POTION_SHEET: (u32, u32) = (8, 1);

    /// Respawn cooldown jitter in frames (either direction)
    pub const RESPAWN_JITTER: i64 = 60;
    /// Shortest respawn cooldown after jitter
    pub const MIN_RESPAWN_COOLDOWN: i64 = 10;
}

/// A duration measured in simulation frames.
///
/// Delays handed to the scheduler are expressed in frames; the helpers convert
/// wall-clock units assuming the nominal 60 fps tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Frames(pub u64);

impl Frames {
    pub fn seconds(seconds: u64) -> Self {
        Self(seconds * consts::FRAMES_PER_SECOND)
    }

    pub fn minutes(minutes: u64) -> Self {
        Self::seconds(minutes * 60)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Frames {
    fn from(frames: u64) -> Self {
        Self(frames)
    }
}

/// Seconds of simulated time represented by a frame count
#[inline]
pub fn frames_to_seconds(frames: u64) -> f32 {
    frames as f32 / consts::FRAMES_PER_SECOND as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_units() {
        assert_eq!(Frames::seconds(2), Frames(120));
        assert_eq!(Frames::minutes(1).get(), 3600);
        assert!((frames_to_seconds(90) - 1.5).abs() < f32::EPSILON);
    }
}
