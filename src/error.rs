//! Crate-wide error type
//!
//! Every failure a screen can hit while ticking funnels into [`GameError`].
//! The screen's tick boundary decides what to do with it (log and close).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// A required asset or data file is missing or unreadable
    #[error("failed to load file: {}", path.display())]
    FileLoad {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },
    /// The map file exists but its contents are malformed
    #[error("malformed map file {}: {reason}", path.display())]
    MapFormat { path: PathBuf, reason: String },
    /// A spawn was requested on a map without safe spawn cells
    #[error("map has no safe spawn positions")]
    NoSafeSpawn,
    /// A sprite template was looked up but never registered
    #[error("no sprite registered under {0:?}")]
    MissingSprite(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Anything else that went wrong inside a tick
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl GameError {
    pub fn file_load(path: impl Into<PathBuf>) -> Self {
        Self::FileLoad {
            path: path.into(),
            source: None,
        }
    }

    pub fn file_load_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileLoad {
            path: path.into(),
            source: Some(source),
        }
    }

    /// True for errors caused by missing or corrupt files
    pub fn is_file_load(&self) -> bool {
        matches!(self, Self::FileLoad { .. } | Self::MapFormat { .. })
    }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
