//! Platform abstraction layer
//!
//! Bundles what a screen needs from the outside world for one tick:
//! - Input events
//! - A canvas to draw on
//! - An audio sink
//! - Frame pacing and the external stop signal

pub mod input;
pub mod time;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use input::{EventSource, InputEvent, Key, MouseButton, ScriptedInput};
pub use time::FramePacer;

use crate::audio::{AudioManager, AudioSink};
use crate::render::{Canvas, HeadlessCanvas};

/// The collaborators a running screen talks to
pub trait Platform {
    fn poll_event(&mut self) -> Option<InputEvent>;
    fn canvas(&mut self) -> &mut dyn Canvas;
    fn audio(&mut self) -> &mut dyn AudioSink;
    /// Called once per tick after presenting (headless backends advance scripts here)
    fn end_frame(&mut self) {}
}

/// Shared "keep running" flag
///
/// Clearing it from anywhere (another thread included) makes the active screen
/// stop at its next input-dispatch step.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl Default for StopHandle {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl StopHandle {
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Window-less platform: scripted input, recording canvas, logging audio
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    pub input: ScriptedInput,
    pub canvas: HeadlessCanvas,
    pub audio: AudioManager,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for HeadlessPlatform {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.input.poll_event()
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn audio(&mut self) -> &mut dyn AudioSink {
        &mut self.audio
    }

    fn end_frame(&mut self) {
        self.input.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_handle_shared() {
        let handle = StopHandle::default();
        let other = handle.clone();
        assert!(handle.is_running());
        other.stop();
        assert!(!handle.is_running());
        handle.reset();
        assert!(other.is_running());
    }
}
