//! Fixed-rate frame pacing

use std::time::{Duration, Instant};

use crate::consts::{MAX_FPS, MIN_FPS};

/// Sleeps out the remainder of each tick
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    tick: Duration,
}

impl FramePacer {
    /// A pacer for `fps` ticks per second (clamped to 1..=1000)
    pub fn new(fps: u32) -> Self {
        let fps = fps.clamp(MIN_FPS, MAX_FPS);
        Self {
            tick: Duration::from_micros(1_000_000 / u64::from(fps)),
        }
    }

    /// Minimum duration of one tick
    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Deadline for a tick that started at `started`
    pub fn deadline(&self, started: Instant) -> Instant {
        started + self.tick
    }

    /// Block until the tick that began at `started` has used its full budget
    pub fn wait(&self, started: Instant) {
        let deadline = self.deadline(started);
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration_from_fps() {
        assert_eq!(FramePacer::new(60).tick_duration(), Duration::from_micros(16_666));
        assert_eq!(FramePacer::new(0).tick_duration(), Duration::from_secs(1));
        assert_eq!(FramePacer::new(5000).tick_duration(), Duration::from_micros(1000));
    }

    #[test]
    fn test_wait_reaches_deadline() {
        let pacer = FramePacer::new(500);
        let started = Instant::now();
        pacer.wait(started);
        assert!(started.elapsed() >= pacer.tick_duration());
    }
}
