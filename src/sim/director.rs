//! Runs screens one after another
//!
//! Only one screen renders at a time. When a screen asks for a switch, its
//! loop exits first, the old screen is dropped, and only then is the next one
//! built and started.

use std::path::PathBuf;

use super::context::SwitchRequest;
use super::screen::{Screen, ScreenExit};
use crate::error::{GameError, Result};
use crate::platform::{Platform, StopHandle};
use crate::resources::{ResourceCache, Texture};

/// How a director run ended
#[derive(Debug)]
pub enum RunEnd {
    /// The last screen closed normally
    Closed,
    /// The tick budget was used up
    TickLimit,
    /// The last screen failed and was closed
    Failed(GameError),
}

/// Summary of a director run
#[derive(Debug)]
pub struct RunSummary {
    pub screens: u32,
    pub ticks: u64,
    pub end: RunEnd,
}

pub struct Director {
    textures: ResourceCache<Texture>,
    stop: StopHandle,
}

impl Director {
    /// A director loading assets relative to `asset_root`
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            textures: ResourceCache::new(asset_root),
            stop: StopHandle::default(),
        }
    }

    /// Handle that stops the active screen from anywhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn textures(&mut self) -> &mut ResourceCache<Texture> {
        &mut self.textures
    }

    /// Build the first screen from `start` and run until nothing is left to run
    ///
    /// Errors building a screen are returned; errors inside a screen end the
    /// run with [`RunEnd::Failed`].
    pub fn run(
        &mut self,
        start: SwitchRequest,
        platform: &mut dyn Platform,
        max_ticks: Option<u64>,
    ) -> Result<RunSummary> {
        let mut screen = self.build(start)?;
        let mut screens = 1;
        let mut ticks = 0u64;

        loop {
            let before = screen.frame();
            let budget = max_ticks.map(|limit| limit.saturating_sub(ticks));
            let exit = screen.run(platform, &self.stop, budget);
            ticks += screen.frame() - before;

            let end = match exit {
                ScreenExit::Switch(request) => {
                    drop(screen);
                    log::info!("Switching to screen {}", screens + 1);
                    screen = self.build(request)?;
                    screens += 1;
                    continue;
                }
                ScreenExit::Closed => RunEnd::Closed,
                ScreenExit::TickLimit => RunEnd::TickLimit,
                ScreenExit::Failed(err) => RunEnd::Failed(err),
            };
            log::info!("Director finished after {screens} screens and {ticks} ticks");
            return Ok(RunSummary { screens, ticks, end });
        }
    }

    fn build(&mut self, request: SwitchRequest) -> Result<Screen> {
        request(&mut self.textures).inspect_err(|e| log::error!("Failed to build screen: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frames;
    use crate::platform::HeadlessPlatform;
    use crate::sim::context::SimContext;
    use crate::sim::screen::ScreenConfig;

    fn fast() -> ScreenConfig {
        ScreenConfig::new(1000, 64, 64)
    }

    #[test]
    fn test_switches_then_stops_at_budget() {
        let mut director = Director::new(".");
        let start: SwitchRequest = Box::new(|_textures: &mut ResourceCache<Texture>| {
            let mut first = Screen::new(fast(), SimContext::default());
            first.schedule(
                |ctx| {
                    ctx.commands.switch_to(Box::new(|_textures: &mut ResourceCache<Texture>| {
                        Ok(Screen::new(fast(), SimContext::default()))
                    }));
                    Ok(())
                },
                Frames(1),
                1,
            )?;
            Ok(first)
        });

        let summary = director.run(start, &mut HeadlessPlatform::new(), Some(6)).unwrap();
        assert_eq!(summary.screens, 2);
        assert_eq!(summary.ticks, 6);
        assert!(matches!(summary.end, RunEnd::TickLimit));
    }

    #[test]
    fn test_stop_handle_ends_run() {
        let mut director = Director::new(".");
        director.stop_handle().stop();
        let start: SwitchRequest =
            Box::new(|_textures: &mut ResourceCache<Texture>| Ok(Screen::new(fast(), SimContext::default())));
        let summary = director.run(start, &mut HeadlessPlatform::new(), None).unwrap();
        assert!(matches!(summary.end, RunEnd::Closed));
    }

    #[test]
    fn test_build_errors_propagate() {
        let mut director = Director::new(".");
        let start: SwitchRequest =
            Box::new(|_textures: &mut ResourceCache<Texture>| Err(GameError::file_load("map_easy.txt")));
        let err = director.run(start, &mut HeadlessPlatform::new(), Some(1)).unwrap_err();
        assert!(err.is_file_load());
    }
}
