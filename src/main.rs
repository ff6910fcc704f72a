//! Brain Drain entry point
//!
//! Runs the level headlessly: input comes from a short script, draw calls and
//! audio cues are recorded and logged. Usage:
//!
//! ```text
//! brain-drain [settings.json] [--ticks N]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use brain_drain::Settings;
use brain_drain::audio::AudioSink;
use brain_drain::game::start_request;
use brain_drain::platform::{HeadlessPlatform, InputEvent, Key, MouseButton};
use brain_drain::sim::{Director, RunEnd};

/// Ticks to run when `--ticks` is not given (one minute at 60 fps)
const DEFAULT_TICKS: u64 = 3600;

/// Run the Brain Drain level headlessly
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings JSON file (defaults are used when absent or unreadable)
    #[arg(value_name = "SETTINGS")]
    settings: Option<PathBuf>,
    /// Number of ticks to simulate before stopping
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TICKS)]
    ticks: u64,
}

/// Walk around a bit and throw a blast
fn demo_input(platform: &mut HeadlessPlatform) {
    let script = [
        (1, InputEvent::KeyPressed(Key::D)),
        (90, InputEvent::KeyReleased(Key::D)),
        (91, InputEvent::KeyPressed(Key::S)),
        (180, InputEvent::KeyReleased(Key::S)),
        (
            200,
            InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
                position: Vec2::new(700.0, 400.0),
            },
        ),
    ];
    for (frame, event) in script {
        platform.input.push_at(frame, event);
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let settings = args.settings.as_ref().map(Settings::load).unwrap_or_default();
    log::info!(
        "Brain Drain starting: {} on {} ({} fps, seed {:#x})",
        settings.player_name,
        settings.difficulty.as_str(),
        settings.effective_fps(),
        settings.seed
    );

    let mut platform = HeadlessPlatform::new();
    platform.audio.set_master_volume(settings.master_volume);
    platform.audio.set_sfx_volume(settings.sfx_volume);
    platform.audio.set_muted(settings.muted);
    platform.audio.set_music_volume(settings.music_volume * 100.0);
    demo_input(&mut platform);

    let mut director = Director::new(&settings.asset_dir);
    match director.run(start_request(settings), &mut platform, Some(args.ticks)) {
        Ok(summary) => {
            log::info!(
                "Ran {} ticks over {} screens, {} frames presented",
                summary.ticks,
                summary.screens,
                platform.canvas.frames_presented
            );
            match summary.end {
                RunEnd::Failed(e) => {
                    log::error!("Game stopped: {e}");
                    ExitCode::FAILURE
                }
                RunEnd::Closed | RunEnd::TickLimit => ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            log::error!("Could not start: {e}");
            ExitCode::FAILURE
        }
    }
}
