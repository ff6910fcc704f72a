//! Level assembly
//!
//! Builds the playable screen for a difficulty: map, sprites, the player at
//! the map centre, citizen and mage spawners, the HUD and level music.

use std::rc::Rc;

use super::citizen::CitizenArchetype;
use super::hud::{HealthBar, PotionCounter, ScoreText, Timer};
use super::mage::MageArchetype;
use super::player::Player;
use super::sprites;
use crate::Frames;
use crate::audio::MusicTrack;
use crate::consts::{CHARACTER_SHEET, CITIZEN_SHEET, POTION_SHEET};
use crate::error::Result;
use crate::render::Sprite;
use crate::resources::{ResourceCache, Texture};
use crate::settings::Settings;
use crate::sim::{RespawnManager, Screen, ScreenConfig, SimContext, SwitchRequest, TileMap};

/// Citizen pools: sprite, pool size, respawn speed in frames
const CITIZEN_POOLS: [(&str, usize, u64); 6] = [
    ("boy", 5, 200),
    ("girl", 3, 200),
    ("man", 3, 200),
    ("woman", 3, 200),
    ("oldman", 3, 200),
    ("oldwoman", 3, 200),
];
const MAGE_POOL: usize = 12;
const MAGE_RESPAWN_SPEED: u64 = 175;
const LEVEL_MUSIC_VOLUME: f32 = 40.0;

/// Sprite sheets every level needs: bank name, file, columns x rows
const SHEETS: [(&str, &str, (u32, u32)); 7] = [
    (sprites::ZOMBIE, "zombie.png", CHARACTER_SHEET),
    (sprites::MAGE, "mage.png", CHARACTER_SHEET),
    (sprites::POTION, "potion.png", POTION_SHEET),
    (sprites::BLAST, "blast.png", (1, 1)),
    (sprites::BRAIN, "brain.png", (1, 1)),
    (sprites::MAGE_BLAST, "mage_blast.png", (1, 1)),
    (sprites::BRAIN_ICON, "brain_icon.png", (1, 1)),
];

fn load_sprites(sim: &mut SimContext, textures: &mut ResourceCache<Texture>) -> Result<()> {
    for (name, file, (columns, rows)) in SHEETS {
        sim.sprites.insert(name, Sprite::from_sheet(textures.get(file)?, columns, rows));
    }
    for name in sprites::CITIZENS {
        let texture = textures.get(format!("{name}.png"))?;
        sim.sprites.insert(name, Sprite::from_sheet(texture, CITIZEN_SHEET.0, CITIZEN_SHEET.1));
    }
    Ok(())
}

/// Build a fresh level screen for `settings`
pub fn build_level(settings: &Settings, textures: &mut ResourceCache<Texture>) -> Result<Screen> {
    let difficulty = settings.difficulty;
    let mut sim = SimContext::new(difficulty, settings.seed);
    load_sprites(&mut sim, textures)?;

    let modifiers = sim.modifiers.clone();
    let map = TileMap::load(textures, &modifiers.map.tileset, &modifiers.map.file)?;
    let center = map.pixel_size() / 2.0;
    let player_sprite = sim.sprites.get(sprites::ZOMBIE)?;
    let icon = sim.sprites.get(sprites::BRAIN_ICON)?;

    let config = ScreenConfig::new(settings.effective_fps(), settings.window_width, settings.window_height);
    let mut screen = Screen::new(config, sim);
    screen.add_map(Rc::new(map));
    screen.add_main_character(Player::entity(player_sprite, center, settings.clone(), &modifiers))?;

    for (sprite, max, speed) in CITIZEN_POOLS {
        let pool = RespawnManager::new(CitizenArchetype { sprite }, max, speed)?;
        screen.add(pool.into_entity())?;
    }
    let mages = RespawnManager::new(MageArchetype, MAGE_POOL, MAGE_RESPAWN_SPEED)?;
    screen.add(mages.into_entity())?;

    screen.add_ui(HealthBar::entity())?;
    screen.add_ui(ScoreText::entity())?;
    screen.add_ui(PotionCounter::entity(icon))?;
    screen.add_ui(Timer::entity())?;

    screen.schedule(
        |ctx| {
            ctx.commands.play_music(MusicTrack::Level);
            ctx.commands.set_music_volume(LEVEL_MUSIC_VOLUME);
            Ok(())
        },
        Frames(0),
        1,
    )?;

    log::info!(
        "Level ready on {} for {} ({} entities)",
        difficulty.as_str(),
        settings.player_name,
        screen.entities().len()
    );
    Ok(screen)
}

/// Switch request that builds a level for `settings`
pub fn start_request(settings: Settings) -> SwitchRequest {
    Box::new(move |textures: &mut ResourceCache<Texture>| build_level(&settings, textures))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use glam::Vec2;

    use super::*;
    use crate::difficulty::Difficulty;
    use crate::platform::{HeadlessPlatform, InputEvent, Key, MouseButton, StopHandle};
    use crate::sim::{Director, EntityId, EntityKind, RunEnd};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        image::RgbaImage::new(width, height)
            .save(dir.join(name))
            .expect("write test png");
    }

    /// Minimal asset directory: tiny sheets and an open 12x12 map walled by code 0
    fn assets(dir: &Path) {
        write_png(dir, "tileset.png", 288, 96);
        write_png(dir, "zombie.png", 128, 384);
        write_png(dir, "mage.png", 148, 576);
        write_png(dir, "potion.png", 128, 16);
        for name in ["blast.png", "brain.png", "mage_blast.png", "brain_icon.png"] {
            write_png(dir, name, 16, 16);
        }
        for name in sprites::CITIZENS {
            write_png(dir, &format!("{name}.png"), 128, 128);
        }

        let size = 12;
        let mut map = format!("{size} {size} 32 32\n");
        for row in 0..size {
            let line: Vec<&str> = (0..size)
                .map(|col| if row == 0 || col == 0 || row == size - 1 || col == size - 1 { "0" } else { "4" })
                .collect();
            map.push_str(&line.join(" "));
            map.push('\n');
        }
        std::fs::write(dir.join("map_easy.txt"), map).unwrap();
    }

    #[test]
    fn test_level_populates_screen() {
        let dir = tempfile::tempdir().unwrap();
        assets(dir.path());
        let mut textures = ResourceCache::new(dir.path());
        let settings = Settings::default();

        let mut screen = build_level(&settings, &mut textures).unwrap();
        assert!(screen.main_character().is_some());
        assert_eq!(screen.ids_where(|k| *k == EntityKind::Spawner).len(), 7);
        assert_eq!(screen.ids_where(|k| *k == EntityKind::Ui).len(), 4);

        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        for _ in 0..30 {
            screen.tick(&mut platform, &stop).unwrap();
        }
        assert_eq!(platform.audio.current_track(), Some(MusicTrack::Level));
        // Every pool spawns on its first tick; the player may already have eaten some
        let eaten = match screen.main_character().and_then(|id| screen.entity(id)).map(|e| e.kind()) {
            Some(EntityKind::Player(stats)) => stats.citizens_eaten as usize,
            other => panic!("unexpected main character {other:?}"),
        };
        assert_eq!(screen.ids_where(|k| *k == EntityKind::Citizen).len() + eaten, 6);
        assert_eq!(screen.sim().mages_alive, 1);
    }

    #[test]
    fn test_missing_map_is_file_load_error() {
        let dir = tempfile::tempdir().unwrap();
        assets(dir.path());
        let mut textures = ResourceCache::new(dir.path());
        let settings = Settings {
            difficulty: Difficulty::Hard,
            ..Settings::default()
        };
        let Err(err) = build_level(&settings, &mut textures) else {
            panic!("level built without its map");
        };
        assert!(err.is_file_load());
        assert!(err.to_string().contains("map_insane.txt"));
    }

    #[test]
    fn test_director_runs_level() {
        let dir = tempfile::tempdir().unwrap();
        assets(dir.path());
        let mut director = Director::new(dir.path());
        let settings = Settings {
            fps: 1000,
            ..Settings::default()
        };
        let summary = director
            .run(start_request(settings), &mut HeadlessPlatform::new(), Some(20))
            .unwrap();
        assert_eq!(summary.screens, 1);
        assert_eq!(summary.ticks, 20);
        assert!(matches!(summary.end, RunEnd::TickLimit));
    }

    type Snapshot = (u64, u64, Vec<(EntityId, EntityKind, Option<Vec2>)>);

    /// Score, frame and every entity after `frames` ticks of a scripted game
    fn play_scripted(dir: &Path, frames: u64) -> Snapshot {
        let mut textures = ResourceCache::new(dir);
        let mut screen = build_level(&Settings::default(), &mut textures).unwrap();

        let mut script = vec![
            (10, InputEvent::KeyPressed(Key::D)),
            (90, InputEvent::KeyReleased(Key::D)),
            (120, InputEvent::KeyPressed(Key::S)),
            (300, InputEvent::KeyReleased(Key::S)),
            (400, InputEvent::KeyPressed(Key::A)),
            (700, InputEvent::KeyReleased(Key::A)),
        ];
        for frame in (200..frames).step_by(250) {
            let position = Vec2::new(100.0 + frame as f32 % 300.0, 200.0);
            let button = MouseButton::Left;
            script.push((frame, InputEvent::MouseButtonPressed { button, position }));
            script.push((frame + 1, InputEvent::MouseButtonReleased { button, position }));
        }
        script.sort_by_key(|(frame, _)| *frame);

        let mut platform = HeadlessPlatform::new();
        for (frame, event) in script {
            platform.input.push_at(frame, event);
        }

        let stop = StopHandle::default();
        for _ in 0..frames {
            screen.tick(&mut platform, &stop).unwrap();
        }
        let entities = screen
            .entities()
            .all_ids()
            .into_iter()
            .filter_map(|id| screen.entity(id))
            .map(|e| (e.id(), e.kind(), e.core.position()))
            .collect();
        (screen.sim().score.score(), screen.frame(), entities)
    }

    #[test]
    fn test_determinism() {
        let dir = tempfile::tempdir().unwrap();
        assets(dir.path());

        let first = play_scripted(dir.path(), 1500);
        let second = play_scripted(dir.path(), 1500);
        assert!(first.2.len() > 8, "level emptied out: {:?}", first.2);
        assert_eq!(first, second);
    }
}
