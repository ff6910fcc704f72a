//! Heads-up display
//!
//! UI-layer entities that read the player snapshot and the score each frame.
//! Positions are view-relative; the screen shifts them by the view's top-left
//! when drawing.

use glam::Vec2;

use crate::error::Result;
use crate::render::{Canvas, Color, Graphic, RectShape, Sprite, Text};
use crate::sim::{Behavior, Entity, EntityCore, EntityKind, FrameContext};

const MARGIN: f32 = 20.0;
const HEALTH_BAR_SIZE: Vec2 = Vec2::new(300.0, 20.0);
const HEALTH_COLOR: Color = Color::rgba(200, 30, 30, 220);
const LOW_HEALTH_COLOR: Color = Color::rgba(255, 160, 0, 220);
/// Below this share of max health the bar changes color
const LOW_HEALTH: f32 = 0.2;
const TEXT_SIZE: u32 = 24;

fn text(position: Vec2, content: impl Into<String>) -> Graphic {
    Graphic::Text(Text {
        position,
        content: content.into(),
        char_size: TEXT_SIZE,
        color: Color::WHITE,
    })
}

fn set_text(core: &mut EntityCore, content: String) {
    if let Some(Graphic::Text(text)) = core.graphic.as_mut() {
        text.content = content;
    }
}

/// `mm:ss` for a frame count
pub fn clock_text(frames: u64) -> String {
    let seconds = frames / crate::consts::FRAMES_PER_SECOND;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Player health as a shrinking bar
#[derive(Debug, Default)]
pub struct HealthBar;

impl HealthBar {
    pub fn entity() -> Entity {
        let rect = RectShape {
            position: Vec2::splat(MARGIN),
            size: HEALTH_BAR_SIZE,
            fill: HEALTH_COLOR,
        };
        Entity::new(EntityCore::with_graphic(Graphic::Rect(rect)), Self)
    }
}

impl Behavior for HealthBar {
    fn kind(&self) -> EntityKind {
        EntityKind::Ui
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        let Some(stats) = ctx.player.and_then(|p| p.stats) else {
            return Ok(());
        };
        let share = (stats.health.max(0) as f32 / stats.max_health.max(1) as f32).min(1.0);
        if let Some(Graphic::Rect(rect)) = core.graphic.as_mut() {
            rect.size.x = HEALTH_BAR_SIZE.x * share;
            rect.fill = if share < LOW_HEALTH { LOW_HEALTH_COLOR } else { HEALTH_COLOR };
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ScoreText;

impl ScoreText {
    pub fn entity() -> Entity {
        let position = Vec2::new(MARGIN, MARGIN * 2.0 + HEALTH_BAR_SIZE.y);
        Entity::new(EntityCore::with_graphic(text(position, "Score: 0")), Self)
    }
}

impl Behavior for ScoreText {
    fn kind(&self) -> EntityKind {
        EntityKind::Ui
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        let score = &ctx.sim.score;
        set_text(core, format!("Score: {} (x{:.2})", score.score(), score.multiplier()));
        Ok(())
    }
}

/// Potion icon with a charge count beside it
#[derive(Debug)]
pub struct PotionCounter {
    label: Text,
}

impl PotionCounter {
    pub fn entity(icon: Sprite) -> Entity {
        let position = Vec2::new(MARGIN, MARGIN * 4.0 + HEALTH_BAR_SIZE.y);
        let label = Text {
            position: position + Vec2::new(icon.size().x + 8.0, 0.0),
            content: "0 / 0".into(),
            char_size: TEXT_SIZE,
            color: Color::WHITE,
        };
        Entity::new(EntityCore::with_graphic(Graphic::Sprite(icon.at(position))), Self { label })
    }
}

impl Behavior for PotionCounter {
    fn kind(&self) -> EntityKind {
        EntityKind::Ui
    }

    fn every_frame(&mut self, _core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if let Some(stats) = ctx.player.and_then(|p| p.stats) {
            self.label.content = format!("{} / {}", stats.potions, stats.max_potions);
        }
        Ok(())
    }

    fn draw(&self, core: &EntityCore, canvas: &mut dyn Canvas, offset: Vec2) {
        if let Some(icon) = &core.graphic {
            canvas.draw(icon, offset);
        }
        canvas.draw(&Graphic::Text(self.label.clone()), offset);
    }
}

/// Time survived, pinned to the top-right corner
#[derive(Debug, Default)]
pub struct Timer;

impl Timer {
    pub fn entity() -> Entity {
        Entity::new(EntityCore::with_graphic(text(Vec2::ZERO, clock_text(0))), Self)
    }
}

impl Behavior for Timer {
    fn kind(&self) -> EntityKind {
        EntityKind::Ui
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        let frames = ctx.player.and_then(|p| p.stats).map_or(0, |s| s.alive_frames);
        set_text(core, clock_text(frames));
        core.set_position(Vec2::new(ctx.view.size.x - MARGIN * 5.0, MARGIN));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPlatform, StopHandle};
    use crate::render::DrawKind;
    use crate::sim::{PlayerStats, Screen, ScreenConfig, SimContext};

    /// Stand-in main character with fixed stats
    struct Dummy(PlayerStats);

    impl Behavior for Dummy {
        fn kind(&self) -> EntityKind {
            EntityKind::Player(self.0)
        }
    }

    fn screen(stats: PlayerStats) -> Screen {
        let mut screen = Screen::new(ScreenConfig::default(), SimContext::default());
        let core = EntityCore::with_graphic(Graphic::Sprite(Sprite::blank(32, 32))).without_collision();
        screen.add_main_character(Entity::new(core, Dummy(stats))).unwrap();
        screen
    }

    fn stats() -> PlayerStats {
        PlayerStats {
            health: 250,
            max_health: 1000,
            potions: 2,
            max_potions: 6,
            alive: true,
            citizens_eaten: 0,
            alive_frames: 3725,
        }
    }

    #[test]
    fn test_clock_text() {
        assert_eq!(clock_text(0), "00:00");
        assert_eq!(clock_text(3725), "01:02");
    }

    #[test]
    fn test_hud_reflects_player() {
        let mut screen = screen(stats());
        let bar = screen.add_ui(HealthBar::entity()).unwrap();
        let timer = screen.add_ui(Timer::entity()).unwrap();
        let potions = screen.add_ui(PotionCounter::entity(Sprite::blank(24, 24))).unwrap();
        screen.add_ui(ScoreText::entity()).unwrap();

        let mut platform = HeadlessPlatform::new();
        screen.tick(&mut platform, &StopHandle::default()).unwrap();

        match &screen.entity(bar).unwrap().core.graphic {
            Some(Graphic::Rect(rect)) => assert!((rect.size.x - 75.0).abs() < 1e-3),
            other => panic!("unexpected graphic {other:?}"),
        }
        match &screen.entity(timer).unwrap().core.graphic {
            Some(Graphic::Text(text)) => assert_eq!(text.content, "01:02"),
            other => panic!("unexpected graphic {other:?}"),
        }
        // Icon and label both drawn
        assert_eq!(platform.canvas.calls.iter().filter(|c| c.kind == DrawKind::Text).count(), 3);
        assert!(screen.entity(potions).is_some());
    }
}
