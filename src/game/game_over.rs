//! Game over overlay
//!
//! Shows the final score over a dimmed view. After a short delay any mouse
//! click restarts the level with the same settings.

use glam::Vec2;

use super::level::start_request;
use crate::difficulty::Difficulty;
use crate::error::Result;
use crate::platform::MouseButton;
use crate::render::{Canvas, Color, Graphic, RectShape, Text};
use crate::settings::Settings;
use crate::sim::{Behavior, Entity, EntityCore, EntityKind, FrameContext};

/// Frames before a click restarts
pub const RESTART_DELAY: u64 = 60;
const BACKDROP: Color = Color::rgba(0, 0, 0, 160);

#[derive(Debug)]
pub struct GameOver {
    settings: Settings,
    clock: u64,
    restarting: bool,
}

impl GameOver {
    pub fn entity(settings: Settings, score: u64, difficulty: Difficulty, view_size: Vec2) -> Entity {
        let content = format!(
            "GAME OVER\n{}: {} points on {}\nClick to play again",
            settings.player_name,
            score,
            difficulty.as_str()
        );
        let text = Text {
            position: Vec2::new(view_size.x * 0.3, view_size.y * 0.4),
            content,
            char_size: 40,
            color: Color::WHITE,
        };
        let core = EntityCore::with_graphic(Graphic::Text(text)).without_collision();
        Entity::new(
            core,
            Self {
                settings,
                clock: 0,
                restarting: false,
            },
        )
    }
}

impl Behavior for GameOver {
    fn kind(&self) -> EntityKind {
        EntityKind::Ui
    }

    fn every_frame(&mut self, _core: &mut EntityCore, _ctx: &mut FrameContext<'_>) -> Result<()> {
        self.clock += 1;
        Ok(())
    }

    fn mouse_button_released(
        &mut self,
        _core: &mut EntityCore,
        _button: MouseButton,
        _position: Vec2,
        ctx: &mut FrameContext<'_>,
    ) -> Result<()> {
        if self.clock < RESTART_DELAY || self.restarting {
            return Ok(());
        }
        self.restarting = true;
        log::info!("Restarting on {}", self.settings.difficulty.as_str());
        ctx.commands.switch_to(start_request(self.settings.clone()));
        Ok(())
    }

    fn draw(&self, core: &EntityCore, canvas: &mut dyn Canvas, offset: Vec2) {
        // `offset` is the view's top-left, so this covers the whole view
        let backdrop = RectShape {
            position: Vec2::ZERO,
            size: Vec2::splat(4096.0),
            fill: BACKDROP,
        };
        canvas.draw(&Graphic::Rect(backdrop), offset);
        if let Some(graphic) = &core.graphic {
            canvas.draw(graphic, offset);
        }
    }
}
