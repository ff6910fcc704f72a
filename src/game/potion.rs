//! Anti-mage potion pickup

use crate::consts::POTION_SHEET;
use crate::error::Result;
use crate::render::{Graphic, Sprite};
use crate::sim::{Behavior, Contact, Entity, EntityCore, EntityKind, FrameContext};
use glam::Vec2;

const WIGGLE_SPEED: f32 = 1.1;
const WIGGLE_MAGNITUDE: f32 = 18.0;
const FRAME_INTERVAL: u64 = 10;

/// Wiggling bottle, picked up on contact with a live player
#[derive(Debug, Default)]
pub struct Potion {
    column: u32,
    rotation: f32,
    wiggle: f32,
}

impl Potion {
    /// A potion centred on `position`
    pub fn entity(mut sprite: Sprite, position: Vec2) -> Entity {
        sprite.origin = sprite.size() / 2.0;
        sprite.position = position;
        Entity::new(
            EntityCore::with_graphic(Graphic::Sprite(sprite)),
            Self {
                wiggle: 1.0,
                ..Self::default()
            },
        )
    }
}

impl Behavior for Potion {
    fn kind(&self) -> EntityKind {
        EntityKind::Potion
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if ctx.frame % FRAME_INTERVAL == 0 {
            self.column = crate::game::next_column(self.column, POTION_SHEET.0);
        }
        if self.rotation.abs() >= WIGGLE_MAGNITUDE {
            self.wiggle = -self.wiggle;
        }
        self.rotation += self.wiggle * WIGGLE_SPEED;

        if let Some(sprite) = core.graphic.as_mut().and_then(Graphic::as_sprite_mut) {
            sprite.set_frame(self.column, 0);
            sprite.rotation = self.rotation;
        }
        Ok(())
    }

    fn collision(&mut self, core: &mut EntityCore, other: &Contact, ctx: &mut FrameContext<'_>) -> Result<()> {
        if let EntityKind::Player(stats) = other.kind
            && stats.health > 0
        {
            ctx.commands.remove(core.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPlatform, StopHandle};
    use crate::sim::{Screen, ScreenConfig, SimContext};

    #[test]
    fn test_wiggle_stays_bounded() {
        let mut screen = Screen::new(ScreenConfig::default(), SimContext::default());
        let id = screen
            .add(Potion::entity(Sprite::blank(16, 16), Vec2::new(50.0, 50.0)))
            .unwrap();
        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        for _ in 0..200 {
            screen.tick(&mut platform, &stop).unwrap();
            let sprite = screen.entity(id).unwrap().core.graphic.as_ref().unwrap().as_sprite().cloned().unwrap();
            assert!(sprite.rotation.abs() <= WIGGLE_MAGNITUDE + WIGGLE_SPEED + 1e-3);
        }
        // Centred on its spawn point
        let bounds = screen.entity(id).unwrap().core.bounds().unwrap();
        assert_eq!(bounds.center(), Vec2::new(50.0, 50.0));
    }
}
