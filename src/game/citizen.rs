//! Townsfolk
//!
//! Citizens wander at random and get eaten when they touch a live player.
//! Eating is the player's business; the citizen only reports its death to its
//! spawner and removes itself.

use glam::Vec2;
use rand::Rng;

use super::Facing;
use crate::consts::CITIZEN_SHEET;
use crate::error::Result;
use crate::render::{Graphic, Sprite};
use crate::sim::{
    Archetype, Behavior, Contact, Entity, EntityCore, EntityId, EntityKind, Footprint, FrameContext,
    Notice,
};

const WALK_SPEED: f32 = 1.0;
/// Frames between direction changes
const WANDER_INTERVAL: u64 = 90;
const ANIMATION_INTERVAL: u64 = 15;

#[derive(Debug)]
pub struct Citizen {
    spawner: Option<EntityId>,
    facing: Facing,
    walking: bool,
    clock: u64,
    column: u32,
}

impl Citizen {
    pub fn new(spawner: Option<EntityId>) -> Self {
        Self {
            spawner,
            facing: Facing::Down,
            walking: false,
            clock: 0,
            column: 0,
        }
    }

    /// A citizen whose sprite is centred on `position`
    pub fn entity(sprite: Sprite, position: Vec2, spawner: Option<EntityId>) -> Entity {
        let feet = Footprint::feet(sprite.size(), 0.3, sprite.size().x * 0.3);
        let mut core = EntityCore::with_graphic(Graphic::Sprite(sprite)).footprint(feet);
        core.center_on(position);
        Entity::new(core, Self::new(spawner))
    }

    fn wander(&mut self, ctx: &mut FrameContext<'_>) {
        // One in five picks is standing still
        let pick = ctx.sim.rng.random_range(0..5);
        match Facing::ALL.get(pick) {
            Some(facing) => {
                self.facing = *facing;
                self.walking = true;
            }
            None => self.walking = false,
        }
    }
}

impl Behavior for Citizen {
    fn kind(&self) -> EntityKind {
        EntityKind::Citizen
    }

    fn added_to_screen(&mut self, _core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.wander(ctx);
        Ok(())
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.clock += 1;
        if self.clock % WANDER_INTERVAL == 0 {
            self.wander(ctx);
        }
        if self.walking {
            core.translate(self.facing.step() * WALK_SPEED);
            if self.clock % ANIMATION_INTERVAL == 0 {
                self.column = super::next_column(self.column, CITIZEN_SHEET.0);
            }
        } else {
            self.column = 0;
        }
        if let Some(sprite) = core.graphic.as_mut().and_then(Graphic::as_sprite_mut) {
            sprite.set_frame(self.column, self.facing.row());
        }
        Ok(())
    }

    fn collision(&mut self, core: &mut EntityCore, other: &Contact, ctx: &mut FrameContext<'_>) -> Result<()> {
        let EntityKind::Player(stats) = other.kind else {
            return Ok(());
        };
        if stats.health <= 0 || ctx.commands.is_removal_queued(core.id) {
            return Ok(());
        }
        if let Some(spawner) = self.spawner {
            ctx.commands.notify(spawner, Notice::Died(core.id));
        }
        ctx.commands.remove(core.id);
        Ok(())
    }
}

/// Spawns citizens wearing one sprite sheet
#[derive(Debug, Clone)]
pub struct CitizenArchetype {
    pub sprite: &'static str,
}

impl Archetype for CitizenArchetype {
    fn name(&self) -> &str {
        self.sprite
    }

    fn build(&mut self, position: Vec2, spawner: EntityId, ctx: &mut FrameContext<'_>) -> Result<Entity> {
        let sprite = ctx.sim.sprites.get(self.sprite)?;
        Ok(Citizen::entity(sprite, position, Some(spawner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPlatform, StopHandle};
    use crate::sim::{Screen, ScreenConfig, SimContext};

    #[test]
    fn test_citizen_wanders() {
        let mut screen = Screen::new(ScreenConfig::default(), SimContext::default());
        let id = screen
            .add(Citizen::entity(Sprite::blank(32, 32), Vec2::new(100.0, 100.0), None))
            .unwrap();
        let start = screen.entity(id).unwrap().core.position().unwrap();
        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        let mut moved = false;
        for _ in 0..(WANDER_INTERVAL * 10) {
            screen.tick(&mut platform, &stop).unwrap();
            moved |= screen.entity(id).unwrap().core.position().unwrap() != start;
        }
        assert!(moved);
    }
}
