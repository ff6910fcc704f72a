//! Zombie and mage blasts
//!
//! Blasts fly in a straight line at constant speed, ignore the map and expire
//! after a fixed number of frames. A zombie blast damages each mage it passes
//! through once; a mage blast counts how many frames it has spent on the
//! player so repeated hits can be dampened.

use glam::Vec2;

use crate::error::Result;
use crate::render::{Graphic, Sprite};
use crate::sim::{Behavior, Contact, Entity, EntityCore, EntityKind, FrameContext};

/// Regular zombie blast
pub const ZOMBIE_BLAST_SPEED: f32 = 3.5;
pub const ZOMBIE_BLAST_LIFETIME: u32 = 140;
pub const ZOMBIE_BLAST_DAMAGE: i32 = 1;
/// Potion-powered blast
pub const SUPER_BLAST_SPEED: f32 = 2.25;
pub const SUPER_BLAST_LIFETIME: u32 = 180;
pub const SUPER_BLAST_DAMAGE: i32 = 1000;
/// Mage blast (speed modifier is added on top)
pub const MAGE_BLAST_SPEED: f32 = 1.5;
pub const MAGE_BLAST_LIFETIME: u32 = 135;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Source {
    Zombie { damage: i32 },
    Mage,
}

#[derive(Debug)]
pub struct Blast {
    source: Source,
    velocity: Vec2,
    lifetime: u32,
    age: u32,
    hits: u32,
}

impl Blast {
    fn entity(mut sprite: Sprite, source: Source, from: Vec2, to: Vec2, speed: f32, lifetime: u32) -> Entity {
        let direction = (to - from).normalize_or(Vec2::X);
        sprite.origin = sprite.size() / 2.0;
        sprite.position = from;
        sprite.rotation = direction.y.atan2(direction.x).to_degrees();

        let core = EntityCore::with_graphic(Graphic::Sprite(sprite)).ignoring_obstacles();
        Entity::new(
            core,
            Self {
                source,
                velocity: direction * speed,
                lifetime,
                age: 0,
                hits: 0,
            },
        )
    }

    /// Player blast from `from` toward `to`
    pub fn zombie(sprite: Sprite, from: Vec2, to: Vec2, speed: f32, lifetime: u32, damage: i32) -> Entity {
        Self::entity(sprite, Source::Zombie { damage }, from, to, speed, lifetime)
    }

    /// Mage blast aimed at `to`
    pub fn mage(sprite: Sprite, from: Vec2, to: Vec2, speed: f32, lifetime: u32) -> Entity {
        Self::entity(sprite, Source::Mage, from, to, speed, lifetime)
    }
}

impl Behavior for Blast {
    fn kind(&self) -> EntityKind {
        match self.source {
            Source::Zombie { damage } => EntityKind::ZombieBlast { damage },
            Source::Mage => EntityKind::MageBlast { hits: self.hits },
        }
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.age += 1;
        if self.age >= self.lifetime {
            ctx.commands.remove(core.id);
            return Ok(());
        }
        core.translate(self.velocity);
        Ok(())
    }

    fn collision(&mut self, _core: &mut EntityCore, other: &Contact, _ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.source == Source::Mage && other.kind.is_player() {
            self.hits += 1;
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
    fn test_blast_flies_and_expires() {
        let mut screen = Screen::new(ScreenConfig::default(), SimContext::default());
        let id = screen
            .add(Blast::zombie(Sprite::blank(8, 8), Vec2::ZERO, Vec2::new(0.0, 10.0), 2.0, 3, 1))
            .unwrap();
        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();

        screen.tick(&mut platform, &stop).unwrap();
        let core = &screen.entity(id).unwrap().core;
        assert_eq!(core.position(), Some(Vec2::new(0.0, 2.0)));
        let sprite = core.graphic.as_ref().unwrap().as_sprite().unwrap();
        assert!((sprite.rotation - 90.0).abs() < 1e-4);

        screen.tick(&mut platform, &stop).unwrap();
        screen.tick(&mut platform, &stop).unwrap();
        assert!(screen.entity(id).is_none());
    }

    #[test]
    fn test_kind_reports_damage() {
        let blast = Blast::zombie(Sprite::blank(4, 4), Vec2::ZERO, Vec2::X, 1.0, 10, SUPER_BLAST_DAMAGE);
        assert_eq!(blast.kind(), EntityKind::ZombieBlast { damage: 1000 });
        let blast = Blast::mage(Sprite::blank(4, 4), Vec2::ZERO, Vec2::ZERO, 1.0, 10);
        assert_eq!(blast.kind(), EntityKind::MageBlast { hits: 0 });
    }
}
