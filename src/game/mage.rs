//! Mages: the zombie's enemies
//!
//! A mage drifts toward the player along one axis at a time, stops to cast a
//! blast every 100 frames and shows its remaining health in a bar above its
//! head. Each player blast damages it once; at zero health it reports to its
//! spawner, bumps the score multiplier and plays its death animation before
//! removing itself.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use super::projectile::{Blast, MAGE_BLAST_LIFETIME, MAGE_BLAST_SPEED};
use super::{Facing, sprites};
use crate::audio::SoundEffect;
use crate::difficulty::MageModifiers;
use crate::error::Result;
use crate::render::{Canvas, Color, Graphic, RectShape, Sprite};
use crate::sim::{
    Archetype, Behavior, Contact, Entity, EntityCore, EntityId, EntityKind, Footprint, FrameContext,
    Notice,
};

pub const BASE_HEALTH: i32 = 3;
const WALK_SPEED: f32 = 0.5;
const AIM_INTERVAL: u64 = 120;
const SHOT_INTERVAL: u64 = 100;
/// Frames the casting pose is held
const CAST_FRAMES: u32 = 50;
const WALK_ANIMATION_INTERVAL: u64 = 15;
const DEATH_ANIMATION_INTERVAL: u64 = 30;
const DEATH_FRAMES: u32 = 3;

const HEALTH_BAR_OFFSET: Vec2 = Vec2::new(5.0, -10.0);
const HEALTH_BAR_SIZE: Vec2 = Vec2::new(37.0, 5.0);
const HEALTH_BAR_COLOR: Color = Color::rgba(50, 255, 50, 140);

#[derive(Debug)]
pub struct Mage {
    spawner: Option<EntityId>,
    alive: bool,
    health: i32,
    max_health: i32,
    blast_speed: f32,
    facing: Facing,
    casting: bool,
    cast_timer: u32,
    clock: u64,
    column: u32,
    row: u32,
    death_column: u32,
    /// Player blasts that already hit this mage
    hit_by: BTreeSet<EntityId>,
}

impl Mage {
    pub fn new(spawner: Option<EntityId>, modifiers: &MageModifiers) -> Self {
        let health = (BASE_HEALTH + modifiers.health).max(1);
        Self {
            spawner,
            alive: true,
            health,
            max_health: health,
            blast_speed: MAGE_BLAST_SPEED + modifiers.blast_speed,
            facing: Facing::Down,
            casting: false,
            cast_timer: 0,
            clock: 0,
            column: 0,
            row: 0,
            death_column: 0,
            hit_by: BTreeSet::new(),
        }
    }

    /// A mage whose sprite is centred on `position`
    pub fn entity(sprite: Sprite, position: Vec2, spawner: Option<EntityId>, modifiers: &MageModifiers) -> Entity {
        let size = sprite.size();
        let feet = Footprint::feet(size, 0.3, size.x * 0.3);
        let mut core = EntityCore::with_graphic(Graphic::Sprite(sprite)).footprint(feet);
        core.center_on(position);
        Entity::new(core, Self::new(spawner, modifiers))
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn aim(&mut self, core: &EntityCore, ctx: &mut FrameContext<'_>) {
        let (Some(player), Some(position)) = (ctx.player, core.position()) else {
            return;
        };
        let horizontal = ctx.sim.rng.random_bool(0.5);
        self.facing = Facing::toward(position, player.position, horizontal);
    }

    fn cast(&mut self, core: &EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        let (Some(player), Some(position)) = (ctx.player, core.position()) else {
            return Ok(());
        };
        let sprite = ctx.sim.sprites.get(sprites::MAGE_BLAST)?;
        let blast = Blast::mage(sprite, position, player.position, self.blast_speed, MAGE_BLAST_LIFETIME);
        ctx.commands.spawn(blast);
        Ok(())
    }

    fn walk(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.clock % AIM_INTERVAL == 0 {
            self.aim(core, ctx);
        }

        if !self.casting {
            self.row = self.facing.row();
        }
        core.translate(self.facing.step() * WALK_SPEED);

        if self.clock % SHOT_INTERVAL == 0 {
            if !self.casting {
                self.row = 4 + self.facing.row();
                self.casting = true;
                self.cast_timer = 0;
            }
            self.cast(core, ctx)?;
        }

        self.cast_timer += 1;
        if self.cast_timer == CAST_FRAMES {
            self.casting = false;
        }
        if self.clock % WALK_ANIMATION_INTERVAL == 0 {
            self.column = super::next_column(self.column, 4);
        }
        Ok(())
    }

    fn animate_death(&mut self, core: &EntityCore, ctx: &mut FrameContext<'_>) {
        self.row = 8 + self.facing.row();
        self.column = self.death_column;
        if self.clock % DEATH_ANIMATION_INTERVAL == 0 {
            self.death_column += 1;
        }
        if self.death_column >= DEATH_FRAMES {
            ctx.commands.remove(core.id);
        }
    }

    fn die(&mut self, core: &EntityCore, ctx: &mut FrameContext<'_>) {
        if let Some(spawner) = self.spawner {
            ctx.commands.notify(spawner, Notice::Died(core.id));
        }
        self.alive = false;
        ctx.sim.mages_alive = ctx.sim.mages_alive.saturating_sub(1);
        ctx.sim.score.register_kill();
        let points = ctx.sim.score.award(20);
        ctx.play(SoundEffect::MageDeath, 30.0);
        log::debug!(
            "Mage {} killed for {} points (multiplier {:.2})",
            core.id,
            points,
            ctx.sim.score.multiplier()
        );
    }
}

impl Behavior for Mage {
    fn kind(&self) -> EntityKind {
        EntityKind::Mage { alive: self.alive }
    }

    fn added_to_screen(&mut self, _core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        ctx.sim.mages_alive += 1;
        let pick = ctx.sim.rng.random_range(0..Facing::ALL.len());
        self.facing = Facing::ALL[pick];
        Ok(())
    }

    fn removed_from_screen(&mut self, _core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.alive {
            ctx.sim.mages_alive = ctx.sim.mages_alive.saturating_sub(1);
        }
        Ok(())
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.clock += 1;
        if self.alive {
            self.walk(core, ctx)?;
        } else {
            self.animate_death(core, ctx);
        }
        if let Some(sprite) = core.graphic.as_mut().and_then(Graphic::as_sprite_mut) {
            sprite.set_frame(self.column, self.row);
        }
        Ok(())
    }

    fn collision(&mut self, core: &mut EntityCore, other: &Contact, ctx: &mut FrameContext<'_>) -> Result<()> {
        let EntityKind::ZombieBlast { damage } = other.kind else {
            return Ok(());
        };
        if !self.alive || !self.hit_by.insert(other.id) {
            return Ok(());
        }
        self.health -= damage;
        if self.health <= 0 {
            self.die(core, ctx);
        }
        Ok(())
    }

    fn draw(&self, core: &EntityCore, canvas: &mut dyn Canvas, offset: Vec2) {
        let Some(graphic) = &core.graphic else {
            return;
        };
        canvas.draw(graphic, offset);
        if !self.alive {
            return;
        }
        let share = self.health.max(0) as f32 / self.max_health as f32;
        let bar = RectShape {
            position: graphic.position() + HEALTH_BAR_OFFSET,
            size: Vec2::new(HEALTH_BAR_SIZE.x * share, HEALTH_BAR_SIZE.y),
            fill: HEALTH_BAR_COLOR,
        };
        canvas.draw(&Graphic::Rect(bar), offset);
    }
}

/// Spawns mages for a [`RespawnManager`](crate::sim::RespawnManager)
#[derive(Debug, Clone, Copy, Default)]
pub struct MageArchetype;

impl Archetype for MageArchetype {
    fn name(&self) -> &str {
        sprites::MAGE
    }

    fn build(&mut self, position: Vec2, spawner: EntityId, ctx: &mut FrameContext<'_>) -> Result<Entity> {
        let sprite = ctx.sim.sprites.get(sprites::MAGE)?;
        Ok(Mage::entity(sprite, position, Some(spawner), &ctx.sim.modifiers.mage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{Difficulty, MageModifiers};
    use crate::game::projectile::SUPER_BLAST_DAMAGE;
    use crate::platform::{HeadlessPlatform, StopHandle};
    use crate::render::DrawKind;
    use crate::sim::{Screen, ScreenConfig, SimContext};

    fn screen() -> Screen {
        let mut sim = SimContext::new(Difficulty::Easy, 3);
        sim.sprites.insert(sprites::MAGE_BLAST, Sprite::blank(8, 8));
        Screen::new(ScreenConfig::default(), sim)
    }

    fn blast_at(center: Vec2, damage: i32) -> Entity {
        // Stationary for the test: it points at its own origin
        Blast::zombie(Sprite::blank(10, 10), center, center, 0.0, 1000, damage)
    }

    #[test]
    fn test_health_follows_modifier() {
        let hard = Difficulty::Hard.modifiers().mage;
        assert_eq!(Mage::new(None, &hard).health(), BASE_HEALTH + 7);
        let weird = MageModifiers {
            health: -10,
            ..MageModifiers::default()
        };
        assert_eq!(Mage::new(None, &weird).health(), 1);
    }

    #[test]
    fn test_alive_count_tracks_mages() {
        let mut screen = screen();
        let modifiers = screen.sim().modifiers.mage.clone();
        let a = screen
            .add(Mage::entity(Sprite::blank(37, 48), Vec2::new(100.0, 100.0), None, &modifiers))
            .unwrap();
        screen
            .add(Mage::entity(Sprite::blank(37, 48), Vec2::new(400.0, 400.0), None, &modifiers))
            .unwrap();
        assert_eq!(screen.sim().mages_alive, 2);
        screen.remove(a).unwrap();
        assert_eq!(screen.sim().mages_alive, 1);
    }

    #[test]
    fn test_each_blast_hits_once() {
        let mut screen = screen();
        let modifiers = screen.sim().modifiers.mage.clone();
        let mage = screen
            .add(Mage::entity(Sprite::blank(37, 48), Vec2::new(200.0, 200.0), None, &modifiers))
            .unwrap();
        screen.add(blast_at(Vec2::new(200.0, 200.0), 1)).unwrap();

        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        for _ in 0..5 {
            screen.tick(&mut platform, &stop).unwrap();
        }
        let mage = screen.entity(mage).unwrap();
        assert_eq!(mage.kind(), EntityKind::Mage { alive: true });
        assert_eq!(screen.sim().mages_alive, 1);
    }

    #[test]
    fn test_kill_scores_and_animates_out() {
        let mut screen = screen();
        let modifiers = screen.sim().modifiers.mage.clone();
        let mage = screen
            .add(Mage::entity(Sprite::blank(37, 48), Vec2::new(200.0, 200.0), None, &modifiers))
            .unwrap();
        screen.add(blast_at(Vec2::new(200.0, 200.0), SUPER_BLAST_DAMAGE)).unwrap();

        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        screen.tick(&mut platform, &stop).unwrap();

        assert_eq!(screen.entity(mage).unwrap().kind(), EntityKind::Mage { alive: false });
        assert_eq!(screen.sim().mages_alive, 0);
        assert_eq!(screen.sim().score.score(), 20);
        assert!(screen.sim().score.multiplier() > 1.0);

        for _ in 0..(DEATH_ANIMATION_INTERVAL * 4) {
            screen.tick(&mut platform, &stop).unwrap();
        }
        assert!(screen.entity(mage).is_none());
        // Already uncounted when it died
        assert_eq!(screen.sim().mages_alive, 0);
    }

    #[test]
    fn test_health_bar_drawn_above_mage() {
        let mut screen = screen();
        let modifiers = screen.sim().modifiers.mage.clone();
        screen
            .add(Mage::entity(Sprite::blank(37, 48), Vec2::new(200.0, 200.0), None, &modifiers))
            .unwrap();
        let mut platform = HeadlessPlatform::new();
        let stop = StopHandle::default();
        screen.tick(&mut platform, &stop).unwrap();

        let calls = &platform.canvas.calls;
        let sprite = calls.iter().find(|c| c.kind == DrawKind::Sprite).unwrap();
        let bar = calls.iter().find(|c| c.kind == DrawKind::Rect).unwrap();
        assert_eq!(bar.position, sprite.position + HEALTH_BAR_OFFSET);
    }
}
