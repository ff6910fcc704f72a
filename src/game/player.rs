//! The zombie under player control
//!
//! Health drains every frame and faster the healthier the zombie is, so the
//! player has to keep eating citizens. Mage blasts and mage contact hurt;
//! potions power a super blast. Once health hits zero the death animation
//! plays out and a [`GameOver`](super::game_over::GameOver) overlay appears.

use glam::Vec2;
use rand::Rng;

use super::game_over::GameOver;
use super::potion::Potion;
use super::projectile::{
    Blast, SUPER_BLAST_DAMAGE, SUPER_BLAST_LIFETIME, SUPER_BLAST_SPEED, ZOMBIE_BLAST_DAMAGE,
    ZOMBIE_BLAST_LIFETIME, ZOMBIE_BLAST_SPEED,
};
use super::{Facing, sprites};
use crate::audio::{MusicTrack, SoundEffect};
use crate::difficulty::{Difficulty, DifficultyModifiers};
use crate::error::Result;
use crate::platform::{Key, MouseButton};
use crate::render::{Color, Graphic, Sprite};
use crate::settings::Settings;
use crate::sim::{Behavior, Contact, Entity, EntityCore, EntityKind, Footprint, FrameContext, PlayerStats};

pub const BASE_MAX_HEALTH: i32 = 30 * 60 * 100;
pub const BASE_HEALTH_DRAIN: i32 = 15;
pub const DRAIN_PER_MAGE: i32 = 1;
pub const BASE_EAT_HEAL: i32 = 7000;
pub const BASE_ATTACK_COST: i32 = 250;
pub const BASE_MAX_POTIONS: i32 = 6;
pub const BASE_SPEED: i32 = 3;
pub const MAX_SPEED: i32 = 4;

/// Mage blast damage before dampening
const MAGE_BLAST_DAMAGE: i32 = 250;
const MIN_MAGE_BLAST_DAMAGE: i32 = 18;
const MAGE_TOUCH_DAMAGE: i32 = 100;

const TRAP_FRAMES: u32 = 120;
const GROAN_INTERVAL: u32 = 30;
const HURT_TINT_FRAMES: u32 = 2;
const WALK_ANIMATION_INTERVAL: u64 = 20;
const DEATH_ANIMATION_INTERVAL: u64 = 50;
const SPEED_STEP_INTERVAL: u64 = 6;
const EAT_SPEED_DECAY_DELAY: u32 = 60;
/// Health cost of a blast only applies above this share of max health
const ATTACK_COST_THRESHOLD: f32 = 0.2;

#[derive(Debug, Default, Clone, Copy)]
struct HeldKeys {
    up: bool,
    left: bool,
    down: bool,
    right: bool,
}

impl HeldKeys {
    fn any(&self) -> bool {
        self.up || self.left || self.down || self.right
    }

    fn set(&mut self, key: Key, held: bool) -> Option<Facing> {
        let (slot, facing) = match key {
            Key::W => (&mut self.up, Facing::Up),
            Key::A => (&mut self.left, Facing::Left),
            Key::S => (&mut self.down, Facing::Down),
            Key::D => (&mut self.right, Facing::Right),
            _ => return None,
        };
        *slot = held;
        Some(facing)
    }
}

#[derive(Debug)]
pub struct Player {
    settings: Settings,
    stats: PlayerStats,
    held: HeldKeys,
    facing: Facing,
    column: u32,
    row: u32,

    eat_heal: i32,
    health_drain: i32,
    mage_drain: i32,
    attack_cost: i32,
    drain_freeze: u32,
    eat_freeze_frames: u32,
    heal_bonus: f32,
    drain_penalty: f32,
    citizens_per_potion: u32,

    speed: i32,
    speed_decay_delay: u32,
    speed_restore_delay: u32,
    tint_delay: u32,
    trap_timer: u32,
    groan_timer: u32,

    dying: bool,
    dead: bool,
    death_column: u32,
}

impl Player {
    pub fn new(settings: Settings, modifiers: &DifficultyModifiers) -> Self {
        let p = &modifiers.player;
        let max_health = (BASE_MAX_HEALTH + p.max_health).max(1);
        let max_potions = (BASE_MAX_POTIONS + p.max_potions).max(0) as u32;
        Self {
            settings,
            stats: PlayerStats {
                health: max_health,
                max_health,
                potions: 0,
                max_potions,
                alive: true,
                citizens_eaten: 0,
                alive_frames: 0,
            },
            held: HeldKeys::default(),
            facing: Facing::Down,
            column: 0,
            row: 0,
            eat_heal: BASE_EAT_HEAL + p.eat_heal,
            health_drain: BASE_HEALTH_DRAIN + p.health_drain,
            mage_drain: DRAIN_PER_MAGE + modifiers.mage.health_drain,
            attack_cost: BASE_ATTACK_COST + p.attack_health_cost,
            drain_freeze: 0,
            eat_freeze_frames: p.eat_drain_freeze_frames,
            heal_bonus: p.missing_health_heal_bonus,
            drain_penalty: p.high_health_drain_penalty,
            citizens_per_potion: p.citizens_per_potion,
            speed: BASE_SPEED,
            speed_decay_delay: 0,
            speed_restore_delay: 0,
            tint_delay: 0,
            trap_timer: 0,
            groan_timer: 0,
            dying: false,
            dead: false,
            death_column: 0,
        }
    }

    /// Player entity with its sprite's top-left at `position`
    pub fn entity(sprite: Sprite, position: Vec2, settings: Settings, modifiers: &DifficultyModifiers) -> Entity {
        // Obstacles only stop the feet
        let size = sprite.size();
        let feet = Footprint::feet(size, 0.3, size.x * 0.3);
        let core = EntityCore::with_graphic(Graphic::Sprite(sprite.at(position))).footprint(feet);
        Entity::new(core, Self::new(settings, modifiers))
    }

    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    fn change_health(&mut self, change: i32) {
        self.stats.health = (self.stats.health + change).min(self.stats.max_health);
    }

    fn change_speed(&mut self, change: i32) {
        self.speed = (self.speed + change).clamp(0, MAX_SPEED);
    }

    fn health_ratio(&self) -> f32 {
        (self.stats.health as f32 / self.stats.max_health as f32).min(1.0)
    }

    fn take_damage(&mut self, core: &mut EntityCore, damage: i32) {
        self.change_health(-damage);
        set_tint(core, Color::HURT);
        self.tint_delay = HURT_TINT_FRAMES;
    }

    /// Health lost this frame
    fn drain_amount(&self, mages_alive: u32) -> i32 {
        let seconds = crate::frames_to_seconds(self.stats.alive_frames);
        let penalty = self.drain_penalty + seconds * (0.02 + self.drain_penalty * 0.01);
        let ratio = self.health_ratio();
        let scale = 1.0 + penalty * (ratio + ratio * ratio) * 0.5;
        let base = (self.health_drain as f32 * scale) as i32 + (seconds / 15.0) as i32;
        base + mages_alive as i32 * self.mage_drain
    }

    fn drain(&mut self, mages_alive: u32) {
        if self.drain_freeze > 0 {
            self.drain_freeze -= 1;
            return;
        }
        let amount = self.drain_amount(mages_alive);
        self.change_health(-amount);
    }

    /// Throttled groan when something hurts
    fn groan(&mut self, volume: f32, ctx: &mut FrameContext<'_>) {
        if self.groan_timer == 0 {
            ctx.play(SoundEffect::ZombieGroan, volume);
            self.groan_timer = GROAN_INTERVAL;
        }
    }

    fn check_trap(&mut self, core: &EntityCore, ctx: &mut FrameContext<'_>) {
        self.trap_timer = self.trap_timer.saturating_sub(1);
        let (Some(map), Some(bounds)) = (ctx.map, core.bounds()) else {
            return;
        };
        let foot = Vec2::new(bounds.min.x + bounds.size.x / 2.0, bounds.max().y);
        if map.is_trap(foot) {
            if self.trap_timer == 0 {
                self.trap_timer = TRAP_FRAMES;
                ctx.play(SoundEffect::Trap, 20.0);
            }
            self.speed = 1;
        }
    }

    fn walk(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) {
        if self.held.any() {
            if ctx.frame % WALK_ANIMATION_INTERVAL == 0 {
                self.column = super::next_column(self.column, 4);
            }
        } else {
            self.column = 0;
        }

        let speed = self.speed as f32;
        let held = self.held;
        for (pressed, facing) in [
            (held.up, Facing::Up),
            (held.left, Facing::Left),
            (held.down, Facing::Down),
            (held.right, Facing::Right),
        ] {
            if pressed {
                self.row = facing.row();
                core.translate(facing.step() * speed);
            }
        }
    }

    /// Drift back toward base speed
    fn settle_speed(&mut self, frame: u64) {
        if frame % SPEED_STEP_INTERVAL != 0 {
            return;
        }
        if self.speed > BASE_SPEED {
            self.speed_restore_delay = 0;
            if self.speed_decay_delay > 0 {
                self.speed_decay_delay -= 1;
            } else {
                self.change_speed(-1);
            }
        } else if self.speed < BASE_SPEED {
            self.speed_decay_delay = 0;
            if self.speed_restore_delay > 0 {
                self.speed_restore_delay -= 1;
            } else {
                self.change_speed(1);
            }
        }
    }

    /// Facing used for the death rows; a held key wins over the last facing
    fn death_facing(&self) -> Facing {
        let held = self.held;
        [
            (self.facing == Facing::Down || held.down, Facing::Down),
            (self.facing == Facing::Left || held.left, Facing::Left),
            (self.facing == Facing::Right || held.right, Facing::Right),
            (self.facing == Facing::Up || held.up, Facing::Up),
        ]
        .into_iter()
        .rev()
        .find(|(hit, _)| *hit)
        .map_or(self.facing, |(_, facing)| facing)
    }

    fn animate_death(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if !self.dead {
            set_tint(core, Color::HURT);
        }
        if !self.dying {
            self.dying = true;
            self.stats.alive = false;
            ctx.play(SoundEffect::ZombieDeath, 60.0);
            log::info!(
                "{} died after {:.1}s with {} citizens eaten",
                self.settings.player_name,
                crate::frames_to_seconds(self.stats.alive_frames),
                self.stats.citizens_eaten
            );
        }

        self.column = self.death_column;
        if ctx.frame % DEATH_ANIMATION_INTERVAL == 0 && !self.dead {
            self.death_column += 1;
            if self.death_column == 2 {
                ctx.commands.stop_music();
                ctx.commands.play_music(MusicTrack::GameOver);
                ctx.commands.set_music_volume(20.0);
            }
        }
        self.row = 4 + self.death_facing().row();

        if self.column == 3 && !self.dead {
            self.dead = true;
            set_tint(core, Color::TRANSPARENT);
            ctx.sim.score.freeze();
            let overlay = GameOver::entity(
                self.settings.clone(),
                ctx.sim.score.score(),
                ctx.sim.difficulty,
                ctx.view.size,
            );
            ctx.commands.spawn_ui(overlay);
        }
        Ok(())
    }

    fn fire(&mut self, core: &EntityCore, sprite: &str, target: Vec2, ctx: &mut FrameContext<'_>, super_blast: bool) -> Result<()> {
        let Some(bounds) = core.bounds() else {
            return Ok(());
        };
        let origin = bounds.min + Vec2::new(bounds.size.x / 2.0, bounds.size.y / 4.0);
        let sprite = ctx.sim.sprites.get(sprite)?;
        let blast = if super_blast {
            Blast::zombie(sprite, origin, target, SUPER_BLAST_SPEED, SUPER_BLAST_LIFETIME, SUPER_BLAST_DAMAGE)
        } else {
            Blast::zombie(sprite, origin, target, ZOMBIE_BLAST_SPEED, ZOMBIE_BLAST_LIFETIME, ZOMBIE_BLAST_DAMAGE)
        };
        ctx.play(SoundEffect::ZombieAttack, 40.0);
        ctx.commands.spawn(blast);
        Ok(())
    }

    fn eat(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let bite = ctx.sim.rng.random_range(0..SoundEffect::EAT.len());
        let volume = if bite < 2 { 80.0 } else { 50.0 };
        ctx.play(SoundEffect::EAT[bite], volume);

        self.stats.citizens_eaten += 1;
        if self.citizens_per_potion > 0 && self.stats.citizens_eaten % self.citizens_per_potion == 0 {
            let burp = ctx.sim.rng.random_range(0..SoundEffect::BURP.len());
            let volume = if burp < 2 { 70.0 } else { 50.0 };
            ctx.play(SoundEffect::BURP[burp], volume);

            let position = ctx.random_safe_spawn()?;
            let sprite = ctx.sim.sprites.get(sprites::POTION)?;
            ctx.commands.spawn(Potion::entity(sprite, position));
        }

        let multiplier = (1.0 + self.heal_bonus) - self.heal_bonus * self.health_ratio();
        self.change_health((self.eat_heal as f32 * multiplier) as i32);
        self.change_speed(1);
        self.speed_decay_delay = EAT_SPEED_DECAY_DELAY;
        ctx.sim.score.award(10);
        self.drain_freeze = self.eat_freeze_frames;
        Ok(())
    }

    fn drink(&mut self, ctx: &mut FrameContext<'_>) {
        ctx.play(SoundEffect::Potion, 40.0);
        self.stats.potions = (self.stats.potions + 1).min(self.stats.max_potions);
        self.change_health(self.eat_heal / 2);
        self.drain_freeze = self.eat_freeze_frames * 3;
    }
}

fn set_tint(core: &mut EntityCore, tint: Color) {
    if let Some(sprite) = core.graphic.as_mut().and_then(Graphic::as_sprite_mut) {
        sprite.tint = tint;
    }
}

impl Behavior for Player {
    fn kind(&self) -> EntityKind {
        EntityKind::Player(self.stats)
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.groan_timer = self.groan_timer.saturating_sub(1);
        self.check_trap(core, ctx);

        if self.stats.health > 0 {
            self.stats.alive_frames += 1;
            self.walk(core, ctx);
            self.drain(ctx.sim.mages_alive);
            if ctx.frame % 120 == 0 {
                ctx.sim.score.award(1);
            }
            self.settle_speed(ctx.frame);

            if self.tint_delay > 0 {
                self.tint_delay -= 1;
            } else {
                set_tint(core, Color::WHITE);
            }
        } else {
            self.animate_death(core, ctx)?;
        }

        if !self.dead
            && let Some(sprite) = core.graphic.as_mut().and_then(Graphic::as_sprite_mut)
        {
            sprite.set_frame(self.column, self.row);
        }
        Ok(())
    }

    fn key_pressed(&mut self, _core: &mut EntityCore, key: Key, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.dying {
            return Ok(());
        }
        if key == Key::Escape && ctx.sim.difficulty == Difficulty::Test {
            log::info!("Test difficulty: draining to death");
            self.health_drain = 10_000;
            self.mage_drain = DRAIN_PER_MAGE;
        }
        self.held.set(key, true);
        Ok(())
    }

    fn key_released(&mut self, _core: &mut EntityCore, key: Key, _ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.dying {
            return Ok(());
        }
        if let Some(facing) = self.held.set(key, false) {
            self.facing = facing;
        }
        Ok(())
    }

    fn mouse_button_released(
        &mut self,
        core: &mut EntityCore,
        button: MouseButton,
        position: Vec2,
        ctx: &mut FrameContext<'_>,
    ) -> Result<()> {
        if self.stats.health <= 0 {
            return Ok(());
        }
        if button == MouseButton::Left {
            if self.stats.health as f32 > ATTACK_COST_THRESHOLD * self.stats.max_health as f32 {
                self.change_health(-self.attack_cost);
            }
            self.fire(core, sprites::BLAST, position, ctx, false)
        } else if self.stats.potions > 0 {
            self.fire(core, sprites::BRAIN, position, ctx, true)?;
            self.stats.potions -= 1;
            Ok(())
        } else {
            Ok(())
        }
    }

    fn collision(&mut self, core: &mut EntityCore, other: &Contact, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.stats.health <= 0 {
            return Ok(());
        }
        match other.kind {
            EntityKind::MageBlast { hits } => {
                self.groan(15.0, ctx);
                let dampening = (1.0 + 0.01 * hits as f32).max(0.5);
                let base = MAGE_BLAST_DAMAGE + ctx.sim.modifiers.mage.attack_damage;
                let mut damage = (base as f32 / dampening) as i32;
                if ctx.sim.modifiers.score.minimum_blast_damage {
                    damage = damage.max(MIN_MAGE_BLAST_DAMAGE);
                }
                self.take_damage(core, damage);
            }
            EntityKind::Mage { alive } => {
                self.groan(10.0, ctx);
                if alive {
                    self.take_damage(core, MAGE_TOUCH_DAMAGE + ctx.sim.modifiers.mage.touch_damage);
                    self.speed = 1;
                }
            }
            EntityKind::Citizen => self.eat(ctx)?,
            EntityKind::Potion => self.drink(ctx),
            _ => {}
        }
        Ok(())
    }
}
