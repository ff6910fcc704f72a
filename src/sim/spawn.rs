//! Bounded respawning pools
//!
//! A [`RespawnManager`] keeps up to `max` entities of one archetype alive.
//! While the pool is short it counts down a jittered cooldown and, at zero,
//! spawns a fresh entity at a random safe spawn point. Pooled entities report
//! their death with [`Notice::Died`]; the manager never destroys them itself
//! except on [`Notice::ClearPool`].

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use super::context::FrameContext;
use super::entity::{Behavior, Entity, EntityCore, EntityId, EntityKind, Notice};
use crate::consts::{MIN_RESPAWN_COOLDOWN, RESPAWN_JITTER};
use crate::error::{GameError, Result};

/// Recipe for the entities a pool spawns
pub trait Archetype {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Build one entity at `position`; `spawner` is the pool to notify on death
    fn build(&mut self, position: Vec2, spawner: EntityId, ctx: &mut FrameContext<'_>)
    -> Result<Entity>;
}

pub struct RespawnManager<A> {
    archetype: A,
    max: usize,
    respawn_speed: u64,
    cooldown: u64,
    pool: BTreeSet<EntityId>,
}

impl<A: Archetype + 'static> RespawnManager<A> {
    /// A pool of at most `max` entities respawning roughly every `respawn_speed` frames
    pub fn new(archetype: A, max: usize, respawn_speed: u64) -> Result<Self> {
        if max == 0 {
            return Err(GameError::InvalidConfig(format!(
                "respawn pool for {} must allow at least one entity",
                archetype.name()
            )));
        }
        Ok(Self {
            archetype,
            max,
            respawn_speed,
            cooldown: 0,
            pool: BTreeSet::new(),
        })
    }

    pub fn into_entity(self) -> Entity {
        Entity::new(EntityCore::plain(), self)
    }

    /// Forget a pooled entity without destroying it
    pub fn died(&mut self, id: EntityId) {
        self.pool.remove(&id);
    }

    /// Queue removal of every pooled entity and empty the pool
    pub fn clear(&mut self, ctx: &mut FrameContext<'_>) {
        for id in std::mem::take(&mut self.pool) {
            ctx.commands.remove(id);
        }
    }

    pub fn pooled(&self) -> &BTreeSet<EntityId> {
        &self.pool
    }

    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    fn next_cooldown(&self, ctx: &mut FrameContext<'_>) -> u64 {
        let jitter = ctx.sim.rng.random_range(-RESPAWN_JITTER..RESPAWN_JITTER);
        (self.respawn_speed as i64 + jitter).max(MIN_RESPAWN_COOLDOWN) as u64
    }
}

impl<A: Archetype + 'static> Behavior for RespawnManager<A> {
    fn kind(&self) -> EntityKind {
        EntityKind::Spawner
    }

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.pool.len() >= self.max {
            return Ok(());
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return Ok(());
        }

        self.cooldown = self.next_cooldown(ctx);
        let position = ctx.random_safe_spawn()?;
        let entity = self.archetype.build(position, core.id, ctx)?;
        let id = ctx.commands.spawn(entity);
        self.pool.insert(id);
        log::debug!(
            "{} spawned {} at {:?} ({}/{}, next in {} frames)",
            self.archetype.name(),
            id,
            position,
            self.pool.len(),
            self.max,
            self.cooldown
        );
        Ok(())
    }

    fn on_notice(&mut self, _core: &mut EntityCore, notice: Notice, ctx: &mut FrameContext<'_>) -> Result<()> {
        match notice {
            Notice::Died(id) => self.died(id),
            Notice::ClearPool => self.clear(ctx),
        }
        Ok(())
    }

    fn removed_from_screen(&mut self, _core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.clear(ctx);
        Ok(())
    }
}
