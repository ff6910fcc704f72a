//! Per-level and per-frame context threaded through every entity hook
//!
//! [`SimContext`] lives as long as a level and holds everything that would
//! otherwise be global: modifiers, score, alive-mage count, RNG, sprites.
//! [`FrameContext`] borrows it for a single hook call together with the map,
//! a snapshot of the player and the [`Commands`] buffer.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{Entity, EntityId, Layer, Notice, PlayerStats};
use super::screen::Screen;
use super::tilemap::TileMap;
use crate::audio::{AudioCue, MusicTrack, SoundEffect};
use crate::difficulty::{Difficulty, DifficultyModifiers, ScoreKeeper};
use crate::error::{GameError, Result};
use crate::render::{SpriteBank, View};
use crate::resources::{ResourceCache, Texture};

/// Builds the next screen once the current loop has exited
pub type SwitchRequest = Box<dyn FnOnce(&mut ResourceCache<Texture>) -> Result<Screen>>;

/// Simulation state shared by every entity of one level
#[derive(Debug, Clone)]
pub struct SimContext {
    pub difficulty: Difficulty,
    pub modifiers: DifficultyModifiers,
    pub score: ScoreKeeper,
    pub mages_alive: u32,
    pub rng: Pcg32,
    pub sprites: SpriteBank,
}

impl SimContext {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_modifiers(difficulty, difficulty.modifiers(), seed)
    }

    /// Context with a custom modifier bundle (loaded from JSON, tests)
    pub fn with_modifiers(difficulty: Difficulty, modifiers: DifficultyModifiers, seed: u64) -> Self {
        Self {
            difficulty,
            score: ScoreKeeper::new(&modifiers.score),
            modifiers,
            mages_alive: 0,
            rng: Pcg32::seed_from_u64(seed),
            sprites: SpriteBank::default(),
        }
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(Difficulty::default(), 0)
    }
}

/// Read-only snapshot of the main character, refreshed before each phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub id: EntityId,
    /// Graphic position (top-left of the sprite)
    pub position: Vec2,
    /// Centre of the sprite bounds
    pub center: Vec2,
    pub alive: bool,
    /// Present when the main character is a player
    pub stats: Option<PlayerStats>,
}

/// Structural changes requested during a hook
///
/// Spawns, notices and audio are applied after the phase that produced them;
/// removals are held until the end of the tick.
#[derive(Default)]
pub struct Commands {
    next_id: u64,
    spawned: Vec<(Layer, Entity)>,
    removals: Vec<EntityId>,
    notices: Vec<(EntityId, Notice)>,
    audio: Vec<AudioCue>,
    switch: Option<SwitchRequest>,
    close: bool,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("next_id", &self.next_id)
            .field("spawned", &self.spawned.len())
            .field("removals", &self.removals)
            .field("notices", &self.notices)
            .field("switch", &self.switch.is_some())
            .field("close", &self.close)
            .finish()
    }
}

impl Commands {
    /// Hand out the next entity id (ids start at 1)
    pub fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    fn queue(&mut self, layer: Layer, mut entity: Entity) -> EntityId {
        let id = self.allocate_id();
        entity.core.id = id;
        self.spawned.push((layer, entity));
        id
    }

    /// Add an entity to the world (drawable if it has a graphic)
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let layer = entity.natural_layer();
        self.queue(layer, entity)
    }

    /// Add a view-relative UI entity
    pub fn spawn_ui(&mut self, entity: Entity) -> EntityId {
        self.queue(Layer::Ui, entity)
    }

    /// Queue an entity for removal at the end of the tick
    pub fn remove(&mut self, id: EntityId) {
        if !self.removals.contains(&id) {
            self.removals.push(id);
        }
    }

    pub fn is_removal_queued(&self, id: EntityId) -> bool {
        self.removals.contains(&id)
    }

    pub fn notify(&mut self, target: EntityId, notice: Notice) {
        self.notices.push((target, notice));
    }

    pub fn play(&mut self, effect: SoundEffect, volume_percent: f32) {
        self.audio.push(AudioCue::Effect(effect, volume_percent));
    }

    pub fn play_music(&mut self, track: MusicTrack) {
        self.audio.push(AudioCue::Music(track));
    }

    pub fn stop_music(&mut self) {
        self.audio.push(AudioCue::StopMusic);
    }

    pub fn set_music_volume(&mut self, volume_percent: f32) {
        self.audio.push(AudioCue::MusicVolume(volume_percent));
    }

    /// Ask for another screen; the current tick still completes
    pub fn switch_to(&mut self, request: SwitchRequest) {
        if self.switch.is_some() {
            log::warn!("Screen switch already pending, replacing it");
        }
        self.switch = Some(request);
    }

    pub fn is_switch_pending(&self) -> bool {
        self.switch.is_some()
    }

    /// Close the screen at the next input-dispatch step
    pub fn close(&mut self) {
        self.close = true;
    }

    pub fn is_close_requested(&self) -> bool {
        self.close
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<(Layer, Entity)> {
        std::mem::take(&mut self.spawned)
    }

    pub(crate) fn take_notices(&mut self) -> Vec<(EntityId, Notice)> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn take_removals(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.removals)
    }

    pub(crate) fn take_audio(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.audio)
    }

    pub(crate) fn take_switch(&mut self) -> Option<SwitchRequest> {
        self.switch.take()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.spawned.is_empty() || !self.notices.is_empty()
    }
}

/// Everything a hook may touch besides its own entity
pub struct FrameContext<'a> {
    /// Frame counter, starting at 0
    pub frame: u64,
    pub sim: &'a mut SimContext,
    pub map: Option<&'a TileMap>,
    pub commands: &'a mut Commands,
    pub player: Option<PlayerView>,
    /// Last known mouse position in world coordinates
    pub pointer: Vec2,
    pub view: View,
}

impl FrameContext<'_> {
    /// Random safe spawn point of the current map
    pub fn random_safe_spawn(&mut self) -> Result<Vec2> {
        match self.map {
            Some(map) => map.random_safe_spawn(&mut self.sim.rng),
            None => Err(GameError::NoSafeSpawn),
        }
    }

    pub fn play(&mut self, effect: SoundEffect, volume_percent: f32) {
        self.commands.play(effect, volume_percent);
    }
}
