//! The fixed-tick screen loop
//!
//! A [`Screen`] owns every live entity of a level in three id-ordered
//! mappings (plain, drawable, UI) and advances them one tick at a time:
//!
//! 1. Update: `every_frame` on all entities
//! 2. Input: drain platform events and route them to every entity
//! 3. Collision: pairwise AABB test between colliding drawables
//! 4. Obstacles: clamp drawables to the map and keep them off obstacle tiles
//! 5. Draw: map, drawables, then UI relative to the view
//! 6. Camera: follow the main character
//! 7. Removal: erase entities queued during the tick
//!
//! Spawns and notices produced by a phase are applied right after it; removals
//! always wait for step 7. [`Screen::run`] adds frame pacing and turns errors
//! and panics into a logged close.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use glam::{UVec2, Vec2};

use super::camera;
use super::collision::{Rect, clamp_into};
use super::context::{Commands, FrameContext, PlayerView, SimContext, SwitchRequest};
use super::entity::{Contact, Entity, EntityId, EntityKind, EntityStore, Layer};
use super::scheduler::Scheduler;
use super::tilemap::TileMap;
use crate::Frames;
use crate::audio::AudioSink;
use crate::consts::{DEFAULT_FPS, FRAMES_PER_SECOND, MAX_FPS, MIN_FPS, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::error::{GameError, Result};
use crate::platform::{FramePacer, InputEvent, Platform, StopHandle};
use crate::render::View;

/// Teleport attempts before an entity is declared unplaceable
pub const MAX_SPAWN_ATTEMPTS: u32 = 256;
/// Spawn/notice rounds applied after one phase before giving up
const MAX_FLUSH_ROUNDS: u32 = 64;

/// Loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConfig {
    /// Ticks per second, clamped to 1..=1000
    pub fps: u32,
    pub window_size: UVec2,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            window_size: UVec2::new(WINDOW_WIDTH, WINDOW_HEIGHT),
        }
    }
}

impl ScreenConfig {
    pub fn new(fps: u32, width: u32, height: u32) -> Self {
        Self {
            fps: fps.clamp(MIN_FPS, MAX_FPS),
            window_size: UVec2::new(width.max(1), height.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Built but not ticked yet
    Idle,
    Rendering,
    /// A switch request is waiting for the loop to exit
    SwitchRequested,
    Closed,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Closed,
    SwitchRequested,
}

/// Why [`Screen::run`] returned
pub enum ScreenExit {
    Closed,
    Switch(SwitchRequest),
    /// A tick failed; the screen is closed
    Failed(GameError),
    /// The caller's tick budget ran out
    TickLimit,
}

impl std::fmt::Debug for ScreenExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenExit::Closed => write!(f, "Closed"),
            ScreenExit::Switch(_) => write!(f, "Switch"),
            ScreenExit::Failed(e) => write!(f, "Failed({e})"),
            ScreenExit::TickLimit => write!(f, "TickLimit"),
        }
    }
}

/// Wall-clock time spent in the timed phases of a tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimes {
    pub input: Duration,
    pub collision: Duration,
    pub draw: Duration,
    pub total: Duration,
}

impl PhaseTimes {
    fn accumulate(&mut self, other: &PhaseTimes) {
        self.input += other.input;
        self.collision += other.collision;
        self.draw += other.draw;
        self.total += other.total;
    }

    fn divided_by(&self, samples: u32) -> PhaseTimes {
        let samples = samples.max(1);
        PhaseTimes {
            input: self.input / samples,
            collision: self.collision / samples,
            draw: self.draw / samples,
            total: self.total / samples,
        }
    }
}

/// Sums phase times over a window of ticks
#[derive(Debug, Default)]
struct FrameTimings {
    sum: PhaseTimes,
    samples: u32,
    last_average: Option<PhaseTimes>,
}

impl FrameTimings {
    /// Add one tick; once `window` ticks are in, returns their average and starts over
    fn record(&mut self, times: PhaseTimes, window: u32) -> Option<PhaseTimes> {
        self.sum.accumulate(&times);
        self.samples += 1;
        if self.samples < window {
            return None;
        }
        let average = self.sum.divided_by(self.samples);
        self.sum = PhaseTimes::default();
        self.samples = 0;
        self.last_average = Some(average);
        Some(average)
    }
}

/// Everything except the entities themselves, so hooks can borrow it while an
/// entity is borrowed from the store
struct World {
    frame: u64,
    sim: SimContext,
    map: Option<Rc<TileMap>>,
    commands: Commands,
    view: View,
    pointer: Vec2,
    player: Option<PlayerView>,
}

impl World {
    fn context(&mut self) -> FrameContext<'_> {
        FrameContext {
            frame: self.frame,
            sim: &mut self.sim,
            map: self.map.as_deref(),
            commands: &mut self.commands,
            player: self.player,
            pointer: self.pointer,
            view: self.view,
        }
    }
}

pub struct Screen {
    entities: EntityStore,
    world: World,
    main_character: Option<EntityId>,
    config: ScreenConfig,
    state: ScreenState,
    pending_switch: Option<SwitchRequest>,
    timings: FrameTimings,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("frame", &self.world.frame)
            .field("state", &self.state)
            .field("entities", &self.entities.len())
            .field("main_character", &self.main_character)
            .field("config", &self.config)
            .field("switch_pending", &self.pending_switch.is_some())
            .finish()
    }
}

impl Screen {
    pub fn new(config: ScreenConfig, sim: SimContext) -> Self {
        let view = View::from_window(config.window_size.x, config.window_size.y);
        Self {
            entities: EntityStore::default(),
            world: World {
                frame: 0,
                sim,
                map: None,
                commands: Commands::default(),
                view,
                pointer: Vec2::ZERO,
                player: None,
            },
            main_character: None,
            config,
            state: ScreenState::Idle,
            pending_switch: None,
            timings: FrameTimings::default(),
        }
    }

    /// Share a map with this screen
    pub fn add_map(&mut self, map: Rc<TileMap>) {
        self.world.map = Some(map);
    }

    pub fn map(&self) -> Option<&TileMap> {
        self.world.map.as_deref()
    }

    /// Add an entity (drawable if it has a graphic, plain otherwise)
    pub fn add(&mut self, entity: Entity) -> Result<EntityId> {
        let id = self.world.commands.spawn(entity);
        self.flush()?;
        Ok(id)
    }

    /// Add a view-relative UI entity
    pub fn add_ui(&mut self, entity: Entity) -> Result<EntityId> {
        let id = self.world.commands.spawn_ui(entity);
        self.flush()?;
        Ok(id)
    }

    /// Add the entity the camera follows
    pub fn add_main_character(&mut self, entity: Entity) -> Result<EntityId> {
        let id = self.world.commands.spawn(entity);
        self.main_character = Some(id);
        self.flush()?;
        Ok(id)
    }

    pub fn main_character(&self) -> Option<EntityId> {
        self.main_character
    }

    /// Remove an entity right away, running its removal hook
    ///
    /// Entities removing others from inside a tick go through
    /// [`Commands::remove`](super::context::Commands::remove) instead, which
    /// defers to the end of the tick.
    pub fn remove(&mut self, id: EntityId) -> Result<bool> {
        let removed = self.detach(id)?;
        self.process_removals()?;
        self.flush()?;
        Ok(removed)
    }

    /// Run `action` after `delay`, `repeat_count` times (0 = forever)
    pub fn schedule(
        &mut self,
        action: impl FnMut(&mut FrameContext<'_>) -> Result<()> + 'static,
        delay: Frames,
        repeat_count: u32,
    ) -> Result<EntityId> {
        self.add(Scheduler::new(action, delay, repeat_count).into_entity())
    }

    /// Stop the loop at the next input-dispatch step
    pub fn close(&mut self) {
        self.world.commands.close();
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn config(&self) -> ScreenConfig {
        self.config
    }

    /// Number of completed ticks
    pub fn frame(&self) -> u64 {
        self.world.frame
    }

    pub fn view(&self) -> View {
        self.world.view
    }

    /// Mouse position in world coordinates
    pub fn pointer(&self) -> Vec2 {
        self.world.pointer
    }

    pub fn sim(&self) -> &SimContext {
        &self.world.sim
    }

    pub fn sim_mut(&mut self) -> &mut SimContext {
        &mut self.world.sim
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Ids of every live entity with the given tag predicate
    pub fn ids_where(&self, pred: impl Fn(&EntityKind) -> bool) -> Vec<EntityId> {
        self.entities
            .all_ids()
            .into_iter()
            .filter(|id| self.entities.get(*id).is_some_and(|e| pred(&e.kind())))
            .collect()
    }

    /// Phase averages over the last complete window of [`FRAMES_PER_SECOND`] ticks
    pub fn frame_timings(&self) -> Option<PhaseTimes> {
        self.timings.last_average
    }

    /// Take the switch request left by the last tick
    pub fn take_switch(&mut self) -> Option<SwitchRequest> {
        self.pending_switch.take()
    }

    /// Run one tick against `platform`
    pub fn tick(&mut self, platform: &mut dyn Platform, stop: &StopHandle) -> Result<TickOutcome> {
        match self.state {
            ScreenState::Closed => return Ok(TickOutcome::Closed),
            ScreenState::SwitchRequested => return Ok(TickOutcome::SwitchRequested),
            ScreenState::Idle | ScreenState::Rendering => {}
        }
        self.state = ScreenState::Rendering;
        let frame_started = Instant::now();

        // 1. Update
        self.refresh_player();
        for id in self.entities.all_ids() {
            self.run_hook(id, |e, ctx| e.behavior.every_frame(&mut e.core, ctx))?;
        }
        self.flush()?;
        self.flush_audio(platform.audio());

        // 2. Input
        let input_started = Instant::now();
        if self.stop_requested(stop) {
            return Ok(self.shut());
        }
        while let Some(event) = platform.poll_event() {
            if event == InputEvent::Closed || self.stop_requested(stop) {
                return Ok(self.shut());
            }
            if let InputEvent::Resized { width, height } = event {
                self.world.view = View::from_window(width.max(1), height.max(1));
            }
            if let Some(pixel) = event.pointer_position() {
                self.world.pointer = self.world.view.to_world(pixel);
            }
            self.refresh_player();
            for id in self.entities.all_ids() {
                self.run_hook(id, |e, ctx| e.dispatch(&event, ctx))?;
            }
            self.flush()?;
            self.flush_audio(platform.audio());
        }

        let input_time = input_started.elapsed();

        // 3. Collision
        let collision_started = Instant::now();
        self.refresh_player();
        self.detect_collisions()?;
        self.flush()?;
        let collision_time = collision_started.elapsed();

        // 4. Obstacles
        if let Some(map) = self.world.map.clone() {
            for id in self.entities.ids(Layer::Drawable) {
                self.resolve_obstacles(id, &map)?;
            }
        }

        // 5. Draw
        let draw_started = Instant::now();
        let canvas = platform.canvas();
        canvas.clear();
        canvas.set_view(&self.world.view);
        if let Some(map) = &self.world.map {
            canvas.draw_map(map);
        }
        for entity in self.entities.iter(Layer::Drawable) {
            entity.behavior.draw(&entity.core, canvas, Vec2::ZERO);
        }
        let ui_offset = self.world.view.top_left();
        for entity in self.entities.iter(Layer::Ui) {
            entity.behavior.draw(&entity.core, canvas, ui_offset);
        }

        // 6. Camera
        self.follow_main_character();
        canvas.set_view(&self.world.view);
        canvas.present();
        let draw_time = draw_started.elapsed();

        // 7. Removal
        self.process_removals()?;
        self.flush()?;
        self.flush_audio(platform.audio());

        platform.end_frame();
        self.world.frame += 1;
        self.record_timings(PhaseTimes {
            input: input_time,
            collision: collision_time,
            draw: draw_time,
            total: frame_started.elapsed(),
        });

        if let Some(request) = self.world.commands.take_switch() {
            log::info!("Screen switch requested at frame {}", self.world.frame);
            self.pending_switch = Some(request);
            self.state = ScreenState::SwitchRequested;
            return Ok(TickOutcome::SwitchRequested);
        }
        Ok(TickOutcome::Continue)
    }

    /// Tick until the screen closes, switches, fails or `max_ticks` run out
    ///
    /// Each tick is padded to `1 / fps` seconds. Errors and panics inside a
    /// tick are logged and close the screen; they never propagate.
    pub fn run(
        &mut self,
        platform: &mut dyn Platform,
        stop: &StopHandle,
        max_ticks: Option<u64>,
    ) -> ScreenExit {
        let pacer = FramePacer::new(self.config.fps);
        let mut ticks = 0u64;
        log::info!(
            "Screen running at {} fps with {} entities",
            self.config.fps,
            self.entities.len()
        );

        loop {
            if max_ticks.is_some_and(|limit| ticks >= limit) {
                return ScreenExit::TickLimit;
            }
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.tick(&mut *platform, stop)));
            ticks += 1;

            match outcome {
                Ok(Ok(TickOutcome::Continue)) => pacer.wait(started),
                Ok(Ok(TickOutcome::Closed)) => return ScreenExit::Closed,
                Ok(Ok(TickOutcome::SwitchRequested)) => {
                    return match self.pending_switch.take() {
                        Some(request) => ScreenExit::Switch(request),
                        None => ScreenExit::Closed,
                    };
                }
                Ok(Err(err)) => {
                    if err.is_file_load() {
                        log::error!("{err} -- fatal error, closing screen");
                    } else {
                        log::error!("Error during frame {}: {err}", self.world.frame);
                    }
                    self.state = ScreenState::Closed;
                    return ScreenExit::Failed(err);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("Panic during frame {}: {message}", self.world.frame);
                    self.state = ScreenState::Closed;
                    return ScreenExit::Failed(GameError::Unknown(message));
                }
            }
        }
    }

    fn record_timings(&mut self, times: PhaseTimes) {
        let Some(average) = self.timings.record(times, FRAMES_PER_SECOND as u32) else {
            return;
        };
        log::debug!(
            "Frame {}: input {:?}, collision {:?}, draw {:?}, total {:?} (max total before slowdown {:?})",
            self.world.frame,
            average.input,
            average.collision,
            average.draw,
            average.total,
            FramePacer::new(self.config.fps).tick_duration(),
        );
    }

    fn stop_requested(&self, stop: &StopHandle) -> bool {
        !stop.is_running() || self.world.commands.is_close_requested()
    }

    fn shut(&mut self) -> TickOutcome {
        log::info!("Screen closed at frame {}", self.world.frame);
        self.state = ScreenState::Closed;
        TickOutcome::Closed
    }

    /// Call `hook` on one entity unless it is gone or has events disabled
    fn run_hook<F>(&mut self, id: EntityId, hook: F) -> Result<()>
    where
        F: FnOnce(&mut Entity, &mut FrameContext<'_>) -> Result<()>,
    {
        let Some(entity) = self.entities.get_mut(id) else {
            return Ok(());
        };
        if entity.core.events_disabled {
            return Ok(());
        }
        let mut ctx = self.world.context();
        hook(entity, &mut ctx)
    }

    fn refresh_player(&mut self) {
        self.world.player = self.main_character.and_then(|id| {
            let entity = self.entities.get(id)?;
            let position = entity.core.position()?;
            let center = entity.core.bounds().map_or(position, |b| b.center());
            let stats = match entity.kind() {
                EntityKind::Player(stats) => Some(stats),
                _ => None,
            };
            Some(PlayerView {
                id,
                position,
                center,
                alive: stats.is_none_or(|s| s.alive),
                stats,
            })
        });
    }

    /// Apply queued spawns and notices until none are left
    fn flush(&mut self) -> Result<()> {
        let mut rounds = 0;
        while self.world.commands.has_pending() {
            rounds += 1;
            if rounds > MAX_FLUSH_ROUNDS {
                return Err(GameError::Unknown(
                    "entities keep spawning or notifying each other".into(),
                ));
            }
            for (layer, entity) in self.world.commands.take_spawned() {
                self.attach(layer, entity)?;
            }
            for (target, notice) in self.world.commands.take_notices() {
                let Some(entity) = self.entities.get_mut(target) else {
                    log::trace!("Dropping {notice:?} for departed entity {target}");
                    continue;
                };
                let mut ctx = self.world.context();
                entity.behavior.on_notice(&mut entity.core, notice, &mut ctx)?;
            }
        }
        Ok(())
    }

    fn attach(&mut self, layer: Layer, entity: Entity) -> Result<()> {
        let id = entity.id();
        if layer == Layer::Ui && entity.core.graphic.is_none() {
            return Err(GameError::InvalidConfig(format!(
                "UI entity {id} ({:?}) has no graphic",
                entity.kind()
            )));
        }
        self.entities.insert(layer, entity);
        self.refresh_player();
        if let Some(entity) = self.entities.get_mut(id) {
            let mut ctx = self.world.context();
            entity.behavior.added_to_screen(&mut entity.core, &mut ctx)?;
        }
        Ok(())
    }

    fn flush_audio(&mut self, sink: &mut dyn AudioSink) {
        for cue in self.world.commands.take_audio() {
            cue.apply(sink);
        }
    }

    /// Erase one entity and run its removal hook
    fn detach(&mut self, id: EntityId) -> Result<bool> {
        let Some(mut entity) = self.entities.remove(id) else {
            return Ok(false);
        };
        if self.main_character == Some(id) {
            self.main_character = None;
            self.world.player = None;
        }
        let mut ctx = self.world.context();
        entity.behavior.removed_from_screen(&mut entity.core, &mut ctx)?;
        log::trace!("Removed {id} ({:?})", entity.kind());
        Ok(true)
    }

    fn process_removals(&mut self) -> Result<()> {
        loop {
            let removals = self.world.commands.take_removals();
            if removals.is_empty() {
                return Ok(());
            }
            for id in removals {
                self.detach(id)?;
            }
        }
    }

    fn detect_collisions(&mut self) -> Result<()> {
        let snapshot: Vec<(EntityId, Rect)> = self
            .entities
            .iter(Layer::Drawable)
            .filter(|e| e.core.collides)
            .filter_map(|e| e.core.bounds().map(|b| (e.id(), b)))
            .collect();

        for (receiver, receiver_bounds) in &snapshot {
            for (other, other_bounds) in &snapshot {
                if receiver == other || !receiver_bounds.intersects(other_bounds) {
                    continue;
                }
                let Some(kind) = self.entities.get(*other).map(Entity::kind) else {
                    continue;
                };
                let contact = Contact {
                    id: *other,
                    kind,
                    bounds: *other_bounds,
                };
                self.run_hook(*receiver, |e, ctx| {
                    e.behavior.collision(&mut e.core, &contact, ctx)
                })?;
            }
        }
        Ok(())
    }

    /// Keep one drawable inside the map and off obstacle tiles
    fn resolve_obstacles(&mut self, id: EntityId, map: &TileMap) -> Result<()> {
        let Some(entity) = self.entities.get_mut(id) else {
            return Ok(());
        };
        let core = &mut entity.core;
        if core.ignore_obstacles {
            return Ok(());
        }
        let Some(bounds) = core.bounds() else {
            return Ok(());
        };

        let shift = clamp_into(&bounds, map.pixel_size());
        if shift != Vec2::ZERO {
            core.translate(shift);
        }

        let mut attempts = 0;
        while let Some(region) = core.obstacle_region() {
            let blocked = region.corners().iter().any(|c| map.is_obstacle(*c));
            if !blocked {
                core.spawn_resolved = true;
                break;
            }
            if core.spawn_resolved {
                if let Some(last) = core.last_valid_pos {
                    core.set_position(last);
                }
                break;
            }
            attempts += 1;
            if attempts > MAX_SPAWN_ATTEMPTS {
                log::warn!("{id} could not be placed after {MAX_SPAWN_ATTEMPTS} attempts");
                return Err(GameError::NoSafeSpawn);
            }
            let spot = map.random_safe_spawn(&mut self.world.sim.rng)?;
            core.center_on(spot);
        }
        core.last_valid_pos = core.position();
        Ok(())
    }

    fn follow_main_character(&mut self) {
        let (Some(map), Some(id)) = (self.world.map.as_deref(), self.main_character) else {
            return;
        };
        let Some(bounds) = self.entities.get(id).and_then(|e| e.core.bounds()) else {
            return;
        };
        let view = &mut self.world.view;
        view.center = camera::follow(bounds.center(), view.size, map.pixel_size());
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
