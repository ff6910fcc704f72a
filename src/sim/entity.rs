//! Entities: identity, flags and behaviour
//!
//! An [`Entity`] is split in two:
//! - [`EntityCore`]: what the screen itself reads and writes (graphic, flags,
//!   obstacle bookkeeping)
//! - a boxed [`Behavior`]: the per-type reactions (update, collision, input)
//!
//! Behaviours never see each other directly. A collision hands the receiver a
//! [`Contact`] carrying the other entity's [`EntityKind`] tag and bounds, and
//! cross-entity effects go through [`Commands`](super::context::Commands).

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;

use super::collision::{Footprint, Rect};
use super::context::FrameContext;
use crate::error::Result;
use crate::platform::{InputEvent, Key, MouseButton};
use crate::render::{Canvas, Graphic};

/// Unique entity identifier, assigned in increasing order by the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player state other entities react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStats {
    pub health: i32,
    pub max_health: i32,
    pub potions: u32,
    pub max_potions: u32,
    pub alive: bool,
    pub citizens_eaten: u32,
    /// Frames since the level started, frozen at death
    pub alive_frames: u64,
}

/// Closed set of entity tags
///
/// Collision reactions match on this; payloads carry exactly what another
/// entity's reaction needs to know.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Player(PlayerStats),
    Citizen,
    Mage { alive: bool },
    /// Player projectile
    ZombieBlast { damage: i32 },
    /// Mage projectile; `hits` counts frames it has spent overlapping the player
    MageBlast { hits: u32 },
    Potion,
    Spawner,
    Scheduler,
    Ui,
    /// Anything the game does not react to
    Other,
}

impl EntityKind {
    pub fn is_player(&self) -> bool {
        matches!(self, EntityKind::Player(_))
    }
}

/// Which of the screen's three mappings holds an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// No graphic: timers, spawners
    Plain,
    /// World-space graphic, collides and is constrained by the map
    Drawable,
    /// View-relative graphic, never collides
    Ui,
}

/// Screen-managed state of an entity
#[derive(Debug, Clone, Default)]
pub struct EntityCore {
    pub id: EntityId,
    pub graphic: Option<Graphic>,
    /// Obstacle-check region; the whole sprite when `None`
    pub footprint: Option<Footprint>,
    /// Participates in entity-entity collision detection
    pub collides: bool,
    /// Skips map clamping and obstacle resolution
    pub ignore_obstacles: bool,
    /// Skips update, input and collision hooks
    pub events_disabled: bool,
    /// Set once the entity has been placed without touching an obstacle
    pub spawn_resolved: bool,
    /// Position after the last successful obstacle resolution
    pub last_valid_pos: Option<Vec2>,
}

impl EntityCore {
    /// Core for an entity without a graphic
    pub fn plain() -> Self {
        Self::default()
    }

    /// Core for a colliding entity showing `graphic`
    pub fn with_graphic(graphic: Graphic) -> Self {
        Self {
            graphic: Some(graphic),
            collides: true,
            ..Self::default()
        }
    }

    pub fn footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }

    pub fn ignoring_obstacles(mut self) -> Self {
        self.ignore_obstacles = true;
        self
    }

    pub fn without_collision(mut self) -> Self {
        self.collides = false;
        self
    }

    /// Graphic position (sprite top-left before origin)
    pub fn position(&self) -> Option<Vec2> {
        self.graphic.as_ref().map(Graphic::position)
    }

    pub fn set_position(&mut self, position: Vec2) {
        if let Some(graphic) = self.graphic.as_mut() {
            graphic.set_position(position);
        }
    }

    /// Move the graphic by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        if let Some(graphic) = self.graphic.as_mut() {
            let pos = graphic.position();
            graphic.set_position(pos + delta);
        }
    }

    /// Move the graphic so its bounds are centred on `point`
    pub fn center_on(&mut self, point: Vec2) {
        match self.bounds() {
            Some(bounds) => self.translate(point - bounds.center()),
            None => self.set_position(point),
        }
    }

    /// World bounds of the sprite (only sprites take part in collisions)
    pub fn bounds(&self) -> Option<Rect> {
        self.graphic.as_ref()?.as_sprite().map(|s| s.bounds())
    }

    /// World region tested against obstacles
    pub fn obstacle_region(&self) -> Option<Rect> {
        let bounds = self.bounds()?;
        Some(match self.footprint {
            Some(fp) if fp.size.x > 0.0 && fp.size.y > 0.0 => fp.resolve(&bounds),
            _ => bounds,
        })
    }
}

/// What a collision receiver learns about the other entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: EntityId,
    pub kind: EntityKind,
    pub bounds: Rect,
}

/// Messages addressed to one entity, delivered after the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A pooled entity died (sent to its spawner)
    Died(EntityId),
    /// Remove every pooled entity (sent to a spawner)
    ClearPool,
}

/// Per-type entity reactions
///
/// Every hook has a no-op default. Hooks receive the entity's own
/// [`EntityCore`] and the frame context; errors abort the current tick.
#[allow(unused_variables)]
pub trait Behavior {
    fn kind(&self) -> EntityKind;

    fn every_frame(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn collision(
        &mut self,
        core: &mut EntityCore,
        other: &Contact,
        ctx: &mut FrameContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn key_pressed(&mut self, core: &mut EntityCore, key: Key, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn key_released(&mut self, core: &mut EntityCore, key: Key, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn text_entered(&mut self, core: &mut EntityCore, ch: char, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    /// `position` is in world coordinates
    fn mouse_moved(&mut self, core: &mut EntityCore, position: Vec2, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn mouse_button_pressed(
        &mut self,
        core: &mut EntityCore,
        button: MouseButton,
        position: Vec2,
        ctx: &mut FrameContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn mouse_button_released(
        &mut self,
        core: &mut EntityCore,
        button: MouseButton,
        position: Vec2,
        ctx: &mut FrameContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn mouse_wheel(&mut self, core: &mut EntityCore, delta: f32, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn focus_changed(&mut self, core: &mut EntityCore, focused: bool, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn pointer_presence(&mut self, core: &mut EntityCore, inside: bool, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn resized(&mut self, core: &mut EntityCore, size: Vec2, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_notice(&mut self, core: &mut EntityCore, notice: Notice, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn added_to_screen(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn removed_from_screen(&mut self, core: &mut EntityCore, ctx: &mut FrameContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Draw the entity; `offset` is non-zero for UI entities
    fn draw(&self, core: &EntityCore, canvas: &mut dyn Canvas, offset: Vec2) {
        if let Some(graphic) = &core.graphic {
            canvas.draw(graphic, offset);
        }
    }
}

/// A simulated object owned by a screen
pub struct Entity {
    pub core: EntityCore,
    pub behavior: Box<dyn Behavior>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.core.id)
            .field("kind", &self.behavior.kind())
            .finish()
    }
}

impl Entity {
    pub fn new(core: EntityCore, behavior: impl Behavior + 'static) -> Self {
        Self {
            core,
            behavior: Box::new(behavior),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn kind(&self) -> EntityKind {
        self.behavior.kind()
    }

    /// Mapping the entity belongs in when added with a plain `add`
    pub fn natural_layer(&self) -> Layer {
        if self.core.graphic.is_some() {
            Layer::Drawable
        } else {
            Layer::Plain
        }
    }

    /// Route a platform event to the matching hook
    pub fn dispatch(&mut self, event: &InputEvent, ctx: &mut FrameContext<'_>) -> Result<()> {
        let core = &mut self.core;
        let behavior = self.behavior.as_mut();
        match event {
            InputEvent::Closed => Ok(()),
            InputEvent::Resized { width, height } => {
                behavior.resized(core, Vec2::new(*width as f32, *height as f32), ctx)
            }
            InputEvent::FocusLost => behavior.focus_changed(core, false, ctx),
            InputEvent::FocusGained => behavior.focus_changed(core, true, ctx),
            InputEvent::TextEntered(ch) => behavior.text_entered(core, *ch, ctx),
            InputEvent::KeyPressed(key) => behavior.key_pressed(core, *key, ctx),
            InputEvent::KeyReleased(key) => behavior.key_released(core, *key, ctx),
            InputEvent::MouseWheelScrolled { delta, .. } => behavior.mouse_wheel(core, *delta, ctx),
            InputEvent::MouseButtonPressed { button, .. } => {
                let pointer = ctx.pointer;
                behavior.mouse_button_pressed(core, *button, pointer, ctx)
            }
            InputEvent::MouseButtonReleased { button, .. } => {
                let pointer = ctx.pointer;
                behavior.mouse_button_released(core, *button, pointer, ctx)
            }
            InputEvent::MouseMoved(_) => {
                let pointer = ctx.pointer;
                behavior.mouse_moved(core, pointer, ctx)
            }
            InputEvent::MouseEntered => behavior.pointer_presence(core, true, ctx),
            InputEvent::MouseLeft => behavior.pointer_presence(core, false, ctx),
        }
    }
}

/// The three disjoint id-ordered mappings of a screen
#[derive(Debug, Default)]
pub struct EntityStore {
    plain: BTreeMap<EntityId, Entity>,
    drawable: BTreeMap<EntityId, Entity>,
    ui: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    fn layer_map(&self, layer: Layer) -> &BTreeMap<EntityId, Entity> {
        match layer {
            Layer::Plain => &self.plain,
            Layer::Drawable => &self.drawable,
            Layer::Ui => &self.ui,
        }
    }

    fn layer_map_mut(&mut self, layer: Layer) -> &mut BTreeMap<EntityId, Entity> {
        match layer {
            Layer::Plain => &mut self.plain,
            Layer::Drawable => &mut self.drawable,
            Layer::Ui => &mut self.ui,
        }
    }

    /// Insert into `layer`; an id already present elsewhere is moved
    pub fn insert(&mut self, layer: Layer, entity: Entity) {
        let id = entity.id();
        if let Some(previous) = self.layer_of(id)
            && previous != layer
        {
            self.layer_map_mut(previous).remove(&id);
        }
        self.layer_map_mut(layer).insert(id, entity);
    }

    pub fn layer_of(&self, id: EntityId) -> Option<Layer> {
        [Layer::Plain, Layer::Drawable, Layer::Ui]
            .into_iter()
            .find(|layer| self.layer_map(*layer).contains_key(&id))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.plain
            .get(&id)
            .or_else(|| self.drawable.get(&id))
            .or_else(|| self.ui.get(&id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let layer = self.layer_of(id)?;
        self.layer_map_mut(layer).get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let layer = self.layer_of(id)?;
        self.layer_map_mut(layer).remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.layer_of(id).is_some()
    }

    /// Ids of one layer in ascending order
    pub fn ids(&self, layer: Layer) -> Vec<EntityId> {
        self.layer_map(layer).keys().copied().collect()
    }

    /// Ids of all layers: plain, then drawable, then UI
    pub fn all_ids(&self) -> Vec<EntityId> {
        let mut ids = self.ids(Layer::Plain);
        ids.extend(self.ids(Layer::Drawable));
        ids.extend(self.ids(Layer::Ui));
        ids
    }

    pub fn iter(&self, layer: Layer) -> impl Iterator<Item = &Entity> {
        self.layer_map(layer).values()
    }

    pub fn len(&self) -> usize {
        self.plain.len() + self.drawable.len() + self.ui.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.layer_map(layer).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Sprite;

    struct Dummy;

    impl Behavior for Dummy {
        fn kind(&self) -> EntityKind {
            EntityKind::Other
        }
    }

    fn entity(id: u64, graphic: bool) -> Entity {
        let core = if graphic {
            EntityCore::with_graphic(Graphic::Sprite(Sprite::blank(10, 10)))
        } else {
            EntityCore::plain()
        };
        let mut e = Entity::new(core, Dummy);
        e.core.id = EntityId(id);
        e
    }

    #[test]
    fn test_store_keeps_layers_disjoint() {
        let mut store = EntityStore::default();
        store.insert(Layer::Plain, entity(3, false));
        store.insert(Layer::Drawable, entity(1, true));
        store.insert(Layer::Ui, entity(2, true));

        assert_eq!(store.all_ids(), vec![EntityId(3), EntityId(1), EntityId(2)]);
        assert_eq!(store.layer_of(EntityId(2)), Some(Layer::Ui));

        store.insert(Layer::Drawable, entity(2, true));
        assert_eq!(store.count(Layer::Ui), 0);
        assert_eq!(store.len(), 3);

        assert!(store.remove(EntityId(1)).is_some());
        assert!(!store.contains(EntityId(1)));
    }

    #[test]
    fn test_obstacle_region_uses_footprint() {
        let sprite = Sprite::blank(32, 48).at(Vec2::new(100.0, 50.0));
        let core = EntityCore::with_graphic(Graphic::Sprite(sprite))
            .footprint(Footprint::new(Vec2::new(8.0, 40.0), Vec2::new(16.0, 8.0)));

        let region = core.obstacle_region().unwrap();
        assert_eq!(region.min, Vec2::new(108.0, 90.0));
        assert_eq!(region.size, Vec2::new(16.0, 8.0));

        assert_eq!(EntityCore::plain().bounds(), None);
    }
}
