//! Deterministic simulation module
//!
//! Everything that advances a level lives here:
//! - Fixed tick only (one `Screen::tick` per frame)
//! - Seeded RNG only (`SimContext::rng`)
//! - Stable iteration order (by entity id)
//! - No window, GPU or audio device dependencies

pub mod camera;
pub mod collision;
pub mod context;
pub mod director;
pub mod entity;
pub mod scheduler;
pub mod screen;
pub mod spawn;
pub mod tilemap;

pub use collision::{Footprint, Rect};
pub use context::{Commands, FrameContext, PlayerView, SimContext, SwitchRequest};
pub use director::{Director, RunEnd, RunSummary};
pub use entity::{
    Behavior, Contact, Entity, EntityCore, EntityId, EntityKind, EntityStore, Layer, Notice,
    PlayerStats,
};
pub use scheduler::Scheduler;
pub use screen::{PhaseTimes, Screen, ScreenConfig, ScreenExit, ScreenState, TickOutcome};
pub use spawn::{Archetype, RespawnManager};
pub use tilemap::{TileClassification, TileMap};
