//! Brain Drain game content
//!
//! The concrete entities built on the `sim` engine:
//! - `player`: the zombie the player controls
//! - `mage` / `citizen`: pooled enemies and food
//! - `projectile`: zombie and mage blasts
//! - `potion`: anti-mage potion pickup
//! - `hud` / `game_over`: UI layer
//! - `level`: assembles a screen for a difficulty

pub mod citizen;
pub mod game_over;
pub mod hud;
pub mod level;
pub mod mage;
pub mod player;
pub mod potion;
pub mod projectile;

pub use level::{build_level, start_request};

use glam::Vec2;

/// Sprite bank names
pub mod sprites {
    pub const ZOMBIE: &str = "zombie";
    pub const MAGE: &str = "mage";
    pub const POTION: &str = "potion";
    pub const BLAST: &str = "blast";
    pub const BRAIN: &str = "brain";
    pub const MAGE_BLAST: &str = "mage_blast";
    pub const BRAIN_ICON: &str = "brain_icon";
    pub const CITIZENS: [&str; 6] = ["boy", "girl", "man", "woman", "oldman", "oldwoman"];
}

/// Which way a character faces; doubles as the row offset in its sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Down,
    Left,
    Right,
    Up,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::Down, Facing::Left, Facing::Right, Facing::Up];

    /// Row within a four-row block of a character sheet
    pub fn row(self) -> u32 {
        match self {
            Facing::Down => 0,
            Facing::Left => 1,
            Facing::Right => 2,
            Facing::Up => 3,
        }
    }

    /// Unit step in world space (y grows downwards)
    pub fn step(self) -> Vec2 {
        match self {
            Facing::Down => Vec2::Y,
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
            Facing::Up => Vec2::NEG_Y,
        }
    }

    /// Facing that moves from `from` toward `to` along one axis
    pub fn toward(from: Vec2, to: Vec2, horizontal: bool) -> Self {
        if horizontal {
            if to.x > from.x { Facing::Right } else { Facing::Left }
        } else if to.y > from.y {
            Facing::Down
        } else {
            Facing::Up
        }
    }
}

/// Cycle `column` through `0..frames`
#[inline]
pub(crate) fn next_column(column: u32, frames: u32) -> u32 {
    if column + 1 >= frames { 0 } else { column + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toward() {
        let from = Vec2::new(10.0, 10.0);
        assert_eq!(Facing::toward(from, Vec2::new(20.0, 0.0), true), Facing::Right);
        assert_eq!(Facing::toward(from, Vec2::new(20.0, 0.0), false), Facing::Up);
        assert_eq!(Facing::Left.step(), Vec2::new(-1.0, 0.0));
        assert_eq!(next_column(3, 4), 0);
        assert_eq!(next_column(1, 4), 2);
    }
}
