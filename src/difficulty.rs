//! Difficulty levels and score multipliers
//!
//! A [`Difficulty`] selects a fixed [`DifficultyModifiers`] bundle once per
//! level. Every number in the bundle is added to (or multiplies) a base
//! constant of the entity it tunes. The only value that changes while a level
//! runs is the cumulative score multiplier kept by [`ScoreKeeper`].

use serde::{Deserialize, Serialize};

/// Difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// Near-immortal player for manual testing
    Test,
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Test,
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Test => "Test",
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "test" => Some(Difficulty::Test),
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" | "insane" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// The modifier bundle for this level
    pub fn modifiers(&self) -> DifficultyModifiers {
        let mut m = DifficultyModifiers::default();
        match self {
            Difficulty::Test => {
                m.player.missing_health_heal_bonus = 0.6;
                m.player.health_drain = -100_000;
                m.player.max_health = 100_000;
                m.player.max_potions = 9994;
                m.player.eat_drain_freeze_frames = 12;
                m.player.citizens_per_potion = 1;
                m.mage.attack_damage = -1000;
                m.mage.touch_damage = -1000;
                m.mage.health_drain = -1000;
                m.score.minimum_blast_damage = false;
            }
            Difficulty::Easy => {
                m.player.missing_health_heal_bonus = 0.7;
                m.player.high_health_drain_penalty = 0.8;
                m.player.eat_drain_freeze_frames = 15;
                m.player.citizens_per_potion = 3;
                m.score.base_multiplier = 1.0;
                m.score.bonus_per_kill = 0.02;
                m.score.bonus_cap = 1.10;
            }
            Difficulty::Normal => {
                m.map.file = "map_normal.txt".into();
                m.player.missing_health_heal_bonus = 0.3;
                m.player.health_drain = 1;
                m.player.high_health_drain_penalty = 1.1;
                m.player.eat_drain_freeze_frames = 11;
                m.player.max_health = -4500;
                m.player.attack_health_cost = 150;
                m.player.citizens_per_potion = 4;
                m.player.max_potions = -1;
                m.mage.attack_damage = 100;
                m.mage.blast_speed = 0.8;
                m.mage.touch_damage = 10;
                m.mage.health_drain = 1;
                m.mage.health = 2;
                m.score.base_multiplier = 1.5;
                m.score.bonus_per_kill = 0.03;
                m.score.bonus_cap = 1.29;
            }
            Difficulty::Hard => {
                m.map.file = "map_insane.txt".into();
                m.player.missing_health_heal_bonus = 0.15;
                m.player.health_drain = 1;
                m.player.high_health_drain_penalty = 4.5;
                m.player.eat_drain_freeze_frames = 10;
                m.player.max_health = -6000;
                m.player.attack_health_cost = 350;
                m.player.citizens_per_potion = 5;
                m.player.max_potions = -2;
                m.mage.attack_damage = 250;
                m.mage.blast_speed = 1.6;
                m.mage.touch_damage = 50;
                m.mage.health_drain = 1;
                m.mage.health = 7;
                m.score.base_multiplier = 2.5;
                m.score.bonus_per_kill = 0.02;
                m.score.bonus_cap = 10.0;
            }
        }
        m
    }
}

/// Map selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapModifiers {
    /// Tileset image, relative to the asset directory
    pub tileset: String,
    /// Map table, relative to the asset directory
    pub file: String,
}

impl Default for MapModifiers {
    fn default() -> Self {
        Self {
            tileset: "tileset.png".into(),
            file: "map_easy.txt".into(),
        }
    }
}

/// Player tuning (offsets added to base values unless noted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerModifiers {
    pub max_health: i32,
    pub eat_heal: i32,
    /// Frames of drain freeze after eating (absolute)
    pub eat_drain_freeze_frames: u32,
    /// Extra healing fraction when at low health (absolute)
    pub missing_health_heal_bonus: f32,
    pub health_drain: i32,
    /// Drain multiplier applied at high health (absolute)
    pub high_health_drain_penalty: f32,
    pub attack_health_cost: i32,
    pub max_potions: i32,
    /// Citizens eaten per potion brewed (absolute, 0 disables potions)
    pub citizens_per_potion: u32,
}

/// Mage tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MageModifiers {
    pub attack_damage: i32,
    pub touch_damage: i32,
    /// Extra player drain per alive mage
    pub health_drain: i32,
    pub health: i32,
    /// Added to the base blast speed
    pub blast_speed: f32,
}

/// Score tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreModifiers {
    pub base_multiplier: f32,
    /// Multiplier gained per mage killed
    pub bonus_per_kill: f32,
    /// Highest cumulative multiplier reachable by kills
    pub bonus_cap: f32,
    /// Whether mage blasts always deal a minimum amount of damage
    pub minimum_blast_damage: bool,
}

impl Default for ScoreModifiers {
    fn default() -> Self {
        Self {
            base_multiplier: 0.0,
            bonus_per_kill: 0.0,
            bonus_cap: 0.0,
            minimum_blast_damage: true,
        }
    }
}

/// Everything a difficulty changes, as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DifficultyModifiers {
    pub map: MapModifiers,
    pub player: PlayerModifiers,
    pub mage: MageModifiers,
    pub score: ScoreModifiers,
}

impl DifficultyModifiers {
    /// Parse a bundle from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::GameError::InvalidConfig(format!("difficulty modifiers: {e}")))
    }
}

/// Running score and cumulative kill multiplier for one level
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    score: u64,
    current: f32,
    base_multiplier: f32,
    bonus_per_kill: f32,
    cap: f32,
    frozen: bool,
}

impl ScoreKeeper {
    /// Fresh keeper: score 0, multiplier 1.0
    pub fn new(score: &ScoreModifiers) -> Self {
        Self {
            score: 0,
            current: 1.0,
            base_multiplier: score.base_multiplier,
            bonus_per_kill: score.bonus_per_kill.max(0.0),
            cap: score.bonus_cap,
            frozen: false,
        }
    }

    /// Points awarded for a base increase under the current multipliers
    pub fn apply(&self, base: u32) -> u64 {
        if base == 0 {
            return 0;
        }
        let scaled = (base as f32 * self.current * self.base_multiplier).floor();
        (scaled as u64).max(1)
    }

    /// Award `base` points (after multipliers); returns the amount added
    pub fn award(&mut self, base: u32) -> u64 {
        if self.frozen {
            return 0;
        }
        let points = self.apply(base);
        self.score += points;
        points
    }

    /// Raise the multiplier by the per-kill bonus, never past the cap
    ///
    /// A cap below the current value leaves the multiplier untouched.
    pub fn register_kill(&mut self) {
        let ceiling = self.cap.max(self.current);
        self.current = (self.current + self.bonus_per_kill).min(ceiling);
    }

    /// Stop counting (the player died)
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn multiplier(&self) -> f32 {
        self.current
    }

    /// Highest multiplier this keeper can reach
    pub fn cap(&self) -> f32 {
        self.cap.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_difficulty_names_round_trip() {
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::from_str("INSANE"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_bundles_match_levels() {
        let hard = Difficulty::Hard.modifiers();
        assert_eq!(hard.map.file, "map_insane.txt");
        assert_eq!(hard.mage.health, 7);
        assert_eq!(hard.player.citizens_per_potion, 5);

        let easy = Difficulty::Easy.modifiers();
        assert_eq!(easy.map.file, "map_easy.txt");
        assert!(easy.score.minimum_blast_damage);
        assert!(!Difficulty::Test.modifiers().score.minimum_blast_damage);
    }

    #[test]
    fn test_award_applies_multipliers() {
        let mut keeper = ScoreKeeper::new(&Difficulty::Normal.modifiers().score);
        assert_eq!(keeper.apply(20), 30);
        assert_eq!(keeper.award(10), 15);

        keeper.register_kill();
        assert!((keeper.multiplier() - 1.03).abs() < 1e-6);
        // floor(20 * 1.03 * 1.5) = 30
        assert_eq!(keeper.apply(20), 30);
        assert_eq!(keeper.apply(0), 0);
    }

    #[test]
    fn test_zero_base_multiplier_still_awards_one() {
        let mut keeper = ScoreKeeper::new(&Difficulty::Test.modifiers().score);
        assert_eq!(keeper.award(1), 1);
        assert_eq!(keeper.award(20), 1);
        keeper.freeze();
        assert_eq!(keeper.award(20), 0);
        assert_eq!(keeper.score(), 2);
    }

    #[test]
    fn test_modifiers_from_json() {
        let m = DifficultyModifiers::from_json(r#"{"mage": {"health": 4}}"#).unwrap();
        assert_eq!(m.mage.health, 4);
        assert_eq!(m.map.tileset, "tileset.png");
        assert!(DifficultyModifiers::from_json("[").is_err());
    }

    proptest! {
        #[test]
        fn prop_multiplier_never_exceeds_cap(
            kills in 0usize..500,
            bonus in 0.0f32..0.5,
            cap in 0.0f32..12.0,
        ) {
            let mods = ScoreModifiers { base_multiplier: 1.0, bonus_per_kill: bonus, bonus_cap: cap, minimum_blast_damage: true };
            let mut keeper = ScoreKeeper::new(&mods);
            let mut last = keeper.multiplier();
            for _ in 0..kills {
                keeper.register_kill();
                prop_assert!(keeper.multiplier() >= last);
                prop_assert!(keeper.multiplier() <= keeper.cap() + f32::EPSILON);
                last = keeper.multiplier();
            }
        }
    }
}
