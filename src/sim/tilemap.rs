//! Tile-based level layout
//!
//! A map file is plain text: `width height tile_width tile_height` followed by
//! `width * height` tile codes in row-major order, all whitespace separated.
//! Codes index into the tileset image left-to-right, top-to-bottom.
//!
//! Tile codes are classified by [`TileClassification`]:
//! - Obstacle: blocks movement (negative codes always count as obstacles)
//! - Trap: slows the player
//! - Anything else: open floor

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::{IVec2, UVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::resources::{ResourceCache, Texture};

/// Code returned for cells outside the grid
pub const OUT_OF_RANGE: i32 = -1;

/// Which tile codes block movement and which are traps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileClassification {
    pub obstacles: BTreeSet<i32>,
    pub traps: BTreeSet<i32>,
}

impl Default for TileClassification {
    /// Sets matching the shipped tileset
    fn default() -> Self {
        Self {
            obstacles: [0, 1, 2, 9, 10, 11, 18, 19, 20].into_iter().collect(),
            traps: [6, 7, 8, 15, 16, 17, 25, 26].into_iter().collect(),
        }
    }
}

impl TileClassification {
    /// Reject sets that overlap (a code cannot be both)
    pub fn validate(&self) -> Result<()> {
        if let Some(code) = self.obstacles.intersection(&self.traps).next() {
            return Err(GameError::InvalidConfig(format!(
                "tile code {code} is both obstacle and trap"
            )));
        }
        if let Some(code) = self.traps.iter().find(|c| **c < 0) {
            return Err(GameError::InvalidConfig(format!(
                "negative tile code {code} cannot be a trap"
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn is_obstacle(&self, code: i32) -> bool {
        code < 0 || self.obstacles.contains(&code)
    }

    #[inline]
    pub fn is_trap(&self, code: i32) -> bool {
        code >= 0 && self.traps.contains(&code)
    }
}

/// Immutable grid of tile codes
#[derive(Debug, Clone)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: UVec2,
    tiles: Vec<i32>,
    classification: TileClassification,
    safe_spawns: Vec<Vec2>,
    tileset: Option<Rc<Texture>>,
    source: PathBuf,
}

impl TileMap {
    /// Load a map with the default tile classification
    pub fn load(
        textures: &mut ResourceCache<Texture>,
        tileset: impl AsRef<Path>,
        map_file: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::load_with(textures, tileset, map_file, TileClassification::default())
    }

    /// Load the tileset through the texture cache and parse the map file
    pub fn load_with(
        textures: &mut ResourceCache<Texture>,
        tileset: impl AsRef<Path>,
        map_file: impl AsRef<Path>,
        classification: TileClassification,
    ) -> Result<Self> {
        let texture = textures.get(tileset)?;

        let map_file = map_file.as_ref();
        let path = if map_file.is_absolute() {
            map_file.to_path_buf()
        } else {
            textures.root().join(map_file)
        };
        let source =
            std::fs::read_to_string(&path).map_err(|e| GameError::file_load_io(&path, e))?;

        let mut map = Self::parse(&source, &path, classification)?;
        map.tileset = Some(texture);
        log::info!(
            "Loaded map {} ({}x{} tiles, {} safe spawns)",
            path.display(),
            map.width,
            map.height,
            map.safe_spawns.len()
        );
        Ok(map)
    }

    /// Parse map text; `path` is only used in error messages
    pub fn parse(
        source: &str,
        path: impl Into<PathBuf>,
        classification: TileClassification,
    ) -> Result<Self> {
        let path = path.into();
        classification.validate()?;

        let malformed = |reason: String| GameError::MapFormat {
            path: path.clone(),
            reason,
        };

        let mut numbers = source.split_whitespace().enumerate().map(|(i, token)| {
            token
                .parse::<i32>()
                .map_err(|_| malformed(format!("token {} ({token:?}) is not an integer", i + 1)))
        });

        let mut header = [0u32; 4];
        for (slot, name) in header
            .iter_mut()
            .zip(["width", "height", "tile width", "tile height"])
        {
            let value = numbers
                .next()
                .ok_or_else(|| malformed(format!("missing {name}")))??;
            if value <= 0 {
                return Err(malformed(format!("{name} must be positive, got {value}")));
            }
            *slot = value as u32;
        }
        let [width, height, tile_w, tile_h] = header;

        let too_large = || {
            malformed(format!(
                "{width}x{height} map of {tile_w}x{tile_h} tiles is too large"
            ))
        };
        width.checked_mul(tile_w).ok_or_else(too_large)?;
        height.checked_mul(tile_h).ok_or_else(too_large)?;
        let count = width.checked_mul(height).ok_or_else(too_large)? as usize;

        // Each tile code takes at least one byte of the source
        let mut tiles = Vec::with_capacity(count.min(source.len()));
        for _ in 0..count {
            match numbers.next() {
                Some(code) => tiles.push(code?),
                None => {
                    return Err(malformed(format!(
                        "expected {count} tile codes, found {}",
                        tiles.len()
                    )));
                }
            }
        }
        if numbers.next().is_some() {
            log::warn!("Map {} has trailing data after {count} tiles", path.display());
        }

        let mut map = Self {
            width,
            height,
            tile_size: UVec2::new(tile_w, tile_h),
            tiles,
            classification,
            safe_spawns: Vec::new(),
            tileset: None,
            source: path,
        };
        map.safe_spawns = map.compute_safe_spawns();
        Ok(map)
    }

    /// Interior cells that are open and fully surrounded by open cells
    fn compute_safe_spawns(&self) -> Vec<Vec2> {
        let mut spawns = Vec::new();
        if self.width < 3 || self.height < 3 {
            return spawns;
        }
        for row in 1..self.height as i32 - 1 {
            for col in 1..self.width as i32 - 1 {
                let blocked = (-1..=1).any(|dy| {
                    (-1..=1).any(|dx| {
                        self.classification
                            .is_obstacle(self.tile_at(col + dx, row + dy))
                    })
                });
                if !blocked {
                    spawns.push(self.tile_center(col as u32, row as u32));
                }
            }
        }
        spawns
    }

    /// Tile code at (`column`, `row`), or [`OUT_OF_RANGE`]
    pub fn tile_at(&self, column: i32, row: i32) -> i32 {
        if column < 0 || row < 0 || column >= self.width as i32 || row >= self.height as i32 {
            return OUT_OF_RANGE;
        }
        self.tiles[row as usize * self.width as usize + column as usize]
    }

    /// Grid cell containing a world position (may lie outside the grid)
    pub fn cell_at(&self, position: Vec2) -> IVec2 {
        (position / self.tile_size.as_vec2()).floor().as_ivec2()
    }

    fn code_at(&self, position: Vec2) -> i32 {
        let cell = self.cell_at(position);
        self.tile_at(cell.x, cell.y)
    }

    pub fn is_obstacle(&self, position: Vec2) -> bool {
        self.classification.is_obstacle(self.code_at(position))
    }

    pub fn is_trap(&self, position: Vec2) -> bool {
        self.classification.is_trap(self.code_at(position))
    }

    pub fn is_out_of_bounds(&self, position: Vec2) -> bool {
        self.code_at(position) == OUT_OF_RANGE
    }

    /// World-space centre of a cell
    pub fn tile_center(&self, column: u32, row: u32) -> Vec2 {
        let size = self.tile_size.as_vec2();
        Vec2::new(column as f32, row as f32) * size + size / 2.0
    }

    pub fn safe_spawn_positions(&self) -> &[Vec2] {
        &self.safe_spawns
    }

    /// Uniformly random safe spawn point
    pub fn random_safe_spawn(&self, rng: &mut impl Rng) -> Result<Vec2> {
        if self.safe_spawns.is_empty() {
            return Err(GameError::NoSafeSpawn);
        }
        Ok(self.safe_spawns[rng.random_range(0..self.safe_spawns.len())])
    }

    /// Grid width in tiles
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> UVec2 {
        self.tile_size
    }

    /// Map size in world pixels
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            (self.width * self.tile_size.x) as f32,
            (self.height * self.tile_size.y) as f32,
        )
    }

    pub fn tileset(&self) -> Option<&Rc<Texture>> {
        self.tileset.as_ref()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn classification(&self) -> &TileClassification {
        &self.classification
    }

    /// Top-left pixel of a tile code's image inside the tileset
    pub fn tile_frame(&self, code: i32) -> Option<UVec2> {
        let tileset = self.tileset.as_ref()?;
        let per_row = tileset.size.x / self.tile_size.x.max(1);
        if code < 0 || per_row == 0 {
            return None;
        }
        let code = code as u32;
        Some(UVec2::new(
            (code % per_row) * self.tile_size.x,
            (code / per_row) * self.tile_size.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid(width: u32, height: u32, codes: &[i32]) -> String {
        let mut text = format!("{width} {height} 32 32\n");
        for row in codes.chunks(width as usize) {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            text.push_str(&line.join(" "));
            text.push('\n');
        }
        text
    }

    fn open_map(width: u32, height: u32) -> TileMap {
        let codes = vec![3; (width * height) as usize];
        TileMap::parse(&grid(width, height, &codes), "open.txt", TileClassification::default())
            .unwrap()
    }

    #[test]
    fn test_parse_and_lookup() {
        let map = TileMap::parse(
            &grid(3, 2, &[1, 3, 6, 3, 3, 20]),
            "small.txt",
            TileClassification::default(),
        )
        .unwrap();

        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.pixel_size(), Vec2::new(96.0, 64.0));
        assert_eq!(map.tile_at(0, 0), 1);
        assert_eq!(map.tile_at(2, 1), 20);
        assert_eq!(map.tile_at(3, 0), OUT_OF_RANGE);
        assert_eq!(map.tile_at(-1, 0), OUT_OF_RANGE);

        assert!(map.is_obstacle(Vec2::new(5.0, 5.0)));
        assert!(map.is_trap(Vec2::new(70.0, 10.0)));
        assert!(!map.is_obstacle(Vec2::new(40.0, 10.0)));
        assert!(!map.is_trap(Vec2::new(40.0, 10.0)));
    }

    #[test]
    fn test_outside_is_obstacle_never_trap() {
        let map = open_map(4, 4);
        for pos in [
            Vec2::new(-0.5, 10.0),
            Vec2::new(10.0, -1.0),
            Vec2::new(128.0, 10.0),
            Vec2::new(10.0, 200.0),
        ] {
            assert!(map.is_out_of_bounds(pos));
            assert!(map.is_obstacle(pos));
            assert!(!map.is_trap(pos));
        }
    }

    #[test]
    fn test_walled_cell_has_no_safe_spawn() {
        // Centre cell is open but every neighbour is a wall
        let map = TileMap::parse(
            "3 3 32 32\n1 1 1\n1 0 1\n1 1 1\n",
            "walled.txt",
            TileClassification::default(),
        )
        .unwrap();
        assert!(map.safe_spawn_positions().is_empty());

        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(map.random_safe_spawn(&mut rng), Err(GameError::NoSafeSpawn)));
    }

    #[test]
    fn test_open_three_by_three_spawns_at_center() {
        let map = open_map(3, 3);
        assert_eq!(map.safe_spawn_positions(), &[Vec2::new(48.0, 48.0)]);

        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(map.random_safe_spawn(&mut rng).unwrap(), Vec2::new(48.0, 48.0));
    }

    #[test]
    fn test_malformed_maps() {
        let classes = TileClassification::default;
        let short = TileMap::parse("2 2 32 32\n3 3 3", "short.txt", classes()).unwrap_err();
        assert!(matches!(short, GameError::MapFormat { .. }));
        assert!(short.to_string().contains("short.txt"));

        let junk = TileMap::parse("2 2 32 x", "junk.txt", classes()).unwrap_err();
        assert!(junk.is_file_load());

        let zero = TileMap::parse("2 2 0 32\n3 3 3 3", "zero.txt", classes()).unwrap_err();
        assert!(matches!(zero, GameError::MapFormat { .. }));
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let classes = TileClassification::default;
        let wide = format!("70000 1 70000 1\n{}", "3 ".repeat(70000));
        let err = TileMap::parse(&wide, "wide.txt", classes()).unwrap_err();
        assert!(matches!(err, GameError::MapFormat { .. }));
        assert!(err.to_string().contains("wide.txt"));

        let huge = TileMap::parse("2000000000 2000000000 1 1\n3", "huge.txt", classes());
        assert!(matches!(huge, Err(GameError::MapFormat { .. })));

        let narrow = wide.replacen("70000 1\n", "32 1\n", 1);
        let map = TileMap::parse(&narrow, "narrow.txt", classes()).unwrap();
        assert_eq!(map.pixel_size(), Vec2::new(70000.0 * 32.0, 1.0));
    }

    #[test]
    fn test_overlapping_classification_rejected() {
        let mut classes = TileClassification::default();
        classes.traps.insert(1);
        let err = TileMap::parse("1 1 32 32\n3", "x.txt", classes).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::new(288, 96)
            .save(dir.path().join("tileset.png"))
            .unwrap();
        std::fs::write(dir.path().join("map.txt"), grid(3, 3, &[3; 9])).unwrap();

        let mut textures = ResourceCache::new(dir.path());
        let map = TileMap::load(&mut textures, "tileset.png", "map.txt").unwrap();
        assert_eq!(map.safe_spawn_positions().len(), 1);
        // 9 tiles per tileset row
        assert_eq!(map.tile_frame(10), Some(UVec2::new(32, 32)));
        assert_eq!(map.tile_frame(-1), None);

        let missing = TileMap::load(&mut textures, "tileset.png", "gone.txt").unwrap_err();
        assert!(missing.is_file_load());
        assert!(missing.to_string().contains("gone.txt"));
    }

    proptest! {
        #[test]
        fn prop_obstacle_codes_block_whole_cell(
            code in prop::sample::select(vec![0, 1, 2, 9, 10, 11, 18, 19, 20]),
            fx in 0.0f32..0.999,
            fy in 0.0f32..0.999,
        ) {
            let map = TileMap::parse(&grid(1, 1, &[code]), "p.txt", TileClassification::default()).unwrap();
            let pos = Vec2::new(fx * 32.0, fy * 32.0);
            prop_assert!(map.is_obstacle(pos));
            prop_assert!(!map.is_trap(pos));
        }

        #[test]
        fn prop_unclassified_codes_are_floor(code in 0i32..64, fx in 0.0f32..0.999, fy in 0.0f32..0.999) {
            let classes = TileClassification::default();
            prop_assume!(!classes.obstacles.contains(&code) && !classes.traps.contains(&code));
            let map = TileMap::parse(&grid(1, 1, &[code]), "p.txt", classes).unwrap();
            let pos = Vec2::new(fx * 32.0, fy * 32.0);
            prop_assert!(!map.is_obstacle(pos));
            prop_assert!(!map.is_trap(pos));
        }

        #[test]
        fn prop_positions_outside_grid_are_out_of_bounds(
            w in 1u32..8,
            h in 1u32..8,
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
        ) {
            let map = open_map(w, h);
            let size = map.pixel_size();
            prop_assume!(x < 0.0 || y < 0.0 || x >= size.x || y >= size.y);
            let pos = Vec2::new(x, y);
            prop_assert!(map.is_out_of_bounds(pos));
            prop_assert!(map.is_obstacle(pos));
        }

        #[test]
        fn prop_open_grid_safe_spawn_count(w in 1u32..12, h in 1u32..12) {
            let map = open_map(w, h);
            let expected = if w >= 3 && h >= 3 { (w - 2) * (h - 2) } else { 0 };
            prop_assert_eq!(map.safe_spawn_positions().len() as u32, expected);
        }
    }
}
