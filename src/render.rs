//! Drawables and the canvas abstraction
//!
//! The simulation describes what to draw; a [`Canvas`] backend puts it on
//! screen. [`HeadlessCanvas`] records draw calls instead, which is what the
//! binary's headless mode and the tests use.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{UVec2, Vec2};

use crate::error::{GameError, Result};
use crate::resources::Texture;
use crate::sim::collision::Rect;
use crate::sim::tilemap::TileMap;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const HURT: Color = Color::rgb(255, 100, 100);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A textured quad cut from a sprite sheet
#[derive(Debug, Clone)]
pub struct Sprite {
    pub texture: Option<Rc<Texture>>,
    /// Top-left corner in world space (before `origin` is subtracted)
    pub position: Vec2,
    /// Local point that `position` refers to (rotation pivot)
    pub origin: Vec2,
    /// Top-left of the current frame inside the texture
    pub frame_origin: UVec2,
    pub frame_size: UVec2,
    /// Rotation in degrees around `origin`
    pub rotation: f32,
    pub tint: Color,
}

impl Sprite {
    /// A sprite showing the first frame of a `columns x rows` sheet
    pub fn from_sheet(texture: Rc<Texture>, columns: u32, rows: u32) -> Self {
        let frame_size = texture.frame_size(columns, rows);
        Self {
            texture: Some(texture),
            position: Vec2::ZERO,
            origin: Vec2::ZERO,
            frame_origin: UVec2::ZERO,
            frame_size,
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    /// An untextured sprite of a fixed size (tests, placeholders)
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            texture: None,
            position: Vec2::ZERO,
            origin: Vec2::ZERO,
            frame_origin: UVec2::ZERO,
            frame_size: UVec2::new(width, height),
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.frame_size.as_vec2()
    }

    /// Select the frame at `column`, `row` of the sheet
    pub fn set_frame(&mut self, column: u32, row: u32) {
        self.frame_origin = UVec2::new(column * self.frame_size.x, row * self.frame_size.y);
    }

    /// World-space bounds (rotation ignored)
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position - self.origin, self.size())
    }
}

/// A filled rectangle (health bars, panels)
#[derive(Debug, Clone)]
pub struct RectShape {
    pub position: Vec2,
    pub size: Vec2,
    pub fill: Color,
}

/// A line of text
#[derive(Debug, Clone)]
pub struct Text {
    pub position: Vec2,
    pub content: String,
    pub char_size: u32,
    pub color: Color,
}

/// Anything an entity can show
#[derive(Debug, Clone)]
pub enum Graphic {
    Sprite(Sprite),
    Rect(RectShape),
    Text(Text),
}

impl Graphic {
    pub fn position(&self) -> Vec2 {
        match self {
            Graphic::Sprite(s) => s.position,
            Graphic::Rect(r) => r.position,
            Graphic::Text(t) => t.position,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        match self {
            Graphic::Sprite(s) => s.position = position,
            Graphic::Rect(r) => r.position = position,
            Graphic::Text(t) => t.position = position,
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            Graphic::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            Graphic::Sprite(s) => Some(s),
            _ => None,
        }
    }
}

/// The visible window onto the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Vec2,
    pub size: Vec2,
}

impl View {
    /// A view showing `[0, width] x [0, height]`
    pub fn from_window(width: u32, height: u32) -> Self {
        let size = Vec2::new(width as f32, height as f32);
        Self {
            center: size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        self.center - self.size / 2.0
    }

    /// Convert a window pixel position to world coordinates
    #[inline]
    pub fn to_world(&self, pixel: Vec2) -> Vec2 {
        self.top_left() + pixel
    }
}

/// Rendering backend
pub trait Canvas {
    fn clear(&mut self);
    fn draw_map(&mut self, map: &TileMap);
    /// Draw `graphic` shifted by `offset` (zero for world-space entities)
    fn draw(&mut self, graphic: &Graphic, offset: Vec2);
    fn set_view(&mut self, view: &View);
    fn present(&mut self);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub kind: DrawKind,
    /// Final world position after the offset was applied
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Map,
    Sprite,
    Rect,
    Text,
}

/// Canvas that records calls instead of drawing
#[derive(Debug, Default)]
pub struct HeadlessCanvas {
    /// Draw calls since the last `clear`
    pub calls: Vec<DrawCall>,
    pub view: Option<View>,
    pub frames_presented: u64,
}

impl Canvas for HeadlessCanvas {
    fn clear(&mut self) {
        self.calls.clear();
    }

    fn draw_map(&mut self, _map: &TileMap) {
        self.calls.push(DrawCall {
            kind: DrawKind::Map,
            position: Vec2::ZERO,
        });
    }

    fn draw(&mut self, graphic: &Graphic, offset: Vec2) {
        let kind = match graphic {
            Graphic::Sprite(_) => DrawKind::Sprite,
            Graphic::Rect(_) => DrawKind::Rect,
            Graphic::Text(_) => DrawKind::Text,
        };
        self.calls.push(DrawCall {
            kind,
            position: graphic.position() + offset,
        });
    }

    fn set_view(&mut self, view: &View) {
        self.view = Some(*view);
    }

    fn present(&mut self) {
        self.frames_presented += 1;
    }
}

/// Named sprite templates prepared before a level starts
///
/// Entities spawned mid-tick clone their sprite from here, so no asset is
/// loaded while the loop is running.
#[derive(Debug, Clone, Default)]
pub struct SpriteBank {
    sprites: BTreeMap<String, Sprite>,
}

impl SpriteBank {
    pub fn insert(&mut self, name: impl Into<String>, sprite: Sprite) {
        self.sprites.insert(name.into(), sprite);
    }

    /// Clone the template registered under `name`
    pub fn get(&self, name: &str) -> Result<Sprite> {
        self.sprites
            .get(name)
            .cloned()
            .ok_or_else(|| GameError::MissingSprite(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sprites.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_sheet_frames() {
        let texture = Rc::new(Texture::new("mage.png", 148, 576));
        let mut sprite = Sprite::from_sheet(texture, 4, 12);
        assert_eq!(sprite.frame_size, UVec2::new(37, 48));

        sprite.set_frame(2, 3);
        assert_eq!(sprite.frame_origin, UVec2::new(74, 144));

        let sprite = sprite.at(Vec2::new(10.0, 20.0));
        let bounds = sprite.bounds();
        assert_eq!(bounds.min, Vec2::new(10.0, 20.0));
        assert_eq!(bounds.size, Vec2::new(37.0, 48.0));
    }

    #[test]
    fn test_view_to_world() {
        let mut view = View::from_window(800, 600);
        assert_eq!(view.center, Vec2::new(400.0, 300.0));
        view.center = Vec2::new(1000.0, 700.0);
        assert_eq!(view.to_world(Vec2::new(10.0, 10.0)), Vec2::new(610.0, 410.0));
    }

    #[test]
    fn test_sprite_bank_missing() {
        let mut bank = SpriteBank::default();
        bank.insert("potion", Sprite::blank(16, 16));
        assert!(bank.get("potion").is_ok());
        assert!(matches!(bank.get("brain"), Err(GameError::MissingSprite(_))));
    }
}
