//! Axis-aligned collision geometry
//!
//! Entities collide by their sprite bounds; obstacle checks use an optional
//! smaller footprint (feet of a character rather than its whole sprite).

use glam::Vec2;

/// Axis-aligned rectangle in world space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Bottom-right corner
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    /// Strict overlap test: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }

    /// Point containment, inclusive of the top-left edge and exclusive of the bottom-right
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x < max.x && point.y >= self.min.y && point.y < max.y
    }

    /// The four corners: top-left, top-right, bottom-left, bottom-right
    pub fn corners(&self) -> [Vec2; 4] {
        let max = self.max();
        [
            self.min,
            Vec2::new(max.x, self.min.y),
            Vec2::new(self.min.x, max.y),
            max,
        ]
    }

    /// This rectangle moved by `delta`
    #[inline]
    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect::new(self.min + delta, self.size)
    }
}

/// Obstacle-check region relative to an entity's bounds
///
/// `offset` is measured from the bounds' top-left corner. A footprint of the
/// full bounds is `Footprint::new(Vec2::ZERO, bounds.size)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub offset: Vec2,
    pub size: Vec2,
}

impl Footprint {
    pub const fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size }
    }

    /// Footprint covering the bottom `fraction` of a sprite, shrunk by `inset` on the sides
    pub fn feet(sprite_size: Vec2, fraction: f32, inset: f32) -> Self {
        let height = sprite_size.y * fraction.clamp(0.0, 1.0);
        Self {
            offset: Vec2::new(inset, sprite_size.y - height),
            size: Vec2::new((sprite_size.x - 2.0 * inset).max(0.0), height),
        }
    }

    /// Place the footprint against world-space `bounds`
    pub fn resolve(&self, bounds: &Rect) -> Rect {
        Rect::new(bounds.min + self.offset, self.size)
    }
}

/// Clamp `bounds` so it lies inside `[0, limit]` on both axes
///
/// Returns the translation applied. Bounds larger than the limit are pinned to
/// the origin.
pub fn clamp_into(bounds: &Rect, limit: Vec2) -> Vec2 {
    let max_min = (limit - bounds.size).max(Vec2::ZERO);
    let clamped = bounds.min.clamp(Vec2::ZERO, max_min);
    clamped - bounds.min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_is_strict() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let touching = Rect::new(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        let overlapping = Rect::new(Vec2::new(9.0, 9.0), Vec2::splat(10.0));

        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
    }

    #[test]
    fn test_corners_and_center() {
        let r = Rect::new(Vec2::new(2.0, 4.0), Vec2::new(6.0, 8.0));
        assert_eq!(r.center(), Vec2::new(5.0, 8.0));
        assert_eq!(
            r.corners(),
            [
                Vec2::new(2.0, 4.0),
                Vec2::new(8.0, 4.0),
                Vec2::new(2.0, 12.0),
                Vec2::new(8.0, 12.0),
            ]
        );
        assert!(r.contains(Vec2::new(2.0, 4.0)));
        assert!(!r.contains(Vec2::new(8.0, 12.0)));
    }

    #[test]
    fn test_feet_footprint() {
        let fp = Footprint::feet(Vec2::new(32.0, 48.0), 0.25, 4.0);
        assert_eq!(fp.offset, Vec2::new(4.0, 36.0));
        assert_eq!(fp.size, Vec2::new(24.0, 12.0));

        let world = fp.resolve(&Rect::new(Vec2::new(100.0, 100.0), Vec2::new(32.0, 48.0)));
        assert_eq!(world.min, Vec2::new(104.0, 136.0));
    }

    #[test]
    fn test_clamp_into_limits() {
        let limit = Vec2::new(100.0, 100.0);
        let outside = Rect::new(Vec2::new(-5.0, 95.0), Vec2::splat(10.0));
        assert_eq!(clamp_into(&outside, limit), Vec2::new(5.0, -5.0));

        let inside = Rect::new(Vec2::new(10.0, 10.0), Vec2::splat(10.0));
        assert_eq!(clamp_into(&inside, limit), Vec2::ZERO);
    }
}
