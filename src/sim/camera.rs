//! Camera follow
//!
//! The view centres on the followed point but never shows anything outside
//! the map. Clamping each axis independently gives the nine cases (centre,
//! four edges, four corners) of a bounded scrolling camera.

use glam::Vec2;

/// Clamp one axis of the view centre
fn follow_axis(target: f32, half_view: f32, map_extent: f32) -> f32 {
    if map_extent <= 2.0 * half_view {
        // Map smaller than the view: keep it centred
        map_extent / 2.0
    } else {
        target.clamp(half_view, map_extent - half_view)
    }
}

/// View centre following `target` inside a map of `map_size` pixels
pub fn follow(target: Vec2, view_size: Vec2, map_size: Vec2) -> Vec2 {
    let half = view_size / 2.0;
    Vec2::new(
        follow_axis(target.x, half.x, map_size.x),
        follow_axis(target.y, half.y, map_size.y),
    )
}
