//! Oriented rectangle geometry for scene objects
//!
//! A rectangle is stored the way the scene editor places it: top-left corner
//! of the unrotated box plus a size, rotated by `rotation` radians about its
//! center. Collision math works in the rectangle's local frame, where the box
//! is centered at the origin and axis-aligned.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Rectangle rotated about its center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation about the center (radians)
    #[serde(default)]
    pub rotation: f64,
}

impl OrientedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    /// Rectangle of the given size centered at `center`
    pub fn centered(center: DVec2, width: f64, height: f64, rotation: f64) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
            rotation,
        )
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn half_extents(&self) -> DVec2 {
        DVec2::new(self.width.abs() / 2.0, self.height.abs() / 2.0)
    }

    /// World point -> local frame
    #[inline]
    pub fn to_local(&self, p: DVec2) -> DVec2 {
        DVec2::from_angle(-self.rotation).rotate(p - self.center())
    }

    /// World direction -> local frame (no translation)
    #[inline]
    pub fn dir_to_local(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(-self.rotation).rotate(v)
    }

    /// Local direction -> world frame
    #[inline]
    pub fn dir_to_world(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(self.rotation).rotate(v)
    }

    /// Local point -> world frame
    #[inline]
    pub fn to_world(&self, p: DVec2) -> DVec2 {
        self.center() + self.dir_to_world(p)
    }

    /// Closest point of the (solid) box to a local point
    #[inline]
    pub fn closest_local(&self, local: DVec2) -> DVec2 {
        let half = self.half_extents();
        local.clamp(-half, half)
    }

    /// Signed distance from a world point to the box surface
    /// (negative inside)
    pub fn signed_distance(&self, p: DVec2) -> f64 {
        let local = self.to_local(p);
        let q = local.abs() - self.half_extents();
        q.max(DVec2::ZERO).length() + q.x.max(q.y).min(0.0)
    }

    /// Whether a world point lies inside the box
    pub fn contains_point(&self, p: DVec2) -> bool {
        self.signed_distance(p) <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_local_roundtrip() {
        let rect = OrientedRect::new(10.0, 20.0, 40.0, 10.0, 0.7);
        let p = DVec2::new(33.0, -4.0);
        let back = rect.to_world(rect.to_local(p));
        assert!((back - p).length() < 1e-9);
    }

    #[test]
    fn test_quarter_turn_swaps_extents() {
        // 100x10 bar turned upright
        let rect = OrientedRect::centered(DVec2::ZERO, 100.0, 10.0, FRAC_PI_2);
        assert!(rect.contains_point(DVec2::new(0.0, 45.0)));
        assert!(!rect.contains_point(DVec2::new(45.0, 0.0)));
    }

    #[test]
    fn test_signed_distance() {
        let rect = OrientedRect::centered(DVec2::ZERO, 20.0, 10.0, 0.0);
        assert!((rect.signed_distance(DVec2::new(15.0, 0.0)) - 5.0).abs() < 1e-12);
        assert!((rect.signed_distance(DVec2::new(0.0, 0.0)) + 5.0).abs() < 1e-12);
        // Diagonal from a corner
        let d = rect.signed_distance(DVec2::new(13.0, 9.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_local_clamps_to_box() {
        let rect = OrientedRect::centered(DVec2::ZERO, 20.0, 10.0, 0.3);
        assert_eq!(rect.closest_local(DVec2::new(3.0, -2.0)), DVec2::new(3.0, -2.0));
        assert_eq!(rect.closest_local(DVec2::new(30.0, -9.0)), DVec2::new(10.0, -5.0));
    }
}
