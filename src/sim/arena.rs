//! Arena bounds: the axis-aligned play field every ball is kept inside

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis of a boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Component of `v` along this axis
    #[inline]
    pub fn component(self, v: DVec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Unit vector along this axis
    #[inline]
    pub fn unit(self) -> DVec2 {
        match self {
            Axis::X => DVec2::X,
            Axis::Y => DVec2::Y,
        }
    }
}

/// Rectangular play field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ArenaBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Lowest coordinate along `axis`
    #[inline]
    pub fn min(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Highest coordinate along `axis`
    #[inline]
    pub fn max(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x + self.width,
            Axis::Y => self.y + self.height,
        }
    }

    /// Whether a disc of `radius` at `pos` lies fully inside
    pub fn contains_disc(&self, pos: DVec2, radius: f64) -> bool {
        pos.x - radius >= self.x
            && pos.x + radius <= self.x + self.width
            && pos.y - radius >= self.y
            && pos.y + radius <= self.y + self.height
    }

    /// Clamp a coordinate so a disc of `radius` stays `margin` away from both
    /// walls on `axis`. If the arena is narrower than the disc the lower
    /// limit wins.
    pub fn clamp_axis(&self, axis: Axis, value: f64, radius: f64, margin: f64) -> f64 {
        let lo = self.min(axis) + radius + margin;
        let hi = self.max(axis) - radius - margin;
        value.min(hi).max(lo)
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::new(crate::consts::ARENA_WIDTH, crate::consts::ARENA_HEIGHT)
    }
}
