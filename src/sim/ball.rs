//! Ball entity and spawn spec

use glam::DVec2;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::consts::*;
use crate::error::{SimError, SimResult};

new_key_type! {
    /// Stable, generation-checked handle to a ball. A handle outlives its
    /// ball safely: lookups through a stale handle simply miss.
    pub struct BallKey;
}

/// Parameters for spawning a ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSpec {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub mass: f64,
    pub color: String,
}

impl Default for BallSpec {
    fn default() -> Self {
        Self {
            pos: DVec2::ZERO,
            vel: DVec2::ZERO,
            radius: BALL_RADIUS,
            mass: BALL_MASS,
            color: BALL_COLOR.to_string(),
        }
    }
}

impl BallSpec {
    pub fn new(pos: DVec2, vel: DVec2) -> Self {
        Self {
            pos,
            vel,
            ..Default::default()
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Reject specs that would break the kernel's invariants
    pub fn validate(&self) -> SimResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimError::InvalidBall {
                field: "radius",
                value: self.radius,
            });
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::InvalidBall {
                field: "mass",
                value: self.mass,
            });
        }
        for (field, value) in [
            ("x", self.pos.x),
            ("y", self.pos.y),
            ("vx", self.vel.x),
            ("vy", self.vel.y),
        ] {
            if !value.is_finite() {
                return Err(SimError::InvalidBall { field, value });
            }
        }
        Ok(())
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Display id (sequential, never reused)
    pub id: u32,
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub mass: f64,
    pub color: String,
    /// Spawn position and velocity, kept for editors
    pub origin: DVec2,
    pub launch_velocity: DVec2,
    /// Captured balls glow from `glow_start` until removal
    pub glow: bool,
    pub glow_start: f64,
    /// Absolute sim time at which the ball is removed
    pub remove_at: Option<f64>,
    /// Cleared after a wall reflection, re-armed once the ball is clear of
    /// every wall
    pub may_bounce: bool,
    /// Input port the ball is currently inside (edge trigger memory)
    pub last_input: Option<String>,
}

impl Ball {
    pub(crate) fn from_spec(id: u32, spec: BallSpec) -> Self {
        Self {
            id,
            pos: spec.pos,
            vel: spec.vel,
            radius: spec.radius,
            mass: spec.mass,
            color: spec.color,
            origin: spec.pos,
            launch_velocity: spec.vel,
            glow: false,
            glow_start: 0.0,
            remove_at: None,
            may_bounce: true,
            last_input: None,
        }
    }

    /// Captured by an output port and waiting for removal
    #[inline]
    pub fn is_captured(&self) -> bool {
        self.remove_at.is_some()
    }

    /// Freeze the ball at `pos` and start its removal countdown
    pub(crate) fn capture(&mut self, pos: DVec2, now: f64, linger: f64) {
        self.pos = pos;
        self.vel = DVec2::ZERO;
        self.glow = true;
        self.glow_start = now;
        self.remove_at = Some(now + linger);
    }

    /// Removal deadline has been reached
    #[inline]
    pub fn expired(&self, now: f64) -> bool {
        self.remove_at.is_some_and(|at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = BallSpec::new(DVec2::new(10.0, 20.0), DVec2::new(1.0, 0.0));
        assert_eq!(spec.radius, BALL_RADIUS);
        assert_eq!(spec.mass, BALL_MASS);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_spec_rejects_bad_radius_and_mass() {
        let spec = BallSpec::default().with_radius(0.0);
        assert!(matches!(
            spec.validate(),
            Err(SimError::InvalidBall { field: "radius", .. })
        ));
        let spec = BallSpec::default().with_mass(-1.0);
        assert!(matches!(
            spec.validate(),
            Err(SimError::InvalidBall { field: "mass", .. })
        ));
        let spec = BallSpec::new(DVec2::new(f64::NAN, 0.0), DVec2::ZERO);
        assert!(matches!(
            spec.validate(),
            Err(SimError::InvalidBall { field: "x", .. })
        ));
    }

    #[test]
    fn test_capture_and_expiry() {
        let mut ball = Ball::from_spec(1, BallSpec::new(DVec2::ZERO, DVec2::new(5.0, 5.0)));
        ball.capture(DVec2::new(3.0, 4.0), 2.0, CAPTURE_LINGER);
        assert!(ball.is_captured());
        assert_eq!(ball.vel, DVec2::ZERO);
        assert!(ball.glow);
        assert!(!ball.expired(7.9));
        assert!(ball.expired(8.0));
    }
}
