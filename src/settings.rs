//! Kernel configuration
//!
//! Loaded from JSON (missing fields fall back to defaults) and validated
//! before a kernel is built from it.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};

/// Kernel tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    // === Timing ===
    /// Fixed tick size (sim seconds)
    pub dt: f64,
    /// Sim seconds advanced per real second
    pub speed_scale: f64,
    /// Clamp on real time a single animation frame may consume
    pub max_frame_dt: f64,
    /// Real seconds between FPS samples
    pub fps_sample_interval: f64,

    // === Simulation ===
    /// Sim seconds a captured ball lingers before removal
    pub capture_linger: f64,
    /// Max fraction of its radius a ball may travel per integration pass
    pub substep_fraction: f64,
    /// Per-tick cap on resolved events
    pub max_events_per_tick: usize,
    /// Per-tick cap on integration passes (tiny, fast balls hit this)
    pub max_passes_per_tick: usize,

    // === Arena ===
    pub arena_width: f64,
    pub arena_height: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            speed_scale: 1.0,
            max_frame_dt: MAX_FRAME_DT,
            fps_sample_interval: FPS_SAMPLE_INTERVAL,

            capture_linger: CAPTURE_LINGER,
            substep_fraction: SUBSTEP_FRACTION,
            max_events_per_tick: MAX_EVENTS_PER_TICK,
            max_passes_per_tick: MAX_PASSES_PER_TICK,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
        }
    }
}

impl KernelConfig {
    /// Parse a config from JSON and validate it
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field is in range
    pub fn validate(&self) -> SimResult<()> {
        fn positive(name: &str, value: f64) -> SimResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        positive("dt", self.dt)?;
        positive("max_frame_dt", self.max_frame_dt)?;
        positive("fps_sample_interval", self.fps_sample_interval)?;
        positive("capture_linger", self.capture_linger)?;
        positive("substep_fraction", self.substep_fraction)?;

        if !(self.speed_scale.is_finite() && self.speed_scale >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "speed_scale must be non-negative, got {}",
                self.speed_scale
            )));
        }
        if self.max_events_per_tick == 0 {
            return Err(SimError::InvalidConfig(
                "max_events_per_tick must be at least 1".to_string(),
            ));
        }
        if self.max_passes_per_tick == 0 {
            return Err(SimError::InvalidConfig(
                "max_passes_per_tick must be at least 1".to_string(),
            ));
        }
        if !(self.arena_width.is_finite()
            && self.arena_height.is_finite()
            && self.arena_width > 0.0
            && self.arena_height > 0.0)
        {
            return Err(SimError::InvalidBounds {
                width: self.arena_width,
                height: self.arena_height,
            });
        }
        Ok(())
    }
}
