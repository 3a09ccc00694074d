//! Real-time driver: turns animation callbacks into whole fixed ticks
//!
//! The host calls `advance` once per animation frame with its clock. Elapsed
//! real time is clamped, scaled by the speed multiplier and accumulated; the
//! report says how many fixed ticks to run. Leftover budget carries over.

use crate::settings::KernelConfig;

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// Result of one animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Fixed ticks to run this frame
    pub ticks: u32,
    /// Frame rate sample, present once per sample interval
    pub fps: Option<u32>,
}

/// Diagnostic payload handed to the `on_frame` callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub fps: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RealTimeLoop {
    state: LoopState,
    dt: f64,
    speed_scale: f64,
    max_frame_dt: f64,
    fps_sample_interval: f64,
    /// Host clock (seconds) at the previous frame
    last_frame: Option<f64>,
    accumulator: f64,
    fps_timer: f64,
    fps_frames: u32,
}

impl RealTimeLoop {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            state: LoopState::Stopped,
            dt: config.dt,
            speed_scale: config.speed_scale.max(0.0),
            max_frame_dt: config.max_frame_dt,
            fps_sample_interval: config.fps_sample_interval,
            last_frame: None,
            accumulator: 0.0,
            fps_timer: 0.0,
            fps_frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Enter `Running`. The next frame only sets the clock baseline.
    /// Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LoopState::Running;
        self.last_frame = None;
        self.fps_timer = 0.0;
        self.fps_frames = 0;
        true
    }

    /// Enter `Stopped`. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LoopState::Stopped;
        self.last_frame = None;
        true
    }

    /// Stop and drop any accumulated budget
    pub fn reset(&mut self) {
        self.stop();
        self.accumulator = 0.0;
        self.fps_timer = 0.0;
        self.fps_frames = 0;
    }

    pub fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    /// Negative and NaN scales become 0 (frozen)
    pub fn set_speed_scale(&mut self, scale: f64) {
        self.speed_scale = scale.max(0.0);
    }

    /// Unspent sim time carried to the next frame
    pub fn budget(&self) -> f64 {
        self.accumulator
    }

    /// Account for one animation frame at host time `now` (seconds)
    pub fn advance(&mut self, now: f64) -> FrameReport {
        if !self.is_running() {
            return FrameReport::default();
        }
        let Some(last) = self.last_frame.replace(now) else {
            return FrameReport::default();
        };

        let real_dt = (now - last).max(0.0).min(self.max_frame_dt);
        self.accumulator += real_dt * self.speed_scale;

        let mut ticks = 0;
        while self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            ticks += 1;
        }

        self.fps_frames += 1;
        self.fps_timer += real_dt;
        let mut fps = None;
        if self.fps_timer >= self.fps_sample_interval {
            fps = Some((self.fps_frames as f64 / self.fps_timer).round() as u32);
            self.fps_timer = 0.0;
            self.fps_frames = 0;
        }

        FrameReport { ticks, fps }
    }
}

impl Default for RealTimeLoop {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> RealTimeLoop {
        let mut clock = RealTimeLoop::default();
        clock.start();
        assert_eq!(clock.advance(10.0), FrameReport::default());
        clock
    }

    #[test]
    fn test_stopped_loop_never_ticks() {
        let mut clock = RealTimeLoop::default();
        assert_eq!(clock.advance(1.0).ticks, 0);
        assert_eq!(clock.advance(2.0).ticks, 0);
        assert_eq!(clock.state(), LoopState::Stopped);
    }

    #[test]
    fn test_ticks_per_frame_and_carry_over() {
        let mut clock = running();
        // 2.5 ticks worth of real time
        let report = clock.advance(10.0 + 2.5 / 60.0);
        assert_eq!(report.ticks, 2);
        assert!((clock.budget() - 0.5 / 60.0).abs() < 1e-9);
        // The half tick left over completes on the next frame
        let report = clock.advance(10.0 + 3.2 / 60.0);
        assert_eq!(report.ticks, 1);
        assert!((clock.budget() - 0.2 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = running();
        // A 5 second stall counts as 0.1 s, not three hundred ticks
        let report = clock.advance(15.0);
        assert!(report.ticks <= 6);
        let spent = report.ticks as f64 * crate::consts::SIM_DT + clock.budget();
        assert!((spent - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_speed_scale() {
        let mut clock = running();
        clock.set_speed_scale(2.0);
        assert_eq!(clock.advance(10.0 + 1.0 / 60.0 + 1e-9).ticks, 2);
        clock.set_speed_scale(-3.0);
        assert_eq!(clock.speed_scale(), 0.0);
        assert_eq!(clock.advance(10.05).ticks, 0);
    }

    #[test]
    fn test_fps_sampled_every_half_second() {
        let mut clock = running();
        let mut samples = Vec::new();
        for frame in 1..=62 {
            if let Some(fps) = clock.advance(10.0 + frame as f64 / 60.0).fps {
                samples.push(fps);
            }
        }
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|&fps| fps == 60));
    }

    #[test]
    fn test_restart_resets_baseline() {
        let mut clock = running();
        assert!(clock.stop());
        assert!(!clock.stop());
        assert!(clock.start());
        // First frame after a restart only records the clock
        assert_eq!(clock.advance(100.0).ticks, 0);
        assert_eq!(clock.advance(100.0 + 1.0 / 60.0 + 1e-9).ticks, 1);
    }
}
