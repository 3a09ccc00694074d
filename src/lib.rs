//! Billiard Computer - event-driven collision kernel
//!
//! Balls travel through a bounded arena, bounce off walls and rotated
//! obstacle rectangles, pass through input ports and get captured by output
//! ports. Gate geometry laid out in the scene turns those collisions into
//! mechanical logic.
//!
//! Core modules:
//! - `sim`: Deterministic kernel (entities, collision math, event scheduling, tick)
//! - `settings`: Kernel configuration
//! - `truth_table`: Headless gate evaluation on top of the kernel

pub mod error;
pub mod settings;
pub mod sim;
pub mod truth_table;

pub use error::{SimError, SimResult};
pub use settings::KernelConfig;
pub use sim::{
    ArenaBounds, Axis, Ball, BallKey, BallSpec, Notification, PhysicsKernel, RealTimeLoop,
    Scene, SceneKind, SceneObject, SceneProvider, Subscription,
};

/// Kernel configuration constants
pub mod consts {
    /// Fixed simulation timestep (seconds of sim time per tick)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Largest real-time gap a single animation frame may account for
    pub const MAX_FRAME_DT: f64 = 0.1;
    /// How often the real-time loop reports an FPS sample (real seconds)
    pub const FPS_SAMPLE_INTERVAL: f64 = 0.5;

    /// Default arena size
    pub const ARENA_WIDTH: f64 = 1280.0;
    pub const ARENA_HEIGHT: f64 = 720.0;

    /// Ball defaults
    pub const BALL_RADIUS: f64 = 8.0;
    pub const BALL_MASS: f64 = 1.0;
    pub const BALL_COLOR: &str = "#7cf29a";

    /// Balls launched from an input port
    pub const INPUT_SPAWN_SPEED: f64 = 180.0;
    pub const INPUT_SPAWN_RADIUS: f64 = 24.0;

    /// Sim time a captured ball lingers (glowing) before removal
    pub const CAPTURE_LINGER: f64 = 6.0;

    /// Events due within this much sim time are resolved now
    pub const EVENT_EPSILON: f64 = 1e-6;
    /// Predicted contacts closer than this are treated as "already behind us"
    pub const PREDICTION_EPSILON: f64 = 1e-9;
    /// Fraction of a ball's radius it may travel in one integration pass
    pub const SUBSTEP_FRACTION: f64 = 1.0 / 3.0;
    /// Upper bound on events resolved inside one tick
    pub const MAX_EVENTS_PER_TICK: usize = 4096;
    /// Upper bound on integration passes inside one tick; sets the shortest
    /// pass length to `dt / MAX_PASSES_PER_TICK`
    pub const MAX_PASSES_PER_TICK: usize = 4096;

    /// Boundary events fire this far before the ball actually touches
    pub const BOUNDARY_APPROACH_GAP: f64 = 0.25;
    /// Clamp margin applied after a boundary reflection
    pub const BOUNDARY_CLAMP_MARGIN: f64 = 0.01;
    /// Extra push-out after wall depenetration
    pub const WALL_SEPARATION: f64 = 0.25;
    /// Extra push-out after ball/ball depenetration
    pub const BALL_SEPARATION: f64 = 1e-4;
    /// Distance tolerance for "touching" a scene object
    pub const CONTACT_SLOP: f64 = 1e-3;
    /// Slack on face extents in swept rectangle tests
    pub const FACE_EXTENT_SLACK: f64 = 1e-3;
}
