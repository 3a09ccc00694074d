//! Deterministic collision kernel
//!
//! All physics lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (slot map order, scene order)
//! - No rendering or platform dependencies

pub mod arena;
pub mod ball;
pub mod collision;
pub mod events;
pub mod kernel;
pub mod notify;
pub mod realtime;
pub mod rect;
pub mod scene;
pub mod tick;

pub use arena::{ArenaBounds, Axis};
pub use ball::{Ball, BallKey, BallSpec};
pub use collision::{
    RectContact, elastic_impulse, rect_contact, reflect_off_boundary, reflect_velocity,
    time_to_ball_contact, time_to_boundary, time_to_leave_rect, time_to_rect_contact,
};
pub use events::{EventKind, EventQueue, ScheduledEvent};
pub use kernel::PhysicsKernel;
pub use notify::{Notification, Observers, Subscription};
pub use realtime::{FrameInfo, FrameReport, LoopState, RealTimeLoop};
pub use rect::OrientedRect;
pub use scene::{Scene, SceneKind, SceneObject, SceneProvider};
