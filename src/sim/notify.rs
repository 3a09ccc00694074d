//! Outcome notifications and their per-kernel observer set
//!
//! Notifications are delivered synchronously while an event is resolved.
//! Each kernel owns its own observers; subscribing returns a token that
//! removes the listener again.

use serde::{Deserialize, Serialize};

use super::arena::Axis;

/// Something observable happened during event resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Ball bounced off an arena wall
    Boundary { ball: u32, axis: Axis, t: f64 },
    /// Two balls exchanged momentum
    BallCollision { a: u32, b: u32, t: f64 },
    /// Ball hit a wall object
    WallBounce { ball: u32, object: String, t: f64 },
    /// Ball entered an input port
    InputPass {
        ball: u32,
        object: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        t: f64,
    },
    /// Ball was captured by an output port
    OutputCapture {
        ball: u32,
        object: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        t: f64,
    },
    /// Captured ball finished lingering and left the simulation
    BallRemoved { ball: u32, t: f64 },
}

impl Notification {
    /// Sim time the notification was emitted at
    pub fn time(&self) -> f64 {
        match *self {
            Notification::Boundary { t, .. }
            | Notification::BallCollision { t, .. }
            | Notification::WallBounce { t, .. }
            | Notification::InputPass { t, .. }
            | Notification::OutputCapture { t, .. }
            | Notification::BallRemoved { t, .. } => t,
        }
    }
}

/// Token returned by `subscribe`; pass it back to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&Notification)>;

/// Listener set owned by one kernel
#[derive(Default)]
pub struct Observers {
    listeners: Vec<(Subscription, Listener)>,
    next_id: u64,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Notification) + 'static) -> Subscription {
        let token = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((token, Box::new(listener)));
        token
    }

    /// Returns false if the token was already gone
    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(t, _)| *t != token);
        self.listeners.len() != before
    }

    /// Deliver to every listener in subscription order
    pub fn emit(&mut self, notification: &Notification) {
        log::trace!("emit {notification:?}");
        for (_, listener) in &mut self.listeners {
            listener(notification);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
