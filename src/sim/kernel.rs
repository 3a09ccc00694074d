//! Kernel state, public API and the event scheduler
//!
//! The kernel owns the balls and the event queue. Scene objects belong to an
//! external logic layer; the kernel keeps a snapshot of them that is only
//! refreshed by `set_logic_layer` and `rebuild_events`.
//!
//! Scheduling keeps exactly one authoritative event per ball: the earliest
//! predicted contact against the arena, other balls, or scene objects.
//! Everything later is discovered once that event fires.

use slotmap::{SecondaryMap, SlotMap};

use super::arena::ArenaBounds;
use super::ball::{Ball, BallKey, BallSpec};
use super::collision::{
    rect_contact, time_to_ball_contact, time_to_boundary, time_to_leave_rect,
    time_to_rect_contact,
};
use super::events::{EventKind, EventQueue, ScheduledEvent};
use super::notify::{Notification, Observers, Subscription};
use super::realtime::{FrameInfo, RealTimeLoop};
use super::scene::{SceneKind, SceneObject, SceneProvider};
use crate::consts::{BOUNDARY_APPROACH_GAP, CONTACT_SLOP};
use crate::error::{SimError, SimResult};
use crate::settings::KernelConfig;

/// Per-ball scheduling bookkeeping
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScheduleSlot {
    /// Bumped whenever the ball's motion changes outside a prediction
    pub(crate) version: u64,
    /// Other ball of the authoritative event, if it is a pair event
    pub(crate) partner: Option<BallKey>,
}

type FrameCallback = Box<dyn FnMut(FrameInfo)>;

/// Event-driven 2D collision kernel
pub struct PhysicsKernel {
    pub(crate) config: KernelConfig,
    pub(crate) bounds: ArenaBounds,
    pub(crate) balls: SlotMap<BallKey, Ball>,
    pub(crate) schedule: SecondaryMap<BallKey, ScheduleSlot>,
    pub(crate) queue: EventQueue,
    /// Current sim time
    pub(crate) time: f64,
    /// Completed ticks
    pub(crate) steps: u64,
    next_ball_id: u32,
    provider: Option<Box<dyn SceneProvider>>,
    /// Scene snapshot events index into
    pub(crate) scene: Vec<SceneObject>,
    pub(crate) observers: Observers,
    clock: RealTimeLoop,
    /// Queue must be rebuilt before the next tick resolves anything
    pub(crate) queue_dirty: bool,
    on_frame: Option<FrameCallback>,
}

impl PhysicsKernel {
    pub fn new(config: KernelConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: KernelConfig) -> Self {
        Self {
            bounds: ArenaBounds::new(config.arena_width, config.arena_height),
            clock: RealTimeLoop::new(&config),
            config,
            balls: SlotMap::with_key(),
            schedule: SecondaryMap::new(),
            queue: EventQueue::new(),
            time: 0.0,
            steps: 0,
            next_ball_id: 0,
            provider: None,
            scene: Vec::new(),
            observers: Observers::new(),
            queue_dirty: false,
            on_frame: None,
        }
    }

    // === Balls ===

    /// Spawn a ball and schedule its first event
    pub fn add_ball(&mut self, spec: BallSpec) -> SimResult<BallKey> {
        spec.validate()?;
        self.next_ball_id += 1;
        let ball = Ball::from_spec(self.next_ball_id, spec);
        log::debug!(
            "spawn ball {} at ({:.2}, {:.2}) v=({:.2}, {:.2}) r={}",
            ball.id,
            ball.pos.x,
            ball.pos.y,
            ball.vel.x,
            ball.vel.y,
            ball.radius
        );
        let key = self.balls.insert(ball);
        self.schedule.insert(key, ScheduleSlot::default());
        self.schedule_for_ball(key);
        Ok(key)
    }

    /// Remove a ball immediately. Returns it if the handle was live.
    pub fn remove_ball(&mut self, key: BallKey) -> Option<Ball> {
        let ball = self.balls.remove(key)?;
        self.schedule.remove(key);
        log::debug!("removed ball {}", ball.id);
        self.rebuild_queue();
        Some(ball)
    }

    pub fn clear_balls(&mut self) {
        self.balls.clear();
        self.schedule.clear();
        self.queue.clear();
        self.queue_dirty = false;
        log::debug!("cleared all balls");
    }

    pub fn ball(&self, key: BallKey) -> Option<&Ball> {
        self.balls.get(key)
    }

    /// Balls in stable iteration order
    pub fn balls(&self) -> impl Iterator<Item = (BallKey, &Ball)> {
        self.balls.iter()
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    // === Arena and scene ===

    pub fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    /// Resize the arena. The queue is rebuilt now when running, otherwise
    /// before the next tick.
    pub fn set_bounds(&mut self, width: f64, height: f64) -> SimResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SimError::InvalidBounds { width, height });
        }
        self.bounds = ArenaBounds::new(width, height);
        log::info!("arena resized to {width}x{height}");
        if self.is_running() {
            self.rebuild_queue();
        } else {
            self.queue_dirty = true;
        }
        Ok(())
    }

    /// Install the external scene source and resynchronise with it
    pub fn set_logic_layer(&mut self, provider: impl SceneProvider + 'static) {
        self.provider = Some(Box::new(provider));
        log::info!("logic layer installed");
        self.rebuild_events();
    }

    /// Scene snapshot the kernel currently collides against
    pub fn scene_objects(&self) -> &[SceneObject] {
        &self.scene
    }

    /// Re-read the scene and recompute every ball's next event. Call after
    /// any external change to scene objects or discontinuous ball edits.
    pub fn rebuild_events(&mut self) {
        self.scene = self
            .provider
            .as_ref()
            .map(|p| p.scene_objects())
            .unwrap_or_default();
        self.rebuild_queue();
    }

    /// Clear the queue and reschedule every ball against the cached scene
    pub(crate) fn rebuild_queue(&mut self) {
        self.queue.clear();
        self.queue_dirty = false;
        // Bump everyone before scheduling so pair snapshots see final versions
        for (_, slot) in self.schedule.iter_mut() {
            slot.version += 1;
            slot.partner = None;
        }
        let keys: Vec<BallKey> = self.balls.keys().collect();
        for key in keys {
            self.schedule_for_ball(key);
        }
        log::debug!(
            "rebuilt event queue: {} balls, {} objects, {} events",
            self.balls.len(),
            self.scene.len(),
            self.queue.len()
        );
    }

    // === Lifecycle ===

    /// Zero time and steps, stop the loop and drop queued events. Balls stay.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.time = 0.0;
        self.steps = 0;
        self.queue.clear();
        self.queue_dirty = true;
        log::info!("kernel reset ({} balls kept)", self.balls.len());
    }

    /// Start driving ticks from animation frames. `on_frame` receives a
    /// payload after every frame, with an FPS sample now and then.
    pub fn run(&mut self, on_frame: impl FnMut(FrameInfo) + 'static) {
        self.on_frame = Some(Box::new(on_frame));
        if self.clock.start() {
            self.rebuild_events();
            log::info!("running at t={:.3}, step {}", self.time, self.steps);
        }
    }

    pub fn pause(&mut self) {
        if self.clock.stop() {
            log::info!("paused at t={:.3}, step {}", self.time, self.steps);
        }
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Host animation callback; `now_ms` is the host clock in milliseconds.
    /// Runs the ticks owed for this frame and returns how many ran.
    pub fn animation_frame(&mut self, now_ms: f64) -> u32 {
        if !self.is_running() {
            return 0;
        }
        let report = self.clock.advance(now_ms / 1000.0);
        for _ in 0..report.ticks {
            self.tick();
        }
        if let Some(on_frame) = self.on_frame.as_mut() {
            on_frame(FrameInfo { fps: report.fps });
        }
        report.ticks
    }

    pub fn speed_scale(&self) -> f64 {
        self.clock.speed_scale()
    }

    pub fn set_speed_scale(&mut self, scale: f64) {
        self.clock.set_speed_scale(scale);
        self.config.speed_scale = self.clock.speed_scale();
    }

    // === Observers ===

    /// Subscribe to notifications emitted while events resolve
    pub fn on_event(&mut self, listener: impl FnMut(&Notification) + 'static) -> Subscription {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.observers.unsubscribe(token)
    }

    // === Accessors ===

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Queued events, stale ones included
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Time of the earliest live event
    pub fn next_event_time(&self) -> Option<f64> {
        self.queue
            .iter()
            .filter(|ev| self.is_live(ev))
            .map(|ev| ev.time)
            .min_by(f64::total_cmp)
    }

    /// Every ball the event depends on still exists at the snapshot version
    pub(crate) fn is_live(&self, event: &ScheduledEvent) -> bool {
        let current = |key: BallKey, version: u64| {
            self.schedule.get(key).is_some_and(|s| s.version == version)
        };
        current(event.kind.ball(), event.versions[0])
            && event
                .kind
                .partner()
                .is_none_or(|b| current(b, event.versions[1]))
    }

    // === Scheduling ===

    /// Recompute and enqueue the next event for one ball
    pub fn schedule_for_ball(&mut self, key: BallKey) {
        if !self.balls.contains_key(key) {
            return;
        }
        self.refresh_contact_memory(key);

        let prediction = self.predict(key);
        let Some(slot) = self.schedule.get(key).copied() else {
            return;
        };
        let partner = prediction.and_then(|(_, kind)| kind.partner());
        if let Some(slot) = self.schedule.get_mut(key) {
            slot.partner = partner;
        }

        let Some((dt, kind)) = prediction else {
            log::trace!("ball {:?} has no reachable contact", key);
            return;
        };
        let partner_version = partner
            .and_then(|b| self.schedule.get(b))
            .map_or(0, |s| s.version);
        self.queue
            .push(self.time + dt, kind, [slot.version, partner_version]);
    }

    /// Update the edge-trigger and bounce latches from current contact:
    /// forget an input port the ball has left, and re-arm bouncing once it
    /// touches no wall.
    fn refresh_contact_memory(&mut self, key: BallKey) {
        let scene = &self.scene;
        let Some(ball) = self.balls.get_mut(key) else {
            return;
        };

        if let Some(id) = ball.last_input.as_deref() {
            let still_inside = scene.iter().any(|o| {
                o.kind == SceneKind::Input
                    && o.id == id
                    && rect_contact(&o.rect, ball.pos).touches(ball.radius, CONTACT_SLOP)
            });
            if !still_inside {
                ball.last_input = None;
            }
        }

        if !ball.may_bounce {
            let touching_wall = scene.iter().any(|o| {
                o.kind == SceneKind::Wall
                    && rect_contact(&o.rect, ball.pos).touches(ball.radius, CONTACT_SLOP)
            });
            if !touching_wall {
                ball.may_bounce = true;
            }
        }
    }

    /// Earliest contact for `key`, relative to now. Ties keep the first
    /// candidate found: arena, then balls, then scene objects.
    pub(crate) fn predict(&self, key: BallKey) -> Option<(f64, EventKind)> {
        let ball = self.balls.get(key)?;
        if ball.is_captured() {
            return None;
        }

        let mut best: Option<(f64, EventKind)> = None;
        let mut offer = |t: f64, kind: EventKind| {
            if t.is_finite() && best.is_none_or(|(bt, _)| t < bt) {
                best = Some((t, kind));
            }
        };

        if let Some((t, axis)) = time_to_boundary(
            &self.bounds,
            ball.pos,
            ball.vel,
            ball.radius,
            BOUNDARY_APPROACH_GAP,
        ) {
            offer(t, EventKind::Boundary { ball: key, axis });
        }

        for (other_key, other) in &self.balls {
            if other_key == key || other.is_captured() {
                continue;
            }
            if let Some(t) = time_to_ball_contact(
                ball.pos,
                ball.vel,
                ball.radius,
                other.pos,
                other.vel,
                other.radius,
            ) {
                offer(t, EventKind::BallPair { a: key, b: other_key });
            }
        }

        for (index, object) in self.scene.iter().enumerate() {
            let contact = rect_contact(&object.rect, ball.pos);
            let touching = contact.touches(ball.radius, CONTACT_SLOP);
            match object.kind {
                SceneKind::Wall => {
                    let kind = EventKind::SceneWall { ball: key, object: index };
                    if touching && ball.vel.dot(contact.normal) < 0.0 {
                        offer(0.0, kind);
                    } else if let Some(t) =
                        time_to_rect_contact(&object.rect, ball.pos, ball.vel, ball.radius)
                    {
                        offer(t, kind);
                    }
                }
                SceneKind::Output => {
                    let kind = EventKind::SceneOutput { ball: key, object: index };
                    if touching {
                        offer(0.0, kind);
                    } else if let Some(t) =
                        time_to_rect_contact(&object.rect, ball.pos, ball.vel, ball.radius)
                    {
                        offer(t, kind);
                    }
                }
                SceneKind::Input => {
                    let kind = EventKind::SceneInput { ball: key, object: index };
                    let remembered = ball.last_input.as_deref();
                    if !touching {
                        if let Some(t) =
                            time_to_rect_contact(&object.rect, ball.pos, ball.vel, ball.radius)
                        {
                            offer(t, kind);
                        }
                    } else if remembered == Some(object.id.as_str()) {
                        // Inside: wake up when it leaves so the trigger re-arms
                        let margin = ball.radius + 2.0 * CONTACT_SLOP;
                        if let Some(t) = time_to_leave_rect(&object.rect, ball.pos, ball.vel, margin)
                        {
                            offer(t, kind);
                        }
                    } else if remembered.is_none() {
                        offer(0.0, kind);
                    }
                }
            }
        }

        best
    }
}

impl Default for PhysicsKernel {
    fn default() -> Self {
        Self::with_config(KernelConfig::default())
    }
}

impl std::fmt::Debug for PhysicsKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsKernel")
            .field("time", &self.time)
            .field("steps", &self.steps)
            .field("balls", &self.balls.len())
            .field("objects", &self.scene.len())
            .field("queued", &self.queue.len())
            .field("running", &self.is_running())
            .finish()
    }
}
