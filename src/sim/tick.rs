//! Fixed timestep simulation tick
//!
//! Advances the kernel by exactly one slice of `config.dt`, integrating in
//! passes that stop at every due event and never move a ball more than a
//! fraction of its own radius.

use glam::DVec2;

use super::arena::Axis;
use super::ball::BallKey;
use super::collision::{elastic_impulse, rect_contact, reflect_off_boundary, reflect_velocity};
use super::events::{EventKind, ScheduledEvent};
use super::kernel::PhysicsKernel;
use super::notify::Notification;
use crate::consts::*;

/// Slice time left below this is treated as spent
const REMAINING_EPSILON: f64 = 1e-12;

impl PhysicsKernel {
    /// Advance the simulation by one fixed slice
    pub fn tick(&mut self) {
        if self.queue_dirty {
            self.rebuild_queue();
        }

        let mut remaining = self.config.dt;
        let mut resolved = 0usize;
        let mut capped = false;
        let min_pass = self.config.dt / self.config.max_passes_per_tick as f64;
        let mut floored = false;

        while remaining > REMAINING_EPSILON {
            let next = if capped { None } else { self.next_live_time() };
            let target = next.map_or(remaining, |te| (te - self.time).clamp(0.0, remaining));
            let mut limit = self.substep_limit();
            if limit < min_pass {
                if !floored {
                    log::warn!(
                        "pass length {limit:.3e} below floor {min_pass:.3e} at t={:.6}; \
                         travel bound relaxed for this tick",
                        self.time
                    );
                    floored = true;
                }
                limit = min_pass;
            }
            let step = target.min(limit);
            if step > 0.0 {
                self.integrate(step);
                remaining -= step;
            }
            if capped {
                continue;
            }

            while let Some(event) = self.pop_due() {
                if resolved >= self.config.max_events_per_tick {
                    log::warn!(
                        "event cap ({}) hit at t={:.6}; finishing slice without resolution",
                        self.config.max_events_per_tick,
                        self.time
                    );
                    self.rebuild_queue();
                    capped = true;
                    break;
                }
                self.resolve(event);
                resolved += 1;
            }
        }

        self.remove_expired();
        self.steps += 1;
    }

    /// Largest pass that keeps every moving ball within its travel bound
    fn substep_limit(&self) -> f64 {
        let fraction = self.config.substep_fraction;
        self.balls
            .values()
            .filter(|b| !b.is_captured())
            .filter_map(|b| {
                let speed = b.vel.length();
                (speed > 0.0).then(|| fraction * b.radius / speed)
            })
            .fold(f64::INFINITY, f64::min)
    }

    fn integrate(&mut self, dt: f64) {
        for ball in self.balls.values_mut() {
            if !ball.is_captured() {
                ball.pos += ball.vel * dt;
            }
        }
        self.time += dt;
    }

    /// Drop stale events at the head of the queue
    fn discard_stale(&mut self) {
        while let Some(event) = self.queue.peek() {
            if self.is_live(event) {
                break;
            }
            log::trace!("discard stale {:?} at t={:.6}", event.kind, event.time);
            self.queue.pop();
        }
    }

    fn next_live_time(&mut self) -> Option<f64> {
        self.discard_stale();
        self.queue.peek_time()
    }

    /// Pop the head event if it is live and due now
    fn pop_due(&mut self) -> Option<ScheduledEvent> {
        self.discard_stale();
        let due = self.queue.peek_time()? - self.time <= EVENT_EPSILON;
        if due { self.queue.pop() } else { None }
    }

    fn resolve(&mut self, event: ScheduledEvent) {
        log::trace!("resolve {:?} at t={:.6}", event.kind, self.time);
        let notification = match event.kind {
            EventKind::Boundary { ball, axis } => self.resolve_boundary(ball, axis),
            EventKind::BallPair { a, b } => self.resolve_pair(a, b),
            EventKind::SceneWall { ball, object } => self.resolve_wall(ball, object),
            EventKind::SceneInput { ball, object } => self.resolve_input(ball, object),
            EventKind::SceneOutput { ball, object } => self.resolve_output(ball, object),
        };

        let mut touched = vec![event.kind.ball()];
        touched.extend(event.kind.partner());
        self.bump_and_reschedule(&touched);

        if let Some(notification) = notification {
            self.observers.emit(&notification);
        }
    }

    /// Invalidate the touched balls' events and predict again. Balls whose
    /// pending event was a pair event with a touched ball lost it as well.
    fn bump_and_reschedule(&mut self, touched: &[BallKey]) {
        for &key in touched {
            if let Some(slot) = self.schedule.get_mut(key) {
                slot.version += 1;
                slot.partner = None;
            }
        }
        let dependents: Vec<BallKey> = self
            .schedule
            .iter()
            .filter(|(key, slot)| {
                !touched.contains(key) && slot.partner.is_some_and(|p| touched.contains(&p))
            })
            .map(|(key, _)| key)
            .collect();

        for key in touched.iter().copied().chain(dependents) {
            self.schedule_for_ball(key);
        }
    }

    fn resolve_boundary(&mut self, key: BallKey, axis: Axis) -> Option<Notification> {
        let ball = self.balls.get_mut(key)?;
        ball.vel = reflect_off_boundary(ball.vel, axis);
        let clamped = self.bounds.clamp_axis(
            axis,
            axis.component(ball.pos),
            ball.radius,
            BOUNDARY_CLAMP_MARGIN,
        );
        match axis {
            Axis::X => ball.pos.x = clamped,
            Axis::Y => ball.pos.y = clamped,
        }
        Some(Notification::Boundary {
            ball: ball.id,
            axis,
            t: self.time,
        })
    }

    fn resolve_pair(&mut self, a: BallKey, b: BallKey) -> Option<Notification> {
        let [ba, bb] = self.balls.get_disjoint_mut([a, b])?;

        let delta = bb.pos - ba.pos;
        let dist = delta.length();
        // Coincident centers: fixed axis keeps the outcome deterministic
        let n = if dist > 0.0 { delta / dist } else { DVec2::X };

        let overlap = ba.radius + bb.radius - dist;
        if overlap > 0.0 {
            let push = n * ((overlap + BALL_SEPARATION) * 0.5);
            ba.pos -= push;
            bb.pos += push;
        }

        let (va, vb) = elastic_impulse(ba.vel, ba.mass, bb.vel, bb.mass, n)?;
        ba.vel = va;
        bb.vel = vb;
        Some(Notification::BallCollision {
            a: ba.id,
            b: bb.id,
            t: self.time,
        })
    }

    fn resolve_wall(&mut self, key: BallKey, index: usize) -> Option<Notification> {
        let object = self.scene.get(index)?;
        let ball = self.balls.get_mut(key)?;

        let contact = rect_contact(&object.rect, ball.pos);
        ball.pos += contact.normal * (contact.penetration(ball.radius) + WALL_SEPARATION);
        if ball.may_bounce && ball.vel.dot(contact.normal) < 0.0 {
            ball.vel = reflect_velocity(ball.vel, contact.normal);
            ball.may_bounce = false;
        }
        Some(Notification::WallBounce {
            ball: ball.id,
            object: object.id.clone(),
            t: self.time,
        })
    }

    fn resolve_input(&mut self, key: BallKey, index: usize) -> Option<Notification> {
        let object = self.scene.get(index)?;
        let ball = self.balls.get_mut(key)?;

        // Exit wake-ups find the ball outside; the next schedule re-arms it
        if !rect_contact(&object.rect, ball.pos).touches(ball.radius, CONTACT_SLOP) {
            return None;
        }
        if ball.last_input.as_deref() == Some(object.id.as_str()) {
            return None;
        }
        ball.last_input = Some(object.id.clone());
        log::debug!("ball {} entered input {}", ball.id, object.id);
        Some(Notification::InputPass {
            ball: ball.id,
            object: object.id.clone(),
            label: object.label.clone(),
            t: self.time,
        })
    }

    fn resolve_output(&mut self, key: BallKey, index: usize) -> Option<Notification> {
        let object = self.scene.get(index)?;
        let ball = self.balls.get_mut(key)?;

        ball.capture(object.center(), self.time, self.config.capture_linger);
        log::debug!(
            "ball {} captured by {} at t={:.3}, removal at t={:.3}",
            ball.id,
            object.id,
            self.time,
            self.time + self.config.capture_linger
        );
        Some(Notification::OutputCapture {
            ball: ball.id,
            object: object.id.clone(),
            label: object.label.clone(),
            t: self.time,
        })
    }

    /// Remove captured balls whose linger has run out. Their handles go
    /// stale, and nothing else was scheduled against a captured ball, so the
    /// queue stays valid.
    fn remove_expired(&mut self) {
        let now = self.time;
        let expired: Vec<BallKey> = self
            .balls
            .iter()
            .filter(|(_, b)| b.expired(now))
            .map(|(key, _)| key)
            .collect();

        for key in expired {
            if let Some(ball) = self.balls.remove(key) {
                self.schedule.remove(key);
                log::debug!("ball {} removed at t={:.3}", ball.id, now);
                self.observers
                    .emit(&Notification::BallRemoved { ball: ball.id, t: now });
            }
        }
    }
}
