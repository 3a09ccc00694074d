//! Collision math primitives and analytic contact prediction
//!
//! Everything here is pure geometry: no kernel state, no side effects.
//! Predictions return the time (relative to now) until first contact under
//! straight-line motion, or `None` when the trajectories never meet.

use glam::DVec2;

use super::arena::{ArenaBounds, Axis};
use super::rect::OrientedRect;
use crate::consts::{FACE_EXTENT_SLACK, PREDICTION_EPSILON};

/// Below this a center-to-surface offset has no usable direction
const DEGENERATE_DISTANCE: f64 = 1e-12;
/// Relative speeds below this (squared) never close a gap
const MIN_RELATIVE_SPEED_SQ: f64 = 1e-12;

/// Nearest-surface query result for a point against a rectangle
#[derive(Debug, Clone, Copy)]
pub struct RectContact {
    /// Closest point on the rectangle surface (world)
    pub point: DVec2,
    /// Unit outward normal at that point (world)
    pub normal: DVec2,
    /// Signed distance from the query point to the surface (negative inside)
    pub distance: f64,
}

impl RectContact {
    /// How far a disc of `radius` overlaps the surface (0 when clear)
    #[inline]
    pub fn penetration(&self, radius: f64) -> f64 {
        (radius - self.distance).max(0.0)
    }

    /// Whether a disc of `radius` touches the surface within `slop`
    #[inline]
    pub fn touches(&self, radius: f64, slop: f64) -> bool {
        self.distance < radius + slop
    }
}

/// Closest point and outward normal of `rect` as seen from `pos`.
///
/// When `pos` lies on or inside the rectangle the offset to the nearest point
/// is zero, so the normal comes from the nearest face instead (ties resolve
/// left, right, top, bottom in the local frame).
pub fn rect_contact(rect: &OrientedRect, pos: DVec2) -> RectContact {
    let local = rect.to_local(pos);
    let half = rect.half_extents();
    let closest = rect.closest_local(local);
    let offset = local - closest;
    let dist = offset.length();

    if dist > DEGENERATE_DISTANCE {
        return RectContact {
            point: rect.to_world(closest),
            normal: rect.dir_to_world(offset / dist),
            distance: dist,
        };
    }

    let (normal, depth) = nearest_face(local, half);
    RectContact {
        point: rect.to_world(local + normal * depth),
        normal: rect.dir_to_world(normal),
        distance: -depth,
    }
}

/// Local outward normal of the face nearest to `local`, with the distance to it
fn nearest_face(local: DVec2, half: DVec2) -> (DVec2, f64) {
    let faces = [
        (DVec2::NEG_X, (local.x + half.x).abs()),
        (DVec2::X, (half.x - local.x).abs()),
        (DVec2::NEG_Y, (local.y + half.y).abs()),
        (DVec2::Y, (half.y - local.y).abs()),
    ];
    let mut best = faces[0];
    for face in &faces[1..] {
        if face.1 < best.1 {
            best = *face;
        }
    }
    best
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2) -> DVec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect off an arena wall on `axis`. The wall normal is picked from the
/// direction of travel, so the component along `axis` always flips sign.
pub fn reflect_off_boundary(velocity: DVec2, axis: Axis) -> DVec2 {
    let sign = if axis.component(velocity) < 0.0 { 1.0 } else { -1.0 };
    reflect_velocity(velocity, axis.unit() * sign)
}

/// Elastic exchange between two discs along contact normal `n` (from a
/// toward b). Returns the new velocities, or `None` if they are already
/// separating.
pub fn elastic_impulse(
    va: DVec2,
    ma: f64,
    vb: DVec2,
    mb: f64,
    n: DVec2,
) -> Option<(DVec2, DVec2)> {
    let vn = (vb - va).dot(n);
    if vn >= 0.0 {
        return None;
    }
    let impulse = 2.0 * vn / (ma + mb);
    Some((va + n * (impulse * mb), vb - n * (impulse * ma)))
}

/// Time until a disc reaches the approach line `gap` in front of an arena
/// wall, with the axis of that wall. A disc already past the line while
/// heading outward gets an immediate (zero) time.
pub fn time_to_boundary(
    bounds: &ArenaBounds,
    pos: DVec2,
    vel: DVec2,
    radius: f64,
    gap: f64,
) -> Option<(f64, Axis)> {
    let mut best: Option<(f64, Axis)> = None;
    for axis in [Axis::X, Axis::Y] {
        let p = axis.component(pos);
        let v = axis.component(vel);
        let t = if v < 0.0 {
            (bounds.min(axis) + radius + gap - p) / v
        } else if v > 0.0 {
            (bounds.max(axis) - radius - gap - p) / v
        } else {
            continue;
        };
        let t = t.max(0.0);
        if best.is_none_or(|(bt, _)| t < bt) {
            best = Some((t, axis));
        }
    }
    best
}

/// Time until two discs touch. Overlapping discs that are still closing get
/// an immediate contact; overlapping discs that separate get none.
pub fn time_to_ball_contact(
    pa: DVec2,
    va: DVec2,
    ra: f64,
    pb: DVec2,
    vb: DVec2,
    rb: f64,
) -> Option<f64> {
    let d = pb - pa;
    let w = vb - va;
    let reach = ra + rb;

    let a = w.length_squared();
    if a <= MIN_RELATIVE_SPEED_SQ {
        return None;
    }
    let b = 2.0 * d.dot(w);
    let c = d.length_squared() - reach * reach;

    if c <= 0.0 {
        return (b < 0.0).then_some(0.0);
    }
    if b >= 0.0 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (t >= 0.0).then_some(t)
}

/// Time until a moving disc first touches an oriented rectangle.
///
/// Sweeps the disc center against the rectangle grown by `radius`: four
/// faces pushed out by `radius` plus a circle of `radius` at each corner.
/// Only contacts strictly in the future count; discs already touching are
/// the caller's business.
pub fn time_to_rect_contact(
    rect: &OrientedRect,
    pos: DVec2,
    vel: DVec2,
    radius: f64,
) -> Option<f64> {
    let p = rect.to_local(pos);
    let v = rect.dir_to_local(vel);
    let h = rect.half_extents();
    let mut best: Option<f64> = None;

    // Vertical faces
    if v.x > 0.0 && p.x <= -h.x - radius {
        let t = (-h.x - radius - p.x) / v.x;
        if (p.y + v.y * t).abs() <= h.y + FACE_EXTENT_SLACK {
            keep_earliest(&mut best, t);
        }
    }
    if v.x < 0.0 && p.x >= h.x + radius {
        let t = (h.x + radius - p.x) / v.x;
        if (p.y + v.y * t).abs() <= h.y + FACE_EXTENT_SLACK {
            keep_earliest(&mut best, t);
        }
    }

    // Horizontal faces
    if v.y > 0.0 && p.y <= -h.y - radius {
        let t = (-h.y - radius - p.y) / v.y;
        if (p.x + v.x * t).abs() <= h.x + FACE_EXTENT_SLACK {
            keep_earliest(&mut best, t);
        }
    }
    if v.y < 0.0 && p.y >= h.y + radius {
        let t = (h.y + radius - p.y) / v.y;
        if (p.x + v.x * t).abs() <= h.x + FACE_EXTENT_SLACK {
            keep_earliest(&mut best, t);
        }
    }

    // Corners
    let a = v.length_squared();
    if a > MIN_RELATIVE_SPEED_SQ {
        for corner in [
            DVec2::new(-h.x, -h.y),
            DVec2::new(h.x, -h.y),
            DVec2::new(-h.x, h.y),
            DVec2::new(h.x, h.y),
        ] {
            let d = p - corner;
            let b = 2.0 * d.dot(v);
            let c = d.length_squared() - radius * radius;
            if c <= 0.0 || b >= 0.0 {
                continue;
            }
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                continue;
            }
            keep_earliest(&mut best, (-b - disc.sqrt()) / (2.0 * a));
        }
    }

    best
}

/// Time until a disc center leaves the rectangle grown by `margin` on every
/// side. `None` for a disc at rest.
pub fn time_to_leave_rect(rect: &OrientedRect, pos: DVec2, vel: DVec2, margin: f64) -> Option<f64> {
    let p = rect.to_local(pos);
    let v = rect.dir_to_local(vel);
    let ext = rect.half_extents() + DVec2::splat(margin);

    let mut exit = f64::INFINITY;
    for (p, v, ext) in [(p.x, v.x, ext.x), (p.y, v.y, ext.y)] {
        let t = if v > 0.0 {
            (ext - p) / v
        } else if v < 0.0 {
            (-ext - p) / v
        } else {
            continue;
        };
        exit = exit.min(t.max(0.0));
    }
    exit.is_finite().then_some(exit)
}

#[inline]
fn keep_earliest(best: &mut Option<f64>, t: f64) {
    if t > PREDICTION_EPSILON && best.is_none_or(|b| t < b) {
        *best = Some(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_6};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(DVec2::new(100.0, 0.0), DVec2::NEG_X);
        assert!((reflected.x + 100.0).abs() < EPS);
        assert!(reflected.y.abs() < EPS);
    }

    #[test]
    fn test_reflect_off_boundary_flips_axis_component() {
        let v = reflect_off_boundary(DVec2::new(-30.0, 12.0), Axis::X);
        assert_eq!(v, DVec2::new(30.0, 12.0));
        let v = reflect_off_boundary(DVec2::new(-30.0, 12.0), Axis::Y);
        assert_eq!(v, DVec2::new(-30.0, -12.0));
    }

    #[test]
    fn test_elastic_equal_masses_swap() {
        let (a, b) = elastic_impulse(
            DVec2::new(50.0, 0.0),
            1.0,
            DVec2::new(-50.0, 0.0),
            1.0,
            DVec2::X,
        )
        .unwrap();
        assert_eq!(a, DVec2::new(-50.0, 0.0));
        assert_eq!(b, DVec2::new(50.0, 0.0));
    }

    #[test]
    fn test_elastic_conserves_momentum_and_energy() {
        let (va, vb) = (DVec2::new(80.0, 10.0), DVec2::new(-20.0, 5.0));
        let (ma, mb) = (1.0, 3.0);
        let n = DVec2::new(1.0, 0.2).normalize();
        let (a, b) = elastic_impulse(va, ma, vb, mb, n).unwrap();

        let p0 = va * ma + vb * mb;
        let p1 = a * ma + b * mb;
        assert!((p0 - p1).length() < 1e-9);

        let e0 = 0.5 * ma * va.length_squared() + 0.5 * mb * vb.length_squared();
        let e1 = 0.5 * ma * a.length_squared() + 0.5 * mb * b.length_squared();
        assert!((e0 - e1).abs() < 1e-6);
    }

    #[test]
    fn test_elastic_separating_is_noop() {
        let r = elastic_impulse(
            DVec2::new(-10.0, 0.0),
            1.0,
            DVec2::new(10.0, 0.0),
            1.0,
            DVec2::X,
        );
        assert!(r.is_none());
    }

    #[test]
    fn test_time_to_boundary() {
        let bounds = ArenaBounds::new(200.0, 200.0);
        let (t, axis) =
            time_to_boundary(&bounds, DVec2::new(50.0, 100.0), DVec2::new(-100.0, 0.0), 8.0, 0.0)
                .unwrap();
        assert_eq!(axis, Axis::X);
        assert!((t - 0.42).abs() < EPS);

        // Resting ball never reaches a wall
        assert!(time_to_boundary(&bounds, DVec2::splat(100.0), DVec2::ZERO, 8.0, 0.0).is_none());

        // Already beyond the approach line heading out: immediate
        let (t, _) =
            time_to_boundary(&bounds, DVec2::new(5.0, 100.0), DVec2::new(-1.0, 0.0), 8.0, 0.25)
                .unwrap();
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_time_to_ball_contact_head_on() {
        let t = time_to_ball_contact(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            5.0,
            DVec2::new(100.0, 0.0),
            DVec2::new(-10.0, 0.0),
            5.0,
        )
        .unwrap();
        assert!((t - 4.5).abs() < EPS);
    }

    #[test]
    fn test_time_to_ball_contact_miss_and_overlap() {
        // Parallel tracks too far apart
        assert!(
            time_to_ball_contact(
                DVec2::ZERO,
                DVec2::X,
                5.0,
                DVec2::new(0.0, 20.0),
                DVec2::X * 2.0,
                5.0
            )
            .is_none()
        );
        // Overlapping and closing: immediate
        assert_eq!(
            time_to_ball_contact(DVec2::ZERO, DVec2::X, 5.0, DVec2::new(8.0, 0.0), DVec2::ZERO, 5.0),
            Some(0.0)
        );
        // Overlapping and separating: nothing
        assert!(
            time_to_ball_contact(DVec2::ZERO, DVec2::NEG_X, 5.0, DVec2::new(8.0, 0.0), DVec2::ZERO, 5.0)
                .is_none()
        );
    }

    #[test]
    fn test_rect_contact_outside() {
        let rect = OrientedRect::centered(DVec2::ZERO, 20.0, 10.0, 0.0);
        let c = rect_contact(&rect, DVec2::new(0.0, 12.0));
        assert!((c.distance - 7.0).abs() < EPS);
        assert!((c.normal - DVec2::Y).length() < EPS);
        assert!((c.point - DVec2::new(0.0, 5.0)).length() < EPS);
    }

    #[test]
    fn test_rect_contact_inside_uses_nearest_face() {
        let rect = OrientedRect::centered(DVec2::ZERO, 20.0, 10.0, 0.0);
        let c = rect_contact(&rect, DVec2::new(8.0, 0.0));
        assert!((c.normal - DVec2::X).length() < EPS);
        assert!((c.distance + 2.0).abs() < EPS);
        assert!((c.penetration(3.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_rect_contact_degenerate_center_is_deterministic() {
        // Dead center of a square: all faces tie, left wins
        let rect = OrientedRect::centered(DVec2::ZERO, 10.0, 10.0, 0.0);
        let c = rect_contact(&rect, DVec2::ZERO);
        assert!((c.normal - DVec2::NEG_X).length() < EPS);
    }

    #[test]
    fn test_rect_contact_rotated() {
        // Upright bar: the "top" local face now faces -x in world
        let rect = OrientedRect::centered(DVec2::ZERO, 100.0, 10.0, FRAC_PI_2);
        let c = rect_contact(&rect, DVec2::new(-20.0, 0.0));
        assert!((c.normal - DVec2::NEG_X).length() < 1e-9);
        assert!((c.distance - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_to_rect_contact_face() {
        let rect = OrientedRect::centered(DVec2::new(100.0, 0.0), 10.0, 40.0, 0.0);
        let t = time_to_rect_contact(&rect, DVec2::ZERO, DVec2::new(10.0, 0.0), 5.0).unwrap();
        // Face at x = 95, contact when center reaches 90
        assert!((t - 9.0).abs() < EPS);
    }

    #[test]
    fn test_time_to_rect_contact_corner() {
        let rect = OrientedRect::centered(DVec2::ZERO, 10.0, 10.0, 0.0);
        // Diagonal approach toward the (-5,-5) corner
        let start = DVec2::new(-20.0, -20.0);
        let dir = DVec2::new(1.0, 1.0).normalize();
        let t = time_to_rect_contact(&rect, start, dir, 2.0).unwrap();
        let center = start + dir * t;
        assert!(((center - DVec2::new(-5.0, -5.0)).length() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_to_rect_contact_rotated_and_miss() {
        let rect = OrientedRect::centered(DVec2::new(50.0, 0.0), 40.0, 4.0, FRAC_PI_6);
        let t = time_to_rect_contact(&rect, DVec2::ZERO, DVec2::new(10.0, 0.0), 3.0).unwrap();
        let c = rect_contact(&rect, DVec2::new(10.0 * t, 0.0));
        assert!((c.distance - 3.0).abs() < 1e-6);

        // Moving away
        assert!(time_to_rect_contact(&rect, DVec2::ZERO, DVec2::new(-10.0, 0.0), 3.0).is_none());
    }

    #[test]
    fn test_time_to_leave_rect() {
        let rect = OrientedRect::centered(DVec2::ZERO, 60.0, 60.0, 0.0);
        let t = time_to_leave_rect(&rect, DVec2::ZERO, DVec2::new(10.0, 0.0), 5.0).unwrap();
        assert!((t - 3.5).abs() < EPS);
        assert!(time_to_leave_rect(&rect, DVec2::ZERO, DVec2::ZERO, 5.0).is_none());
    }
}
