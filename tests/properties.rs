//! Property-based tests for the collision kernel.
//!
//! Run with: cargo test --test properties

use std::cell::RefCell;
use std::rc::Rc;

use billiard_computer::sim::{Axis, OrientedRect, SceneObject, elastic_impulse};
use billiard_computer::{BallSpec, Notification, PhysicsKernel};
use glam::DVec2;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Velocity with each component in a bounded range
fn arb_velocity(max: f64) -> impl Strategy<Value = DVec2> {
    (-max..max, -max..max).prop_map(|(x, y)| DVec2::new(x, y))
}

/// One ball somewhere inside a `size` x `size` arena
fn arb_ball(size: f64) -> impl Strategy<Value = BallSpec> {
    (4.0..20.0f64).prop_flat_map(move |r| {
        (r..size - r, r..size - r, arb_velocity(400.0))
            .prop_map(move |(x, y, v)| BallSpec::new(DVec2::new(x, y), v).with_radius(r))
    })
}

/// Non-overlapping balls, one per 80 px grid cell of a 640 x 480 arena
fn arb_scatter() -> impl Strategy<Value = Vec<BallSpec>> {
    prop::collection::vec(
        (0usize..48, 4.0..30.0f64, arb_velocity(300.0), 0.5..4.0f64),
        1..10,
    )
    .prop_map(|cells| {
        let mut used = Vec::new();
        let mut specs = Vec::new();
        for (cell, r, v, m) in cells {
            if used.contains(&cell) {
                continue;
            }
            used.push(cell);
            let center = DVec2::new(40.0 + (cell % 8) as f64 * 80.0, 40.0 + (cell / 8) as f64 * 80.0);
            specs.push(BallSpec::new(center, v).with_radius(r).with_mass(m));
        }
        specs
    })
}

fn scatter_kernel(specs: &[BallSpec]) -> PhysicsKernel {
    let mut kernel = PhysicsKernel::default();
    kernel.set_bounds(640.0, 480.0).unwrap();
    kernel.set_logic_layer(vec![SceneObject::wall(
        "bar",
        OrientedRect::new(300.0, 236.0, 120.0, 8.0, 0.35),
    )]);
    for spec in specs {
        kernel.add_ball(spec.clone()).unwrap();
    }
    kernel
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A lone ball never leaves the arena and every boundary contact flips
    /// the velocity component on its axis.
    #[test]
    fn proptest_boundary_keeps_ball_inside(spec in arb_ball(300.0), ticks in 1usize..240) {
        let mut kernel = PhysicsKernel::default();
        kernel.set_bounds(300.0, 300.0).unwrap();
        let bounces = Rc::new(RefCell::new(Vec::new()));
        let sink = bounces.clone();
        kernel.on_event(move |n| {
            if let Notification::Boundary { axis, .. } = n {
                sink.borrow_mut().push(*axis);
            }
        });
        let key = kernel.add_ball(spec.clone()).unwrap();
        let speed = spec.vel.length();

        for _ in 0..ticks {
            let before = kernel.ball(key).unwrap().vel;
            bounces.borrow_mut().clear();
            kernel.tick();
            let ball = kernel.ball(key).unwrap();
            prop_assert!(kernel.bounds().contains_disc(ball.pos, ball.radius), "{:?}", ball.pos);
            prop_assert!((ball.vel.length() - speed).abs() < 1e-9);

            for axis in [Axis::X, Axis::Y] {
                let flips = bounces.borrow().iter().filter(|a| **a == axis).count();
                let expected = if flips % 2 == 0 {
                    axis.component(before)
                } else {
                    -axis.component(before)
                };
                prop_assert_eq!(axis.component(ball.vel), expected);
            }
        }
    }

    /// Equal masses exchange their normal velocity components and keep the
    /// tangential ones; separating pairs are left alone.
    #[test]
    fn proptest_equal_mass_exchange(
        va in arb_velocity(500.0),
        vb in arb_velocity(500.0),
        angle in 0.0..std::f64::consts::TAU,
    ) {
        let n = DVec2::from_angle(angle);
        let closing = (vb - va).dot(n) < 0.0;
        match elastic_impulse(va, 1.0, vb, 1.0, n) {
            Some((va2, vb2)) => {
                prop_assert!(closing);
                prop_assert!((va2.dot(n) - vb.dot(n)).abs() < 1e-9);
                prop_assert!((vb2.dot(n) - va.dot(n)).abs() < 1e-9);
                let t = n.perp();
                prop_assert!((va2.dot(t) - va.dot(t)).abs() < 1e-9);
                prop_assert!((vb2.dot(t) - vb.dot(t)).abs() < 1e-9);
            }
            None => prop_assert!(!closing),
        }
    }

    /// Sim time never decreases, and each tick advances it by one slice.
    #[test]
    fn proptest_time_is_monotonic(specs in arb_scatter(), ticks in 1usize..200) {
        let mut kernel = scatter_kernel(&specs);
        let dt = kernel.config().dt;
        let mut last = kernel.time();
        for _ in 0..ticks {
            kernel.tick();
            prop_assert!(kernel.time() >= last);
            prop_assert!((kernel.time() - last - dt).abs() < 1e-9);
            last = kernel.time();
        }
        prop_assert_eq!(kernel.steps(), ticks as u64);
    }

    /// Rebuilding twice without changing anything predicts the same next
    /// event.
    #[test]
    fn proptest_rebuild_is_idempotent(specs in arb_scatter(), ticks in 0usize..120) {
        let mut kernel = scatter_kernel(&specs);
        for _ in 0..ticks {
            kernel.tick();
        }
        kernel.rebuild_events();
        let first = kernel.next_event_time();
        kernel.rebuild_events();
        prop_assert_eq!(kernel.next_event_time(), first);
    }
}
