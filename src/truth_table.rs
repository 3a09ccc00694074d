//! Headless truth-table evaluation
//!
//! For each combination of input ports: reset the kernel, launch a ball from
//! every port in the combination, run fixed ticks until the arena is empty
//! (or a sim-time timeout passes) and record which labelled outputs captured
//! a ball. Outputs labelled `trash` are sinks for spent signals and never
//! count.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::sim::{Notification, PhysicsKernel, SceneKind, SceneObject};

/// Label of outputs that swallow balls without producing a result
pub const TRASH_LABEL: &str = "trash";

/// Default sim-time budget per combination
pub const DEFAULT_TIMEOUT: f64 = 30.0;

/// Outcome of one input combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRow {
    /// Input port ids that launched a ball
    pub inputs: Vec<String>,
    /// Output labels (or ids, for unlabelled ports) that captured a ball,
    /// in capture order without repeats
    pub outputs: Vec<String>,
    /// Balls were still moving when the timeout hit
    pub timed_out: bool,
}

/// The combinations the lab checks: first input alone, second alone, both
pub fn standard_combos(objects: &[SceneObject]) -> Vec<Vec<String>> {
    let mut inputs = objects
        .iter()
        .filter(|o| o.kind == SceneKind::Input)
        .map(|o| o.id.clone());
    let first = inputs.next();
    let second = inputs.next();

    match (first, second) {
        (Some(a), Some(b)) => vec![vec![a.clone()], vec![b.clone()], vec![a, b]],
        (Some(a), None) => vec![vec![a]],
        _ => Vec::new(),
    }
}

fn is_trash(label: &str) -> bool {
    label.eq_ignore_ascii_case(TRASH_LABEL)
}

/// Run every combination against the kernel's current scene. The kernel is
/// paused, reset and emptied before each run and left empty afterwards.
pub fn evaluate(
    kernel: &mut PhysicsKernel,
    combos: &[Vec<String>],
    timeout: f64,
) -> SimResult<Vec<TruthRow>> {
    kernel.pause();
    kernel.rebuild_events();

    let captured = Rc::new(RefCell::new(Vec::<String>::new()));
    let sink = captured.clone();
    let token = kernel.on_event(move |n| {
        if let Notification::OutputCapture { object, label, .. } = n {
            let name = label.clone().unwrap_or_else(|| object.clone());
            let mut seen = sink.borrow_mut();
            if !is_trash(&name) && !seen.contains(&name) {
                seen.push(name);
            }
        }
    });

    let result = run_combos(kernel, combos, timeout, &captured);

    kernel.unsubscribe(token);
    kernel.clear_balls();
    kernel.reset();
    result
}

fn run_combos(
    kernel: &mut PhysicsKernel,
    combos: &[Vec<String>],
    timeout: f64,
    captured: &Rc<RefCell<Vec<String>>>,
) -> SimResult<Vec<TruthRow>> {
    let mut rows = Vec::with_capacity(combos.len());

    for combo in combos {
        kernel.clear_balls();
        kernel.reset();
        captured.borrow_mut().clear();

        let specs: Vec<_> = kernel
            .scene_objects()
            .iter()
            .filter(|o| combo.contains(&o.id))
            .filter_map(SceneObject::spawn_spec)
            .collect();
        for spec in specs {
            kernel.add_ball(spec)?;
        }

        while kernel.ball_count() > 0 && kernel.time() < timeout {
            kernel.tick();
        }
        let timed_out = kernel.ball_count() > 0;
        if timed_out {
            log::warn!(
                "combination {combo:?} still had {} balls after {timeout} s",
                kernel.ball_count()
            );
        }

        let outputs = captured.borrow().clone();
        log::info!("inputs {combo:?} -> outputs {outputs:?}");
        rows.push(TruthRow {
            inputs: combo.clone(),
            outputs,
            timed_out,
        });
    }

    Ok(rows)
}
