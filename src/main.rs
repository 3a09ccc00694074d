//! Billiard Computer entry point
//!
//! Native: headless demos (gate truth table, seeded scatter) printing
//! notifications as JSON lines. Web: drives the kernel from
//! `requestAnimationFrame`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use billiard_computer::sim::{OrientedRect, Scene, SceneKind};

/// Periscope gate: input A is bent down onto output "1", input B runs
/// straight into a trash sink.
fn demo_scene() -> Scene {
    use std::f64::consts::FRAC_PI_4;

    let mut scene = Scene::new();
    scene.add(
        SceneKind::Input,
        OrientedRect::new(100.0, 80.0, 60.0, 60.0, 0.0),
        Some("A"),
    );
    scene.add(
        SceneKind::Input,
        OrientedRect::new(100.0, 290.0, 60.0, 60.0, 0.0),
        Some("B"),
    );
    scene.add(
        SceneKind::Wall,
        OrientedRect::centered(glam::DVec2::new(350.0, 110.0), 120.0, 10.0, FRAC_PI_4),
        None,
    );
    scene.add(
        SceneKind::Wall,
        OrientedRect::centered(glam::DVec2::new(288.5, 220.5), 120.0, 10.0, FRAC_PI_4),
        None,
    );
    scene.add(
        SceneKind::Output,
        OrientedRect::new(600.0, 170.0, 60.0, 60.0, 0.0),
        Some("1"),
    );
    scene.add(
        SceneKind::Output,
        OrientedRect::new(600.0, 290.0, 60.0, 60.0, 0.0),
        Some("trash"),
    );
    scene
}

#[cfg(target_arch = "wasm32")]
mod wasm_demo {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use billiard_computer::{KernelConfig, PhysicsKernel, SimResult};

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    pub fn run() -> SimResult<()> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }

        log::info!("Billiard Computer starting...");

        let scene = Rc::new(RefCell::new(super::demo_scene()));
        let mut kernel = PhysicsKernel::new(KernelConfig {
            arena_width: 800.0,
            arena_height: 400.0,
            ..Default::default()
        })?;
        kernel.set_logic_layer(scene.clone());
        for spec in scene.borrow().spawn_specs() {
            kernel.add_ball(spec)?;
        }
        kernel.on_event(|n| match serde_json::to_string(n) {
            Ok(json) => log::info!("{json}"),
            Err(e) => log::warn!("unserialisable notification: {e}"),
        });
        kernel.run(|frame| {
            if let Some(fps) = frame.fps {
                set_text("fps", &format!("{fps} fps"));
            }
        });

        let kernel = Rc::new(RefCell::new(kernel));
        setup_auto_pause(kernel.clone());
        request_animation_frame(kernel);
        Ok(())
    }

    fn request_animation_frame(kernel: Rc<RefCell<PhysicsKernel>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(kernel, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(kernel: Rc<RefCell<PhysicsKernel>>, time: f64) {
        {
            let mut k = kernel.borrow_mut();
            k.animation_frame(time);
            set_text("sim-time", &format!("t = {:.2}", k.time()));
            set_text("balls", &format!("{} balls", k.ball_count()));
        }
        // Keep the callback alive while paused so a resume picks up again
        request_animation_frame(kernel);
    }

    fn setup_auto_pause(kernel: Rc<RefCell<PhysicsKernel>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut k = kernel.borrow_mut();
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                k.pause();
                log::info!("Auto-paused (tab hidden)");
            } else {
                k.run(|frame| {
                    if let Some(fps) = frame.fps {
                        set_text("fps", &format!("{fps} fps"));
                    }
                });
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_demo::run() {
        log::error!("startup failed: {e}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Billiard Computer (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    if let Err(e) = native::truth_table_demo().and_then(|_| native::scatter_demo(seed)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::DVec2;
    use rand::{Rng, SeedableRng};

    use billiard_computer::sim::{OrientedRect, SceneObject};
    use billiard_computer::truth_table::{self, DEFAULT_TIMEOUT};
    use billiard_computer::{BallSpec, KernelConfig, PhysicsKernel, SimResult};

    pub fn truth_table_demo() -> SimResult<()> {
        let mut kernel = PhysicsKernel::new(KernelConfig {
            arena_width: 800.0,
            arena_height: 400.0,
            ..Default::default()
        })?;
        kernel.set_logic_layer(super::demo_scene());

        let combos = truth_table::standard_combos(kernel.scene_objects());
        let rows = truth_table::evaluate(&mut kernel, &combos, DEFAULT_TIMEOUT)?;
        println!("{:<16} outputs", "inputs");
        for row in rows {
            println!(
                "{:<16} {:<16} {}",
                row.inputs.join(" + "),
                if row.outputs.is_empty() {
                    "-".to_string()
                } else {
                    row.outputs.join(", ")
                },
                if row.timed_out { "(timed out)" } else { "" }
            );
        }
        Ok(())
    }

    /// Random balls in a walled arena; notifications stream as JSON lines
    pub fn scatter_demo(seed: u64) -> SimResult<()> {
        let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
        let mut kernel = PhysicsKernel::default();
        kernel.set_logic_layer(vec![
            SceneObject::wall("ramp", OrientedRect::new(400.0, 300.0, 300.0, 12.0, 0.4)),
            SceneObject::wall("post", OrientedRect::new(900.0, 200.0, 12.0, 260.0, 0.0)),
            SceneObject::input("gate", OrientedRect::new(160.0, 520.0, 80.0, 80.0, 0.0))
                .with_label("in"),
            SceneObject::output("sink", OrientedRect::new(1100.0, 560.0, 80.0, 80.0, 0.0))
                .with_label("out"),
        ]);
        kernel.on_event(|n| match serde_json::to_string(n) {
            Ok(json) => println!("{json}"),
            Err(e) => log::warn!("unserialisable notification: {e}"),
        });

        for row in 0..3 {
            for col in 0..8 {
                let pos = DVec2::new(80.0 + col as f64 * 140.0, 60.0 + row as f64 * 60.0);
                let speed = rng.random_range(60.0..240.0);
                let angle = rng.random_range(0.0..std::f64::consts::TAU);
                kernel.add_ball(
                    BallSpec::new(pos, DVec2::from_angle(angle) * speed)
                        .with_radius(rng.random_range(6.0..14.0))
                        .with_mass(rng.random_range(0.5..3.0)),
                )?;
            }
        }

        for _ in 0..(20.0 / kernel.config().dt) as usize {
            kernel.tick();
        }
        log::info!(
            "scatter seed {seed}: t={:.2}, {} steps, {} balls left",
            kernel.time(),
            kernel.steps(),
            kernel.ball_count()
        );
        Ok(())
    }
}
