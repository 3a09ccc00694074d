//! Scene objects and the logic layer that owns them
//!
//! Walls, input ports and output ports are placed by an external editor.
//! The kernel only ever reads them, and only re-reads them when told to
//! (`PhysicsKernel::rebuild_events`).

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ball::BallSpec;
use super::rect::OrientedRect;
use crate::consts::{INPUT_SPAWN_RADIUS, INPUT_SPAWN_SPEED};

/// What a scene object does to a ball that touches it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Solid obstacle: balls bounce off
    Wall,
    /// Pass-through sensor: reports the first entry of each ball
    Input,
    /// Sink: captures the ball and removes it after a linger period
    Output,
}

/// A scene object: an oriented rectangle with a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    #[serde(flatten)]
    pub rect: OrientedRect,
    #[serde(rename = "type")]
    pub kind: SceneKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SceneObject {
    pub fn new(id: impl Into<String>, kind: SceneKind, rect: OrientedRect) -> Self {
        Self {
            id: id.into(),
            rect,
            kind,
            label: None,
        }
    }

    pub fn wall(id: impl Into<String>, rect: OrientedRect) -> Self {
        Self::new(id, SceneKind::Wall, rect)
    }

    pub fn input(id: impl Into<String>, rect: OrientedRect) -> Self {
        Self::new(id, SceneKind::Input, rect)
    }

    pub fn output(id: impl Into<String>, rect: OrientedRect) -> Self {
        Self::new(id, SceneKind::Output, rect)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        self.rect.center()
    }

    /// Ball launched from this input port: centered in it, heading along
    /// the port's rotation. `None` for walls and outputs.
    pub fn spawn_spec(&self) -> Option<BallSpec> {
        if self.kind != SceneKind::Input {
            return None;
        }
        let dir = DVec2::from_angle(self.rect.rotation);
        Some(BallSpec::new(self.center(), dir * INPUT_SPAWN_SPEED).with_radius(INPUT_SPAWN_RADIUS))
    }
}

/// Source of scene objects the kernel collides against
pub trait SceneProvider {
    /// Current objects, in a stable order
    fn scene_objects(&self) -> Vec<SceneObject>;
}

impl SceneProvider for Vec<SceneObject> {
    fn scene_objects(&self) -> Vec<SceneObject> {
        self.clone()
    }
}

impl<T: SceneProvider> SceneProvider for Rc<RefCell<T>> {
    fn scene_objects(&self) -> Vec<SceneObject> {
        self.borrow().scene_objects()
    }
}

/// Logic layer: the ordered object list an editor mutates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    /// Next generated object id
    #[serde(skip)]
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, replacing any existing one with the same id
    pub fn insert(&mut self, object: SceneObject) {
        match self.objects.iter_mut().find(|o| o.id == object.id) {
            Some(slot) => *slot = object,
            None => self.objects.push(object),
        }
    }

    /// Add an object with a generated id; returns that id
    pub fn add(&mut self, kind: SceneKind, rect: OrientedRect, label: Option<&str>) -> String {
        loop {
            self.next_id += 1;
            let id = format!("obj_{}", self.next_id);
            if self.get(&id).is_none() {
                let mut object = SceneObject::new(id.clone(), kind, rect);
                object.label = label.map(str::to_string);
                self.objects.push(object);
                return id;
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<SceneObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Input ports, in scene order
    pub fn inputs(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.kind == SceneKind::Input)
    }

    /// Spawn specs for every input port
    pub fn spawn_specs(&self) -> Vec<BallSpec> {
        self.inputs().filter_map(SceneObject::spawn_spec).collect()
    }

    /// Spawn specs for the listed input ports only
    pub fn spawn_specs_for(&self, ids: &[&str]) -> Vec<BallSpec> {
        self.inputs()
            .filter(|o| ids.contains(&o.id.as_str()))
            .filter_map(SceneObject::spawn_spec)
            .collect()
    }
}

impl SceneProvider for Scene {
    fn scene_objects(&self) -> Vec<SceneObject> {
        self.objects.clone()
    }
}
