use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{Point, Rect, Size};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::scene::shape::Shape;

/// Contract the annotation core needs from the drawing surface.
///
/// Visuals are addressed by annotation id only; the surface owns rendering state and
/// callers keep their own bookkeeping in side tables keyed by the same id.
pub trait SceneGraph {
    /// Bounds center of a visual.
    fn center(&self, id: &str) -> Option<Point>;
    /// Geometric bounds of a visual.
    fn bounds(&self, id: &str) -> Option<Rect>;
    /// Programmatic move (does not count as a user edit).
    fn move_to(&mut self, id: &str, center: Point);
    /// Programmatic resize around the current center.
    fn resize(&mut self, id: &str, size: Size);
    /// Show/hide and set opacity. Hidden visuals are excluded from hit-testing.
    fn set_presence(&mut self, id: &str, visible: bool, opacity: f64);
    /// Current visibility flag.
    fn is_visible(&self, id: &str) -> bool;
    /// Start reporting user drags/resizes of `id`.
    fn watch(&mut self, id: &str);
    /// Stop reporting user edits of `id` and drop any queued ones.
    fn unwatch(&mut self, id: &str);
    /// Drain ids of watched visuals the user moved or resized since the last call.
    fn take_user_edits(&mut self) -> Vec<String>;
}

/// One visual on the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    /// Geometry and styling.
    pub shape: Shape,
    /// Drawn and hit-testable.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// In-memory drawing surface keyed by annotation id.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<String, SceneNode>,
    watched: BTreeSet<String>,
    user_edits: Vec<String>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visual under a unique id.
    pub fn add(&mut self, id: impl Into<String>, shape: Shape) -> FramemarkResult<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(FramemarkError::validation(format!(
                "duplicate visual id '{id}'"
            )));
        }
        self.nodes.insert(
            id,
            SceneNode {
                shape,
                visible: true,
                opacity: 1.0,
            },
        );
        Ok(())
    }

    /// Remove a visual, returning its shape.
    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        self.unwatch(id);
        self.nodes.remove(id).map(|n| n.shape)
    }

    /// Remove every visual.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.watched.clear();
        self.user_edits.clear();
    }

    /// Look up a visual.
    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Look up a visual's shape.
    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.nodes.get(id).map(|n| &n.shape)
    }

    /// Mutable access to a visual's shape (recolor, restyle).
    pub fn shape_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.nodes.get_mut(id).map(|n| &mut n.shape)
    }

    /// Ids in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Number of visuals.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return `true` when the scene holds no visuals.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return `true` while user edits of `id` are being reported.
    pub fn is_watched(&self, id: &str) -> bool {
        self.watched.contains(id)
    }

    /// User drag: move and, when watched, queue an edit notification.
    pub fn user_move(&mut self, id: &str, center: Point) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.move_to(id, center);
        self.note_user_edit(id);
    }

    /// User resize handle: resize and, when watched, queue an edit notification.
    pub fn user_resize(&mut self, id: &str, size: Size) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.resize(id, size);
        self.note_user_edit(id);
    }

    fn note_user_edit(&mut self, id: &str) {
        if self.watched.contains(id) && !self.user_edits.iter().any(|e| e == id) {
            self.user_edits.push(id.to_owned());
        }
    }
}

impl SceneGraph for Scene {
    fn center(&self, id: &str) -> Option<Point> {
        self.nodes.get(id).map(|n| n.shape.center())
    }

    fn bounds(&self, id: &str) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.shape.bounds())
    }

    fn move_to(&mut self, id: &str, center: Point) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.shape.move_center_to(center);
        }
    }

    fn resize(&mut self, id: &str, size: Size) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.shape.resize(size);
        }
    }

    fn set_presence(&mut self, id: &str, visible: bool, opacity: f64) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.visible = visible;
            n.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn is_visible(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    fn watch(&mut self, id: &str) {
        self.watched.insert(id.to_owned());
    }

    fn unwatch(&mut self, id: &str) {
        self.watched.remove(id);
        self.user_edits.retain(|e| e != id);
    }

    fn take_user_edits(&mut self) -> Vec<String> {
        std::mem::take(&mut self.user_edits)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
