use crate::annotation::model::LayerId;
use crate::foundation::error::{FramemarkError, FramemarkResult};

/// Named, orderable grouping of annotations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Stable id referenced by annotations.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Hidden layers hide all their annotations.
    pub visible: bool,
    /// Locked layers reject erase and edits.
    pub locked: bool,
}

/// Ordered layer list (bottom first). Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    next_id: LayerId,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self {
            layers: vec![Layer {
                id: 0,
                name: "Layer 1".to_string(),
                visible: true,
                locked: false,
            }],
            next_id: 1,
        }
    }
}

impl LayerStack {
    /// Layers bottom to top.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Look up a layer.
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Return `true` when the layer exists.
    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// First (bottom) layer; always present.
    pub fn first_id(&self) -> LayerId {
        self.layers[0].id
    }

    /// Append a layer on top and return its id.
    pub fn add(&mut self, name: impl Into<String>) -> LayerId {
        let id = self.free_id();
        self.next_id = id.saturating_add(1);
        self.layers.push(Layer {
            id,
            name: name.into(),
            visible: true,
            locked: false,
        });
        id
    }

    /// Make sure a layer with `id` exists (used when importing foreign ids).
    pub fn ensure(&mut self, id: LayerId) {
        if self.contains(id) {
            return;
        }
        self.layers.push(Layer {
            id,
            name: format!("Layer {}", u64::from(id) + 1),
            visible: true,
            locked: false,
        });
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// Rename a layer.
    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> FramemarkResult<()> {
        self.get_mut(id)?.name = name.into();
        Ok(())
    }

    /// Show or hide a layer.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> FramemarkResult<()> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    /// Lock or unlock a layer.
    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> FramemarkResult<()> {
        self.get_mut(id)?.locked = locked;
        Ok(())
    }

    /// Move a layer one step toward the top. No-op when already on top.
    pub fn raise(&mut self, id: LayerId) -> FramemarkResult<()> {
        let i = self.index_of(id)?;
        if i + 1 < self.layers.len() {
            self.layers.swap(i, i + 1);
        }
        Ok(())
    }

    /// Move a layer one step toward the bottom. No-op when already at the bottom.
    pub fn lower(&mut self, id: LayerId) -> FramemarkResult<()> {
        let i = self.index_of(id)?;
        if i > 0 {
            self.layers.swap(i, i - 1);
        }
        Ok(())
    }

    /// Delete a layer and return the id its annotations must move to.
    ///
    /// Deleting the last remaining layer is rejected. Annotations are not touched;
    /// go through [`AnnotationStore::delete_layer`](crate::AnnotationStore::delete_layer).
    pub(crate) fn remove(&mut self, id: LayerId) -> FramemarkResult<LayerId> {
        let i = self.index_of(id)?;
        if self.layers.len() == 1 {
            return Err(FramemarkError::validation("cannot delete the last layer"));
        }
        self.layers.remove(i);
        Ok(self.first_id())
    }

    /// Draw order rank of a layer (0 = bottom).
    pub fn rank(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn index_of(&self, id: LayerId) -> FramemarkResult<usize> {
        self.rank(id)
            .ok_or_else(|| FramemarkError::validation(format!("unknown layer {id}")))
    }

    /// `next_id`, or the lowest unused id once `next_id` is taken (after `ensure(u32::MAX)`).
    fn free_id(&self) -> LayerId {
        if !self.contains(self.next_id) {
            return self.next_id;
        }
        (0..=LayerId::MAX)
            .find(|&id| !self.contains(id))
            .unwrap_or(self.next_id)
    }

    fn get_mut(&mut self, id: LayerId) -> FramemarkResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| FramemarkError::validation(format!("unknown layer {id}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/layers.rs"]
mod tests;
