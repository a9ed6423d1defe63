use crate::annotation::layers::LayerStack;
use crate::annotation::model::{Annotation, LayerId, validate_window};
use crate::foundation::error::{FramemarkError, FramemarkResult};

/// Annotations in creation order plus the layer model they reference.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    layers: LayerStack,
}

impl AnnotationStore {
    /// Empty store with the default layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations in creation order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Layer model.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Mutable layer model. Use [`AnnotationStore::delete_layer`] to delete layers.
    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    /// Look up an annotation.
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Return `true` when the annotation exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Return `true` when no annotations exist.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Insert a validated annotation with a unique id on an existing layer.
    pub fn insert(&mut self, annotation: Annotation) -> FramemarkResult<()> {
        annotation.validate()?;
        if self.contains(&annotation.id) {
            return Err(FramemarkError::validation(format!(
                "duplicate annotation id '{}'",
                annotation.id
            )));
        }
        if !self.layers.contains(annotation.layer) {
            return Err(FramemarkError::validation(format!(
                "annotation '{}' references unknown layer {}",
                annotation.id, annotation.layer
            )));
        }
        self.annotations.push(annotation);
        Ok(())
    }

    /// Change the lifetime window. Returns the previous `(start, end)`.
    pub fn retime(&mut self, id: &str, start: f64, end: f64) -> FramemarkResult<(f64, f64)> {
        validate_window(id, start, end)?;
        let a = self.get_mut(id)?;
        let before = (a.start_time, a.end_time);
        a.start_time = start;
        a.end_time = end;
        Ok(before)
    }

    /// Change fade durations.
    pub fn set_fades(
        &mut self,
        id: &str,
        fade_in: Option<f64>,
        fade_out: Option<f64>,
    ) -> FramemarkResult<()> {
        let a = self.get_mut(id)?;
        let updated = a.clone().with_fades(fade_in, fade_out);
        updated.validate()?;
        *a = updated;
        Ok(())
    }

    /// Move an annotation to another existing layer.
    pub fn set_layer(&mut self, id: &str, layer: LayerId) -> FramemarkResult<()> {
        if !self.layers.contains(layer) {
            return Err(FramemarkError::validation(format!("unknown layer {layer}")));
        }
        self.get_mut(id)?.layer = layer;
        Ok(())
    }

    /// Delete a layer, reassigning its annotations to the first remaining layer.
    pub fn delete_layer(&mut self, layer: LayerId) -> FramemarkResult<LayerId> {
        let fallback = self.layers.remove(layer)?;
        for a in self.annotations.iter_mut().filter(|a| a.layer == layer) {
            a.layer = fallback;
        }
        Ok(fallback)
    }

    /// Remove an annotation, returning it with its creation-order index.
    pub fn remove(&mut self, id: &str) -> Option<(usize, Annotation)> {
        let i = self.annotations.iter().position(|a| a.id == id)?;
        Some((i, self.annotations.remove(i)))
    }

    /// Re-insert a removed annotation at its former index (undo).
    pub(crate) fn restore(&mut self, index: usize, mut annotation: Annotation) {
        if !self.layers.contains(annotation.layer) {
            annotation.layer = self.layers.first_id();
        }
        let index = index.min(self.annotations.len());
        self.annotations.insert(index, annotation);
    }

    /// Remove every annotation; layers are kept.
    pub fn clear(&mut self) -> Vec<Annotation> {
        std::mem::take(&mut self.annotations)
    }

    /// Return `true` when the annotation sits on a locked layer.
    pub fn is_locked(&self, id: &str) -> bool {
        self.get(id)
            .and_then(|a| self.layers.get(a.layer))
            .is_some_and(|l| l.locked)
    }

    fn get_mut(&mut self, id: &str) -> FramemarkResult<&mut Annotation> {
        self.annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| FramemarkError::validation(format!("unknown annotation '{id}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/store.rs"]
mod tests;
