use crate::annotation::model::Annotation;
use crate::annotation::store::AnnotationStore;
use crate::foundation::error::FramemarkResult;
use crate::scene::graph::Scene;
use crate::scene::shape::Shape;

/// An annotation together with its visual, as captured for undo.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Creation-order index at capture time.
    pub index: usize,
    /// Annotation record.
    pub annotation: Annotation,
    /// Visual geometry.
    pub shape: Shape,
}

/// One undoable edit.
#[derive(Clone, Debug, PartialEq)]
pub enum EditAction {
    /// A single annotation was created.
    Added(Entry),
    /// A batch of annotations was removed (delete, clear, erase).
    Removed(Vec<Entry>),
    /// A package was imported; entries are in ascending index order.
    Imported(Vec<Entry>),
    /// An annotation's window changed.
    Retimed {
        /// Annotation id.
        id: String,
        /// Window before the edit.
        before: (f64, f64),
        /// Window after the edit.
        after: (f64, f64),
    },
}

/// Linear undo/redo stacks.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<EditAction>,
    redo: Vec<EditAction>,
}

impl History {
    /// Record a completed edit; clears the redo stack.
    pub fn record(&mut self, action: EditAction) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Return `true` when there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Return `true` when there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Revert the latest edit. Returns `false` when nothing was undone.
    pub fn undo(
        &mut self,
        store: &mut AnnotationStore,
        scene: &mut Scene,
    ) -> FramemarkResult<bool> {
        let Some(action) = self.undo.pop() else {
            return Ok(false);
        };
        revert(&action, store, scene)?;
        self.redo.push(action);
        Ok(true)
    }

    /// Re-apply the latest undone edit. Returns `false` when nothing was redone.
    pub fn redo(
        &mut self,
        store: &mut AnnotationStore,
        scene: &mut Scene,
    ) -> FramemarkResult<bool> {
        let Some(action) = self.redo.pop() else {
            return Ok(false);
        };
        reapply(&action, store, scene)?;
        self.undo.push(action);
        Ok(true)
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Remove `ids` from store and scene, capturing entries with their pre-removal indices
/// in ascending order so [`EditAction::Removed`] can be reverted in one pass.
pub(crate) fn take_entries(
    store: &mut AnnotationStore,
    scene: &mut Scene,
    ids: &[String],
) -> Vec<Entry> {
    let mut indexed: Vec<(usize, String)> = store
        .annotations()
        .iter()
        .enumerate()
        .filter(|(_, a)| ids.contains(&a.id))
        .map(|(i, a)| (i, a.id.clone()))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);

    let mut entries = Vec::with_capacity(indexed.len());
    for (index, id) in indexed {
        let Some((_, annotation)) = store.remove(&id) else {
            continue;
        };
        let Some(shape) = scene.remove(&id) else {
            tracing::warn!(%id, "annotation had no visual; dropping without undo entry");
            continue;
        };
        entries.push(Entry {
            index,
            annotation,
            shape,
        });
    }
    entries
}

fn revert(
    action: &EditAction,
    store: &mut AnnotationStore,
    scene: &mut Scene,
) -> FramemarkResult<()> {
    match action {
        EditAction::Added(entry) => {
            store.remove(&entry.annotation.id);
            scene.remove(&entry.annotation.id);
        }
        EditAction::Removed(entries) => {
            // Entries were captured in ascending index order.
            restore_all(entries, store, scene)?;
        }
        EditAction::Imported(entries) => remove_all(entries, store, scene),
        EditAction::Retimed { id, before, .. } => {
            store.retime(id, before.0, before.1)?;
        }
    }
    Ok(())
}

fn reapply(
    action: &EditAction,
    store: &mut AnnotationStore,
    scene: &mut Scene,
) -> FramemarkResult<()> {
    match action {
        EditAction::Added(entry) => {
            store.restore(entry.index, entry.annotation.clone());
            scene.add(entry.annotation.id.clone(), entry.shape.clone())?;
        }
        EditAction::Removed(entries) => remove_all(entries, store, scene),
        EditAction::Imported(entries) => restore_all(entries, store, scene)?,
        EditAction::Retimed { id, after, .. } => {
            store.retime(id, after.0, after.1)?;
        }
    }
    Ok(())
}

fn restore_all(
    entries: &[Entry],
    store: &mut AnnotationStore,
    scene: &mut Scene,
) -> FramemarkResult<()> {
    for e in entries {
        store.restore(e.index, e.annotation.clone());
        scene.add(e.annotation.id.clone(), e.shape.clone())?;
    }
    Ok(())
}

fn remove_all(entries: &[Entry], store: &mut AnnotationStore, scene: &mut Scene) {
    for e in entries {
        store.remove(&e.annotation.id);
        scene.remove(&e.annotation.id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/history.rs"]
mod tests;
