use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::animation::keyframes::TrackPoint;
use crate::annotation::erase::erase_hits;
use crate::annotation::history::{EditAction, Entry, History, take_entries};
use crate::annotation::layers::LayerStack;
use crate::annotation::model::{Annotation, LayerId, ToolType};
use crate::annotation::store::AnnotationStore;
use crate::annotation::visibility::{Presence, Visibility};
use crate::foundation::core::{Canvas, FrameGeometry, Point, Rect, Size};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::package::codec::{export_package, from_json, prepare_import};
use crate::package::model::AnnotationPackage;
use crate::scene::graph::{Scene, SceneGraph};
use crate::scene::shape::Shape;
use crate::services::notify::Notifications;
use crate::services::tools::{Gesture, ToolRegistry};
use crate::tracking::coordinator::{TrackerCoordinator, VideoFrame};

/// Collaborators handed to a session at construction. The default carries every
/// built-in tool.
#[derive(Debug, Default)]
pub struct SessionServices {
    /// User-visible message queue.
    pub notifications: Notifications,
    /// Gesture-to-shape builders.
    pub tools: ToolRegistry,
}

/// Annotations of one video: store, visuals, undo history and tracking.
///
/// Visuals live in display coordinates on a canvas of fixed size; keyframes live in
/// native video coordinates once [`AnnotationSession::set_video`] has been called
/// (until then native and display coincide).
#[derive(Debug)]
pub struct AnnotationSession {
    canvas: Canvas,
    store: AnnotationStore,
    scene: Scene,
    history: History,
    tracker: TrackerCoordinator,
    services: SessionServices,
    geometry: Option<FrameGeometry>,
    next_id: u64,
}

impl AnnotationSession {
    /// Session drawing on `canvas` (display pixels).
    pub fn new(canvas: Canvas, tracker: TrackerCoordinator, services: SessionServices) -> Self {
        Self {
            canvas,
            store: AnnotationStore::new(),
            scene: Scene::new(),
            history: History::default(),
            tracker,
            services,
            geometry: None,
            next_id: 1,
        }
    }

    /// Display canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Annotation records.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Visuals.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Visuals, for host-driven user drags and resizes.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Layer stack: add, rename, reorder, show/hide and lock layers.
    pub fn layers_mut(&mut self) -> &mut LayerStack {
        self.store.layers_mut()
    }

    /// Delete a layer and move its annotations to the first remaining layer, whose
    /// id is returned. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, layer: LayerId) -> FramemarkResult<LayerId> {
        let fallback = self.store.delete_layer(layer)?;
        tracing::debug!(layer, fallback, "layer deleted");
        Ok(fallback)
    }

    /// Tracking state.
    pub fn tracker(&self) -> &TrackerCoordinator {
        &self.tracker
    }

    /// Tracking state, e.g. to attach a detector.
    pub fn tracker_mut(&mut self) -> &mut TrackerCoordinator {
        &mut self.tracker
    }

    /// Undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Notification queue.
    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.services.notifications
    }

    /// Native video dimensions, when set.
    pub fn geometry(&self) -> Option<FrameGeometry> {
        self.geometry
    }

    /// Attach a video of `native` dimensions shown on the session canvas.
    pub fn set_video(&mut self, native: Canvas) -> FramemarkResult<()> {
        let geometry = FrameGeometry::new(
            native,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        )
        .ok_or_else(|| FramemarkError::validation("video has empty dimensions"))?;
        self.geometry = Some(geometry);
        self.tracker.set_geometry(geometry);
        Ok(())
    }

    /// Build a visual for `tool` from `gesture` and add an annotation spanning
    /// `[start, end]` on `layer` (the bottom layer when `None`). Returns the new id.
    ///
    /// Player trackers get a keyframe list seeded at `start` from the visual center.
    pub fn create(
        &mut self,
        tool: ToolType,
        gesture: &Gesture,
        start: f64,
        end: f64,
        layer: Option<LayerId>,
    ) -> FramemarkResult<String> {
        let shape = self.services.tools.build(tool, gesture)?;
        let layer = layer.unwrap_or_else(|| self.store.layers().first_id());
        let id = self.fresh_id();
        let annotation = Annotation::new(id.clone(), tool, start, end, layer)?;

        self.store.insert(annotation.clone())?;
        if let Err(err) = self.scene.add(id.clone(), shape.clone()) {
            self.store.remove(&id);
            return Err(err);
        }
        let index = self.store.len() - 1;
        if tool.is_tracked()
            && let Err(err) = self.start_tracking(&annotation)
        {
            self.store.remove(&id);
            self.scene.remove(&id);
            return Err(err);
        }
        self.history.record(EditAction::Added(Entry {
            index,
            annotation,
            shape,
        }));
        tracing::debug!(id = %id, ?tool, "annotation created");
        Ok(id)
    }

    /// Delete one annotation. Returns `false` when `id` is unknown.
    pub fn delete(&mut self, id: &str) -> bool {
        self.remove_batch(&[id.to_owned()]) > 0
    }

    /// Delete every annotation as one undo step. Layers are kept.
    pub fn clear(&mut self) -> usize {
        let ids: Vec<String> = self.store.annotations().iter().map(|a| a.id.clone()).collect();
        self.tracker.remove_all(&mut self.scene);
        self.remove_batch(&ids)
    }

    /// Delete every visible, unlocked annotation hit by an eraser stroke, as one undo
    /// step. Returns the erased ids.
    pub fn erase(&mut self, stroke: &[Point], stroke_width: f64) -> Vec<String> {
        let hits = erase_hits(&self.store, &self.scene, stroke, stroke_width);
        self.remove_batch(&hits);
        hits
    }

    /// Change the lifetime window of `id`.
    pub fn retime(&mut self, id: &str, start: f64, end: f64) -> FramemarkResult<()> {
        let before = self.store.retime(id, start, end)?;
        self.history.record(EditAction::Retimed {
            id: id.to_owned(),
            before,
            after: (start, end),
        });
        Ok(())
    }

    /// Revert the latest edit. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> FramemarkResult<bool> {
        let undone = self.history.undo(&mut self.store, &mut self.scene)?;
        if undone {
            self.sync_tracking()?;
        }
        Ok(undone)
    }

    /// Re-apply the latest undone edit. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> FramemarkResult<bool> {
        let redone = self.history.redo(&mut self.store, &mut self.scene)?;
        if redone {
            self.sync_tracking()?;
        }
        Ok(redone)
    }

    /// Advance to playback time `t`: update presence of every visual, then run
    /// tracking with the decoded frame when one is available.
    pub fn tick(&mut self, t: f64, frame: Option<&RgbaImage>) -> Vec<Presence> {
        let presence = Visibility::apply(&self.store, &mut self.scene, t);
        let display = self.display_size();
        self.tracker
            .update(&mut self.scene, t, frame.map(|f| VideoFrame::new(f, display)));
        presence
    }

    /// Start auto-tracking `id` from its visual's current position in `frame`.
    pub fn enable_auto_tracking(&mut self, id: &str, frame: &RgbaImage, t: f64) -> bool {
        let display = self.display_size();
        self.tracker
            .enable_auto_tracking(&mut self.scene, id, VideoFrame::new(frame, display), t)
    }

    /// Stop auto-tracking `id`; its keyframes are kept.
    pub fn disable_auto_tracking(&mut self, id: &str) -> bool {
        self.tracker.disable_auto_tracking(id)
    }

    /// Snapshot every annotation with its visual, stamped with the current time.
    pub fn export_package(&self) -> FramemarkResult<AnnotationPackage> {
        let exported_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        export_package(&self.store, &self.scene, self.canvas, exported_at)
    }

    /// Import a package, rescaled to this canvas, as one undo step.
    ///
    /// Nothing changes unless the whole package is valid and none of its ids exist
    /// yet; failures are also posted to the notification queue.
    pub fn import_package(&mut self, pkg: AnnotationPackage) -> FramemarkResult<usize> {
        match self.try_import(pkg) {
            Ok(n) => {
                self.services
                    .notifications
                    .info(format!("Imported {n} annotations"));
                Ok(n)
            }
            Err(err) => {
                self.services
                    .notifications
                    .error(format!("Import failed: {err}"));
                Err(err)
            }
        }
    }

    /// Parse and import a JSON package.
    pub fn import_json(&mut self, json: &str) -> FramemarkResult<usize> {
        match from_json(json) {
            Ok(pkg) => self.import_package(pkg),
            Err(err) => {
                self.services
                    .notifications
                    .error(format!("Import failed: {err}"));
                Err(err)
            }
        }
    }

    fn try_import(&mut self, pkg: AnnotationPackage) -> FramemarkResult<usize> {
        let parts = prepare_import(pkg, self.canvas)?;
        let mut seeds = Vec::with_capacity(parts.len());
        for (annotation, shape) in &parts {
            if self.store.contains(&annotation.id)
                || self.scene.shape(&annotation.id).is_some()
                || self.tracker.is_tracked(&annotation.id)
            {
                return Err(FramemarkError::package(format!(
                    "annotation id '{}' already exists",
                    annotation.id
                )));
            }
            let seed = if annotation.tool.is_tracked() {
                Some(self.seed_for(annotation, shape.bounds())?)
            } else {
                None
            };
            seeds.push(seed);
        }

        let mut new_layers: Vec<LayerId> = parts
            .iter()
            .map(|(a, _)| a.layer)
            .filter(|&l| !self.store.layers().contains(l))
            .collect();
        new_layers.sort_unstable();
        new_layers.dedup();
        for &layer in &new_layers {
            self.store.layers_mut().ensure(layer);
        }

        let mut entries: Vec<Entry> = Vec::with_capacity(parts.len());
        for ((annotation, shape), seed) in parts.into_iter().zip(seeds) {
            if let Err(err) = self.insert_imported(&annotation, &shape, seed) {
                let ids: Vec<String> = entries
                    .iter()
                    .map(|e| e.annotation.id.clone())
                    .chain(std::iter::once(annotation.id))
                    .collect();
                self.rollback_import(&ids, &new_layers);
                return Err(err);
            }
            entries.push(Entry {
                index: self.store.len() - 1,
                annotation,
                shape,
            });
        }
        let n = entries.len();
        if n > 0 {
            self.history.record(EditAction::Imported(entries));
        }
        Ok(n)
    }

    fn insert_imported(
        &mut self,
        annotation: &Annotation,
        shape: &Shape,
        seed: Option<TrackPoint>,
    ) -> FramemarkResult<()> {
        self.store.insert(annotation.clone())?;
        self.scene.add(annotation.id.clone(), shape.clone())?;
        if let Some(seed) = seed {
            self.tracker.track(&mut self.scene, &annotation.id, seed)?;
        }
        Ok(())
    }

    fn rollback_import(&mut self, ids: &[String], new_layers: &[LayerId]) {
        for id in ids {
            self.tracker.remove(&mut self.scene, id);
            self.scene.remove(id);
            self.store.remove(id);
        }
        for &layer in new_layers {
            if let Err(err) = self.store.layers_mut().remove(layer) {
                tracing::warn!(layer, %err, "could not drop layer of a failed import");
            }
        }
        tracing::debug!(count = ids.len(), "import rolled back");
    }

    fn remove_batch(&mut self, ids: &[String]) -> usize {
        for id in ids {
            self.tracker.remove(&mut self.scene, id);
        }
        let entries = take_entries(&mut self.store, &mut self.scene, ids);
        let n = entries.len();
        if n > 0 {
            self.history.record(EditAction::Removed(entries));
        }
        n
    }

    /// Drop tracking state of vanished annotations and reseed restored trackers.
    fn sync_tracking(&mut self) -> FramemarkResult<()> {
        let stale: Vec<String> = self
            .tracker
            .tracked_ids()
            .filter(|id| !self.store.contains(id))
            .map(str::to_owned)
            .collect();
        for id in stale {
            self.tracker.remove(&mut self.scene, &id);
        }

        let missing: Vec<Annotation> = self
            .store
            .annotations()
            .iter()
            .filter(|a| a.tool.is_tracked() && !self.tracker.is_tracked(&a.id))
            .cloned()
            .collect();
        for a in &missing {
            self.start_tracking(a)?;
        }
        Ok(())
    }

    fn start_tracking(&mut self, annotation: &Annotation) -> FramemarkResult<()> {
        let bounds = self.scene.bounds(&annotation.id).ok_or_else(|| {
            FramemarkError::tracking(format!("'{}' has no visual", annotation.id))
        })?;
        let seed = self.seed_for(annotation, bounds)?;
        self.tracker.track(&mut self.scene, &annotation.id, seed)
    }

    /// First keyframe of a tracker whose visual spans `bounds` (display pixels).
    fn seed_for(&self, annotation: &Annotation, bounds: Rect) -> FramemarkResult<TrackPoint> {
        let (center, size) = match self.geometry {
            Some(g) => (
                g.to_native(bounds.center()),
                g.size_to_native(bounds.size()),
            ),
            None => (bounds.center(), bounds.size()),
        };
        let seed = TrackPoint::at(annotation.start_time, center.x, center.y)
            .with_size(size.width, size.height);
        if !seed.is_finite() {
            return Err(FramemarkError::tracking(format!(
                "'{}' has no finite center and size to track from",
                annotation.id
            )));
        }
        Ok(seed)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = format!("ann-{}", self.next_id);
            self.next_id += 1;
            if !self.store.contains(&id) && self.scene.shape(&id).is_none() {
                return id;
            }
        }
    }

    fn display_size(&self) -> Size {
        Size::new(f64::from(self.canvas.width), f64::from(self.canvas.height))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/workspace.rs"]
mod tests;
