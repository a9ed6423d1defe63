use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use image::RgbaImage;

use crate::animation::keyframes::{KeyframeTrack, TrackPoint};
use crate::foundation::core::{Canvas, FrameGeometry, Point, Size};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::scene::graph::SceneGraph;
use crate::tracking::detector::{
    ClosestDetection, Detection, ObjectDetector, find_closest_detection,
};
use crate::tracking::slot::{DetectionSlot, Dispatch};
use crate::tracking::template::{MatchTuning, Template, find_best_match, sample_template};

/// Tracker tunables.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackerOpts {
    /// Template half-size in display pixels.
    pub template_radius: f64,
    /// Color search half-size in native pixels.
    pub search_radius: f64,
    /// Minimum playback-time gap between two auto-tracking steps, seconds.
    pub frame_interval: f64,
    /// Confidences at or below this pause auto-tracking.
    pub pause_threshold: f64,
    /// Snap and distance-gate radius as a fraction of the larger native dimension.
    pub snap_distance_ratio: f64,
    /// Distance confidence above which it caps the detector confidence.
    pub distance_gate: f64,
    /// Per-tick blend factor toward the interpolated size.
    pub size_smoothing: f64,
    /// Where detection passes run.
    pub dispatch: Dispatch,
    /// Color matcher constants.
    pub tuning: MatchTuning,
}

impl Default for TrackerOpts {
    fn default() -> Self {
        Self {
            template_radius: 20.0,
            search_radius: 40.0,
            frame_interval: 1.0 / 30.0,
            pause_threshold: 0.4,
            snap_distance_ratio: 0.15,
            distance_gate: 0.3,
            size_smoothing: 0.3,
            dispatch: Dispatch::Background,
            tuning: MatchTuning::default(),
        }
    }
}

/// A decoded frame together with the display box it is drawn into.
#[derive(Clone, Copy, Debug)]
pub struct VideoFrame<'a> {
    /// Native-resolution pixels.
    pub pixels: &'a RgbaImage,
    /// Display box size.
    pub display: Size,
}

impl<'a> VideoFrame<'a> {
    /// Frame drawn into `display`.
    pub fn new(pixels: &'a RgbaImage, display: Size) -> Self {
        Self { pixels, display }
    }

    /// Frame displayed at its native size.
    pub fn native(pixels: &'a RgbaImage) -> Self {
        let (w, h) = pixels.dimensions();
        Self::new(pixels, Size::new(f64::from(w), f64::from(h)))
    }

    /// Display/native mapping; `None` until the frame has dimensions.
    pub fn geometry(&self) -> Option<FrameGeometry> {
        let (width, height) = self.pixels.dimensions();
        FrameGeometry::new(Canvas { width, height }, self.display.width, self.display.height)
    }
}

/// Per-annotation tracking state, surfaced as a status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    /// Not registered, or registered without auto-tracking.
    Untracked,
    /// Auto-tracking is producing keyframes.
    Tracking,
    /// Confidence dropped too low; waiting for a manual correction.
    Paused,
    /// A manual reposition was applied and auto-tracking has not stepped since.
    ManualOverride,
}

impl TrackerStatus {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Untracked => "Not tracking",
            Self::Tracking => "Tracking",
            Self::Paused => "Paused: low confidence",
            Self::ManualOverride => "Manual",
        }
    }

    /// Indicator color, RGBA8.
    pub fn color_rgba8(self) -> [u8; 4] {
        match self {
            Self::Untracked => [128, 128, 128, 255],
            Self::Tracking => [34, 197, 94, 255],
            Self::Paused => [245, 158, 11, 255],
            Self::ManualOverride => [59, 130, 246, 255],
        }
    }
}

#[derive(Clone, Debug)]
struct AutoTracking {
    template: Template,
    last_confidence: f64,
    paused: bool,
    last_processed: Option<f64>,
    pending_resample: bool,
}

#[derive(Clone, Debug)]
struct TrackedEntry {
    keyframes: KeyframeTrack,
    auto: Option<AutoTracking>,
    smoothed_size: Option<Size>,
    manual_override: bool,
}

struct Observation {
    position: Point,
    size: Option<Size>,
    confidence: f64,
}

enum Evidence<'a> {
    Detector(Option<&'a [Detection]>),
    Color,
}

/// Owns keyframe lists and auto-tracking state for tracked annotations.
///
/// State lives in a side table keyed by annotation id; the scene graph is only reached
/// through [`SceneGraph`] calls with that id.
pub struct TrackerCoordinator {
    opts: TrackerOpts,
    entries: BTreeMap<String, TrackedEntry>,
    detector: Option<Arc<Mutex<ObjectDetector>>>,
    detector_loaded: bool,
    slot: DetectionSlot,
    geometry: Option<FrameGeometry>,
}

impl std::fmt::Debug for TrackerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerCoordinator")
            .field("opts", &self.opts)
            .field("tracked", &self.entries.len())
            .field("detector_loaded", &self.detector_loaded)
            .finish()
    }
}

impl Default for TrackerCoordinator {
    fn default() -> Self {
        Self::new(TrackerOpts::default())
    }
}

impl TrackerCoordinator {
    /// Coordinator without a detector; auto-tracking uses color matching.
    pub fn new(opts: TrackerOpts) -> Self {
        let slot = DetectionSlot::new(opts.dispatch);
        Self {
            opts,
            entries: BTreeMap::new(),
            detector: None,
            detector_loaded: false,
            slot,
            geometry: None,
        }
    }

    /// Attach a detector. Only a loaded detector changes behavior.
    pub fn set_detector(&mut self, detector: Arc<Mutex<ObjectDetector>>) {
        self.detector_loaded = detector.lock().map(|d| d.is_loaded()).unwrap_or(false);
        self.detector = Some(detector);
        self.slot.invalidate();
    }

    /// Whether detector-based tracking is active.
    pub fn detector_loaded(&self) -> bool {
        self.detector_loaded
    }

    /// Tunables.
    pub fn opts(&self) -> &TrackerOpts {
        &self.opts
    }

    /// Set the display/native mapping used when no frame accompanies a tick.
    pub fn set_geometry(&mut self, geometry: FrameGeometry) {
        self.geometry = Some(geometry);
    }

    /// Register `id` with a keyframe list seeded by `initial` (native coordinates) and
    /// start listening for manual edits of its visual.
    pub fn track(
        &mut self,
        scene: &mut dyn SceneGraph,
        id: &str,
        initial: TrackPoint,
    ) -> FramemarkResult<()> {
        if self.entries.contains_key(id) {
            return Err(FramemarkError::tracking(format!("'{id}' is already tracked")));
        }
        let keyframes = KeyframeTrack::seeded(initial)?;
        self.entries.insert(
            id.to_owned(),
            TrackedEntry {
                keyframes,
                auto: None,
                smoothed_size: None,
                manual_override: false,
            },
        );
        scene.watch(id);
        Ok(())
    }

    /// Start auto-tracking `id` from its current on-screen center.
    ///
    /// Returns `false` when `id` is not tracked or the frame has no dimensions yet.
    /// With a loaded detector, a detection within the snap radius of the center is
    /// adopted immediately as a keyframe at `t`.
    pub fn enable_auto_tracking(
        &mut self,
        scene: &mut dyn SceneGraph,
        id: &str,
        frame: VideoFrame<'_>,
        t: f64,
    ) -> bool {
        let Some(geom) = frame.geometry() else {
            return false;
        };
        if !self.entries.contains_key(id) {
            return false;
        }
        let Some(center) = scene.center(id) else {
            return false;
        };
        self.geometry = Some(geom);

        if self.detector_loaded
            && let Some(snap) = self.snap_candidate(frame.pixels, geom.to_native(center), geom)
        {
            let d = snap.detection;
            let key = TrackPoint::at(t, d.x, d.y).with_size(d.width, d.height);
            if let Some(entry) = self.entries.get_mut(id)
                && entry.keyframes.insert(key).is_ok()
            {
                tracing::debug!(id = %id, distance = snap.distance, "snapped to detection");
                let size = geom.size_to_display(Size::new(d.width, d.height));
                scene.resize(id, size);
                scene.move_to(id, geom.to_display(d.center()));
                entry.smoothed_size = Some(size);
            }
        }

        let center = scene.center(id).unwrap_or(center);
        let Some(template) =
            sample_template(frame.pixels, center, frame.display, self.opts.template_radius)
        else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        entry.auto = Some(AutoTracking {
            template,
            last_confidence: 1.0,
            paused: false,
            last_processed: Some(t),
            pending_resample: false,
        });
        entry.manual_override = false;
        true
    }

    /// Stop auto-tracking `id`, keeping its keyframes.
    pub fn disable_auto_tracking(&mut self, id: &str) -> bool {
        self.entries
            .get_mut(id)
            .is_some_and(|e| e.auto.take().is_some())
    }

    /// Re-sample the template at the visual's current center and resume.
    pub fn resample_template(
        &mut self,
        scene: &dyn SceneGraph,
        id: &str,
        frame: VideoFrame<'_>,
    ) -> bool {
        let Some(center) = scene.center(id) else {
            return false;
        };
        let Some(auto) = self.entries.get_mut(id).and_then(|e| e.auto.as_mut()) else {
            return false;
        };
        let Some(template) =
            sample_template(frame.pixels, center, frame.display, self.opts.template_radius)
        else {
            return false;
        };
        auto.template = template;
        auto.paused = false;
        auto.last_confidence = 1.0;
        auto.pending_resample = false;
        true
    }

    /// Advance every tracked annotation to playback time `t`.
    ///
    /// Manual edits queued by the scene become keyframes, due annotations take one
    /// auto-tracking step, then every visual is moved to its interpolated position.
    /// Failures are logged per annotation and never stop the others. A non-finite `t`
    /// is ignored and queued edits wait for the next update.
    pub fn update(&mut self, scene: &mut dyn SceneGraph, t: f64, frame: Option<VideoFrame<'_>>) {
        if !t.is_finite() {
            tracing::warn!(t, "skipping tracker update at non-finite time");
            return;
        }
        let frame_geom = frame.and_then(|f| f.geometry().map(|g| (f, g)));
        if let Some((_, g)) = frame_geom {
            self.geometry = Some(g);
        }

        for id in scene.take_user_edits() {
            if let Err(err) = self.apply_manual_edit(&*scene, &id, t) {
                tracing::warn!(id = %id, error = %err, "manual edit not recorded");
            }
        }

        if let Some((f, _)) = frame_geom {
            let pending: Vec<String> = self
                .entries
                .iter()
                .filter(|(_, e)| e.auto.as_ref().is_some_and(|a| a.pending_resample))
                .map(|(id, _)| id.clone())
                .collect();
            for id in pending {
                if self.resample_template(&*scene, &id, f)
                    && let Some(auto) = self.entries.get_mut(&id).and_then(|e| e.auto.as_mut())
                {
                    auto.last_processed = Some(t);
                }
            }
        }

        self.slot.poll();
        if let Some((f, g)) = frame_geom {
            let interval = self.opts.frame_interval;
            let due: Vec<String> = self
                .entries
                .iter()
                .filter(|(_, e)| e.auto.as_ref().is_some_and(|a| a.is_due(t, interval)))
                .map(|(id, _)| id.clone())
                .collect();

            if !due.is_empty()
                && self.detector_loaded
                && let Some(detector) = self.detector.as_ref()
            {
                self.slot.request(detector, f.pixels);
            }

            let evidence = if self.detector_loaded {
                Evidence::Detector(self.slot.latest())
            } else {
                Evidence::Color
            };
            for id in due {
                let Some(entry) = self.entries.get_mut(&id) else {
                    continue;
                };
                if let Err(err) = auto_step(entry, &id, t, f, g, &evidence, &self.opts) {
                    tracing::warn!(id = %id, error = %err, "auto-tracking step failed");
                }
            }
        }

        let Some(geom) = self.geometry else {
            return;
        };
        let smoothing = self.opts.size_smoothing;
        for (id, entry) in &mut self.entries {
            apply_position(scene, id, entry, t, geom, smoothing);
        }
    }

    /// Stop tracking `id`: drop its keyframes and auto state and stop listening.
    pub fn remove(&mut self, scene: &mut dyn SceneGraph, id: &str) -> bool {
        scene.unwatch(id);
        self.entries.remove(id).is_some()
    }

    /// Stop tracking everything. Pending detection results are discarded.
    pub fn remove_all(&mut self, scene: &mut dyn SceneGraph) {
        for id in self.entries.keys() {
            scene.unwatch(id);
        }
        self.entries.clear();
        self.slot.invalidate();
    }

    /// Block until a background detection pass finishes.
    pub fn wait_for_detection(&mut self) {
        self.slot.wait();
    }

    /// Whether `id` is registered.
    pub fn is_tracked(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn tracked_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered annotations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keyframes of `id`, native coordinates.
    pub fn keyframes(&self, id: &str) -> Option<&[TrackPoint]> {
        self.entries.get(id).map(|e| e.keyframes.keys())
    }

    /// Last auto-tracking confidence of `id`.
    pub fn last_confidence(&self, id: &str) -> Option<f64> {
        self.entries
            .get(id)
            .and_then(|e| e.auto.as_ref())
            .map(|a| a.last_confidence)
    }

    /// Whether auto-tracking of `id` is paused.
    pub fn is_paused(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .and_then(|e| e.auto.as_ref())
            .is_some_and(|a| a.paused)
    }

    /// Status indicator for `id`.
    pub fn status(&self, id: &str) -> TrackerStatus {
        let Some(entry) = self.entries.get(id) else {
            return TrackerStatus::Untracked;
        };
        if entry.manual_override {
            return TrackerStatus::ManualOverride;
        }
        match &entry.auto {
            None => TrackerStatus::Untracked,
            Some(a) if a.paused => TrackerStatus::Paused,
            Some(_) => TrackerStatus::Tracking,
        }
    }

    fn snap_candidate(
        &mut self,
        pixels: &RgbaImage,
        center: Point,
        geom: FrameGeometry,
    ) -> Option<ClosestDetection> {
        let fresh = self
            .detector
            .as_ref()
            .and_then(|d| d.lock().ok())
            .and_then(|mut d| d.try_detect_at(pixels, Instant::now()));
        let closest = match fresh.as_deref() {
            Some(dets) => find_closest_detection(dets, center),
            None => self
                .slot
                .latest()
                .and_then(|dets| find_closest_detection(dets, center)),
        }?;
        let radius = self.opts.snap_distance_ratio * geom.max_native_dim();
        (closest.distance < radius).then_some(closest)
    }

    fn apply_manual_edit(
        &mut self,
        scene: &dyn SceneGraph,
        id: &str,
        t: f64,
    ) -> FramemarkResult<()> {
        let Some(entry) = self.entries.get_mut(id) else {
            return Ok(());
        };
        let geom = self
            .geometry
            .ok_or_else(|| FramemarkError::tracking("no frame geometry for manual edit"))?;
        let center = scene
            .center(id)
            .ok_or_else(|| FramemarkError::tracking(format!("'{id}' has no visual")))?;
        let native = geom.to_native(center);
        let mut key = TrackPoint::at(t, native.x, native.y);
        let bounds = scene.bounds(id);
        if let Some(b) = bounds {
            let s = geom.size_to_native(b.size());
            if s.width > 0.0 && s.height > 0.0 {
                key = key.with_size(s.width, s.height);
            }
        }
        entry.keyframes.insert(key)?;
        entry.smoothed_size = bounds.map(|b| b.size());
        entry.manual_override = true;
        if let Some(auto) = entry.auto.as_mut() {
            auto.pending_resample = true;
        }
        tracing::debug!(id = %id, t, "manual reposition recorded");
        Ok(())
    }
}

impl AutoTracking {
    fn is_due(&self, t: f64, interval: f64) -> bool {
        !self.paused
            && !self.pending_resample
            && self.last_processed.is_none_or(|last| (t - last).abs() > interval)
    }
}

fn auto_step(
    entry: &mut TrackedEntry,
    id: &str,
    t: f64,
    frame: VideoFrame<'_>,
    geom: FrameGeometry,
    evidence: &Evidence<'_>,
    opts: &TrackerOpts,
) -> FramemarkResult<()> {
    let last = entry
        .keyframes
        .sample(t)
        .ok_or_else(|| FramemarkError::tracking("tracked annotation has no keyframes"))?;
    let last = Point::new(last.x, last.y);
    let Some(auto) = entry.auto.as_mut() else {
        return Ok(());
    };
    auto.last_processed = Some(t);

    let observation = match evidence {
        Evidence::Detector(None) => return Ok(()),
        Evidence::Detector(Some(dets)) => {
            let Some(closest) = find_closest_detection(dets, last) else {
                return Ok(());
            };
            let d = closest.detection;
            Observation {
                position: d.center(),
                size: Some(Size::new(d.width, d.height)),
                confidence: fused_confidence(&closest, geom.max_native_dim(), opts),
            }
        }
        Evidence::Color => match find_best_match(
            frame.pixels,
            geom.to_display(last),
            &auto.template,
            frame.display,
            opts.search_radius,
            &opts.tuning,
        ) {
            Some(m) => Observation {
                position: geom.to_native(m.position),
                size: None,
                confidence: m.confidence,
            },
            None => Observation {
                position: last,
                size: None,
                confidence: 0.0,
            },
        },
    };

    auto.last_confidence = observation.confidence;
    if observation.confidence > opts.pause_threshold {
        let mut key = TrackPoint::at(t, observation.position.x, observation.position.y);
        if let Some(s) = observation.size {
            key = key.with_size(s.width, s.height);
        }
        entry.keyframes.insert(key)?;
        entry.manual_override = false;
    } else {
        auto.paused = true;
        entry.manual_override = false;
        tracing::debug!(id = %id, confidence = observation.confidence, "auto-tracking paused");
    }
    Ok(())
}

/// Detector confidence, capped by proximity once the candidate is close enough.
fn fused_confidence(closest: &ClosestDetection, max_dim: f64, opts: &TrackerOpts) -> f64 {
    let radius = opts.snap_distance_ratio * max_dim;
    let by_distance = (1.0 - closest.distance / radius).max(0.0);
    if by_distance > opts.distance_gate {
        closest.detection.confidence.min(by_distance)
    } else {
        closest.detection.confidence
    }
}

fn apply_position(
    scene: &mut dyn SceneGraph,
    id: &str,
    entry: &mut TrackedEntry,
    t: f64,
    geom: FrameGeometry,
    smoothing: f64,
) {
    let Some(s) = entry.keyframes.sample(t) else {
        return;
    };
    if let (Some(w), Some(h)) = (s.width, s.height) {
        let target = geom.size_to_display(Size::new(w, h));
        let prev = entry
            .smoothed_size
            .or_else(|| scene.bounds(id).map(|b| b.size()))
            .unwrap_or(target);
        let next = Size::new(
            prev.width + (target.width - prev.width) * smoothing,
            prev.height + (target.height - prev.height) * smoothing,
        );
        entry.smoothed_size = Some(next);
        scene.resize(id, next);
    }
    scene.move_to(id, geom.to_display(Point::new(s.x, s.y)));
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/coordinator.rs"]
mod tests;
