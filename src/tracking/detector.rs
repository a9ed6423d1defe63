use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::RgbaImage;
use image::imageops::FilterType;

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::tracking::backend::InferenceBackend;

/// Detector tunables.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// ONNX model file; `None` leaves the detector unavailable.
    pub model_path: Option<PathBuf>,
    /// Side of the square model input.
    pub input_size: u32,
    /// Number of class score rows in the model output.
    pub num_classes: usize,
    /// Class kept after decoding (COCO `0` = person).
    pub target_class: usize,
    /// Scores must exceed this to survive decoding.
    pub confidence_threshold: f32,
    /// Overlap above which the weaker of two boxes is suppressed.
    pub nms_iou_threshold: f64,
    /// Minimum wall-clock gap between two inference runs.
    pub min_interval_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_size: 640,
            num_classes: 80,
            target_class: 0,
            confidence_threshold: 0.5,
            nms_iou_threshold: 0.45,
            min_interval_ms: 100,
        }
    }
}

/// Center-format bounding box in native frame pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    /// Box center X.
    pub x: f64,
    /// Box center Y.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Best class score.
    pub confidence: f64,
    /// Best class index.
    pub class_id: usize,
}

impl Detection {
    /// Box center.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Axis-aligned corner rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.center(), (self.width, self.height))
    }
}

/// Detection nearest to a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestDetection {
    /// The detection.
    pub detection: Detection,
    /// Euclidean distance from the query point, native pixels.
    pub distance: f64,
}

/// Aspect-preserving fit of a frame into the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    /// Native-to-input scale factor.
    pub scale: f64,
    /// Left padding in input pixels.
    pub pad_x: u32,
    /// Top padding in input pixels.
    pub pad_y: u32,
    /// Resized content width.
    pub content_w: u32,
    /// Resized content height.
    pub content_h: u32,
    /// Side of the square input.
    pub input_size: u32,
}

impl Letterbox {
    /// Fit `native_w x native_h` into `input_size` squared, centered.
    pub fn fit(native_w: u32, native_h: u32, input_size: u32) -> Option<Self> {
        if native_w == 0 || native_h == 0 || input_size == 0 {
            return None;
        }
        let s = f64::from(input_size);
        let scale = (s / f64::from(native_w)).min(s / f64::from(native_h));
        let content_w = ((f64::from(native_w) * scale).round() as u32).clamp(1, input_size);
        let content_h = ((f64::from(native_h) * scale).round() as u32).clamp(1, input_size);
        Some(Self {
            scale,
            pad_x: (input_size - content_w) / 2,
            pad_y: (input_size - content_h) / 2,
            content_w,
            content_h,
            input_size,
        })
    }

    /// Map a center-format box from model-input space back to native space.
    pub fn to_native(&self, cx: f64, cy: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        (
            (cx - f64::from(self.pad_x)) / self.scale,
            (cy - f64::from(self.pad_y)) / self.scale,
            w / self.scale,
            h / self.scale,
        )
    }
}

/// Letterbox `frame` and flatten it into a planar RGB tensor in `[0, 1]`.
pub fn preprocess(frame: &RgbaImage, lb: &Letterbox) -> Vec<f32> {
    let resized = image::imageops::resize(frame, lb.content_w, lb.content_h, FilterType::Triangle);
    let side = lb.input_size as usize;
    let plane = side * side;
    let mut chw = vec![0.0f32; 3 * plane];
    for (x, y, px) in resized.enumerate_pixels() {
        let idx = (y + lb.pad_y) as usize * side + (x + lb.pad_x) as usize;
        for c in 0..3 {
            chw[c * plane + idx] = f32::from(px[c]) / 255.0;
        }
    }
    chw
}

/// Decode a `[4 + classes, candidates]` output tensor into target-class detections.
///
/// Runs non-max suppression on the survivors.
pub fn decode_output(
    output: &[f32],
    config: &DetectorConfig,
    lb: &Letterbox,
) -> FramemarkResult<Vec<Detection>> {
    let rows = 4 + config.num_classes;
    if config.num_classes == 0 || output.len() % rows != 0 {
        return Err(FramemarkError::detection(format!(
            "output length {} is not a multiple of {rows} rows",
            output.len()
        )));
    }
    let cols = output.len() / rows;
    let at = |row: usize, col: usize| output[row * cols + col];

    let mut candidates = Vec::new();
    for col in 0..cols {
        let mut best_class = 0;
        let mut best_score = at(4, col);
        for class in 1..config.num_classes {
            let score = at(4 + class, col);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if best_class != config.target_class || !(best_score > config.confidence_threshold) {
            continue;
        }

        let (x, y, width, height) = lb.to_native(
            f64::from(at(0, col)),
            f64::from(at(1, col)),
            f64::from(at(2, col)),
            f64::from(at(3, col)),
        );
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            continue;
        }
        candidates.push(Detection {
            x,
            y,
            width,
            height,
            confidence: f64::from(best_score),
            class_id: best_class,
        });
    }

    Ok(non_max_suppression(candidates, config.nms_iou_threshold))
}

/// Intersection over union of two center-format boxes.
pub fn iou(a: &Detection, b: &Detection) -> f64 {
    let inter = a.rect().intersect(b.rect()).area();
    let union = a.rect().area() + b.rect().area() - inter;
    if union > 0.0 { inter / union } else { 0.0 }
}

/// Greedy non-max suppression, highest confidence first.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for d in detections {
        if kept.iter().all(|k| iou(k, &d) <= iou_threshold) {
            kept.push(d);
        }
    }
    kept
}

/// Nearest detection to `p` by Euclidean distance; `None` on empty input.
pub fn find_closest_detection(detections: &[Detection], p: Point) -> Option<ClosestDetection> {
    detections
        .iter()
        .map(|d| ClosestDetection {
            detection: *d,
            distance: d.center().distance(p),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Throttled single-class object detector.
///
/// Every method is a no-op while no backend is loaded; callers only need
/// [`ObjectDetector::is_loaded`].
pub struct ObjectDetector {
    config: DetectorConfig,
    backend: Option<Box<dyn InferenceBackend>>,
    load_attempted: bool,
    last_run: Option<Instant>,
}

impl std::fmt::Debug for ObjectDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDetector")
            .field("config", &self.config)
            .field("loaded", &self.backend.is_some())
            .finish()
    }
}

impl ObjectDetector {
    /// Create an unloaded detector.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            backend: None,
            load_attempted: false,
            last_run: None,
        }
    }

    /// Create a detector around an already constructed backend.
    pub fn with_backend(config: DetectorConfig, backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            config,
            backend: Some(backend),
            load_attempted: true,
            last_run: None,
        }
    }

    /// Detector tunables.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Try to load the model once. A failed load is final for this detector.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self) -> bool {
        if self.backend.is_some() {
            return true;
        }
        if self.load_attempted {
            return false;
        }
        self.load_attempted = true;
        self.backend = load_backend(&self.config);
        self.backend.is_some()
    }

    /// Whether inference is available.
    pub fn is_loaded(&self) -> bool {
        self.backend.is_some()
    }

    /// Detect target-class objects in a native-resolution frame.
    ///
    /// Returns an empty list when unloaded, throttled, or when inference fails.
    pub fn detect_all(&mut self, frame: &RgbaImage) -> Vec<Detection> {
        self.detect_all_at(frame, Instant::now())
    }

    /// [`ObjectDetector::detect_all`] against an explicit clock reading.
    pub fn detect_all_at(&mut self, frame: &RgbaImage, now: Instant) -> Vec<Detection> {
        self.try_detect_at(frame, now).unwrap_or_default()
    }

    /// `None` when no inference ran (unloaded or throttled); `Some` otherwise, empty
    /// on a failed pass.
    pub(crate) fn try_detect_at(
        &mut self,
        frame: &RgbaImage,
        now: Instant,
    ) -> Option<Vec<Detection>> {
        if self.backend.is_none() {
            return None;
        }
        let interval = Duration::from_millis(self.config.min_interval_ms);
        if let Some(last) = self.last_run
            && now.saturating_duration_since(last) < interval
        {
            return None;
        }
        self.last_run = Some(now);

        match self.run(frame) {
            Ok(detections) => {
                tracing::trace!(count = detections.len(), "detection pass");
                Some(detections)
            }
            Err(err) => {
                tracing::warn!(error = %err, "detection pass failed");
                Some(Vec::new())
            }
        }
    }

    fn run(&mut self, frame: &RgbaImage) -> FramemarkResult<Vec<Detection>> {
        let (w, h) = frame.dimensions();
        let lb = Letterbox::fit(w, h, self.config.input_size)
            .ok_or_else(|| FramemarkError::detection("frame has no decoded dimensions"))?;
        let input = preprocess(frame, &lb);
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| FramemarkError::detection("detector not loaded"))?;
        let output = backend.infer(&input, self.config.input_size)?;
        decode_output(&output, &self.config, &lb)
    }
}

#[cfg(feature = "onnx")]
fn load_backend(config: &DetectorConfig) -> Option<Box<dyn InferenceBackend>> {
    let Some(path) = config.model_path.as_deref() else {
        tracing::debug!("no detector model configured");
        return None;
    };
    match crate::tracking::backend::OnnxBackend::load(path) {
        Ok(backend) => Some(Box::new(backend)),
        Err(err) => {
            tracing::warn!(error = %err, "detector unavailable, using color matching");
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_backend(_config: &DetectorConfig) -> Option<Box<dyn InferenceBackend>> {
    tracing::debug!("built without the onnx feature; detector unavailable");
    None
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/detector.rs"]
mod tests;
