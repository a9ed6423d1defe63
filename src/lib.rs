//! Framemark is the annotation core of a video analysis tool.
//!
//! Annotations are time-scoped drawings over a playing video. The public API is
//! session-oriented:
//!
//! - Create an [`AnnotationSession`] for a display canvas, with a [`TrackerCoordinator`]
//!   and [`SessionServices`]
//! - Draw annotations from gestures, erase, undo and redo
//! - Call [`AnnotationSession::tick`] on every playback time update; visibility, fades
//!   and keyframe tracking (detector or color matching) follow
//! - Exchange annotations as an [`AnnotationPackage`], rescaled to the target canvas
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod annotation;
pub(crate) mod media;
pub(crate) mod package;
pub(crate) mod scene;
pub(crate) mod services;
pub(crate) mod session;
pub(crate) mod tracking;

pub use crate::foundation::core::{BezPath, Canvas, FrameGeometry, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{FramemarkError, FramemarkResult};

pub use crate::animation::fade::{FADE_IN_FLOOR, FADE_OUT_FLOOR, FadeWindow};
pub use crate::animation::keyframes::{KeyframeTrack, Lerp, Sampled, TrackPoint, position_at};
pub use crate::annotation::erase::erase_hits;
pub use crate::annotation::history::{EditAction, Entry, History};
pub use crate::annotation::layers::{Layer, LayerStack};
pub use crate::annotation::model::{Annotation, LayerId, ToolType};
pub use crate::annotation::store::AnnotationStore;
pub use crate::annotation::visibility::{Presence, Visibility};
pub use crate::media::video::{
    VideoInfo, decode_frame, decode_frames, frame_from_rgba8, frame_times, probe_video,
};
pub use crate::package::codec::{
    export_package, from_json, prepare_import, read_package, to_json, write_package,
};
pub use crate::package::model::{AnnotationPackage, PACKAGE_VERSION, PackagedAnnotation};
pub use crate::scene::graph::{Scene, SceneGraph, SceneNode};
pub use crate::scene::shape::{
    CircleShape, CurveShape, EllipseShape, GroupShape, LineShape, PolylineShape, RectShape,
    Shape, ShapeKind, Style, TextShape,
};
pub use crate::services::notify::{Notice, Notifications, Severity};
pub use crate::services::tools::{Gesture, ShapeBuilder, ToolRegistry};
pub use crate::session::workspace::{AnnotationSession, SessionServices};
#[cfg(feature = "onnx")]
pub use crate::tracking::backend::OnnxBackend;
pub use crate::tracking::backend::InferenceBackend;
pub use crate::tracking::coordinator::{
    TrackerCoordinator, TrackerOpts, TrackerStatus, VideoFrame,
};
pub use crate::tracking::detector::{
    ClosestDetection, Detection, DetectorConfig, Letterbox, ObjectDetector, decode_output,
    find_closest_detection, iou, non_max_suppression, preprocess,
};
pub use crate::tracking::slot::{DetectionSlot, Dispatch};
pub use crate::tracking::template::{
    MatchResult, MatchTuning, Template, find_best_match, sample_template,
};
