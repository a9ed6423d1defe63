use crate::foundation::error::{FramemarkError, FramemarkResult};

pub use kurbo::{BezPath, Point, Rect, Size, Vec2};

/// Pixel dimensions of a drawing surface or a decoded video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create validated dimensions (both sides non-zero).
    pub fn new(width: u32, height: u32) -> FramemarkResult<Self> {
        if width == 0 || height == 0 {
            return Err(FramemarkError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Return `true` when either side is zero (nothing decoded yet).
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Larger of width and height, in pixels.
    pub fn max_dim(self) -> f64 {
        f64::from(self.width.max(self.height))
    }
}

/// Mapping between the on-screen display space and the video-native pixel space.
///
/// X and Y scale independently: a video stretched into a display box keeps
/// its native pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    /// Intrinsic decoded video size.
    pub native: Canvas,
    /// Width of the display box the video is drawn into.
    pub display_w: f64,
    /// Height of the display box the video is drawn into.
    pub display_h: f64,
}

impl FrameGeometry {
    /// Build a mapping. Returns `None` while the video has no decoded dimensions or the
    /// display box is degenerate.
    pub fn new(native: Canvas, display_w: f64, display_h: f64) -> Option<Self> {
        if native.is_empty() {
            return None;
        }
        if !(display_w.is_finite() && display_h.is_finite()) || display_w <= 0.0 || display_h <= 0.0
        {
            return None;
        }
        Some(Self {
            native,
            display_w,
            display_h,
        })
    }

    /// Identity mapping: display space equals native space.
    pub fn identity(native: Canvas) -> Option<Self> {
        Self::new(native, f64::from(native.width), f64::from(native.height))
    }

    /// Native pixels per display pixel along X.
    pub fn scale_x(&self) -> f64 {
        f64::from(self.native.width) / self.display_w
    }

    /// Native pixels per display pixel along Y.
    pub fn scale_y(&self) -> f64 {
        f64::from(self.native.height) / self.display_h
    }

    /// Map a display-space point into native pixel space.
    pub fn to_native(&self, p: Point) -> Point {
        Point::new(p.x * self.scale_x(), p.y * self.scale_y())
    }

    /// Map a native pixel-space point into display space.
    pub fn to_display(&self, p: Point) -> Point {
        Point::new(p.x / self.scale_x(), p.y / self.scale_y())
    }

    /// Map a native size into display space.
    pub fn size_to_display(&self, s: Size) -> Size {
        Size::new(s.width / self.scale_x(), s.height / self.scale_y())
    }

    /// Map a display size into native space.
    pub fn size_to_native(&self, s: Size) -> Size {
        Size::new(s.width * self.scale_x(), s.height * self.scale_y())
    }

    /// Larger native dimension, used for distance gates.
    pub fn max_native_dim(&self) -> f64 {
        self.native.max_dim()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
