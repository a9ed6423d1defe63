use crate::animation::fade::FadeWindow;
use crate::foundation::error::{FramemarkError, FramemarkResult};

/// Drawing tool that produced an annotation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Freehand stroke.
    Freehand,
    /// Straight line.
    Line,
    /// Straight arrow.
    Arrow,
    /// Curved arrow.
    CurvedArrow,
    /// Rectangle.
    Rectangle,
    /// Circle or ellipse.
    Circle,
    /// Text label.
    Text,
    /// Dimmed backdrop with a bright focus region.
    Spotlight,
    /// Zoomed inset.
    Magnifier,
    /// Marker that follows a player across frames.
    PlayerTracker,
}

impl ToolType {
    /// Every tool, in toolbar order.
    pub const ALL: [ToolType; 10] = [
        Self::Freehand,
        Self::Line,
        Self::Arrow,
        Self::CurvedArrow,
        Self::Rectangle,
        Self::Circle,
        Self::Text,
        Self::Spotlight,
        Self::Magnifier,
        Self::PlayerTracker,
    ];

    /// Return `true` for tools whose position is driven by the tracker.
    pub fn is_tracked(self) -> bool {
        matches!(self, Self::PlayerTracker)
    }
}

/// Layer id.
pub type LayerId = u32;

/// A time-scoped markup object. Its visual lives in the scene under the same id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    /// Unique id.
    pub id: String,
    /// Producing tool.
    pub tool: ToolType,
    /// Inclusive start time in seconds.
    pub start_time: f64,
    /// Inclusive end time in seconds (`> start_time`).
    pub end_time: f64,
    /// Optional fade-in duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<f64>,
    /// Optional fade-out duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<f64>,
    /// Owning layer.
    pub layer: LayerId,
}

impl Annotation {
    /// Annotation on `layer` spanning `[start_time, end_time]` without fades.
    pub fn new(
        id: impl Into<String>,
        tool: ToolType,
        start_time: f64,
        end_time: f64,
        layer: LayerId,
    ) -> FramemarkResult<Self> {
        let a = Self {
            id: id.into(),
            tool,
            start_time,
            end_time,
            fade_in: None,
            fade_out: None,
            layer,
        };
        a.validate()?;
        Ok(a)
    }

    /// Set fade durations.
    pub fn with_fades(mut self, fade_in: Option<f64>, fade_out: Option<f64>) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    /// Lifetime window used for visibility and fades.
    pub fn window(&self) -> FadeWindow {
        FadeWindow {
            start: self.start_time,
            end: self.end_time,
            fade_in: self.fade_in.unwrap_or(0.0),
            fade_out: self.fade_out.unwrap_or(0.0),
        }
    }

    /// Validate id, window and fades.
    pub fn validate(&self) -> FramemarkResult<()> {
        if self.id.trim().is_empty() {
            return Err(FramemarkError::validation("annotation id must be non-empty"));
        }
        validate_window(&self.id, self.start_time, self.end_time)?;
        for (name, fade) in [("fade_in", self.fade_in), ("fade_out", self.fade_out)] {
            if let Some(v) = fade
                && (!v.is_finite() || v < 0.0)
            {
                return Err(FramemarkError::validation(format!(
                    "annotation '{}' {name} must be finite and >= 0",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_window(id: &str, start: f64, end: f64) -> FramemarkResult<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(FramemarkError::validation(format!(
            "annotation '{id}' times must be finite"
        )));
    }
    if end <= start {
        return Err(FramemarkError::validation(format!(
            "annotation '{id}' end_time must be > start_time"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/model.rs"]
mod tests;
