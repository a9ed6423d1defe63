use std::collections::BTreeSet;

use crate::annotation::model::{Annotation, LayerId, ToolType};
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::scene::shape::Shape;

/// Package format version written by this crate and accepted on import.
pub const PACKAGE_VERSION: u32 = 1;

/// Portable set of annotations with the canvas size they were drawn on.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPackage {
    /// Format version.
    pub version: u32,
    /// Export time, Unix milliseconds.
    pub exported_at: u64,
    /// Canvas the geometry is expressed in.
    pub source_dimensions: Canvas,
    /// Annotations in store order.
    pub annotations: Vec<PackagedAnnotation>,
}

/// One annotation with its shape geometry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagedAnnotation {
    /// Annotation id.
    pub id: String,
    /// Inclusive start time in seconds.
    pub start_time: f64,
    /// Inclusive end time in seconds.
    pub end_time: f64,
    /// Layer id.
    pub layer: LayerId,
    /// Producing tool.
    pub tool_type: ToolType,
    /// Optional fade-in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<f64>,
    /// Optional fade-out seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<f64>,
    /// Shape geometry and styling.
    pub shape_data: Shape,
}

impl PackagedAnnotation {
    /// Pack an annotation with its shape.
    pub fn new(annotation: &Annotation, shape: Shape) -> Self {
        Self {
            id: annotation.id.clone(),
            start_time: annotation.start_time,
            end_time: annotation.end_time,
            layer: annotation.layer,
            tool_type: annotation.tool,
            fade_in: annotation.fade_in,
            fade_out: annotation.fade_out,
            shape_data: shape,
        }
    }

    /// Split back into an annotation and its shape.
    pub fn into_parts(self) -> (Annotation, Shape) {
        let annotation = Annotation {
            id: self.id,
            tool: self.tool_type,
            start_time: self.start_time,
            end_time: self.end_time,
            fade_in: self.fade_in,
            fade_out: self.fade_out,
            layer: self.layer,
        };
        (annotation, self.shape_data)
    }
}

impl AnnotationPackage {
    /// Empty package for `source` dimensions.
    pub fn new(source_dimensions: Canvas, exported_at: u64) -> Self {
        Self {
            version: PACKAGE_VERSION,
            exported_at,
            source_dimensions,
            annotations: Vec::new(),
        }
    }

    /// Check version, dimensions, ids, windows, fades and geometry.
    pub fn validate(&self) -> FramemarkResult<()> {
        if self.version != PACKAGE_VERSION {
            return Err(FramemarkError::package(format!(
                "unsupported package version {} (expected {PACKAGE_VERSION})",
                self.version
            )));
        }
        if self.source_dimensions.is_empty() {
            return Err(FramemarkError::package(
                "sourceDimensions width/height must be > 0",
            ));
        }

        let mut seen = BTreeSet::new();
        for a in &self.annotations {
            if !seen.insert(a.id.as_str()) {
                return Err(FramemarkError::package(format!(
                    "duplicate annotation id '{}'",
                    a.id
                )));
            }
            let (annotation, shape) = a.clone().into_parts();
            annotation
                .validate()
                .map_err(|e| FramemarkError::package(e.to_string()))?;
            if !shape.is_finite() || !shape.has_finite_extent() {
                return Err(FramemarkError::package(format!(
                    "annotation '{}' has non-finite geometry",
                    a.id
                )));
            }
        }
        Ok(())
    }

    /// Rescale every geometric field from `source_dimensions` to `target`.
    ///
    /// Positions and sizes scale per axis; radii and font sizes follow the smaller
    /// factor. Stroke widths are left alone. No-op when the dimensions match.
    pub fn rescale_to(&mut self, target: Canvas) {
        if target == self.source_dimensions
            || target.is_empty()
            || self.source_dimensions.is_empty()
        {
            return;
        }
        let sx = f64::from(target.width) / f64::from(self.source_dimensions.width);
        let sy = f64::from(target.height) / f64::from(self.source_dimensions.height);
        for a in &mut self.annotations {
            a.shape_data.scale_about(Point::ZERO, sx, sy);
        }
        self.source_dimensions = target;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/package/model.rs"]
mod tests;
