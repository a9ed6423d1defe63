use image::RgbaImage;

use crate::foundation::core::{Canvas, FrameGeometry, Point, Size};

/// Empirical constants of the color matcher.
///
/// None of these are derived; they were tuned by eye on sports footage and are kept
/// configurable rather than baked into the search.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Mean per-channel difference that maps to zero confidence.
    pub cost_normalization: f64,
    /// Compare every Nth template pixel.
    pub sample_stride: usize,
    /// Smallest coarse-pass step in native pixels.
    pub min_coarse_step: i64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            cost_normalization: 150.0,
            sample_stride: 4,
            min_coarse_step: 4,
        }
    }
}

impl MatchTuning {
    /// Map a mean absolute difference to a confidence in `[0, 1]`.
    pub fn confidence_for_cost(&self, cost: f64) -> f64 {
        (1.0 - cost / self.cost_normalization).max(0.0)
    }
}

/// Pixel block sampled around a tracked point, in native pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    /// Sampled pixels.
    pub pixels: RgbaImage,
    /// Offset from the block's top-left corner to the sampled center.
    ///
    /// Differs from half the block size when the block was clamped at a frame edge.
    pub anchor: (f64, f64),
}

impl Template {
    /// Block width in native pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Block height in native pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Best match of a template near a previous position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    /// Matched center in display space.
    pub position: Point,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Mean absolute per-channel difference at the match.
    pub cost: f64,
}

fn geometry_for(frame: &RgbaImage, display: Size) -> Option<FrameGeometry> {
    let (width, height) = frame.dimensions();
    FrameGeometry::new(Canvas { width, height }, display.width, display.height)
}

/// Sample a template centered on a display-space point.
///
/// `radius` is in display pixels and scaled per axis into native space. Returns `None`
/// while the frame has no decoded dimensions or the clamped block is empty.
pub fn sample_template(
    frame: &RgbaImage,
    center: Point,
    display: Size,
    radius: f64,
) -> Option<Template> {
    let geom = geometry_for(frame, display)?;
    let c = geom.to_native(center);
    let rx = radius * geom.scale_x();
    let ry = radius * geom.scale_y();

    let (fw, fh) = (f64::from(frame.width()), f64::from(frame.height()));
    let x0 = (c.x - rx).floor().max(0.0);
    let y0 = (c.y - ry).floor().max(0.0);
    let x1 = (c.x + rx).ceil().min(fw);
    let y1 = (c.y + ry).ceil().min(fh);
    if !(x1 - x0 >= 1.0 && y1 - y0 >= 1.0) {
        return None;
    }

    let pixels = image::imageops::crop_imm(
        frame,
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    )
    .to_image();
    Some(Template {
        pixels,
        anchor: (c.x - x0, c.y - y0),
    })
}

/// Search around `last` (display space) for the region that best matches `template`.
///
/// A coarse grid covers `±search_radius` native pixels, then a fine grid covers one
/// coarse step around the coarse winner. Ties keep the first candidate in scan order.
/// Returns `None` when no candidate region fits inside the frame.
pub fn find_best_match(
    frame: &RgbaImage,
    last: Point,
    template: &Template,
    display: Size,
    search_radius: f64,
    tuning: &MatchTuning,
) -> Option<MatchResult> {
    let geom = geometry_for(frame, display)?;
    if template.width() == 0 || template.height() == 0 {
        return None;
    }
    let origin = geom.to_native(last);
    let radius = search_radius.max(0.0).round() as i64;
    let coarse_step = ((search_radius / 2.0).round() as i64).max(tuning.min_coarse_step.max(1));

    let mut best = (f64::INFINITY, origin);
    grid_search(frame, template, tuning, origin, radius, coarse_step, &mut best);
    if !best.0.is_finite() {
        return None;
    }

    let fine_step = (coarse_step / 4).max(1);
    let coarse_best = best.1;
    grid_search(frame, template, tuning, coarse_best, coarse_step, fine_step, &mut best);

    let (cost, native) = best;
    Some(MatchResult {
        position: geom.to_display(native),
        confidence: tuning.confidence_for_cost(cost),
        cost,
    })
}

fn grid_search(
    frame: &RgbaImage,
    template: &Template,
    tuning: &MatchTuning,
    center: Point,
    radius: i64,
    step: i64,
    best: &mut (f64, Point),
) {
    let mut dy = -radius;
    while dy <= radius {
        let mut dx = -radius;
        while dx <= radius {
            let candidate = Point::new(center.x + dx as f64, center.y + dy as f64);
            let cost = region_cost(frame, template, tuning, candidate);
            if cost < best.0 {
                *best = (cost, candidate);
            }
            dx += step;
        }
        dy += step;
    }
}

/// Mean absolute RGB difference between the template and the frame region centered on
/// `candidate`; infinite when the region leaves the frame.
pub(crate) fn region_cost(
    frame: &RgbaImage,
    template: &Template,
    tuning: &MatchTuning,
    candidate: Point,
) -> f64 {
    let (tw, th) = template.pixels.dimensions();
    let x0 = (candidate.x - template.anchor.0).round() as i64;
    let y0 = (candidate.y - template.anchor.1).round() as i64;
    if x0 < 0
        || y0 < 0
        || x0 + i64::from(tw) > i64::from(frame.width())
        || y0 + i64::from(th) > i64::from(frame.height())
    {
        return f64::INFINITY;
    }

    let total = (tw as usize) * (th as usize);
    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    for i in (0..total).step_by(tuning.sample_stride.max(1)) {
        let tx = (i % tw as usize) as u32;
        let ty = (i / tw as usize) as u32;
        let a = template.pixels.get_pixel(tx, ty).0;
        let b = frame.get_pixel(x0 as u32 + tx, y0 as u32 + ty).0;
        for ch in 0..3 {
            sum += u64::from(a[ch].abs_diff(b[ch]));
        }
        count += 1;
    }
    if count == 0 {
        return f64::INFINITY;
    }
    sum as f64 / (count * 3) as f64
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/template.rs"]
mod tests;
