use crate::foundation::core::{Point, Rect, Size, Vec2};

/// Stroke/fill styling shared by every shape kind.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Style {
    /// Stroke color as straight-alpha RGBA8.
    pub stroke_rgba8: [u8; 4],
    /// Stroke width in canvas pixels.
    pub stroke_width: f64,
    /// Optional fill color as straight-alpha RGBA8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_rgba8: Option<[u8; 4]>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_rgba8: [255, 214, 0, 255],
            stroke_width: 4.0,
            fill_rgba8: None,
        }
    }
}

/// A styled visual primitive (or group of primitives).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    /// Geometry payload.
    pub kind: ShapeKind,
    /// Stroke/fill styling.
    #[serde(default)]
    pub style: Style,
}

/// Closed set of geometry payloads a visual can carry.
///
/// All coordinates are absolute canvas pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rect(RectShape),
    /// Circle.
    Circle(CircleShape),
    /// Axis-aligned ellipse.
    Ellipse(EllipseShape),
    /// Straight segment.
    Line(LineShape),
    /// Quadratic curve segment.
    Curve(CurveShape),
    /// Polyline (freehand strokes, arrow heads).
    Polyline(PolylineShape),
    /// Single-line text label.
    Text(TextShape),
    /// Z-ordered list of child shapes (first child drawn first).
    Group(GroupShape),
}

/// Rectangle payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectShape {
    /// Top-left corner.
    pub position: Point,
    /// Width/height.
    pub size: Size,
}

/// Circle payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleShape {
    /// Center.
    pub position: Point,
    /// Radius.
    pub radius: f64,
}

/// Ellipse payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EllipseShape {
    /// Center.
    pub position: Point,
    /// Per-axis radii.
    pub radius: Vec2,
}

/// Line payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineShape {
    /// Start point.
    pub position: Point,
    /// End point.
    pub end: Point,
}

/// Quadratic curve payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveShape {
    /// Start point.
    pub position: Point,
    /// Control point.
    pub control: Point,
    /// End point.
    pub end: Point,
}

/// Polyline payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PolylineShape {
    /// Vertices in drawing order.
    pub points: Vec<Point>,
    /// Close the outline back to the first vertex.
    #[serde(default)]
    pub closed: bool,
}

/// Text payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextShape {
    /// Top-left anchor.
    pub position: Point,
    /// UTF-8 content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
}

/// Group payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupShape {
    /// Children in z-order.
    pub children: Vec<Shape>,
}

// Rough advance width of one glyph relative to the font size.
const TEXT_ADVANCE: f64 = 0.6;
const TEXT_LINE_HEIGHT: f64 = 1.2;

impl Shape {
    /// Shape with default styling.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            style: Style::default(),
        }
    }

    /// Replace styling.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Axis-aligned geometric bounds (stroke width not included).
    pub fn bounds(&self) -> Rect {
        self.kind.bounds()
    }

    /// Center of [`Shape::bounds`].
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Return `true` when every coordinate, size and the stroke width are finite.
    pub fn is_finite(&self) -> bool {
        self.style.stroke_width.is_finite() && self.kind.is_finite()
    }

    /// Return `true` when the bounds, their center and their size are all finite.
    ///
    /// Finite fields can still overflow once combined (`position + size`).
    pub fn has_finite_extent(&self) -> bool {
        let b = self.bounds();
        b.is_finite() && b.center().is_finite() && b.size().is_finite()
    }

    /// Translate by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.kind.map_points(&mut |p| p + delta);
    }

    /// Move so the bounds center lands on `center`.
    pub fn move_center_to(&mut self, center: Point) {
        let delta = center - self.center();
        if delta != Vec2::ZERO {
            self.translate(delta);
        }
    }

    /// Scale geometry about `origin` by independent X/Y factors.
    ///
    /// Scalar radii and font sizes follow the smaller factor.
    pub fn scale_about(&mut self, origin: Point, sx: f64, sy: f64) {
        let scale = move |p: Point| {
            Point::new(origin.x + (p.x - origin.x) * sx, origin.y + (p.y - origin.y) * sy)
        };
        self.kind.scale_with(&scale, sx, sy);
    }

    /// Resize so the bounds match `size`, keeping the center fixed.
    ///
    /// Degenerate bounds (zero width or height) keep that axis unchanged.
    pub fn resize(&mut self, size: Size) {
        let b = self.bounds();
        let sx = if b.width() > 0.0 {
            size.width / b.width()
        } else {
            1.0
        };
        let sy = if b.height() > 0.0 {
            size.height / b.height()
        } else {
            1.0
        };
        self.scale_about(b.center(), sx, sy);
    }
}

impl ShapeKind {
    /// Axis-aligned geometric bounds.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) => Rect::from_origin_size(r.position, r.size).abs(),
            Self::Circle(c) => Rect::from_center_size(
                c.position,
                Size::new(c.radius.abs() * 2.0, c.radius.abs() * 2.0),
            ),
            Self::Ellipse(e) => Rect::from_center_size(
                e.position,
                Size::new(e.radius.x.abs() * 2.0, e.radius.y.abs() * 2.0),
            ),
            Self::Line(l) => Rect::from_points(l.position, l.end),
            // Control polygon hull: conservative, never smaller than the curve.
            Self::Curve(c) => Rect::from_points(c.position, c.end).union_pt(c.control),
            Self::Polyline(p) => points_bounds(&p.points),
            Self::Text(t) => Rect::from_origin_size(
                t.position,
                Size::new(
                    t.content.chars().count() as f64 * t.font_size * TEXT_ADVANCE,
                    t.font_size * TEXT_LINE_HEIGHT,
                ),
            ),
            Self::Group(g) => g
                .children
                .iter()
                .map(Shape::bounds)
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Self::Rect(r) => r.position.is_finite() && r.size.is_finite(),
            Self::Circle(c) => c.position.is_finite() && c.radius.is_finite(),
            Self::Ellipse(e) => e.position.is_finite() && e.radius.is_finite(),
            Self::Line(l) => l.position.is_finite() && l.end.is_finite(),
            Self::Curve(c) => c.position.is_finite() && c.control.is_finite() && c.end.is_finite(),
            Self::Polyline(p) => p.points.iter().all(|pt| pt.is_finite()),
            Self::Text(t) => t.position.is_finite() && t.font_size.is_finite(),
            Self::Group(g) => g.children.iter().all(Shape::is_finite),
        }
    }

    fn map_points(&mut self, f: &mut dyn FnMut(Point) -> Point) {
        match self {
            Self::Rect(r) => r.position = f(r.position),
            Self::Circle(c) => c.position = f(c.position),
            Self::Ellipse(e) => e.position = f(e.position),
            Self::Line(l) => {
                l.position = f(l.position);
                l.end = f(l.end);
            }
            Self::Curve(c) => {
                c.position = f(c.position);
                c.control = f(c.control);
                c.end = f(c.end);
            }
            Self::Polyline(p) => {
                for pt in &mut p.points {
                    *pt = f(*pt);
                }
            }
            Self::Text(t) => t.position = f(t.position),
            Self::Group(g) => {
                for child in &mut g.children {
                    child.kind.map_points(f);
                }
            }
        }
    }

    /// Apply `map` to every point and scale sizes/radii/font sizes by `sx`/`sy`,
    /// recursing into groups.
    pub(crate) fn scale_with(&mut self, map: &dyn Fn(Point) -> Point, sx: f64, sy: f64) {
        let uniform = sx.min(sy);
        match self {
            Self::Rect(r) => {
                r.position = map(r.position);
                r.size = Size::new(r.size.width * sx, r.size.height * sy);
            }
            Self::Circle(c) => {
                c.position = map(c.position);
                c.radius *= uniform;
            }
            Self::Ellipse(e) => {
                e.position = map(e.position);
                e.radius = Vec2::new(e.radius.x * sx, e.radius.y * sy);
            }
            Self::Text(t) => {
                t.position = map(t.position);
                t.font_size *= uniform;
            }
            Self::Group(g) => {
                for child in &mut g.children {
                    child.kind.scale_with(map, sx, sy);
                }
            }
            Self::Line(_) | Self::Curve(_) | Self::Polyline(_) => {
                self.map_points(&mut |p| map(p));
            }
        }
    }
}

fn points_bounds(points: &[Point]) -> Rect {
    let mut it = points.iter();
    let Some(&first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(Rect::from_points(first, first), |r, &p| r.union_pt(p))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shape.rs"]
mod tests;
