use std::collections::BTreeMap;

use crate::annotation::model::ToolType;
use crate::foundation::core::{Point, Rect, Vec2};
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::scene::shape::{
    CircleShape, CurveShape, EllipseShape, GroupShape, LineShape, PolylineShape, RectShape, Shape,
    ShapeKind, Style, TextShape,
};

/// A completed drawing gesture in display coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gesture {
    /// Pointer samples, first press to release.
    pub points: Vec<Point>,
    /// Text content for text tools.
    pub text: Option<String>,
    /// Styling picked in the toolbar.
    pub style: Style,
}

impl Gesture {
    /// Gesture from pointer samples with default styling.
    pub fn from_points(points: impl Into<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
            ..Self::default()
        }
    }

    fn first(&self) -> FramemarkResult<Point> {
        self.points
            .first()
            .copied()
            .ok_or_else(|| FramemarkError::validation("gesture has no points"))
    }

    fn endpoints(&self) -> FramemarkResult<(Point, Point)> {
        match (self.points.first(), self.points.last()) {
            (Some(&a), Some(&b)) if self.points.len() >= 2 => Ok((a, b)),
            _ => Err(FramemarkError::validation("gesture needs at least two points")),
        }
    }
}

/// Turns a gesture into a shape.
pub type ShapeBuilder = Box<dyn Fn(&Gesture) -> FramemarkResult<Shape> + Send + Sync>;

const ARROW_HEAD_ANGLE: f64 = 25.0 * std::f64::consts::PI / 180.0;
const DEFAULT_FONT_SIZE: f64 = 24.0;
const MIN_RADIUS: f64 = 10.0;
const DEFAULT_TRACKER_RADII: Vec2 = Vec2::new(20.0, 20.0);

/// Map from tool to shape builder. Constructed explicitly and passed to the session.
pub struct ToolRegistry {
    builders: BTreeMap<ToolType, ShapeBuilder>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ToolRegistry {
    /// Registry without any tools.
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with a builder for every [`ToolType`].
    pub fn with_defaults() -> Self {
        let mut r = Self::empty();
        r.register(ToolType::Freehand, freehand);
        r.register(ToolType::Line, line);
        r.register(ToolType::Arrow, arrow);
        r.register(ToolType::CurvedArrow, curved_arrow);
        r.register(ToolType::Rectangle, rectangle);
        r.register(ToolType::Circle, ellipse);
        r.register(ToolType::Text, text);
        r.register(ToolType::Spotlight, spotlight);
        r.register(ToolType::Magnifier, magnifier);
        r.register(ToolType::PlayerTracker, player_tracker);
        r
    }

    /// Register or replace the builder for `tool`.
    pub fn register<F>(&mut self, tool: ToolType, builder: F)
    where
        F: Fn(&Gesture) -> FramemarkResult<Shape> + Send + Sync + 'static,
    {
        self.builders.insert(tool, Box::new(builder));
    }

    /// Whether `tool` has a builder.
    pub fn contains(&self, tool: ToolType) -> bool {
        self.builders.contains_key(&tool)
    }

    /// Registered tools, in toolbar order.
    pub fn tools(&self) -> impl Iterator<Item = ToolType> + '_ {
        self.builders.keys().copied()
    }

    /// Build the shape for a completed gesture.
    pub fn build(&self, tool: ToolType, gesture: &Gesture) -> FramemarkResult<Shape> {
        let builder = self
            .builders
            .get(&tool)
            .ok_or_else(|| FramemarkError::validation(format!("no builder for tool {tool:?}")))?;
        let shape = builder(gesture)?;
        if !shape.is_finite() {
            return Err(FramemarkError::validation("gesture produced non-finite geometry"));
        }
        Ok(shape)
    }
}

fn styled(kind: ShapeKind, g: &Gesture) -> Shape {
    Shape::new(kind).with_style(g.style)
}

fn freehand(g: &Gesture) -> FramemarkResult<Shape> {
    g.endpoints()?;
    Ok(styled(
        ShapeKind::Polyline(PolylineShape {
            points: g.points.clone(),
            closed: false,
        }),
        g,
    ))
}

fn line(g: &Gesture) -> FramemarkResult<Shape> {
    let (position, end) = g.endpoints()?;
    Ok(styled(ShapeKind::Line(LineShape { position, end }), g))
}

/// Open three-point arrow head at `tip`, pointing along `dir`.
fn arrow_head(tip: Point, dir: Vec2, stroke_width: f64) -> ShapeKind {
    let len = (stroke_width * 3.0).max(MIN_RADIUS);
    let back = if dir.hypot() > 0.0 {
        -dir.normalize() * len
    } else {
        Vec2::new(-len, 0.0)
    };
    let (s, c) = ARROW_HEAD_ANGLE.sin_cos();
    let rotate = |v: Vec2, sin: f64| Vec2::new(v.x * c - v.y * sin, v.x * sin + v.y * c);
    ShapeKind::Polyline(PolylineShape {
        points: vec![tip + rotate(back, s), tip, tip + rotate(back, -s)],
        closed: false,
    })
}

fn arrow(g: &Gesture) -> FramemarkResult<Shape> {
    let (position, end) = g.endpoints()?;
    let head = arrow_head(end, end - position, g.style.stroke_width);
    Ok(styled(
        ShapeKind::Group(GroupShape {
            children: vec![
                styled(ShapeKind::Line(LineShape { position, end }), g),
                styled(head, g),
            ],
        }),
        g,
    ))
}

fn curved_arrow(g: &Gesture) -> FramemarkResult<Shape> {
    let (position, end) = g.endpoints()?;
    let control = if g.points.len() >= 3 {
        g.points[g.points.len() / 2]
    } else {
        let chord = end - position;
        position.midpoint(end) + Vec2::new(-chord.y, chord.x) * 0.2
    };
    let head = arrow_head(end, end - control, g.style.stroke_width);
    Ok(styled(
        ShapeKind::Group(GroupShape {
            children: vec![
                styled(
                    ShapeKind::Curve(CurveShape {
                        position,
                        control,
                        end,
                    }),
                    g,
                ),
                styled(head, g),
            ],
        }),
        g,
    ))
}

fn rectangle(g: &Gesture) -> FramemarkResult<Shape> {
    let (a, b) = g.endpoints()?;
    let r = Rect::from_points(a, b);
    Ok(styled(
        ShapeKind::Rect(RectShape {
            position: r.origin(),
            size: r.size(),
        }),
        g,
    ))
}

fn ellipse(g: &Gesture) -> FramemarkResult<Shape> {
    let (a, b) = g.endpoints()?;
    let r = Rect::from_points(a, b);
    Ok(styled(
        ShapeKind::Ellipse(EllipseShape {
            position: r.center(),
            radius: Vec2::new(r.width() / 2.0, r.height() / 2.0),
        }),
        g,
    ))
}

fn text(g: &Gesture) -> FramemarkResult<Shape> {
    let position = g.first()?;
    let content = g
        .text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FramemarkError::validation("text tool needs non-empty content"))?;
    Ok(styled(
        ShapeKind::Text(TextShape {
            position,
            content: content.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
        }),
        g,
    ))
}

fn drag_radius(g: &Gesture) -> FramemarkResult<(Point, f64)> {
    let center = g.first()?;
    let radius = g
        .points
        .last()
        .map(|p| p.distance(center))
        .unwrap_or(0.0)
        .max(MIN_RADIUS);
    Ok((center, radius))
}

fn spotlight(g: &Gesture) -> FramemarkResult<Shape> {
    let (position, radius) = drag_radius(g)?;
    let style = Style {
        fill_rgba8: Some([255, 255, 255, 48]),
        ..g.style
    };
    Ok(Shape::new(ShapeKind::Circle(CircleShape { position, radius })).with_style(style))
}

fn magnifier(g: &Gesture) -> FramemarkResult<Shape> {
    let (center, radius) = drag_radius(g)?;
    let handle_start = center + Vec2::new(radius, radius) * std::f64::consts::FRAC_1_SQRT_2;
    let handle_end = handle_start + Vec2::new(radius, radius) * 0.5;
    Ok(styled(
        ShapeKind::Group(GroupShape {
            children: vec![
                styled(
                    ShapeKind::Circle(CircleShape {
                        position: center,
                        radius,
                    }),
                    g,
                ),
                styled(
                    ShapeKind::Line(LineShape {
                        position: handle_start,
                        end: handle_end,
                    }),
                    g,
                ),
            ],
        }),
        g,
    ))
}

fn player_tracker(g: &Gesture) -> FramemarkResult<Shape> {
    let position = g.first()?;
    let radius = match g.points.last() {
        Some(&p) if g.points.len() >= 2 => {
            let d = p - position;
            Vec2::new(d.x.abs().max(MIN_RADIUS), d.y.abs().max(MIN_RADIUS))
        }
        _ => DEFAULT_TRACKER_RADII,
    };
    Ok(styled(
        ShapeKind::Ellipse(EllipseShape { position, radius }),
        g,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/services/tools.rs"]
mod tests;
