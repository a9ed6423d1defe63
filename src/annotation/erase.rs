use crate::annotation::store::AnnotationStore;
use crate::foundation::core::{Point, Rect};
use crate::scene::graph::SceneGraph;

/// Ids of annotations whose visual bounds intersect an eraser stroke.
///
/// The stroke is treated as a polyline of width `stroke_width`. Hidden visuals and
/// annotations on locked layers are never hit. A single-point stroke acts as a tap.
pub fn erase_hits(
    store: &AnnotationStore,
    scene: &dyn SceneGraph,
    stroke: &[Point],
    stroke_width: f64,
) -> Vec<String> {
    if stroke.is_empty() {
        return Vec::new();
    }
    let half = (stroke_width.max(0.0)) / 2.0;

    store
        .annotations()
        .iter()
        .filter(|a| !store.is_locked(&a.id) && scene.is_visible(&a.id))
        .filter_map(|a| {
            let bounds = scene.bounds(&a.id)?.inflate(half, half);
            stroke_hits(stroke, bounds).then(|| a.id.clone())
        })
        .collect()
}

fn stroke_hits(stroke: &[Point], bounds: Rect) -> bool {
    if stroke.len() == 1 {
        return contains_closed(bounds, stroke[0]);
    }
    stroke
        .windows(2)
        .any(|w| segment_intersects_rect(w[0], w[1], bounds))
}

fn contains_closed(r: Rect, p: Point) -> bool {
    r.x0 <= p.x && p.x <= r.x1 && r.y0 <= p.y && p.y <= r.y1
}

/// Liang-Barsky clip test of segment `a -> b` against a closed rectangle.
fn segment_intersects_rect(a: Point, b: Point, r: Rect) -> bool {
    let d = b - a;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-d.x, a.x - r.x0),
        (d.x, r.x1 - a.x),
        (-d.y, a.y - r.y0),
        (d.y, r.y1 - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return false;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return false;
            }
            t1 = t1.min(t);
        }
    }
    t0 <= t1
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/erase.rs"]
mod tests;
