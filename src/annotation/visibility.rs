use crate::annotation::store::AnnotationStore;
use crate::scene::graph::SceneGraph;

/// Per-annotation presence at one playback time.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Presence {
    /// Annotation id.
    pub id: String,
    /// Drawn and hit-testable.
    pub visible: bool,
    /// Opacity in `[0, 1]`; `0` whenever hidden.
    pub opacity: f64,
}

/// Stateless evaluator from annotation windows to presence.
///
/// Every annotation is recomputed on every tick; there is no dirty tracking.
pub struct Visibility;

impl Visibility {
    /// Compute presence of every annotation at time `t`, in creation order.
    pub fn evaluate(store: &AnnotationStore, t: f64) -> Vec<Presence> {
        store
            .annotations()
            .iter()
            .map(|a| {
                let layer_visible = store.layers().get(a.layer).is_none_or(|l| l.visible);
                let opacity = if layer_visible && t.is_finite() {
                    a.window().opacity_at(t)
                } else {
                    None
                };
                match opacity {
                    Some(opacity) => Presence {
                        id: a.id.clone(),
                        visible: true,
                        opacity,
                    },
                    None => Presence {
                        id: a.id.clone(),
                        visible: false,
                        opacity: 0.0,
                    },
                }
            })
            .collect()
    }

    /// Evaluate at `t` and push the result into the scene.
    pub fn apply(store: &AnnotationStore, scene: &mut dyn SceneGraph, t: f64) -> Vec<Presence> {
        let presence = Self::evaluate(store, t);
        for p in &presence {
            scene.set_presence(&p.id, p.visible, p.opacity);
        }
        presence
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/visibility.rs"]
mod tests;
