use super::*;
use crate::annotation::model::{Annotation, ToolType};
use crate::foundation::core::Size;
use crate::scene::graph::Scene;
use crate::scene::shape::{RectShape, Shape, ShapeKind};

fn setup() -> (AnnotationStore, Scene) {
    let mut store = AnnotationStore::new();
    let mut scene = Scene::new();
    for (id, x) in [("left", 0.0), ("right", 100.0)] {
        store
            .insert(Annotation::new(id, ToolType::Rectangle, 0.0, 1.0, 0).unwrap())
            .unwrap();
        scene
            .add(
                id,
                Shape::new(ShapeKind::Rect(RectShape {
                    position: Point::new(x, 0.0),
                    size: Size::new(10.0, 10.0),
                })),
            )
            .unwrap();
    }
    (store, scene)
}

#[test]
fn stroke_crossing_both_hits_both() {
    let (store, scene) = setup();
    let hits = erase_hits(
        &store,
        &scene,
        &[Point::new(-5.0, 5.0), Point::new(200.0, 5.0)],
        2.0,
    );
    assert_eq!(hits, vec!["left".to_string(), "right".to_string()]);
}

#[test]
fn stroke_between_shapes_misses() {
    let (store, scene) = setup();
    let hits = erase_hits(
        &store,
        &scene,
        &[Point::new(50.0, -20.0), Point::new(50.0, 40.0)],
        2.0,
    );
    assert!(hits.is_empty());
}

#[test]
fn stroke_width_reaches_nearby_bounds() {
    let (store, scene) = setup();
    let stroke = [Point::new(-20.0, 12.0), Point::new(30.0, 12.0)];
    assert!(erase_hits(&store, &scene, &stroke, 2.0).is_empty());
    assert_eq!(erase_hits(&store, &scene, &stroke, 6.0), vec!["left".to_string()]);
}

#[test]
fn hidden_and_locked_are_skipped() {
    let (mut store, mut scene) = setup();
    let stroke = [Point::new(-5.0, 5.0), Point::new(200.0, 5.0)];
    scene.set_presence("left", false, 0.0);
    assert_eq!(erase_hits(&store, &scene, &stroke, 2.0), vec!["right".to_string()]);
    store.layers_mut().set_locked(0, true).unwrap();
    assert!(erase_hits(&store, &scene, &stroke, 2.0).is_empty());
}

#[test]
fn tap_inside_hits() {
    let (store, scene) = setup();
    assert_eq!(
        erase_hits(&store, &scene, &[Point::new(105.0, 5.0)], 1.0),
        vec!["right".to_string()]
    );
}
