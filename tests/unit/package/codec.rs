use super::*;
use crate::annotation::model::ToolType;
use crate::foundation::core::{Point, Size};
use crate::scene::shape::{RectShape, ShapeKind};

fn rect_shape(x: f64, y: f64) -> Shape {
    Shape::new(ShapeKind::Rect(RectShape {
        position: Point::new(x, y),
        size: Size::new(30.0, 40.0),
    }))
}

fn populated() -> (AnnotationStore, Scene) {
    let mut store = AnnotationStore::new();
    let mut scene = Scene::new();
    for (i, id) in ["a", "b"].iter().enumerate() {
        let a = Annotation::new(*id, ToolType::Rectangle, i as f64, i as f64 + 2.0, 0)
            .unwrap()
            .with_fades(Some(0.25), None);
        store.insert(a).unwrap();
        scene.add(*id, rect_shape(10.0 * i as f64, 5.0)).unwrap();
    }
    (store, scene)
}

#[test]
fn export_uses_camel_case_schema() {
    let (store, scene) = populated();
    let pkg = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 42).unwrap();
    let json: serde_json::Value = serde_json::from_str(&to_json(&pkg).unwrap()).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["exportedAt"], 42);
    assert_eq!(json["sourceDimensions"]["width"], 640);
    let first = &json["annotations"][0];
    assert_eq!(first["id"], "a");
    assert_eq!(first["toolType"], "rectangle");
    assert_eq!(first["fadeIn"], 0.25);
    assert!(first.get("fadeOut").is_none());
    assert_eq!(first["shapeData"]["kind"]["type"], "rect");
}

#[test]
fn export_requires_a_shape_per_annotation() {
    let (store, mut scene) = populated();
    scene.remove("b");
    let err = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 0).unwrap_err();
    assert!(matches!(err, FramemarkError::Package(_)));
}

#[test]
fn malformed_json_is_a_package_error() {
    assert!(matches!(from_json("{"), Err(FramemarkError::Package(_))));
    assert!(matches!(
        from_json(r#"{"version":1}"#),
        Err(FramemarkError::Package(_))
    ));
}

#[test]
fn import_is_all_or_nothing() {
    let (store, scene) = populated();
    let mut pkg = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 0).unwrap();
    pkg.annotations[1].end_time = -1.0;
    assert!(prepare_import(pkg, Canvas::new(640, 360).unwrap()).is_err());
}

#[test]
fn import_rejects_geometry_that_overflows_once_rescaled() {
    let (store, mut scene) = populated();
    *scene.shape_mut("b").unwrap() = Shape::new(ShapeKind::Rect(RectShape {
        position: Point::new(5e307, 5e307),
        size: Size::new(1e307, 1e307),
    }));
    let pkg = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 0).unwrap();
    pkg.validate().unwrap();

    let err = prepare_import(pkg, Canvas::new(1280, 720).unwrap()).unwrap_err();
    assert!(matches!(err, FramemarkError::Package(_)));
}

#[test]
fn import_rescales_into_target() {
    let (store, scene) = populated();
    let pkg = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 0).unwrap();
    let parts = prepare_import(pkg, Canvas::new(1280, 720).unwrap()).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1].0.id, "b");
    assert_eq!(parts[1].1.bounds().origin(), Point::new(20.0, 10.0));
    assert_eq!(parts[1].1.bounds().size(), Size::new(60.0, 80.0));
}

#[test]
fn files_round_trip() {
    let (store, scene) = populated();
    let pkg = export_package(&store, &scene, Canvas::new(640, 360).unwrap(), 7).unwrap();
    let path = std::env::temp_dir().join(format!("framemark-pkg-{}.json", std::process::id()));
    write_package(&path, &pkg).unwrap();
    let back = read_package(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(back, pkg);
}
