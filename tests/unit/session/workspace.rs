use super::*;
use crate::package::model::PackagedAnnotation;
use crate::scene::shape::{RectShape, ShapeKind};

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

fn session(w: u32, h: u32) -> AnnotationSession {
    AnnotationSession::new(
        canvas(w, h),
        TrackerCoordinator::default(),
        SessionServices::default(),
    )
}

fn drag(a: (f64, f64), b: (f64, f64)) -> Gesture {
    Gesture::from_points(vec![Point::new(a.0, a.1), Point::new(b.0, b.1)])
}

fn tap(x: f64, y: f64) -> Gesture {
    Gesture::from_points(vec![Point::new(x, y)])
}

fn packaged(
    id: &str,
    tool: ToolType,
    layer: LayerId,
    position: (f64, f64),
    size: (f64, f64),
) -> PackagedAnnotation {
    PackagedAnnotation {
        id: id.to_owned(),
        start_time: 0.0,
        end_time: 5.0,
        layer,
        tool_type: tool,
        fade_in: None,
        fade_out: None,
        shape_data: Shape::new(ShapeKind::Rect(RectShape {
            position: Point::new(position.0, position.1),
            size: Size::new(size.0, size.1),
        })),
    }
}

fn package_of(source: Canvas, annotations: Vec<PackagedAnnotation>) -> AnnotationPackage {
    let mut pkg = AnnotationPackage::new(source, 0);
    pkg.annotations = annotations;
    pkg
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn create_then_undo_redo_keeps_store_and_scene_in_step() {
    let mut s = session(400, 300);
    let id = s
        .create(ToolType::Rectangle, &drag((10.0, 10.0), (50.0, 40.0)), 0.0, 2.0, None)
        .unwrap();
    assert!(s.store().contains(&id));
    assert!(s.scene().shape(&id).is_some());

    assert!(s.undo().unwrap());
    assert!(s.store().is_empty());
    assert!(s.scene().is_empty());

    assert!(s.redo().unwrap());
    assert!(s.store().contains(&id));
    assert_eq!(s.scene().bounds(&id).unwrap().width(), 40.0);
    assert!(!s.redo().unwrap());
}

#[test]
fn failed_create_leaves_nothing_behind() {
    let mut s = session(400, 300);
    let err = s
        .create(ToolType::Rectangle, &drag((0.0, 0.0), (5.0, 5.0)), 0.0, 1.0, Some(9))
        .unwrap_err();
    assert!(matches!(err, FramemarkError::Validation(_)));
    assert!(s.store().is_empty());
    assert!(s.scene().is_empty());
    assert!(!s.history().can_undo());

    assert!(s.create(ToolType::Line, &tap(1.0, 1.0), 0.0, 1.0, None).is_err());
    assert!(
        s.create(ToolType::Circle, &drag((0.0, 0.0), (4.0, 4.0)), 2.0, 1.0, None)
            .is_err()
    );
    assert!(s.store().is_empty());
}

#[test]
fn player_tracker_is_seeded_in_native_coordinates() {
    let mut s = session(400, 300);
    s.set_video(canvas(800, 600)).unwrap();
    let id = s
        .create(ToolType::PlayerTracker, &tap(100.0, 50.0), 1.5, 6.0, None)
        .unwrap();

    assert!(s.tracker().is_tracked(&id));
    assert!(s.scene().is_watched(&id));
    let keys = s.tracker().keyframes(&id).unwrap();
    assert_eq!(keys.len(), 1);
    assert_close(keys[0].time, 1.5);
    assert_close(keys[0].x, 200.0);
    assert_close(keys[0].y, 100.0);
    assert_close(keys[0].width.unwrap(), 80.0);
    assert_close(keys[0].height.unwrap(), 80.0);
}

#[test]
fn tick_hides_out_of_window_and_follows_keyframes() {
    let mut s = session(400, 300);
    s.set_video(canvas(800, 600)).unwrap();
    let rect = s
        .create(ToolType::Rectangle, &drag((0.0, 0.0), (10.0, 10.0)), 3.0, 4.0, None)
        .unwrap();
    let player = s
        .create(ToolType::PlayerTracker, &tap(100.0, 50.0), 0.0, 10.0, None)
        .unwrap();

    let presence = s.tick(0.0, None);
    assert_eq!(presence.len(), 2);
    assert!(!s.scene().is_visible(&rect));
    assert!(s.scene().is_visible(&player));

    s.scene_mut().user_move(&player, Point::new(150.0, 75.0));
    s.tick(2.0, None);
    assert_eq!(s.tracker().keyframes(&player).unwrap().len(), 2);

    s.tick(1.0, None);
    let c = s.scene().center(&player).unwrap();
    assert_close(c.x, 125.0);
    assert_close(c.y, 62.5);
}

#[test]
fn erase_is_one_step_and_drops_tracking_until_undone() {
    let mut s = session(400, 300);
    let a = s
        .create(ToolType::Rectangle, &drag((0.0, 0.0), (20.0, 20.0)), 0.0, 5.0, None)
        .unwrap();
    let b = s
        .create(ToolType::PlayerTracker, &tap(30.0, 10.0), 0.0, 5.0, None)
        .unwrap();
    let far = s
        .create(ToolType::Rectangle, &drag((300.0, 200.0), (320.0, 220.0)), 0.0, 5.0, None)
        .unwrap();

    let erased = s.erase(&[Point::new(0.0, 10.0), Point::new(60.0, 10.0)], 4.0);
    assert_eq!(erased, vec![a.clone(), b.clone()]);
    assert!(!s.tracker().is_tracked(&b));
    assert!(!s.scene().is_watched(&b));
    assert!(s.store().contains(&far));

    assert!(s.undo().unwrap());
    let order: Vec<&str> = s.store().annotations().iter().map(|x| x.id.as_str()).collect();
    assert_eq!(order, vec![a.as_str(), b.as_str(), far.as_str()]);
    assert!(s.tracker().is_tracked(&b));
    assert!(s.scene().is_watched(&b));

    assert!(s.redo().unwrap());
    assert!(!s.tracker().is_tracked(&b));
}

#[test]
fn erase_skips_locked_layers() {
    let mut s = session(400, 300);
    let locked = s.layers_mut().add("Locked");
    s.layers_mut().set_locked(locked, true).unwrap();
    let id = s
        .create(ToolType::Rectangle, &drag((0.0, 0.0), (20.0, 20.0)), 0.0, 5.0, Some(locked))
        .unwrap();

    assert!(s.erase(&[Point::new(10.0, 10.0)], 2.0).is_empty());
    assert!(s.store().contains(&id));
}

#[test]
fn clear_and_delete_are_undoable() {
    let mut s = session(400, 300);
    let a = s.create(ToolType::Line, &drag((0.0, 0.0), (9.0, 9.0)), 0.0, 1.0, None).unwrap();
    let b = s
        .create(ToolType::PlayerTracker, &tap(50.0, 50.0), 0.0, 1.0, None)
        .unwrap();

    assert!(s.delete(&a));
    assert!(!s.delete(&a));
    assert_eq!(s.clear(), 1);
    assert!(s.store().is_empty());
    assert!(s.tracker().is_empty());

    assert!(s.undo().unwrap());
    assert!(s.store().contains(&b));
    assert!(s.tracker().is_tracked(&b));
    assert!(s.undo().unwrap());
    assert!(s.store().contains(&a));
}

#[test]
fn retime_undo_restores_previous_window() {
    let mut s = session(400, 300);
    let id = s.create(ToolType::Line, &drag((0.0, 0.0), (9.0, 9.0)), 1.0, 2.0, None).unwrap();
    s.retime(&id, 3.0, 8.0).unwrap();
    assert!(s.retime(&id, 5.0, 5.0).is_err());

    s.undo().unwrap();
    let a = s.store().get(&id).unwrap();
    assert_eq!((a.start_time, a.end_time), (1.0, 2.0));
}

#[test]
fn import_rescales_into_a_larger_canvas_as_one_step() {
    let mut src = session(400, 300);
    let id = src
        .create(ToolType::Rectangle, &drag((10.0, 20.0), (50.0, 40.0)), 0.0, 2.0, None)
        .unwrap();
    let pkg = src.export_package().unwrap();
    assert_eq!(pkg.source_dimensions, canvas(400, 300));
    assert!(pkg.exported_at > 0);

    let mut dst = session(800, 600);
    assert_eq!(dst.import_package(pkg).unwrap(), 1);
    let r = dst.scene().bounds(&id).unwrap();
    assert_close(r.x0, 20.0);
    assert_close(r.y0, 40.0);
    assert_close(r.width(), 80.0);
    assert_close(r.height(), 40.0);
    assert_eq!(dst.notifications_mut().drain().len(), 1);

    assert!(dst.undo().unwrap());
    assert!(dst.store().is_empty());
    assert!(dst.scene().is_empty());
}

#[test]
fn import_with_existing_id_changes_nothing_and_notifies() {
    let mut s = session(400, 300);
    s.create(ToolType::Line, &drag((0.0, 0.0), (9.0, 9.0)), 0.0, 1.0, None).unwrap();
    let pkg = s.export_package().unwrap();
    s.notifications_mut().drain();

    let err = s.import_package(pkg).unwrap_err();
    assert!(matches!(err, FramemarkError::Package(_)));
    assert_eq!(s.store().len(), 1);
    assert_eq!(s.scene().len(), 1);

    let notices = s.notifications_mut().drain();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.starts_with("Import failed"));
}

#[test]
fn malformed_json_is_reported_once() {
    let mut s = session(400, 300);
    assert!(s.import_json("{ not json").is_err());
    assert!(s.store().is_empty());
    assert_eq!(s.notifications_mut().drain().len(), 1);
}

#[test]
fn imported_player_trackers_are_tracked_on_their_layer() {
    let mut src = session(400, 300);
    let layer = src.layers_mut().add("Players");
    let id = src
        .create(ToolType::PlayerTracker, &tap(40.0, 40.0), 0.5, 3.0, Some(layer))
        .unwrap();
    let json = crate::package::codec::to_json(&src.export_package().unwrap()).unwrap();

    let mut dst = session(400, 300);
    assert_eq!(dst.import_json(&json).unwrap(), 1);
    assert!(dst.tracker().is_tracked(&id));
    assert_eq!(dst.store().get(&id).unwrap().layer, layer);
    assert!(dst.store().layers().contains(layer));
}

#[test]
fn import_with_untrackable_geometry_changes_nothing() {
    let mut s = session(400, 300);
    let ok = || packaged("ok", ToolType::Rectangle, 0, (10.0, 10.0), (20.0, 20.0));

    let pkg = package_of(
        canvas(400, 300),
        vec![
            ok(),
            packaged("bad", ToolType::PlayerTracker, 0, (1e308, 1e308), (1e308, 1e308)),
        ],
    );
    assert!(s.import_package(pkg).is_err());
    assert!(s.store().is_empty());
    assert!(s.scene().is_empty());
    assert!(s.tracker().is_empty());
    assert!(!s.history().can_undo());
    assert_eq!(s.notifications_mut().drain().len(), 1);

    // Finite on the canvas, but not once mapped to native video pixels.
    s.set_video(canvas(4000, 3000)).unwrap();
    let pkg = package_of(
        canvas(400, 300),
        vec![
            ok(),
            packaged("far", ToolType::PlayerTracker, 3, (5e307, 5e307), (5e307, 5e307)),
        ],
    );
    let err = s.import_package(pkg).unwrap_err();
    assert!(matches!(err, FramemarkError::Tracking(_)));
    assert!(s.store().is_empty());
    assert!(s.scene().is_empty());
    assert!(s.tracker().is_empty());
    assert!(!s.store().layers().contains(3));
    assert!(!s.history().can_undo());
    assert_eq!(s.notifications_mut().drain().len(), 1);

    let pkg = package_of(canvas(400, 300), vec![ok()]);
    assert_eq!(s.import_package(pkg).unwrap(), 1);
    assert!(s.history().can_undo());
}

#[test]
fn import_onto_the_largest_layer_id() {
    let mut s = session(400, 300);
    let pkg = package_of(
        canvas(400, 300),
        vec![packaged("top", ToolType::Rectangle, LayerId::MAX, (0.0, 0.0), (8.0, 8.0))],
    );
    let json = crate::package::codec::to_json(&pkg).unwrap();
    assert!(json.contains("4294967295"));

    assert_eq!(s.import_json(&json).unwrap(), 1);
    assert!(s.store().layers().contains(LayerId::MAX));
    assert_eq!(s.store().get("top").unwrap().layer, LayerId::MAX);

    let next = s.layers_mut().add("Next");
    assert_ne!(next, LayerId::MAX);
    assert_eq!(s.store().layers().layers().len(), 3);
}

#[test]
fn deleting_a_layer_moves_its_annotations_to_the_first_layer() {
    let mut s = session(400, 300);
    let extra = s.layers_mut().add("Extra");
    let id = s
        .create(ToolType::Rectangle, &drag((0.0, 0.0), (20.0, 20.0)), 0.0, 5.0, Some(extra))
        .unwrap();

    assert_eq!(s.delete_layer(extra).unwrap(), 0);
    assert!(!s.store().layers().contains(extra));
    assert_eq!(s.store().get(&id).unwrap().layer, 0);

    assert!(s.delete_layer(0).is_err());
    assert!(s.delete_layer(extra).is_err());
    assert_eq!(s.store().layers().layers().len(), 1);
}

#[test]
fn non_finite_tick_keeps_a_manual_move_for_the_next_tick() {
    let mut s = session(400, 300);
    let id = s
        .create(ToolType::PlayerTracker, &tap(100.0, 50.0), 0.0, 10.0, None)
        .unwrap();
    s.tick(0.0, None);

    s.scene_mut().user_move(&id, Point::new(150.0, 75.0));
    let presence = s.tick(f64::NAN, None);
    assert!(presence.iter().all(|p| !p.visible));
    assert_eq!(s.tracker().keyframes(&id).unwrap().len(), 1);

    s.tick(2.0, None);
    assert_eq!(s.tracker().keyframes(&id).unwrap().len(), 2);
    let c = s.scene().center(&id).unwrap();
    assert_close(c.x, 150.0);
    assert_close(c.y, 75.0);
}
