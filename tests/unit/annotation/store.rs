use super::*;
use crate::annotation::model::ToolType;

fn ann(id: &str, layer: LayerId) -> Annotation {
    Annotation::new(id, ToolType::Rectangle, 0.0, 5.0, layer).unwrap()
}

#[test]
fn insert_rejects_duplicates_and_unknown_layers() {
    let mut store = AnnotationStore::new();
    store.insert(ann("a", 0)).unwrap();
    assert!(store.insert(ann("a", 0)).is_err());
    assert!(store.insert(ann("b", 7)).is_err());
    assert_eq!(store.len(), 1);
}

#[test]
fn retime_validates_and_reports_previous_window() {
    let mut store = AnnotationStore::new();
    store.insert(ann("a", 0)).unwrap();
    assert_eq!(store.retime("a", 1.0, 2.0).unwrap(), (0.0, 5.0));
    assert!(store.retime("a", 3.0, 2.0).is_err());
    assert!(store.retime("missing", 0.0, 1.0).is_err());
    assert_eq!(store.get("a").unwrap().end_time, 2.0);
}

#[test]
fn set_fades_rejects_negative_without_mutating() {
    let mut store = AnnotationStore::new();
    store.insert(ann("a", 0)).unwrap();
    store.set_fades("a", Some(0.5), None).unwrap();
    assert!(store.set_fades("a", Some(-0.5), None).is_err());
    assert_eq!(store.get("a").unwrap().fade_in, Some(0.5));
}

#[test]
fn deleting_layer_reassigns_annotations() {
    let mut store = AnnotationStore::new();
    let top = store.layers_mut().add("top");
    store.insert(ann("a", 0)).unwrap();
    store.insert(ann("b", top)).unwrap();
    assert_eq!(store.delete_layer(0).unwrap(), top);
    assert_eq!(store.get("a").unwrap().layer, top);
    assert!(store.delete_layer(top).is_err());
}

#[test]
fn remove_and_restore_keep_order() {
    let mut store = AnnotationStore::new();
    for id in ["a", "b", "c"] {
        store.insert(ann(id, 0)).unwrap();
    }
    let (i, b) = store.remove("b").unwrap();
    store.restore(i, b);
    let ids: Vec<_> = store.annotations().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn lock_follows_layer() {
    let mut store = AnnotationStore::new();
    store.insert(ann("a", 0)).unwrap();
    assert!(!store.is_locked("a"));
    store.layers_mut().set_locked(0, true).unwrap();
    assert!(store.is_locked("a"));
}
