use super::*;

#[test]
fn starts_with_one_layer_that_cannot_be_deleted() {
    let mut stack = LayerStack::default();
    assert_eq!(stack.layers().len(), 1);
    assert!(stack.remove(stack.first_id()).is_err());
}

#[test]
fn remove_returns_first_remaining_layer() {
    let mut stack = LayerStack::default();
    let top = stack.add("Overlay");
    assert_eq!(stack.remove(0).unwrap(), top);
    assert_eq!(stack.first_id(), top);
}

#[test]
fn raise_and_lower_reorder() {
    let mut stack = LayerStack::default();
    let a = stack.add("a");
    let b = stack.add("b");
    stack.lower(b).unwrap();
    assert_eq!(stack.rank(b), Some(1));
    assert_eq!(stack.rank(a), Some(2));
    stack.raise(a).unwrap();
    assert_eq!(stack.rank(a), Some(2));
    assert!(stack.raise(99).is_err());
}

#[test]
fn flags_and_names_update() {
    let mut stack = LayerStack::default();
    stack.set_visible(0, false).unwrap();
    stack.set_locked(0, true).unwrap();
    stack.rename(0, "Base").unwrap();
    let l = stack.get(0).unwrap();
    assert_eq!((l.visible, l.locked, l.name.as_str()), (false, true, "Base"));
}

#[test]
fn ensure_adds_foreign_ids_once() {
    let mut stack = LayerStack::default();
    stack.ensure(4);
    stack.ensure(4);
    assert_eq!(stack.layers().len(), 2);
    assert_eq!(stack.add("next"), 5);
}

#[test]
fn ensure_accepts_the_largest_id() {
    let mut stack = LayerStack::default();
    stack.ensure(LayerId::MAX);
    assert_eq!(stack.get(LayerId::MAX).unwrap().name, "Layer 4294967296");

    let a = stack.add("a");
    let b = stack.add("b");
    assert_eq!((a, b), (1, 2));
    assert_eq!(stack.layers().len(), 4);
}
