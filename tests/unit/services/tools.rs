use super::*;

fn pts(v: &[(f64, f64)]) -> Vec<Point> {
    v.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn defaults_cover_every_tool() {
    let r = ToolRegistry::with_defaults();
    for tool in ToolType::ALL {
        assert!(r.contains(tool), "{tool:?}");
    }
    assert_eq!(r.tools().count(), ToolType::ALL.len());
}

#[test]
fn rectangle_normalizes_drag_direction() {
    let r = ToolRegistry::default();
    let s = r
        .build(
            ToolType::Rectangle,
            &Gesture::from_points(pts(&[(50.0, 40.0), (10.0, 20.0)])),
        )
        .unwrap();
    assert_eq!(s.bounds(), Rect::new(10.0, 20.0, 50.0, 40.0));
}

#[test]
fn arrow_is_line_plus_head() {
    let r = ToolRegistry::default();
    let s = r
        .build(
            ToolType::Arrow,
            &Gesture::from_points(pts(&[(0.0, 0.0), (100.0, 0.0)])),
        )
        .unwrap();
    let ShapeKind::Group(g) = &s.kind else {
        panic!("expected group");
    };
    assert_eq!(g.children.len(), 2);
    let ShapeKind::Polyline(head) = &g.children[1].kind else {
        panic!("expected head polyline");
    };
    assert_eq!(head.points[1], Point::new(100.0, 0.0));
    assert!(head.points[0].x < 100.0 && head.points[2].x < 100.0);
}

#[test]
fn gestures_with_too_few_points_are_rejected() {
    let r = ToolRegistry::default();
    let one = Gesture::from_points(pts(&[(1.0, 1.0)]));
    assert!(r.build(ToolType::Line, &one).is_err());
    assert!(r.build(ToolType::Freehand, &Gesture::default()).is_err());
    assert!(r.build(ToolType::Text, &one).is_err());
    assert!(r.build(ToolType::PlayerTracker, &one).is_ok());
}

#[test]
fn text_uses_gesture_content() {
    let r = ToolRegistry::default();
    let g = Gesture {
        text: Some(" Offside ".to_string()),
        ..Gesture::from_points(pts(&[(5.0, 5.0)]))
    };
    let s = r.build(ToolType::Text, &g).unwrap();
    let ShapeKind::Text(t) = &s.kind else {
        panic!("expected text");
    };
    assert_eq!(t.content, "Offside");
}

#[test]
fn custom_builders_replace_defaults() {
    let mut r = ToolRegistry::empty();
    assert!(r.build(ToolType::Line, &Gesture::default()).is_err());
    r.register(ToolType::Line, |_g: &Gesture| {
        Ok(Shape::new(ShapeKind::Circle(CircleShape {
            position: Point::ZERO,
            radius: 1.0,
        })))
    });
    let s = r.build(ToolType::Line, &Gesture::default()).unwrap();
    assert!(matches!(s.kind, ShapeKind::Circle(_)));
}
