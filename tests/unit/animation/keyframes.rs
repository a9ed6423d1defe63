use super::*;

fn two_keys() -> Vec<TrackPoint> {
    vec![TrackPoint::at(0.0, 0.0, 0.0), TrackPoint::at(10.0, 10.0, 20.0)]
}

#[test]
fn empty_list_has_no_position() {
    assert_eq!(position_at(&[], 1.0), None);
}

#[test]
fn non_finite_time_has_no_position() {
    for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(position_at(&two_keys(), t), None);
        assert_eq!(position_at(&two_keys()[..1], t), None);
    }
}

#[test]
fn midpoint_interpolates_linearly() {
    let s = position_at(&two_keys(), 5.0).unwrap();
    assert_eq!((s.x, s.y), (5.0, 10.0));
}

#[test]
fn clamps_verbatim_outside_range() {
    let keys = vec![
        TrackPoint::at(1.0, 3.5, -2.0).with_size(8.0, 9.0),
        TrackPoint::at(4.0, 7.0, 1.0),
    ];
    for t in [-100.0, 0.0, 1.0] {
        let s = position_at(&keys, t).unwrap();
        assert_eq!((s.x, s.y, s.width, s.height), (3.5, -2.0, Some(8.0), Some(9.0)));
    }
    for t in [4.0, 4.5, 1e9] {
        let s = position_at(&keys, t).unwrap();
        assert_eq!((s.x, s.y, s.width, s.height), (7.0, 1.0, None, None));
    }
}

#[test]
fn size_carries_forward_when_one_side_is_missing() {
    let keys = vec![
        TrackPoint {
            width: Some(10.0),
            ..TrackPoint::at(0.0, 0.0, 0.0)
        },
        TrackPoint::at(10.0, 10.0, 0.0),
    ];
    let s = position_at(&keys, 5.0).unwrap();
    assert_eq!(s.width, Some(10.0));
    assert_eq!(s.height, None);
}

#[test]
fn size_interpolates_when_both_sides_have_it() {
    let keys = vec![
        TrackPoint::at(0.0, 0.0, 0.0).with_size(10.0, 20.0),
        TrackPoint::at(2.0, 0.0, 0.0).with_size(30.0, 40.0),
    ];
    let s = position_at(&keys, 1.0).unwrap();
    assert_eq!((s.width, s.height), (Some(20.0), Some(30.0)));
}

#[test]
fn insert_keeps_sorted_and_replaces_same_time() {
    let mut track = KeyframeTrack::seeded(TrackPoint::at(5.0, 1.0, 1.0)).unwrap();
    track.insert(TrackPoint::at(1.0, 0.0, 0.0)).unwrap();
    track.insert(TrackPoint::at(3.0, 2.0, 2.0)).unwrap();
    track.insert(TrackPoint::at(3.0, 9.0, 9.0)).unwrap();

    let times: Vec<f64> = track.keys().iter().map(|k| k.time).collect();
    assert_eq!(times, vec![1.0, 3.0, 5.0]);
    assert_eq!(track.keys()[1].x, 9.0);
    track.validate().unwrap();
}

#[test]
fn insert_rejects_non_finite_values() {
    let mut track = KeyframeTrack::default();
    assert!(track.insert(TrackPoint::at(f64::NAN, 0.0, 0.0)).is_err());
    assert!(track.insert(TrackPoint::at(0.0, f64::INFINITY, 0.0)).is_err());
    assert!(track.is_empty());
}
