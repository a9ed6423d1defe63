use super::*;

#[test]
fn ff_ratios_parse() {
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("25/1"), Some((25, 1)));
    assert_eq!(parse_ff_ratio("25/0"), None);
    assert_eq!(parse_ff_ratio("25"), None);
}

#[test]
fn fps_and_canvas_from_info() {
    let info = VideoInfo {
        path: PathBuf::from("clip.mp4"),
        width: 1920,
        height: 1080,
        fps_num: 50,
        fps_den: 2,
        duration_sec: 3.0,
    };
    assert_eq!(info.fps(), 25.0);
    assert_eq!(info.canvas().max_dim(), 1920.0);
}

#[test]
fn frame_times_cover_range_inclusive() {
    let ts = frame_times(1.0, 2.0, 4.0);
    assert_eq!(ts, vec![1.0, 1.25, 1.5, 1.75, 2.0]);
    assert!(frame_times(2.0, 1.0, 30.0).is_empty());
    assert!(frame_times(0.0, 1.0, 0.0).is_empty());
}

#[test]
fn raw_frames_are_length_checked() {
    assert!(frame_from_rgba8(2, 2, vec![0; 16]).is_ok());
    assert!(matches!(
        frame_from_rgba8(2, 2, vec![0; 15]),
        Err(FramemarkError::Media(_))
    ));
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn media_requires_feature() {
    assert!(probe_video(Path::new("clip.mp4")).is_err());
}
