use super::*;

#[test]
fn frame_range_is_half_open() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert_eq!(r.len_frames(), 3);
    assert_eq!(
        r.frames().collect::<Vec<_>>(),
        vec![FrameIndex(2), FrameIndex(3), FrameIndex(4)]
    );
}

#[test]
fn inverted_range_is_rejected() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn fps_ceil_absorbs_float_noise() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(1.2), 36);
    assert_eq!(fps.secs_to_frames_ceil(0.1 + 0.2), 9);
    assert_eq!(fps.secs_to_frames_ceil(0.01), 1);
}

#[test]
fn fps_frame_time_matches_rational() {
    let fps = Fps::new(30000, 1001).unwrap();
    let t = fps.frame_time_secs(FrameIndex(30000));
    assert!((t - 1001.0).abs() < 1e-9);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}
