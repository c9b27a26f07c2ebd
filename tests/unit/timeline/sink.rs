use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        scene: "intro".to_owned(),
        fps: Fps::new(30, 1).unwrap(),
        frames: 2,
        duration_secs: 1.0 / 30.0,
    }
}

fn update(frame: u64, value: f64) -> PropertyUpdate {
    PropertyUpdate {
        frame: FrameIndex(frame),
        time: frame as f64 / 30.0,
        node: "box".to_owned(),
        property: PropKey::Opacity,
        value: Value::Number(value),
    }
}

#[test]
fn in_memory_sink_tracks_latest_value() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push(&update(0, 1.0)).unwrap();
    sink.push(&update(3, 0.5)).unwrap();
    sink.end().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().scene, "intro");
    assert_eq!(
        sink.value_at("box", PropKey::Opacity, FrameIndex(2)),
        Some(&Value::Number(1.0))
    );
    assert_eq!(
        sink.value_at("box", PropKey::Opacity, FrameIndex(9)),
        Some(&Value::Number(0.5))
    );
    assert_eq!(sink.value_at("box", PropKey::Fill, FrameIndex(9)), None);
    assert_eq!(sink.frame(FrameIndex(3)).count(), 1);
}

#[test]
fn json_lines_sink_writes_header_then_updates() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.begin(cfg()).unwrap();
    sink.push(&update(1, 0.25)).unwrap();
    sink.end().unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let header: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(header["scene"], "intro");
    assert_eq!(header["frames"], 2);

    let row: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(row["frame"], 1);
    assert_eq!(row["node"], "box");
    assert_eq!(row["property"], "opacity");
    assert_eq!(row["value"], 0.25);
}

#[test]
fn digest_sink_depends_on_every_update() {
    let run = |values: &[f64]| {
        let mut sink = DigestSink::new();
        sink.begin(cfg()).unwrap();
        for (i, v) in values.iter().enumerate() {
            sink.push(&update(i as u64, *v)).unwrap();
        }
        sink.end().unwrap();
        (sink.digest(), sink.count())
    };

    assert_eq!(run(&[1.0, 0.5]), run(&[1.0, 0.5]));
    assert_ne!(run(&[1.0, 0.5]).0, run(&[1.0, 0.25]).0);
    assert_eq!(run(&[1.0, 0.5]).1, 2);
}

#[test]
fn digest_sink_resets_on_begin() {
    let mut sink = DigestSink::new();
    sink.begin(cfg()).unwrap();
    sink.push(&update(0, 1.0)).unwrap();
    let first = sink.digest();

    sink.begin(cfg()).unwrap();
    sink.push(&update(0, 1.0)).unwrap();
    assert_eq!(sink.digest(), first);
    assert_eq!(sink.count(), 1);
}
