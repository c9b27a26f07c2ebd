use super::*;
use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Vec2};
use crate::foundation::ids::NodeId;
use crate::scene::binding::Expr;
use crate::scene::graph::Slot;
use crate::scene::property::{Field, NodeKind};
use crate::timeline::ops::{
    absolute, all, bind, chain, delay, prop, restore, save, sequence, set, signal, spawn, track,
    tween_eased, wait,
};
use crate::timeline::sink::InMemorySink;
use crate::timeline::step::Step;

fn graph_with(kind: NodeKind, name: &str) -> (SceneGraph, NodeId) {
    let mut g = SceneGraph::new(Canvas::default());
    let id = g.add_node(kind, None, Some(name)).unwrap();
    (g, id)
}

fn player(graph: SceneGraph, script: Step) -> Player {
    Player::new(
        Scene::new("test", Fps::default(), graph, script),
        PlayerOpts::default(),
    )
}

fn value(p: &Player, node: NodeId, key: PropKey) -> Value {
    p.graph().get(node, Field::whole(key)).unwrap()
}

#[test]
fn linear_size_tween_hits_midpoint_and_target() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = tween_eased(
        prop(n, PropKey::Size),
        Vec2::new(250.0, 50.0),
        0.5,
        Ease::Linear,
    );
    let mut p = player(g, script);

    p.advance_to(0.0).unwrap();
    assert_eq!(value(&p, n, PropKey::Size), Value::Vec2(Vec2::ZERO));
    p.advance_to(0.25).unwrap();
    assert_eq!(value(&p, n, PropKey::Size), Value::Vec2(Vec2::new(125.0, 25.0)));
    assert_eq!(p.advance_to(0.5).unwrap(), PlayState::Complete);
    assert_eq!(value(&p, n, PropKey::Size), Value::Vec2(Vec2::new(250.0, 50.0)));
}

#[test]
fn eased_tween_lands_exactly_on_target() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        tween_eased(prop(n, PropKey::Opacity), 0.3, 0.1, Ease::InOutSine),
        tween_eased(prop(n, PropKey::Opacity), 0.7, 0.2, Ease::OutCubic),
    ]);
    let mut p = player(g, script);
    // 0.1 + 0.2 is not 0.3 in f64.
    p.advance_to(0.3).unwrap();
    assert!(p.is_complete());
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.7));
}

#[test]
fn restore_returns_to_saved_opacity() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        save(n),
        tween_eased(prop(n, PropKey::Opacity), 0.0, 0.5, Ease::Linear),
        restore(n, 1.0),
    ]);
    let mut p = player(g, script);

    p.advance_to(0.5).unwrap();
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.0));
    p.advance_to(1.0).unwrap();
    assert_eq!(p.state(), PlayState::Running);
    p.advance_to(1.5).unwrap();
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(1.0));
    assert!(p.is_complete());
}

#[test]
fn save_then_instant_restore_is_a_round_trip() {
    let (mut g, n) = graph_with(NodeKind::Circle, "dot");
    g.set(n, Field::whole(PropKey::Position), Value::Vec2(Vec2::new(12.5, -3.0)))
        .unwrap();
    g.set(n, Field::whole(PropKey::Opacity), Value::Number(0.4)).unwrap();
    let before = g.state(n).unwrap();

    let mut p = player(g, chain([save(n), restore(n, 0.0)]));
    p.advance_to(0.0).unwrap();
    assert!(p.is_complete());
    assert_eq!(p.graph().state(n).unwrap(), before);
}

#[test]
fn restore_without_save_is_an_authoring_error() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let mut p = player(g, chain([wait(0.1), restore(n, 1.0)]));
    p.advance_to(0.05).unwrap();
    let err = p.advance_to(0.2).unwrap_err();
    assert!(err.is_authoring());
    assert!(err.to_string().contains("without a matching save"));
}

#[test]
fn a_failed_step_stops_the_scene() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        restore(n, 0.5),
        tween_eased(prop(n, PropKey::Opacity), 0.0, 1.0, Ease::Linear),
    ]);
    let mut p = player(g, script);
    assert!(p.advance_to(0.1).unwrap_err().is_authoring());
    assert_eq!(p.state(), PlayState::Failed);

    // The failing step is not skipped on the next call.
    let again = p.advance_to(1.0).unwrap_err();
    assert!(again.is_authoring());
    assert!(again.to_string().contains("without a matching save"));
    assert!(p.run_to_end().unwrap_err().is_authoring());
    assert!(p.render(&mut InMemorySink::new()).unwrap_err().is_authoring());
    assert_eq!(p.state(), PlayState::Failed);
    assert_eq!(p.completed_at(), None);
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(1.0));
}

#[test]
fn restore_lands_on_snapshot_when_the_property_is_bound() {
    let (mut g, a) = graph_with(NodeKind::Rect, "a");
    let b = g.add_node(NodeKind::Rect, None, Some("b")).unwrap();
    let script = chain([
        save(a),
        bind(
            prop(a, PropKey::Position),
            Expr::prop(b, Field::whole(PropKey::Position)),
        ),
        all([
            restore(a, 1.0),
            tween_eased(prop(b, PropKey::Position), Vec2::new(100.0, 0.0), 1.0, Ease::Linear),
        ]),
    ]);
    let mut p = player(g, script);
    p.advance_to(0.5).unwrap();
    assert_eq!(value(&p, a, PropKey::Position), Value::Vec2(Vec2::ZERO));
    assert_eq!(p.advance_to(1.0).unwrap(), PlayState::Complete);
    assert_eq!(value(&p, a, PropKey::Position), Value::Vec2(Vec2::ZERO));
    assert!(matches!(
        p.graph().slot(a, PropKey::Position).unwrap(),
        Slot::Literal(_)
    ));
    assert_eq!(value(&p, b, PropKey::Position), Value::Vec2(Vec2::new(100.0, 0.0)));
}

#[test]
fn saved_snapshot_is_a_copy() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        save(n),
        set(prop(n, PropKey::Rotation), 90.0),
        save(n),
        set(prop(n, PropKey::Rotation), 180.0),
        restore(n, 0.0),
    ]);
    let mut p = player(g, script);
    p.advance_to(0.0).unwrap();
    assert_eq!(value(&p, n, PropKey::Rotation), Value::Number(90.0));
    assert_eq!(p.graph().saved_depth(n).unwrap(), 1);
}

#[test]
fn all_completes_with_its_slowest_member() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = all([
        tween_eased(prop(n, PropKey::Opacity), 0.0, 0.5, Ease::Linear),
        tween_eased(prop(n, PropKey::Rotation), 45.0, 1.2, Ease::Linear),
    ]);
    assert_eq!(script.duration(), 1.2);
    let mut p = player(g, script);

    p.advance_to(0.6).unwrap();
    // The faster member's effect is visible before the group completes.
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.0));
    assert_eq!(p.advance_to(1.0).unwrap(), PlayState::Running);
    assert_eq!(p.advance_to(1.2).unwrap(), PlayState::Complete);
    assert_eq!(p.completed_at(), Some(1.2));
}

#[test]
fn chained_step_starts_at_logical_end_not_sample_time() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        wait(0.1),
        tween_eased(prop(n, PropKey::Rotation), 100.0, 1.0, Ease::Linear),
    ]);
    let mut p = player(g, script);
    // One coarse jump past the wait: the tween is already 0.4 s in.
    p.advance_to(0.5).unwrap();
    let Value::Number(r) = value(&p, n, PropKey::Rotation) else {
        panic!("rotation is a number");
    };
    assert!((r - 40.0).abs() < 1e-9);
}

#[test]
fn coarse_and_per_frame_sampling_agree() {
    let script = |n| {
        chain([
            all([
                tween_eased(prop(n, PropKey::Opacity), 0.0, 2.0, Ease::Linear),
                chain([wait(1.0), save(n)]),
            ]),
            set(prop(n, PropKey::Opacity), 1.0),
            restore(n, 0.0),
        ])
    };

    let (g, n) = graph_with(NodeKind::Rect, "box");
    let mut coarse = player(g, script(n));
    assert_eq!(coarse.run_to_end().unwrap(), 2.0);
    // The save ran at t = 1, halfway through the fade.
    assert_eq!(value(&coarse, n, PropKey::Opacity), Value::Number(0.5));

    let (g, n) = graph_with(NodeKind::Rect, "box");
    let mut fine = player(g, script(n));
    let fps = fine.fps();
    let mut frame = 0;
    while !fine.is_complete() {
        fine.advance_to(fps.frame_time_secs(FrameIndex(frame))).unwrap();
        frame += 1;
    }
    assert_eq!(fine.completed_at(), Some(2.0));
    assert_eq!(fine.graph().state(n).unwrap(), coarse.graph().state(n).unwrap());
}

#[test]
fn save_inside_a_coarse_jump_sees_siblings_at_its_own_time() {
    let (g, a) = graph_with(NodeKind::Rect, "a");
    let script = all([
        delay(0.5, save(a)),
        tween_eased(prop(a, PropKey::Rotation), 100.0, 1.0, Ease::Linear),
    ]);
    let mut p = player(g, script);
    assert_eq!(p.advance_to(5.0).unwrap(), PlayState::Complete);
    let snapshot = p.scene.graph_mut().take_snapshot(a).unwrap();
    assert_eq!(snapshot.get(PropKey::Rotation), Some(&Value::Number(50.0)));
    assert_eq!(value(&p, a, PropKey::Rotation), Value::Number(100.0));
}

#[test]
fn spawn_does_not_block_but_delays_completion() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([
        spawn(tween_eased(prop(n, PropKey::Opacity), 0.0, 2.0, Ease::Linear)),
        tween_eased(prop(n, PropKey::Rotation), 90.0, 0.5, Ease::Linear),
    ]);
    let extent = script.extent();
    assert_eq!(extent.duration, 0.5);
    assert_eq!(extent.settle, 2.0);

    let mut p = player(g, script);
    p.advance_to(0.5).unwrap();
    assert_eq!(value(&p, n, PropKey::Rotation), Value::Number(90.0));
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.75));
    assert_eq!(p.state(), PlayState::Running);
    p.advance_to(2.0).unwrap();
    assert!(p.is_complete());
}

#[test]
fn delay_and_sequence_offset_their_members() {
    let (mut g, a) = graph_with(NodeKind::Rect, "a");
    let b = g.add_node(NodeKind::Rect, None, Some("b")).unwrap();
    let script = all([
        delay(0.5, set(prop(a, PropKey::Opacity), 0.0)),
        sequence(
            0.25,
            [wait(0.0), set(prop(b, PropKey::Opacity), 0.0)],
        ),
    ]);
    let mut p = player(g, script);
    p.advance_to(0.2).unwrap();
    assert_eq!(value(&p, a, PropKey::Opacity), Value::Number(1.0));
    assert_eq!(value(&p, b, PropKey::Opacity), Value::Number(1.0));
    p.advance_to(0.3).unwrap();
    assert_eq!(value(&p, b, PropKey::Opacity), Value::Number(0.0));
    p.advance_to(0.5).unwrap();
    assert_eq!(value(&p, a, PropKey::Opacity), Value::Number(0.0));
    assert!(p.is_complete());
}

#[test]
fn tracked_absolute_tween_keeps_following_the_anchor() {
    let mut g = SceneGraph::new(Canvas::default());
    let parent = g.add_node(NodeKind::Rect, None, Some("parent")).unwrap();
    g.set(parent, Field::whole(PropKey::Position), Value::Vec2(Vec2::new(100.0, 0.0)))
        .unwrap();
    let chip = g.add_node(NodeKind::Rect, Some(parent), Some("chip")).unwrap();
    let anchor = g.add_node(NodeKind::Rect, None, Some("anchor")).unwrap();
    g.set(anchor, Field::whole(PropKey::Position), Value::Vec2(Vec2::new(0.0, 50.0)))
        .unwrap();

    let script = chain([
        track(absolute(chip), Expr::absolute(anchor), 1.0),
        tween_eased(prop(anchor, PropKey::Position), Vec2::new(30.0, 60.0), 1.0, Ease::Linear),
    ]);
    let mut p = player(g, script);
    p.advance_to(1.0).unwrap();
    assert_eq!(
        p.graph().absolute_position(chip).unwrap(),
        Vec2::new(0.0, 50.0)
    );
    p.advance_to(2.0).unwrap();
    let at = p.graph().absolute_position(chip).unwrap();
    assert!((at - Vec2::new(30.0, 60.0)).hypot() < 1e-9);
}

#[test]
fn bind_and_signal_tweens_drive_properties() {
    let (mut g, n) = graph_with(NodeKind::Line, "wire");
    let fade = g
        .add_signal("fade", Slot::Literal(Value::Number(0.0)))
        .unwrap();
    let script = chain([
        bind(prop(n, PropKey::Opacity), Expr::signal(fade)),
        tween_eased(signal(fade), 1.0, 1.0, Ease::Linear),
    ]);
    let mut p = player(g, script);
    p.advance_to(0.5).unwrap();
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.5));
    p.advance_to(1.0).unwrap();
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(1.0));
}

#[test]
fn text_switches_when_the_tween_completes() {
    let (g, n) = graph_with(NodeKind::Text, "label");
    let script = tween_eased(prop(n, PropKey::Text), "Worker", 1.0, Ease::Linear);
    let mut p = player(g, script);
    p.advance_to(0.9).unwrap();
    assert_eq!(value(&p, n, PropKey::Text), Value::Text(String::new()));
    p.advance_to(1.0).unwrap();
    assert_eq!(value(&p, n, PropKey::Text), Value::Text("Worker".into()));
}

#[test]
fn clock_only_moves_forward() {
    let (g, _) = graph_with(NodeKind::Rect, "box");
    let mut p = player(g, wait(1.0));
    p.advance_to(0.5).unwrap();
    let err = p.advance_to(0.25).unwrap_err();
    assert!(matches!(err, ChoreoError::Validation(_)));
    assert!(p.advance_to(f64::NAN).is_err());
}

#[test]
fn run_to_end_reports_settle_time() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = chain([spawn(wait(3.0)), set(prop(n, PropKey::Opacity), 0.5)]);
    let mut p = player(g, script);
    assert_eq!(p.run_to_end().unwrap(), 3.0);
    assert_eq!(value(&p, n, PropKey::Opacity), Value::Number(0.5));
}

#[test]
fn render_emits_full_state_then_changes() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = tween_eased(prop(n, PropKey::Opacity), 0.0, 0.1, Ease::Linear);
    let mut p = Player::new(
        Scene::new("fade", Fps::new(30, 1).unwrap(), g, script),
        PlayerOpts::default(),
    );
    let mut sink = InMemorySink::new();
    let stats = p.render(&mut sink).unwrap();

    // Frames 0..=3 cover 0.1 s at 30 fps.
    assert_eq!(stats.frames, 4);
    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().frames, 4);
    let frame0 = sink.frame(FrameIndex(0)).count();
    assert!(frame0 > 2, "first frame carries every property");
    for f in 1..4 {
        let changed: Vec<_> = sink.frame(FrameIndex(f)).collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].node, "box");
        assert_eq!(changed[0].property, PropKey::Opacity);
    }
    assert_eq!(
        sink.value_at("box", PropKey::Opacity, FrameIndex(3)),
        Some(&Value::Number(0.0))
    );
    assert_eq!(stats.updates, sink.updates.len() as u64);
    assert!(p.render(&mut sink).is_err());
}

#[test]
fn render_can_skip_initial_state_and_pad() {
    let (g, n) = graph_with(NodeKind::Rect, "box");
    let script = delay(0.05, set(prop(n, PropKey::Opacity), 0.0));
    let opts = PlayerOpts {
        fps: Some(Fps::new(20, 1).unwrap()),
        emit_initial_state: false,
        settle_padding_frames: 2,
    };
    let mut p = Player::new(Scene::new("s", Fps::default(), g, script), opts);
    let mut sink = InMemorySink::new();
    let stats = p.render(&mut sink).unwrap();
    assert_eq!(stats.frames, 4);
    assert_eq!(sink.updates.len(), 1);
    assert_eq!(sink.updates[0].frame, FrameIndex(1));
}
