use super::*;

#[test]
fn set_is_an_instant_linear_tween() {
    let s = set(prop(NodeId(1), PropKey::Opacity), 0.0);
    let Step::Tween(t) = s else {
        panic!("expected tween");
    };
    assert_eq!(t.duration, 0.0);
    assert_eq!(t.ease, Ease::Linear);
    assert_eq!(t.to, EndValue::Literal(Value::Number(0.0)));
}

#[test]
fn repeat_unrolls_into_a_chain() {
    let s = repeat(3, wait(0.5));
    assert_eq!(s, Step::Chain(vec![wait(0.5), wait(0.5), wait(0.5)]));
    assert_eq!(s.duration(), 1.5);
    assert_eq!(repeat(0, wait(1.0)).duration(), 0.0);
}

#[test]
fn track_uses_the_smooth_default() {
    let s = track(absolute(NodeId(2)), Expr::absolute(NodeId(3)), 1.0);
    let Step::Tween(t) = s else {
        panic!("expected tween");
    };
    assert_eq!(t.ease, Ease::InOutCubic);
    assert!(matches!(t.to, EndValue::Track(Expr::Absolute(NodeId(3)))));
}
