use super::*;

#[test]
fn numbers_and_vectors_interpolate() {
    let v = Value::interpolate(&Value::Number(0.0), &Value::Number(10.0), 0.25).unwrap();
    assert_eq!(v, Value::Number(2.5));

    let v = Value::interpolate(
        &Value::Vec2(Vec2::ZERO),
        &Value::Vec2(Vec2::new(250.0, 50.0)),
        0.5,
    )
    .unwrap();
    assert_eq!(v, Value::Vec2(Vec2::new(125.0, 25.0)));
}

#[test]
fn step_kinds_hold_until_the_end() {
    let a = Value::Bool(false);
    let b = Value::Bool(true);
    assert_eq!(Value::interpolate(&a, &b, 0.99).unwrap(), a);
    assert_eq!(Value::interpolate(&a, &b, 1.0).unwrap(), b);

    let a = Value::from("Requests");
    let b = Value::from("Done");
    assert_eq!(Value::interpolate(&a, &b, 0.5).unwrap(), a);
}

#[test]
fn point_lists_interpolate_pairwise_when_lengths_match() {
    let a = Value::Points(vec![Vec2::ZERO, Vec2::ZERO]);
    let b = Value::Points(vec![Vec2::ZERO, Vec2::new(270.0, 0.0)]);
    let mid = Value::interpolate(&a, &b, 0.5).unwrap();
    assert_eq!(mid, Value::Points(vec![Vec2::ZERO, Vec2::new(135.0, 0.0)]));

    let short = Value::Points(vec![Vec2::ZERO]);
    assert_eq!(Value::interpolate(&short, &b, 0.5).unwrap(), short);
}

#[test]
fn mismatched_kinds_are_authoring_errors() {
    let err = Value::interpolate(&Value::Number(1.0), &Value::Bool(true), 0.5).unwrap_err();
    assert!(err.is_authoring());
    assert!(err.to_string().contains("expected a number value, got bool"));
}

#[test]
fn serializes_compactly() {
    let v = serde_json::to_value(Value::Vec2(Vec2::new(1.0, 2.0))).unwrap();
    assert_eq!(v, serde_json::json!([1.0, 2.0]));
    let v = serde_json::to_value(Value::Color(crate::style::color::Color::WHITE)).unwrap();
    assert_eq!(v, serde_json::json!("#ffffffff"));
}
