use super::*;

#[test]
fn parses_components_and_camel_case_aliases() {
    assert_eq!(
        Field::parse("width").unwrap(),
        Field {
            prop: PropKey::Size,
            axis: Some(Axis::X)
        }
    );
    assert_eq!(Field::parse("lineWidth").unwrap(), Field::whole(PropKey::LineWidth));
    assert_eq!(Field::parse("color").unwrap(), Field::whole(PropKey::Fill));
    assert_eq!(Field::parse("end_arrow").unwrap(), Field::whole(PropKey::EndArrow));
}

#[test]
fn unknown_field_is_a_construction_error() {
    let err = Field::parse("wobble").unwrap_err();
    assert!(err.to_string().contains("construction error: unknown property 'wobble'"));
}

#[test]
fn component_fields_are_numbers() {
    assert_eq!(Field::parse("y").unwrap().value_kind(), ValueKind::Number);
    assert_eq!(Field::parse("position").unwrap().value_kind(), ValueKind::Vec2);
}

#[test]
fn defaults_cover_kind_specific_properties() {
    let circle = NodeKind::Circle.defaults();
    assert!(circle.iter().any(|(k, v)| *k == PropKey::EndAngle && *v == Value::Number(360.0)));

    let group = NodeKind::Group.defaults();
    assert!(!group.iter().any(|(k, _)| *k == PropKey::Fill));

    for kind in [NodeKind::Rect, NodeKind::Line, NodeKind::Text, NodeKind::Icon] {
        for (key, value) in kind.defaults() {
            assert_eq!(key.value_kind(), value.kind(), "{kind:?} {key}");
        }
    }
}

#[test]
fn axis_reads_and_replaces_components() {
    let v = Vec2::new(1.0, 2.0);
    assert_eq!(Axis::Y.get(v), 2.0);
    assert_eq!(Axis::X.with(v, 5.0), Vec2::new(5.0, 2.0));
}
