use super::*;
use crate::timeline::ops::{all, chain, delay, prop, restore, save, sequence, spawn, tween, wait};
use crate::scene::property::PropKey;

fn node() -> NodeId {
    NodeId(1)
}

#[test]
fn chain_duration_is_the_sum() {
    let s = chain([
        tween(prop(node(), PropKey::Opacity), 1.0, 0.5),
        wait(0.25),
        restore(node(), 1.0),
    ]);
    assert_eq!(s.duration(), 1.75);
}

#[test]
fn all_duration_is_the_max() {
    let s = all([
        tween(prop(node(), PropKey::Opacity), 0.0, 0.5),
        tween(prop(node(), PropKey::Rotation), 90.0, 1.2),
        save(node()),
    ]);
    assert_eq!(s.duration(), 1.2);
    assert_eq!(all([]).duration(), 0.0);
}

#[test]
fn spawn_has_no_duration_but_extends_settle() {
    let s = chain([spawn(wait(2.0)), wait(0.5)]);
    let e = s.extent();
    assert_eq!(e.duration, 0.5);
    assert_eq!(e.settle, 2.0);

    let late = chain([wait(1.0), spawn(wait(2.0))]);
    assert_eq!(late.extent().settle, 3.0);
}

#[test]
fn delay_and_sequence_offsets() {
    assert_eq!(delay(0.5, wait(1.0)).duration(), 1.5);
    let s = sequence(0.25, [wait(1.0), wait(1.0), wait(0.1)]);
    assert_eq!(s.duration(), 1.25);
}

#[test]
fn negative_durations_count_as_zero() {
    assert_eq!(wait(-1.0).duration(), 0.0);
}
