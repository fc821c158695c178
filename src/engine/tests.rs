//! Tests for the learn protocol and dispatch through the engine

use super::*;
use crate::focus::Linkable;
use crate::midi::{InboundMessage, NOTE_ON};
use crate::params::{ParamNode, ParameterGroup};
use std::sync::Arc;

fn make_tree() -> ParameterGroup {
    let mut root = ParameterGroup::root();
    let mixer = root.group("mixer");
    mixer.float("volume", 0.0, 100.0, 0.0);
    mixer.int("scene", 0, 10, 0);
    mixer.bool("mute", false);
    root.trigger("tap");
    root.text("label", "main");
    root
}

fn cc(control: u8, value: u8) -> InboundMessage {
    InboundMessage::control_change("nano", 1, control, value)
}

#[test]
fn test_learn_capture_then_no_relearn() {
    let root = make_tree();
    let volume = root.find("mixer/volume").unwrap();
    let (_tx, mut engine) = LinkEngine::new();

    engine.request_link(&volume).unwrap();
    let first = engine.process_message(&cc(7, 126));

    assert_eq!(first.learned.as_deref(), Some("mixer/volume"));
    assert_eq!(first.effect, Effect::Written);
    assert!(engine.learn_queue().is_empty());
    assert_eq!(engine.links().len(), 1);
    assert_eq!(volume.as_float(), Some(100.0));

    let second = engine.process_message(&cc(7, 63));
    assert_eq!(second.learned, None);
    assert_eq!(volume.as_float(), Some(50.0));
}

#[test]
fn test_learn_queue_is_fifo() {
    let root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();

    engine.request_link(&root.find("mixer/volume").unwrap()).unwrap();
    engine.request_link(&root.find("mixer/mute").unwrap()).unwrap();
    assert_eq!(
        engine.learn_queue().pending_names(),
        vec!["mixer/volume", "mixer/mute"]
    );

    assert_eq!(
        engine.process_message(&cc(20, 0)).learned.as_deref(),
        Some("mixer/volume")
    );
    assert_eq!(
        engine.process_message(&cc(21, 0)).learned.as_deref(),
        Some("mixer/mute")
    );

    let names = engine.links().to_names();
    assert_eq!(names["nano:176:1:20"], "mixer/volume");
    assert_eq!(names["nano:176:1:21"], "mixer/mute");
}

#[test]
fn test_bound_control_does_not_consume_learn_request() {
    let root = make_tree();
    let volume = root.find("mixer/volume").unwrap();
    let (_tx, mut engine) = LinkEngine::new();

    engine.request_link(&volume).unwrap();
    engine.process_message(&cc(1, 0));

    engine.request_link(&root.find("mixer/scene").unwrap()).unwrap();

    // the already-bound knob keeps driving volume, scene stays queued
    let moved = engine.process_message(&cc(1, 126));
    assert_eq!(moved.learned, None);
    assert_eq!(volume.as_float(), Some(100.0));
    assert_eq!(engine.learn_queue().len(), 1);

    // the next unbound control takes it
    let learned = engine.process_message(&cc(2, 63));
    assert_eq!(learned.learned.as_deref(), Some("mixer/scene"));
    assert_eq!(root.find("mixer/scene").unwrap().as_int(), Some(5));
}

#[test]
fn test_unlinked_message_is_silent() {
    let (_tx, mut engine) = LinkEngine::new();

    let processed = engine.process_message(&cc(9, 100));

    assert_eq!(processed.effect, Effect::Unlinked);
    assert_eq!(processed.learned, None);
    assert!(engine.links().is_empty());
}

#[test]
fn test_unsupported_type_is_not_queued() {
    let root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();

    let err = engine
        .request_link(&root.find("label").unwrap())
        .unwrap_err();

    assert!(matches!(
        err,
        LinkError::UnsupportedParameterType { ref name, .. } if name == "label"
    ));
    assert!(engine.learn_queue().is_empty());
}

#[test]
fn test_update_drains_in_arrival_order() {
    let root = make_tree();
    let volume = root.find("mixer/volume").unwrap();
    let (tx, mut engine) = LinkEngine::new();
    engine.request_link(&volume).unwrap();

    tx.enqueue(cc(7, 0));
    tx.enqueue(cc(7, 126));
    tx.enqueue(cc(7, 63));
    assert_eq!(engine.queued(), 3);

    let processed = engine.update();

    assert_eq!(processed.len(), 3);
    assert!(processed[0].learned.is_some());
    assert!(processed.iter().all(|p| p.effect == Effect::Written));
    assert_eq!(volume.as_float(), Some(50.0));
    assert_eq!(volume.revision(), 3);
    assert!(engine.update().is_empty());
}

#[test]
fn test_bool_toggle_and_slider_through_engine() {
    let root = make_tree();
    let mute = root.find("mixer/mute").unwrap();
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&mute).unwrap();

    // button: press toggles, release does nothing
    engine.process_message(&cc(40, 127));
    assert_eq!(mute.as_bool(), Some(true));
    engine.process_message(&cc(40, 0));
    engine.process_message(&cc(40, 127));
    assert_eq!(mute.as_bool(), Some(false));

    // slider on the same control: 70 sets, 80 is a no-op, 127 ends the sweep
    assert_eq!(engine.process_message(&cc(40, 70)).effect, Effect::Written);
    let revision = mute.revision();
    assert_eq!(engine.process_message(&cc(40, 80)).effect, Effect::Unchanged);
    assert_eq!(engine.process_message(&cc(40, 127)).effect, Effect::Unchanged);
    assert_eq!(mute.as_bool(), Some(true));
    assert_eq!(mute.revision(), revision);
}

#[test]
fn test_sweep_tracking_is_per_control() {
    let mut root = ParameterGroup::root();
    let a = root.bool("a", false);
    let b = root.bool("b", false);
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&a).unwrap();
    engine.request_link(&b).unwrap();
    engine.process_message(&cc(1, 0));
    engine.process_message(&cc(2, 0));

    // a slider value on control 1 does not turn control 2's 127 into a sweep
    engine.process_message(&cc(1, 100));
    engine.process_message(&cc(2, 127));

    assert_eq!(a.as_bool(), Some(true));
    assert_eq!(b.as_bool(), Some(true));
    engine.process_message(&cc(2, 127));
    assert_eq!(b.as_bool(), Some(false));
}

#[test]
fn test_trigger_through_engine() {
    let root = make_tree();
    let tap = root.find("tap").unwrap();
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&tap).unwrap();

    let note = |velocity| InboundMessage::new("pads", NOTE_ON, 10, 36, velocity);
    assert_eq!(engine.process_message(&note(1)).effect, Effect::Fired);
    assert_eq!(engine.process_message(&note(0)).effect, Effect::Ignored);
    assert_eq!(tap.fire_count(), 1);
}

#[test]
fn test_same_control_on_other_port_is_distinct() {
    let root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&root.find("mixer/volume").unwrap()).unwrap();
    engine.process_message(&cc(7, 0));

    let other = InboundMessage::control_change("other", 1, 7, 100);
    assert_eq!(engine.process_message(&other).effect, Effect::Unlinked);
}

#[test]
fn test_stale_link_is_skipped() {
    let mut root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&root.find("tap").unwrap()).unwrap();
    engine.process_message(&cc(5, 0));

    root.remove("tap");

    let processed = engine.process_message(&cc(5, 127));
    assert_eq!(processed.effect, Effect::Stale);
    // still described by its path
    assert_eq!(engine.links().to_names()["nano:176:1:5"], "tap");
}

#[test]
fn test_stale_learn_request_is_dropped() {
    let mut root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();
    engine.request_link(&root.find("tap").unwrap()).unwrap();
    engine.request_link(&root.find("mixer/volume").unwrap()).unwrap();

    root.remove("tap");

    let processed = engine.process_message(&cc(3, 126));
    assert_eq!(processed.learned.as_deref(), Some("mixer/volume"));
    assert!(engine.learn_queue().is_empty());
}

#[test]
fn test_link_focused() {
    let root = make_tree();
    let (_tx, mut engine) = LinkEngine::new();

    let group = root.node("mixer").unwrap().clone();
    let mute = root.node("mixer/mute").unwrap().clone();
    let label: Arc<crate::params::Parameter> = root.find("label").unwrap();

    assert!(!engine.link_focused(None).unwrap());
    assert!(!engine.link_focused(Some(&group as &dyn Linkable)).unwrap());
    assert!(engine.link_focused(Some(&mute as &dyn Linkable)).unwrap());
    assert!(engine.link_focused(Some(&label as &dyn Linkable)).is_err());

    assert_eq!(engine.learn_queue().pending_names(), vec!["mixer/mute"]);
    assert!(matches!(mute, ParamNode::Parameter(_)));
}
