mod common;

use common::{demo_runtime, demo_runtime_with};
use embercore::config::RuntimeConfig;
use embercore::demo::{events, fields};

#[test]
fn field_set_then_cleared_by_unrelated_dispatch() {
    let mut rt = demo_runtime();
    rt.dispatch(0x1000, &[]).unwrap();
    assert!(rt.field_changed(fields::COUNTER));

    rt.dispatch(events::TODO_ADD, b"Buy milk").unwrap();
    assert!(!rt.field_changed(fields::COUNTER));
    assert!(rt.field_changed(fields::TODOS));
}

#[test]
fn nothing_changed_before_first_dispatch() {
    let rt = demo_runtime();
    for id in 0..64 {
        assert!(!rt.field_changed(id));
    }
    assert_eq!(rt.diff().change_count, 0);
}

#[test]
fn out_of_range_field_is_false() {
    let mut config = RuntimeConfig::default();
    config.tracker.max_fields = 2;
    let mut rt = demo_runtime_with(config);
    rt.dispatch(events::TODO_ADD, b"x").unwrap();
    assert!(!rt.field_changed(fields::TODOS));
    assert!(!rt.field_changed(u16::MAX));
}

#[test]
fn process_call_reports_union_of_its_transitions() {
    let mut rt = demo_runtime();
    rt.dispatch(0x0200, &1u32.to_le_bytes()).unwrap();
    rt.queue_event(0x1000, &[], 1).unwrap();
    rt.queue_event(events::TODO_ADD, b"x", 1).unwrap();
    rt.process_events(2);

    assert!(rt.field_changed(fields::COUNTER));
    assert!(rt.field_changed(fields::TODOS));
    assert!(!rt.field_changed(fields::SCREEN));

    let diff = rt.diff();
    assert_eq!(diff.version, 3);
    assert_eq!(diff.change_count, 2);
    assert_eq!(
        diff.changed_mask,
        (1 << fields::COUNTER) | (1 << fields::TODOS)
    );
}

#[test]
fn inert_dispatch_keeps_previous_bits() {
    let mut rt = demo_runtime();
    rt.dispatch(0x1000, &[]).unwrap();
    rt.dispatch(0x4242_0000, &[]).unwrap();
    assert!(rt.field_changed(fields::COUNTER));
}

#[test]
fn failed_dispatch_keeps_previous_bits() {
    let mut rt = demo_runtime();
    rt.dispatch(0x1000, &[]).unwrap();
    assert!(rt.dispatch(events::TODO_ADD, b"").is_err());
    assert!(rt.field_changed(fields::COUNTER));
    assert!(!rt.field_changed(fields::TODOS));
}

#[test]
fn empty_drain_clears_previous_dispatch() {
    let mut rt = demo_runtime();
    rt.dispatch(0x1000, &[]).unwrap();
    assert!(rt.field_changed(fields::COUNTER));

    let report = rt.process_events(10);
    assert_eq!(report.processed, 0);
    assert!(!rt.field_changed(fields::COUNTER));
    assert_eq!(rt.diff().change_count, 0);
    assert_eq!(rt.diff().version, 1);
}

#[test]
fn drain_of_inert_and_failed_events_reports_nothing_changed() {
    let mut rt = demo_runtime();
    rt.dispatch(events::TODO_ADD, b"Buy milk").unwrap();
    rt.queue_event(0x7777, &[], 1).unwrap();
    rt.queue_event(events::TODO_ADD, b"", 1).unwrap();

    let report = rt.process_events(10);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert!(!rt.field_changed(fields::TODOS));
    assert_eq!(rt.version(), 1);
}
