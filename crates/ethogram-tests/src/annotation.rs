//! Integration tests for the annotation subsystem.
//!
//! Drives the recorder against a live playback cursor, the way the
//! operator console does, and round-trips the persisted document.

use ethogram_annotate::{
    AnnotationDocument, AnnotationRecorder, AnnotationRegistry, BehaviorDef, BehaviorKind,
    Interval, KeyOutcome, QUIT_KEY,
};
use ethogram_core::{Color, EthogramError, FrameRate};
use ethogram_media::{FrameCache, VideoSource};
use ethogram_playback::PlaybackCursor;

// ── Helpers ────────────────────────────────────────────────────

fn make_cursor(total: u64) -> PlaybackCursor {
    let source = VideoSource::synthetic(total, FrameRate::FPS_30, 64, 8);
    PlaybackCursor::new(FrameCache::new(Box::new(source), 16))
}

fn press(
    recorder: &mut AnnotationRecorder,
    registry: &mut AnnotationRegistry,
    cursor: &PlaybackCursor,
    key: char,
) -> ethogram_core::Result<KeyOutcome> {
    recorder.handle_key(key, cursor.current_frame(), registry)
}

// ── Recording against a live cursor ────────────────────────────

#[test]
fn state_recording_follows_the_cursor() {
    let mut cursor = make_cursor(1000);
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    let mut recorder = AnnotationRecorder::new();
    let key = recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("walk", BehaviorKind::State, Color::RED),
        )
        .unwrap();

    cursor.seek(10).unwrap();
    let outcome = press(&mut recorder, &mut registry, &cursor, key).unwrap();
    assert_eq!(
        outcome,
        KeyOutcome::Started {
            behavior: "walk".into(),
            start_frame: 10,
        }
    );
    assert_eq!(recorder.pending().unwrap().start_frame, 10);

    cursor.seek(40).unwrap();
    let outcome = press(&mut recorder, &mut registry, &cursor, key).unwrap();
    assert_eq!(
        outcome,
        KeyOutcome::IntervalClosed {
            behavior: "walk".into(),
            start_frame: 10,
            end_frame: 40,
        }
    );
    assert!(recorder.pending().is_none());
    assert_eq!(
        registry.intervals("walk").unwrap(),
        &[Interval::closed(10, 40)]
    );
}

#[test]
fn mismatched_state_keys_record_nothing() {
    let cursor = make_cursor(1000);
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    let mut recorder = AnnotationRecorder::new();
    let k1 = recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("walk", BehaviorKind::State, Color::RED),
        )
        .unwrap();
    let k2 = recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("groom", BehaviorKind::State, Color::GREEN),
        )
        .unwrap();

    press(&mut recorder, &mut registry, &cursor, k1).unwrap();
    let err = press(&mut recorder, &mut registry, &cursor, k2).unwrap_err();
    assert!(matches!(err, EthogramError::KeyMismatch { .. }));
    assert_eq!(registry.interval_count(), 0);

    // Quit, then the other behavior records normally.
    press(&mut recorder, &mut registry, &cursor, QUIT_KEY).unwrap();
    press(&mut recorder, &mut registry, &cursor, k2).unwrap();
    press(&mut recorder, &mut registry, &cursor, k2).unwrap();
    assert_eq!(registry.intervals("groom").unwrap().len(), 1);
    assert_eq!(registry.intervals("walk").unwrap().len(), 0);
}

#[test]
fn event_presses_tag_the_current_frame() {
    let mut cursor = make_cursor(1000);
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    let mut recorder = AnnotationRecorder::new();
    let key = recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("blink", BehaviorKind::Event, Color::BLUE),
        )
        .unwrap();

    for frame in [3, 17, 17, 240] {
        cursor.seek(frame).unwrap();
        press(&mut recorder, &mut registry, &cursor, key).unwrap();
    }

    let intervals = registry.intervals("blink").unwrap();
    assert_eq!(intervals.len(), 4);
    let starts: Vec<u64> = intervals.iter().map(|i| i.start).collect();
    assert_eq!(starts, vec![3, 17, 17, 240]);
    assert!(intervals.iter().all(|i| i.end_frame() == i.start));
}

// ── Document round-trip through a full session ─────────────────

#[test]
fn recorded_session_roundtrips_through_document() {
    let mut cursor = make_cursor(1000);
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    let mut recorder = AnnotationRecorder::new();
    recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("walk", BehaviorKind::State, Color::RED).with_note("locomotion"),
        )
        .unwrap();
    recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("blink", BehaviorKind::Event, Color::BLUE),
        )
        .unwrap();

    cursor.seek(10).unwrap();
    press(&mut recorder, &mut registry, &cursor, 'q').unwrap();
    cursor.seek(40).unwrap();
    press(&mut recorder, &mut registry, &cursor, 'q').unwrap();
    cursor.seek(100).unwrap();
    press(&mut recorder, &mut registry, &cursor, 'w').unwrap();

    let doc = AnnotationDocument::from_registry(&registry);
    let json = doc.to_json().unwrap();
    let loaded = AnnotationDocument::from_json(&json).unwrap();
    assert_eq!(loaded, doc);

    let restored = loaded.into_registry().unwrap();
    assert_eq!(restored.max_frames(), 1000);
    assert_eq!(
        restored.intervals("walk").unwrap(),
        &[Interval::closed(10, 40)]
    );
    assert_eq!(
        restored.intervals("blink").unwrap(),
        &[Interval::closed(100, 100)]
    );
    assert_eq!(restored.behavior("walk").unwrap().note, "locomotion");

    // A fresh recorder over the restored registry binds the same keys.
    let mut rebound = AnnotationRecorder::new();
    rebound.rebind_from(&restored).unwrap();
    assert_eq!(rebound.keys().key_for("blink"), Some('q'));
    assert_eq!(rebound.keys().key_for("walk"), Some('w'));
}

#[test]
fn document_field_shapes_match_the_wire_format() {
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    registry
        .register(BehaviorDef::new("walk", BehaviorKind::State, Color::RED))
        .unwrap();
    registry.record_interval("walk", 10, Some(40)).unwrap();
    registry.record_interval("walk", 55, None).unwrap();

    let doc = AnnotationDocument::from_registry(&registry);
    let json: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();

    assert_eq!(json["video_path"], "clip.mp4");
    assert_eq!(json["max_frames"], 1000);
    assert_eq!(json["behav_info"]["walk"]["behavior_type"], "State");
    assert_eq!(json["behav_info"]["walk"]["behavior_color"], "#ff0000");
    assert_eq!(
        json["behav_frames"]["walk"],
        serde_json::json!([[10, 40], [55]])
    );
}

// ── Key-slot exhaustion across the session boundary ────────────

#[test]
fn thirteen_behaviors_overflow_the_key_table() {
    let mut registry = AnnotationRegistry::new("clip.mp4", 1000);
    let mut recorder = AnnotationRecorder::new();
    for i in 0..12 {
        recorder
            .register_and_bind(
                &mut registry,
                BehaviorDef::new(format!("behavior{i}"), BehaviorKind::State, Color::WHITE),
            )
            .unwrap();
    }
    let err = recorder
        .register_and_bind(
            &mut registry,
            BehaviorDef::new("behavior12", BehaviorKind::State, Color::WHITE),
        )
        .unwrap_err();
    assert!(matches!(err, EthogramError::NoKeySlotAvailable));
    assert_eq!(registry.behavior_count(), 12);

    // A document with 12 behaviors still re-binds cleanly.
    let doc = AnnotationDocument::from_registry(&registry);
    let restored = doc.into_registry().unwrap();
    let mut rebound = AnnotationRecorder::new();
    rebound.rebind_from(&restored).unwrap();
    assert_eq!(rebound.keys().len(), 12);
}
