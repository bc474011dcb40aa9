//! Integration tests for the playback subsystem.
//!
//! Exercises the cursor and the prefetch cache together, including the
//! background worker.

use ethogram_core::{EthogramError, FrameRate};
use ethogram_media::{stamped_index, FrameCache, VideoSource};
use ethogram_playback::PlaybackCursor;
use std::time::{Duration, Instant};

// ── Helpers ────────────────────────────────────────────────────

fn make_cache(total: u64, capacity: usize) -> FrameCache {
    let source = VideoSource::synthetic(total, FrameRate::FPS_30, 64, 8);
    FrameCache::new(Box::new(source), capacity)
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

// ── Miss-bound property ────────────────────────────────────────

#[test]
fn sequential_stepping_misses_once_per_discontinuity() {
    let cache = make_cache(1000, 32);
    let mut cursor = PlaybackCursor::new(cache.clone());

    // Prefetch warms from frame 0, so sequential stepping never misses.
    for _ in 0..50 {
        while cache.prefetch_tick() {}
        cursor.step(1).unwrap();
    }
    assert_eq!(cache.stats().misses, 0);

    // A scrub is one discontinuity: exactly one miss, then sequential
    // stepping hits again.
    cursor.seek(500).unwrap();
    assert_eq!(cache.stats().misses, 1);
    for _ in 0..50 {
        while cache.prefetch_tick() {}
        cursor.step(1).unwrap();
    }
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn stepping_with_background_worker() {
    let cache = make_cache(1000, 32);
    let worker = cache
        .spawn_prefetch_with_interval(Duration::from_millis(1))
        .unwrap();
    let mut cursor = PlaybackCursor::new(cache.clone());

    for i in 1..=100u64 {
        let frame = cursor.step(1).unwrap();
        assert_eq!(stamped_index(&frame), Some(i));
    }
    worker.stop();
    // The worker may not always be ahead of the playhead, but every
    // served frame was the right one and the window stayed bounded.
    let (start, end) = cache.stats().window;
    assert!(end - start <= 32);
}

// ── Seek semantics ─────────────────────────────────────────────

#[test]
fn seek_then_read_returns_anchored_frame() {
    let cache = make_cache(1000, 32);
    for _ in 0..20 {
        cache.prefetch_tick();
    }
    let frame = cache.invalidate_and_seek(700).unwrap();
    assert_eq!(stamped_index(&frame), Some(700));
    let frame = cache.read(700).unwrap();
    assert_eq!(stamped_index(&frame), Some(700));
    assert_eq!(cache.stats().window.0, 700);
}

#[test]
fn prefetch_resumes_from_seek_target() {
    let cache = make_cache(1000, 32);
    let mut cursor = PlaybackCursor::new(cache.clone());
    cursor.seek(300).unwrap();
    while cache.prefetch_tick() {}
    let frame = cursor.step(1).unwrap();
    assert_eq!(stamped_index(&frame), Some(301));
    assert_eq!(cache.stats().misses, 1); // the seek itself
}

// ── Range boundaries ───────────────────────────────────────────

#[test]
fn boundary_stepping_scenario() {
    let cache = make_cache(1000, 32);
    let mut cursor = PlaybackCursor::new(cache);
    assert_eq!(cursor.frame_rate(), FrameRate::FPS_30);

    cursor.seek(999).unwrap();
    assert!(matches!(
        cursor.step(1),
        Err(EthogramError::OutOfRange { .. })
    ));
    assert_eq!(cursor.current_frame(), 999);

    cursor.seek(998).unwrap();
    let frame = cursor.step(1).unwrap();
    assert_eq!(cursor.current_frame(), 999);
    assert_eq!(stamped_index(&frame), Some(999));
}

// ── Auto-play over the cache ───────────────────────────────────

#[test]
fn auto_play_drains_to_end() {
    let source = VideoSource::synthetic(10, FrameRate::new(200, 1), 64, 8);
    let cache = FrameCache::new(Box::new(source), 16);
    let worker = cache
        .spawn_prefetch_with_interval(Duration::from_millis(1))
        .unwrap();
    let mut cursor = PlaybackCursor::new(cache);

    assert!(cursor.toggle_play());
    assert!(
        wait_until(Duration::from_secs(3), || !cursor.is_playing()),
        "playback never finished"
    );
    assert_eq!(cursor.current_frame(), 9);
    worker.stop();
}
