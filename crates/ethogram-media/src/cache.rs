//! Sliding-window frame cache with background prefetch.
//!
//! The cache owns the `FrameSource` and a bounded, contiguous window
//! `[range_start, range_end)` of decoded frames anchored near the playback
//! position. A background worker decodes ahead of the playhead; consumer
//! reads inside the window are copy-outs, reads outside it take the miss
//! path (direct seek-and-decode, window reset). Eviction is strict FIFO:
//! the access pattern is sequential playback with occasional jumps, and a
//! jump resets the window anyway.
//!
//! One lock guards both the window and the source. Decode runs under the
//! lock (the source is not reentrant) but always returns promptly.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use ethogram_core::{defaults, FrameBuffer, FrameRate, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::source::FrameSource;

/// Cache occupancy and hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the window.
    pub hits: u64,
    /// Reads that took the seek-and-decode path.
    pub misses: u64,
    /// Current window bounds `[start, end)`.
    pub window: (u64, u64),
}

struct CacheInner {
    source: Box<dyn FrameSource>,
    window: VecDeque<FrameBuffer>,
    range_start: u64,
    range_end: u64,
    last_served: u64,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    /// Miss path: direct seek-and-decode, window reset anchored at `index`.
    fn reseek(&mut self, index: u64) -> Result<FrameBuffer> {
        self.misses += 1;
        let native = self.source.seek_and_decode(index)?;
        self.window.clear();
        self.window.push_back(native.clone());
        self.range_start = index;
        self.range_end = index + 1;
        self.last_served = index;
        Ok(native.to_rgb())
    }
}

/// Shared handle to the frame cache.
///
/// Cloning is cheap; all clones address the same window. Metadata
/// (frame count, rate, dimensions) is fixed at construction, bound to
/// the one video the source decodes.
#[derive(Clone)]
pub struct FrameCache {
    inner: Arc<Mutex<CacheInner>>,
    capacity: usize,
    total_frames: u64,
    frame_rate: FrameRate,
    dimensions: (u32, u32),
}

impl FrameCache {
    /// Create a cache over `source` holding at most `capacity` frames.
    pub fn new(source: Box<dyn FrameSource>, capacity: usize) -> Self {
        let total_frames = source.total_frames();
        let frame_rate = source.frame_rate();
        let dimensions = source.dimensions();
        info!(
            "frame cache ready: {} frames, {}, window capacity {}",
            total_frames, frame_rate, capacity
        );
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                source,
                window: VecDeque::with_capacity(capacity),
                range_start: 0,
                range_end: 0,
                last_served: 0,
                hits: 0,
                misses: 0,
            })),
            capacity: capacity.max(1),
            total_frames,
            frame_rate,
            dimensions,
        }
    }

    /// Create a cache with the default window capacity.
    pub fn with_default_capacity(source: Box<dyn FrameSource>) -> Self {
        Self::new(source, defaults::FRAME_WINDOW_CAPACITY)
    }

    /// Total frame count of the underlying video.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frame rate of the underlying video.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Frame dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Read the frame at `index`, converted to the presentation format.
    ///
    /// A window hit is a copy-out; anything else is a miss: a direct
    /// seek-and-decode that resets the window anchored at `index`.
    pub fn read(&self, index: u64) -> Result<FrameBuffer> {
        let mut inner = self.inner.lock();
        if inner.range_start <= index && index < inner.range_end {
            let offset = (index - inner.range_start) as usize;
            inner.hits += 1;
            inner.last_served = index;
            Ok(inner.window[offset].to_rgb())
        } else {
            inner.reseek(index)
        }
    }

    /// Explicit random seek: always takes the miss path and resets the
    /// window, discarding any prefetched frames.
    pub fn invalidate_and_seek(&self, index: u64) -> Result<FrameBuffer> {
        self.inner.lock().reseek(index)
    }

    /// One prefetch step. Returns whether a frame was decoded.
    ///
    /// No-op when the window's trailing edge is already more than half
    /// the capacity ahead of the last-served index (back-pressure), at
    /// end of stream, and on transient decode failures.
    pub fn prefetch_tick(&self) -> bool {
        let mut inner = self.inner.lock();
        let lead = inner.range_end.saturating_sub(inner.last_served);
        if lead > (self.capacity / 2) as u64 {
            return false;
        }
        match inner.source.decode_next() {
            Ok(Some(frame)) => {
                if inner.window.len() == self.capacity {
                    inner.window.pop_front();
                    inner.range_start += 1;
                }
                inner.window.push_back(frame);
                inner.range_end += 1;
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("prefetch decode failed, will retry: {}", e);
                false
            }
        }
    }

    /// Current counters and window bounds.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            window: (inner.range_start, inner.range_end),
        }
    }

    /// Start the background prefetch worker.
    ///
    /// The worker ticks at the default poll interval until the returned
    /// handle is dropped or stopped. Dropping the handle joins the
    /// thread.
    pub fn spawn_prefetch(&self) -> Result<PrefetchHandle> {
        self.spawn_prefetch_with_interval(Duration::from_millis(defaults::PREFETCH_POLL_MS))
    }

    /// Start the background prefetch worker with an explicit poll interval.
    pub fn spawn_prefetch_with_interval(&self, poll: Duration) -> Result<PrefetchHandle> {
        let cache = self.clone();
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = std::thread::Builder::new()
            .name("frame-prefetch".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(poll) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        cache.prefetch_tick();
                    }
                }
            })?;
        Ok(PrefetchHandle {
            stop_tx,
            thread: Some(thread),
        })
    }
}

/// Owns the prefetch worker thread. Stops and joins it on drop.
pub struct PrefetchHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PrefetchHandle {
    /// Stop the worker and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PrefetchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{stamped_index, synthetic_frame, VideoSource};
    use ethogram_core::{EthogramError, PixelFormat};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn cache(total: u64, capacity: usize) -> FrameCache {
        let source = VideoSource::synthetic(total, FrameRate::FPS_30, 64, 8);
        FrameCache::new(Box::new(source), capacity)
    }

    /// Fill the window as far as back-pressure allows.
    fn drain_prefetch(cache: &FrameCache) {
        while cache.prefetch_tick() {}
    }

    #[test]
    fn test_read_converts_to_rgb() {
        let cache = cache(10, 4);
        let frame = cache.read(0).unwrap();
        assert_eq!(frame.format, PixelFormat::Rgb8);
        assert_eq!(stamped_index(&frame), Some(0));
    }

    #[test]
    fn test_first_read_is_a_miss() {
        let cache = cache(10, 4);
        cache.read(0).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.window, (0, 1));
    }

    #[test]
    fn test_sequential_reads_hit_after_prefetch() {
        let cache = cache(100, 16);
        cache.read(0).unwrap();
        for i in 1..40u64 {
            drain_prefetch(&cache);
            let frame = cache.read(i).unwrap();
            assert_eq!(stamped_index(&frame), Some(i));
        }
        // One discontinuity (the initial read), no further misses.
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 39);
    }

    #[test]
    fn test_backpressure_half_capacity() {
        let cache = cache(100, 8);
        // last_served is 0; the window may run at most 4 ahead.
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(!cache.prefetch_tick());
        assert_eq!(cache.stats().window, (0, 5));
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let cache = cache(100, 4);
        for i in 0..60u64 {
            drain_prefetch(&cache);
            cache.read(i).unwrap();
            let (start, end) = cache.stats().window;
            assert!(end - start <= 4, "window {}..{} over capacity", start, end);
        }
    }

    #[test]
    fn test_eviction_is_fifo() {
        let cache = cache(100, 4);
        cache.read(0).unwrap();
        for i in 1..10u64 {
            drain_prefetch(&cache);
            cache.read(i).unwrap();
        }
        // Frame 0 slid out of the window long ago.
        let (start, _) = cache.stats().window;
        assert!(start > 0);
        let misses_before = cache.stats().misses;
        cache.read(0).unwrap();
        assert_eq!(cache.stats().misses, misses_before + 1);
    }

    #[test]
    fn test_invalidate_and_seek_resets_window() {
        let cache = cache(100, 16);
        cache.read(0).unwrap();
        drain_prefetch(&cache);
        let frame = cache.invalidate_and_seek(50).unwrap();
        assert_eq!(stamped_index(&frame), Some(50));
        assert_eq!(cache.stats().window, (50, 51));
        // Immediate re-read serves the anchored frame, no stale data.
        let frame = cache.read(50).unwrap();
        assert_eq!(stamped_index(&frame), Some(50));
    }

    #[test]
    fn test_miss_out_of_range_propagates() {
        let cache = cache(10, 4);
        assert!(matches!(
            cache.read(10),
            Err(EthogramError::OutOfRange { .. })
        ));
    }

    struct FlakySource {
        total: u64,
        pos: u64,
        fail: Arc<AtomicBool>,
    }

    impl FrameSource for FlakySource {
        fn decode_next(&mut self) -> Result<Option<FrameBuffer>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EthogramError::DecodeFailure("injected".into()));
            }
            if self.pos >= self.total {
                return Ok(None);
            }
            let frame = synthetic_frame(64, 8, self.pos);
            self.pos += 1;
            Ok(Some(frame))
        }

        fn seek_and_decode(&mut self, frame: u64) -> Result<FrameBuffer> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EthogramError::DecodeFailure("injected".into()));
            }
            self.pos = frame + 1;
            Ok(synthetic_frame(64, 8, frame))
        }

        fn total_frames(&self) -> u64 {
            self.total
        }

        fn frame_rate(&self) -> FrameRate {
            FrameRate::FPS_30
        }

        fn dimensions(&self) -> (u32, u32) {
            (64, 8)
        }
    }

    #[test]
    fn test_prefetch_failure_is_transient() {
        let fail = Arc::new(AtomicBool::new(false));
        let source = FlakySource {
            total: 100,
            pos: 0,
            fail: Arc::clone(&fail),
        };
        let cache = FrameCache::new(Box::new(source), 8);

        assert!(cache.prefetch_tick());
        fail.store(true, Ordering::SeqCst);
        assert!(!cache.prefetch_tick());
        // Cached frames still serve while the source misbehaves.
        assert_eq!(stamped_index(&cache.read(0).unwrap()), Some(0));
        // A direct miss surfaces the failure to the caller.
        assert!(matches!(
            cache.read(50),
            Err(EthogramError::DecodeFailure(_))
        ));
        fail.store(false, Ordering::SeqCst);
        assert!(cache.prefetch_tick());
    }

    #[test]
    fn test_prefetch_stops_at_end_of_stream() {
        let cache = cache(3, 8);
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(cache.prefetch_tick());
        assert!(!cache.prefetch_tick());
        assert_eq!(cache.stats().window, (0, 3));
    }

    #[test]
    fn test_background_worker_fills_window() {
        let cache = cache(100, 8);
        let handle = cache
            .spawn_prefetch_with_interval(Duration::from_millis(1))
            .unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while cache.stats().window.1 < 5 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        handle.stop();
        let (start, end) = cache.stats().window;
        assert_eq!(start, 0);
        assert!(end >= 5, "worker prefetched only to {}", end);
        // Window content is intact after the worker joined.
        assert_eq!(stamped_index(&cache.read(2).unwrap()), Some(2));
    }
}
