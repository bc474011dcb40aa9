//! The playback cursor.
//!
//! Tracks the current frame index over a `FrameCache` and exposes
//! step/seek/auto-play. Auto-play runs on a timer thread stepping one
//! frame per tick; any manual navigation first halts that thread
//! synchronously (send + join), so exactly one advance path touches the
//! cursor at a time.
//!
//! Loading a new video means building a new cursor over a new cache:
//! `total_frames` and the frame rate are fixed at construction.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use ethogram_core::{EthogramError, FrameBuffer, FrameRate, RationalTime, Result, Subscribers};
use ethogram_media::FrameCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

struct CursorState {
    current: u64,
    playing: bool,
}

struct PlayerHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Halt the timer thread and wait for it; no advance fires after this
    /// returns.
    fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// The current-frame pointer over a cached video.
pub struct PlaybackCursor {
    cache: FrameCache,
    state: Arc<Mutex<CursorState>>,
    observers: Arc<Mutex<Subscribers<u64>>>,
    player: Option<PlayerHandle>,
    total_frames: u64,
    frame_rate: FrameRate,
}

impl PlaybackCursor {
    /// Create a cursor positioned at frame 0.
    pub fn new(cache: FrameCache) -> Self {
        let total_frames = cache.total_frames();
        let frame_rate = cache.frame_rate();
        Self {
            cache,
            state: Arc::new(Mutex::new(CursorState {
                current: 0,
                playing: false,
            })),
            observers: Arc::new(Mutex::new(Subscribers::new())),
            player: None,
            total_frames,
            frame_rate,
        }
    }

    /// Current frame index.
    pub fn current_frame(&self) -> u64 {
        self.state.lock().current
    }

    /// Current position in seconds.
    pub fn current_time(&self) -> RationalTime {
        RationalTime::from_frames(self.current_frame() as i64, self.frame_rate)
    }

    /// Total frame count of the loaded video.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frame rate of the loaded video.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Whether auto-play is running.
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Register an observer for cursor moves. Observers receive the new
    /// frame index, synchronously, in subscription order, on whichever
    /// thread moved the cursor.
    pub fn subscribe(&self, observer: impl FnMut(&u64) + Send + 'static) {
        self.observers.lock().subscribe(observer);
    }

    fn validate(&self, frame: i64) -> Result<u64> {
        if frame < 0 || frame as u64 >= self.total_frames {
            return Err(EthogramError::OutOfRange {
                frame,
                total: self.total_frames,
            });
        }
        Ok(frame as u64)
    }

    /// Move by `delta` frames and return the frame at the new position.
    ///
    /// Stops auto-play first. Fails with `OutOfRange` (cursor unchanged)
    /// when the target leaves `[0, total_frames)`.
    pub fn step(&mut self, delta: i64) -> Result<FrameBuffer> {
        self.stop_playback();
        let current = self.state.lock().current;
        let target = self.validate(current as i64 + delta)?;
        let frame = self.cache.read(target)?;
        self.state.lock().current = target;
        self.observers.lock().emit(&target);
        Ok(frame)
    }

    /// Jump to `frame` and return it.
    ///
    /// Stops auto-play first, then takes the cache's explicit-seek path
    /// (the window resets; prefetch restarts from here).
    pub fn seek(&mut self, frame: u64) -> Result<FrameBuffer> {
        self.stop_playback();
        let target = self.validate(frame as i64)?;
        let buffer = self.cache.invalidate_and_seek(target)?;
        self.state.lock().current = target;
        self.observers.lock().emit(&target);
        Ok(buffer)
    }

    /// Jump to the frame nearest `seconds`.
    pub fn seek_seconds(&mut self, seconds: f64) -> Result<FrameBuffer> {
        let frame = RationalTime::from_seconds_f64(seconds).to_frames(self.frame_rate);
        if frame < 0 {
            return Err(EthogramError::OutOfRange {
                frame,
                total: self.total_frames,
            });
        }
        self.seek(frame as u64)
    }

    /// Start or stop auto-play. Returns whether playback is now running.
    ///
    /// Auto-play steps forward once per frame period; reaching the last
    /// frame stops the timer quietly.
    pub fn toggle_play(&mut self) -> bool {
        if self.stop_playback() {
            return false;
        }

        let interval = Duration::from_millis(self.frame_rate.tick_interval_ms());
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let cache = self.cache.clone();
        let state = Arc::clone(&self.state);
        let observers = Arc::clone(&self.observers);
        let total = self.total_frames;

        state.lock().playing = true;
        debug!("auto-play started, tick interval {:?}", interval);

        let thread = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            let current = state.lock().current;
            if current + 1 >= total {
                debug!("auto-play reached end of video");
                state.lock().playing = false;
                break;
            }
            match cache.read(current + 1) {
                Ok(_) => {
                    state.lock().current = current + 1;
                    observers.lock().emit(&(current + 1));
                }
                Err(e) => {
                    warn!("auto-play halted: {}", e);
                    state.lock().playing = false;
                    break;
                }
            }
        });

        self.player = Some(PlayerHandle {
            stop_tx,
            thread: Some(thread),
        });
        true
    }

    /// Halt auto-play if running. Returns whether it was running. The
    /// timer thread has exited by the time this returns.
    pub fn stop_playback(&mut self) -> bool {
        let was_playing = self.state.lock().playing;
        if let Some(handle) = self.player.take() {
            handle.stop();
        }
        self.state.lock().playing = false;
        was_playing
    }
}

impl Drop for PlaybackCursor {
    fn drop(&mut self) {
        self.stop_playback();
    }
}
