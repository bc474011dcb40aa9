//! Session wiring.
//!
//! An `AnnotationSession` joins the two independent flows: playback
//! (cursor over the prefetch cache, frames out to the surface) and
//! annotation (key presses into the recorder and registry). The only
//! thing the flows share is the current-frame-index query.

use std::path::Path;

use ethogram_annotate::{
    AnnotationDocument, AnnotationRecorder, AnnotationRegistry, BehaviorDef, KeyOutcome,
};
use ethogram_core::{Result, Subscribers};
use ethogram_playback::{PlaybackCursor, PresentationSurface};
use tracing::{info, warn};

/// One annotation session over one loaded video.
pub struct AnnotationSession {
    cursor: PlaybackCursor,
    registry: AnnotationRegistry,
    recorder: AnnotationRecorder,
    surface: Box<dyn PresentationSurface>,
    behavior_added: Subscribers<BehaviorDef>,
}

impl AnnotationSession {
    /// Create a session over a cursor, with an empty registry bound to
    /// the cursor's video.
    pub fn new(
        cursor: PlaybackCursor,
        video_path: impl Into<String>,
        surface: Box<dyn PresentationSurface>,
    ) -> Self {
        let registry = AnnotationRegistry::new(video_path, cursor.total_frames());
        Self {
            cursor,
            registry,
            recorder: AnnotationRecorder::new(),
            surface,
            behavior_added: Subscribers::new(),
        }
    }

    /// Register an observer for new behaviors (a timeline display would
    /// add a lane per behavior). Delivery is synchronous, in
    /// subscription order.
    pub fn on_behavior_added(&mut self, observer: impl FnMut(&BehaviorDef) + Send + 'static) {
        self.behavior_added.subscribe(observer);
    }

    /// The playback cursor.
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// The annotation registry.
    pub fn registry(&self) -> &AnnotationRegistry {
        &self.registry
    }

    /// The key recorder.
    pub fn recorder(&self) -> &AnnotationRecorder {
        &self.recorder
    }

    /// Register a behavior and bind it to the next free key.
    pub fn add_behavior(&mut self, def: BehaviorDef) -> Result<char> {
        let announced = def.clone();
        let key = self.recorder.register_and_bind(&mut self.registry, def)?;
        info!("behavior '{}' bound to key '{}'", announced.name, key);
        self.behavior_added.emit(&announced);
        Ok(key)
    }

    /// Route a key press through the recorder at the current frame.
    pub fn press(&mut self, key: char) -> Result<KeyOutcome> {
        let now = self.cursor.current_frame();
        self.recorder.handle_key(key, now, &mut self.registry)
    }

    /// Step the cursor and present the resulting frame.
    pub fn step(&mut self, delta: i64) -> Result<()> {
        let frame = self.cursor.step(delta)?;
        self.surface.present(self.cursor.current_frame(), &frame)
    }

    /// Seek the cursor and present the resulting frame.
    pub fn seek(&mut self, frame: u64) -> Result<()> {
        let buffer = self.cursor.seek(frame)?;
        self.surface.present(frame, &buffer)
    }

    /// Seek by seconds and present the resulting frame.
    pub fn seek_seconds(&mut self, seconds: f64) -> Result<()> {
        let buffer = self.cursor.seek_seconds(seconds)?;
        self.surface.present(self.cursor.current_frame(), &buffer)
    }

    /// Start or stop auto-play. Returns whether playback is now running.
    pub fn toggle_play(&mut self) -> bool {
        self.cursor.toggle_play()
    }

    /// Save the annotations to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        AnnotationDocument::from_registry(&self.registry).save_to_file(path)
    }

    /// Load annotations from `path`, replacing the registry and key
    /// bindings. The session is untouched when loading fails.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let document = AnnotationDocument::load_from_file(path)?;
        if document.video_path != self.registry.video_path() {
            warn!(
                "document annotates '{}', session video is '{}'",
                document.video_path,
                self.registry.video_path()
            );
        }
        let registry = document.into_registry()?;
        let mut recorder = AnnotationRecorder::new();
        recorder.rebind_from(&registry)?;

        self.registry = registry;
        self.recorder = recorder;
        for (key, behavior) in self.recorder.keys().bindings() {
            info!("behavior '{}' bound to key '{}'", behavior, key);
        }
        Ok(())
    }
}
