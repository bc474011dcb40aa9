//! Ethogram Studio - video behavior annotation
//!
//! Entry point and operator console. The graphical front end lives
//! elsewhere; this binary drives a full annotation session over a
//! line-oriented console.

mod session;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use ethogram_annotate::{BehaviorDef, BehaviorKind, KeyOutcome};
use ethogram_core::{defaults, Color, FrameBuffer, FrameRate};
use ethogram_media::{FrameCache, FrameSource, VideoSource};
use ethogram_playback::{PlaybackCursor, PresentationSurface};
use session::AnnotationSession;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Presents frames as console lines.
struct ConsoleSurface;

impl PresentationSurface for ConsoleSurface {
    fn present(&mut self, index: u64, frame: &FrameBuffer) -> ethogram_core::Result<()> {
        println!(
            "frame {} | {}x{} {:?}",
            index, frame.width, frame.height, frame.format
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Ethogram Studio starting...");

    // Initialize media subsystem
    ethogram_media::init();

    // Parse command line for video file
    let video_path = std::env::args().nth(1).map(PathBuf::from);

    let (source, path_label) = match video_path {
        Some(path) => {
            let source = VideoSource::open(&path)?;
            let label = source.path().to_string();
            (source, label)
        }
        None => {
            info!("no video given, using a synthetic 10s source");
            let source = VideoSource::synthetic(300, FrameRate::FPS_30, 640, 480);
            (source, "<synthetic>".to_string())
        }
    };

    info!(
        "loaded '{}': {} frames at {}",
        path_label,
        source.total_frames(),
        source.frame_rate()
    );

    let cache = FrameCache::new(Box::new(source), defaults::FRAME_WINDOW_CAPACITY);
    let _prefetch = cache.spawn_prefetch()?;

    let cursor = PlaybackCursor::new(cache);
    let mut session = AnnotationSession::new(cursor, path_label, Box::new(ConsoleSurface));

    run_console(&mut session)
}

fn run_console(session: &mut AnnotationSession) -> Result<()> {
    print_help();
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Err(e) = dispatch(session, line) {
            // Operator errors are warnings, not session killers.
            println!("warning: {e}");
        }
    }
    Ok(())
}

fn dispatch(session: &mut AnnotationSession, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");

    match command {
        "n" => session.step(1)?,
        "p" => session.step(-1)?,
        "goto" => {
            let frame: u64 = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: goto <frame>"))?
                .parse()?;
            session.seek(frame)?;
        }
        "time" => {
            let secs: f64 = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: time <seconds>"))?
                .parse()?;
            session.seek_seconds(secs)?;
        }
        "space" => {
            let playing = session.toggle_play();
            println!("{}", if playing { "playing" } else { "paused" });
        }
        "add" => {
            let name = parts.next().ok_or_else(|| anyhow::anyhow!("usage: add <name> <Event|State> <#rrggbb> [note…]"))?;
            let kind = match parts.next() {
                Some("Event") => BehaviorKind::Event,
                Some("State") => BehaviorKind::State,
                _ => anyhow::bail!("behavior type must be Event or State"),
            };
            let color: Color = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("missing color"))?
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let note = parts.collect::<Vec<_>>().join(" ");
            let key = session.add_behavior(BehaviorDef::new(name, kind, color).with_note(note))?;
            println!("'{name}' bound to key '{key}'");
        }
        "save" => {
            let path = parts.next().ok_or_else(|| anyhow::anyhow!("usage: save <path>"))?;
            session.save(path)?;
            println!("saved to {path}");
        }
        "load" => {
            let path = parts.next().ok_or_else(|| anyhow::anyhow!("usage: load <path>"))?;
            session.load(path)?;
            println!("loaded {path}");
        }
        "info" => print_info(session),
        "help" => print_help(),
        key if key.chars().count() == 1 => {
            let key = key.chars().next().unwrap_or(' ');
            match session.press(key)? {
                KeyOutcome::NoOp => {}
                KeyOutcome::Cancelled { behavior } => {
                    println!("cancelled recording of '{behavior}'");
                }
                KeyOutcome::Started {
                    behavior,
                    start_frame,
                } => println!("recording '{behavior}' from frame {start_frame}"),
                KeyOutcome::EventMarked { behavior, frame } => {
                    println!("'{behavior}' at frame {frame}");
                }
                KeyOutcome::IntervalClosed {
                    behavior,
                    start_frame,
                    end_frame,
                } => println!("'{behavior}' recorded over frames {start_frame}-{end_frame}"),
            }
        }
        _ => anyhow::bail!("unknown command {command:?} (try 'help')"),
    }
    Ok(())
}

fn print_info(session: &AnnotationSession) {
    let cursor = session.cursor();
    println!(
        "frame {}/{} ({}) {}",
        cursor.current_frame(),
        cursor.total_frames(),
        cursor.current_time(),
        if cursor.is_playing() { "playing" } else { "paused" }
    );
    for (key, behavior) in session.recorder().keys().bindings() {
        let intervals = session.registry().intervals(behavior).map_or(0, |i| i.len());
        println!("  ({key}) {behavior}: {intervals} interval(s)");
    }
    if let Some(pending) = session.recorder().pending() {
        println!(
            "  recording '{}' since frame {}",
            pending.behavior, pending.start_frame
        );
    }
}

fn print_help() {
    println!("n/p step · goto <frame> · time <secs> · space play/pause");
    println!("add <name> <Event|State> <#rrggbb> [note…] · <key> press · z quit recording");
    println!("save/load <path> · info · help · quit");
}
