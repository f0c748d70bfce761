//! frame_replay — replay a recorded JSONL frame capture through the touch
//! state machine and print the resulting event stream.

use std::process;

use tracing_subscriber::EnvFilter;

use touch_core::{ManagerConfig, TouchManager};
use touch_stream::dispatch::Dispatcher;
use touch_stream::source::{load_jsonl, spawn_frame_source, ReplaySource};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: frame_replay <capture.jsonl> [--paced]");
            process::exit(1);
        }
    };
    let paced = args.any(|a| a == "--paced");

    let frames = match load_jsonl(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    println!("Replaying {} frames from {}", frames.len(), path);

    let source = if paced {
        ReplaySource::new(frames).paced()
    } else {
        ReplaySource::new(frames)
    };
    let rx = spawn_frame_source(source);

    let mut dispatcher = Dispatcher::new(TouchManager::new(ManagerConfig::default()));
    dispatcher.on_events(|events| {
        for e in events {
            println!(
                "{:>9?}  id={:<6} slot={:<3} lon={:+.4} lat={:+.4} dur={:.3}",
                e.kind, e.touch.id, e.touch.slot, e.touch.position.0, e.touch.position.1,
                e.touch.duration
            );
        }
    });

    let dispatcher = dispatcher.run(rx);
    println!(
        "Done: {} frames ({} rejected), {} touches still down, {} lingering",
        dispatcher.frames_seen(),
        dispatcher.frames_rejected(),
        dispatcher.manager().alive_count(),
        dispatcher.manager().graveyard_count(),
    );
}
