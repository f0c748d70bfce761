//! Frame delivery over a channel.
//!
//! The public interface is [`TouchFrame`]s arriving on an `mpsc` receiver.
//! Consumers don't need to know whether frames came from a live transport
//! or a recorded capture — both implement [`FrameSource`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::frame::TouchFrame;

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait — unified interface for live and replay
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`TouchFrame`]s over a channel.
///
/// `run` owns the source and blocks until the source is exhausted or the
/// receiving side hangs up; a live transport reader loops forever, a replay
/// returns after its last frame.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<TouchFrame>);
}

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<TouchFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource — recorded frame sequences
// ════════════════════════════════════════════════════════════════════════════

/// Feeds a recorded frame sequence into the channel.
///
/// By default frames are delivered as fast as the consumer drains them,
/// which is what deterministic tests want.  [`paced`](Self::paced) sleeps
/// out the recorded inter-frame gaps instead, approximating the original
/// arrival rhythm for interactive replay.
pub struct ReplaySource {
    frames: Vec<TouchFrame>,
    paced: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<TouchFrame>) -> Self {
        ReplaySource { frames, paced: false }
    }

    /// Deliver frames at the rhythm of their recorded timestamps.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }
}

impl FrameSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<TouchFrame>) {
        let mut last_t: Option<f64> = None;
        for frame in self.frames {
            if self.paced {
                if let Some(prev) = last_t {
                    let gap = frame.t - prev;
                    if gap > 0.0 {
                        thread::sleep(Duration::from_secs_f64(gap));
                    }
                }
                last_t = Some(frame.t);
            }
            if tx.send(frame).is_err() {
                return; // consumer hung up
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JSONL capture loading
// ════════════════════════════════════════════════════════════════════════════

/// Failure while loading a recorded capture.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad frame on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a capture file with one JSON frame per line.  Blank lines are
/// skipped; any malformed line aborts the load with its line number.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<TouchFrame>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = TouchFrame::from_json(&line)
            .map_err(|source| ReplayError::Json { line: i + 1, source })?;
        frames.push(frame);
    }
    Ok(frames)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replay_source_delivers_in_order() {
        let frames = vec![
            TouchFrame::empty(1, 0.0),
            TouchFrame::empty(2, 0.1),
            TouchFrame::empty(3, 0.2),
        ];
        let rx = spawn_frame_source(ReplaySource::new(frames));
        let fseqs: Vec<i64> = rx.iter().map(|f| f.fseq).collect();
        assert_eq!(fseqs, vec![1, 2, 3]);
    }

    #[test]
    fn replay_source_stops_when_receiver_dropped() {
        let frames = vec![TouchFrame::empty(1, 0.0); 1000];
        let rx = spawn_frame_source(ReplaySource::new(frames));
        let first = rx.recv().unwrap();
        assert_eq!(first.fseq, 1);
        drop(rx); // sender thread must exit quietly
    }

    #[test]
    fn jsonl_load_skips_blank_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"touches":{{}},"raw":{{}},"fseq":1,"t":0.0}}"#).unwrap();
        writeln!(f).unwrap();
        writeln!(f, r#"{{"touches":{{}},"raw":{{}},"fseq":2,"t":0.1}}"#).unwrap();
        let frames = load_jsonl(f.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].fseq, 2);
    }

    #[test]
    fn jsonl_load_reports_bad_line_number() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"touches":{{}},"raw":{{}},"fseq":1,"t":0.0}}"#).unwrap();
        writeln!(f, "garbage").unwrap();
        match load_jsonl(f.path()) {
            Err(ReplayError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Json error, got {:?}", other),
        }
    }

    #[test]
    fn jsonl_load_missing_file_is_io_error() {
        assert!(matches!(
            load_jsonl("/nonexistent/capture.jsonl"),
            Err(ReplayError::Io(_))
        ));
    }
}
