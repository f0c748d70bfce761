//! Frame dispatch: the single serialized path from a frame source into the
//! touch manager.
//!
//! One [`Dispatcher`] owns one [`TouchManager`]; frames reach it strictly
//! one at a time, and a frame the manager rejects is logged and skipped
//! without poisoning the frames behind it.

use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{debug, warn};

use touch_core::{TouchEvent, TouchManager};

use crate::frame::TouchFrame;

/// Feeds frames into a [`TouchManager`] and forwards non-empty event lists
/// to a registered consumer callback.
pub struct Dispatcher {
    manager: TouchManager,
    on_events: Option<Box<dyn FnMut(&[TouchEvent])>>,
    frames_seen: u64,
    frames_rejected: u64,
}

impl Dispatcher {
    pub fn new(manager: TouchManager) -> Self {
        Dispatcher {
            manager,
            on_events: None,
            frames_seen: 0,
            frames_rejected: 0,
        }
    }

    /// Register the consumer callback.  It fires only for frames that
    /// produced at least one event.
    pub fn on_events<F: FnMut(&[TouchEvent]) + 'static>(&mut self, f: F) {
        self.on_events = Some(Box::new(f));
    }

    pub fn manager(&self) -> &TouchManager {
        &self.manager
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Apply one frame.  Stale keep-alives go through as empty frames so
    /// linger expiry stays time-driven.  Returns the number of events the
    /// frame produced; a rejected frame counts as zero and is isolated
    /// from subsequent frames.
    pub fn dispatch(&mut self, frame: &TouchFrame) -> usize {
        self.frames_seen += 1;
        if frame.is_stale() {
            debug!(t = frame.t, "stale keep-alive");
        }
        match self
            .manager
            .touch_frame(&frame.touches, &frame.raw, frame.fseq, frame.t)
        {
            Ok(out) => {
                if !out.events.is_empty() {
                    if let Some(cb) = self.on_events.as_mut() {
                        cb(&out.events);
                    }
                }
                out.events.len()
            }
            Err(err) => {
                self.frames_rejected += 1;
                warn!(fseq = frame.fseq, %err, "frame rejected");
                0
            }
        }
    }

    /// Process every frame currently waiting on the channel without
    /// blocking, in arrival order.  Returns the number of frames handled.
    pub fn drain(&mut self, rx: &Receiver<TouchFrame>) -> usize {
        let mut handled = 0;
        loop {
            match rx.try_recv() {
                Ok(frame) => {
                    self.dispatch(&frame);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return handled,
            }
        }
    }

    /// Block on the channel until the source hangs up, dispatching every
    /// frame in arrival order.
    pub fn run(mut self, rx: Receiver<TouchFrame>) -> Self {
        for frame in rx {
            self.dispatch(&frame);
        }
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
