//! # touch_stream
//!
//! Thin I/O glue around [`touch_core`]: the inbound frame wire format, a
//! channel-based frame source abstraction, and a dispatcher that feeds
//! frames to a [`TouchManager`](touch_core::TouchManager) one at a time
//! with per-frame error isolation.
//!
//! The upstream transport (network reception, protocol decoding) lives
//! outside this crate; anything that can produce [`TouchFrame`]s — a live
//! socket reader or a recorded JSONL capture — plugs in through the
//! [`FrameSource`](source::FrameSource) trait, and consumers cannot tell
//! replay from live input.
//!
//! ## Wiring
//!
//! ```rust
//! use touch_stream::frame::TouchFrame;
//! use touch_stream::source::{spawn_frame_source, ReplaySource};
//! use touch_stream::dispatch::Dispatcher;
//! use touch_core::{ManagerConfig, TouchManager};
//!
//! let frames = vec![TouchFrame::empty(1, 0.0)];
//! let rx = spawn_frame_source(ReplaySource::new(frames));
//!
//! let mut dispatcher = Dispatcher::new(TouchManager::new(ManagerConfig::default()));
//! dispatcher.on_events(|events| {
//!     for e in events {
//!         println!("{:?} touch {} slot {}", e.kind, e.touch.id, e.touch.slot);
//!     }
//! });
//! dispatcher.run(rx);
//! ```

pub mod frame;
pub mod source;
pub mod dispatch;

pub use dispatch::Dispatcher;
pub use frame::{TouchFrame, STALE_FSEQ};
pub use source::{load_jsonl, spawn_frame_source, FrameSource, ReplayError, ReplaySource};
