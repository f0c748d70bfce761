//! # touch_core
//!
//! Touch-state machine and clustering engine for a spherical multitouch
//! display.  Raw per-frame snapshots of touch positions go in; a stable
//! stream of discrete lifecycle events with persistent numbering comes out.
//!
//! ## Pipeline
//!
//! | Stage | Module | What it does |
//! |---|---|---|
//! | Geometry | [`sphere`] | Great-circle distance, pixel projection, circular mean |
//! | Entity model | [`touch`] | [`Touch`](touch::Touch), [`TouchEvent`](touch::TouchEvent), [`Cluster`](touch::Cluster) |
//! | Clustering | [`cluster`] | Pairwise angular adjacency under a threshold |
//! | Feedback | [`feedback`] | "What object is under this touch" sampler interface |
//! | State machine | [`manager`] | Frame differencing, slot assignment, linger graveyard |
//!
//! ## Frame → events
//!
//! Each frame the [`manager::TouchManager`] diffs the incoming id set
//! against the alive set:
//!
//! * ids new this frame → **Appear** (new touch, smallest free slot),
//! * ids present in both → **Move** (updated in place, same identity),
//! * ids gone this frame → **Disappear** (moved to the graveyard).
//!
//! A just-vanished touch lingers in the graveyard for a configurable grace
//! period before its slot is released, so downstream consumers can keep
//! using dense slot numbers across brief dropouts.
//!
//! Timestamps and frame sequence numbers are caller-supplied, never read
//! from a wall clock, so a recorded frame sequence replays deterministically.

pub mod sphere;
pub mod touch;
pub mod cluster;
pub mod feedback;
pub mod manager;

pub use touch::{Cluster, EventKind, FeedbackId, RawXy, Touch, TouchEvent, TouchId, NO_FEEDBACK};
pub use cluster::{cluster_touches, ClusterSet};
pub use feedback::{FeedbackSampler, PixelFeedback};
pub use manager::{FrameError, FrameOutput, ManagerConfig, TouchManager};
pub use sphere::{spherical_distance, LonLat};
