//! Touch entity model: one tracked contact, its lifecycle events, and the
//! cluster grouping built on top of it.

use serde::{Deserialize, Serialize};

use crate::sphere::{circular_mean, LonLat};

/// Raw touch id as assigned by the upstream input source.
///
/// Opaque and source-controlled; the source may reuse an id for a physically
/// distinct contact after release.  Stable identity across a session comes
/// from [`Touch::slot`], not from this.
pub type TouchId = i64;

/// Raw device coordinates, pre-calibration.  Kept for diagnostics only.
pub type RawXy = (f64, f64);

/// Identifier of the rendered object found under a touch point.
pub type FeedbackId = i32;

/// Sentinel: no object under the touch, or no sampler configured.
pub const NO_FEEDBACK: FeedbackId = -1;

// ════════════════════════════════════════════════════════════════════════════
// Touch
// ════════════════════════════════════════════════════════════════════════════

/// One physically distinct contact over its lifetime.
///
/// Created on first appearance, mutated in place while its id keeps showing
/// up in frames, then held in the manager's graveyard for a linger period
/// after it vanishes.  `duration` and `dead_time` are derived from the
/// caller-supplied frame timestamps, never from a wall clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    /// Upstream id (may be reused by the source after release).
    pub id: TouchId,
    /// Dense, stable slot number; unique among alive + graveyarded touches.
    pub slot: usize,
    /// Current angular position.
    pub position: LonLat,
    /// Angular position at the moment of appearance.  Immutable.
    pub origin: LonLat,
    /// Last raw device coordinates.
    pub raw: RawXy,
    /// Timestamp of appearance.
    pub origin_t: f64,
    /// Timestamp of the last update.
    pub t: f64,
    /// `t − origin_t`, recomputed on every update.
    pub duration: f64,
    /// Time since last seen, while in the graveyard.  0 while alive.
    pub dead_time: f64,
    /// Sequence number of the frame that last touched this record.
    pub fseq: i64,
    /// True from appearance until the disappearance frame is processed.
    pub alive: bool,
    /// Object id sampled under the touch, or [`NO_FEEDBACK`].
    pub feedback: FeedbackId,
}

// ════════════════════════════════════════════════════════════════════════════
// Lifecycle events
// ════════════════════════════════════════════════════════════════════════════

/// Lifecycle transition reported for one touch in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Touch id seen for the first time (or re-seen after its grave purged).
    Appear,
    /// Touch id present in consecutive frames; state updated in place.
    Move,
    /// Touch id stopped appearing; record moved to the graveyard.
    Disappear,
}

/// One lifecycle event with a snapshot of the touch as of this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub kind: EventKind,
    pub touch: Touch,
}

// ════════════════════════════════════════════════════════════════════════════
// Cluster
// ════════════════════════════════════════════════════════════════════════════

/// A group of touches within an angular tolerance, treated as one compound
/// contact.
///
/// Shares the [`Touch`] shape by embedding one as `core` (its position is
/// the member centroid); `children` lists member identities — the manager
/// retains primary ownership of each member touch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Touch-shaped identity/lifecycle record; position = member centroid.
    pub core: Touch,
    /// Angular tolerance the group was formed under.
    pub radius: f64,
    /// Member touch identities, in slot order.
    pub children: Vec<TouchId>,
}

impl Cluster {
    /// Build a cluster from its members' ids and positions.
    ///
    /// The embedded core touch carries the centroid (circular mean) as its
    /// position and origin; id and slot are taken from the first member so
    /// the cluster has a usable identity.  Returns `None` for an empty
    /// member list.
    pub fn from_members(radius: f64, t: f64, fseq: i64, members: &[(TouchId, LonLat)]) -> Option<Self> {
        let first = members.first()?;
        let positions: Vec<LonLat> = members.iter().map(|&(_, p)| p).collect();
        let centroid = circular_mean(&positions);
        Some(Cluster {
            core: Touch {
                id: first.0,
                slot: 0,
                position: centroid,
                origin: centroid,
                raw: (0.0, 0.0),
                origin_t: t,
                t,
                duration: 0.0,
                dead_time: 0.0,
                fseq,
                alive: true,
                feedback: NO_FEEDBACK,
            },
            radius,
            children: members.iter().map(|&(id, _)| id).collect(),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
