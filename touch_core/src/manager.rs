//! The frame-driven touch state machine.
//!
//! [`TouchManager`] consumes one frame at a time — an id→position snapshot
//! plus raw coordinates, a frame sequence number, and a caller-supplied
//! timestamp — and produces an ordered list of lifecycle events.  It owns
//! three tables:
//!
//! * **alive**: id → [`Touch`] for every contact currently down,
//! * **slots**: slot → id, giving every alive-or-lingering touch a dense,
//!   stable, reusable small integer,
//! * **graveyard**: slot → [`Touch`] for recently-vanished contacts whose
//!   slots are held in reserve for the linger duration.
//!
//! The manager performs no blocking I/O and reads no clock; given a
//! recorded frame sequence its behavior is fully deterministic.  Concurrent
//! calls on one instance are not supported — callers serialize.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use thiserror::Error;

use crate::cluster::ClusterSet;
use crate::feedback::FeedbackSampler;
use crate::sphere::LonLat;
use crate::touch::{EventKind, FeedbackId, RawXy, Touch, TouchEvent, TouchId, NO_FEEDBACK};

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Per-session manager configuration.
#[derive(Clone, Copy, Debug)]
pub struct ManagerConfig {
    /// Seconds a vanished touch lingers in the graveyard before its slot
    /// is released (same time base as the frame timestamps).
    pub linger: f64,
    /// Angular threshold (radians) under which two touches are adjacent.
    pub cluster_threshold: f64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            linger: 2.0,
            cluster_threshold: PI / 8.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// A frame that cannot be applied.  The manager's state is untouched when
/// any of these is returned; the caller logs and moves on to the next frame.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// A touch position arrived without matching raw device coordinates.
    #[error("touch {0} has a position but no raw coordinates")]
    MissingRaw(TouchId),

    /// A coordinate was NaN or infinite.
    #[error("touch {0} has a non-finite coordinate")]
    NonFinitePosition(TouchId),

    /// The frame timestamp was NaN or infinite.
    #[error("frame timestamp is not finite")]
    NonFiniteTime,
}

// ════════════════════════════════════════════════════════════════════════════
// Frame output
// ════════════════════════════════════════════════════════════════════════════

/// Events produced by one frame, with the frame's timing echoed back for
/// the caller's bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    /// All Appear events first, then all Move, then all Disappear; each
    /// group in ascending-id order.
    pub events: Vec<TouchEvent>,
    pub t: f64,
    pub fseq: i64,
}

// ════════════════════════════════════════════════════════════════════════════
// TouchManager
// ════════════════════════════════════════════════════════════════════════════

/// Converts raw per-frame position snapshots into Appear/Move/Disappear
/// events with stable dense numbering and a linger graveyard.
///
/// BTreeMaps keep iteration order deterministic, which fixes the order of
/// events within each group and makes replays byte-stable.
pub struct TouchManager {
    config: ManagerConfig,
    /// id → touch, for every contact currently down.
    alive: BTreeMap<TouchId, Touch>,
    /// slot → id, covering alive and graveyarded touches.  New slots are
    /// found by linear scan from 0: O(occupied slots), fine at physical
    /// touch counts.
    slots: BTreeMap<usize, TouchId>,
    /// slot → touch, for vanished contacts still inside the linger window.
    /// Keyed by slot, not id, so an id reappearing as a fresh touch can
    /// never collide with its own grave.
    graveyard: BTreeMap<usize, Touch>,
    sampler: Option<Box<dyn FeedbackSampler>>,
    cluster_set: ClusterSet,
}

impl TouchManager {
    pub fn new(config: ManagerConfig) -> Self {
        TouchManager {
            alive: BTreeMap::new(),
            slots: BTreeMap::new(),
            graveyard: BTreeMap::new(),
            sampler: None,
            cluster_set: ClusterSet::new(config.cluster_threshold),
            config,
        }
    }

    /// Attach the renderer's feedback sampler.  Without one, every touch
    /// carries [`NO_FEEDBACK`].
    pub fn with_sampler(mut self, sampler: Box<dyn FeedbackSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    pub fn graveyard_count(&self) -> usize {
        self.graveyard.len()
    }

    /// Slot of an alive touch, if the id is currently down.
    pub fn slot_of(&self, id: TouchId) -> Option<usize> {
        self.alive.get(&id).map(|t| t.slot)
    }

    /// Alive touches as `(id, position)`, ordered by slot.
    pub fn alive_positions(&self) -> Vec<(TouchId, LonLat)> {
        let mut by_slot: Vec<&Touch> = self.alive.values().collect();
        by_slot.sort_by_key(|t| t.slot);
        by_slot.iter().map(|t| (t.id, t.position)).collect()
    }

    /// Adjacency edges among alive touches from the most recent frame.
    pub fn adjacency(&self) -> &[(TouchId, TouchId)] {
        self.cluster_set.edges()
    }

    // ── frame processing ─────────────────────────────────────────────────

    /// Apply one complete frame and return its ordered event list.
    ///
    /// `positions` maps every currently-reported touch id to its angular
    /// position; `raw` must carry matching device coordinates for each of
    /// those ids.  `fseq` and `t` come from the frame source, never from a
    /// clock.  A frame with zero touches degenerates to pure graveyard
    /// aging, which is exactly what stale keep-alive frames are for.
    pub fn touch_frame(
        &mut self,
        positions: &BTreeMap<TouchId, LonLat>,
        raw: &BTreeMap<TouchId, RawXy>,
        fseq: i64,
        t: f64,
    ) -> Result<FrameOutput, FrameError> {
        // Reject bad frames before touching any state.
        Self::validate(positions, raw, t)?;

        let mut events = Vec::new();

        // Set-difference against the alive set, before anything mutates.
        let appeared: Vec<TouchId> = positions
            .keys()
            .copied()
            .filter(|id| !self.alive.contains_key(id))
            .collect();

        // Appear: ids in this frame but not alive yet.  A graveyarded id
        // counts as gone — its grave keeps aging and it gets a fresh slot.
        for &id in &appeared {
            let position = positions[&id];
            let slot = self.next_slot();
            let touch = Touch {
                id,
                slot,
                position,
                origin: position,
                raw: raw[&id],
                origin_t: t,
                t,
                duration: 0.0,
                dead_time: 0.0,
                fseq,
                alive: true,
                feedback: self.feedback(position),
            };
            self.slots.insert(slot, id);
            events.push(TouchEvent { kind: EventKind::Appear, touch: touch.clone() });
            self.alive.insert(id, touch);
        }

        // Move: ids alive in both frames, updated in place — same slot,
        // same identity.
        for (&id, &position) in positions {
            if appeared.binary_search(&id).is_ok() {
                continue; // created above, this frame
            }
            let feedback = self.feedback(position);
            let touch = match self.alive.get_mut(&id) {
                Some(touch) => touch,
                None => continue,
            };
            touch.position = position;
            touch.raw = raw[&id];
            touch.t = t;
            touch.duration = t - touch.origin_t;
            touch.fseq = fseq;
            touch.feedback = feedback;
            events.push(TouchEvent { kind: EventKind::Move, touch: touch.clone() });
        }

        // Disappear: alive ids absent from this frame.
        let vanished: Vec<TouchId> = self
            .alive
            .keys()
            .copied()
            .filter(|id| !positions.contains_key(id))
            .collect();
        for id in vanished {
            let mut touch = match self.alive.remove(&id) {
                Some(touch) => touch,
                None => continue,
            };
            events.push(TouchEvent { kind: EventKind::Disappear, touch: touch.clone() });
            touch.alive = false;
            self.graveyard.insert(touch.slot, touch);
        }

        // Graveyard sweep, every frame: expiry is time-driven, so it runs
        // even when nothing vanished.
        self.sweep(t);

        // Per-frame clustering over what is still down, in slot order.
        self.cluster_set.update(&self.alive_positions());

        Ok(FrameOutput { events, t, fseq })
    }

    // ── internals ────────────────────────────────────────────────────────

    fn validate(
        positions: &BTreeMap<TouchId, LonLat>,
        raw: &BTreeMap<TouchId, RawXy>,
        t: f64,
    ) -> Result<(), FrameError> {
        if !t.is_finite() {
            return Err(FrameError::NonFiniteTime);
        }
        for (&id, &(lon, lat)) in positions {
            if !lon.is_finite() || !lat.is_finite() {
                return Err(FrameError::NonFinitePosition(id));
            }
            match raw.get(&id) {
                None => return Err(FrameError::MissingRaw(id)),
                Some(&(x, y)) if !x.is_finite() || !y.is_finite() => {
                    return Err(FrameError::NonFinitePosition(id));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Smallest non-negative integer not currently assigned.
    fn next_slot(&self) -> usize {
        let mut slot = 0;
        while self.slots.contains_key(&slot) {
            slot += 1;
        }
        slot
    }

    fn feedback(&self, position: LonLat) -> FeedbackId {
        match &self.sampler {
            Some(s) => s.sample(position),
            None => NO_FEEDBACK,
        }
    }

    /// Age every grave entry; release slots whose dead time strictly
    /// exceeds the linger duration.
    fn sweep(&mut self, t: f64) {
        let linger = self.config.linger;
        let mut expired = Vec::new();
        for (&slot, touch) in self.graveyard.iter_mut() {
            touch.dead_time = t - touch.t;
            if touch.dead_time > linger {
                expired.push(slot);
            }
        }
        for slot in expired {
            self.slots.remove(&slot);
            self.graveyard.remove(&slot);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::PixelFeedback;

    fn manager() -> TouchManager {
        TouchManager::new(ManagerConfig::default())
    }

    /// Build a frame where every touch sits at (0.01·id, 0) with raw
    /// coordinates echoing the id.
    fn frame(ids: &[TouchId]) -> (BTreeMap<TouchId, LonLat>, BTreeMap<TouchId, RawXy>) {
        let mut positions = BTreeMap::new();
        let mut raw = BTreeMap::new();
        for &id in ids {
            positions.insert(id, (0.01 * id as f64, 0.0));
            raw.insert(id, (id as f64, id as f64));
        }
        (positions, raw)
    }

    fn kinds(out: &FrameOutput) -> Vec<EventKind> {
        out.events.iter().map(|e| e.kind).collect()
    }

    // ── appear / move / disappear ────────────────────────────────────────

    #[test]
    fn first_frame_appears_every_touch() {
        let mut m = manager();
        let (p, r) = frame(&[3, 7]);
        let out = m.touch_frame(&p, &r, 1, 0.0).unwrap();
        assert_eq!(kinds(&out), vec![EventKind::Appear, EventKind::Appear]);
        assert_eq!(m.alive_count(), 2);
        for e in &out.events {
            assert_eq!(e.touch.duration, 0.0);
            assert_eq!(e.touch.position, e.touch.origin);
            assert!(e.touch.alive);
        }
    }

    #[test]
    fn repeated_frame_is_moves_only_with_growing_duration() {
        let mut m = manager();
        let (p, r) = frame(&[1, 2]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let out1 = m.touch_frame(&p, &r, 2, 0.5).unwrap();
        let out2 = m.touch_frame(&p, &r, 3, 1.25).unwrap();
        assert_eq!(kinds(&out1), vec![EventKind::Move, EventKind::Move]);
        assert_eq!(kinds(&out2), vec![EventKind::Move, EventKind::Move]);
        assert!(out2.events[0].touch.duration > out1.events[0].touch.duration);
        assert_eq!(out2.events[0].touch.duration, 1.25);
    }

    #[test]
    fn move_keeps_identity_and_origin() {
        let mut m = manager();
        let (p, r) = frame(&[5]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let slot = m.slot_of(5).unwrap();

        let mut p2 = BTreeMap::new();
        p2.insert(5, (0.3, 0.4));
        let (_, r2) = frame(&[5]);
        let out = m.touch_frame(&p2, &r2, 2, 0.1).unwrap();
        let touch = &out.events[0].touch;
        assert_eq!(out.events[0].kind, EventKind::Move);
        assert_eq!(touch.slot, slot);
        assert_eq!(touch.position, (0.3, 0.4));
        assert_eq!(touch.origin, (0.05, 0.0));
        assert_eq!(touch.fseq, 2);
    }

    #[test]
    fn vanished_id_disappears_exactly_once() {
        let mut m = manager();
        let (p, r) = frame(&[1, 2]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let (p2, r2) = frame(&[1]);
        let out = m.touch_frame(&p2, &r2, 2, 0.1).unwrap();
        let ups: Vec<_> = out
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Disappear)
            .collect();
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].touch.id, 2);
        assert_eq!(m.alive_count(), 1);
        assert_eq!(m.graveyard_count(), 1);

        // Already gone; no second Disappear.
        let out2 = m.touch_frame(&p2, &r2, 3, 0.2).unwrap();
        assert!(out2.events.iter().all(|e| e.kind == EventKind::Move));
    }

    #[test]
    fn event_groups_are_ordered() {
        let mut m = manager();
        let (p, r) = frame(&[1, 2]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        // 1 moves, 2 vanishes, 3 appears — output must be Appear, Move, Disappear.
        let (p2, r2) = frame(&[1, 3]);
        let out = m.touch_frame(&p2, &r2, 2, 0.1).unwrap();
        assert_eq!(
            kinds(&out),
            vec![EventKind::Appear, EventKind::Move, EventKind::Disappear]
        );
        assert_eq!(out.events[0].touch.id, 3);
        assert_eq!(out.events[1].touch.id, 1);
        assert_eq!(out.events[2].touch.id, 2);
    }

    #[test]
    fn empty_frame_is_pure_aging() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let (pe, re) = frame(&[]);
        m.touch_frame(&pe, &re, 2, 0.1).unwrap(); // Disappear
        let out = m.touch_frame(&pe, &re, 3, 1.0).unwrap();
        assert!(out.events.is_empty());
        assert_eq!(m.graveyard_count(), 1);
    }

    // ── slots ────────────────────────────────────────────────────────────

    #[test]
    fn slots_are_minimal_and_unique() {
        let mut m = manager();
        let (p, r) = frame(&[10, 20, 30]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let slots: Vec<_> = [10, 20, 30].iter().map(|&id| m.slot_of(id).unwrap()).collect();
        let mut sorted = slots.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn lingering_slot_is_not_reused() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        assert_eq!(m.slot_of(1), Some(0));

        // 1 vanishes; within the linger window a new id must get slot 1.
        let (p2, r2) = frame(&[2]);
        m.touch_frame(&p2, &r2, 2, 0.1).unwrap();
        assert_eq!(m.slot_of(2), Some(1));
    }

    #[test]
    fn slot_released_after_linger_expiry() {
        let mut m = TouchManager::new(ManagerConfig { linger: 1.0, ..Default::default() });
        let (p, r) = frame(&[1]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let (pe, re) = frame(&[]);
        m.touch_frame(&pe, &re, 2, 0.5).unwrap(); // Disappear at t=0.5

        // dead_time = 1.0 exactly: still held (strictly-exceeds rule).
        m.touch_frame(&pe, &re, 3, 1.5).unwrap();
        assert_eq!(m.graveyard_count(), 1);

        // dead_time now exceeds linger: slot 0 free again.
        m.touch_frame(&pe, &re, 4, 1.6).unwrap();
        assert_eq!(m.graveyard_count(), 0);
        let (p2, r2) = frame(&[9]);
        m.touch_frame(&p2, &r2, 5, 1.7).unwrap();
        assert_eq!(m.slot_of(9), Some(0));
    }

    #[test]
    fn reappearing_id_is_a_fresh_touch() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        let (pe, re) = frame(&[]);
        m.touch_frame(&pe, &re, 2, 0.1).unwrap();

        // Same id back inside the linger window: new slot, duration reset,
        // grave entry still aging.
        let out = m.touch_frame(&p, &r, 3, 0.2).unwrap();
        assert_eq!(kinds(&out), vec![EventKind::Appear]);
        assert_eq!(out.events[0].touch.duration, 0.0);
        assert_eq!(m.slot_of(1), Some(1));
        assert_eq!(m.graveyard_count(), 1);
    }

    // ── validation ───────────────────────────────────────────────────────

    #[test]
    fn missing_raw_rejects_without_mutation() {
        let mut m = manager();
        let (p, _) = frame(&[1]);
        let empty_raw = BTreeMap::new();
        let err = m.touch_frame(&p, &empty_raw, 1, 0.0).unwrap_err();
        assert_eq!(err, FrameError::MissingRaw(1));
        assert_eq!(m.alive_count(), 0);
    }

    #[test]
    fn non_finite_position_rejects_whole_frame() {
        let mut m = manager();
        let (mut p, mut r) = frame(&[1, 2]);
        p.insert(2, (f64::NAN, 0.0));
        r.insert(2, (0.0, 0.0));
        let err = m.touch_frame(&p, &r, 1, 0.0).unwrap_err();
        assert_eq!(err, FrameError::NonFinitePosition(2));
        // Touch 1 was valid but the frame is atomic.
        assert_eq!(m.alive_count(), 0);
    }

    #[test]
    fn non_finite_time_rejects_frame() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        assert_eq!(
            m.touch_frame(&p, &r, 1, f64::NAN).unwrap_err(),
            FrameError::NonFiniteTime
        );
    }

    #[test]
    fn rejected_frame_does_not_block_the_next() {
        let mut m = manager();
        let (p, _) = frame(&[1]);
        let _ = m.touch_frame(&p, &BTreeMap::new(), 1, 0.0);
        let (p2, r2) = frame(&[1]);
        let out = m.touch_frame(&p2, &r2, 2, 0.1).unwrap();
        assert_eq!(kinds(&out), vec![EventKind::Appear]);
    }

    // ── feedback ─────────────────────────────────────────────────────────

    #[test]
    fn no_sampler_means_sentinel() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        let out = m.touch_frame(&p, &r, 1, 0.0).unwrap();
        assert_eq!(out.events[0].touch.feedback, NO_FEEDBACK);
    }

    #[test]
    fn sampler_result_attached_on_appear_and_move() {
        let fb = PixelFeedback::new(vec![42; 16], 4).unwrap();
        let mut m = manager().with_sampler(Box::new(fb));
        let (p, r) = frame(&[1]);
        let out = m.touch_frame(&p, &r, 1, 0.0).unwrap();
        assert_eq!(out.events[0].touch.feedback, 42);
        let out2 = m.touch_frame(&p, &r, 2, 0.1).unwrap();
        assert_eq!(out2.events[0].touch.feedback, 42);
    }

    // ── clustering integration ───────────────────────────────────────────

    #[test]
    fn adjacency_tracks_alive_touches() {
        let mut m = manager();
        let mut p = BTreeMap::new();
        p.insert(1, (0.0, 0.0));
        p.insert(2, (0.05, 0.0));
        p.insert(3, (2.0, 0.5));
        let mut r = BTreeMap::new();
        for id in [1, 2, 3] {
            r.insert(id, (0.0, 0.0));
        }
        m.touch_frame(&p, &r, 1, 0.0).unwrap();
        assert_eq!(m.adjacency(), &[(2, 1)]);

        // 2 lifts off; adjacency is recomputed over what is left.
        p.remove(&2);
        m.touch_frame(&p, &r, 2, 0.1).unwrap();
        assert!(m.adjacency().is_empty());
    }

    #[test]
    fn frame_echoes_time_and_fseq() {
        let mut m = manager();
        let (p, r) = frame(&[1]);
        let out = m.touch_frame(&p, &r, 41, 7.5).unwrap();
        assert_eq!(out.fseq, 41);
        assert_eq!(out.t, 7.5);
    }
}
