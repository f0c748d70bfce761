//! Spherical-distance clustering: which touches are close enough to count
//! as one compound contact.
//!
//! The engine is per-frame adjacency: all index pairs whose great-circle
//! separation is under a threshold.  [`ClusterSet`] resolves those index
//! pairs to touch identities each frame; carrying clusters *across* frames
//! (merge/split with stable cluster ids) is an extension point, see
//! [`ClusterSet::update`].

use crate::sphere::{spherical_distance, LonLat};
use crate::touch::TouchId;

// ════════════════════════════════════════════════════════════════════════════
// Pairwise adjacency
// ════════════════════════════════════════════════════════════════════════════

/// All unordered pairs of points closer than `threshold` radians.
///
/// Only the strictly-lower triangle is scanned, so each pair `(i, j)` in the
/// result has `i > j` — no self-pairs, no mirrored duplicates.  Output order
/// is deterministic: ascending `i`, then ascending `j`.
///
/// 0 or 1 points short-circuit to an empty result without computing any
/// distance.  O(n²) in the point count; fine at physical touch counts.
pub fn cluster_touches(points: &[LonLat], threshold: f64) -> Vec<(usize, usize)> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut pairs = Vec::new();
    for i in 1..points.len() {
        for j in 0..i {
            if spherical_distance(points[i], points[j]) < threshold {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

// ════════════════════════════════════════════════════════════════════════════
// ClusterSet
// ════════════════════════════════════════════════════════════════════════════

/// Per-frame adjacency among the currently active touches, expressed in
/// touch identities rather than list indices.
#[derive(Debug)]
pub struct ClusterSet {
    threshold: f64,
    edges: Vec<(TouchId, TouchId)>,
}

impl ClusterSet {
    pub fn new(threshold: f64) -> Self {
        ClusterSet { threshold, edges: Vec::new() }
    }

    /// Angular tolerance the set clusters under.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Adjacency edges from the most recent [`update`](Self::update), as
    /// `(id_a, id_b)` pairs with `id_a` later in the input order.
    pub fn edges(&self) -> &[(TouchId, TouchId)] {
        &self.edges
    }

    /// Recompute adjacency for one frame.
    ///
    /// `touches` is the ordered active-touch list; index pairs from
    /// [`cluster_touches`] are resolved to the underlying identities and
    /// stored until the next update.
    ///
    /// Persistent cluster tracking — merging transitively-adjacent touches
    /// into [`Cluster`](crate::touch::Cluster) entities with stable ids and
    /// membership churn only at threshold crossings — would hook in here.
    /// No consumer needs it yet, so only the per-frame edge list is kept.
    pub fn update(&mut self, touches: &[(TouchId, LonLat)]) {
        let positions: Vec<LonLat> = touches.iter().map(|&(_, p)| p).collect();
        self.edges = cluster_touches(&positions, self.threshold)
            .into_iter()
            .map(|(i, j)| (touches[i].0, touches[j].0))
            .collect();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
