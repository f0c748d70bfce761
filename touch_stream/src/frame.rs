//! Inbound frame wire format.
//!
//! One frame is one atomic snapshot of every currently-reported touch,
//! broadcast by the upstream ingestion layer as a JSON object:
//!
//! ```json
//! {"touches": {"5": [0.31, -0.12]}, "raw": {"5": [0.74, 0.22]},
//!  "fseq": 1041, "t": 5123.88, "stale": 0}
//! ```
//!
//! A source that has gone quiet sends stale keep-alives — empty touch maps
//! with `stale: 1` and `fseq` [`STALE_FSEQ`] — so subscribers know the last
//! real data is no longer good.  Stale frames still go through the manager:
//! an empty frame is exactly what ages the graveyard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use touch_core::{LonLat, RawXy, TouchId};

/// Reserved `fseq` for stale/no-data heartbeats, by upstream convention.
pub const STALE_FSEQ: i64 = -2;

/// One complete frame as delivered by the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchFrame {
    /// Touch id → (longitude, latitude) radians.
    pub touches: BTreeMap<TouchId, LonLat>,
    /// Touch id → raw device coordinates, pre-calibration.
    pub raw: BTreeMap<TouchId, RawXy>,
    /// Frame sequence number, monotonic per source.
    pub fseq: i64,
    /// Timestamp in the sender's time base.
    pub t: f64,
    /// 1 when this is a keep-alive rather than live touch data.
    #[serde(default)]
    pub stale: u8,
}

impl TouchFrame {
    /// A live frame with no touches.
    pub fn empty(fseq: i64, t: f64) -> Self {
        TouchFrame {
            touches: BTreeMap::new(),
            raw: BTreeMap::new(),
            fseq,
            t,
            stale: 0,
        }
    }

    /// A stale keep-alive at time `t`.
    pub fn stale(t: f64) -> Self {
        TouchFrame {
            touches: BTreeMap::new(),
            raw: BTreeMap::new(),
            fseq: STALE_FSEQ,
            t,
            stale: 1,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale != 0 || self.fseq == STALE_FSEQ
    }

    /// Decode one frame from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_json() {
        let json = r#"{"touches":{"5":[0.31,-0.12]},"raw":{"5":[0.74,0.22]},"fseq":1041,"t":5123.88,"stale":0}"#;
        let f = TouchFrame::from_json(json).unwrap();
        assert_eq!(f.fseq, 1041);
        assert_eq!(f.touches[&5], (0.31, -0.12));
        assert_eq!(f.raw[&5], (0.74, 0.22));
        assert!(!f.is_stale());
    }

    #[test]
    fn stale_field_defaults_to_zero() {
        let json = r#"{"touches":{},"raw":{},"fseq":3,"t":1.0}"#;
        let f = TouchFrame::from_json(json).unwrap();
        assert_eq!(f.stale, 0);
        assert!(!f.is_stale());
    }

    #[test]
    fn stale_heartbeat_detected_by_flag_or_fseq() {
        assert!(TouchFrame::stale(9.0).is_stale());
        let mut f = TouchFrame::empty(STALE_FSEQ, 9.0);
        assert!(f.is_stale());
        f.fseq = 7;
        f.stale = 1;
        assert!(f.is_stale());
    }

    #[test]
    fn json_round_trip() {
        let mut f = TouchFrame::empty(12, 3.5);
        f.touches.insert(-3, (1.0, 0.5));
        f.raw.insert(-3, (0.1, 0.9));
        let back = TouchFrame::from_json(&f.to_json().unwrap()).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(TouchFrame::from_json(r#"{"touches": 5}"#).is_err());
        assert!(TouchFrame::from_json("not json").is_err());
    }
}
