//! Feedback lookup: what rendered object sits under a touch point.
//!
//! The renderer is an external collaborator; the core only defines the
//! sampler interface and a square pixel-buffer implementation of it.  A
//! sampler must never fail the frame — any lookup problem degrades to
//! [`NO_FEEDBACK`].

use crate::sphere::{polar_to_pixel, LonLat};
use crate::touch::{FeedbackId, NO_FEEDBACK};

/// Synchronous lookup of the object id under an angular position.
///
/// Implementations must be non-blocking and infallible at this boundary:
/// out-of-range positions, empty buffers, or any internal error return
/// [`NO_FEEDBACK`] rather than propagating.
pub trait FeedbackSampler {
    fn sample(&self, lonlat: LonLat) -> FeedbackId;
}

// ════════════════════════════════════════════════════════════════════════════
// PixelFeedback — square object-id buffer
// ════════════════════════════════════════════════════════════════════════════

/// Sampler backed by a square buffer of object ids, as produced by a
/// renderer's pick pass.
///
/// The angular position is projected equirectangularly onto the buffer and
/// indexed directly.  Buffers must be square.
pub struct PixelFeedback {
    pixels: Vec<FeedbackId>,
    size: usize,
}

impl PixelFeedback {
    /// Wrap a `size`×`size` buffer.  Returns `None` when the pixel count
    /// does not match the stated size.
    pub fn new(pixels: Vec<FeedbackId>, size: usize) -> Option<Self> {
        if pixels.len() != size * size {
            return None;
        }
        Some(PixelFeedback { pixels, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl FeedbackSampler for PixelFeedback {
    fn sample(&self, lonlat: LonLat) -> FeedbackId {
        if self.size == 0 {
            return NO_FEEDBACK;
        }
        let (x, y) = polar_to_pixel(lonlat, self.size);
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return NO_FEEDBACK;
        }
        let (xi, yi) = (x as usize, y as usize);
        if xi >= self.size || yi >= self.size {
            return NO_FEEDBACK;
        }
        self.pixels[yi * self.size + xi]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
