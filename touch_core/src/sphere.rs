//! Angular geometry on the unit sphere.
//!
//! All positions are (longitude, latitude) pairs in radians, longitude in
//! [−π, π], latitude in [−π/2, π/2].  Distances are angular: the great-circle
//! arc between two surface points, 0 for coincident points and π for
//! antipodes.

use std::f64::consts::PI;

/// Angular position: (longitude, latitude) in radians.
pub type LonLat = (f64, f64);

// ════════════════════════════════════════════════════════════════════════════
// Great-circle distance
// ════════════════════════════════════════════════════════════════════════════

/// Great-circle (angular) distance between two points, in radians.
///
/// Uses the spherical law of cosines:
/// `acos(sin φ₁ · sin φ₂ + cos φ₁ · cos φ₂ · cos Δλ)`.
///
/// The cosine argument is clamped to [−1, 1] so floating-point drift on
/// coincident or antipodal points never yields NaN.
pub fn spherical_distance(a: LonLat, b: LonLat) -> f64 {
    let dlon = b.0 - a.0;
    let (lat1, lat2) = (a.1, b.1);
    let c = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
    c.clamp(-1.0, 1.0).acos()
}

// ════════════════════════════════════════════════════════════════════════════
// Equirectangular pixel projection
// ════════════════════════════════════════════════════════════════════════════

/// Project an angular position onto a `size`×`size` square pixel buffer.
///
/// Equirectangular: longitude maps linearly to x, latitude to y (north at
/// y = 0).  Returns fractional pixel coordinates; callers truncate and
/// bounds-check.  Positions outside the canonical ranges land outside
/// [0, size) and should be treated as a miss.
pub fn polar_to_pixel(lonlat: LonLat, size: usize) -> (f64, f64) {
    let (lon, lat) = lonlat;
    let s = size as f64;
    let x = (lon + PI) / (2.0 * PI) * s;
    let y = (PI / 2.0 - lat) / PI * s;
    (x, y)
}

// ════════════════════════════════════════════════════════════════════════════
// Circular mean
// ════════════════════════════════════════════════════════════════════════════

/// Circular mean of a set of angular positions.
///
/// Each point is lifted to a unit 3-vector, the vectors are summed, and the
/// sum is converted back to (lon, lat).  This is the correct "centroid" on
/// the sphere — naive averaging of longitudes breaks at the ±π seam.
///
/// An empty input returns (0, 0) by convention; callers guard.
pub fn circular_mean(points: &[LonLat]) -> LonLat {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (mut x, mut y, mut z) = (0.0_f64, 0.0_f64, 0.0_f64);
    for &(lon, lat) in points {
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }
    let lon = y.atan2(x);
    let lat = z.atan2((x * x + y * y).sqrt());
    (lon, lat)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
