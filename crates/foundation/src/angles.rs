//! Angle helpers in degrees.
//!
//! Headings are kept in `[0, 360)`; view offsets use the signed range
//! `(-180, 180]`.

/// Wraps any finite angle into `[0, 360)`.
///
/// Equivalent to `((x % 360) + 360) % 360`, but computed with `rem_euclid`
/// so that values already in range come back bit-identical.
pub fn normalize360(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wraps any finite angle into `(-180, 180]`.
pub fn normalize_signed180(degrees: f64) -> f64 {
    let wrapped = normalize360(degrees);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Smallest signed rotation taking `from` to `to`, in `(-180, 180]`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    normalize_signed180(to - from)
}

pub fn clamp_pitch(pitch: f64) -> f64 {
    pitch.clamp(-90.0, 90.0)
}
