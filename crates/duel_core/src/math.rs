//! Planar vector helpers.
//!
//! The agent lives in 3D space but every steering decision is made on the
//! horizontal (XZ) plane. Headings are expressed as yaw angles in degrees,
//! measured clockwise from +Z when viewed from above, so a yaw of 90° faces +X.
//!
//! Every helper here is total: non-finite or near-zero inputs fall back to a
//! caller-supplied default instead of producing NaN.

use glam::Vec3;

/// World up axis.
pub const UP: Vec3 = Vec3::Y;

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-4;

/// Project a vector onto the horizontal plane.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalize `v`, or return `fallback` when it is degenerate.
#[must_use]
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len.is_finite() && len > EPSILON {
        v / len
    } else {
        fallback
    }
}

/// Horizontal unit direction toward `to`, or `fallback` if the points coincide.
#[must_use]
pub fn direction_between(from: Vec3, to: Vec3, fallback: Vec3) -> Vec3 {
    normalize_or(flatten(to - from), fallback)
}

/// Horizontal distance between two points.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Yaw (degrees) of a horizontal direction.
#[must_use]
pub fn yaw_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z).to_degrees()
}

/// Unit horizontal direction for a yaw in degrees.
#[must_use]
pub fn from_yaw(yaw_degrees: f32) -> Vec3 {
    let rad = yaw_degrees.to_radians();
    Vec3::new(rad.sin(), 0.0, rad.cos())
}

/// Wrap an angle into `(-180, 180]`.
#[must_use]
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Rotate a horizontal direction about the up axis.
#[must_use]
pub fn rotate_yaw(dir: Vec3, degrees: f32) -> Vec3 {
    from_yaw(yaw_of(dir) + degrees)
}

/// Turn `current` toward `target` by at most `max_degrees`.
///
/// Both directions are flattened first. A degenerate target leaves the
/// heading unchanged.
#[must_use]
pub fn rotate_towards(current: Vec3, target: Vec3, max_degrees: f32) -> Vec3 {
    let current = normalize_or(flatten(current), Vec3::Z);
    let target = flatten(target);
    if target.length() <= EPSILON || !target.is_finite() {
        return current;
    }
    let delta = wrap_degrees(yaw_of(target) - yaw_of(current));
    let step = delta.clamp(-max_degrees.abs(), max_degrees.abs());
    rotate_yaw(current, step)
}

/// Horizontal perpendicular of `dir` (`dir × up`).
#[must_use]
pub fn lateral(dir: Vec3) -> Vec3 {
    normalize_or(flatten(dir).cross(UP), Vec3::X)
}

/// Clamp a timer or counter to a finite, non-negative value.
#[must_use]
pub fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Replace a non-finite vector with `fallback`.
#[must_use]
pub fn finite_or(v: Vec3, fallback: Vec3) -> Vec3 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Clamp a movement request to magnitude ≤ 1, zeroing non-finite input.
#[must_use]
pub fn clamp_request(v: Vec3) -> Vec3 {
    if !v.is_finite() {
        return Vec3::ZERO;
    }
    v.clamp_length_max(1.0)
}

/// Bit-exact hash input for a vector.
#[must_use]
pub fn vec3_bits(v: Vec3) -> [u32; 3] {
    [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}
