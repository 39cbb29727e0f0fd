//! Toroidal world math.
//!
//! The map wraps on both horizontal axes, so stored coordinates are never
//! clamped; wrapping happens only here, when two positions are compared. The
//! renderer, targeting, AI and proximity objectives all go through these
//! functions so they agree on what "nearest" means.
//!
//! Altitude (z) never wraps.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Shortest signed representative of `delta` on a ring of circumference `size`,
/// in `(-size / 2, size / 2]`.
#[inline]
pub fn wrap(delta: f32, size: f32) -> f32 {
    if size <= 0.0 {
        return delta;
    }
    let r = delta.rem_euclid(size);
    if r > size * 0.5 {
        r - size
    } else {
        r
    }
}

/// Wrapped per-axis delta from `a` to `b` on the horizontal plane.
#[inline]
pub fn wrapped_delta_2d(a: Vec2, b: Vec2, map_size: f32) -> Vec2 {
    Vec2::new(wrap(b.x - a.x, map_size), wrap(b.y - a.y, map_size))
}

/// Plain Euclidean distance on the horizontal plane. Only for short-range checks
/// that cannot straddle the map seam.
#[inline]
pub fn distance_2d(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Plain Euclidean distance in 3D. Only for short-range checks that cannot
/// straddle the map seam.
#[inline]
pub fn distance_3d(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Horizontal distance through the shortest periodic image.
#[inline]
pub fn distance_2d_wrapped(a: Vec2, b: Vec2, map_size: f32) -> f32 {
    wrapped_delta_2d(a, b, map_size).length()
}

/// 3D distance with x and y wrapped, z taken as-is.
///
/// Equals the minimum over all periodic images of `b`, so it is never larger than
/// [`distance_3d`] and matches it when no axis delta exceeds half the map.
#[inline]
pub fn distance_3d_wrapped(a: Vec3, b: Vec3, map_size: f32) -> f32 {
    let dx = wrap(b.x - a.x, map_size);
    let dy = wrap(b.y - a.y, map_size);
    let dz = b.z - a.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Map an angle onto `[0, 2π)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Map an angle onto `(-π, π]`.
#[inline]
pub fn normalize_angle_to_range(angle: f32) -> f32 {
    let a = normalize_angle(angle);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Shortest signed turn that takes heading `from` onto heading `to`.
#[inline]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_angle_to_range(to - from)
}

/// Heading (radians, 0 = +x, counter-clockwise toward +y) from `from` to `to`
/// along the shortest wrapped path.
#[inline]
pub fn bearing_wrapped(from: Vec2, to: Vec2, map_size: f32) -> f32 {
    let d = wrapped_delta_2d(from, to, map_size);
    normalize_angle(d.y.atan2(d.x))
}

/// Result of a nearest-target query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<K> {
    pub key: K,
    pub distance: f32,
}

/// Linear scan for the candidate closest to `origin`.
///
/// Candidates failing `filter` are skipped. Distances are wrapped when
/// `map_size > 0`, plain otherwise. A candidate replaces the current best only
/// when strictly closer, so ties keep the earliest one scanned. Nothing at or
/// beyond `max_dist` (unbounded when `None`) qualifies.
pub fn find_nearest_target<K, I, F>(
    candidates: I,
    origin: Vec2,
    max_dist: Option<f32>,
    mut filter: F,
    map_size: f32,
) -> Option<Nearest<K>>
where
    I: IntoIterator<Item = (K, Vec2)>,
    F: FnMut(&K) -> bool,
{
    let mut best_distance = max_dist.unwrap_or(f32::INFINITY);
    let mut best: Option<Nearest<K>> = None;

    for (key, location) in candidates {
        if !filter(&key) {
            continue;
        }
        let distance = if map_size > 0.0 {
            distance_2d_wrapped(origin, location, map_size)
        } else {
            distance_2d(origin, location)
        };
        if distance < best_distance {
            best_distance = distance;
            best = Some(Nearest { key, distance });
        }
    }

    best
}
