//! Index simplification for polylines
//!
//! Two passes, both producing [`BitVector`]s of retained indices rather than copied
//! point arrays:
//!
//! 1. A radial-distance filter drops points closer than the tolerance to the last kept
//!    point (cheap, linear, removes GPS jitter clusters).
//! 2. Douglas-Peucker runs over the survivors of pass 1.
//!
//! The passes are joined with [`BitVector::compose`]: pass 2 yields *ranks* into the
//! pass 1 set, which map back to raw point indices.

use crate::BitVector;
use geo::Coord;

/// Simplify `n` points read through `point(i)` with tolerance `epsilon`
///
/// `point` is called by index on every access and its return value is never held
/// across another call, so it may hand out views into a reused buffer.
///
/// # Returns
/// Retained indices in `[0, n)`. Always contains `0` and `n - 1`; with `n <= 2`
/// every point is kept.
pub fn simplify<F>(n: usize, epsilon: f64, point: F) -> BitVector
where
    F: Fn(usize) -> Coord<f64>,
{
    #[cfg(feature = "profiling")]
    profiling::scope!("simplify::simplify");

    if n <= 2 {
        return BitVector::from_range(0, n);
    }

    let radial = radial_distance(n, epsilon, &point);
    let survivors = radial.size();
    if survivors <= 2 {
        return radial;
    }

    // Ranks of `radial` retained by Douglas-Peucker
    let members = radial.to_vec();
    let ranks = douglas_peucker(members.len(), epsilon, |r| point(members[r]));

    let result = radial.compose(&ranks);
    tracing::trace!(
        points = n,
        radial = survivors,
        retained = result.size(),
        epsilon,
        "Simplified polyline"
    );
    result
}

/// Radial-distance pre-pass
///
/// Keeps point 0, then each point farther than `epsilon` from the last kept one,
/// and always the final point.
pub fn radial_distance<F>(n: usize, epsilon: f64, point: F) -> BitVector
where
    F: Fn(usize) -> Coord<f64>,
{
    let mut kept = BitVector::new(n);
    if n == 0 {
        return kept;
    }
    let eps_sq = epsilon * epsilon;

    kept.add(0);
    let mut last = point(0);
    for i in 1..n {
        let p = point(i);
        if squared_distance(p, last) > eps_sq {
            kept.add(i);
            last = p;
        }
    }
    kept.add(n - 1);
    kept
}

/// Douglas-Peucker over `n` points
///
/// Uses an explicit span stack instead of recursion so very long tracks cannot
/// overflow the call stack.
pub fn douglas_peucker<F>(n: usize, epsilon: f64, point: F) -> BitVector
where
    F: Fn(usize) -> Coord<f64>,
{
    let mut kept = BitVector::new(n);
    if n == 0 {
        return kept;
    }
    kept.add(0);
    kept.add(n - 1);
    if n <= 2 {
        return kept;
    }

    let eps_sq = epsilon * epsilon;
    let mut spans = vec![(0usize, n - 1)];

    while let Some((first, last)) = spans.pop() {
        if last <= first + 1 {
            continue;
        }
        let a = point(first);
        let b = point(last);

        let mut max_sq = 0.0;
        let mut index = first;
        for i in (first + 1)..last {
            let d = segment_distance_sq(point(i), a, b);
            if d > max_sq {
                max_sq = d;
                index = i;
            }
        }

        if max_sq > eps_sq {
            kept.add(index);
            spans.push((first, index));
            spans.push((index, last));
        }
    }

    kept
}

#[inline(always)]
fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `a`-`b`
///
/// A zero-length segment degenerates to the distance to `a`.
#[inline(always)]
pub fn segment_distance_sq(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let mut x = a.x;
    let mut y = a.y;
    let dx = b.x - x;
    let dy = b.y - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - x) * dx + (p.y - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.x;
            y = b.y;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    let dx = p.x - x;
    let dy = p.y - y;
    dx * dx + dy * dy
}
