//! Animated dot placement
//!
//! Dots march along each track at the speed it was recorded. A dot sits at every
//! track time `t` with `t ≡ now (mod T)`, where `T` is the spacing period, so a
//! segment spanning `[ta, tb)` holds the dots
//!
//! ```text
//! t = now - k * T   for   k ∈ [floor((now - tb) / T) + 1, floor((now - ta) / T)]
//! ```
//!
//! The upper end of each segment is exclusive so a dot landing exactly on a shared
//! vertex is emitted once, by the later segment.

use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Global animation parameters
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationClock {
    /// Track-time spacing between consecutive dots, in seconds
    pub period: f64,
    /// Track seconds elapsed per wall-clock second
    pub time_scale: f64,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            period: 60.0,
            time_scale: 60.0,
        }
    }
}

impl AnimationClock {
    /// Sampler for the frame at wall-clock time `now` (seconds)
    pub fn sampler(&self, now: f64) -> DotSampler {
        DotSampler::new(now * self.time_scale, self.period)
    }
}

/// Places dots on segments for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotSampler {
    now: f64,
    period: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl DotSampler {
    /// `now` is in track time, already scaled
    pub fn new(now: f64, period: f64) -> Self {
        Self { now, period }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Emit every dot on segment `a`-`b` timed `ta`-`tb`
    ///
    /// Segments with non-increasing or non-finite times carry no dots, as does a
    /// non-positive period.
    ///
    /// # Returns
    /// The number of dots emitted
    #[inline]
    pub fn sample(
        &self,
        a: Coord<f64>,
        ta: f64,
        b: Coord<f64>,
        tb: f64,
        mut emit: impl FnMut(f64, f64),
    ) -> usize {
        let duration = tb - ta;
        if !(duration > 0.0) || !duration.is_finite() || !(self.period > 0.0) {
            return 0;
        }

        let k_min = ((self.now - tb) / self.period).floor() + 1.0;
        let k_max = ((self.now - ta) / self.period).floor();
        if !(k_min <= k_max) {
            return 0;
        }

        let dx = (b.x - a.x) / duration;
        let dy = (b.y - a.y) / duration;
        let mut count = 0;
        let mut k = k_min;
        while k <= k_max {
            let t = self.now - k * self.period;
            // Float error at the boundaries
            if t >= ta && t < tb {
                let dt = t - ta;
                emit(a.x + dt * dx, a.y + dt * dy);
                count += 1;
            }
            k += 1.0;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Coord<f64> = Coord { x: 0.0, y: 0.0 };
    const B: Coord<f64> = Coord { x: 10.0, y: 10.0 };

    fn dots(now: f64, period: f64, ta: f64, tb: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        DotSampler::new(now, period).sample(A, ta, B, tb, |x, y| out.push((x, y)));
        out
    }

    #[test]
    fn test_dots_at_now_seven() {
        assert_eq!(dots(7.0, 5.0, 0.0, 10.0), vec![(7.0, 7.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_dots_at_now_twelve() {
        assert_eq!(dots(12.0, 5.0, 0.0, 10.0), vec![(7.0, 7.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_upper_end_is_exclusive() {
        // t = 10 falls on the end vertex and belongs to the next segment
        assert_eq!(dots(10.0, 5.0, 0.0, 10.0), vec![(5.0, 5.0), (0.0, 0.0)]);
        let mut next = Vec::new();
        DotSampler::new(10.0, 5.0).sample(B, 10.0, Coord { x: 20.0, y: 20.0 }, 20.0, |x, y| {
            next.push((x, y))
        });
        assert_eq!(next, vec![(15.0, 15.0), (10.0, 10.0)]);
    }

    #[test]
    fn test_dots_stay_within_segment() {
        for step in 0..200 {
            let now = step as f64 * 0.37 - 20.0;
            for (x, y) in dots(now, 3.0, 0.0, 10.0) {
                assert!((0.0..10.0).contains(&x), "x={} at now={}", x, now);
                assert_eq!(x, y);
            }
        }
    }

    #[test]
    fn test_degenerate_segments() {
        assert!(dots(5.0, 5.0, 3.0, 3.0).is_empty());
        assert!(dots(5.0, 5.0, 4.0, 2.0).is_empty());
        assert!(dots(5.0, 0.0, 0.0, 10.0).is_empty());
        assert!(dots(f64::NAN, 5.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_short_segment_may_be_empty() {
        // Period longer than the segment: only some frames place a dot
        assert!(dots(4.0, 100.0, 0.0, 3.0).is_empty());
        assert_eq!(dots(102.0, 100.0, 0.0, 3.0).len(), 1);
    }

    #[test]
    fn test_clock_scales_time() {
        let clock = AnimationClock {
            period: 5.0,
            time_scale: 2.0,
        };
        let sampler = clock.sampler(3.5);
        assert_eq!(sampler.now(), 7.0);
        let mut out = Vec::new();
        sampler.sample(A, 0.0, B, 10.0, |x, y| out.push((x, y)));
        assert_eq!(out, vec![(7.0, 7.0), (2.0, 2.0)]);
    }
}
