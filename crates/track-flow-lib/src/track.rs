//! Track storage, gap detection and per-zoom geometry
//!
//! A [`Track`] holds one activity's projected points with their timestamps and
//! altitudes, plus everything derived from them lazily: a simplified index set and
//! bad-segment markers per zoom level, and the double-buffered [`SegmentMask`] of
//! segments visible in the current frame.

use crate::{
    AnimationClock, BitVector, DataError, NthCursor, PixelBounds, Result, SegmentMask, TrackId,
    Welford, simplify, utils,
};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of distinct zoom levels with a cache slot (`0..ZOOM_LEVELS`)
pub const ZOOM_LEVELS: u8 = 24;

/// Gaps whose log squared length exceeds the track mean by more than this many
/// standard deviations are treated as recording dropouts
pub const ZSCORE_CUTOFF: f64 = 5.0;

const MIN_LOG_SPREAD: f64 = 1e-9;

/// Raw samples of one activity as parallel arrays
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackData {
    /// `(lat, lng)` in degrees
    pub lat_lng: Vec<(f64, f64)>,
    /// Seconds, increasing
    pub time: Vec<f64>,
    /// Meters
    pub altitude: Vec<f64>,
}

impl TrackData {
    pub fn new(lat_lng: Vec<(f64, f64)>, time: Vec<f64>, altitude: Vec<f64>) -> Self {
        Self {
            lat_lng,
            time,
            altitude,
        }
    }

    pub fn len(&self) -> usize {
        self.lat_lng.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat_lng.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let n = self.lat_lng.len();
        if self.time.len() != n || self.altitude.len() != n {
            return Err(DataError::LengthMismatch {
                lat_lng: n,
                time: self.time.len(),
                altitude: self.altitude.len(),
            });
        }
        if n == 0 {
            return Err(DataError::EmptyTrack);
        }
        Ok(())
    }
}

/// Simplified geometry of a track at one zoom level
#[derive(Clone, Debug, Default)]
pub struct ZoomLevel {
    /// Raw point indices kept by the simplifier
    idx_set: BitVector,
    /// Positions of simplified segments that span a detected gap
    bad_segments: BitVector,
}

impl ZoomLevel {
    #[inline]
    pub fn idx_set(&self) -> &BitVector {
        &self.idx_set
    }

    #[inline]
    pub fn bad_segments(&self) -> &BitVector {
        &self.bad_segments
    }

    /// Segments between consecutive retained points
    #[inline]
    pub fn n_segments(&self) -> usize {
        self.idx_set.size().saturating_sub(1)
    }
}

/// Cache slot for one zoom level
#[derive(Clone, Debug, Default)]
enum ZoomCache {
    #[default]
    NotComputed,
    /// Queued or being simplified; requests must not start a second job
    Computing,
    Ready(ZoomLevel),
}

/// One GPS activity with its derived per-zoom state
#[derive(Clone, Debug)]
pub struct Track {
    id: TrackId,
    /// Absolute (zoom-0) pixel coordinates
    points: Vec<Coord<f64>>,
    time: Vec<f64>,
    altitude: Vec<f64>,
    bounds: PixelBounds,
    /// Raw `i` such that the gap `i -> i + 1` is an outlier
    gaps: Vec<usize>,
    zooms: Vec<ZoomCache>,
    mask: SegmentMask,
    /// Cached total distance in meters (computed once during construction)
    total_distance: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Build a track using the default [`ZSCORE_CUTOFF`]
    pub fn new(id: TrackId, data: TrackData) -> Result<Self> {
        Self::with_cutoff(id, data, ZSCORE_CUTOFF)
    }

    /// Build a track, projecting every sample and detecting gaps
    ///
    /// Samples with a non-finite coordinate or timestamp are dropped; a non-finite
    /// altitude is replaced by zero.
    ///
    /// # Errors
    /// `LengthMismatch` for unequal arrays, `EmptyTrack` for no samples and
    /// `InvalidGeometry` when no sample survives sanitizing.
    pub fn with_cutoff(id: TrackId, data: TrackData, zscore_cutoff: f64) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::new");
        data.validate()?;

        let n = data.len();
        let mut points = Vec::with_capacity(n);
        let mut time = Vec::with_capacity(n);
        let mut altitude = Vec::with_capacity(n);
        let mut bounds = PixelBounds::Empty;
        let mut total_distance = 0.0;
        let mut prev: Option<(f64, f64)> = None;
        let mut dropped = 0usize;

        for ((&(lat, lng), &t), &alt) in data.lat_lng.iter().zip(&data.time).zip(&data.altitude) {
            if !(lat.is_finite() && lng.is_finite() && t.is_finite()) {
                dropped += 1;
                continue;
            }
            let p = utils::project(lat, lng);
            bounds.update(p.x, p.y);
            if let Some(prev) = prev {
                total_distance += utils::haversine_distance(prev, (lat, lng));
            }
            prev = Some((lat, lng));

            points.push(p);
            time.push(t);
            altitude.push(if alt.is_finite() { alt } else { 0.0 });
        }

        if dropped > 0 {
            tracing::warn!(track = %id, dropped, "Skipping non-finite samples");
        }
        if points.is_empty() {
            return Err(DataError::InvalidGeometry(
                "No finite points in track".to_string(),
            ));
        }

        let gaps = detect_gaps(&points, zscore_cutoff);
        if !gaps.is_empty() {
            tracing::debug!(track = %id, gaps = gaps.len(), "Detected recording gaps");
        }

        Ok(Self {
            id,
            points,
            time,
            altitude,
            bounds,
            gaps,
            zooms: vec![ZoomCache::NotComputed; usize::from(ZOOM_LEVELS)],
            mask: SegmentMask::new(),
            total_distance,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Number of (sanitized) points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; construction rejects empty tracks
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box in absolute (zoom-0) pixels
    #[inline]
    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    #[inline]
    pub fn point(&self, i: usize) -> Option<Coord<f64>> {
        self.points.get(i).copied()
    }

    #[inline]
    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    #[inline]
    pub fn time(&self, i: usize) -> Option<f64> {
        self.time.get(i).copied()
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.time
    }

    #[inline]
    pub fn altitude(&self, i: usize) -> Option<f64> {
        self.altitude.get(i).copied()
    }

    #[inline]
    pub fn altitudes(&self) -> &[f64] {
        &self.altitude
    }

    /// Raw indices `i` whose gap to `i + 1` was flagged as an outlier
    #[inline]
    pub fn gap_indices(&self) -> &[usize] {
        &self.gaps
    }

    /// Total distance in meters
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Seconds between the first and last sample
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    // ------------------------------------------------------------------
    // Per-zoom cache
    // ------------------------------------------------------------------

    #[inline]
    pub fn has_zoom(&self, zoom: u8) -> bool {
        matches!(self.zooms.get(usize::from(zoom)), Some(ZoomCache::Ready(_)))
    }

    /// Whether a simplification for `zoom` is queued but not yet installed
    #[inline]
    pub fn is_computing(&self, zoom: u8) -> bool {
        matches!(self.zooms.get(usize::from(zoom)), Some(ZoomCache::Computing))
    }

    /// Simplified geometry for `zoom`, if computed
    #[inline]
    pub fn zoom_level(&self, zoom: u8) -> Option<&ZoomLevel> {
        match self.zooms.get(usize::from(zoom)) {
            Some(ZoomCache::Ready(level)) => Some(level),
            _ => None,
        }
    }

    #[inline]
    pub fn idx_set(&self, zoom: u8) -> Option<&BitVector> {
        self.zoom_level(zoom).map(ZoomLevel::idx_set)
    }

    #[inline]
    pub fn n_segments(&self, zoom: u8) -> Option<usize> {
        self.zoom_level(zoom).map(ZoomLevel::n_segments)
    }

    fn ready(&self, zoom: u8) -> Result<&ZoomLevel> {
        self.zoom_level(zoom)
            .ok_or(DataError::MissingZoomCache { zoom })
    }

    /// Simplified index set for `zoom`, computing it on first use
    ///
    /// # Errors
    /// `MissingZoomCache` when `zoom` has no cache slot (`>= ZOOM_LEVELS`), and
    /// `ZoomInFlight` while a queued job for `zoom` has not been installed.
    pub fn make_idx_set(&mut self, zoom: u8) -> Result<&BitVector> {
        if zoom >= ZOOM_LEVELS {
            return Err(DataError::MissingZoomCache { zoom });
        }
        if self.is_computing(zoom) {
            return Err(DataError::ZoomInFlight { zoom });
        }
        if !self.has_zoom(zoom) {
            let level = self.simplify_for_zoom(zoom);
            self.install_zoom(zoom, level);
        }
        self.ready(zoom).map(ZoomLevel::idx_set)
    }

    /// Mark `zoom` as in flight
    ///
    /// # Returns
    /// `true` when the caller now owns the job, `false` if it is already computing,
    /// already cached or out of range.
    pub(crate) fn begin_zoom(&mut self, zoom: u8) -> bool {
        match self.zooms.get_mut(usize::from(zoom)) {
            Some(slot @ ZoomCache::NotComputed) => {
                *slot = ZoomCache::Computing;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn install_zoom(&mut self, zoom: u8, level: ZoomLevel) {
        if let Some(slot) = self.zooms.get_mut(usize::from(zoom)) {
            *slot = ZoomCache::Ready(level);
        }
    }

    /// Run the simplifier for `zoom` and map every gap onto the simplified segments
    ///
    /// Pure with respect to `self`, so jobs for many tracks can run in parallel.
    pub fn simplify_for_zoom(&self, zoom: u8) -> ZoomLevel {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::simplify_for_zoom");
        let epsilon = utils::tol(f64::from(zoom));
        let idx_set = simplify::simplify(self.points.len(), epsilon, |i| self.points[i]);

        // Both sequences ascend: walk the retained indices once, remembering the
        // last one at or before each gap
        let mut bad_segments = BitVector::new(idx_set.size());
        let mut retained = idx_set.iter().enumerate().peekable();
        let mut position = 0;
        for &gap in &self.gaps {
            while let Some(&(pos, index)) = retained.peek() {
                if index > gap {
                    break;
                }
                position = pos;
                retained.next();
            }
            bad_segments.add(position);
        }

        tracing::trace!(
            track = %self.id,
            zoom,
            points = self.points.len(),
            retained = idx_set.size(),
            bad = bad_segments.size(),
            "Simplified track"
        );
        ZoomLevel {
            idx_set,
            bad_segments,
        }
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Visible segments this frame
    #[inline]
    pub fn seg_mask(&self) -> &BitVector {
        self.mask.current()
    }

    /// Visible segments the previous time the mask was computed
    #[inline]
    pub fn last_seg_mask(&self) -> &BitVector {
        self.mask.last()
    }

    /// Segments an incremental frame needs to draw
    #[inline]
    pub fn seg_mask_updates(&self) -> &BitVector {
        self.mask.updates()
    }

    #[inline]
    pub fn mask(&self) -> &SegmentMask {
        &self.mask
    }

    /// Forget visibility state, e.g. when the track leaves the view
    pub fn reset_seg_mask(&mut self) {
        self.mask.reset();
    }

    /// Recompute which simplified segments are visible in `viewport`
    ///
    /// `viewport` is in absolute (zoom-0) pixels. A segment is visible when either
    /// endpoint is inside; segments spanning a gap never are.
    ///
    /// # Errors
    /// `MissingZoomCache` when `zoom` has not been simplified yet.
    pub fn update_seg_mask(&mut self, viewport: &PixelBounds, zoom: u8) -> Result<&BitVector> {
        let level = match self.zooms.get(usize::from(zoom)) {
            Some(ZoomCache::Ready(level)) => level,
            _ => return Err(DataError::MissingZoomCache { zoom }),
        };
        let contained = viewport.contains(&self.bounds);
        if self.mask.is_unchanged(zoom, contained) {
            self.mask.keep();
            return Ok(self.mask.current());
        }

        let n_segments = level.n_segments();
        let (current, edges) = self.mask.begin(n_segments);
        if contained {
            current.add_range(0, n_segments);
        } else {
            let mut prev_inside = false;
            for (pos, index) in level.idx_set.iter().enumerate() {
                let p = self.points[index];
                let inside = viewport.contains_point(p.x, p.y);
                if inside {
                    if pos > 0 {
                        current.add(pos - 1);
                    }
                    if pos < n_segments {
                        current.add(pos);
                    }
                }
                // One endpoint in, one out: the segment crosses the border
                if pos > 0 && inside != prev_inside {
                    edges.add(pos - 1);
                }
                prev_inside = inside;
            }
        }
        current.difference(&level.bad_segments);
        self.mask.finish(zoom, contained);

        Ok(self.mask.current())
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    /// Visit the endpoints (absolute pixels) of each masked segment
    ///
    /// `draw_diff` selects [`Track::seg_mask_updates`] instead of the full mask.
    ///
    /// # Returns
    /// The number of segments visited
    pub fn for_each_segment(
        &self,
        draw_diff: bool,
        mut f: impl FnMut(Coord<f64>, Coord<f64>),
    ) -> Result<usize> {
        self.walk_segments(draw_diff, |a, b| f(self.points[a], self.points[b]))
    }

    /// Visit every animated dot (absolute pixels) on the masked segments at
    /// wall-clock time `now`
    ///
    /// # Returns
    /// The number of dots emitted
    pub fn for_each_dot(
        &self,
        now: f64,
        clock: &AnimationClock,
        draw_diff: bool,
        mut f: impl FnMut(f64, f64),
    ) -> Result<usize> {
        let sampler = clock.sampler(now);
        let mut dots = 0;
        self.walk_segments(draw_diff, |a, b| {
            dots += sampler.sample(
                self.points[a],
                self.time[a],
                self.points[b],
                self.time[b],
                &mut f,
            );
        })?;
        Ok(dots)
    }

    /// Map each masked segment position to its raw endpoint indices
    fn walk_segments(&self, draw_diff: bool, mut f: impl FnMut(usize, usize)) -> Result<usize> {
        let Some(zoom) = self.mask.zoom() else {
            return Ok(0);
        };
        let level = self.ready(zoom)?;
        let mask = if draw_diff {
            self.mask.updates()
        } else {
            self.mask.current()
        };

        let mut cursor = NthCursor::new();
        let mut count = 0;
        for s in mask {
            let (Some(a), Some(b)) = (cursor.nth(&level.idx_set, s), cursor.nth(&level.idx_set, s + 1))
            else {
                break;
            };
            f(a, b);
            count += 1;
        }
        Ok(count)
    }
}

/// Outlier gaps by z-score of `ln(d²)`
///
/// Only the upper tail counts: a dropout is one long jump, while a near-duplicate
/// fix is merely short. Zero-length gaps have no logarithm and are neither counted
/// nor flagged.
fn detect_gaps(points: &[Coord<f64>], cutoff: f64) -> Vec<usize> {
    let log_d2: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let dx = w[1].x - w[0].x;
            let dy = w[1].y - w[0].y;
            (dx * dx + dy * dy).ln()
        })
        .collect();

    let mut stats = Welford::new();
    stats.extend(log_d2.iter().copied());
    // Below this the spread is rounding noise of a regularly sampled track
    if stats.std_dev() < MIN_LOG_SPREAD {
        return Vec::new();
    }

    log_d2
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d.is_finite() && stats.z_score(d) > cutoff)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(lat_lng: Vec<(f64, f64)>) -> TrackData {
        let n = lat_lng.len();
        TrackData::new(
            lat_lng,
            (0..n).map(|i| i as f64 * 10.0).collect(),
            vec![100.0; n],
        )
    }

    /// Points along the equator, evenly spaced, with one long jump after `jump_at`
    fn equator_with_jump(n: usize, jump_at: usize) -> TrackData {
        let mut lng = 0.0;
        let lat_lng = (0..n)
            .map(|i| {
                let p = (0.0001 * (i % 2) as f64, lng);
                lng += if i == jump_at { 2.0 } else { 0.001 };
                p
            })
            .collect();
        data(lat_lng)
    }

    #[test]
    fn test_track_creation() {
        let track = Track::new(
            TrackId(1),
            data(vec![(51.5074, -0.1278), (51.5076, -0.1276), (51.5078, -0.1274)]),
        )
        .unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.id(), TrackId(1));
        assert!(!track.bounds().is_empty());
        assert_eq!(track.duration(), 20.0);
        assert!(track.total_distance() > 0.0);
        assert!(track.gap_indices().is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let result = Track::new(
            TrackId(0),
            TrackData::new(vec![(0.0, 0.0), (1.0, 1.0)], vec![0.0], vec![0.0, 0.0]),
        );
        assert!(matches!(
            result,
            Err(DataError::LengthMismatch {
                lat_lng: 2,
                time: 1,
                altitude: 2
            })
        ));
    }

    #[test]
    fn test_empty_track_fails() {
        let result = Track::new(TrackId(0), TrackData::default());
        assert!(matches!(result, Err(DataError::EmptyTrack)));
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let mut d = data(vec![(10.0, 10.0), (f64::NAN, 10.0), (10.1, 10.1), (10.2, 10.2)]);
        d.time[3] = f64::INFINITY;
        d.altitude[2] = f64::NAN;
        let track = Track::new(TrackId(0), d).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.times(), &[0.0, 20.0]);
        assert_eq!(track.altitude(1), Some(0.0));
        assert!(track.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_all_non_finite_is_invalid() {
        let result = Track::new(TrackId(0), data(vec![(f64::NAN, 0.0)]));
        assert!(matches!(result, Err(DataError::InvalidGeometry(_))));
    }

    #[test]
    fn test_gap_detection() {
        let track = Track::new(TrackId(0), equator_with_jump(100, 49)).unwrap();
        assert_eq!(track.gap_indices(), &[49]);
    }

    #[test]
    fn test_no_gaps_in_regular_track() {
        let track = Track::new(TrackId(0), equator_with_jump(100, usize::MAX)).unwrap();
        assert!(track.gap_indices().is_empty());
    }

    #[test]
    fn test_near_duplicate_fix_is_not_a_gap() {
        // Regular track where one fix repeats its predecessor almost exactly
        let lat_lng = (0..400)
            .map(|i| {
                let (j, nudge) = if i == 200 { (199, 1e-9) } else { (i, 0.0) };
                (0.0001 * f64::from(j % 2), f64::from(j) * 0.001 + nudge)
            })
            .collect();
        let mut track = Track::new(TrackId(0), data(lat_lng)).unwrap();
        assert!(track.gap_indices().is_empty());

        track.make_idx_set(10).unwrap();
        assert!(track.zoom_level(10).unwrap().bad_segments().is_empty());
        let view = PixelBounds::new(0.0, 0.0, 256.0, 256.0);
        let n_segments = track.n_segments(10).unwrap();
        let mask = track.update_seg_mask(&view, 10).unwrap();
        assert_eq!(mask.size(), n_segments);
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_make_idx_set_defers_to_queued_job() {
        let mut track = Track::new(TrackId(0), equator_with_jump(10, usize::MAX)).unwrap();
        assert!(track.begin_zoom(7));
        assert!(matches!(
            track.make_idx_set(7),
            Err(DataError::ZoomInFlight { zoom: 7 })
        ));
        assert!(track.is_computing(7));

        let level = track.simplify_for_zoom(7);
        track.install_zoom(7, level);
        assert!(track.make_idx_set(7).is_ok());
    }

    #[test]
    fn test_duplicate_points_are_not_gaps() {
        let lat_lng = (0..50).map(|i| (0.0, (i / 2) as f64 * 0.001)).collect();
        let track = Track::new(TrackId(0), data(lat_lng)).unwrap();
        assert!(track.gap_indices().is_empty());
    }

    #[test]
    fn test_make_idx_set_is_memoized() {
        let mut track = Track::new(TrackId(0), equator_with_jump(100, usize::MAX)).unwrap();
        assert!(!track.has_zoom(10));
        let first = track.make_idx_set(10).unwrap().clone();
        assert!(track.has_zoom(10));
        assert!(first.has(0) && first.has(99));
        assert_eq!(track.make_idx_set(10).unwrap(), &first);
        assert!(!track.has_zoom(11));
        assert!(track.make_idx_set(ZOOM_LEVELS).is_err());
    }

    #[test]
    fn test_begin_zoom_is_single_flight() {
        let mut track = Track::new(TrackId(0), equator_with_jump(10, usize::MAX)).unwrap();
        assert!(track.begin_zoom(3));
        assert!(track.is_computing(3));
        assert!(!track.begin_zoom(3));

        let level = track.simplify_for_zoom(3);
        track.install_zoom(3, level);
        assert!(track.has_zoom(3));
        assert!(!track.begin_zoom(3));
        assert!(!track.begin_zoom(ZOOM_LEVELS));
    }

    #[test]
    fn test_gap_maps_to_simplified_segment() {
        let mut track = Track::new(TrackId(0), equator_with_jump(100, 49)).unwrap();
        for zoom in [0, 8, 16, 23] {
            track.make_idx_set(zoom).unwrap();
            let level = track.zoom_level(zoom).unwrap();
            let idx = level.idx_set().to_vec();
            // Exactly one bad simplified segment, and it spans the raw gap
            let bad = level.bad_segments().to_vec();
            assert_eq!(bad.len(), 1, "zoom {}", zoom);
            let s = bad[0];
            assert!(idx[s] <= 49 && idx[s + 1] >= 50, "zoom {}", zoom);
        }
    }

    #[test]
    fn test_update_seg_mask_requires_cache() {
        let mut track = Track::new(TrackId(0), equator_with_jump(10, usize::MAX)).unwrap();
        let view = PixelBounds::new(0.0, 0.0, 256.0, 256.0);
        assert!(matches!(
            track.update_seg_mask(&view, 5),
            Err(DataError::MissingZoomCache { zoom: 5 })
        ));
    }

    #[test]
    fn test_contained_track_gets_full_mask_minus_gaps() {
        let mut track = Track::new(TrackId(0), equator_with_jump(100, 49)).unwrap();
        let zoom = 20;
        track.make_idx_set(zoom).unwrap();
        let n = track.n_segments(zoom).unwrap();
        let view = PixelBounds::new(0.0, 0.0, 256.0, 256.0);

        let mask = track.update_seg_mask(&view, zoom).unwrap().clone();
        assert_eq!(mask.size(), n - 1);
        let bad = track.zoom_level(zoom).unwrap().bad_segments().clone();
        assert!(mask.new_intersection(&bad).is_empty());
        assert_eq!(track.seg_mask_updates(), &mask);

        // Same zoom, still contained: short-circuits with nothing new to draw
        track.update_seg_mask(&view, zoom).unwrap();
        assert_eq!(track.seg_mask(), &mask);
        assert!(track.seg_mask_updates().is_empty());
    }

    #[test]
    fn test_partial_view() {
        let mut track = Track::new(TrackId(0), equator_with_jump(40, usize::MAX)).unwrap();
        let zoom = 23;
        track.make_idx_set(zoom).unwrap();
        let idx = track.idx_set(zoom).unwrap().to_vec();
        assert_eq!(idx.len(), 40);

        // Viewport around raw points 10..=12 only
        let (p10, p12) = (track.points()[10], track.points()[12]);
        let view = PixelBounds::new(p10.x - 1e-7, -1.0, p12.x + 1e-7, 257.0);
        let mask = track.update_seg_mask(&view, zoom).unwrap();
        assert_eq!(mask.to_vec(), vec![9, 10, 11, 12]);
    }

    #[test]
    fn test_for_each_segment_and_dot() {
        let mut track = Track::new(TrackId(0), equator_with_jump(20, usize::MAX)).unwrap();
        let zoom = 23;
        track.make_idx_set(zoom).unwrap();
        let view = PixelBounds::new(0.0, 0.0, 256.0, 256.0);
        track.update_seg_mask(&view, zoom).unwrap();

        let mut segments = Vec::new();
        let visited = track
            .for_each_segment(false, |a, b| segments.push((a, b)))
            .unwrap();
        assert_eq!(visited, 19);
        assert_eq!(segments[0].0, track.points()[0]);
        assert_eq!(segments[18].1, track.points()[19]);

        // Samples 10 s apart, one dot every 10 s of track time: one per segment
        let clock = AnimationClock {
            period: 10.0,
            time_scale: 1.0,
        };
        let mut dots = 0;
        let emitted = track.for_each_dot(5.0, &clock, false, |_, _| dots += 1).unwrap();
        assert_eq!(emitted, 19);
        assert_eq!(dots, 19);
    }

    #[test]
    fn test_iteration_before_any_mask_is_empty() {
        let track = Track::new(TrackId(0), equator_with_jump(5, usize::MAX)).unwrap();
        assert_eq!(track.for_each_segment(false, |_, _| {}).unwrap(), 0);
    }

    #[test]
    fn test_single_point_track() {
        let mut track = Track::new(TrackId(0), data(vec![(1.0, 1.0)])).unwrap();
        track.make_idx_set(5).unwrap();
        assert_eq!(track.n_segments(5), Some(0));
        let view = PixelBounds::new(0.0, 0.0, 256.0, 256.0);
        assert!(track.update_seg_mask(&view, 5).unwrap().is_empty());
    }
}
