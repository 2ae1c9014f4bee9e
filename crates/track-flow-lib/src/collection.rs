//! TrackCollection - Top-level manager for tracks, visibility and drawing
//!
//! This module owns every [`Track`], decides once per frame which of them are in
//! view, schedules the simplifications they need and drives the [`PixelCanvas`]
//! for paths and animated dots.

use crate::{
    AnimationClock, BitVector, DataError, DotShape, PixelBounds, PixelCanvas, Result, Rgba,
    SimplifyQueue, Track, TrackData, Transform, Viewport, ZOOM_LEVELS, ZSCORE_CUTOFF, ingest,
    utils,
};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Stable handle for a track in a [`TrackCollection`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for the track collection
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Gap outlier threshold in standard deviations of `ln(d²)` (default 5)
    pub zscore_cutoff: f64,
    /// Highest zoom level simplified; deeper views reuse it
    pub max_zoom: u8,
    /// Default stroke width for paths, in pixels
    pub path_width: f64,
    /// Default dot diameter or side, in pixels
    pub dot_size: f64,
    pub dot_shape: DotShape,
    /// Default animation parameters
    pub clock: AnimationClock,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zscore_cutoff: ZSCORE_CUTOFF,
            max_zoom: ZOOM_LEVELS - 1,
            path_width: 2.0,
            dot_size: 4.0,
            dot_shape: DotShape::Circle,
            clock: AnimationClock::default(),
        }
    }
}

/// How one track is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawStyle {
    pub path_color: Rgba,
    pub dot_color: Rgba,
    pub path_width: f64,
    pub dot_size: f64,
    pub dot_shape: DotShape,
}

impl DrawStyle {
    /// Style for the `index`-th track: a golden-angle palette color and the
    /// configured sizes
    pub fn from_palette(index: usize, config: &Config) -> Self {
        let color = Rgba::palette(index);
        Self {
            path_color: color,
            dot_color: color,
            path_width: config.path_width,
            dot_size: config.dot_size,
            dot_shape: config.dot_shape,
        }
    }
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self::from_palette(0, &Config::default())
    }
}

/// Summary of one [`TrackCollection::update_context`] call
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameContext {
    /// Zoom level the masks were computed for
    pub zoom: u8,
    /// Visible area in absolute (zoom-0) pixels
    pub viewport: PixelBounds,
    /// Tracks with a non-empty mask
    pub in_view: usize,
    /// Simplification jobs drained this frame
    pub simplified: usize,
}

/// Information about the track collection
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of tracks loaded
    pub track_count: usize,
    /// Total number of points
    pub total_points: usize,
    /// Total distance in meters
    pub total_distance_meters: f64,
    /// Tracks visible as of the last context update
    pub in_view_count: usize,
}

/// Cached statistics for the collection
///
/// These are updated incrementally when tracks are added and rebuilt on removal.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    total_points: usize,
    total_distance: f64,
    /// Union of track bounds in absolute pixels
    bounds: PixelBounds,
}

/// Top-level manager for all tracks
pub struct TrackCollection {
    tracks: Vec<Track>,
    /// Parallel to `tracks`
    styles: Vec<DrawStyle>,
    /// Slots of tracks visible in the current frame
    in_view: BitVector,
    queue: SimplifyQueue,
    config: Config,
    next_id: u64,
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackCollection {
    /// Create a new track collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            tracks: Vec::new(),
            styles: Vec::new(),
            in_view: BitVector::default(),
            queue: SimplifyQueue::new(),
            config,
            next_id: 0,
            cached_stats: CachedStats::default(),
        }
    }

    /// Style the next added track would get by default
    pub fn default_style(&self) -> DrawStyle {
        DrawStyle::from_palette(self.next_id as usize, &self.config)
    }

    /// Add a track to the collection
    pub fn add_track(&mut self, data: TrackData, style: DrawStyle) -> Result<TrackId> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_track");

        let id = TrackId(self.next_id);
        let track = Track::with_cutoff(id, data, self.config.zscore_cutoff)?;
        self.next_id += 1;
        self.push(track, style);
        Ok(id)
    }

    /// Add multiple tracks in parallel with palette styles
    ///
    /// Either every track is added or, on the first invalid one, none is.
    pub fn add_tracks_parallel(&mut self, data: Vec<TrackData>) -> Result<Vec<TrackId>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_tracks_parallel");

        let start = self.next_id;
        let cutoff = self.config.zscore_cutoff;
        let tracks: Result<Vec<Track>> = data
            .into_par_iter()
            .enumerate()
            .map(|(i, data)| Track::with_cutoff(TrackId(start + i as u64), data, cutoff))
            .collect();
        let tracks = tracks?;

        let mut ids = Vec::with_capacity(tracks.len());
        for track in tracks {
            let style = self.default_style();
            self.next_id += 1;
            ids.push(track.id());
            self.push(track, style);
        }
        Ok(ids)
    }

    /// Load every segment of the given GPX files as tracks
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(
        &mut self,
        paths: Vec<P>,
    ) -> Result<Vec<TrackId>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let data: Result<Vec<Vec<TrackData>>> = paths.into_par_iter().map(ingest::load_file).collect();
        self.add_tracks_parallel(data?.into_iter().flatten().collect())
    }

    fn push(&mut self, track: Track, style: DrawStyle) {
        self.update_stats_for_added_track(&track);
        tracing::debug!(track = %track.id(), points = track.len(), "Added track");
        self.tracks.push(track);
        self.styles.push(style);
    }

    /// Remove a track
    pub fn remove_track(&mut self, id: TrackId) -> Result<()> {
        let slot = self.slot(id).ok_or(DataError::UnknownTrack(id))?;
        self.tracks.remove(slot);
        self.styles.remove(slot);
        // Slots shifted; visibility is recomputed by the next context update
        self.in_view.clear();
        self.rebuild_cached_stats();
        Ok(())
    }

    /// Clear all tracks from the collection
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.styles.clear();
        self.in_view = BitVector::default();
        self.cached_stats = CachedStats::default();
    }

    fn slot(&self, id: TrackId) -> Option<usize> {
        // Ids are allocated in increasing order and slots keep insertion order
        self.tracks.binary_search_by_key(&id, Track::id).ok()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Get total number of tracks
    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn get_track(&self, id: TrackId) -> Option<&Track> {
        self.slot(id).map(|slot| &self.tracks[slot])
    }

    /// Get all tracks
    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Tracks visible as of the last context update
    pub fn in_view(&self) -> impl Iterator<Item = &Track> {
        self.in_view.iter().map(|slot| &self.tracks[slot])
    }

    #[inline]
    pub fn style(&self, id: TrackId) -> Option<&DrawStyle> {
        self.slot(id).map(|slot| &self.styles[slot])
    }

    pub fn set_style(&mut self, id: TrackId, style: DrawStyle) -> Result<()> {
        let slot = self.slot(id).ok_or(DataError::UnknownTrack(id))?;
        self.styles[slot] = style;
        Ok(())
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get collection information
    ///
    /// This is O(1) as all values are cached.
    #[inline]
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            track_count: self.tracks.len(),
            total_points: self.cached_stats.total_points,
            total_distance_meters: self.cached_stats.total_distance,
            in_view_count: self.in_view.size(),
        }
    }

    /// Union of all track bounds in absolute (zoom-0) pixels
    #[inline]
    pub fn bounds(&self) -> PixelBounds {
        self.cached_stats.bounds
    }

    /// Get the combined bounding box of all tracks in WGS84 coordinates
    ///
    /// Returns `Some((min_lat, min_lng, max_lat, max_lng))`, or `None` when empty.
    pub fn bounding_box_wgs84(&self) -> Option<(f64, f64, f64, f64)> {
        let (xmin, ymin, xmax, ymax) = self.cached_stats.bounds.corners()?;
        // Pixel y grows southwards
        let (min_lat, min_lng) = utils::unproject(xmin, ymax);
        let (max_lat, max_lng) = utils::unproject(xmax, ymin);
        Some((min_lat, min_lng, max_lat, max_lng))
    }

    /// Get the center point of all tracks in WGS84 coordinates
    #[inline]
    pub fn center_wgs84(&self) -> Option<(f64, f64)> {
        self.bounding_box_wgs84()
            .map(|(min_lat, min_lng, max_lat, max_lng)| {
                ((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0)
            })
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Bring visibility up to date for `viewport`
    ///
    /// Tracks whose bounds overlap the view are queued for simplification at the
    /// view's zoom when needed, the queue is drained, and every candidate's segment
    /// mask is refreshed. Candidates with an empty mask are dropped from the view.
    pub fn update_context(&mut self, viewport: &Viewport) -> Result<FrameContext> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::update_context");

        let bounds = viewport.bounds();
        let zoom = viewport.zoom_level().min(self.config.max_zoom);

        self.in_view.clear();
        self.in_view.resize(self.tracks.len());
        for (slot, track) in self.tracks.iter_mut().enumerate() {
            if track.bounds().overlaps(&bounds) {
                self.in_view.add(slot);
                if !track.has_zoom(zoom) {
                    self.queue.schedule(track, slot, zoom);
                }
            } else if track.mask().zoom().is_some() {
                // Pixels drawn for it are gone by the time it returns
                track.reset_seg_mask();
            }
        }

        let simplified = self.queue.drain(&mut self.tracks);

        let mut empty: SmallVec<[usize; 16]> = SmallVec::new();
        for slot in &self.in_view {
            if self.tracks[slot].update_seg_mask(&bounds, zoom)?.is_empty() {
                empty.push(slot);
            }
        }
        for slot in empty {
            self.in_view.remove(slot)?;
        }

        let context = FrameContext {
            zoom,
            viewport: bounds,
            in_view: self.in_view.size(),
            simplified,
        };
        tracing::trace!(?context, "Updated frame context");
        Ok(context)
    }

    /// In-view slots grouped by color, in a stable color order
    fn batches(&self, color: impl Fn(&DrawStyle) -> Rgba) -> BTreeMap<Rgba, SmallVec<[usize; 8]>> {
        let mut batches: BTreeMap<Rgba, SmallVec<[usize; 8]>> = BTreeMap::new();
        for slot in &self.in_view {
            batches.entry(color(&self.styles[slot])).or_default().push(slot);
        }
        batches
    }

    /// Draw the paths of every in-view track
    ///
    /// `full` draws each whole mask; otherwise only the segments that changed since
    /// the previous frame.
    ///
    /// # Returns
    /// The union of the bounds touched by this call
    pub fn draw_paths(
        &self,
        canvas: &mut PixelCanvas,
        transform: &Transform,
        full: bool,
    ) -> Result<PixelBounds> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::draw_paths");

        let mut bounds = PixelBounds::Empty;
        let mut segments = 0;
        for (color, slots) in self.batches(|style| style.path_color) {
            canvas.set_color(color);
            for slot in slots {
                canvas.set_line_width(self.styles[slot].path_width);
                segments += self.tracks[slot].for_each_segment(!full, |a, b| {
                    let (x0, y0) = transform.apply(a.x, a.y);
                    let (x1, y1) = transform.apply(b.x, b.y);
                    bounds = bounds.union(&canvas.stroke_segment(x0, y0, x1, y1));
                })?;
            }
        }
        tracing::trace!(segments, full, "Drew paths");
        Ok(bounds)
    }

    /// Draw the animated dots of every in-view track at wall-clock time `now`
    ///
    /// # Returns
    /// The union of the bounds touched by this call
    pub fn draw_dots(
        &self,
        canvas: &mut PixelCanvas,
        transform: &Transform,
        now: f64,
        clock: &AnimationClock,
        full: bool,
    ) -> Result<PixelBounds> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::draw_dots");

        let mut bounds = PixelBounds::Empty;
        let mut dots = 0;
        for (color, slots) in self.batches(|style| style.dot_color) {
            canvas.set_color(color);
            for slot in slots {
                let style = self.styles[slot];
                dots += self.tracks[slot].for_each_dot(now, clock, !full, |x, y| {
                    let (sx, sy) = transform.apply(x, y);
                    bounds = bounds.union(&canvas.draw_dot(style.dot_shape, sx, sy, style.dot_size));
                })?;
            }
        }
        tracing::trace!(dots, full, "Drew dots");
        Ok(bounds)
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Update cached statistics when a track is added
    #[inline]
    fn update_stats_for_added_track(&mut self, track: &Track) {
        self.cached_stats.total_points += track.len();
        self.cached_stats.total_distance += track.total_distance();
        self.cached_stats.bounds = self.cached_stats.bounds.union(&track.bounds());
    }

    /// Rebuild cached statistics from scratch
    fn rebuild_cached_stats(&mut self) {
        let mut stats = CachedStats::default();
        for track in &self.tracks {
            stats.total_points += track.len();
            stats.total_distance += track.total_distance();
            stats.bounds = stats.bounds.union(&track.bounds());
        }
        self.cached_stats = stats;
    }
}
