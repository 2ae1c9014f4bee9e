//! Track Flow Library - Geometry and Pixel Pipeline for Animated GPS Tracks
//!
//! This library decides, once per frame, which segments of a large collection of GPS
//! tracks are visible, simplifies every track to match the current zoom, samples the
//! animated dots flowing along each visible segment and rasterizes the result into an
//! RGBA buffer while tracking the smallest dirty rectangle.
//!
//! # Architecture
//!
//! - **[`BitVector`]**: Word-packed integer set with set algebra and order statistics
//! - **[`Transform`]** / **[`PixelBounds`]**: Zoom-0 pixel projection and screen mapping
//! - **[`simplify`]**: Radial-distance + Douglas-Peucker index simplification
//! - **[`Track`]**: One activity with per-zoom caches, gap markers and segment masks
//! - **[`PixelCanvas`]**: Anti-aliased drawing with dirty-rectangle tracking and scroll-by-copy
//! - **[`TrackCollection`]**: Per-frame orchestration of all of the above
//!
//! # Frame Lifecycle
//!
//! 1. [`TrackCollection::update_context`] tests bounding boxes, drains queued
//!    simplification jobs and refreshes each visible track's segment mask.
//! 2. [`TrackCollection::draw_paths`] / [`TrackCollection::draw_dots`] rasterize either
//!    the full masks or only the per-frame differences.
//! 3. The caller blits [`PixelCanvas::draw_bounds`] to the screen.

mod bitvec;
mod canvas;
mod collection;
mod dots;
pub mod ingest;
mod queue;
mod segment;
pub mod simplify;
mod stats;
mod track;
pub mod utils;
mod viewport;

// Public API exports
pub use bitvec::{BitVector, Iter as BitIter, NthCursor};
pub use canvas::{DotShape, PixelCanvas, Rgba};
pub use collection::{
    CollectionInfo, Config, DrawStyle, FrameContext, TrackCollection, TrackId,
};
pub use dots::{AnimationClock, DotSampler};
pub use queue::SimplifyQueue;
pub use segment::SegmentMask;
pub use stats::Welford;
pub use track::{Track, TrackData, ZOOM_LEVELS, ZSCORE_CUTOFF, ZoomLevel};
pub use viewport::{PixelBounds, Transform, Viewport};

/// Error types for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Index {index} out of range for bit vector of capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("No simplified index set for zoom level {zoom}")]
    MissingZoomCache { zoom: u8 },

    #[error("Simplification for zoom level {zoom} is still queued")]
    ZoomInFlight { zoom: u8 },

    #[error("Length mismatch: {lat_lng} coordinates, {time} timestamps, {altitude} altitudes")]
    LengthMismatch {
        lat_lng: usize,
        time: usize,
        altitude: usize,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown track id {0}")]
    UnknownTrack(TrackId),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty track")]
    EmptyTrack,
}

pub type Result<T> = std::result::Result<T, DataError>;
