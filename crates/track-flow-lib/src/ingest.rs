//! GPX ingestion
//!
//! Converts parsed GPX documents into [`TrackData`], one per track segment. A
//! segment where any point lacks a timestamp is timed by sample index (one second
//! apart); missing elevations become zero.

use crate::{Result, TrackData};
use std::io::BufRead;
use std::path::Path;
use time::OffsetDateTime;

/// Extract every non-empty track segment of `gpx`
pub fn track_data_from_gpx(gpx: &gpx::Gpx) -> Vec<TrackData> {
    #[cfg(feature = "profiling")]
    profiling::scope!("ingest::track_data_from_gpx");

    gpx.tracks
        .iter()
        .flat_map(|track| &track.segments)
        .filter(|segment| !segment.points.is_empty())
        .map(|segment| segment_to_track_data(&segment.points))
        .collect()
}

fn segment_to_track_data(points: &[gpx::Waypoint]) -> TrackData {
    let lat_lng = points
        .iter()
        .map(|wp| {
            let p = wp.point();
            (p.y(), p.x())
        })
        .collect();

    let stamps: Option<Vec<f64>> = points
        .iter()
        .map(|wp| {
            wp.time
                .clone()
                .map(|t| OffsetDateTime::from(t).unix_timestamp_nanos() as f64 / 1e9)
        })
        .collect();
    let time = stamps.unwrap_or_else(|| {
        tracing::debug!(points = points.len(), "Segment without timestamps, timing by index");
        (0..points.len()).map(|i| i as f64).collect()
    });

    let altitude = points
        .iter()
        .map(|wp| wp.elevation.unwrap_or(0.0))
        .collect();

    TrackData::new(lat_lng, time, altitude)
}

/// Parse a GPX document from a reader
pub fn read_gpx<R: BufRead>(reader: R) -> Result<Vec<TrackData>> {
    let gpx = gpx::read(reader)?;
    Ok(track_data_from_gpx(&gpx))
}

/// Parse a GPX file from disk
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<TrackData>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("ingest::load_file");
    let file = std::fs::File::open(path.as_ref())?;
    let tracks = read_gpx(std::io::BufReader::new(file))?;
    tracing::info!(
        path = %path.as_ref().display(),
        segments = tracks.len(),
        "Loaded GPX file"
    );
    Ok(tracks)
}
