//! Headless driver for the track flow pipeline
//!
//! Loads GPX files, then runs a fixed number of frames: pan, scroll the path layer by
//! copy, refresh the frame context, draw only the changed path segments and redraw the
//! dot layer from scratch. Per-frame dirty rectangles and timings are logged.

mod logging;
mod settings;

use settings::Settings;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use track_flow_lib::{
    DataError, PixelBounds, PixelCanvas, Rgba, TrackCollection, Viewport, utils,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("No drawable track found in the given files")]
    NoTracks,

    #[error("Could not write {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },
}

fn main() {
    logging::setup_logging();
    let settings = Settings::from_cli();

    if let Err(e) = run(&settings) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(settings: &Settings) -> Result<(), CliError> {
    let load_start = Instant::now();
    let mut collection = TrackCollection::new(settings.config());
    collection.load_from_files(settings.gpx_files.clone())?;
    let info = collection.get_info();
    tracing::info!(
        tracks = info.track_count,
        points = info.total_points,
        km = info.total_distance_meters / 1000.0,
        elapsed = ?load_start.elapsed(),
        "Loaded tracks"
    );

    let (center_lat, center_lng) = collection.center_wgs84().ok_or(CliError::NoTracks)?;
    let mut viewport = Viewport::new(
        settings.lat.unwrap_or(center_lat),
        settings.lng.unwrap_or(center_lng),
        settings.zoom,
        settings.width as f64,
        settings.height as f64,
    );
    let (lat, lng) = viewport.center_lat_lng();
    tracing::info!(
        lat,
        lng,
        zoom = viewport.zoom,
        meters_per_pixel = utils::meters_per_pixel(lat, viewport.zoom),
        "Initial view"
    );

    let mut paths = PixelCanvas::new(settings.width, settings.height);
    let mut dots = PixelCanvas::new(settings.width, settings.height);
    let clock = collection.config().clock;
    let frame_time = 1.0 / settings.fps.max(1e-3);

    let mut total = Duration::ZERO;
    for frame in 0..settings.frames {
        let start = Instant::now();
        let first = frame == 0;

        if !first && (settings.pan_x != 0 || settings.pan_y != 0) {
            viewport.pan(settings.pan_x as f64, settings.pan_y as f64);
            paths.translate(settings.pan_x, settings.pan_y);
        }

        let context = collection.update_context(&viewport)?;
        let transform = viewport.transform();
        let path_bounds = collection.draw_paths(&mut paths, &transform, first)?;

        dots.clear(None);
        let now = frame as f64 * frame_time;
        let dot_bounds = collection.draw_dots(&mut dots, &transform, now, &clock, true)?;

        let elapsed = start.elapsed();
        total += elapsed;
        tracing::info!(
            frame,
            in_view = context.in_view,
            simplified = context.simplified,
            paths = %describe(&path_bounds),
            dots = %describe(&dot_bounds),
            ?elapsed,
            "Frame"
        );
        profiling::finish_frame!();
    }

    if settings.frames > 0 {
        tracing::info!(
            frames = settings.frames,
            average = ?(total / settings.frames as u32),
            "Finished"
        );
    }

    if let Some(path) = &settings.output {
        write_ppm(path, &paths, &dots).map_err(|source| CliError::Output {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Wrote last frame");
    }
    Ok(())
}

fn describe(bounds: &PixelBounds) -> String {
    match bounds.corners() {
        Some((x0, y0, x1, y1)) => format!("[{:.0},{:.0} .. {:.0},{:.0}]", x0, y0, x1, y1),
        None => "empty".to_string(),
    }
}

/// Composite `dots` over `paths` over black and write a binary PPM
fn write_ppm(path: &Path, paths: &PixelCanvas, dots: &PixelCanvas) -> std::io::Result<()> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", paths.width(), paths.height())?;

    let over = |dst: [u8; 3], src: Rgba| {
        let a = u16::from(src.a);
        let mix = |s: u8, d: u8| ((u16::from(s) * a + u16::from(d) * (255 - a)) / 255) as u8;
        [mix(src.r, dst[0]), mix(src.g, dst[1]), mix(src.b, dst[2])]
    };

    let mut row = Vec::with_capacity(paths.width() * 3);
    for (path_row, dot_row) in paths
        .pixels()
        .chunks(paths.width().max(1))
        .zip(dots.pixels().chunks(dots.width().max(1)))
    {
        row.clear();
        for (&p, &d) in path_row.iter().zip(dot_row) {
            let rgb = over(over([0, 0, 0], Rgba::unpack(p)), Rgba::unpack(d));
            row.extend_from_slice(&rgb);
        }
        out.write_all(&row)?;
    }
    out.flush()
}
