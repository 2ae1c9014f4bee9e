use clap::Parser;
use std::path::PathBuf;
use track_flow_lib::{AnimationClock, Config, DotShape};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Flow - Render animated dots flowing along large GPS track collections
pub struct Settings {
    /// GPX files to load
    #[clap(value_name = "FILE", required = true)]
    pub gpx_files: Vec<PathBuf>,

    /// Latitude of the initial view center (defaults to the center of all tracks)
    #[clap(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the initial view center (defaults to the center of all tracks)
    #[clap(long, allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Map zoom level (0 = whole world in 256 pixels)
    #[clap(short, long, default_value = "12.0")]
    pub zoom: f64,

    /// Viewport width in pixels
    #[clap(long, default_value = "1280")]
    pub width: usize,

    /// Viewport height in pixels
    #[clap(long, default_value = "720")]
    pub height: usize,

    /// Number of frames to render
    #[clap(short, long, default_value = "120")]
    pub frames: usize,

    /// Simulated frames per second
    #[clap(long, default_value = "60.0")]
    pub fps: f64,

    /// Horizontal pan applied every frame, in screen pixels
    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    pub pan_x: i64,

    /// Vertical pan applied every frame, in screen pixels
    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    pub pan_y: i64,

    /// Seconds of track time between two consecutive dots
    #[clap(long, default_value = "60.0")]
    pub period: f64,

    /// Track seconds elapsed per wall-clock second
    #[clap(long, default_value = "60.0")]
    pub time_scale: f64,

    /// Track line width in pixels
    #[clap(long, default_value = "2.0")]
    pub line_width: f64,

    /// Dot diameter in pixels
    #[clap(long, default_value = "4.0")]
    pub dot_size: f64,

    /// Draw square dots instead of circles
    #[clap(long, default_value = "false")]
    pub square_dots: bool,

    /// Z-score above which a segment's length marks a recording gap
    #[clap(long, default_value = "5.0")]
    pub zscore_cutoff: f64,

    /// Write the last composited frame to this file as a binary PPM image
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Settings {
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Pipeline configuration derived from these settings
    pub fn config(&self) -> Config {
        Config {
            zscore_cutoff: self.zscore_cutoff,
            path_width: self.line_width,
            dot_size: self.dot_size,
            dot_shape: if self.square_dots {
                DotShape::Square
            } else {
                DotShape::Circle
            },
            clock: AnimationClock {
                period: self.period,
                time_scale: self.time_scale,
            },
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["track-flow", "ride.gpx"]);
        assert_eq!(settings.gpx_files, vec![PathBuf::from("ride.gpx")]);
        assert_eq!(settings.zoom, 12.0);
        assert_eq!((settings.width, settings.height), (1280, 720));
        assert!(settings.lat.is_none());

        let config = settings.config();
        assert_eq!(config.dot_shape, DotShape::Circle);
        assert_eq!(config.clock.period, 60.0);
        assert_eq!(config.max_zoom, Config::default().max_zoom);
    }

    #[test]
    fn test_negative_values() {
        let settings = Settings::parse_from([
            "track-flow",
            "--lat",
            "-33.86",
            "--lng",
            "151.2",
            "--pan-x",
            "-3",
            "--square-dots",
            "a.gpx",
            "b.gpx",
        ]);
        assert_eq!(settings.lat, Some(-33.86));
        assert_eq!(settings.pan_x, -3);
        assert_eq!(settings.gpx_files.len(), 2);
        assert_eq!(settings.config().dot_shape, DotShape::Square);
    }

    #[test]
    fn test_files_required() {
        assert!(Settings::try_parse_from(["track-flow"]).is_err());
    }
}
