//! Utility functions for coordinate projection and distances
//!
//! All geometry in the pipeline lives in *absolute pixel* space: spherical Mercator
//! scaled so that the whole world is [`WORLD_SIZE`] pixels wide at zoom 0. A zoom level
//! `z` view multiplies these coordinates by `2^z` (see [`crate::Transform`]).

use geo::Coord;

/// Width and height of the world in pixels at zoom 0
pub const WORLD_SIZE: f64 = 256.0;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Earth radius in meters (spherical model)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Mean Earth radius in meters used for great-circle distances
const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Precomputed constant: WORLD_SIZE / 360.0
const LNG_TO_X_FACTOR: f64 = WORLD_SIZE / 360.0;

/// Precomputed constant: WORLD_SIZE / (2 * PI)
const Y_FACTOR: f64 = WORLD_SIZE / (2.0 * std::f64::consts::PI);

/// Project WGS84 (lat, lng) to absolute pixel coordinates at zoom 0
///
/// # Arguments
/// * `lat` - Latitude in degrees, clamped to ±[`MAX_LATITUDE`]
/// * `lng` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Coord<f64>` with `x` growing east and `y` growing south, both in `[0, WORLD_SIZE]`
#[inline(always)]
pub fn project(lat: f64, lng: f64) -> Coord<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (lng + 180.0) * LNG_TO_X_FACTOR;

    let lat_rad = lat.to_radians();
    let merc = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln();
    let y = WORLD_SIZE / 2.0 - merc * Y_FACTOR;

    Coord { x, y }
}

/// Inverse of [`project`]: absolute pixel coordinates at zoom 0 to (lat, lng) in degrees
#[inline(always)]
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lng = x / LNG_TO_X_FACTOR - 180.0;
    let merc = (WORLD_SIZE / 2.0 - y) / Y_FACTOR;
    let lat = (2.0 * merc.exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lat, lng)
}

/// Simplification tolerance in absolute pixels for a zoom level
///
/// One unit of simplification error maps to roughly one device pixel at `zoom`.
#[inline(always)]
pub fn tol(zoom: f64) -> f64 {
    1.0 / zoom.exp2()
}

/// Great-circle distance between two (lat, lng) pairs in meters
#[inline]
pub fn haversine_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let lat1 = a.0.to_radians();
    let lat2 = b.0.to_radians();
    let delta_lat = (b.0 - a.0).to_radians();
    let delta_lng = (b.1 - a.1).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    MEAN_EARTH_RADIUS_M * c
}

/// Ground resolution in meters per pixel at a latitude and zoom level
#[inline]
pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    let circumference = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;
    circumference * lat.to_radians().cos() / (WORLD_SIZE * zoom.exp2())
}
