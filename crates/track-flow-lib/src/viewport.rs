//! Viewport geometry: pixel rectangles, the zoom/pan transform and the view itself

use crate::utils;
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in absolute-pixel or screen-pixel space
///
/// `Empty` is a distinct state: an empty bounds contains nothing and is the identity of
/// [`PixelBounds::union`], whereas a zero-area rectangle still contains its corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelBounds {
    #[default]
    Empty,
    Rect {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
}

impl PixelBounds {
    /// The empty bounds
    #[inline]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// Rectangle spanning two corners in any order
    #[inline]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::Rect {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        }
    }

    /// Whether this is the empty state
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Corners as `(xmin, ymin, xmax, ymax)`
    #[inline]
    pub fn corners(&self) -> Option<(f64, f64, f64, f64)> {
        match *self {
            Self::Empty => None,
            Self::Rect {
                xmin,
                ymin,
                xmax,
                ymax,
            } => Some((xmin, ymin, xmax, ymax)),
        }
    }

    /// Grow to include a point. The first point of an empty bounds initializes it.
    #[inline]
    pub fn update(&mut self, x: f64, y: f64) {
        match self {
            Self::Empty => {
                *self = Self::Rect {
                    xmin: x,
                    ymin: y,
                    xmax: x,
                    ymax: y,
                }
            }
            Self::Rect {
                xmin,
                ymin,
                xmax,
                ymax,
            } => {
                *xmin = xmin.min(x);
                *ymin = ymin.min(y);
                *xmax = xmax.max(x);
                *ymax = ymax.max(y);
            }
        }
    }

    /// Smallest bounds containing both
    pub fn union(&self, other: &PixelBounds) -> PixelBounds {
        match (self.corners(), other.corners()) {
            (None, _) => *other,
            (_, None) => *self,
            (Some(a), Some(b)) => Self::Rect {
                xmin: a.0.min(b.0),
                ymin: a.1.min(b.1),
                xmax: a.2.max(b.2),
                ymax: a.3.max(b.3),
            },
        }
    }

    /// Overlap of both, or empty when they are disjoint
    pub fn intersection(&self, other: &PixelBounds) -> PixelBounds {
        match (self.corners(), other.corners()) {
            (Some(a), Some(b)) => {
                let (xmin, ymin) = (a.0.max(b.0), a.1.max(b.1));
                let (xmax, ymax) = (a.2.min(b.2), a.3.min(b.3));
                if xmin > xmax || ymin > ymax {
                    Self::Empty
                } else {
                    Self::Rect {
                        xmin,
                        ymin,
                        xmax,
                        ymax,
                    }
                }
            }
            _ => Self::Empty,
        }
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        match *self {
            Self::Empty => false,
            Self::Rect {
                xmin,
                ymin,
                xmax,
                ymax,
            } => x >= xmin && x <= xmax && y >= ymin && y <= ymax,
        }
    }

    /// Whether `other` lies entirely inside `self`. An empty `other` is contained in
    /// any non-empty bounds.
    pub fn contains(&self, other: &PixelBounds) -> bool {
        match (self.corners(), other.corners()) {
            (Some(_), None) => true,
            (Some(a), Some(b)) => b.0 >= a.0 && b.1 >= a.1 && b.2 <= a.2 && b.3 <= a.3,
            (None, _) => false,
        }
    }

    /// Whether both bounds share at least one point
    #[inline]
    pub fn overlaps(&self, other: &PixelBounds) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Shift by `(dx, dy)`
    pub fn translate(&self, dx: f64, dy: f64) -> PixelBounds {
        match self.corners() {
            None => Self::Empty,
            Some((xmin, ymin, xmax, ymax)) => Self::Rect {
                xmin: xmin + dx,
                ymin: ymin + dy,
                xmax: xmax + dx,
                ymax: ymax + dy,
            },
        }
    }

    /// Grow by `pad` on every side
    pub fn pad(&self, pad: f64) -> PixelBounds {
        match self.corners() {
            None => Self::Empty,
            Some((xmin, ymin, xmax, ymax)) => {
                Self::new(xmin - pad, ymin - pad, xmax + pad, ymax + pad)
            }
        }
    }

    /// Clip to the screen rectangle `[0, width] x [0, height]`
    pub fn clip_to(&self, width: f64, height: f64) -> PixelBounds {
        self.intersection(&Self::new(0.0, 0.0, width, height))
    }

    /// Horizontal extent (zero when empty)
    #[inline]
    pub fn width(&self) -> f64 {
        self.corners().map_or(0.0, |(xmin, _, xmax, _)| xmax - xmin)
    }

    /// Vertical extent (zero when empty)
    #[inline]
    pub fn height(&self) -> f64 {
        self.corners().map_or(0.0, |(_, ymin, _, ymax)| ymax - ymin)
    }

    /// Convert to a `geo::Rect`
    pub fn to_geo_rect(&self) -> Option<Rect<f64>> {
        self.corners().map(|(xmin, ymin, xmax, ymax)| {
            Rect::new(Coord { x: xmin, y: ymin }, Coord { x: xmax, y: ymax })
        })
    }

    /// Bounds of a `geo::Rect`
    pub fn from_geo_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Affine map from absolute (zoom-0) pixels to screen pixels:
/// `screen = scale * absolute + offset`, per axis
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    pub scale_x: f64,
    pub offset_x: f64,
    pub scale_y: f64,
    pub offset_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Maps every point to itself
    pub const fn identity() -> Self {
        Self {
            scale_x: 1.0,
            offset_x: 0.0,
            scale_y: 1.0,
            offset_y: 0.0,
        }
    }

    /// Transform for a view at `zoom`
    ///
    /// # Arguments
    /// * `zoom` - Current (possibly fractional) zoom level; scale is `2^zoom`
    /// * `pixel_origin` - Absolute pixel coordinate at `zoom` of the layer's top-left corner
    /// * `pane_position` - Screen displacement of the map pane (accumulated panning)
    ///
    /// The offset is accumulated in full precision and rounded once, so repeated
    /// recomputation while panning never drifts.
    pub fn from_view(zoom: f64, pixel_origin: Coord<f64>, pane_position: Coord<f64>) -> Self {
        let scale = zoom.exp2();
        Self {
            scale_x: scale,
            offset_x: (pane_position.x - pixel_origin.x).round(),
            scale_y: scale,
            offset_y: (pane_position.y - pixel_origin.y).round(),
        }
    }

    /// Absolute pixel to screen pixel
    #[inline(always)]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.scale_x * x + self.offset_x,
            self.scale_y * y + self.offset_y,
        )
    }

    /// Screen pixel to absolute pixel
    #[inline(always)]
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.offset_x) / self.scale_x,
            (y - self.offset_y) / self.scale_y,
        )
    }

    /// Map a rectangle forwards
    pub fn apply_bounds(&self, bounds: &PixelBounds) -> PixelBounds {
        match bounds.corners() {
            None => PixelBounds::Empty,
            Some((xmin, ymin, xmax, ymax)) => {
                let (x0, y0) = self.apply(xmin, ymin);
                let (x1, y1) = self.apply(xmax, ymax);
                PixelBounds::new(x0, y0, x1, y1)
            }
        }
    }

    /// Map a rectangle backwards
    pub fn invert_bounds(&self, bounds: &PixelBounds) -> PixelBounds {
        match bounds.corners() {
            None => PixelBounds::Empty,
            Some((xmin, ymin, xmax, ymax)) => {
                let (x0, y0) = self.invert(xmin, ymin);
                let (x1, y1) = self.invert(xmax, ymax);
                PixelBounds::new(x0, y0, x1, y1)
            }
        }
    }
}

/// The visible part of the map: a center, a zoom and a screen size
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Viewport {
    /// Center in absolute (zoom-0) pixels
    pub center: Coord<f64>,
    /// Zoom level; may be fractional
    pub zoom: f64,
    /// Screen width in pixels
    pub width: f64,
    /// Screen height in pixels
    pub height: f64,
}

impl Viewport {
    /// View centered on a WGS84 coordinate
    pub fn new(lat: f64, lng: f64, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center: utils::project(lat, lng),
            zoom,
            width,
            height,
        }
    }

    /// `2^zoom`
    #[inline]
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Integer zoom level used to key per-zoom caches
    #[inline]
    pub fn zoom_level(&self) -> u8 {
        self.zoom
            .round()
            .clamp(0.0, f64::from(crate::ZOOM_LEVELS - 1)) as u8
    }

    /// Visible area in absolute (zoom-0) pixels
    pub fn bounds(&self) -> PixelBounds {
        let scale = self.scale();
        let (hw, hh) = (self.width / 2.0 / scale, self.height / 2.0 / scale);
        PixelBounds::new(
            self.center.x - hw,
            self.center.y - hh,
            self.center.x + hw,
            self.center.y + hh,
        )
    }

    /// Absolute pixel coordinate at the current zoom of the screen's top-left corner
    pub fn pixel_origin(&self) -> Coord<f64> {
        let scale = self.scale();
        Coord {
            x: self.center.x * scale - self.width / 2.0,
            y: self.center.y * scale - self.height / 2.0,
        }
    }

    /// Transform from absolute pixels to this screen
    pub fn transform(&self) -> Transform {
        Transform::from_view(self.zoom, self.pixel_origin(), Coord { x: 0.0, y: 0.0 })
    }

    /// Move the view so that content shifts by `(dx, dy)` screen pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.center.x -= dx / scale;
        self.center.y -= dy / scale;
    }

    /// Center in WGS84 `(lat, lng)`
    pub fn center_lat_lng(&self) -> (f64, f64) {
        utils::unproject(self.center.x, self.center.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_distinct_from_zero_area() {
        let empty = PixelBounds::empty();
        let point = PixelBounds::new(3.0, 3.0, 3.0, 3.0);
        assert!(empty.is_empty());
        assert!(!point.is_empty());
        assert!(point.contains_point(3.0, 3.0));
        assert!(!empty.contains_point(3.0, 3.0));
        assert_eq!(point.width(), 0.0);
    }

    #[test]
    fn test_update_initializes_then_grows() {
        let mut bounds = PixelBounds::empty();
        bounds.update(5.0, 7.0);
        assert_eq!(bounds, PixelBounds::new(5.0, 7.0, 5.0, 7.0));
        bounds.update(1.0, 9.0);
        assert_eq!(bounds, PixelBounds::new(1.0, 7.0, 5.0, 9.0));
    }

    #[test]
    fn test_union_and_intersection() {
        let a = PixelBounds::new(0.0, 0.0, 10.0, 10.0);
        let b = PixelBounds::new(5.0, 5.0, 20.0, 20.0);
        let c = PixelBounds::new(30.0, 30.0, 40.0, 40.0);

        assert_eq!(a.union(&b), PixelBounds::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(a.union(&PixelBounds::Empty), a);
        assert_eq!(PixelBounds::Empty.union(&a), a);
        assert_eq!(a.intersection(&b), PixelBounds::new(5.0, 5.0, 10.0, 10.0));
        assert!(a.intersection(&c).is_empty());
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_contains() {
        let outer = PixelBounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&PixelBounds::new(1.0, 1.0, 9.0, 9.0)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&PixelBounds::new(1.0, 1.0, 11.0, 9.0)));
        assert!(!PixelBounds::Empty.contains(&outer));
    }

    #[test]
    fn test_clip_pad_translate() {
        let bounds = PixelBounds::new(-5.0, -5.0, 50.0, 50.0);
        assert_eq!(
            bounds.clip_to(20.0, 30.0),
            PixelBounds::new(0.0, 0.0, 20.0, 30.0)
        );
        assert_eq!(
            PixelBounds::new(1.0, 1.0, 2.0, 2.0).pad(1.0),
            PixelBounds::new(0.0, 0.0, 3.0, 3.0)
        );
        assert_eq!(
            PixelBounds::new(1.0, 1.0, 2.0, 2.0).translate(3.0, -1.0),
            PixelBounds::new(4.0, 0.0, 5.0, 1.0)
        );
    }

    #[test]
    fn test_geo_rect_roundtrip() {
        let bounds = PixelBounds::new(1.0, 2.0, 3.0, 4.0);
        let rect = bounds.to_geo_rect().unwrap();
        assert_eq!(PixelBounds::from_geo_rect(rect), bounds);
        assert!(PixelBounds::Empty.to_geo_rect().is_none());
    }

    #[test]
    fn test_transform_from_view() {
        let t = Transform::from_view(
            2.0,
            Coord { x: 100.4, y: 50.0 },
            Coord { x: 10.0, y: -5.0 },
        );
        assert_eq!(t.scale_x, 4.0);
        assert_eq!(t.scale_y, 4.0);
        assert_eq!(t.offset_x, -90.0);
        assert_eq!(t.offset_y, -55.0);

        let (x, y) = t.apply(30.0, 20.0);
        assert_eq!((x, y), (30.0, 25.0));
        assert_eq!(t.invert(x, y), (30.0, 20.0));
    }

    #[test]
    fn test_transform_bounds() {
        let t = Transform {
            scale_x: 2.0,
            offset_x: 1.0,
            scale_y: 2.0,
            offset_y: -1.0,
        };
        let b = PixelBounds::new(0.0, 0.0, 1.0, 1.0);
        let mapped = t.apply_bounds(&b);
        assert_eq!(mapped, PixelBounds::new(1.0, -1.0, 3.0, 1.0));
        assert_eq!(t.invert_bounds(&mapped), b);
    }

    #[test]
    fn test_viewport_bounds_map_to_screen() {
        let view = Viewport::new(51.5, -0.12, 12.0, 800.0, 600.0);
        let t = view.transform();
        let screen = t.apply_bounds(&view.bounds());
        let (xmin, ymin, xmax, ymax) = screen.corners().unwrap();
        // Offsets are rounded, so allow half a pixel of slack
        assert!(xmin.abs() <= 0.5 && ymin.abs() <= 0.5);
        assert!((xmax - 800.0).abs() <= 0.5 && (ymax - 600.0).abs() <= 0.5);
    }

    #[test]
    fn test_viewport_pan() {
        let mut view = Viewport::new(0.0, 0.0, 3.0, 100.0, 100.0);
        let before = view.transform().apply(128.0, 128.0);
        view.pan(16.0, -8.0);
        let after = view.transform().apply(128.0, 128.0);
        assert_eq!(after.0 - before.0, 16.0);
        assert_eq!(after.1 - before.1, -8.0);
    }

    #[test]
    fn test_zoom_level_rounds_and_clamps() {
        let mut view = Viewport::new(0.0, 0.0, 11.6, 10.0, 10.0);
        assert_eq!(view.zoom_level(), 12);
        view.zoom = -3.0;
        assert_eq!(view.zoom_level(), 0);
        view.zoom = 99.0;
        assert_eq!(view.zoom_level(), crate::ZOOM_LEVELS - 1);
    }
}
