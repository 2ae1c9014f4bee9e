//! Raw RGBA drawing engine with dirty-rectangle tracking
//!
//! [`PixelCanvas`] owns a `width * height` buffer of packed RGBA pixels and a
//! *draw bounds* rectangle: the union of every pixel touched since the last full
//! [`PixelCanvas::clear`]. Every pixel outside the draw bounds is guaranteed to be
//! zero, so callers only ever need to clear or blit that rectangle.
//!
//! Draw bounds are half-open in pixel units: a touched pixel `(x, y)` grows them to
//! cover `[x, x + 1) x [y, y + 1)`.

use crate::PixelBounds;
use crate::simplify::segment_distance_sq;
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Pack into a `u32` whose little-endian bytes are `[r, g, b, a]`
    #[inline(always)]
    pub fn pack(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    #[inline(always)]
    pub fn unpack(value: u32) -> Self {
        let [r, g, b, a] = value.to_le_bytes();
        Self { r, g, b, a }
    }

    /// Composite `src` over `self` with opacity `alpha` in `[0, 1]`
    #[inline]
    fn blend_over(self, src: Rgba, alpha: f64) -> Rgba {
        let mix = |s: u8, d: u8| (f64::from(s) * alpha + f64::from(d) * (1.0 - alpha)).round() as u8;
        Rgba {
            r: mix(src.r, self.r),
            g: mix(src.g, self.g),
            b: mix(src.b, self.b),
            a: (255.0 * alpha + f64::from(self.a) * (1.0 - alpha)).round() as u8,
        }
    }

    /// Distinct color for the `index`-th item, spaced by the golden angle in hue
    pub fn palette(index: usize) -> Rgba {
        let hue = (index as f64 * 137.508) % 360.0;
        let saturation = 0.7;
        let value = 0.9;

        let c = value * saturation;
        let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - c;

        let (r, g, b) = if hue < 60.0 {
            (c, x, 0.0)
        } else if hue < 120.0 {
            (x, c, 0.0)
        } else if hue < 180.0 {
            (0.0, c, x)
        } else if hue < 240.0 {
            (0.0, x, c)
        } else if hue < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Rgba::from_rgb(
            ((r + m) * 255.0) as u8,
            ((g + m) * 255.0) as u8,
            ((b + m) * 255.0) as u8,
        )
    }
}

/// Marker drawn for each animated dot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DotShape {
    #[default]
    Circle,
    Square,
}

/// RGBA pixel buffer with anti-aliased primitives and dirty-rectangle tracking
#[derive(Clone)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    color: Rgba,
    alpha: f64,
    line_width: f64,
    /// Union of all pixels touched since the last full clear
    bounds: PixelBounds,
    /// Pixels touched by the draw call in progress
    stroke: PixelBounds,
}

impl std::fmt::Debug for PixelCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color", &self.color)
            .field("alpha", &self.alpha)
            .field("line_width", &self.line_width)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PixelCanvas {
    /// Create a cleared canvas
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            color: Rgba::BLACK,
            alpha: 1.0,
            line_width: 1.0,
            bounds: PixelBounds::Empty,
            stroke: PixelBounds::Empty,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate for a new size. The canvas comes back cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
        self.bounds = PixelBounds::Empty;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Global opacity multiplier in `[0, 1]`
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// The rectangle known to contain every non-zero pixel
    #[inline]
    pub fn draw_bounds(&self) -> PixelBounds {
        self.bounds
    }

    /// Packed pixels, row-major
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, if inside the canvas
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgba::unpack(self.pixels[y * self.width + x]))
    }

    /// Copy a rectangle out as tightly packed RGBA bytes, returning the clipped
    /// integer rectangle `(x, y, width, height)` alongside the bytes
    pub fn copy_rgba(&self, rect: &PixelBounds) -> Option<((usize, usize, usize, usize), Vec<u8>)> {
        let (x0, y0, x1, y1) = self.pixel_rect(rect)?;
        let mut bytes = Vec::with_capacity((x1 - x0) * (y1 - y0) * 4);
        for y in y0..y1 {
            let row = &self.pixels[y * self.width + x0..y * self.width + x1];
            for &p in row {
                bytes.extend_from_slice(&p.to_le_bytes());
            }
        }
        Some(((x0, y0, x1 - x0, y1 - y0), bytes))
    }

    /// Clip a bounds to the canvas as integer half-open ranges
    fn pixel_rect(&self, rect: &PixelBounds) -> Option<(usize, usize, usize, usize)> {
        let (xmin, ymin, xmax, ymax) = rect.corners()?;
        if ![xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite()) {
            return None;
        }
        let x0 = xmin.floor().max(0.0) as usize;
        let y0 = ymin.floor().max(0.0) as usize;
        let x1 = (xmax.ceil().max(0.0) as usize).min(self.width);
        let y1 = (ymax.ceil().max(0.0) as usize).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    // ------------------------------------------------------------------
    // Pixel writes
    // ------------------------------------------------------------------

    #[inline(always)]
    fn mark(&mut self, x: i64, y: i64) {
        let (x, y) = (x as f64, y as f64);
        for b in [&mut self.bounds, &mut self.stroke] {
            b.update(x, y);
            b.update(x + 1.0, y + 1.0);
        }
    }

    /// Blend the current color into `(x, y)` at `coverage`
    #[inline]
    fn blend(&mut self, x: i64, y: i64, coverage: f64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let a = coverage.min(1.0) * self.alpha * f64::from(self.color.a) / 255.0;
        if !(a > 0.0) {
            return;
        }
        let i = y as usize * self.width + x as usize;
        self.pixels[i] = if a >= 1.0 {
            self.color.pack()
        } else {
            Rgba::unpack(self.pixels[i]).blend_over(self.color, a).pack()
        };
        self.mark(x, y);
    }

    /// Solid fill of `[x0, x1)` on row `y`
    fn fill_span(&mut self, y: i64, x0: i64, x1: i64) {
        if y < 0 || y >= self.height as i64 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width as i64);
        if x0 >= x1 {
            return;
        }
        let a = self.alpha * f64::from(self.color.a) / 255.0;
        if !(a > 0.0) {
            return;
        }
        let row = y as usize * self.width;
        let span = &mut self.pixels[row + x0 as usize..row + x1 as usize];
        if a >= 1.0 {
            span.fill(self.color.pack());
        } else {
            for p in span {
                *p = Rgba::unpack(*p).blend_over(self.color, a).pack();
            }
        }
        self.mark(x0, y);
        self.mark(x1 - 1, y);
    }

    fn begin_stroke(&mut self) {
        self.stroke = PixelBounds::Empty;
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Draw a segment with the current color
    ///
    /// `width <= 1` draws a one-pixel anti-aliased line; wider strokes walk the major
    /// axis filling a perpendicular run with anti-aliased edges and round caps.
    ///
    /// # Returns
    /// The bounds of the pixels touched by this call
    pub fn draw_segment(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64) -> PixelBounds {
        self.begin_stroke();
        if ![x0, y0, x1, y1, width].iter().all(|v| v.is_finite()) {
            return PixelBounds::Empty;
        }

        let pad = width.max(1.0) / 2.0 + 2.0;
        let Some((x0, y0, x1, y1)) = clip_segment(
            (x0, y0, x1, y1),
            (-pad, -pad, self.width as f64 + pad, self.height as f64 + pad),
        ) else {
            return PixelBounds::Empty;
        };

        if width <= 1.0 {
            self.line_aa(
                x0.floor() as i64,
                y0.floor() as i64,
                x1.floor() as i64,
                y1.floor() as i64,
            );
        } else {
            self.line_wide(x0, y0, x1, y1, width);
        }
        self.stroke
    }

    /// Draw a segment with the current line width
    pub fn stroke_segment(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> PixelBounds {
        self.draw_segment(x0, y0, x1, y1, self.line_width)
    }

    /// One-pixel anti-aliased line
    ///
    /// Bresenham walk where each pixel's coverage is `1 - |error| / length`, the
    /// error term being proportional to the pixel's distance from the ideal line.
    fn line_aa(&mut self, mut x0: i64, mut y0: i64, x1: i64, y1: i64) {
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = (y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        let ed = if dx + dy == 0 {
            1.0
        } else {
            ((dx * dx + dy * dy) as f64).sqrt()
        };

        loop {
            self.blend(x0, y0, 1.0 - (err - dx + dy).abs() as f64 / ed);
            let e2 = err;
            let x2 = x0;
            if 2 * e2 >= -dx {
                if x0 == x1 {
                    break;
                }
                if ((e2 + dy) as f64) < ed {
                    self.blend(x0, y0 + sy, 1.0 - (e2 + dy) as f64 / ed);
                }
                err -= dy;
                x0 += sx;
            }
            if 2 * e2 <= dy {
                if y0 == y1 {
                    break;
                }
                if ((dx - e2) as f64) < ed {
                    self.blend(x2 + sx, y0, 1.0 - (dx - e2) as f64 / ed);
                }
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Thick anti-aliased line
    fn line_wide(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64) {
        let half = width / 2.0;
        let a = Coord { x: x0, y: y0 };
        let b = Coord { x: x1, y: y1 };
        let dx = x1 - x0;
        let dy = y1 - y0;
        let length = dx.hypot(dy);

        // Walk the major axis; `u` is the major coordinate, `v` the minor one
        let x_major = dx.abs() >= dy.abs();
        let (u0, v0, du, dv) = if x_major {
            (x0, y0, dx, dy)
        } else {
            (y0, x0, dy, dx)
        };
        // Half extent of the stroke along the minor axis
        let extent = if du == 0.0 { half } else { half * length / du.abs() };

        let (umin, umax) = (u0.min(u0 + du), u0.max(u0 + du));
        let mut u = (umin - half).floor() as i64;
        let u_end = (umax + half).floor() as i64;

        while u <= u_end {
            let center = u as f64 + 0.5;
            let t = if du == 0.0 {
                0.0
            } else {
                ((center - u0) / du).clamp(0.0, 1.0)
            };
            let vc = v0 + t * dv;
            let v_start = (vc - extent - 1.0).floor() as i64;
            let v_end = (vc + extent + 1.0).floor() as i64;

            for v in v_start..=v_end {
                let (x, y) = if x_major { (u, v) } else { (v, u) };
                let p = Coord {
                    x: x as f64 + 0.5,
                    y: y as f64 + 0.5,
                };
                let d = segment_distance_sq(p, a, b).sqrt();
                let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, coverage);
                }
            }
            u += 1;
        }
    }

    /// Solid disc of diameter `size` centered on `(x, y)`
    pub fn draw_circle(&mut self, x: f64, y: f64, size: f64) -> PixelBounds {
        self.begin_stroke();
        if !(x.is_finite() && y.is_finite() && size.is_finite()) || size <= 0.0 {
            return PixelBounds::Empty;
        }
        if size <= 1.0 {
            self.fill_span(y.floor() as i64, x.floor() as i64, x.floor() as i64 + 1);
            return self.stroke;
        }

        let r = size / 2.0;
        let r_sq = r * r;
        let row_start = (y - r).floor() as i64;
        let row_end = (y + r).floor() as i64;
        for row in row_start..=row_end {
            let dy = row as f64 + 0.5 - y;
            let rem = r_sq - dy * dy;
            if rem < 0.0 {
                continue;
            }
            let half = rem.sqrt();
            let x0 = (x - half).round() as i64;
            let x1 = (x + half).round() as i64;
            self.fill_span(row, x0, x1);
        }
        self.stroke
    }

    /// Solid axis-aligned square of side `size` centered on `(x, y)`
    pub fn draw_square(&mut self, x: f64, y: f64, size: f64) -> PixelBounds {
        self.begin_stroke();
        if !(x.is_finite() && y.is_finite() && size.is_finite()) || size <= 0.0 {
            return PixelBounds::Empty;
        }
        let r = size / 2.0;
        let side = size.round().max(1.0) as i64;
        let x0 = (x - r).round() as i64;
        let y0 = (y - r).round() as i64;
        for row in y0..y0 + side {
            self.fill_span(row, x0, x0 + side);
        }
        self.stroke
    }

    /// Draw a dot of the given shape
    pub fn draw_dot(&mut self, shape: DotShape, x: f64, y: f64, size: f64) -> PixelBounds {
        match shape {
            DotShape::Circle => self.draw_circle(x, y, size),
            DotShape::Square => self.draw_square(x, y, size),
        }
    }

    // ------------------------------------------------------------------
    // Clearing and scrolling
    // ------------------------------------------------------------------

    /// Zero-fill `rect`, or the draw bounds when `None`
    ///
    /// Only the no-argument form resets the draw bounds (to empty).
    pub fn clear(&mut self, rect: Option<&PixelBounds>) {
        let target = match rect {
            Some(r) => *r,
            None => std::mem::take(&mut self.bounds),
        };
        if let Some((x0, y0, x1, y1)) = self.pixel_rect(&target) {
            for y in y0..y1 {
                self.pixels[y * self.width + x0..y * self.width + x1].fill(0);
            }
        }
    }

    /// Shift the pixels inside the draw bounds by `(dx, dy)`
    ///
    /// The destination is clipped to the canvas, rows are copied in an order that
    /// never reads an already overwritten row, the vacated part of the source is
    /// cleared and the draw bounds become the destination rectangle.
    ///
    /// # Returns
    /// The new draw bounds
    pub fn translate(&mut self, dx: i64, dy: i64) -> PixelBounds {
        let Some((x0, y0, x1, y1)) = self.pixel_rect(&self.bounds) else {
            self.bounds = PixelBounds::Empty;
            return self.bounds;
        };
        if dx == 0 && dy == 0 {
            return self.bounds;
        }
        let (w, h) = (self.width as i64, self.height as i64);
        let (sx0, sy0, sx1, sy1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);

        // Destination clipped to the canvas
        let tx0 = (sx0 + dx).max(0);
        let ty0 = (sy0 + dy).max(0);
        let tx1 = (sx1 + dx).min(w);
        let ty1 = (sy1 + dy).min(h);

        if tx0 >= tx1 || ty0 >= ty1 {
            self.clear(None);
            return self.bounds;
        }

        let cols = (tx1 - tx0) as usize;
        let copy_row = |pixels: &mut [u32], ty: i64| {
            let src = ((ty - dy) * w + (tx0 - dx)) as usize;
            let dst = (ty * w + tx0) as usize;
            // `copy_within` is overlap-safe for the purely horizontal case
            pixels.copy_within(src..src + cols, dst);
        };
        if dy > 0 {
            // Moving down: bottom-up so unread source rows are never overwritten
            for ty in (ty0..ty1).rev() {
                copy_row(&mut self.pixels, ty);
            }
        } else {
            for ty in ty0..ty1 {
                copy_row(&mut self.pixels, ty);
            }
        }

        // Clear source minus destination
        for y in sy0..sy1 {
            let row = (y * w) as usize;
            if y < ty0 || y >= ty1 {
                self.pixels[row + x0..row + x1].fill(0);
            } else {
                let left_end = sx1.min(tx0);
                if sx0 < left_end {
                    self.pixels[row + x0..row + left_end as usize].fill(0);
                }
                let right_start = sx0.max(tx1);
                if right_start < sx1 {
                    self.pixels[row + right_start as usize..row + x1].fill(0);
                }
            }
        }

        self.bounds = PixelBounds::new(tx0 as f64, ty0 as f64, tx1 as f64, ty1 as f64);
        self.bounds
    }
}

/// Liang-Barsky clip of a segment against `(xmin, ymin, xmax, ymax)`
fn clip_segment(
    (x0, y0, x1, y1): (f64, f64, f64, f64),
    (xmin, ymin, xmax, ymax): (f64, f64, f64, f64),
) -> Option<(f64, f64, f64, f64)> {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, x0 - xmin),
        (dx, xmax - x0),
        (-dy, y0 - ymin),
        (dy, ymax - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Rgba {
        Rgba::from_rgb(255, 0, 0)
    }

    /// Every non-zero pixel lies inside the draw bounds
    fn assert_bounds_sound(canvas: &PixelCanvas) {
        let bounds = canvas.draw_bounds();
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixels()[y * canvas.width() + x] != 0 {
                    assert!(
                        bounds.contains_point(x as f64, y as f64)
                            && bounds.contains_point(x as f64 + 1.0, y as f64 + 1.0),
                        "pixel ({}, {}) outside bounds {:?}",
                        x,
                        y,
                        bounds
                    );
                }
            }
        }
    }

    fn count_set(canvas: &PixelCanvas) -> usize {
        canvas.pixels().iter().filter(|&&p| p != 0).count()
    }

    #[test]
    fn test_pack_unpack() {
        let c = Rgba::new(1, 2, 3, 4);
        assert_eq!(Rgba::unpack(c.pack()), c);
        assert_eq!(c.pack().to_le_bytes(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_palette_is_opaque_and_distinct() {
        let a = Rgba::palette(0);
        let b = Rgba::palette(1);
        assert_eq!(a.a, 255);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_canvas_is_clear() {
        let canvas = PixelCanvas::new(8, 4);
        assert_eq!(canvas.pixels().len(), 32);
        assert!(canvas.draw_bounds().is_empty());
        assert_eq!(count_set(&canvas), 0);
    }

    #[test]
    fn test_horizontal_thin_line() {
        let mut canvas = PixelCanvas::new(20, 10);
        canvas.set_color(red());
        let touched = canvas.draw_segment(2.0, 5.0, 12.0, 5.0, 1.0);
        for x in 2..=12 {
            assert_eq!(canvas.get_pixel(x, 5), Some(red()));
        }
        assert_eq!(canvas.get_pixel(13, 5), Some(Rgba::TRANSPARENT));
        assert_eq!(touched, PixelBounds::new(2.0, 5.0, 13.0, 6.0));
        assert_eq!(canvas.draw_bounds(), touched);
    }

    #[test]
    fn test_diagonal_thin_line_is_antialiased() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.set_color(red());
        canvas.draw_segment(1.0, 1.0, 15.0, 8.0, 1.0);
        // Some pixels are partially covered
        let partial = canvas
            .pixels()
            .iter()
            .map(|&p| Rgba::unpack(p).a)
            .filter(|&a| a > 0 && a < 255)
            .count();
        assert!(partial > 0);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_single_point_segment() {
        let mut canvas = PixelCanvas::new(5, 5);
        canvas.set_color(red());
        let touched = canvas.draw_segment(2.2, 2.7, 2.4, 2.9, 1.0);
        assert_eq!(touched, PixelBounds::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(count_set(&canvas), 1);
    }

    #[test]
    fn test_thick_line_is_symmetric() {
        let mut canvas = PixelCanvas::new(40, 40);
        canvas.set_color(red());
        canvas.draw_segment(5.0, 20.0, 35.0, 20.0, 5.0);
        // Solid core around y = 20 with equal reach above and below
        for y in 18..=21 {
            assert_eq!(canvas.get_pixel(20, y), Some(red()), "row {}", y);
        }
        let above = (0..20).filter(|&y| canvas.get_pixel(20, y).unwrap().a > 0).count();
        let below = (20..40).filter(|&y| canvas.get_pixel(20, y).unwrap().a > 0).count();
        assert!((above as i64 - below as i64).abs() <= 1);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_thick_steep_line() {
        let mut canvas = PixelCanvas::new(40, 40);
        canvas.set_color(red());
        let touched = canvas.draw_segment(10.0, 2.0, 14.0, 36.0, 3.0);
        assert!(!touched.is_empty());
        assert!(count_set(&canvas) > 3 * 30);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_offscreen_and_nan_segments_touch_nothing() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(red());
        assert!(canvas.draw_segment(-50.0, -50.0, -20.0, -40.0, 1.0).is_empty());
        assert!(canvas.draw_segment(f64::NAN, 0.0, 5.0, 5.0, 3.0).is_empty());
        assert!(canvas.draw_bounds().is_empty());
        assert_eq!(count_set(&canvas), 0);
    }

    #[test]
    fn test_huge_segment_is_clipped() {
        let mut canvas = PixelCanvas::new(50, 50);
        canvas.set_color(red());
        canvas.draw_segment(-1e9, 25.0, 1e9, 25.0, 3.0);
        assert_eq!(canvas.get_pixel(0, 25), Some(red()));
        assert_eq!(canvas.get_pixel(49, 25), Some(red()));
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_circle_and_square() {
        let mut canvas = PixelCanvas::new(30, 30);
        canvas.set_color(red());
        let circle = canvas.draw_circle(10.0, 10.0, 6.0);
        assert_eq!(canvas.get_pixel(10, 10), Some(red()));
        assert_eq!(canvas.get_pixel(0, 0), Some(Rgba::TRANSPARENT));
        let (xmin, ymin, xmax, ymax) = circle.corners().unwrap();
        assert!(xmin >= 7.0 && ymin >= 7.0 && xmax <= 13.0 && ymax <= 13.0);

        let square = canvas.draw_square(20.0, 20.0, 4.0);
        assert_eq!(square, PixelBounds::new(18.0, 18.0, 22.0, 22.0));
        assert!(count_set(&canvas) >= 16 + 20);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_dots_clip_to_canvas() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(red());
        canvas.draw_circle(0.0, 0.0, 8.0);
        canvas.draw_square(9.5, 9.5, 6.0);
        assert_bounds_sound(&canvas);
        let (xmin, ymin, xmax, ymax) = canvas.draw_bounds().corners().unwrap();
        assert!(xmin >= 0.0 && ymin >= 0.0 && xmax <= 10.0 && ymax <= 10.0);
    }

    #[test]
    fn test_alpha_blending() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.set_color(Rgba::from_rgb(200, 100, 0));
        canvas.set_alpha(0.5);
        canvas.draw_square(1.5, 1.5, 1.0);
        let p = canvas.get_pixel(1, 1).unwrap();
        assert_eq!(p, Rgba::new(100, 50, 0, 128));
    }

    #[test]
    fn test_clear_without_rect_resets_bounds() {
        let mut canvas = PixelCanvas::new(30, 30);
        canvas.set_color(red());
        canvas.draw_segment(3.0, 3.0, 25.0, 17.0, 4.0);
        canvas.draw_circle(5.0, 25.0, 5.0);
        assert_bounds_sound(&canvas);

        let previous = canvas.draw_bounds();
        canvas.clear(None);
        assert!(canvas.draw_bounds().is_empty());
        assert_eq!(count_set(&canvas), 0);
        assert!(!previous.is_empty());
    }

    #[test]
    fn test_clear_with_rect_keeps_bounds() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(red());
        canvas.draw_square(5.0, 5.0, 4.0);
        let bounds = canvas.draw_bounds();
        canvas.clear(Some(&PixelBounds::new(0.0, 0.0, 5.0, 10.0)));
        assert_eq!(canvas.draw_bounds(), bounds);
        assert_eq!(canvas.get_pixel(4, 5), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.get_pixel(5, 5), Some(red()));
    }

    #[test]
    fn test_translate_moves_pixels_and_bounds() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.set_color(red());
        canvas.draw_square(5.0, 5.0, 2.0);
        let before = canvas.draw_bounds();

        let after = canvas.translate(3, 4);
        assert_eq!(after, before.translate(3.0, 4.0));
        assert_eq!(canvas.get_pixel(4, 4), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.get_pixel(7, 8), Some(red()));
        assert_eq!(count_set(&canvas), 4);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_translate_there_and_back() {
        for (dx, dy) in [(5, 0), (-4, 0), (0, 6), (0, -3), (4, -2), (-3, 5)] {
            let mut canvas = PixelCanvas::new(40, 40);
            canvas.set_color(red());
            canvas.draw_segment(12.0, 14.0, 27.0, 22.0, 3.0);
            canvas.draw_circle(20.0, 20.0, 7.0);
            let original = canvas.pixels().to_vec();
            let original_bounds = canvas.draw_bounds();

            canvas.translate(dx, dy);
            assert_bounds_sound(&canvas);
            canvas.translate(-dx, -dy);

            assert_eq!(canvas.pixels(), &original[..], "shift ({}, {})", dx, dy);
            assert_eq!(canvas.draw_bounds(), original_bounds);
        }
    }

    #[test]
    fn test_translate_clips_at_edge() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(red());
        canvas.draw_square(9.0, 5.0, 2.0);
        let bounds = canvas.translate(1, 0);
        // Only the column shifted to x = 9 survives
        assert_eq!(bounds, PixelBounds::new(9.0, 4.0, 10.0, 6.0));
        assert_eq!(count_set(&canvas), 2);
        assert_bounds_sound(&canvas);
    }

    #[test]
    fn test_translate_entirely_offscreen() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(red());
        canvas.draw_square(5.0, 5.0, 2.0);
        assert!(canvas.translate(100, 0).is_empty());
        assert_eq!(count_set(&canvas), 0);
    }

    #[test]
    fn test_copy_rgba() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.set_color(Rgba::new(1, 2, 3, 255));
        canvas.draw_square(5.0, 5.0, 2.0);
        let (rect, bytes) = canvas.copy_rgba(&canvas.draw_bounds()).unwrap();
        assert_eq!(rect, (4, 4, 2, 2));
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_clip_segment() {
        let clipped = clip_segment((-10.0, 5.0, 20.0, 5.0), (0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(clipped, (0.0, 5.0, 10.0, 5.0));
        assert!(clip_segment((-10.0, -5.0, -1.0, -1.0), (0.0, 0.0, 10.0, 10.0)).is_none());
    }
}
