//! Raster surfaces.
//!
//! `Canvas` is the mutable drawing surface; `RasterTexture` is the frozen
//! result handed to materials. Coordinates are in pixels, `f32`, with the
//! origin at the top-left corner.

use bytemuck::{Pod, Zeroable};
use cablesight_shared::constants::MAX_TEXTURE_SIDE;

/// One RGBA8 pixel, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Flat tangent-space normal (0, 0, 1).
    pub const FLAT_NORMAL: Self = Self::new(128, 128, 255, 255);

    /// Creates a pixel.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray.
    #[must_use]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v, 255)
    }

    /// Converts a linear [0, 1] color.
    #[must_use]
    pub fn from_f32(rgb: [f32; 3], alpha: f32) -> Self {
        Self::new(to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), to_u8(alpha))
    }

    /// Same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Per-channel interpolation towards `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Source-over compositing of `self` on top of `dst`, scaled by `coverage`.
    #[must_use]
    pub fn over(self, dst: Self, coverage: f32) -> Self {
        let sa = f32::from(self.a) / 255.0 * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let da = f32::from(dst.a) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= f32::EPSILON {
            return Self::TRANSPARENT;
        }
        let ch = |s: u8, d: u8| {
            let v = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(
            ch(self.r, dst.r),
            ch(self.g, dst.g),
            ch(self.b, dst.b),
            (out_a * 255.0).round() as u8,
        )
    }

    /// Rec. 601 luma in [0, 1].
    #[must_use]
    pub fn luma(self) -> f32 {
        (0.299 * f32::from(self.r) + 0.587 * f32::from(self.g) + 0.114 * f32::from(self.b)) / 255.0
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// How the pixel data should be sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// sRGB color.
    Color,
    /// Tangent-space normal map (linear).
    Normal,
    /// Linear data (bump, roughness, alpha cut-out).
    Data,
}

/// Drawing surface.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl Canvas {
    /// Acquires a transparent surface.
    ///
    /// Returns `None` when either side is zero or larger than the maximum
    /// texture side: the surface cannot be acquired.
    #[must_use]
    pub fn acquire(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || width > MAX_TEXTURE_SIDE || height > MAX_TEXTURE_SIDE {
            tracing::warn!("cannot acquire {}x{} drawing surface", width, height);
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: vec![Rgba8::TRANSPARENT; width as usize * height as usize],
        })
    }

    /// Surface width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Surface height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    /// Reads a pixel.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.index(i64::from(x), i64::from(y)).map(|i| self.pixels[i])
    }

    /// Overwrites a pixel (no blending). Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Blends a pixel with partial coverage. Out-of-bounds writes are ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgba8, coverage: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.over(self.pixels[i], coverage);
        }
    }

    /// Fills the whole surface.
    pub fn fill(&mut self, color: Rgba8) {
        self.pixels.fill(color);
    }

    /// Writes every pixel from a function of its coordinates.
    pub fn shade(&mut self, mut f: impl FnMut(u32, u32) -> Rgba8) {
        let width = self.width as usize;
        for (i, px) in self.pixels.iter_mut().enumerate() {
            *px = f((i % width) as u32, (i / width) as u32);
        }
    }

    /// Fills an axis-aligned rectangle, blending.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba8) {
        let x0 = x.floor().max(0.0) as i64;
        let y0 = y.floor().max(0.0) as i64;
        let x1 = (x + w).ceil().min(self.width as f32) as i64;
        let y1 = (y + h).ceil().min(self.height as f32) as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Strokes a line segment with anti-aliased edges.
    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba8) {
        let half = (width * 0.5).max(0.35);
        let (ax, ay) = from;
        let (bx, by) = to;
        let min_x = (ax.min(bx) - half - 1.0).floor() as i64;
        let max_x = (ax.max(bx) + half + 1.0).ceil() as i64;
        let min_y = (ay.min(by) - half - 1.0).floor() as i64;
        let max_y = (ay.max(by) + half + 1.0).ceil() as i64;

        let dx = bx - ax;
        let dy = by - ay;
        let len_sq = dx * dx + dy * dy;

        for py in min_y.max(0)..=max_y.min(i64::from(self.height) - 1) {
            for px in min_x.max(0)..=max_x.min(i64::from(self.width) - 1) {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                let t = if len_sq > 0.0 {
                    (((cx - ax) * dx + (cy - ay) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let qx = ax + dx * t - cx;
                let qy = ay + dy * t - cy;
                let dist = (qx * qx + qy * qy).sqrt();
                let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Strokes a connected polyline.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32, color: Rgba8) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], width, color);
        }
    }

    /// Fills a disc with an anti-aliased rim.
    pub fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba8) {
        self.radial_gradient(center, radius, color, color);
    }

    /// Fills a disc whose color runs from `inner` at the center to `outer` at the rim.
    pub fn radial_gradient(&mut self, center: (f32, f32), radius: f32, inner: Rgba8, outer: Rgba8) {
        if radius <= 0.0 {
            return;
        }
        let (cx, cy) = center;
        let min_x = (cx - radius - 1.0).floor().max(0.0) as i64;
        let max_x = (cx + radius + 1.0).ceil().min(self.width as f32 - 1.0) as i64;
        let min_y = (cy - radius - 1.0).floor().max(0.0) as i64;
        let max_y = (cy + radius + 1.0).ceil().min(self.height as f32 - 1.0) as i64;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let color = inner.lerp(outer, dist / radius);
                    self.blend(px, py, color, coverage);
                }
            }
        }
    }

    /// Strokes a circular arc from `start` to `end` radians (clockwise in screen space).
    pub fn stroke_arc(&mut self, center: (f32, f32), radius: f32, start: f32, end: f32, width: f32, color: Rgba8) {
        let sweep = end - start;
        let steps = ((sweep.abs() * radius / 3.0).ceil() as usize).clamp(2, 256);
        let points: Vec<(f32, f32)> = (0..=steps)
            .map(|i| {
                let a = start + sweep * i as f32 / steps as f32;
                (center.0 + radius * a.cos(), center.1 + radius * a.sin())
            })
            .collect();
        self.stroke_polyline(&points, width, color);
    }

    /// Freezes the canvas into a texture.
    #[must_use]
    pub fn into_texture(self, label: &'static str, format: PixelFormat) -> RasterTexture {
        RasterTexture {
            label,
            format,
            width: self.width,
            height: self.height,
            pixels: self.pixels,
        }
    }
}

/// Generated image ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterTexture {
    label: &'static str,
    format: PixelFormat,
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl RasterTexture {
    /// Human-readable origin (e.g. `"braid-normal"`).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Sampling format.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Pixels as bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Reads a pixel.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Mean alpha in [0, 1].
    #[must_use]
    pub fn mean_alpha(&self) -> f32 {
        let sum: u64 = self.pixels.iter().map(|p| u64::from(p.a)).sum();
        sum as f32 / (self.pixels.len() as f32 * 255.0)
    }

    /// Number of distinct pixel values (bounded scan, for variety checks).
    #[must_use]
    pub fn distinct_pixels(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        for p in self.pixels.iter().step_by(7) {
            seen.insert(*p);
        }
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_rejects_degenerate() {
        assert!(Canvas::acquire(0, 16).is_none());
        assert!(Canvas::acquire(16, 0).is_none());
        assert!(Canvas::acquire(MAX_TEXTURE_SIDE + 1, 16).is_none());
        assert!(Canvas::acquire(16, 16).is_some());
    }

    #[test]
    fn test_over_opaque_replaces() {
        let red = Rgba8::new(255, 0, 0, 255);
        assert_eq!(red.over(Rgba8::WHITE, 1.0), red);
        assert_eq!(red.over(Rgba8::WHITE, 0.0), Rgba8::WHITE);
    }

    #[test]
    fn test_line_draws_pixels() {
        let mut canvas = Canvas::acquire(32, 32).unwrap();
        canvas.stroke_line((2.0, 16.0), (30.0, 16.0), 2.0, Rgba8::WHITE);
        assert_eq!(canvas.get(16, 16).map(|p| p.a), Some(255));
        assert_eq!(canvas.get(16, 2).map(|p| p.a), Some(0));
    }

    #[test]
    fn test_circle_and_rect_clip() {
        let mut canvas = Canvas::acquire(16, 16).unwrap();
        canvas.fill_circle((0.0, 0.0), 40.0, Rgba8::WHITE);
        canvas.fill_rect(-5.0, -5.0, 100.0, 6.0, Rgba8::BLACK);
        assert_eq!(canvas.get(15, 15), Some(Rgba8::WHITE));
        assert_eq!(canvas.get(0, 0), Some(Rgba8::BLACK));
        assert_eq!(canvas.get(15, 0), Some(Rgba8::BLACK));
        assert_eq!(canvas.get(0, 1), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_into_texture_bytes() {
        let mut canvas = Canvas::acquire(4, 2).unwrap();
        canvas.fill(Rgba8::gray(10));
        let tex = canvas.into_texture("test", PixelFormat::Data);
        assert_eq!(tex.as_bytes().len(), 4 * 2 * 4);
        assert!((tex.mean_alpha() - 1.0).abs() < f32::EPSILON);
        assert_eq!(tex.distinct_pixels(), 1);
    }
}
