//! Woven patterns: the shield braid normal map and the alpha-cut mesh.

use std::f32::consts::PI;

use rand::Rng;

use super::normals_from_height;
use crate::raster::{Canvas, PixelFormat, RasterTexture, Rgba8};
use crate::seed::TextureSeed;

/// Height of a two-over-two braid at tile coordinates `(u, v)` in [0, 1).
///
/// Two families of diagonal carriers cross; which one lies on top
/// alternates cell by cell, giving the basket-weave relief.
fn braid_height(u: f32, v: f32, carriers: f32) -> f32 {
    let a = (u + v) * carriers;
    let b = (u - v) * carriers;
    let band_a = (a.rem_euclid(1.0) * PI).sin();
    let band_b = (b.rem_euclid(1.0) * PI).sin();

    let a_on_top = (a.floor() as i64 + b.floor() as i64).rem_euclid(2) == 0;
    let (top, under) = if a_on_top { (band_a, band_b) } else { (band_b, band_a) };

    (0.35 + 0.65 * top).max(0.55 * under)
}

pub(super) fn draw(mut canvas: Canvas, seed: TextureSeed, carriers: u32, depth: f32) -> RasterTexture {
    let (w, h) = (canvas.width(), canvas.height());
    let carriers = carriers.max(1) as f32;
    let mut rng = seed.rng();

    // Fibre jitter along the carriers
    let field: Vec<f32> = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| {
            let u = x as f32 / w as f32;
            let v = y as f32 / h as f32;
            braid_height(u, v, carriers) + rng.gen_range(-0.03..0.03)
        })
        .collect();

    // Strength scales with resolution so the relief reads the same at any size
    let strength = depth * w.min(h) as f32 / (carriers * 16.0);
    normals_from_height(&mut canvas, &field, strength);
    canvas.into_texture("braid-normal", PixelFormat::Normal)
}

pub(super) fn draw_mesh(mut canvas: Canvas, cells: u32, wire: f32) -> RasterTexture {
    let (w, h) = (canvas.width(), canvas.height());
    let cells = cells.max(1) as f32;
    let half_wire = (wire.clamp(0.01, 0.9)) * 0.5;

    canvas.shade(|x, y| {
        let u = (x as f32 + 0.5) / w as f32 * cells;
        let v = (y as f32 + 0.5) / h as f32 * cells;
        // Distance to the nearest diagonal wire in cell units
        let da = ((u + v).rem_euclid(1.0) - 0.5).abs();
        let db = ((u - v).rem_euclid(1.0) - 0.5).abs();
        if (0.5 - da).min(0.5 - db) < half_wire {
            Rgba8::new(190, 190, 195, 255)
        } else {
            Rgba8::TRANSPARENT
        }
    });
    canvas.into_texture("mesh-alpha", PixelFormat::Data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braid_height_bounded() {
        for i in 0..100 {
            for j in 0..100 {
                let h = braid_height(i as f32 / 100.0, j as f32 / 100.0, 8.0);
                assert!((0.0..=1.0).contains(&h));
            }
        }
    }

    #[test]
    fn test_braid_height_tiles() {
        let a = braid_height(0.13, 0.42, 8.0);
        let b = braid_height(1.13, 0.42, 8.0);
        assert!((a - b).abs() < 1e-4);
    }
}
