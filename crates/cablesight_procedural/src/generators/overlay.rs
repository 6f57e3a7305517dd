//! Fault overlays drawn on transparent backgrounds.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;

use crate::noise::SimplexNoise;
use crate::raster::{Canvas, PixelFormat, RasterTexture, Rgba8};
use crate::seed::TextureSeed;

const DISCHARGE_CORE: Rgba8 = Rgba8::new(225, 235, 255, 255);
const DISCHARGE_HALO: Rgba8 = Rgba8::new(120, 150, 255, 70);

/// Upper bound on drawn segments per texture.
const MAX_SEGMENTS: usize = 4096;

struct Branch {
    from: (f32, f32),
    angle: f32,
    length: f32,
    width: f32,
    generation: u32,
}

/// Fractal branching discharge channels growing from the bottom edge.
pub(super) fn draw_treeing(mut canvas: Canvas, seed: TextureSeed, roots: u32, depth: u32) -> RasterTexture {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let mut rng = seed.rng();
    let mut stack: Vec<Branch> = (0..roots.max(1))
        .map(|_| Branch {
            from: (rng.gen_range(0.15..0.85) * w, h - 1.0),
            angle: -FRAC_PI_2 + rng.gen_range(-0.3..0.3),
            length: h * rng.gen_range(0.18..0.28),
            width: (w / 128.0).max(1.0) * 2.0,
            generation: 0,
        })
        .collect();

    let mut drawn = 0;
    while let Some(branch) = stack.pop() {
        if drawn >= MAX_SEGMENTS {
            break;
        }

        // Jagged channel: a few kinked sub-segments
        let mut point = branch.from;
        let kinks = 4;
        for _ in 0..kinks {
            let a = branch.angle + rng.gen_range(-0.45..0.45);
            let step = branch.length / kinks as f32;
            let next = (point.0 + step * a.cos(), point.1 + step * a.sin());
            canvas.stroke_line(point, next, branch.width * 3.0, DISCHARGE_HALO);
            canvas.stroke_line(point, next, branch.width, DISCHARGE_CORE);
            point = next;
            drawn += 1;
        }

        if branch.generation + 1 >= depth {
            continue;
        }
        let children = rng.gen_range(2..=3);
        for _ in 0..children {
            stack.push(Branch {
                from: point,
                angle: branch.angle + rng.gen_range(-0.8..0.8),
                length: branch.length * rng.gen_range(0.55..0.8),
                width: (branch.width * 0.7).max(0.6),
                generation: branch.generation + 1,
            });
        }
    }

    canvas.into_texture("treeing", PixelFormat::Color)
}

struct Spot {
    center: (f32, f32),
    radius: f32,
    strength: f32,
}

/// Soft, noise-edged moisture spots.
pub(super) fn draw_water(mut canvas: Canvas, seed: TextureSeed, spots: u32) -> RasterTexture {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let noise = SimplexNoise::new(seed.derive(1));
    let mut rng = seed.derive(2).rng();
    let spots: Vec<Spot> = (0..spots.max(1))
        .map(|_| Spot {
            center: (rng.gen_range(0.0..w), rng.gen_range(0.0..h)),
            radius: w.min(h) * rng.gen_range(0.04..0.14),
            strength: rng.gen_range(0.5..1.0),
        })
        .collect();

    canvas.shade(|x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let mut coverage = 0.0f32;
        for spot in &spots {
            let dx = px - spot.center.0;
            let dy = py - spot.center.1;
            let d2 = (dx * dx + dy * dy) / (spot.radius * spot.radius);
            if d2 < 1.0 {
                let falloff = 1.0 - d2;
                coverage += spot.strength * falloff * falloff;
            }
        }
        let edge = 0.75 + 0.25 * noise.fbm(f64::from(px) * 0.03, f64::from(py) * 0.03, 3, 0.5, 2.0) as f32;
        let alpha = (coverage * edge).clamp(0.0, 0.85);
        Rgba8::from_f32([0.25, 0.55, 0.9], alpha)
    });

    canvas.into_texture("water-spots", PixelFormat::Color)
}
