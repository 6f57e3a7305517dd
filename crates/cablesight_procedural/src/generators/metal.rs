//! Metal surfaces: worn armour wire and twisted copper.

use std::f32::consts::PI;

use rand::Rng;

use crate::noise::SimplexNoise;
use crate::raster::{Canvas, PixelFormat, RasterTexture, Rgba8};
use crate::seed::TextureSeed;

const OXIDE: Rgba8 = Rgba8::new(96, 84, 70, 255);
const COPPER: [f32; 3] = [0.72, 0.45, 0.20];

pub(super) fn draw_wear(mut canvas: Canvas, seed: TextureSeed, base: Rgba8, scratches: u32) -> RasterTexture {
    let (w, h) = (canvas.width(), canvas.height());
    let noise = SimplexNoise::new(seed.derive(1));

    // Oxidation blotches
    canvas.shade(|x, y| {
        let u = f64::from(x) / f64::from(w) * 5.0;
        let v = f64::from(y) / f64::from(h) * 5.0;
        let n = noise.fbm(u, v, 5, 0.55, 2.1) as f32;
        let grain = noise.sample(u * 40.0, v * 2.0) as f32 * 0.04;
        let oxide = ((n - 0.15) * 2.5).clamp(0.0, 0.7);
        let tinted = base.lerp(Rgba8::gray(base.r.saturating_add(20)), grain.abs() * 4.0);
        tinted.lerp(OXIDE, oxide)
    });

    // Scratches run mostly along the wire
    let mut rng = seed.derive(2).rng();
    let (wf, hf) = (w as f32, h as f32);
    for _ in 0..scratches {
        let x = rng.gen_range(0.0..wf);
        let y = rng.gen_range(0.0..hf);
        let len = rng.gen_range(0.05..0.25) * wf;
        let angle = rng.gen_range(-0.25f32..0.25);
        let end = (x + len * angle.cos(), y + len * angle.sin());
        let alpha = rng.gen_range(40..140);
        canvas.stroke_line((x, y), end, rng.gen_range(0.5..1.5), Rgba8::new(220, 225, 230, alpha));
    }

    canvas.into_texture("metal-wear", PixelFormat::Color)
}

pub(super) fn draw_copper(mut canvas: Canvas, seed: TextureSeed, strands: u32, twist: f32) -> RasterTexture {
    let (w, h) = (canvas.width(), canvas.height());
    let strands = strands.max(1) as f32;
    // Whole strands per tile height keep the twist seamless vertically
    let twist = twist.round();
    let mut rng = seed.rng();
    let tint: Vec<f32> = (0..strands as usize).map(|_| rng.gen_range(0.85..1.1)).collect();

    canvas.shade(|x, y| {
        let u = x as f32 / w as f32;
        let v = y as f32 / h as f32;
        let phase = u * strands + v * twist;
        let strand = (phase.floor() as i64).rem_euclid(tint.len() as i64) as usize;
        let across = phase.rem_euclid(1.0);
        // Cylindrical strand: bright ridge in the middle, dark grooves between
        let ridge = (across * PI).sin().max(0.0);
        let light = (0.35 + 0.75 * ridge.powf(0.6)) * tint[strand];
        Rgba8::from_f32(
            [COPPER[0] * light + 0.15 * ridge.powi(8), COPPER[1] * light, COPPER[2] * light],
            1.0,
        )
    });

    canvas.into_texture("copper-twist", PixelFormat::Color)
}
