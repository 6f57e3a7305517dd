use rand::Rng;

use crate::noise::SimplexNoise;
use crate::raster::{Canvas, PixelFormat, RasterTexture, Rgba8};
use crate::seed::TextureSeed;

/// Gray noise with scattered dots, for bump and roughness channels.
pub(super) fn draw(mut canvas: Canvas, seed: TextureSeed, density: f32, scale: f32) -> RasterTexture {
    let (w, h) = (canvas.width(), canvas.height());
    let noise = SimplexNoise::new(seed.derive(1));
    let scale = f64::from(scale.max(0.1));

    canvas.shade(|x, y| {
        let u = f64::from(x) / f64::from(w) * scale;
        let v = f64::from(y) / f64::from(h) * scale;
        let n = noise.fbm(u, v, 4, 0.5, 2.0);
        Rgba8::gray((128.0 + n * 60.0).clamp(0.0, 255.0) as u8)
    });

    let mut rng = seed.derive(2).rng();
    let dots = (f64::from(w) * f64::from(h) * f64::from(density.clamp(0.0, 1.0))) as usize;
    for _ in 0..dots {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        let shade: u8 = if rng.gen_bool(0.5) { rng.gen_range(200..=255) } else { rng.gen_range(0..60) };
        canvas.put(i64::from(x), i64::from(y), Rgba8::gray(shade));
    }

    canvas.into_texture("speckle", PixelFormat::Data)
}
