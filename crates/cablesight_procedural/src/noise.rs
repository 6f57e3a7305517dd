//! # Simplex Noise
//!
//! 2D simplex noise plus fractal sums, used for oxidation blotches, fibre
//! variation in the speckle map and the edges of water spots.

use crate::seed::TextureSeed;

/// Skewing factor for the 2D simplex grid: (sqrt(3) - 1) / 2.
const F2: f64 = 0.366_025_403_784_439;
/// Unskewing factor: (3 - sqrt(3)) / 6.
const G2: f64 = 0.211_324_865_405_187;

/// Eight unit-ish gradient directions.
const GRADIENTS: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [0.707, 0.707],
    [0.0, 1.0],
    [-0.707, 0.707],
    [-1.0, 0.0],
    [-0.707, -0.707],
    [0.0, -1.0],
    [0.707, -0.707],
];

/// 2D simplex noise generator.
///
/// Produces smooth values in roughly [-1, 1].
pub struct SimplexNoise {
    /// 512-entry permutation (256 doubled to skip index wrapping).
    perm: [u8; 512],
}

impl SimplexNoise {
    /// Builds the permutation table from a seed.
    #[must_use]
    pub fn new(seed: TextureSeed) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            table.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&table);
        perm[256..].copy_from_slice(&table);

        Self { perm }
    }

    #[inline]
    fn hash(&self, i: i64, j: i64) -> usize {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        self.perm[ii + self.perm[jj] as usize] as usize
    }

    #[inline]
    fn corner(&self, x: f64, y: f64, gi: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t <= 0.0 {
            return 0.0;
        }
        let g = GRADIENTS[gi & 7];
        let t2 = t * t;
        t2 * t2 * (g[0] * x + g[1] * y)
    }

    /// Samples noise at `(x, y)`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * F2;
        let i = (x + skew).floor() as i64;
        let j = (y + skew).floor() as i64;

        let unskew = (i + j) as f64 * G2;
        let x0 = x - (i as f64 - unskew);
        let y0 = y - (j as f64 - unskew);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + G2;
        let y1 = y0 - f64::from(j1) + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let n0 = self.corner(x0, y0, self.hash(i, j));
        let n1 = self.corner(x1, y1, self.hash(i + i64::from(i1), j + i64::from(j1)));
        let n2 = self.corner(x2, y2, self.hash(i + 1, j + 1));

        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    /// Fractal Brownian motion: `octaves` layers of noise, normalized to [-1, 1].
    #[must_use]
    pub fn fbm(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            norm += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / norm
    }

    /// Ridged noise in [0, 1]: sharp crests where the base noise crosses zero.
    ///
    /// Good for scratch-like and vein-like features.
    #[must_use]
    pub fn ridged(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 0.5;
        let mut frequency = 1.0;
        let mut norm = 0.0;

        for _ in 0..octaves.max(1) {
            let n = 1.0 - self.sample(x * frequency, y * frequency).abs();
            total += n * n * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        total / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        let noise = SimplexNoise::new(TextureSeed::new(42));
        for i in 0..2000 {
            let x = f64::from(i) * 0.137;
            let y = f64::from(i) * 0.291;
            let v = noise.sample(x, y);
            assert!((-1.0..=1.0).contains(&v));
            let r = noise.ridged(x, y, 4);
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = SimplexNoise::new(TextureSeed::new(7));
        let b = SimplexNoise::new(TextureSeed::new(7));
        assert_eq!(a.fbm(3.3, 1.7, 5, 0.5, 2.0), b.fbm(3.3, 1.7, 5, 0.5, 2.0));
    }

    #[test]
    fn test_not_constant() {
        let noise = SimplexNoise::new(TextureSeed::new(1));
        let values: Vec<f64> = (0..64).map(|i| noise.sample(f64::from(i) * 0.31, 0.5)).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(max - min > 0.2);
    }
}
