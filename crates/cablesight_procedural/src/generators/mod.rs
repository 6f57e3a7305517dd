//! # Texture Generators
//!
//! `generate(kind, params)` draws one surface map. Generators never fail
//! loudly: a surface that cannot be acquired yields `None`, which callers
//! read as "map disabled".
//!
//! Every generator receives the exact target resolution. Tiling (repeat)
//! factors are applied downstream by the material that samples the map, so
//! the weave, twist and mesh patterns are drawn to wrap seamlessly.

mod braid;
mod metal;
mod overlay;
mod speckle;

use crate::raster::{Canvas, RasterTexture, Rgba8};
use crate::seed::TextureSeed;

/// Which map to draw, with its pattern parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureKind {
    /// Braided shield weave, tangent-space normal map.
    Braid {
        /// Carrier bands per tile in each diagonal direction.
        carriers: u32,
        /// Normal strength.
        depth: f32,
    },
    /// Generic speckle/noise map for bump and roughness.
    Speckle {
        /// Fraction of pixels that receive a speckle dot.
        density: f32,
        /// Base noise frequency (cycles per tile).
        scale: f32,
    },
    /// Worn metal: oxidation blotches and scratches over a base tint.
    MetalWear {
        /// Base metal color.
        base: Rgba8,
        /// Number of scratch strokes.
        scratches: u32,
    },
    /// Helically twisted copper strands.
    CopperTwist {
        /// Strands across the tile.
        strands: u32,
        /// Diagonal offset per tile height (in strand widths).
        twist: f32,
    },
    /// Alpha-cut diamond mesh (opaque wires, transparent holes).
    MeshAlpha {
        /// Diamond cells per tile side.
        cells: u32,
        /// Wire thickness as a fraction of the cell.
        wire: f32,
    },
    /// Fractal branching discharge pattern on a transparent background.
    Treeing {
        /// Number of independent trees.
        roots: u32,
        /// Branching generations.
        depth: u32,
    },
    /// Diffuse water-intrusion spots on a transparent background.
    WaterSpots {
        /// Number of spots.
        spots: u32,
    },
}

impl TextureKind {
    /// Shield braid with the default weave.
    #[must_use]
    pub const fn braid() -> Self {
        Self::Braid { carriers: 8, depth: 2.5 }
    }

    /// Default speckle map.
    #[must_use]
    pub const fn speckle() -> Self {
        Self::Speckle { density: 0.04, scale: 6.0 }
    }

    /// Galvanised armour wire wear.
    #[must_use]
    pub const fn metal_wear() -> Self {
        Self::MetalWear {
            base: Rgba8::new(150, 155, 160, 255),
            scratches: 40,
        }
    }

    /// Conductor copper twist.
    #[must_use]
    pub const fn copper_twist() -> Self {
        Self::CopperTwist { strands: 12, twist: 3.0 }
    }

    /// Screen mesh cut-out.
    #[must_use]
    pub const fn mesh_alpha() -> Self {
        Self::MeshAlpha { cells: 16, wire: 0.18 }
    }

    /// Electrical treeing overlay.
    #[must_use]
    pub const fn treeing() -> Self {
        Self::Treeing { roots: 3, depth: 6 }
    }

    /// Water treeing overlay.
    #[must_use]
    pub const fn water_spots() -> Self {
        Self::WaterSpots { spots: 24 }
    }

    /// Short label used for the generated texture.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Braid { .. } => "braid-normal",
            Self::Speckle { .. } => "speckle",
            Self::MetalWear { .. } => "metal-wear",
            Self::CopperTwist { .. } => "copper-twist",
            Self::MeshAlpha { .. } => "mesh-alpha",
            Self::Treeing { .. } => "treeing",
            Self::WaterSpots { .. } => "water-spots",
        }
    }
}

/// Target resolution and optional fixed seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Fixed seed; `None` draws a fresh one per call.
    pub seed: Option<TextureSeed>,
}

impl TextureParams {
    /// Rectangular map with internal seeding.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height, seed: None }
    }

    /// Square map with internal seeding.
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Pins the seed, making the output reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: TextureSeed) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Draws one map.
///
/// Returns `None` if the drawing surface cannot be acquired (zero or
/// oversized resolution).
#[must_use]
pub fn generate(kind: TextureKind, params: TextureParams) -> Option<RasterTexture> {
    let canvas = Canvas::acquire(params.width, params.height)?;
    let seed = params.seed.unwrap_or_else(TextureSeed::fresh);

    let texture = match kind {
        TextureKind::Braid { carriers, depth } => braid::draw(canvas, seed, carriers, depth),
        TextureKind::Speckle { density, scale } => speckle::draw(canvas, seed, density, scale),
        TextureKind::MetalWear { base, scratches } => metal::draw_wear(canvas, seed, base, scratches),
        TextureKind::CopperTwist { strands, twist } => metal::draw_copper(canvas, seed, strands, twist),
        TextureKind::MeshAlpha { cells, wire } => braid::draw_mesh(canvas, cells, wire),
        TextureKind::Treeing { roots, depth } => overlay::draw_treeing(canvas, seed, roots, depth),
        TextureKind::WaterSpots { spots } => overlay::draw_water(canvas, seed, spots),
    };

    tracing::trace!(
        "generated {} {}x{}",
        texture.label(),
        texture.width(),
        texture.height()
    );
    Some(texture)
}

/// Wrapped lookup into a row-major scalar field.
#[inline]
pub(crate) fn wrapped(field: &[f32], width: u32, height: u32, x: i64, y: i64) -> f32 {
    let xi = x.rem_euclid(i64::from(width)) as usize;
    let yi = y.rem_euclid(i64::from(height)) as usize;
    field[yi * width as usize + xi]
}

/// Encodes a height field as a tangent-space normal map, wrapping at edges.
pub(crate) fn normals_from_height(canvas: &mut Canvas, field: &[f32], strength: f32) {
    let (w, h) = (canvas.width(), canvas.height());
    canvas.shade(|x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let dx = wrapped(field, w, h, x + 1, y) - wrapped(field, w, h, x - 1, y);
        let dy = wrapped(field, w, h, x, y + 1) - wrapped(field, w, h, x, y - 1);
        let nx = -dx * strength;
        let ny = -dy * strength;
        let len = (nx * nx + ny * ny + 1.0).sqrt();
        Rgba8::from_f32(
            [
                (nx / len) * 0.5 + 0.5,
                (ny / len) * 0.5 + 0.5,
                (1.0 / len) * 0.5 + 0.5,
            ],
            1.0,
        )
    });
}
