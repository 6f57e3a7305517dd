//! # CABLESIGHT Procedural Textures
//!
//! Synthetic surface maps for the cable model, drawn at runtime instead of
//! loaded from files.
//!
//! ## Design Principles
//!
//! 1. **Pure**: a generator reads only its kind, params and seed
//! 2. **Varied**: without an explicit seed every call draws a fresh one, so
//!    callers must not expect pixel-identical output across calls
//! 3. **Non-fatal**: if a drawing surface cannot be acquired the generator
//!    returns `None` and the caller disables that map
//!
//! ## Core Components
//!
//! - `Canvas`: RGBA8 drawing surface (rects, lines, circles, gradients)
//! - `SimplexNoise`: smooth noise for blotches and fibres
//! - `generate`: dispatches a `TextureKind` to its generator
//!
//! ## Example
//!
//! ```rust,ignore
//! use cablesight_procedural::{generate, TextureKind, TextureParams};
//!
//! let braid = generate(TextureKind::braid(), TextureParams::square(512));
//! match braid {
//!     Some(tex) => assert_eq!(tex.width(), 512),
//!     None => { /* effect disabled */ }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod generators;
pub mod noise;
pub mod raster;
pub mod seed;

pub use generators::{generate, TextureKind, TextureParams};
pub use noise::SimplexNoise;
pub use raster::{Canvas, PixelFormat, RasterTexture, Rgba8};
pub use seed::TextureSeed;
