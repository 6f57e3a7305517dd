//! # Render Backend
//!
//! Everything GPU-side goes through [`RenderBackend`]. The engine never
//! touches a graphics API directly: it creates and releases opaque handles,
//! pushes material changes and issues exactly one render pass per tick.
//!
//! ```text
//! ┌──────────────┐   create/release    ┌────────────────┐
//! │  SceneGraph  │ ──────────────────► │                │
//! │  Materials   │   update_material   │ RenderBackend  │
//! │  Screens     │ ──────────────────► │                │
//! │  Scheduler   │   render (1/tick)   │                │
//! └──────────────┘ ──────────────────► └────────────────┘
//! ```

mod headless;

pub use headless::{HeadlessBackend, PassRecord, ResourceCounts};

use cablesight_procedural::RasterTexture;
use cablesight_shared::{Mat4, Vec3};

use crate::error::EngineResult;
use crate::scene::{Geometry, MaterialLayer};

/// Kind of GPU-side resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex and index buffers.
    Geometry,
    /// Shader program parameters.
    Material,
    /// Sampled image.
    Texture,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Geometry => "geometry",
            Self::Material => "material",
            Self::Texture => "texture",
        })
    }
}

/// Opaque handle to a GPU-side resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuHandle {
    kind: ResourceKind,
    id: u32,
}

impl GpuHandle {
    /// Creates a handle. Backends call this; the engine only stores handles.
    #[inline]
    #[must_use]
    pub const fn new(kind: ResourceKind, id: u32) -> Self {
        Self { kind, id }
    }

    /// Resource kind.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        self.kind
    }

    /// Backend-assigned id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }
}

/// Identity of a render surface (the drawable attached to the host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// One visible mesh/material pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Geometry buffers.
    pub geometry: GpuHandle,
    /// Material.
    pub material: GpuHandle,
    /// World transform.
    pub transform: Mat4,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderPass<'a> {
    /// Frame number being drawn.
    pub frame: u64,
    /// Target surface.
    pub surface: SurfaceId,
    /// Camera view-projection.
    pub view_projection: Mat4,
    /// Camera position (for specular and fresnel terms).
    pub camera_position: Vec3,
    /// Visible draws, parents before children.
    pub draws: &'a [DrawItem],
    /// Live discharge particles, raw bytes for upload.
    pub particles: &'a [u8],
    /// Number of live particles in `particles`.
    pub particle_count: u32,
    /// Background color.
    pub clear_color: [f32; 4],
}

/// GPU seam used by the engine.
///
/// Creation calls may fail with [`crate::EngineError::ContextLost`] or
/// [`crate::EngineError::AllocationFailed`]; both are terminal for the
/// engine instance. `release` and `destroy_surface` never fail.
pub trait RenderBackend {
    /// Creates a render surface of the given size.
    ///
    /// # Errors
    ///
    /// `SurfaceUnavailable` if no drawable can be created (non-fatal), or a
    /// terminal resource error.
    fn create_surface(&mut self, width: u32, height: u32) -> EngineResult<SurfaceId>;

    /// Resizes the render target of a surface.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn resize_surface(&mut self, surface: SurfaceId, width: u32, height: u32) -> EngineResult<()>;

    /// Destroys a surface.
    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Uploads vertex and index buffers.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn create_geometry(&mut self, geometry: &Geometry) -> EngineResult<GpuHandle>;

    /// Uploads a texture.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn create_texture(&mut self, texture: &RasterTexture) -> EngineResult<GpuHandle>;

    /// Replaces the pixels of an existing texture.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn upload_texture(&mut self, handle: GpuHandle, texture: &RasterTexture) -> EngineResult<()>;

    /// Creates a material.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn create_material(&mut self, material: &MaterialLayer) -> EngineResult<GpuHandle>;

    /// Pushes changed material parameters and uniforms.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn update_material(&mut self, handle: GpuHandle, material: &MaterialLayer) -> EngineResult<()>;

    /// Releases any resource handle.
    fn release(&mut self, handle: GpuHandle);

    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Terminal resource error.
    fn render(&mut self, pass: &RenderPass<'_>) -> EngineResult<()>;
}
