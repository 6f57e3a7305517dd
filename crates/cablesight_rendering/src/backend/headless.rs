//! Headless backend.
//!
//! Keeps the books a GPU driver would keep (live handles, surfaces, passes)
//! without drawing anything. Used by the monitor binary, the tests and the
//! benchmarks, and able to inject context loss and allocation failures.

use std::collections::{HashMap, HashSet};

use cablesight_procedural::RasterTexture;
use cablesight_shared::Mat4;

use super::{GpuHandle, RenderBackend, RenderPass, ResourceKind, SurfaceId};
use crate::error::{EngineError, EngineResult};
use crate::scene::{Geometry, MaterialLayer};

/// Per-kind resource counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    /// Geometry buffers.
    pub geometries: u32,
    /// Materials.
    pub materials: u32,
    /// Textures.
    pub textures: u32,
}

impl ResourceCounts {
    /// Sum over all kinds.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.geometries + self.materials + self.textures
    }

    fn bump(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Geometry => self.geometries += 1,
            ResourceKind::Material => self.materials += 1,
            ResourceKind::Texture => self.textures += 1,
        }
    }
}

/// Summary of the most recent render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassRecord {
    /// Frame number.
    pub frame: u64,
    /// Target surface.
    pub surface: SurfaceId,
    /// Number of draws.
    pub draw_count: u32,
    /// Number of live particles.
    pub particle_count: u32,
    /// View-projection used.
    pub view_projection: Mat4,
}

/// Bookkeeping-only backend.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    next_surface: u64,
    live: HashSet<GpuHandle>,
    surfaces: HashMap<SurfaceId, (u32, u32)>,
    created: ResourceCounts,
    double_releases: u32,
    passes: u64,
    texture_uploads: u64,
    material_updates: u64,
    last_pass: Option<PassRecord>,
    context_lost: bool,
    fail_next: Option<ResourceKind>,
    refuse_surfaces: bool,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (created, not yet released) handles per kind.
    #[must_use]
    pub fn live_counts(&self) -> ResourceCounts {
        let mut counts = ResourceCounts::default();
        for handle in &self.live {
            counts.bump(handle.kind());
        }
        counts
    }

    /// Total handles ever created per kind.
    #[must_use]
    pub const fn created_counts(&self) -> ResourceCounts {
        self.created
    }

    /// Returns true if `handle` is live.
    #[must_use]
    pub fn is_live(&self, handle: GpuHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// Size of a live surface.
    #[must_use]
    pub fn surface_size(&self, surface: SurfaceId) -> Option<(u32, u32)> {
        self.surfaces.get(&surface).copied()
    }

    /// Releases of handles that were not live.
    #[must_use]
    pub const fn double_releases(&self) -> u32 {
        self.double_releases
    }

    /// Render passes drawn.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Texture re-uploads.
    #[must_use]
    pub const fn texture_uploads(&self) -> u64 {
        self.texture_uploads
    }

    /// Material parameter pushes.
    #[must_use]
    pub const fn material_updates(&self) -> u64 {
        self.material_updates
    }

    /// The most recent pass.
    #[must_use]
    pub const fn last_pass(&self) -> Option<PassRecord> {
        self.last_pass
    }

    /// Simulates losing the device: every later create, update or render fails.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    /// Makes the next allocation of `kind` fail.
    pub fn fail_next_allocation(&mut self, kind: ResourceKind) {
        self.fail_next = Some(kind);
    }

    /// Makes surface creation report the surface as unavailable.
    pub fn refuse_surfaces(&mut self, refuse: bool) {
        self.refuse_surfaces = refuse;
    }

    fn check_context(&self) -> EngineResult<()> {
        if self.context_lost {
            Err(EngineError::ContextLost)
        } else {
            Ok(())
        }
    }

    fn allocate(&mut self, kind: ResourceKind) -> EngineResult<GpuHandle> {
        self.check_context()?;
        if self.fail_next == Some(kind) {
            self.fail_next = None;
            return Err(EngineError::AllocationFailed { kind });
        }
        self.next_id += 1;
        let handle = GpuHandle::new(kind, self.next_id);
        self.live.insert(handle);
        self.created.bump(kind);
        Ok(handle)
    }

    fn check_live(&self, handle: GpuHandle) -> EngineResult<()> {
        if self.live.contains(&handle) {
            Ok(())
        } else {
            Err(EngineError::AllocationFailed { kind: handle.kind() })
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_surface(&mut self, width: u32, height: u32) -> EngineResult<SurfaceId> {
        self.check_context()?;
        if self.refuse_surfaces || width == 0 || height == 0 {
            return Err(EngineError::SurfaceUnavailable { width, height });
        }
        self.next_surface += 1;
        let id = SurfaceId(self.next_surface);
        self.surfaces.insert(id, (width, height));
        Ok(id)
    }

    fn resize_surface(&mut self, surface: SurfaceId, width: u32, height: u32) -> EngineResult<()> {
        self.check_context()?;
        match self.surfaces.get_mut(&surface) {
            Some(size) => {
                *size = (width, height);
                Ok(())
            }
            None => Err(EngineError::SurfaceUnavailable { width, height }),
        }
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.surfaces.remove(&surface).is_none() {
            tracing::warn!("destroying unknown surface {:?}", surface);
        }
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> EngineResult<GpuHandle> {
        if geometry.vertex_count() == 0 {
            return Err(EngineError::InvalidGeometry(format!(
                "geometry `{}` has no vertices",
                geometry.label()
            )));
        }
        self.allocate(ResourceKind::Geometry)
    }

    fn create_texture(&mut self, _texture: &RasterTexture) -> EngineResult<GpuHandle> {
        self.allocate(ResourceKind::Texture)
    }

    fn upload_texture(&mut self, handle: GpuHandle, _texture: &RasterTexture) -> EngineResult<()> {
        self.check_context()?;
        self.check_live(handle)?;
        self.texture_uploads += 1;
        Ok(())
    }

    fn create_material(&mut self, material: &MaterialLayer) -> EngineResult<GpuHandle> {
        if let Some(map) = material.map() {
            self.check_live(map.handle())?;
        }
        self.allocate(ResourceKind::Material)
    }

    fn update_material(&mut self, handle: GpuHandle, _material: &MaterialLayer) -> EngineResult<()> {
        self.check_context()?;
        self.check_live(handle)?;
        self.material_updates += 1;
        Ok(())
    }

    fn release(&mut self, handle: GpuHandle) {
        if !self.live.remove(&handle) {
            self.double_releases += 1;
            tracing::warn!("release of dead {} handle {}", handle.kind(), handle.id());
        }
    }

    fn render(&mut self, pass: &RenderPass<'_>) -> EngineResult<()> {
        self.check_context()?;
        if !self.surfaces.contains_key(&pass.surface) {
            return Err(EngineError::SurfaceUnavailable { width: 0, height: 0 });
        }
        self.passes += 1;
        self.last_pass = Some(PassRecord {
            frame: pass.frame,
            surface: pass.surface,
            draw_count: pass.draws.len() as u32,
            particle_count: pass.particle_count,
            view_projection: pass.view_projection,
        });
        Ok(())
    }
}
