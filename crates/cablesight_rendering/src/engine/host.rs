//! Host surface contract.
//!
//! The host is whatever embeds the engine: it reports the size of the area
//! the engine may draw into and accepts or drops render surfaces.

use crate::backend::SurfaceId;

/// The container a render surface is attached to.
pub trait HostSurface {
    /// Current drawable size in pixels. May be zero.
    fn size(&self) -> (u32, u32);

    /// Attaches a render surface.
    fn attach(&mut self, surface: SurfaceId);

    /// Detaches a render surface. Unknown surfaces are ignored.
    fn detach(&mut self, surface: SurfaceId);
}

/// In-memory host that tracks attached surfaces.
#[derive(Debug, Clone, Default)]
pub struct HostContainer {
    width: u32,
    height: u32,
    attached: Vec<SurfaceId>,
    attach_calls: u64,
}

impl HostContainer {
    /// Host of the given size with nothing attached.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            attached: Vec::new(),
            attach_calls: 0,
        }
    }

    /// Changes the reported size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Surfaces currently attached.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Returns true if `surface` is attached.
    #[must_use]
    pub fn is_attached(&self, surface: SurfaceId) -> bool {
        self.attached.contains(&surface)
    }

    /// Total attach calls received.
    #[must_use]
    pub const fn attach_calls(&self) -> u64 {
        self.attach_calls
    }
}

impl HostSurface for HostContainer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn attach(&mut self, surface: SurfaceId) {
        self.attach_calls += 1;
        if !self.attached.contains(&surface) {
            self.attached.push(surface);
        }
    }

    fn detach(&mut self, surface: SurfaceId) {
        self.attached.retain(|&s| s != surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_is_set_like() {
        let mut host = HostContainer::new(640, 480);
        host.attach(SurfaceId(1));
        host.attach(SurfaceId(1));
        assert_eq!(host.attached_count(), 1);
        assert_eq!(host.attach_calls(), 2);

        host.detach(SurfaceId(7));
        host.detach(SurfaceId(1));
        assert_eq!(host.attached_count(), 0);
        assert_eq!(host.size(), (640, 480));
    }
}
