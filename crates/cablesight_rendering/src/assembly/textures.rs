//! Shared procedural maps.
//!
//! Every map is generated and uploaded once per mount. Materials take their
//! own reference; the library drops its references after assembly so the
//! last material released frees the GPU copy.

use cablesight_procedural::{generate, TextureKind, TextureParams, TextureSeed};
use cablesight_shared::TextureSettings;

use crate::backend::RenderBackend;
use crate::error::EngineResult;
use crate::scene::SharedTexture;

/// Which generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSlot {
    /// Shield weave normal map.
    Braid = 0,
    /// Bump/roughness speckle.
    Speckle = 1,
    /// Worn armour.
    Metal = 2,
    /// Conductor strands.
    Copper = 3,
    /// Alpha-cut mesh.
    Mesh = 4,
    /// Electrical treeing overlay.
    Treeing = 5,
    /// Water intrusion overlay.
    Water = 6,
}

impl MapSlot {
    /// Every slot, in generation order.
    pub const ALL: [Self; 7] = [
        Self::Braid,
        Self::Speckle,
        Self::Metal,
        Self::Copper,
        Self::Mesh,
        Self::Treeing,
        Self::Water,
    ];

    const fn kind(self) -> TextureKind {
        match self {
            Self::Braid => TextureKind::braid(),
            Self::Speckle => TextureKind::speckle(),
            Self::Metal => TextureKind::metal_wear(),
            Self::Copper => TextureKind::copper_twist(),
            Self::Mesh => TextureKind::mesh_alpha(),
            Self::Treeing => TextureKind::treeing(),
            Self::Water => TextureKind::water_spots(),
        }
    }

    const fn side(self, settings: &TextureSettings) -> u32 {
        match self {
            Self::Braid => settings.braid,
            Self::Speckle => settings.speckle,
            Self::Metal => settings.metal,
            Self::Copper => settings.copper,
            Self::Mesh => settings.mesh,
            Self::Treeing => settings.treeing,
            Self::Water => settings.water,
        }
    }
}

/// Uploaded procedural maps for one mount.
#[derive(Debug, Default)]
pub struct TextureLibrary {
    maps: [Option<SharedTexture>; 7],
}

impl TextureLibrary {
    /// Library with every map disabled.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Generates and uploads every map.
    ///
    /// A map whose surface cannot be acquired is left out and its effect is
    /// disabled. With `seed` set the maps are reproducible.
    ///
    /// # Errors
    ///
    /// Terminal backend error; maps uploaded so far are released first.
    pub fn generate<B: RenderBackend + ?Sized>(
        backend: &mut B,
        settings: &TextureSettings,
        seed: Option<u64>,
    ) -> EngineResult<Self> {
        let mut library = Self::empty();
        for slot in MapSlot::ALL {
            let mut params = TextureParams::square(slot.side(settings));
            if let Some(seed) = seed {
                params = params.with_seed(TextureSeed::new(seed).derive(slot as u64));
            }
            let Some(texture) = generate(slot.kind(), params) else {
                tracing::debug!("{:?} map unavailable, effect disabled", slot);
                continue;
            };
            match SharedTexture::upload(backend, &texture) {
                Ok(shared) => library.maps[slot as usize] = Some(shared),
                Err(err) => {
                    library.release_all(backend);
                    return Err(err);
                }
            }
        }
        tracing::debug!("generated {} procedural maps", library.loaded());
        Ok(library)
    }

    /// The map in `slot`, if it was generated.
    #[must_use]
    pub fn get(&self, slot: MapSlot) -> Option<&SharedTexture> {
        self.maps[slot as usize].as_ref()
    }

    /// Number of maps present.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.maps.iter().flatten().count()
    }

    /// Drops the library's references. Returns how many GPU textures that freed
    /// (maps still held by materials stay alive).
    pub fn release_all<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> u32 {
        self.maps
            .iter_mut()
            .filter_map(Option::take)
            .map(|map| u32::from(map.release(backend)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn small() -> TextureSettings {
        TextureSettings {
            braid: 32,
            speckle: 32,
            metal: 32,
            copper: 32,
            mesh: 32,
            treeing: 32,
            water: 32,
            screen_width: 32,
            screen_height: 16,
        }
    }

    #[test]
    fn test_generates_every_map() {
        let mut backend = HeadlessBackend::new();
        let mut library = TextureLibrary::generate(&mut backend, &small(), Some(1)).unwrap();
        assert_eq!(library.loaded(), 7);
        assert_eq!(backend.live_counts().textures, 7);
        assert_eq!(library.release_all(&mut backend), 7);
        assert_eq!(backend.live_counts().textures, 0);
    }

    #[test]
    fn test_unacquirable_map_is_disabled() {
        let mut backend = HeadlessBackend::new();
        let settings = TextureSettings {
            water: 0,
            ..small()
        };
        let mut library = TextureLibrary::generate(&mut backend, &settings, Some(1)).unwrap();
        assert!(library.get(MapSlot::Water).is_none());
        assert_eq!(library.loaded(), 6);
        library.release_all(&mut backend);
    }

    #[test]
    fn test_upload_failure_releases_partial_library() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_allocation(crate::backend::ResourceKind::Texture);
        let result = TextureLibrary::generate(&mut backend, &small(), Some(1));
        assert!(result.is_err());
        assert_eq!(backend.live_counts().total(), 0);
    }
}
