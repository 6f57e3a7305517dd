//! # Materials
//!
//! A `MaterialLayer` is plain parameter data plus an optional shared map.
//! Maps are reference counted: several layers may sample the same texture,
//! and the GPU copy lives as long as the longest-lived holder. Releasing a
//! holder only decrements; the last release frees the GPU handle.

use std::collections::BTreeMap;
use std::rc::Rc;

use cablesight_procedural::RasterTexture;

use crate::backend::{GpuHandle, RenderBackend};
use crate::error::EngineResult;

#[derive(Debug)]
struct TextureResource {
    label: &'static str,
    handle: GpuHandle,
    width: u32,
    height: u32,
}

/// Reference-counted handle to an uploaded texture.
///
/// Cloning shares the texture. Each holder must eventually call
/// [`SharedTexture::release`]; dropping a holder without releasing it
/// leaves the GPU copy alive until another holder releases last.
#[derive(Debug, Clone)]
pub struct SharedTexture(Rc<TextureResource>);

impl SharedTexture {
    /// Uploads `texture` and wraps the handle.
    ///
    /// # Errors
    ///
    /// Terminal resource error from the backend.
    pub fn upload<B: RenderBackend + ?Sized>(backend: &mut B, texture: &RasterTexture) -> EngineResult<Self> {
        let handle = backend.create_texture(texture)?;
        Ok(Self(Rc::new(TextureResource {
            label: texture.label(),
            handle,
            width: texture.width(),
            height: texture.height(),
        })))
    }

    /// GPU handle.
    #[must_use]
    pub fn handle(&self) -> GpuHandle {
        self.0.handle
    }

    /// Label of the generated texture.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.0.label
    }

    /// Pixel size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.0.width, self.0.height)
    }

    /// Number of holders.
    #[must_use]
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Gives up this holder. Returns true if it was the last one and the
    /// GPU texture was released.
    pub fn release<B: RenderBackend + ?Sized>(self, backend: &mut B) -> bool {
        match Rc::try_unwrap(self.0) {
            Ok(resource) => {
                backend.release(resource.handle);
                true
            }
            Err(_) => false,
        }
    }
}

impl PartialEq for SharedTexture {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Shader uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar.
    Float(f32),
    /// Three-component vector.
    Vec3([f32; 3]),
}

/// Named shader uniforms, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderUniforms(BTreeMap<&'static str, UniformValue>);

impl ShaderUniforms {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar uniform.
    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.0.insert(name, UniformValue::Float(value));
    }

    /// Sets a vector uniform.
    pub fn set_vec3(&mut self, name: &'static str, value: [f32; 3]) {
        self.0.insert(name, UniformValue::Vec3(value));
    }

    /// Looks up a uniform.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.0.get(name).copied()
    }

    /// Looks up a scalar uniform.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    /// Copies every uniform from `other`, overwriting existing names.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name, *value);
        }
    }

    /// Number of uniforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no uniforms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Surface parameters of one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialLayer {
    /// Base color (linear RGB).
    pub base_color: [f32; 3],
    /// Microfacet roughness.
    pub roughness: f32,
    /// Metalness.
    pub metalness: f32,
    /// Opacity; below 1 the layer is blended.
    pub opacity: f32,
    /// Emissive color.
    pub emissive: [f32; 3],
    /// Emissive multiplier.
    pub emissive_intensity: f32,
    /// Map tiling along (u, v).
    pub map_repeat: [f32; 2],
    /// Free-form shader uniforms.
    pub uniforms: ShaderUniforms,
    map: Option<SharedTexture>,
}

impl MaterialLayer {
    /// Opaque, dielectric, unmapped layer.
    #[must_use]
    pub fn new(base_color: [f32; 3]) -> Self {
        Self {
            base_color,
            roughness: 0.5,
            metalness: 0.0,
            opacity: 1.0,
            emissive: [0.0; 3],
            emissive_intensity: 0.0,
            map_repeat: [1.0, 1.0],
            uniforms: ShaderUniforms::new(),
            map: None,
        }
    }

    /// Sets roughness and metalness.
    #[must_use]
    pub fn with_surface(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    /// Sets opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Sets emissive color and intensity.
    #[must_use]
    pub fn with_emissive(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity.max(0.0);
        self
    }

    /// Attaches a shared map (if the map was generated) with a tiling factor.
    ///
    /// A missing map leaves the layer unmapped: the effect is disabled.
    #[must_use]
    pub fn with_map(mut self, map: Option<&SharedTexture>, repeat: [f32; 2]) -> Self {
        self.map = map.cloned();
        self.map_repeat = repeat;
        self
    }

    /// The shared map, if any.
    #[must_use]
    pub fn map(&self) -> Option<&SharedTexture> {
        self.map.as_ref()
    }

    /// Returns true if the layer must be alpha blended.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Gives up this layer's hold on its map. Returns true if the map's GPU
    /// texture was freed as a result.
    pub fn release_map<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> bool {
        self.map.take().is_some_and(|map| map.release(backend))
    }
}
