//! PBR material description.

use serde::{Deserialize, Serialize};

/// A metallic-roughness material.
///
/// Texture slots hold indices into the exporter's texture list. They are
/// resolved to glTF textures when the material is added to a document; a slot
/// that fails to resolve is left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    /// Base color factor (RGBA).
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub base_color_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub metallic_roughness_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            base_color_texture: None,
            normal_texture: None,
            metallic_roughness_texture: None,
        }
    }
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_base_color_texture(mut self, texture: usize) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_normal_texture(mut self, texture: usize) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    pub fn with_metallic_roughness_texture(mut self, texture: usize) -> Self {
        self.metallic_roughness_texture = Some(texture);
        self
    }
}
