//! Shared types used throughout the library.

mod material;
mod node;
mod texture;

pub use material::Material;
pub use node::Node;
pub use texture::{TextureData, TextureSource};

use bytemuck::{Pod, Zeroable};
use gltf_json as json;
use serde::{Deserialize, Serialize};
use std::mem;

/// One exported corner: position, normal and texture coordinate.
///
/// The layout is `#[repr(C)]` so the vertex array can be copied verbatim into
/// an interleaved glTF buffer view.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// Size of one interleaved vertex in bytes.
    pub const STRIDE: usize = mem::size_of::<Self>();
    /// Byte offset of the position field.
    pub const POSITION_OFFSET: usize = mem::offset_of!(Vertex, position);
    /// Byte offset of the normal field.
    pub const NORMAL_OFFSET: usize = mem::offset_of!(Vertex, normal);
    /// Byte offset of the texcoord field.
    pub const TEXCOORD_OFFSET: usize = mem::offset_of!(Vertex, texcoord);

    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Primitive topology of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl From<PrimitiveMode> for json::mesh::Mode {
    fn from(mode: PrimitiveMode) -> Self {
        match mode {
            PrimitiveMode::Points => json::mesh::Mode::Points,
            PrimitiveMode::Lines => json::mesh::Mode::Lines,
            PrimitiveMode::LineLoop => json::mesh::Mode::LineLoop,
            PrimitiveMode::LineStrip => json::mesh::Mode::LineStrip,
            PrimitiveMode::Triangles => json::mesh::Mode::Triangles,
            PrimitiveMode::TriangleStrip => json::mesh::Mode::TriangleStrip,
            PrimitiveMode::TriangleFan => json::mesh::Mode::TriangleFan,
        }
    }
}

/// Default compression level (0-10). Seven is the most stable speed trade-off.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 7;

/// Highest accepted compression level.
pub const MAX_COMPRESSION_LEVEL: u8 = 10;

/// A triangle mesh ready to be added to a document.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Mesh name.
    pub name: String,
    /// Vertex data, one entry per corner.
    pub vertices: Vec<Vertex>,
    /// Indices into `vertices`.
    pub indices: Vec<u32>,
    /// Material used by the primitive.
    pub material: Option<json::Index<json::Material>>,
    /// Primitive topology.
    pub mode: PrimitiveMode,
    /// Try the compressed encoding first.
    pub use_compression: bool,
    /// Compression aggressiveness, 0-10 (higher = smaller and slower).
    pub compression_level: u8,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            material: None,
            mode: PrimitiveMode::Triangles,
            use_compression: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a mesh over assembled corners with the identity index buffer `0..N`.
    pub fn from_vertices(name: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self {
            name: name.into(),
            vertices,
            indices,
            ..Self::default()
        }
    }

    pub fn with_material(mut self, material: json::Index<json::Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the compression flag and level. The level is clamped to 0-10.
    pub fn with_compression(mut self, enabled: bool, level: u8) -> Self {
        self.use_compression = enabled;
        self.compression_level = level.min(MAX_COMPRESSION_LEVEL);
        self
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of complete triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the mesh is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Bounds of the vertex positions, `None` for an empty mesh.
    pub fn position_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Grow the box component-wise so it contains `p`.
    pub fn include(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn from_points(mut points: impl Iterator<Item = [f32; 3]>) -> Option<Self> {
        let first = points.next()?;
        let mut bounds = Self::new(first, first);
        for p in points {
            bounds.include(p);
        }
        Some(bounds)
    }

    pub fn dimensions(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::STRIDE, 32);
        assert_eq!(Vertex::POSITION_OFFSET, 0);
        assert_eq!(Vertex::NORMAL_OFFSET, 12);
        assert_eq!(Vertex::TEXCOORD_OFFSET, 24);
    }

    #[test]
    fn test_identity_indices() {
        let vertices = vec![Vertex::default(); 5];
        let mesh = Mesh::from_vertices("quad", vertices);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.use_compression);
        assert_eq!(mesh.compression_level, DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_compression_level_clamped() {
        let mesh = Mesh::new("m").with_compression(true, 42);
        assert_eq!(mesh.compression_level, MAX_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = BoundingBox::from_points(
            [[1.0, -2.0, 3.0], [-1.0, 5.0, 0.5], [0.0, 0.0, 4.0]].into_iter(),
        )
        .unwrap();
        assert_eq!(bounds.min, [-1.0, -2.0, 0.5]);
        assert_eq!(bounds.max, [1.0, 5.0, 4.0]);
        assert_eq!(bounds.dimensions(), [2.0, 7.0, 3.5]);
    }

    #[test]
    fn test_bounds_empty() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
        assert!(Mesh::new("empty").position_bounds().is_none());
    }
}
