//! Scene node description.

use gltf_json as json;

/// Identity transform.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// A node in the exported scene.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// 4x4 transform, written to the document as given.
    pub transform: [f32; 16],
    pub mesh: Option<json::Index<json::Mesh>>,
    pub children: Vec<json::Index<json::Node>>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mesh(mut self, mesh: json::Index<json::Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: [f32; 16]) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: json::Index<json::Node>) -> Self {
        self.children.push(child);
        self
    }

    /// Check if this is an identity transform.
    pub fn is_identity(&self) -> bool {
        self.transform == IDENTITY
    }
}
