//! glTF asset graph construction.
//!
//! [`DocumentBuilder`] grows a `gltf_json::Root` append-only: every index it
//! hands out refers to an entry that already exists, and nothing is reordered
//! afterwards. Meshes are encoded either as interleaved buffers with standard
//! accessors or, when compression succeeds, as a Draco blob referenced by the
//! `KHR_draco_mesh_compression` primitive extension.

use super::buffer::{BufferAllocator, ViewKind};
use super::draco::{self, GeometryCompressor};
use super::texture::TextureExporter;
use crate::types::{BoundingBox, Material, Mesh, Node, TextureData, Vertex};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use std::collections::BTreeMap;

/// Generator string written into the asset metadata.
pub const GENERATOR: &str = concat!("gltf-compress ", env!("CARGO_PKG_VERSION"));

/// A finished document: the JSON graph plus the bytes of buffer 0.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: json::Root,
    pub buffer: Vec<u8>,
}

impl Document {
    /// Whether any primitive uses the compression extension.
    pub fn uses_compression(&self) -> bool {
        self.root
            .extensions_used
            .iter()
            .any(|e| e == draco::EXTENSION_NAME)
    }
}

/// Builds one document per export.
pub struct DocumentBuilder {
    root: json::Root,
    buffer: BufferAllocator,
    textures: TextureExporter,
    compressor: GeometryCompressor,
    compressed_meshes: usize,
}

impl DocumentBuilder {
    pub fn new(textures: TextureExporter) -> Self {
        Self::with_compressor(textures, GeometryCompressor::default())
    }

    pub fn with_compressor(textures: TextureExporter, compressor: GeometryCompressor) -> Self {
        let root = json::Root {
            asset: json::Asset {
                generator: Some(GENERATOR.to_string()),
                version: "2.0".to_string(),
                ..Default::default()
            },
            scenes: vec![json::Scene {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some("Scene".to_string()),
                nodes: Vec::new(),
            }],
            scene: Some(json::Index::new(0)),
            ..Default::default()
        };

        Self {
            root,
            buffer: BufferAllocator::new(),
            textures,
            compressor,
            compressed_meshes: 0,
        }
    }

    /// The graph built so far.
    pub fn root(&self) -> &json::Root {
        &self.root
    }

    pub fn textures(&self) -> &TextureExporter {
        &self.textures
    }

    /// Add a texture to the texture list and return its list index.
    pub fn push_texture(&mut self, texture: TextureData) -> usize {
        self.textures.push(texture)
    }

    /// Append bytes to the buffer and record a buffer view over them.
    pub fn create_buffer_view(
        &mut self,
        bytes: &[u8],
        kind: ViewKind,
    ) -> json::Index<json::buffer::View> {
        if self.root.buffers.is_empty() {
            self.root.buffers.push(json::Buffer {
                byte_length: USize64(0),
                name: Some("buffer".to_string()),
                uri: None,
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
        let view = self.buffer.append(bytes, kind);
        push(&mut self.root.buffer_views, view)
    }

    /// Resolve a texture-list entry to a new image/texture pair.
    ///
    /// Returns `None` (and leaves the document untouched) when the index is out
    /// of range or the image cannot be decoded or written.
    pub fn add_texture(&mut self, index: usize) -> Option<json::Index<json::Texture>> {
        let texture = self.textures.get(index)?;
        let name = texture.name.clone();

        let exported = match self.textures.export_image(index) {
            Ok(exported) => exported,
            Err(e) => {
                log::warn!("Skipping texture {} ('{}'): {}", index, name, e);
                return None;
            }
        };

        let image = push(
            &mut self.root.images,
            json::Image {
                buffer_view: None,
                mime_type: Some(json::image::MimeType(
                    self.textures.format().mime_type().to_string(),
                )),
                name: Some(name),
                uri: Some(exported.file_name),
                extensions: Default::default(),
                extras: Default::default(),
            },
        );
        let sampler = self.default_sampler();
        let texture = push(
            &mut self.root.textures,
            json::Texture {
                name: None,
                sampler: Some(sampler),
                source: image,
                extensions: Default::default(),
                extras: Default::default(),
            },
        );
        log::debug!("Texture list entry {} -> texture {}", index, texture.value());
        Some(texture)
    }

    /// Sampler 0, created the first time a texture needs it.
    fn default_sampler(&mut self) -> json::Index<json::texture::Sampler> {
        if self.root.samplers.is_empty() {
            self.root.samplers.push(json::texture::Sampler {
                mag_filter: Some(Valid(json::texture::MagFilter::Linear)),
                min_filter: Some(Valid(json::texture::MinFilter::LinearMipmapLinear)),
                name: None,
                wrap_s: Valid(json::texture::WrappingMode::Repeat),
                wrap_t: Valid(json::texture::WrappingMode::Repeat),
                extensions: Default::default(),
                extras: Default::default(),
            });
        }
        json::Index::new(0)
    }

    /// Add a metallic-roughness material, resolving its texture slots.
    pub fn add_material(&mut self, material: &Material) -> json::Index<json::Material> {
        let mut pbr = json::material::PbrMetallicRoughness {
            base_color_factor: json::material::PbrBaseColorFactor(material.base_color),
            metallic_factor: json::material::StrengthFactor(material.metallic),
            roughness_factor: json::material::StrengthFactor(material.roughness),
            ..Default::default()
        };

        if let Some(texture) = material.base_color_texture.and_then(|i| self.add_texture(i)) {
            pbr.base_color_texture = Some(texture_info(texture));
        }
        if let Some(texture) = material
            .metallic_roughness_texture
            .and_then(|i| self.add_texture(i))
        {
            pbr.metallic_roughness_texture = Some(texture_info(texture));
        }
        let normal_texture = material
            .normal_texture
            .and_then(|i| self.add_texture(i))
            .map(|index| json::material::NormalTexture {
                index,
                scale: 1.0,
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            });

        push(
            &mut self.root.materials,
            json::Material {
                name: Some(material.name.clone()),
                pbr_metallic_roughness: pbr,
                normal_texture,
                ..Default::default()
            },
        )
    }

    /// Add a mesh with a single primitive.
    ///
    /// With compression requested, the mesh is compressed first; an empty
    /// payload falls back to the uncompressed encoding.
    pub fn add_mesh(&mut self, mesh: &Mesh) -> json::Index<json::Mesh> {
        let mut primitive = if mesh.use_compression {
            let payload = self.compressor.compress(mesh);
            if payload.is_empty() {
                log::warn!(
                    "Compression failed for mesh '{}', writing uncompressed buffers",
                    mesh.name
                );
                self.uncompressed_primitive(mesh)
            } else {
                self.compressed_primitive(mesh, &payload)
            }
        } else {
            self.uncompressed_primitive(mesh)
        };

        primitive.mode = Valid(mesh.mode.into());
        primitive.material =
            existing(&self.root.materials, mesh.material, "material", &mesh.name);

        push(
            &mut self.root.meshes,
            json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some(mesh.name.clone()),
                primitives: vec![primitive],
                weights: None,
            },
        )
    }

    fn uncompressed_primitive(&mut self, mesh: &Mesh) -> json::mesh::Primitive {
        let mut primitive = empty_primitive();

        if !mesh.vertices.is_empty() {
            let view = self.create_buffer_view(
                bytemuck::cast_slice(&mesh.vertices),
                ViewKind::Vertices {
                    stride: Vertex::STRIDE,
                },
            );
            self.add_vertex_accessors(&mut primitive, mesh, Some(view));
        }

        if !mesh.indices.is_empty() {
            let view =
                self.create_buffer_view(bytemuck::cast_slice(&mesh.indices), ViewKind::Indices);
            primitive.indices = Some(self.add_index_accessor(mesh, Some(view)));
        }

        primitive
    }

    fn compressed_primitive(&mut self, mesh: &Mesh, payload: &[u8]) -> json::mesh::Primitive {
        let view = self.create_buffer_view(payload, ViewKind::Opaque);

        // Accessors describe the decoded data; the bytes live in the blob.
        let mut primitive = empty_primitive();
        self.add_vertex_accessors(&mut primitive, mesh, None);
        primitive.indices = Some(self.add_index_accessor(mesh, None));

        let extension = serde_json::json!({
            "bufferView": view.value(),
            "attributes": {
                "POSITION": draco::POSITION_ID,
                "NORMAL": draco::NORMAL_ID,
                "TEXCOORD_0": draco::TEXCOORD_ID,
            },
        });
        let mut extensions = json::extensions::mesh::Primitive::default();
        extensions
            .others
            .insert(draco::EXTENSION_NAME.to_string(), extension);
        primitive.extensions = Some(extensions);

        self.compressed_meshes += 1;
        primitive
    }

    fn add_vertex_accessors(
        &mut self,
        primitive: &mut json::mesh::Primitive,
        mesh: &Mesh,
        view: Option<json::Index<json::buffer::View>>,
    ) {
        let count = mesh.vertices.len();
        let bounds = mesh.position_bounds();
        // Interleaved offsets only make sense inside a real view.
        let offset = |field: usize| view.map(|_| field);

        let position = self.add_accessor(VertexAccessor {
            view,
            byte_offset: offset(Vertex::POSITION_OFFSET),
            count,
            type_: json::accessor::Type::Vec3,
            component_type: json::accessor::ComponentType::F32,
            bounds,
        });
        let normal = self.add_accessor(VertexAccessor {
            view,
            byte_offset: offset(Vertex::NORMAL_OFFSET),
            count,
            type_: json::accessor::Type::Vec3,
            component_type: json::accessor::ComponentType::F32,
            bounds: None,
        });
        let texcoord = self.add_accessor(VertexAccessor {
            view,
            byte_offset: offset(Vertex::TEXCOORD_OFFSET),
            count,
            type_: json::accessor::Type::Vec2,
            component_type: json::accessor::ComponentType::F32,
            bounds: None,
        });

        primitive
            .attributes
            .insert(Valid(json::mesh::Semantic::Positions), position);
        primitive
            .attributes
            .insert(Valid(json::mesh::Semantic::Normals), normal);
        primitive
            .attributes
            .insert(Valid(json::mesh::Semantic::TexCoords(0)), texcoord);
    }

    fn add_index_accessor(
        &mut self,
        mesh: &Mesh,
        view: Option<json::Index<json::buffer::View>>,
    ) -> json::Index<json::Accessor> {
        self.add_accessor(VertexAccessor {
            view,
            byte_offset: view.map(|_| 0),
            count: mesh.indices.len(),
            type_: json::accessor::Type::Scalar,
            component_type: json::accessor::ComponentType::U32,
            bounds: None,
        })
    }

    fn add_accessor(&mut self, desc: VertexAccessor) -> json::Index<json::Accessor> {
        push(
            &mut self.root.accessors,
            json::Accessor {
                buffer_view: desc.view,
                byte_offset: desc.byte_offset.map(|o| USize64(o as u64)),
                count: USize64(desc.count as u64),
                component_type: Valid(json::accessor::GenericComponentType(desc.component_type)),
                extensions: Default::default(),
                extras: Default::default(),
                type_: Valid(desc.type_),
                min: desc.bounds.map(|b| json::Value::from(b.min.to_vec())),
                max: desc.bounds.map(|b| json::Value::from(b.max.to_vec())),
                name: None,
                normalized: false,
                sparse: None,
            },
        )
    }

    /// Add a node and make it a root of the scene.
    ///
    /// References to meshes or nodes that do not exist yet are dropped.
    pub fn add_node(&mut self, node: &Node) -> json::Index<json::Node> {
        let mesh = existing(&self.root.meshes, node.mesh, "mesh", &node.name);
        let children: Vec<_> = node
            .children
            .iter()
            .filter_map(|&child| {
                existing(&self.root.nodes, Some(child), "child node", &node.name)
            })
            .collect();

        let index = push(
            &mut self.root.nodes,
            json::Node {
                camera: None,
                children: if children.is_empty() {
                    None
                } else {
                    Some(children)
                },
                extensions: Default::default(),
                extras: Default::default(),
                matrix: Some(node.transform),
                mesh,
                name: Some(node.name.clone()),
                rotation: None,
                scale: None,
                translation: None,
                skin: None,
                weights: None,
            },
        );
        self.root.scenes[0].nodes.push(index);
        index
    }

    /// Number of meshes that ended up compressed.
    pub fn compressed_mesh_count(&self) -> usize {
        self.compressed_meshes
    }

    /// Declare extensions and close the buffer.
    pub fn finish(mut self) -> Document {
        if self.compressed_meshes > 0 {
            let name = draco::EXTENSION_NAME.to_string();
            self.root.extensions_used.push(name.clone());
            self.root.extensions_required.push(name);
        }
        if let Some(buffer) = self.root.buffers.first_mut() {
            buffer.byte_length = USize64(self.buffer.len() as u64);
        }

        Document {
            root: self.root,
            buffer: self.buffer.into_bytes(),
        }
    }
}

struct VertexAccessor {
    view: Option<json::Index<json::buffer::View>>,
    byte_offset: Option<usize>,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    bounds: Option<BoundingBox>,
}

/// Append to an arena list and return the new entry's index.
fn push<T>(list: &mut Vec<T>, value: T) -> json::Index<T> {
    let index = json::Index::new(list.len() as u32);
    list.push(value);
    index
}

/// Keep `index` only if it refers to an entry already in `list`.
fn existing<T>(
    list: &[T],
    index: Option<json::Index<T>>,
    what: &str,
    owner: &str,
) -> Option<json::Index<T>> {
    let index = index?;
    if index.value() < list.len() {
        Some(index)
    } else {
        log::warn!(
            "Dropping {} reference {} from '{}': only {} exist",
            what,
            index.value(),
            owner,
            list.len()
        );
        None
    }
}

fn empty_primitive() -> json::mesh::Primitive {
    json::mesh::Primitive {
        attributes: BTreeMap::new(),
        extensions: Default::default(),
        extras: Default::default(),
        indices: None,
        material: None,
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

fn texture_info(index: json::Index<json::Texture>) -> json::texture::Info {
    json::texture::Info {
        index,
        tex_coord: 0,
        extensions: Default::default(),
        extras: Default::default(),
    }
}
