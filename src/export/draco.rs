//! Draco geometry compression.
//!
//! A mesh is declared to the codec with a fixed attribute layout (position,
//! normal, texture coordinate) and one face per three indices. The codec's
//! output is an opaque blob that the document references through the
//! `KHR_draco_mesh_compression` primitive extension.

use crate::error::{ExportError, Result};
use crate::profile::ScopedTimer;
use crate::types::{Mesh, MAX_COMPRESSION_LEVEL};

/// Name of the glTF extension carrying compressed primitives.
pub const EXTENSION_NAME: &str = "KHR_draco_mesh_compression";

/// Compressed attribute id of POSITION.
pub const POSITION_ID: u32 = 0;
/// Compressed attribute id of NORMAL.
pub const NORMAL_ID: u32 = 1;
/// Compressed attribute id of TEXCOORD_0.
pub const TEXCOORD_ID: u32 = 2;

/// Encoder configuration for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub position_bits: u8,
    pub normal_bits: u8,
    pub texcoord_bits: u8,
    /// 0 (slowest, smallest) to 10 (fastest).
    pub encoding_speed: u8,
    /// 0 (slowest, smallest) to 10 (fastest).
    pub decoding_speed: u8,
}

impl CompressionSettings {
    /// Settings for a compression level (0-10, clamped).
    pub fn for_level(level: u8) -> Self {
        let speed = MAX_COMPRESSION_LEVEL - level.min(MAX_COMPRESSION_LEVEL);
        Self {
            position_bits: 14,
            normal_bits: 10,
            texcoord_bits: 12,
            encoding_speed: speed,
            decoding_speed: speed,
        }
    }
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self::for_level(crate::types::DEFAULT_COMPRESSION_LEVEL)
    }
}

/// Which vertex property an attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSemantic {
    Position,
    Normal,
    TexCoord,
}

/// One declared attribute: `count` values of `components` float32s each.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryAttribute {
    pub id: u32,
    pub semantic: AttributeSemantic,
    pub components: usize,
    pub quantization_bits: u8,
    /// Flat values, `count * components` long.
    pub values: Vec<f32>,
}

impl GeometryAttribute {
    pub fn count(&self) -> usize {
        self.values.len() / self.components
    }
}

/// A mesh declared in the codec's terms.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPayload {
    pub vertex_count: usize,
    /// Position, normal, texcoord in that order.
    pub attributes: Vec<GeometryAttribute>,
    pub faces: Vec<[u32; 3]>,
}

impl GeometryPayload {
    /// Declare the fixed attribute layout for `mesh`.
    ///
    /// A trailing partial face is dropped.
    pub fn from_mesh(mesh: &Mesh, settings: &CompressionSettings) -> Self {
        let vertex_count = mesh.vertices.len();
        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut normals = Vec::with_capacity(vertex_count * 3);
        let mut texcoords = Vec::with_capacity(vertex_count * 2);
        for v in &mesh.vertices {
            positions.extend_from_slice(&v.position);
            normals.extend_from_slice(&v.normal);
            texcoords.extend_from_slice(&v.texcoord);
        }

        let faces = mesh
            .indices
            .chunks_exact(3)
            .map(|f| [f[0], f[1], f[2]])
            .collect();

        Self {
            vertex_count,
            attributes: vec![
                GeometryAttribute {
                    id: POSITION_ID,
                    semantic: AttributeSemantic::Position,
                    components: 3,
                    quantization_bits: settings.position_bits,
                    values: positions,
                },
                GeometryAttribute {
                    id: NORMAL_ID,
                    semantic: AttributeSemantic::Normal,
                    components: 3,
                    quantization_bits: settings.normal_bits,
                    values: normals,
                },
                GeometryAttribute {
                    id: TEXCOORD_ID,
                    semantic: AttributeSemantic::TexCoord,
                    components: 2,
                    quantization_bits: settings.texcoord_bits,
                    values: texcoords,
                },
            ],
            faces,
        }
    }

    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<&GeometryAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    /// Check that the payload is something a codec can be handed.
    pub fn validate(&self) -> Result<()> {
        if self.vertex_count == 0 || self.faces.is_empty() {
            return Err(ExportError::InvalidInput(
                "mesh has no vertices or no complete faces".to_string(),
            ));
        }
        if let Some(face) = self
            .faces
            .iter()
            .find(|f| f.iter().any(|&i| i as usize >= self.vertex_count))
        {
            return Err(ExportError::InvalidInput(format!(
                "face {:?} references a vertex beyond {}",
                face, self.vertex_count
            )));
        }
        Ok(())
    }
}

/// A geometry codec backend.
pub trait GeometryEncoder {
    fn encode(&self, payload: &GeometryPayload, settings: &CompressionSettings) -> Result<Vec<u8>>;
}

/// Backend used when the crate is built without a codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEncoder;

impl GeometryEncoder for UnavailableEncoder {
    fn encode(&self, _: &GeometryPayload, _: &CompressionSettings) -> Result<Vec<u8>> {
        Err(ExportError::Compression(
            "built without the `draco` feature".to_string(),
        ))
    }
}

/// Draco encoder backed by `draco-oxide`.
///
/// Quantization and speed are chosen by the library itself; the requested
/// settings are only reported.
#[cfg(feature = "draco")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DracoEncoder;

#[cfg(feature = "draco")]
impl GeometryEncoder for DracoEncoder {
    fn encode(&self, payload: &GeometryPayload, settings: &CompressionSettings) -> Result<Vec<u8>> {
        use draco_oxide::core::attribute::AttributeDomain;
        use draco_oxide::encode;
        use draco_oxide::prelude::{AttributeType, ConfigType, MeshBuilder, NdVector};

        log::debug!(
            "draco: {} vertices, {} faces, quantization {}/{}/{} bits, speed {}/{}",
            payload.vertex_count,
            payload.faces.len(),
            settings.position_bits,
            settings.normal_bits,
            settings.texcoord_bits,
            settings.encoding_speed,
            settings.decoding_speed
        );

        let vec3 = |semantic| -> Result<Vec<NdVector<3, f32>>> {
            let attribute = payload
                .attribute(semantic)
                .ok_or_else(|| ExportError::Compression(format!("missing {:?}", semantic)))?;
            Ok(attribute
                .values
                .chunks_exact(3)
                .map(|c| NdVector::from([c[0], c[1], c[2]]))
                .collect())
        };
        let positions = vec3(AttributeSemantic::Position)?;
        let normals = vec3(AttributeSemantic::Normal)?;
        let texcoords: Vec<NdVector<2, f32>> = payload
            .attribute(AttributeSemantic::TexCoord)
            .map(|a| {
                a.values
                    .chunks_exact(2)
                    .map(|c| NdVector::from([c[0], c[1]]))
                    .collect()
            })
            .unwrap_or_default();

        let mut builder = MeshBuilder::new();
        builder.set_connectivity_attribute(
            payload
                .faces
                .iter()
                .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
                .collect(),
        );
        let pos_id = builder.add_attribute(
            positions,
            AttributeType::Position,
            AttributeDomain::Position,
            vec![],
        );
        builder.add_attribute(
            normals,
            AttributeType::Normal,
            AttributeDomain::Position,
            vec![pos_id],
        );
        builder.add_attribute(
            texcoords,
            AttributeType::TextureCoordinate,
            AttributeDomain::Position,
            vec![pos_id],
        );

        let mesh = builder
            .build()
            .map_err(|e| ExportError::Compression(e.to_string()))?;

        // Accessor counts describe the uncompressed vertex list, so the built
        // mesh must keep every point.
        let point_count = mesh
            .get_attributes()
            .iter()
            .map(|a| a.len())
            .max()
            .unwrap_or(0);
        if point_count != payload.vertex_count {
            return Err(ExportError::Compression(format!(
                "codec kept {} of {} vertices",
                point_count, payload.vertex_count
            )));
        }

        let mut buffer = Vec::new();
        encode::encode(mesh, &mut buffer, encode::Config::default())
            .map_err(|e| ExportError::Compression(e.to_string()))?;
        Ok(buffer)
    }
}

/// Converts meshes to compressed blobs.
pub struct GeometryCompressor {
    encoder: Box<dyn GeometryEncoder>,
}

impl Default for GeometryCompressor {
    fn default() -> Self {
        #[cfg(feature = "draco")]
        let encoder: Box<dyn GeometryEncoder> = Box::new(DracoEncoder);
        #[cfg(not(feature = "draco"))]
        let encoder: Box<dyn GeometryEncoder> = Box::new(UnavailableEncoder);
        Self { encoder }
    }
}

impl GeometryCompressor {
    pub fn new(encoder: Box<dyn GeometryEncoder>) -> Self {
        Self { encoder }
    }

    /// Compress `mesh` at its own compression level.
    ///
    /// Returns an empty vector when encoding fails; the caller falls back to
    /// uncompressed buffers.
    pub fn compress(&self, mesh: &Mesh) -> Vec<u8> {
        let _timer = ScopedTimer::new("compress mesh");
        let settings = CompressionSettings::for_level(mesh.compression_level);
        let payload = GeometryPayload::from_mesh(mesh, &settings);

        let result = payload
            .validate()
            .and_then(|_| self.encoder.encode(&payload, &settings));
        match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Draco encoding failed for mesh '{}': {}", mesh.name, e);
                Vec::new()
            }
        }
    }
}
