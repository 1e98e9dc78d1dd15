//! One-call export from flat mesh arrays to files on disk.

use crate::assembler::{assemble_vertices, MeshArrays};
use crate::error::Result;
use crate::export::archive;
use crate::export::{write_document, DocumentBuilder, DocumentFormat, GeometryCompressor};
use crate::export::{ImageFormat, TextureExporter};
use crate::profile::ScopedTimer;
use crate::types::{
    Material, Mesh, Node, TextureData, DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Caller-supplied mesh data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Mesh and node name.
    pub name: String,
    /// Position triples (Z-up).
    #[serde(alias = "vertices")]
    pub positions: Vec<f32>,
    /// Normal triples, one per corner (Z-up).
    pub normals: Vec<f32>,
    /// UV pairs, one per corner.
    pub uvs: Option<Vec<f32>>,
    /// Position index per corner.
    pub indices: Vec<u32>,
    pub textures: Vec<TextureData>,
    /// Materials to build. The mesh uses the first one.
    pub materials: Vec<Material>,
}

/// Export configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Where texture files go. Defaults to the output file's directory.
    pub export_dir: Option<PathBuf>,
    /// Document container. Defaults to the output file's extension.
    pub format: Option<DocumentFormat>,
    pub use_compression: bool,
    /// 0-10, higher is smaller and slower.
    pub compression_level: u8,
    pub image_format: ImageFormat,
    /// Pack document and textures into a `.zip` next to the output file.
    pub archive: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            export_dir: None,
            format: None,
            use_compression: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            image_format: ImageFormat::default(),
            archive: false,
        }
    }
}

impl ExportOptions {
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enable or disable compression. The level is clamped to 0-10.
    pub fn with_compression(mut self, enabled: bool, level: u8) -> Self {
        self.use_compression = enabled;
        self.compression_level = level.min(MAX_COMPRESSION_LEVEL);
        self
    }

    pub fn with_png(mut self) -> Self {
        self.image_format = ImageFormat::Png;
        self
    }

    /// Encode textures as JPEG. Quality is clamped to 0-100.
    pub fn with_jpeg(mut self, quality: u8) -> Self {
        self.image_format = ImageFormat::Jpeg {
            quality: quality.min(100),
        };
        self
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Written document. Removed again when `archive` is set.
    pub document: PathBuf,
    pub archive: Option<PathBuf>,
    pub vertex_count: usize,
    pub compressed: bool,
    /// Image entries in the document.
    pub image_count: usize,
}

/// Material built when the request carries none.
///
/// Wires texture list entries 0, 1 and 2 to base color, normal and
/// metallic-roughness; entries that do not exist stay unset.
pub fn default_material() -> Material {
    Material {
        name: "Material".to_string(),
        metallic: 0.0,
        roughness: 0.8,
        ..Material::default()
    }
    .with_base_color_texture(0)
    .with_normal_texture(1)
    .with_metallic_roughness_texture(2)
}

/// Export `request` to `output` with the default geometry codec.
pub fn export(
    request: &ExportRequest,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    export_with(request, output, options, GeometryCompressor::default())
}

/// Export `request` to `output` using `compressor` for compressed meshes.
pub fn export_with(
    request: &ExportRequest,
    output: &Path,
    options: &ExportOptions,
    compressor: GeometryCompressor,
) -> Result<ExportSummary> {
    let _timer = ScopedTimer::new("export");

    let export_dir = options.export_dir.clone().unwrap_or_else(|| {
        output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    if !export_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&export_dir)?;
    }

    let vertices = {
        let _timer = ScopedTimer::new("assemble vertices");
        assemble_vertices(MeshArrays {
            positions: &request.positions,
            normals: &request.normals,
            uvs: request.uvs.as_deref().unwrap_or(&[]),
            indices: &request.indices,
        })
    };
    let vertex_count = vertices.len();

    let mut builder = DocumentBuilder::with_compressor(
        TextureExporter::new(&export_dir, options.image_format),
        compressor,
    );
    for texture in &request.textures {
        builder.push_texture(texture.clone());
    }

    let fallback = [default_material()];
    let materials: &[Material] = if request.materials.is_empty() {
        &fallback
    } else {
        &request.materials
    };
    let mut material = None;
    for m in materials {
        let index = builder.add_material(m);
        material.get_or_insert(index);
    }

    let mut mesh = Mesh::from_vertices(request.name.clone(), vertices)
        .with_compression(options.use_compression, options.compression_level);
    mesh.material = material;
    let mesh = builder.add_mesh(&mesh);
    builder.add_node(&Node::new(request.name.clone()).with_mesh(mesh));

    let texture_paths = builder.textures().written_paths();
    let document = builder.finish();
    let compressed = document.uses_compression();
    let image_count = document.root.images.len();

    let format = options
        .format
        .unwrap_or_else(|| DocumentFormat::from_path(output));
    write_document(&document, output, format)?;

    let archive = if options.archive {
        let archive_path = output.with_extension("zip");
        match archive::pack(output, &archive_path, &texture_paths) {
            Ok(_) => {
                archive::remove_packed_files(output, &texture_paths);
                Some(archive_path)
            }
            Err(e) => {
                log::error!(
                    "Could not create archive {}: {}; loose files kept",
                    archive_path.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    Ok(ExportSummary {
        document: output.to_path_buf(),
        archive,
        vertex_count,
        compressed,
        image_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::draco::{
        CompressionSettings, GeometryEncoder, GeometryPayload, UnavailableEncoder,
    };

    struct FixedEncoder;

    impl GeometryEncoder for FixedEncoder {
        fn encode(&self, _: &GeometryPayload, _: &CompressionSettings) -> Result<Vec<u8>> {
            Ok(vec![7; 20])
        }
    }

    /// Z-up cube: 8 positions, 12 triangles, per-face normals per corner, no UVs.
    fn cube_request() -> ExportRequest {
        let positions = vec![
            -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, //
            -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
        ];
        let faces: [([u32; 4], [f32; 3]); 6] = [
            ([0, 3, 2, 1], [0.0, 0.0, -1.0]),
            ([4, 5, 6, 7], [0.0, 0.0, 1.0]),
            ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
            ([2, 3, 7, 6], [0.0, 1.0, 0.0]),
            ([1, 2, 6, 5], [1.0, 0.0, 0.0]),
            ([0, 4, 7, 3], [-1.0, 0.0, 0.0]),
        ];
        let mut indices = Vec::new();
        let mut normals = Vec::new();
        for (quad, normal) in faces {
            for i in [0, 1, 2, 0, 2, 3] {
                indices.push(quad[i]);
                normals.extend_from_slice(&normal);
            }
        }
        ExportRequest {
            name: "Cube".to_string(),
            positions,
            normals,
            uvs: None,
            indices,
            ..Default::default()
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_export_cube_uncompressed() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.gltf");
        let options = ExportOptions::default().with_compression(false, 7);

        let summary = export(&cube_request(), &output, &options).unwrap();
        assert_eq!(summary.vertex_count, 36);
        assert!(!summary.compressed);
        assert_eq!(summary.image_count, 0);

        let value = read_json(&output);
        assert_eq!(value["meshes"].as_array().unwrap().len(), 1);
        assert_eq!(value["meshes"][0]["primitives"].as_array().unwrap().len(), 1);
        assert_eq!(value["accessors"].as_array().unwrap().len(), 4);
        let index_accessor = value["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap();
        assert_eq!(value["accessors"][index_accessor as usize]["count"], 36);
        assert!(value.get("extensionsUsed").is_none());
        assert_eq!(value["scenes"][0]["nodes"][0], 0);
        assert_eq!(value["nodes"][0]["mesh"], 0);
        // Z-up -> Y-up leaves the symmetric cube bounds unchanged.
        assert_eq!(value["accessors"][0]["min"], serde_json::json!([-1.0, -1.0, -1.0]));
        assert_eq!(value["accessors"][0]["max"], serde_json::json!([1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_export_compressed_declares_extension() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.gltf");
        let summary = export_with(
            &cube_request(),
            &output,
            &ExportOptions::default(),
            GeometryCompressor::new(Box::new(FixedEncoder)),
        )
        .unwrap();
        assert!(summary.compressed);

        let value = read_json(&output);
        assert_eq!(value["extensionsUsed"][0], "KHR_draco_mesh_compression");
        assert_eq!(value["extensionsRequired"][0], "KHR_draco_mesh_compression");
        assert!(value["accessors"][0].get("bufferView").is_none());
    }

    #[test]
    fn test_export_compression_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.glb");
        let summary = export_with(
            &cube_request(),
            &output,
            &ExportOptions::default(),
            GeometryCompressor::new(Box::new(UnavailableEncoder)),
        )
        .unwrap();
        assert!(!summary.compressed);
        let glb = std::fs::read(&output).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
    }

    #[test]
    fn test_export_with_texture_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.gltf");
        let mut request = cube_request();
        request
            .textures
            .push(TextureData::packed("rgb", 2, 2, 3, vec![90; 12]));
        let options = ExportOptions::default()
            .with_compression(false, 7)
            .with_png()
            .with_archive(true);

        let summary = export(&request, &output, &options).unwrap();
        assert_eq!(summary.image_count, 1);
        let archive_path = summary.archive.unwrap();
        assert_eq!(archive_path, dir.path().join("cube.zip"));

        // Loose files are gone once the archive exists.
        assert!(!output.exists());
        assert!(!dir.path().join("0.png").exists());

        let archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["0.png", "model.gltf"]);
    }

    #[test]
    fn test_archive_leaves_unexported_textures() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.gltf");
        let stale = dir.path().join("1.png");
        std::fs::write(&stale, b"left over").unwrap();

        let mut request = cube_request();
        request
            .textures
            .push(TextureData::packed("used", 1, 1, 3, vec![1, 2, 3]));
        request
            .textures
            .push(TextureData::packed("unused", 1, 1, 3, vec![4, 5, 6]));
        request
            .materials
            .push(Material::new("body").with_base_color_texture(0));
        let options = ExportOptions::default()
            .with_compression(false, 7)
            .with_png()
            .with_archive(true);

        let summary = export(&request, &output, &options).unwrap();
        let archive_path = summary.archive.unwrap();
        let archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["0.png", "model.gltf"]);
        assert_eq!(std::fs::read(&stale).unwrap(), b"left over");
    }

    #[test]
    fn test_default_material_slots() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cube.gltf");
        let mut request = cube_request();
        request
            .textures
            .push(TextureData::packed("only", 1, 1, 3, vec![1, 2, 3]));
        let options = ExportOptions::default().with_compression(false, 7).with_jpeg(75);

        export(&request, &output, &options).unwrap();
        let value = read_json(&output);
        let material = &value["materials"][0];
        assert_eq!(material["name"], "Material");
        assert_eq!(material["pbrMetallicRoughness"]["baseColorTexture"]["index"], 0);
        assert!(material.get("normalTexture").is_none());
        assert!(dir.path().join("0.jpg").exists());
    }

    #[test]
    fn test_request_from_json() {
        let request: ExportRequest = serde_json::from_str(
            r#"{
                "name": "tri",
                "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0],
                "normals": [0, 0, 1, 0, 0, 1, 0, 0, 1],
                "indices": [0, 1, 2],
                "materials": [{"name": "red", "base_color": [1, 0, 0, 1]}]
            }"#,
        )
        .unwrap();
        assert_eq!(request.positions.len(), 9);
        assert!(request.uvs.is_none());
        assert_eq!(request.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(request.materials[0].roughness, 1.0);
    }
}
