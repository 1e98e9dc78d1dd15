//! # glTF Compress
//!
//! Export triangle meshes from flat, Z-up arrays to glTF 2.0, optionally
//! compressing geometry with `KHR_draco_mesh_compression` and packing the
//! result into a ZIP archive.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gltf_compress::{export, ExportOptions, ExportRequest};
//!
//! let request: ExportRequest = serde_json::from_str(&json)?;
//! let options = ExportOptions::default()
//!     .with_compression(true, 7)
//!     .with_png()
//!     .with_archive(true);
//!
//! let summary = export(&request, "out/model.gltf".as_ref(), &options)?;
//! ```
//!
//! ## Building Documents Directly
//!
//! For more than one mesh, drive [`DocumentBuilder`] yourself:
//!
//! ```ignore
//! use gltf_compress::{DocumentBuilder, ImageFormat, Mesh, Node, TextureExporter};
//!
//! let mut builder = DocumentBuilder::new(TextureExporter::new("out", ImageFormat::Png));
//! let mesh = builder.add_mesh(&Mesh::from_vertices("part", vertices));
//! builder.add_node(&Node::new("part").with_mesh(mesh));
//! let document = builder.finish();
//! ```

pub mod assembler;
pub mod error;
pub mod export;
pub mod exporter;
pub mod profile;
pub mod types;

// Re-export main types for convenience
pub use assembler::{assemble_vertices, MeshArrays};
pub use error::{ExportError, Result};
pub use export::{
    pack, to_glb, to_gltf_string, write_document, BufferAllocator, CompressionSettings, Document,
    DocumentBuilder, DocumentFormat, GeometryCompressor, GeometryEncoder, ImageFormat, PackReport,
    TextureExporter, ViewKind,
};
pub use exporter::{export, export_with, ExportOptions, ExportRequest, ExportSummary};
pub use types::{
    BoundingBox, Material, Mesh, Node, PrimitiveMode, TextureData, TextureSource, Vertex,
};
