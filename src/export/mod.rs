//! glTF document construction and output.
//!
//! The document builder drives the buffer allocator, the geometry compressor
//! and the texture exporter; serialization and archiving consume its result.

pub mod archive;
pub mod buffer;
pub mod document;
pub mod draco;
pub mod gltf;
pub mod texture;

pub use archive::{pack, PackReport};
pub use buffer::{BufferAllocator, ViewKind};
pub use document::{Document, DocumentBuilder};
pub use draco::{CompressionSettings, GeometryCompressor, GeometryEncoder};
pub use gltf::{to_glb, to_gltf_string, write_document, DocumentFormat};
pub use texture::{ImageFormat, TextureExporter};
