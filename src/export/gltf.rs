//! glTF/GLB serialization of a finished [`Document`].

use super::document::Document;
use crate::error::{ExportError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gltf_json as json;
use std::path::Path;

/// Container format of the written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// JSON `.gltf` with the buffer embedded as a data URI.
    #[default]
    Gltf,
    /// Binary `.glb` container.
    Glb,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything but `.glb` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("glb") => DocumentFormat::Glb,
            _ => DocumentFormat::Gltf,
        }
    }
}

/// Render the document as JSON text with the buffer embedded.
pub fn to_gltf_string(document: &Document) -> Result<String> {
    let mut root = document.root.clone();
    if let Some(buffer) = root.buffers.first_mut() {
        buffer.uri = Some(format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(&document.buffer)
        ));
    }
    json::serialize::to_string_pretty(&root)
        .map_err(|e| ExportError::Export(format!("Failed to serialize glTF JSON: {}", e)))
}

/// Render the document as a GLB container.
pub fn to_glb(document: &Document) -> Result<Vec<u8>> {
    let json_string = json::serialize::to_string(&document.root)
        .map_err(|e| ExportError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;
    let json_bytes = json_string.as_bytes();
    let buffer_data = &document.buffer;

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let padded_buffer_len = buffer_data.len() + buffer_padding;

    let has_bin = !document.root.buffers.is_empty();
    let total_size = 12 + // GLB header
        8 + padded_json_len + // JSON chunk
        if has_bin { 8 + padded_buffer_len } else { 0 }; // BIN chunk

    let mut glb = Vec::with_capacity(total_size);

    // GLB Header
    glb.extend_from_slice(b"glTF"); // magic
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&(total_size as u32).to_le_bytes()); // length

    // JSON Chunk
    glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes()); // chunk length
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // chunk type: JSON
    glb.extend_from_slice(json_bytes);
    glb.extend_from_slice(&vec![0x20u8; json_padding]); // padding (spaces)

    // BIN Chunk
    if has_bin {
        glb.extend_from_slice(&(padded_buffer_len as u32).to_le_bytes()); // chunk length
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // chunk type: BIN
        glb.extend_from_slice(buffer_data);
        glb.extend_from_slice(&vec![0u8; buffer_padding]); // padding (zeros)
    }

    Ok(glb)
}

/// Write the document to `path` in the given format.
pub fn write_document(document: &Document, path: &Path, format: DocumentFormat) -> Result<()> {
    match format {
        DocumentFormat::Gltf => std::fs::write(path, to_gltf_string(document)?)?,
        DocumentFormat::Glb => std::fs::write(path, to_glb(document)?)?,
    }
    log::info!("Wrote {:?} document to {}", format, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::DocumentBuilder;
    use crate::export::draco::{GeometryCompressor, UnavailableEncoder};
    use crate::export::texture::{ImageFormat, TextureExporter};
    use crate::types::{Mesh, Node, Vertex};

    fn document() -> Document {
        let mut builder = DocumentBuilder::with_compressor(
            TextureExporter::new(".", ImageFormat::Png),
            GeometryCompressor::new(Box::new(UnavailableEncoder)),
        );
        let mesh = Mesh::from_vertices(
            "tri",
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
                Vertex::new([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
            ],
        )
        .with_compression(false, 7);
        let mesh = builder.add_mesh(&mesh);
        builder.add_node(&Node::new("tri").with_mesh(mesh));
        builder.finish()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.glb")), DocumentFormat::Glb);
        assert_eq!(DocumentFormat::from_path(Path::new("a.gltf")), DocumentFormat::Gltf);
        assert_eq!(DocumentFormat::from_path(Path::new("a")), DocumentFormat::Gltf);
    }

    #[test]
    fn test_gltf_string_embeds_buffer() {
        let doc = document();
        let text = to_gltf_string(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["asset"]["version"], "2.0");
        let uri = value["buffers"][0]["uri"].as_str().unwrap();
        let encoded = uri
            .strip_prefix("data:application/octet-stream;base64,")
            .unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), doc.buffer);
        assert_eq!(value["buffers"][0]["byteLength"], doc.buffer.len());
    }

    #[test]
    fn test_glb_layout() {
        let doc = document();
        let glb = to_glb(&doc).unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes([glb[4], glb[5], glb[6], glb[7]]), 2);
        assert_eq!(
            u32::from_le_bytes([glb[8], glb[9], glb[10], glb[11]]) as usize,
            glb.len()
        );
        assert_eq!(glb.len() % 4, 0);

        let json_len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
        assert_eq!(&glb[16..20], b"JSON");
        let json_text = std::str::from_utf8(&glb[20..20 + json_len]).unwrap();
        let value: serde_json::Value = serde_json::from_str(json_text.trim_end()).unwrap();
        assert!(value["buffers"][0].get("uri").is_none());
        assert_eq!(&glb[24 + json_len..28 + json_len], b"BIN\0");
    }

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        write_document(&document(), &path, DocumentFormat::Gltf).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"scenes\""));
    }
}
