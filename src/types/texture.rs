//! Texture sources handed to the exporter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a texture's pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextureSource {
    /// An image file on disk, decoded at export time.
    File { path: PathBuf },
    /// Raw 8-bit pixels, row-major, `channels` bytes per pixel.
    Packed {
        width: u32,
        height: u32,
        channels: u8,
        #[serde(rename = "data")]
        pixels: Vec<u8>,
    },
}

/// A named texture in the exporter's texture list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureData {
    pub name: String,
    #[serde(flatten)]
    pub source: TextureSource,
}

impl TextureData {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: TextureSource::File { path: path.into() },
        }
    }

    pub fn packed(
        name: impl Into<String>,
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            source: TextureSource::Packed {
                width,
                height,
                channels,
                pixels,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_texture() {
        let tex: TextureData =
            serde_json::from_str(r#"{"type": "file", "name": "albedo", "path": "tex/albedo.png"}"#)
                .unwrap();
        assert_eq!(tex, TextureData::file("albedo", "tex/albedo.png"));
    }

    #[test]
    fn test_parse_packed_texture() {
        let tex: TextureData = serde_json::from_str(
            r#"{
                "type": "packed",
                "name": "dot",
                "width": 1,
                "height": 1,
                "channels": 3,
                "data": [255, 0, 0]
            }"#,
        )
        .unwrap();
        match tex.source {
            TextureSource::Packed {
                width,
                height,
                channels,
                pixels,
            } => {
                assert_eq!((width, height, channels), (1, 1, 3));
                assert_eq!(pixels, vec![255, 0, 0]);
            }
            _ => panic!("expected packed texture"),
        }
    }
}
