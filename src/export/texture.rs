//! Texture export to sibling image files.
//!
//! Every texture in the list is written as `<list index>.<png|jpg>` in the
//! export directory, whatever its source. Nothing is cached: resolving the
//! same list entry twice writes the file twice.

use crate::error::{ExportError, Result};
use crate::types::{TextureData, TextureSource};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::fs::File;
use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Encoding used for every exported texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG at maximum deflate effort.
    Png,
    /// JPEG with quality 0-100.
    Jpeg { quality: u8 },
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Jpeg { quality: 100 }
    }
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// An image file written for one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    /// File name relative to the export directory, used as the image URI.
    pub file_name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Encoded size in bytes.
    pub byte_size: u64,
}

/// Owns the texture list and writes textures on demand.
#[derive(Debug, Clone, Default)]
pub struct TextureExporter {
    textures: Vec<TextureData>,
    export_dir: PathBuf,
    format: ImageFormat,
    written: BTreeSet<usize>,
}

impl TextureExporter {
    pub fn new(export_dir: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self {
            textures: Vec::new(),
            export_dir: export_dir.into(),
            format,
            written: BTreeSet::new(),
        }
    }

    /// Add a texture to the list and return its list index.
    pub fn push(&mut self, texture: TextureData) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&TextureData> {
        self.textures.get(index)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Canonical file name for a list index.
    pub fn file_name(&self, index: usize) -> String {
        format!("{}.{}", index, self.format.extension())
    }

    /// Canonical output path for every texture in the list.
    pub fn texture_paths(&self) -> Vec<PathBuf> {
        (0..self.textures.len())
            .map(|i| self.export_dir.join(self.file_name(i)))
            .collect()
    }

    /// Paths of the textures written so far, in list order.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.written
            .iter()
            .map(|&i| self.export_dir.join(self.file_name(i)))
            .collect()
    }

    /// Decode (if needed), re-encode and write the texture at `index`.
    pub fn export_image(&mut self, index: usize) -> Result<ExportedImage> {
        let texture = self.textures.get(index).ok_or_else(|| {
            ExportError::Texture(format!(
                "texture index {} out of range ({} textures)",
                index,
                self.textures.len()
            ))
        })?;

        let file_name = self.file_name(index);
        let path = self.export_dir.join(&file_name);

        let (width, height, channels, byte_size) = match &texture.source {
            TextureSource::File { path: source } => {
                let decoded = image::open(source).map_err(|e| {
                    ExportError::Texture(format!("failed to load {}: {}", source.display(), e))
                })?;
                let (pixels, width, height, channels) = to_8bit(decoded);
                let size = write_image(&path, &pixels, width, height, channels, self.format)?;
                (width, height, channels, size)
            }
            TextureSource::Packed {
                width,
                height,
                channels,
                pixels,
            } => {
                let size = write_image(&path, pixels, *width, *height, *channels, self.format)?;
                (*width, *height, *channels, size)
            }
        };

        self.written.insert(index);
        log::info!(
            "Wrote texture '{}' ({}x{}x{}) to {}",
            texture.name,
            width,
            height,
            channels,
            path.display()
        );

        Ok(ExportedImage {
            file_name,
            path,
            width,
            height,
            channels,
            byte_size,
        })
    }
}

/// Flatten a decoded image to 8 bits per channel, keeping its channel count.
fn to_8bit(image: DynamicImage) -> (Vec<u8>, u32, u32, u8) {
    let (width, height) = (image.width(), image.height());
    match image.color().channel_count() {
        1 => (image.to_luma8().into_raw(), width, height, 1),
        2 => (image.to_luma_alpha8().into_raw(), width, height, 2),
        3 => (image.to_rgb8().into_raw(), width, height, 3),
        _ => (image.to_rgba8().into_raw(), width, height, 4),
    }
}

fn color_type(channels: u8) -> Result<ExtendedColorType> {
    match channels {
        1 => Ok(ExtendedColorType::L8),
        2 => Ok(ExtendedColorType::La8),
        3 => Ok(ExtendedColorType::Rgb8),
        4 => Ok(ExtendedColorType::Rgba8),
        n => Err(ExportError::Texture(format!("unsupported channel count {}", n))),
    }
}

/// Drop the alpha channel: JPEG has none.
fn strip_alpha(pixels: &[u8], channels: u8) -> (Vec<u8>, u8) {
    let keep = (channels - 1) as usize;
    let stripped = pixels
        .chunks_exact(channels as usize)
        .flat_map(|px| px[..keep].iter().copied())
        .collect();
    (stripped, channels - 1)
}

fn check_pixels(pixels: &[u8], width: u32, height: u32, channels: u8) -> Result<()> {
    color_type(channels)?;
    let expected = width as usize * height as usize * channels as usize;
    if pixels.len() != expected {
        return Err(ExportError::Texture(format!(
            "expected {} bytes for {}x{}x{}, got {}",
            expected,
            width,
            height,
            channels,
            pixels.len()
        )));
    }
    Ok(())
}

/// Encode raw pixels into `writer`.
pub fn encode_image<W: Write>(
    writer: W,
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    format: ImageFormat,
) -> Result<()> {
    check_pixels(pixels, width, height, channels)?;

    match format {
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
            encoder.write_image(pixels, width, height, color_type(channels)?)?;
        }
        ImageFormat::Jpeg { quality } => {
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            if channels == 2 || channels == 4 {
                let (opaque, channels) = strip_alpha(pixels, channels);
                encoder.write_image(&opaque, width, height, color_type(channels)?)?;
            } else {
                encoder.write_image(pixels, width, height, color_type(channels)?)?;
            }
        }
    }
    Ok(())
}

/// Encode raw pixels to a file and return the written size.
fn write_image(
    path: &Path,
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    format: ImageFormat,
) -> Result<u64> {
    check_pixels(pixels, width, height, channels)?;
    let mut writer = BufWriter::new(File::create(path)?);
    encode_image(&mut writer, pixels, width, height, channels, format)?;
    writer.flush()?;
    Ok(std::fs::metadata(path)?.len())
}
