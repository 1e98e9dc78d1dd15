//! ZIP packaging of an exported document and its textures.

use crate::error::Result;
use crate::profile::ScopedTimer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Entry name of the document inside the archive, by document extension.
pub fn document_entry_name(document_path: &Path) -> &'static str {
    match document_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("glb") => "model.glb",
        _ => "model.gltf",
    }
}

/// What ended up in the archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackReport {
    /// Entry names in insertion order, document first.
    pub entries: Vec<String>,
    /// Texture paths that could not be read.
    pub skipped: Vec<PathBuf>,
}

/// Bundle a document and its textures into a new ZIP archive.
///
/// Textures are stored under their base file name. A texture that cannot be
/// read is logged and left out; only failing to create the archive or to add
/// the document is an error.
pub fn pack(
    document_path: &Path,
    archive_path: &Path,
    texture_paths: &[PathBuf],
) -> Result<PackReport> {
    let _timer = ScopedTimer::new("pack archive");
    let document = std::fs::read(document_path)?;

    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut report = PackReport::default();

    let document_entry = document_entry_name(document_path);
    zip.start_file(document_entry, options)?;
    zip.write_all(&document)?;
    report.entries.push(document_entry.to_string());

    for path in texture_paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Texture path {} has no file name, skipping", path.display());
            report.skipped.push(path.clone());
            continue;
        };
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Texture {} not archived: {}", path.display(), e);
                report.skipped.push(path.clone());
                continue;
            }
        };
        zip.start_file(name, options)?;
        zip.write_all(&data)?;
        report.entries.push(name.to_string());
    }

    zip.finish()?.flush()?;
    log::info!(
        "Packed {} entries into {}",
        report.entries.len(),
        archive_path.display()
    );
    Ok(report)
}

/// Remove the loose files that were packed into an archive.
pub fn remove_packed_files(document_path: &Path, texture_paths: &[PathBuf]) {
    for path in std::iter::once(document_path).chain(texture_paths.iter().map(PathBuf::as_path)) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                log::warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}
