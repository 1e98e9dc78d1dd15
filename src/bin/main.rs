//! glTF Compress CLI
//!
//! Export mesh data from JSON to glTF, or pack an existing export into a ZIP.

use clap::{Parser, Subcommand};
use gltf_compress::{export, pack, ExportOptions, ExportRequest};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gltf-compress")]
#[command(author, version, about = "Export meshes to compressed glTF 2.0", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export mesh data from a JSON input file
    Export {
        /// Input JSON file with positions, normals, indices, uvs, textures and materials
        #[arg(short, long)]
        input: PathBuf,

        /// Output document path (.gltf or .glb)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for texture files (defaults to the output directory)
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Disable Draco geometry compression
        #[arg(long)]
        no_compression: bool,

        /// Compression level (0 to 10)
        #[arg(long, default_value = "7")]
        compression_level: u8,

        /// Write textures as PNG instead of JPEG
        #[arg(long)]
        png: bool,

        /// JPEG quality (0 to 100)
        #[arg(long, default_value = "100")]
        jpeg_quality: u8,

        /// Pack the document and textures into a ZIP next to the output
        #[arg(long)]
        zip: bool,
    },

    /// Pack an exported document and its textures into a ZIP archive
    Pack {
        /// Document to pack
        #[arg(short, long)]
        document: PathBuf,

        /// Archive path to create
        #[arg(short, long)]
        archive: PathBuf,

        /// Texture files to include
        #[arg(short, long)]
        texture: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            export_dir,
            no_compression,
            compression_level,
            png,
            jpeg_quality,
            zip,
        } => {
            let mut options = ExportOptions::default()
                .with_compression(!no_compression, compression_level)
                .with_archive(zip);
            options = if png {
                options.with_png()
            } else {
                options.with_jpeg(jpeg_quality)
            };
            if let Some(dir) = export_dir {
                options = options.with_export_dir(dir);
            }
            export_from_json(&input, &output, &options)?;
        }
        Commands::Pack {
            document,
            archive,
            texture,
        } => {
            let report = pack(&document, &archive, &texture)?;
            println!("Packed {} entries into {:?}", report.entries.len(), archive);
            if !report.skipped.is_empty() {
                println!("  Skipped {} missing textures", report.skipped.len());
            }
        }
    }

    Ok(())
}

fn export_from_json(
    input_path: &PathBuf,
    output_path: &PathBuf,
    options: &ExportOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading mesh data from {:?}...", input_path);
    let json_content = fs::read_to_string(input_path)?;
    let request: ExportRequest = serde_json::from_str(&json_content)?;
    println!(
        "  Loaded {} positions, {} corners, {} textures",
        request.positions.len() / 3,
        request.indices.len(),
        request.textures.len()
    );

    println!("Exporting with options:");
    println!("  - Compression: {}", options.use_compression);
    if options.use_compression {
        println!("  - Compression level: {}", options.compression_level);
    }
    println!("  - Textures: {:?}", options.image_format);
    println!("  - Archive: {}", options.archive);

    let summary = export(&request, output_path, options)?;

    println!(
        "  Wrote {} vertices ({}), {} images",
        summary.vertex_count,
        if summary.compressed { "compressed" } else { "uncompressed" },
        summary.image_count
    );
    match &summary.archive {
        Some(archive) => println!("Exported archive to {:?}", archive),
        None => println!("Exported document to {:?}", summary.document),
    }

    Ok(())
}
