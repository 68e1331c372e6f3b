//! Heroes III asset tool
//!
//! A command-line interface for inspecting and extracting game assets.
//!
//! ## Commands
//!
//! - `lod list` - List the entries of a LOD archive
//! - `lod extract` - Extract one entry, converting images to PNG
//! - `def info` - Display a sprite definition's blocks and frames
//! - `map info` - Display map metadata and players
//! - `map render` - Render a map level to PNG using sprites from LOD archives
//!
//! Set `RUST_LOG=debug` for parser diagnostics.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::Receiver;

use h3_assets::def::DefFile;
use h3_assets::lod::{DecodedContent, LodArchive};
use h3_assets::map::Map;
use h3_assets::materialize::{compose_level, materialize, solid};
use h3_assets::palette::Palette;
use h3_assets::process::{spawn_load_archives, spawn_process_map, Event};

/// Heroes of Might and Magic III asset tool
#[derive(Parser)]
#[command(name = "h3-assets")]
#[command(about = "Heroes III archive, sprite and map tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect LOD archives
    Lod {
        #[command(subcommand)]
        command: LodCommand,
    },
    /// Inspect DEF sprite files
    Def {
        #[command(subcommand)]
        command: DefCommand,
    },
    /// Inspect and render maps
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
}

#[derive(Subcommand)]
enum LodCommand {
    /// List archive entries
    List {
        /// Path to the archive
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Extract one entry
    Extract {
        /// Path to the archive
        file: PathBuf,
        /// Entry name (case-insensitive)
        entry: String,
        /// Output file; for DEF entries, the output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum DefCommand {
    /// Display sprite information
    Info {
        /// Path to the DEF file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum MapCommand {
    /// Display map information
    Info {
        /// Path to the map file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Render a map level to PNG
    Render {
        /// Path to the map file
        file: PathBuf,
        /// Sprite archives, searched in the order given
        #[arg(long = "lod", required = true)]
        lods: Vec<PathBuf>,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
        /// Render the underground level
        #[arg(long)]
        underground: bool,
    },
}

/// Output format options
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

// ============================================================================
// Serializable Output Structures
// ============================================================================

#[derive(Serialize)]
struct ArchiveListing {
    file: String,
    kind: String,
    entries: Vec<EntryInfo>,
}

#[derive(Serialize)]
struct EntryInfo {
    name: String,
    kind: String,
    tag: u32,
    offset: u32,
    stored_size: u32,
    actual_size: u32,
    compressed: bool,
}

#[derive(Serialize)]
struct DefInfo {
    kind: String,
    width: u32,
    height: u32,
    blocks: Vec<BlockInfo>,
}

#[derive(Serialize)]
struct BlockInfo {
    id: u32,
    frames: Vec<FrameInfo>,
}

#[derive(Serialize)]
struct FrameInfo {
    name: String,
    width: u32,
    height: u32,
    content: [u32; 4],
}

#[derive(Serialize)]
struct MapInfo {
    name: String,
    description: String,
    format: String,
    size: u32,
    underground: bool,
    difficulty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hero_level_cap: Option<u8>,
    templates: usize,
    objects: usize,
    players: Vec<PlayerSummary>,
}

#[derive(Serialize)]
struct PlayerSummary {
    color: String,
    human: bool,
    computer: bool,
    factions: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_town: Option<[u8; 3]>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lod {
            command: LodCommand::List { file, output },
        } => cmd_lod_list(&file, &output),
        Commands::Lod {
            command: LodCommand::Extract {
                file,
                entry,
                output,
            },
        } => cmd_lod_extract(&file, &entry, &output),
        Commands::Def {
            command: DefCommand::Info { file, output },
        } => cmd_def_info(&file, &output),
        Commands::Map {
            command: MapCommand::Info { file, output },
        } => cmd_map_info(&file, &output),
        Commands::Map {
            command:
                MapCommand::Render {
                    file,
                    lods,
                    output,
                    underground,
                },
        } => cmd_map_render(&file, &lods, &output, underground),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn print_json<T: Serialize>(output: &T) {
    match serde_json::to_string_pretty(output) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing to JSON: {e}"),
    }
}

// ============================================================================
// LOD Commands
// ============================================================================

fn cmd_lod_list(file: &Path, output: &OutputFormat) -> Result<(), String> {
    let archive = LodArchive::open(file).map_err(|e| format!("{}: {e}", file.display()))?;

    let listing = ArchiveListing {
        file: archive.file_name().to_string(),
        kind: format!("{:?}", archive.kind()),
        entries: archive
            .entries()
            .iter()
            .map(|e| EntryInfo {
                name: e.name.clone(),
                kind: format!("{:?}", e.kind),
                tag: e.tag,
                offset: e.offset,
                stored_size: e.stored_size,
                actual_size: e.actual_size,
                compressed: e.is_compressed(),
            })
            .collect(),
    };

    match output {
        OutputFormat::Json => print_json(&listing),
        OutputFormat::Pretty => {
            println!("=== {} ({}) ===", listing.file, listing.kind);
            println!("{} entries\n", listing.entries.len());
            for entry in &listing.entries {
                println!(
                    "  {:<16} {:<10} {:>9} bytes{}",
                    entry.name,
                    entry.kind,
                    entry.actual_size,
                    if entry.compressed { " (zlib)" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn cmd_lod_extract(file: &Path, name: &str, output: &Path) -> Result<(), String> {
    let archive = LodArchive::open(file).map_err(|e| format!("{}: {e}", file.display()))?;
    let entry = archive
        .find(name)
        .ok_or_else(|| format!("no entry named {name} in {}", archive.file_name()))?;

    let content = match archive.decode(entry) {
        Ok(content) => content,
        // Unknown entries are still worth extracting byte for byte
        Err(h3_assets::DecodeError::UnsupportedEntryKind { .. }) => DecodedContent::Binary(
            archive
                .entry_bytes(entry)
                .map_err(|e| e.to_string())?
                .into_owned(),
        ),
        Err(e) => return Err(e.to_string()),
    };

    match content {
        DecodedContent::Text(bytes) | DecodedContent::Binary(bytes) => write_bytes(output, &bytes),
        DecodedContent::Mask(_) => {
            let bytes = archive.entry_bytes(entry).map_err(|e| e.to_string())?;
            write_bytes(output, &bytes)
        }
        DecodedContent::Image(image) => {
            let bitmap = image
                .to_pixels()
                .and_then(|pixels| materialize(&pixels))
                .map_err(|e| e.to_string())?;
            save_png(&bitmap, output)
        }
        DecodedContent::Palette(palette) => save_png(&palette_swatch(&palette), output),
        DecodedContent::Definition(def) => extract_frames(&def, output),
    }
}

fn write_bytes(output: &Path, bytes: &[u8]) -> Result<(), String> {
    std::fs::write(output, bytes).map_err(|e| format!("writing {}: {e}", output.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn save_png(bitmap: &image::RgbaImage, output: &Path) -> Result<(), String> {
    bitmap
        .save(output)
        .map_err(|e| format!("writing {}: {e}", output.display()))?;
    println!(
        "Wrote {}x{} image to {}",
        bitmap.width(),
        bitmap.height(),
        output.display()
    );
    Ok(())
}

/// Renders a palette as a 16x16 grid of 8-pixel swatches.
fn palette_swatch(palette: &Palette) -> image::RgbaImage {
    let table = palette.expand_to_rgba();
    let mut swatch = image::RgbaImage::new(128, 128);
    for (i, &rgba) in table.iter().enumerate() {
        let (x, y) = ((i % 16) as i64 * 8, (i / 16) as i64 * 8);
        image::imageops::overlay(&mut swatch, &solid(8, 8, rgba), x, y);
    }
    swatch
}

fn extract_frames(def: &DefFile, output: &Path) -> Result<(), String> {
    std::fs::create_dir_all(output)
        .map_err(|e| format!("creating {}: {e}", output.display()))?;

    for block in &def.blocks {
        for (i, frame) in block.frames.iter().enumerate() {
            let bitmap = frame
                .to_pixels(&def.palette)
                .and_then(|pixels| materialize(&pixels))
                .map_err(|e| e.to_string())?;
            let path = output.join(format!("block{}_{i:03}.png", block.id));
            save_png(&bitmap, &path)?;
        }
    }

    Ok(())
}

// ============================================================================
// DEF Commands
// ============================================================================

fn cmd_def_info(file: &Path, output: &OutputFormat) -> Result<(), String> {
    let def = DefFile::parse(&read_file(file)?).map_err(|e| e.to_string())?;

    let info = DefInfo {
        kind: format!("{:?}", def.kind),
        width: def.width,
        height: def.height,
        blocks: def
            .blocks
            .iter()
            .map(|b| BlockInfo {
                id: b.id,
                frames: b
                    .frames
                    .iter()
                    .map(|f| FrameInfo {
                        name: f.file_name.clone(),
                        width: f.width,
                        height: f.height,
                        content: [f.rect.x, f.rect.y, f.rect.width, f.rect.height],
                    })
                    .collect(),
            })
            .collect(),
    };

    match output {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Pretty => {
            println!("=== Sprite Definition ===");
            println!("Kind: {}", info.kind);
            println!("Size: {}x{}", info.width, info.height);
            println!();
            for block in &info.blocks {
                println!("Block {} ({} frames):", block.id, block.frames.len());
                for frame in &block.frames {
                    let [x, y, w, h] = frame.content;
                    println!(
                        "  {:<13} {}x{}  content {w}x{h} at ({x}, {y})",
                        frame.name, frame.width, frame.height
                    );
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Map Commands
// ============================================================================

fn cmd_map_info(file: &Path, output: &OutputFormat) -> Result<(), String> {
    let map = Map::parse(&read_file(file)?).map_err(|e| e.to_string())?;
    let basic = &map.basic_info;

    let info = MapInfo {
        name: basic.name.clone(),
        description: basic.description.clone(),
        format: basic.format.name().to_string(),
        size: basic.size.width(),
        underground: basic.has_underground,
        difficulty: format!("{:?}", basic.difficulty),
        hero_level_cap: basic.hero_level_cap,
        templates: map.templates.len(),
        objects: map
            .world
            .levels()
            .flat_map(|l| l.tiles.iter())
            .map(|t| t.objects.len())
            .sum(),
        players: map
            .players_info
            .playable()
            .map(|p| PlayerSummary {
                color: format!("{:?}", p.color),
                human: p.can_human,
                computer: p.can_computer,
                factions: p.allowed_factions,
                main_town: p.main_town.map(|t| [t.position.0, t.position.1, t.position.2]),
            })
            .collect(),
    };

    match output {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Pretty => {
            println!("=== {} ===", info.name);
            if !info.description.is_empty() {
                println!("{}\n", info.description);
            }
            println!("Format: {}", info.format);
            println!(
                "Size: {0}x{0}{1}",
                info.size,
                if info.underground { " + underground" } else { "" }
            );
            println!("Difficulty: {}", info.difficulty);
            if let Some(cap) = info.hero_level_cap {
                println!("Hero Level Cap: {cap}");
            }
            println!("Templates: {}", info.templates);
            println!("Objects: {}", info.objects);
            println!("\nPlayers ({}):", info.players.len());
            for player in &info.players {
                let who = match (player.human, player.computer) {
                    (true, true) => "human or computer",
                    (true, false) => "human only",
                    _ => "computer only",
                };
                println!("  {}: {who} (factions 0x{:03X})", player.color, player.factions);
            }
        }
    }

    Ok(())
}

/// Drains a background job, printing progress to stderr.
fn wait_for<T>(events: &Receiver<Event<T>>) -> Result<T, String> {
    for event in events {
        match event {
            Event::Progress(progress) => {
                eprintln!(
                    "[{:>3.0}%] {}",
                    progress.fraction() * 100.0,
                    progress.step
                );
            }
            Event::Finished(result) => return result.map_err(|e| e.to_string()),
        }
    }
    Err("background job ended without a result".to_string())
}

fn cmd_map_render(
    file: &Path,
    lods: &[PathBuf],
    output: &Path,
    underground: bool,
) -> Result<(), String> {
    let map = Map::parse(&read_file(file)?).map_err(|e| e.to_string())?;

    let archives = lods
        .iter()
        .map(|path| read_file(path).map(|bytes| (file_name(path), bytes)))
        .collect::<Result<Vec<_>, _>>()?;
    let catalog = wait_for(&spawn_load_archives(archives))?;

    let processed = wait_for(&spawn_process_map(map, catalog))?;
    for skipped in &processed.skipped {
        eprintln!(
            "Missing sprite {} frame {}: {}",
            skipped.name, skipped.frame, skipped.reason
        );
    }

    let depth = u32::from(underground);
    let canvas = compose_level(&processed, depth)
        .ok_or_else(|| "map has no underground level".to_string())?;
    save_png(&canvas, output)
}
