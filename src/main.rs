use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;
use slicekit::{slice_to_rect, GridSize, HeadlessEngine, ImagePipeline, Manifest, SlicePos};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "slicekit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a manifest and write every derived artifact as JSON.
    Bake(BakeArgs),
    /// Print the pixel rect of a grid slice.
    Rect(RectArgs),
}

#[derive(Parser, Debug)]
struct BakeArgs {
    /// Manifest JSON listing image descriptors.
    #[arg(long)]
    manifest: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RectArgs {
    /// Source image width in pixels.
    #[arg(long)]
    width: u32,

    /// Grid cell width and height.
    #[arg(long, num_args = 2, value_names = ["W", "H"], default_values_t = [16, 16])]
    grid: Vec<u32>,

    /// Start cell, optionally followed by an end cell.
    #[arg(long, num_args = 1..=2, required = true)]
    pos: Vec<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Bake(args) => cmd_bake(args).await,
        Command::Rect(args) => cmd_rect(args),
    }
}

async fn cmd_bake(args: BakeArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let asset_root = manifest.resolve_asset_root(&args.manifest);
    info!(
        "Baking {} images from {}",
        manifest.images.len(),
        asset_root.display()
    );

    let engine = HeadlessEngine::new(&asset_root);
    let mut pipeline = ImagePipeline::new(engine, manifest.config);
    let report = pipeline
        .load(manifest.images)
        .await
        .context("loading image batch")?;

    let images: BTreeMap<_, _> = pipeline.cache().images().collect();
    let nine_slices: BTreeMap<_, _> = pipeline.cache().nine_slices().collect();
    let faults: BTreeMap<_, _> = report
        .faults
        .iter()
        .map(|(key, err)| (key.as_str(), err.to_string()))
        .collect();

    let baked = serde_json::json!({
        "images": images,
        "nineSlices": nine_slices,
        "faults": faults,
    });
    let json = serde_json::to_string_pretty(&baked)?;

    match &args.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(
                "Wrote {} images and {} nine-slices to {}",
                images.len(),
                nine_slices.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn cmd_rect(args: RectArgs) -> Result<()> {
    let grid = match args.grid[..] {
        [width, height] => GridSize::new(width, height),
        _ => anyhow::bail!("--grid takes a width and a height"),
    };
    let pos = match args.pos[..] {
        [cell] => SlicePos::Cell(cell),
        [start, end] => SlicePos::from((start, end)),
        _ => anyhow::bail!("--pos takes one or two cells"),
    };

    let rect = slice_to_rect(args.width, &pos, grid)?;
    println!("{}", serde_json::to_string(&rect)?);
    Ok(())
}
