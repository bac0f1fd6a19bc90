//! Boundary map renderer.
//!
//! Loads boundary geometry, filters and aggregates it, classifies units
//! against a reference, and writes an interactive HTML map.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use boundary_atlas::compose::{to_feature_collection, write_atomic_all, HtmlComposer, MapComposer};
use boundary_atlas::config::AtlasConfig;
use boundary_atlas::error::{AtStage, Stage};

#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(about = "Render an administrative boundary map")]
struct Args {
    /// Run configuration (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log per-unit detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AtlasConfig::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    info!("Boundary Atlas");
    info!("Source: {}", config.source.location);

    // Reject bad output names before any work is done
    config.output.validate()?;

    let pipeline = config.pipeline()?;
    let collection = config.source.load().at_stage(Stage::Load)?;
    let output = pipeline.run(&collection)?;

    let composer = HtmlComposer::new(config.render.clone());
    let page = composer
        .compose(&output.request(config.render.style.style()))
        .at_stage(Stage::Compose)?;
    let export = config
        .output
        .geojson
        .as_ref()
        .map(|name| (name, to_feature_collection(&output.collection).to_string()));

    // Nothing is written until every stage has succeeded, and then all
    // outputs are persisted together
    let dir = args.output_dir.unwrap_or_else(|| config.output.dir.clone());
    let mut files: Vec<(&str, &[u8])> = vec![(config.output.file.as_str(), page.as_bytes())];
    if let Some((name, text)) = &export {
        files.push((name.as_str(), text.as_bytes()));
    }
    for path in write_atomic_all(&dir, &files).at_stage(Stage::Write)? {
        info!("Wrote {}", path.display());
    }

    if config.output.list_names {
        for name in output.sorted_names() {
            println!("{}", name);
        }
    }

    Ok(())
}
