//! Boundary dissolver.
//!
//! Merges fine-grained boundaries into one polygon per value of a hierarchy
//! field and writes the result as GeoJSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use boundary_atlas::compose::{to_feature_collection, write_atomic};
use boundary_atlas::error::{AtStage, Stage};
use boundary_atlas::pipeline::{AggregateCode, AggregateStep, FieldMatch, Pipeline};
use boundary_atlas::source::{FieldMapping, GeometrySource};

#[derive(Parser, Debug)]
#[command(name = "dissolve")]
#[command(about = "Dissolve administrative boundaries into coarser units")]
struct Args {
    /// GeoJSON, shapefile or zip archive path, or http(s) URL
    #[arg(short, long)]
    input: String,

    /// Hierarchy fields, coarsest first
    #[arg(long, value_delimiter = ',', required = true)]
    levels: Vec<String>,

    /// Field holding the unit code
    #[arg(long)]
    code_field: Option<String>,

    /// File to read inside a zip input
    #[arg(long)]
    member: Option<String>,

    /// Field to dissolve by
    #[arg(long)]
    by: String,

    /// Keep only units where FIELD=VALUE (repeatable)
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// Code dissolved units by the first N characters of their members' codes
    #[arg(long, value_name = "N")]
    code_prefix: Option<usize>,

    /// Output GeoJSON file
    #[arg(short, long)]
    output: PathBuf,

    /// Log per-unit detail
    #[arg(short, long)]
    verbose: bool,
}

fn parse_filter(raw: &str) -> Result<FieldMatch> {
    let Some((field, value)) = raw.split_once('=') else {
        bail!("Filter '{}' is not of the form FIELD=VALUE", raw);
    };
    Ok(FieldMatch {
        field: field.trim().to_string(),
        value: value.trim().to_string(),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let file_name = args
        .output
        .file_name()
        .and_then(|n| n.to_str())
        .context("Output path has no file name")?
        .to_string();
    let dir = match args.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let pipeline = Pipeline {
        filter: args
            .filters
            .iter()
            .map(|f| parse_filter(f))
            .collect::<Result<Vec<_>>>()?,
        aggregate: Some(AggregateStep {
            field: args.by.clone(),
            code: args
                .code_prefix
                .map(AggregateCode::MemberPrefix)
                .unwrap_or_default(),
        }),
        ..Pipeline::default()
    };

    let source = GeometrySource {
        location: args.input.clone(),
        fields: FieldMapping {
            levels: args.levels.clone(),
            code: args.code_field.clone(),
            name: None,
        },
        crs: None,
        member: args.member.clone(),
    };

    let collection = source.load().at_stage(Stage::Load)?;
    let dissolved = pipeline.reduce(&collection)?;
    info!("Dissolved {} units into {}", collection.len(), dissolved.len());

    let text = to_feature_collection(&dissolved).to_string();
    let path = write_atomic(&dir, &file_name, text.as_bytes()).at_stage(Stage::Write)?;
    info!("GeoJSON written to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let parsed = parse_filter("N03_001 = 神奈川県").unwrap();
        assert_eq!(parsed.field, "N03_001");
        assert_eq!(parsed.value, "神奈川県");
        assert!(parse_filter("N03_001").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "dissolve",
            "--input",
            "N03.geojson",
            "--levels",
            "N03_001,N03_003,N03_004",
            "--by",
            "N03_003",
            "--filter",
            "N03_001=神奈川県",
            "--output",
            "out/cities.geojson",
        ]);
        assert_eq!(args.levels.len(), 3);
        assert_eq!(args.filters, vec!["N03_001=神奈川県"]);
        assert_eq!(args.code_prefix, None);
    }
}
