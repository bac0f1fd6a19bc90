//! Sources for the relationship table used by classification.
//!
//! Tables come from the built-in prefecture data, a CSV file, or are
//! derived from the geometry of the collection being classified.

mod adjacency;
pub mod japan;
mod table;

use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

pub use adjacency::derive_adjacency;
pub use table::{load_relationships, read_relationships};

use crate::error::Result;
use crate::models::{AdminCollection, RelationshipTable};

/// Where the relationship table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationshipSource {
    /// 47 Japanese prefectures keyed by two-digit JIS code
    JapanPrefectures,
    /// CSV file with `code,name,coastal,adjacent` columns
    Csv { path: PathBuf },
    /// Adjacency from geometry; coastal flags optionally copied from a CSV
    /// file or the prefecture table
    Derived {
        #[serde(default)]
        coastal_csv: Option<PathBuf>,
        #[serde(default)]
        coastal_from_prefectures: bool,
    },
}

impl RelationshipSource {
    /// Build the table. `collection` is only read for derived tables.
    pub fn load(&self, collection: &AdminCollection) -> Result<RelationshipTable> {
        match self {
            RelationshipSource::JapanPrefectures => {
                info!("Using built-in prefecture relationships");
                Ok(japan::prefectures())
            }
            RelationshipSource::Csv { path } => load_relationships(path),
            RelationshipSource::Derived {
                coastal_csv,
                coastal_from_prefectures,
            } => {
                let mut table = derive_adjacency(collection);
                if *coastal_from_prefectures {
                    table.overlay_coastal(&japan::prefectures());
                }
                if let Some(path) = coastal_csv {
                    table.overlay_coastal(&load_relationships(path)?);
                }
                Ok(table)
            }
        }
    }
}
