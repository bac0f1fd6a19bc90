//! Geometry sources: GeoJSON, shapefiles and zip archives holding either,
//! read from a local path or an http(s) URL.
//!
//! Loading is a one-shot blocking acquisition performed before any pipeline
//! stage runs. Every failure surfaces as [`AtlasError::DataFetch`].
//!
//! Per-unit values for choropleth maps are read from CSV by [`load_values`].

mod archive;
mod geojson;
mod shapefile;
mod values;

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::info;
use url::Url;

pub use self::geojson::read_geojson;
pub use self::shapefile::read_shapefile;
pub use self::values::{load_values, read_values, ValueTable};

use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, HierarchySchema};

/// Attribute field names in the source data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMapping {
    /// Hierarchy level fields, coarsest first
    pub levels: Vec<String>,
    /// Field holding the unit code; the display name is used when absent
    #[serde(default)]
    pub code: Option<String>,
    /// Field holding the display name; defaults to the finest level
    #[serde(default)]
    pub name: Option<String>,
}

impl FieldMapping {
    pub fn schema(&self) -> Result<HierarchySchema> {
        HierarchySchema::new(self.levels.iter().cloned())
    }

    pub fn name_field(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.levels.last().map(String::as_str))
            .unwrap_or("")
    }

    /// Every field that must exist in the source attributes
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.levels
            .iter()
            .map(String::as_str)
            .chain(self.code.as_deref())
            .chain(self.name.as_deref())
    }
}

pub(crate) fn progress_bar(len: Option<u64>) -> ProgressBar {
    match len {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    }
}

/// Where geometry is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Remote(url),
            _ => Location::Local(PathBuf::from(location)),
        }
    }

    fn path_like(&self) -> &str {
        match self {
            Location::Remote(url) => url.path(),
            Location::Local(path) => path.to_str().unwrap_or(""),
        }
    }

    fn is_gzip(&self) -> bool {
        self.path_like().to_ascii_lowercase().ends_with(".gz")
    }

    /// Lowercase extension, ignoring a trailing `.gz`
    fn format(&self) -> String {
        let name = self.path_like().to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Remote(url) => write!(f, "{}", url),
            Location::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn fetch_remote(url: &Url) -> Result<Vec<u8>> {
    info!("Fetching {}", url);
    let response = reqwest::blocking::get(url.clone()).map_err(|e| AtlasError::data_fetch(url.as_str(), e))?;
    if !response.status().is_success() {
        return Err(AtlasError::data_fetch(
            url.as_str(),
            format!("HTTP {}", response.status()),
        ));
    }
    let bytes = response.bytes().map_err(|e| AtlasError::data_fetch(url.as_str(), e))?;
    info!("Fetched {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

fn read_bytes(location: &Location) -> Result<Vec<u8>> {
    match location {
        Location::Remote(url) => fetch_remote(url),
        Location::Local(path) => fs::read(path).map_err(|e| AtlasError::data_fetch(location.to_string(), e)),
    }
}

/// Open a location for reading, decompressing `.gz` transparently
fn open(location: &Location) -> Result<Box<dyn Read>> {
    let raw: Box<dyn Read> = match location {
        Location::Remote(url) => Box::new(Cursor::new(fetch_remote(url)?)),
        Location::Local(path) => {
            let file = File::open(path).map_err(|e| AtlasError::data_fetch(location.to_string(), e))?;
            Box::new(BufReader::new(file))
        }
    };
    if location.is_gzip() {
        Ok(Box::new(GzDecoder::new(raw)))
    } else {
        Ok(raw)
    }
}

/// A configured geometry source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeometrySource {
    /// Local path or http(s) URL
    pub location: String,
    pub fields: FieldMapping,
    /// Overrides any CRS recorded in the source
    #[serde(default)]
    pub crs: Option<String>,
    /// File to read inside a zip archive; defaults to the first shapefile
    #[serde(default)]
    pub member: Option<String>,
}

impl GeometrySource {
    pub fn load(&self) -> Result<AdminCollection> {
        let location = Location::parse(&self.location);
        info!("Loading boundaries from {}", location);

        let collection = self.load_from(&location)?;

        match &self.crs {
            Some(crs) => Ok(collection.with_crs(Some(crs.clone()))),
            None => Ok(collection),
        }
    }

    fn load_from(&self, location: &Location) -> Result<AdminCollection> {
        let collection = match (location.format().as_str(), location) {
            ("geojson" | "json", _) => {
                read_geojson(open(location)?, &self.fields, &location.to_string())?
            }
            ("shp", Location::Local(path)) => read_shapefile(path, &self.fields)?,
            ("shp", Location::Remote(_)) => {
                return Err(AtlasError::data_fetch(
                    location.to_string(),
                    "remote shapefiles must be packed in a zip archive",
                ))
            }
            ("zip", _) => {
                let name = location.to_string();
                let extracted = archive::extract(read_bytes(location)?, &name)?;
                let member = archive::find_member(extracted.path(), self.member.as_deref(), &name)?;
                info!("Reading {} from {}", member.display(), name);
                if member.extension().map_or(false, |e| e.eq_ignore_ascii_case("zip")) {
                    return Err(AtlasError::data_fetch(name, "nested archives are not supported"));
                }
                // extracted files are removed when `extracted` drops
                self.load_from(&Location::Local(member))?
            }
            (other, _) => {
                return Err(AtlasError::data_fetch(
                    location.to_string(),
                    format!("unsupported geometry format '{}'", other),
                ))
            }
        };
        Ok(collection)
    }
}
