//! TOML run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::compose::{check_file_name, RenderConfig};
use crate::pipeline::{AggregateStep, ClassifyStep, ColorAssigner, FieldMatch, Pipeline, ValueStep};
use crate::source::GeometrySource;

#[derive(Debug, Deserialize, Clone)]
pub struct AtlasConfig {
    pub source: GeometrySource,
    #[serde(default)]
    pub filter: Vec<FieldMatch>,
    #[serde(default)]
    pub aggregate: Option<AggregateStep>,
    #[serde(default)]
    pub relationships: Option<ClassifyStep>,
    /// Per-unit values; colors follow a ramp instead of the palette
    #[serde(default)]
    pub values: Option<ValueStep>,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColorConfig {
    pub saturation: f64,
    pub value: f64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            saturation: crate::pipeline::color::DEFAULT_SATURATION,
            value: crate::pipeline::color::DEFAULT_VALUE,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Created if absent
    pub dir: PathBuf,
    pub file: String,
    /// Also export the reduced collection as GeoJSON under this name
    pub geojson: Option<String>,
    /// Print unique sorted unit names to stdout
    pub list_names: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("html"),
            file: "map.html".to_string(),
            geojson: None,
            list_names: true,
        }
    }
}

impl OutputConfig {
    /// Output names must be bare file names inside `dir`
    pub fn validate(&self) -> Result<()> {
        check_file_name(&self.file).context("Invalid [output] file")?;
        if let Some(name) = &self.geojson {
            check_file_name(name).context("Invalid [output] geojson")?;
        }
        Ok(())
    }
}

impl AtlasConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AtlasConfig = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        let colors = ColorAssigner::new(self.colors.saturation, self.colors.value)
            .context("Invalid [colors] section")?;
        Ok(Pipeline {
            filter: self.filter.clone(),
            aggregate: self.aggregate.clone(),
            classify: self.relationships.clone(),
            values: self.values.clone(),
            colors,
        })
    }
}
