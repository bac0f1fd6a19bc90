//! Per-category styling and render configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Visual attributes of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleAttributes {
    /// Fill color; `None` takes the unit's color from the color assignment
    #[serde(rename = "fillColor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(rename = "color")]
    pub stroke_color: String,
    pub weight: f64,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
}

/// Pure styling function from category to attributes.
pub type Style = fn(Category) -> StyleAttributes;

/// Reference red, neighbours sky blue, coast outlined in green, rest gray.
pub fn relationship_style(category: Category) -> StyleAttributes {
    let (fill, stroke, weight) = match category {
        Category::Reference => ("red", "white", 0.5),
        Category::Adjacent => ("skyblue", "white", 0.5),
        Category::Coastal => ("lightgray", "green", 1.5),
        Category::Other => ("lightgray", "white", 0.5),
    };
    StyleAttributes {
        fill_color: Some(fill.to_string()),
        stroke_color: stroke.to_string(),
        weight,
        fill_opacity: 1.0,
    }
}

/// Fill from the color assignment with a thin black outline.
pub fn palette_style(_category: Category) -> StyleAttributes {
    StyleAttributes {
        fill_color: None,
        stroke_color: "black".to_string(),
        weight: 1.0,
        fill_opacity: 0.7,
    }
}

/// Fill from the value ramp with a faint outline.
pub fn choropleth_style(_category: Category) -> StyleAttributes {
    StyleAttributes {
        fill_color: None,
        stroke_color: "gray".to_string(),
        weight: 0.5,
        fill_opacity: 0.8,
    }
}

/// Uniform fill, for plain outline maps.
pub fn plain_style(_category: Category) -> StyleAttributes {
    StyleAttributes {
        fill_color: Some("#3288bd".to_string()),
        stroke_color: "black".to_string(),
        weight: 1.0,
        fill_opacity: 0.7,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    #[default]
    Palette,
    Relationship,
    Plain,
    Choropleth,
}

impl StyleKind {
    pub fn style(&self) -> Style {
        match self {
            StyleKind::Palette => palette_style,
            StyleKind::Relationship => relationship_style,
            StyleKind::Plain => plain_style,
            StyleKind::Choropleth => choropleth_style,
        }
    }
}

/// Legend text per category. `{reference}` is replaced by the reference
/// unit's display name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LegendLabels {
    pub reference: String,
    pub adjacent: String,
    pub coastal: String,
    pub other: String,
    /// Caption over the graded legend of value maps
    pub value: String,
}

impl Default for LegendLabels {
    fn default() -> Self {
        Self {
            reference: "{reference}".to_string(),
            adjacent: "Adjacent to {reference}".to_string(),
            coastal: "Faces the sea".to_string(),
            other: "Other".to_string(),
            value: "Value".to_string(),
        }
    }
}

impl LegendLabels {
    pub fn label(&self, category: Category, reference_name: &str) -> String {
        let template = match category {
            Category::Reference => &self.reference,
            Category::Adjacent => &self.adjacent,
            Category::Coastal => &self.coastal,
            Category::Other => &self.other,
        };
        template.replace("{reference}", reference_name)
    }
}

/// Rendering options handed to the composer explicitly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    pub zoom_start: u8,
    pub tile_url: String,
    pub tile_attribution: String,
    /// Font family per platform (`windows`, `macos`, `linux`, ...)
    pub fonts: BTreeMap<String, String>,
    /// Tooltip label shown before the unit name
    pub tooltip_alias: String,
    pub style: StyleKind,
    pub legend: LegendLabels,
    /// Show the legend even for single-category maps
    pub always_legend: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "Administrative boundaries".to_string(),
            zoom_start: 11,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors".to_string(),
            fonts: BTreeMap::new(),
            tooltip_alias: "Name".to_string(),
            style: StyleKind::default(),
            legend: LegendLabels::default(),
            always_legend: false,
        }
    }
}

impl RenderConfig {
    /// Font for a platform name as reported by `std::env::consts::OS`
    pub fn font_for(&self, platform: &str) -> &str {
        self.fonts
            .get(platform)
            .or_else(|| self.fonts.get("default"))
            .map(String::as_str)
            .unwrap_or("sans-serif")
    }

    pub fn font(&self) -> &str {
        self.font_for(std::env::consts::OS)
    }
}
