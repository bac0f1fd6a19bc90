//! Self-contained Leaflet page.

use geojson::{FeatureCollection, JsonObject, JsonValue};

use super::export::unit_feature;
use super::{MapComposer, MapRequest, RenderConfig};
use crate::error::Result;
use crate::models::Category;
use crate::pipeline::{Rgb, ValueScale};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const FALLBACK_FILL: &str = "lightgray";

pub struct HtmlComposer {
    config: RenderConfig,
}

struct LegendEntry {
    label: String,
    fill: String,
    stroke: String,
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Legend label, rounded to two decimals
fn format_value(value: f64) -> String {
    format!("{}", (value * 100.0).round() / 100.0)
}

/// JSON safe to place inside a `<script>` element
fn script_json(json: String) -> String {
    json.replace("</", "<\\/")
}

impl HtmlComposer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn features(&self, request: &MapRequest<'_>) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(request.units.len());
        for classified in request.units {
            let unit = &classified.unit;
            let mut attributes = (request.style)(classified.category);
            if attributes.fill_color.is_none() {
                attributes.fill_color = Some(
                    request
                        .colors
                        .hex(unit.code.as_str())
                        .unwrap_or_else(|| FALLBACK_FILL.to_string()),
                );
            }

            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), JsonValue::String(unit.display_name.clone()));
            properties.insert("code".to_string(), JsonValue::String(unit.code.to_string()));
            properties.insert(
                "category".to_string(),
                JsonValue::String(classified.category.to_string()),
            );
            properties.insert("style".to_string(), serde_json::to_value(&attributes)?);

            features.push(unit_feature(unit, properties));
        }
        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Per-unit entries when fills come from the palette, per-category otherwise
    fn legend(&self, request: &MapRequest<'_>) -> Vec<LegendEntry> {
        let palette = request
            .units
            .first()
            .map(|u| (request.style)(u.category).fill_color.is_none())
            .unwrap_or(false);

        if palette {
            let mut entries: Vec<LegendEntry> = request
                .units
                .iter()
                .map(|classified| LegendEntry {
                    label: classified.unit.display_name.clone(),
                    fill: request
                        .colors
                        .hex(classified.unit.code.as_str())
                        .unwrap_or_else(|| FALLBACK_FILL.to_string()),
                    stroke: (request.style)(classified.category).stroke_color,
                })
                .collect();
            entries.sort_by(|a, b| a.label.cmp(&b.label));
            entries.dedup_by(|a, b| a.label == b.label);
            return entries;
        }

        let reference_name = request.reference_name.unwrap_or("");
        Category::all()
            .iter()
            .filter(|category| request.units.iter().any(|u| u.category == **category))
            .map(|&category| {
                let attributes = (request.style)(category);
                LegendEntry {
                    label: self.config.legend.label(category, reference_name),
                    fill: attributes.fill_color.unwrap_or_else(|| FALLBACK_FILL.to_string()),
                    stroke: attributes.stroke_color,
                }
            })
            .collect()
    }

    fn legend_html(&self, entries: &[LegendEntry]) -> String {
        if entries.len() < 2 && !(self.config.always_legend && !entries.is_empty()) {
            return String::new();
        }
        let rows: String = entries
            .iter()
            .map(|entry| {
                format!(
                    "    <div class=\"legend-row\"><span class=\"swatch\" style=\"background:{};border-color:{}\"></span>{}</div>\n",
                    escape_html(&entry.fill),
                    escape_html(&entry.stroke),
                    escape_html(&entry.label)
                )
            })
            .collect();
        format!("<div class=\"legend\">\n{}</div>\n", rows)
    }

    /// Gradient bar over the scale's range with evenly spaced labels
    fn scale_legend_html(&self, scale: &ValueScale) -> String {
        let stops: Vec<String> = scale.ramp.stops().iter().map(Rgb::to_hex).collect();
        let ticks = if scale.max > scale.min { scale.ticks(3) } else { scale.ticks(1) };
        let labels: String = ticks
            .iter()
            .map(|v| format!("<span>{}</span>", escape_html(&format_value(*v))))
            .collect();
        format!(
            "<div class=\"legend\">\n    <div class=\"legend-title\">{}</div>\n    <div class=\"ramp\" style=\"background:linear-gradient(to right, {})\"></div>\n    <div class=\"ramp-labels\">{}</div>\n</div>\n",
            escape_html(&self.config.legend.value),
            stops.join(", "),
            labels
        )
    }
}

impl MapComposer for HtmlComposer {
    fn compose(&self, request: &MapRequest<'_>) -> Result<String> {
        let data = script_json(self.features(request)?.to_string());
        let alias = script_json(serde_json::to_string(&self.config.tooltip_alias)?);
        let tiles = script_json(serde_json::to_string(&self.config.tile_url)?);
        let attribution = script_json(serde_json::to_string(&self.config.tile_attribution)?);
        let [lat, lon] = request.frame.center_lat_lon();
        let legend = match request.scale {
            Some(scale) => self.scale_legend_html(scale),
            None => self.legend_html(&self.legend(request)),
        };
        let title = escape_html(&self.config.title);
        let font = escape_html(self.config.font());

        let mut page = String::with_capacity(data.len() + 4096);
        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!("<title>{}</title>\n", title));
        page.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", LEAFLET_CSS));
        page.push_str(&format!("<script src=\"{}\"></script>\n", LEAFLET_JS));
        page.push_str("<style>\n");
        page.push_str(&format!(
            "html, body {{ height: 100%; margin: 0; font-family: '{}', sans-serif; }}\n",
            font
        ));
        page.push_str("#map { position: absolute; top: 2.5em; bottom: 0; width: 100%; }\n");
        page.push_str("h1 { margin: 0; padding: 0.3em 0.6em; font-size: 1.2em; }\n");
        page.push_str(".legend { position: absolute; right: 1em; bottom: 2em; z-index: 1000; background: white; padding: 0.5em 0.8em; border: 1px solid #999; }\n");
        page.push_str(".ramp { width: 12em; height: 0.8em; border: 1px solid #999; }\n");
        page.push_str(".ramp-labels { display: flex; justify-content: space-between; font-size: 0.8em; }\n");
        page.push_str(".swatch { display: inline-block; width: 1em; height: 1em; margin-right: 0.4em; border: 1px solid; vertical-align: middle; }\n");
        page.push_str("</style>\n</head>\n<body>\n");
        page.push_str(&format!("<h1>{}</h1>\n<div id=\"map\"></div>\n", title));
        page.push_str(&legend);
        page.push_str("<script>\n");
        page.push_str(&format!(
            "var map = L.map('map').setView([{}, {}], {});\n",
            lat, lon, self.config.zoom_start
        ));
        page.push_str(&format!(
            "L.tileLayer({}, {{ attribution: {} }}).addTo(map);\n",
            tiles, attribution
        ));
        page.push_str(&format!("var units = {};\n", data));
        page.push_str(&format!("var alias = {};\n", alias));
        // Unit names are data, so the tooltip gets them as a text node
        page.push_str(
            "L.geoJSON(units, {\n  style: function (f) { return f.properties.style; },\n  onEachFeature: function (f, layer) {\n    var label = document.createElement('span');\n    label.textContent = alias + ': ' + f.properties.name;\n    layer.bindTooltip(label);\n  }\n}).addTo(map);\n",
        );
        page.push_str("</script>\n</body>\n</html>\n");

        Ok(page)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}
