//! GeoJSON FeatureCollection input.

use std::io::Read;

use geo::{Geometry, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use super::{progress_bar, FieldMapping};
use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, AdminUnit};

/// Attribute value as text; numbers are rendered without quotes, null is absent
fn property_text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Legacy `crs` member: `{"type": "name", "properties": {"name": "..."}}`
fn named_crs(collection: &FeatureCollection) -> Option<String> {
    collection
        .foreign_members
        .as_ref()?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(String::from)
}

/// Lift polygonal geometry to a multipolygon; other kinds are skipped
pub(crate) fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .into_iter()
                .filter_map(polygonal)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

/// Parse a FeatureCollection into an [`AdminCollection`].
pub fn read_geojson<R: Read>(reader: R, fields: &FieldMapping, location: &str) -> Result<AdminCollection> {
    let geojson = GeoJson::from_reader(reader).map_err(|e| AtlasError::data_fetch(location, e))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(AtlasError::data_fetch(
                location,
                "GeoJSON must be a FeatureCollection",
            ))
        }
    };

    let crs = named_crs(&collection);
    let schema = fields.schema()?;
    let progress = progress_bar(Some(collection.features.len() as u64));
    let mut units = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;
    let mut validated = false;

    for (index, feature) in collection.features.into_iter().enumerate() {
        progress.inc(1);

        let geometry = match feature.geometry {
            Some(g) => Geometry::<f64>::try_from(g.value)
                .map_err(|e| AtlasError::data_fetch(location, format!("feature {}: {}", index, e)))?,
            None => {
                skipped += 1;
                continue;
            }
        };
        let Some(geometry) = polygonal(geometry) else {
            skipped += 1;
            continue;
        };

        let properties = feature.properties.unwrap_or_default();
        let hierarchy: Vec<Option<String>> = fields
            .levels
            .iter()
            .map(|field| property_text(properties.get(field)))
            .collect();

        // Field names are checked once, on the first feature that is kept
        if !validated {
            if let Some(missing) = fields.required().find(|f| !properties.contains_key(*f)) {
                return Err(AtlasError::data_fetch(
                    location,
                    format!("attribute field '{}' not found", missing),
                ));
            }
            validated = true;
        }

        let display_name = property_text(properties.get(fields.name_field())).unwrap_or_default();
        let code = fields
            .code
            .as_ref()
            .and_then(|f| property_text(properties.get(f)))
            .unwrap_or_else(|| display_name.clone());

        units.push(AdminUnit::new(code, hierarchy, display_name, geometry));
    }

    progress.finish_and_clear();

    if skipped > 0 {
        debug!("Skipped {} features without polygonal geometry", skipped);
    }
    info!("Loaded {} units from {}", units.len(), location);

    Ok(AdminCollection::new(schema, units)?.with_crs(crs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::6668"}},
        "features": [
            {
                "type": "Feature",
                "properties": {"N03_001": "神奈川県", "N03_002": null, "N03_003": "横浜市", "N03_004": "鶴見区", "N03_007": "14101"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"N03_001": "神奈川県", "N03_002": null, "N03_003": "横浜市", "N03_004": "神奈川区", "N03_007": 14102},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[1,0],[2,0],[2,1],[1,1],[1,0]]]]}
            },
            {
                "type": "Feature",
                "properties": {"N03_001": "神奈川県", "N03_004": "marker"},
                "geometry": {"type": "Point", "coordinates": [5, 5]}
            }
        ]
    }"#;

    fn fields() -> FieldMapping {
        FieldMapping {
            levels: vec![
                "N03_001".into(),
                "N03_002".into(),
                "N03_003".into(),
                "N03_004".into(),
            ],
            code: Some("N03_007".into()),
            name: None,
        }
    }

    #[test]
    fn test_read_sample() {
        let collection = read_geojson(SAMPLE.as_bytes(), &fields(), "sample").unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.crs(), Some("urn:ogc:def:crs:EPSG::6668"));

        let first = &collection.units()[0];
        assert_eq!(first.code.as_str(), "14101");
        assert_eq!(first.display_name, "鶴見区");
        assert_eq!(first.level(0), Some("神奈川県"));
        assert_eq!(first.level(1), None);
        assert_eq!(first.level(2), Some("横浜市"));

        let second = &collection.units()[1];
        assert_eq!(second.code.as_str(), "14102");
        assert_eq!(second.geometry.0.len(), 1);
    }

    #[test]
    fn test_missing_field_is_fetch_failure() {
        let mut fields = fields();
        fields.levels[0] = "PREF".into();
        let err = read_geojson(SAMPLE.as_bytes(), &fields, "sample").unwrap_err();
        assert!(matches!(err, AtlasError::DataFetch { .. }));
        assert!(err.to_string().contains("PREF"));
    }

    #[test]
    fn test_missing_field_detected_after_skipped_feature() {
        let input = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"pref": "神奈川県"}, "geometry": null},
            {"type": "Feature", "properties": {"pref": "神奈川県", "ward": "鶴見区"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
        ]}"#;
        let err = read_geojson(input.as_bytes(), &fields(), "skipped-first").unwrap_err();
        assert!(matches!(err, AtlasError::DataFetch { .. }));
        assert!(err.to_string().contains("N03_001"));
    }

    #[test]
    fn test_not_a_collection() {
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(
            read_geojson(point.as_bytes(), &fields(), "point"),
            Err(AtlasError::DataFetch { .. })
        ));
    }

    #[test]
    fn test_unparsable_input() {
        assert!(matches!(
            read_geojson("not json".as_bytes(), &fields(), "junk"),
            Err(AtlasError::DataFetch { .. })
        ));
    }
}
