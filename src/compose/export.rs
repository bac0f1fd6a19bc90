//! GeoJSON re-serialization of a collection.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

use crate::models::{AdminCollection, AdminUnit};

/// Feature for a unit with the given properties
pub fn unit_feature(unit: &AdminUnit, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&unit.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Properties keyed by the source field names, plus `code` and `name`.
fn attribute_properties(unit: &AdminUnit, fields: &[String]) -> JsonObject {
    let mut properties = JsonObject::new();
    for (field, value) in fields.iter().zip(&unit.hierarchy) {
        let value = match value {
            Some(v) => JsonValue::String(v.clone()),
            None => JsonValue::Null,
        };
        properties.insert(field.clone(), value);
    }
    properties.insert("code".to_string(), JsonValue::String(unit.code.to_string()));
    properties.insert("name".to_string(), JsonValue::String(unit.display_name.clone()));
    properties
}

pub fn to_feature_collection(collection: &AdminCollection) -> FeatureCollection {
    let fields = collection.schema().fields();
    let features = collection
        .iter()
        .map(|unit| unit_feature(unit, attribute_properties(unit, fields)))
        .collect();

    let foreign_members = collection.crs().map(|crs| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({ "type": "name", "properties": { "name": crs } }),
        );
        members
    });

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}
