//! ESRI shapefile input (`.shp` with its `.dbf` attributes).

use std::fs;
use std::path::Path;

use geo::MultiPolygon;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Reader, Shape};
use tracing::{debug, info};

use super::{progress_bar, FieldMapping};
use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, AdminUnit};

fn field_text(record: &Record, field: &str) -> Option<String> {
    let text = match record.get(field)? {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Memo(s) => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format_number(*n)),
        FieldValue::Float(Some(n)) => Some(format_number(f64::from(*n))),
        FieldValue::Double(n) => Some(format_number(*n)),
        FieldValue::Integer(n) => Some(n.to_string()),
        _ => None,
    };
    text.filter(|s| !s.is_empty())
}

/// dBase stores integer codes as floating point numerics
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn to_multipolygon(shape: Shape, location: &str) -> Result<Option<MultiPolygon<f64>>> {
    let convert = |e: String| AtlasError::data_fetch(location, format!("failed to convert polygon: {}", e));
    let geometry = match shape {
        Shape::Polygon(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| convert(format!("{:?}", e)))?
        }
        Shape::PolygonM(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| convert(format!("{:?}", e)))?
        }
        Shape::PolygonZ(polygon) => {
            MultiPolygon::<f64>::try_from(polygon).map_err(|e| convert(format!("{:?}", e)))?
        }
        _ => return Ok(None),
    };
    Ok(Some(geometry))
}

/// Read a shapefile; the CRS is taken from a sibling `.prj` when present.
pub fn read_shapefile(path: &Path, fields: &FieldMapping) -> Result<AdminCollection> {
    let location = path.display().to_string();
    let mut reader = Reader::from_path(path).map_err(|e| AtlasError::data_fetch(&location, e))?;

    let schema = fields.schema()?;
    let progress = progress_bar(None);
    let mut units = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.map_err(|e| AtlasError::data_fetch(&location, e))?;
        progress.inc(1);

        if index == 0 {
            if let Some(missing) = fields.required().find(|f| record.get(f).is_none()) {
                return Err(AtlasError::data_fetch(
                    &location,
                    format!("attribute field '{}' not found", missing),
                ));
            }
        }

        let Some(geometry) = to_multipolygon(shape, &location)? else {
            skipped += 1;
            continue;
        };

        let hierarchy = fields
            .levels
            .iter()
            .map(|field| field_text(&record, field))
            .collect();
        let display_name = field_text(&record, fields.name_field()).unwrap_or_default();
        let code = fields
            .code
            .as_ref()
            .and_then(|f| field_text(&record, f))
            .unwrap_or_else(|| display_name.clone());

        units.push(AdminUnit::new(code, hierarchy, display_name, geometry));
    }

    progress.finish_and_clear();

    if skipped > 0 {
        debug!("Skipped {} non-polygon shapes", skipped);
    }
    info!("Loaded {} units from {}", units.len(), location);

    let crs = fs::read_to_string(path.with_extension("prj"))
        .ok()
        .map(|wkt| wkt.trim().to_string())
        .filter(|wkt| !wkt.is_empty());

    Ok(AdminCollection::new(schema, units)?.with_crs(crs))
}
