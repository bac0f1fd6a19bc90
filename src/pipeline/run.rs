//! Stage orchestration: filter, aggregate, classify, color, frame.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use super::aggregate::{dissolve, AggregateCode, DissolveOptions};
use super::classify::{unclassified, Classification, MissingCodePolicy, RelationshipClassifier};
use super::color::{ColorAssigner, ColorAssignment};
use super::filter::{filter_units, Predicate};
use super::frame::MapFrame;
use super::scale::{Ramp, ValueScale};
use crate::compose::{MapRequest, Style};
use crate::error::{AtStage, AtlasError, Stage, StageError};
use crate::models::{AdminCollection, AggregationKey, Category, RelationshipTable, UnitCode};
use crate::relations::RelationshipSource;
use crate::source::load_values;

/// `field` must equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggregateStep {
    /// Hierarchy field to group by
    pub field: String,
    #[serde(default)]
    pub code: AggregateCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassifyStep {
    pub source: RelationshipSource,
    /// Unit code of the reference unit, or its name in the table
    pub reference: String,
    #[serde(default)]
    pub missing_code: MissingCodePolicy,
}

fn default_code_column() -> String {
    "code".to_string()
}

fn default_value_column() -> String {
    "value".to_string()
}

/// Color units by a numeric value instead of the categorical palette.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueStep {
    /// CSV file of per-unit values
    pub path: PathBuf,
    #[serde(default = "default_code_column")]
    pub code_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default)]
    pub ramp: Ramp,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub filter: Vec<FieldMatch>,
    pub aggregate: Option<AggregateStep>,
    pub classify: Option<ClassifyStep>,
    pub values: Option<ValueStep>,
    pub colors: ColorAssigner,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Filtered and aggregated units
    pub collection: AdminCollection,
    pub classification: Classification,
    /// Colors keyed by unit code
    pub colors: ColorAssignment,
    pub frame: MapFrame,
    pub reference_name: Option<String>,
    /// Set when colors come from per-unit values
    pub scale: Option<ValueScale>,
}

impl PipelineOutput {
    pub fn request(&self, style: Style) -> MapRequest<'_> {
        MapRequest {
            units: &self.classification.units,
            colors: &self.colors,
            frame: self.frame,
            style,
            reference_name: self.reference_name.as_deref(),
            scale: self.scale.as_ref(),
        }
    }

    /// Unique display names, sorted
    pub fn sorted_names(&self) -> Vec<String> {
        self.collection.sorted_names()
    }
}

/// Code given directly, or looked up by name in the table
fn resolve_reference(reference: &str, table: &RelationshipTable, collection: &AdminCollection) -> UnitCode {
    let code = UnitCode::from(reference);
    if table.contains(&code) || collection.iter().any(|u| u.code == code) {
        return code;
    }
    if let Some(found) = table.code_for_name(code.as_str()) {
        return found.clone();
    }
    collection
        .iter()
        .find(|u| u.display_name == code.as_str())
        .map(|u| u.code.clone())
        .unwrap_or(code)
}

impl Pipeline {
    /// Filter then aggregate.
    pub fn reduce(&self, collection: &AdminCollection) -> Result<AdminCollection, StageError> {
        let schema = collection.schema();
        let predicates = self
            .filter
            .iter()
            .map(|m| Predicate::on_field(&m.field, m.value.clone(), schema))
            .collect::<crate::error::Result<Vec<_>>>()
            .at_stage(Stage::Filter)?;
        let filtered = filter_units(collection, &predicates).at_stage(Stage::Filter)?;

        match &self.aggregate {
            Some(step) => {
                let key = AggregationKey::from_field(&step.field, filtered.schema()).at_stage(Stage::Aggregate)?;
                let options = DissolveOptions { code: step.code };
                let dissolved = dissolve(&filtered, key, &options).at_stage(Stage::Aggregate)?;
                if dissolved.is_empty() {
                    return Err(StageError::new(
                        Stage::Aggregate,
                        AtlasError::EmptyResult {
                            predicates: format!("a non-empty '{}' value", step.field),
                        },
                    ));
                }
                Ok(dissolved)
            }
            None => Ok(filtered),
        }
    }

    pub fn run(&self, collection: &AdminCollection) -> Result<PipelineOutput, StageError> {
        let collection = self.reduce(collection)?;

        let (classification, reference_name) = match &self.classify {
            Some(step) => {
                let table = step.source.load(&collection).at_stage(Stage::Relationships)?;
                let reference = resolve_reference(&step.reference, &table, &collection);
                let classification = RelationshipClassifier::new(&table, step.missing_code)
                    .classify(&collection, &reference)
                    .at_stage(Stage::Classify)?;

                if !classification.unknown_codes.is_empty() {
                    warn!(
                        "{} units had no relationship entry",
                        classification.unknown_codes.len()
                    );
                }

                let name = classification
                    .units
                    .iter()
                    .find(|u| u.category == Category::Reference)
                    .map(|u| u.unit.display_name.clone())
                    .or_else(|| table.get(&reference).and_then(|r| r.name.clone()))
                    .unwrap_or_else(|| reference.to_string());
                (classification, Some(name))
            }
            None => (unclassified(&collection), None),
        };

        let (colors, scale) = match &self.values {
            Some(step) => {
                let (colors, scale) = value_colors(step, &collection).at_stage(Stage::Values)?;
                (colors, Some(scale))
            }
            None => {
                let colors = self
                    .colors
                    .assign_keys(collection.iter().map(|u| u.code.as_str()))
                    .at_stage(Stage::Color)?;
                (colors, None)
            }
        };

        let frame = MapFrame::of(&collection)
            .ok_or_else(|| AtlasError::invalid("collection has no measurable geometry"))
            .at_stage(Stage::Compose)?;

        info!(
            "Pipeline produced {} units, centered at {:?}",
            collection.len(),
            frame.center_lat_lon()
        );

        Ok(PipelineOutput {
            collection,
            classification,
            colors,
            frame,
            reference_name,
            scale,
        })
    }
}

/// Ramp colors for units with a value; units without one stay uncolored.
fn value_colors(step: &ValueStep, collection: &AdminCollection) -> crate::error::Result<(ColorAssignment, ValueScale)> {
    let table = load_values(&step.path, &step.code_column, &step.value_column)?;
    let values: Vec<(&str, f64)> = collection
        .iter()
        .filter_map(|u| table.get(&u.code).map(|v| (u.code.as_str(), v)))
        .collect();

    let scale = ValueScale::spanning(values.iter().map(|(_, v)| *v), step.ramp).ok_or_else(|| {
        AtlasError::invalid(format!("no unit code matches a row of {}", step.path.display()))
    })?;

    let missing = collection.len() - values.len();
    if missing > 0 {
        warn!("{} units have no value and are drawn without a ramp color", missing);
    }
    info!("Values range from {} to {}", scale.min, scale.max);

    Ok((scale.assign(values), scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{relationship_style, HtmlComposer, MapComposer, RenderConfig};
    use crate::models::{AdminUnit, HierarchySchema};
    use geo::{MultiPolygon, Rect};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Rect::new((x, y), (x + 1.0, y + 1.0)).to_polygon()])
    }

    /// Region X holds A, B, C with A touching B; region Y holds D.
    fn regions() -> AdminCollection {
        let schema = HierarchySchema::new(["region", "unit"]).unwrap();
        let unit = |code: &str, region: &str, x: f64| {
            AdminUnit::new(
                code,
                vec![Some(region.to_string()), Some(code.to_string())],
                code,
                square(x, 0.0),
            )
        };
        AdminCollection::new(
            schema,
            vec![
                unit("A", "X", 0.0),
                unit("B", "X", 1.0),
                unit("C", "X", 5.0),
                unit("D", "Y", 10.0),
            ],
        )
        .unwrap()
    }

    fn relationships_csv(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("relationships.csv");
        std::fs::write(
            &path,
            "code,name,coastal,adjacent\nA,A,false,B\nB,B,false,A\nC,C,true,\nD,D,false,\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_three_unit_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline {
            filter: vec![FieldMatch {
                field: "region".into(),
                value: "X".into(),
            }],
            classify: Some(ClassifyStep {
                source: RelationshipSource::Csv {
                    path: relationships_csv(dir.path()),
                },
                reference: "A".into(),
                missing_code: MissingCodePolicy::Fail,
            }),
            ..Pipeline::default()
        };

        let output = pipeline.run(&regions()).unwrap();
        let categories: Vec<(&str, Category)> = output
            .classification
            .units
            .iter()
            .map(|u| (u.unit.code.as_str(), u.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("A", Category::Reference),
                ("B", Category::Adjacent),
                ("C", Category::Coastal)
            ]
        );
        assert_eq!(output.colors.len(), 3);
        assert_eq!(output.sorted_names(), vec!["A", "B", "C"]);
        assert_eq!(output.reference_name.as_deref(), Some("A"));
        assert_eq!(output.frame.center_lat_lon(), [0.5, 2.5]);

        let page = HtmlComposer::new(RenderConfig::default())
            .compose(&output.request(relationship_style))
            .unwrap();
        assert!(page.contains("Adjacent to A"));
    }

    #[test]
    fn test_aggregate_then_color() {
        let pipeline = Pipeline {
            aggregate: Some(AggregateStep {
                field: "region".into(),
                code: AggregateCode::KeyValue,
            }),
            ..Pipeline::default()
        };
        let output = pipeline.run(&regions()).unwrap();

        assert_eq!(output.collection.len(), 2);
        assert!(output.colors.hex("X").is_some());
        assert!(output.colors.hex("Y").is_some());
        assert!(output
            .classification
            .units
            .iter()
            .all(|u| u.category == Category::Other));
        assert_eq!(output.reference_name, None);
    }

    #[test]
    fn test_failures_name_their_stage() {
        let empty = Pipeline {
            filter: vec![FieldMatch {
                field: "region".into(),
                value: "Z".into(),
            }],
            ..Pipeline::default()
        };
        let err = empty.run(&regions()).unwrap_err();
        assert_eq!(err.stage, Stage::Filter);
        assert!(matches!(err.source, AtlasError::EmptyResult { .. }));

        let bad_field = Pipeline {
            aggregate: Some(AggregateStep {
                field: "prefecture".into(),
                code: AggregateCode::KeyValue,
            }),
            ..Pipeline::default()
        };
        assert_eq!(bad_field.run(&regions()).unwrap_err().stage, Stage::Aggregate);

        let dir = tempfile::tempdir().unwrap();
        let unknown = Pipeline {
            classify: Some(ClassifyStep {
                source: RelationshipSource::Csv {
                    path: relationships_csv(dir.path()),
                },
                reference: "A".into(),
                missing_code: MissingCodePolicy::Fail,
            }),
            ..Pipeline::default()
        };
        let mut collection = regions().into_units();
        collection.push(AdminUnit::new(
            "E",
            vec![Some("Y".into()), Some("E".into())],
            "E",
            square(20.0, 0.0),
        ));
        let collection = AdminCollection::new(HierarchySchema::new(["region", "unit"]).unwrap(), collection).unwrap();
        let err = unknown.run(&collection).unwrap_err();
        assert_eq!(err.stage, Stage::Classify);
        assert!(matches!(err.source, AtlasError::UnknownCode(_)));
    }

    #[test]
    fn test_values_color_by_ramp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.csv");
        std::fs::write(&path, "code,value\nA,100\nB,300\nZ,999\n").unwrap();

        let pipeline = Pipeline {
            values: Some(ValueStep {
                path: path.clone(),
                code_column: "code".into(),
                value_column: "value".into(),
                ramp: Ramp::Viridis,
            }),
            ..Pipeline::default()
        };
        let output = pipeline.run(&regions()).unwrap();

        // Z has no unit, so the range is that of A and B only
        let scale = output.scale.unwrap();
        assert_eq!((scale.min, scale.max), (100.0, 300.0));
        assert_eq!(output.colors.hex("A").as_deref(), Some("#440154"));
        assert_eq!(output.colors.hex("B").as_deref(), Some("#fde725"));
        assert_eq!(output.colors.get("C"), None);
        assert!(output.request(crate::compose::choropleth_style).scale.is_some());

        std::fs::write(&path, "code,value\nZ,1\n").unwrap();
        let err = pipeline.run(&regions()).unwrap_err();
        assert_eq!(err.stage, Stage::Values);
        assert!(matches!(err.source, AtlasError::InvalidArgument(_)));
    }

    #[test]
    fn test_reference_by_name() {
        let table: RelationshipTable = crate::relations::japan::prefectures();
        let schema = HierarchySchema::new(["pref"]).unwrap();
        let collection = AdminCollection::new(
            schema,
            vec![AdminUnit::new("13", vec![Some("東京都".into())], "東京都", square(0.0, 0.0))],
        )
        .unwrap();
        assert_eq!(resolve_reference("東京都", &table, &collection).as_str(), "13");
        assert_eq!(resolve_reference("13", &table, &collection).as_str(), "13");
    }
}
