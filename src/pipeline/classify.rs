//! Relationship classification against a reference unit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, Category, ClassifiedUnit, RelationshipTable, UnitCode};

/// What to do when a code has no relationship entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCodePolicy {
    /// Treat the unit as not coastal and record a warning
    #[default]
    Degrade,
    /// Abort with [`AtlasError::UnknownCode`]
    Fail,
}

/// Classified units plus the codes that had to be degraded.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub units: Vec<ClassifiedUnit>,
    pub unknown_codes: Vec<UnitCode>,
}

impl Classification {
    pub fn count(&self, category: Category) -> usize {
        self.units.iter().filter(|u| u.category == category).count()
    }
}

pub struct RelationshipClassifier<'a> {
    table: &'a RelationshipTable,
    policy: MissingCodePolicy,
}

impl<'a> RelationshipClassifier<'a> {
    pub fn new(table: &'a RelationshipTable, policy: MissingCodePolicy) -> Self {
        Self { table, policy }
    }

    fn missing(&self, code: &UnitCode, unknown: &mut Vec<UnitCode>) -> Result<()> {
        match self.policy {
            MissingCodePolicy::Fail => Err(AtlasError::UnknownCode(code.clone())),
            MissingCodePolicy::Degrade => {
                warn!("No relationship entry for {}, treating as not coastal", code);
                if !unknown.contains(code) {
                    unknown.push(code.clone());
                }
                Ok(())
            }
        }
    }

    /// Label every unit; first match wins in the order reference, adjacent,
    /// coastal, other.
    pub fn classify(&self, collection: &AdminCollection, reference: &UnitCode) -> Result<Classification> {
        let mut unknown_codes = Vec::new();

        let empty = BTreeSet::new();
        let neighbours = match self.table.adjacent(reference) {
            Some(adjacent) => adjacent,
            None => {
                self.missing(reference, &mut unknown_codes)?;
                &empty
            }
        };

        let mut units = Vec::with_capacity(collection.len());
        for unit in collection.iter() {
            let category = if &unit.code == reference {
                Category::Reference
            } else if neighbours.contains(&unit.code) {
                Category::Adjacent
            } else {
                match self.table.is_coastal(&unit.code) {
                    Some(true) => Category::Coastal,
                    Some(false) => Category::Other,
                    None => {
                        self.missing(&unit.code, &mut unknown_codes)?;
                        Category::Other
                    }
                }
            };
            debug!("{} ({}) -> {}", unit.display_name, unit.code, category);
            units.push(ClassifiedUnit::new(unit.clone(), category));
        }

        let classification = Classification {
            units,
            unknown_codes,
        };

        info!(
            "Classified {} units: {} reference, {} adjacent, {} coastal, {} other",
            classification.units.len(),
            classification.count(Category::Reference),
            classification.count(Category::Adjacent),
            classification.count(Category::Coastal),
            classification.count(Category::Other)
        );

        Ok(classification)
    }
}

/// Every unit labeled [`Category::Other`], for runs without a reference.
pub fn unclassified(collection: &AdminCollection) -> Classification {
    Classification {
        units: collection
            .iter()
            .map(|u| ClassifiedUnit::new(u.clone(), Category::Other))
            .collect(),
        unknown_codes: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminUnit, HierarchySchema, Relationship};
    use geo::{MultiPolygon, Rect};

    fn collection(codes: &[&str]) -> AdminCollection {
        let schema = HierarchySchema::new(["region"]).unwrap();
        let units = codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let x = i as f64;
                AdminUnit::new(
                    *code,
                    vec![Some(code.to_string())],
                    *code,
                    MultiPolygon::new(vec![Rect::new((x, 0.0), (x + 1.0, 1.0)).to_polygon()]),
                )
            })
            .collect();
        AdminCollection::new(schema, units).unwrap()
    }

    fn table(entries: &[(&str, &[&str], bool)]) -> RelationshipTable {
        entries
            .iter()
            .map(|(code, adjacent, coastal)| {
                (
                    UnitCode::from(*code),
                    Relationship {
                        name: None,
                        adjacent: adjacent.iter().map(|c| UnitCode::from(*c)).collect(),
                        coastal: *coastal,
                    },
                )
            })
            .collect()
    }

    fn categories(classification: &Classification) -> Vec<(String, Category)> {
        classification
            .units
            .iter()
            .map(|u| (u.unit.code.to_string(), u.category))
            .collect()
    }

    #[test]
    fn test_three_unit_scenario() {
        let table = table(&[("A", &["B"], false), ("B", &[], true), ("C", &[], false)]);
        let classifier = RelationshipClassifier::new(&table, MissingCodePolicy::Degrade);

        let result = classifier
            .classify(&collection(&["A", "B", "C"]), &UnitCode::from("A"))
            .unwrap();

        assert_eq!(
            categories(&result),
            vec![
                ("A".to_string(), Category::Reference),
                ("B".to_string(), Category::Adjacent),
                ("C".to_string(), Category::Other),
            ]
        );
        assert!(result.unknown_codes.is_empty());
    }

    #[test]
    fn test_adjacent_takes_precedence_over_coastal() {
        let table = table(&[("R", &["N"], true), ("N", &["R"], true), ("S", &[], true)]);
        let classifier = RelationshipClassifier::new(&table, MissingCodePolicy::Fail);

        let result = classifier
            .classify(&collection(&["R", "N", "S"]), &UnitCode::from("R"))
            .unwrap();

        assert_eq!(result.units[0].category, Category::Reference);
        assert_eq!(result.units[1].category, Category::Adjacent);
        assert_eq!(result.units[2].category, Category::Coastal);
    }

    #[test]
    fn test_missing_code_degrades_by_default() {
        let table = table(&[("A", &[], false)]);
        let classifier = RelationshipClassifier::new(&table, MissingCodePolicy::Degrade);

        let result = classifier
            .classify(&collection(&["A", "Z"]), &UnitCode::from("A"))
            .unwrap();

        assert_eq!(result.units[1].category, Category::Other);
        assert_eq!(result.unknown_codes, vec![UnitCode::from("Z")]);
    }

    #[test]
    fn test_missing_code_fails_when_strict() {
        let table = table(&[("A", &[], false)]);
        let classifier = RelationshipClassifier::new(&table, MissingCodePolicy::Fail);

        let err = classifier
            .classify(&collection(&["A", "Z"]), &UnitCode::from("A"))
            .unwrap_err();
        assert!(matches!(err, AtlasError::UnknownCode(code) if code.as_str() == "Z"));
    }

    #[test]
    fn test_unknown_reference_has_no_neighbours() {
        let table = table(&[("A", &[], true), ("B", &[], false)]);
        let classifier = RelationshipClassifier::new(&table, MissingCodePolicy::Degrade);

        let result = classifier
            .classify(&collection(&["A", "B"]), &UnitCode::from("Q"))
            .unwrap();

        assert_eq!(result.units[0].category, Category::Coastal);
        assert_eq!(result.units[1].category, Category::Other);
        assert_eq!(result.unknown_codes, vec![UnitCode::from("Q")]);

        let strict = RelationshipClassifier::new(&table, MissingCodePolicy::Fail);
        assert!(strict
            .classify(&collection(&["A"]), &UnitCode::from("Q"))
            .is_err());
    }

    #[test]
    fn test_unclassified_labels_other() {
        let result = unclassified(&collection(&["A", "B"]));
        assert_eq!(result.count(Category::Other), 2);
    }
}
