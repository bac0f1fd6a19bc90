//! Hierarchical attribute filtering.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AtlasError, Result};
use crate::models::{AdminCollection, AdminUnit, HierarchySchema};

/// Hierarchy level `level` must equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub level: usize,
    pub value: String,
}

impl Predicate {
    pub fn new(level: usize, value: impl Into<String>) -> Self {
        Self {
            level,
            value: value.into(),
        }
    }

    /// Build a predicate from a source field name
    pub fn on_field(field: &str, value: impl Into<String>, schema: &HierarchySchema) -> Result<Self> {
        let level = schema.level_of(field).ok_or_else(|| {
            AtlasError::invalid(format!("filter field '{}' is not a hierarchy field", field))
        })?;
        Ok(Self::new(level, value))
    }

    pub fn matches(&self, unit: &AdminUnit) -> bool {
        unit.level(self.level) == Some(self.value.as_str())
    }
}

fn describe(predicates: &[Predicate], schema: &HierarchySchema) -> String {
    predicates
        .iter()
        .map(|p| {
            let field = schema.field(p.level).unwrap_or("?");
            format!("{} = '{}'", field, p.value)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Units satisfying every predicate, in input order.
///
/// An empty predicate list keeps every unit. Zero matches is reported as
/// [`AtlasError::EmptyResult`].
pub fn filter_units(collection: &AdminCollection, predicates: &[Predicate]) -> Result<AdminCollection> {
    let schema = collection.schema();

    if let Some(p) = predicates.iter().find(|p| p.level >= schema.depth()) {
        return Err(AtlasError::invalid(format!(
            "filter level {} is outside a {}-level hierarchy",
            p.level,
            schema.depth()
        )));
    }

    let matched: Vec<AdminUnit> = collection
        .iter()
        .filter(|unit| predicates.iter().all(|p| p.matches(unit)))
        .cloned()
        .collect();

    let description = describe(predicates, schema);
    debug!("Filter [{}] kept {} of {}", description, matched.len(), collection.len());

    if matched.is_empty() {
        return Err(AtlasError::EmptyResult {
            predicates: description,
        });
    }

    info!("Filtered to {} units", matched.len());

    Ok(AdminCollection::new(schema.clone(), matched)?.with_crs(collection.crs().map(String::from)))
}
