//! Administrative units and the collections they are loaded into.

use geo::{Area, BoundingRect, Centroid, MultiPolygon, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Identifier used for relationship lookups (e.g. JIS code "13" or "13101").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCode(String);

impl UnitCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters of the code, or `None` when it is shorter.
    pub fn prefix(&self, len: usize) -> Option<UnitCode> {
        if self.0.chars().count() < len {
            return None;
        }
        Some(UnitCode(self.0.chars().take(len).collect()))
    }
}

impl std::fmt::Display for UnitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitCode {
    fn from(code: &str) -> Self {
        UnitCode::new(code)
    }
}

impl From<String> for UnitCode {
    fn from(code: String) -> Self {
        UnitCode::new(code)
    }
}

/// Source attribute field names backing each hierarchy level, coarsest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct HierarchySchema {
    fields: Vec<String>,
}

impl TryFrom<Vec<String>> for HierarchySchema {
    type Error = AtlasError;

    fn try_from(fields: Vec<String>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<HierarchySchema> for Vec<String> {
    fn from(schema: HierarchySchema) -> Self {
        schema.fields
    }
}

impl HierarchySchema {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(AtlasError::invalid("hierarchy schema needs at least one level"));
        }
        Ok(Self { fields })
    }

    pub fn depth(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, level: usize) -> Option<&str> {
        self.fields.get(level).map(String::as_str)
    }

    /// Resolve a field name to its level index
    pub fn level_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Keep levels `0..=level`
    pub fn truncated(&self, level: usize) -> Self {
        Self {
            fields: self.fields[..=level.min(self.fields.len() - 1)].to_vec(),
        }
    }
}

/// Validated hierarchy level used to group units for dissolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationKey(usize);

impl AggregationKey {
    pub fn new(level: usize, schema: &HierarchySchema) -> Result<Self> {
        if level >= schema.depth() {
            return Err(AtlasError::invalid(format!(
                "aggregation level {} is outside a {}-level hierarchy",
                level,
                schema.depth()
            )));
        }
        Ok(Self(level))
    }

    /// Look the level up by its source field name
    pub fn from_field(field: &str, schema: &HierarchySchema) -> Result<Self> {
        let level = schema.level_of(field).ok_or_else(|| {
            AtlasError::invalid(format!("'{}' is not a hierarchy field", field))
        })?;
        Ok(Self(level))
    }

    pub fn level(&self) -> usize {
        self.0
    }
}

/// One administrative polygon with its place in the hierarchy.
#[derive(Debug, Clone)]
pub struct AdminUnit {
    pub code: UnitCode,
    /// Level values, coarsest first. A level may be absent in source data.
    pub hierarchy: Vec<Option<String>>,
    pub display_name: String,
    pub geometry: MultiPolygon<f64>,
}

impl AdminUnit {
    pub fn new(
        code: impl Into<UnitCode>,
        hierarchy: Vec<Option<String>>,
        display_name: impl Into<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Self {
            code: code.into(),
            hierarchy,
            display_name: display_name.into(),
            geometry,
        }
    }

    /// Value at a hierarchy level
    pub fn level(&self, level: usize) -> Option<&str> {
        self.hierarchy.get(level).and_then(|v| v.as_deref())
    }

    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}

/// Ordered units sharing one hierarchy schema.
#[derive(Debug, Clone)]
pub struct AdminCollection {
    schema: HierarchySchema,
    crs: Option<String>,
    units: Vec<AdminUnit>,
}

impl AdminCollection {
    /// Build a collection, checking every unit against the schema depth.
    pub fn new(schema: HierarchySchema, units: Vec<AdminUnit>) -> Result<Self> {
        if let Some(bad) = units.iter().find(|u| u.hierarchy.len() != schema.depth()) {
            return Err(AtlasError::invalid(format!(
                "unit {} has {} hierarchy levels, schema has {}",
                bad.code,
                bad.hierarchy.len(),
                schema.depth()
            )));
        }
        Ok(Self {
            schema,
            crs: None,
            units,
        })
    }

    pub fn with_crs(mut self, crs: Option<String>) -> Self {
        self.crs = crs;
        self
    }

    pub fn schema(&self) -> &HierarchySchema {
        &self.schema
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn units(&self) -> &[AdminUnit] {
        &self.units
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdminUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_units(self) -> Vec<AdminUnit> {
        self.units
    }

    /// Unique display names in sorted order, for console listings.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.iter().map(|u| u.display_name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}
