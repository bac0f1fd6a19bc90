//! Units labeled with their relationship to a reference unit.

use serde::{Deserialize, Serialize};

use super::AdminUnit;

/// Relationship category, in classification precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reference,
    Adjacent,
    Coastal,
    Other,
}

impl Category {
    /// All categories in precedence order
    pub fn all() -> &'static [Category] {
        &[
            Category::Reference,
            Category::Adjacent,
            Category::Coastal,
            Category::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reference => "reference",
            Category::Adjacent => "adjacent",
            Category::Coastal => "coastal",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedUnit {
    pub unit: AdminUnit,
    pub category: Category,
}

impl ClassifiedUnit {
    pub fn new(unit: AdminUnit, category: Category) -> Self {
        Self { unit, category }
    }
}
