//! Static relationship table: adjacency and coastal exposure per unit code.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::UnitCode;

/// Relationships of a single unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Display name, when the table source carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Codes of units sharing a land boundary with this one
    pub adjacent: BTreeSet<UnitCode>,

    /// Whether the unit's boundary includes a sea-facing segment
    pub coastal: bool,
}

/// Read-only mapping from unit code to its [`Relationship`].
#[derive(Debug, Clone, Default)]
pub struct RelationshipTable {
    entries: HashMap<UnitCode, Relationship>,
}

impl RelationshipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: UnitCode, relationship: Relationship) {
        self.entries.insert(code, relationship);
    }

    pub fn get(&self, code: &UnitCode) -> Option<&Relationship> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &UnitCode) -> bool {
        self.entries.contains_key(code)
    }

    /// Adjacent codes of `code`, `None` when the code has no entry
    pub fn adjacent(&self, code: &UnitCode) -> Option<&BTreeSet<UnitCode>> {
        self.entries.get(code).map(|r| &r.adjacent)
    }

    /// Coastal flag of `code`, `None` when the code has no entry
    pub fn is_coastal(&self, code: &UnitCode) -> Option<bool> {
        self.entries.get(code).map(|r| r.coastal)
    }

    /// Find a code by the entry's display name
    pub fn code_for_name(&self, name: &str) -> Option<&UnitCode> {
        self.entries
            .iter()
            .find(|(_, r)| r.name.as_deref() == Some(name))
            .map(|(code, _)| code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &UnitCode> {
        self.entries.keys()
    }

    /// Copy coastal flags from `other` for every code both tables know.
    pub fn overlay_coastal(&mut self, other: &RelationshipTable) {
        for (code, relationship) in self.entries.iter_mut() {
            if let Some(coastal) = other.is_coastal(code) {
                relationship.coastal = coastal;
            }
            if relationship.name.is_none() {
                relationship.name = other.get(code).and_then(|r| r.name.clone());
            }
        }
    }
}

impl FromIterator<(UnitCode, Relationship)> for RelationshipTable {
    fn from_iter<T: IntoIterator<Item = (UnitCode, Relationship)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, adjacent: &[&str], coastal: bool) -> Relationship {
        Relationship {
            name: Some(name.to_string()),
            adjacent: adjacent.iter().map(|c| UnitCode::from(*c)).collect(),
            coastal,
        }
    }

    #[test]
    fn test_lookups_distinguish_missing_from_false() {
        let table: RelationshipTable = [(UnitCode::from("A"), entry("A", &["B"], false))]
            .into_iter()
            .collect();

        assert_eq!(table.is_coastal(&UnitCode::from("A")), Some(false));
        assert_eq!(table.is_coastal(&UnitCode::from("Z")), None);
        assert!(table
            .adjacent(&UnitCode::from("A"))
            .unwrap()
            .contains(&UnitCode::from("B")));
        assert_eq!(table.code_for_name("A"), Some(&UnitCode::from("A")));
    }

    #[test]
    fn test_overlay_coastal() {
        let mut derived: RelationshipTable = [(
            UnitCode::from("A"),
            Relationship {
                name: None,
                adjacent: BTreeSet::new(),
                coastal: false,
            },
        )]
        .into_iter()
        .collect();
        let flags: RelationshipTable = [(UnitCode::from("A"), entry("Alpha", &[], true))]
            .into_iter()
            .collect();

        derived.overlay_coastal(&flags);
        let a = derived.get(&UnitCode::from("A")).unwrap();
        assert!(a.coastal);
        assert_eq!(a.name.as_deref(), Some("Alpha"));
    }
}
