//! Derive adjacency from geometry using an R-tree over unit envelopes.

use std::collections::BTreeSet;

use geo::Intersects;
use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{AdminCollection, AdminUnit, Relationship, RelationshipTable, UnitCode};

/// Envelope entry pointing back into the collection
struct IndexedUnit<'a> {
    unit: &'a AdminUnit,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedUnit<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl<'a> IndexedUnit<'a> {
    fn new(unit: &'a AdminUnit) -> Option<Self> {
        let rect = unit.bounding_rect()?;
        Some(Self {
            unit,
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        })
    }
}

/// Build a table where units are adjacent when their geometries touch or
/// overlap. Coastal flags are all `false`; overlay them from another table.
pub fn derive_adjacency(collection: &AdminCollection) -> RelationshipTable {
    info!("Deriving adjacency for {} units...", collection.len());

    let indexed: Vec<IndexedUnit<'_>> = collection.iter().filter_map(IndexedUnit::new).collect();
    let tree = RTree::bulk_load(indexed);

    let mut adjacency: HashMap<UnitCode, BTreeSet<UnitCode>> = collection
        .iter()
        .map(|u| (u.code.clone(), BTreeSet::new()))
        .collect();

    for entry in tree.iter() {
        let neighbours = tree
            .locate_in_envelope_intersecting(&entry.envelope)
            .filter(|other| other.unit.code != entry.unit.code)
            .filter(|other| entry.unit.geometry.intersects(&other.unit.geometry))
            .map(|other| other.unit.code.clone());

        if let Some(set) = adjacency.get_mut(&entry.unit.code) {
            set.extend(neighbours);
        }
    }

    let edges: usize = adjacency.values().map(BTreeSet::len).sum::<usize>() / 2;
    info!("Found {} adjacent pairs", edges);

    collection
        .iter()
        .map(|u| {
            let adjacent = adjacency.remove(&u.code).unwrap_or_default();
            (
                u.code.clone(),
                Relationship {
                    name: Some(u.display_name.clone()),
                    adjacent,
                    coastal: false,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HierarchySchema;
    use geo::{MultiPolygon, Rect};

    fn unit(code: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> AdminUnit {
        AdminUnit::new(
            code,
            vec![Some(code.to_string())],
            code,
            MultiPolygon::new(vec![Rect::new((x0, y0), (x1, y1)).to_polygon()]),
        )
    }

    #[test]
    fn test_shared_edges_are_adjacent() {
        let schema = HierarchySchema::new(["unit"]).unwrap();
        let collection = AdminCollection::new(
            schema,
            vec![
                unit("A", 0.0, 0.0, 1.0, 1.0),
                unit("B", 1.0, 0.0, 2.0, 1.0),
                unit("C", 5.0, 5.0, 6.0, 6.0),
                unit("D", 0.0, 1.0, 2.0, 2.0),
            ],
        )
        .unwrap();

        let table = derive_adjacency(&collection);
        let codes = |c: &str| -> Vec<String> {
            table
                .adjacent(&UnitCode::from(c))
                .unwrap()
                .iter()
                .map(|c| c.to_string())
                .collect()
        };

        assert_eq!(codes("A"), vec!["B", "D"]);
        assert_eq!(codes("B"), vec!["A", "D"]);
        assert!(codes("C").is_empty());
        assert_eq!(table.is_coastal(&UnitCode::from("A")), Some(false));
        assert_eq!(table.get(&UnitCode::from("C")).unwrap().name.as_deref(), Some("C"));
    }
}
