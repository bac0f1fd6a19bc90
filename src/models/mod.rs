//! Core data models for the boundary pipeline.

pub mod classified;
pub mod relationship;
pub mod unit;

pub use classified::{Category, ClassifiedUnit};
pub use relationship::{Relationship, RelationshipTable};
pub use unit::{AdminCollection, AdminUnit, AggregationKey, HierarchySchema, UnitCode};
