//! The boundary pipeline: filter, aggregate, classify, color, frame.
//!
//! Colors come from the categorical palette, or from a [`ValueScale`] when
//! the run maps per-unit values.

pub mod aggregate;
pub mod classify;
pub mod color;
pub mod filter;
pub mod frame;
mod run;
pub mod scale;

pub use aggregate::{dissolve, union_all, AggregateCode, DissolveOptions};
pub use classify::{unclassified, Classification, MissingCodePolicy, RelationshipClassifier};
pub use color::{ColorAssigner, ColorAssignment, Rgb};
pub use filter::{filter_units, Predicate};
pub use frame::MapFrame;
pub use run::{AggregateStep, ClassifyStep, FieldMatch, Pipeline, PipelineOutput, ValueStep};
pub use scale::{Ramp, ValueScale};
