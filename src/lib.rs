//! Boundary Atlas - administrative boundary maps from national boundary data
//!
//! This library provides the boundary pipeline shared by the atlas and dissolve binaries.

pub mod compose;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod relations;
pub mod source;

pub use error::{AtlasError, Result, Stage, StageError};
pub use models::{AdminCollection, AdminUnit, Category, UnitCode};
