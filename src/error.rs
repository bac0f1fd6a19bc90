//! Error types shared by every pipeline stage.

use thiserror::Error;

use crate::models::UnitCode;

pub type Result<T> = std::result::Result<T, AtlasError>;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("failed to fetch geometry from {location}: {reason}")]
    DataFetch { location: String, reason: String },

    #[error("no units matched {predicates}")]
    EmptyResult { predicates: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no relationship entry for unit code {0}")]
    UnknownCode(UnitCode),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AtlasError {
    pub fn data_fetch<E: std::fmt::Display>(location: impl Into<String>, reason: E) -> Self {
        Self::DataFetch {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Relationships,
    Filter,
    Aggregate,
    Classify,
    Values,
    Color,
    Compose,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Load => write!(f, "load"),
            Stage::Relationships => write!(f, "relationships"),
            Stage::Filter => write!(f, "filter"),
            Stage::Aggregate => write!(f, "aggregate"),
            Stage::Classify => write!(f, "classify"),
            Stage::Values => write!(f, "values"),
            Stage::Color => write!(f, "color"),
            Stage::Compose => write!(f, "compose"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// An [`AtlasError`] tagged with the stage that produced it.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: AtlasError,
}

impl StageError {
    pub fn new(stage: Stage, source: AtlasError) -> Self {
        Self { stage, source }
    }
}

/// Attach a [`Stage`] to a stage-local result.
pub trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_names_stage_and_cause() {
        let err: Result<()> = Err(AtlasError::EmptyResult {
            predicates: "N03_001 = 'X'".to_string(),
        });
        let staged = err.at_stage(Stage::Filter).unwrap_err();
        assert_eq!(staged.stage, Stage::Filter);
        assert_eq!(
            staged.to_string(),
            "filter stage failed: no units matched N03_001 = 'X'"
        );
    }
}
